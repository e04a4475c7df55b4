//! Protocol Module
//!
//! Defines the self-describing line protocol spoken with the server.
//!
//! ## Frames
//!
//! Every structural line is announced by a meta line `#<len>` giving the
//! byte length of the line that follows. A request batch looks like:
//! ```text
//! #2
//! *1          one query
//! #2
//! &2          two tokens
//! #3
//! GET
//! #1
//! k
//! ```
//!
//! A response carries one group per query; each item is a type tag, its
//! length and its value:
//! ```text
//! #2\n*1\n#2\n&1\n+5\nvalue\n
//! ```
//!
//! ### Type Tags
//! - `+` string, `!` response code, `:` integer (converted)
//! - `$` json, `-` `_` small integers, `;` signed integer, `%` float,
//!   `?` binary (declared, not converted)
//!
//! ### Response Codes
//! - 0: okay
//! - 1: nil
//! - 2: overwrite error
//! - 3: action error
//! - 4: packet error
//! - 5: server error
//! - 7: other error

mod buffer;
mod codec;
mod query;
mod response;
mod tag;
mod value;

pub use buffer::ResponseBuffer;
pub use codec::{
    decode_response, encode_batch, encode_response, parse_response, FrameScanner,
    ParsedResponse, MAX_LINE_SIZE,
};
pub use query::Query;
pub use response::{RawItem, ResponseGroup};
pub use tag::{ResponseCode, Tag};
pub use value::{convert, convert_groups, convert_item, QueryResult, Value};
