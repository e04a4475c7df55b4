//! # skyclient
//!
//! A client for a key-value store speaking a length-prefixed,
//! self-describing line protocol:
//! - Batch encoding of queries into one wire frame
//! - Length-driven response decoding with reassembly across reads
//! - Typed conversion of tagged response items
//! - Connect handshake bounded by a single timeout
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Connection                            │
//! │            query / set / get  ──▶  execute                   │
//! └──────────┬──────────────────────────────────▲───────────────┘
//!            │ encode_batch                      │ decode_response
//!            ▼                                   │ + convert
//!   ┌─────────────────┐                 ┌────────┴────────┐
//!   │    Transport    │ ── chunks ────▶ │ ResponseBuffer  │
//!   │ (reader thread) │                 │   (BytesMut)    │
//!   └─────────────────┘                 └─────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use skyclient::{connect, Config, Query};
//!
//! let config = Config::builder().host("127.0.0.1").port(2003).build();
//! let mut connection = connect(config)?;
//!
//! connection.set("greeting", "hello")?;
//! let value = connection.get("greeting")?;
//! println!("{}", value);
//!
//! let batch = [Query::get("a"), Query::get("b")];
//! let results = connection.query(&batch)?;
//! println!("{}", results);
//! # Ok::<(), skyclient::ClientError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ClientError, Result};
pub use config::Config;
pub use network::{connect, Connection, ConnectionState};
pub use protocol::{Query, QueryResult, ResponseCode, Tag, Value};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of skyclient
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
