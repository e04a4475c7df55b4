//! Response definitions
//!
//! Raw items as decoded from a server response, before conversion.

use super::Tag;

/// A decoded `(tag, raw value)` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
    /// Wire type marker
    pub tag: Tag,

    /// Value exactly as sent (may contain newlines)
    pub value: String,
}

impl RawItem {
    pub fn new(tag: Tag, value: impl Into<String>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }

    /// A `+` string item
    pub fn string(value: impl Into<String>) -> Self {
        Self::new(Tag::String, value)
    }

    /// A `!` response code item
    pub fn code(code: i64) -> Self {
        Self::new(Tag::ResponseCode, code.to_string())
    }

    /// A `:` integer item
    pub fn int(value: i64) -> Self {
        Self::new(Tag::Int, value.to_string())
    }
}

/// Items answering one query of a batch
pub type ResponseGroup = Vec<RawItem>;
