//! Type tags and result codes
//!
//! The fixed vocabulary of wire type markers.

use std::fmt;

/// Wire type marker, the first byte of every response item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    /// `+` UTF-8 string
    String = b'+',
    /// `!` response code
    ResponseCode = b'!',
    /// `$` JSON document
    Json = b'$',
    /// `-` unsigned small integer
    SmallInt = b'-',
    /// `_` signed small integer
    SmallIntSigned = b'_',
    /// `:` unsigned integer
    Int = b':',
    /// `;` signed integer
    IntSigned = b';',
    /// `%` float
    Float = b'%',
    /// `?` binary blob
    Binary = b'?',
}

impl Tag {
    /// Every declared tag, in wire-table order
    pub const ALL: [Tag; 9] = [
        Tag::String,
        Tag::ResponseCode,
        Tag::Json,
        Tag::SmallInt,
        Tag::SmallIntSigned,
        Tag::Int,
        Tag::IntSigned,
        Tag::Float,
        Tag::Binary,
    ];

    /// Look up the tag for a wire byte
    pub fn from_byte(byte: u8) -> Option<Tag> {
        Self::ALL.into_iter().find(|tag| tag.as_byte() == byte)
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn as_char(self) -> char {
        char::from(self.as_byte())
    }
}

impl TryFrom<char> for Tag {
    type Error = char;

    fn try_from(c: char) -> std::result::Result<Self, Self::Error> {
        u8::try_from(c)
            .ok()
            .and_then(Tag::from_byte)
            .ok_or(c)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Result codes carried by `!` items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    Okay,
    Nil,
    OverwriteError,
    ActionError,
    PacketError,
    ServerError,
    OtherError,
    /// A code outside the known table (6 is reserved)
    Unknown(i64),
}

impl ResponseCode {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => ResponseCode::Okay,
            1 => ResponseCode::Nil,
            2 => ResponseCode::OverwriteError,
            3 => ResponseCode::ActionError,
            4 => ResponseCode::PacketError,
            5 => ResponseCode::ServerError,
            7 => ResponseCode::OtherError,
            other => ResponseCode::Unknown(other),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            ResponseCode::Okay => 0,
            ResponseCode::Nil => 1,
            ResponseCode::OverwriteError => 2,
            ResponseCode::ActionError => 3,
            ResponseCode::PacketError => 4,
            ResponseCode::ServerError => 5,
            ResponseCode::OtherError => 7,
            ResponseCode::Unknown(code) => code,
        }
    }

    pub fn is_okay(self) -> bool {
        self == ResponseCode::Okay
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResponseCode::Okay => "okay",
            ResponseCode::Nil => "nil",
            ResponseCode::OverwriteError => "overwrite-error",
            ResponseCode::ActionError => "action-error",
            ResponseCode::PacketError => "packet-error",
            ResponseCode::ServerError => "server-error",
            ResponseCode::OtherError => "other-error",
            ResponseCode::Unknown(code) => return write!(f, "unknown({})", code),
        };
        f.write_str(name)
    }
}
