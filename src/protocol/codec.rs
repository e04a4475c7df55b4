//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Batch) Format
//! ```text
//! #<len("*N")>        meta line: length of the next line
//! *<N>                number of queries
//! #<len("&M")>        ┐
//! &<M>                │ per query: number of tokens
//! #<len(T)>           │ ┐
//! <T>                 ┘ ┘ per token
//! ```
//! Lines are joined by `\n` with no trailing terminator. Count lines are
//! prefixed with the length of the marker line, token lines with the byte
//! length of the token.
//!
//! ### Response Format
//! ```text
//! #<len("*N")>\n*<N>\n          number of groups
//! #<len("&M")>\n&<M>\n          per group: number of items
//! <tag><len(V)>\n<V>\n          per item
//! ```
//! Parsing follows declared lengths only, so values may contain `\n`.

use crate::error::{ClientError, Result};
use super::{Query, RawItem, ResponseGroup, Tag};

/// Meta line marker
const META: u8 = b'#';

/// Marker of the batch/response count line
const BATCH_MARKER: u8 = b'*';

/// Marker of a per-query/per-group count line
const GROUP_MARKER: u8 = b'&';

const LF: u8 = b'\n';

/// Maximum declared length of a single line or value (16 MB)
///
/// Larger declared lengths are treated as corruption even if the server
/// really sends that many bytes.
pub const MAX_LINE_SIZE: usize = 16 * 1024 * 1024;

/// Upper bound for capacity hints taken from declared counts
const MAX_PREALLOC: usize = 64;

// =============================================================================
// Batch Encoding
// =============================================================================

/// Encode a batch of queries into one frame
///
/// An empty batch encodes to `#2\n*0`.
pub fn encode_batch(batch: &[Query]) -> String {
    let mut frame = String::new();
    push_count_line(&mut frame, BATCH_MARKER, batch.len());

    for query in batch {
        frame.push('\n');
        push_count_line(&mut frame, GROUP_MARKER, query.len());

        for token in query.tokens() {
            frame.push_str(&format!("\n#{}\n", token.len()));
            frame.push_str(token);
        }
    }

    frame
}

/// `#<len(line)>\n<line>` where line is `<marker><count>`
fn push_count_line(frame: &mut String, marker: u8, count: usize) {
    let line = format!("{}{}", char::from(marker), count);
    frame.push_str(&format!("#{}\n{}", line.len(), line));
}

// =============================================================================
// Response Encoding
// =============================================================================

/// Encode response groups the way the server sends them
pub fn encode_response(groups: &[ResponseGroup]) -> Vec<u8> {
    let mut out = String::new();
    push_count_line(&mut out, BATCH_MARKER, groups.len());
    out.push('\n');

    for group in groups {
        push_count_line(&mut out, GROUP_MARKER, group.len());
        out.push('\n');

        for item in group {
            out.push(item.tag.as_char());
            out.push_str(&format!("{}\n", item.value.len()));
            out.push_str(&item.value);
            out.push('\n');
        }
    }

    out.into_bytes()
}

// =============================================================================
// Response Decoding
// =============================================================================

/// A complete response found at the start of a buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    /// Decoded groups, one per query
    pub groups: Vec<ResponseGroup>,

    /// Number of bytes the response occupies
    pub len: usize,
}

/// Parse one response from the start of `buf`
///
/// Returns `Ok(None)` if `buf` holds only a prefix of a response, and
/// `ProtocolCorruption` if the bytes cannot be a response at all. Bytes past
/// the returned length are left for the caller.
pub fn parse_response(buf: &[u8]) -> Result<Option<ParsedResponse>> {
    let mut cursor = Cursor::new(buf);
    match cursor.response() {
        Ok(groups) => Ok(Some(ParsedResponse {
            groups,
            len: cursor.pos,
        })),
        Err(Step::Incomplete) => Ok(None),
        Err(Step::Corrupt(message)) => Err(ClientError::ProtocolCorruption(message)),
    }
}

/// Decode a buffer that must hold exactly one complete response
pub fn decode_response(buf: &[u8]) -> Result<Vec<ResponseGroup>> {
    match parse_response(buf)? {
        Some(parsed) if parsed.len == buf.len() => Ok(parsed.groups),
        Some(parsed) => Err(ClientError::corruption(format!(
            "{} trailing bytes after response",
            buf.len() - parsed.len
        ))),
        None => Err(ClientError::corruption(format!(
            "declared lengths exceed the {} buffered bytes",
            buf.len()
        ))),
    }
}

// =============================================================================
// Resumable Scanning
// =============================================================================

/// Grammar position of a scan between calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum ScanState {
    /// Waiting for the `*N` count line
    #[default]
    Header,

    /// Waiting for the next `&M` count line
    Groups { groups_left: usize },

    /// Inside a group
    Items { groups_left: usize, items_left: usize },
}

/// Finds the end of a response in a growing buffer without decoding it
///
/// Progress is kept between calls, so each byte is examined about once no
/// matter how the response is split. Only the unit (count line or item) cut
/// off by the end of the buffer is looked at again on the next call. The
/// buffer handed to `scan` must only grow at the end until `reset`.
#[derive(Debug, Default)]
pub struct FrameScanner {
    /// End of the last complete unit
    pos: usize,

    state: ScanState,
}

impl FrameScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue scanning `buf`
    ///
    /// Returns the response length once a whole response lies at the start
    /// of `buf` and resets itself for the next one. Returns `Ok(None)` while
    /// more bytes are needed.
    pub fn scan(&mut self, buf: &[u8]) -> Result<Option<usize>> {
        loop {
            let mut cursor = Cursor { buf, pos: self.pos };

            let next = match self.state {
                ScanState::Header => cursor
                    .count_line(BATCH_MARKER)
                    .map(|groups_left| ScanState::Groups { groups_left }),
                ScanState::Groups { groups_left: 0 } => {
                    let len = self.pos;
                    self.reset();
                    return Ok(Some(len));
                }
                ScanState::Groups { groups_left } => {
                    cursor.count_line(GROUP_MARKER).map(|items_left| ScanState::Items {
                        groups_left: groups_left - 1,
                        items_left,
                    })
                }
                ScanState::Items {
                    groups_left,
                    items_left: 0,
                } => Ok(ScanState::Groups { groups_left }),
                ScanState::Items {
                    groups_left,
                    items_left,
                } => cursor.raw_item().map(|_| ScanState::Items {
                    groups_left,
                    items_left: items_left - 1,
                }),
            };

            match next {
                Ok(state) => {
                    self.pos = cursor.pos;
                    self.state = state;
                }
                Err(Step::Incomplete) => return Ok(None),
                Err(Step::Corrupt(message)) => {
                    return Err(ClientError::ProtocolCorruption(message))
                }
            }
        }
    }

    /// Bytes confirmed to belong to complete units of the current response
    pub fn scanned(&self) -> usize {
        self.pos
    }

    /// Forget all progress
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Why the cursor stopped
enum Step {
    /// Buffer ended before the response did
    Incomplete,

    /// Bytes violate the grammar
    Corrupt(String),
}

type StepResult<T> = std::result::Result<T, Step>;

fn corrupt(message: impl Into<String>) -> Step {
    Step::Corrupt(message.into())
}

/// Length-driven reader over a response buffer
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn response(&mut self) -> StepResult<Vec<ResponseGroup>> {
        let group_count = self.count_line(BATCH_MARKER)?;
        let mut groups = Vec::with_capacity(group_count.min(MAX_PREALLOC));

        for _ in 0..group_count {
            let item_count = self.count_line(GROUP_MARKER)?;
            let mut group = Vec::with_capacity(item_count.min(MAX_PREALLOC));
            for _ in 0..item_count {
                group.push(self.item()?);
            }
            groups.push(group);
        }

        Ok(groups)
    }

    /// `#<len>\n<marker><count>\n`
    fn count_line(&mut self, marker: u8) -> StepResult<usize> {
        self.expect(META, "'#'")?;
        let len = self.length_line()?;
        let offset = self.pos;
        let line = self.take(len)?;
        self.expect(LF, "line feed")?;

        match line.split_first() {
            Some((&found, digits)) if found == marker => parse_digits(digits).ok_or_else(|| {
                corrupt(format!(
                    "invalid count line {:?} at offset {}",
                    String::from_utf8_lossy(line),
                    offset
                ))
            }),
            _ => Err(corrupt(format!(
                "expected '{}' line at offset {}",
                char::from(marker),
                offset
            ))),
        }
    }

    fn item(&mut self) -> StepResult<RawItem> {
        let (tag, value) = self.raw_item()?;
        Ok(RawItem {
            tag,
            value: String::from_utf8_lossy(value).into_owned(),
        })
    }

    /// `<tag><len>\n<value>\n`, borrowing the value
    fn raw_item(&mut self) -> StepResult<(Tag, &'a [u8])> {
        let offset = self.pos;
        let byte = self.take(1)?[0];
        let tag = Tag::from_byte(byte).ok_or_else(|| {
            corrupt(format!("unknown type tag 0x{:02x} at offset {}", byte, offset))
        })?;

        let len = self.length_line()?;
        let value = self.take(len)?;
        self.expect(LF, "line feed")?;

        Ok((tag, value))
    }

    /// Decimal digits terminated by LF
    fn length_line(&mut self) -> StepResult<usize> {
        let start = self.pos;
        let mut value = 0usize;

        loop {
            match self.buf.get(self.pos) {
                None => return Err(Step::Incomplete),
                Some(&LF) => break,
                Some(&b) if b.is_ascii_digit() => {
                    value = value
                        .checked_mul(10)
                        .and_then(|v| v.checked_add(usize::from(b - b'0')))
                        .filter(|v| *v <= MAX_LINE_SIZE)
                        .ok_or_else(|| {
                            corrupt(format!(
                                "declared length at offset {} exceeds {} bytes",
                                start, MAX_LINE_SIZE
                            ))
                        })?;
                    self.pos += 1;
                }
                Some(&b) => {
                    return Err(corrupt(format!(
                        "invalid length byte 0x{:02x} at offset {}",
                        b, self.pos
                    )))
                }
            }
        }

        if self.pos == start {
            return Err(corrupt(format!("missing length at offset {}", start)));
        }
        self.pos += 1;
        Ok(value)
    }

    fn take(&mut self, n: usize) -> StepResult<&'a [u8]> {
        let end = self.pos.saturating_add(n);
        let slice = self.buf.get(self.pos..end).ok_or(Step::Incomplete)?;
        self.pos = end;
        Ok(slice)
    }

    fn expect(&mut self, byte: u8, what: &str) -> StepResult<()> {
        match self.buf.get(self.pos) {
            None => Err(Step::Incomplete),
            Some(&found) if found == byte => {
                self.pos += 1;
                Ok(())
            }
            Some(&found) => Err(corrupt(format!(
                "expected {} at offset {}, found 0x{:02x}",
                what, self.pos, found
            ))),
        }
    }
}

fn parse_digits(digits: &[u8]) -> Option<usize> {
    if digits.is_empty() {
        return None;
    }
    digits.iter().try_fold(0usize, |acc, &b| {
        if !b.is_ascii_digit() {
            return None;
        }
        acc.checked_mul(10)?.checked_add(usize::from(b - b'0'))
    })
}
