//! Fixed-width binary layout of a frame log.
//!
//! A log file is one header frame followed by zero or more message frames.
//! All integers are little-endian and every text field occupies a fixed
//! number of bytes, zero-padded.
//!
//! Header frame (`HEADER_SIZE` bytes):
//!
//! ```text
//!     +-----------+-------------+---------------+------------+
//!     | magic 4b  | layout 2b   | created_at 8b | owner 32b  |
//!     +-----------+-------------+---------------+------------+
//!     | pid 4b    | version 32b | priority 1b   |
//!     +-----------+-------------+---------------+
//! ```
//!
//! Message frame (`MESSAGE_SIZE` bytes):
//!
//! ```text
//!     +------------+-------------+------------+-----------+
//!     | sent_at 8b | priority 1b | channel 1b | text 512b |
//!     +------------+-------------+------------+-----------+
//! ```

use bytes::{Buf, BufMut};

use crate::error::{Error, Result};

/// Identifies a frame log file.
pub const MAGIC: [u8; 4] = *b"FLOG";

/// Version of the frame layout described in this module.
pub const LAYOUT_VERSION: u16 = 1;

/// Capacity of the owner field in the header.
pub const OWNER_CAPACITY: usize = 32;

/// Capacity of the format version field in the header.
pub const VERSION_CAPACITY: usize = 32;

/// Capacity of the text payload of a single message frame.
pub const TEXT_CAPACITY: usize = 512;

/// Size in bytes of the header frame at offset 0.
pub const HEADER_SIZE: usize = 4 + 2 + 8 + OWNER_CAPACITY + 4 + VERSION_CAPACITY + 1;

/// Size in bytes of every message frame.
pub const MESSAGE_SIZE: usize = 8 + 1 + 1 + TEXT_CAPACITY;

/// Version string stamped into every header this crate writes.
pub const FORMAT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The header written once at offset 0 of every log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogHeader {
    /// Creation time in seconds since the Unix epoch.
    pub created_at: i64,
    /// Name of the user that created the log, when it could be determined.
    pub owner: Option<String>,
    pub process_id: u32,
    pub format_version: String,
    /// Overall priority of the log; any byte is accepted.
    pub priority: u8,
}

/// One fixed-size message record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    /// Time of the append call in seconds since the Unix epoch.
    pub sent_at: i64,
    pub priority: u8,
    /// Opaque sub-stream tag.
    pub channel: u8,
    pub text: Vec<u8>,
}

impl LogMessage {
    /// Returns the payload as text, replacing invalid UTF-8 sequences.
    ///
    /// Split records may cut a multi-byte character in half, so the payload
    /// is not guaranteed to be valid UTF-8 on its own.
    pub fn text_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.text)
    }
}

/// Encodes a header into its on-disk frame.
///
/// Text fields longer than their capacity are truncated silently.
pub fn encode_header(header: &LogHeader) -> [u8; HEADER_SIZE] {
    let mut frame = [0u8; HEADER_SIZE];
    let mut buf = &mut frame[..];

    buf.put_slice(&MAGIC);
    buf.put_u16_le(LAYOUT_VERSION);
    buf.put_i64_le(header.created_at);
    put_text(&mut buf, header.owner.as_deref().unwrap_or("").as_bytes(), OWNER_CAPACITY);
    buf.put_u32_le(header.process_id);
    put_text(&mut buf, header.format_version.as_bytes(), VERSION_CAPACITY);
    buf.put_u8(header.priority);

    frame
}

/// Decodes a header frame, checking its magic and layout version.
pub fn decode_header(frame: &[u8]) -> Result<LogHeader> {
    check_len(frame, HEADER_SIZE)?;
    let mut buf = &frame[..HEADER_SIZE];

    let mut magic = [0u8; 4];
    buf.copy_to_slice(&mut magic);
    if magic != MAGIC {
        return Err(Error::BadMagic { found: magic });
    }

    let layout = buf.get_u16_le();
    if layout != LAYOUT_VERSION {
        return Err(Error::UnsupportedLayout { found: layout });
    }

    let created_at = buf.get_i64_le();
    let owner = get_text(&mut buf, OWNER_CAPACITY);
    let process_id = buf.get_u32_le();
    let format_version = get_text(&mut buf, VERSION_CAPACITY);
    let priority = buf.get_u8();

    let owner = String::from_utf8_lossy(&owner).into_owned();
    Ok(LogHeader {
        created_at,
        owner: if owner.is_empty() { None } else { Some(owner) },
        process_id,
        format_version: String::from_utf8_lossy(&format_version).into_owned(),
        priority,
    })
}

/// Encodes a message into its on-disk frame.
///
/// Only the first `TEXT_CAPACITY` bytes of the text are kept; callers that
/// must not lose data split the payload first (see `Log::send`).
pub fn encode_message(message: &LogMessage) -> [u8; MESSAGE_SIZE] {
    let mut frame = [0u8; MESSAGE_SIZE];
    let mut buf = &mut frame[..];

    buf.put_i64_le(message.sent_at);
    buf.put_u8(message.priority);
    buf.put_u8(message.channel);
    put_text(&mut buf, &message.text, TEXT_CAPACITY);

    frame
}

/// Decodes a message frame. The text stops at the first zero byte.
pub fn decode_message(frame: &[u8]) -> Result<LogMessage> {
    check_len(frame, MESSAGE_SIZE)?;
    let mut buf = &frame[..MESSAGE_SIZE];

    let sent_at = buf.get_i64_le();
    let priority = buf.get_u8();
    let channel = buf.get_u8();
    let text = get_text(&mut buf, TEXT_CAPACITY);

    Ok(LogMessage {
        sent_at,
        priority,
        channel,
        text,
    })
}

/// Byte offset of the message frame with the given index.
pub fn message_offset(index: u64) -> u64 {
    HEADER_SIZE as u64 + index * MESSAGE_SIZE as u64
}

fn check_len(frame: &[u8], expected: usize) -> Result<()> {
    if frame.len() < expected {
        return Err(Error::DecodeTruncated {
            expected,
            found: frame.len(),
        });
    }
    Ok(())
}

// Writes `text` into a field of exactly `capacity` bytes.
fn put_text(buf: &mut impl BufMut, text: &[u8], capacity: usize) {
    let len = text.len().min(capacity);
    buf.put_slice(&text[..len]);
    buf.put_bytes(0, capacity - len);
}

// Consumes a `capacity`-byte field and returns its bytes up to the first zero.
fn get_text(buf: &mut &[u8], capacity: usize) -> Vec<u8> {
    let field = &buf[..capacity];
    let end = field.iter().position(|&b| b == 0).unwrap_or(capacity);
    let text = field[..end].to_vec();
    buf.advance(capacity);
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> LogHeader {
        LogHeader {
            created_at: 1_700_000_000,
            owner: Some("alice".to_string()),
            process_id: 4242,
            format_version: "1.0.0".to_string(),
            priority: 2,
        }
    }

    #[test]
    fn test_frame_sizes() {
        assert_eq!(HEADER_SIZE, 83);
        assert_eq!(MESSAGE_SIZE, 522);
        assert_eq!(message_offset(0), 83);
        assert_eq!(message_offset(2), 83 + 2 * 522);
    }

    #[test]
    fn test_header_layout() {
        let frame = encode_header(&sample_header());
        assert_eq!(&frame[0..4], b"FLOG");
        assert_eq!(&frame[4..6], &1u16.to_le_bytes());
        assert_eq!(&frame[6..14], &1_700_000_000i64.to_le_bytes());
        assert_eq!(&frame[14..19], b"alice");
        assert!(frame[19..46].iter().all(|&b| b == 0));
        assert_eq!(&frame[46..50], &4242u32.to_le_bytes());
        assert_eq!(&frame[50..55], b"1.0.0");
        assert_eq!(frame[82], 2);
    }

    #[test]
    fn test_header_without_owner() {
        let mut header = sample_header();
        header.owner = None;
        let decoded = decode_header(&encode_header(&header)).unwrap();
        assert_eq!(decoded.owner, None);
    }

    #[test]
    fn test_owner_truncated_to_capacity() {
        let mut header = sample_header();
        header.owner = Some("x".repeat(OWNER_CAPACITY + 10));
        let decoded = decode_header(&encode_header(&header)).unwrap();
        assert_eq!(decoded.owner.unwrap().len(), OWNER_CAPACITY);
    }

    #[test]
    fn test_message_layout() {
        let message = LogMessage {
            sent_at: -5,
            priority: 3,
            channel: 7,
            text: b"hello".to_vec(),
        };
        let frame = encode_message(&message);
        assert_eq!(&frame[0..8], &(-5i64).to_le_bytes());
        assert_eq!(frame[8], 3);
        assert_eq!(frame[9], 7);
        assert_eq!(&frame[10..15], b"hello");
        assert!(frame[15..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_text_stops_at_first_zero() {
        let message = LogMessage {
            sent_at: 0,
            priority: 0,
            channel: 0,
            text: b"abc\0def".to_vec(),
        };
        let decoded = decode_message(&encode_message(&message)).unwrap();
        assert_eq!(decoded.text, b"abc");
    }

    #[test]
    fn test_full_capacity_text_has_no_terminator() {
        let message = LogMessage {
            sent_at: 0,
            priority: 0,
            channel: 0,
            text: vec![b'z'; TEXT_CAPACITY + 3],
        };
        let decoded = decode_message(&encode_message(&message)).unwrap();
        assert_eq!(decoded.text, vec![b'z'; TEXT_CAPACITY]);
    }

    #[test]
    fn test_short_frames_are_truncated_errors() {
        let frame = encode_message(&LogMessage {
            sent_at: 1,
            priority: 1,
            channel: 0,
            text: Vec::new(),
        });
        match decode_message(&frame[..100]) {
            Err(Error::DecodeTruncated { expected, found }) => {
                assert_eq!(expected, MESSAGE_SIZE);
                assert_eq!(found, 100);
            }
            other => panic!("expected truncation error, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_magic_and_layout() {
        let mut frame = encode_header(&sample_header());
        frame[0] = b'X';
        assert!(matches!(decode_header(&frame), Err(Error::BadMagic { .. })));

        let mut frame = encode_header(&sample_header());
        frame[4..6].copy_from_slice(&9u16.to_le_bytes());
        assert!(matches!(
            decode_header(&frame),
            Err(Error::UnsupportedLayout { found: 9 })
        ));
    }
}
