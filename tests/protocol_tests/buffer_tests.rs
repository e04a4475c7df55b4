//! Response Buffer Tests
//!
//! Tests for reassembling responses from arbitrarily split chunks.

use skyclient::protocol::{decode_response, encode_response, RawItem, ResponseBuffer};
use skyclient::ClientError;

/// Socket read size used by the TCP transport
const CHUNK_SIZE: usize = 16 * 1024;

fn sample_response() -> Vec<u8> {
    encode_response(&[
        vec![RawItem::string("multi\nline"), RawItem::int(-12)],
        vec![RawItem::code(0)],
    ])
}

#[test]
fn test_response_split_at_every_byte() {
    let response = sample_response();

    for split in 1..response.len() {
        let mut buffer = ResponseBuffer::new();
        buffer.push(&response[..split]);
        assert!(buffer.next_response().unwrap().is_none(), "split {}", split);

        buffer.push(&response[split..]);
        let complete = buffer.next_response().unwrap().unwrap();
        assert_eq!(&complete[..], &response[..]);
        assert!(buffer.is_empty());
    }
}

#[test]
fn test_byte_by_byte_delivery() {
    let response = sample_response();
    let mut buffer = ResponseBuffer::new();

    for (i, byte) in response.iter().enumerate() {
        buffer.push(&[*byte]);
        let result = buffer.next_response().unwrap();
        if i + 1 < response.len() {
            assert!(result.is_none());
        } else {
            assert_eq!(&result.unwrap()[..], &response[..]);
        }
    }
}

#[test]
fn test_coalesced_responses_are_returned_one_at_a_time() {
    let first = encode_response(&[vec![RawItem::string("first")]]);
    let second = encode_response(&[vec![RawItem::string("second")]]);

    let mut chunk = first.clone();
    chunk.extend_from_slice(&second[..4]);

    let mut buffer = ResponseBuffer::new();
    buffer.push(&chunk);

    let got = buffer.next_response().unwrap().unwrap();
    assert_eq!(&got[..], &first[..]);
    assert_eq!(buffer.len(), 4);
    assert!(buffer.next_response().unwrap().is_none());

    buffer.push(&second[4..]);
    let got = buffer.next_response().unwrap().unwrap();
    assert_eq!(decode_response(&got).unwrap(), vec![vec![RawItem::string("second")]]);
    assert!(buffer.is_empty());
}

#[test]
fn test_corrupt_bytes_surface_and_stay_buffered() {
    let mut buffer = ResponseBuffer::new();
    buffer.push(b"garbage\n");

    assert!(matches!(
        buffer.next_response(),
        Err(ClientError::ProtocolCorruption(_))
    ));
    assert_eq!(buffer.len(), 8);

    buffer.clear();
    assert!(buffer.is_empty());
}

#[test]
fn test_large_response_in_socket_sized_chunks() {
    let items = 200_000;
    let group: Vec<RawItem> = (0..items)
        .map(|i| RawItem::string(format!("value-{}", i)))
        .collect();
    let response = encode_response(&[group]);
    assert!(response.len() > 100 * CHUNK_SIZE);

    let mut buffer = ResponseBuffer::new();
    let mut chunks = response.chunks(CHUNK_SIZE).peekable();
    let mut complete = None;

    while let Some(chunk) = chunks.next() {
        buffer.push(chunk);
        let result = buffer.next_response().unwrap();

        if chunks.peek().is_some() {
            assert!(result.is_none());
            // Everything but the item cut off by the chunk boundary is already
            // accounted for, so the next push only scans the new bytes
            assert!(buffer.len() - buffer.scanned() < 32);
        } else {
            complete = result;
        }
    }

    let complete = complete.expect("response should be complete after the last chunk");
    assert_eq!(complete.len(), response.len());
    assert!(buffer.is_empty());

    let groups = decode_response(&complete).unwrap();
    assert_eq!(groups[0].len(), items);
    assert_eq!(groups[0][items - 1], RawItem::string("value-199999"));
}

#[test]
fn test_clear_resets_scan_progress() {
    let response = sample_response();
    let mut buffer = ResponseBuffer::new();

    buffer.push(&response[..response.len() - 1]);
    assert!(buffer.next_response().unwrap().is_none());
    assert!(buffer.scanned() > 0);

    buffer.clear();
    assert_eq!(buffer.scanned(), 0);

    buffer.push(&response);
    assert_eq!(&buffer.next_response().unwrap().unwrap()[..], &response[..]);
}
