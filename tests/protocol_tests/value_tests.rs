//! Value Conversion Tests
//!
//! Tests for tag conversion, result codes and arity collapsing.

use skyclient::protocol::{
    convert, convert_groups, decode_response, QueryResult, RawItem, ResponseCode, Tag, Value,
};
use skyclient::ClientError;

// =============================================================================
// Conversion Tests
// =============================================================================

#[test]
fn test_convert_string_is_identity() {
    assert_eq!(
        convert(Tag::String, "hello world").unwrap(),
        Value::String("hello world".to_string())
    );
    assert_eq!(convert(Tag::String, "").unwrap(), Value::String(String::new()));
}

#[test]
fn test_convert_integer() {
    assert_eq!(convert(Tag::Int, "42").unwrap(), Value::Integer(42));
    assert_eq!(convert(Tag::Int, "-7").unwrap(), Value::Integer(-7));
}

#[test]
fn test_convert_okay_code() {
    let value = convert(Tag::ResponseCode, "0").unwrap();
    assert_eq!(value, Value::ResponseCode(ResponseCode::Okay));
    assert!(value.as_response_code().unwrap().is_okay());
}

#[test]
fn test_convert_known_codes() {
    let expected = [
        ("1", ResponseCode::Nil),
        ("2", ResponseCode::OverwriteError),
        ("3", ResponseCode::ActionError),
        ("4", ResponseCode::PacketError),
        ("5", ResponseCode::ServerError),
        ("7", ResponseCode::OtherError),
    ];
    for (raw, code) in expected {
        assert_eq!(
            convert(Tag::ResponseCode, raw).unwrap(),
            Value::ResponseCode(code)
        );
    }
}

#[test]
fn test_convert_reserved_code_is_unknown_not_error() {
    assert_eq!(
        convert(Tag::ResponseCode, "6").unwrap(),
        Value::ResponseCode(ResponseCode::Unknown(6))
    );
}

#[test]
fn test_convert_float_is_unsupported() {
    match convert(Tag::Float, "1.5") {
        Err(ClientError::UnsupportedType(Tag::Float)) => {}
        other => panic!("Expected UnsupportedType, got {:?}", other),
    }
}

#[test]
fn test_every_unconverted_tag_is_unsupported() {
    let unsupported = [
        Tag::Json,
        Tag::SmallInt,
        Tag::SmallIntSigned,
        Tag::IntSigned,
        Tag::Float,
        Tag::Binary,
    ];
    for tag in unsupported {
        assert!(
            matches!(convert(tag, "1"), Err(ClientError::UnsupportedType(t)) if t == tag),
            "tag {:?}",
            tag
        );
    }
}

#[test]
fn test_convert_tag_from_char() {
    let tag = Tag::try_from('!').unwrap();
    assert_eq!(
        convert(tag, "5").unwrap(),
        Value::ResponseCode(ResponseCode::ServerError)
    );
}

#[test]
fn test_convert_malformed_integer_is_corruption() {
    assert!(matches!(
        convert(Tag::Int, "12x"),
        Err(ClientError::ProtocolCorruption(_))
    ));
    assert!(matches!(
        convert(Tag::ResponseCode, ""),
        Err(ClientError::ProtocolCorruption(_))
    ));
}

// =============================================================================
// Group Conversion Tests
// =============================================================================

#[test]
fn test_convert_groups_fails_whole_batch() {
    let groups = vec![
        vec![RawItem::string("ok")],
        vec![RawItem::new(Tag::Float, "2.5")],
    ];
    assert!(matches!(
        convert_groups(&groups),
        Err(ClientError::UnsupportedType(Tag::Float))
    ));
}

// =============================================================================
// Arity Collapsing Tests
// =============================================================================

#[test]
fn test_one_query_one_item_collapses() {
    let groups = decode_response(b"#2\n*1\n#2\n&1\n+5\nvalue\n").unwrap();
    let result = QueryResult::collapse(convert_groups(&groups).unwrap());

    assert_eq!(result, QueryResult::Single(Value::String("value".to_string())));
}

#[test]
fn test_two_queries_one_item_each_do_not_collapse() {
    let groups = decode_response(b"#2\n*2\n#2\n&1\n!1\n0\n#2\n&1\n:1\n9\n").unwrap();
    let result = QueryResult::collapse(convert_groups(&groups).unwrap());

    assert_eq!(
        result,
        QueryResult::Groups(vec![
            vec![Value::ResponseCode(ResponseCode::Okay)],
            vec![Value::Integer(9)],
        ])
    );
}

#[test]
fn test_one_query_two_items_do_not_collapse() {
    let result = QueryResult::collapse(vec![vec![Value::Integer(1), Value::Integer(2)]]);
    assert!(result.single().is_none());
    assert_eq!(result.into_values(), vec![Value::Integer(1), Value::Integer(2)]);
}

#[test]
fn test_collapse_is_purely_arity_based() {
    // Two groups, but only one value overall
    let result = QueryResult::collapse(vec![vec![Value::Integer(1)], vec![]]);
    assert_eq!(result.into_single(), Some(Value::Integer(1)));
}
