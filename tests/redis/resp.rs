use redis_lite::resp::{RespError, RespValue};

fn sample_values() -> Vec<RespValue> {
    vec![
        RespValue::SimpleString("OK".into()),
        RespValue::Error("ERR unknown command 'FLY'".into()),
        RespValue::Integer(-7),
        RespValue::bulk_string("hello world"),
        RespValue::bulk_string(""),
        RespValue::null_bulk_string(),
        RespValue::null_array(),
        RespValue::array(vec![]),
        RespValue::array(vec![
            RespValue::bulk_string("BLPOP"),
            RespValue::array(vec![RespValue::Integer(1), RespValue::null_bulk_string()]),
            RespValue::SimpleString("nested".into()),
        ]),
    ]
}

#[test]
fn test_encode_then_decode_returns_same_values() {
    for value in sample_values() {
        let encoded = value.encode();

        assert_eq!(
            RespValue::decode(&encoded),
            (vec![value.clone()], encoded.len(), None),
            "decoding {:?}",
            String::from_utf8_lossy(&encoded)
        );
    }
}

/// Values with a length prefix at the top level, so any prefix of their
/// encoding reads as incomplete rather than malformed. A top level simple
/// string, error or integer cut before its CRLF is a protocol error instead;
/// see `test_unterminated_top_level_line_is_an_error`.
fn framed_values() -> Vec<RespValue> {
    sample_values()
        .into_iter()
        .filter(|value| matches!(value, RespValue::BulkString(_) | RespValue::Array(_)))
        .collect()
}

#[test]
fn test_decode_at_every_split_point() {
    let bytes = framed_values()
        .iter()
        .flat_map(RespValue::encode)
        .collect::<Vec<u8>>();

    for split in 0..=bytes.len() {
        let (mut values, consumed, error) = RespValue::decode(&bytes[..split]);

        assert_eq!(error, None, "split {}", split);
        assert!(consumed <= split, "consumed past split {}", split);

        // Whatever was left over decodes to the remaining values.
        let (rest, rest_consumed, error) = RespValue::decode(&bytes[consumed..]);
        assert_eq!(error, None, "split {}", split);
        assert_eq!(rest_consumed, bytes.len() - consumed, "split {}", split);

        values.extend(rest);
        assert_eq!(values, framed_values(), "split {}", split);
    }
}

#[test]
fn test_decode_pipelined_commands() {
    let input = b"*1\r\n$4\r\nPING\r\n*2\r\n$4\r\nECHO\r\n$2\r\nhi\r\n*1\r\n$4\r\nPI";

    let (values, consumed, error) = RespValue::decode(input);

    assert_eq!(
        values,
        vec![
            RespValue::array_from_strings(["PING"]),
            RespValue::array_from_strings(["ECHO", "hi"]),
        ]
    );
    assert_eq!(consumed, 36);
    assert_eq!(error, None);
}

#[test]
fn test_decode_answers_values_ahead_of_garbage() {
    let input = b"*1\r\n$4\r\nPING\r\n*2\r\n$4\r\nECHO\r\n$2\r\nhi\r\n!x\r\n";

    assert_eq!(
        RespValue::decode(input),
        (
            vec![
                RespValue::array_from_strings(["PING"]),
                RespValue::array_from_strings(["ECHO", "hi"]),
            ],
            36,
            Some(RespError::UnknownType(b'!')),
        )
    );
}

#[test]
fn test_unterminated_top_level_line_is_an_error() {
    // Inline commands have no length prefix, so a missing CRLF is reported
    // rather than waited for.
    let test_cases: Vec<&[u8]> = vec![&b"+PI"[..], &b"NG\r\n"[..], &b":12"[..]];

    for input in test_cases {
        let (values, consumed, error) = RespValue::decode(input);

        assert!(values.is_empty(), "decoding {:?}", input);
        assert_eq!(consumed, 0, "decoding {:?}", input);
        assert!(error.is_some(), "decoding {:?}", input);
    }

    // Nested inside an array the same bytes are just incomplete.
    assert_eq!(RespValue::decode(b"*1\r\n+PI"), (vec![], 0, None));
}

#[test]
fn test_decode_non_utf8_bulk_strings() {
    let input = b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$2\r\n\xff\xfe\r\n*1\r\n$4\r\nPING\r\n";

    let (values, consumed, error) = RespValue::decode(input);

    assert_eq!(error, None);
    assert_eq!(consumed, input.len());
    assert_eq!(
        values,
        vec![
            RespValue::array(vec![
                RespValue::bulk_string("SET"),
                RespValue::bulk_string("k"),
                RespValue::bulk_string(b"\xff\xfe"),
            ]),
            RespValue::array_from_strings(["PING"]),
        ]
    );
}

#[test]
fn test_decode_malformed_input() {
    let test_cases: Vec<(&[u8], RespError)> = vec![
        (b"?what\r\n", RespError::UnknownType(b'?')),
        (b"$abc\r\nxyz\r\n", RespError::InvalidLength),
        (b"$3\r\nabcde\r\n", RespError::MissingTrailingCrlf),
        (b"*-2\r\n", RespError::InvalidLength),
        (b":twelve\r\n", RespError::InvalidInteger),
    ];

    for (input, expected) in test_cases {
        assert_eq!(
            RespValue::decode(input),
            (vec![], 0, Some(expected)),
            "decoding {:?}",
            String::from_utf8_lossy(input)
        );
    }
}

#[test]
fn test_protocol_error_reply() {
    assert_eq!(
        RespError::UnknownType(b'?').as_resp().encode(),
        b"-ERR Protocol error: unknown RESP type byte 0x3F\r\n"
    );
}
