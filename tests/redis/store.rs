use std::time::Duration;

use bytes::Bytes;
use redis_lite::{
    key_value_store::{Store, StoreError},
    stream::{IdSpec, RangeBound, StreamId},
};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn values(items: &[&str]) -> Vec<Bytes> {
    items
        .iter()
        .map(|v| Bytes::copy_from_slice(v.as_bytes()))
        .collect()
}

#[tokio::test]
async fn test_set_and_get_with_expiry() {
    let store = Store::new();

    store.set("fruit", "mango", 0).await;
    store.set("short", "lived", 50).await;

    assert_eq!(store.get("fruit").await, Some(Bytes::from("mango")));
    assert_eq!(store.get("short").await, Some(Bytes::from("lived")));

    tokio::time::sleep(Duration::from_millis(120)).await;

    assert_eq!(store.get("fruit").await, Some(Bytes::from("mango")));
    assert_eq!(store.get("short").await, None);
    assert_eq!(store.type_of("short").await, "none");
    assert_eq!(store.keys_matching("*").await, Ok(strings(&["fruit"])));
}

#[tokio::test]
async fn test_set_overwrites_any_type() {
    let store = Store::new();

    store
        .push("fruits", values(&["grape"]), false)
        .await
        .unwrap();
    store.set("fruits", "mango", 0).await;

    assert_eq!(store.type_of("fruits").await, "string");
    assert_eq!(store.get("fruits").await, Some(Bytes::from("mango")));
}

#[tokio::test]
async fn test_list_operations() {
    let store = Store::new();

    assert_eq!(
        store.push("fruits", values(&["a", "b", "c"]), false).await,
        Ok(3)
    );
    assert_eq!(store.push("fruits", values(&["x", "y"]), true).await, Ok(5));
    assert_eq!(
        store.range("fruits", 0, -1).await,
        Ok(values(&["y", "x", "a", "b", "c"]))
    );

    let test_cases = vec![
        (0, 1, vec!["y", "x"]),
        (-2, -1, vec!["b", "c"]),
        (3, 100, vec!["b", "c"]),
        (-100, 0, vec!["y"]),
        (4, 2, vec![]),
        (5, 10, vec![]),
    ];

    for (start, end, expected) in test_cases {
        assert_eq!(
            store.range("fruits", start, end).await,
            Ok(values(&expected)),
            "LRANGE fruits {} {}",
            start,
            end
        );
    }

    assert_eq!(store.pop("fruits", 2).await, Ok(values(&["y", "x"])));
    assert_eq!(store.length("fruits").await, Ok(3));
    assert_eq!(store.pop("fruits", 10).await, Ok(values(&["a", "b", "c"])));

    // Emptied lists disappear.
    assert_eq!(store.type_of("fruits").await, "none");
    assert_eq!(store.length("fruits").await, Ok(0));
    assert_eq!(store.pop("fruits", 1).await, Ok(vec![]));
}

#[tokio::test]
async fn test_wrong_type_errors() {
    let store = Store::new();
    store.set("name", "mango", 0).await;

    assert_eq!(
        store.push("name", values(&["a"]), false).await,
        Err(StoreError::WrongType)
    );
    assert_eq!(store.pop("name", 1).await, Err(StoreError::WrongType));
    assert_eq!(store.length("name").await, Err(StoreError::WrongType));
    assert_eq!(store.range("name", 0, -1).await, Err(StoreError::WrongType));
    assert_eq!(
        store
            .append_stream("name", IdSpec::Auto, vec![("a".into(), "1".into())])
            .await,
        Err(StoreError::WrongType)
    );
    assert_eq!(
        store
            .range_stream("name", RangeBound::Min, RangeBound::Max)
            .await,
        Err(StoreError::WrongType)
    );

    store.push("list", values(&["a"]), false).await.unwrap();
    assert_eq!(store.get("list").await, None);
}

#[tokio::test]
async fn test_delete_counts_existing_keys() {
    let store = Store::new();
    store.set("a", "1", 0).await;
    store.push("b", values(&["x"]), false).await.unwrap();

    assert_eq!(store.delete(&strings(&["a", "b", "missing"])).await, 2);
    assert_eq!(store.delete(&strings(&["a"])).await, 0);
    assert_eq!(store.type_of("a").await, "none");
}

#[tokio::test]
async fn test_keys_matching() {
    let store = Store::new();

    for key in ["hello", "hallo", "hxllo", "world"] {
        store.set(key, "1", 0).await;
    }

    let test_cases = vec![
        ("*", Ok(strings(&["hallo", "hello", "hxllo", "world"]))),
        ("h?llo", Ok(strings(&["hallo", "hello", "hxllo"]))),
        ("h[ae]llo", Ok(strings(&["hallo", "hello"]))),
        ("wor*", Ok(strings(&["world"]))),
        ("nothing*", Ok(vec![])),
    ];

    for (pattern, expected) in test_cases {
        assert_eq!(
            store.keys_matching(pattern).await,
            expected,
            "KEYS {}",
            pattern
        );
    }

    assert!(matches!(
        store.keys_matching("h[llo").await,
        Err(StoreError::InvalidPattern(_))
    ));
}

#[tokio::test]
async fn test_streams() {
    let store = Store::new();
    let fields = || vec![("temperature".to_string(), "36".to_string())];

    assert_eq!(
        store
            .append_stream("sensor", IdSpec::Explicit(StreamId::new(1, 1)), fields())
            .await,
        Ok(StreamId::new(1, 1))
    );
    assert_eq!(
        store
            .append_stream("sensor", IdSpec::AutoSequence(1), fields())
            .await,
        Ok(StreamId::new(1, 2))
    );
    assert_eq!(
        store
            .append_stream("sensor", IdSpec::AutoSequence(5), fields())
            .await,
        Ok(StreamId::new(5, 0))
    );
    assert_eq!(store.type_of("sensor").await, "stream");

    let ids = |entries: Vec<redis_lite::stream::StreamEntry>| {
        entries.into_iter().map(|e| e.id).collect::<Vec<_>>()
    };

    assert_eq!(
        store
            .range_stream("sensor", RangeBound::Min, RangeBound::Max)
            .await
            .map(ids),
        Ok(vec![
            StreamId::new(1, 1),
            StreamId::new(1, 2),
            StreamId::new(5, 0)
        ])
    );
    assert_eq!(
        store
            .range_stream("sensor", "1".parse().unwrap(), "1".parse().unwrap())
            .await
            .map(ids),
        Ok(vec![StreamId::new(1, 1), StreamId::new(1, 2)])
    );
    assert_eq!(
        store
            .range_stream("missing", RangeBound::Min, RangeBound::Max)
            .await,
        Ok(vec![])
    );
}

#[tokio::test]
async fn test_binary_values() {
    let store = Store::new();
    let blob = Bytes::from_static(b"\xff\x00\xfe\r\n");

    store.set("blob", blob.clone(), 0).await;
    assert_eq!(store.get("blob").await, Some(blob.clone()));

    store
        .push("blobs", vec![blob.clone(), Bytes::from_static(b"\x80")], false)
        .await
        .unwrap();
    assert_eq!(
        store.range("blobs", 0, -1).await,
        Ok(vec![blob, Bytes::from_static(b"\x80")])
    );
}

#[tokio::test]
async fn test_expiry_timers_follow_keys() {
    let store = Store::new();

    for _ in 0..1000 {
        store.set("session", "token", 3_600_000).await;
    }
    assert_eq!(store.expiry_timer_count().await, 1);

    assert_eq!(store.delete(&strings(&["session"])).await, 1);
    assert_eq!(store.expiry_timer_count().await, 0);

    // Overwriting with a plain SET keeps the key past the old deadline.
    store.set("short", "lived", 30).await;
    store.set("short", "forever", 0).await;
    assert_eq!(store.expiry_timer_count().await, 0);

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(store.get("short").await, Some(Bytes::from("forever")));
}
