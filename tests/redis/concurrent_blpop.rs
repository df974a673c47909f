use std::time::{Duration, Instant};

use redis_lite::commands::CommandError;

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_blpop_immediate_response() {
    let env = TestEnv::new();

    env.exec_command_immediate_success_response(
        TestUtils::rpush_command("grape", &["mango", "raspberry", "apple"]),
        &TestUtils::expected_integer(3),
    )
    .await;

    env.exec_command_immediate_success_response(
        TestUtils::blpop_command("grape", "0"),
        &TestUtils::expected_bulk_string_array(&["grape", "mango"]),
    )
    .await;

    env.exec_command_immediate_success_response(
        TestUtils::lrange_command("grape", 0, -1),
        &TestUtils::expected_bulk_string_array(&["raspberry", "apple"]),
    )
    .await;
}

#[tokio::test]
async fn test_blpop_blocks_until_push() {
    let env = TestEnv::new();

    let client_task = TestUtils::spawn_blpop_task(&env, "queue", "0");
    TestUtils::wait_for_waiters(&env.store, "queue", 1).await;

    // The pushed element goes straight to the waiter, so the list is empty
    // by the time RPUSH replies with its length.
    env.exec_command_immediate_success_response(
        TestUtils::rpush_command("queue", &["item1"]),
        &TestUtils::expected_integer(1),
    )
    .await;

    let client_result = TestUtils::wait_for_completion(client_task, Duration::from_secs(2)).await;
    assert_eq!(
        client_result,
        Ok(TestUtils::expected_bulk_string_array(&["queue", "item1"]))
    );

    env.exec_command_immediate_success_response(
        TestUtils::lrange_command("queue", 0, -1),
        &TestUtils::expected_bulk_string_array(&[]),
    )
    .await;
    assert_eq!(env.store.waiter_count("queue").await, 0);
}

#[tokio::test]
async fn test_blpop_serves_waiters_in_arrival_order() {
    let env = TestEnv::new();
    let mut tasks = vec![];

    for i in 0..3 {
        tasks.push(TestUtils::spawn_blpop_task(&env, "jobs", "5"));
        TestUtils::wait_for_waiters(&env.store, "jobs", i + 1).await;
    }

    env.exec_command_immediate_success_response(
        TestUtils::rpush_command("jobs", &["first", "second"]),
        &TestUtils::expected_integer(2),
    )
    .await;

    let mut tasks = tasks.into_iter();

    for expected in ["first", "second"] {
        let task = tasks.next().unwrap();
        assert_eq!(
            TestUtils::wait_for_completion(task, Duration::from_secs(2)).await,
            Ok(TestUtils::expected_bulk_string_array(&["jobs", expected]))
        );
    }

    assert_eq!(env.store.waiter_count("jobs").await, 1);

    env.exec_command_immediate_success_response(
        TestUtils::lpush_command("jobs", &["third"]),
        &TestUtils::expected_integer(1),
    )
    .await;

    let last = tasks.next().unwrap();
    assert_eq!(
        TestUtils::wait_for_completion(last, Duration::from_secs(2)).await,
        Ok(TestUtils::expected_bulk_string_array(&["jobs", "third"]))
    );
}

#[tokio::test]
async fn test_blpop_timeout_returns_null_array() {
    let env = TestEnv::new();
    let start_time = Instant::now();

    env.exec_command_immediate_success_response(
        TestUtils::blpop_command("empty_list", "0.2"),
        &TestUtils::expected_null_array(),
    )
    .await;

    let elapsed = start_time.elapsed();
    assert!(
        elapsed >= Duration::from_millis(200),
        "returned after {:?}",
        elapsed
    );
    assert_eq!(env.store.waiter_count("empty_list").await, 0);

    // A later push is not lost to the timed out client.
    env.exec_command_immediate_success_response(
        TestUtils::rpush_command("empty_list", &["late"]),
        &TestUtils::expected_integer(1),
    )
    .await;
    env.exec_command_immediate_success_response(
        TestUtils::lrange_command("empty_list", 0, -1),
        &TestUtils::expected_bulk_string_array(&["late"]),
    )
    .await;
}

#[tokio::test]
async fn test_blpop_only_one_client_gets_single_item() {
    let env = TestEnv::new();
    let mut tasks = vec![];

    for i in 0..3 {
        tasks.push(TestUtils::spawn_blpop_task(&env, "single", "0.5"));
        TestUtils::wait_for_waiters(&env.store, "single", i + 1).await;
    }

    env.exec_command_immediate_success_response(
        TestUtils::rpush_command("single", &["only"]),
        &TestUtils::expected_integer(1),
    )
    .await;

    let mut results = vec![];
    for task in tasks {
        results.push(TestUtils::wait_for_completion(task, Duration::from_secs(2)).await);
    }

    assert_eq!(
        results,
        vec![
            Ok(TestUtils::expected_bulk_string_array(&["single", "only"])),
            Ok(TestUtils::expected_null_array()),
            Ok(TestUtils::expected_null_array()),
        ]
    );
}

#[tokio::test]
async fn test_blpop_negative_timeout_blocks_until_push() {
    let env = TestEnv::new();

    let client_task = TestUtils::spawn_blpop_task(&env, "queue", "-1");
    TestUtils::wait_for_waiters(&env.store, "queue", 1).await;

    // Still waiting well after a short timeout would have fired.
    TestUtils::sleep_ms(100).await;
    assert!(!client_task.is_finished());
    assert_eq!(env.store.waiter_count("queue").await, 1);

    env.exec_command_immediate_success_response(
        TestUtils::rpush_command("queue", &["item1"]),
        &TestUtils::expected_integer(1),
    )
    .await;

    assert_eq!(
        TestUtils::wait_for_completion(client_task, Duration::from_secs(2)).await,
        Ok(TestUtils::expected_bulk_string_array(&["queue", "item1"]))
    );
}

#[tokio::test]
async fn test_blpop_argument_errors() {
    let env = TestEnv::new();

    let test_cases = vec![
        (
            TestUtils::blpop_command("queue", "soon"),
            CommandError::InvalidTimeout,
        ),
        (
            TestUtils::command(&["BLPOP", "queue"]),
            CommandError::arity("BLPOP"),
        ),
    ];

    for (command, expected) in test_cases {
        env.exec_command_immediate_error_response(command, expected)
            .await;
    }

    env.store.set("name", "mango", 0).await;
    env.exec_command_immediate_error_response(
        TestUtils::blpop_command("name", "1"),
        CommandError::Store(redis_lite::key_value_store::StoreError::WrongType),
    )
    .await;
}
