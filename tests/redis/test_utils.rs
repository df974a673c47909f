use std::{path::Path, time::Duration};

use redis_lite::{
    commands::{CommandError, CommandHandler, CommandResult, blpop_reply},
    key_value_store::Store,
    resp::RespValue,
    server::Config,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    task::JoinHandle,
    time::timeout,
};

/// Test utilities for simplifying Redis command tests
pub struct TestUtils;

/// Test environment containing the key space and the startup settings
#[derive(Clone)]
pub struct TestEnv {
    pub store: Store,
    pub config: Config,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            store: Store::new(),
            config: Config::default(),
        }
    }

    /// Create a test environment whose snapshots live in `dir`
    pub fn with_snapshot_dir(dir: &Path) -> Self {
        Self {
            store: Store::new(),
            config: Config::new(dir.to_string_lossy(), "dump.rdb"),
        }
    }

    /// Execute a command, awaiting it to completion if it blocks
    pub async fn exec_command(&self, command: RespValue) -> Result<RespValue, CommandError> {
        let handler = CommandHandler::new(command)?;

        match handler.handle_command(&self.store, &self.config).await? {
            CommandResult::Response(response) => Ok(response),
            CommandResult::Blocked(pending) => {
                let key = pending.key().to_string();
                Ok(blpop_reply(&key, pending.wait().await))
            }
        }
    }

    /// Execute a command and compare its encoded reply
    pub async fn exec_command_immediate_success_response(
        &self,
        command: RespValue,
        expected_response: &str,
    ) {
        let response = self.exec_command(command.clone()).await;

        assert_eq!(
            response.map(|r| Self::encoded(&r)),
            Ok(expected_response.to_string()),
            "executing {:?}",
            command
        );
    }

    /// Wire form of a reply, for comparing against expected strings
    pub fn encoded(response: &RespValue) -> String {
        String::from_utf8_lossy(&response.encode()).into_owned()
    }

    /// Execute a command and compare the error it fails with
    pub async fn exec_command_immediate_error_response(
        &self,
        command: RespValue,
        expected_error: CommandError,
    ) {
        let response = self.exec_command(command.clone()).await;

        assert_eq!(response, Err(expected_error), "executing {:?}", command);
    }
}

impl TestUtils {
    /// Build a command from its name and arguments
    pub fn command(parts: &[&str]) -> RespValue {
        RespValue::array_from_strings(parts.iter().copied())
    }

    /// Create a BLPOP command
    pub fn blpop_command(key: &str, timeout_seconds: &str) -> RespValue {
        Self::command(&["BLPOP", key, timeout_seconds])
    }

    /// Create an RPUSH command with multiple values
    pub fn rpush_command(key: &str, values: &[&str]) -> RespValue {
        let mut parts = vec!["RPUSH", key];
        parts.extend_from_slice(values);

        Self::command(&parts)
    }

    /// Create an LPUSH command with multiple values
    pub fn lpush_command(key: &str, values: &[&str]) -> RespValue {
        let mut parts = vec!["LPUSH", key];
        parts.extend_from_slice(values);

        Self::command(&parts)
    }

    /// Create an LRANGE command
    pub fn lrange_command(key: &str, start: i64, stop: i64) -> RespValue {
        Self::command(&["LRANGE", key, &start.to_string(), &stop.to_string()])
    }

    /// Create a SET command
    pub fn set_command(key: &str, value: &str) -> RespValue {
        Self::command(&["SET", key, value])
    }

    /// Create a SET command with a millisecond expiration
    pub fn set_command_with_expiration(key: &str, value: &str, expiration_ms: u64) -> RespValue {
        Self::command(&["SET", key, value, "PX", &expiration_ms.to_string()])
    }

    /// Create a GET command
    pub fn get_command(key: &str) -> RespValue {
        Self::command(&["GET", key])
    }

    /// Create a XADD command
    pub fn xadd_command(key: &str, stream_id: &str, fields: &[&str]) -> RespValue {
        let mut parts = vec!["XADD", key, stream_id];
        parts.extend_from_slice(fields);

        Self::command(&parts)
    }

    /// Create a XRANGE command
    pub fn xrange_command(key: &str, start: &str, end: &str) -> RespValue {
        Self::command(&["XRANGE", key, start, end])
    }

    pub fn expected_simple_string(s: &str) -> String {
        format!("+{}\r\n", s)
    }

    pub fn expected_bulk_string(s: &str) -> String {
        format!("${}\r\n{}\r\n", s.len(), s)
    }

    pub fn expected_integer(n: i64) -> String {
        format!(":{}\r\n", n)
    }

    pub fn expected_null() -> String {
        "$-1\r\n".to_string()
    }

    pub fn expected_null_array() -> String {
        "*-1\r\n".to_string()
    }

    pub fn expected_bulk_string_array(values: &[&str]) -> String {
        TestEnv::encoded(&RespValue::array_from_strings(values.iter().copied()))
    }

    /// Spawn a BLPOP on its own task, as if from a separate client
    pub fn spawn_blpop_task(
        env: &TestEnv,
        key: &str,
        timeout_seconds: &str,
    ) -> JoinHandle<Result<String, CommandError>> {
        let env = env.clone();
        let command = Self::blpop_command(key, timeout_seconds);

        tokio::spawn(async move { env.exec_command(command).await.map(|r| TestEnv::encoded(&r)) })
    }

    /// Wait for a spawned client task, failing the test if it takes too long
    pub async fn wait_for_completion(
        task: JoinHandle<Result<String, CommandError>>,
        limit: Duration,
    ) -> Result<String, CommandError> {
        timeout(limit, task)
            .await
            .expect("client task timed out")
            .expect("client task panicked")
    }

    /// Poll until `count` clients are blocked on `key`
    pub async fn wait_for_waiters(store: &Store, key: &str, count: usize) {
        timeout(Duration::from_secs(2), async {
            while store.waiter_count(key).await != count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("waiters never registered");
    }

    pub async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    /// Write raw bytes and read until `expected` has fully arrived
    pub async fn send_and_expect(client: &mut TcpStream, request: &[u8], expected: &str) {
        client.write_all(request).await.unwrap();
        Self::expect_reply(client, expected).await;
    }

    /// Read from the socket until exactly `expected.len()` bytes have arrived
    pub async fn expect_reply(client: &mut TcpStream, expected: &str) {
        let mut received = vec![0; expected.len()];

        timeout(Duration::from_secs(2), client.read_exact(&mut received))
            .await
            .expect("reply timed out")
            .unwrap();

        assert_eq!(String::from_utf8_lossy(&received), expected);
    }

    /// Like `expect_reply`, for replies that are not valid UTF-8
    pub async fn expect_raw_reply(client: &mut TcpStream, expected: &[u8]) {
        let mut received = vec![0; expected.len()];

        timeout(Duration::from_secs(2), client.read_exact(&mut received))
            .await
            .expect("reply timed out")
            .unwrap();

        assert_eq!(received, expected);
    }
}
