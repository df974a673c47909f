//! A small Redis-compatible in-memory server.
//!
//! The crate provides:
//!
//! - A RESP codec that decodes incrementally from partial reads
//! - A typed key space (strings, lists, streams) with per-key expiry
//! - Blocking list pops served in FIFO order
//! - Stream entry IDs and range queries
//! - RDB-style snapshots, written on `SAVE` and restored at startup
//!
//! Clients are served concurrently with Tokio; all of them share one
//! [`key_value_store::Store`].

pub mod blocking;
pub mod commands;
pub mod connection;
pub mod key_value_store;
pub mod rdb;
pub mod resp;
pub mod server;
pub mod stream;
