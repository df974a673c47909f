use std::{collections::HashMap, net::SocketAddr, path::PathBuf, sync::Arc};

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::{connection::handle_connection, key_value_store::Store};

pub const DEFAULT_PORT: u16 = 6379;
pub const DEFAULT_DIR: &str = ".";
pub const DEFAULT_DBFILENAME: &str = "dump.rdb";

/// Startup settings, read-only once the server runs.
///
/// Parameters are kept as a flat name/value map so `CONFIG GET` can answer
/// from it directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    parameters: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_DIR, DEFAULT_DBFILENAME)
    }
}

impl Config {
    pub fn new(dir: impl Into<String>, dbfilename: impl Into<String>) -> Self {
        let parameters = HashMap::from([
            ("dir".to_string(), dir.into()),
            ("dbfilename".to_string(), dbfilename.into()),
        ]);

        Self { parameters }
    }

    /// Looks up a parameter by name, ignoring ASCII case.
    pub fn get(&self, parameter: &str) -> Option<&str> {
        self.parameters
            .get(&parameter.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn dir(&self) -> &str {
        self.get("dir").unwrap_or(DEFAULT_DIR)
    }

    pub fn dbfilename(&self) -> &str {
        self.get("dbfilename").unwrap_or(DEFAULT_DBFILENAME)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        PathBuf::from(self.dir()).join(self.dbfilename())
    }
}

/// Accepts clients forever, one task per connection.
pub async fn run(listener: TcpListener, store: Store, config: Arc<Config>) -> std::io::Result<()> {
    info!(address = %listener.local_addr()?, "server listening");

    loop {
        let (stream, client_address) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "failed to accept connection");
                continue;
            }
        };

        spawn_connection(stream, client_address, store.clone(), Arc::clone(&config));
    }
}

fn spawn_connection(
    stream: tokio::net::TcpStream,
    client_address: SocketAddr,
    store: Store,
    config: Arc<Config>,
) {
    tokio::spawn(async move {
        let (reader, writer) = stream.into_split();

        if let Err(e) = handle_connection(reader, writer, client_address, store, config).await {
            error!(%client_address, error = %e, "connection failed");
        }
    });
}
