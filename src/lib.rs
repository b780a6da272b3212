//! privddns publishes the machine's public IP address as an encrypted token
//! in a Porkbun TXT record, so that only holders of the key can read it.

pub mod config;
pub mod credentials;
pub mod crypto;
pub mod http;
pub mod ip;
pub mod persistence;
pub mod pipeline;
pub mod poller;
pub mod services;
mod util;

use tracing_subscriber::EnvFilter;

/// Logs go to stderr. `RUST_LOG` takes precedence over `LOG_LEVEL`, which
/// defaults to `info`.
pub fn init_logging() {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
