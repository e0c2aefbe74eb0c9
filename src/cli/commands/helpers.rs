//! Shared helper functions for CLI commands.

use std::net::SocketAddr;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Parse a bind address that can be:
/// - Just a port: "3030" -> 127.0.0.1:3030
/// - Just a host: "0.0.0.0" -> 0.0.0.0:<default_port>
/// - Host and port: "0.0.0.0:3030" -> 0.0.0.0:3030
pub fn parse_bind_address(bind: &str, default_port: u16) -> anyhow::Result<(String, u16)> {
    // Try parsing as just a port number
    if let Ok(port) = bind.parse::<u16>() {
        return Ok(("127.0.0.1".to_string(), port));
    }

    // Try parsing as host:port
    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return Ok((host.to_string(), port));
        }
    }

    if bind.is_empty() {
        anyhow::bail!("Empty bind address");
    }

    // Must be just a host, use default port
    Ok((bind.to_string(), default_port))
}

/// Resolve a bind argument to a socket address.
pub fn socket_addr(bind: &str, default_port: u16) -> anyhow::Result<SocketAddr> {
    let (host, port) = parse_bind_address(bind, default_port)?;
    let host = if host == "localhost" {
        "127.0.0.1".to_string()
    } else {
        host
    };
    format!("{}:{}", host, port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", bind, e))
}

/// Spinner shown while waiting on the backend.
pub fn spinner(message: String) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}
