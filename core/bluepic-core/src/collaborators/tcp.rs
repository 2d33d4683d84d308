//! Connectivity probe that opens (and immediately closes) a TCP connection.
//!
//! The server address is whatever the user typed in settings, e.g.
//! `http://photos.example.com:8090/`. Only scheme, host and port matter here.

use std::net::{TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{ConnectivityProbe, ProbeResult};
use crate::main_queue::Completion;

static ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?P<scheme>[A-Za-z][A-Za-z0-9+.\-]*)://)?(?P<host>\[[0-9A-Fa-f:.]+\]|[^:/?#\s\[\]]+)(?::(?P<port>\d{1,5}))?(?:[/?#]\S*)?$",
    )
    .unwrap()
});

/// Host and port extracted from a server address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    pub host: String,
    pub port: u16,
}

/// Parses `scheme://host[:port][/path]`. Missing ports default from the scheme.
pub fn parse_server_address(address: &str) -> Result<ServerEndpoint, String> {
    let caps = ADDRESS_RE
        .captures(address.trim())
        .ok_or_else(|| format!("unparseable server address: {}", address))?;

    let host = caps
        .name("host")
        .map(|m| m.as_str().trim_start_matches('[').trim_end_matches(']'))
        .unwrap_or_default()
        .to_string();

    let port = match caps.name("port") {
        Some(port) => port
            .as_str()
            .parse::<u16>()
            .map_err(|_| format!("port out of range: {}", port.as_str()))?,
        None => match caps.name("scheme").map(|s| s.as_str().to_ascii_lowercase()) {
            Some(scheme) if scheme == "https" => 443,
            Some(scheme) if scheme == "http" || scheme == "ws" => 80,
            Some(scheme) if scheme == "wss" => 443,
            Some(scheme) => return Err(format!("no default port for scheme {}", scheme)),
            None => 80,
        },
    };

    Ok(ServerEndpoint { host, port })
}

/// Probe backed by `TcpStream::connect_timeout`, run on a worker thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpProbe;

impl TcpProbe {
    pub fn new() -> Self {
        Self
    }

    fn probe(address: &str, timeout: Duration) -> ProbeResult {
        let endpoint = parse_server_address(address)?;
        let addrs = (endpoint.host.as_str(), endpoint.port)
            .to_socket_addrs()
            .map_err(|e| format!("cannot resolve {}: {}", endpoint.host, e))?;

        let mut last_error = format!("no addresses for {}", endpoint.host);
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(_) => return Ok(()),
                Err(e) => last_error = format!("{}: {}", addr, e),
            }
        }
        Err(last_error)
    }
}

impl ConnectivityProbe for TcpProbe {
    fn check(&self, address: &str, timeout: Duration, completion: Completion<ProbeResult>) {
        let address = address.to_string();
        thread::spawn(move || {
            let result = Self::probe(&address, timeout);
            if let Err(reason) = &result {
                tracing::debug!(address = %address, reason = %reason, "Connectivity probe failed");
            }
            completion.complete(result);
        });
    }
}
