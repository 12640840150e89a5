//! # CLI
//!
//! This module defines the command-line interface of `protogate` using `clap`.
//!
//! It is responsible for parsing user input and performing validation (e.g., ensuring the
//! route prefix starts with `/`).
use clap::Parser;
use protogate_core::StatusPolicy;
use std::net::SocketAddr;

#[derive(Parser)]
#[command(
    name = "protogate",
    version,
    about = "Serve the example UserService as JSON over HTTP"
)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub addr: SocketAddr,

    /// Path prefix the RPC routes are mounted under (e.g. /rpc)
    ///
    /// Methods are then reachable at `{prefix}/{package}.{Service}/{Method}`.
    #[arg(long, default_value = "/rpc", value_parser = parse_prefix)]
    pub prefix: String,

    /// Forward inbound HTTP headers to handlers as call metadata
    #[arg(long)]
    pub propagate_headers: bool,

    /// How RPC codes map to HTTP statuses: "collapsed" or "conventional"
    #[arg(long, default_value = "collapsed", value_parser = parse_status_policy)]
    pub status_policy: StatusPolicy,

    /// Emit logs as JSON lines instead of human-readable text
    #[arg(long)]
    pub json_logs: bool,
}

fn parse_prefix(value: &str) -> Result<String, String> {
    if !value.starts_with('/') {
        return Err("The prefix must start with '/'".to_string());
    }

    Ok(value.trim_end_matches('/').to_string())
}

fn parse_status_policy(value: &str) -> Result<StatusPolicy, String> {
    match value.to_ascii_lowercase().as_str() {
        "collapsed" => Ok(StatusPolicy::Collapsed),
        "conventional" => Ok(StatusPolicy::Conventional),
        other => Err(format!(
            "Unknown status policy '{other}', expected 'collapsed' or 'conventional'"
        )),
    }
}
