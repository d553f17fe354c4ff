//! CLI argument definitions using clap derive macros.

use clap::Parser;

use fetcher_core::DEFAULT_RETRY_COUNT;
use fetcher_core::request::CONNECT_TIMEOUT_SECS;

/// Run one reactive HTTP request and print its payload.
///
/// The URL may contain `{name}` placeholders filled from `--param name=value`.
#[derive(Parser, Debug)]
#[command(name = "fetcher")]
#[command(author, version, about)]
pub struct Args {
    /// URL or URL template, e.g. `https://api.example.com/users/{id}`
    pub url: String,

    /// Template parameter as `name=value` (repeatable)
    #[arg(short = 'p', long = "param", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,

    /// Query pair as `key=value` (repeatable)
    #[arg(short = 'Q', long = "query", value_parser = parse_key_value)]
    pub query: Vec<(String, String)>,

    /// Request header as `Name: value` (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// JSON request body
    #[arg(short = 'd', long)]
    pub data: Option<String>,

    /// Base URL for relative templates
    #[arg(short = 'b', long)]
    pub base_url: Option<String>,

    /// Extra attempts after a failure (0-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_RETRY_COUNT as u8, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub retry: u8,

    /// Pause between attempts in milliseconds (0 = immediate, max 60000)
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub retry_delay_ms: u64,

    /// Connect timeout in seconds (1-3600)
    #[arg(long, default_value_t = CONNECT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout_secs: u64,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected `name=value`, got `{raw}`"))?;
    if key.is_empty() {
        return Err(format!("empty name in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected `Name: value`, got `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in `{raw}`"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
