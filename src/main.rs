//! CLI entry point for the fetcher tool.

use std::io::{self, IsTerminal};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use fetcher_core::{HttpClient, RequestConfig, Scope, UseRequest, UseRequestOptions};
use reqwest::Method;
use tracing::{debug, info, warn};

mod cli;
mod progress;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (warn)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let config = build_config(&args)?;
    let options = UseRequestOptions::<serde_json::Value>::new()
        .retry(u32::from(args.retry))
        .retry_delay(Duration::from_millis(args.retry_delay_ms))
        .on_error(|error| warn!(%error, "request failed"));

    let client = HttpClient::with_connect_timeout(Duration::from_secs(args.connect_timeout_secs));
    let scope = Scope::new();
    let hook = UseRequest::new(client, args.url.clone(), config, options, &scope);

    let show_spinner = !args.quiet && io::stderr().is_terminal();
    let spinner = progress::spawn_spinner(show_spinner, hook.loading(), args.url.clone());

    let execution = hook.execute();
    tokio::pin!(execution);
    let result = tokio::select! {
        result = &mut execution => result,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, cancelling request");
            hook.cancel();
            execution.await
        }
    };

    if let Some(spinner) = spinner {
        let _ = spinner.await;
    }
    scope.unmount();

    let data = result.with_context(|| format!("request to {} failed", args.url))?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

fn build_config(args: &Args) -> Result<RequestConfig> {
    let method = Method::from_bytes(args.method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method `{}`", args.method))?;

    let mut config = RequestConfig::new().with_method(method);
    if let Some(base_url) = &args.base_url {
        config = config.base_url(base_url);
    }
    for (name, value) in &args.params {
        config = config.param(name, value);
    }
    for (key, value) in &args.query {
        config = config.query(key, value);
    }
    for (name, value) in &args.headers {
        config = config.try_header(name, value)?;
    }
    if let Some(raw) = &args.data {
        let body: serde_json::Value =
            serde_json::from_str(raw).context("request body is not valid JSON")?;
        if args.method.eq_ignore_ascii_case("GET") {
            bail!("a request body needs a method other than GET (use -X)");
        }
        config = config.body(body);
    }
    Ok(config)
}
