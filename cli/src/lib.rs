//! Command-line front end for `fetch-core`.
//!
//! Resolves `FetchConfig` from the environment, lets flags override it,
//! performs one resilient fetch, and optionally dumps the result to a JSON
//! file. Rendering to the terminal lives in `main.rs`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fetch_core::{FetchConfig, HttpMethod, HttpRequest, Outcome, ResilientFetcher};
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(name = "fetch-cli", version, about = "Fetch JSON from an HTTP API with bounded retries")]
pub struct Cli {
    /// Total attempts, overriding FETCH_MAX_ATTEMPTS.
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..))]
    pub attempts: Option<u32>,

    /// Delay between attempts in milliseconds, overriding FETCH_BACKOFF_MS.
    #[arg(long, global = true)]
    pub backoff_ms: Option<u64>,

    /// Per-attempt timeout in milliseconds, overriding FETCH_TIMEOUT_MS.
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: Option<u64>,

    /// Write `{method, url, outcome}` as JSON to this path.
    #[arg(long, global = true)]
    pub save: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a GET request.
    Get {
        url: String,
        /// Query parameter as `key=value`; repeatable.
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// Send a POST request.
    Post {
        url: String,
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
        /// JSON request body. Without it the POST has no body.
        #[arg(long)]
        json: Option<String>,
    },
}

/// The object written by `--save`.
#[derive(Debug, Serialize)]
pub struct SavedResult<'a> {
    pub method: HttpMethod,
    pub url: String,
    pub outcome: &'a Outcome,
}

impl Cli {
    /// Apply flag overrides on top of the environment-derived config.
    pub fn apply(&self, mut config: FetchConfig) -> FetchConfig {
        if let Some(attempts) = self.attempts {
            config.max_attempts = attempts;
        }
        if let Some(ms) = self.backoff_ms {
            config.backoff = Duration::from_millis(ms);
        }
        if let Some(ms) = self.timeout_ms {
            config.timeout = Duration::from_millis(ms);
        }
        config
    }
}

pub fn build_request(command: &Command, config: &FetchConfig) -> Result<HttpRequest> {
    let (request, params) = match command {
        Command::Get { url, params } => (HttpRequest::get(url)?, params),
        Command::Post { url, params, json } => {
            let request = match json {
                Some(raw) => {
                    let body = serde_json::from_str(raw).context("--json is not valid JSON")?;
                    HttpRequest::post(url, body)?
                }
                None => HttpRequest::new(HttpMethod::Post, url)?,
            };
            (request, params)
        }
    };
    let request = params
        .iter()
        .fold(request, |req, (k, v)| req.with_query(k.as_str(), v.as_str()));
    Ok(config.apply(request))
}

/// Resolve settings, fetch once (with retries), and save if asked.
pub fn run(cli: &Cli, env_config: FetchConfig) -> Result<Outcome> {
    let config = cli.apply(env_config);
    if config.api_key.is_none() {
        tracing::debug!("no API key configured, sending unauthenticated request");
    }
    let request = build_request(&cli.command, &config)?;
    let outcome = ResilientFetcher::new().fetch_with_config(&request, &config);
    if let Some(path) = &cli.save {
        save(path, &request, &outcome)?;
    }
    Ok(outcome)
}

pub fn save(path: &Path, request: &HttpRequest, outcome: &Outcome) -> Result<()> {
    let saved = SavedResult {
        method: request.method(),
        url: request.full_url().to_string(),
        outcome,
    };
    let json = serde_json::to_string_pretty(&saved)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "result saved");
    Ok(())
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    if key.is_empty() {
        return Err(format!("empty parameter name in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("fetch-cli").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn parses_get_with_params_and_overrides() {
        let cli = parse(&[
            "get",
            "https://api.example.com/v1/forecast",
            "--param",
            "latitude=52.52",
            "--param",
            "longitude=13.41",
            "--attempts",
            "5",
            "--timeout-ms",
            "2000",
        ]);
        let config = cli.apply(FetchConfig::default());
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.timeout, Duration::from_millis(2000));

        let req = build_request(&cli.command, &config).unwrap();
        assert_eq!(req.method(), HttpMethod::Get);
        assert_eq!(
            req.full_url().as_str(),
            "https://api.example.com/v1/forecast?latitude=52.52&longitude=13.41"
        );
        assert_eq!(req.timeout(), Duration::from_millis(2000));
    }

    #[test]
    fn zero_attempts_flag_is_rejected() {
        let result = Cli::try_parse_from(["fetch-cli", "get", "https://example.com", "--attempts", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn param_without_equals_is_rejected() {
        assert!(parse_param("latitude").is_err());
        assert!(parse_param("=5").is_err());
        assert_eq!(parse_param("q=a=b").unwrap(), ("q".to_string(), "a=b".to_string()));
    }

    #[test]
    fn post_with_json_body() {
        let cli = parse(&["post", "https://example.com/posts", "--json", r#"{"title":"foo"}"#]);
        let req = build_request(&cli.command, &FetchConfig::default()).unwrap();
        assert_eq!(req.method(), HttpMethod::Post);
        assert_eq!(req.body().unwrap()["title"], "foo");
        assert_eq!(req.header("content-type"), Some("application/json"));
    }

    #[test]
    fn post_with_invalid_json_fails() {
        let cli = parse(&["post", "https://example.com/posts", "--json", "{title"]);
        let err = build_request(&cli.command, &FetchConfig::default()).unwrap_err();
        assert!(err.to_string().contains("--json"));
    }

    #[test]
    fn api_key_becomes_bearer_header() {
        let cli = parse(&["get", "https://example.com/me"]);
        let config = FetchConfig {
            api_key: Some("abc".to_string()),
            ..FetchConfig::default()
        };
        let req = build_request(&cli.command, &config).unwrap();
        assert_eq!(req.header("authorization"), Some("Bearer abc"));
    }

    #[test]
    fn invalid_url_is_an_error() {
        let cli = parse(&["get", "example.com/posts"]);
        assert!(build_request(&cli.command, &FetchConfig::default()).is_err());
    }

    #[test]
    fn save_writes_method_url_and_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.json");
        let req = HttpRequest::get("https://example.com/posts")
            .unwrap()
            .with_query("userId", "1");

        save(&path, &req, &Outcome::ServerError(503)).unwrap();

        let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["method"], "GET");
        assert_eq!(saved["url"], "https://example.com/posts?userId=1");
        assert_eq!(saved["outcome"]["kind"], "ServerError");
        assert_eq!(saved["outcome"]["detail"], 503);
    }
}
