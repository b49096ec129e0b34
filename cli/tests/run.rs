//! Drive `fetch_cli::run` against the live mock server.

use clap::Parser;
use fetch_cli::Cli;
use fetch_core::{FetchConfig, Outcome};
use serde_json::json;

fn start_server(api_key: &'static str) -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with_key(listener, api_key).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

#[test]
fn get_ticker_and_save_result() {
    let base = start_server(mock_server::DEFAULT_API_KEY);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ticker.json");
    let cli = Cli::parse_from([
        "fetch-cli",
        "--save",
        path.to_str().unwrap(),
        "get",
        format!("{base}/tickers/eth-ethereum").as_str(),
    ]);

    let outcome = fetch_cli::run(&cli, FetchConfig::default()).unwrap();

    let ticker = outcome.into_value().expect("expected success");
    assert_eq!(ticker["symbol"], "ETH");
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["method"], "GET");
    assert_eq!(saved["outcome"]["kind"], "Success");
    assert_eq!(saved["outcome"]["detail"]["symbol"], "ETH");
}

#[test]
fn post_creates_post() {
    let base = start_server(mock_server::DEFAULT_API_KEY);
    let cli = Cli::parse_from([
        "fetch-cli",
        "post",
        format!("{base}/posts").as_str(),
        "--json",
        r#"{"userId":1,"title":"from cli"}"#,
    ]);

    let outcome = fetch_cli::run(&cli, FetchConfig::default()).unwrap();

    let created = outcome.into_value().expect("expected success");
    assert_eq!(created["id"], 101);
    assert_eq!(created["title"], "from cli");
}

#[test]
fn api_key_from_config_is_sent() {
    let base = start_server("cli-secret");
    let cli = Cli::parse_from(["fetch-cli", "get", format!("{base}/protected").as_str()]);

    let without = fetch_cli::run(&cli, FetchConfig::default()).unwrap();
    assert_eq!(without, Outcome::Unauthorized);

    let config = FetchConfig {
        api_key: Some("cli-secret".to_string()),
        ..FetchConfig::default()
    };
    let with = fetch_cli::run(&cli, config).unwrap();
    assert_eq!(with, Outcome::Success(json!({"authenticated": true})));
}

#[test]
fn server_errors_exhaust_attempts() {
    let base = start_server(mock_server::DEFAULT_API_KEY);
    let cli = Cli::parse_from([
        "fetch-cli",
        "--attempts",
        "2",
        "--backoff-ms",
        "0",
        "get",
        format!("{base}/status/500").as_str(),
    ]);

    let outcome = fetch_cli::run(&cli, FetchConfig::default()).unwrap();

    assert_eq!(outcome, Outcome::NetworkError("HTTP 500 server error".to_string()));
}
