//! Stand-in for the public JSON APIs the fetcher talks to, plus routes that
//! inject the failures a resilient client has to survive.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Key accepted by `/protected` when none is configured.
pub const DEFAULT_API_KEY: &str = "test-key";

/// How long a flaky route stalls before answering 503.
pub const FLAKY_STALL: Duration = Duration::from_secs(2);

const MAX_SLOW: Duration = Duration::from_secs(30);
/// Id assigned to every created post. Nothing is stored, as on
/// JSONPlaceholder.
pub const CREATED_ID: u32 = 101;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub user_id: u32,
    pub id: u32,
    pub title: String,
    pub body: String,
}

pub type Db = Arc<BTreeMap<u32, Post>>;

#[derive(Clone)]
pub struct AppState {
    db: Db,
    flaky_hits: Arc<AtomicU32>,
    api_key: Arc<str>,
}

pub fn app() -> Router {
    app_with_key(DEFAULT_API_KEY)
}

pub fn app_with_key(api_key: &str) -> Router {
    let state = AppState {
        db: Arc::new(seed_posts()),
        flaky_hits: Arc::new(AtomicU32::new(0)),
        api_key: Arc::from(api_key),
    };
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/{id}", get(get_post))
        .route("/forecast", get(forecast))
        .route("/tickers/{coin}", get(ticker))
        .route("/protected", get(protected))
        .route("/status/{code}", get(status))
        .route("/malformed", get(malformed))
        .route("/slow/{ms}", get(slow))
        .route("/flaky/{failures}", get(flaky))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_key(listener, DEFAULT_API_KEY).await
}

pub async fn run_with_key(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_key(api_key)).await
}

fn seed_posts() -> BTreeMap<u32, Post> {
    (1..=10)
        .map(|id| {
            let post = Post {
                user_id: (id - 1) / 5 + 1,
                id,
                title: format!("post {id}"),
                body: format!("body of post {id}"),
            };
            (id, post)
        })
        .collect()
}

async fn list_posts(State(state): State<AppState>) -> Json<Vec<Post>> {
    Json(state.db.values().cloned().collect())
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<Post>, (StatusCode, Json<Value>)> {
    state
        .db
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, Json(json!({}))))
}

/// Echo the submitted object back with `"id": 101`.
async fn create_post(
    Json(input): Json<Value>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let Value::Object(mut post) = input else {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": "expected a JSON object"})),
        ));
    };
    post.insert("id".to_string(), json!(CREATED_ID));
    tracing::debug!(fields = post.len(), "post created");
    Ok((StatusCode::CREATED, Json(Value::Object(post))))
}

async fn forecast(
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let coordinate = |name: &str| -> Result<f64, (StatusCode, Json<Value>)> {
        params
            .get(name)
            .and_then(|raw| raw.parse::<f64>().ok())
            .ok_or_else(|| {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": true, "reason": format!("missing or invalid `{name}`")})),
                )
            })
    };
    let latitude = coordinate("latitude")?;
    let longitude = coordinate("longitude")?;
    Ok(Json(json!({
        "latitude": latitude,
        "longitude": longitude,
        "current_units": {"temperature_2m": "°C", "wind_speed_10m": "km/h"},
        "current": {"temperature_2m": 13.4, "wind_speed_10m": 9.8},
    })))
}

async fn ticker(Path(coin): Path<String>) -> Result<Json<Value>, StatusCode> {
    let (name, symbol, price) = match coin.as_str() {
        "btc-bitcoin" => ("Bitcoin", "BTC", 64250.12),
        "eth-ethereum" => ("Ethereum", "ETH", 3120.55),
        _ => return Err(StatusCode::NOT_FOUND),
    };
    Ok(Json(json!({
        "id": coin,
        "name": name,
        "symbol": symbol,
        "quotes": {"USD": {"price": price}},
    })))
}

async fn protected(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let expected = format!("Bearer {}", state.api_key);
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if authorized {
        (StatusCode::OK, Json(json!({"authenticated": true})))
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid api key"})))
    }
}

async fn status(Path(code): Path<u16>) -> (StatusCode, Json<Value>) {
    match StatusCode::from_u16(code) {
        Ok(status) => (status, Json(json!({"status": code}))),
        Err(_) => (StatusCode::BAD_REQUEST, Json(json!({"error": "unknown status"}))),
    }
}

async fn malformed() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        "{\"id\": 1, \"title\": ",
    )
}

async fn slow(Path(ms): Path<u64>) -> Json<Value> {
    let delay = Duration::from_millis(ms).min(MAX_SLOW);
    tokio::time::sleep(delay).await;
    Json(json!({"slept_ms": delay.as_millis() as u64}))
}

/// The first `failures` hits on this server instance stall for
/// [`FLAKY_STALL`] and then answer 503; later hits succeed.
async fn flaky(
    State(state): State<AppState>,
    Path(failures): Path<u32>,
) -> (StatusCode, Json<Value>) {
    let hit = state.flaky_hits.fetch_add(1, Ordering::SeqCst) + 1;
    if hit <= failures {
        tracing::debug!(hit, failures, "flaky route stalling");
        tokio::time::sleep(FLAKY_STALL).await;
        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"hits": hit})));
    }
    (StatusCode::OK, Json(json!({"hits": hit})))
}
