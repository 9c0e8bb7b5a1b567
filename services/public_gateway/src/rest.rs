//! REST reads over the public whitelist boundary (spec §6, §4.9). Every
//! response is wrapped in `ApiSuccess`/`ApiError`; cursor pagination walks
//! an already-sorted in-memory page via `cursor::paginate`.

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use livermore_types::envelope::{to_public_candle, to_public_signal, ApiSuccess};
use livermore_types::Timeframe;

use crate::cursor::paginate;
use crate::error::GatewayError;
use crate::fanout::signal_type_for;
use crate::state::SharedState;

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 500;
/// Ceiling on how many raw candles/records are pulled from the cache before
/// pagination is applied in memory (spec §6 cursor pagination is a view over
/// recent history, not an unbounded archive).
const FETCH_CAP: isize = 1000;

pub fn router(state: SharedState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/v1/exchanges", get(list_exchanges))
        .route("/api/v1/exchanges/:exchange_id/symbols", get(list_symbols))
        .route("/api/v1/candles", get(candles))
        .route("/api/v1/alerts", get(alerts))
        .route("/api/v1/ws", get(crate::ws::handler::ws_upgrade))
        .layer(cors)
        .with_state(state)
}

async fn list_exchanges(State(state): State<SharedState>) -> impl IntoResponse {
    let exchanges = state.registry.list_exchanges().await;
    let count = exchanges.len();
    Json(ApiSuccess::new(exchanges, count, None, false))
}

async fn list_symbols(
    State(state): State<SharedState>,
    Path(exchange_id): Path<String>,
) -> impl IntoResponse {
    let symbols: Vec<_> = state
        .registry
        .symbols_for_exchange(&exchange_id)
        .await
        .into_iter()
        .filter(|s| s.is_tracked())
        .collect();
    Json(ApiSuccess::new(symbols.clone(), symbols.len(), None, false))
}

#[derive(Debug, Deserialize)]
struct CandlesQuery {
    exchange: Option<String>,
    symbol: String,
    timeframe: String,
    cursor: Option<String>,
    limit: Option<usize>,
}

async fn candles(
    State(state): State<SharedState>,
    Query(q): Query<CandlesQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    let exchange_id = q.exchange.unwrap_or_else(|| state.config.exchange_id.clone());
    let tf = Timeframe::from_str(&q.timeframe)?;
    let limit = q.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

    let key = livermore_cache::keys::candle_shared(&exchange_id, &q.symbol, tf);
    let mut raw = state.store.read_latest_candles(&key, FETCH_CAP).await?;
    raw.sort_by_key(|c| c.timestamp);

    let (page, next_cursor, has_more) = paginate(&raw, q.cursor.as_deref(), limit, |c| c.timestamp);
    let public: Vec<_> = page.iter().map(to_public_candle).collect();
    Ok(Json(ApiSuccess::new(public, raw.len(), next_cursor, has_more)))
}

#[derive(Debug, Deserialize)]
struct AlertsQuery {
    exchange: Option<String>,
    symbol: String,
    timeframe: String,
    cursor: Option<String>,
    limit: Option<usize>,
}

async fn alerts(
    State(state): State<SharedState>,
    Query(q): Query<AlertsQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    let exchange_id = q.exchange.unwrap_or_else(|| state.config.exchange_id.clone());
    let tf = Timeframe::from_str(&q.timeframe)?;
    let limit = q.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

    let records = state
        .store
        .read_alert_records(&exchange_id, &q.symbol, tf, FETCH_CAP)
        .await?;

    let (page, next_cursor, has_more) = paginate(&records, q.cursor.as_deref(), limit, |r| r.triggered_at);
    let public: Vec<_> = page
        .iter()
        .filter_map(|r| {
            let label = crate::fanout::label_from_record(r)?;
            Some(to_public_signal(
                &r.symbol,
                &exchange_id,
                tf,
                signal_type_for(&label),
                &label,
                r.price,
                r.triggered_at,
            ))
        })
        .collect();
    Ok(Json(ApiSuccess::new(public, records.len(), next_cursor, has_more)))
}
