//! Binance futures REST client against a mocked exchange.

use std::time::Duration;

use perpscan::models::Timeframe;
use perpscan::services::market_data::{CandleFetcher, InstrumentUniverse, MarketDataError};
use perpscan::services::BinanceFuturesClient;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> BinanceFuturesClient {
    BinanceFuturesClient::with_client(Url::parse(&server.uri()).unwrap(), reqwest::Client::new())
        .with_retries(3, Duration::from_millis(1))
}

fn kline(open_time: i64, close: &str) -> serde_json::Value {
    json!([
        open_time, "100.0", "101.5", "99.5", close, "1234.5",
        open_time + 14_399_999, "123450.0", 321, "600.0", "60000.0", "0"
    ])
}

#[tokio::test]
async fn lists_only_trading_usdt_perpetuals() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/exchangeInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "timezone": "UTC",
            "symbols": [
                {"symbol": "SOLUSDT", "contractType": "PERPETUAL", "quoteAsset": "USDT", "status": "TRADING"},
                {"symbol": "BTCUSDT", "contractType": "PERPETUAL", "quoteAsset": "USDT", "status": "TRADING"},
                {"symbol": "BTCUSDT_240628", "contractType": "CURRENT_QUARTER", "quoteAsset": "USDT", "status": "TRADING"},
                {"symbol": "ETHBUSD", "contractType": "PERPETUAL", "quoteAsset": "BUSD", "status": "TRADING"},
                {"symbol": "LUNAUSDT", "contractType": "PERPETUAL", "quoteAsset": "USDT", "status": "SETTLING"}
            ]
        })))
        .mount(&server)
        .await;

    let symbols = assert_ok!(client_for(&server).list().await);
    assert_eq!(symbols, vec!["BTCUSDT".to_string(), "SOLUSDT".to_string()]);
}

#[tokio::test]
async fn fetches_and_parses_klines() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/klines"))
        .and(query_param("symbol", "BTCUSDT"))
        .and(query_param("interval", "4h"))
        .and(query_param("limit", "200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            kline(1_700_000_000_000, "100.5"),
            kline(1_700_014_400_000, "101.0"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let candles = client_for(&server)
        .fetch("BTCUSDT", Timeframe::H4, 200)
        .await
        .unwrap();

    assert_eq!(candles.len(), 2);
    assert_eq!(candles[0].open, 100.0);
    assert_eq!(candles[0].high, 101.5);
    assert_eq!(candles[0].low, 99.5);
    assert_eq!(candles[0].close, 100.5);
    assert_eq!(candles[0].volume, 1234.5);
    assert_eq!(candles[0].timestamp.timestamp_millis(), 1_700_000_000_000);
    assert!(candles[0].timestamp < candles[1].timestamp);
}

#[tokio::test]
async fn limit_is_capped_at_endpoint_maximum() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/klines"))
        .and(query_param("limit", "1500"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let candles = client_for(&server)
        .fetch("BTCUSDT", Timeframe::M15, 5000)
        .await
        .unwrap();
    assert!(candles.is_empty());
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/klines"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/klines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([kline(
            1_700_000_000_000,
            "100.5"
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let candles = assert_ok!(client_for(&server).fetch("ETHUSDT", Timeframe::H4, 10).await);
    assert_eq!(candles.len(), 1);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/klines"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"code":-1121,"msg":"Invalid symbol."}"#))
        .expect(1)
        .mount(&server)
        .await;

    let err = assert_err!(client_for(&server).fetch("NOPE", Timeframe::H4, 10).await);

    match err {
        MarketDataError::Api { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("Invalid symbol"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_rows_are_parse_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/klines"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([[1_700_000_000_000i64, "abc"]])),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch("BTCUSDT", Timeframe::H4, 10)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketDataError::Parse(_)));
}

#[tokio::test]
async fn out_of_order_candles_are_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/klines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            kline(1_700_014_400_000, "101.0"),
            kline(1_700_000_000_000, "100.5"),
        ])))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch("BTCUSDT", Timeframe::H4, 10)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketDataError::Parse(_)));
}
