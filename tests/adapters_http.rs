use std::time::Duration;

use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stockwatch_rs::config::HttpSettings;
use stockwatch_rs::market_data::adapters::library::{LibraryAdapter, YahooChartSource};
use stockwatch_rs::market_data::adapters::twse::TwseAdapter;
use stockwatch_rs::market_data::adapters::yahoo::YahooQuoteAdapter;
use stockwatch_rs::market_data::adapters::{build_provider, http_client, ProviderKind, QuoteProvider};
use stockwatch_rs::quote::types::RawQuote;

fn settings_for(server: &MockServer) -> HttpSettings {
    HttpSettings {
        timeout_secs: 2,
        yahoo_base_url: server.uri(),
        twse_base_url: server.uri(),
        ..HttpSettings::default()
    }
}

#[tokio::test]
async fn yahoo_sends_user_agent_and_parses_batch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v7/finance/quote"))
        .and(query_param("symbols", "2330.TW,0050.TW"))
        .and(header("user-agent", "Mozilla/5.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "quoteResponse": {
                "result": [
                    {"symbol": "2330.TW", "regularMarketPrice": 1045, "regularMarketPreviousClose": 1030},
                    {"symbol": "0050.TW", "regularMarketPrice": 190.35, "previousClose": 189.9}
                ],
                "error": null
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let settings = settings_for(&server);
    let adapter = YahooQuoteAdapter::new(http_client(&settings).unwrap(), &settings.yahoo_base_url);
    let quotes = adapter.fetch_batch(&["2330.TW", "0050.TW"]).await;
    assert_eq!(quotes["2330.TW"], RawQuote::new(Some(dec!(1045)), Some(dec!(1030))));
    assert_eq!(quotes["0050.TW"], RawQuote::new(Some(dec!(190.35)), Some(dec!(189.9))));
}

#[tokio::test]
async fn yahoo_server_error_is_absent() {
    let server = MockServer::start().await;
    Mock::given(path("/v7/finance/quote"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let provider = build_provider(ProviderKind::Yahoo, &settings_for(&server)).unwrap();
    assert_eq!(provider.fetch("2330.TW").await, RawQuote::absent());
}

#[tokio::test]
async fn yahoo_non_json_body_is_absent() {
    let server = MockServer::start().await;
    Mock::given(path("/v7/finance/quote"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>blocked</html>"))
        .mount(&server)
        .await;

    let provider = build_provider(ProviderKind::Yahoo, &settings_for(&server)).unwrap();
    assert_eq!(provider.fetch("2330.TW").await, RawQuote::absent());
}

#[tokio::test]
async fn slow_upstream_times_out_to_absent() {
    let server = MockServer::start().await;
    Mock::given(path("/v7/finance/quote"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"quoteResponse": {"result": []}}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let settings = HttpSettings { timeout_secs: 1, ..settings_for(&server) };
    let provider = build_provider(ProviderKind::Yahoo, &settings).unwrap();
    assert_eq!(provider.fetch("2330.TW").await, RawQuote::absent());
}

#[tokio::test]
async fn twse_sends_referer_and_treats_dash_as_absent() {
    let server = MockServer::start().await;
    let referer = format!("{}/stock/index.jsp", server.uri());
    Mock::given(method("GET"))
        .and(path("/stock/api/getStockInfo.jsp"))
        .and(query_param("ex_ch", "tse_2330.tw"))
        .and(query_param("json", "1"))
        .and(header("referer", referer.as_str()))
        .and(header("user-agent", "Mozilla/5.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "msgArray": [{"c": "2330", "z": "-", "y": "1030.0000", "h": "1050.0000", "l": "1040.0000", "o": "1041.0000"}],
            "rtcode": "0000"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let settings = settings_for(&server);
    let adapter = TwseAdapter::new(http_client(&settings).unwrap(), &settings.twse_base_url);
    let raw = adapter.fetch("2330.TW").await;
    assert_eq!(raw.latest, None);
    assert_eq!(raw.previous_close, Some(dec!(1030)));
}

#[tokio::test]
async fn twse_without_matching_referer_gets_nothing() {
    let server = MockServer::start().await;
    // only answers when the referer is wrong, so a correct adapter never sees data
    Mock::given(path("/stock/api/getStockInfo.jsp"))
        .and(header("referer", "https://elsewhere.example/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"msgArray": [{"z": "1", "y": "1"}]})))
        .mount(&server)
        .await;

    let provider = build_provider(ProviderKind::Twse, &settings_for(&server)).unwrap();
    assert_eq!(provider.fetch("2330.TW").await, RawQuote::absent());
}

#[tokio::test]
async fn library_reads_chart_meta_then_quote_entry() {
    let server = MockServer::start().await;
    Mock::given(path("/v8/finance/chart/2330.TW"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chart": {"result": [{"meta": {"symbol": "2330.TW", "regularMarketPrice": 1045.0}}], "error": null}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/v7/finance/quote"))
        .and(query_param("symbols", "2330.TW"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "quoteResponse": {"result": [{"symbol": "2330.TW", "regularMarketPreviousClose": 1030.0}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let settings = settings_for(&server);
    let source = YahooChartSource::new(http_client(&settings).unwrap(), &settings.yahoo_base_url);
    let raw = LibraryAdapter::new(source).fetch("2330.TW").await;
    assert_eq!(raw, RawQuote::new(Some(dec!(1045)), Some(dec!(1030))));
}

#[tokio::test]
async fn library_with_null_chart_result_is_absent() {
    let server = MockServer::start().await;
    Mock::given(path("/v8/finance/chart/2330.TW"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"chart": {"result": null}})))
        .mount(&server)
        .await;
    Mock::given(path("/v7/finance/quote"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"quoteResponse": {"result": []}})))
        .mount(&server)
        .await;

    let provider = build_provider(ProviderKind::Library, &settings_for(&server)).unwrap();
    assert_eq!(provider.fetch("2330.TW").await, RawQuote::absent());
}
