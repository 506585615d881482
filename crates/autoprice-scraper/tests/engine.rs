//! Integration tests for `Engine`.
//!
//! Each test stands up one `wiremock` server per listing site so no real
//! network traffic is made. Request counts are asserted with `.expect(n)`,
//! which wiremock verifies when the server is dropped.

use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use autoprice_core::{Accuracy, ListingCondition, SearchQuery, Trim};
use autoprice_scraper::{Engine, EngineSettings};

const CLASSIFIEDS_PATH: &str = "/search/";
const TABULAR_PATH: &str = "/ocasion/seat-ibiza-gasolina";

fn settings(classifieds: &MockServer, tabular: &MockServer) -> EngineSettings {
    EngineSettings {
        classifieds_base_url: classifieds.uri(),
        classifieds_market: "es".to_string(),
        tabular_base_url: tabular.uri(),
        request_timeout_secs: 5,
        user_agent: "autoprice-test/0.1".to_string(),
        accept_language: "es-ES,es;q=0.9".to_string(),
        inter_trim_delay: Duration::ZERO,
        condition: ListingCondition::Used,
    }
}

fn engine(classifieds: &MockServer, tabular: &MockServer) -> Engine {
    Engine::new(&settings(classifieds, tabular)).expect("failed to build test Engine")
}

/// Source A page embedding the given `classifiedList` entries.
fn classifieds_page(entries: &str) -> String {
    format!(
        r#"<html><body><script id="__NEXT_DATA__" type="application/json">{{"props":{{"pageProps":{{"classifieds":{{"classifiedList":[{entries}]}}}}}}}}</script></body></html>"#
    )
}

/// Source B page with one results-table row per `(description, price)`.
fn tabular_page(rows: &[(&str, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(desc, price)| {
            format!("<tr><td>{desc}</td><td>{price}</td><td>110 CV</td><td>5,1 l</td><td>4.059 mm</td><td>355 l</td></tr>")
        })
        .collect();
    format!(
        r#"<html><body><table class="results"><tr><th>Versión</th><th>Precio</th><th>Potencia</th><th>Consumo</th><th>Longitud</th><th>Maletero</th></tr>{body}</table></body></html>"#
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

fn ibiza_trim(name: &str, power: Option<u32>) -> Trim {
    Trim {
        name: name.to_string(),
        fuel: Some("gasolina".to_string()),
        power,
        transmission: Some("manual".to_string()),
        price: Some(Decimal::from(18_000)),
        years: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Single trim
// ---------------------------------------------------------------------------

#[tokio::test]
async fn seat_ibiza_reconciles_against_cheapest_classified() {
    let classifieds = MockServer::start().await;
    let tabular = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CLASSIFIEDS_PATH))
        .and(query_param("makeModel[]", "seat:ibiza"))
        .and(query_param("fuel[]", "petrol"))
        .and(query_param("gearbox[]", "manual"))
        .respond_with(html(classifieds_page(
            r#"{"title":"SEAT Ibiza 1.0 TSI Style","price":{"amount":18900},"hp":110,"isZeroKm":false},
               {"title":"SEAT Ibiza 1.0 TSI Style","price":{"amount":17500},"hp":110,"isZeroKm":false}"#,
        )))
        .expect(1)
        .mount(&classifieds)
        .await;

    Mock::given(method("GET"))
        .and(path(TABULAR_PATH))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&tabular)
        .await;

    let result = engine(&classifieds, &tabular)
        .reconcile_trim("Seat", "Ibiza", &ibiza_trim("1.0 TSI 110 CV Style", Some(110)))
        .await;

    assert_eq!(result.difference, Some(Decimal::from(500)));
    assert_eq!(result.percentage, Some(Decimal::new(278, 2)));
    assert_eq!(result.accuracy, Accuracy::Exact);

    let agg = result.classifieds.expect("classifieds aggregate");
    assert_eq!(agg.count, 2);
    assert_eq!(agg.min_price, Some(Decimal::from(17_500)));
    assert_eq!(agg.mean_price, Some(Decimal::from(18_200)));
    assert!(result.tabular.is_none(), "404 must degrade to a missing aggregate");
}

#[tokio::test]
async fn tabular_rows_are_pooled_into_one_listing() {
    let classifieds = MockServer::start().await;
    let tabular = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CLASSIFIEDS_PATH))
        .respond_with(html(classifieds_page("")))
        .mount(&classifieds)
        .await;

    Mock::given(method("GET"))
        .and(path(TABULAR_PATH))
        .and(query_param("power_from", "100"))
        .and(query_param("power_to", "110"))
        .and(query_param("gearbox", "manual"))
        .respond_with(html(tabular_page(&[
            ("1.0 TSI 110 CV (2021) Style", "16.000 €"),
            ("1.0 TSI 110 CV (2020) FR", "17.000 €"),
            ("1.0 TSI 110 CV (2022) Xcellence", "18.500 €"),
        ])))
        .expect(1)
        .mount(&tabular)
        .await;

    let result = engine(&classifieds, &tabular)
        .reconcile_trim("Seat", "Ibiza", &ibiza_trim("Style", Some(110)))
        .await;

    let pooled = result.tabular.expect("tabular aggregate");
    assert_eq!(pooled.listings.len(), 1);
    assert_eq!(pooled.sample_size, 3);
    // (16000 + 17000 + 18500) / 3 = 17166.67 → 17167
    assert_eq!(pooled.listings[0].price, Decimal::from(17_167));
    assert_eq!(result.market_price, Some(Decimal::from(17_167)));
    // 833 / 18000 = 4.63%
    assert_eq!(result.accuracy, Accuracy::Exact);

    let empty = result.classifieds.expect("classifieds aggregate");
    assert_eq!(empty.count, 0);
    assert_eq!(empty.min_price, None);
}

#[tokio::test]
async fn transport_failure_on_one_source_keeps_the_other() {
    let classifieds = MockServer::start().await;
    let tabular = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CLASSIFIEDS_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&classifieds)
        .await;

    Mock::given(method("GET"))
        .and(path(TABULAR_PATH))
        .respond_with(html(tabular_page(&[("1.0 TSI 110 CV", "17.800 €")])))
        .expect(1)
        .mount(&tabular)
        .await;

    let result = engine(&classifieds, &tabular)
        .reconcile_trim("Seat", "Ibiza", &ibiza_trim("Style", Some(110)))
        .await;

    assert!(result.classifieds.is_none());
    assert_eq!(result.market_price, Some(Decimal::from(17_800)));
    assert_eq!(result.accuracy, Accuracy::Exact);
}

#[tokio::test]
async fn garbled_pages_produce_empty_aggregates_and_no_data() {
    let classifieds = MockServer::start().await;
    let tabular = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CLASSIFIEDS_PATH))
        .respond_with(html("<html><body>maintenance</body></html>".to_string()))
        .mount(&classifieds)
        .await;

    Mock::given(method("GET"))
        .and(path(TABULAR_PATH))
        .respond_with(html("<html><body><p>Sin resultados</p></body></html>".to_string()))
        .mount(&tabular)
        .await;

    let result = engine(&classifieds, &tabular)
        .reconcile_trim("Seat", "Ibiza", &ibiza_trim("Style", Some(110)))
        .await;

    assert_eq!(result.accuracy, Accuracy::NoData);
    assert_eq!(result.classifieds.map(|a| a.count), Some(0));
    assert_eq!(result.tabular.map(|a| a.count), Some(0));
    assert!(result.difference.is_none());
}

#[tokio::test]
async fn near_new_classifieds_are_excluded_from_used_search() {
    let classifieds = MockServer::start().await;
    let tabular = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CLASSIFIEDS_PATH))
        .respond_with(html(classifieds_page(
            r#"{"title":"km0 unit","price":{"amount":12000},"isZeroKm":true},
               {"title":"used unit","price":{"amount":17900},"isZeroKm":false}"#,
        )))
        .mount(&classifieds)
        .await;

    Mock::given(method("GET"))
        .and(path(TABULAR_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&tabular)
        .await;

    let result = engine(&classifieds, &tabular)
        .reconcile_trim("Seat", "Ibiza", &ibiza_trim("Style", Some(110)))
        .await;

    let agg = result.classifieds.expect("classifieds aggregate");
    assert_eq!(agg.count, 1);
    assert_eq!(agg.min_price, Some(Decimal::from(17_900)));
}

#[tokio::test]
async fn requests_carry_browser_headers() {
    let classifieds = MockServer::start().await;
    let tabular = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CLASSIFIEDS_PATH))
        .and(header("user-agent", "autoprice-test/0.1"))
        .and(header("accept-language", "es-ES,es;q=0.9"))
        .respond_with(html(classifieds_page("")))
        .expect(1)
        .mount(&classifieds)
        .await;

    Mock::given(method("GET"))
        .and(path(TABULAR_PATH))
        .and(header("accept-language", "es-ES,es;q=0.9"))
        .respond_with(html(tabular_page(&[])))
        .expect(1)
        .mount(&tabular)
        .await;

    let query = SearchQuery::new("Seat", "Ibiza", "gasolina", 110, "manual", []).unwrap();
    engine(&classifieds, &tabular).search(&query).await;
}

// ---------------------------------------------------------------------------
// Year-range fallback (Source B)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_year_filtered_page_triggers_exactly_one_retry_without_years() {
    let classifieds = MockServer::start().await;
    let tabular = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CLASSIFIEDS_PATH))
        .respond_with(html(classifieds_page("")))
        .mount(&classifieds)
        .await;

    Mock::given(method("GET"))
        .and(path(TABULAR_PATH))
        .and(query_param("year_from", "2020"))
        .and(query_param("year_to", "2022"))
        .respond_with(html(tabular_page(&[])))
        .expect(1)
        .mount(&tabular)
        .await;

    Mock::given(method("GET"))
        .and(path(TABULAR_PATH))
        .and(query_param_is_missing("year_from"))
        .and(query_param_is_missing("year_to"))
        .respond_with(html(tabular_page(&[
            ("1.0 TSI 110 CV (2018)", "13.000 €"),
            ("1.0 TSI 110 CV (2019)", "14.000 €"),
        ])))
        .expect(1)
        .mount(&tabular)
        .await;

    let query =
        SearchQuery::new("Seat", "Ibiza", "gasolina", 110, "manual", [2022, 2020, 2021]).unwrap();
    let snapshot = engine(&classifieds, &tabular).search(&query).await;

    let pooled = snapshot.tabular.expect("tabular aggregate");
    assert_eq!(pooled.listings.len(), 1);
    assert_eq!(pooled.min_price, Some(Decimal::from(13_500)));
}

#[tokio::test]
async fn fallback_is_not_attempted_when_year_filtered_page_has_rows() {
    let classifieds = MockServer::start().await;
    let tabular = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CLASSIFIEDS_PATH))
        .respond_with(html(classifieds_page("")))
        .mount(&classifieds)
        .await;

    Mock::given(method("GET"))
        .and(path(TABULAR_PATH))
        .and(query_param("year_from", "2021"))
        .respond_with(html(tabular_page(&[("1.0 TSI (2021)", "16.500 €")])))
        .expect(1)
        .mount(&tabular)
        .await;

    Mock::given(method("GET"))
        .and(path(TABULAR_PATH))
        .and(query_param_is_missing("year_from"))
        .respond_with(html(tabular_page(&[("should not be fetched", "1 €")])))
        .expect(0)
        .mount(&tabular)
        .await;

    let query = SearchQuery::new("Seat", "Ibiza", "gasolina", 110, "manual", [2021]).unwrap();
    let snapshot = engine(&classifieds, &tabular).search(&query).await;
    assert_eq!(
        snapshot.tabular.and_then(|a| a.min_price),
        Some(Decimal::from(16_500))
    );
}

#[tokio::test]
async fn fallback_that_also_finds_nothing_yields_empty_aggregate() {
    let classifieds = MockServer::start().await;
    let tabular = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CLASSIFIEDS_PATH))
        .respond_with(html(classifieds_page("")))
        .mount(&classifieds)
        .await;

    Mock::given(method("GET"))
        .and(path(TABULAR_PATH))
        .respond_with(html(tabular_page(&[])))
        .expect(2)
        .mount(&tabular)
        .await;

    let query = SearchQuery::new("Seat", "Ibiza", "gasolina", 110, "manual", [2021]).unwrap();
    let snapshot = engine(&classifieds, &tabular).search(&query).await;

    let agg = snapshot.tabular.expect("tabular aggregate");
    assert_eq!(agg.count, 0);
    assert_eq!(agg.min_price, None);
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn batch_skips_incomplete_trims_without_network() {
    let classifieds = MockServer::start().await;
    let tabular = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CLASSIFIEDS_PATH))
        .respond_with(html(classifieds_page(
            r#"{"title":"SEAT Ibiza","price":{"amount":17600}}"#,
        )))
        .expect(3)
        .mount(&classifieds)
        .await;

    Mock::given(method("GET"))
        .and(path(TABULAR_PATH))
        .respond_with(html(tabular_page(&[("1.0 TSI", "17.700 €")])))
        .expect(3)
        .mount(&tabular)
        .await;

    let mut no_fuel = ibiza_trim("no fuel", Some(95));
    no_fuel.fuel = None;
    let mut no_gearbox = ibiza_trim("no gearbox", Some(110));
    no_gearbox.transmission = None;

    let trims = vec![
        ibiza_trim("a", Some(80)),
        no_fuel,
        ibiza_trim("b", Some(110)),
        no_gearbox,
        ibiza_trim("c", Some(115)),
    ];

    let (results, summary) = engine(&classifieds, &tabular)
        .reconcile_batch("Seat", "Ibiza", &trims)
        .await;

    assert_eq!(results.len(), 5);
    assert_eq!(summary.total_trims, 5);
    assert_eq!(summary.with_market_data, 3);
    assert_eq!(summary.accurate, 3);
    assert_eq!(results[1].accuracy, Accuracy::NoData);
    assert_eq!(results[3].accuracy, Accuracy::NoData);
    assert_eq!(
        results.iter().map(|r| r.trim.as_str()).collect::<Vec<_>>(),
        vec!["a", "no fuel", "b", "no gearbox", "c"]
    );
}

#[tokio::test]
async fn batch_continues_past_failing_trim() {
    let classifieds = MockServer::start().await;
    let tabular = MockServer::start().await;

    // The 80 hp trim hits a broken upstream; the 110 hp trim succeeds.
    Mock::given(method("GET"))
        .and(path(CLASSIFIEDS_PATH))
        .and(query_param("power[]", "80"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&classifieds)
        .await;
    Mock::given(method("GET"))
        .and(path(CLASSIFIEDS_PATH))
        .and(query_param("power[]", "110"))
        .respond_with(html(classifieds_page(
            r#"{"title":"SEAT Ibiza","price":{"amount":17900}}"#,
        )))
        .mount(&classifieds)
        .await;

    Mock::given(method("GET"))
        .and(path(TABULAR_PATH))
        .and(query_param("power_to", "80"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&tabular)
        .await;
    Mock::given(method("GET"))
        .and(path(TABULAR_PATH))
        .and(query_param("power_to", "110"))
        .respond_with(html(tabular_page(&[])))
        .mount(&tabular)
        .await;

    let trims = vec![ibiza_trim("broken", Some(80)), ibiza_trim("fine", Some(110))];
    let (results, summary) = engine(&classifieds, &tabular)
        .reconcile_batch("Seat", "Ibiza", &trims)
        .await;

    assert_eq!(results[0].accuracy, Accuracy::NoData);
    assert_eq!(results[1].accuracy, Accuracy::Exact);
    assert_eq!(summary.total_trims, 2);
    assert_eq!(summary.with_market_data, 1);
}

#[tokio::test]
async fn batch_pauses_between_trims() {
    let classifieds = MockServer::start().await;
    let tabular = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html(classifieds_page("")))
        .mount(&classifieds)
        .await;
    Mock::given(method("GET"))
        .respond_with(html(tabular_page(&[])))
        .mount(&tabular)
        .await;

    let mut s = settings(&classifieds, &tabular);
    s.inter_trim_delay = Duration::from_millis(40);
    let engine = Engine::new(&s).expect("engine");

    let trims = vec![
        ibiza_trim("a", Some(110)),
        ibiza_trim("b", Some(110)),
        ibiza_trim("c", Some(110)),
    ];

    let started = Instant::now();
    let (results, _) = engine.reconcile_batch("Seat", "Ibiza", &trims).await;

    assert_eq!(results.len(), 3);
    // Two gaps between three trims.
    assert!(
        started.elapsed() >= Duration::from_millis(80),
        "expected at least two pauses, took {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn planned_urls_include_fallback_only_with_years() {
    let classifieds = MockServer::start().await;
    let tabular = MockServer::start().await;
    let engine = engine(&classifieds, &tabular);

    let with_years = SearchQuery::new("Seat", "Ibiza", "gasolina", 110, "manual", [2021]).unwrap();
    let without_years = SearchQuery::new("Seat", "Ibiza", "gasolina", 110, "manual", []).unwrap();

    assert_eq!(engine.planned_urls(&with_years).unwrap().len(), 3);
    assert_eq!(engine.planned_urls(&without_years).unwrap().len(), 2);
}

#[tokio::test]
async fn oversized_amounts_do_not_abort_the_batch() {
    let classifieds = MockServer::start().await;
    let tabular = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CLASSIFIEDS_PATH))
        .respond_with(html(classifieds_page(
            r#"{"title":"broken feed","price":{"amount":5e28}},
               {"title":"broken feed","price":{"amount":5e28}},
               {"title":"SEAT Ibiza","price":{"amount":"17500.00"}}"#,
        )))
        .expect(2)
        .mount(&classifieds)
        .await;

    Mock::given(method("GET"))
        .and(path(TABULAR_PATH))
        .respond_with(html(tabular_page(&[("1.0 TSI", "0 €")])))
        .expect(2)
        .mount(&tabular)
        .await;

    let trims = vec![ibiza_trim("a", Some(110)), ibiza_trim("b", Some(110))];
    let (results, summary) = engine(&classifieds, &tabular)
        .reconcile_batch("Seat", "Ibiza", &trims)
        .await;

    assert_eq!(summary.total_trims, 2);
    for result in &results {
        let agg = result.classifieds.as_ref().expect("classifieds aggregate");
        assert_eq!(agg.count, 1);
        assert_eq!(result.market_price, Some(Decimal::from(17_500)));
        assert_eq!(result.accuracy, Accuracy::Exact);
        assert_eq!(result.tabular.as_ref().map(|a| a.count), Some(0));
    }
}
