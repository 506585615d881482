//! Reconciliation command handlers for the CLI.
//!
//! These are called from `main` after config is loaded. Source failures never
//! abort a run; they show up as missing aggregates in the printed results.

use std::path::Path;

use rust_decimal::Decimal;

use autoprice_core::{
    AppConfig, BatchSummary, ListingCondition, ReconciliationResult, SearchQuery,
    SourcePriceAggregate,
};
use autoprice_scraper::{Engine, EngineSettings, MarketSnapshot};

use crate::QueryArgs;

fn build_engine(
    config: &AppConfig,
    condition: Option<ListingCondition>,
) -> anyhow::Result<Engine> {
    let mut settings = EngineSettings::from_app_config(config);
    if let Some(condition) = condition {
        settings.condition = condition;
    }
    Engine::new(&settings).map_err(|e| anyhow::anyhow!("failed to build engine: {e}"))
}

fn build_query(args: &QueryArgs) -> anyhow::Result<SearchQuery> {
    SearchQuery::new(
        &args.brand,
        &args.model,
        &args.fuel,
        args.power,
        &args.transmission,
        args.years.iter().copied(),
    )
    .map_err(|e| anyhow::anyhow!("invalid search: {e}"))
}

/// Reconcile every trim of `brand`/`model` from the catalog at `catalog_path`.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded, the model is not in it,
/// or the engine cannot be built. Per-trim failures are recorded as `no_data`.
pub(crate) async fn run_reconcile(
    config: &AppConfig,
    catalog_path: &Path,
    brand: &str,
    model: &str,
    condition: Option<ListingCondition>,
    json: bool,
) -> anyhow::Result<()> {
    let catalog = autoprice_core::load_catalog(catalog_path)?;
    let (brand_entry, model_entry) = catalog
        .find_model(brand, model)
        .ok_or_else(|| anyhow::anyhow!("model '{brand} {model}' not found in catalog"))?;

    let engine = build_engine(config, condition)?;
    tracing::info!(
        brand = %brand_entry.name,
        model = %model_entry.name,
        trims = model_entry.trims.len(),
        condition = %engine.condition(),
        "starting batch reconciliation"
    );

    let (results, summary) = engine
        .reconcile_batch(&brand_entry.name, &model_entry.name, &model_entry.trims)
        .await;

    if json {
        let body = serde_json::json!({ "results": results, "summary": summary });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("{} {}", brand_entry.name, model_entry.name);
    for result in &results {
        println!("  {}", format_result_line(result));
    }
    println!("{}", format_summary(&summary));
    Ok(())
}

/// Run one ad-hoc search, optionally reconciling it against `price`.
///
/// # Errors
///
/// Returns an error if the query is invalid or the engine cannot be built.
pub(crate) async fn run_search(
    config: &AppConfig,
    args: &QueryArgs,
    price: Option<Decimal>,
    condition: Option<ListingCondition>,
    json: bool,
) -> anyhow::Result<()> {
    let query = build_query(args)?;
    let engine = build_engine(config, condition)?;
    let MarketSnapshot {
        classifieds,
        tabular,
    } = engine.search(&query).await;

    let label = format!("{} {} {} hp", query.brand(), query.model(), query.power());
    let result = ReconciliationResult::from_aggregates(label, price, classifieds, tabular);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("classifieds: {}", format_aggregate(result.classifieds.as_ref()));
    println!("tabular:     {}", format_aggregate(result.tabular.as_ref()));
    if price.is_some() {
        println!("{}", format_result_line(&result));
    }
    Ok(())
}

/// Print the URLs a search would fetch.
///
/// # Errors
///
/// Returns an error if the query is invalid or a base URL cannot be parsed.
pub(crate) fn run_urls(
    config: &AppConfig,
    args: &QueryArgs,
    condition: Option<ListingCondition>,
) -> anyhow::Result<()> {
    let query = build_query(args)?;
    let engine = build_engine(config, condition)?;
    for url in engine.planned_urls(&query)? {
        println!("{url}");
    }
    Ok(())
}

/// Format an optional price for display, or a dash when `None`.
pub(crate) fn fmt_price(price: Option<Decimal>) -> String {
    price.map_or_else(|| "\u{2014}".to_string(), |p| format!("{p} EUR"))
}

pub(crate) fn format_aggregate(aggregate: Option<&SourcePriceAggregate>) -> String {
    match aggregate {
        None => "unavailable".to_string(),
        Some(agg) if !agg.has_data() => "no listings".to_string(),
        Some(agg) => format!(
            "{} listings (from {}), min {}, mean {}",
            agg.count,
            agg.sample_size,
            fmt_price(agg.min_price),
            fmt_price(agg.mean_price),
        ),
    }
}

pub(crate) fn format_result_line(result: &ReconciliationResult) -> String {
    let gap = match (result.difference, result.percentage) {
        (Some(diff), Some(pct)) => format!("{diff} ({pct}%)"),
        _ => "\u{2014}".to_string(),
    };
    format!(
        "{:<32} ref {:>12}  market {:>12}  diff {:>16}  {}",
        result.trim,
        fmt_price(result.reference_price),
        fmt_price(result.market_price),
        gap,
        result.accuracy,
    )
}

pub(crate) fn format_summary(summary: &BatchSummary) -> String {
    format!(
        "{} trims, {} with market data, {} accurate",
        summary.total_trims, summary.with_market_data, summary.accurate
    )
}
