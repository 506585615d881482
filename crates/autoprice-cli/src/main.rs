mod reconcile;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use autoprice_core::ListingCondition;

#[derive(Debug, Parser)]
#[command(name = "autoprice-cli")]
#[command(about = "Reconcile catalog trim prices against used-car listings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Reconcile every trim of one catalog model against both sources
    Reconcile {
        #[arg(long)]
        brand: String,
        #[arg(long)]
        model: String,
        /// Catalog file (defaults to `AUTOPRICE_CATALOG_PATH`)
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// `used` or `near-new` (defaults to `AUTOPRICE_CONDITION`)
        #[arg(long)]
        condition: Option<ListingCondition>,
        /// Print results as JSON instead of one line per trim
        #[arg(long)]
        json: bool,
    },
    /// Run one ad-hoc search and print both source aggregates
    Search {
        #[command(flatten)]
        query: QueryArgs,
        /// Reference price to reconcile the result against
        #[arg(long)]
        price: Option<Decimal>,
        #[arg(long)]
        condition: Option<ListingCondition>,
        #[arg(long)]
        json: bool,
    },
    /// Print the power bracket a source filter would use
    Bracket {
        /// Power in hp; trailing text such as "110 CV" is ignored
        #[arg(value_parser = parse_power_arg)]
        power: u32,
    },
    /// Print the URLs a search would fetch, without fetching them
    Urls {
        #[command(flatten)]
        query: QueryArgs,
        #[arg(long)]
        condition: Option<ListingCondition>,
    },
}

/// Search fields shared by `search` and `urls`.
#[derive(Debug, clap::Args)]
struct QueryArgs {
    #[arg(long)]
    brand: String,
    #[arg(long)]
    model: String,
    /// Fuel label as written in the catalog, e.g. "Gasolina"
    #[arg(long)]
    fuel: String,
    #[arg(long, value_parser = parse_power_arg)]
    power: u32,
    /// Transmission label as written in the catalog, e.g. "Manual"
    #[arg(long)]
    transmission: String,
    /// Model year; repeat for a range
    #[arg(long = "year")]
    years: Vec<u16>,
}

fn parse_power_arg(raw: &str) -> Result<u32, String> {
    autoprice_core::parse_power(raw).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = autoprice_core::load_app_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Reconcile {
            brand,
            model,
            catalog,
            condition,
            json,
        } => {
            let catalog_path = catalog.unwrap_or_else(|| config.catalog_path.clone());
            reconcile::run_reconcile(&config, &catalog_path, &brand, &model, condition, json)
                .await?;
        }
        Commands::Search {
            query,
            price,
            condition,
            json,
        } => {
            reconcile::run_search(&config, &query, price, condition, json).await?;
        }
        Commands::Bracket { power } => {
            let bracket = autoprice_core::resolve_power_bracket(power);
            println!("{power} hp -> [{}, {}]", bracket.lower, bracket.upper);
        }
        Commands::Urls { query, condition } => {
            reconcile::run_urls(&config, &query, condition)?;
        }
    }

    Ok(())
}
