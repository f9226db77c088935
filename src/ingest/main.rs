//! Address directory and category ingest pipeline.
//!
//! Loads cleaned G-NAF address exports (CSV, one file per state) into the
//! address index and seeds the produce-category reference index. The
//! upstream spreadsheet cleaning is done by external scripts; this binary
//! only consumes their output.

mod config;

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use csv::ReaderBuilder;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use paddock::models::{AddressRecord, GeoPoint};
use paddock::store::{create_indices, BulkIndexer, EsStore, Index};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Ingest cleaned address data into Elasticsearch")]
struct Args {
    /// Path to the ingest config file
    #[arg(short, long, default_value = "ingest.toml")]
    config: std::path::PathBuf,

    /// Delete and recreate all indices before import
    #[arg(long)]
    recreate_indices: bool,

    /// Batch size for bulk indexing
    #[arg(long, default_value = "5000")]
    batch_size: usize,
}

/// One row of a cleaned G-NAF export.
#[derive(Debug, Deserialize)]
struct AddressRow {
    locality_name: String,
    street_name: Option<String>,
    street_type_code: Option<String>,
    postcode: String,
    longitude: f64,
    latitude: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Paddock Ingest Pipeline");
    let config = Config::load_from_file(&args.config)?;

    let store = EsStore::new(&config.global.es_url, &config.global.index_prefix)
        .context("Failed to connect to Elasticsearch")?;

    if !store.health_check().await? {
        anyhow::bail!("Elasticsearch cluster is not healthy");
    }
    info!("Connected to Elasticsearch at {}", config.global.es_url);

    create_indices(&store, args.recreate_indices).await?;

    for source in &config.addresses {
        ingest_addresses(&store, &source.state, &source.file, args.batch_size).await?;
    }

    seed_categories(&store, &config.categories).await?;

    let address_count = store.doc_count(Index::Addresses).await?;
    info!("Ingest complete, {} addresses indexed", address_count);

    Ok(())
}

/// Stream one cleaned address CSV into the address index.
async fn ingest_addresses(
    store: &EsStore,
    state: &str,
    path: &Path,
    batch_size: usize,
) -> Result<()> {
    info!("Ingesting {} addresses from {}", state, path.display());

    let total_count = count_rows(path)?;
    let file = File::open(path).context("Failed to open address file")?;
    let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(file);

    // Create progress bar
    let pb = ProgressBar::new(total_count);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let state = state.trim().to_uppercase();
    let mut indexer = BulkIndexer::new(store.clone(), Index::Addresses, batch_size);
    let mut skipped = 0usize;

    for result in csv_reader.deserialize::<AddressRow>() {
        pb.inc(1);

        let row = match result {
            Ok(row) => row,
            Err(err) => {
                warn!("Skipping malformed row: {}", err);
                skipped += 1;
                continue;
            }
        };

        let record = to_record(row, &state);
        indexer
            .add(uuid::Uuid::new_v4().to_string(), serde_json::to_value(&record)?)
            .await?;
    }

    let (indexed, errors) = indexer.finish().await?;
    pb.finish_and_clear();
    info!(
        "{}: {} indexed, {} errors, {} skipped",
        state, indexed, errors, skipped
    );

    Ok(())
}

/// Build a directory record, normalizing the same way farm addresses are.
fn to_record(row: AddressRow, state: &str) -> AddressRecord {
    let street = join_street(row.street_name.as_deref(), row.street_type_code.as_deref());
    let postcode = row.postcode.trim().to_string();

    AddressRecord {
        locality: row.locality_name.trim().to_uppercase(),
        street,
        postcode_int: postcode.parse::<i64>().ok(),
        postcode,
        state: state.to_string(),
        point: GeoPoint {
            lat: row.latitude,
            lon: row.longitude,
        },
    }
}

/// Combine street name and type code into one upper-cased street field.
/// The cleaning scripts emit "nan" for missing type codes.
fn join_street(name: Option<&str>, type_code: Option<&str>) -> Option<String> {
    let name = name.map(str::trim).filter(|n| !n.is_empty() && *n != "nan")?;
    let type_code = type_code
        .map(str::trim)
        .filter(|t| !t.is_empty() && *t != "nan");

    Some(match type_code {
        Some(type_code) => format!("{} {}", name, type_code).to_uppercase(),
        None => name.to_uppercase(),
    })
}

/// Seed the produce-category reference index.
async fn seed_categories(store: &EsStore, categories: &[String]) -> Result<()> {
    if categories.is_empty() {
        return Ok(());
    }

    let mut indexer = BulkIndexer::new(store.clone(), Index::Categories, categories.len());
    for category in categories {
        indexer
            .add(category.clone(), json!({ "value": category }))
            .await?;
    }
    let (indexed, errors) = indexer.finish().await?;
    info!("Seeded {} categories ({} errors)", indexed, errors);

    Ok(())
}

fn count_rows(path: &Path) -> Result<u64> {
    let file = File::open(path).context("Failed to open address file")?;
    let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(file);
    let mut count = 0u64;
    for _ in csv_reader.records() {
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(
        locality: &str,
        street: Option<&str>,
        type_code: Option<&str>,
        postcode: &str,
    ) -> AddressRow {
        AddressRow {
            locality_name: locality.to_string(),
            street_name: street.map(String::from),
            street_type_code: type_code.map(String::from),
            postcode: postcode.to_string(),
            longitude: 145.77,
            latitude: -16.92,
        }
    }

    #[test]
    fn test_record_normalization() {
        let record = to_record(row("Cairns", Some("Sheridan"), Some("St"), "4870"), "QLD");
        assert_eq!(record.locality, "CAIRNS");
        assert_eq!(record.street.as_deref(), Some("SHERIDAN ST"));
        assert_eq!(record.postcode, "4870");
        assert_eq!(record.postcode_int, Some(4870));
        assert_eq!(record.state, "QLD");
    }

    #[test]
    fn test_missing_street_type_code() {
        let record = to_record(row("Cairns", Some("Esplanade"), Some("nan"), "4870"), "QLD");
        assert_eq!(record.street.as_deref(), Some("ESPLANADE"));
    }

    #[test]
    fn test_missing_street_name() {
        let record = to_record(row("Cairns", None, None, "4870"), "QLD");
        assert_eq!(record.street, None);
    }

    #[test]
    fn test_unparsable_postcode() {
        let record = to_record(row("Cairns", None, None, "48X0"), "QLD");
        assert_eq!(record.postcode, "48X0");
        assert_eq!(record.postcode_int, None);
    }
}
