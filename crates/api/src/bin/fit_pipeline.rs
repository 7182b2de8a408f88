//! Fit the feature pipeline on a training set and write the artifact.
//!
//! ```text
//! fit-pipeline <input.json> <pipeline.json> [--listings] [--exclude COL,COL]
//! ```
//!
//! The input is a JSON array of merged vehicle records. With `--listings` it
//! is an array of listings instead; their VINs are batch-decoded and merged
//! before fitting, and unmatched or incomplete rows are dropped.

use anyhow::{bail, Context};
use api::{init_logging, AppConfig};
use data_validator::{DecodedVehicle, Listing, VinRecordAdapter};
use feature_engine::{FeaturePipeline, PipelineConfig, VehicleRecord};
use tracing::{info, warn};
use vin_decoder::VinDecoder;

struct Args {
    input: String,
    output: String,
    listings: bool,
    exclude: Vec<String>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut positional = Vec::new();
    let mut listings = false;
    let mut exclude = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--listings" => listings = true,
            "--exclude" => {
                let columns = args.next().context("--exclude needs a column list")?;
                exclude.extend(
                    columns
                        .split(',')
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(String::from),
                );
            }
            _ => positional.push(arg),
        }
    }

    let [input, output] = <[String; 2]>::try_from(positional).map_err(|_| {
        anyhow::anyhow!("usage: fit-pipeline <input.json> <pipeline.json> [--listings] [--exclude COL,COL]")
    })?;
    Ok(Args {
        input,
        output,
        listings,
        exclude,
    })
}

async fn records_from_listings(listings: &[Listing]) -> anyhow::Result<Vec<VehicleRecord>> {
    let config = AppConfig::load()?;
    let decoder = VinDecoder::new(config.vin_decoder)?;

    let vins: Vec<String> = listings.iter().map(|l| l.vin.clone()).collect();
    let payloads = decoder.decode_batch(&vins).await?;
    let decoded: Vec<DecodedVehicle> = payloads.iter().map(DecodedVehicle::from_payload).collect();

    let report = VinRecordAdapter::new().merge_batch(listings, &decoded);
    if !report.unmatched_listings.is_empty() {
        warn!("{} listings had no decode result", report.unmatched_listings.len());
    }
    for (vin, err) in &report.schema_failures {
        warn!("Dropping {}: {}", vin, err);
    }
    Ok(report.records)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let args = parse_args()?;

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input))?;

    let records = if args.listings {
        let listings: Vec<Listing> =
            serde_json::from_str(&raw).with_context(|| format!("parsing listings in {}", args.input))?;
        records_from_listings(&listings).await?
    } else {
        serde_json::from_str::<Vec<VehicleRecord>>(&raw)
            .with_context(|| format!("parsing records in {}", args.input))?
    };

    if records.is_empty() {
        bail!("no usable training records in {}", args.input);
    }

    let pipeline = FeaturePipeline::new(PipelineConfig::with_exclusions(args.exclude));
    let fitted = pipeline.fit(&records)?;
    fitted.save(&args.output)?;

    info!(
        "Wrote pipeline to {}: {} records, {} features",
        args.output,
        records.len(),
        fitted.columns().len()
    );
    Ok(())
}
