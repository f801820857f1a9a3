use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use station_join::*;

use std::fs;
use std::path::Path;

use text_diff::print_diff;

use crate::args::Args;

mod config_reader;
mod io_common;
mod io_locations;
mod io_output;
mod io_votes;

use crate::merge::config_reader::*;
use crate::merge::io_locations::read_locations;
use crate::merge::io_output::write_merged;
use crate::merge::io_votes::read_votes;

#[derive(Debug, Snafu)]
pub enum MergeError {
    #[snafu(display("Input file {path} not found"))]
    MissingInput { path: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading the header row of {path}"))]
    CsvHeader { source: csv::Error, path: String },
    #[snafu(display("Error parsing line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Line {lineno} of {path} is too short"))]
    CsvLineTooShort { path: String, lineno: usize },
    #[snafu(display("Expected column {column:?} not found in {path}"))]
    MissingColumn { column: String, path: String },
    #[snafu(display("Line {lineno} of {path}: column {column:?} has an invalid number {value:?}"))]
    InvalidNumber {
        path: String,
        lineno: usize,
        column: String,
        value: String,
    },
    #[snafu(display("Error writing {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Error flushing {path}"))]
    FlushOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading {path}"))]
    ReadingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the configuration {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error merging the tables"))]
    Merging { source: MergeErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SmResult<T> = Result<T, MergeError>;

const SAMPLE_UATS: usize = 10;

fn print_summary(summary: &MergeSummary, result: &MergeResult, settings: &MergeSettings) {
    println!("\nSummary:");
    println!("Total stations processed: {}", summary.total);
    println!("Stations with complete data: {}", summary.complete);
    println!(
        "Stations with missing location data: {}",
        summary.missing_location
    );
    if let Some(groups) = summary.uat_groups {
        println!("Unique UATs processed: {}", groups);
    }

    if !result.uat_averages.is_empty() {
        println!("\nSample UAT averages:");
        for avg in result.uat_averages.iter().take(SAMPLE_UATS) {
            println!(
                "{:<20} {:<30} {}",
                avg.county,
                avg.uat_name,
                avg.percentage_a
                    .map(|p| format!("{:.2}", p))
                    .unwrap_or_else(|| "-".to_string())
            );
        }
    }

    println!("\nData saved to {}", settings.output_path);
}

fn check_reference(output_path: &str, reference_path: &str) -> SmResult<()> {
    let produced = fs::read_to_string(output_path).context(ReadingFileSnafu {
        path: output_path.to_string(),
    })?;
    let reference = fs::read_to_string(reference_path).context(ReadingFileSnafu {
        path: reference_path.to_string(),
    })?;
    let produced = produced.replace("\r\n", "\n");
    let reference = reference.replace("\r\n", "\n");
    if produced != reference {
        warn!("Found differences with the reference file");
        print_diff(reference.as_str(), produced.as_str(), "\n");
        whatever!(
            "Difference detected between {} and reference {}",
            output_path,
            reference_path
        )
    }
    info!("Output matches reference {}", reference_path);
    Ok(())
}

/// Reads both tables, merges them and writes the result.
pub fn run_merge_job(args: &Args) -> SmResult<MergeSummary> {
    let settings = resolve_settings(args)?;
    info!("settings: {:?}", settings);

    for p in [&settings.votes_path, &settings.locations_path] {
        ensure!(Path::new(p).exists(), MissingInputSnafu { path: p.clone() });
    }

    println!("Reading voting data from {}...", settings.votes_path);
    let votes = read_votes(
        &settings.votes_path,
        &settings.columns,
        settings.rules.uat_aggregation,
        settings.delimiter,
    )?;
    println!(
        "Reading station location data from {}...",
        settings.locations_path
    );
    let locations = read_locations(&settings.locations_path, settings.delimiter)?;
    debug!("Voting data sample: {:?}", &votes[..votes.len().min(5)]);
    debug!(
        "Station locations sample: {:?}",
        &locations[..locations.len().min(5)]
    );

    let result = run_merge(&votes, &locations, &settings.rules).context(MergingSnafu {})?;
    debug!(
        "First rows of the result: {:?}",
        &result.records[..result.records.len().min(5)]
    );
    println!(
        "\n{} stations missing location data after merging on station_number AND county",
        result.missing_locations
    );

    println!("\nSaving results to {}...", settings.output_path);
    write_merged(
        &settings.output_path,
        &result.records,
        &settings.columns,
        settings.rules.uat_aggregation,
        settings.delimiter,
    )?;

    let summary = summarize(&result, settings.rules.uat_aggregation);
    print_summary(&summary, &result, &settings);

    if let Some(reference) = &args.reference {
        check_reference(&settings.output_path, reference)?;
    }
    Ok(summary)
}
