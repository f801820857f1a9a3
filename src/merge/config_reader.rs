use crate::merge::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const DEFAULT_VOTES_FILE: &str = "election_2025_official.csv";
pub const DEFAULT_LOCATIONS_FILE: &str = "romanian_voting_stations_full.csv";
pub const DEFAULT_OUTPUT_FILE: &str = "merged_voting_stations.csv";

pub const DEFAULT_CANDIDATE_A_COLUMN: &str = "GEORGE-NICOLAE SIMION-voturi";
pub const DEFAULT_CANDIDATE_B_COLUMN: &str = "NICUȘOR-DANIEL DAN-voturi";

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeConfig {
    #[serde(rename = "votesFilePath")]
    pub votes_file_path: Option<String>,
    #[serde(rename = "locationsFilePath")]
    pub locations_file_path: Option<String>,
    #[serde(rename = "outputFilePath")]
    pub output_file_path: Option<String>,
    #[serde(rename = "candidateAColumn")]
    pub candidate_a_column: Option<String>,
    #[serde(rename = "candidateBColumn")]
    pub candidate_b_column: Option<String>,
    #[serde(rename = "candidateALabel")]
    pub candidate_a_label: Option<String>,
    #[serde(rename = "candidateBLabel")]
    pub candidate_b_label: Option<String>,
    #[serde(rename = "uatAggregation")]
    pub uat_aggregation: Option<bool>,
    #[serde(rename = "countyPrefixes")]
    pub county_prefixes: Option<Vec<String>>,
    /// Variant spelling -> canonical county name, on top of the built-in entries.
    #[serde(rename = "countyMapping")]
    pub county_mapping: Option<BTreeMap<String, String>>,
    pub delimiter: Option<String>,
}

/// The vote count headers of the two candidates, and the names used for them
/// in the output headers.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CandidateColumns {
    pub a_column: String,
    pub b_column: String,
    pub a_label: String,
    pub b_label: String,
}

impl CandidateColumns {
    pub fn votes_a_header(&self) -> String {
        format!("votes_{}", self.a_label)
    }
    pub fn votes_b_header(&self) -> String {
        format!("votes_{}", self.b_label)
    }
    pub fn percentage_header(&self) -> String {
        format!("{}_percentage", self.a_label)
    }
    pub fn uat_average_header(&self) -> String {
        format!("uat_{}_avg_percentage", self.a_label)
    }
    pub fn uat_diff_header(&self) -> String {
        format!("{}_vs_uat_diff", self.a_label)
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MergeSettings {
    pub votes_path: String,
    pub locations_path: String,
    pub output_path: String,
    pub columns: CandidateColumns,
    pub rules: MergeRules,
    pub delimiter: u8,
}

pub fn read_config(path: &str) -> SmResult<MergeConfig> {
    let contents = fs::read_to_string(path).context(ReadingFileSnafu { path })?;
    let config: MergeConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

// Relative paths in a configuration file are relative to that file.
fn resolve_path(root: Option<&Path>, p: &str) -> String {
    match root {
        Some(r) if Path::new(p).is_relative() => {
            let full: PathBuf = r.join(p);
            full.display().to_string()
        }
        _ => p.to_string(),
    }
}

fn parse_delimiter(d: &Option<String>) -> SmResult<u8> {
    match d.as_deref() {
        None => Ok(b','),
        Some("\\t") | Some("\t") => Ok(b'\t'),
        Some(s) if s.len() == 1 => Ok(s.as_bytes()[0]),
        Some(s) => whatever!("Delimiter must be a single ASCII character, got {:?}", s),
    }
}

fn non_empty(label: &str, s: String) -> SmResult<String> {
    if s.trim().is_empty() {
        whatever!("{} may not be empty", label)
    }
    Ok(s)
}

/// Combines the configuration file (if any), the command line and the
/// defaults. The command line wins over the file.
pub fn resolve_settings(args: &Args) -> SmResult<MergeSettings> {
    let (config, root) = match &args.config {
        Some(p) => {
            let root = Path::new(p).parent().map(|r| r.to_path_buf());
            (read_config(p)?, root)
        }
        None => (MergeConfig::default(), None),
    };
    let root = root.as_deref();

    let votes_path = match (&args.votes, &config.votes_file_path) {
        (Some(p), _) => p.clone(),
        (None, Some(p)) => resolve_path(root, p),
        (None, None) => DEFAULT_VOTES_FILE.to_string(),
    };
    let locations_path = match (&args.locations, &config.locations_file_path) {
        (Some(p), _) => p.clone(),
        (None, Some(p)) => resolve_path(root, p),
        (None, None) => DEFAULT_LOCATIONS_FILE.to_string(),
    };
    let output_path = match (&args.out, &config.output_file_path) {
        (Some(p), _) => p.clone(),
        (None, Some(p)) => resolve_path(root, p),
        (None, None) => DEFAULT_OUTPUT_FILE.to_string(),
    };

    let columns = CandidateColumns {
        a_column: non_empty(
            "candidateAColumn",
            config
                .candidate_a_column
                .clone()
                .unwrap_or_else(|| DEFAULT_CANDIDATE_A_COLUMN.to_string()),
        )?,
        b_column: non_empty(
            "candidateBColumn",
            config
                .candidate_b_column
                .clone()
                .unwrap_or_else(|| DEFAULT_CANDIDATE_B_COLUMN.to_string()),
        )?,
        a_label: non_empty(
            "candidateALabel",
            config
                .candidate_a_label
                .clone()
                .unwrap_or_else(|| "simion".to_string()),
        )?,
        b_label: non_empty(
            "candidateBLabel",
            config
                .candidate_b_label
                .clone()
                .unwrap_or_else(|| "dan".to_string()),
        )?,
    };

    let mut rules = MergeRules {
        uat_aggregation: !args.no_uat && config.uat_aggregation.unwrap_or(true),
        ..MergeRules::default()
    };
    if let Some(prefixes) = &config.county_prefixes {
        rules.county_prefixes = prefixes.clone();
    }
    if let Some(mapping) = &config.county_mapping {
        let extra: Vec<(String, String)> = mapping
            .iter()
            .map(|(v, c)| (v.clone(), c.clone()))
            .collect();
        rules = rules.with_extra_mapping(&extra);
    }

    Ok(MergeSettings {
        votes_path,
        locations_path,
        output_path,
        columns,
        rules,
        delimiter: parse_delimiter(&config.delimiter)?,
    })
}
