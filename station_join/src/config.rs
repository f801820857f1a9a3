// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// One row of the official results table, for a single voting station.
///
/// Candidate A is the candidate whose share is being reported, candidate B
/// the opponent.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteRecord {
    pub county: String,
    /// Kept as text: "007" and "7" are different stations.
    pub station_number: String,
    pub voting_station_name: String,
    pub uat_name: Option<String>,
    pub votes_a: u64,
    pub votes_b: u64,
}

/// One row of the station geolocation table.
#[derive(PartialEq, Debug, Clone)]
pub struct LocationRecord {
    pub station_number: String,
    pub county: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

// ******** Output data structures *********

/// A vote record after the join, with the derived columns.
#[derive(PartialEq, Debug, Clone)]
pub struct MergedRecord {
    pub county: String,
    pub uat_name: Option<String>,
    pub station_number: String,
    pub voting_station_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub votes_a: u64,
    pub votes_b: u64,
    pub total_votes: u64,
    /// None when nobody voted for either candidate.
    pub percentage_a: Option<f64>,
    pub uat_avg_percentage: Option<f64>,
    pub uat_diff: Option<f64>,
}

impl MergedRecord {
    /// The share of the other candidate, rounded the same way.
    pub fn percentage_b(&self) -> Option<f64> {
        crate::vote_percentage(self.votes_b, self.votes_a)
    }

    pub fn has_location(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// Totals for one (county, uat_name) group.
#[derive(PartialEq, Debug, Clone)]
pub struct UatAverage {
    pub county: String,
    pub uat_name: String,
    pub votes_a: u64,
    pub votes_b: u64,
    pub percentage_a: Option<f64>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct MergeResult {
    pub records: Vec<MergedRecord>,
    /// Empty when the UAT aggregation did not run.
    pub uat_averages: Vec<UatAverage>,
    /// Number of records without a latitude after the join.
    pub missing_locations: usize,
    /// Location rows dropped because an earlier row had the same key.
    pub duplicate_locations: usize,
}

/// Counts printed at the end of a run.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct MergeSummary {
    pub total: usize,
    /// Records where every output column has a value.
    pub complete: usize,
    pub missing_location: usize,
    /// Only set when the UAT aggregation ran.
    pub uat_groups: Option<usize>,
}

/// Errors that prevent the merge from running.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum MergeErrors {
    EmptyCountyVariant,
    EmptyCountyPrefix,
    /// A vote total does not fit in 64 bits.
    VoteCountOverflow {
        county: String,
        station_number: String,
    },
}

impl Error for MergeErrors {}

impl Display for MergeErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeErrors::EmptyCountyVariant => {
                write!(f, "MergeError: county mapping contains an empty variant")
            }
            MergeErrors::EmptyCountyPrefix => {
                write!(f, "MergeError: county prefixes contain an empty prefix")
            }
            MergeErrors::VoteCountOverflow {
                county,
                station_number,
            } => write!(
                f,
                "MergeError: vote total overflows at county {} station {}",
                county, station_number
            ),
        }
    }
}

// ********* Configuration **********

/// Prefixes removed from county names once uppercased.
pub const DEFAULT_COUNTY_PREFIXES: [&str; 3] = ["JUDEȚUL ", "JUDEŢUL ", "JUDETUL "];

/// Spellings found in the source tables, and the form used for the join.
pub const DEFAULT_COUNTY_MAPPING: [(&str, &str); 16] = [
    ("ILFOV", "ILFOV"),
    ("BRASOV", "BRAȘOV"),
    ("MURES", "MUREȘ"),
    ("TIMIS", "TIMIȘ"),
    ("ARGES", "ARGEȘ"),
    ("BUCURESTI", "BUCUREŞTI"),
    ("NEAMT", "NEAMȚ"),
    ("DAMBOVITA", "DÂMBOVIȚA"),
    ("VALCEA", "VÂLCEA"),
    ("BISTRITA-NASAUD", "BISTRIȚA-NĂSĂUD"),
    ("MARAMURES", "MARAMUREȘ"),
    ("IALOMITA", "IALOMIȚA"),
    ("CARAS-SEVERIN", "CARAȘ-SEVERIN"),
    ("CALARASI", "CĂLĂRAȘI"),
    ("GORJ", "GORJ"),
    ("BUZAU", "BUZĂU"),
];

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MergeRules {
    pub county_prefixes: Vec<String>,
    /// (variant, canonical) pairs.
    pub county_mapping: Vec<(String, String)>,
    /// Runs the per-UAT aggregation and the deviation column.
    pub uat_aggregation: bool,
}

impl Default for MergeRules {
    fn default() -> Self {
        MergeRules {
            county_prefixes: DEFAULT_COUNTY_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            county_mapping: DEFAULT_COUNTY_MAPPING
                .iter()
                .map(|(v, c)| (v.to_string(), c.to_string()))
                .collect(),
            uat_aggregation: true,
        }
    }
}

impl MergeRules {
    /// Adds mapping entries, replacing built-in entries with the same variant.
    pub fn with_extra_mapping(mut self, extra: &[(String, String)]) -> MergeRules {
        for (variant, canonical) in extra {
            let key = variant.to_uppercase();
            match self
                .county_mapping
                .iter_mut()
                .find(|(v, _)| v.to_uppercase() == key)
            {
                Some(entry) => entry.1 = canonical.clone(),
                None => self
                    .county_mapping
                    .push((variant.clone(), canonical.clone())),
            }
        }
        self
    }
}
