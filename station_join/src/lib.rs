mod config;
mod counties;
use log::{debug, info, warn};

use std::collections::{BTreeMap, HashMap, HashSet};

pub use crate::config::*;
pub use crate::counties::CountyNormalizer;

/// Rounds to two decimals, halves to even.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round_ties_even() / 100.0
}

/// The share of `votes` among `votes + other_votes`, in percent, rounded to
/// two decimals.
///
/// Returns None when both counts are zero.
///
/// ```
/// assert_eq!(station_join::vote_percentage(120, 80), Some(60.0));
/// assert_eq!(station_join::vote_percentage(0, 0), None);
/// ```
pub fn vote_percentage(votes: u64, other_votes: u64) -> Option<f64> {
    // Widened so that no pair of counts can overflow.
    let total = votes as u128 + other_votes as u128;
    if total == 0 {
        None
    } else {
        Some(round2(votes as f64 / total as f64 * 100.0))
    }
}

/// Working copies of the vote records with normalized county names.
pub fn normalize_votes(votes: &[VoteRecord], normalizer: &CountyNormalizer) -> Vec<VoteRecord> {
    votes
        .iter()
        .map(|v| VoteRecord {
            county: normalizer.normalize(&v.county),
            ..v.clone()
        })
        .collect()
}

/// Working copies of the location records with normalized county names.
pub fn normalize_locations(
    locations: &[LocationRecord],
    normalizer: &CountyNormalizer,
) -> Vec<LocationRecord> {
    locations
        .iter()
        .map(|l| LocationRecord {
            county: normalizer.normalize(&l.county),
            ..l.clone()
        })
        .collect()
}

// The records must have been normalized already.
struct JoinOutcome {
    records: Vec<MergedRecord>,
    missing_locations: usize,
    duplicate_locations: usize,
}

/// Left join of the votes onto the locations, on (county, station_number).
///
/// Every vote record produces exactly one merged record. When several
/// locations share a key, the first one is used.
fn join_locations(
    votes: &[VoteRecord],
    locations: &[LocationRecord],
) -> Result<JoinOutcome, MergeErrors> {
    let mut by_key: HashMap<(&str, &str), &LocationRecord> = HashMap::new();
    let mut duplicate_locations = 0;
    for l in locations.iter() {
        let key = (l.county.as_str(), l.station_number.as_str());
        if by_key.contains_key(&key) {
            debug!("join_locations: duplicate location key {:?}", key);
            duplicate_locations += 1;
        } else {
            by_key.insert(key, l);
        }
    }
    if duplicate_locations > 0 {
        warn!(
            "{} location rows share a (county, station_number) key with an earlier row and were ignored",
            duplicate_locations
        );
    }

    let mut missing_locations = 0;
    let records: Vec<MergedRecord> = votes
        .iter()
        .map(|v| -> Result<MergedRecord, MergeErrors> {
            let total_votes = v
                .votes_a
                .checked_add(v.votes_b)
                .ok_or_else(|| MergeErrors::VoteCountOverflow {
                    county: v.county.clone(),
                    station_number: v.station_number.clone(),
                })?;
            let loc = by_key.get(&(v.county.as_str(), v.station_number.as_str()));
            let (latitude, longitude) = match loc {
                Some(l) => (l.latitude, l.longitude),
                None => (None, None),
            };
            if latitude.is_none() {
                debug!(
                    "join_locations: no location for county {:?} station {:?}",
                    v.county, v.station_number
                );
                missing_locations += 1;
            }
            Ok(MergedRecord {
                county: v.county.clone(),
                uat_name: v.uat_name.clone(),
                station_number: v.station_number.clone(),
                voting_station_name: v.voting_station_name.clone(),
                latitude,
                longitude,
                votes_a: v.votes_a,
                votes_b: v.votes_b,
                total_votes,
                percentage_a: vote_percentage(v.votes_a, v.votes_b),
                uat_avg_percentage: None,
                uat_diff: None,
            })
        })
        .collect::<Result<Vec<MergedRecord>, MergeErrors>>()?;
    Ok(JoinOutcome {
        records,
        missing_locations,
        duplicate_locations,
    })
}

/// Sums the votes of each (county, uat_name) group, in key order.
///
/// Records without a UAT name belong to no group.
pub fn aggregate_uats(records: &[MergedRecord]) -> Result<Vec<UatAverage>, MergeErrors> {
    let mut groups: BTreeMap<(String, String), (u64, u64)> = BTreeMap::new();
    for r in records.iter() {
        if let Some(uat) = r.uat_name.as_ref().filter(|u| !u.is_empty()) {
            let e = groups
                .entry((r.county.clone(), uat.clone()))
                .or_insert((0, 0));
            match (e.0.checked_add(r.votes_a), e.1.checked_add(r.votes_b)) {
                (Some(a), Some(b)) => *e = (a, b),
                _ => {
                    return Err(MergeErrors::VoteCountOverflow {
                        county: r.county.clone(),
                        station_number: r.station_number.clone(),
                    })
                }
            }
        }
    }
    Ok(groups
        .into_iter()
        .map(|((county, uat_name), (votes_a, votes_b))| UatAverage {
            county,
            uat_name,
            votes_a,
            votes_b,
            percentage_a: vote_percentage(votes_a, votes_b),
        })
        .collect())
}

/// Copies each group's share onto its stations and computes the deviation
/// of the station from its group.
pub fn apply_uat_averages(records: &mut [MergedRecord], averages: &[UatAverage]) {
    let by_key: HashMap<(&str, &str), Option<f64>> = averages
        .iter()
        .map(|a| ((a.county.as_str(), a.uat_name.as_str()), a.percentage_a))
        .collect();
    for r in records.iter_mut() {
        let avg = match r.uat_name.as_deref() {
            Some(uat) => by_key.get(&(r.county.as_str(), uat)).cloned().flatten(),
            None => None,
        };
        r.uat_avg_percentage = avg;
        r.uat_diff = match (r.percentage_a, avg) {
            (Some(p), Some(a)) => Some(round2(p - a)),
            _ => None,
        };
    }
}

fn is_filled(s: &str) -> bool {
    !s.trim().is_empty()
}

/// True when every column written for this record has a value.
pub fn is_complete(r: &MergedRecord, uat_aggregation: bool) -> bool {
    let base = is_filled(&r.county)
        && is_filled(&r.station_number)
        && is_filled(&r.voting_station_name)
        && r.has_location()
        && r.percentage_a.is_some();
    if uat_aggregation {
        base
            && r.uat_name.as_deref().map(is_filled).unwrap_or(false)
            && r.uat_avg_percentage.is_some()
            && r.uat_diff.is_some()
    } else {
        base
    }
}

pub fn summarize(result: &MergeResult, uat_aggregation: bool) -> MergeSummary {
    let complete = result
        .records
        .iter()
        .filter(|r| is_complete(r, uat_aggregation))
        .count();
    let missing_location = result
        .records
        .iter()
        .filter(|r| r.latitude.is_none())
        .count();
    let uat_groups = if uat_aggregation {
        let keys: HashSet<(&str, &str)> = result
            .records
            .iter()
            .filter_map(|r| {
                r.uat_name
                    .as_deref()
                    .filter(|u| is_filled(u))
                    .map(|u| (r.county.as_str(), u))
            })
            .collect();
        Some(keys.len())
    } else {
        None
    };
    MergeSummary {
        total: result.records.len(),
        complete,
        missing_location,
        uat_groups,
    }
}

/// Runs the whole merge over in-memory tables.
///
/// The inputs are not modified: county names are normalized on copies.
pub fn run_merge(
    votes: &[VoteRecord],
    locations: &[LocationRecord],
    rules: &MergeRules,
) -> Result<MergeResult, MergeErrors> {
    info!(
        "Processing {:?} vote records and {:?} location records, rules: {:?}",
        votes.len(),
        locations.len(),
        rules
    );
    let normalizer = CountyNormalizer::new(rules)?;
    let votes_n = normalize_votes(votes, &normalizer);
    let locations_n = normalize_locations(locations, &normalizer);
    info!("Processed {} voting data records", votes_n.len());
    info!("Processed {} station location records", locations_n.len());

    info!("Merging datasets...");
    let joined = join_locations(&votes_n, &locations_n)?;
    info!(
        "{} stations missing location data after merging on station_number AND county",
        joined.missing_locations
    );

    let mut records = joined.records;
    let uat_averages = if rules.uat_aggregation {
        info!("Calculating UAT-level averages...");
        let averages = aggregate_uats(&records)?;
        apply_uat_averages(&mut records, &averages);
        debug!("run_merge: {} UAT groups", averages.len());
        averages
    } else {
        Vec::new()
    };

    Ok(MergeResult {
        records,
        uat_averages,
        missing_locations: joined.missing_locations,
        duplicate_locations: joined.duplicate_locations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn vote(county: &str, station: &str, uat: Option<&str>, a: u64, b: u64) -> VoteRecord {
        VoteRecord {
            county: county.to_string(),
            station_number: station.to_string(),
            voting_station_name: format!("Station {}", station),
            uat_name: uat.map(|s| s.to_string()),
            votes_a: a,
            votes_b: b,
        }
    }

    fn location(county: &str, station: &str, lat: f64, lon: f64) -> LocationRecord {
        LocationRecord {
            station_number: station.to_string(),
            county: county.to_string(),
            latitude: Some(lat),
            longitude: Some(lon),
        }
    }

    fn no_uat() -> MergeRules {
        MergeRules {
            uat_aggregation: false,
            ..MergeRules::default()
        }
    }

    #[test]
    fn matches_after_county_normalization() {
        init_logger();
        let votes = vec![vote("JUDETUL BRASOV", "5", None, 120, 80)];
        let locations = vec![location("Județul Brașov", "5", 45.6, 25.6)];
        let res = run_merge(&votes, &locations, &no_uat()).unwrap();
        assert_eq!(res.records.len(), 1);
        let r = &res.records[0];
        assert_eq!(r.county, "BRAȘOV");
        assert_eq!(r.latitude, Some(45.6));
        assert_eq!(r.longitude, Some(25.6));
        assert_eq!(r.total_votes, 200);
        assert_eq!(r.percentage_a, Some(60.0));
        assert_eq!(res.missing_locations, 0);
        // Inputs untouched.
        assert_eq!(votes[0].county, "JUDETUL BRASOV");
    }

    #[test]
    fn station_numbers_are_not_coerced() {
        init_logger();
        let votes = vec![vote("GORJ", "007", None, 10, 10)];
        let locations = vec![location("GORJ", "7", 45.0, 23.0)];
        let res = run_merge(&votes, &locations, &no_uat()).unwrap();
        assert_eq!(res.records[0].latitude, None);
        assert_eq!(res.records[0].longitude, None);
        assert_eq!(res.missing_locations, 1);
    }

    #[test]
    fn left_join_keeps_every_vote_record() {
        init_logger();
        let votes = vec![
            vote("GORJ", "1", None, 1, 2),
            vote("GORJ", "2", None, 3, 4),
            vote("CLUJ", "1", None, 5, 6),
            vote("CLUJ", "1", None, 7, 8),
        ];
        let locations = vec![
            location("GORJ", "1", 45.0, 23.0),
            location("Cluj", "1", 46.7, 23.6),
            location("CLUJ", "1", 0.0, 0.0),
            location("ALBA", "9", 46.0, 23.5),
        ];
        let res = run_merge(&votes, &locations, &no_uat()).unwrap();
        assert_eq!(res.records.len(), votes.len());
        assert_eq!(res.duplicate_locations, 1);
        assert_eq!(res.missing_locations, 1);
        let missing: Vec<&str> = res
            .records
            .iter()
            .filter(|r| r.latitude.is_none())
            .map(|r| r.station_number.as_str())
            .collect();
        assert_eq!(missing, vec!["2"]);
        for r in res.records.iter() {
            assert_eq!(r.latitude.is_none(), r.longitude.is_none());
        }
        // The first location for a key wins.
        assert_eq!(res.records[2].latitude, Some(46.7));
        assert_eq!(res.records[3].latitude, Some(46.7));
    }

    #[test]
    fn percentages_add_up() {
        let pairs = [(1, 2), (1, 1), (120, 80), (7, 13), (999, 1), (2, 3), (1, 0)];
        for (a, b) in pairs {
            let r = MergedRecord {
                county: "X".to_string(),
                uat_name: None,
                station_number: "1".to_string(),
                voting_station_name: "S".to_string(),
                latitude: None,
                longitude: None,
                votes_a: a,
                votes_b: b,
                total_votes: a + b,
                percentage_a: vote_percentage(a, b),
                uat_avg_percentage: None,
                uat_diff: None,
            };
            let sum = r.percentage_a.unwrap() + r.percentage_b().unwrap();
            assert!((sum - 100.0).abs() <= 0.011, "{} {} -> {}", a, b, sum);
        }
    }

    #[test]
    fn zero_vote_station_has_no_percentage() {
        init_logger();
        let votes = vec![
            vote("GORJ", "1", Some("TÂRGU JIU"), 0, 0),
            vote("GORJ", "2", Some("TÂRGU JIU"), 10, 30),
        ];
        let res = run_merge(&votes, &[], &MergeRules::default()).unwrap();
        assert_eq!(res.records[0].total_votes, 0);
        assert_eq!(res.records[0].percentage_a, None);
        assert_eq!(res.records[0].percentage_b(), None);
        assert_eq!(res.records[0].uat_avg_percentage, Some(25.0));
        assert_eq!(res.records[0].uat_diff, None);
        assert_eq!(res.records[1].uat_diff, Some(0.0));
    }

    #[test]
    fn uat_average_and_deviation() {
        init_logger();
        let votes = vec![
            vote("ARGES", "1", Some("PITEȘTI"), 60, 40),
            vote("ARGES", "2", Some("PITEȘTI"), 30, 70),
            vote("ARGES", "3", Some("MIOVENI"), 1, 3),
        ];
        let res = run_merge(&votes, &[], &MergeRules::default()).unwrap();
        assert_eq!(res.uat_averages.len(), 2);
        let pitesti = res
            .uat_averages
            .iter()
            .find(|a| a.uat_name == "PITEȘTI")
            .unwrap();
        assert_eq!(pitesti.county, "ARGEȘ");
        assert_eq!((pitesti.votes_a, pitesti.votes_b), (90, 110));
        assert_eq!(pitesti.percentage_a, Some(45.0));
        assert_eq!(res.records[0].uat_avg_percentage, Some(45.0));
        assert_eq!(res.records[0].uat_diff, Some(15.0));
        assert_eq!(res.records[1].uat_diff, Some(-15.0));
        assert_eq!(res.records[2].uat_avg_percentage, Some(25.0));
        assert_eq!(res.records[2].uat_diff, Some(0.0));
    }

    #[test]
    fn simple_variant_skips_uat_columns() {
        let votes = vec![vote("ARGES", "1", Some("PITEȘTI"), 60, 40)];
        let res = run_merge(&votes, &[], &no_uat()).unwrap();
        assert!(res.uat_averages.is_empty());
        assert_eq!(res.records[0].uat_avg_percentage, None);
        assert_eq!(res.records[0].uat_diff, None);
    }

    #[test]
    fn summary_counts() {
        init_logger();
        let votes = vec![
            vote("GORJ", "1", Some("A"), 1, 1),
            vote("GORJ", "2", Some("A"), 0, 0),
            vote("GORJ", "3", Some("B"), 2, 1),
            vote("ALBA", "1", Some("A"), 2, 1),
            vote("ALBA", "2", None, 2, 1),
        ];
        let locations = vec![
            location("GORJ", "1", 45.0, 23.0),
            location("GORJ", "2", 45.0, 23.0),
            location("ALBA", "1", 46.0, 23.5),
            location("ALBA", "2", 46.0, 23.5),
        ];
        let res = run_merge(&votes, &locations, &MergeRules::default()).unwrap();
        let s = summarize(&res, true);
        assert_eq!(
            s,
            MergeSummary {
                total: 5,
                complete: 2,
                missing_location: 1,
                uat_groups: Some(3),
            }
        );
        let s2 = summarize(&res, false);
        assert_eq!(s2.complete, 3);
        assert_eq!(s2.uat_groups, None);
    }

    #[test]
    fn rounding() {
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round2(66.666666), 66.67);
        assert_eq!(vote_percentage(1, 2), Some(33.33));
        assert_eq!(vote_percentage(2, 1), Some(66.67));
        assert_eq!(vote_percentage(5, 0), Some(100.0));
        // Exact halves go to the even neighbour.
        assert_eq!(round2(3.125), 3.12);
        assert_eq!(vote_percentage(1, 31), Some(3.12));
        assert_eq!(vote_percentage(1, 159), Some(0.62));
        assert_eq!(vote_percentage(3, 5), Some(37.5));
    }

    #[test]
    fn huge_counts_do_not_overflow() {
        assert_eq!(vote_percentage(u64::MAX, 0), Some(100.0));
        assert_eq!(vote_percentage(u64::MAX, u64::MAX), Some(50.0));
    }

    #[test]
    fn overflowing_station_total_is_an_error() {
        init_logger();
        let votes = vec![vote("GORJ", "1", None, u64::MAX, 1)];
        assert_eq!(
            run_merge(&votes, &[], &no_uat()),
            Err(MergeErrors::VoteCountOverflow {
                county: "GORJ".to_string(),
                station_number: "1".to_string(),
            })
        );
    }

    #[test]
    fn overflowing_uat_total_is_an_error() {
        init_logger();
        let votes = vec![
            vote("GORJ", "1", Some("A"), u64::MAX - 1, 0),
            vote("GORJ", "2", Some("A"), 5, 0),
        ];
        match run_merge(&votes, &[], &MergeRules::default()) {
            Err(MergeErrors::VoteCountOverflow { station_number, .. }) => {
                assert_eq!(station_number, "2")
            }
            x => panic!("unexpected result {:?}", x),
        }
    }
}
