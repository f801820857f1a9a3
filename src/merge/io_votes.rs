// Reads the official results table.

use crate::merge::{
    io_common::{column_index, get_field, line_number, open_reader, optional_column},
    *,
};

pub const COUNTY_COLUMN: &str = "precinct_county_name";
pub const STATION_COLUMN: &str = "precinct_nr";
pub const STATION_NAME_COLUMN: &str = "precinct_name";
pub const UAT_COLUMN: &str = "uat_name";

fn parse_votes(value: &str, path: &str, lineno: usize, column: &str) -> SmResult<u64> {
    value.parse::<u64>().ok().context(InvalidNumberSnafu {
        path,
        lineno,
        column,
        value,
    })
}

/// Reads one vote record per line.
///
/// The UAT column is mandatory only when `require_uat` is set; otherwise it is
/// read when present.
pub fn read_votes(
    path: &str,
    columns: &CandidateColumns,
    require_uat: bool,
    delimiter: u8,
) -> SmResult<Vec<VoteRecord>> {
    let (mut rdr, headers) = open_reader(path, delimiter)?;
    let county_idx = column_index(&headers, COUNTY_COLUMN, path)?;
    let station_idx = column_index(&headers, STATION_COLUMN, path)?;
    let name_idx = column_index(&headers, STATION_NAME_COLUMN, path)?;
    let uat_idx = if require_uat {
        Some(column_index(&headers, UAT_COLUMN, path)?)
    } else {
        optional_column(&headers, UAT_COLUMN)
    };
    let a_idx = column_index(&headers, &columns.a_column, path)?;
    let b_idx = column_index(&headers, &columns.b_column, path)?;

    let mut res: Vec<VoteRecord> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        let lineno = line_number(idx);
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        let uat_name = match uat_idx {
            Some(i) => {
                Some(get_field(&line, i, path, lineno)?.to_string()).filter(|s| !s.is_empty())
            }
            None => None,
        };
        let record = VoteRecord {
            county: get_field(&line, county_idx, path, lineno)?.to_string(),
            station_number: get_field(&line, station_idx, path, lineno)?.to_string(),
            voting_station_name: get_field(&line, name_idx, path, lineno)?.to_string(),
            uat_name,
            votes_a: parse_votes(
                get_field(&line, a_idx, path, lineno)?,
                path,
                lineno,
                &columns.a_column,
            )?,
            votes_b: parse_votes(
                get_field(&line, b_idx, path, lineno)?,
                path,
                lineno,
                &columns.b_column,
            )?,
        };
        // The station total must stay representable.
        ensure!(
            record.votes_a.checked_add(record.votes_b).is_some(),
            InvalidNumberSnafu {
                path,
                lineno,
                column: &columns.b_column,
                value: record.votes_b.to_string(),
            }
        );
        debug!("read_votes: lineno: {:?} record: {:?}", lineno, record);
        res.push(record);
    }
    info!("read_votes: {} records from {}", res.len(), path);
    Ok(res)
}
