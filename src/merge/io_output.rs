// Writes the merged table.

use crate::merge::*;

pub fn output_headers(columns: &CandidateColumns, uat_aggregation: bool) -> Vec<String> {
    let mut headers: Vec<String> = vec!["county".to_string()];
    if uat_aggregation {
        headers.push("uat_name".to_string());
    }
    headers.extend([
        "station_number".to_string(),
        "voting_station_name".to_string(),
        "latitude".to_string(),
        "longitude".to_string(),
        columns.votes_b_header(),
        columns.votes_a_header(),
        columns.percentage_header(),
    ]);
    if uat_aggregation {
        headers.push(columns.uat_average_header());
        headers.push(columns.uat_diff_header());
    }
    headers
}

// Absent values are written as empty cells.
fn format_f64(x: Option<f64>) -> String {
    x.map(|v| format!("{:?}", v)).unwrap_or_default()
}

fn output_row(r: &MergedRecord, uat_aggregation: bool) -> Vec<String> {
    let mut row: Vec<String> = vec![r.county.clone()];
    if uat_aggregation {
        row.push(r.uat_name.clone().unwrap_or_default());
    }
    row.extend([
        r.station_number.clone(),
        r.voting_station_name.clone(),
        format_f64(r.latitude),
        format_f64(r.longitude),
        r.votes_b.to_string(),
        r.votes_a.to_string(),
        format_f64(r.percentage_a),
    ]);
    if uat_aggregation {
        row.push(format_f64(r.uat_avg_percentage));
        row.push(format_f64(r.uat_diff));
    }
    row
}

pub fn write_merged(
    path: &str,
    records: &[MergedRecord],
    columns: &CandidateColumns,
    uat_aggregation: bool,
    delimiter: u8,
) -> SmResult<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .context(CsvWriteSnafu { path })?;
    wtr.write_record(output_headers(columns, uat_aggregation))
        .context(CsvWriteSnafu { path })?;
    for r in records.iter() {
        wtr.write_record(output_row(r, uat_aggregation))
            .context(CsvWriteSnafu { path })?;
    }
    wtr.flush().context(FlushOutputSnafu { path })?;
    info!("write_merged: {} rows written to {}", records.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_absent_values_as_empty() {
        assert_eq!(format_f64(None), "");
        assert_eq!(format_f64(Some(60.0)), "60.0");
        assert_eq!(format_f64(Some(-15.5)), "-15.5");
        assert_eq!(format_f64(Some(45.6)), "45.6");
    }

    #[test]
    fn headers_follow_candidate_labels() {
        let columns = CandidateColumns {
            a_column: "A".to_string(),
            b_column: "B".to_string(),
            a_label: "ana".to_string(),
            b_label: "bob".to_string(),
        };
        assert_eq!(
            output_headers(&columns, false),
            vec![
                "county",
                "station_number",
                "voting_station_name",
                "latitude",
                "longitude",
                "votes_bob",
                "votes_ana",
                "ana_percentage"
            ]
        );
        let with_uat = output_headers(&columns, true);
        assert_eq!(with_uat.len(), 11);
        assert_eq!(with_uat[1], "uat_name");
        assert_eq!(with_uat[9], "uat_ana_avg_percentage");
        assert_eq!(with_uat[10], "ana_vs_uat_diff");
    }
}
