// Reads the station location table.

use crate::merge::{
    io_common::{column_index, get_field, line_number, open_reader},
    *,
};

fn parse_coordinate(value: &str, path: &str, lineno: usize, column: &str) -> SmResult<Option<f64>> {
    if value.is_empty() {
        return Ok(None);
    }
    let x = value.parse::<f64>().ok().context(InvalidNumberSnafu {
        path,
        lineno,
        column,
        value,
    })?;
    Ok(Some(x).filter(|x| !x.is_nan()))
}

pub fn read_locations(path: &str, delimiter: u8) -> SmResult<Vec<LocationRecord>> {
    let (mut rdr, headers) = open_reader(path, delimiter)?;
    let station_idx = column_index(&headers, "station_number", path)?;
    let lat_idx = column_index(&headers, "latitude", path)?;
    let lon_idx = column_index(&headers, "longitude", path)?;
    let county_idx = column_index(&headers, "county", path)?;

    let mut res: Vec<LocationRecord> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        let lineno = line_number(idx);
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        let record = LocationRecord {
            station_number: get_field(&line, station_idx, path, lineno)?.to_string(),
            county: get_field(&line, county_idx, path, lineno)?.to_string(),
            latitude: parse_coordinate(
                get_field(&line, lat_idx, path, lineno)?,
                path,
                lineno,
                "latitude",
            )?,
            longitude: parse_coordinate(
                get_field(&line, lon_idx, path, lineno)?,
                path,
                lineno,
                "longitude",
            )?,
        };
        debug!("read_locations: lineno: {:?} record: {:?}", lineno, record);
        res.push(record);
    }
    info!("read_locations: {} records from {}", res.len(), path);
    Ok(res)
}
