// Primitives shared by the CSV readers.

use std::fs::File;

use csv::{Reader, StringRecord};

use crate::merge::*;

pub fn open_reader(path: &str, delimiter: u8) -> SmResult<(Reader<File>, StringRecord)> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let headers = rdr.headers().context(CsvHeaderSnafu { path })?.clone();
    debug!("open_reader: {:?} headers: {:?}", path, headers);
    Ok((rdr, headers))
}

pub fn optional_column(headers: &StringRecord, column: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}') == column)
}

pub fn column_index(headers: &StringRecord, column: &str, path: &str) -> SmResult<usize> {
    optional_column(headers, column).context(MissingColumnSnafu { column, path })
}

pub fn get_field<'a>(
    record: &'a StringRecord,
    idx: usize,
    path: &str,
    lineno: usize,
) -> SmResult<&'a str> {
    record
        .get(idx)
        .context(CsvLineTooShortSnafu { path, lineno })
}

/// Data lines are numbered from 2, the header being line 1.
pub fn line_number(idx: usize) -> usize {
    idx + 2
}
