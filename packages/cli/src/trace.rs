//! Trace CSV ingestion.

use std::path::Path;

use mobility_map_lifespace::TraceRecord;

/// Reads a trace CSV with a `timestamp,lon,lat` header. Timestamps are
/// RFC 3339 instants; positions are WGS84 degrees.
///
/// # Errors
///
/// Returns an error when the file cannot be opened or a row fails to
/// parse.
pub fn read_trace(path: &Path) -> Result<Vec<TraceRecord>, Box<dyn std::error::Error>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: TraceRecord = row?;
        records.push(record);
    }
    Ok(records)
}
