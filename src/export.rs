use super::{errors::ExportError, record::Record, result::ExportResult};
use std::{borrow::Borrow, path::Path};
use tracing::info;

// JSON array of field mappings, in the given order
pub fn to_json<R>(records: &[R]) -> ExportResult<String>
where
    R: Borrow<Record>,
{
    let rows: Vec<&Record> = records.iter().map(<R as Borrow<Record>>::borrow).collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

pub fn write_json<R, P>(records: &[R], path: P) -> ExportResult<()>
where
    R: Borrow<Record>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let json = to_json(records)?;
    std::fs::write(path, json).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    info!(records = records.len(), path = %path.display(), "filtered data exported");
    Ok(())
}
