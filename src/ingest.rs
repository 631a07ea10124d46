use super::{
    errors::IngestError,
    record::{Record, RecordField},
    result::IngestResult,
    store::RecordStore,
};
use ahash::AHashSet;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    // Advisory only: larger inputs are loaded with a warning
    pub max_bytes: u64,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub bytes: u64,
    pub records: usize,
    pub unknown_columns: Vec<String>,
    // Rows whose PurchaseAmount is missing or not a finite number
    pub invalid_amounts: usize,
    pub oversized: bool,
}

impl std::fmt::Display for IngestReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} records from {} bytes ({} without a usable amount)",
            self.records, self.bytes, self.invalid_amounts
        )
    }
}

// Parses CSV bytes into records. The first row is the header.
pub fn parse_csv(bytes: &[u8], options: &IngestOptions) -> IngestResult<(Vec<Record>, IngestReport)> {
    if bytes.is_empty() {
        return Err(IngestError::Empty);
    }
    if let Some(pos) = memchr::memchr(0, bytes) {
        return Err(IngestError::NotCsv {
            reason: format!("binary content, NUL byte at offset {pos}"),
        });
    }
    let text = std::str::from_utf8(bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)).map_err(|e| {
        IngestError::NotCsv {
            reason: format!("invalid UTF-8 at offset {}", e.valid_up_to()),
        }
    })?;
    if text.trim().is_empty() {
        return Err(IngestError::Empty);
    }

    let mut report = IngestReport {
        bytes: bytes.len() as u64,
        ..IngestReport::default()
    };
    if report.bytes > options.max_bytes {
        report.oversized = true;
        warn!(
            bytes = report.bytes,
            max_bytes = options.max_bytes,
            "dataset exceeds advisory size limit"
        );
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| IngestError::Parse {
            line: 1,
            reason: e.to_string(),
        })?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.iter().all(|header| header.is_empty()) {
        return Err(IngestError::MissingHeader);
    }

    let mut seen: AHashSet<&str> = AHashSet::with_capacity(headers.len());
    for header in &headers {
        if RecordField::from_header(header).is_none() && seen.insert(header.as_str()) {
            report.unknown_columns.push(header.clone());
        }
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| IngestError::Parse {
            line: e.position().map_or(0, |position| position.line()),
            reason: e.to_string(),
        })?;
        // Short rows leave trailing fields absent, long rows drop the surplus
        let mut record = Record::default();
        for (header, value) in headers.iter().zip(row.iter()) {
            record.push(header, value.to_string());
        }
        record.finish();
        if record.amount().is_none() {
            report.invalid_amounts += 1;
        }
        records.push(record);
    }
    report.records = records.len();
    Ok((records, report))
}

pub fn load_csv_bytes(bytes: &[u8], options: &IngestOptions) -> IngestResult<(RecordStore, IngestReport)> {
    let (records, report) = parse_csv(bytes, options)?;
    let store = RecordStore::from_records(records)?;
    info!(
        records = report.records,
        bytes = report.bytes,
        unknown_columns = report.unknown_columns.len(),
        "dataset loaded"
    );
    Ok((store, report))
}

pub fn load_csv_file<P>(path: P, options: &IngestOptions) -> IngestResult<(RecordStore, IngestReport)>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => IngestError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => IngestError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        },
    })?;
    load_csv_bytes(&bytes, options)
}
