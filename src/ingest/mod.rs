use std::{
    fs,
    path::Path,
};

use crate::core::{
    models::RecordKind,
    tasks::CancelToken,
    ShengciError,
};

pub mod dates;
pub mod encoding;
pub mod rows;
pub mod schema;
pub mod table;

pub use rows::IngestOutcome;
pub use schema::{
    MappingRequest,
    MappingStore,
};

const SAMPLE_ROW_LIMIT: usize = 5;
const CANCEL_CHECK_INTERVAL: usize = 256;

fn file_label(path: &Path) -> String {
    path.file_name().and_then(|n| n.to_str()).map(str::to_string).unwrap_or_else(|| path.display().to_string())
}

/// Parse one delimited export file into records. Delimiter and encoding are
/// detected; the header row is resolved against field aliases with a
/// persisted manual-mapping fallback; bad rows are collected, not fatal.
pub fn parse_table_file(
    path: &Path,
    kind: RecordKind,
    fallback_year: i32,
    store: &MappingStore,
    cancel: Option<&CancelToken>,
) -> Result<IngestOutcome, ShengciError> {
    let label = file_label(path);

    let bytes = fs::read(path).map_err(|e| ShengciError::FailedToLoadFile(format!("{}: {}", label, e)))?;
    if bytes.is_empty() {
        return Err(ShengciError::EmptyFile(label));
    }

    let text = encoding::decode_table_bytes(&bytes, &label)?;
    let delimiter = table::detect_delimiter(&text);
    let parsed = table::parse_rows(&text, delimiter);

    let Some((header_row, data_rows)) = parsed.split_first() else {
        return Err(ShengciError::EmptyFile(label));
    };
    if header_row.is_blank() {
        return Err(ShengciError::EmptyFile(label));
    }

    let samples: Vec<Vec<String>> = data_rows
        .iter()
        .filter(|r| !r.is_blank())
        .take(SAMPLE_ROW_LIMIT)
        .map(|r| r.fields.clone())
        .collect();

    let schema = schema::resolve_schema(kind, &header_row.fields, &samples, &label, store)?;

    let mut outcome = IngestOutcome::default();
    for chunk in data_rows.chunks(CANCEL_CHECK_INTERVAL) {
        if let Some(token) = cancel {
            if token.is_cancelled() {
                return Err(ShengciError::Cancelled);
            }
        }
        let partial = rows::convert_rows(chunk, &schema, kind, fallback_year, &label);
        outcome.records.extend(partial.records);
        outcome.failures.extend(partial.failures);
    }

    println!(
        "Parsed {} {} records from {} ({} failures)",
        outcome.records.len(),
        kind.key(),
        label,
        outcome.failures.len()
    );

    Ok(outcome)
}
