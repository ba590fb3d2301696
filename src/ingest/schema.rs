use std::collections::HashMap;

use serde::{
    Deserialize,
    Serialize,
};
use sha1::{
    Digest,
    Sha1,
};

use crate::{
    core::{
        models::RecordKind,
        ShengciError,
    },
    persistence,
};

pub const COLUMN_MAPPINGS_FILE: &str = "column_mappings.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    Word,
    Phonetic,
    Translation,
    Source,
    Sentence,
    Url,
    Date,
}

impl FieldKey {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKey::Word => "word",
            FieldKey::Phonetic => "phonetic",
            FieldKey::Translation => "translation",
            FieldKey::Source => "source",
            FieldKey::Sentence => "sentence",
            FieldKey::Url => "url",
            FieldKey::Date => "date",
        }
    }
}

pub fn required_fields(kind: RecordKind) -> &'static [FieldKey] {
    match kind {
        RecordKind::Vocabulary => &[FieldKey::Word, FieldKey::Date],
        RecordKind::Sentence => &[FieldKey::Sentence, FieldKey::Date],
    }
}

pub fn known_fields(kind: RecordKind) -> &'static [FieldKey] {
    match kind {
        RecordKind::Vocabulary => {
            &[FieldKey::Word, FieldKey::Phonetic, FieldKey::Translation, FieldKey::Source, FieldKey::Date]
        }
        RecordKind::Sentence => {
            &[FieldKey::Sentence, FieldKey::Translation, FieldKey::Url, FieldKey::Date]
        }
    }
}

// Aliases are matched against normalized header text, so they are listed in
// normalized form (lowercase, alphanumeric only). 来源 maps to the URL field
// for sentence exports but to the source field for vocabulary exports.
fn aliases(kind: RecordKind, field: FieldKey) -> &'static [&'static str] {
    match (kind, field) {
        (_, FieldKey::Word) => &["word", "words", "term", "vocabulary", "vocab", "单词", "生词", "词汇"],
        (_, FieldKey::Phonetic) => &["phonetic", "phonetics", "pronunciation", "ipa", "音标", "发音"],
        (_, FieldKey::Translation) => {
            &["translation", "meaning", "definition", "释义", "翻译", "中文", "解释"]
        }
        (RecordKind::Vocabulary, FieldKey::Source) => &["source", "origin", "book", "来源", "出处"],
        (_, FieldKey::Sentence) => &["sentence", "text", "content", "例句", "句子", "原句"],
        (RecordKind::Sentence, FieldKey::Url) => &["url", "link", "website", "source", "链接", "网址", "来源"],
        (_, FieldKey::Date) => &["date", "time", "datetime", "createdat", "added", "日期", "时间", "添加时间"],
        _ => &[],
    }
}

/// Casefold, drop everything that is not a letter or digit (Unicode-aware),
/// and strip a leading byte-order mark.
pub fn normalize_header(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '\u{feff}')
        .flat_map(|c| c.to_lowercase())
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Hash of the normalized header sequence; the key under which a manually
/// confirmed column mapping is remembered.
pub fn header_signature(headers: &[String]) -> String {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
    let mut hasher = Sha1::new();
    hasher.update(normalized.join("|").as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub columns: HashMap<FieldKey, usize>,
}

impl TableSchema {
    pub fn column(&self, field: FieldKey) -> Option<usize> {
        self.columns.get(&field).copied()
    }
}

/// Everything a caller needs to ask a human for a column mapping and to
/// persist the confirmed answer for this header shape.
#[derive(Debug, Clone)]
pub struct MappingRequest {
    pub file: String,
    pub kind: RecordKind,
    pub signature: String,
    pub headers: Vec<String>,
    pub suggestion: HashMap<FieldKey, usize>,
    pub sample_rows: Vec<Vec<String>>,
}

/// Confirmed manual mappings, keyed by `<signature>:<kind>`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingStore {
    pub mappings: HashMap<String, HashMap<FieldKey, usize>>,
}

impl MappingStore {
    pub fn load() -> Self {
        persistence::load_json_or_default(COLUMN_MAPPINGS_FILE)
    }

    pub fn save(&self) -> Result<(), ShengciError> {
        persistence::save_json(self, COLUMN_MAPPINGS_FILE)
    }

    fn key(signature: &str, kind: RecordKind) -> String {
        format!("{}:{}", signature, kind.key())
    }

    pub fn lookup(&self, signature: &str, kind: RecordKind) -> Option<&HashMap<FieldKey, usize>> {
        self.mappings.get(&Self::key(signature, kind))
    }

    pub fn confirm(&mut self, signature: &str, kind: RecordKind, columns: HashMap<FieldKey, usize>) {
        self.mappings.insert(Self::key(signature, kind), columns);
    }
}

/// Resolve which column holds which field. Alias matching first; if that
/// leaves a required field uncovered, fall back to a previously confirmed
/// mapping for this header signature; otherwise surface a structured
/// needs-mapping condition so a caller can ask the user.
pub fn resolve_schema(
    kind: RecordKind,
    headers: &[String],
    sample_rows: &[Vec<String>],
    file: &str,
    store: &MappingStore,
) -> Result<TableSchema, ShengciError> {
    let mut columns: HashMap<FieldKey, usize> = HashMap::new();

    for (index, header) in headers.iter().enumerate() {
        let normalized = normalize_header(header);
        if normalized.is_empty() {
            continue;
        }
        for field in known_fields(kind) {
            if columns.contains_key(field) {
                continue;
            }
            if aliases(kind, *field).contains(&normalized.as_str()) {
                columns.insert(*field, index);
                break;
            }
        }
    }

    let covered = required_fields(kind).iter().all(|f| columns.contains_key(f));
    if covered {
        return Ok(TableSchema { columns });
    }

    let signature = header_signature(headers);
    if let Some(confirmed) = store.lookup(&signature, kind) {
        let in_bounds = confirmed.values().all(|i| *i < headers.len());
        let complete = required_fields(kind).iter().all(|f| confirmed.contains_key(f));
        if in_bounds && complete {
            return Ok(TableSchema { columns: confirmed.clone() });
        }
    }

    let suggestion = suggest_columns(kind, headers, &columns);
    Err(ShengciError::NeedsMapping(Box::new(MappingRequest {
        file: file.to_string(),
        kind,
        signature,
        headers: headers.to_vec(),
        suggestion,
        sample_rows: sample_rows.to_vec(),
    })))
}

// Loose substring matching, both directions, so "worddate" or "mydate"
// still points the user at a plausible column.
fn suggest_columns(
    kind: RecordKind,
    headers: &[String],
    matched: &HashMap<FieldKey, usize>,
) -> HashMap<FieldKey, usize> {
    let mut suggestion = matched.clone();
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();

    for field in known_fields(kind) {
        if suggestion.contains_key(field) {
            continue;
        }
        'columns: for (index, header) in normalized.iter().enumerate() {
            if header.is_empty() || suggestion.values().any(|i| *i == index) {
                continue;
            }
            for alias in aliases(kind, *field) {
                if header.contains(alias) || (!header.is_empty() && alias.contains(header.as_str())) {
                    suggestion.insert(*field, index);
                    break 'columns;
                }
            }
        }
    }

    suggestion
}
