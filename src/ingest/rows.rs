use super::{
    dates,
    schema::{
        FieldKey,
        TableSchema,
    },
    table::TableRow,
};
use crate::core::models::{
    ParseFailure,
    Record,
    RecordKind,
    SentenceRecord,
    VocabularyRecord,
};

#[derive(Debug, Default)]
pub struct IngestOutcome {
    pub records: Vec<Record>,
    pub failures: Vec<ParseFailure>,
}

fn field<'a>(row: &'a TableRow, schema: &TableSchema, key: FieldKey) -> Option<&'a str> {
    schema
        .column(key)
        .and_then(|index| row.fields.get(index))
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

/// Blank rows are skipped silently; rows missing a required value or with an
/// unparsable date become ParseFailures and never abort the batch.
pub fn convert_rows(
    rows: &[TableRow],
    schema: &TableSchema,
    kind: RecordKind,
    fallback_year: i32,
    file: &str,
) -> IngestOutcome {
    let mut outcome = IngestOutcome::default();

    for row in rows {
        if row.is_blank() {
            continue;
        }

        match kind {
            RecordKind::Vocabulary => {
                let Some(word) = field(row, schema, FieldKey::Word) else {
                    outcome.failures.push(ParseFailure::new(file, row.line, "empty word"));
                    continue;
                };
                let Some(raw_date) = field(row, schema, FieldKey::Date) else {
                    outcome.failures.push(ParseFailure::new(file, row.line, "empty date"));
                    continue;
                };
                let Some(date) = dates::parse_vocab_date(raw_date, fallback_year) else {
                    outcome.failures.push(ParseFailure::new(
                        file,
                        row.line,
                        format!("invalid date: {}", raw_date),
                    ));
                    continue;
                };

                outcome.records.push(Record::Vocabulary(VocabularyRecord {
                    word: word.to_string(),
                    phonetic: field(row, schema, FieldKey::Phonetic).map(str::to_string),
                    translation: field(row, schema, FieldKey::Translation)
                        .unwrap_or_default()
                        .to_string(),
                    source: field(row, schema, FieldKey::Source).map(str::to_string),
                    date,
                }));
            }
            RecordKind::Sentence => {
                let Some(sentence) = field(row, schema, FieldKey::Sentence) else {
                    outcome.failures.push(ParseFailure::new(file, row.line, "empty sentence"));
                    continue;
                };
                let Some(raw_date) = field(row, schema, FieldKey::Date) else {
                    outcome.failures.push(ParseFailure::new(file, row.line, "empty date"));
                    continue;
                };
                let Some(date) = dates::parse_sentence_date(raw_date) else {
                    outcome.failures.push(ParseFailure::new(
                        file,
                        row.line,
                        format!("invalid date: {}", raw_date),
                    ));
                    continue;
                };

                outcome.records.push(Record::Sentence(SentenceRecord {
                    sentence: sentence.to_string(),
                    translation: field(row, schema, FieldKey::Translation)
                        .unwrap_or_default()
                        .to_string(),
                    url: field(row, schema, FieldKey::Url).map(str::to_string),
                    date,
                }));
            }
        }
    }

    outcome
}
