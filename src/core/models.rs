use std::path::PathBuf;

use serde::{
    Deserialize,
    Serialize,
};

use crate::identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Vocabulary,
    Sentence,
}

impl RecordKind {
    pub fn key(&self) -> &'static str {
        match self {
            RecordKind::Vocabulary => "vocabulary",
            RecordKind::Sentence => "sentence",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VocabularyRecord {
    pub word: String,
    pub phonetic: Option<String>,
    pub translation: String,
    pub source: Option<String>,
    pub date: String, // always yyyy-MM-dd
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentenceRecord {
    pub sentence: String,
    pub translation: String,
    pub url: Option<String>,
    pub date: String, // always yyyy-MM-dd
}

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Vocabulary(VocabularyRecord),
    Sentence(SentenceRecord),
}

impl Record {
    pub fn id(&self) -> String {
        match self {
            Record::Vocabulary(v) => identity::vocab_id(&v.word),
            Record::Sentence(s) => identity::sentence_id(&s.sentence, s.url.as_deref()),
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Vocabulary(_) => RecordKind::Vocabulary,
            Record::Sentence(_) => RecordKind::Sentence,
        }
    }

    pub fn date(&self) -> &str {
        match self {
            Record::Vocabulary(v) => &v.date,
            Record::Sentence(s) => &s.date,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseFailure {
    pub file: String,
    pub line: usize, // 1-based
    pub reason: String,
}

impl ParseFailure {
    pub fn new(file: &str, line: usize, reason: impl Into<String>) -> Self {
        Self { file: file.to_string(), line, reason: reason.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Warning {
    pub severity: Severity,
    pub message: String,
    pub path: Option<PathBuf>,
}

impl Warning {
    pub fn info(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self { severity: Severity::Info, message: message.into(), path }
    }

    pub fn warning(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self { severity: Severity::Warning, message: message.into(), path }
    }

    pub fn error(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self { severity: Severity::Error, message: message.into(), path }
    }

    pub fn blocks_commit(&self) -> bool {
        self.severity == Severity::Error
    }
}
