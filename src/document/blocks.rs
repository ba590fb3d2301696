use crate::{
    core::models::{
        RecordKind,
        SentenceRecord,
        VocabularyRecord,
    },
    identity,
};

pub const DETAIL_VOCAB_TRANSLATION: &str = "  - 释义：";
pub const DETAIL_SENTENCE_TRANSLATION: &str = "  - 中文：";
pub const DETAIL_SOURCE: &str = "  - 来源：";
pub const DETAIL_RELATED_WORDS: &str = "  - 相关词汇：";

const UNCHECKED: &str = "- [ ] ";
const CHECKED_LOWER: &str = "- [x] ";
const CHECKED_UPPER: &str = "- [X] ";

pub fn is_checklist_line(line: &str) -> bool {
    line.starts_with(UNCHECKED) || line.starts_with(CHECKED_LOWER) || line.starts_with(CHECKED_UPPER)
}

pub fn is_detail_line(line: &str) -> bool {
    !line.trim().is_empty() && (line.starts_with(' ') || line.starts_with('\t'))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Vocabulary,
    Sentence,
    Unknown,
}

/// One checklist line plus its indented detail lines. Kind is inferred from
/// the embedded record ID, never from the section the block sits in, so a
/// block the user moved by hand still classifies correctly.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryBlock {
    pub head: String,
    pub details: Vec<String>,
}

impl EntryBlock {
    pub fn new(head: &str) -> Self {
        Self { head: head.to_string(), details: Vec::new() }
    }

    pub fn id(&self) -> Option<&str> {
        identity::id_pattern().find(&self.head).map(|m| m.as_str())
    }

    pub fn kind(&self) -> BlockKind {
        match self.id().and_then(identity::kind_of_id) {
            Some(RecordKind::Vocabulary) => BlockKind::Vocabulary,
            Some(RecordKind::Sentence) => BlockKind::Sentence,
            None => BlockKind::Unknown,
        }
    }

    pub fn checked(&self) -> bool {
        self.head.starts_with(CHECKED_LOWER) || self.head.starts_with(CHECKED_UPPER)
    }

    /// The text the user sees: everything between the checkbox and the
    /// trailing `%% id: … %%` comment.
    pub fn visible_text(&self) -> &str {
        let start = self.head.find("] ").map(|i| i + 2).unwrap_or(0);
        let end = self.head.find("%%").filter(|e| *e >= start).unwrap_or(self.head.len());
        self.head[start..end].trim_end()
    }

    /// Rewrite only the visible text, leaving checkbox and ID marker alone.
    pub fn rewrite_visible(&mut self, rewrite: impl FnOnce(&str) -> String) {
        let start = self.head.find("] ").map(|i| i + 2).unwrap_or(0);
        let end = match self.head.find("%%").filter(|e| *e >= start) {
            Some(end) => end,
            None => self.head.len(),
        };
        let middle = &self.head[start..end];
        let trimmed = middle.trim_end();
        let padding = &middle[trimmed.len()..];
        let rewritten = rewrite(trimmed);
        self.head = format!("{}{}{}{}", &self.head[..start], rewritten, padding, &self.head[end..]);
    }

    pub fn ensure_tag(&mut self, tag: &str) {
        if !self.head.contains(tag) {
            self.head.push(' ');
            self.head.push_str(tag);
        }
    }

    pub fn remove_detail_with_prefix(&mut self, prefix: &str) {
        self.details.retain(|line| !line.trim_start().starts_with(prefix.trim_start()));
    }
}

pub fn vocab_block(record: &VocabularyRecord) -> EntryBlock {
    let id = identity::vocab_id(&record.word);
    let mut head = format!("{}{}", UNCHECKED, record.word);
    if let Some(phonetic) = record.phonetic.as_deref().filter(|p| !p.is_empty()) {
        head.push_str(&format!("  /{}/", phonetic));
    }
    head.push_str(&format!("  %% id: {} %%", id));

    let mut block = EntryBlock { head, details: Vec::new() };
    if !record.translation.is_empty() {
        block.details.push(format!("{}{}", DETAIL_VOCAB_TRANSLATION, record.translation));
    }
    if let Some(source) = record.source.as_deref().filter(|s| !s.is_empty()) {
        block.details.push(format!("{}{}", DETAIL_SOURCE, source));
    }
    block
}

pub fn sentence_block(record: &SentenceRecord) -> EntryBlock {
    let id = identity::sentence_id(&record.sentence, record.url.as_deref());
    let head = format!("{}{}  %% id: {} %%", UNCHECKED, record.sentence, id);

    let mut block = EntryBlock { head, details: Vec::new() };
    if !record.translation.is_empty() {
        block.details.push(format!("{}{}", DETAIL_SENTENCE_TRANSLATION, record.translation));
    }
    if let Some(url) = record.url.as_deref().filter(|u| !u.is_empty()) {
        block.details.push(format!("{}{}", DETAIL_SOURCE, url));
    }
    block
}
