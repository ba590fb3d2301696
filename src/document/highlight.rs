use std::collections::BTreeSet;

use super::{
    blocks::BlockKind,
    Document,
};
use crate::core::models::VocabularyRecord;

const MIN_TOKEN_LEN: usize = 3;
const BOLD: &str = "**";

fn add_word_tokens(word: &str, tokens: &mut BTreeSet<String>) {
    if !word.is_ascii() {
        return;
    }
    let mut run = String::new();
    for c in word.chars().chain(std::iter::once(' ')) {
        if c.is_ascii_alphabetic() {
            run.push(c);
        } else if !run.is_empty() {
            if run.len() >= MIN_TOKEN_LEN {
                tokens.insert(run.to_lowercase());
            }
            run.clear();
        }
    }
}

/// Tokens from every vocabulary entry already in the document plus the
/// records about to be appended. ASCII-only words of three letters or more.
pub fn vocabulary_tokens(doc: &Document, incoming: &[VocabularyRecord]) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();
    for section in &doc.sections {
        for entry in section.entries() {
            if entry.kind() == BlockKind::Vocabulary {
                let visible = entry.visible_text();
                let word = visible.split("  /").next().unwrap_or(visible);
                add_word_tokens(word, &mut tokens);
            }
        }
    }
    for record in incoming {
        add_word_tokens(&record.word, &mut tokens);
    }
    tokens
}

/// Single pass over the text, toggling a bold flag on `**`. Matching tokens
/// outside bold spans are wrapped; text already bolded is left alone, so
/// repeated runs never double-bold.
pub fn bold_matching_tokens(text: &str, tokens: &BTreeSet<String>) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_bold = false;
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '*' && chars.get(i + 1) == Some(&'*') {
            out.push_str(BOLD);
            in_bold = !in_bold;
            i += 2;
            continue;
        }

        if !in_bold && chars[i].is_ascii_alphabetic() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_alphabetic() {
                i += 1;
            }
            let run: String = chars[start..i].iter().collect();
            if run.len() >= MIN_TOKEN_LEN && tokens.contains(&run.to_lowercase()) {
                out.push_str(BOLD);
                out.push_str(&run);
                out.push_str(BOLD);
            } else {
                out.push_str(&run);
            }
            continue;
        }

        out.push(chars[i]);
        i += 1;
    }

    out
}

/// The vocabulary tokens a sentence contains, bolded or not, sorted.
pub fn contained_tokens(text: &str, tokens: &BTreeSet<String>) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut found = BTreeSet::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_ascii_alphabetic() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_alphabetic() {
                i += 1;
            }
            let run: String = chars[start..i].iter().collect::<String>().to_lowercase();
            if run.len() >= MIN_TOKEN_LEN && tokens.contains(&run) {
                found.insert(run);
            }
            continue;
        }
        i += 1;
    }

    found.into_iter().collect()
}

/// Wrap un-bolded vocabulary tokens in every sentence entry's visible text.
pub fn apply_highlighting(doc: &mut Document, tokens: &BTreeSet<String>) {
    if tokens.is_empty() {
        return;
    }
    for section in &mut doc.sections {
        for entry in section.entries_mut() {
            if entry.kind() == BlockKind::Sentence {
                entry.rewrite_visible(|text| bold_matching_tokens(text, tokens));
            }
        }
    }
}
