use std::sync::OnceLock;

use regex::Regex;
use sha1::{
    Digest,
    Sha1,
};

use crate::core::models::RecordKind;

pub const VOCAB_PREFIX: &str = "vocab_";
pub const SENT_PREFIX: &str = "sent_";

fn sha1_hex(input: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Identity key is the lowercased, trimmed word only. Phonetic and
/// translation may change without creating a new identity.
pub fn vocab_id(word: &str) -> String {
    format!("{}{}", VOCAB_PREFIX, sha1_hex(&word.trim().to_lowercase()))
}

/// Identity key is the normalized sentence plus the trimmed URL
/// (case preserved), joined with `|`.
pub fn sentence_id(sentence: &str, url: Option<&str>) -> String {
    let normalized = collapse_whitespace(sentence).to_lowercase();
    let key = format!("{}|{}", normalized, url.map(str::trim).unwrap_or(""));
    format!("{}{}", SENT_PREFIX, sha1_hex(&key))
}

// The embedded-ID pattern is the sole mechanism for document scanning and
// idempotent re-append. Any edit that strips it breaks dedup for the entry.
pub fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b(vocab|sent)_[0-9a-f]{40}\b").unwrap())
}

pub fn extract_ids(text: &str) -> Vec<String> {
    id_pattern().find_iter(text).map(|m| m.as_str().to_string()).collect()
}

pub fn kind_of_id(id: &str) -> Option<RecordKind> {
    if id.starts_with(VOCAB_PREFIX) {
        Some(RecordKind::Vocabulary)
    } else if id.starts_with(SENT_PREFIX) {
        Some(RecordKind::Sentence)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocab_id_normalizes_case_and_whitespace() {
        assert_eq!(vocab_id("Run"), vocab_id(" run "));
        assert_eq!(vocab_id("APPLE"), vocab_id("apple"));
        assert_ne!(vocab_id("apple"), vocab_id("apples"));
    }

    #[test]
    fn vocab_id_is_stable() {
        // SHA-1 of "apple", fixed forever
        assert_eq!(vocab_id("apple"), "vocab_d0be2dc421be4fcd0172e5afceea3970e2f3d940");
    }

    #[test]
    fn sentence_id_collapses_internal_whitespace() {
        assert_eq!(
            sentence_id("The  quick\tbrown fox", None),
            sentence_id(" the quick brown fox ", None)
        );
    }

    #[test]
    fn sentence_id_keeps_url_case() {
        let a = sentence_id("hello", Some("https://example.com/A"));
        let b = sentence_id("hello", Some("https://example.com/a"));
        assert_ne!(a, b);

        let c = sentence_id("hello", Some(" https://example.com/A "));
        assert_eq!(a, c);
    }

    #[test]
    fn missing_url_matches_empty_url() {
        assert_eq!(sentence_id("hello", None), sentence_id("hello", Some("")));
    }

    #[test]
    fn pattern_extracts_embedded_ids() {
        let text = format!(
            "- [ ] apple  %% id: {} %%\n- [x] hello  %% id: {} %%\nno id here",
            vocab_id("apple"),
            sentence_id("hello", None)
        );
        let ids = extract_ids(&text);
        assert_eq!(ids.len(), 2);
        assert_eq!(kind_of_id(&ids[0]), Some(RecordKind::Vocabulary));
        assert_eq!(kind_of_id(&ids[1]), Some(RecordKind::Sentence));
    }
}
