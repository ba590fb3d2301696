use serde::{
    Deserialize,
    Serialize,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutStrategy {
    VocabularyFirst,
    SentenceFirst,
    Interleaved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentMode {
    Merged,
    Simple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackYearPolicy {
    CurrentYear,
    MostFrequentSentenceYear,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    pub layout: LayoutStrategy,
    pub mode: DocumentMode,
    pub auto_archive: bool,
    pub mastered_tag: Option<String>,
    pub highlight_vocabulary: bool,
    pub fallback_year_policy: FallbackYearPolicy,
    pub frontmatter_source: String,
    pub frontmatter_tags: Vec<String>,
    pub large_file_warning_bytes: u64,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            layout: LayoutStrategy::VocabularyFirst,
            mode: DocumentMode::Merged,
            auto_archive: true,
            mastered_tag: None,
            highlight_vocabulary: true,
            fallback_year_policy: FallbackYearPolicy::MostFrequentSentenceYear,
            frontmatter_source: "imported".to_string(),
            frontmatter_tags: vec!["english".to_string(), "review".to_string()],
            large_file_warning_bytes: 512 * 1024,
        }
    }
}
