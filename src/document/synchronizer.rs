use std::collections::BTreeSet;

use super::{
    blocks::{
        self,
        BlockKind,
        DETAIL_RELATED_WORDS,
    },
    highlight,
    layout,
    Document,
    EntryBlock,
    Node,
    OVERVIEW_PREFIX,
    SECTION_MASTERED_SENTENCES,
    SECTION_MASTERED_VOCABULARY,
    SECTION_REVIEW,
    SECTION_SENTENCES,
    SECTION_VOCABULARY,
};
use crate::{
    core::{
        models::{
            SentenceRecord,
            VocabularyRecord,
        },
        preferences::{
            DocumentMode,
            LayoutStrategy,
            Preferences,
        },
    },
    identity,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentTotals {
    pub vocabulary: usize,
    pub mastered_vocabulary: usize,
    pub sentences: usize,
    pub mastered_sentences: usize,
}

#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub content: String,
    pub appended_vocab: Vec<VocabularyRecord>,
    pub appended_sentences: Vec<SentenceRecord>,
    pub totals: DocumentTotals,
    pub moved_to_mastered: Vec<String>,
}

pub fn overview_line(totals: &DocumentTotals) -> String {
    format!(
        "{} Vocabulary: {} (Mastered {}) | Sentences: {} (Mastered {})",
        OVERVIEW_PREFIX,
        totals.vocabulary,
        totals.mastered_vocabulary,
        totals.sentences,
        totals.mastered_sentences
    )
}

/// Merge new records into an existing (or new) document for one date.
///
/// Malformed structure in the existing document never fails the merge: it
/// degrades into opaque blocks that are carried through verbatim. New
/// records whose ID is already embedded anywhere in the document are
/// dropped here regardless of what the global index believes.
pub fn update(
    existing: Option<&str>,
    date: &str,
    mode: DocumentMode,
    new_sentences: &[SentenceRecord],
    new_vocab: &[VocabularyRecord],
    prefs: &Preferences,
) -> SyncOutcome {
    let mut doc = existing.map(Document::parse).unwrap_or_default();

    let mut present: BTreeSet<String> = existing
        .map(|text| identity::extract_ids(text).into_iter().collect())
        .unwrap_or_default();

    let mut appended_vocab = Vec::new();
    for record in new_vocab {
        if present.insert(identity::vocab_id(&record.word)) {
            appended_vocab.push(record.clone());
        }
    }
    let mut appended_sentences = Vec::new();
    for record in new_sentences {
        if present.insert(identity::sentence_id(&record.sentence, record.url.as_deref())) {
            appended_sentences.push(record.clone());
        }
    }

    doc.frontmatter.upsert(date, &prefs.frontmatter_source, &prefs.frontmatter_tags);
    doc.remove_overview_lines();

    // Simple mode keeps the plain two-section shape and skips migration,
    // highlighting and annotations entirely.
    let layout_strategy = match mode {
        DocumentMode::Merged => prefs.layout,
        DocumentMode::Simple => LayoutStrategy::VocabularyFirst,
    };

    if mode == DocumentMode::Merged {
        layout::normalize(&mut doc, prefs.layout);
    }

    let moved_to_mastered = if prefs.auto_archive {
        archive_checked(&mut doc, layout_strategy, prefs.mastered_tag.as_deref())
    } else {
        Vec::new()
    };

    for record in &appended_vocab {
        layout::ensure_section(
            &mut doc,
            layout::target_section(layout_strategy, BlockKind::Vocabulary),
            layout_strategy,
        )
        .push_entry(blocks::vocab_block(record));
    }
    for record in &appended_sentences {
        layout::ensure_section(
            &mut doc,
            layout::target_section(layout_strategy, BlockKind::Sentence),
            layout_strategy,
        )
        .push_entry(blocks::sentence_block(record));
    }

    if mode == DocumentMode::Merged {
        strip_related_words(&mut doc);
        let tokens = highlight::vocabulary_tokens(&doc, &[]);
        if prefs.highlight_vocabulary {
            highlight::apply_highlighting(&mut doc, &tokens);
        }
        if prefs.layout == LayoutStrategy::SentenceFirst {
            apply_related_words(&mut doc, &tokens);
        }
    }

    let totals = compute_totals(&doc);
    doc.set_overview(overview_line(&totals));

    SyncOutcome {
        content: doc.render(),
        appended_vocab,
        appended_sentences,
        totals,
        moved_to_mastered,
    }
}

/// Move checked entry blocks into their Mastered section. Kind is inferred
/// from the embedded ID; blocks without one default to the section they were
/// found in, except inside the mixed Review section where unrelated
/// checklist items must not be misfiled.
fn archive_checked(
    doc: &mut Document,
    layout_strategy: LayoutStrategy,
    mastered_tag: Option<&str>,
) -> Vec<String> {
    let mut moves: Vec<(&'static str, EntryBlock)> = Vec::new();

    for title in [SECTION_VOCABULARY, SECTION_SENTENCES, SECTION_REVIEW] {
        let Some(section) = doc.section_mut(title) else {
            continue;
        };
        let nodes = std::mem::take(&mut section.nodes);
        let mut kept = Vec::new();
        for node in nodes {
            match node {
                Node::Entry(block) if block.checked() => {
                    let destination = match block.kind() {
                        BlockKind::Vocabulary => Some(SECTION_MASTERED_VOCABULARY),
                        BlockKind::Sentence => Some(SECTION_MASTERED_SENTENCES),
                        BlockKind::Unknown => match title {
                            SECTION_VOCABULARY => Some(SECTION_MASTERED_VOCABULARY),
                            SECTION_SENTENCES => Some(SECTION_MASTERED_SENTENCES),
                            _ => None,
                        },
                    };
                    match destination {
                        Some(dest) => moves.push((dest, block)),
                        None => kept.push(Node::Entry(block)),
                    }
                }
                other => kept.push(other),
            }
        }
        section.nodes = kept;
    }

    let mut moved_ids = Vec::new();
    for (destination, mut block) in moves {
        if let Some(tag) = mastered_tag {
            block.ensure_tag(tag);
        }
        if let Some(id) = block.id() {
            moved_ids.push(id.to_string());
        }
        layout::ensure_section(doc, destination, layout_strategy).push_entry(block);
    }
    moved_ids
}

fn strip_related_words(doc: &mut Document) {
    for section in &mut doc.sections {
        for entry in section.entries_mut() {
            entry.remove_detail_with_prefix(DETAIL_RELATED_WORDS);
        }
    }
}

fn apply_related_words(doc: &mut Document, tokens: &BTreeSet<String>) {
    for section in &mut doc.sections {
        for entry in section.entries_mut() {
            if entry.kind() != BlockKind::Sentence {
                continue;
            }
            let contained = highlight::contained_tokens(entry.visible_text(), tokens);
            if !contained.is_empty() {
                entry.details.push(format!("{}{}", DETAIL_RELATED_WORDS, contained.join("、")));
            }
        }
    }
}

/// Counts are re-derived from the document every run, never incremented,
/// so a partial failure can never make the Overview drift.
pub fn compute_totals(doc: &Document) -> DocumentTotals {
    let mut vocab_active = BTreeSet::new();
    let mut vocab_mastered = BTreeSet::new();
    let mut sentence_active = BTreeSet::new();
    let mut sentence_mastered = BTreeSet::new();

    for section in &doc.sections {
        let mastered = layout::is_mastered_title(&section.title);
        for entry in section.entries() {
            let Some(id) = entry.id() else {
                continue;
            };
            match (entry.kind(), mastered) {
                (BlockKind::Vocabulary, false) => vocab_active.insert(id.to_string()),
                (BlockKind::Vocabulary, true) => vocab_mastered.insert(id.to_string()),
                (BlockKind::Sentence, false) => sentence_active.insert(id.to_string()),
                (BlockKind::Sentence, true) => sentence_mastered.insert(id.to_string()),
                (BlockKind::Unknown, _) => false,
            };
        }
    }

    DocumentTotals {
        vocabulary: vocab_active.len(),
        mastered_vocabulary: vocab_mastered.len(),
        sentences: sentence_active.len(),
        mastered_sentences: sentence_mastered.len(),
    }
}
