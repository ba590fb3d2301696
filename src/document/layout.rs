use super::{
    blocks::BlockKind,
    Document,
    Node,
    Section,
    SECTION_MASTERED_SENTENCES,
    SECTION_MASTERED_VOCABULARY,
    SECTION_REVIEW,
    SECTION_SENTENCES,
    SECTION_VOCABULARY,
};
use crate::core::preferences::LayoutStrategy;

pub const MASTERED_ORDER: [&str; 2] = [SECTION_MASTERED_VOCABULARY, SECTION_MASTERED_SENTENCES];

pub fn active_order(layout: LayoutStrategy) -> &'static [&'static str] {
    match layout {
        LayoutStrategy::VocabularyFirst => &[SECTION_VOCABULARY, SECTION_SENTENCES],
        LayoutStrategy::SentenceFirst => &[SECTION_SENTENCES, SECTION_VOCABULARY],
        LayoutStrategy::Interleaved => &[SECTION_REVIEW],
    }
}

pub fn is_mastered_title(title: &str) -> bool {
    MASTERED_ORDER.contains(&title)
}

pub fn is_active_known_title(title: &str) -> bool {
    title == SECTION_VOCABULARY || title == SECTION_SENTENCES || title == SECTION_REVIEW
}

/// Section a new record of the given kind lands in under this layout.
pub fn target_section(layout: LayoutStrategy, kind: BlockKind) -> &'static str {
    match (layout, kind) {
        (LayoutStrategy::Interleaved, _) => SECTION_REVIEW,
        (_, BlockKind::Sentence) => SECTION_SENTENCES,
        _ => SECTION_VOCABULARY,
    }
}

/// Migrate the document to the requested layout. Both directions are
/// lossless with respect to entry-block membership: switching strategies
/// moves blocks between sections but never drops one.
pub fn normalize(doc: &mut Document, layout: LayoutStrategy) {
    match layout {
        LayoutStrategy::Interleaved => merge_into_review(doc),
        _ => split_review(doc),
    }
    reorder(doc, layout);
}

// interleaved -> sectioned: typed entry blocks go back to their kind's
// section; unknown blocks stay put so unrelated checklist items the user
// keeps in Review are not misfiled.
fn split_review(doc: &mut Document) {
    let Some(position) = doc.position(SECTION_REVIEW) else {
        return;
    };

    let mut vocab_nodes = Vec::new();
    let mut sentence_nodes = Vec::new();
    let review = &mut doc.sections[position];
    let kept = std::mem::take(&mut review.nodes)
        .into_iter()
        .filter_map(|node| match node {
            Node::Entry(block) => match block.kind() {
                BlockKind::Vocabulary => {
                    vocab_nodes.push(Node::Entry(block));
                    None
                }
                BlockKind::Sentence => {
                    sentence_nodes.push(Node::Entry(block));
                    None
                }
                BlockKind::Unknown => Some(Node::Entry(block)),
            },
            opaque => Some(opaque),
        })
        .collect();
    doc.sections[position].nodes = kept;

    if !vocab_nodes.is_empty() {
        append_nodes(doc, SECTION_VOCABULARY, vocab_nodes);
    }
    if !sentence_nodes.is_empty() {
        append_nodes(doc, SECTION_SENTENCES, sentence_nodes);
    }
    if doc.section(SECTION_REVIEW).map(|s| s.is_empty()).unwrap_or(false) {
        doc.remove_section(SECTION_REVIEW);
    }
}

// sectioned -> interleaved: whole sections concatenate into Review.
fn merge_into_review(doc: &mut Document) {
    for title in [SECTION_VOCABULARY, SECTION_SENTENCES] {
        if let Some(section) = doc.remove_section(title) {
            append_nodes(doc, SECTION_REVIEW, section.nodes);
        }
    }
}

fn append_nodes(doc: &mut Document, title: &str, nodes: Vec<Node>) {
    if doc.position(title).is_none() {
        let at = insertion_index(doc, title, LayoutStrategy::VocabularyFirst);
        doc.sections.insert(at, Section::new(title));
    }
    if let Some(section) = doc.section_mut(title) {
        section.nodes.extend(nodes);
    }
}

/// Enforce section order by extracting and reinserting whole known sections:
/// active sections in layout order, then any remaining known active section,
/// then user sections untouched in their relative order, mastered always
/// last.
fn reorder(doc: &mut Document, layout: LayoutStrategy) {
    let mut active: Vec<Section> = Vec::new();
    let mut leftover_known: Vec<Section> = Vec::new();
    let mut unknown: Vec<Section> = Vec::new();
    let mut mastered: Vec<Section> = Vec::new();

    for section in doc.sections.drain(..) {
        if is_mastered_title(&section.title) {
            mastered.push(section);
        } else if active_order(layout).contains(&section.title.as_str()) {
            active.push(section);
        } else if is_active_known_title(&section.title) {
            leftover_known.push(section);
        } else {
            unknown.push(section);
        }
    }

    active.sort_by_key(|s| {
        active_order(layout).iter().position(|t| *t == s.title).unwrap_or(usize::MAX)
    });
    mastered.sort_by_key(|s| {
        MASTERED_ORDER.iter().position(|t| *t == s.title).unwrap_or(usize::MAX)
    });

    doc.sections =
        active.into_iter().chain(leftover_known).chain(unknown).chain(mastered).collect();
}

/// Where a newly created section belongs, relative to what already exists.
pub fn insertion_index(doc: &Document, title: &str, layout: LayoutStrategy) -> usize {
    if is_mastered_title(title) {
        if title == SECTION_MASTERED_VOCABULARY {
            if let Some(i) = doc.position(SECTION_MASTERED_SENTENCES) {
                return i;
            }
        }
        return doc.sections.len();
    }

    let order = active_order(layout);
    let rank = order.iter().position(|t| *t == title).unwrap_or(order.len());
    let mut insert = 0;
    for (i, section) in doc.sections.iter().enumerate() {
        if let Some(r) = order.iter().position(|t| *t == section.title) {
            if r < rank {
                insert = i + 1;
            }
        }
    }
    insert
}

pub fn ensure_section<'a>(
    doc: &'a mut Document,
    title: &str,
    layout: LayoutStrategy,
) -> &'a mut Section {
    if let Some(i) = doc.position(title) {
        return &mut doc.sections[i];
    }
    let at = insertion_index(doc, title, layout);
    doc.sections.insert(at, Section::new(title));
    &mut doc.sections[at]
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::{
        core::models::{
            SentenceRecord,
            VocabularyRecord,
        },
        document::blocks,
    };

    fn sample_doc() -> Document {
        let mut doc = Document::default();
        let vocab = VocabularyRecord {
            word: "apple".to_string(),
            phonetic: None,
            translation: "苹果".to_string(),
            source: None,
            date: "2026-02-09".to_string(),
        };
        let sentence = SentenceRecord {
            sentence: "An apple a day.".to_string(),
            translation: String::new(),
            url: None,
            date: "2026-02-09".to_string(),
        };
        ensure_section(&mut doc, SECTION_VOCABULARY, LayoutStrategy::VocabularyFirst)
            .push_entry(blocks::vocab_block(&vocab));
        ensure_section(&mut doc, SECTION_SENTENCES, LayoutStrategy::VocabularyFirst)
            .push_entry(blocks::sentence_block(&sentence));
        doc
    }

    #[test]
    fn round_trip_preserves_entry_ids() {
        let mut doc = sample_doc();
        let before: BTreeSet<String> = doc.all_ids();

        normalize(&mut doc, LayoutStrategy::Interleaved);
        assert!(doc.section(SECTION_REVIEW).is_some());
        assert!(doc.section(SECTION_VOCABULARY).is_none());
        assert!(doc.section(SECTION_SENTENCES).is_none());
        assert_eq!(doc.all_ids(), before);

        normalize(&mut doc, LayoutStrategy::VocabularyFirst);
        assert!(doc.section(SECTION_REVIEW).is_none());
        assert_eq!(doc.all_ids(), before);
        assert_eq!(doc.section(SECTION_VOCABULARY).unwrap().entry_ids().len(), 1);
        assert_eq!(doc.section(SECTION_SENTENCES).unwrap().entry_ids().len(), 1);
    }

    #[test]
    fn unknown_checklist_items_stay_in_review() {
        let mut doc = Document::default();
        let review = ensure_section(&mut doc, SECTION_REVIEW, LayoutStrategy::Interleaved);
        review.push_entry(super::super::EntryBlock::new("- [ ] buy groceries"));

        normalize(&mut doc, LayoutStrategy::VocabularyFirst);
        let review = doc.section(SECTION_REVIEW).unwrap();
        assert_eq!(review.entries().count(), 1);
    }

    #[test]
    fn mastered_sections_stay_last_in_canonical_order() {
        let mut doc = sample_doc();
        doc.sections.insert(0, Section::new(SECTION_MASTERED_SENTENCES));
        doc.sections.insert(0, Section::new(SECTION_MASTERED_VOCABULARY));
        doc.sections.insert(0, Section::new("Notes"));

        normalize(&mut doc, LayoutStrategy::SentenceFirst);
        let titles: Vec<&str> = doc.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                SECTION_SENTENCES,
                SECTION_VOCABULARY,
                "Notes",
                SECTION_MASTERED_VOCABULARY,
                SECTION_MASTERED_SENTENCES,
            ]
        );
    }

    #[test]
    fn new_mastered_vocab_inserts_before_mastered_sentences() {
        let mut doc = sample_doc();
        ensure_section(&mut doc, SECTION_MASTERED_SENTENCES, LayoutStrategy::VocabularyFirst);
        ensure_section(&mut doc, SECTION_MASTERED_VOCABULARY, LayoutStrategy::VocabularyFirst);

        let titles: Vec<&str> = doc.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                SECTION_VOCABULARY,
                SECTION_SENTENCES,
                SECTION_MASTERED_VOCABULARY,
                SECTION_MASTERED_SENTENCES,
            ]
        );
    }
}
