use super::{
    synchronizer::update,
    Document,
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

fn vocab(word: &str, translation: &str) -> VocabularyRecord {
    VocabularyRecord {
        word: word.to_string(),
        phonetic: None,
        translation: translation.to_string(),
        source: None,
        date: "2026-02-09".to_string(),
    }
}

fn sentence(text: &str) -> SentenceRecord {
    SentenceRecord {
        sentence: text.to_string(),
        translation: "测试".to_string(),
        url: None,
        date: "2026-02-09".to_string(),
    }
}

#[test]
fn creates_a_new_document_with_expected_shape() {
    let prefs = Preferences::default();
    let outcome = update(
        None,
        "2026-02-09",
        DocumentMode::Merged,
        &[sentence("An apple a day.")],
        &[vocab("apple", "苹果")],
        &prefs,
    );

    assert_eq!(outcome.appended_vocab.len(), 1);
    assert_eq!(outcome.appended_sentences.len(), 1);
    assert_eq!(outcome.totals.vocabulary, 1);
    assert_eq!(outcome.totals.sentences, 1);

    let content = &outcome.content;
    assert!(content.starts_with("---\n"));
    assert!(content.contains("date: 2026-02-09"));
    assert!(content.contains("source: imported"));
    assert!(content.contains("tags: [english, review]"));
    assert!(content.contains(
        "**Overview:** Vocabulary: 1 (Mastered 0) | Sentences: 1 (Mastered 0)"
    ));

    let doc = Document::parse(content);
    assert_eq!(doc.position(SECTION_VOCABULARY), Some(0));
    assert_eq!(doc.position(SECTION_SENTENCES), Some(1));
}

#[test]
fn second_run_with_same_records_changes_nothing() {
    let prefs = Preferences::default();
    let sentences = [sentence("An apple a day.")];
    let vocabulary = [vocab("apple", "苹果")];

    let first = update(None, "2026-02-09", DocumentMode::Merged, &sentences, &vocabulary, &prefs);
    let second = update(
        Some(&first.content),
        "2026-02-09",
        DocumentMode::Merged,
        &sentences,
        &vocabulary,
        &prefs,
    );

    assert!(second.appended_vocab.is_empty());
    assert!(second.appended_sentences.is_empty());
    assert_eq!(second.content, first.content);
}

#[test]
fn checked_vocabulary_moves_to_mastered_section() {
    let banana_id = identity::vocab_id("banana");
    let existing = format!(
        "---\ndate: 2026-02-09\nsource: imported\ntags: [english, review]\n---\n\n## Vocabulary\n- [x] banana  %% id: {} %%\n  - 释义：香蕉\n",
        banana_id
    );

    let prefs = Preferences::default();
    let outcome = update(Some(&existing), "2026-02-09", DocumentMode::Merged, &[], &[], &prefs);

    assert_eq!(outcome.moved_to_mastered, vec![banana_id.clone()]);
    assert!(outcome
        .content
        .contains("**Overview:** Vocabulary: 0 (Mastered 1) | Sentences: 0 (Mastered 0)"));

    let doc = Document::parse(&outcome.content);
    let mastered = doc.section(SECTION_MASTERED_VOCABULARY).unwrap();
    assert_eq!(mastered.entry_ids(), vec![banana_id.clone()]);

    // a move, not a copy
    let active = doc.section(SECTION_VOCABULARY).unwrap();
    assert!(active.entry_ids().is_empty());
    assert_eq!(outcome.content.matches(&banana_id).count(), 1);

    // the moved detail line travels with the block
    let mastered_at = outcome.content.find("## Mastered Vocabulary").unwrap();
    let detail_at = outcome.content.find("  - 释义：香蕉").unwrap();
    assert!(detail_at > mastered_at);
}

#[test]
fn mastered_tag_is_appended_when_configured() {
    let existing = format!(
        "## Vocabulary\n- [x] banana  %% id: {} %%\n",
        identity::vocab_id("banana")
    );
    let prefs = Preferences { mastered_tag: Some("#mastered".to_string()), ..Default::default() };

    let first = update(Some(&existing), "2026-02-09", DocumentMode::Merged, &[], &[], &prefs);
    assert!(first.content.contains("#mastered"));

    let second = update(Some(&first.content), "2026-02-09", DocumentMode::Merged, &[], &[], &prefs);
    assert_eq!(second.content.matches("#mastered").count(), 1);
}

#[test]
fn unknown_checked_items_in_review_are_left_alone() {
    let existing = "## Review\n- [x] water the plants\n";
    let prefs = Preferences { layout: LayoutStrategy::Interleaved, ..Default::default() };
    let outcome = update(Some(existing), "2026-02-09", DocumentMode::Merged, &[], &[], &prefs);

    assert!(outcome.moved_to_mastered.is_empty());
    let doc = Document::parse(&outcome.content);
    assert_eq!(doc.section(SECTION_REVIEW).unwrap().entries().count(), 1);
    assert!(doc.section(SECTION_MASTERED_VOCABULARY).is_none());
}

#[test]
fn layout_round_trip_preserves_membership() {
    let sentences = [sentence("An apple a day."), sentence("Bananas are yellow.")];
    let vocabulary = [vocab("apple", "苹果"), vocab("banana", "香蕉")];

    let sectioned = Preferences::default();
    let interleaved = Preferences { layout: LayoutStrategy::Interleaved, ..Default::default() };

    let first =
        update(None, "2026-02-09", DocumentMode::Merged, &sentences, &vocabulary, &sectioned);
    let ids = Document::parse(&first.content).all_ids();
    assert_eq!(ids.len(), 4);

    let merged =
        update(Some(&first.content), "2026-02-09", DocumentMode::Merged, &[], &[], &interleaved);
    let merged_doc = Document::parse(&merged.content);
    assert!(merged_doc.section(SECTION_VOCABULARY).is_none());
    assert!(merged_doc.section(SECTION_SENTENCES).is_none());
    assert_eq!(merged_doc.all_ids(), ids);
    assert_eq!(merged_doc.section(SECTION_REVIEW).unwrap().entry_ids().len(), 4);

    let back =
        update(Some(&merged.content), "2026-02-09", DocumentMode::Merged, &[], &[], &sectioned);
    let back_doc = Document::parse(&back.content);
    assert!(back_doc.section(SECTION_REVIEW).is_none());
    assert_eq!(back_doc.all_ids(), ids);
}

#[test]
fn highlighting_bolds_vocabulary_inside_sentences_once() {
    let prefs = Preferences::default();
    let outcome = update(
        None,
        "2026-02-09",
        DocumentMode::Merged,
        &[sentence("An apple a day keeps the doctor away.")],
        &[vocab("apple", "苹果"), vocab("doctor", "医生")],
        &prefs,
    );
    assert!(outcome.content.contains("An **apple** a day keeps the **doctor** away."));

    let again =
        update(Some(&outcome.content), "2026-02-09", DocumentMode::Merged, &[], &[], &prefs);
    assert_eq!(again.content, outcome.content);
}

#[test]
fn highlighting_can_be_disabled() {
    let prefs = Preferences { highlight_vocabulary: false, ..Default::default() };
    let outcome = update(
        None,
        "2026-02-09",
        DocumentMode::Merged,
        &[sentence("An apple a day.")],
        &[vocab("apple", "苹果")],
        &prefs,
    );
    assert!(!outcome.content.contains("**apple**"));
}

#[test]
fn sentence_first_layout_annotates_related_words() {
    let prefs = Preferences { layout: LayoutStrategy::SentenceFirst, ..Default::default() };
    let outcome = update(
        None,
        "2026-02-09",
        DocumentMode::Merged,
        &[sentence("An apple a day.")],
        &[vocab("apple", "苹果")],
        &prefs,
    );

    assert!(outcome.content.contains("  - 相关词汇：apple"));
    let doc = Document::parse(&outcome.content);
    assert_eq!(doc.position(SECTION_SENTENCES), Some(0));
    assert_eq!(doc.position(SECTION_VOCABULARY), Some(1));

    // recomputed, never duplicated
    let again =
        update(Some(&outcome.content), "2026-02-09", DocumentMode::Merged, &[], &[], &prefs);
    assert_eq!(again.content.matches("相关词汇").count(), 1);
    assert_eq!(again.content, outcome.content);
}

#[test]
fn ids_already_in_document_are_not_appended_again() {
    let existing = format!(
        "## Vocabulary\n- [ ] apple  %% id: {} %%\n",
        identity::vocab_id("apple")
    );
    let prefs = Preferences { auto_archive: false, ..Default::default() };
    let outcome = update(
        Some(&existing),
        "2026-02-09",
        DocumentMode::Merged,
        &[],
        &[vocab("Apple", "different translation"), vocab("pear", "梨")],
        &prefs,
    );

    assert_eq!(outcome.appended_vocab.len(), 1);
    assert_eq!(outcome.appended_vocab[0].word, "pear");
    assert_eq!(outcome.totals.vocabulary, 2);
}

#[test]
fn simple_mode_appends_without_merged_features() {
    let existing = "## Review\n- [ ] apple  %% id: vocab_d0be2dc421be4fcd0172e5afceea3970e2f3d940 %%\n";
    let prefs = Preferences { auto_archive: false, ..Default::default() };
    let outcome = update(
        Some(existing),
        "2026-02-09",
        DocumentMode::Simple,
        &[sentence("An apple a day.")],
        &[],
        &prefs,
    );

    let doc = Document::parse(&outcome.content);
    // review untouched in simple mode, sentence appended to its own section
    assert!(doc.section(SECTION_REVIEW).is_some());
    assert_eq!(doc.section(SECTION_SENTENCES).unwrap().entry_ids().len(), 1);
    assert!(!outcome.content.contains("**apple**"));
}

#[test]
fn malformed_structure_survives_the_merge() {
    let existing = "random first line\n## Vocabulary\n- [ not a checkbox\n  stray indent\n";
    let prefs = Preferences::default();
    let outcome = update(
        Some(existing),
        "2026-02-09",
        DocumentMode::Merged,
        &[],
        &[vocab("apple", "苹果")],
        &prefs,
    );

    assert!(outcome.content.contains("random first line"));
    assert!(outcome.content.contains("- [ not a checkbox"));
    assert_eq!(outcome.appended_vocab.len(), 1);
}
