use std::{
    collections::{
        BTreeMap,
        BTreeSet,
        HashMap,
    },
    fs,
    path::PathBuf,
};

use chrono::{
    Datelike,
    Local,
};

use crate::{
    core::{
        models::{
            ParseFailure,
            Record,
            RecordKind,
            SentenceRecord,
            VocabularyRecord,
            Warning,
        },
        preferences::{
            FallbackYearPolicy,
            Preferences,
        },
        tasks::CancelToken,
        ShengciError,
    },
    document::synchronizer,
    index::{
        self,
        DedupIndex,
    },
    ingest::{
        self,
        MappingStore,
    },
    persistence::{
        self,
        session_log::SessionLog,
    },
};

pub type ProgressFn<'a> = &'a dyn Fn(f32, &str);

pub const LOG_FILE: &str = "import.log";

#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub vault_root: PathBuf,
    pub vocabulary_csv: Option<PathBuf>,
    pub sentence_csv: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct DatePlan {
    pub date: String,
    pub path: PathBuf,
    pub new_vocab: Vec<VocabularyRecord>,
    pub new_sentences: Vec<SentenceRecord>,
    pub warnings: Vec<Warning>,
}

/// Read-only preview of one import: what would be written where, what was
/// filtered, and anything hazardous about the targets. Producing a plan has
/// no side effects on the vault.
#[derive(Debug, Clone)]
pub struct ImportPlan {
    pub vault_root: PathBuf,
    pub dates: Vec<DatePlan>,
    pub parse_failures: Vec<ParseFailure>,
    pub skipped_index_duplicates: usize,
    pub skipped_batch_duplicates: usize,
    pub observed_existing: DedupIndex,
    pub fallback_year: i32,
    pub warnings: Vec<Warning>,
}

impl ImportPlan {
    pub fn all_warnings(&self) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().chain(self.dates.iter().flat_map(|d| d.warnings.iter()))
    }

    pub fn can_commit(&self) -> bool {
        self.all_warnings().all(|w| !w.blocks_commit())
    }

    pub fn total_new_vocab(&self) -> usize {
        self.dates.iter().map(|d| d.new_vocab.len()).sum()
    }

    pub fn total_new_sentences(&self) -> usize {
        self.dates.iter().map(|d| d.new_sentences.len()).sum()
    }
}

#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub date: String,
    pub path: PathBuf,
    pub appended_vocab: usize,
    pub appended_sentences: usize,
    pub moved_to_mastered: usize,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub written: Vec<FileOutcome>,
    pub failures: Vec<(PathBuf, String)>,
    pub appended_vocab: usize,
    pub appended_sentences: usize,
    pub skipped_index_duplicates: usize,
    pub skipped_batch_duplicates: usize,
    pub parse_failures: usize,
    pub cancelled: bool,
    pub log_path: PathBuf,
}

fn report(progress: Option<ProgressFn>, fraction: f32, message: &str) {
    if let Some(callback) = progress {
        callback(fraction, message);
    }
}

fn check_cancelled(cancel: Option<&CancelToken>) -> Result<(), ShengciError> {
    if cancel.map(|c| c.is_cancelled()).unwrap_or(false) {
        return Err(ShengciError::Cancelled);
    }
    Ok(())
}

// Tie between equally frequent years is resolved by map iteration order;
// the original behaved the same way and no product decision exists yet.
fn resolve_fallback_year(policy: FallbackYearPolicy, sentences: &[Record]) -> i32 {
    let current = Local::now().year();
    match policy {
        FallbackYearPolicy::CurrentYear => current,
        FallbackYearPolicy::MostFrequentSentenceYear => {
            let mut counts: HashMap<i32, usize> = HashMap::new();
            for record in sentences {
                if let Ok(year) = record.date()[..4.min(record.date().len())].parse::<i32>() {
                    *counts.entry(year).or_insert(0) += 1;
                }
            }
            counts
                .into_iter()
                .max_by_key(|(_, count)| *count)
                .map(|(year, _)| year)
                .unwrap_or(current)
        }
    }
}

fn preflight_target(plan: &DatePlan, prefs: &Preferences) -> Vec<Warning> {
    let mut warnings = Vec::new();
    let path = &plan.path;

    if !path.exists() {
        // the file will be created; what matters is the directory
        if let Some(parent) = path.parent() {
            if parent.exists() {
                if let Ok(metadata) = fs::metadata(parent) {
                    if metadata.permissions().readonly() {
                        warnings.push(Warning::error(
                            format!("{} is not writable", parent.display()),
                            Some(parent.to_path_buf()),
                        ));
                    }
                }
            }
        }
        return warnings;
    }

    match fs::metadata(path) {
        Ok(metadata) => {
            if metadata.permissions().readonly() {
                warnings.push(Warning::error(
                    format!("{} is read-only", path.display()),
                    Some(path.clone()),
                ));
            } else if let Err(e) = fs::OpenOptions::new().append(true).open(path) {
                // best-effort lock probe; a sync client or editor may hold it
                warnings.push(Warning::error(
                    format!("{} cannot be opened for writing: {}", path.display(), e),
                    Some(path.clone()),
                ));
            }

            let threshold = prefs.large_file_warning_bytes;
            if metadata.len() > threshold {
                warnings.push(Warning::warning(
                    format!("{} is getting large ({} KB)", path.display(), metadata.len() / 1024),
                    Some(path.clone()),
                ));
            } else if metadata.len() > threshold / 2 {
                warnings.push(Warning::info(
                    format!("{} is approaching the size threshold", path.display()),
                    Some(path.clone()),
                ));
            }
        }
        Err(e) => {
            warnings.push(Warning::error(
                format!("Cannot inspect {}: {}", path.display(), e),
                Some(path.clone()),
            ));
        }
    }

    warnings
}

/// Phase one: parse, dedup, group and preflight. Never writes anything.
pub fn prepare_plan(
    request: &ImportRequest,
    prefs: &Preferences,
    mappings: &MappingStore,
    progress: Option<ProgressFn>,
    cancel: Option<&CancelToken>,
) -> Result<ImportPlan, ShengciError> {
    check_cancelled(cancel)?;
    report(progress, 0.0, "Parsing sentence export...");

    let mut parse_failures = Vec::new();

    let sentence_records = match &request.sentence_csv {
        Some(path) => {
            let outcome = ingest::parse_table_file(path, RecordKind::Sentence, 0, mappings, cancel)?;
            parse_failures.extend(outcome.failures);
            outcome.records
        }
        None => Vec::new(),
    };

    let fallback_year = resolve_fallback_year(prefs.fallback_year_policy, &sentence_records);

    check_cancelled(cancel)?;
    report(progress, 0.2, "Parsing vocabulary export...");

    let vocab_records = match &request.vocabulary_csv {
        Some(path) => {
            let outcome =
                ingest::parse_table_file(path, RecordKind::Vocabulary, fallback_year, mappings, cancel)?;
            parse_failures.extend(outcome.failures);
            outcome.records
        }
        None => Vec::new(),
    };

    check_cancelled(cancel)?;
    report(progress, 0.4, "Loading dedup index...");

    let loaded = index::load(&request.vault_root);
    let observed_existing = index::self_heal(&request.vault_root, &loaded);

    let mut warnings: Vec<Warning> = loaded
        .quarantined
        .iter()
        .map(|backup| {
            Warning::warning(
                format!("Corrupt index quarantined to {}", backup.display()),
                Some(backup.clone()),
            )
        })
        .collect();
    if !observed_existing.is_empty() {
        warnings.push(Warning::info(
            format!(
                "Recovered {} record IDs from existing documents",
                observed_existing.len()
            ),
            None,
        ));
    }

    let mut known = loaded.index.clone();
    known.union(&observed_existing);

    check_cancelled(cancel)?;
    report(progress, 0.6, "Filtering duplicates...");

    let mut skipped_index_duplicates = 0usize;
    let mut skipped_batch_duplicates = 0usize;
    let mut seen_in_batch: BTreeSet<String> = BTreeSet::new();
    let mut groups: BTreeMap<String, (Vec<VocabularyRecord>, Vec<SentenceRecord>)> =
        BTreeMap::new();

    for record in vocab_records.into_iter().chain(sentence_records) {
        let id = record.id();
        if known.contains(&id) {
            skipped_index_duplicates += 1;
            continue;
        }
        if !seen_in_batch.insert(id) {
            skipped_batch_duplicates += 1;
            continue;
        }
        let group = groups.entry(record.date().to_string()).or_default();
        match record {
            Record::Vocabulary(v) => group.0.push(v),
            Record::Sentence(s) => group.1.push(s),
        }
    }

    report(progress, 0.8, "Checking targets...");

    let mut dates = Vec::new();
    for (date, (new_vocab, new_sentences)) in groups {
        check_cancelled(cancel)?;
        let mut plan = DatePlan {
            path: request.vault_root.join(format!("{}.md", date)),
            date,
            new_vocab,
            new_sentences,
            warnings: Vec::new(),
        };
        plan.warnings = preflight_target(&plan, prefs);
        dates.push(plan);
    }

    report(progress, 1.0, "Plan ready");

    Ok(ImportPlan {
        vault_root: request.vault_root.clone(),
        dates,
        parse_failures,
        skipped_index_duplicates,
        skipped_batch_duplicates,
        observed_existing,
        fallback_year,
        warnings,
    })
}

/// Phase two: commit. Re-reads every target fresh so manual edits made
/// since the preview are never clobbered, writes atomically, and persists
/// the accumulated dedup index exactly once at the end. A failing document
/// is reported and skipped, never fatal to the rest of the batch.
pub fn perform_import(
    plan: &ImportPlan,
    prefs: &Preferences,
    progress: Option<ProgressFn>,
    cancel: Option<&CancelToken>,
) -> Result<ImportSummary, ShengciError> {
    if !plan.can_commit() {
        return Err(ShengciError::Custom(
            "Import blocked by error-severity warnings; resolve them and preview again"
                .to_string(),
        ));
    }

    let vault_root = &plan.vault_root;
    let log_path = vault_root.join(index::APP_DIR).join("logs").join(LOG_FILE);
    let mut log = SessionLog::new("Import session");

    let fresh = index::load(vault_root);
    let mut accumulated = fresh.index.clone();
    accumulated.union(&plan.observed_existing);

    for backup in &fresh.quarantined {
        log.event(format!("quarantined corrupt index: {}", backup.display()));
    }
    if !plan.observed_existing.is_empty() {
        log.event(format!(
            "self-heal scan recovered {} record IDs",
            plan.observed_existing.len()
        ));
    }
    for failure in &plan.parse_failures {
        log.event(format!("parse failure {}:{}: {}", failure.file, failure.line, failure.reason));
    }

    let mut summary = ImportSummary {
        written: Vec::new(),
        failures: Vec::new(),
        appended_vocab: 0,
        appended_sentences: 0,
        skipped_index_duplicates: plan.skipped_index_duplicates,
        skipped_batch_duplicates: plan.skipped_batch_duplicates,
        parse_failures: plan.parse_failures.len(),
        cancelled: false,
        log_path: log_path.clone(),
    };

    let total = plan.dates.len().max(1);
    for (i, date_plan) in plan.dates.iter().enumerate() {
        if cancel.map(|c| c.is_cancelled()).unwrap_or(false) {
            summary.cancelled = true;
            log.event(format!("cancelled before {}", date_plan.date));
            break;
        }
        report(progress, i as f32 / total as f32, &date_plan.date);

        let existing = if date_plan.path.exists() {
            match fs::read_to_string(&date_plan.path) {
                Ok(content) => Some(content),
                Err(e) => {
                    log.event(format!("read failed {}: {}", date_plan.path.display(), e));
                    summary.failures.push((date_plan.path.clone(), e.to_string()));
                    continue;
                }
            }
        } else {
            None
        };

        let outcome = synchronizer::update(
            existing.as_deref(),
            &date_plan.date,
            prefs.mode,
            &date_plan.new_sentences,
            &date_plan.new_vocab,
            prefs,
        );

        match persistence::write_atomic(&date_plan.path, outcome.content.as_bytes()) {
            Ok(()) => {
                for record in &outcome.appended_vocab {
                    accumulated.insert(crate::identity::vocab_id(&record.word));
                }
                for record in &outcome.appended_sentences {
                    accumulated
                        .insert(crate::identity::sentence_id(&record.sentence, record.url.as_deref()));
                }
                summary.appended_vocab += outcome.appended_vocab.len();
                summary.appended_sentences += outcome.appended_sentences.len();
                log.event(format!(
                    "wrote {} (+{} vocabulary, +{} sentences)",
                    date_plan.path.display(),
                    outcome.appended_vocab.len(),
                    outcome.appended_sentences.len()
                ));
                summary.written.push(FileOutcome {
                    date: date_plan.date.clone(),
                    path: date_plan.path.clone(),
                    appended_vocab: outcome.appended_vocab.len(),
                    appended_sentences: outcome.appended_sentences.len(),
                    moved_to_mastered: outcome.moved_to_mastered.len(),
                });
            }
            Err(e) => {
                log.event(format!("write failed {}: {}", date_plan.path.display(), e));
                summary.failures.push((date_plan.path.clone(), e.to_string()));
            }
        }
    }

    if let Err(e) = index::save(vault_root, &accumulated) {
        log.event(format!("index save failed: {}", e));
        summary.failures.push((index::primary_index_path(vault_root), e.to_string()));
    }

    if let Err(e) = log.append_to(&log_path) {
        eprintln!("Failed to write session log: {}", e);
    }

    report(progress, 1.0, "Import finished");
    Ok(summary)
}
