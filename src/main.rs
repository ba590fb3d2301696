use std::{
    collections::HashMap,
    env,
    path::PathBuf,
    process,
};

use shengci::{
    core::{
        models::Severity,
        preferences::{
            DocumentMode,
            LayoutStrategy,
            Preferences,
        },
        ShengciError,
    },
    ingest::{
        schema,
        MappingRequest,
        MappingStore,
    },
    planner::{
        self,
        ImportPlan,
        ImportRequest,
    },
};

fn print_usage() {
    println!("Usage: shengci <vault_dir> [options]");
    println!();
    println!("Options:");
    println!("  --vocab <file>       vocabulary export (CSV/TSV)");
    println!("  --sentences <file>   sentence export (CSV/TSV)");
    println!("  --layout <name>      vocab-first | sentence-first | interleaved");
    println!("  --simple             plain append, no layout migration or highlighting");
    println!("  --no-archive         leave checked items where they are");
    println!("  --map <field>=<col>  confirm a column mapping for an unmatched header");
    println!("  --commit             write changes (default is preview only)");
}

fn print_mapping_request(needs: &MappingRequest) {
    eprintln!("Could not match the header row of {}:", needs.file);
    for (index, header) in needs.headers.iter().enumerate() {
        let suggested = needs
            .suggestion
            .iter()
            .find(|(_, column)| **column == index)
            .map(|(field, _)| format!("  <- {}?", field.name()))
            .unwrap_or_default();
        eprintln!("  column {}: {}{}", index, header, suggested);
    }
    for sample in &needs.sample_rows {
        eprintln!("  sample: {}", sample.join(" | "));
    }
    eprintln!("Re-run with --map <field>=<column> to teach this header shape.");
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "info",
        Severity::Warning => "warning",
        Severity::Error => "error",
    }
}

fn print_plan(plan: &ImportPlan) {
    println!();
    println!(
        "Plan: {} new vocabulary, {} new sentences across {} date(s)",
        plan.total_new_vocab(),
        plan.total_new_sentences(),
        plan.dates.len()
    );
    println!(
        "Skipped: {} already imported, {} duplicates in batch, {} unparsable rows",
        plan.skipped_index_duplicates,
        plan.skipped_batch_duplicates,
        plan.parse_failures.len()
    );

    for failure in &plan.parse_failures {
        println!("  [row] {}:{}: {}", failure.file, failure.line, failure.reason);
    }
    for date_plan in &plan.dates {
        println!(
            "  {} -> {} (+{} vocabulary, +{} sentences)",
            date_plan.date,
            date_plan.path.display(),
            date_plan.new_vocab.len(),
            date_plan.new_sentences.len()
        );
    }
    for warning in plan.all_warnings() {
        println!("  [{}] {}", severity_label(warning.severity), warning.message);
    }
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() || args[0] == "--help" || args[0] == "-h" {
        print_usage();
        return;
    }

    let mut request = ImportRequest {
        vault_root: PathBuf::from(&args[0]),
        vocabulary_csv: None,
        sentence_csv: None,
    };
    let mut prefs = Preferences::default();
    let mut commit = false;
    let mut manual_columns: Vec<(String, usize)> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--vocab" if i + 1 < args.len() => {
                request.vocabulary_csv = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--sentences" if i + 1 < args.len() => {
                request.sentence_csv = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--layout" if i + 1 < args.len() => {
                prefs.layout = match args[i + 1].as_str() {
                    "vocab-first" => LayoutStrategy::VocabularyFirst,
                    "sentence-first" => LayoutStrategy::SentenceFirst,
                    "interleaved" => LayoutStrategy::Interleaved,
                    other => {
                        eprintln!("Unknown layout: {}", other);
                        process::exit(1);
                    }
                };
                i += 2;
            }
            "--simple" => {
                prefs.mode = DocumentMode::Simple;
                i += 1;
            }
            "--no-archive" => {
                prefs.auto_archive = false;
                i += 1;
            }
            "--map" if i + 1 < args.len() => {
                let Some((field, column)) = args[i + 1].split_once('=') else {
                    eprintln!("--map expects <field>=<column>, got: {}", args[i + 1]);
                    process::exit(1);
                };
                let Ok(column) = column.trim().parse::<usize>() else {
                    eprintln!("--map column must be a number, got: {}", column);
                    process::exit(1);
                };
                manual_columns.push((field.trim().to_lowercase(), column));
                i += 2;
            }
            "--commit" => {
                commit = true;
                i += 1;
            }
            other => {
                eprintln!("Unknown option: {}", other);
                print_usage();
                process::exit(1);
            }
        }
    }

    if request.vocabulary_csv.is_none() && request.sentence_csv.is_none() {
        eprintln!("Nothing to import: pass --vocab and/or --sentences");
        process::exit(1);
    }

    let mut mappings = MappingStore::load();
    let mut mapping_spent = false;

    let plan = loop {
        match planner::prepare_plan(&request, &prefs, &mappings, None, None) {
            Ok(ready) => break ready,
            Err(ShengciError::NeedsMapping(needs)) => {
                if manual_columns.is_empty() || mapping_spent {
                    print_mapping_request(&needs);
                    process::exit(2);
                }

                // turn the --map options into a confirmed mapping for this
                // header shape and try once more
                let mut columns = HashMap::new();
                for (name, column) in &manual_columns {
                    let Some(field) =
                        schema::known_fields(needs.kind).iter().find(|f| f.name() == name.as_str())
                    else {
                        eprintln!("Unknown {} field: {}", needs.kind.key(), name);
                        process::exit(1);
                    };
                    if *column >= needs.headers.len() {
                        eprintln!(
                            "--map {}={} is out of range ({} columns)",
                            name,
                            column,
                            needs.headers.len()
                        );
                        process::exit(1);
                    }
                    columns.insert(*field, *column);
                }

                mappings.confirm(&needs.signature, needs.kind, columns);
                if let Err(e) = mappings.save() {
                    eprintln!("Failed to save column mapping: {}", e);
                }
                mapping_spent = true;
            }
            Err(e) => {
                eprintln!("{}", e);
                process::exit(1);
            }
        }
    };

    print_plan(&plan);

    if !commit {
        println!();
        println!("Preview only. Pass --commit to write.");
        return;
    }
    if !plan.can_commit() {
        eprintln!("Refusing to commit: resolve error-severity warnings first.");
        process::exit(1);
    }

    match planner::perform_import(&plan, &prefs, None, None) {
        Ok(summary) => {
            println!();
            for outcome in &summary.written {
                println!(
                    "wrote {} (+{} vocabulary, +{} sentences, {} archived)",
                    outcome.path.display(),
                    outcome.appended_vocab,
                    outcome.appended_sentences,
                    outcome.moved_to_mastered
                );
            }
            for (path, error) in &summary.failures {
                eprintln!("failed {}: {}", path.display(), error);
            }
            println!(
                "Done: +{} vocabulary, +{} sentences, {} skipped, {} failed",
                summary.appended_vocab,
                summary.appended_sentences,
                summary.skipped_index_duplicates + summary.skipped_batch_duplicates,
                summary.failures.len()
            );
            println!("Session log: {}", summary.log_path.display());
            if !summary.failures.is_empty() {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}
