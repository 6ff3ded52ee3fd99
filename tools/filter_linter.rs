/// Filter Linter — loads a filter file and reports skipped entries.
///
/// Usage: filter_linter <filter.ron> [--catalog <catalog.ron>] [--rules]

use killmove_filter::core::condition::builtin_registry;
use killmove_filter::core::config::LoadMode;
use killmove_filter::core::pipeline::FilterPipeline;
use killmove_filter::schema::candidate::{load_catalog, CandidateEntry};
use killmove_filter::schema::tag::TagSet;
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: filter_linter <filter.ron> [--catalog <catalog.ron>] [--rules]");
        process::exit(0);
    }

    if args[1] == "--rules" {
        print_rules();
        process::exit(0);
    }

    let filter_path = &args[1];
    let mut catalog_path = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--catalog" if i + 1 < args.len() => {
                i += 1;
                catalog_path = Some(args[i].clone());
            }
            "--rules" => print_rules(),
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let mut pipeline = FilterPipeline::new();
    let report = match pipeline.load_file(Path::new(filter_path), LoadMode::Replace) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("ERROR: Failed to load filter file: {}", e);
            process::exit(1);
        }
    };

    println!(
        "Loaded {} taggers and {} tag expansions",
        report.classifiers_loaded, report.aliases_loaded
    );

    let errors: Vec<String> = report.diagnostics.iter().map(|d| d.to_string()).collect();
    let mut warnings = lint_pipeline(&pipeline);

    if let Some(ref path) = catalog_path {
        match load_catalog(Path::new(path)) {
            Ok(catalog) => {
                println!("Loaded {} catalog entries", catalog.len());
                warnings.extend(lint_against_catalog(&pipeline, &catalog));
            }
            Err(e) => {
                eprintln!("ERROR: Failed to load catalog: {}", e);
                process::exit(1);
            }
        }
    }

    println!("\n=== Filter Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn print_rules() {
    let registry = builtin_registry();
    println!("Available rules:");
    for name in registry.names() {
        if let Some(condition) = registry.lookup(name) {
            println!("  {:<20} {}", name, condition.hint());
            for (key, value) in condition.default_params().iter() {
                println!("      {} = {:?}", key, value);
            }
        }
    }
}

fn lint_pipeline(pipeline: &FilterPipeline) -> Vec<String> {
    let mut warnings = Vec::new();

    for (index, classifier) in pipeline.classifiers().iter().enumerate() {
        let label = format!("tagger {} ({})", index, classifier.condition_name());

        if !classifier.enable_on_true && !classifier.enable_on_false {
            warnings.push(format!("{} has both branches disabled", label));
        }
        if classifier.enable_on_true && classifier.outcome_on_true.is_empty() {
            warnings.push(format!("{} enables the true branch but adds no tags", label));
        }
        if classifier.enable_on_false && classifier.outcome_on_false.is_empty() {
            warnings.push(format!("{} enables the false branch but adds no tags", label));
        }

        for (branch, outcome) in [
            ("true", &classifier.outcome_on_true),
            ("false", &classifier.outcome_on_false),
        ] {
            let clash: Vec<&str> = outcome.required.iter().filter(|t| outcome.banned.contains(t)).collect();
            if !clash.is_empty() {
                warnings.push(format!(
                    "{} {} branch both requires and bans: {}",
                    label,
                    branch,
                    clash.join(" ")
                ));
            }
        }
    }

    for alias in pipeline.aliases().iter() {
        if alias.to.is_empty() {
            warnings.push(format!("tag expansion '{}' adds no tags", alias.from));
        }
        for tag in alias.to.iter() {
            if tag != alias.from && pipeline.aliases().contains(tag) {
                warnings.push(format!(
                    "tag expansion '{}' adds '{}', whose own expansion is not applied to it",
                    alias.from, tag
                ));
            }
        }
    }

    warnings
}

fn lint_against_catalog(pipeline: &FilterPipeline, catalog: &[CandidateEntry]) -> Vec<String> {
    let mut warnings = Vec::new();

    let mut reachable = TagSet::new();
    for entry in catalog {
        reachable.merge(&pipeline.expand(&entry.tags));
    }

    for (index, classifier) in pipeline.classifiers().iter().enumerate() {
        for (enabled, outcome) in [
            (classifier.enable_on_true, &classifier.outcome_on_true),
            (classifier.enable_on_false, &classifier.outcome_on_false),
        ] {
            if !enabled {
                continue;
            }
            for tag in outcome.required.iter() {
                if !reachable.contains(tag) {
                    warnings.push(format!(
                        "tagger {} ({}) requires '{}', which no catalog entry carries",
                        index,
                        classifier.condition_name(),
                        tag
                    ));
                }
            }
        }
    }

    let untagged = catalog.iter().filter(|entry| entry.tags.is_empty()).count();
    if untagged > 0 {
        warnings.push(format!("{} catalog entries have no tags", untagged));
    }

    warnings
}
