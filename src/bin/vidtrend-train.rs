//! Trains the trending classifier from a CSV corpus and saves the artifact.

use std::path::PathBuf;

use time::OffsetDateTime;
use vidtrend::artifact::ArtifactPaths;
use vidtrend::config;
use vidtrend::corpus;
use vidtrend::features::LexiconSentiment;
use vidtrend::logging;
use vidtrend::ml::grid_search::ParamGrid;
use vidtrend::training::Trainer;
use vidtrend::video::{parse_naive_timestamp, strip_offset};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    if let Err(err) = logging::init("vidtrend-train") {
        eprintln!("Logging disabled: {err}");
    }
    let mut settings = config::load_or_default().map_err(|err| err.to_string())?;
    if let Some(dir) = options.out_dir.clone() {
        settings.model.dir = Some(dir);
    }
    if let Some(threads) = options.threads {
        settings.training.threads = threads;
    }
    if let Some(folds) = options.folds {
        settings.training.cv_folds = folds;
    }
    if options.quick {
        settings.training.grid = quick_grid();
    }

    let records = corpus::load_csv(&options.corpus).map_err(|err| err.to_string())?;
    let evaluated_at = match options.evaluated_at {
        Some(instant) => instant,
        None => strip_offset(OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())),
    };
    let base = settings.model.artifact_paths().map_err(|err| err.to_string())?;
    let paths: ArtifactPaths = match options.tag.as_deref() {
        Some(tag) => base.dated(tag).map_err(|err| err.to_string())?,
        None => base,
    };

    let sentiment = LexiconSentiment::new();
    let outcome = Trainer::new(&settings.training, &sentiment)
        .fit_and_save(&records, evaluated_at, &paths)
        .map_err(|err| format!("Training failed: {err}"))?;

    print!("{}", outcome.report);
    println!("Model saved to {}", paths.model.display());
    println!("Features saved to {}", paths.features.display());
    Ok(())
}

/// Small grid for smoke runs.
fn quick_grid() -> ParamGrid {
    ParamGrid {
        learning_rate: vec![0.1],
        max_depth: vec![3],
        n_estimators: vec![50],
        subsample: vec![1.0],
    }
}

#[derive(Debug)]
struct CliOptions {
    corpus: PathBuf,
    out_dir: Option<PathBuf>,
    tag: Option<String>,
    threads: Option<usize>,
    folds: Option<usize>,
    evaluated_at: Option<time::PrimitiveDateTime>,
    quick: bool,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut corpus: Option<PathBuf> = None;
    let mut out_dir = None;
    let mut tag = None;
    let mut threads = None;
    let mut folds = None;
    let mut evaluated_at = None;
    let mut quick = false;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--quick" => quick = true,
            "--corpus" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--corpus requires a value".to_string())?;
                corpus = Some(PathBuf::from(value));
            }
            "--out-dir" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--out-dir requires a value".to_string())?;
                out_dir = Some(PathBuf::from(value));
            }
            "--tag" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--tag requires a value".to_string())?;
                tag = Some(value.clone());
            }
            "--threads" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--threads requires a value".to_string())?;
                threads = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid --threads value: {value}"))?,
                );
            }
            "--folds" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--folds requires a value".to_string())?;
                folds = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid --folds value: {value}"))?,
                );
            }
            "--evaluated-at" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--evaluated-at requires a value".to_string())?;
                evaluated_at = Some(parse_naive_timestamp(value).map_err(|err| err.to_string())?);
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    let corpus = corpus.ok_or_else(help_text)?;
    Ok(CliOptions {
        corpus,
        out_dir,
        tag,
        threads,
        folds,
        evaluated_at,
        quick,
    })
}

fn help_text() -> String {
    [
        "vidtrend-train",
        "",
        "Trains the trending classifier from a CSV corpus and saves the model pair.",
        "",
        "Usage:",
        "  vidtrend-train --corpus <file.csv> [options]",
        "",
        "Options:",
        "  --corpus <file>         CSV with Title, Channel, Views, Likes, Comments, Published At, Region (required).",
        "  --out-dir <dir>         Artifact directory (default: [model] dir from config.toml).",
        "  --tag <YYYYMMDD>        Save a dated pair instead of the default names.",
        "  --threads <n>           Search worker threads, 0 for all cores (default: config).",
        "  --folds <n>             Cross-validation folds (default: 5).",
        "  --evaluated-at <time>   Reference instant for upload age (default: now).",
        "  --quick                 Search a single candidate instead of the full grid.",
    ]
    .join("\n")
}
