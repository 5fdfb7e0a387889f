//! Command-line trending predictor.
//!
//! Scores one video, either looked up by URL/id or entered through flags, and
//! prints the probability, its tier and the key factors behind it.

use std::path::PathBuf;

use time::OffsetDateTime;
use vidtrend::artifact::ArtifactError;
use vidtrend::config;
use vidtrend::form::{FormOverrides, VideoForm};
use vidtrend::logging;
use vidtrend::lookup::{MetadataLookup, YouTubeClient};
use vidtrend::predictor::{IMPROVEMENT_TIPS, Predictor};
use vidtrend::video::{Region, parse_naive_timestamp, strip_offset};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    if let Err(err) = logging::init("vidtrend") {
        eprintln!("Logging disabled: {err}");
    }
    let mut settings = config::load_or_default().map_err(|err| err.to_string())?;
    if let Some(dir) = options.model_dir.clone() {
        settings.model.dir = Some(dir);
    }
    let base = settings.model.artifact_paths().map_err(|err| err.to_string())?;
    let predictor = match Predictor::load(&base) {
        Ok(predictor) => predictor,
        Err(err @ ArtifactError::Missing { .. }) => return Err(model_unavailable(&err)),
        Err(err) => return Err(format!("Model not loaded: {err}")),
    };

    let now = strip_offset(OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc()));
    let region = options.overrides.region.unwrap_or_default();
    let form = match options.video.as_deref() {
        Some(input) => {
            let client = YouTubeClient::new(&settings.lookup);
            let (form, outcome) = VideoForm::from_lookup(client.lookup(input), region, now);
            if let Some(notice) = outcome.notice() {
                eprintln!("{notice}");
            }
            form
        }
        None => VideoForm::manual_defaults(now),
    };
    let record = form.apply(options.overrides).into_record();
    let prediction = predictor.predict(&record, now);

    println!("Trending Probability: {:.1}%", prediction.probability * 100.0);
    println!("{}", prediction.tier);
    if !prediction.degenerate.is_empty() {
        println!("Note: input is degenerate ({:?}); the score is unreliable.", prediction.degenerate);
    }
    println!();
    println!("Key Factors:");
    println!("{}", prediction.key_factors);
    println!();
    println!("How to Improve:");
    for (idx, tip) in IMPROVEMENT_TIPS.iter().enumerate() {
        println!("{}. {tip}", idx + 1);
    }
    Ok(())
}

fn model_unavailable(err: &ArtifactError) -> String {
    [
        format!("Model not loaded: {err}"),
        "Train a model first with `vidtrend-train --corpus <file.csv>`, or point".to_string(),
        "`[model] dir` in config.toml (or --model-dir) at a directory holding both".to_string(),
        "youtube_trending_model.json and youtube_features.json, or a dated pair".to_string(),
        "such as youtube_trending_model_20250516.json / youtube_features_20250516.json.".to_string(),
    ]
    .join("\n")
}

#[derive(Debug, Default)]
struct CliOptions {
    video: Option<String>,
    model_dir: Option<PathBuf>,
    overrides: FormOverrides,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        if matches!(flag, "-h" | "--help") {
            return Err(help_text());
        }
        idx += 1;
        let value = args
            .get(idx)
            .ok_or_else(|| format!("{flag} requires a value\n\n{}", help_text()))?;
        let overrides = &mut options.overrides;
        match flag {
            "--video" => options.video = Some(value.clone()),
            "--model-dir" => options.model_dir = Some(PathBuf::from(value)),
            "--title" => overrides.title = Some(value.clone()),
            "--channel" => overrides.channel = Some(value.clone()),
            "--views" => overrides.views = Some(parse_count(flag, value)?),
            "--likes" => overrides.likes = Some(parse_count(flag, value)?),
            "--comments" => overrides.comments = Some(parse_count(flag, value)?),
            "--published-at" => {
                overrides.published_at =
                    Some(parse_naive_timestamp(value).map_err(|err| err.to_string())?)
            }
            "--region" => overrides.region = Some(value.parse::<Region>().map_err(|err| err.to_string())?),
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(options)
}

fn parse_count(flag: &str, value: &str) -> Result<u64, String> {
    value
        .parse::<u64>()
        .map_err(|_| format!("Invalid {flag} value: {value}"))
}

fn help_text() -> String {
    [
        "vidtrend",
        "",
        "Estimates how likely a video is to trend.",
        "",
        "Usage:",
        "  vidtrend [--video <url-or-id>] [options]",
        "",
        "Options:",
        "  --video <url|id>        Fetch details for a video (needs an API key).",
        "  --title <text>          Video title.",
        "  --channel <name>        Channel name.",
        "  --views <n>             View count (default: 100000).",
        "  --likes <n>             Like count (default: 5000).",
        "  --comments <n>          Comment count (default: 1000).",
        "  --published-at <time>   Publish time, e.g. 2025-05-12T14:00:00 (default: now).",
        "  --region <code>         US, IN, GB, JP or CA (default: US).",
        "  --model-dir <dir>       Directory holding the trained model files.",
        "",
        "Flags override values fetched with --video.",
    ]
    .join("\n")
}
