//! Prints the features derived for one what-if video, without a model.

use time::{OffsetDateTime, PrimitiveDateTime};
use vidtrend::features::{FEATURE_NAMES, FEATURE_VERSION, FeaturePipeline, LexiconSentiment};
use vidtrend::form::{FormOverrides, VideoForm};
use vidtrend::video::{Region, parse_naive_timestamp, strip_offset};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let (overrides, evaluated_at) = parse_args(std::env::args().skip(1).collect())?;
    let now = evaluated_at.unwrap_or_else(|| {
        strip_offset(OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc()))
    });
    let record = VideoForm::manual_defaults(now).apply(overrides).into_record();
    let sentiment = LexiconSentiment::new();
    let vector = FeaturePipeline::new(&sentiment).run_one(&record, now);

    println!("feature set v{FEATURE_VERSION}, evaluated at {now}");
    let width = FEATURE_NAMES.iter().map(|name| name.len()).max().unwrap_or(0);
    for name in FEATURE_NAMES {
        match vector.get(name) {
            Some(value) => println!("{name:<width$}  {value:.6}"),
            None => println!("{name:<width$}  -"),
        }
    }
    for marker in vector.degenerate() {
        println!("degenerate: {marker:?}");
    }
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<(FormOverrides, Option<PrimitiveDateTime>), String> {
    let mut overrides = FormOverrides::default();
    let mut evaluated_at = None;
    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        if matches!(flag, "-h" | "--help") {
            return Err(help_text());
        }
        idx += 1;
        let value = args
            .get(idx)
            .ok_or_else(|| format!("{flag} requires a value"))?;
        match flag {
            "--title" => overrides.title = Some(value.clone()),
            "--channel" => overrides.channel = Some(value.clone()),
            "--views" => overrides.views = Some(parse_count(flag, value)?),
            "--likes" => overrides.likes = Some(parse_count(flag, value)?),
            "--comments" => overrides.comments = Some(parse_count(flag, value)?),
            "--published-at" => {
                overrides.published_at = Some(parse_naive_timestamp(value).map_err(|err| err.to_string())?)
            }
            "--region" => overrides.region = Some(value.parse::<Region>().map_err(|err| err.to_string())?),
            "--evaluated-at" => {
                evaluated_at = Some(parse_naive_timestamp(value).map_err(|err| err.to_string())?)
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok((overrides, evaluated_at))
}

fn parse_count(flag: &str, value: &str) -> Result<u64, String> {
    value
        .parse::<u64>()
        .map_err(|_| format!("Invalid {flag} value: {value}"))
}

fn help_text() -> String {
    [
        "vidtrend-inspect",
        "",
        "Prints the feature values the predictor would see for a video.",
        "",
        "Usage:",
        "  vidtrend-inspect [--title <text>] [--views <n>] [options]",
        "",
        "Options:",
        "  --title, --channel, --views, --likes, --comments, --published-at, --region",
        "                          Same as vidtrend; unset fields use the manual-entry defaults.",
        "  --evaluated-at <time>   Reference instant for upload age (default: now).",
    ]
    .join("\n")
}
