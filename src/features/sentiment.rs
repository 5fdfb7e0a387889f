//! Title polarity scoring.
//!
//! [`LexiconSentiment`] is a pattern-style lexicon scorer: each known word
//! carries a polarity in [-1, 1], a preceding intensifier scales it, a preceding
//! negation flips and halves it, and the title score is the mean over scored
//! words. Titles without any known word score 0. A word missing from the
//! lexicon is retried without a plural or possessive ending.

use std::collections::HashMap;

/// Maps free text to a polarity in [-1, 1].
pub trait SentimentModel: Send + Sync {
    fn polarity(&self, text: &str) -> f64;
}

const NEGATION_FACTOR: f64 = -0.5;

/// Embedded polarity lexicon: `word<TAB>polarity` lines, `#` comments.
const LEXICON: &str = include_str!("lexicon.tsv");

const INTENSIFIERS: &[(&str, f64)] = &[
    ("extremely", 1.5),
    ("incredibly", 1.5),
    ("most", 1.3),
    ("really", 1.2),
    ("so", 1.2),
    ("totally", 1.3),
    ("very", 1.3),
];

const NEGATIONS: &[&str] = &["no", "not", "never", "none", "nobody", "nothing", "neither"];

/// Built-in lexicon scorer.
#[derive(Debug, Clone)]
pub struct LexiconSentiment {
    polarity: HashMap<&'static str, f64>,
    intensifiers: HashMap<&'static str, f64>,
}

impl LexiconSentiment {
    pub fn new() -> Self {
        Self {
            polarity: parse_lexicon(LEXICON),
            intensifiers: INTENSIFIERS.iter().copied().collect(),
        }
    }

    /// Number of words carrying a polarity.
    pub fn len(&self) -> usize {
        self.polarity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polarity.is_empty()
    }

    fn word_polarity(&self, token: &str) -> Option<f64> {
        if let Some(&value) = self.polarity.get(token) {
            return Some(value);
        }
        let stem = token
            .strip_suffix("'s")
            .or_else(|| token.strip_suffix('s').filter(|stem| stem.len() > 2))?;
        self.polarity.get(stem).copied()
    }
}

fn parse_lexicon(text: &'static str) -> HashMap<&'static str, f64> {
    let mut table = HashMap::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parsed = line
            .split_once('\t')
            .and_then(|(word, value)| Some((word.trim(), value.trim().parse::<f64>().ok()?)));
        match parsed {
            Some((word, value)) if (-1.0..=1.0).contains(&value) => {
                table.insert(word, value);
            }
            _ => tracing::warn!("Skipping sentiment lexicon line {}: {line:?}", idx + 1),
        }
    }
    table
}

impl Default for LexiconSentiment {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentModel for LexiconSentiment {
    fn polarity(&self, text: &str) -> f64 {
        let lowered = text.to_lowercase();
        let mut scores = Vec::new();
        let mut intensity = 1.0f64;
        let mut negated = false;
        for token in tokens(&lowered) {
            if let Some(value) = self.word_polarity(token) {
                let mut score = value * intensity;
                if negated {
                    score *= NEGATION_FACTOR;
                }
                scores.push(score.clamp(-1.0, 1.0));
                intensity = 1.0;
                negated = false;
            } else if let Some(&factor) = self.intensifiers.get(token) {
                intensity *= factor;
            } else if is_negation(token) {
                negated = true;
            } else {
                intensity = 1.0;
            }
        }
        if scores.is_empty() {
            return 0.0;
        }
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        mean.clamp(-1.0, 1.0)
    }
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|token| !token.is_empty())
}

fn is_negation(token: &str) -> bool {
    NEGATIONS.contains(&token) || token.ends_with("n't")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_lexicon_parses_cleanly() {
        let entries: Vec<&str> = LEXICON
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect();
        let model = LexiconSentiment::new();
        assert_eq!(model.len(), entries.len(), "duplicate or malformed entries");
        assert!(model.len() > 400);
        for word in model.polarity.keys() {
            assert_eq!(*word, word.to_lowercase(), "{word}");
            assert!(tokens(word).eq([*word]), "{word} would never match a token");
        }
    }

    #[test]
    fn malformed_lexicon_lines_are_skipped() {
        let table = parse_lexicon("# header\ngood\t0.7\nbroken line\nodd\t2.5\nbad\t-0.7\n");
        assert_eq!(table.len(), 2);
        assert_eq!(table["bad"], -0.7);
    }

    #[test]
    fn everyday_titles_carry_sentiment() {
        let model = LexiconSentiment::new();
        assert!(model.polarity("My most embarrassing moment ever") < 0.0);
        assert!(model.polarity("Cozy autumn morning routine") > 0.0);
        assert!(model.polarity("Celebrating a huge victory") > 0.0);
    }

    #[test]
    fn plural_and_possessive_forms_match() {
        let model = LexiconSentiment::new();
        assert_eq!(model.polarity("dreams"), model.polarity("dream"));
        assert_eq!(model.polarity("champion's"), model.polarity("champion"));
        assert_eq!(model.polarity("bus"), 0.0);
    }

    #[test]
    fn neutral_without_known_words() {
        let model = LexiconSentiment::new();
        assert_eq!(model.polarity("Official Trailer!!"), 0.0);
        assert_eq!(model.polarity(""), 0.0);
    }

    #[test]
    fn averages_known_words() {
        let model = LexiconSentiment::new();
        assert_eq!(model.polarity("Great video"), 0.8);
        let mixed = model.polarity("Best and worst moments");
        assert!(mixed.abs() < 1e-12);
    }

    #[test]
    fn negation_flips_and_dampens() {
        let model = LexiconSentiment::new();
        assert_eq!(model.polarity("not good"), -0.35);
        assert_eq!(model.polarity("isn't bad"), 0.35);
    }

    #[test]
    fn intensifiers_scale_and_clamp() {
        let model = LexiconSentiment::new();
        let plain = model.polarity("nice");
        let boosted = model.polarity("very nice");
        assert!(boosted > plain);
        assert_eq!(model.polarity("extremely awesome"), 1.0);
        for title in ["VERY VERY TERRIBLE", "so so so great!!!", "never ever happy"] {
            let score = model.polarity(title);
            assert!((-1.0..=1.0).contains(&score), "{title}: {score}");
        }
    }
}
