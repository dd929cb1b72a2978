//! Coarse condition buckets and background-image candidates.
//!
//! Classification looks at the provider's free-text description and its
//! short category label, then lets extreme temperatures override the
//! result. The same inputs produce an ordered list of image filenames to
//! try, most specific first.

use std::{collections::HashSet, fmt};

use serde::Serialize;

use crate::model::WeatherRecord;

/// Extensions in the order they are tried for each stem.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpeg", "jpg", "png", "webp"];

/// Stems always appended after the record-specific ones.
pub const KNOWN_STEMS: [&str; 26] = [
    "blizzard",
    "clear",
    "cloudy",
    "drizzle",
    "fog",
    "ice",
    "mist",
    "overcast",
    "rain",
    "shower",
    "showers",
    "sleet",
    "snow",
    "sunny",
    "thunder",
    "storm",
    "thunderstorm",
    "light-rain",
    "heavy-rain",
    "light-snow",
    "heavy-snow",
    "freezing",
    "very-hot",
    "hot",
    "cold",
    "default",
];

const HOT_OVERRIDE_C: f64 = 32.0;
const COLD_OVERRIDE_C: f64 = 3.0;
const VERY_HOT_STEM_C: f64 = 35.0;
const HOT_STEM_C: f64 = 30.0;
const FREEZING_STEM_C: f64 = 0.0;
const COLD_STEM_C: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionBucket {
    Clear,
    Cloudy,
    Rain,
    Snow,
    Fog,
    Hot,
    Cold,
    Default,
}

impl ConditionBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionBucket::Clear => "clear",
            ConditionBucket::Cloudy => "cloudy",
            ConditionBucket::Rain => "rain",
            ConditionBucket::Snow => "snow",
            ConditionBucket::Fog => "fog",
            ConditionBucket::Hot => "hot",
            ConditionBucket::Cold => "cold",
            ConditionBucket::Default => "default",
        }
    }

    /// Background color gradient for this bucket.
    pub fn gradient(&self) -> Gradient {
        match self {
            ConditionBucket::Clear => Gradient::new("#FFD27F", "#FF7A18"),
            ConditionBucket::Cloudy => Gradient::new("#dfe9f3", "#c5d5f1"),
            ConditionBucket::Rain => Gradient::new("#89f7fe", "#66a6ff"),
            ConditionBucket::Fog => Gradient::new("#cfd9df", "#e2ebf0"),
            ConditionBucket::Snow => Gradient::new("#e0f7ff", "#cdefff"),
            ConditionBucket::Hot => Gradient::new("#ff9a9e", "#fecfef"),
            ConditionBucket::Cold => Gradient::new("#a1c4fd", "#c2e9fb"),
            ConditionBucket::Default => Gradient::DEFAULT,
        }
    }
}

impl fmt::Display for ConditionBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Two-stop linear gradient at 135 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Gradient {
    pub from: &'static str,
    pub to: &'static str,
}

impl Gradient {
    pub const DEFAULT: Gradient = Gradient::new("#667eea", "#764ba2");

    pub const fn new(from: &'static str, to: &'static str) -> Self {
        Self { from, to }
    }

    pub fn to_css(&self) -> String {
        format!("linear-gradient(135deg, {} 0%, {} 100%)", self.from, self.to)
    }
}

/// Full result of classifying one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub bucket: ConditionBucket,
    pub stems: Vec<String>,
    pub candidates: Vec<String>,
}

impl Classification {
    pub fn gradient(&self) -> Gradient {
        self.bucket.gradient()
    }
}

/// Lowercase, collapse every run of non-alphanumerics into one hyphen and
/// trim hyphens from both ends.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Whitespace tokens of description and category label, lowercased and
/// deduplicated in first-seen order.
pub fn tokens(description: &str, condition_main: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    [description, condition_main]
        .iter()
        .flat_map(|part| part.split_whitespace())
        .map(str::to_lowercase)
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

fn any_token_contains(tokens: &[String], needles: &[&str]) -> bool {
    tokens
        .iter()
        .any(|t| needles.iter().any(|needle| t.contains(needle)))
}

fn bucket_from_tokens(tokens: &[String]) -> ConditionBucket {
    const RULES: [(ConditionBucket, &[&str]); 5] = [
        (ConditionBucket::Snow, &["snow", "sleet", "blizzard", "ice"]),
        (ConditionBucket::Rain, &["rain", "drizzle", "shower", "thunder", "storm"]),
        (ConditionBucket::Fog, &["mist", "fog"]),
        (ConditionBucket::Cloudy, &["cloud", "overcast"]),
        (ConditionBucket::Clear, &["clear", "sunny"]),
    ];

    RULES
        .iter()
        .find(|(_, needles)| any_token_contains(tokens, needles))
        .map(|(bucket, _)| *bucket)
        .unwrap_or(ConditionBucket::Default)
}

/// Bucket for a description/label pair with an optional temperature
/// override.
pub fn classify_bucket(
    description: &str,
    condition_main: &str,
    temperature: Option<f64>,
) -> ConditionBucket {
    let bucket = bucket_from_tokens(&tokens(description, condition_main));

    match temperature.filter(|t| t.is_finite()) {
        Some(t) if t >= HOT_OVERRIDE_C => ConditionBucket::Hot,
        Some(t) if t <= COLD_OVERRIDE_C => ConditionBucket::Cold,
        _ => bucket,
    }
}

fn push_unique(list: &mut Vec<String>, seen: &mut HashSet<String>, value: String) {
    if !value.is_empty() && seen.insert(value.clone()) {
        list.push(value);
    }
}

/// Classify a record and build its ordered background candidates.
pub fn classify(record: &WeatherRecord) -> Classification {
    let description = record.description.to_lowercase();
    let tokens = tokens(&record.description, &record.condition_main);
    let temperature = record.temperature.filter(|t| t.is_finite());
    let bucket = classify_bucket(&record.description, &record.condition_main, temperature);

    let mut stems = Vec::new();
    let mut seen = HashSet::new();

    push_unique(&mut stems, &mut seen, slugify(&description));
    for token in &tokens {
        push_unique(&mut stems, &mut seen, slugify(token));
    }
    push_unique(&mut stems, &mut seen, bucket.as_str().to_string());

    // Independent of the override above, so "hot" may already be present.
    if let Some(t) = temperature {
        let extremes = [
            (t >= VERY_HOT_STEM_C, "very-hot"),
            (t >= HOT_STEM_C, "hot"),
            (t <= FREEZING_STEM_C, "freezing"),
            (t <= COLD_STEM_C, "cold"),
        ];
        for (applies, stem) in extremes {
            if applies {
                push_unique(&mut stems, &mut seen, stem.to_string());
            }
        }
    }

    for stem in KNOWN_STEMS {
        push_unique(&mut stems, &mut seen, stem.to_string());
    }

    let candidates = candidate_files(&stems);

    Classification {
        bucket,
        stems,
        candidates,
    }
}

/// Every stem crossed with every extension, in stem-major order.
pub fn candidate_files(stems: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    stems
        .iter()
        .flat_map(|stem| IMAGE_EXTENSIONS.iter().map(move |ext| format!("{stem}.{ext}")))
        .filter(|file| seen.insert(file.clone()))
        .collect()
}

/// Emoji glyph for a current or forecast slot.
pub fn weather_icon(temperature: Option<f64>, humidity: Option<f64>, description: &str) -> &'static str {
    let desc = description.to_lowercase();

    if desc.contains("rain") || desc.contains("drizzle") {
        return "🌧️";
    }
    if desc.contains("snow") {
        return "❄️";
    }
    if desc.contains("cloud") {
        return "☁️";
    }

    match (temperature, humidity) {
        (Some(t), _) if t > 25.0 => "☀️",
        (Some(t), _) if t > 15.0 => "🌤️",
        (_, Some(h)) if h > 80.0 => "🌦️",
        _ => "🌈",
    }
}
