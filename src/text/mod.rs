pub mod generator;
pub mod http;
pub mod samples;

use clap::ValueEnum;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

pub use generator::LocalTextGenerator;
pub use http::HttpTextProvider;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Language {
    #[default]
    Ru,
    En,
}

impl Language {
    pub fn toggled(self) -> Self {
        match self {
            Language::Ru => Language::En,
            Language::En => Language::Ru,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Ru => "Russian",
            Language::En => "English",
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn next(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }
}

/// Anything that can hand out a reference text for a session
pub trait TextProvider: Send + Sync {
    fn fetch(&self, language: Language, difficulty: Difficulty) -> Result<String>;
}

/// Where a loaded text came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSource {
    Provider,
    /// the provider failed; `reason` is shown to the user
    Fallback { reason: String },
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedText {
    pub text: String,
    pub source: TextSource,
}

/// Wraps a provider and never fails: on error a static sample for the same
/// language and difficulty is used instead.
pub struct FallbackTextProvider<P: TextProvider> {
    inner: P,
}

impl<P: TextProvider> FallbackTextProvider<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn load(&self, language: Language, difficulty: Difficulty) -> LoadedText {
        let fetched = self.inner.fetch(language, difficulty).and_then(|text| {
            if text.trim().is_empty() {
                Err(Error::EmptyText)
            } else {
                Ok(text)
            }
        });

        match fetched {
            Ok(text) => {
                debug!(%language, %difficulty, len = text.chars().count(), "text loaded");
                LoadedText {
                    text,
                    source: TextSource::Provider,
                }
            }
            Err(err) => {
                warn!(
                    %language,
                    %difficulty,
                    error = %err,
                    "text provider failed, using local sample"
                );
                LoadedText {
                    text: random_sample(language, difficulty),
                    source: TextSource::Fallback {
                        reason: err.short_message(),
                    },
                }
            }
        }
    }
}

/// A random entry of the static sample set
pub fn random_sample(language: Language, difficulty: Difficulty) -> String {
    let rng = &mut rand::thread_rng();
    samples::samples_for(language, difficulty)
        .choose(rng)
        .map(|s| s.to_string())
        .unwrap_or_default()
}

impl<T: TextProvider + ?Sized> TextProvider for Box<T> {
    fn fetch(&self, language: Language, difficulty: Difficulty) -> Result<String> {
        (**self).fetch(language, difficulty)
    }
}
