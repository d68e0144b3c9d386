use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;

use super::{Difficulty, Language, TextProvider};
use crate::error::{Error, Result};

static WORDS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/words");

/// How a difficulty level shapes a generated text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyRules {
    pub word_count: usize,
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
    /// chance that a word separator is punctuation instead of a plain space
    pub punctuation_probability: f64,
    pub punctuation: &'static [&'static str],
}

impl DifficultyRules {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                word_count: 30,
                min_len: None,
                max_len: Some(6),
                punctuation_probability: 0.0,
                punctuation: &[" "],
            },
            Difficulty::Medium => Self {
                word_count: 35,
                min_len: Some(3),
                max_len: Some(10),
                punctuation_probability: 0.15,
                punctuation: &[" ", ". ", ", ", "! "],
            },
            Difficulty::Hard => Self {
                word_count: 40,
                min_len: Some(5),
                max_len: None,
                punctuation_probability: 0.3,
                punctuation: &[" ", "! ", " — ", ". ", ", ", "; ", ": ", "? "],
            },
        }
    }

    pub fn accepts(&self, word: &str) -> bool {
        let len = word.chars().count();
        self.min_len.map_or(true, |min| len >= min) && self.max_len.map_or(true, |max| len <= max)
    }
}

/// Offline text source built from the embedded word lists
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTextGenerator;

impl LocalTextGenerator {
    pub fn generate_with<R: Rng>(
        &self,
        language: Language,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Result<String> {
        let rules = DifficultyRules::for_difficulty(difficulty);
        let candidates: Vec<&str> = word_list(language)?
            .into_iter()
            .filter(|w| rules.accepts(w))
            .collect();

        if candidates.is_empty() {
            return Err(Error::EmptyText);
        }

        let words: Vec<&str> = candidates
            .choose_multiple(rng, rules.word_count.min(candidates.len()))
            .copied()
            .collect();

        let mut text = String::new();
        for (i, word) in words.iter().enumerate() {
            text.push_str(word);
            if i + 1 < words.len() {
                let use_punctuation = rules.punctuation_probability > 0.0
                    && rng.gen_bool(rules.punctuation_probability);
                let separator = if use_punctuation {
                    rules.punctuation.choose(rng).copied().unwrap_or(" ")
                } else {
                    " "
                };
                text.push_str(separator);
            }
        }
        Ok(text)
    }
}

impl TextProvider for LocalTextGenerator {
    fn fetch(&self, language: Language, difficulty: Difficulty) -> Result<String> {
        self.generate_with(language, difficulty, &mut rand::thread_rng())
    }
}

/// Words of the embedded dictionary; blank lines and `-`-prefixed entries are skipped
fn word_list(language: Language) -> Result<Vec<&'static str>> {
    let file_name = format!("{language}.txt");
    let contents = WORDS_DIR
        .get_file(&file_name)
        .and_then(|f| f.contents_utf8())
        .ok_or(Error::MissingWordList(file_name))?;

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|w| !w.is_empty() && !w.starts_with('-'))
        .collect())
}
