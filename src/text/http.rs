use serde::Deserialize;

use super::{Difficulty, Language, TextProvider};
use crate::api::ApiClient;
use crate::error::{Error, Result};

/// Body of `GET /api/text`; the echoed language and difficulty are ignored
#[derive(Debug, Deserialize)]
struct TextResponse {
    text: String,
}

/// Fetches reference texts from the backend
pub struct HttpTextProvider {
    api: ApiClient,
}

impl HttpTextProvider {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

impl TextProvider for HttpTextProvider {
    fn fetch(&self, language: Language, difficulty: Difficulty) -> Result<String> {
        let lang = language.to_string();
        let level = difficulty.to_string();
        let response: TextResponse = self
            .api
            .get_json("/api/text", &[("lang", lang.as_str()), ("difficulty", level.as_str())])?;

        if response.text.trim().is_empty() {
            return Err(Error::EmptyText);
        }
        Ok(response.text)
    }
}
