//! Saving finished sessions.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::ApiClient;
use crate::error::Result;
use crate::history::{ResultLog, TestRecord};
use crate::session::SessionResult;
use crate::text::{Difficulty, Language};

/// User id assigned to results saved without a server
pub const LOCAL_USER_ID: &str = "local";

/// What the store handed back for a saved result
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Submission {
    pub user_id: String,
    #[serde(default)]
    pub test_result_id: Option<i64>,
}

pub trait ResultReporter: Send + Sync {
    /// Save one result. `user_id` is `None` until a store has assigned one.
    fn submit(&self, result: &SessionResult, user_id: Option<&str>) -> Result<Submission>;
}

/// Body of `POST /api/test-result`
#[derive(Debug, Serialize)]
struct TestResultPayload<'a> {
    user_id: Option<&'a str>,
    chars_per_minute: u32,
    accuracy: u8,
    time_seconds: u64,
    language: Language,
    difficulty: Difficulty,
}

impl<'a> TestResultPayload<'a> {
    fn new(result: &SessionResult, user_id: Option<&'a str>) -> Self {
        Self {
            user_id,
            chars_per_minute: result.speed,
            accuracy: result.accuracy,
            time_seconds: result.elapsed_secs,
            language: result.language,
            difficulty: result.difficulty,
        }
    }
}

pub struct HttpReporter {
    api: ApiClient,
}

impl HttpReporter {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

impl ResultReporter for HttpReporter {
    fn submit(&self, result: &SessionResult, user_id: Option<&str>) -> Result<Submission> {
        let payload = TestResultPayload::new(result, user_id);
        let submission: Submission = self.api.post_json("/api/test-result", &payload)?;
        info!(
            user_id = %submission.user_id,
            test_result_id = ?submission.test_result_id,
            "result submitted"
        );
        Ok(submission)
    }
}

/// Appends results to the local result log
pub struct CsvReporter {
    log: ResultLog,
}

impl CsvReporter {
    pub fn new(log: ResultLog) -> Self {
        Self { log }
    }
}

impl ResultReporter for CsvReporter {
    fn submit(&self, result: &SessionResult, user_id: Option<&str>) -> Result<Submission> {
        let user_id = user_id.unwrap_or(LOCAL_USER_ID).to_string();
        let id = self.log.read_all()?.len() as i64 + 1;

        self.log.append(&TestRecord {
            id: Some(id),
            user_id: user_id.clone(),
            chars_per_minute: result.speed as f64,
            accuracy: result.accuracy as f64,
            time_seconds: result.elapsed_secs as f64,
            language: result.language.to_string(),
            difficulty: result.difficulty.to_string(),
            created_at: Some(result.completed_at.to_rfc3339()),
        })?;
        info!(%user_id, id, path = %self.log.path().display(), "result saved locally");

        Ok(Submission {
            user_id,
            test_result_id: Some(id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::serve_once;
    use chrono::Local;
    use tempfile::tempdir;

    fn result() -> SessionResult {
        SessionResult {
            speed: 240,
            accuracy: 96,
            elapsed_secs: 42,
            language: Language::Ru,
            difficulty: Difficulty::Medium,
            completed_at: Local::now(),
        }
    }

    #[test]
    fn test_payload_field_names() {
        let result = result();
        let json = serde_json::to_value(TestResultPayload::new(&result, None)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "user_id": null,
                "chars_per_minute": 240,
                "accuracy": 96,
                "time_seconds": 42,
                "language": "ru",
                "difficulty": "medium",
            })
        );
    }

    #[test]
    fn test_submission_deserializes() {
        let s: Submission =
            serde_json::from_str(r#"{"user_id": "0b7c", "test_result_id": 17}"#).unwrap();
        assert_eq!(s.user_id, "0b7c");
        assert_eq!(s.test_result_id, Some(17));
    }

    #[test]
    fn test_csv_reporter_assigns_local_user_and_ids() {
        let dir = tempdir().unwrap();
        let log = ResultLog::new(dir.path().join("results.csv"));
        let reporter = CsvReporter::new(log.clone());

        let first = reporter.submit(&result(), None).unwrap();
        assert_eq!(first.user_id, LOCAL_USER_ID);
        assert_eq!(first.test_result_id, Some(1));

        let second = reporter.submit(&result(), Some("local")).unwrap();
        assert_eq!(second.test_result_id, Some(2));

        let rows = log.read_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].chars_per_minute, 240.0);
        assert_eq!(rows[0].language, "ru");
        assert_eq!(rows[0].difficulty, "medium");
    }

    #[test]
    fn test_http_reporter_returns_assigned_user() {
        let (base_url, server) =
            serve_once("200 OK", r#"{"user_id": "5f3a", "test_result_id": 12}"#);
        let reporter = HttpReporter::new(ApiClient::new(base_url).unwrap());

        let submission = reporter.submit(&result(), None).unwrap();
        assert_eq!(
            submission,
            Submission {
                user_id: "5f3a".to_string(),
                test_result_id: Some(12),
            }
        );

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /api/test-result "));
        let body = &request[request.find("\r\n\r\n").unwrap() + 4..];
        let payload: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(payload["user_id"], serde_json::Value::Null);
        assert_eq!(payload["chars_per_minute"], 240);
        assert_eq!(payload["language"], "ru");
    }

    #[test]
    fn test_http_reporter_surfaces_rejection() {
        let (base_url, _server) = serve_once("422 Unprocessable Entity", r#"{"detail":"bad"}"#);
        let reporter = HttpReporter::new(ApiClient::new(base_url).unwrap());

        assert!(matches!(
            reporter.submit(&result(), Some("5f3a")),
            Err(crate::error::Error::Http { status: 422, .. })
        ));
    }

    #[test]
    fn test_http_reporter_unreachable_is_error() {
        let reporter = HttpReporter::new(ApiClient::new("http://127.0.0.1:9").unwrap());
        assert!(reporter.submit(&result(), None).is_err());
    }
}
