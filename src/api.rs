//! Thin blocking client for the typing-test backend.
//!
//! Every call happens on a worker thread, never on the event loop, so the
//! blocking flavour of reqwest is enough.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

use crate::error::{Error, Result};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "api url must start with http:// or https://, got {base_url:?}"
            )));
        }
        let client = Client::builder()
            .user_agent(concat!("keytempo/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self.client.get(&url).query(query).send()?;
        Ok(check_status(response)?.json()?)
    }

    pub fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        debug!(%url, "POST");
        let response = self.client.post(&url).json(body).send()?;
        Ok(check_status(response)?.json()?)
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    error!(status = status.as_u16(), %body, "API request failed");
    Err(Error::Http {
        status: status.as_u16(),
        body,
    })
}

/// One-shot HTTP server on a loopback port for exercising the clients
#[cfg(test)]
pub(crate) mod test_server {
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread::{self, JoinHandle};

    /// Answers the next request with `status` and a JSON `body`. Returns the
    /// base url and a handle yielding the raw request that was received.
    pub fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            stream.write_all(response.as_bytes()).unwrap();
            request
        });
        (base_url, handle)
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut raw = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&raw);
            if let Some(end) = text.find("\r\n\r\n") {
                let body_len = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if raw.len() >= end + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&raw).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::test_server::serve_once;
    use super::*;

    #[test]
    fn test_url_joining_normalizes_slashes() {
        let api = ApiClient::new("http://localhost:8000/").unwrap();
        assert_eq!(api.base_url(), "http://localhost:8000");
        assert_eq!(api.url("/api/text"), "http://localhost:8000/api/text");
        assert_eq!(api.url("api/text"), "http://localhost:8000/api/text");
    }

    #[test]
    fn test_base_url_without_scheme_is_rejected() {
        assert!(matches!(ApiClient::new("localhost:8000"), Err(Error::Config(_))));
        assert!(matches!(ApiClient::new(""), Err(Error::Config(_))));
        assert!(ApiClient::new("https://typing.example.com").is_ok());
    }

    #[test]
    fn test_server_error_keeps_status_and_body() {
        let (base_url, server) = serve_once("500 Internal Server Error", r#"{"detail":"boom"}"#);
        let api = ApiClient::new(base_url).unwrap();

        let result: Result<serde_json::Value> = api.get_json("/api/text", &[("lang", "en")]);
        match result {
            Err(Error::Http { status, body }) => {
                assert_eq!(status, 500);
                assert!(body.contains("boom"));
            }
            other => panic!("expected an http error, got {other:?}"),
        }
        assert!(server.join().unwrap().starts_with("GET /api/text?lang=en "));
    }

    #[test]
    fn test_success_body_is_decoded() {
        let (base_url, server) = serve_once("200 OK", r#"{"ok":true}"#);
        let api = ApiClient::new(base_url).unwrap();

        let value: serde_json::Value = api
            .post_json("/echo", &serde_json::json!({"a": 1}))
            .unwrap();
        assert_eq!(value, serde_json::json!({"ok": true}));
        assert!(server.join().unwrap().ends_with(r#"{"a":1}"#));
    }

    #[test]
    fn test_unreachable_server_is_a_network_error() {
        // port 9 (discard) on localhost is not expected to serve HTTP
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        let result: Result<serde_json::Value> = api.get_json("/api/text", &[]);
        assert!(matches!(result, Err(Error::Network(_))));
    }
}
