// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Gemini wire protocol: request line parsing, response framing and the
//! accept loop.
//!
//! A request is a single absolute URL terminated by CRLF; a response is
//! `<status> <meta>\r\n` followed by the body for successful responses.
//! TLS is terminated by a fronting proxy, so the listener speaks plain
//! TCP.

use crate::app::{self, AppState};
use crate::models::url::GemUrl;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

/// Maximum request-line length the protocol allows (URL portion).
pub const MAX_URL_LEN: usize = 1024;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Gemini status codes used by this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Input = 10,
    Success = 20,
    Redirect = 30,
    TemporaryFailure = 40,
    SlowDown = 44,
    NotFound = 51,
    BadRequest = 59,
}

/// Parsed request: the path routes, the query string carries input.
#[derive(Debug, Clone)]
pub struct GeminiRequest {
    pub path: String,
    pub raw_query: Option<String>,
}

impl GeminiRequest {
    /// Parse the request line. The URL must be absolute; anything else
    /// is a protocol violation.
    pub fn from_line(line: &str) -> Option<Self> {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.len() > MAX_URL_LEN {
            return None;
        }
        let url = GemUrl::parse(trimmed)?;
        Some(Self {
            path: url.path().to_string(),
            raw_query: url.query().map(str::to_string),
        })
    }

    /// Query-string input, percent-decoded with `+` as space.
    pub fn decoded_query(&self) -> String {
        crate::services::text::url_decode(self.raw_query.as_deref().unwrap_or(""))
    }
}

/// A response ready to frame onto the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiResponse {
    pub status: Status,
    pub meta: String,
    pub body: Option<String>,
}

impl GeminiResponse {
    pub fn input(prompt: &str) -> Self {
        Self {
            status: Status::Input,
            meta: prompt.to_string(),
            body: None,
        }
    }

    pub fn success(body: String) -> Self {
        Self {
            status: Status::Success,
            meta: "text/gemini".to_string(),
            body: Some(body),
        }
    }

    pub fn redirect(target: &str) -> Self {
        Self {
            status: Status::Redirect,
            meta: target.to_string(),
            body: None,
        }
    }

    pub fn failure(message: &str) -> Self {
        Self {
            status: Status::TemporaryFailure,
            meta: message.to_string(),
            body: None,
        }
    }

    pub fn slow_down() -> Self {
        Self {
            status: Status::SlowDown,
            meta: "SlowDown".to_string(),
            body: None,
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: Status::NotFound,
            meta: "Not found".to_string(),
            body: None,
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self {
            status: Status::BadRequest,
            meta: message.to_string(),
            body: None,
        }
    }

    /// Frame the response: header line, then body for 2x statuses.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!("{} {}\r\n", self.status as u8, self.meta).into_bytes();
        if let Some(body) = &self.body {
            out.extend_from_slice(body.as_bytes());
        }
        out
    }
}

/// Accept loop: one task per connection.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(error) = handle_connection(stream, state).await {
                debug!(%peer, %error, "connection closed with error");
            }
        });
    }
}

async fn handle_connection(mut stream: TcpStream, state: AppState) -> std::io::Result<()> {
    let (reader, mut writer) = stream.split();
    // One line, bounded: URL + CRLF
    let mut reader = BufReader::new(reader).take((MAX_URL_LEN + 2) as u64);
    let mut line = String::new();

    let read = tokio::time::timeout(REQUEST_TIMEOUT, reader.read_line(&mut line)).await;
    let response = match read {
        Ok(Ok(0)) => return Ok(()),
        Ok(Ok(_)) => match GeminiRequest::from_line(&line) {
            Some(request) => app::dispatch(&state, &request).await,
            None => GeminiResponse::bad_request("Malformed request"),
        },
        Ok(Err(error)) => return Err(error),
        Err(_) => {
            info!("closing connection after request timeout");
            return Ok(());
        }
    };

    writer.write_all(&response.to_bytes()).await?;
    writer.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_parsing() {
        let request = GeminiRequest::from_line("gemini://search.example/search?cats+dogs\r\n")
            .expect("valid request");
        assert_eq!(request.path, "/search");
        assert_eq!(request.raw_query.as_deref(), Some("cats+dogs"));
        assert_eq!(request.decoded_query(), "cats dogs");
    }

    #[test]
    fn test_request_without_query() {
        let request = GeminiRequest::from_line("gemini://search.example/backlinks\r\n").unwrap();
        assert_eq!(request.path, "/backlinks");
        assert!(request.raw_query.is_none());
        assert_eq!(request.decoded_query(), "");
    }

    #[test]
    fn test_relative_request_rejected() {
        assert!(GeminiRequest::from_line("/search?cats\r\n").is_none());
    }

    #[test]
    fn test_oversized_request_rejected() {
        let line = format!("gemini://host/{}\r\n", "a".repeat(MAX_URL_LEN));
        assert!(GeminiRequest::from_line(&line).is_none());
    }

    #[test]
    fn test_response_framing() {
        let response = GeminiResponse::success("# Hello\n".to_string());
        assert_eq!(response.to_bytes(), b"20 text/gemini\r\n# Hello\n".to_vec());

        let response = GeminiResponse::input("Search for something");
        assert_eq!(response.to_bytes(), b"10 Search for something\r\n".to_vec());

        let response = GeminiResponse::slow_down();
        assert_eq!(response.to_bytes(), b"44 SlowDown\r\n".to_vec());

        let response = GeminiResponse::redirect("/search?cats");
        assert_eq!(response.to_bytes(), b"30 /search?cats\r\n".to_vec());
    }
}
