// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use jobtrack_app::{
    FilterState, PaginatedApplications, StatusHistoryEntry, StatusUpdate, StoreError,
};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

// Bearer token for the remote service. Created at login, dropped at logout;
// the client refuses to exist without one, so "no session" never shows up
// as a runtime store error.
#[derive(Debug, Clone)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: &str) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            bail!("session token must not be empty -- log in first");
        }
        Ok(Self {
            token: token.to_owned(),
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    session: Session,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, session: Session, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("api.base_url must not be empty");
        }
        Url::parse(&base_url)
            .with_context(|| format!("api.base_url {base_url:?} is not a valid URL"))?;

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            session,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn fetch_applications(
        &self,
        filter: &FilterState,
    ) -> Result<PaginatedApplications, StoreError> {
        let response = self
            .http
            .get(format!("{}/application", self.base_url))
            .bearer_auth(self.session.token())
            .query(&build_query(filter))
            .send()
            .map_err(transport_error)?;

        decode_envelope(response)
    }

    pub fn update_status(&self, update: &StatusUpdate) -> Result<StatusHistoryEntry, StoreError> {
        update
            .validate()
            .map_err(|error| StoreError::ValidationFailed(error.to_string()))?;

        let response = self
            .http
            .patch(format!(
                "{}/application/{}/status",
                self.base_url,
                update.application_id.get()
            ))
            .bearer_auth(self.session.token())
            .json(update)
            .send()
            .map_err(transport_error)?;

        decode_envelope(response)
    }
}

// Every payload rides in the service's `{ message, data }` envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    #[allow(dead_code)]
    message: Option<String>,
    data: T,
}

fn build_query(filter: &FilterState) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("page", filter.page.to_string()),
        ("size", filter.page_size.to_string()),
    ];
    if let Some(search) = filter.search_query() {
        query.push(("search", search.to_owned()));
    }
    // An "all" status filter is omitted entirely.
    if let Some(status) = filter.status_filter.as_query_value() {
        query.push(("status", status.to_owned()));
    }
    query
}

fn decode_envelope<T: serde::de::DeserializeOwned>(
    response: reqwest::blocking::Response,
) -> Result<T, StoreError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(status_error(status, &body));
    }

    let envelope: Envelope<T> = response
        .json()
        .map_err(|error| StoreError::NetworkUnavailable(format!("malformed response: {error}")))?;
    Ok(envelope.data)
}

// Timeouts and connection failures land in the same bucket: transient,
// retryable, no partial state.
fn transport_error(error: reqwest::Error) -> StoreError {
    if error.is_timeout() {
        StoreError::NetworkUnavailable("request timed out".to_owned())
    } else {
        StoreError::NetworkUnavailable(error.to_string())
    }
}

fn status_error(status: StatusCode, body: &str) -> StoreError {
    match status.as_u16() {
        401 | 403 => StoreError::AuthenticationRequired,
        400 | 422 => StoreError::ValidationFailed(
            server_message(body).unwrap_or_else(|| "check your input".to_owned()),
        ),
        404 => StoreError::ValidationFailed(
            server_message(body).unwrap_or_else(|| "resource not found".to_owned()),
        ),
        code => StoreError::ServerFault(code),
    }
}

fn server_message(body: &str) -> Option<String> {
    #[derive(Debug, Deserialize)]
    struct MessageEnvelope {
        message: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    struct ErrorEnvelope {
        error: Option<String>,
    }

    if let Ok(parsed) = serde_json::from_str::<MessageEnvelope>(body)
        && let Some(message) = parsed.message
        && !message.is_empty()
    {
        return Some(message);
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(error) = parsed.error
        && !error.is_empty()
    {
        return Some(error);
    }

    if !body.is_empty() && body.len() < 100 && !body.contains('{') {
        return Some(body.to_owned());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::{Client, Session, build_query, server_message, status_error};
    use jobtrack_app::{FilterState, Status, StatusFilter, StoreError};
    use reqwest::StatusCode;
    use std::time::Duration;

    #[test]
    fn session_rejects_blank_token() {
        let error = Session::new("   ").expect_err("blank token should fail");
        assert!(error.to_string().contains("log in"));
        assert_eq!(Session::new(" abc ").expect("token accepted").token(), "abc");
    }

    #[test]
    fn client_trims_trailing_slashes_and_validates_url() {
        let session = Session::new("token").expect("session");
        let client = Client::new(
            "https://api.example.com/v1///",
            session.clone(),
            Duration::from_secs(5),
        )
        .expect("client should initialize");
        assert_eq!(client.base_url(), "https://api.example.com/v1");

        let error = Client::new("not a url", session, Duration::from_secs(5))
            .expect_err("invalid URL should fail");
        assert!(error.to_string().contains("not a valid URL"));
    }

    #[test]
    fn query_omits_blank_search_and_all_status() {
        let filter = FilterState::default();
        let query = build_query(&filter);
        assert_eq!(
            query,
            vec![("page", "1".to_owned()), ("size", "9".to_owned())]
        );
    }

    #[test]
    fn query_carries_trimmed_search_and_named_status() {
        let filter = FilterState {
            search_term: "  tech  ".to_owned(),
            status_filter: StatusFilter::Only(Status::Interview),
            page: 3,
            page_size: 12,
        };
        let query = build_query(&filter);
        assert_eq!(
            query,
            vec![
                ("page", "3".to_owned()),
                ("size", "12".to_owned()),
                ("search", "tech".to_owned()),
                ("status", "Interview".to_owned()),
            ]
        );
    }

    #[test]
    fn status_codes_map_to_store_error_classes() {
        assert_eq!(
            status_error(StatusCode::UNAUTHORIZED, ""),
            StoreError::AuthenticationRequired
        );
        assert_eq!(
            status_error(StatusCode::FORBIDDEN, ""),
            StoreError::AuthenticationRequired
        );
        assert_eq!(
            status_error(StatusCode::UNPROCESSABLE_ENTITY, r#"{"message":"page must be positive"}"#),
            StoreError::ValidationFailed("page must be positive".to_owned())
        );
        assert_eq!(
            status_error(StatusCode::NOT_FOUND, ""),
            StoreError::ValidationFailed("resource not found".to_owned())
        );
        assert_eq!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            StoreError::ServerFault(500)
        );
        assert_eq!(
            status_error(StatusCode::BAD_GATEWAY, ""),
            StoreError::ServerFault(502)
        );
    }

    #[test]
    fn server_message_reads_both_envelope_shapes_and_short_plain_bodies() {
        assert_eq!(
            server_message(r#"{"message":"invalid status"}"#),
            Some("invalid status".to_owned())
        );
        assert_eq!(
            server_message(r#"{"error":"bad filter"}"#),
            Some("bad filter".to_owned())
        );
        assert_eq!(server_message("teapot"), Some("teapot".to_owned()));
        assert_eq!(server_message(r#"{"unrelated":true}"#), None);
        assert_eq!(server_message(""), None);
    }
}
