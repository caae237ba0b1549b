use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use tokio::time::timeout;
use uuid::Uuid;

use crate::config::Config;
use crate::protocol::Endpoint;
use crate::transport::error::TransportError;

/// Form-POST client for the session server.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct ServerClient {
    client: Client,
    base_url: Url,
    request_timeout: Duration,
}

impl ServerClient {
    pub fn new(config: &Config) -> Result<Self, TransportError> {
        let base_url = parse_base_url(&config.server.base_url)?;
        let client = Client::builder()
            .connect_timeout(config.timing.connect_timeout())
            .build()
            .map_err(TransportError::Client)?;

        Ok(Self {
            client,
            base_url,
            request_timeout: config.timing.request_timeout(),
        })
    }

    /// Posts `fields` to `endpoint` and returns the reply body.
    ///
    /// The whole exchange, body included, is bounded by the request timeout.
    /// There is no retry.
    pub async fn post(
        &self,
        endpoint: Endpoint,
        fields: &[(&str, String)],
    ) -> Result<String, TransportError> {
        let request_id = Uuid::new_v4();
        tracing::debug!(%request_id, %endpoint, "Sending request");

        let result = timeout(self.request_timeout, self.do_post(endpoint, fields)).await;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(_) => Err(TransportError::Timeout {
                endpoint,
                duration_ms: self.request_timeout.as_millis() as u64,
            }),
        };

        match &outcome {
            Ok(body) => tracing::debug!(%request_id, %endpoint, reply = %body, "Request completed"),
            Err(err) => tracing::debug!(
                %request_id,
                %endpoint,
                error_type = err.error_type(),
                error = %err,
                "Request failed"
            ),
        }
        outcome
    }

    async fn do_post(
        &self,
        endpoint: Endpoint,
        fields: &[(&str, String)],
    ) -> Result<String, TransportError> {
        let url = self
            .base_url
            .join(endpoint.path())
            .map_err(|e| TransportError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;

        let response = self
            .client
            .post(url)
            .form(fields)
            .send()
            .await
            .map_err(|source| TransportError::Connection { endpoint, source })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| TransportError::Body { endpoint, source })?;

        if status != StatusCode::OK {
            return Err(TransportError::Status {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

/// Parses the configured base URL so endpoint paths join beneath it.
fn parse_base_url(raw: &str) -> Result<Url, TransportError> {
    let mut url = Url::parse(raw).map_err(|e| TransportError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_join_beneath_base_path() {
        let base = parse_base_url("http://127.0.0.1:8080/app").unwrap();
        assert_eq!(
            base.join(Endpoint::CheckTermination.path()).unwrap().as_str(),
            "http://127.0.0.1:8080/app/check_termination"
        );

        let base = parse_base_url("http://127.0.0.1:8080").unwrap();
        assert_eq!(
            base.join(Endpoint::Run.path()).unwrap().as_str(),
            "http://127.0.0.1:8080/run"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = parse_base_url("not a url").unwrap_err();
        assert_eq!(err.error_type(), "invalid_url");
    }
}
