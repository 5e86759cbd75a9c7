//! Warehouse HTTP API source

use std::time::{Duration, Instant};

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use super::{SourceQuery, UsageSource};
use crate::types::{ReportError, Result, UsageRecord};

#[derive(Deserialize)]
struct InstitutionResponse {
    name: Option<String>,
}

/// Source backed by a warehouse query API
pub struct HttpSource {
    client: Client,
    base_url: Url,
    timeout: Duration,
    token: Option<String>,
}

impl HttpSource {
    /// Create a source for `base_url` with an explicit per-request timeout
    pub fn new(base_url: &str, timeout: Duration, token: Option<String>) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ReportError::Config(format!("invalid source url '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ReportError::Config(format!(
                "source url '{}' cannot hold a path",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReportError::Source(format!("HTTP client error: {}", e)))?;
        Ok(Self {
            client,
            base_url,
            timeout,
            token,
        })
    }

    /// Base URL with `segments` appended, each percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn usage_url(&self) -> Url {
        self.endpoint(&["usage"])
    }

    fn institution_url(&self, institution_id: &str) -> Url {
        self.endpoint(&["institutions", institution_id])
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Timeouts are reported apart from every other transport failure
    fn map_error(&self, err: reqwest::Error) -> ReportError {
        if err.is_timeout() {
            ReportError::Timeout(self.timeout)
        } else {
            ReportError::Source(format!("HTTP request failed: {}", err))
        }
    }
}

impl UsageSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch(&self, query: &SourceQuery) -> Result<Vec<UsageRecord>> {
        let started = Instant::now();
        let response = self
            .authorize(self.client.post(self.usage_url()).json(query))
            .send()
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::Source(format!(
                "warehouse returned HTTP {}",
                status
            )));
        }

        let records: Vec<UsageRecord> = response.json().map_err(|e| {
            if e.is_timeout() {
                ReportError::Timeout(self.timeout)
            } else {
                ReportError::Parse(format!("invalid usage response: {}", e))
            }
        })?;

        debug!(
            institution = %query.institution_id,
            rows = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "http source query finished"
        );
        Ok(records)
    }

    fn institution_name(&self, institution_id: &str) -> Result<Option<String>> {
        let response = self
            .authorize(self.client.get(self.institution_url(institution_id)))
            .send()
            .map_err(|e| self.map_error(e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body: InstitutionResponse = response
                    .json()
                    .map_err(|e| ReportError::Parse(format!("invalid institution response: {}", e)))?;
                Ok(body.name.filter(|n| !n.trim().is_empty()))
            }
            status => Err(ReportError::Source(format!(
                "warehouse returned HTTP {}",
                status
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Granularity;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn query() -> SourceQuery {
        SourceQuery::new("X".into(), Granularity::Monthly, vec!["2024-01".into()], None)
    }

    /// Run a blocking source call off the async test runtime
    async fn blocking<T, F>(f: F) -> T
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        tokio::task::spawn_blocking(f).await.unwrap()
    }

    fn make_source(uri: &str, timeout: Duration, token: Option<&str>) -> HttpSource {
        HttpSource::new(uri, timeout, token.map(str::to_string)).unwrap()
    }

    #[test]
    fn test_urls() {
        let source = make_source("http://warehouse.local/api/", Duration::from_secs(1), None);
        assert_eq!(source.usage_url().as_str(), "http://warehouse.local/api/usage");
        assert_eq!(
            source.institution_url("ICST1").as_str(),
            "http://warehouse.local/api/institutions/ICST1"
        );
    }

    #[test]
    fn test_institution_url_encodes_id() {
        let source = make_source("http://warehouse.local", Duration::from_secs(1), None);
        assert_eq!(
            source.institution_url("A/B?c#d").as_str(),
            "http://warehouse.local/institutions/A%2FB%3Fc%23d"
        );
    }

    #[test]
    fn test_new_rejects_bad_url() {
        let Err(err) = HttpSource::new("not a url", Duration::from_secs(1), None) else {
            panic!("expected an error for an invalid url");
        };
        assert!(matches!(err, ReportError::Config(_)));
    }

    #[tokio::test]
    async fn test_fetch_posts_query_with_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/usage"))
            .and(header("authorization", "Bearer secret"))
            .and(body_json(json!({
                "institution_id": "X",
                "granularity": "monthly",
                "periods": ["2024-01"],
                "group_by": ["category", "period"],
                "aggregates": [
                    "sum(used)",
                    "sum(prior_year_used)",
                    "sum(session)",
                    "sum(prior_year_session)"
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"category": "AI IDEA", "period": "2024-01", "used": 10, "prior_year_used": 20, "session": 3}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        let records = blocking(move || {
            make_source(&uri, Duration::from_secs(5), Some("secret")).fetch(&query())
        })
        .await
        .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].used, 10.0);
        assert_eq!(records[0].prior_year_used, 20.0);
        assert_eq!(records[0].prior_year_session, 0.0);
    }

    #[tokio::test]
    async fn test_fetch_empty_array_is_not_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/usage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let uri = server.uri();
        let records = blocking(move || make_source(&uri, Duration::from_secs(5), None).fetch(&query()))
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_source_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/usage"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let uri = server.uri();
        let err = blocking(move || make_source(&uri, Duration::from_secs(5), None).fetch(&query()))
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Source(_)));
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_distinct() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/usage"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let uri = server.uri();
        let err = blocking(move || make_source(&uri, Duration::from_millis(200), None).fetch(&query()))
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_fetch_bad_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/usage"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let uri = server.uri();
        let err = blocking(move || make_source(&uri, Duration::from_secs(5), None).fetch(&query()))
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Parse(_)));
    }

    #[tokio::test]
    async fn test_institution_name_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/institutions/ICST00004103"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Hanbit University"})))
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        let name = blocking(move || {
            make_source(&uri, Duration::from_secs(5), Some("secret")).institution_name("ICST00004103")
        })
        .await
        .unwrap();
        assert_eq!(name.as_deref(), Some("Hanbit University"));
    }

    #[tokio::test]
    async fn test_institution_name_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/institutions/X"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        let name = blocking(move || make_source(&uri, Duration::from_secs(5), None).institution_name("X"))
            .await
            .unwrap();
        assert_eq!(name, None);
    }

    #[tokio::test]
    async fn test_institution_name_blank_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/institutions/X"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "  "})))
            .mount(&server)
            .await;

        let uri = server.uri();
        let name = blocking(move || make_source(&uri, Duration::from_secs(5), None).institution_name("X"))
            .await
            .unwrap();
        assert_eq!(name, None);
    }
}
