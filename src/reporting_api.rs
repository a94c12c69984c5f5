//! Reporting API page source
//!
//! [`ReportingClient`] serves pages from the `reports:batchGet` endpoint of the
//! analytics reporting API. One request carries one report; the continuation
//! token travels as `pageToken`. Authentication is limited to attaching an
//! already-issued bearer token.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::FetchError;
use crate::models::{Cursor, Page, ReportQuery, Row};
use crate::source::PageSource;

pub struct ReportingClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
    max_retries: usize,
    retry_backoff: Duration,
}

impl ReportingClient {
    pub fn new(config: &ApiConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| FetchError::transport(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            access_token: config.access_token.clone(),
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    async fn send_once(&self, body: &serde_json::Value) -> Result<Page, FetchError> {
        let mut request = self.http.post(&self.endpoint).json(body);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|err| FetchError::transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: BatchGetResponse = response
            .json()
            .await
            .map_err(|err| FetchError::decode(err.to_string()))?;
        payload.into_page()
    }
}

#[async_trait]
impl PageSource for ReportingClient {
    async fn fetch_page(&self, query: &ReportQuery, cursor: Option<&Cursor>) -> Result<Page, FetchError> {
        let body = request_body(query, cursor);
        let mut attempt = 0usize;

        loop {
            match self.send_once(&body).await {
                Ok(page) => return Ok(page),
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    let delay = self.retry_backoff.saturating_mul(2u32.saturating_pow(attempt as u32));
                    attempt += 1;
                    warn!(
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient reporting API failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    debug!(error = %err, attempts = attempt + 1, "Reporting API request failed");
                    return Err(err);
                }
            }
        }
    }
}

/// Build the `batchGet` body for one page of `query`.
pub fn request_body(query: &ReportQuery, cursor: Option<&Cursor>) -> serde_json::Value {
    let mut report = json!({
        "viewId": query.view_id,
        "dateRanges": [{
            "startDate": query.date_range.start.format("%Y-%m-%d").to_string(),
            "endDate": query.date_range.end.format("%Y-%m-%d").to_string(),
        }],
        "metrics": query
            .metrics
            .iter()
            .map(|expression| json!({ "expression": expression }))
            .collect::<Vec<_>>(),
        "dimensions": query
            .dimensions
            .iter()
            .map(|name| json!({ "name": name }))
            .collect::<Vec<_>>(),
        "pageSize": query.page_size,
    });

    if let Some(filter) = &query.filter {
        report["dimensionFilterClauses"] = json!([{
            "filters": [{
                "operator": filter.operator,
                "dimensionName": filter.dimension,
                "expressions": [filter.expression],
            }]
        }]);
    }
    if let Some(cursor) = cursor {
        report["pageToken"] = json!(cursor.as_str());
    }

    json!({ "reportRequests": [report] })
}

#[derive(Debug, Deserialize)]
pub struct BatchGetResponse {
    #[serde(default)]
    reports: Vec<WireReport>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireReport {
    #[serde(default)]
    data: Option<WireReportData>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireReportData {
    rows: Option<Vec<WireRow>>,
}

#[derive(Debug, Deserialize)]
struct WireRow {
    #[serde(default)]
    dimensions: Vec<String>,
    #[serde(default)]
    metrics: Vec<WireDateRangeValues>,
}

#[derive(Debug, Deserialize)]
struct WireDateRangeValues {
    #[serde(default)]
    values: Vec<String>,
}

impl BatchGetResponse {
    /// First report of the response as a [`Page`]. A report without a row
    /// section is an empty page.
    pub fn into_page(self) -> Result<Page, FetchError> {
        let report = self.reports.into_iter().next().ok_or(FetchError::MissingReport)?;

        let rows = report
            .data
            .and_then(|data| data.rows)
            .unwrap_or_default()
            .into_iter()
            .map(WireRow::into_row)
            .collect::<Result<Vec<_>, _>>()?;

        let next_cursor = report
            .next_page_token
            .filter(|token| !token.is_empty())
            .map(Cursor::new);

        Ok(Page::new(rows, next_cursor))
    }
}

impl WireRow {
    fn into_row(self) -> Result<Row, FetchError> {
        let metrics = self
            .metrics
            .into_iter()
            .next()
            .map(|range| range.values)
            .unwrap_or_default()
            .iter()
            .map(|value| {
                value
                    .parse::<u64>()
                    .map_err(|err| FetchError::decode(format!("metric value {value:?}: {err}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Row::new(self.dimensions, metrics))
    }
}
