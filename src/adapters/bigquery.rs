use crate::adapters::auth::TokenSource;
use crate::config::WarehouseSettings;
use crate::core::query::{BALANCE_COLUMN, NAME_COLUMN, SEGMENT_COLUMN};
use crate::domain::model::{CustomerRecord, NetBalance, Segment};
use crate::domain::ports::Warehouse;
use crate::utils::error::{ReportError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;

const MAX_POLLS: usize = 30;
/// Slack on top of the server-side `timeoutMs` before the client gives up on a call.
pub const HTTP_TIMEOUT_MARGIN_MS: u64 = 5_000;

static NULL: Value = Value::Null;

/// BigQuery REST v2 client bound to one project.
pub struct BigQueryClient {
    client: Client,
    api_url: String,
    project_id: String,
    access_token: String,
    timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    job_complete: Option<bool>,
    job_reference: Option<JobReference>,
    schema: Option<TableSchema>,
    #[serde(default)]
    rows: Vec<TableRow>,
    #[serde(default)]
    errors: Vec<ErrorProto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobReference {
    job_id: String,
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TableSchema {
    fields: Vec<FieldSchema>,
}

#[derive(Debug, Deserialize)]
struct FieldSchema {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    f: Vec<TableCell>,
}

#[derive(Debug, Deserialize)]
struct TableCell {
    v: Value,
}

#[derive(Debug, Deserialize)]
struct ErrorProto {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorProto,
}

impl BigQueryClient {
    /// Authenticates and returns a client ready to run queries.
    pub async fn connect(settings: &WarehouseSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms + HTTP_TIMEOUT_MARGIN_MS))
            .build()
            .map_err(|e| ReportError::connection(format!("cannot build HTTP client: {}", e)))?;
        let source = TokenSource::from_settings(settings)?;
        let access_token = source.fetch_token(&client).await?;

        Ok(Self {
            client,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            project_id: settings.project_id.clone(),
            access_token,
            timeout_ms: settings.timeout_ms,
        })
    }

    fn queries_url(&self) -> String {
        format!(
            "{}/bigquery/v2/projects/{}/queries",
            self.api_url, self.project_id
        )
    }

    async fn start_query(&self, sql: &str) -> Result<QueryResponse> {
        let body = serde_json::json!({
            "query": sql,
            "useLegacySql": false,
            "timeoutMs": self.timeout_ms,
        });

        let response = self
            .client
            .post(self.queries_url())
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        parse_response(response).await
    }

    async fn poll_results(&self, job: &JobReference) -> Result<QueryResponse> {
        let mut request = self
            .client
            .get(format!("{}/{}", self.queries_url(), job.job_id))
            .bearer_auth(&self.access_token)
            .query(&[("timeoutMs", self.timeout_ms.to_string())]);
        if let Some(location) = &job.location {
            request = request.query(&[("location", location)]);
        }

        parse_response(request.send().await.map_err(transport_error)?).await
    }
}

#[async_trait]
impl Warehouse for BigQueryClient {
    async fn query(&self, sql: &str) -> Result<Vec<CustomerRecord>> {
        tracing::debug!("Submitting query to project {}", self.project_id);
        let mut response = self.start_query(sql).await?;

        let mut polls = 0;
        while !response.job_complete.unwrap_or(true) {
            if polls == MAX_POLLS {
                return Err(ReportError::query(format!(
                    "job did not complete after {} polls",
                    MAX_POLLS
                )));
            }
            let job = response
                .job_reference
                .as_ref()
                .ok_or_else(|| ReportError::query("incomplete job without a job reference"))?;
            tracing::debug!("Job {} still running, waiting for results", job.job_id);
            response = self.poll_results(job).await?;
            polls += 1;
        }

        decode_rows(response)
    }
}

fn transport_error(e: reqwest::Error) -> ReportError {
    if e.is_timeout() {
        ReportError::connection(format!("BigQuery did not answer in time: {}", e))
    } else {
        ReportError::HttpError(e)
    }
}

async fn parse_response(response: reqwest::Response) -> Result<QueryResponse> {
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| format!("HTTP {}", status));
        return Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ReportError::connection(message),
            _ => ReportError::query(message),
        });
    }

    let parsed: QueryResponse = serde_json::from_str(&body)?;
    // failed jobs come back as non-2xx; entries here are warnings
    for warning in &parsed.errors {
        tracing::warn!("BigQuery reported: {}", warning.message);
    }
    Ok(parsed)
}

fn decode_rows(response: QueryResponse) -> Result<Vec<CustomerRecord>> {
    if response.rows.is_empty() {
        return Ok(Vec::new());
    }

    let schema = response
        .schema
        .ok_or_else(|| ReportError::query("result rows arrived without a schema"))?;
    let column = |name: &str| {
        schema
            .fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| ReportError::query(format!("result is missing column {}", name)))
    };
    let name_idx = column(NAME_COLUMN)?;
    let balance_idx = column(BALANCE_COLUMN)?;
    let segment_idx = column(SEGMENT_COLUMN)?;

    response
        .rows
        .iter()
        .map(|row| -> Result<CustomerRecord> {
            let cell = |idx: usize| row.f.get(idx).map(|c| &c.v).unwrap_or(&NULL);

            let full_name = cell(name_idx).as_str().map(str::to_string);
            let net_balance = parse_number(cell(balance_idx))?;
            let label = cell(segment_idx).as_str().unwrap_or_default();
            let segment = Segment::from_label(label)
                .ok_or_else(|| ReportError::query(format!("unknown segment label '{}'", label)))?;

            Ok(CustomerRecord {
                full_name,
                net_balance: NetBalance(net_balance),
                segment,
            })
        })
        .collect()
}

// BigQuery encodes numeric cells as strings: NUMERIC as exact decimals, FLOAT64 possibly as `1.5E4`
fn parse_number(value: &Value) -> Result<Decimal> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => return Err(ReportError::query(format!("missing balance ({})", other))),
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| ReportError::query(format!("non-numeric balance '{}'", text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: Value) -> QueryResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_decode_rows_by_column_name() {
        let resp = response(json!({
            "jobComplete": true,
            "schema": {"fields": [
                {"name": "segmento_cliente", "type": "STRING"},
                {"name": "nome_completo", "type": "STRING"},
                {"name": "saldo_liquido", "type": "FLOAT"}
            ]},
            "rows": [
                {"f": [{"v": "Alta Renda"}, {"v": "Maria Silva"}, {"v": "60000.0"}]},
                {"f": [{"v": "Varejo"}, {"v": null}, {"v": "-12.5"}]}
            ]
        }));

        let records = decode_rows(resp).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].full_name.as_deref(), Some("Maria Silva"));
        assert_eq!(records[0].net_balance.to_string(), "60000.0");
        assert_eq!(records[0].segment, Segment::HighIncome);
        assert_eq!(records[1].full_name, None);
        assert_eq!(records[1].net_balance, NetBalance(Decimal::new(-125, 1)));
        assert_eq!(records[1].segment, Segment::Retail);
    }

    #[test]
    fn test_decode_keeps_numeric_precision() {
        let resp = response(json!({
            "schema": {"fields": [{"name": "nome_completo"}, {"name": "saldo_liquido"}, {"name": "segmento_cliente"}]},
            "rows": [
                {"f": [{"v": "Ana"}, {"v": "12345678901234567.89"}, {"v": "Alta Renda"}]},
                {"f": [{"v": "Bia"}, {"v": "1.5E4"}, {"v": "Varejo"}]}
            ]
        }));

        let records = decode_rows(resp).unwrap();

        assert_eq!(records[0].net_balance.to_string(), "12345678901234567.89");
        assert_eq!(records[1].net_balance, NetBalance(Decimal::from(15_000)));
    }

    #[test]
    fn test_decode_empty_result_needs_no_schema() {
        let resp = response(json!({"jobComplete": true}));
        assert!(decode_rows(resp).unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_missing_column_and_bad_values() {
        let missing = response(json!({
            "schema": {"fields": [{"name": "nome_completo"}]},
            "rows": [{"f": [{"v": "Ana"}]}]
        }));
        assert!(matches!(decode_rows(missing), Err(ReportError::QueryExecutionError { .. })));

        let bad_label = response(json!({
            "schema": {"fields": [{"name": "nome_completo"}, {"name": "saldo_liquido"}, {"name": "segmento_cliente"}]},
            "rows": [{"f": [{"v": "Ana"}, {"v": "10"}, {"v": "Premium"}]}]
        }));
        assert!(decode_rows(bad_label).unwrap_err().to_string().contains("Premium"));

        let bad_number = response(json!({
            "schema": {"fields": [{"name": "nome_completo"}, {"name": "saldo_liquido"}, {"name": "segmento_cliente"}]},
            "rows": [{"f": [{"v": "Ana"}, {"v": "abc"}, {"v": "Varejo"}]}]
        }));
        assert!(decode_rows(bad_number).is_err());
    }
}
