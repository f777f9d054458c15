use std::time::{Duration, Instant};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use tracing::{debug, info, instrument, warn};

use crate::error::{CleanerError, Result};
use crate::ingest;
use crate::source::SheetSource;
use crate::types::Table;

const DEFAULT_EXPORT_BASE: &str = "https://docs.google.com/spreadsheets/d";

static SPREADSHEET_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/spreadsheets/d/([A-Za-z0-9_-]+)").expect("spreadsheet id pattern is valid")
});

/// Extracts the spreadsheet id from a sharing or edit URL.
pub fn spreadsheet_id(sheet_url: &str) -> Option<&str> {
    SPREADSHEET_ID
        .captures(sheet_url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// One worksheet of a Google spreadsheet, fetched through its CSV export.
pub struct GoogleSheetSource {
    client: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    sheet_name: String,
    access_token: Option<String>,
}

impl GoogleSheetSource {
    pub fn new(
        sheet_url: &str,
        sheet_name: &str,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let id = spreadsheet_id(sheet_url).ok_or_else(|| {
            CleanerError::MissingInput(format!(
                "'{}' is not a Google Sheets URL (expected .../spreadsheets/d/<id>/...)",
                sheet_url
            ))
        })?;

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: DEFAULT_EXPORT_BASE.to_string(),
            spreadsheet_id: id.to_string(),
            sheet_name: sheet_name.trim().to_string(),
            access_token,
        })
    }

    /// Points the export at another host, e.g. a mirror or a local stand-in.
    /// `base_url` replaces the `https://docs.google.com/spreadsheets/d` prefix.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// CSV export of the worksheet. `headers=1` pins the header to the first row.
    pub fn export_url(&self) -> Result<Url> {
        let base = format!("{}/{}/gviz/tq", self.base_url, self.spreadsheet_id);
        Url::parse_with_params(
            &base,
            &[
                ("tqx", "out:csv"),
                ("headers", "1"),
                ("sheet", self.sheet_name.as_str()),
            ],
        )
        .map_err(|e| CleanerError::SourceAccess(format!("invalid export URL: {}", e)))
    }
}

#[async_trait]
impl SheetSource for GoogleSheetSource {
    fn describe(&self) -> String {
        format!("sheet '{}' of spreadsheet {}", self.sheet_name, self.spreadsheet_id)
    }

    #[instrument(skip(self), fields(spreadsheet = %self.spreadsheet_id, sheet = %self.sheet_name))]
    async fn fetch(&self) -> Result<Table> {
        let url = self.export_url()?;
        debug!("Requesting {}", url);
        let started = Instant::now();

        let mut request = self.client.get(url);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CleanerError::SourceAccess(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Sheet export responded with status {}", status.as_u16());
            return Err(CleanerError::SourceAccess(format!(
                "sheet export returned {}: {}",
                status,
                body.trim()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CleanerError::SourceAccess(e.to_string()))?;
        let table = ingest::read_csv(body.as_bytes())?;

        info!(
            "Fetched {} rows ({} bytes) in {:.2}s",
            table.len(),
            body.len(),
            started.elapsed().as_secs_f64()
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response and returns the base URL to reach it.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                concat!(
                    "HTTP/1.1 {}\r\nContent-Type: text/csv\r\n",
                    "Content-Length: {}\r\nConnection: close\r\n\r\n{}"
                ),
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{}/spreadsheets/d", addr)
    }

    fn local_source(base_url: String) -> GoogleSheetSource {
        GoogleSheetSource::new(
            "https://docs.google.com/spreadsheets/d/abc123/edit",
            "Sheet1",
            Some("token".to_string()),
            Duration::from_secs(5),
        )
        .unwrap()
        .with_base_url(base_url)
    }

    #[test]
    fn test_spreadsheet_id_from_urls() {
        assert_eq!(
            spreadsheet_id("https://docs.google.com/spreadsheets/d/1PKkDemoSheetURL/edit#gid=0"),
            Some("1PKkDemoSheetURL")
        );
        assert_eq!(
            spreadsheet_id("https://docs.google.com/spreadsheets/d/ab-c_D9/"),
            Some("ab-c_D9")
        );
        assert_eq!(spreadsheet_id("https://example.com/sheet"), None);
    }

    #[test]
    fn test_export_url_encodes_sheet_name() {
        let source = GoogleSheetSource::new(
            "https://docs.google.com/spreadsheets/d/abc123/edit",
            " Q1 Leads & More ",
            None,
            Duration::from_secs(5),
        )
        .unwrap();

        let url = source.export_url().unwrap();

        assert_eq!(url.path(), "/spreadsheets/d/abc123/gviz/tq");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("tqx".to_string(), "out:csv".to_string()),
                ("headers".to_string(), "1".to_string()),
                ("sheet".to_string(), "Q1 Leads & More".to_string()),
            ]
        );
    }

    #[test]
    fn test_malformed_url_is_missing_input() {
        let err = GoogleSheetSource::new("not a url", "Sheet1", None, Duration::from_secs(5))
            .err()
            .unwrap();
        assert!(matches!(err, CleanerError::MissingInput(_)));
    }

    #[tokio::test]
    async fn test_fetch_parses_csv_export() {
        let base = serve_once("200 OK", "Name,Email\nAnn,ann@x.com\n").await;

        let table = local_source(base).fetch().await.unwrap();

        assert_eq!(table.column_names(), vec!["Name", "Email"]);
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn test_non_success_status_is_source_access_error() {
        let base = serve_once("403 Forbidden", "permission denied").await;

        let err = local_source(base).fetch().await.unwrap_err();

        assert!(matches!(err, CleanerError::SourceAccess(_)));
        let message = err.to_string();
        assert!(message.contains("403"));
        assert!(message.contains("permission denied"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_source_access_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source = local_source(format!("http://{}/spreadsheets/d", addr));
        let err = source.fetch().await.unwrap_err();

        assert!(matches!(err, CleanerError::SourceAccess(_)));
    }
}
