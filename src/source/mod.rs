//! Where raw tables come from: local exports or a remote spreadsheet.

pub mod file;
pub mod google_sheets;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::{CleanerError, Result};
use crate::types::Table;

pub use file::FileSource;
pub use google_sheets::GoogleSheetSource;

/// A provider of one raw table per fetch.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Human-readable description used in logs and messages
    fn describe(&self) -> String;

    /// Fetch the table. Access failures surface as `CleanerError::SourceAccess`.
    async fn fetch(&self) -> Result<Table>;
}

/// The caller's choice of source, checked before anything is fetched.
#[derive(Debug, Clone, Default)]
pub struct SourceRequest {
    pub input: Option<PathBuf>,
    pub sheet_url: Option<String>,
    pub sheet_name: Option<String>,
    pub demo: bool,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl SourceRequest {
    /// Picks the source: demo sheet, then a local file, then an explicit sheet.
    pub fn resolve(&self, config: &Config) -> Result<Box<dyn SheetSource>> {
        if self.demo {
            let demo = config.demo.as_ref().ok_or_else(|| {
                CleanerError::MissingInput(
                    "demo mode needs a [demo] section with sheet_url and sheet_name in the config"
                        .to_string(),
                )
            })?;
            let source = GoogleSheetSource::new(
                &demo.sheet_url,
                &demo.sheet_name,
                config.source.access_token(),
                config.source.timeout(),
            )?;
            return Ok(Box::new(source));
        }

        if let Some(path) = &self.input {
            return Ok(Box::new(FileSource::new(path.clone())));
        }

        match (non_empty(&self.sheet_url), non_empty(&self.sheet_name)) {
            (Some(url), Some(name)) => {
                let source = GoogleSheetSource::new(
                    url,
                    name,
                    config.source.access_token(),
                    config.source.timeout(),
                )?;
                Ok(Box::new(source))
            }
            _ => Err(CleanerError::MissingInput(
                concat!(
                    "Please fill all fields: provide --input, ",
                    "or both --sheet-url and --sheet-name, or --demo"
                )
                .to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DemoConfig;

    #[test]
    fn test_partial_sheet_arguments_are_missing_input() {
        let request = SourceRequest {
            sheet_url: Some("https://docs.google.com/spreadsheets/d/abc/edit".into()),
            sheet_name: Some("  ".into()),
            ..SourceRequest::default()
        };

        let err = request.resolve(&Config::default()).err().unwrap();

        assert!(matches!(err, CleanerError::MissingInput(_)));
    }

    #[test]
    fn test_nothing_supplied_is_missing_input() {
        let err = SourceRequest::default().resolve(&Config::default()).err().unwrap();
        assert!(err.to_string().contains("Please fill all fields"));
    }

    #[test]
    fn test_demo_without_config_section() {
        let request = SourceRequest {
            demo: true,
            ..SourceRequest::default()
        };
        let err = request.resolve(&Config::default()).err().unwrap();
        assert!(matches!(err, CleanerError::MissingInput(_)));
    }

    #[test]
    fn test_demo_uses_configured_sheet() {
        let config = Config {
            demo: Some(DemoConfig {
                sheet_url: "https://docs.google.com/spreadsheets/d/demoSheet42/edit".into(),
                sheet_name: "Sheet1".into(),
            }),
            ..Config::default()
        };
        let request = SourceRequest {
            demo: true,
            ..SourceRequest::default()
        };

        let source = request.resolve(&config).unwrap();

        assert!(source.describe().contains("demoSheet42"));
    }

    #[test]
    fn test_input_file_wins_over_sheet_arguments() {
        let request = SourceRequest {
            input: Some(PathBuf::from("contacts.csv")),
            sheet_url: Some("https://docs.google.com/spreadsheets/d/abc/edit".into()),
            ..SourceRequest::default()
        };

        let source = request.resolve(&Config::default()).unwrap();

        assert!(source.describe().contains("contacts.csv"));
    }
}
