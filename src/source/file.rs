use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::error::{CleanerError, Result};
use crate::ingest;
use crate::source::SheetSource;
use crate::types::Table;

/// A sheet exported to disk as `.csv` or as a `.json` array of records.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SheetSource for FileSource {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn fetch(&self) -> Result<Table> {
        let extension = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            CleanerError::SourceAccess(format!("cannot read '{}': {}", self.path.display(), e))
        })?;

        let table = match extension.as_deref() {
            Some("csv") => ingest::read_csv(content.as_bytes())?,
            Some("json") => ingest::read_json_records(&content)?,
            _ => {
                return Err(CleanerError::SourceAccess(format!(
                    "unsupported file type '{}': expected .csv or .json",
                    self.path.display()
                )))
            }
        };

        info!("Loaded {} rows from {}", table.len(), self.path.display());
        Ok(table)
    }
}
