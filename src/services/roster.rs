//! Technician roster loading
//!
//! The roster is a comma-separated file with a header row. One column holds
//! the technician's residential address; all other columns are carried
//! through to the response untouched. The file is re-read on every request.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::types::TechnicianRecord;

#[async_trait]
pub trait RosterProvider: Send + Sync {
    /// Snapshot of the roster, in file order
    async fn load(&self) -> Result<Vec<TechnicianRecord>>;
}

/// Roster backed by a CSV file on disk
pub struct CsvRosterProvider {
    path: PathBuf,
    address_column: String,
}

impl CsvRosterProvider {
    pub fn new(path: impl Into<PathBuf>, address_column: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            address_column: address_column.into(),
        }
    }
}

#[async_trait]
impl RosterProvider for CsvRosterProvider {
    async fn load(&self) -> Result<Vec<TechnicianRecord>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read roster file {}", self.path.display()))?;

        let records = parse_roster(&content, &self.address_column)?;
        debug!("Loaded {} technicians from {}", records.len(), self.path.display());
        Ok(records)
    }
}

/// Parse roster CSV content. Rows with a blank address keep `address: None`.
pub fn parse_roster(content: &str, address_column: &str) -> Result<Vec<TechnicianRecord>> {
    let content = content.trim_start_matches('\u{feff}');
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read roster header")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("Invalid roster row {}", line + 2))?;

        let fields: BTreeMap<String, String> = headers
            .iter()
            .cloned()
            .zip(row.iter().map(str::to_string))
            .collect();

        let address = fields
            .get(address_column)
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .map(str::to_string);

        records.push(TechnicianRecord::new(fields, address));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const COLUMN: &str = "ENDEREÇO/RESIDENCIA";

    #[test]
    fn test_parse_roster_keeps_order_and_columns() {
        let csv = "NOME,ENDEREÇO/RESIDENCIA,TELEFONE\n\
                   Ana,\"Rua A, 10, Santos - SP\",1111\n\
                   Bruno,\"Rua B, 20, Campinas - SP\",2222\n";

        let records = parse_roster(csv, COLUMN).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].fields["NOME"], "Ana");
        assert_eq!(records[0].address.as_deref(), Some("Rua A, 10, Santos - SP"));
        assert_eq!(records[1].fields["TELEFONE"], "2222");
    }

    #[test]
    fn test_parse_roster_blank_or_missing_address() {
        let csv = "NOME,ENDEREÇO/RESIDENCIA\nAna,   \nBruno\n";

        let records = parse_roster(csv, COLUMN).unwrap();

        assert_eq!(records.len(), 2);
        assert!(records[0].address.is_none());
        assert!(records[1].address.is_none());
        assert!(!records[1].fields.contains_key(COLUMN));
    }

    #[test]
    fn test_parse_roster_strips_bom_and_header_whitespace() {
        let csv = "\u{feff}NOME, ENDEREÇO/RESIDENCIA \nAna,Rua A\n";

        let records = parse_roster(csv, COLUMN).unwrap();

        assert_eq!(records[0].address.as_deref(), Some("Rua A"));
    }

    #[test]
    fn test_parse_roster_unknown_column() {
        let records = parse_roster("NOME,ENDERECO\nAna,Rua A\n", COLUMN).unwrap();
        assert!(records[0].address.is_none());
    }

    #[tokio::test]
    async fn test_csv_provider_rereads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "NOME,ENDEREÇO/RESIDENCIA").unwrap();
        writeln!(file, "Ana,Rua A").unwrap();
        file.flush().unwrap();

        let provider = CsvRosterProvider::new(file.path(), COLUMN);
        assert_eq!(provider.load().await.unwrap().len(), 1);

        writeln!(file, "Bruno,Rua B").unwrap();
        file.flush().unwrap();
        assert_eq!(provider.load().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_csv_provider_missing_file() {
        let provider = CsvRosterProvider::new("/nonexistent/tecnicos.csv", COLUMN);
        let err = provider.load().await.unwrap_err();
        assert!(err.to_string().contains("Failed to read roster file"));
    }
}
