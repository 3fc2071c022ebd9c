//! In-memory view of one legacy CSV export with alias-tolerant access.

use std::collections::HashMap;
use std::path::Path;

use csv::ReaderBuilder;

use crate::decode::{decode_bytes, detect_delimiter};
use crate::error::{IngestError, Result};

/// One parsed legacy CSV file: normalized headers plus string rows, padded
/// to the header width. Column lookup is case-insensitive.
#[derive(Debug, Clone)]
pub struct LegacyTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    exact: HashMap<String, usize>,
    folded: HashMap<String, usize>,
}

fn normalize_header(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').trim().to_string()
}

impl LegacyTable {
    /// Read and decode a legacy CSV file from disk.
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| IngestError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&bytes, path)
    }

    /// Parse already-loaded CSV bytes; `path` is only used for error
    /// reporting.
    pub fn parse(bytes: &[u8], path: &Path) -> Result<Self> {
        let (text, encoding) = decode_bytes(bytes);
        let first_line = text.lines().next().unwrap_or("");
        let delimiter = detect_delimiter(first_line);
        tracing::debug!(
            path = %path.display(),
            encoding,
            delimiter = %(delimiter as char),
            "reading legacy csv"
        );

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|error| IngestError::CsvParse {
                path: path.to_path_buf(),
                message: error.to_string(),
            })?
            .iter()
            .map(normalize_header)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|error| IngestError::CsvParse {
                path: path.to_path_buf(),
                message: error.to_string(),
            })?;
            if record.iter().all(|value| value.trim().is_empty()) {
                continue;
            }
            let mut row = Vec::with_capacity(headers.len());
            for idx in 0..headers.len() {
                row.push(record.get(idx).unwrap_or("").trim().to_string());
            }
            rows.push(row);
        }

        let mut exact = HashMap::new();
        let mut folded = HashMap::new();
        for (idx, header) in headers.iter().enumerate() {
            exact.entry(header.clone()).or_insert(idx);
            folded.entry(header.to_lowercase()).or_insert(idx);
        }

        Ok(Self {
            headers,
            rows,
            exact,
            folded,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = RowView<'_>> {
        self.rows.iter().enumerate().map(|(idx, cells)| RowView {
            table: self,
            cells,
            number: idx + 1,
        })
    }
}

/// A borrowed row with alias-based field access. Missing headers resolve
/// to the empty string; nothing here ever fails.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    table: &'a LegacyTable,
    cells: &'a [String],
    /// 1-based record number within the file.
    pub number: usize,
}

impl<'a> RowView<'a> {
    /// Value under the exact header name, trimmed; empty when absent.
    pub fn get(&self, header: &str) -> &'a str {
        self.table
            .exact
            .get(header)
            .and_then(|idx| self.cells.get(*idx))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Try each alias verbatim, then case-insensitively; the first
    /// non-empty trimmed value wins.
    pub fn resolve(&self, aliases: &[&str]) -> &'a str {
        for alias in aliases {
            let value = self.get(alias);
            if !value.is_empty() {
                return value;
            }
        }
        for alias in aliases {
            if let Some(idx) = self.table.folded.get(&alias.to_lowercase())
                && let Some(value) = self.cells.get(*idx)
                && !value.is_empty()
            {
                return value;
            }
        }
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn table_from(content: &str) -> LegacyTable {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        LegacyTable::read(file.path()).unwrap()
    }

    #[test]
    fn semicolon_delimiter_detected() {
        let table = table_from("klant_id;username;voornaam\n1;a@b.be;An\n");
        assert_eq!(table.headers(), ["klant_id", "username", "voornaam"]);
        let row = table.iter().next().unwrap();
        assert_eq!(row.get("username"), "a@b.be");
    }

    #[test]
    fn bom_and_whitespace_stripped_from_headers() {
        let table = table_from("\u{feff}klant_id , username\n1,a@b.be\n");
        assert_eq!(table.headers(), ["klant_id", "username"]);
    }

    #[test]
    fn resolve_prefers_exact_then_case_insensitive() {
        let table = table_from("ZakId,zak_id\n77,88\n");
        let row = table.iter().next().unwrap();
        assert_eq!(row.resolve(&["zak_id", "ZakId"]), "88");
        assert_eq!(row.resolve(&["zakid"]), "77");
        assert_eq!(row.resolve(&["missing"]), "");
    }

    #[test]
    fn short_records_are_padded() {
        let table = table_from("a,b,c\n1,2\n");
        let row = table.iter().next().unwrap();
        assert_eq!(row.get("c"), "");
    }

    #[test]
    fn blank_lines_are_skipped() {
        let table = table_from("a,b\n1,2\n,\n3,4\n");
        assert_eq!(table.len(), 2);
    }
}
