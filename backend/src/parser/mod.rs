//! CSV loading with encoding and delimiter auto-detection.
//!
//! Reads the two raw inputs of the ETL: the messages file
//! (`id,message,original,genre`) and the categories file (`id,categories`).

use std::path::Path;

use crate::error::{CsvError, CsvResult};

/// One data row with its 1-based line number in the source file.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRow {
    pub line: usize,
    pub fields: Vec<String>,
}

impl CsvRow {
    /// Field at `index`, or "" when the row is short.
    pub fn get(&self, index: usize) -> &str {
        self.fields.get(index).map(String::as_str).unwrap_or("")
    }
}

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Data rows (header excluded)
    pub rows: Vec<CsvRow>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Column headers
    pub headers: Vec<String>,
}

impl ParseResult {
    /// Index of a required column.
    pub fn column(&self, name: &str) -> CsvResult<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| CsvError::new(1, "Missing required column").with_column(name))
    }
}

/// A row of the messages file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub id: i64,
    pub message: String,
    pub original: Option<String>,
    pub genre: String,
}

/// A row of the categories file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCategories {
    pub id: i64,
    pub categories: String,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let charset = chardet::detect(bytes).0;
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let text = match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        // utf-8, ascii and anything unknown: lossy UTF-8
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };

    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

/// Detect the delimiter by counting occurrences in the header line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV text with an explicit delimiter.
///
/// Quoted fields may contain delimiters and newlines. Blank lines are skipped.
pub fn parse_string_with_metadata(
    content: &str,
    delimiter: char,
    encoding: String,
) -> CsvResult<ParseResult> {
    if content.trim().is_empty() {
        return Err(CsvError::new(1, "Empty CSV file"));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| CsvError::new(1, format!("Cannot read header: {}", e)))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::new(1, "No headers found"));
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| {
            let line = e.position().map(|p| p.line() as usize).unwrap_or(0);
            CsvError::new(line, format!("Invalid CSV record: {}", e))
        })?;

        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        if record.len() != headers.len() {
            return Err(CsvError::new(
                line,
                format!("Expected {} fields, saw {}", headers.len(), record.len()),
            ));
        }
        rows.push(CsvRow {
            line,
            fields: record.iter().map(str::to_string).collect(),
        });
    }

    Ok(ParseResult {
        rows,
        encoding,
        delimiter,
        headers,
    })
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    parse_string_with_metadata(&content, delimiter, encoding)
}

/// Parse CSV file with auto-detection of encoding and delimiter.
///
/// Every error carries the file path.
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> CsvResult<ParseResult> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| CsvError::new(0, format!("Cannot read file: {}", e)).with_path(path))?;

    parse_bytes_auto(&bytes).map_err(|e| e.with_path(path))
}

fn parse_id(row: &CsvRow, index: usize) -> CsvResult<i64> {
    let raw = row.get(index).trim();
    raw.parse::<i64>().map_err(|_| {
        CsvError::new(row.line, "Identifier is not an integer")
            .with_column("id")
            .with_value(raw)
    })
}

fn required(row: &CsvRow, index: usize, column: &str) -> CsvResult<String> {
    let value = row.get(index).trim();
    if value.is_empty() {
        return Err(CsvError::new(row.line, "Required value is empty").with_column(column));
    }
    Ok(value.to_string())
}

fn optional(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Interpret a parsed table as the messages file.
pub fn messages_from_table(table: &ParseResult) -> CsvResult<Vec<RawMessage>> {
    let id = table.column("id")?;
    let message = table.column("message")?;
    let genre = table.column("genre")?;
    let original = table.column("original").ok();

    table
        .rows
        .iter()
        .map(|row| {
            Ok(RawMessage {
                id: parse_id(row, id)?,
                message: required(row, message, "message")?,
                original: original.and_then(|i| optional(row.get(i))),
                genre: required(row, genre, "genre")?,
            })
        })
        .collect()
}

/// Interpret a parsed table as the categories file.
pub fn categories_from_table(table: &ParseResult) -> CsvResult<Vec<RawCategories>> {
    let id = table.column("id")?;
    let categories = table.column("categories")?;

    table
        .rows
        .iter()
        .map(|row| {
            Ok(RawCategories {
                id: parse_id(row, id)?,
                categories: row.get(categories).trim().to_string(),
            })
        })
        .collect()
}

/// Load the messages file.
pub fn load_messages<P: AsRef<Path>>(path: P) -> CsvResult<Vec<RawMessage>> {
    let path = path.as_ref();
    let table = parse_csv_file_auto(path)?;
    messages_from_table(&table).map_err(|e| e.with_path(path))
}

/// Load the categories file.
pub fn load_categories<P: AsRef<Path>>(path: P) -> CsvResult<Vec<RawCategories>> {
    let path = path.as_ref();
    let table = parse_csv_file_auto(path)?;
    categories_from_table(&table).map_err(|e| e.with_path(path))
}
