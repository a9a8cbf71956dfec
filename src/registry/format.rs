//! Record format and sink schema descriptors

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static IDENTIFIER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

static TEXT_TYPE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)(?:text|n?varchar|n?char)\s*\(\s*(\d+)\s*\)$").unwrap()
});

/// Identifier of a raw-layer sink table, e.g. `bronze.crm_cust_info`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SinkId {
    schema: String,
    table: String,
}

impl SinkId {
    /// Schema used when the identifier has no `schema.` prefix
    pub const DEFAULT_SCHEMA: &'static str = "main";

    /// Create a sink identifier from its parts
    pub fn new(schema: &str, table: &str) -> Result<Self, String> {
        for part in [schema, table] {
            if !IDENTIFIER_REGEX.is_match(part) {
                return Err(format!(
                    "Invalid identifier '{}': expected letters, digits and underscores",
                    part
                ));
            }
        }
        Ok(Self {
            schema: schema.to_string(),
            table: table.to_string(),
        })
    }

    /// Parse `schema.table` or a bare `table`
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.split_once('.') {
            Some((schema, table)) => Self::new(schema, table),
            None => Self::new(Self::DEFAULT_SCHEMA, value),
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// SQL form with both parts quoted
    pub fn quoted(&self) -> String {
        format!("\"{}\".\"{}\"", self.schema, self.table)
    }
}

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

impl FromStr for SinkId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SinkId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SinkId> for String {
    fn from(id: SinkId) -> Self {
        id.to_string()
    }
}

/// Semantic type of a sink field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldType {
    /// 32-bit signed integer
    Integer,
    /// Text bounded to `max_len` characters
    Text { max_len: usize },
    /// Calendar date in `YYYY-MM-DD` form
    Date,
}

impl FieldType {
    /// DuckDB column type used when provisioning sinks
    pub fn sql_type(&self) -> String {
        match self {
            FieldType::Integer => "INTEGER".to_string(),
            FieldType::Text { max_len } => format!("VARCHAR({})", max_len),
            FieldType::Date => "DATE".to_string(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Integer => write!(f, "integer"),
            FieldType::Text { max_len } => write!(f, "text({})", max_len),
            FieldType::Date => write!(f, "date"),
        }
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "integer" | "int" => return Ok(FieldType::Integer),
            "date" => return Ok(FieldType::Date),
            _ => {}
        }

        let captures = TEXT_TYPE_REGEX.captures(trimmed).ok_or_else(|| {
            format!(
                "Invalid field type: {}. Expected: integer, text(N), date",
                s
            )
        })?;
        let max_len: usize = captures[1]
            .parse()
            .map_err(|_| format!("Invalid text length in field type: {}", s))?;
        if max_len == 0 {
            return Err(format!("Text length must be positive: {}", s));
        }
        Ok(FieldType::Text { max_len })
    }
}

impl TryFrom<String> for FieldType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldType> for String {
    fn from(ty: FieldType) -> Self {
        ty.to_string()
    }
}

/// One named, typed field of a sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FieldType,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub fn text(name: impl Into<String>, max_len: usize) -> Self {
        Self::new(name, FieldType::Text { max_len })
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Date)
    }
}

/// Ordered field list of a sink
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SinkSchema {
    fields: Vec<FieldSpec>,
}

impl SinkSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Quoted, comma-separated column list for SQL statements
    pub fn column_list(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("\"{}\"", f.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Check field names are valid identifiers and unique
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::new();
        for field in &self.fields {
            if !IDENTIFIER_REGEX.is_match(&field.name) {
                return Err(format!("Invalid field name: {}", field.name));
            }
            if !seen.insert(field.name.to_lowercase()) {
                return Err(format!("Duplicate field name: {}", field.name));
            }
        }
        Ok(())
    }
}

impl From<Vec<FieldSpec>> for SinkSchema {
    fn from(fields: Vec<FieldSpec>) -> Self {
        Self::new(fields)
    }
}

/// How raw records are terminated in a source file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RecordTerminator {
    /// `\n`, also accepting `\r\n`
    #[default]
    Newline,
    /// Any single ASCII byte
    Byte(u8),
}

impl FromStr for RecordTerminator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "\n" | "\r\n" | "\\n" | "\\r\\n" => Ok(RecordTerminator::Newline),
            other if other.len() == 1 && other.is_ascii() => {
                Ok(RecordTerminator::Byte(other.as_bytes()[0]))
            }
            other => Err(format!(
                "Invalid record terminator {:?}: expected a newline or a single ASCII character",
                other
            )),
        }
    }
}

impl TryFrom<String> for RecordTerminator {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RecordTerminator> for String {
    fn from(terminator: RecordTerminator) -> Self {
        match terminator {
            RecordTerminator::Newline => "\n".to_string(),
            RecordTerminator::Byte(b) => (b as char).to_string(),
        }
    }
}

/// Layout of the raw records in a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecordFormat {
    /// Field delimiter (single ASCII character)
    pub delimiter: char,
    /// Record terminator
    pub terminator: RecordTerminator,
    /// Leading rows skipped before the first data record
    pub header_rows: usize,
    /// Honour double-quoted fields; off keeps values verbatim
    pub quoted: bool,
}

impl Default for RecordFormat {
    fn default() -> Self {
        Self {
            delimiter: ',',
            terminator: RecordTerminator::Newline,
            header_rows: 1,
            quoted: false,
        }
    }
}

impl RecordFormat {
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_terminator(mut self, terminator: RecordTerminator) -> Self {
        self.terminator = terminator;
        self
    }

    pub fn with_header_rows(mut self, header_rows: usize) -> Self {
        self.header_rows = header_rows;
        self
    }

    pub fn with_quoted(mut self, quoted: bool) -> Self {
        self.quoted = quoted;
        self
    }

    /// Delimiter as the byte the record reader splits on
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.delimiter.is_ascii() {
            return Err(format!(
                "Delimiter {:?} is not a single ASCII character",
                self.delimiter
            ));
        }
        if matches!(self.delimiter, '\n' | '\r') {
            return Err("Delimiter cannot be a line break".to_string());
        }
        if let RecordTerminator::Byte(b) = self.terminator
            && b == self.delimiter_byte()
        {
            return Err("Delimiter and record terminator must differ".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_id_parse() {
        let id = SinkId::parse("bronze.crm_cust_info").unwrap();
        assert_eq!(id.schema(), "bronze");
        assert_eq!(id.table(), "crm_cust_info");
        assert_eq!(id.quoted(), "\"bronze\".\"crm_cust_info\"");
        assert_eq!(id.to_string(), "bronze.crm_cust_info");

        let bare = SinkId::parse("erp_loc_a101").unwrap();
        assert_eq!(bare.schema(), SinkId::DEFAULT_SCHEMA);
    }

    #[test]
    fn test_sink_id_rejects_injection() {
        assert!(SinkId::parse("bronze.t; DROP TABLE x").is_err());
        assert!(SinkId::parse("a.b.c").is_err());
        assert!(SinkId::parse("").is_err());
    }

    #[test]
    fn test_field_type_from_str() {
        assert_eq!("integer".parse::<FieldType>().unwrap(), FieldType::Integer);
        assert_eq!("INT".parse::<FieldType>().unwrap(), FieldType::Integer);
        assert_eq!("date".parse::<FieldType>().unwrap(), FieldType::Date);
        assert_eq!(
            "text(50)".parse::<FieldType>().unwrap(),
            FieldType::Text { max_len: 50 }
        );
        assert_eq!(
            "NVARCHAR(50)".parse::<FieldType>().unwrap(),
            FieldType::Text { max_len: 50 }
        );
        assert!("text(0)".parse::<FieldType>().is_err());
        assert!("float".parse::<FieldType>().is_err());
    }

    #[test]
    fn test_field_type_sql() {
        assert_eq!(FieldType::Integer.sql_type(), "INTEGER");
        assert_eq!(FieldType::Text { max_len: 50 }.sql_type(), "VARCHAR(50)");
        assert_eq!(FieldType::Date.sql_type(), "DATE");
    }

    #[test]
    fn test_schema_validate_duplicates() {
        let schema = SinkSchema::new(vec![FieldSpec::integer("id"), FieldSpec::text("ID", 10)]);
        assert!(schema.validate().is_err());

        let schema = SinkSchema::new(vec![FieldSpec::integer("id"), FieldSpec::date("dt")]);
        assert!(schema.validate().is_ok());
        assert_eq!(schema.column_list(), "\"id\", \"dt\"");
    }

    #[test]
    fn test_record_format_validate() {
        assert!(RecordFormat::default().validate().is_ok());
        assert!(
            RecordFormat::default()
                .with_delimiter('|')
                .with_terminator(RecordTerminator::Byte(b'|'))
                .validate()
                .is_err()
        );
        assert!(RecordFormat::default().with_delimiter('é').validate().is_err());
    }

    #[test]
    fn test_record_terminator_from_str() {
        assert_eq!(
            "\n".parse::<RecordTerminator>().unwrap(),
            RecordTerminator::Newline
        );
        assert_eq!(
            "\\r\\n".parse::<RecordTerminator>().unwrap(),
            RecordTerminator::Newline
        );
        assert_eq!(
            ";".parse::<RecordTerminator>().unwrap(),
            RecordTerminator::Byte(b';')
        );
        assert!("ab".parse::<RecordTerminator>().is_err());
    }
}
