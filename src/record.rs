// Record module: the two record types the tool keeps (job leads and
// points of contact) and the line codec that turns them into the
// `; `-joined lines stored in the data files.
//
// Field order in `Record::FIELDS` is the on-disk contract. The structs
// give each field a name; the list is only used to serialize, prompt and
// display in a fixed order.

use chrono::Local;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Character separating fields in a stored line. It is never escaped.
pub const DELIMITER: char = ';';

/// What fields are joined with when a record is written.
pub const SEPARATOR: &str = "; ";

/// Placeholder stored for a field the user left empty.
pub const NULL_VALUE: &str = "Null";

/// Today's date as a `YYYYMMDD` string.
pub fn today() -> String {
    Local::now().format("%Y%m%d").to_string()
}

/// The two kinds of record, one per data file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Job,
    Poc,
}

impl RecordKind {
    pub fn label(self) -> &'static str {
        match self {
            RecordKind::Job => "job",
            RecordKind::Poc => "poc",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A stored line could not be mapped onto a record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("expected {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },
    #[error("expected {expected} fields, found {found}")]
    TooManyFields { expected: usize, found: usize },
    #[error("record number {0:?} is not an integer")]
    BadRecordNumber(String),
}

/// A field value that cannot be stored as-is.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("{field}: no semicolons allowed")]
    ContainsDelimiter { field: String },
    #[error("{field}: line breaks are not allowed")]
    ContainsLineBreak { field: String },
    #[error("{field}: leading or trailing spaces are not allowed")]
    SurroundingWhitespace { field: String },
}

/// Check that `value` survives a write/read cycle for `field`.
pub fn check_value(field: &str, value: &str) -> Result<(), FieldError> {
    if value.contains(DELIMITER) {
        return Err(FieldError::ContainsDelimiter { field: field.into() });
    }
    if value.contains(['\n', '\r']) {
        return Err(FieldError::ContainsLineBreak { field: field.into() });
    }
    // Stored pieces are trimmed on read.
    if value != value.trim() {
        return Err(FieldError::SurroundingWhitespace { field: field.into() });
    }
    Ok(())
}

/// Behaviour shared by `Job` and `Poc`: a fixed field list whose first
/// entry is always `record_number`, followed by free-text values.
/// `Default` supplies the values a new record starts from.
pub trait Record: Sized + Default + fmt::Debug + fmt::Display + Serialize {
    const KIND: RecordKind;

    /// Field names in storage order, `record_number` first.
    const FIELDS: &'static [&'static str];

    fn record_number(&self) -> u32;

    /// Text values in `FIELDS[1..]` order.
    fn values(&self) -> Vec<&str>;

    /// Build a record from a number and exactly `FIELDS.len() - 1` values.
    fn from_values(record_number: u32, values: Vec<String>) -> Self;

    fn validate(&self) -> Result<(), FieldError> {
        Self::FIELDS[1..]
            .iter()
            .zip(self.values())
            .try_for_each(|(field, value)| check_value(field, value))
    }
}

/// Serialize a record into its stored line (without a line terminator).
pub fn encode<R: Record>(record: &R) -> String {
    std::iter::once(record.record_number().to_string())
        .chain(record.values().into_iter().map(String::from))
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

/// Parse a stored line into a record.
///
/// Each piece is trimmed. Empty pieces past the expected field count are
/// dropped so lines written with a trailing `; ` still parse.
pub fn decode<R: Record>(line: &str) -> Result<R, CodecError> {
    let expected = R::FIELDS.len();
    let mut parts: Vec<String> = line
        .split(DELIMITER)
        .map(|part| part.trim().to_string())
        .collect();
    while parts.len() > expected && parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }

    let found = parts.len();
    if found < expected {
        return Err(CodecError::TooFewFields { expected, found });
    }
    if found > expected {
        return Err(CodecError::TooManyFields { expected, found });
    }

    let record_number = parse_record_number(&parts[0])?;
    let values = parts.split_off(1);
    Ok(R::from_values(record_number, values))
}

/// Parse the record-number field on its own.
pub fn parse_record_number(raw: &str) -> Result<u32, CodecError> {
    let raw = raw.trim();
    raw.parse()
        .map_err(|_| CodecError::BadRecordNumber(raw.to_string()))
}

/// Record number of a stored line, read from its first field only.
pub fn line_record_number(line: &str) -> Option<u32> {
    line.split(DELIMITER)
        .next()
        .and_then(|first| parse_record_number(first).ok())
}

// One `field: value` line per field, in storage order.
fn write_fields<R: Record>(record: &R, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", R::FIELDS[0], record.record_number())?;
    for (field, value) in R::FIELDS[1..].iter().zip(record.values()) {
        write!(f, "\n{}: {}", field, value)?;
    }
    Ok(())
}

/// A tracked job-application lead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Job {
    pub record_number: u32,
    pub title: String,
    pub active: String,
    pub notes: String,
    pub company: String,
    pub url: String,
    /// Name of a POC. Free text, not checked against the POC file.
    pub poc_name: String,
    pub last_contact: String,
    pub first_contact: String,
}

impl Default for Job {
    fn default() -> Self {
        Job {
            record_number: 0,
            title: NULL_VALUE.into(),
            active: "y".into(),
            notes: NULL_VALUE.into(),
            company: NULL_VALUE.into(),
            url: NULL_VALUE.into(),
            poc_name: NULL_VALUE.into(),
            last_contact: today(),
            first_contact: today(),
        }
    }
}

impl Record for Job {
    const KIND: RecordKind = RecordKind::Job;
    const FIELDS: &'static [&'static str] = &[
        "record_number",
        "title",
        "active",
        "notes",
        "company",
        "url",
        "poc_name",
        "last_contact",
        "first_contact",
    ];

    fn record_number(&self) -> u32 {
        self.record_number
    }

    fn values(&self) -> Vec<&str> {
        vec![
            self.title.as_str(),
            self.active.as_str(),
            self.notes.as_str(),
            self.company.as_str(),
            self.url.as_str(),
            self.poc_name.as_str(),
            self.last_contact.as_str(),
            self.first_contact.as_str(),
        ]
    }

    fn from_values(record_number: u32, values: Vec<String>) -> Self {
        let mut it = values.into_iter();
        let mut next = || it.next().unwrap_or_default();
        Job {
            record_number,
            title: next(),
            active: next(),
            notes: next(),
            company: next(),
            url: next(),
            poc_name: next(),
            last_contact: next(),
            first_contact: next(),
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_fields(self, f)
    }
}

/// A point of contact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Poc {
    pub record_number: u32,
    pub name: String,
    pub company: String,
    pub phone: String,
    pub email: String,
    pub first_contact: String,
    pub last_contact: String,
}

impl Default for Poc {
    fn default() -> Self {
        Poc {
            record_number: 0,
            name: NULL_VALUE.into(),
            company: NULL_VALUE.into(),
            phone: NULL_VALUE.into(),
            email: NULL_VALUE.into(),
            first_contact: today(),
            last_contact: today(),
        }
    }
}

impl Record for Poc {
    const KIND: RecordKind = RecordKind::Poc;
    const FIELDS: &'static [&'static str] = &[
        "record_number",
        "name",
        "company",
        "phone",
        "email",
        "first_contact",
        "last_contact",
    ];

    fn record_number(&self) -> u32 {
        self.record_number
    }

    fn values(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.company.as_str(),
            self.phone.as_str(),
            self.email.as_str(),
            self.first_contact.as_str(),
            self.last_contact.as_str(),
        ]
    }

    fn from_values(record_number: u32, values: Vec<String>) -> Self {
        let mut it = values.into_iter();
        let mut next = || it.next().unwrap_or_default();
        Poc {
            record_number,
            name: next(),
            company: next(),
            phone: next(),
            email: next(),
            first_contact: next(),
            last_contact: next(),
        }
    }
}

impl fmt::Display for Poc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_fields(self, f)
    }
}
