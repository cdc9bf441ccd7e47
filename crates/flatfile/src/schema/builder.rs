//! Schema inference: build a [`RecordSchema`] without a predeclared record
//! type, from a sample header line, a sample file, or an explicit field count.
//!
//! All inferred fields are text-typed; callers wanting typed fields declare
//! the schema explicitly. Header-line count defaults to 1 when inferring
//! from a sample (the sample *is* the header) and to 0 when only a field
//! count is given.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::codec::split_line;
use crate::error::{Error, Result, SchemaError};

use super::{FieldDescriptor, RecordSchema};

/// Default prefix for generated field names.
pub const DEFAULT_FIELD_PREFIX: &str = "Field_";

/// Builder producing a [`RecordSchema`] for delimited files.
///
/// # Example
///
/// ```
/// use flatfile::schema::SchemaBuilder;
///
/// let schema = SchemaBuilder::new("Invoice", ',')
///     .from_sample_line("id,name,amount")
///     .unwrap();
/// assert_eq!(schema.field_count(), 3);
/// assert_eq!(schema.header_lines(), 1);
/// assert_eq!(schema.index_of("amount"), Some(2));
/// ```
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    record_name: String,
    delimiter: char,
    header_delimiter: Option<char>,
    header_lines: Option<usize>,
    field_prefix: String,
}

impl SchemaBuilder {
    /// Creates a builder for records named `record_name`, split on `delimiter`.
    #[must_use]
    pub fn new(record_name: impl Into<String>, delimiter: char) -> Self {
        Self {
            record_name: record_name.into(),
            delimiter,
            header_delimiter: None,
            header_lines: None,
            field_prefix: DEFAULT_FIELD_PREFIX.to_string(),
        }
    }

    /// Delimiter used for the header line only. Defaults to the record
    /// delimiter.
    #[must_use]
    pub fn header_delimiter(mut self, delimiter: char) -> Self {
        self.header_delimiter = Some(delimiter);
        self
    }

    /// Overrides the header-line count of the produced schema.
    #[must_use]
    pub fn header_lines(mut self, count: usize) -> Self {
        self.header_lines = Some(count);
        self
    }

    /// Prefix for generated field names (blank header cells, field-count
    /// mode). Defaults to [`DEFAULT_FIELD_PREFIX`].
    #[must_use]
    pub fn field_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.field_prefix = prefix.into();
        self
    }

    /// Builds a schema from a sample header line.
    ///
    /// The sample is split on the header delimiter; each cell becomes a
    /// text field named after its (trimmed) content, blank cells fall back
    /// to `prefix + 1-based index`. Header-line count defaults to 1.
    pub fn from_sample_line(&self, sample: &str) -> Result<RecordSchema> {
        let header_delim = self.header_delimiter.unwrap_or(self.delimiter);
        if !header_delim.is_ascii() {
            return Err(SchemaError::InvalidDelimiter(header_delim).into());
        }

        let cells = split_line(sample, header_delim)
            .map_err(|_| Error::Schema(SchemaError::EmptySample))?;
        if cells.is_empty() || cells.iter().all(|c| c.trim().is_empty()) {
            return Err(SchemaError::EmptySample.into());
        }

        let fields = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let name = cell.trim();
                if name.is_empty() {
                    FieldDescriptor::text(format!("{}{}", self.field_prefix, i + 1))
                } else {
                    FieldDescriptor::text(name)
                }
            })
            .collect();

        let schema = RecordSchema::delimited(&self.record_name, self.delimiter, fields)?
            .with_header_lines(self.header_lines.unwrap_or(1));
        Ok(schema)
    }

    /// Builds a schema from the first line of a sample file.
    pub fn from_sample_file(&self, path: impl AsRef<Path>) -> Result<RecordSchema> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut first_line = String::new();
        reader.read_line(&mut first_line)?;
        let trimmed = first_line.trim_end_matches(['\r', '\n']);
        self.from_sample_line(trimmed)
    }

    /// Builds a schema with `count` generated text fields
    /// (`prefix + 1-based index`). Header-line count defaults to 0.
    pub fn with_field_count(&self, count: usize) -> Result<RecordSchema> {
        if count == 0 {
            return Err(SchemaError::NoFields.into());
        }
        let fields = (1..=count)
            .map(|i| FieldDescriptor::text(format!("{}{}", self.field_prefix, i)))
            .collect();
        let schema = RecordSchema::delimited(&self.record_name, self.delimiter, fields)?
            .with_header_lines(self.header_lines.unwrap_or(0));
        Ok(schema)
    }
}
