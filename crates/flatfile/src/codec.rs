//! Record codec: one raw line ↔ one typed record, per the schema's layout.
//!
//! Delimited splitting and joining go through the `csv` crate, so quoting,
//! `""` escapes, embedded delimiters and embedded newlines follow RFC 4180.
//! Fixed-width slicing is character-based.
//!
//! Decode produces an explicit three-state result per record: a record, a
//! skip (ignorable blank line), or a `ConversionError` — the only error
//! kind the engine's error mode is allowed to absorb.

use std::io::Read;

use crate::cursor::LineCursor;
use crate::error::{ConversionError, Error, Result};
use crate::record::Record;
use crate::schema::{Layout, RecordSchema, TrailingFields, Value};

/// Outcome of decoding one line against the schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// The line decoded into a record.
    Record(Record),
    /// The line is ignorable (blank, with `ignore_empty_lines` set).
    Skip,
}

/// Decodes the record under `cursor` against `schema`.
///
/// A conversion failure on any field aborts the whole record: no partially
/// populated records are ever produced.
pub fn decode_line<R: Read>(
    cursor: &mut LineCursor<'_, R>,
    schema: &RecordSchema,
) -> Result<Decoded> {
    if schema.ignore_empty_lines() && cursor.text().trim().is_empty() {
        return Ok(Decoded::Skip);
    }

    match schema.layout() {
        Layout::Delimited { delimiter } => decode_delimited(cursor, schema, *delimiter),
        Layout::FixedWidth => decode_fixed(cursor, schema),
    }
}

fn decode_delimited<R: Read>(
    cursor: &mut LineCursor<'_, R>,
    schema: &RecordSchema,
    delimiter: char,
) -> Result<Decoded> {
    // A quoted field may span lines: keep pulling until quotes balance.
    while has_open_quote(cursor.text(), delimiter) {
        if !cursor.pull_continuation()? {
            return Err(ConversionError::new(
                first_field_name(schema),
                cursor.text(),
                cursor.line_number(),
                "unterminated quoted field",
            )
            .into());
        }
    }

    let cells = split_line(cursor.text(), delimiter).map_err(|msg| {
        ConversionError::new(first_field_name(schema), cursor.text(), cursor.line_number(), msg)
    })?;

    let declared = schema.field_count();
    if cells.len() < declared {
        let missing = &schema.fields()[cells.len()].name;
        return Err(ConversionError::new(
            missing.clone(),
            cursor.text(),
            cursor.line_number(),
            format!("record has {} fields, schema declares {declared}", cells.len()),
        )
        .into());
    }
    if cells.len() > declared && schema.trailing_fields() == TrailingFields::Error {
        return Err(ConversionError::new(
            first_field_name(schema),
            cursor.text(),
            cursor.line_number(),
            format!("record has {} fields, schema declares {declared}", cells.len()),
        )
        .into());
    }

    let mut values = Vec::with_capacity(declared);
    for (field, cell) in schema.fields().iter().zip(&cells) {
        let value = field.decode_field(cell).map_err(|msg| {
            ConversionError::new(field.name.clone(), cell.clone(), cursor.line_number(), msg)
        })?;
        values.push(value);
    }
    Ok(Decoded::Record(Record::new(values)))
}

fn decode_fixed<R: Read>(
    cursor: &mut LineCursor<'_, R>,
    schema: &RecordSchema,
) -> Result<Decoded> {
    let line_number = cursor.line_number();
    let raw_record = cursor.text().to_string();
    let mut values = Vec::with_capacity(schema.field_count());

    for field in schema.fields() {
        // Схема гарантирует наличие ширины для fixed-width.
        let width = field.width.unwrap_or_default();
        let Some(slice) = cursor.take_chars(width) else {
            return Err(ConversionError::new(
                field.name.clone(),
                raw_record,
                line_number,
                format!("line too short: field '{}' needs {width} more chars", field.name),
            )
            .into());
        };
        let value = field
            .decode_field(slice)
            .map_err(|msg| ConversionError::new(field.name.clone(), slice, line_number, msg))?;
        values.push(value);
    }

    if !cursor.is_exhausted() && schema.trailing_fields() == TrailingFields::Error {
        let extra = cursor.remaining().chars().count();
        return Err(ConversionError::new(
            first_field_name(schema),
            raw_record,
            line_number,
            format!("{extra} trailing chars past the declared widths"),
        )
        .into());
    }
    Ok(Decoded::Record(Record::new(values)))
}

/// Encodes `record` into one output line (no terminator).
///
/// Arity mismatch is a caller contract violation (`Error::Usage`); a field
/// that fails to encode is a `ConversionError` subject to the error mode.
pub fn encode_line(record: &Record, schema: &RecordSchema, line_number: usize) -> Result<String> {
    if record.len() != schema.field_count() {
        return Err(Error::Usage(format!(
            "engine for '{}' works with records of {} fields, got {}",
            schema.record_name(),
            schema.field_count(),
            record.len()
        )));
    }

    let mut fragments = Vec::with_capacity(record.len());
    for (field, value) in schema.fields().iter().zip(record.values()) {
        let fragment = field.encode_field(value).map_err(|msg| {
            ConversionError::new(field.name.clone(), display_value(value), line_number, msg)
        })?;
        fragments.push(fragment);
    }

    match schema.layout() {
        Layout::Delimited { delimiter } => join_delimited(&fragments, *delimiter)
            .map_err(|msg| {
                ConversionError::new(first_field_name(schema), "", line_number, msg).into()
            }),
        Layout::FixedWidth => {
            let mut line = String::new();
            for (field, fragment) in schema.fields().iter().zip(&fragments) {
                let width = field.width.unwrap_or_default();
                line.push_str(&pad_to_width(fragment, width));
            }
            Ok(line)
        }
    }
}

/// Splits one record's text into field substrings via the `csv` crate.
///
/// Empty input yields an empty vector (no record on the line).
pub(crate) fn split_line(text: &str, delimiter: char) -> std::result::Result<Vec<String>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut record = csv::StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => Ok(record.iter().map(str::to_string).collect()),
        Ok(false) => Ok(Vec::new()),
        Err(e) => Err(format!("malformed delimited record: {e}")),
    }
}

fn join_delimited(fragments: &[String], delimiter: char) -> std::result::Result<String, String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter as u8)
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(fragments).map_err(|e| e.to_string())?;
    let bytes = writer.into_inner().map_err(|e| e.to_string())?;
    let mut line = String::from_utf8(bytes).map_err(|e| e.to_string())?;
    if line.ends_with('\n') {
        line.pop();
    }
    Ok(line)
}

/// Scans the text with csv quoting rules; `true` when it ends inside an
/// unterminated quoted field.
fn has_open_quote(text: &str, delimiter: char) -> bool {
    let mut in_quotes = false;
    let mut at_field_start = true;
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next(); // escaped quote
                } else {
                    in_quotes = false;
                    at_field_start = false;
                }
            }
        } else if at_field_start && ch == '"' {
            in_quotes = true;
        } else {
            at_field_start = ch == delimiter;
        }
    }
    in_quotes
}

fn pad_to_width(fragment: &str, width: usize) -> String {
    let count = fragment.chars().count();
    if count > width {
        fragment.chars().take(width).collect()
    } else {
        let mut s = String::with_capacity(width);
        s.push_str(fragment);
        s.extend(std::iter::repeat_n(' ', width - count));
        s
    }
}

fn first_field_name(schema: &RecordSchema) -> String {
    schema.fields().first().map(|f| f.name.clone()).unwrap_or_default()
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        Value::Integer(n) => n.to_string(),
        Value::Decimal(x) => x.to_string(),
        Value::Date(d) => d.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::reader::ForwardReader;
    use crate::schema::{FieldDescriptor, FieldKind, Trim};

    fn forward(text: &str) -> ForwardReader<Cursor<Vec<u8>>> {
        let mut r = ForwardReader::new(Cursor::new(text.as_bytes().to_vec()));
        r.set_discard_forward(true);
        r
    }

    fn delimited_schema() -> RecordSchema {
        RecordSchema::delimited(
            "Invoice",
            ',',
            vec![
                FieldDescriptor::text("id"),
                FieldDescriptor::text("name"),
                FieldDescriptor::new("amount", FieldKind::Integer),
            ],
        )
        .unwrap()
    }

    fn fixed_schema() -> RecordSchema {
        RecordSchema::fixed_width(
            "Employee",
            vec![
                FieldDescriptor::text("last").with_width(8).with_trim(Trim::Right),
                FieldDescriptor::new("salary", FieldKind::Integer).with_width(6).with_trim(Trim::Both),
            ],
        )
        .unwrap()
    }

    fn decode_one(schema: &RecordSchema, text: &str) -> Result<Decoded> {
        let mut reader = forward("");
        let mut cursor = LineCursor::new(text.to_string(), &mut reader);
        decode_line(&mut cursor, schema)
    }

    fn expect_record(res: Result<Decoded>) -> Record {
        match res.unwrap() {
            Decoded::Record(rec) => rec,
            Decoded::Skip => panic!("expected a record, got Skip"),
        }
    }

    // ==================== Delimited decode ====================

    #[test]
    fn delimited_decode_simple() {
        let rec = expect_record(decode_one(&delimited_schema(), "7,Alice,1200"));
        assert_eq!(rec[0], Value::Text("7".to_string()));
        assert_eq!(rec[1], Value::Text("Alice".to_string()));
        assert_eq!(rec[2], Value::Integer(1200));
    }

    #[test]
    fn delimited_decode_quoted_delimiter_and_escaped_quote() {
        let rec = expect_record(decode_one(&delimited_schema(), r#"7,"Smith, ""Bob""",3"#));
        assert_eq!(rec[1], Value::Text(r#"Smith, "Bob""#.to_string()));
    }

    #[test]
    fn delimited_missing_field_fails() {
        let err = decode_one(&delimited_schema(), "4,5").unwrap_err();
        match err {
            Error::Conversion(e) => {
                assert_eq!(e.field, "amount");
                assert_eq!(e.raw, "4,5");
                assert!(e.message.contains("2 fields"));
            }
            other => panic!("expected Conversion, got {other:?}"),
        }
    }

    #[test]
    fn delimited_trailing_fields_ignored_by_default() {
        let rec = expect_record(decode_one(&delimited_schema(), "7,Alice,1,extra,extra2"));
        assert_eq!(rec.len(), 3);
    }

    #[test]
    fn delimited_trailing_fields_error_when_strict() {
        let schema = delimited_schema().with_trailing_fields(TrailingFields::Error);
        let err = decode_one(&schema, "7,Alice,1,extra").unwrap_err();
        assert!(matches!(err, Error::Conversion(_)));
    }

    #[test]
    fn delimited_bad_typed_field_carries_cell_text() {
        let err = decode_one(&delimited_schema(), "7,Alice,not-a-number").unwrap_err();
        match err {
            Error::Conversion(e) => {
                assert_eq!(e.field, "amount");
                assert_eq!(e.raw, "not-a-number");
            }
            other => panic!("expected Conversion, got {other:?}"),
        }
    }

    #[test]
    fn empty_line_is_an_error_unless_ignorable() {
        let err = decode_one(&delimited_schema(), "").unwrap_err();
        assert!(matches!(err, Error::Conversion(_)));

        let schema = delimited_schema().with_ignore_empty_lines(true);
        assert_eq!(decode_one(&schema, "  ").unwrap(), Decoded::Skip);
    }

    #[test]
    fn quoted_field_spanning_lines_pulls_continuation() {
        let mut reader = forward("continued\",9\n");
        let mut cursor = LineCursor::new("1,\"line one".to_string(), &mut reader);
        let rec = match decode_line(&mut cursor, &delimited_schema()).unwrap() {
            Decoded::Record(rec) => rec,
            Decoded::Skip => panic!("expected record"),
        };
        assert_eq!(rec[1], Value::Text("line one\ncontinued".to_string()));
        assert_eq!(rec[2], Value::Integer(9));
    }

    #[test]
    fn unterminated_quote_at_eof_fails() {
        let mut reader = forward("");
        let mut cursor = LineCursor::new("1,\"never closed".to_string(), &mut reader);
        let err = decode_line(&mut cursor, &delimited_schema()).unwrap_err();
        match err {
            Error::Conversion(e) => assert!(e.message.contains("unterminated")),
            other => panic!("expected Conversion, got {other:?}"),
        }
    }

    // ==================== Fixed-width decode ====================

    #[test]
    fn fixed_decode_slices_and_trims() {
        let rec = expect_record(decode_one(&fixed_schema(), "SMITH     1200"));
        assert_eq!(rec[0], Value::Text("SMITH".to_string()));
        assert_eq!(rec[1], Value::Integer(1200));
    }

    #[test]
    fn fixed_short_line_fails() {
        let err = decode_one(&fixed_schema(), "SMITH").unwrap_err();
        match err {
            Error::Conversion(e) => {
                assert_eq!(e.field, "last");
                assert!(e.message.contains("too short"));
            }
            other => panic!("expected Conversion, got {other:?}"),
        }
    }

    #[test]
    fn fixed_trailing_chars_fail_by_default() {
        let err = decode_one(&fixed_schema(), "SMITH     1200EXTRA").unwrap_err();
        assert!(matches!(err, Error::Conversion(_)));
    }

    #[test]
    fn fixed_trailing_chars_ignorable_when_relaxed() {
        let schema = fixed_schema().with_trailing_fields(TrailingFields::Ignore);
        let rec = expect_record(decode_one(&schema, "SMITH     1200EXTRA"));
        assert_eq!(rec.len(), 2);
        assert_eq!(rec[1], Value::Integer(1200));
    }

    // ==================== Encode ====================

    #[test]
    fn delimited_encode_quotes_only_when_necessary() {
        let schema = delimited_schema();
        let rec = Record::new(vec![
            Value::Text("7".to_string()),
            Value::Text("Smith, Bob".to_string()),
            Value::Integer(3),
        ]);
        assert_eq!(encode_line(&rec, &schema, 1).unwrap(), r#"7,"Smith, Bob",3"#);
    }

    #[test]
    fn fixed_encode_pads_and_truncates() {
        let schema = fixed_schema();
        let rec = Record::new(vec![
            Value::Text("VERYLONGNAME".to_string()),
            Value::Integer(42),
        ]);
        assert_eq!(encode_line(&rec, &schema, 1).unwrap(), "VERYLONG42    ");
    }

    #[test]
    fn encode_arity_mismatch_is_usage_error() {
        let schema = delimited_schema();
        let rec = Record::new(vec![Value::Text("only".to_string())]);
        let err = encode_line(&rec, &schema, 1).unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
    }

    #[test]
    fn encode_wrong_value_kind_is_conversion_error() {
        let schema = delimited_schema();
        let rec = Record::new(vec![
            Value::Text("7".to_string()),
            Value::Text("Alice".to_string()),
            Value::Text("not-int".to_string()), // схема требует integer
        ]);
        let err = encode_line(&rec, &schema, 1).unwrap_err();
        assert!(matches!(err, Error::Conversion(_)));
    }

    // ==================== Вспомогательные ====================

    #[test]
    fn open_quote_detection() {
        assert!(has_open_quote("1,\"abc", ','));
        assert!(!has_open_quote("1,\"abc\"", ','));
        assert!(!has_open_quote("1,\"ab\"\"c\"", ','));
        // quote in the middle of an unquoted field is not special
        assert!(!has_open_quote("1,ab\"c,3", ','));
    }

    #[test]
    fn split_line_empty_input_gives_no_cells() {
        assert_eq!(split_line("", ',').unwrap(), Vec::<String>::new());
    }
}
