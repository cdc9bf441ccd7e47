//! Схема записи: упорядоченный список полей плюс метаданные раскладки.
//!
//! [`RecordSchema`] строится один раз — явно или через
//! [`SchemaBuilder`] — и дальше используется неизменяемой всеми
//! проходами чтения/записи одного движка. Все инварианты проверяются
//! в конструкторе и поднимаются как [`SchemaError`].

pub mod builder;
mod field;

pub use builder::SchemaBuilder;
pub use field::{CustomConverter, FieldDescriptor, FieldKind, Trim, Value};

use crate::error::SchemaError;

/// Стратегия разбиения строки на подстроки полей.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// Поля разделены символом-разделителем, значения могут быть в кавычках.
    Delimited {
        /// Разделитель полей (одиночный ASCII-символ).
        delimiter: char,
    },
    /// Поля занимают фиксированные ширины в символах.
    FixedWidth,
}

impl Layout {
    /// Разделитель, если раскладка delimited.
    #[must_use]
    pub fn delimiter(&self) -> Option<char> {
        match self {
            Self::Delimited { delimiter } => Some(*delimiter),
            Self::FixedWidth => None,
        }
    }
}

/// Политика обработки лишних полей в конце записи.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingFields {
    /// Лишние поля игнорируются (по умолчанию для delimited).
    #[default]
    Ignore,
    /// Лишние поля — ошибка конвертации записи.
    Error,
}

/// Схема записи: поля, раскладка, счётчики header/footer строк.
///
/// # Инварианты
///
/// - имена полей уникальны, полей хотя бы одно;
/// - для [`Layout::FixedWidth`] у каждого поля объявлена ширина;
/// - разделитель [`Layout::Delimited`] — одиночный ASCII-символ.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    record_name: String,
    fields: Vec<FieldDescriptor>,
    layout: Layout,
    header_lines: usize,
    footer_lines: usize,
    trailing_fields: TrailingFields,
    ignore_empty_lines: bool,
}

impl RecordSchema {
    /// Строит схему, проверяя все инварианты.
    ///
    /// `record_name` — имя типа записи для диагностики (аналог имени
    /// класса записи в декларативных схемах).
    pub fn new(
        record_name: impl Into<String>,
        layout: Layout,
        fields: Vec<FieldDescriptor>,
    ) -> Result<Self, SchemaError> {
        if fields.is_empty() {
            return Err(SchemaError::NoFields);
        }
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
        }
        match layout {
            Layout::Delimited { delimiter } => {
                if !delimiter.is_ascii() {
                    return Err(SchemaError::InvalidDelimiter(delimiter));
                }
            }
            Layout::FixedWidth => {
                if let Some(field) = fields.iter().find(|f| f.width.is_none()) {
                    return Err(SchemaError::MissingWidth(field.name.clone()));
                }
            }
        }

        let trailing_fields = match layout {
            Layout::Delimited { .. } => TrailingFields::Ignore,
            Layout::FixedWidth => TrailingFields::Error,
        };

        Ok(Self {
            record_name: record_name.into(),
            fields,
            layout,
            header_lines: 0,
            footer_lines: 0,
            trailing_fields,
            ignore_empty_lines: false,
        })
    }

    /// Delimited-схема с разделителем `delimiter`.
    pub fn delimited(
        record_name: impl Into<String>,
        delimiter: char,
        fields: Vec<FieldDescriptor>,
    ) -> Result<Self, SchemaError> {
        Self::new(record_name, Layout::Delimited { delimiter }, fields)
    }

    /// Fixed-width схема; у каждого поля должна быть ширина.
    pub fn fixed_width(
        record_name: impl Into<String>,
        fields: Vec<FieldDescriptor>,
    ) -> Result<Self, SchemaError> {
        Self::new(record_name, Layout::FixedWidth, fields)
    }

    /// Задаёт число header-строк (исключаются из декодирования,
    /// захватываются дословно).
    #[must_use]
    pub fn with_header_lines(mut self, count: usize) -> Self {
        self.header_lines = count;
        self
    }

    /// Задаёт число footer-строк.
    #[must_use]
    pub fn with_footer_lines(mut self, count: usize) -> Self {
        self.footer_lines = count;
        self
    }

    /// Переопределяет политику лишних полей.
    #[must_use]
    pub fn with_trailing_fields(mut self, policy: TrailingFields) -> Self {
        self.trailing_fields = policy;
        self
    }

    /// Пустые строки между записями пропускаются, а не считаются
    /// ошибкой конвертации.
    #[must_use]
    pub fn with_ignore_empty_lines(mut self, ignore: bool) -> Self {
        self.ignore_empty_lines = ignore;
        self
    }

    /// Имя типа записи.
    #[must_use]
    pub fn record_name(&self) -> &str {
        &self.record_name
    }

    /// Поля в позиционном порядке.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Число полей.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Позиция поля по имени.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Раскладка схемы.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Число header-строк.
    #[must_use]
    pub fn header_lines(&self) -> usize {
        self.header_lines
    }

    /// Число footer-строк.
    #[must_use]
    pub fn footer_lines(&self) -> usize {
        self.footer_lines
    }

    /// Политика лишних полей.
    #[must_use]
    pub fn trailing_fields(&self) -> TrailingFields {
        self.trailing_fields
    }

    /// Пропускать ли пустые строки.
    #[must_use]
    pub fn ignore_empty_lines(&self) -> bool {
        self.ignore_empty_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_text_fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::text("id"),
            FieldDescriptor::text("name"),
            FieldDescriptor::text("amount"),
        ]
    }

    #[test]
    fn delimited_schema_builds() {
        let schema = RecordSchema::delimited("Customer", ',', three_text_fields()).unwrap();
        assert_eq!(schema.field_count(), 3);
        assert_eq!(schema.layout().delimiter(), Some(','));
        assert_eq!(schema.index_of("name"), Some(1));
        assert_eq!(schema.index_of("missing"), None);
        assert_eq!(schema.trailing_fields(), TrailingFields::Ignore);
    }

    #[test]
    fn duplicate_field_names_fail() {
        let fields = vec![FieldDescriptor::text("id"), FieldDescriptor::text("id")];
        let err = RecordSchema::delimited("Customer", ',', fields).unwrap_err();
        assert_eq!(err, SchemaError::DuplicateField("id".to_string()));
    }

    #[test]
    fn empty_field_list_fails() {
        let err = RecordSchema::delimited("Customer", ',', vec![]).unwrap_err();
        assert_eq!(err, SchemaError::NoFields);
    }

    #[test]
    fn fixed_width_requires_widths() {
        let fields = vec![
            FieldDescriptor::text("id").with_width(4),
            FieldDescriptor::text("name"), // ширина не задана
        ];
        let err = RecordSchema::fixed_width("Customer", fields).unwrap_err();
        assert_eq!(err, SchemaError::MissingWidth("name".to_string()));
    }

    #[test]
    fn fixed_width_defaults_to_trailing_error() {
        let fields = vec![FieldDescriptor::text("id").with_width(4)];
        let schema = RecordSchema::fixed_width("Customer", fields).unwrap();
        assert_eq!(schema.trailing_fields(), TrailingFields::Error);
    }

    #[test]
    fn non_ascii_delimiter_fails() {
        let err = RecordSchema::delimited("Customer", '§', three_text_fields()).unwrap_err();
        assert_eq!(err, SchemaError::InvalidDelimiter('§'));
    }

    #[test]
    fn header_and_footer_counts_are_settable() {
        let schema = RecordSchema::delimited("Customer", ',', three_text_fields())
            .unwrap()
            .with_header_lines(1)
            .with_footer_lines(2);
        assert_eq!(schema.header_lines(), 1);
        assert_eq!(schema.footer_lines(), 2);
    }
}
