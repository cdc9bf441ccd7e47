//! Модуль ошибок движка flat-файлов.
//!
//! Таксономия трёхуровневая:
//!
//! - [`SchemaError`] — некорректное объявление или вывод схемы. Всегда
//!   фатальна на этапе построения схемы, режим ошибок на неё не влияет.
//! - [`Error::Usage`] — нарушение контракта вызывающей стороной. Всегда
//!   поднимается немедленно, независимо от режима ошибок.
//! - [`ConversionError`] — одна запись не сконвертировалась по схеме.
//!   Единственный вид ошибки, которым управляет [`ErrorMode`].
//!
//! I/O ошибки пробрасываются без переинтерпретации через [`Error::Io`].
//!
//! [`ErrorMode`]: crate::error::manager::ErrorMode

pub mod manager;

use thiserror::Error;

pub use manager::{ErrorManager, ErrorMode, ErrorRecord};

/// Главная ошибка движка.
#[derive(Debug, Error)]
pub enum Error {
    /// Ошибка ввода/вывода нижележащего потока.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Некорректная схема (структурная ошибка, не ошибка данных).
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Нарушение контракта вызывающей стороной.
    #[error("bad usage: {0}")]
    Usage(String),

    /// Ошибка конвертации одной записи.
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Удобный alias для Result с [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Ошибки объявления или вывода схемы.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Схема не содержит ни одного поля.
    #[error("schema must declare at least one field")]
    NoFields,

    /// Имя поля встречается в схеме более одного раза.
    #[error("duplicate field name '{0}'")]
    DuplicateField(String),

    /// Для fixed-width раскладки у поля не объявлена ширина.
    #[error("field '{0}' has no declared width for fixed-width layout")]
    MissingWidth(String),

    /// Разделитель не является одиночным ASCII-символом.
    ///
    /// Сплиттер работает по байту, поэтому многобайтовые разделители
    /// отклоняются при построении схемы, а не портят данные молча.
    #[error("delimiter {0:?} is not a single-byte ASCII character")]
    InvalidDelimiter(char),

    /// Из строки-образца не удалось извлечь ни одной колонки.
    #[error("sample line yields no usable columns")]
    EmptySample,
}

/// Ошибка конвертации одной записи: текст не разобрался по схеме
/// либо значение не закодировалось обратно в текст.
///
/// Несёт имя поля, исходный текст и номер строки — достаточно для
/// построения отчёта без доступа к исходному файлу.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: field '{field}': {message} (raw: {raw:?})")]
pub struct ConversionError {
    /// Имя поля, на котором упала конвертация.
    pub field: String,
    /// Исходный текст записи (или фрагмента поля).
    pub raw: String,
    /// Номер строки во входном потоке (1-based).
    pub line: usize,
    /// Описание причины.
    pub message: String,
}

impl ConversionError {
    /// Создаёт ошибку конвертации для поля `field` на строке `line`.
    pub fn new(
        field: impl Into<String>,
        raw: impl Into<String>,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        Self { field: field.into(), raw: raw.into(), line, message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_error_display_mentions_line_and_field() {
        let err = ConversionError::new("amount", "abc", 7, "invalid integer");
        let text = err.to_string();
        assert!(text.contains("line 7"));
        assert!(text.contains("'amount'"));
        assert!(text.contains("invalid integer"));
    }

    #[test]
    fn schema_error_converts_into_engine_error() {
        let err: Error = SchemaError::DuplicateField("id".to_string()).into();
        assert!(matches!(err, Error::Schema(SchemaError::DuplicateField(_))));
    }

    #[test]
    fn io_error_passes_through_unchanged() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io.into();
        match err {
            Error::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::PermissionDenied),
            other => panic!("expected Io, got {other:?}"),
        }
    }
}
