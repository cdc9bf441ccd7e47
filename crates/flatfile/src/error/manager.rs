//! Режим обработки ошибок и журнал ошибок прохода.
//!
//! [`ErrorManager`] хранит настроенный [`ErrorMode`] и — в режиме
//! накопления — журнал [`ErrorRecord`] по каждой упавшей записи.
//! Структурные ошибки (схема, контракт вызова, I/O) сюда не попадают:
//! менеджер управляет только ошибками конвертации отдельных записей.

use serde::{Deserialize, Serialize};

use super::{ConversionError, Error, Result};

/// Политика обработки ошибки конвертации одной записи.
///
/// Задаётся один раз на экземпляр движка до начала работы.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ErrorMode {
    /// Первая же ошибка поднимается вызывающей стороне, проход обрывается.
    #[default]
    ThrowException,
    /// Ошибка отбрасывается молча, движок переходит к следующей строке.
    IgnoreAndContinue,
    /// Ошибка записывается в журнал, движок переходит к следующей строке.
    SaveAndContinue,
}

/// Одна запись журнала ошибок: где и почему упала конвертация.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    /// Номер строки во входном потоке (1-based).
    pub line_number: usize,
    /// Исходный текст записи.
    pub record_text: String,
    /// Человекочитаемое описание ошибки.
    pub message: String,
}

/// Менеджер ошибок: режим + накопленный журнал.
///
/// Журнал очищается в начале каждого нового прохода чтения/записи
/// (это делает движок) либо явно через [`ErrorManager::clear`].
#[derive(Debug, Default)]
pub struct ErrorManager {
    mode: ErrorMode,
    errors: Vec<ErrorRecord>,
}

impl ErrorManager {
    /// Создаёт менеджер с режимом по умолчанию ([`ErrorMode::ThrowException`]).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Создаёт менеджер с заданным режимом.
    #[must_use]
    pub fn with_mode(mode: ErrorMode) -> Self {
        Self { mode, errors: Vec::new() }
    }

    /// Текущий режим обработки ошибок.
    #[must_use]
    pub fn mode(&self) -> ErrorMode {
        self.mode
    }

    /// Меняет режим обработки ошибок.
    pub fn set_mode(&mut self, mode: ErrorMode) {
        self.mode = mode;
    }

    /// Применяет политику режима к ошибке конвертации.
    ///
    /// - `ThrowException` — возвращает `Err`, проход должен оборваться;
    /// - `IgnoreAndContinue` — возвращает `Ok(())`, ошибка забыта;
    /// - `SaveAndContinue` — добавляет [`ErrorRecord`] в журнал и
    ///   возвращает `Ok(())`.
    ///
    /// `record_text` — полный исходный текст записи (может отличаться от
    /// `err.raw`, если ошибка указывает на фрагмент поля).
    pub fn handle(&mut self, err: ConversionError, record_text: &str) -> Result<()> {
        match self.mode {
            ErrorMode::ThrowException => Err(Error::Conversion(err)),
            ErrorMode::IgnoreAndContinue => Ok(()),
            ErrorMode::SaveAndContinue => {
                self.errors.push(ErrorRecord {
                    line_number: err.line,
                    record_text: record_text.to_string(),
                    message: err.to_string(),
                });
                Ok(())
            }
        }
    }

    /// Накопленный журнал ошибок (read-only снимок).
    #[must_use]
    pub fn errors(&self) -> &[ErrorRecord] {
        &self.errors
    }

    /// Есть ли ошибки в журнале.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Количество ошибок в журнале.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Очищает журнал ошибок. Режим не меняется.
    pub fn clear(&mut self) {
        self.errors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_error() -> ConversionError {
        ConversionError::new("name", "4,5", 3, "record has 2 fields, schema declares 3")
    }

    #[test]
    fn throw_mode_returns_the_error() {
        let mut mgr = ErrorManager::new();
        assert_eq!(mgr.mode(), ErrorMode::ThrowException);

        let res = mgr.handle(sample_error(), "4,5");
        assert!(matches!(res, Err(Error::Conversion(_))));
        assert!(!mgr.has_errors());
    }

    #[test]
    fn ignore_mode_discards_silently() {
        let mut mgr = ErrorManager::with_mode(ErrorMode::IgnoreAndContinue);

        mgr.handle(sample_error(), "4,5").unwrap();
        assert!(!mgr.has_errors());
        assert_eq!(mgr.error_count(), 0);
    }

    #[test]
    fn save_mode_accumulates_records() {
        let mut mgr = ErrorManager::with_mode(ErrorMode::SaveAndContinue);

        mgr.handle(sample_error(), "4,5").unwrap();
        mgr.handle(sample_error(), "4,5").unwrap();

        assert_eq!(mgr.error_count(), 2);
        assert_eq!(mgr.errors()[0].line_number, 3);
        assert_eq!(mgr.errors()[0].record_text, "4,5");
        assert!(mgr.errors()[0].message.contains("2 fields"));
    }

    #[test]
    fn clear_empties_the_log_but_keeps_the_mode() {
        let mut mgr = ErrorManager::with_mode(ErrorMode::SaveAndContinue);
        mgr.handle(sample_error(), "4,5").unwrap();

        mgr.clear();
        assert!(!mgr.has_errors());
        assert_eq!(mgr.mode(), ErrorMode::SaveAndContinue);
    }
}
