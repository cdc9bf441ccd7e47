//! Движок: полный проход чтения или записи по потоку, строке или файлу.
//!
//! [`RecordEngine`] связывает [`ForwardReader`], кодек и [`ErrorManager`]:
//! тянет строки, декодирует их в записи, применяет политику режима
//! ошибок к упавшим записям и накапливает успешные. Путь записи —
//! зеркальный: заголовок дословно, записи через кодек, footer дословно.
//!
//! Один экземпляр движка — один проход за раз: все методы прохода
//! берут `&mut self`, состояние прохода ([`RunState`]) создаётся заново
//! на каждый вызов. Несколько движков над копиями одной схемы могут
//! работать параллельно без координации.
//!
//! # Пример
//!
//! ```
//! use flatfile::prelude::*;
//!
//! let schema = SchemaBuilder::new("Invoice", ',')
//!     .from_sample_line("id,name,amount")
//!     .unwrap();
//! let mut engine = RecordEngine::new(schema);
//!
//! let records = engine.decode_string("id,name,amount\n1,Alice,10\n2,Bob,20", None).unwrap();
//! assert_eq!(records.len(), 2);
//! assert_eq!(engine.header_text(), "id,name,amount\n");
//! ```

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::codec::{self, Decoded};
use crate::cursor::LineCursor;
use crate::error::{Error, ErrorManager, ErrorMode, ErrorRecord, Result};
use crate::reader::ForwardReader;
use crate::record::Record;
use crate::schema::RecordSchema;

/// Состояние одного прохода чтения/записи.
///
/// Создаётся заново в начале каждого прохода и явно протаскивается
/// через оркестрацию — вызовы не интерферируют друг с другом.
#[derive(Debug, Default)]
struct RunState {
    line_number: usize,
    header_text: String,
    footer_text: String,
    total: usize,
}

/// Движок чтения/записи flat-файлов по одной [`RecordSchema`].
///
/// Схема принадлежит движку и неизменяема; режим ошибок задаётся до
/// начала работы. Журнал ошибок очищается в начале каждого прохода.
#[derive(Debug)]
pub struct RecordEngine {
    schema: RecordSchema,
    errors: ErrorManager,
    header_text: String,
    footer_text: String,
    line_number: usize,
    total_records: usize,
}

impl RecordEngine {
    /// Создаёт движок с режимом ошибок по умолчанию
    /// ([`ErrorMode::ThrowException`]).
    #[must_use]
    pub fn new(schema: RecordSchema) -> Self {
        Self::with_error_mode(schema, ErrorMode::default())
    }

    /// Создаёт движок с заданным режимом ошибок.
    #[must_use]
    pub fn with_error_mode(schema: RecordSchema, mode: ErrorMode) -> Self {
        Self {
            schema,
            errors: ErrorManager::with_mode(mode),
            header_text: String::new(),
            footer_text: String::new(),
            line_number: 0,
            total_records: 0,
        }
    }

    /// Схема движка.
    #[must_use]
    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    /// Менеджер ошибок (режим + журнал).
    #[must_use]
    pub fn error_manager(&self) -> &ErrorManager {
        &self.errors
    }

    /// Мутабельный доступ к менеджеру ошибок (смена режима, сброс журнала).
    pub fn error_manager_mut(&mut self) -> &mut ErrorManager {
        &mut self.errors
    }

    /// Журнал ошибок последнего прохода (read-only снимок).
    #[must_use]
    pub fn errors(&self) -> &[ErrorRecord] {
        self.errors.errors()
    }

    /// Текст заголовка: захваченный последним чтением либо заданный
    /// для записи.
    #[must_use]
    pub fn header_text(&self) -> &str {
        &self.header_text
    }

    /// Задаёт текст заголовка для пути записи (выводится дословно).
    pub fn set_header_text(&mut self, text: impl Into<String>) {
        self.header_text = text.into();
    }

    /// Текст footer-а: захваченный чтением либо заданный для записи.
    #[must_use]
    pub fn footer_text(&self) -> &str {
        &self.footer_text
    }

    /// Задаёт текст footer-а для пути записи.
    pub fn set_footer_text(&mut self, text: impl Into<String>) {
        self.footer_text = text.into();
    }

    /// Номер последней обработанной строки прошлого прохода.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Число записей, обработанных прошлым проходом.
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.total_records
    }

    // ==================== Чтение ====================

    /// Декодирует записи из потока.
    ///
    /// `max_records`: `None` или `Some(0)` — без ограничения (аналог
    /// «-1 или 0 читает всё» исходного интерфейса). При раннем стопе
    /// по лимиту поток не дочитывается и footer не захватывается.
    pub fn decode_stream<R: Read>(
        &mut self,
        source: R,
        max_records: Option<usize>,
    ) -> Result<Vec<Record>> {
        self.errors.clear();
        let limit = effective_limit(max_records);
        let mut state = RunState::default();
        let mut reader = ForwardReader::with_footer_lines(source, self.schema.footer_lines());
        reader.set_discard_forward(true);

        for _ in 0..self.schema.header_lines() {
            match reader.read_next_line()? {
                Some(line) => {
                    state.header_text.push_str(&line);
                    state.header_text.push('\n');
                    state.line_number = reader.line_number();
                }
                None => break,
            }
        }

        let mut records = Vec::new();
        let mut exhausted = false;
        while records.len() < limit {
            let Some(line) = reader.read_next_line()? else {
                exhausted = true;
                break;
            };
            state.line_number = reader.line_number();

            let mut cursor = LineCursor::new(line, &mut reader);
            match codec::decode_line(&mut cursor, &self.schema) {
                Ok(Decoded::Record(record)) => {
                    state.total += 1;
                    records.push(record);
                }
                Ok(Decoded::Skip) => {}
                Err(Error::Conversion(err)) => {
                    let raw = cursor.text().to_string();
                    self.errors.handle(err, &raw)?;
                }
                Err(other) => return Err(other),
            }
        }

        // Хвост у reader-а полон только после исчерпания потока: при
        // раннем стопе по max_records footer остаётся пустым.
        if self.schema.footer_lines() > 0 && exhausted {
            state.footer_text = reader.remaining_text();
        }
        // Каждый проход чтения перезахватывает header/footer.
        self.header_text = std::mem::take(&mut state.header_text);
        self.footer_text = std::mem::take(&mut state.footer_text);
        self.finish_pass(state);
        Ok(records)
    }

    /// Декодирует записи из строки.
    pub fn decode_string(&mut self, source: &str, max_records: Option<usize>) -> Result<Vec<Record>> {
        self.decode_stream(source.as_bytes(), max_records)
    }

    /// Декодирует записи из файла (UTF-8).
    ///
    /// Файл закрывается на любом пути выхода, включая ошибку.
    pub fn decode_file(
        &mut self,
        path: impl AsRef<Path>,
        max_records: Option<usize>,
    ) -> Result<Vec<Record>> {
        let file = File::open(path)?;
        self.decode_stream(file, max_records)
    }

    // ==================== Запись ====================

    /// Кодирует записи в поток. Возвращает число записанных записей.
    ///
    /// Форма первой записи (число и типы значений) проверяется против
    /// схемы до какого-либо вывода; несоответствие — [`Error::Usage`].
    pub fn encode_stream<W: Write>(
        &mut self,
        sink: W,
        records: &[Record],
        max_records: Option<usize>,
    ) -> Result<usize> {
        self.check_first_record(records)?;
        self.errors.clear();
        let limit = effective_limit(max_records);
        let mut state = RunState::default();
        let mut writer = BufWriter::new(sink);

        write_verbatim(&mut writer, &self.header_text)?;

        let mut written = 0usize;
        for record in records.iter().take(limit) {
            state.line_number += 1;
            match codec::encode_line(record, &self.schema, state.line_number) {
                Ok(line) => {
                    writer.write_all(line.as_bytes())?;
                    writer.write_all(b"\n")?;
                    written += 1;
                }
                Err(Error::Conversion(err)) => {
                    let raw = err.raw.clone();
                    self.errors.handle(err, &raw)?;
                }
                Err(other) => return Err(other),
            }
        }

        write_verbatim(&mut writer, &self.footer_text)?;
        writer.flush()?;

        state.total = written;
        self.finish_pass(state);
        Ok(written)
    }

    /// Кодирует записи в строку.
    pub fn encode_string(&mut self, records: &[Record], max_records: Option<usize>) -> Result<String> {
        let mut buffer = Vec::new();
        self.encode_stream(&mut buffer, records, max_records)?;
        String::from_utf8(buffer)
            .map_err(|e| Error::Usage(format!("encoded output is not valid UTF-8: {e}")))
    }

    /// Кодирует записи в файл (создаётся или перезаписывается).
    pub fn encode_file(
        &mut self,
        path: impl AsRef<Path>,
        records: &[Record],
        max_records: Option<usize>,
    ) -> Result<usize> {
        let file = File::create(path)?;
        self.encode_stream(file, records, max_records)
    }

    /// Дописывает записи в конец файла.
    ///
    /// Заголовок и footer для дописываемой порции не выводятся;
    /// настроенные тексты движка после вызова восстанавливаются.
    pub fn append_to_file(&mut self, path: impl AsRef<Path>, records: &[Record]) -> Result<usize> {
        let file = OpenOptions::new().append(true).create(true).open(path)?;
        let header = std::mem::take(&mut self.header_text);
        let footer = std::mem::take(&mut self.footer_text);
        let result = self.encode_stream(file, records, None);
        self.header_text = header;
        self.footer_text = footer;
        result
    }

    /// Проверяет форму первой записи против схемы (контракт вызова).
    fn check_first_record(&self, records: &[Record]) -> Result<()> {
        let Some(first) = records.first() else { return Ok(()) };
        if first.len() != self.schema.field_count() {
            return Err(Error::Usage(format!(
                "engine for '{}' works with records of {} fields, got {}",
                self.schema.record_name(),
                self.schema.field_count(),
                first.len()
            )));
        }
        for (field, value) in self.schema.fields().iter().zip(first.values()) {
            if !field.kind.accepts(value) {
                return Err(Error::Usage(format!(
                    "field '{}' of '{}' expects a {} value, got {}",
                    field.name,
                    self.schema.record_name(),
                    field.kind.name(),
                    value.kind_name()
                )));
            }
        }
        Ok(())
    }

    /// Переносит счётчики прохода в поля движка.
    fn finish_pass(&mut self, state: RunState) {
        self.line_number = state.line_number;
        self.total_records = state.total;
    }
}

/// `None` и `Some(0)` означают «без ограничения».
fn effective_limit(max_records: Option<usize>) -> usize {
    match max_records {
        None | Some(0) => usize::MAX,
        Some(k) => k,
    }
}

/// Пишет текст дословно, нормализуя единственный замыкающий перевод строки.
fn write_verbatim<W: Write>(writer: &mut W, text: &str) -> std::io::Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    writer.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        writer.write_all(b"\n")?;
    }
    Ok(())
}
