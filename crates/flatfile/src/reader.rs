//! Построчный reader с lookahead и удержанием footer-строк.
//!
//! [`ForwardReader`] отдаёт строки по одной, ведёт абсолютную нумерацию
//! для диагностики и придерживает последние `footer_lines` строк: они
//! не предлагаются декодеру, а после исчерпания потока доступны
//! дословно (с исходными разделителями строк) через
//! [`ForwardReader::remaining_text`].
//!
//! Reader ничего не знает о схеме: счётчик footer-строк передаётся ему
//! движком при создании. Ошибки I/O пробрасываются без классификации.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};

/// Построчный reader с одним буфером lookahead.
///
/// Удержание footer-строк реализовано очередью на `footer_lines + 1`
/// элементов: строка выдаётся наружу только когда известно, что она не
/// принадлежит хвосту файла.
pub struct ForwardReader<R> {
    inner: BufReader<R>,
    /// Кандидаты в footer: сырые строки с исходными терминаторами.
    tail: VecDeque<String>,
    /// Отданная вперёд строка (lookahead/pushback) и её номер.
    lookahead: Option<(String, usize)>,
    footer_lines: usize,
    discard_forward: bool,
    /// Номер последней выданной строки (1-based).
    line_number: usize,
    /// Сколько физических строк уже выдано наружу.
    served: usize,
    eof: bool,
}

impl<R: Read> ForwardReader<R> {
    /// Создаёт reader без удержания footer-строк.
    pub fn new(reader: R) -> Self {
        Self::with_footer_lines(reader, 0)
    }

    /// Создаёт reader, придерживающий последние `footer_lines` строк.
    pub fn with_footer_lines(reader: R, footer_lines: usize) -> Self {
        Self {
            inner: BufReader::new(reader),
            tail: VecDeque::with_capacity(footer_lines + 1),
            lookahead: None,
            footer_lines,
            discard_forward: false,
            line_number: 0,
            served: 0,
            eof: false,
        }
    }

    /// Строки, потреблённые как lookahead, не предлагаются заново.
    ///
    /// Включается движком на время прохода: продолжения многострочных
    /// записей вытягиваются через [`read_next_line`] насовсем.
    ///
    /// [`read_next_line`]: ForwardReader::read_next_line
    pub fn set_discard_forward(&mut self, discard: bool) {
        self.discard_forward = discard;
    }

    /// Текущее значение флага `discard_forward`.
    #[must_use]
    pub fn discard_forward(&self) -> bool {
        self.discard_forward
    }

    /// Номер последней выданной строки (1-based; 0 до первой выдачи).
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Возвращает следующую строку без терминатора, либо `None`, когда
    /// остались только удерживаемые footer-строки (или поток пуст).
    ///
    /// Если есть возвращённая через [`push_back`] строка — отдаёт её.
    ///
    /// [`push_back`]: ForwardReader::push_back
    pub fn read_next_line(&mut self) -> std::io::Result<Option<String>> {
        if let Some((line, number)) = self.lookahead.take() {
            self.line_number = number;
            return Ok(Some(line));
        }

        self.fill_tail()?;
        if self.tail.len() > self.footer_lines {
            // Строка гарантированно не из footer — можно выдавать.
            let raw = self.tail.pop_front().unwrap_or_default();
            self.served += 1;
            self.line_number = self.served;
            Ok(Some(strip_terminator(&raw).to_string()))
        } else {
            Ok(None)
        }
    }

    /// Подсматривает следующую строку, не потребляя её: повторный
    /// вызов [`read_next_line`] вернёт ту же строку.
    ///
    /// [`read_next_line`]: ForwardReader::read_next_line
    pub fn peek_line(&mut self) -> std::io::Result<Option<&str>> {
        if self.lookahead.is_none() {
            let before = self.line_number;
            if let Some(line) = self.read_next_line()? {
                let number = self.line_number;
                self.lookahead = Some((line, number));
                self.line_number = before;
            }
        }
        Ok(self.lookahead.as_ref().map(|(line, _)| line.as_str()))
    }

    /// Возвращает строку обратно: следующий [`read_next_line`] отдаст её.
    ///
    /// [`read_next_line`]: ForwardReader::read_next_line
    pub fn push_back(&mut self, line: String) {
        self.lookahead = Some((line, self.line_number));
    }

    /// Удержанный хвост потока дословно, с исходными терминаторами.
    ///
    /// Полон только после того, как [`read_next_line`] вернул `None`.
    ///
    /// [`read_next_line`]: ForwardReader::read_next_line
    #[must_use]
    pub fn remaining_text(&self) -> String {
        self.tail.iter().map(String::as_str).collect()
    }

    /// Дочитывает очередь кандидатов до `footer_lines + 1` строк.
    fn fill_tail(&mut self) -> std::io::Result<()> {
        while !self.eof && self.tail.len() <= self.footer_lines {
            let mut raw = String::new();
            let bytes = self.inner.read_line(&mut raw)?;
            if bytes == 0 {
                self.eof = true;
            } else {
                self.tail.push_back(raw);
            }
        }
        Ok(())
    }
}

/// Срезает `\n` или `\r\n` в конце строки.
fn strip_terminator(raw: &str) -> &str {
    raw.strip_suffix('\n').map_or(raw, |s| s.strip_suffix('\r').unwrap_or(s))
}
