//! Описание одного поля записи: имя, тип-конвертер, правила раскладки.
//!
//! Конвертер поля — тегированный вариант [`FieldKind`], выбираемый при
//! построении схемы. Никакой рефлексии во время выполнения: поле знает,
//! как разобрать подстроку в [`Value`] и как закодировать значение обратно.

use std::fmt;
use std::sync::Arc;

use jiff::civil::Date;
use jiff::fmt::strtime;
use serde::Serialize;

/// Типизированное значение одного поля записи.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Произвольный текст.
    Text(String),
    /// Целое со знаком.
    Integer(i64),
    /// Десятичное число.
    Decimal(f64),
    /// Календарная дата (без времени и зоны).
    Date(Date),
}

impl Value {
    /// Имя варианта для диагностики.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Decimal(_) => "decimal",
            Self::Date(_) => "date",
        }
    }

    /// Текст значения, если это [`Value::Text`].
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Целое значение, если это [`Value::Integer`].
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Десятичное значение, если это [`Value::Decimal`].
    #[must_use]
    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            Self::Decimal(x) => Some(*x),
            _ => None,
        }
    }

    /// Дата, если это [`Value::Date`].
    #[must_use]
    pub fn as_date(&self) -> Option<Date> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Decimal(x)
    }
}

/// Правило обрезки пробелов перед конвертацией подстроки поля.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trim {
    /// Подстрока передаётся конвертеру как есть.
    #[default]
    None,
    /// Обрезаются ведущие пробелы.
    Left,
    /// Обрезаются замыкающие пробелы.
    Right,
    /// Обрезаются пробелы с обеих сторон.
    Both,
}

impl Trim {
    /// Применяет правило к подстроке.
    #[must_use]
    pub fn apply<'a>(&self, raw: &'a str) -> &'a str {
        match self {
            Self::None => raw,
            Self::Left => raw.trim_start(),
            Self::Right => raw.trim_end(),
            Self::Both => raw.trim(),
        }
    }
}

/// Пара пользовательских конвертеров, подключаемая на этапе построения схемы.
#[derive(Clone)]
pub struct CustomConverter {
    decode: Arc<dyn Fn(&str) -> Result<Value, String> + Send + Sync>,
    encode: Arc<dyn Fn(&Value) -> Result<String, String> + Send + Sync>,
}

impl CustomConverter {
    /// Создаёт конвертер из пары замыканий.
    ///
    /// Ошибки замыканий — произвольные строки; движок оборачивает их
    /// в `ConversionError` с именем поля и номером строки.
    pub fn new(
        decode: impl Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
        encode: impl Fn(&Value) -> Result<String, String> + Send + Sync + 'static,
    ) -> Self {
        Self { decode: Arc::new(decode), encode: Arc::new(encode) }
    }
}

/// Конвертер поля: детерминированное и тотальное отображение между
/// подстрокой и типизированным значением для каждого well-formed типа.
#[derive(Clone, Default)]
pub enum FieldKind {
    /// Текст без преобразования.
    #[default]
    Text,
    /// Целое со знаком, десятичная запись.
    Integer,
    /// Десятичное число (точка как разделитель).
    Decimal,
    /// Дата в формате strftime.
    Date {
        /// Формат, например `"%Y-%m-%d"` или `"%d/%m/%Y"`.
        format: String,
    },
    /// Пользовательская пара замыканий decode/encode.
    Custom(CustomConverter),
}

impl FieldKind {
    /// Формат даты по умолчанию (ISO 8601, только дата).
    pub const DEFAULT_DATE_FORMAT: &'static str = "%Y-%m-%d";

    /// Датовый конвертер с форматом по умолчанию.
    #[must_use]
    pub fn date() -> Self {
        Self::Date { format: Self::DEFAULT_DATE_FORMAT.to_string() }
    }

    /// Датовый конвертер с явным strftime-форматом.
    #[must_use]
    pub fn date_with_format(format: impl Into<String>) -> Self {
        Self::Date { format: format.into() }
    }

    /// Разбирает подстроку в типизированное значение.
    ///
    /// Возвращает только текст причины; имя поля и номер строки
    /// подставляет кодек.
    pub fn decode(&self, raw: &str) -> Result<Value, String> {
        match self {
            Self::Text => Ok(Value::Text(raw.to_string())),
            Self::Integer => raw
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|e| format!("invalid integer: {e}")),
            Self::Decimal => raw
                .parse::<f64>()
                .map(Value::Decimal)
                .map_err(|e| format!("invalid decimal: {e}")),
            Self::Date { format } => Date::strptime(format, raw)
                .map(Value::Date)
                .map_err(|e| format!("invalid date (expected {format}): {e}")),
            Self::Custom(conv) => (conv.decode)(raw),
        }
    }

    /// Кодирует значение обратно в текст.
    ///
    /// Значение чужого варианта — ошибка: на этапе записи это ловится
    /// проверкой формы первой записи, дальше — пер-полевой ошибкой.
    pub fn encode(&self, value: &Value) -> Result<String, String> {
        match (self, value) {
            (Self::Text, Value::Text(s)) => Ok(s.clone()),
            (Self::Integer, Value::Integer(n)) => Ok(n.to_string()),
            (Self::Decimal, Value::Decimal(x)) => Ok(x.to_string()),
            (Self::Date { format }, Value::Date(d)) => {
                strtime::format(format, *d).map_err(|e| format!("cannot format date: {e}"))
            }
            (Self::Custom(conv), v) => (conv.encode)(v),
            (kind, v) => {
                Err(format!("expected {} value, got {}", kind.name(), v.kind_name()))
            }
        }
    }

    /// Имя конвертера для диагностики.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Date { .. } => "date",
            Self::Custom(_) => "custom",
        }
    }

    /// Совместимо ли значение с этим конвертером (для проверки формы
    /// записи перед записью в поток).
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Text, Value::Text(_))
                | (Self::Integer, Value::Integer(_))
                | (Self::Decimal, Value::Decimal(_))
                | (Self::Date { .. }, Value::Date(_))
                | (Self::Custom(_), _)
        )
    }
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date { format } => f.debug_struct("Date").field("format", format).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
            other => f.write_str(other.name()),
        }
    }
}

/// Дескриптор одного поля: имя, конвертер, параметры раскладки.
///
/// Неизменяем после построения схемы.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Имя поля, уникальное в пределах схемы.
    pub name: String,
    /// Конвертер поля.
    pub kind: FieldKind,
    /// Ширина в символах (обязательна для fixed-width раскладки).
    pub width: Option<usize>,
    /// Правило обрезки пробелов перед конвертацией.
    pub trim: Trim,
}

impl FieldDescriptor {
    /// Текстовое поле без ширины и обрезки.
    #[must_use]
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    /// Поле с заданным конвертером.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self { name: name.into(), kind, width: None, trim: Trim::None }
    }

    /// Задаёт ширину поля (fixed-width раскладка).
    #[must_use]
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    /// Задаёт правило обрезки пробелов.
    #[must_use]
    pub fn with_trim(mut self, trim: Trim) -> Self {
        self.trim = trim;
        self
    }

    /// Разбирает подстроку поля с учётом правила обрезки.
    pub fn decode_field(&self, raw: &str) -> Result<Value, String> {
        self.kind.decode(self.trim.apply(raw))
    }

    /// Кодирует значение поля в текст.
    pub fn encode_field(&self, value: &Value) -> Result<String, String> {
        self.kind.encode(value)
    }
}
