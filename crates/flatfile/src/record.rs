//! Запись — упорядоченная последовательность значений полей.
//!
//! Соответствие значений полям позиционное и задаётся схемой; сама
//! запись не хранит имён. Для доступа по имени используйте
//! [`RecordSchema::index_of`](crate::schema::RecordSchema::index_of).

use std::ops::Index;

use crate::schema::Value;

/// Одна декодированная (или подготовленная к кодированию) запись.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    /// Создаёт запись из значений в позиционном порядке схемы.
    #[must_use]
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Значения записи в позиционном порядке.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Число значений.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Пуста ли запись.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Значение по позиции.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

impl Index<usize> for Record {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.values[index]
    }
}

impl From<Vec<Value>> for Record {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

impl FromIterator<Value> for Record {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
