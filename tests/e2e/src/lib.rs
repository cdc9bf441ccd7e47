//! # e2e-tests - End-to-end тесты CLI инструментов
//!
//! Этот крейт содержит e2e тесты для CLI инструментов воркспейса:
//! - `flatconv` — преобразователь flat-файлов между раскладками
//!
//! ## Фикстуры
//!
//! Тестовые файлы расположены в `fixtures/`:
//! - `people.csv` — delimited-файл с header-строкой
//! - `people.dat` — те же записи в fixed-width колонках (4, 8, 6)
//! - `bad.csv` — delimited-файл с одной битой записью

use std::path::PathBuf;

/// Получить путь к директории фикстур.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Получить путь к фикстуре по имени файла.
pub fn fixture(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}
