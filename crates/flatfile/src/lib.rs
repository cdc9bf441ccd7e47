//! Библиотека чтения и записи flat-файлов (delimited и fixed-width).
//!
//! Крейт отображает строки текстового файла в последовательности
//! типизированных записей и обратно, без рукописного кода разбора:
//!
//! - **RecordSchema** описывает, как строка распадается на поля
//!   (разделитель или фиксированные ширины, header/footer строки);
//! - **RecordEngine** прогоняет поток, строку или файл через кодек
//!   с настраиваемой терпимостью к ошибкам
//!   (`ThrowException` / `IgnoreAndContinue` / `SaveAndContinue`);
//! - **SchemaBuilder** выводит схему из строки-заголовка, когда
//!   объявлять поля вручную не хочется.
//!
//! # Быстрый старт
//!
//! ```
//! use flatfile::prelude::*;
//!
//! let schema = SchemaBuilder::new("Invoice", ',')
//!     .from_sample_line("id,name,amount")
//!     .unwrap();
//! let mut engine = RecordEngine::with_error_mode(schema, ErrorMode::SaveAndContinue);
//!
//! let records = engine
//!     .decode_string("id,name,amount\n1,Alice,10\noops\n2,Bob,20", None)
//!     .unwrap();
//!
//! assert_eq!(records.len(), 2);
//! assert_eq!(engine.errors().len(), 1);
//! assert_eq!(engine.errors()[0].line_number, 3);
//! ```

pub mod codec;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod reader;
pub mod record;
pub mod schema;

/// Наиболее употребимые типы крейта одной строкой `use`.
pub mod prelude {
    pub use crate::codec::Decoded;
    pub use crate::engine::RecordEngine;
    pub use crate::error::{
        ConversionError, Error, ErrorManager, ErrorMode, ErrorRecord, Result, SchemaError,
    };
    pub use crate::reader::ForwardReader;
    pub use crate::record::Record;
    pub use crate::schema::{
        CustomConverter, FieldDescriptor, FieldKind, Layout, RecordSchema, SchemaBuilder,
        TrailingFields, Trim, Value,
    };
}

pub use engine::RecordEngine;
pub use error::{Error, ErrorMode, Result};
pub use record::Record;
pub use schema::{RecordSchema, SchemaBuilder};
