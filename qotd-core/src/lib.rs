//! # qotd-core
//!
//! Базовые типы и логика Quote of the Day сервера (RFC 865).
//!
//! Этот крейт содержит:
//!
//! - [`format`] — определение формата файла (расширение + sniffing)
//! - [`parsers`] — пять терпимых парсеров: plain, json, csv, toml, yaml
//! - [`normalize`] — нормализация пробелов и Blake3-отпечатки
//! - [`corpus`] — обход директорий и сборка неизменяемого корпуса
//! - [`selector`] — четыре политики выбора следующей цитаты
//! - [`error`] — типы ошибок, которые возвращают компоненты `qotd-core`
//!
//! ## Быстрый пример: корпус из готовых кандидатов
//!
//! ```rust
//! use qotd_core::corpus::Corpus;
//!
//! let corpus = Corpus::from_candidates(vec![
//!     "  Quote   A ".to_string(),
//!     "Quote A".to_string(), // дубликат после нормализации
//!     "Quote B".to_string(),
//! ]);
//!
//! assert_eq!(corpus.quotes(), ["Quote A", "Quote B"]);
//! assert_eq!(corpus.metadata().duplicates_removed, 1);
//! ```
//!
//! ## Пример: sequential-выбор
//!
//! ```rust
//! use qotd_core::selector::{Mode, Selector};
//!
//! let mut sel = Selector::new(Mode::Sequential, 3);
//! assert_eq!(sel.next(), Some(0));
//! assert_eq!(sel.next(), Some(1));
//! assert_eq!(sel.next(), Some(2));
//! assert_eq!(sel.next(), Some(0));
//!
//! sel.reset(2);
//! assert_eq!(sel.next(), Some(0));
//! ```
//!
//! ## Пример: определение формата
//!
//! ```rust
//! use std::path::Path;
//! use qotd_core::format::{detect, Format};
//!
//! // расширение важнее содержимого
//! assert_eq!(detect(Path::new("q.txt"), "[\"json?\"]"), Format::Plain);
//! // без расширения работает sniffing
//! assert_eq!(detect(Path::new("noext"), "[\"json!\"]"), Format::Json);
//! ```
//!
//! ## Дизайн
//!
//! `qotd-core` задуман как "нулевая" зависимость для сервера, клиента и
//! тестов: чистые типы, парсинг и сборка корпуса, без runtime/async.
//! Всё сетевое и цикл событий живут в `qotd-server`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Сборка корпуса: обход директорий, дедупликация, метаданные.
pub mod corpus;

/// Ошибки `qotd-core`.
pub mod error;

/// Определение формата файла с цитатами.
pub mod format;

/// Нормализация цитат и content-addressed отпечатки.
pub mod normalize;

/// Парсеры пяти текстовых форматов.
pub mod parsers;

/// Политики выбора следующей цитаты.
pub mod selector;

// --- Re-exports (публичный фасад API) ---

pub use crate::corpus::{build, Corpus, CorpusMetadata, MAX_FILE_BYTES};
pub use crate::error::ParseError;
pub use crate::format::Format;
pub use crate::selector::{Mode, Selector};
