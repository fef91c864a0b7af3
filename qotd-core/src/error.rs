use std::path::PathBuf;
use thiserror::Error;

/// Ошибки уровня одного файла с цитатами.
///
/// Все они нефатальны для сборки корпуса: файл даёт ноль цитат,
/// пишется warning, сборка продолжается.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Синтаксическая ошибка JSON
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    /// Синтаксическая ошибка TOML
    #[error("invalid toml: {0}")]
    Toml(#[from] toml::de::Error),

    /// Ошибка чтения файла (I/O, права)
    #[error("failed to read {path:?}: {source}")]
    Read {
        /// Путь к файлу
        path: PathBuf,
        /// Исходная ошибка I/O
        #[source]
        source: std::io::Error,
    },

    /// Файл больше лимита чтения
    #[error("file too large: {path:?} ({size} bytes, cap {cap})")]
    TooLarge {
        /// Путь к файлу
        path: PathBuf,
        /// Фактический размер
        size: u64,
        /// Действующий лимит
        cap: u64,
    },
}
