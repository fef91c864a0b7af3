//! Сборка неизменяемого корпуса цитат из директорий с файлами.
//!
//! Контракт `build`: никогда не падает. Нечитаемая директория, битый
//! файл, превышение лимита чтения - всё это warning и ноль цитат от
//! виновника, сборка продолжается. Пустой корпус - валидный результат.
//!
//! Порядок цитат в корпусе - порядок первой встречи при обходе:
//! директории в порядке конфигурации, внутри директории записи
//! отсортированы по имени (детерминизм обхода).

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::warn;

use crate::error::ParseError;
use crate::format;
use crate::normalize::{fingerprint, normalize};
use crate::parsers;

/// Лимит чтения одного файла с цитатами.
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Метаданные одной сборки корпуса.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusMetadata {
    /// Сколько файлов попытались разобрать
    pub files_scanned: usize,
    /// Сколько непустых кандидатов выдали парсеры (до дедупликации)
    pub candidates_parsed: usize,
    /// Сколько кандидатов отброшено как дубликаты
    pub duplicates_removed: usize,
    /// Количество уникальных цитат, равно длине корпуса
    pub unique_quotes: usize,
    /// Момент окончания сборки
    pub built_at: SystemTime,
}

/// Неизменяемый снимок корпуса цитат.
///
/// После публикации ни список цитат, ни метаданные не меняются;
/// горячая замена - это построение нового снимка целиком.
#[derive(Debug, Clone)]
pub struct Corpus {
    quotes: Vec<String>,
    metadata: CorpusMetadata,
}

impl Corpus {
    /// Собирает корпус из готового списка сырых кандидатов:
    /// нормализация, отбрасывание пустых, дедупликация по отпечатку.
    pub fn from_candidates(candidates: Vec<String>) -> Self {
        assemble(candidates, 0)
    }

    /// Все цитаты в порядке первой встречи.
    pub fn quotes(&self) -> &[String] {
        &self.quotes
    }

    /// Цитата по индексу селектора.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.quotes.get(index).map(String::as_str)
    }

    /// Количество цитат.
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// Пустой ли корпус. Пустой корпус валиден: TCP закрывает
    /// соединение молча, UDP не отвечает.
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Метаданные сборки.
    pub fn metadata(&self) -> &CorpusMetadata {
        &self.metadata
    }
}

/// Собирает новый корпус из перечисленных директорий.
pub fn build(dirs: &[PathBuf]) -> Corpus {
    let mut candidates = Vec::new();
    let mut files_scanned = 0usize;

    for file in collect_files(dirs) {
        files_scanned += 1;
        let text = match read_capped(&file, MAX_FILE_BYTES) {
            Ok(t) => t,
            Err(e) => {
                warn!("{e}");
                continue;
            }
        };
        let fmt = format::detect(&file, &text);
        match parsers::extract(fmt, &text) {
            Ok(mut parsed) => candidates.append(&mut parsed),
            Err(e) => warn!("skipping {:?} (detected as {}): {e}", file, fmt.name()),
        }
    }

    let corpus = assemble(candidates, files_scanned);
    if corpus.is_empty() {
        warn!("corpus is empty: no quotes found under {:?}", dirs);
    }
    corpus
}

/// Рекурсивный обход директорий: обычные файлы, внутри каждой
/// директории отсортированные по имени. Используется и сборщиком,
/// и watcher-ом, чтобы оба видели одинаковый набор файлов.
pub fn collect_files(dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for dir in dirs {
        if let Err(e) = walk_dir(dir, &mut files) {
            warn!("cannot read quotes directory {:?}: {e}", dir);
        }
    }
    files
}

fn walk_dir(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        match entry {
            Ok(e) => entries.push(e),
            Err(e) => warn!("while listing {:?}: {e}", dir),
        }
    }
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        match entry.file_type() {
            Ok(ft) if ft.is_dir() => {
                if let Err(e) = walk_dir(&path, out) {
                    warn!("cannot read quotes directory {:?}: {e}", path);
                }
            }
            Ok(ft) if ft.is_file() => out.push(path),
            // не обычный файл (symlink, fifo и т.п.)
            Ok(_) => {}
            Err(e) => warn!("stat {:?}: {e}", path),
        }
    }
    Ok(())
}

fn read_capped(path: &Path, cap: u64) -> Result<String, ParseError> {
    let md = fs::metadata(path).map_err(|source| ParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if md.len() > cap {
        return Err(ParseError::TooLarge {
            path: path.to_path_buf(),
            size: md.len(),
            cap,
        });
    }
    let bytes = fs::read(path).map_err(|source| ParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    // битый UTF-8 не ошибка: каждая ill-formed последовательность
    // становится U+FFFD и разбор продолжается
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn assemble(candidates: Vec<String>, files_scanned: usize) -> Corpus {
    let mut quotes = Vec::new();
    let mut seen: HashSet<blake3::Hash> = HashSet::new();
    let mut candidates_parsed = 0usize;

    for raw in candidates {
        let q = normalize(&raw);
        if q.is_empty() {
            continue;
        }
        candidates_parsed += 1;
        if seen.insert(fingerprint(&q)) {
            quotes.push(q);
        }
    }

    let unique_quotes = quotes.len();
    let metadata = CorpusMetadata {
        files_scanned,
        candidates_parsed,
        duplicates_removed: candidates_parsed - unique_quotes,
        unique_quotes,
        built_at: SystemTime::now(),
    };
    Corpus { quotes, metadata }
}
