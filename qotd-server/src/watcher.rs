//! Периодический опрос файловой системы для горячей пересборки корпуса.
//!
//! Никаких inotify: по расписанию сравниваем текущее множество файлов
//! и их mtime со снимком предыдущего опроса. Размер файла учитывается
//! как дополнительный признак изменения: на файловых системах с
//! секундной гранулярностью mtime быстрые правки подряд иначе теряются.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

use log::debug;

use qotd_core::corpus::collect_files;

// снимок одного файла на момент опроса
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    mtime: SystemTime,
    size: u64,
}

pub(crate) struct Watcher {
    dirs: Vec<PathBuf>,
    snapshots: HashMap<PathBuf, FileStamp>,
}

impl Watcher {
    pub(crate) fn new(dirs: Vec<PathBuf>) -> Self {
        Self {
            dirs,
            snapshots: HashMap::new(),
        }
    }

    /// true, если с последнего [`Watcher::refresh`] появился новый файл,
    /// пропал записанный или у какого-то файла изменился mtime/размер.
    pub(crate) fn poll(&self) -> bool {
        let current = self.scan();
        if current.len() != self.snapshots.len() {
            return true;
        }
        for (path, stamp) in &current {
            match self.snapshots.get(path) {
                Some(prev) if prev == stamp => {}
                _ => return true,
            }
        }
        false
    }

    /// Перечитывает снимок. Зовётся после завершения очередной сборки,
    /// чтобы один и тот же набор правок не триггерил её дважды.
    pub(crate) fn refresh(&mut self) {
        self.snapshots = self.scan();
    }

    fn scan(&self) -> HashMap<PathBuf, FileStamp> {
        let mut map = HashMap::new();
        for path in collect_files(&self.dirs) {
            match fs::metadata(&path) {
                Ok(md) => {
                    let mtime = md.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                    map.insert(
                        path,
                        FileStamp {
                            mtime,
                            size: md.len(),
                        },
                    );
                }
                // файл исчез между обходом и stat: поймаем на следующем опросе
                Err(e) => debug!("stat {:?}: {e}", path),
            }
        }
        map
    }
}
