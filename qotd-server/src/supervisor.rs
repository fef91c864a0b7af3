//! Главный цикл сервера: обслуживание обоих сокетов, опрос watcher-а,
//! горячая замена корпуса.
//!
//! Всё происходит в одном потоке, поэтому блокировок нет: корпус
//! неизменяем и заменяется целиком одной заменой `Arc`-указателя,
//! селектор мутирует только путь обслуживания запросов, снимки
//! watcher-а - только супервизор.
//!
//! Порядок пересборки: старый корпус обслуживает трафик, пока новый
//! не собран полностью; после замены указателя селектор сбрасывается
//! под новый размер, затем watcher перечитывает снимок.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::info;

use qotd_core::{corpus, Corpus, Mode, Selector};

use crate::server::{self, Endpoints};
use crate::watcher::Watcher;

// пауза пустого оборота цикла: ограничивает сверху и задержку реакции
// на shutdown, и на первую готовность сокета
const IDLE_TICK: Duration = Duration::from_millis(100);

pub(crate) struct Supervisor {
    endpoints: Endpoints,
    corpus: Arc<Corpus>,
    selector: Selector,
    watcher: Watcher,
    dirs: Vec<PathBuf>,
    polling_interval: Duration,
}

impl Supervisor {
    /// Первая сборка корпуса и подготовка цикла.
    pub(crate) fn new(
        endpoints: Endpoints,
        mode: Mode,
        dirs: Vec<PathBuf>,
        polling_interval: Duration,
    ) -> Self {
        let started = Instant::now();
        let corpus = Arc::new(corpus::build(&dirs));
        log_build(&corpus, started.elapsed());

        let selector = Selector::new(mode, corpus.len());
        let mut watcher = Watcher::new(dirs.clone());
        watcher.refresh();

        Self {
            endpoints,
            corpus,
            selector,
            watcher,
            dirs,
            polling_interval,
        }
    }

    /// Крутится до выставления флага shutdown, затем возвращается,
    /// отдавая сокеты на освобождение.
    pub(crate) fn run(&mut self, shutdown: &AtomicBool) {
        let idle = IDLE_TICK.min(self.polling_interval);
        let mut last_poll = Instant::now();

        while !shutdown.load(Ordering::Relaxed) {
            // за один оборот по одной готовности на транспорт, TCP раньше UDP
            let tcp_busy =
                server::serve_tcp_once(&self.endpoints.tcp, &self.corpus, &mut self.selector);
            let udp_busy =
                server::serve_udp_once(&self.endpoints.udp, &self.corpus, &mut self.selector);

            if last_poll.elapsed() >= self.polling_interval {
                if self.watcher.poll() {
                    info!("change detected in quotes directories");
                    self.rebuild();
                }
                last_poll = Instant::now();
            }

            if !(tcp_busy || udp_busy) {
                std::thread::sleep(idle);
            }
        }

        info!("supervisor loop stopped");
    }

    fn rebuild(&mut self) {
        let started = Instant::now();
        let fresh = Arc::new(corpus::build(&self.dirs));
        log_build(&fresh, started.elapsed());

        // публикация: одна замена указателя, затем сброс селектора
        self.corpus = fresh;
        self.selector.reset(self.corpus.len());
        self.watcher.refresh();
    }
}

fn log_build(corpus: &Corpus, took: Duration) {
    let md = corpus.metadata();
    info!(
        "corpus built in {}ms: files={} candidates={} duplicates={} unique={}",
        took.as_millis(),
        md.files_scanned,
        md.candidates_parsed,
        md.duplicates_removed,
        md.unique_quotes
    );
}
