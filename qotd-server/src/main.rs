//! Точка входа `qotd-server`.
//!
//! Жизненный цикл:
//! - парсинг CLI и установка обработчика SIGINT/SIGTERM
//! - чтение и валидация конфигурации (любая ошибка фатальна)
//! - bind TCP и UDP, первая сборка корпуса
//! - однопоточный цикл: обслуживание сокетов + периодический опрос
//!   директорий с горячей заменой корпуса
//! - при shutdown: выход из цикла и освобождение сокетов

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use clap::Parser;
use log::info;

mod cli;
mod config;
mod server;
mod supervisor;
mod watcher;

use crate::cli::Args;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    let shutdown = Arc::new(AtomicBool::new(false));

    // SIGINT/SIGTERM => ставим shutdown=true
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::Relaxed);
            info!("shutting down...");
        })?;
    }

    let cfg = config::load(&args.config)?;
    info!(
        "config loaded from {:?}: host={} tcp_port={} udp_port={} mode={} dirs={:?} interval={}s",
        args.config,
        cfg.host,
        cfg.tcp_port,
        cfg.udp_port,
        cfg.mode.name(),
        cfg.directories,
        cfg.polling_interval.as_secs()
    );

    let endpoints = server::bind(&cfg.host, cfg.tcp_port, cfg.udp_port)?;
    info!("TCP listening on {}:{}", cfg.host, cfg.tcp_port);
    info!("UDP bound on {}:{}", cfg.host, cfg.udp_port);

    let mut sup = supervisor::Supervisor::new(
        endpoints,
        cfg.mode,
        cfg.directories.clone(),
        cfg.polling_interval,
    );
    sup.run(&shutdown);

    info!("server stopped");
    Ok(())
}
