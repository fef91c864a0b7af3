//! Загрузка и валидация TOML-конфигурации.
//!
//! Конфигурация читается один раз на старте и живёт до конца процесса:
//! горячей перезагрузки конфигурации нет. Любая ошибка здесь фатальна.
//! Незнакомые ключи игнорируются, применённые умолчания логируются.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::info;
use serde::Deserialize;

use qotd_core::Mode;

pub(crate) const DEFAULT_HOST: &str = "0.0.0.0";
// порт QOTD по RFC 865
pub(crate) const DEFAULT_PORT: u16 = 17;
pub(crate) const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Итоговая конфигурация после применения умолчаний.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) host: String,
    pub(crate) tcp_port: u16,
    pub(crate) udp_port: u16,
    pub(crate) directories: Vec<PathBuf>,
    pub(crate) mode: Mode,
    pub(crate) polling_interval: Duration,
}

// сырой вид файла: опциональные поля как Option, чтобы отличить
// "не задано" от значения и залогировать каждое умолчание
#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    server: RawServer,
    quotes: Option<RawQuotes>,
    #[serde(default)]
    polling: RawPolling,
}

#[derive(Debug, Deserialize, Default)]
struct RawServer {
    host: Option<String>,
    tcp_port: Option<i64>,
    udp_port: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawQuotes {
    directories: Option<Vec<PathBuf>>,
    mode: Option<Mode>,
}

#[derive(Debug, Deserialize, Default)]
struct RawPolling {
    interval_seconds: Option<i64>,
}

pub(crate) fn load(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    parse(&content).with_context(|| format!("invalid config file {:?}", path))
}

pub(crate) fn parse(content: &str) -> Result<Config> {
    let raw: RawConfig = toml::from_str(content).context("failed to parse toml")?;
    resolve(raw)
}

fn resolve(raw: RawConfig) -> Result<Config> {
    let quotes = match raw.quotes {
        Some(q) => q,
        None => bail!("missing required section [quotes]"),
    };
    let directories = match quotes.directories {
        Some(d) if !d.is_empty() => d,
        Some(_) => bail!("quotes.directories must not be empty"),
        None => bail!("missing required key quotes.directories"),
    };

    let host = match raw.server.host {
        Some(h) => h,
        None => {
            info!("server.host not set, using default {DEFAULT_HOST:?}");
            DEFAULT_HOST.to_string()
        }
    };
    let tcp_port = resolve_port(raw.server.tcp_port, "server.tcp_port")?;
    let udp_port = resolve_port(raw.server.udp_port, "server.udp_port")?;

    let mode = match quotes.mode {
        Some(m) => m,
        None => {
            info!("quotes.mode not set, using default {:?}", Mode::Random.name());
            Mode::Random
        }
    };

    let interval_seconds = match raw.polling.interval_seconds {
        Some(s) if s >= 1 => s as u64,
        Some(s) => bail!("polling.interval_seconds must be >= 1 (got {s})"),
        None => {
            info!("polling.interval_seconds not set, using default {DEFAULT_INTERVAL_SECS}");
            DEFAULT_INTERVAL_SECS
        }
    };

    Ok(Config {
        host,
        tcp_port,
        udp_port,
        directories,
        mode,
        polling_interval: Duration::from_secs(interval_seconds),
    })
}

fn resolve_port(value: Option<i64>, key: &str) -> Result<u16> {
    match value {
        Some(p) if (1..=65535).contains(&p) => Ok(p as u16),
        Some(p) => bail!("{key} must be in 1..=65535 (got {p})"),
        None => {
            info!("{key} not set, using default {DEFAULT_PORT}");
            Ok(DEFAULT_PORT)
        }
    }
}
