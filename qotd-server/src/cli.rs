use clap::Parser;
use std::path::PathBuf;

/// QOTD Server - отдаёт цитату дня по TCP и UDP (RFC 865).
#[derive(Parser, Debug, Clone)]
#[command(name = "qotd-server", version, about)]
pub(crate) struct Args {
    /// Путь к TOML-конфигурации
    #[arg(long, default_value = "qotd.toml")]
    pub(crate) config: PathBuf,
}
