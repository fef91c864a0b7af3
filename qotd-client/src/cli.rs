use clap::{Parser, ValueEnum};
use std::net::{SocketAddr, ToSocketAddrs};

/// QOTD Client - одноразовый запрос цитаты дня по TCP или UDP.
#[derive(Parser, Debug, Clone)]
#[command(name = "qotd-client", version, about)]
pub(crate) struct Args {
    /// Адрес сервера, например 127.0.0.1:17 или qotd.example.com:17
    #[arg(long, default_value = "127.0.0.1:17")]
    pub(crate) server: String,

    /// Транспорт запроса
    #[arg(long, value_enum, default_value = "tcp")]
    pub(crate) transport: Transport,

    /// Таймаут ожидания ответа, мс
    #[arg(long, default_value_t = 3000)]
    pub(crate) timeout_ms: u64,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transport {
    /// Соединиться, прочитать цитату до закрытия
    Tcp,
    /// Отправить пустую датаграмму, дождаться ответной
    Udp,
}

impl Args {
    pub(crate) fn server_socket_addr(&self) -> std::io::Result<SocketAddr> {
        // берём первый результат резолвинга
        self.server.to_socket_addrs()?.next().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses resolved")
        })
    }
}
