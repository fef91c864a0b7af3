//! Точка входа `qotd-client`.
//!
//! Одноразовая проба QOTD-сервера:
//! - `--transport tcp`: соединиться, ничего не слать, прочитать до EOF
//! - `--transport udp`: отправить пустую датаграмму, дождаться ответа
//!
//! Пустой ответ (сервер с пустым корпусом) считается ошибкой с
//! внятным сообщением, чтобы пробу было удобно звать из скриптов.

use std::io::Read;
use std::net::{SocketAddr, TcpStream, UdpSocket};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use log::debug;

mod cli;

use crate::cli::{Args, Transport};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let addr = args
        .server_socket_addr()
        .with_context(|| format!("resolve server address {:?}", args.server))?;
    let timeout = Duration::from_millis(args.timeout_ms);

    debug!("requesting quote from {addr} over {:?}", args.transport);

    let quote = match args.transport {
        Transport::Tcp => fetch_tcp(addr, timeout)?,
        Transport::Udp => fetch_udp(addr, timeout)?,
    };

    // цитата уже приходит с завершающим LF
    print!("{quote}");
    Ok(())
}

fn fetch_tcp(addr: SocketAddr, timeout: Duration) -> anyhow::Result<String> {
    let mut stream =
        TcpStream::connect_timeout(&addr, timeout).with_context(|| format!("connect {addr}"))?;
    stream.set_read_timeout(Some(timeout)).ok();

    let mut out = String::new();
    stream
        .read_to_string(&mut out)
        .with_context(|| format!("read quote from {addr}"))?;

    if out.is_empty() {
        bail!("server closed the connection without a quote (empty corpus?)");
    }
    Ok(out)
}

fn fetch_udp(addr: SocketAddr, timeout: Duration) -> anyhow::Result<String> {
    let bind_addr = if addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
    let sock = UdpSocket::bind(bind_addr).context("bind local udp socket")?;
    sock.set_read_timeout(Some(timeout)).ok();

    // по RFC 865 содержимое датаграммы сервером игнорируется
    sock.send_to(b"", addr)
        .with_context(|| format!("send datagram to {addr}"))?;

    let mut buf = [0u8; 2048];
    let (n, _src) = sock
        .recv_from(&mut buf)
        .with_context(|| format!("no reply from {addr} (timeout; empty corpus?)"))?;

    Ok(String::from_utf8_lossy(&buf[..n]).into_owned())
}
