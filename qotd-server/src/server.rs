//! Двухтранспортный сервер RFC 865.
//!
//! Оба сокета неблокирующие и обслуживаются из однопоточного цикла
//! супервизора: по одной готовности на транспорт за оборот.
//!
//! TCP: принять соединение, ничего не читать, записать `цитата + LF`,
//! закрыть. При пустом корпусе закрыть сразу и молча.
//!
//! UDP: принять датаграмму, payload игнорировать, ответить одной
//! датаграммой `цитата + LF` отправителю. При пустом корпусе молча
//! ничего не слать. Ответ длиннее лимита обрезается по границе
//! UTF-8 символа так, чтобы датаграмма всё равно кончалась LF.

use std::io::{ErrorKind, Write};
use std::net::{SocketAddr, TcpListener, ToSocketAddrs, UdpSocket};

use anyhow::Context;
use log::{debug, warn};
use socket2::{Domain, Protocol, Socket, Type};

use qotd_core::{Corpus, Selector};

// максимальная исходящая UDP-датаграмма; RFC 865 рекомендует < 512
pub(crate) const MAX_UDP_REPLY_BYTES: usize = 512;

pub(crate) struct Endpoints {
    pub(crate) tcp: TcpListener,
    pub(crate) udp: UdpSocket,
}

const TCP_LISTEN_BACKLOG: i32 = 128;

/// Биндит оба сокета: неблокирующие, с SO_REUSEADDR, чтобы рестарт
/// не спотыкался об соединения прошлого процесса в TIME_WAIT.
pub(crate) fn bind(host: &str, tcp_port: u16, udp_port: u16) -> anyhow::Result<Endpoints> {
    let tcp = bind_tcp(resolve(host, tcp_port)?)
        .with_context(|| format!("bind TCP listener {host}:{tcp_port}"))?;
    let udp = bind_udp(resolve(host, udp_port)?)
        .with_context(|| format!("bind UDP socket {host}:{udp_port}"))?;
    Ok(Endpoints { tcp, udp })
}

// берём первый результат резолвинга
fn resolve(host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()
        .with_context(|| format!("resolve bind address {host}:{port}"))?
        .next()
        .with_context(|| format!("no addresses resolved for {host}:{port}"))
}

fn bind_tcp(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(TCP_LISTEN_BACKLOG)?;
    socket.set_nonblocking(true)?;
    Ok(socket.into())
}

fn bind_udp(addr: SocketAddr) -> std::io::Result<UdpSocket> {
    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.set_nonblocking(true)?;
    Ok(socket.into())
}

/// Обслуживает не больше одного готового TCP-соединения.
/// Возвращает true, если какая-то активность была.
pub(crate) fn serve_tcp_once(
    listener: &TcpListener,
    corpus: &Corpus,
    selector: &mut Selector,
) -> bool {
    let (mut stream, peer) = match listener.accept() {
        Ok(pair) => pair,
        Err(e) if e.kind() == ErrorKind::WouldBlock => return false,
        Err(e) if e.kind() == ErrorKind::Interrupted => return false,
        Err(e) => {
            warn!("tcp accept error: {e}");
            return true;
        }
    };

    // клиент нам ничего не шлёт по протоколу, читать нечего
    let quote = match pick_quote(corpus, selector) {
        Some(q) => q,
        None => {
            // пустой корпус: закрываем сразу, не записав ни байта
            drop(stream);
            return true;
        }
    };

    let mut reply = Vec::with_capacity(quote.len() + 1);
    reply.extend_from_slice(quote.as_bytes());
    reply.push(b'\n');

    if let Err(e) = stream.write_all(&reply) {
        // peer reset / broken pipe не валят сервер
        debug!("tcp write to {peer} failed: {e}");
    }
    true
}

/// Обслуживает не больше одной готовой UDP-датаграммы.
/// Возвращает true, если какая-то активность была.
pub(crate) fn serve_udp_once(udp: &UdpSocket, corpus: &Corpus, selector: &mut Selector) -> bool {
    let mut buf = [0u8; 2048];
    let (_len, src) = match udp.recv_from(&mut buf) {
        Ok(pair) => pair,
        Err(e) if e.kind() == ErrorKind::WouldBlock => return false,
        Err(e) if e.kind() == ErrorKind::TimedOut => return false,
        Err(e) if e.kind() == ErrorKind::Interrupted => return false,
        Err(e) => {
            // например ICMP port unreachable от прошлой отправки
            warn!("udp recv error: {e}");
            return true;
        }
    };

    // payload по RFC 865 игнорируется
    let quote = match pick_quote(corpus, selector) {
        Some(q) => q,
        // пустой корпус: молча без ответа
        None => return true,
    };

    let mut datagram = Vec::with_capacity(quote.len().min(MAX_UDP_REPLY_BYTES) + 1);
    if quote.len() + 1 > MAX_UDP_REPLY_BYTES {
        let mut cut = MAX_UDP_REPLY_BYTES - 1;
        while !quote.is_char_boundary(cut) {
            cut -= 1;
        }
        warn!(
            "quote of {} bytes exceeds udp reply limit {}, truncating",
            quote.len(),
            MAX_UDP_REPLY_BYTES
        );
        datagram.extend_from_slice(&quote.as_bytes()[..cut]);
    } else {
        datagram.extend_from_slice(quote.as_bytes());
    }
    datagram.push(b'\n');

    if let Err(e) = udp.send_to(&datagram, src) {
        debug!("udp send to {src} failed: {e}");
    }
    true
}

// следующая цитата по селектору; None при пустом корпусе или
// нарушении инварианта индекса (запрос отбрасывается)
fn pick_quote<'a>(corpus: &'a Corpus, selector: &mut Selector) -> Option<&'a str> {
    if corpus.is_empty() {
        return None;
    }
    let index = selector.next()?;
    match corpus.get(index) {
        Some(q) => Some(q),
        None => {
            warn!(
                "selector produced out-of-range index {index} for corpus of {}",
                corpus.len()
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qotd_core::{Mode, Selector};
    use std::io::Read;
    use std::net::TcpStream;
    use std::thread;
    use std::time::Duration;

    fn mk_corpus(quotes: &[&str]) -> Corpus {
        Corpus::from_candidates(quotes.iter().map(|s| s.to_string()).collect())
    }

    fn bind_local() -> Endpoints {
        bind("127.0.0.1", 0, 0).unwrap()
    }

    // крутим обслуживание, пока соединение не будет принято
    fn drive_tcp(listener: &TcpListener, corpus: &Corpus, selector: &mut Selector) {
        for _ in 0..200 {
            if serve_tcp_once(listener, corpus, selector) {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("tcp connection never became ready");
    }

    fn drive_udp(udp: &UdpSocket, corpus: &Corpus, selector: &mut Selector) {
        for _ in 0..200 {
            if serve_udp_once(udp, corpus, selector) {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("udp datagram never became ready");
    }

    fn read_all(mut stream: TcpStream) -> Vec<u8> {
        stream
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let mut out = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            match stream.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => out.extend_from_slice(&buf[..n]),
                // сервер не читает клиентские байты, поэтому его close
                // может прийти как RST уже после полезных данных
                Err(e) if e.kind() == ErrorKind::ConnectionReset && !out.is_empty() => break,
                Err(e) => panic!("read: {e}"),
            }
        }
        out
    }

    #[test]
    fn tcp_serves_quote_with_lf_and_closes() {
        let ep = bind_local();
        let addr = ep.tcp.local_addr().unwrap();
        let corpus = mk_corpus(&["hello world"]);
        let mut sel = Selector::new(Mode::Sequential, corpus.len());

        let client = TcpStream::connect(addr).unwrap();
        drive_tcp(&ep.tcp, &corpus, &mut sel);

        assert_eq!(read_all(client), b"hello world\n");
    }

    #[test]
    fn tcp_empty_corpus_closes_without_bytes() {
        let ep = bind_local();
        let addr = ep.tcp.local_addr().unwrap();
        let corpus = mk_corpus(&[]);
        let mut sel = Selector::new(Mode::Random, 0);

        let client = TcpStream::connect(addr).unwrap();
        drive_tcp(&ep.tcp, &corpus, &mut sel);

        // соединение принято и закрыто: ноль байт до EOF
        assert_eq!(read_all(client), b"");
    }

    #[test]
    fn tcp_ignores_client_payload() {
        let ep = bind_local();
        let addr = ep.tcp.local_addr().unwrap();
        let corpus = mk_corpus(&["quiet"]);
        let mut sel = Selector::new(Mode::Sequential, corpus.len());

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(b"GET / HTTP/1.0\r\n\r\n").unwrap();
        drive_tcp(&ep.tcp, &corpus, &mut sel);

        assert_eq!(read_all(client), b"quiet\n");
    }

    #[test]
    fn tcp_sequential_connections_walk_the_corpus() {
        let ep = bind_local();
        let addr = ep.tcp.local_addr().unwrap();
        let corpus = mk_corpus(&["q0", "q1", "q2"]);
        let mut sel = Selector::new(Mode::Sequential, corpus.len());

        let mut got = Vec::new();
        for _ in 0..4 {
            let client = TcpStream::connect(addr).unwrap();
            drive_tcp(&ep.tcp, &corpus, &mut sel);
            got.push(String::from_utf8(read_all(client)).unwrap());
        }
        assert_eq!(got, ["q0\n", "q1\n", "q2\n", "q0\n"]);
    }

    #[test]
    fn udp_replies_to_source_with_lf() {
        let ep = bind_local();
        let addr = ep.udp.local_addr().unwrap();
        let corpus = mk_corpus(&["pong"]);
        let mut sel = Selector::new(Mode::Sequential, corpus.len());

        let client = UdpSocket::bind("127.0.0.1:0").unwrap();
        client
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        client.send_to(b"payload is ignored", addr).unwrap();

        drive_udp(&ep.udp, &corpus, &mut sel);

        let mut buf = [0u8; 2048];
        let (n, src) = client.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"pong\n");
        assert_eq!(src, addr);
    }

    #[test]
    fn udp_empty_corpus_is_a_silent_drop() {
        let ep = bind_local();
        let addr = ep.udp.local_addr().unwrap();
        let corpus = mk_corpus(&[]);
        let mut sel = Selector::new(Mode::Random, 0);

        let client = UdpSocket::bind("127.0.0.1:0").unwrap();
        client
            .set_read_timeout(Some(Duration::from_millis(300)))
            .unwrap();
        client.send_to(b"anyone home?", addr).unwrap();

        drive_udp(&ep.udp, &corpus, &mut sel);

        let mut buf = [0u8; 64];
        assert!(client.recv_from(&mut buf).is_err(), "expected no reply");
    }

    #[test]
    fn udp_long_quote_is_truncated_with_trailing_lf() {
        let ep = bind_local();
        let addr = ep.udp.local_addr().unwrap();
        let long = "x".repeat(700);
        let corpus = mk_corpus(&[&long]);
        let mut sel = Selector::new(Mode::Sequential, corpus.len());

        let client = UdpSocket::bind("127.0.0.1:0").unwrap();
        client
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        client.send_to(b"", addr).unwrap();

        drive_udp(&ep.udp, &corpus, &mut sel);

        let mut buf = [0u8; 2048];
        let (n, _) = client.recv_from(&mut buf).unwrap();
        assert_eq!(n, MAX_UDP_REPLY_BYTES);
        assert_eq!(buf[n - 1], b'\n');
        assert!(buf[..n - 1].iter().all(|&b| b == b'x'));
    }

    #[test]
    fn udp_truncation_respects_char_boundaries() {
        let ep = bind_local();
        let addr = ep.udp.local_addr().unwrap();
        // 400 двухбайтных символов: 800 байт, лимит режет посреди символа
        let long = "я".repeat(400);
        let corpus = mk_corpus(&[&long]);
        let mut sel = Selector::new(Mode::Sequential, corpus.len());

        let client = UdpSocket::bind("127.0.0.1:0").unwrap();
        client
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        client.send_to(b"", addr).unwrap();

        drive_udp(&ep.udp, &corpus, &mut sel);

        let mut buf = [0u8; 2048];
        let (n, _) = client.recv_from(&mut buf).unwrap();
        assert!(n <= MAX_UDP_REPLY_BYTES);
        assert_eq!(buf[n - 1], b'\n');
        let text = std::str::from_utf8(&buf[..n - 1]).expect("reply must stay valid utf-8");
        assert!(text.chars().all(|c| c == 'я'));
    }

    #[test]
    fn bind_enables_address_reuse_on_both_sockets() {
        let ep = bind_local();
        assert!(socket2::SockRef::from(&ep.tcp).reuse_address().unwrap());
        assert!(socket2::SockRef::from(&ep.udp).reuse_address().unwrap());
    }

    #[test]
    fn would_block_is_not_an_event() {
        let ep = bind_local();
        let corpus = mk_corpus(&["idle"]);
        let mut sel = Selector::new(Mode::Random, corpus.len());

        assert!(!serve_tcp_once(&ep.tcp, &corpus, &mut sel));
        assert!(!serve_udp_once(&ep.udp, &corpus, &mut sel));
    }
}
