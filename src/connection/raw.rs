//! Raw TCP access to the server under test, for the scenarios that need
//! byte-exact control over what goes on the wire and when.

use crate::configuration::settings::Settings;
use crate::error::CheckError;
use socket2::{Domain, Socket, Type};
use std::borrow::Cow;
use std::io::{self, ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

const PEEK_WINDOW: usize = 4096;
const HEAD_LIMIT: usize = 64 * 1024;

pub struct RawConnection {
    stream: TcpStream,
}

fn timed_out(error: &io::Error) -> bool {
    matches!(error.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

impl RawConnection {
    /// Connects to the first address the host resolves to that accepts,
    /// trying every address family. The socket gets a short abortive
    /// linger so rapid-fire connect/close cycles cannot overflow the
    /// server's listen backlog, plus bounded read/write timeouts.
    pub fn open(host: &str, port: u16, settings: &Settings) -> Result<Self, CheckError> {
        let addrs = (host, port).to_socket_addrs().map_err(|e| {
            CheckError::Connect(format!("cannot resolve {}:{}: {}", host, port, e))
        })?;
        let mut last_error = None;
        for addr in addrs {
            match Self::connect_one(&addr, settings) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(settings.read_timeout))?;
                    stream.set_write_timeout(Some(settings.read_timeout))?;
                    // no write batching; byte-wise scenarios depend on it
                    stream.set_nodelay(true)?;
                    return Ok(Self { stream });
                }
                Err(error) => last_error = Some(error),
            }
        }
        Err(CheckError::Connect(match last_error {
            Some(error) => format!("unable to connect to {}:{}: {}", host, port, error),
            None => format!("{}:{} resolved to no addresses", host, port),
        }))
    }

    fn connect_one(addr: &SocketAddr, settings: &Settings) -> io::Result<TcpStream> {
        let domain = match addr {
            SocketAddr::V4(_) => Domain::ipv4(),
            SocketAddr::V6(_) => Domain::ipv6(),
        };
        let socket = Socket::new(domain, Type::stream(), None)?;
        socket.set_linger(Some(settings.linger))?;
        socket.connect_timeout(&(*addr).into(), settings.connect_timeout)?;
        Ok(socket.into_tcp_stream())
    }

    pub fn send(&mut self, bytes: &[u8]) -> Result<(), CheckError> {
        self.stream.write_all(bytes)?;
        self.stream.flush()?;
        Ok(())
    }

    /// Non-consuming read: reports whatever has arrived without taking
    /// it off the socket. An empty result means nothing arrived within
    /// the timeout, which is exactly what the premature-response checks
    /// want to see.
    pub fn peek(&mut self, timeout: Duration) -> Result<Vec<u8>, CheckError> {
        self.stream.set_read_timeout(Some(timeout))?;
        let mut buffer = vec![0u8; PEEK_WINDOW];
        match self.stream.peek(&mut buffer) {
            Ok(received) => {
                buffer.truncate(received);
                Ok(buffer)
            }
            Err(error) if timed_out(&error) => Ok(Vec::new()),
            Err(error) => Err(error.into()),
        }
    }

    pub fn recv(&mut self, max: usize, timeout: Duration) -> Result<Vec<u8>, CheckError> {
        self.stream.set_read_timeout(Some(timeout))?;
        let mut buffer = vec![0u8; max];
        match self.stream.read(&mut buffer) {
            Ok(received) => {
                buffer.truncate(received);
                Ok(buffer)
            }
            Err(error) if timed_out(&error) => {
                Err(CheckError::TimedOut(format!("data within {:?}", timeout)))
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Drains the connection until the peer closes it. Going idle before
    /// EOF is an error; the HTTP/1.0 check relies on that to catch
    /// servers that fail to close after responding.
    pub fn read_until_eof(&mut self, idle: Duration) -> Result<Vec<u8>, CheckError> {
        self.stream.set_read_timeout(Some(idle))?;
        let mut data = Vec::new();
        let mut buffer = [0u8; 4096];
        loop {
            match self.stream.read(&mut buffer) {
                Ok(0) => return Ok(data),
                Ok(received) => data.extend_from_slice(&buffer[..received]),
                Err(error) if timed_out(&error) => {
                    return Err(CheckError::TimedOut(format!(
                        "EOF; the connection stayed open past {:?}",
                        idle
                    )))
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// Like `read_until_eof`, but going idle or being reset just ends
    /// the read. Used where any disposition short of a valid payload is
    /// acceptable and we only care what bytes made it across.
    pub fn drain(&mut self, idle: Duration) -> Result<Vec<u8>, CheckError> {
        self.stream.set_read_timeout(Some(idle))?;
        let mut data = Vec::new();
        let mut buffer = [0u8; 4096];
        loop {
            match self.stream.read(&mut buffer) {
                Ok(0) => return Ok(data),
                Ok(received) => data.extend_from_slice(&buffer[..received]),
                Err(error) if timed_out(&error) => return Ok(data),
                Err(error) if error.kind() == ErrorKind::ConnectionReset => return Ok(data),
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// Reads one HTTP response without consuming anything past it, so
    /// the connection stays usable for persistence checks. The body is
    /// framed by Content-Length when present and by EOF otherwise.
    pub fn read_response(&mut self, timeout: Duration) -> Result<RawResponse, CheckError> {
        self.stream.set_read_timeout(Some(timeout))?;
        let mut head = Vec::new();
        let mut byte = [0u8; 1];
        while !head.ends_with(b"\r\n\r\n") {
            match self.stream.read(&mut byte) {
                Ok(0) => {
                    return Err(CheckError::Protocol(
                        "connection closed before the response headers completed".to_owned(),
                    ))
                }
                Ok(_) => head.push(byte[0]),
                Err(error) if timed_out(&error) => {
                    return Err(CheckError::TimedOut("response headers".to_owned()))
                }
                Err(error) => return Err(error.into()),
            }
            if head.len() > HEAD_LIMIT {
                return Err(CheckError::Protocol(format!(
                    "response headers exceed {} bytes",
                    HEAD_LIMIT
                )));
            }
        }
        let mut response = RawResponse::parse_head(&head)?;
        response.body = match response.content_length() {
            Some(length) => {
                let mut body = vec![0u8; length];
                self.stream.read_exact(&mut body).map_err(|error| {
                    if timed_out(&error) {
                        CheckError::TimedOut("response body".to_owned())
                    } else {
                        CheckError::from(error)
                    }
                })?;
                body
            }
            None => self.read_until_eof(timeout)?,
        };
        Ok(response)
    }
}

pub struct RawResponse {
    pub status: u16,
    headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    fn parse_head(head: &[u8]) -> Result<Self, CheckError> {
        let text = String::from_utf8_lossy(head);
        let mut lines = text.split("\r\n");
        let status_line = lines.next().unwrap_or_default();
        let mut parts = status_line.splitn(3, ' ');
        let version = parts.next().unwrap_or_default();
        if !version.starts_with("HTTP/") {
            return Err(CheckError::Protocol(format!(
                "malformed status line: '{}'",
                status_line
            )));
        }
        let status = parts
            .next()
            .and_then(|code| code.parse::<u16>().ok())
            .ok_or_else(|| {
                CheckError::Protocol(format!("unparseable status code in '{}'", status_line))
            })?;
        let mut headers = Vec::new();
        for line in lines {
            if line.is_empty() {
                break;
            }
            if let Some(split_at) = line.find(':') {
                headers.push((
                    line[..split_at].trim().to_ascii_lowercase(),
                    line[split_at + 1..].trim().to_owned(),
                ));
            }
        }
        Ok(Self {
            status,
            headers,
            body: Vec::new(),
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn content_length(&self) -> Option<usize> {
        self.header("content-length").and_then(|value| value.parse().ok())
    }

    pub fn body_str(&self) -> Cow<str> {
        String::from_utf8_lossy(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::settings::Settings;
    use std::net::TcpListener;
    use std::thread;

    fn quick_settings() -> Settings {
        let mut settings = Settings::default();
        settings.connect_timeout = Duration::from_secs(2);
        settings.read_timeout = Duration::from_secs(2);
        settings.peek_timeout = Duration::from_millis(300);
        settings
    }

    fn scripted<F>(script: F) -> SocketAddr
    where
        F: FnOnce(TcpStream) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((stream, _)) = listener.accept() {
                script(stream);
            }
        });
        addr
    }

    #[test]
    fn test_open_fails_when_nothing_listens() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = RawConnection::open("127.0.0.1", addr.port(), &quick_settings());
        assert!(matches!(result, Err(CheckError::Connect(_))));
    }

    #[test]
    fn test_peek_is_empty_until_data_arrives_and_does_not_consume() {
        let addr = scripted(|mut stream| {
            let mut buffer = [0u8; 64];
            let _ = stream.read(&mut buffer);
            let _ = stream.write_all(b"pong");
            thread::sleep(Duration::from_millis(500));
        });
        let settings = quick_settings();
        let mut connection = RawConnection::open("127.0.0.1", addr.port(), &settings).unwrap();

        let silent = connection.peek(Duration::from_millis(200)).unwrap();
        assert!(silent.is_empty());

        connection.send(b"ping").unwrap();
        thread::sleep(Duration::from_millis(200));
        let peeked = connection.peek(Duration::from_secs(1)).unwrap();
        assert_eq!(peeked, b"pong");
        // peeking must not have consumed anything
        let received = connection.recv(64, Duration::from_secs(1)).unwrap();
        assert_eq!(received, b"pong");
    }

    #[test]
    fn test_recv_times_out_on_a_silent_peer() {
        let addr = scripted(|_stream| {
            thread::sleep(Duration::from_millis(800));
        });
        let settings = quick_settings();
        let mut connection = RawConnection::open("127.0.0.1", addr.port(), &settings).unwrap();
        let result = connection.recv(64, Duration::from_millis(200));
        assert!(matches!(result, Err(CheckError::TimedOut(_))));
    }

    #[test]
    fn test_read_until_eof_collects_everything() {
        let addr = scripted(|mut stream| {
            let _ = stream.write_all(b"part one ");
            thread::sleep(Duration::from_millis(100));
            let _ = stream.write_all(b"part two");
        });
        let settings = quick_settings();
        let mut connection = RawConnection::open("127.0.0.1", addr.port(), &settings).unwrap();
        let data = connection.read_until_eof(Duration::from_secs(2)).unwrap();
        assert_eq!(data, b"part one part two");
    }

    #[test]
    fn test_read_until_eof_fails_if_peer_never_closes() {
        let addr = scripted(|mut stream| {
            let _ = stream.write_all(b"still here");
            thread::sleep(Duration::from_secs(2));
        });
        let settings = quick_settings();
        let mut connection = RawConnection::open("127.0.0.1", addr.port(), &settings).unwrap();
        let result = connection.read_until_eof(Duration::from_millis(300));
        assert!(matches!(result, Err(CheckError::TimedOut(_))));
    }

    #[test]
    fn test_drain_returns_partial_data_on_idle() {
        let addr = scripted(|mut stream| {
            let _ = stream.write_all(b"partial");
            thread::sleep(Duration::from_secs(2));
        });
        let settings = quick_settings();
        let mut connection = RawConnection::open("127.0.0.1", addr.port(), &settings).unwrap();
        let data = connection.drain(Duration::from_millis(300)).unwrap();
        assert_eq!(data, b"partial");
    }

    #[test]
    fn test_read_response_preserves_the_connection_for_reuse() {
        let addr = scripted(|mut stream| {
            for _ in 0..2 {
                let mut buffer = [0u8; 256];
                let _ = stream.read(&mut buffer);
                let _ = stream.write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 5\r\n\r\nfirst",
                );
            }
        });
        let settings = quick_settings();
        let mut connection = RawConnection::open("127.0.0.1", addr.port(), &settings).unwrap();

        for _ in 0..2 {
            connection.send(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n").unwrap();
            let response = connection.read_response(Duration::from_secs(2)).unwrap();
            assert_eq!(response.status, 200);
            assert_eq!(response.header("content-type"), Some("application/json"));
            assert_eq!(response.body_str(), "first");
        }
    }

    #[test]
    fn test_read_response_falls_back_to_eof_framing() {
        let addr = scripted(|mut stream| {
            let mut buffer = [0u8; 256];
            let _ = stream.read(&mut buffer);
            let _ = stream.write_all(b"HTTP/1.0 404 Not Found\r\n\r\ngone away");
        });
        let settings = quick_settings();
        let mut connection = RawConnection::open("127.0.0.1", addr.port(), &settings).unwrap();
        connection.send(b"GET /nope HTTP/1.0\r\n\r\n").unwrap();
        let response = connection.read_response(Duration::from_secs(2)).unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.body_str(), "gone away");
    }

    #[test]
    fn test_read_response_rejects_non_http_preamble() {
        let addr = scripted(|mut stream| {
            let mut buffer = [0u8; 256];
            let _ = stream.read(&mut buffer);
            let _ = stream.write_all(b"SMTP ready\r\n\r\n");
        });
        let settings = quick_settings();
        let mut connection = RawConnection::open("127.0.0.1", addr.port(), &settings).unwrap();
        connection.send(b"GET / HTTP/1.1\r\n\r\n").unwrap();
        let result = connection.read_response(Duration::from_secs(2));
        assert!(matches!(result, Err(CheckError::Protocol(_))));
    }
}
