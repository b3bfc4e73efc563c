use crate::connection::{Exchange, WireResponse};
use crate::error::CheckError;
use reqwest::blocking::Client;
use reqwest::Method;

impl Exchange for Client {
    fn exchange(&self, method: Method, url: &str) -> Result<WireResponse, CheckError> {
        let response = self.request(method, url).send().map_err(classify)?;
        let status = response.status();
        let body = response.bytes().map_err(classify)?;
        trace!("Received {} with {} body bytes from {}", status, body.len(), url);
        Ok(WireResponse { status, body })
    }
}

fn classify(error: reqwest::Error) -> CheckError {
    if error.is_timeout() {
        CheckError::TimedOut(format!("http exchange: {}", error))
    } else {
        CheckError::Connect(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use crate::connection::Exchange;
    use reqwest::blocking::Client;
    use reqwest::{Method, StatusCode};
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_exchange_reads_status_and_body() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buffer = [0u8; 1024];
            let _ = stream.read(&mut buffer);
            let _ = stream.write_all(
                b"HTTP/1.1 200 OK\r\nContent-Length: 7\r\nConnection: close\r\n\r\ngranted",
            );
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        let response = client
            .exchange(Method::GET, &format!("http://{}/probe", addr))
            .unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body_str(), "granted");
    }

    #[test]
    fn test_exchange_reports_refused_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
            .unwrap();
        let result = client.exchange(Method::GET, &format!("http://{}/probe", addr));
        assert!(result.is_err());
    }
}
