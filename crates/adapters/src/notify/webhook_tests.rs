// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;

/// Accept one request, answer with `status`, return the request body
fn serve_once(status: u16) -> (String, std::thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/hook", listener.local_addr().unwrap());
    let handle = std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);
        let mut length = 0;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    length = value.trim().parse().unwrap();
                }
            }
        }
        let mut body = vec![0; length];
        reader.read_exact(&mut body).unwrap();
        let mut stream = reader.into_inner();
        write!(
            stream,
            "HTTP/1.1 {status} X\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
        )
        .unwrap();
        String::from_utf8(body).unwrap()
    });
    (url, handle)
}

#[tokio::test]
async fn posts_device_and_text_as_json() {
    let (url, server) = serve_once(204);
    let adapter = WebhookNotifyAdapter::new(url, Duration::from_secs(5));

    adapter.send("Mk3", "Printing. Whee!").await.unwrap();

    let body: serde_json::Value = serde_json::from_str(&server.join().unwrap()).unwrap();
    assert_eq!(body["device"], "Mk3");
    assert_eq!(body["text"], "Printing. Whee!");
}

#[tokio::test]
async fn error_status_is_a_send_failure() {
    let (url, server) = serve_once(500);
    let adapter = WebhookNotifyAdapter::new(url, Duration::from_secs(5));

    let result = adapter.send("Mk3", "hello").await;

    server.join().unwrap();
    assert!(matches!(result, Err(NotifyError::SendFailed(_))));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_send_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/hook", listener.local_addr().unwrap());
    drop(listener);

    let adapter = WebhookNotifyAdapter::new(url, Duration::from_secs(1));
    assert!(adapter.send("Mk3", "hello").await.is_err());
}
