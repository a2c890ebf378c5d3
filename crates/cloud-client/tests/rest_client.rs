//! Integration test: boots a one-shot in-process HTTP server that plays the
//! cloud key endpoint, points a real [`RestCloudClient`] at it and checks
//! the request it sends plus the response it parses.

use std::net::SocketAddr;

use sl_cloud::{CredentialApi, RestCloudClient};
use sl_domain::config::CloudConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Serve exactly one request with `status` and `body`; deliver the raw
/// request text through the returned receiver.
async fn one_shot_server(status: u16, body: &'static str) -> (SocketAddr, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        // Read headers, then as much body as Content-Length announces.
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(idx) = text.find("\r\n\r\n") {
                let content_length = text[..idx]
                    .lines()
                    .find_map(|l| {
                        let (k, v) = l.split_once(':')?;
                        k.eq_ignore_ascii_case("content-length")
                            .then(|| v.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= idx + 4 + content_length {
                    break;
                }
            }
        }

        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());

        let reason = if status == 200 { "OK" } else { "Error" };
        let resp = format!(
            "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(resp.as_bytes()).await.unwrap();
        stream.shutdown().await.ok();
    });

    (addr, rx)
}

fn client_for(addr: SocketAddr) -> RestCloudClient {
    let cfg = CloudConfig {
        base_url: format!("http://{addr}"),
        token_env: "SL_TEST_TOKEN_THAT_IS_NOT_SET".into(),
        timeout_ms: 5_000,
        country: "DE".into(),
    };
    RestCloudClient::new(&cfg).unwrap().with_token("tok-123")
}

#[tokio::test]
async fn posts_station_serial_and_parses_keys() {
    let body = r#"{"code":0,"msg":"Succeed.","data":{"dsk_keys":[{"station_sn":"T8010P1","dsk_key":"k-1","expiration":1900000000}],"enabled":true}}"#;
    let (addr, request_rx) = one_shot_server(200, body).await;
    let client = client_for(addr);

    let resp = client.fetch_credentials("T8010P1").await.unwrap();
    assert_eq!(resp.status, 200);
    let body = resp.body.unwrap();
    assert_eq!(body.key_for("T8010P1").unwrap().dsk_key, "k-1");

    let request = request_rx.await.unwrap();
    let lower = request.to_ascii_lowercase();
    assert!(request.starts_with("POST /v1/app/equipment/get_dsk_keys"));
    assert!(lower.contains("x-auth-token: tok-123"));
    assert!(lower.contains("country: de"));
    assert!(lower.contains("x-trace-id:"));
    assert!(request.contains(r#""station_sns":["T8010P1"]"#));
}

#[tokio::test]
async fn non_success_status_is_reported_not_raised() {
    let (addr, _rx) = one_shot_server(401, r#"{"code":26006,"msg":"token expired"}"#).await;
    let client = client_for(addr);

    let resp = client.fetch_credentials("T8010P1").await.unwrap();
    assert_eq!(resp.status, 401);
    assert_eq!(resp.body.unwrap().code, 26006);
}

#[tokio::test]
async fn unreachable_host_is_an_error() {
    // Bind then drop to get a port nobody listens on.
    let addr = {
        let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
        l.local_addr().unwrap()
    };
    let client = client_for(addr);
    assert!(client.fetch_credentials("T8010P1").await.is_err());
}
