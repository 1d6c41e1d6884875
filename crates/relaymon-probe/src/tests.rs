use crate::error::ProbeError;
use crate::http::{parse_ack, parse_event, HttpProbe, HttpProbeConfig};
use crate::{observe, Probe, ProbeOutcome};
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use relaymon_common::types::{ErrorKind, RelayErrorKind, SendErrorKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Canned HTTP responses: one for the origin, a sequence for the
/// destination (the last one repeats).
struct Stub {
    send: (u16, &'static str),
    relay: Vec<(u16, &'static str)>,
    polls: AtomicUsize,
}

impl Stub {
    fn respond(&self, path: &str) -> (u16, &'static str) {
        if path.starts_with("/send") {
            return self.send;
        }
        let n = self.polls.fetch_add(1, Ordering::SeqCst);
        self.relay[n.min(self.relay.len() - 1)]
    }
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    let text = String::from_utf8_lossy(&buf).to_string();
    text.split_whitespace().nth(1).unwrap_or("/").to_string()
}

async fn serve(stub: Stub) -> (String, Arc<Stub>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let stub = Arc::new(stub);
    let shared = Arc::clone(&stub);
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let stub = Arc::clone(&shared);
            tokio::spawn(async move {
                let path = read_request(&mut stream).await;
                let (status, body) = stub.respond(&path);
                let response = format!(
                    "HTTP/1.1 {status} STUB\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });
    (base, stub)
}

fn probe_for(base: &str, relay_timeout_secs: u64) -> HttpProbe {
    let mut config = HttpProbeConfig::new(format!("{base}/send"), format!("{base}/relayed"));
    config.token = Some("test-token".to_string());
    config.send_timeout_secs = 5;
    config.relay_timeout_secs = relay_timeout_secs;
    config.poll_interval_ms = 10;
    HttpProbe::new(config).unwrap()
}

#[tokio::test]
async fn test_http_probe_round_trip() {
    let (base, stub) = serve(Stub {
        send: (200, r#"{"message_id":"m-1","gas_used":"120000"}"#),
        relay: vec![
            (404, ""),
            (200, r#"{"message_id":"m-1","relayed":false}"#),
            (200, r#"{"message_id":"m-1","relayed":true,"gas_used":95000}"#),
        ],
        polls: AtomicUsize::new(0),
    })
    .await;

    let outcome = probe_for(&base, 30).probe().await.unwrap();
    assert_eq!(outcome.send_cost, Some(120_000));
    assert_eq!(outcome.relay_cost, Some(95_000));
    assert!(outcome.relayed_at >= outcome.sent_at);
    assert_eq!(stub.polls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_http_probe_rejected_send() {
    let (base, _) = serve(Stub {
        send: (500, r#"{"error":"nonce reused"}"#),
        relay: vec![(404, "")],
        polls: AtomicUsize::new(0),
    })
    .await;

    let err = probe_for(&base, 30).probe().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Send(SendErrorKind::Rejected));
    assert!(err.message.contains("nonce reused"));
}

#[tokio::test]
async fn test_http_probe_malformed_ack() {
    let (base, _) = serve(Stub {
        send: (200, r#"{"status":"queued"}"#),
        relay: vec![(404, "")],
        polls: AtomicUsize::new(0),
    })
    .await;

    let err = probe_for(&base, 30).probe().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Send(SendErrorKind::MalformedAck));
}

#[tokio::test]
async fn test_http_probe_relay_timeout() {
    let (base, stub) = serve(Stub {
        send: (200, r#"{"message_id":"m-2"}"#),
        relay: vec![(404, "")],
        polls: AtomicUsize::new(0),
    })
    .await;

    let err = probe_for(&base, 0).probe().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Relay(RelayErrorKind::RelayTimeout));
    assert!(err.message.contains("m-2"));
    assert_eq!(stub.polls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_http_probe_watch_failed() {
    let (base, _) = serve(Stub {
        send: (200, r#"{"message_id":"m-3"}"#),
        relay: vec![(503, "maintenance")],
        polls: AtomicUsize::new(0),
    })
    .await;

    let err = probe_for(&base, 30).probe().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Relay(RelayErrorKind::WatchFailed));
}

#[tokio::test]
async fn test_http_probe_unreachable_origin() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = probe_for(&base, 30).probe().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Send(SendErrorKind::EndpointUnreachable));
}

#[test]
fn test_parse_ack_and_event() {
    let ack = parse_ack(r#"{"message_id":"m-9","gas_used":"340282366920938463463374607431768211455"}"#).unwrap();
    assert_eq!(ack.gas_used, Some(u128::MAX));

    let err = parse_ack(r#"{"message_id":"  "}"#).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Send(SendErrorKind::MalformedAck));

    let event = parse_event(r#"{"message_id":"m-9"}"#).unwrap();
    assert!(event.relayed);
    assert_eq!(event.gas_used, None);

    let err = parse_event("<html>").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Relay(RelayErrorKind::MalformedEvent));
}

#[test]
fn test_config_defaults() {
    let config: HttpProbeConfig = serde_json::from_value(serde_json::json!({
        "origin_url": "https://origin.example.com/send",
        "destination_url": "https://destination.example.com/relayed",
    }))
    .unwrap();
    assert_eq!(config, HttpProbeConfig::new(
        "https://origin.example.com/send",
        "https://destination.example.com/relayed",
    ));
    assert_eq!(config.payload, "ping");
    assert_eq!(config.relay_timeout_secs, 600);
}

#[test]
fn test_latency_never_negative() {
    let t = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let outcome = ProbeOutcome {
        sent_at: t,
        relayed_at: t + Duration::milliseconds(2_500),
        send_cost: None,
        relay_cost: None,
    };
    assert_eq!(outcome.latency_ms(), 2_500.0);

    let skewed = ProbeOutcome {
        relayed_at: t - Duration::seconds(1),
        ..outcome
    };
    assert_eq!(skewed.latency_ms(), 0.0);
}

struct FixedProbe(Result<ProbeOutcome, ProbeError>);

#[async_trait]
impl Probe for FixedProbe {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn probe(&self) -> crate::error::Result<ProbeOutcome> {
        self.0.clone()
    }
}

#[tokio::test]
async fn test_observe_records_outcomes() {
    let t = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let ok = FixedProbe(Ok(ProbeOutcome {
        sent_at: t,
        relayed_at: t + Duration::seconds(4),
        send_cost: Some(60_000),
        relay_cost: Some(90_000),
    }));
    let obs = observe(&ok).await;
    assert!(obs.success);
    assert_eq!(obs.timestamp, t);
    assert_eq!(obs.latency_ms, Some(4_000.0));
    assert_eq!(obs.relay_cost, Some(90_000));

    let failing = FixedProbe(Err(ProbeError::relay(RelayErrorKind::RelayTimeout, "gave up")));
    let obs = observe(&failing).await;
    assert!(!obs.success);
    assert_eq!(obs.error_kind, Some(ErrorKind::Relay(RelayErrorKind::RelayTimeout)));
    assert_eq!(obs.error_message.as_deref(), Some("gave up"));
}
