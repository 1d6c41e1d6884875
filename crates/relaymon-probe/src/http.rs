use crate::error::{ProbeError, Result};
use crate::{Probe, ProbeOutcome};
use async_trait::async_trait;
use chrono::Utc;
use relaymon_common::id::next_id;
use relaymon_common::types::{RelayErrorKind, SendErrorKind};
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

const MAX_ERROR_BODY: usize = 512;

/// Endpoints, credentials and timeouts for [`HttpProbe`].
///
/// The origin accepts `POST {"payload", "nonce"}` and answers with
/// `{"message_id", "gas_used"?}`. The destination answers
/// `GET ?message_id=...` with `404` until the message has been relayed,
/// then `{"message_id", "relayed", "gas_used"?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpProbeConfig {
    pub origin_url: String,
    pub destination_url: String,
    /// Bearer token sent to both endpoints.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_payload")]
    pub payload: String,
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
    #[serde(default = "default_relay_timeout_secs")]
    pub relay_timeout_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_payload() -> String {
    "ping".to_string()
}

fn default_send_timeout_secs() -> u64 {
    30
}

fn default_relay_timeout_secs() -> u64 {
    600
}

fn default_poll_interval_ms() -> u64 {
    2000
}

impl HttpProbeConfig {
    pub fn new(origin_url: impl Into<String>, destination_url: impl Into<String>) -> Self {
        Self {
            origin_url: origin_url.into(),
            destination_url: destination_url.into(),
            token: None,
            payload: default_payload(),
            send_timeout_secs: default_send_timeout_secs(),
            relay_timeout_secs: default_relay_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    payload: &'a str,
    nonce: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SendAck {
    pub message_id: String,
    #[serde(default, deserialize_with = "deserialize_gas")]
    pub gas_used: Option<u128>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RelayEvent {
    pub message_id: String,
    #[serde(default = "default_relayed")]
    pub relayed: bool,
    #[serde(default, deserialize_with = "deserialize_gas")]
    pub gas_used: Option<u128>,
}

fn default_relayed() -> bool {
    true
}

/// Gas may arrive as a JSON number or as a decimal string (for values
/// beyond what JSON numbers carry safely).
fn deserialize_gas<'de, D>(deserializer: D) -> std::result::Result<Option<u128>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum GasInput {
        Number(u64),
        Text(String),
    }

    match Option::<GasInput>::deserialize(deserializer)? {
        None => Ok(None),
        Some(GasInput::Number(n)) => Ok(Some(u128::from(n))),
        Some(GasInput::Text(s)) => s
            .trim()
            .parse::<u128>()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid gas value '{s}': {e}"))),
    }
}

pub(crate) fn parse_ack(body: &str) -> Result<SendAck> {
    let ack: SendAck = serde_json::from_str(body)
        .map_err(|e| ProbeError::send(SendErrorKind::MalformedAck, format!("invalid acknowledgement: {e}")))?;
    if ack.message_id.trim().is_empty() {
        return Err(ProbeError::send(
            SendErrorKind::MalformedAck,
            "acknowledgement has an empty message_id",
        ));
    }
    Ok(ack)
}

pub(crate) fn parse_event(body: &str) -> Result<RelayEvent> {
    serde_json::from_str(body)
        .map_err(|e| ProbeError::relay(RelayErrorKind::MalformedEvent, format!("invalid relay event: {e}")))
}

fn short(body: &str) -> &str {
    let mut end = body.len().min(MAX_ERROR_BODY);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

fn classify_send_error(e: &reqwest::Error) -> SendErrorKind {
    if e.is_timeout() {
        SendErrorKind::AckTimeout
    } else if e.is_decode() {
        SendErrorKind::MalformedAck
    } else {
        SendErrorKind::EndpointUnreachable
    }
}

/// Probe that submits a message to an HTTP origin and polls an HTTP
/// destination until the relayed counterpart shows up.
pub struct HttpProbe {
    client: reqwest::Client,
    config: HttpProbeConfig,
}

impl HttpProbe {
    pub fn new(config: HttpProbeConfig) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.send_timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpProbeConfig {
        &self.config
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, nonce: &str) -> Result<SendAck> {
        let request = self.client.post(self.config.origin_url.as_str()).json(&SendRequest {
            payload: &self.config.payload,
            nonce,
        });
        let resp = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| ProbeError::send(classify_send_error(&e), e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ProbeError::send(classify_send_error(&e), e.to_string()))?;
        if !status.is_success() {
            return Err(ProbeError::send(
                SendErrorKind::Rejected,
                format!("origin returned {status}: {}", short(&body)),
            ));
        }
        parse_ack(&body)
    }

    /// Polls once. `Ok(None)` means the message has not been relayed yet.
    async fn poll(&self, message_id: &str) -> Result<Option<RelayEvent>> {
        let request = self
            .client
            .get(self.config.destination_url.as_str())
            .query(&[("message_id", message_id)]);
        let resp = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| ProbeError::relay(RelayErrorKind::WatchFailed, e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let body = resp
            .text()
            .await
            .map_err(|e| ProbeError::relay(RelayErrorKind::WatchFailed, e.to_string()))?;
        if !status.is_success() {
            return Err(ProbeError::relay(
                RelayErrorKind::WatchFailed,
                format!("destination returned {status}: {}", short(&body)),
            ));
        }

        let event = parse_event(&body)?;
        if !event.relayed || event.message_id != message_id {
            return Ok(None);
        }
        Ok(Some(event))
    }

    async fn wait_for_relay(&self, message_id: &str) -> Result<RelayEvent> {
        let relay_timeout = Duration::from_secs(self.config.relay_timeout_secs);
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);
        let deadline = tokio::time::Instant::now() + relay_timeout;

        loop {
            if let Some(event) = self.poll(message_id).await? {
                return Ok(event);
            }
            let now = tokio::time::Instant::now();
            if now >= deadline {
                return Err(ProbeError::relay(
                    RelayErrorKind::RelayTimeout,
                    format!(
                        "message {message_id} not relayed within {}s",
                        relay_timeout.as_secs()
                    ),
                ));
            }
            tokio::time::sleep(poll_interval.min(deadline - now)).await;
        }
    }
}

#[async_trait]
impl Probe for HttpProbe {
    fn name(&self) -> &str {
        "http"
    }

    async fn probe(&self) -> Result<ProbeOutcome> {
        let nonce = next_id();
        let ack = self.send(&nonce).await?;
        let sent_at = Utc::now();
        tracing::debug!(message_id = %ack.message_id, nonce = %nonce, "Probe message sent");

        let event = self.wait_for_relay(&ack.message_id).await?;
        let relayed_at = Utc::now();
        tracing::debug!(message_id = %event.message_id, "Relayed counterpart observed");

        Ok(ProbeOutcome {
            sent_at,
            relayed_at,
            send_cost: ack.gas_used,
            relay_cost: event.gas_used,
        })
    }
}
