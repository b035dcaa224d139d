//! Minimal Socket.IO client (protocol v5 over Engine.IO v4 HTTP long-polling)
//! for the axis server's event stream. Only the default namespace and
//! server-to-client events are supported.

use crate::domain::ports::{EventConnector, EventStream, ServerEvent};
use crate::utils::error::{BridgeError, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::time::Duration;
use url::Url;

/// Engine.IO payload separator for HTTP polling.
const RECORD_SEPARATOR: char = '\u{1e}';

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OpenHandshake {
    pub sid: String,
    #[serde(rename = "pingInterval", default = "default_ping_interval")]
    pub ping_interval: u64,
    #[serde(rename = "pingTimeout", default = "default_ping_timeout")]
    pub ping_timeout: u64,
}

fn default_ping_interval() -> u64 {
    25_000
}

fn default_ping_timeout() -> u64 {
    20_000
}

impl OpenHandshake {
    /// Long-poll requests must return within one ping cycle.
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_interval + self.ping_timeout)
    }
}

/// Engine.IO packet, with Socket.IO messages decoded in place.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Open(String),
    Close,
    Ping,
    Pong,
    Noop,
    Connect,
    ConnectError(String),
    Disconnect,
    Event(ServerEvent),
    Other(String),
}

pub fn split_payload(body: &str) -> impl Iterator<Item = &str> {
    body.split(RECORD_SEPARATOR).filter(|packet| !packet.is_empty())
}

pub fn decode_packet(packet: &str) -> Result<Packet> {
    let mut chars = packet.chars();
    let kind = chars
        .next()
        .ok_or_else(|| BridgeError::protocol("empty Engine.IO packet"))?;
    let data = chars.as_str();

    Ok(match kind {
        '0' => Packet::Open(data.to_string()),
        '1' => Packet::Close,
        '2' => Packet::Ping,
        '3' => Packet::Pong,
        '4' => decode_message(data)?,
        '6' => Packet::Noop,
        _ => Packet::Other(packet.to_string()),
    })
}

fn decode_message(data: &str) -> Result<Packet> {
    let mut chars = data.chars();
    let kind = chars
        .next()
        .ok_or_else(|| BridgeError::protocol("empty Socket.IO packet"))?;
    let rest = chars.as_str();

    Ok(match kind {
        '0' => Packet::Connect,
        '1' => Packet::Disconnect,
        '2' => Packet::Event(decode_event(rest)?),
        '4' => Packet::ConnectError(rest.to_string()),
        _ => Packet::Other(data.to_string()),
    })
}

/// `[optional ack id]["name", payload]`, default namespace only.
fn decode_event(rest: &str) -> Result<ServerEvent> {
    let json = rest.trim_start_matches(|c: char| c.is_ascii_digit());
    let mut items = match serde_json::from_str::<Value>(json)? {
        Value::Array(items) => items.into_iter(),
        other => {
            return Err(BridgeError::protocol(format!(
                "event packet is not an array: {}",
                other
            )))
        }
    };

    let name = match items.next() {
        Some(Value::String(name)) => name,
        _ => return Err(BridgeError::protocol("event packet without a name")),
    };

    Ok(ServerEvent {
        name,
        payload: items.next().unwrap_or(Value::Null),
    })
}

pub fn parse_open(data: &str) -> Result<OpenHandshake> {
    serde_json::from_str(data)
        .map_err(|e| BridgeError::handshake(format!("invalid open packet: {}", e)))
}

#[derive(Debug, Clone)]
pub struct SocketIoConnector {
    endpoint: Url,
    client: Client,
}

impl SocketIoConnector {
    pub fn new(server: &str) -> Result<Self> {
        Self::with_client(server, Client::new())
    }

    pub fn with_client(server: &str, client: Client) -> Result<Self> {
        let mut base = Url::parse(server)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join("socket.io/")?;
        Ok(Self { endpoint, client })
    }

    fn polling_url(&self, sid: Option<&str>) -> Url {
        polling_url(&self.endpoint, sid)
    }
}

fn polling_url(endpoint: &Url, sid: Option<&str>) -> Url {
    let mut url = endpoint.clone();
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("EIO", "4").append_pair("transport", "polling");
        if let Some(sid) = sid {
            query.append_pair("sid", sid);
        }
    }
    url
}

#[async_trait::async_trait]
impl EventConnector for SocketIoConnector {
    async fn connect(&self) -> Result<Box<dyn EventStream>> {
        let body = self
            .client
            .get(self.polling_url(None))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let first = split_payload(&body)
            .next()
            .ok_or_else(|| BridgeError::handshake("empty handshake response"))?;
        let handshake = match decode_packet(first)? {
            Packet::Open(data) => parse_open(&data)?,
            other => {
                return Err(BridgeError::handshake(format!(
                    "expected open packet, got {:?}",
                    other
                )))
            }
        };
        tracing::debug!("Engine.IO session opened: {}", handshake.sid);

        let stream = SocketIoStream {
            client: self.client.clone(),
            url: self.polling_url(Some(&handshake.sid)),
            poll_timeout: handshake.poll_timeout(),
            pending: VecDeque::new(),
            closed: false,
        };
        // join the default namespace
        stream.send("40").await?;

        Ok(Box::new(stream))
    }
}

pub struct SocketIoStream {
    client: Client,
    url: Url,
    poll_timeout: Duration,
    pending: VecDeque<ServerEvent>,
    closed: bool,
}

impl SocketIoStream {
    async fn send(&self, packet: &str) -> Result<()> {
        self.client
            .post(self.url.clone())
            .header(reqwest::header::CONTENT_TYPE, "text/plain;charset=UTF-8")
            .body(packet.to_string())
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn poll(&mut self) -> Result<()> {
        let body = self
            .client
            .get(self.url.clone())
            .timeout(self.poll_timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        for raw in split_payload(&body) {
            match decode_packet(raw) {
                Ok(Packet::Ping) => self.send("3").await?,
                Ok(Packet::Close) | Ok(Packet::Disconnect) => self.closed = true,
                Ok(Packet::ConnectError(reason)) => {
                    return Err(BridgeError::handshake(format!(
                        "namespace connect refused: {}",
                        reason
                    )))
                }
                Ok(Packet::Event(event)) => self.pending.push_back(event),
                Ok(Packet::Connect) => tracing::debug!("Socket.IO namespace joined"),
                Ok(other) => tracing::debug!("Ignoring packet {:?}", other),
                Err(e) => tracing::warn!("Undecodable packet {:?}: {}", raw, e),
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl EventStream for SocketIoStream {
    async fn next_event(&mut self) -> Result<Option<ServerEvent>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }
            if self.closed {
                return Ok(None);
            }
            self.poll().await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_open_packet() {
        let packet = decode_packet(r#"0{"sid":"abc","upgrades":["websocket"],"pingInterval":25000,"pingTimeout":5000}"#)
            .unwrap();
        let Packet::Open(data) = packet else {
            panic!("expected open packet");
        };
        let handshake = parse_open(&data).unwrap();
        assert_eq!(handshake.sid, "abc");
        assert_eq!(handshake.poll_timeout(), Duration::from_millis(30_000));
    }

    #[test]
    fn test_malformed_open_is_handshake_error() {
        assert!(matches!(
            parse_open("not json"),
            Err(BridgeError::HandshakeError { .. })
        ));
    }

    #[test]
    fn test_decode_event_packet() {
        let packet = decode_packet(r#"42["position",{"id":"RA","tracking":true}]"#).unwrap();
        assert_eq!(
            packet,
            Packet::Event(ServerEvent {
                name: "position".to_string(),
                payload: json!({"id": "RA", "tracking": true}),
            })
        );
    }

    #[test]
    fn test_decode_event_with_ack_id() {
        let packet = decode_packet(r#"4212["position",{"id":"DEC"}]"#).unwrap();
        assert!(matches!(packet, Packet::Event(ServerEvent { ref name, .. }) if name == "position"));
    }

    #[test]
    fn test_control_packets() {
        assert_eq!(decode_packet("2").unwrap(), Packet::Ping);
        assert_eq!(decode_packet("1").unwrap(), Packet::Close);
        assert_eq!(decode_packet("41").unwrap(), Packet::Disconnect);
        assert_eq!(decode_packet(r#"40{"sid":"x"}"#).unwrap(), Packet::Connect);
        assert!(matches!(
            decode_packet(r#"44{"message":"nope"}"#).unwrap(),
            Packet::ConnectError(_)
        ));
        assert!(decode_packet(r#"42{"not":"array"}"#).is_err());
    }

    #[test]
    fn test_split_payload() {
        let body = "40{\"sid\":\"x\"}\u{1e}2\u{1e}42[\"position\",{}]";
        let packets: Vec<&str> = split_payload(body).collect();
        assert_eq!(packets, vec!["40{\"sid\":\"x\"}", "2", "42[\"position\",{}]"]);
    }

    #[test]
    fn test_polling_url() {
        let connector = SocketIoConnector::new("http://localhost:5000").unwrap();
        assert_eq!(
            connector.polling_url(Some("abc")).as_str(),
            "http://localhost:5000/socket.io/?EIO=4&transport=polling&sid=abc"
        );

        let nested = SocketIoConnector::new("http://example.com/axis").unwrap();
        assert_eq!(
            nested.polling_url(None).as_str(),
            "http://example.com/axis/socket.io/?EIO=4&transport=polling"
        );
    }
}
