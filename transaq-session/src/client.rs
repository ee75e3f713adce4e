//! Transaq connector bridge client.
//!
//! `TransaqClient` owns the bridge link: it dials the bridge, spawns the
//! reader task and sends commands. The channel senders live as long as the
//! client, so a reconnect swaps the socket underneath without disturbing the
//! consumer's [`SessionEvents`].

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::command::{Command, ConnectParams};
use crate::errors::{Result, SessionError};
use crate::events::{self, EventSenders, SessionEvents};
use crate::models::security::{CandleKind, Security};
use crate::models::status::ServerStatus;
use crate::reader::MessageReader;
use crate::session::{Session, SessionData};
use crate::transport::{self, TransportWriter};

// ============================================================================
// TransaqClient
// ============================================================================

/// Async client for a Transaq connector bridge.
///
/// ## Usage
///
/// ```rust,ignore
/// let (client, mut events) = TransaqClient::connect("127.0.0.1:50051", params).await?;
///
/// while let Some(status) = events.server_status.recv().await {
///     println!("connected: {}", status.connected);
/// }
/// ```
pub struct TransaqClient {
    addr: String,
    params: ConnectParams,
    senders: EventSenders,
    data: Arc<Mutex<SessionData>>,
    writer: Mutex<Option<TransportWriter>>,
    reader_handle: Mutex<Option<JoinHandle<()>>>,
}

impl TransaqClient {
    /// Dial the bridge, start the reader task and send `connect`.
    ///
    /// Returns the client and the event bundle. The server replies with a
    /// `server_status` event once the login completes.
    pub async fn connect(addr: &str, params: ConnectParams) -> Result<(Self, SessionEvents)> {
        let (senders, events) = events::channel();
        let client = Self {
            addr: addr.to_string(),
            params,
            senders,
            data: Arc::new(Mutex::new(SessionData::default())),
            writer: Mutex::new(None),
            reader_handle: Mutex::new(None),
        };

        client.dial().await?;
        client
            .send_command(Command::Connect(client.params.clone()))
            .await?;

        tracing::info!(addr, login = %client.params.login, "connect command sent");
        Ok((client, events))
    }

    async fn dial(&self) -> Result<()> {
        let (reader, writer) = transport::connect(&self.addr).await?;
        // Marked up before the reader starts so an immediate EOF wins.
        self.data.lock().await.link_up = true;
        *self.writer.lock().await = Some(writer);

        let handle =
            MessageReader::new(reader, self.senders.clone(), Arc::clone(&self.data)).spawn();
        if let Some(previous) = self.reader_handle.lock().await.replace(handle) {
            previous.abort();
        }
        Ok(())
    }

    async fn link_down(&self) -> bool {
        !self.data.lock().await.link_up || self.writer.lock().await.is_none()
    }

    /// Last server status seen by the reader.
    pub async fn status(&self) -> ServerStatus {
        self.data.lock().await.status.clone()
    }

    /// Send `disconnect` and close the link.
    pub async fn disconnect(&self) {
        if let Err(e) = self.send_command(Command::Disconnect).await {
            tracing::debug!("disconnect command not delivered: {e}");
        }
        if let Some(mut writer) = self.writer.lock().await.take() {
            writer.shutdown().await;
        }
        if let Some(handle) = self.reader_handle.lock().await.take() {
            handle.abort();
        }
        tracing::info!("Disconnected from connector bridge");
    }
}

#[async_trait]
impl Session for TransaqClient {
    async fn send_command(&self, command: Command) -> Result<()> {
        let body =
            serde_json::to_vec(&command).map_err(|e| SessionError::Encoding(e.to_string()))?;

        let mut guard = self.writer.lock().await;
        let writer = guard
            .as_mut()
            .ok_or_else(|| SessionError::Disconnected("bridge link is down".into()))?;

        if let Err(e) = writer.send_frame(&body).await {
            // Forget the broken socket so the next reconnect dials again.
            *guard = None;
            return Err(e);
        }

        tracing::debug!(command = command.name(), "command sent");
        Ok(())
    }

    async fn reconnect(&self) -> Result<()> {
        if self.link_down().await {
            tracing::info!(addr = %self.addr, "re-dialing connector bridge");
            self.dial().await?;
        }
        self.send_command(Command::Connect(self.params.clone()))
            .await
    }

    async fn securities(&self) -> Vec<Security> {
        self.data.lock().await.securities.values().cloned().collect()
    }

    async fn candle_kinds(&self) -> Vec<CandleKind> {
        self.data.lock().await.candle_kinds.clone()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::encode_frame;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    async fn read_command(stream: &mut TcpStream) -> serde_json::Value {
        let mut header = [0u8; 4];
        stream.read_exact(&mut header).await.unwrap();
        let mut body = vec![0u8; u32::from_be_bytes(header) as usize];
        stream.read_exact(&mut body).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn params() -> ConnectParams {
        ConnectParams {
            login: "demo".into(),
            password: "secret".into(),
            host: "tr1-demo5.finam.ru".into(),
            port: 3939,
            ..ConnectParams::default()
        }
    }

    #[tokio::test]
    async fn connect_sends_login_and_caches_universe() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let bridge = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let connect = read_command(&mut stream).await;
            for body in [
                r#"{"kind":"securities","data":[{"secid":2,"seccode":"GAZP","board":"TQBR"},{"secid":1,"seccode":"SBER","board":"TQBR"}]}"#,
                r#"{"kind":"candlekinds","data":[{"id":1,"period":60,"name":"1 minute"}]}"#,
                r#"{"kind":"server_status","data":{"connected":"true"}}"#,
            ] {
                stream
                    .write_all(&encode_frame(body.as_bytes()).unwrap())
                    .await
                    .unwrap();
            }
            (connect, stream)
        });

        let (client, mut events) = TransaqClient::connect(&addr, params()).await.unwrap();
        let (connect, _stream) = bridge.await.unwrap();
        assert_eq!(connect["id"], "connect");
        assert_eq!(connect["login"], "demo");
        assert_eq!(connect["port"], 3939);

        let status = events.server_status.recv().await.unwrap();
        assert!(status.connected.is_connected());

        let codes: Vec<String> = client
            .securities()
            .await
            .into_iter()
            .map(|s| s.sec_code)
            .collect();
        assert_eq!(codes, vec!["SBER", "GAZP"]);
        assert_eq!(client.candle_kinds().await.len(), 1);
        assert!(client.status().await.connected.is_connected());
    }

    #[tokio::test]
    async fn reconnect_redials_after_bridge_drop() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let bridge = tokio::spawn(async move {
            // First link: read connect, then drop.
            let (mut first, _) = listener.accept().await.unwrap();
            read_command(&mut first).await;
            drop(first);

            // Second link: reconnect sends connect again.
            let (mut second, _) = listener.accept().await.unwrap();
            read_command(&mut second).await
        });

        let (client, mut events) = TransaqClient::connect(&addr, params()).await.unwrap();

        let lost = events.server_status.recv().await.unwrap();
        assert!(!lost.connected.is_connected());

        client.reconnect().await.unwrap();
        let again = bridge.await.unwrap();
        assert_eq!(again["id"], "connect");
    }

    #[tokio::test]
    async fn connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let result = TransaqClient::connect(&addr, params()).await;
        assert!(matches!(result, Err(SessionError::Connection(_))));
    }
}
