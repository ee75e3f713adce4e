//! Async frame reader for the connector bridge.
//!
//! Spawns a tokio task that reads frames, decodes them into [`Inbound`]
//! values, records reference data in the shared [`SessionData`] and routes
//! every event to the typed channels.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::errors::SessionError;
use crate::events::{EventSenders, Inbound};
use crate::models::status::{ConnectionState, ServerStatus};
use crate::session::SessionData;
use crate::transport::TransportReader;

/// Reader task state.
pub struct MessageReader {
    transport_reader: TransportReader,
    senders: EventSenders,
    data: Arc<Mutex<SessionData>>,
}

impl MessageReader {
    pub fn new(
        transport_reader: TransportReader,
        senders: EventSenders,
        data: Arc<Mutex<SessionData>>,
    ) -> Self {
        Self {
            transport_reader,
            senders,
            data,
        }
    }

    /// Spawn the reader task.
    ///
    /// The task runs until the connection closes or every receiver is
    /// dropped. A closed connection is reported downstream as a
    /// `Disconnected` server status.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(mut self) {
        loop {
            match self.transport_reader.read_frame().await {
                Ok(frame) => {
                    let inbound: Inbound = match serde_json::from_slice(&frame) {
                        Ok(inbound) => inbound,
                        Err(e) => {
                            tracing::warn!(error = %e, len = frame.len(), "skipping undecodable frame");
                            continue;
                        }
                    };
                    self.record(&inbound).await;
                    if !self.senders.route(inbound) {
                        tracing::debug!("event receiver dropped, reader stopping");
                        break;
                    }
                }
                Err(SessionError::Disconnected(reason)) => {
                    tracing::info!("bridge disconnected: {reason}");
                    self.report_lost(reason).await;
                    break;
                }
                Err(e) => {
                    tracing::error!("reader error: {e}");
                    self.report_lost(e.to_string()).await;
                    break;
                }
            }
        }
    }

    async fn record(&self, inbound: &Inbound) {
        match inbound {
            Inbound::ServerStatus(status) => {
                self.data.lock().await.status = status.clone();
            }
            Inbound::Securities(securities) => {
                self.data.lock().await.upsert_securities(securities);
            }
            Inbound::CandleKinds(kinds) => {
                self.data.lock().await.candle_kinds = kinds.clone();
            }
            _ => {}
        }
    }

    async fn report_lost(&self, reason: String) {
        let status = ServerStatus {
            connected: ConnectionState::Disconnected,
            message: Some(reason),
            ..ServerStatus::default()
        };
        {
            let mut data = self.data.lock().await;
            data.link_up = false;
            data.status = status.clone();
        }
        let _ = self.senders.server_status.send(status);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{self, Response};
    use crate::transport::{self, encode_frame};
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    /// Start a bridge that writes the given JSON bodies and then closes.
    async fn mock_bridge(bodies: Vec<&'static str>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            for body in bodies {
                stream
                    .write_all(&encode_frame(body.as_bytes()).unwrap())
                    .await
                    .unwrap();
            }
            drop(stream);
        });

        addr
    }

    #[tokio::test]
    async fn reader_routes_and_caches() {
        let addr = mock_bridge(vec![
            r#"{"kind":"server_status","data":{"connected":"true"}}"#,
            r#"{"kind":"securities","data":[{"secid":1,"active":true,"seccode":"SBER","board":"TQBR"}]}"#,
            r#"not json"#,
            r#"{"kind":"candlekinds","data":[{"id":1,"period":60,"name":"1 minute"}]}"#,
        ])
        .await;

        let (reader_half, _writer) = transport::connect(&addr).await.unwrap();
        let (senders, mut rx) = events::channel();
        let data = Arc::new(Mutex::new(SessionData::default()));
        let handle = MessageReader::new(reader_half, senders, Arc::clone(&data)).spawn();
        handle.await.unwrap();

        // Connected, then Disconnected on EOF
        assert!(rx.server_status.recv().await.unwrap().connected.is_connected());
        assert_eq!(
            rx.server_status.recv().await.unwrap().connected,
            ConnectionState::Disconnected
        );

        assert!(matches!(rx.responses.recv().await, Some(Response::Securities(s)) if s.len() == 1));
        assert!(matches!(rx.responses.recv().await, Some(Response::CandleKinds(_))));

        let data = data.lock().await;
        assert_eq!(data.securities[&1].sec_code, "SBER");
        assert_eq!(data.candle_kinds[0].period, 60);
        assert_eq!(data.status.connected, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn reader_stops_when_receivers_dropped() {
        let addr = mock_bridge(vec![
            r#"{"kind":"markets","data":[]}"#,
            r#"{"kind":"markets","data":[]}"#,
        ])
        .await;

        let (reader_half, _writer) = transport::connect(&addr).await.unwrap();
        let (senders, rx) = events::channel();
        drop(rx);
        let data = Arc::new(Mutex::new(SessionData::default()));
        MessageReader::new(reader_half, senders, data)
            .spawn()
            .await
            .unwrap();
    }
}
