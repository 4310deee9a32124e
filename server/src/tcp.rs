//! TCP-Listener – Bindet Socket, akzeptiert Verbindungen
//!
//! Der `ChatServer` bindet einen TCP-Socket und startet fuer jede
//! eingehende Verbindung einen eigenen tokio-Task mit einer
//! `ClientConnection`. Der Zustand der Chat-Engine liegt ausschliesslich
//! im Engine-Task; Verbindungen sprechen nur ueber dessen Queue mit ihr.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};

use crate::broadcast::EventBroadcaster;
use crate::connection::{ClientConnection, VerbindungsEinstellungen};
use crate::engine_task::EngineBefehl;

/// TCP-Chat-Server
pub struct ChatServer {
    listener: TcpListener,
    broadcaster: EventBroadcaster,
    engine_tx: mpsc::Sender<EngineBefehl>,
    einstellungen: Arc<VerbindungsEinstellungen>,
}

impl ChatServer {
    /// Bindet den Listener an `adresse`
    pub async fn binden(
        adresse: &str,
        broadcaster: EventBroadcaster,
        engine_tx: mpsc::Sender<EngineBefehl>,
        einstellungen: VerbindungsEinstellungen,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(adresse).await?;
        Ok(Self {
            listener,
            broadcaster,
            engine_tx,
            einstellungen: Arc::new(einstellungen),
        })
    }

    /// Tatsaechlich gebundene Adresse (relevant bei Port 0)
    pub fn lokale_adresse(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Akzeptiert Verbindungen bis `shutdown_rx` ein `true`-Signal empfaengt
    pub async fn starten(self, mut shutdown_rx: watch::Receiver<bool>) -> std::io::Result<()> {
        tracing::info!(adresse = %self.lokale_adresse()?, "TCP Chat-Server gestartet");

        loop {
            tokio::select! {
                // Neue eingehende Verbindung
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            if let Err(e) = stream.set_nodelay(true) {
                                tracing::debug!(
                                    peer = %peer_addr,
                                    fehler = %e,
                                    "TCP_NODELAY nicht gesetzt"
                                );
                            }
                            tracing::debug!(peer = %peer_addr, "Verbindung akzeptiert");

                            let verbindung = ClientConnection::neu(
                                self.broadcaster.clone(),
                                self.engine_tx.clone(),
                                Arc::clone(&self.einstellungen),
                                peer_addr,
                            );
                            let shutdown_rx_clone = shutdown_rx.clone();
                            tokio::spawn(async move {
                                verbindung.verarbeiten(stream, shutdown_rx_clone).await;
                            });
                        }
                        Err(e) => {
                            tracing::error!(fehler = %e, "TCP-Accept-Fehler");
                            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                        }
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Chat-Server: Shutdown-Signal empfangen");
                        break;
                    }
                }
            }
        }

        tracing::info!("TCP Chat-Server gestoppt");
        Ok(())
    }
}
