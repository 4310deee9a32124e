//! Client-Connection – Verwaltet eine einzelne TCP-Verbindung
//!
//! Jede TCP-Verbindung bekommt eine `ClientConnection` in einem eigenen
//! tokio-Task. Das Protokoll ist zeilenbasiertes JSON (`LinesCodec`).
//!
//! ## Ablauf
//! ```text
//! Verbunden --hello--> Registriert --Ereignisse--> ... --EOF/Shutdown--> Getrennt
//! ```
//!
//! Nach dem Handshake leitet die Verbindung dekodierte Ereignisse an den
//! Engine-Task weiter und schreibt die Zeilen aus ihrer Broadcaster-Queue
//! auf den Socket.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use lagerfeuer_core::{Ack, ClientEvent, ClientFrame, ServerEvent};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_util::codec::{Framed, LinesCodec};

use crate::broadcast::{zeile_serialisieren, EventBroadcaster, Zeile};
use crate::engine_task::EngineBefehl;
use crate::error::HandshakeFehler;

/// Maximale Laenge eines Benutzernamens in Zeichen
pub const MAX_NAME_LAENGE: usize = 64;

type Verbindung = Framed<TcpStream, LinesCodec>;

/// Einstellungen, die jede Verbindung benoetigt
#[derive(Debug, Clone)]
pub struct VerbindungsEinstellungen {
    pub hello_timeout: Duration,
    pub max_zeilen_laenge: usize,
    pub max_clients: usize,
}

/// Verarbeitet eine einzelne TCP-Verbindung
pub struct ClientConnection {
    broadcaster: EventBroadcaster,
    engine_tx: mpsc::Sender<EngineBefehl>,
    einstellungen: Arc<VerbindungsEinstellungen>,
    peer_addr: SocketAddr,
}

impl ClientConnection {
    pub fn neu(
        broadcaster: EventBroadcaster,
        engine_tx: mpsc::Sender<EngineBefehl>,
        einstellungen: Arc<VerbindungsEinstellungen>,
        peer_addr: SocketAddr,
    ) -> Self {
        Self {
            broadcaster,
            engine_tx,
            einstellungen,
            peer_addr,
        }
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Laeuft bis die Verbindung getrennt wird oder ein Shutdown-Signal
    /// eingeht.
    pub async fn verarbeiten(self, stream: TcpStream, mut shutdown_rx: watch::Receiver<bool>) {
        let peer_addr = self.peer_addr;
        tracing::debug!(peer = %peer_addr, "Neue Verbindung");

        let mut framed = Framed::new(
            stream,
            LinesCodec::new_with_max_length(self.einstellungen.max_zeilen_laenge),
        );

        let (username, mut sende_rx) = match self.handshake(&mut framed).await {
            Ok(ergebnis) => ergebnis,
            Err(e) => {
                tracing::info!(peer = %peer_addr, fehler = %e, "Handshake fehlgeschlagen");
                if e.antwortbar() {
                    let antwort = ServerEvent::Ack(Ack::fehler(e.to_string()));
                    if let Some(zeile) = zeile_serialisieren(&antwort) {
                        let _ = framed.send(zeile).await;
                    }
                }
                return;
            }
        };

        tracing::info!(peer = %peer_addr, username = %username, "Client angemeldet");

        if self
            .engine_tx
            .send(EngineBefehl::Verbunden {
                username: username.clone(),
            })
            .await
            .is_err()
        {
            tracing::error!(username = %username, "Engine-Task nicht erreichbar");
            self.broadcaster.client_entfernen(&username);
            return;
        }

        loop {
            tokio::select! {
                // Eingehende Zeile vom Client
                zeile = framed.next() => {
                    match zeile {
                        Some(Ok(zeile)) => {
                            if !self.zeile_verarbeiten(&username, &zeile).await {
                                break;
                            }
                        }
                        Some(Err(e)) => {
                            tracing::warn!(username = %username, fehler = %e, "Lesefehler");
                            break;
                        }
                        None => {
                            tracing::info!(username = %username, "Verbindung vom Client getrennt");
                            break;
                        }
                    }
                }

                // Ausgehende Zeile aus dem Broadcaster
                Some(ausgehend) = sende_rx.recv() => {
                    if let Err(e) = framed.send(ausgehend).await {
                        tracing::warn!(username = %username, fehler = %e, "Senden fehlgeschlagen");
                        break;
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(
                            username = %username,
                            "Shutdown-Signal – Verbindung wird getrennt"
                        );
                        break;
                    }
                }
            }
        }

        verbindung_abmelden(&self.broadcaster, &self.engine_tx, &username).await;

        tracing::debug!(peer = %peer_addr, username = %username, "Verbindungs-Task beendet");
    }

    /// Wartet auf `hello` und registriert den Client im Broadcaster
    async fn handshake(
        &self,
        framed: &mut Verbindung,
    ) -> Result<(String, mpsc::Receiver<Zeile>), HandshakeFehler> {
        let zeile = tokio::time::timeout(self.einstellungen.hello_timeout, framed.next())
            .await
            .map_err(|_| HandshakeFehler::Timeout)?
            .ok_or(HandshakeFehler::Geschlossen)??;

        let username = match ClientFrame::aus_json(&zeile)?.dekodieren()? {
            ClientEvent::Hello(hello) => hello.username.trim().to_string(),
            andere => return Err(HandshakeFehler::KeinHello(andere.name().to_string())),
        };
        if !name_gueltig(&username) {
            return Err(HandshakeFehler::UngueltigerName);
        }
        if self.broadcaster.client_anzahl() >= self.einstellungen.max_clients {
            return Err(HandshakeFehler::ServerVoll);
        }

        let rx = self
            .broadcaster
            .client_registrieren(&username)
            .ok_or_else(|| HandshakeFehler::NameVergeben(username.clone()))?;
        Ok((username, rx))
    }

    /// Dekodiert eine Zeile und leitet sie an die Engine weiter
    ///
    /// Gibt `false` zurueck, wenn die Engine nicht mehr erreichbar ist.
    async fn zeile_verarbeiten(&self, username: &str, zeile: &str) -> bool {
        let frame = match ClientFrame::aus_json(zeile) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(username = %username, fehler = %e, "Ungueltiges Frame");
                self.fehler_antworten(username, None, e.to_string());
                return true;
            }
        };

        let request_id = frame.request_id;
        let event = match frame.dekodieren() {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(username = %username, fehler = %e, "Ereignis nicht dekodierbar");
                self.fehler_antworten(username, request_id, e.to_string());
                return true;
            }
        };

        tracing::trace!(username = %username, event = event.name(), "Ereignis empfangen");
        self.engine_tx
            .send(EngineBefehl::Ereignis {
                username: username.to_string(),
                request_id,
                event,
            })
            .await
            .is_ok()
    }

    /// Fehler-Ack ueber die eigene Send-Queue (haelt die Reihenfolge)
    fn fehler_antworten(&self, username: &str, request_id: Option<u32>, grund: String) {
        let event = ServerEvent::Ack(Ack::fehler(grund).mit_request_id(request_id));
        if let Some(zeile) = zeile_serialisieren(&event) {
            self.broadcaster.an_user_senden(username, zeile);
        }
    }
}

/// Meldet eine Verbindung bei Engine und Broadcaster ab
///
/// `Getrennt` muss in der Engine-Queue stehen, bevor der Name im
/// Broadcaster frei wird. Sonst kann ein Reconnect mit demselben Namen
/// sein `Verbunden` vor dem alten `Getrennt` einreihen und die neue
/// Sitzung wird entfernt.
pub(crate) async fn verbindung_abmelden(
    broadcaster: &EventBroadcaster,
    engine_tx: &mpsc::Sender<EngineBefehl>,
    username: &str,
) {
    if engine_tx
        .send(EngineBefehl::Getrennt {
            username: username.to_string(),
        })
        .await
        .is_err()
    {
        tracing::warn!(username = %username, "Engine-Task beim Trennen nicht erreichbar");
    }
    broadcaster.client_entfernen(username);
}

/// Nicht leer, hoechstens `MAX_NAME_LAENGE` Zeichen, keine Steuerzeichen
pub fn name_gueltig(username: &str) -> bool {
    !username.is_empty()
        && username.chars().count() <= MAX_NAME_LAENGE
        && !username.chars().any(char::is_control)
}
