//! Engine-Task – der einzige Besitzer der ChatEngine
//!
//! Verbindungs-Tasks senden `EngineBefehl`e ueber eine mpsc-Queue. Der Task
//! verarbeitet sie strikt nacheinander (FIFO pro Absender) und fuehrt
//! zusaetzlich die periodischen Aufgaben aus:
//! - Sweep abgelaufener Tipp-Indikatoren
//! - Auffrischung der Presence-Attribute

use std::time::Duration;

use lagerfeuer_chat::{ChatEngine, Transport};
use lagerfeuer_core::{ClientEvent, ServerEvent};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use crate::broadcast::EventBroadcaster;
use crate::config::IntervallEinstellungen;

/// Groesse der Befehls-Queue zur Engine
pub const BEFEHL_QUEUE_GROESSE: usize = 1024;

/// Befehl eines Verbindungs-Tasks an die Engine
#[derive(Debug)]
pub enum EngineBefehl {
    /// Handshake abgeschlossen
    Verbunden { username: String },
    /// Dekodiertes Client-Ereignis
    Ereignis {
        username: String,
        request_id: Option<u32>,
        event: ClientEvent,
    },
    /// Verbindung beendet
    Getrennt { username: String },
}

pub struct EngineTask {
    engine: ChatEngine,
    broadcaster: EventBroadcaster,
    rx: mpsc::Receiver<EngineBefehl>,
    intervalle: IntervallEinstellungen,
}

impl EngineTask {
    /// Erstellt den Task und gibt den Sender fuer Verbindungs-Tasks zurueck
    pub fn neu(
        engine: ChatEngine,
        broadcaster: EventBroadcaster,
        intervalle: IntervallEinstellungen,
    ) -> (Self, mpsc::Sender<EngineBefehl>) {
        let (tx, rx) = mpsc::channel(BEFEHL_QUEUE_GROESSE);
        (
            Self {
                engine,
                broadcaster,
                rx,
                intervalle,
            },
            tx,
        )
    }

    /// Laeuft bis zum Shutdown-Signal oder bis alle Sender geschlossen sind
    pub async fn ausfuehren(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut typing_takt =
            tokio::time::interval(Duration::from_millis(self.intervalle.typing_sweep_ms.max(10)));
        typing_takt.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut presence_takt =
            tokio::time::interval(Duration::from_secs(self.intervalle.presence_refresh_sek.max(1)));
        presence_takt.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            typing_sweep_ms = self.intervalle.typing_sweep_ms,
            presence_refresh_sek = self.intervalle.presence_refresh_sek,
            "Engine-Task gestartet"
        );

        loop {
            tokio::select! {
                befehl = self.rx.recv() => {
                    match befehl {
                        Some(befehl) => self.befehl_ausfuehren(befehl),
                        None => break,
                    }
                }

                _ = typing_takt.tick() => {
                    let abgelaufen = self.engine.tick_typing();
                    if abgelaufen > 0 {
                        tracing::trace!(abgelaufen, "Tipp-Indikatoren abgelaufen");
                    }
                }

                _ = presence_takt.tick() => {
                    self.engine.tick_presence();
                }

                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Engine-Task: Shutdown-Signal empfangen");
                        break;
                    }
                }
            }
        }

        tracing::info!("Engine-Task beendet");
    }

    fn befehl_ausfuehren(&mut self, befehl: EngineBefehl) {
        match befehl {
            EngineBefehl::Verbunden { username } => {
                if let Err(e) = self.engine.verbunden(&username) {
                    tracing::error!(
                        username = %username,
                        fehler = %e,
                        "Sitzung konnte nicht angelegt werden"
                    );
                }
            }
            EngineBefehl::Ereignis {
                username,
                request_id,
                event,
            } => {
                let antwort = match self.engine.ereignis_verarbeiten(&username, event) {
                    Some(ServerEvent::Ack(ack)) => ServerEvent::Ack(ack.mit_request_id(request_id)),
                    Some(andere) => andere,
                    None => return,
                };
                if !self.broadcaster.an_verbindung_senden(&username, &antwort) {
                    tracing::debug!(
                        username = %username,
                        event = antwort.name(),
                        "Antwort nicht zustellbar"
                    );
                }
            }
            EngineBefehl::Getrennt { username } => self.engine.getrennt(&username),
        }
    }
}
