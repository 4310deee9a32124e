//! Event-Broadcaster – Sendet Events an verbundene Clients
//!
//! Der EventBroadcaster verwaltet die Send-Queues aller verbundenen Clients
//! und implementiert den `Transport` der Chat-Engine.
//!
//! Jedes Ereignis wird genau einmal zu einer JSON-Zeile serialisiert und
//! als `Arc<str>` in die Queues der Empfaenger gelegt. Volle Queues
//! verwerfen das Ereignis (Backpressure), es gibt keine Wiederholung.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use lagerfeuer_chat::Transport;
use lagerfeuer_core::ServerEvent;
use tokio::sync::mpsc;

/// Standardgroesse der Send-Queue pro Client
pub const SEND_QUEUE_GROESSE: usize = 64;

/// Serialisierte Ausgabezeile (ohne Zeilenumbruch)
pub type Zeile = Arc<str>;

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue eines verbundenen Clients
#[derive(Clone, Debug)]
pub struct ClientSender {
    pub username: String,
    pub tx: mpsc::Sender<Zeile>,
}

impl ClientSender {
    /// Sendet eine Zeile nicht-blockierend an den Client
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    pub fn senden(&self, zeile: Zeile) -> bool {
        match self.tx.try_send(zeile) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(username = %self.username, "Send-Queue voll – Ereignis verworfen");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(
                    username = %self.username,
                    "Send-Queue geschlossen (Client getrennt)"
                );
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EventBroadcaster
// ---------------------------------------------------------------------------

/// Zentraler Event-Broadcaster fuer alle verbundenen Clients
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct EventBroadcaster {
    inner: Arc<EventBroadcasterInner>,
}

struct EventBroadcasterInner {
    /// Client-Sender, indiziert nach Benutzername
    clients: DashMap<String, ClientSender>,
    queue_groesse: usize,
}

impl EventBroadcaster {
    pub fn neu() -> Self {
        Self::mit_queue_groesse(SEND_QUEUE_GROESSE)
    }

    pub fn mit_queue_groesse(queue_groesse: usize) -> Self {
        Self {
            inner: Arc::new(EventBroadcasterInner {
                clients: DashMap::new(),
                queue_groesse: queue_groesse.max(1),
            }),
        }
    }

    /// Registriert einen Client und gibt seine Empfangs-Queue zurueck
    ///
    /// `None`, wenn der Name bereits verbunden ist.
    pub fn client_registrieren(&self, username: &str) -> Option<mpsc::Receiver<Zeile>> {
        match self.inner.clients.entry(username.to_string()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(eintrag) => {
                let (tx, rx) = mpsc::channel(self.inner.queue_groesse);
                eintrag.insert(ClientSender {
                    username: username.to_string(),
                    tx,
                });
                tracing::debug!(username = %username, "Client im Broadcaster registriert");
                Some(rx)
            }
        }
    }

    /// Entfernt einen Client aus dem Broadcaster
    pub fn client_entfernen(&self, username: &str) {
        if self.inner.clients.remove(username).is_some() {
            tracing::debug!(username = %username, "Client aus Broadcaster entfernt");
        }
    }

    /// Sendet eine fertige Zeile an einen einzelnen Client
    pub fn an_user_senden(&self, username: &str, zeile: Zeile) -> bool {
        match self.inner.clients.get(username) {
            Some(sender) => sender.senden(zeile),
            None => {
                tracing::debug!(username = %username, "Senden an unbekannten Client");
                false
            }
        }
    }

    /// Sendet eine fertige Zeile an alle Clients, optional ausser einem
    pub fn an_alle_zeile_senden(&self, zeile: Zeile, ausgeschlossen: Option<&str>) -> usize {
        let mut gesendet = 0;
        self.inner.clients.iter().for_each(|entry| {
            if Some(entry.key().as_str()) == ausgeschlossen {
                return;
            }
            if entry.value().senden(Arc::clone(&zeile)) {
                gesendet += 1;
            }
        });
        gesendet
    }

    /// Gibt die Anzahl der registrierten Clients zurueck
    pub fn client_anzahl(&self) -> usize {
        self.inner.clients.len()
    }

    /// Prueft ob ein Client registriert ist
    pub fn ist_registriert(&self, username: &str) -> bool {
        self.inner.clients.contains_key(username)
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::neu()
    }
}

/// Serialisiert ein Ereignis einmalig zu einer Zeile
pub fn zeile_serialisieren(event: &ServerEvent) -> Option<Zeile> {
    match event.als_json() {
        Ok(json) => Some(Arc::from(json)),
        Err(e) => {
            tracing::error!(event = event.name(), fehler = %e, "Ereignis nicht serialisierbar");
            None
        }
    }
}

impl Transport for EventBroadcaster {
    fn an_verbindung_senden(&self, username: &str, event: &ServerEvent) -> bool {
        match zeile_serialisieren(event) {
            Some(zeile) => self.an_user_senden(username, zeile),
            None => false,
        }
    }

    fn an_alle_senden(&self, event: &ServerEvent, ausser: Option<&str>) -> usize {
        match zeile_serialisieren(event) {
            Some(zeile) => self.an_alle_zeile_senden(zeile, ausser),
            None => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
