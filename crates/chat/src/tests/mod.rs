//! Szenario-Tests fuer die ChatEngine
//!
//! Gemeinsame Hilfen: ein aufzeichnender Transport und eine
//! Testumgebung mit MemoryHost und manueller Uhr.

mod typing_tests;

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use lagerfeuer_core::{ChatMessage, ServerEvent, TypingEreignis};
use parking_lot::Mutex;

use crate::clock::ManualClock;
use crate::engine::{ChatEngine, HostPorts};
use crate::host::{MemoryHost, SpielerZustand, Transport};
use crate::settings::ChatSettings;

/// Transport, der alle Sendungen pro Empfaenger aufzeichnet
#[derive(Default)]
pub(crate) struct RecordingTransport {
    verbindungen: Mutex<BTreeSet<String>>,
    postfach: Mutex<Vec<(String, ServerEvent)>>,
    broadcasts: Mutex<usize>,
}

impl RecordingTransport {
    pub fn registrieren(&self, username: &str) {
        self.verbindungen.lock().insert(username.to_string());
    }

    pub fn abmelden(&self, username: &str) {
        self.verbindungen.lock().remove(username);
    }

    pub fn ereignisse_fuer(&self, username: &str) -> Vec<ServerEvent> {
        self.postfach
            .lock()
            .iter()
            .filter(|(u, _)| u == username)
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn nachrichten_fuer(&self, username: &str) -> Vec<ChatMessage> {
        self.ereignisse_fuer(username)
            .into_iter()
            .filter_map(|e| match e {
                ServerEvent::Message(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn typing_fuer(&self, username: &str) -> Vec<TypingEreignis> {
        self.ereignisse_fuer(username)
            .into_iter()
            .filter_map(|e| match e {
                ServerEvent::Typing(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    /// Alle aufgezeichneten Chat-Nachrichten (ohne Systemmeldungen)
    pub fn alle_nachrichten(&self) -> Vec<(String, ChatMessage)> {
        self.postfach
            .lock()
            .iter()
            .filter_map(|(u, e)| match e {
                ServerEvent::Message(m) if !m.ist_system() => Some((u.clone(), m.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn broadcasts(&self) -> usize {
        *self.broadcasts.lock()
    }

    pub fn leeren(&self) {
        self.postfach.lock().clear();
        *self.broadcasts.lock() = 0;
    }
}

impl Transport for RecordingTransport {
    fn an_verbindung_senden(&self, username: &str, event: &ServerEvent) -> bool {
        if !self.verbindungen.lock().contains(username) {
            return false;
        }
        self.postfach.lock().push((username.to_string(), event.clone()));
        true
    }

    fn an_alle_senden(&self, event: &ServerEvent, ausser: Option<&str>) -> usize {
        *self.broadcasts.lock() += 1;
        let empfaenger: Vec<String> = self
            .verbindungen
            .lock()
            .iter()
            .filter(|u| Some(u.as_str()) != ausser)
            .cloned()
            .collect();
        let mut postfach = self.postfach.lock();
        for username in &empfaenger {
            postfach.push((username.clone(), event.clone()));
        }
        empfaenger.len()
    }
}

/// Engine mit MemoryHost, aufzeichnendem Transport und manueller Uhr
pub(crate) struct Testumgebung {
    pub host: Arc<MemoryHost>,
    pub transport: Arc<RecordingTransport>,
    pub uhr: Arc<ManualClock>,
    pub engine: ChatEngine,
}

impl Testumgebung {
    pub fn neu(einstellungen: ChatSettings) -> Self {
        let host = Arc::new(MemoryHost::neu());
        let transport = Arc::new(RecordingTransport::default());
        let uhr = Arc::new(ManualClock::neu(Utc::now()));
        let engine = ChatEngine::neu(
            einstellungen,
            HostPorts {
                rechte: host.clone(),
                welt: host.clone(),
                transport: transport.clone(),
                uhr: uhr.clone(),
            },
        );
        Self {
            host,
            transport,
            uhr,
            engine,
        }
    }

    pub fn standard() -> Self {
        Self::neu(ChatSettings::default())
    }

    /// Legt den Spieler im Host an und verbindet ihn
    pub fn verbinden(&mut self, username: &str, zustand: SpielerZustand) {
        self.host.spieler_setzen(username, zustand);
        self.transport.registrieren(username);
        self.engine
            .verbunden(username)
            .expect("Verbinden fehlgeschlagen");
    }

    pub fn trennen(&mut self, username: &str) {
        self.transport.abmelden(username);
        self.engine.getrennt(username);
    }
}

pub(crate) fn fraktion(name: &str) -> SpielerZustand {
    SpielerZustand {
        fraktion: Some(name.to_string()),
        ..Default::default()
    }
}
