//! Zustellung aufgeloester Nachrichten ueber den Transport
//!
//! Fire-and-forget: fehlgeschlagene Sendungen werden geloggt, nicht
//! wiederholt. Die Reihenfolge pro Absender ergibt sich aus der
//! sequentiellen Verarbeitung in der Engine.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use lagerfeuer_core::{Ack, Channel, ChatMessage, ServerEvent, TypingEreignis};

use crate::host::Transport;
use crate::resolver::Zustellung;
use crate::settings::ChatSettings;
use crate::yell::schrei_anwenden;

pub struct DeliveryEngine {
    transport: Arc<dyn Transport>,
    /// Reichweite normaler LOCAL-Nachrichten
    lokale_reichweite: f64,
    /// Reichweite geschriener LOCAL-Nachrichten
    schrei_reichweite: f64,
}

impl DeliveryEngine {
    pub fn neu(transport: Arc<dyn Transport>, einstellungen: &ChatSettings) -> Self {
        Self {
            transport,
            lokale_reichweite: einstellungen.local_chat_range,
            schrei_reichweite: einstellungen.yell_range,
        }
    }

    /// Stellt eine Nachricht gemaess der Aufloesung zu und liefert das Ack
    pub fn zustellen(&self, mut nachricht: ChatMessage, zustellung: Zustellung) -> Ack {
        if nachricht.metadata.is_yell {
            schrei_anwenden(&mut nachricht);
        }

        match zustellung {
            Zustellung::NurAbsender => {
                let is_yell = nachricht.metadata.is_yell;
                let reichweite = if is_yell {
                    self.schrei_reichweite
                } else {
                    self.lokale_reichweite
                };
                tracing::debug!(
                    author = %nachricht.author,
                    is_yell,
                    reichweite,
                    "LOCAL-Nachricht an Absender zurueckgegeben"
                );
                Ack::lokal(nachricht.text, is_yell, reichweite)
            }
            Zustellung::Broadcast => {
                let id = nachricht.id;
                let kanal = nachricht.channel;
                let event = ServerEvent::Message(nachricht);
                let gesendet = self.transport.an_alle_senden(&event, None);
                tracing::debug!(
                    message_id = %id,
                    kanal = %kanal,
                    gesendet,
                    "Nachricht gebroadcastet"
                );
                Ack::erfolg(id)
            }
            Zustellung::Empfaenger(empfaenger) => {
                let id = nachricht.id;
                let kanal = nachricht.channel;
                let event = ServerEvent::Message(nachricht);
                let gesendet = self.an_empfaenger(&empfaenger, &event);
                tracing::debug!(
                    message_id = %id,
                    kanal = %kanal,
                    empfaenger = empfaenger.len(),
                    gesendet,
                    "Nachricht zugestellt"
                );
                Ack::erfolg(id)
            }
        }
    }

    /// Systemmeldung an einen einzelnen Benutzer
    pub fn systemnachricht(
        &self,
        empfaenger: &str,
        channel: Channel,
        text: impl Into<String>,
        jetzt: DateTime<Utc>,
    ) {
        let event = ServerEvent::Message(ChatMessage::system(channel, text, jetzt));
        if !self.transport.an_verbindung_senden(empfaenger, &event) {
            tracing::warn!(username = %empfaenger, "Systemmeldung konnte nicht gesendet werden");
        }
    }

    /// Tipp-Indikator an die gegebenen Empfaenger
    pub fn typing_senden(&self, empfaenger: &[String], ereignis: TypingEreignis) -> usize {
        self.an_empfaenger(empfaenger, &ServerEvent::Typing(ereignis))
    }

    /// Ereignis an alle Verbindungen
    pub fn an_alle(&self, event: &ServerEvent, ausser: Option<&str>) -> usize {
        self.transport.an_alle_senden(event, ausser)
    }

    /// Ereignis an eine Verbindung
    pub fn an_einen(&self, empfaenger: &str, event: &ServerEvent) -> bool {
        let ok = self.transport.an_verbindung_senden(empfaenger, event);
        if !ok {
            tracing::warn!(username = %empfaenger, event = event.name(), "Senden fehlgeschlagen");
        }
        ok
    }

    fn an_empfaenger(&self, empfaenger: &[String], event: &ServerEvent) -> usize {
        let mut gesendet = 0;
        for username in empfaenger {
            if self.transport.an_verbindung_senden(username, event) {
                gesendet += 1;
            } else {
                tracing::warn!(username = %username, event = event.name(), "Senden fehlgeschlagen");
            }
        }
        gesendet
    }
}
