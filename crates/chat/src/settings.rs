//! Chat-Einstellungen
//!
//! Werden vom Server aus der TOML-Konfiguration geladen
//! (Abschnitt `[chat]`). Alle Felder haben Standardwerte.

use lagerfeuer_core::{Channel, ChatEinstellungenInfo};
use serde::{Deserialize, Serialize};

/// Einstellungen der Chat-Engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Maximale Nachrichtenlaenge in Zeichen
    pub max_message_length: usize,
    /// Groesse des clientseitigen Nachrichten-Ringpuffers
    pub max_messages_stored: usize,
    /// Reichweite des Naehe-Chats in Kacheln
    pub local_chat_range: f64,
    /// Reichweite geschriener Nachrichten in Kacheln
    pub yell_range: f64,
    /// Slow-Mode-Abklingzeit in Sekunden (0 = aus)
    pub chat_slow_mode: u64,
    /// Anzeigenamen statt Benutzernamen verwenden
    pub roleplay_mode: bool,
    /// Aktivierte Kanaele
    pub kanaele: KanalSchalter,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            max_message_length: 256,
            max_messages_stored: 100,
            local_chat_range: 20.0,
            yell_range: 40.0,
            chat_slow_mode: 0,
            roleplay_mode: false,
            kanaele: KanalSchalter::default(),
        }
    }
}

impl ChatSettings {
    pub fn ist_aktiviert(&self, channel: Channel) -> bool {
        self.kanaele.ist_aktiviert(channel)
    }

    /// Client-relevanter Ausschnitt fuer das `chatSettings`-Ereignis
    pub fn client_info(&self) -> ChatEinstellungenInfo {
        ChatEinstellungenInfo {
            max_message_length: self.max_message_length,
            max_messages_stored: self.max_messages_stored,
            local_chat_range: self.local_chat_range,
            yell_range: self.yell_range,
            chat_slow_mode: self.chat_slow_mode,
            enabled_channels: self.kanaele.aktivierte(),
            roleplay_mode: self.roleplay_mode,
        }
    }
}

/// Aktivierungsschalter pro Kanal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KanalSchalter {
    pub local: bool,
    pub global: bool,
    pub faction: bool,
    pub safehouse: bool,
    pub private: bool,
    pub staff: bool,
    pub admin: bool,
    pub radio: bool,
}

impl Default for KanalSchalter {
    fn default() -> Self {
        Self {
            local: true,
            global: true,
            faction: true,
            safehouse: true,
            private: true,
            staff: true,
            admin: true,
            radio: true,
        }
    }
}

impl KanalSchalter {
    pub fn ist_aktiviert(&self, channel: Channel) -> bool {
        match channel {
            Channel::Local => self.local,
            Channel::Global => self.global,
            Channel::Faction => self.faction,
            Channel::Safehouse => self.safehouse,
            Channel::Private => self.private,
            Channel::Staff => self.staff,
            Channel::Admin => self.admin,
            Channel::Radio => self.radio,
        }
    }

    pub fn setzen(&mut self, channel: Channel, aktiviert: bool) {
        let schalter = match channel {
            Channel::Local => &mut self.local,
            Channel::Global => &mut self.global,
            Channel::Faction => &mut self.faction,
            Channel::Safehouse => &mut self.safehouse,
            Channel::Private => &mut self.private,
            Channel::Staff => &mut self.staff,
            Channel::Admin => &mut self.admin,
            Channel::Radio => &mut self.radio,
        };
        *schalter = aktiviert;
    }

    pub fn aktivierte(&self) -> Vec<Channel> {
        Channel::ALLE
            .into_iter()
            .filter(|c| self.ist_aktiviert(*c))
            .collect()
    }
}
