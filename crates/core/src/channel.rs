//! Chat-Kanaele
//!
//! Die Menge der Kanaele ist fest. Jeder Kanal hat eine eigene
//! Adressierungsregel (siehe `lagerfeuer-chat::resolver`) und eine
//! feste Anzeigefarbe.

use serde::{Deserialize, Serialize};

use crate::types::Farbe;

/// Alle Chat-Kanaele
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
    /// Naehe-Chat, wird vom nativen Spielchat zugestellt
    Local,
    Global,
    Faction,
    Safehouse,
    Private,
    Staff,
    Admin,
    /// Funk, faellt derzeit auf Global zurueck
    Radio,
}

impl Channel {
    pub const ALLE: [Channel; 8] = [
        Channel::Local,
        Channel::Global,
        Channel::Faction,
        Channel::Safehouse,
        Channel::Private,
        Channel::Staff,
        Channel::Admin,
        Channel::Radio,
    ];

    /// Wire-Name des Kanals
    pub fn name(self) -> &'static str {
        match self {
            Channel::Local => "LOCAL",
            Channel::Global => "GLOBAL",
            Channel::Faction => "FACTION",
            Channel::Safehouse => "SAFEHOUSE",
            Channel::Private => "PRIVATE",
            Channel::Staff => "STAFF",
            Channel::Admin => "ADMIN",
            Channel::Radio => "RADIO",
        }
    }

    /// Anzeigefarbe fuer Nachrichten und Systemmeldungen dieses Kanals
    pub fn farbe(self) -> Farbe {
        match self {
            Channel::Local => Farbe::rgb(255, 255, 255),
            Channel::Global => Farbe::rgb(140, 200, 255),
            Channel::Faction => Farbe::rgb(120, 220, 120),
            Channel::Safehouse => Farbe::rgb(255, 170, 90),
            Channel::Private => Farbe::rgb(230, 140, 230),
            Channel::Staff => Farbe::rgb(90, 210, 200),
            Channel::Admin => Farbe::rgb(255, 90, 90),
            Channel::Radio => Farbe::rgb(180, 200, 140),
        }
    }

    /// Kanaele, die dem Slow-Mode unterliegen
    pub fn slow_mode_pflichtig(self) -> bool {
        matches!(
            self,
            Channel::Global | Channel::Faction | Channel::Safehouse | Channel::Radio
        )
    }

    /// Kanaele, deren Berechtigung live beim Host geprueft wird
    pub fn erfordert_live_pruefung(self) -> bool {
        matches!(self, Channel::Staff | Channel::Admin)
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
