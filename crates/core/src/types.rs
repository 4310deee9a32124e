//! Gemeinsame Basistypen fuer Lagerfeuer
//!
//! IDs verwenden das Newtype-Pattern, damit Nachrichten-IDs nicht mit
//! beliebigen UUIDs verwechselt werden koennen.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Eindeutige Nachrichten-ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub Uuid);

impl MessageId {
    /// Erstellt eine neue zufaellige MessageId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "msg:{}", self.0)
    }
}

/// RGB-Farbe, wie sie das Chatfenster des Clients erwartet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Farbe {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Farbe {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Hervorhebungsfarbe fuer geschriene Nachrichten
pub const SCHREI_FARBE: Farbe = Farbe::rgb(255, 215, 64);

/// Position eines Spielers in der Spielwelt
///
/// `etage` ist das Stockwerk (z-Ebene), x/y sind planare Kachelkoordinaten.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub etage: i32,
}

impl Position {
    pub fn neu(x: f64, y: f64, etage: i32) -> Self {
        Self { x, y, etage }
    }
}

/// Zugriffsstufe eines Spielers laut Rollensystem des Hosts
///
/// Reihenfolge ist aufsteigend: jede Stufe schliesst die Rechte der
/// darunterliegenden ein.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    #[default]
    None,
    Observer,
    Gm,
    Overseer,
    Moderator,
    Admin,
}

impl AccessLevel {
    /// Jede Stufe oberhalb von `None` zaehlt als Staff
    pub fn ist_staff(self) -> bool {
        self > AccessLevel::None
    }

    pub fn ist_admin(self) -> bool {
        self == AccessLevel::Admin
    }
}
