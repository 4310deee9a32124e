//! Chat-Nachricht und Metadaten
//!
//! Eine `ChatMessage` ist nach dem Versand unveraenderlich und existiert
//! nur als Wire-Payload. Der Server speichert keine History.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::types::{AccessLevel, Farbe, MessageId};

/// Nachrichtentyp
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NachrichtenTyp {
    #[default]
    Text,
    /// Vom Server erzeugte Meldung (Ablehnung, Befehlsantwort)
    System,
}

/// Kanal-spezifische Metadaten einer Nachricht
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MessageMetadata {
    /// Ziel einer Privatnachricht (vom Client gesetzt)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<AccessLevel>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_yell: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faction_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safehouse_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<i32>,
}

/// Eine zugestellte Chat-Nachricht
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: MessageId,
    pub channel: Channel,
    pub author: String,
    /// Anzeigename (Charaktername im Roleplay-Modus, sonst der Benutzername)
    pub display_name: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: MessageMetadata,
    pub color: Farbe,
    #[serde(default)]
    pub message_type: NachrichtenTyp,
}

impl ChatMessage {
    /// Erstellt eine Systemmeldung in der Farbe des Kanals
    pub fn system(channel: Channel, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: MessageId::new(),
            channel,
            author: "system".into(),
            display_name: "System".into(),
            text: text.into(),
            timestamp,
            metadata: MessageMetadata::default(),
            color: channel.farbe(),
            message_type: NachrichtenTyp::System,
        }
    }

    pub fn ist_system(&self) -> bool {
        self.message_type == NachrichtenTyp::System
    }
}
