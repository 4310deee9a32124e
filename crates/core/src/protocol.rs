//! Wire-Protokoll zwischen Client und Chat-Server
//!
//! Jedes Frame ist ein JSON-Objekt der Form
//! `{"event": "...", "requestId": 7, "payload": {...}}`.
//! `requestId` ist optional; nur `message` wird mit einem `ack` beantwortet.
//!
//! ## Eingehend (Client -> Server)
//! `hello`, `message`, `typingStart`, `typingStop`, `getPlayers`
//!
//! ## Ausgehend (Server -> Client)
//! `message`, `typing`, `playerList`, `chatSettings`, `ack`

use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::error::{LagerfeuerError, Result};
use crate::message::{ChatMessage, MessageMetadata};
use crate::types::MessageId;

// ---------------------------------------------------------------------------
// Eingehende Payloads
// ---------------------------------------------------------------------------

/// Verbindungs-Handshake des Transports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelloPayload {
    pub username: String,
}

/// Anfrage zum Senden einer Nachricht
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NachrichtAnfrage {
    pub channel: Channel,
    pub text: String,
    #[serde(default)]
    pub metadata: MessageMetadata,
}

impl NachrichtAnfrage {
    pub fn neu(channel: Channel, text: impl Into<String>) -> Self {
        Self {
            channel,
            text: text.into(),
            metadata: MessageMetadata::default(),
        }
    }

    /// Privatnachricht an `ziel`
    pub fn privat(ziel: impl Into<String>, text: impl Into<String>) -> Self {
        let mut anfrage = Self::neu(Channel::Private, text);
        anfrage.metadata.target = Some(ziel.into());
        anfrage
    }
}

/// typingStart / typingStop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypingAnfrage {
    pub channel: Channel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Dekodiertes eingehendes Ereignis
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Hello(HelloPayload),
    Message(NachrichtAnfrage),
    TypingStart(TypingAnfrage),
    TypingStop(TypingAnfrage),
    GetPlayers,
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Hello(_) => "hello",
            ClientEvent::Message(_) => "message",
            ClientEvent::TypingStart(_) => "typingStart",
            ClientEvent::TypingStop(_) => "typingStop",
            ClientEvent::GetPlayers => "getPlayers",
        }
    }
}

/// Rohes eingehendes Frame
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientFrame {
    pub event: String,
    #[serde(default)]
    pub request_id: Option<u32>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl ClientFrame {
    /// Parst eine JSON-Zeile
    pub fn aus_json(zeile: &str) -> Result<Self> {
        serde_json::from_str(zeile).map_err(|e| LagerfeuerError::UngueltigesFrame(e.to_string()))
    }

    /// Dekodiert den Payload passend zum Ereignisnamen
    pub fn dekodieren(self) -> Result<ClientEvent> {
        let event = match self.event.as_str() {
            "hello" => ClientEvent::Hello(payload_lesen(&self.event, self.payload)?),
            "message" => ClientEvent::Message(payload_lesen(&self.event, self.payload)?),
            "typingStart" => ClientEvent::TypingStart(payload_lesen(&self.event, self.payload)?),
            "typingStop" => ClientEvent::TypingStop(payload_lesen(&self.event, self.payload)?),
            // getPlayers hat keinen relevanten Payload
            "getPlayers" => ClientEvent::GetPlayers,
            _ => return Err(LagerfeuerError::UnbekanntesEreignis(self.event)),
        };
        Ok(event)
    }
}

fn payload_lesen<T: serde::de::DeserializeOwned>(
    event: &str,
    payload: serde_json::Value,
) -> Result<T> {
    serde_json::from_value(payload).map_err(|e| LagerfeuerError::UngueltigerPayload {
        event: event.to_string(),
        grund: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Ausgehende Payloads
// ---------------------------------------------------------------------------

/// Tipp-Indikator eines anderen Spielers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingEreignis {
    pub username: String,
    pub channel: Channel,
    pub is_typing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub display_name: String,
}

/// Eintrag der Spielerliste (gecachte Rollen, nur fuer die UI)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpielerInfo {
    pub username: String,
    pub is_admin: bool,
    pub is_staff: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpielerListe {
    pub players: Vec<SpielerInfo>,
}

/// Client-relevante Chat-Einstellungen, beim Verbinden gesendet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEinstellungenInfo {
    pub max_message_length: usize,
    /// Groesse des clientseitigen Ringpuffers
    pub max_messages_stored: usize,
    pub local_chat_range: f64,
    pub yell_range: f64,
    pub chat_slow_mode: u64,
    pub enabled_channels: Vec<Channel>,
    pub roleplay_mode: bool,
}

/// Bestaetigung einer `message`-Anfrage an den Absender
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Ack {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<u32>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<MessageId>,
    /// LOCAL: der Client spielt den Text selbst ueber den nativen Chat ab
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_local: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_yell: Option<bool>,
    /// LOCAL: Reichweite in Kacheln fuer die native Naehe-Zustellung
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<f64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_command: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Verbleibende Slow-Mode-Sekunden
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u64>,
}

impl Ack {
    pub fn erfolg(message_id: MessageId) -> Self {
        Self {
            success: true,
            message_id: Some(message_id),
            ..Default::default()
        }
    }

    pub fn lokal(text: impl Into<String>, is_yell: bool, reichweite: f64) -> Self {
        Self {
            success: true,
            is_local: true,
            text: Some(text.into()),
            is_yell: Some(is_yell),
            range: Some(reichweite),
            ..Default::default()
        }
    }

    pub fn befehl() -> Self {
        Self {
            success: true,
            is_command: true,
            ..Default::default()
        }
    }

    pub fn fehler(grund: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: Some(grund.into()),
            ..Default::default()
        }
    }

    pub fn slow_mode(grund: impl Into<String>, verbleibend_sek: u64) -> Self {
        Self {
            remaining: Some(verbleibend_sek),
            ..Self::fehler(grund)
        }
    }

    pub fn mit_request_id(mut self, request_id: Option<u32>) -> Self {
        self.request_id = request_id;
        self
    }
}

/// Ausgehendes Ereignis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum ServerEvent {
    Message(ChatMessage),
    Typing(TypingEreignis),
    PlayerList(SpielerListe),
    ChatSettings(ChatEinstellungenInfo),
    Ack(Ack),
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Message(_) => "message",
            ServerEvent::Typing(_) => "typing",
            ServerEvent::PlayerList(_) => "playerList",
            ServerEvent::ChatSettings(_) => "chatSettings",
            ServerEvent::Ack(_) => "ack",
        }
    }

    /// Serialisiert das Ereignis als einzelne JSON-Zeile (ohne Zeilenumbruch)
    pub fn als_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| LagerfeuerError::intern(e.to_string()))
    }
}
