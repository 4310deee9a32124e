//! lagerfeuer-core – Gemeinsame Typen, Wire-Protokoll und Fehlertypen
//!
//! Wird von der Chat-Engine und vom Server gemeinsam genutzt.

pub mod channel;
pub mod error;
pub mod message;
pub mod protocol;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use channel::Channel;
pub use error::{LagerfeuerError, Result};
pub use message::{ChatMessage, MessageMetadata, NachrichtenTyp};
pub use protocol::{
    Ack, ChatEinstellungenInfo, ClientEvent, ClientFrame, NachrichtAnfrage, ServerEvent,
    SpielerInfo, SpielerListe, TypingAnfrage, TypingEreignis,
};
pub use types::{AccessLevel, Farbe, MessageId, Position, SCHREI_FARBE};
