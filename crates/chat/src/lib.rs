//! lagerfeuer-chat – Routing-, Validierungs- und Presence-Engine
//!
//! Dieses Crate implementiert:
//! - PresenceDirectory: gecachte Attribute aller verbundenen Spieler
//! - MessageValidator: geordnete Pruefkette inkl. Live-Rollenpruefung
//! - ChannelRouter: Empfaenger-Aufloesung pro Kanal
//! - DeliveryEngine: Zustellung ueber den `Transport`
//! - TypingTracker: Tipp-Indikatoren mit Timeout
//! - ChatEngine: besitzt den Zustand und verbindet alles
//!
//! # Beispiel
//!
//! ```no_run
//! use std::sync::Arc;
//! use lagerfeuer_chat::{ChatEngine, ChatSettings, HostPorts, MemoryHost, SystemClock, Transport};
//! use lagerfeuer_core::{NachrichtAnfrage, Channel, ServerEvent};
//!
//! struct Konsole;
//!
//! impl Transport for Konsole {
//!     fn an_verbindung_senden(&self, username: &str, event: &ServerEvent) -> bool {
//!         println!("{username}: {event:?}");
//!         true
//!     }
//!     fn an_alle_senden(&self, event: &ServerEvent, _ausser: Option<&str>) -> usize {
//!         println!("*: {event:?}");
//!         1
//!     }
//! }
//!
//! let host = Arc::new(MemoryHost::neu());
//! let mut engine = ChatEngine::neu(
//!     ChatSettings::default(),
//!     HostPorts {
//!         rechte: host.clone(),
//!         welt: host,
//!         transport: Arc::new(Konsole),
//!         uhr: Arc::new(SystemClock),
//!     },
//! );
//!
//! engine.verbunden("alice").unwrap();
//! let anfrage = NachrichtAnfrage::neu(Channel::Global, "Hallo");
//! let ack = engine.nachricht_verarbeiten("alice", anfrage);
//! assert!(ack.success);
//! ```

pub mod clock;
pub mod delivery;
pub mod engine;
pub mod error;
pub mod host;
pub mod presence;
pub mod rate_limit;
pub mod resolver;
pub mod settings;
pub mod typing;
pub mod validator;
pub mod yell;

#[cfg(test)]
mod tests;

// Bequeme Re-Exporte
pub use clock::{Clock, ManualClock, SystemClock};
pub use delivery::DeliveryEngine;
pub use engine::{ChatEngine, HostPorts};
pub use error::{Ablehnung, ChatError, ChatResult, HostError, HostResult};
pub use host::{CommandHook, LivePermission, MemoryHost, SpielerZustand, Transport, WorldQuery};
pub use presence::{AuffrischungsBericht, PresenceDirectory, Sitzung};
pub use rate_limit::RateLimiter;
pub use resolver::{in_reichweite, ChannelRouter, Zustellung};
pub use settings::{ChatSettings, KanalSchalter};
pub use typing::{TypingSchluessel, TypingTracker, TYPING_TIMEOUT_MS};
pub use validator::{MessageValidator, ValidierteNachricht};
