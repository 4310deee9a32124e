//! Fehlertypen fuer Lagerfeuer-Core
//!
//! Betrifft nur das Wire-Protokoll. Routing- und Validierungsfehler
//! definiert `lagerfeuer-chat` selbst.

use thiserror::Error;

/// Result-Alias fuer Lagerfeuer-Core
pub type Result<T> = std::result::Result<T, LagerfeuerError>;

#[derive(Debug, Error)]
pub enum LagerfeuerError {
    #[error("Ungueltiges Frame: {0}")]
    UngueltigesFrame(String),

    #[error("Unbekanntes Ereignis: {0}")]
    UnbekanntesEreignis(String),

    #[error("Ungueltiger Payload fuer '{event}': {grund}")]
    UngueltigerPayload { event: String, grund: String },

    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl LagerfeuerError {
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }
}
