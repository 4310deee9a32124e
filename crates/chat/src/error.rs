//! Fehlertypen fuer die Chat-Engine
//!
//! Taxonomie:
//! - `Ablehnung`: fuer den Absender sichtbar, nicht fatal (Validierung,
//!   deaktivierter Kanal, Slow-Mode)
//! - `ZielNichtGefunden`: Routing-Luecke, Systemmeldung nur an den Absender
//! - `Host`: Fehler in nachgelagerten Handlern (Rollen, Spielwelt, Befehle),
//!   werden an der Engine-Grenze abgefangen und als generisches Fehler-Ack
//!   gemeldet

use lagerfeuer_core::Channel;
use thiserror::Error;

/// Grund, aus dem eine Nachricht abgelehnt wurde
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Ablehnung {
    #[error("Nicht verbunden")]
    NichtVerbunden,

    #[error("Nachricht zu lang: {laenge} Zeichen (Maximum: {max})")]
    ZuLang { laenge: usize, max: usize },

    #[error("Kanal {0} ist deaktiviert")]
    KanalDeaktiviert(Channel),

    #[error("Keine Berechtigung fuer Kanal {0}")]
    KeineBerechtigung(Channel),

    #[error("Du gehoerst keiner Fraktion an")]
    KeineFraktion,

    #[error("Du hast kein Safehouse")]
    KeinSafehouse,

    #[error("Kein Empfaenger angegeben")]
    KeinZiel,

    #[error("Slow-Mode aktiv: bitte noch {verbleibend_sek} s warten")]
    SlowMode { verbleibend_sek: u64 },
}

/// Fehler der Host-Schnittstellen (Rollen, Spielwelt, Befehle)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("Spieler unbekannt: {0}")]
    UnbekannterSpieler(String),

    #[error("Host nicht erreichbar: {0}")]
    NichtErreichbar(String),

    #[error("Befehl fehlgeschlagen: {0}")]
    Befehl(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// Fehlertyp der Chat-Engine
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Validierung(#[from] Ablehnung),

    #[error("Spieler nicht gefunden: {0}")]
    ZielNichtGefunden(String),

    #[error("Host-Fehler: {0}")]
    Host(#[from] HostError),
}

impl ChatError {
    /// Fehler in nachgelagerten Handlern, nicht vom Absender verursacht
    pub fn ist_intern(&self) -> bool {
        matches!(self, Self::Host(_))
    }

    /// Text fuer Systemmeldung und Ack an den Absender
    ///
    /// Interne Fehler werden nicht im Detail an Clients weitergegeben.
    pub fn meldung(&self) -> String {
        if self.ist_intern() {
            "Nachricht konnte nicht verarbeitet werden".to_string()
        } else {
            self.to_string()
        }
    }
}

pub type ChatResult<T> = Result<T, ChatError>;
