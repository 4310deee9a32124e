//! Fehlertypen fuer den TCP-Transport

use lagerfeuer_core::LagerfeuerError;
use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// Fehler waehrend des Verbindungsaufbaus
#[derive(Debug, Error)]
pub enum HandshakeFehler {
    /// Kein `hello` innerhalb der Frist
    #[error("Zeitueberschreitung beim Handshake")]
    Timeout,

    /// Verbindung vor dem Handshake geschlossen
    #[error("Verbindung vor dem Handshake geschlossen")]
    Geschlossen,

    /// Erstes Ereignis war kein `hello`
    #[error("Erwartet 'hello', erhalten '{0}'")]
    KeinHello(String),

    /// Leerer oder zu langer Benutzername
    #[error("Ungueltiger Benutzername")]
    UngueltigerName,

    /// Name ist bereits verbunden
    #[error("Benutzername '{0}' ist bereits verbunden")]
    NameVergeben(String),

    /// Server ist voll
    #[error("Server ist voll")]
    ServerVoll,

    /// Frame nicht dekodierbar
    #[error(transparent)]
    Protokoll(#[from] LagerfeuerError),

    /// Lesefehler auf dem Socket
    #[error("Lesefehler: {0}")]
    Lesen(#[from] LinesCodecError),
}

impl HandshakeFehler {
    /// Ob dem Client noch eine Begruendung gesendet werden kann
    pub fn antwortbar(&self) -> bool {
        !matches!(self, Self::Geschlossen | Self::Lesen(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        assert_eq!(
            HandshakeFehler::NameVergeben("alice".into()).to_string(),
            "Benutzername 'alice' ist bereits verbunden"
        );
        assert!(HandshakeFehler::Timeout.antwortbar());
        assert!(!HandshakeFehler::Geschlossen.antwortbar());
    }
}
