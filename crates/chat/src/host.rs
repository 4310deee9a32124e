//! Host-Schnittstellen der Chat-Engine
//!
//! Die Engine kennt weder Socket-Bibliothek noch Spielwelt. Sie spricht
//! ausschliesslich ueber diese Traits mit ihrer Umgebung:
//!
//! - `LivePermission` – autoritative Rollenabfrage (langsam, immer aktuell)
//! - `WorldQuery`     – Fraktion, Safehouse, Position, Anzeigename
//! - `CommandHook`    – Einstieg in das externe Befehlssystem
//! - `Transport`      – verbindungsadressiertes Senden und Broadcast
//!
//! `MemoryHost` implementiert `LivePermission` und `WorldQuery` im
//! Speicher und wird vom Server (aus der Konfiguration befuellt) und in
//! Tests verwendet.

use std::collections::HashMap;

use lagerfeuer_core::{AccessLevel, Position, ServerEvent};
use parking_lot::RwLock;

use crate::error::HostResult;

/// Autoritative Rollenabfrage
///
/// Wird fuer STAFF/ADMIN bei jedem Versand erneut befragt. Gecachte
/// Rollen aus dem Presence-Verzeichnis sind dafuer nie ausreichend.
pub trait LivePermission: Send + Sync {
    fn zugriffsstufe(&self, username: &str) -> HostResult<AccessLevel>;
}

/// Abfragen an den aktuellen Spielzustand
pub trait WorldQuery: Send + Sync {
    fn fraktion(&self, username: &str) -> HostResult<Option<String>>;

    fn safehouse(&self, username: &str) -> HostResult<Option<String>>;

    fn position(&self, username: &str) -> HostResult<Option<Position>>;

    /// Charaktername fuer den Roleplay-Modus
    fn anzeigename(&self, username: &str) -> HostResult<Option<String>>;
}

/// Routing-Hook des externen Befehlssystems
///
/// Gibt optional eine Antwort zurueck, die dem Absender als
/// Systemmeldung angezeigt wird.
pub trait CommandHook: Send + Sync {
    fn ausfuehren(&self, username: &str, befehl: &str) -> HostResult<Option<String>>;
}

/// Verbindungsadressiertes Senden
///
/// Fire-and-forget: Rueckgabewerte dienen nur dem Logging, es gibt keine
/// Wiederholung.
pub trait Transport: Send + Sync {
    /// Sendet an die Verbindung eines Benutzers. `false` wenn unbekannt
    /// oder die Send-Queue voll ist.
    fn an_verbindung_senden(&self, username: &str, event: &ServerEvent) -> bool;

    /// Sendet an alle Verbindungen, optional ausser einer.
    /// Gibt die Anzahl erfolgreicher Sendungen zurueck.
    fn an_alle_senden(&self, event: &ServerEvent, ausser: Option<&str>) -> usize;
}

// ---------------------------------------------------------------------------
// MemoryHost
// ---------------------------------------------------------------------------

/// Spielzustand eines Spielers im `MemoryHost`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpielerZustand {
    pub zugriffsstufe: AccessLevel,
    pub fraktion: Option<String>,
    pub safehouse: Option<String>,
    pub position: Option<Position>,
    pub anzeigename: Option<String>,
}

/// In-Memory-Host
///
/// Unbekannte Spieler gelten als normale Spieler ohne Fraktion,
/// Safehouse und Position.
#[derive(Debug, Default)]
pub struct MemoryHost {
    spieler: RwLock<HashMap<String, SpielerZustand>>,
}

impl MemoryHost {
    pub fn neu() -> Self {
        Self::default()
    }

    pub fn spieler_setzen(&self, username: impl Into<String>, zustand: SpielerZustand) {
        self.spieler.write().insert(username.into(), zustand);
    }

    pub fn spieler_entfernen(&self, username: &str) {
        self.spieler.write().remove(username);
    }

    pub fn zugriffsstufe_setzen(&self, username: &str, stufe: AccessLevel) {
        self.mit_spieler(username, |z| z.zugriffsstufe = stufe);
    }

    pub fn fraktion_setzen(&self, username: &str, fraktion: Option<&str>) {
        self.mit_spieler(username, |z| z.fraktion = fraktion.map(str::to_string));
    }

    pub fn safehouse_setzen(&self, username: &str, safehouse: Option<&str>) {
        self.mit_spieler(username, |z| z.safehouse = safehouse.map(str::to_string));
    }

    pub fn position_setzen(&self, username: &str, position: Option<Position>) {
        self.mit_spieler(username, |z| z.position = position);
    }

    pub fn anzahl(&self) -> usize {
        self.spieler.read().len()
    }

    fn mit_spieler(&self, username: &str, aenderung: impl FnOnce(&mut SpielerZustand)) {
        let mut spieler = self.spieler.write();
        aenderung(spieler.entry(username.to_string()).or_default());
    }

    fn lesen<T>(&self, username: &str, feld: impl FnOnce(&SpielerZustand) -> T) -> Option<T> {
        self.spieler.read().get(username).map(feld)
    }
}

impl LivePermission for MemoryHost {
    fn zugriffsstufe(&self, username: &str) -> HostResult<AccessLevel> {
        Ok(self.lesen(username, |z| z.zugriffsstufe).unwrap_or_default())
    }
}

impl WorldQuery for MemoryHost {
    fn fraktion(&self, username: &str) -> HostResult<Option<String>> {
        Ok(self.lesen(username, |z| z.fraktion.clone()).flatten())
    }

    fn safehouse(&self, username: &str) -> HostResult<Option<String>> {
        Ok(self.lesen(username, |z| z.safehouse.clone()).flatten())
    }

    fn position(&self, username: &str) -> HostResult<Option<Position>> {
        Ok(self.lesen(username, |z| z.position).flatten())
    }

    fn anzeigename(&self, username: &str) -> HostResult<Option<String>> {
        Ok(self.lesen(username, |z| z.anzeigename.clone()).flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbekannter_spieler_ist_normaler_spieler() {
        let host = MemoryHost::neu();
        assert_eq!(host.zugriffsstufe("niemand").unwrap(), AccessLevel::None);
        assert_eq!(host.fraktion("niemand").unwrap(), None);
        assert_eq!(host.position("niemand").unwrap(), None);
    }

    #[test]
    fn zustand_aendern() {
        let host = MemoryHost::neu();
        host.zugriffsstufe_setzen("alice", AccessLevel::Admin);
        host.fraktion_setzen("alice", Some("Ranger"));
        host.position_setzen("alice", Some(Position::neu(1.0, 2.0, 0)));

        assert_eq!(host.zugriffsstufe("alice").unwrap(), AccessLevel::Admin);
        assert_eq!(host.fraktion("alice").unwrap().as_deref(), Some("Ranger"));
        assert_eq!(host.anzahl(), 1);

        host.fraktion_setzen("alice", None);
        assert_eq!(host.fraktion("alice").unwrap(), None);
    }
}
