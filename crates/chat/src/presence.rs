//! Presence-Verzeichnis – gecachte Attribute aller verbundenen Spieler
//!
//! Haelt pro verbundenem Benutzer Fraktion, Safehouse, Anzeigename und
//! grobe Rollen-Flags. Die Eintraege werden beim Verbinden aus dem Host
//! abgeleitet, periodisch aufgefrischt und beim Trennen entfernt.
//!
//! Der Cache ist eventual consistent. Berechtigungskritische Pruefungen
//! (STAFF/ADMIN) lesen nie von hier, sondern fragen `LivePermission`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use lagerfeuer_core::{SpielerInfo, SpielerListe};

use crate::error::HostResult;
use crate::host::{LivePermission, WorldQuery};

/// Gecachte Sitzung eines verbundenen Spielers
#[derive(Debug, Clone, PartialEq)]
pub struct Sitzung {
    pub username: String,
    pub anzeigename: String,
    pub fraktion: Option<String>,
    pub safehouse: Option<String>,
    pub is_admin: bool,
    pub is_staff: bool,
    /// Zeitpunkt der letzten Ableitung aus dem Host
    pub aktualisiert: DateTime<Utc>,
}

impl Sitzung {
    /// Leitet die Sitzung aus dem aktuellen Host-Zustand ab
    fn ableiten(
        username: &str,
        welt: &dyn WorldQuery,
        rechte: &dyn LivePermission,
        jetzt: DateTime<Utc>,
    ) -> HostResult<Self> {
        let stufe = rechte.zugriffsstufe(username)?;
        Ok(Self {
            username: username.to_string(),
            anzeigename: welt
                .anzeigename(username)?
                .unwrap_or_else(|| username.to_string()),
            fraktion: welt.fraktion(username)?,
            safehouse: welt.safehouse(username)?,
            is_admin: stufe.ist_admin(),
            is_staff: stufe.ist_staff(),
            aktualisiert: jetzt,
        })
    }

    /// Gleiche Attribute, Zeitstempel ausgenommen
    fn gleiche_attribute(&self, andere: &Sitzung) -> bool {
        self.anzeigename == andere.anzeigename
            && self.fraktion == andere.fraktion
            && self.safehouse == andere.safehouse
            && self.is_admin == andere.is_admin
            && self.is_staff == andere.is_staff
    }
}

/// Ergebnis eines Auffrischungslaufs
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AuffrischungsBericht {
    pub geprueft: usize,
    pub geaendert: usize,
    pub fehlgeschlagen: usize,
}

/// Verzeichnis aller verbundenen Sitzungen
#[derive(Debug, Default)]
pub struct PresenceDirectory {
    sitzungen: BTreeMap<String, Sitzung>,
}

impl PresenceDirectory {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Legt die Sitzung an oder leitet sie neu ab (Verbinden, Tod, Host-Ereignis)
    pub fn upsert(
        &mut self,
        username: &str,
        welt: &dyn WorldQuery,
        rechte: &dyn LivePermission,
        jetzt: DateTime<Utc>,
    ) -> HostResult<&Sitzung> {
        let sitzung = Sitzung::ableiten(username, welt, rechte, jetzt)?;
        tracing::debug!(
            username = %username,
            fraktion = ?sitzung.fraktion,
            safehouse = ?sitzung.safehouse,
            is_admin = sitzung.is_admin,
            is_staff = sitzung.is_staff,
            "Sitzung abgeleitet"
        );
        self.sitzungen.insert(username.to_string(), sitzung);
        Ok(&self.sitzungen[username])
    }

    /// Entfernt eine Sitzung (Trennen, Verlassen)
    pub fn entfernen(&mut self, username: &str) -> Option<Sitzung> {
        self.sitzungen.remove(username)
    }

    /// Leitet alle Sitzungen neu ab
    ///
    /// Schlaegt die Abfrage fuer einen Spieler fehl, bleiben seine alten
    /// Attribute erhalten. Der Cache darf driften.
    pub fn alle_aktualisieren(
        &mut self,
        welt: &dyn WorldQuery,
        rechte: &dyn LivePermission,
        jetzt: DateTime<Utc>,
    ) -> AuffrischungsBericht {
        let mut bericht = AuffrischungsBericht::default();

        for (username, sitzung) in self.sitzungen.iter_mut() {
            bericht.geprueft += 1;
            match Sitzung::ableiten(username, welt, rechte, jetzt) {
                Ok(neu) => {
                    if !sitzung.gleiche_attribute(&neu) {
                        bericht.geaendert += 1;
                        tracing::debug!(username = %username, "Sitzungsattribute geaendert");
                    }
                    *sitzung = neu;
                }
                Err(e) => {
                    bericht.fehlgeschlagen += 1;
                    tracing::warn!(
                        username = %username,
                        fehler = %e,
                        "Sitzung konnte nicht aufgefrischt werden – behalte alte Attribute"
                    );
                }
            }
        }

        bericht
    }

    pub fn sitzung(&self, username: &str) -> Option<&Sitzung> {
        self.sitzungen.get(username)
    }

    pub fn ist_verbunden(&self, username: &str) -> bool {
        self.sitzungen.contains_key(username)
    }

    /// Alle Sitzungen, sortiert nach Benutzername
    pub fn alle(&self) -> impl Iterator<Item = &Sitzung> {
        self.sitzungen.values()
    }

    pub fn anzahl(&self) -> usize {
        self.sitzungen.len()
    }

    /// Spielerliste fuer das `playerList`-Ereignis
    pub fn spielerliste(&self) -> SpielerListe {
        SpielerListe {
            players: self
                .alle()
                .map(|s| SpielerInfo {
                    username: s.username.clone(),
                    is_admin: s.is_admin,
                    is_staff: s.is_staff,
                })
                .collect(),
        }
    }
}
