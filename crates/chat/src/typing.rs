//! Tipp-Indikatoren
//!
//! Pro Schluessel (Kanal, bei PRIVATE zusaetzlich das Ziel) wird je
//! Benutzer der Zeitpunkt des letzten `typingStart` gehalten. Fan-out
//! erfolgt nur beim Uebergang NichtTippend -> Tippend, wiederholte
//! Starts erneuern nur den Zeitstempel.
//!
//! Eintraege ohne Auffrischung werden nach `TYPING_TIMEOUT_MS` vom
//! periodischen Sweep entfernt. Der Aufrufer sendet dafuer einen
//! synthetischen Stop.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use lagerfeuer_core::Channel;

/// Zeit ohne Auffrischung, nach der ein Tipp-Indikator verfaellt
pub const TYPING_TIMEOUT_MS: i64 = 5000;

/// Schluessel eines Tipp-Indikators
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypingSchluessel {
    pub channel: Channel,
    /// Nur bei PRIVATE gesetzt
    pub ziel: Option<String>,
}

impl TypingSchluessel {
    pub fn neu(channel: Channel, ziel: Option<&str>) -> Self {
        let ziel = match channel {
            Channel::Private => ziel.map(str::to_string),
            _ => None,
        };
        Self { channel, ziel }
    }
}

#[derive(Debug)]
pub struct TypingTracker {
    timeout: Duration,
    eintraege: BTreeMap<TypingSchluessel, BTreeMap<String, DateTime<Utc>>>,
}

impl Default for TypingTracker {
    fn default() -> Self {
        Self::neu()
    }
}

impl TypingTracker {
    pub fn neu() -> Self {
        Self::mit_timeout(Duration::milliseconds(TYPING_TIMEOUT_MS))
    }

    pub fn mit_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            eintraege: BTreeMap::new(),
        }
    }

    /// Markiert `username` als tippend
    ///
    /// Gibt `true` zurueck, wenn ein Fan-out noetig ist. Ein abgelaufener,
    /// noch nicht gesweepter Eintrag zaehlt als neuer Start.
    pub fn starten(
        &mut self,
        schluessel: TypingSchluessel,
        username: &str,
        jetzt: DateTime<Utc>,
    ) -> bool {
        let timeout = self.timeout;
        let tippende = self.eintraege.entry(schluessel).or_default();
        match tippende.insert(username.to_string(), jetzt) {
            Some(vorher) => jetzt - vorher >= timeout,
            None => true,
        }
    }

    /// Gibt `true` zurueck, wenn der Benutzer als tippend gefuehrt war
    pub fn stoppen(&mut self, schluessel: &TypingSchluessel, username: &str) -> bool {
        let Some(tippende) = self.eintraege.get_mut(schluessel) else {
            return false;
        };
        let entfernt = tippende.remove(username).is_some();
        if tippende.is_empty() {
            self.eintraege.remove(schluessel);
        }
        entfernt
    }

    /// Entfernt alle Eintraege mit `jetzt - letzte >= timeout`
    pub fn abgelaufene_entfernen(
        &mut self,
        jetzt: DateTime<Utc>,
    ) -> Vec<(TypingSchluessel, String)> {
        let timeout = self.timeout;
        let mut abgelaufen = Vec::new();

        self.eintraege.retain(|schluessel, tippende| {
            tippende.retain(|username, letzte| {
                let aktiv = jetzt - *letzte < timeout;
                if !aktiv {
                    abgelaufen.push((schluessel.clone(), username.clone()));
                }
                aktiv
            });
            !tippende.is_empty()
        });

        abgelaufen
    }

    /// Entfernt alle Eintraege eines Benutzers (Trennen, Tod)
    pub fn benutzer_entfernen(&mut self, username: &str) -> Vec<TypingSchluessel> {
        let mut betroffen = Vec::new();
        self.eintraege.retain(|schluessel, tippende| {
            if tippende.remove(username).is_some() {
                betroffen.push(schluessel.clone());
            }
            !tippende.is_empty()
        });
        betroffen
    }

    pub fn tippt(
        &self,
        schluessel: &TypingSchluessel,
        username: &str,
        jetzt: DateTime<Utc>,
    ) -> bool {
        self.eintraege
            .get(schluessel)
            .and_then(|t| t.get(username))
            .is_some_and(|letzte| jetzt - *letzte < self.timeout)
    }

    pub fn tippende(&self, schluessel: &TypingSchluessel) -> Vec<String> {
        self.eintraege
            .get(schluessel)
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Anzahl aller gefuehrten Eintraege
    pub fn anzahl(&self) -> usize {
        self.eintraege.values().map(BTreeMap::len).sum()
    }
}
