//! Slow-Mode – Abklingzeit pro Benutzer
//!
//! Reiner Vergleich `jetzt - letzte_nachricht < abklingzeit`. Eine
//! Ablehnung veraendert den Zustand nicht, nur ein bestandener Versand
//! wird mit `vermerken` festgehalten.
//!
//! Eintraege ueberleben das Trennen, sonst liesse sich der Slow-Mode
//! durch Neuverbinden umgehen. `aufraeumen` entfernt abgelaufene Eintraege.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

#[derive(Debug, Default)]
pub struct RateLimiter {
    /// Abklingzeit in Millisekunden (0 = aus)
    abklingzeit_ms: i64,
    letzte_nachricht: HashMap<String, DateTime<Utc>>,
}

impl RateLimiter {
    /// Erstellt einen Limiter mit Abklingzeit in Sekunden (`chatSlowMode`)
    pub fn neu(abklingzeit_sek: u64) -> Self {
        Self {
            abklingzeit_ms: (abklingzeit_sek as i64).saturating_mul(1000),
            letzte_nachricht: HashMap::new(),
        }
    }

    pub fn ist_aktiv(&self) -> bool {
        self.abklingzeit_ms > 0
    }

    /// Prueft die Abklingzeit
    ///
    /// Gibt `Err(verbleibende_sekunden)` zurueck, aufgerundet auf ganze
    /// Sekunden. `befreit` ueberspringt die Pruefung (Admins).
    pub fn pruefen(&self, username: &str, jetzt: DateTime<Utc>, befreit: bool) -> Result<(), u64> {
        if befreit || !self.ist_aktiv() {
            return Ok(());
        }

        let Some(letzte) = self.letzte_nachricht.get(username) else {
            return Ok(());
        };

        // Uhr rueckwaerts gelaufen -> als "gerade eben" behandeln
        let vergangen = (jetzt - *letzte).num_milliseconds().max(0);
        if vergangen < self.abklingzeit_ms {
            let rest = self.abklingzeit_ms - vergangen;
            Err(((rest + 999) / 1000) as u64)
        } else {
            Ok(())
        }
    }

    /// Haelt einen bestandenen Versand fest
    pub fn vermerken(&mut self, username: &str, jetzt: DateTime<Utc>) {
        self.letzte_nachricht.insert(username.to_string(), jetzt);
    }

    /// Entfernt Eintraege, deren Abklingzeit abgelaufen ist
    pub fn aufraeumen(&mut self, jetzt: DateTime<Utc>) -> usize {
        let vorher = self.letzte_nachricht.len();
        let abklingzeit = self.abklingzeit_ms;
        self.letzte_nachricht
            .retain(|_, letzte| (jetzt - *letzte).num_milliseconds() < abklingzeit);
        vorher - self.letzte_nachricht.len()
    }

    pub fn eintraege(&self) -> usize {
        self.letzte_nachricht.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn erste_nachricht_immer_erlaubt() {
        let limiter = RateLimiter::neu(5);
        assert!(limiter.pruefen("alice", Utc::now(), false).is_ok());
    }

    #[test]
    fn drei_sekunden_abstand_abgelehnt_mit_rest() {
        let mut limiter = RateLimiter::neu(5);
        let t0 = Utc::now();
        limiter.vermerken("alice", t0);

        let ergebnis = limiter.pruefen("alice", t0 + Duration::seconds(3), false);
        assert_eq!(ergebnis, Err(2));
    }

    #[test]
    fn verbleibende_zeit_wird_aufgerundet() {
        let mut limiter = RateLimiter::neu(5);
        let t0 = Utc::now();
        limiter.vermerken("alice", t0);

        let ergebnis = limiter.pruefen("alice", t0 + Duration::milliseconds(4500), false);
        assert_eq!(ergebnis, Err(1));
    }

    #[test]
    fn nach_abklingzeit_erlaubt() {
        let mut limiter = RateLimiter::neu(5);
        let t0 = Utc::now();
        limiter.vermerken("alice", t0);

        assert!(limiter
            .pruefen("alice", t0 + Duration::milliseconds(5100), false)
            .is_ok());
        assert!(limiter
            .pruefen("alice", t0 + Duration::milliseconds(5000), false)
            .is_ok());
    }

    #[test]
    fn ablehnung_veraendert_zustand_nicht() {
        let mut limiter = RateLimiter::neu(5);
        let t0 = Utc::now();
        limiter.vermerken("alice", t0);

        // Abgelehnte Versuche verlaengern die Abklingzeit nicht
        assert!(limiter.pruefen("alice", t0 + Duration::seconds(2), false).is_err());
        assert!(limiter.pruefen("alice", t0 + Duration::seconds(4), false).is_err());
        assert!(limiter.pruefen("alice", t0 + Duration::seconds(5), false).is_ok());
    }

    #[test]
    fn befreite_benutzer_ueberspringen_pruefung() {
        let mut limiter = RateLimiter::neu(5);
        let t0 = Utc::now();
        limiter.vermerken("admin", t0);
        assert!(limiter.pruefen("admin", t0, true).is_ok());
    }

    #[test]
    fn abklingzeit_null_deaktiviert() {
        let mut limiter = RateLimiter::neu(0);
        let t0 = Utc::now();
        limiter.vermerken("alice", t0);
        assert!(!limiter.ist_aktiv());
        assert!(limiter.pruefen("alice", t0, false).is_ok());
    }

    #[test]
    fn benutzer_sind_unabhaengig() {
        let mut limiter = RateLimiter::neu(5);
        let t0 = Utc::now();
        limiter.vermerken("alice", t0);
        assert!(limiter.pruefen("bob", t0, false).is_ok());
    }

    #[test]
    fn aufraeumen_entfernt_abgelaufene() {
        let mut limiter = RateLimiter::neu(5);
        let t0 = Utc::now();
        limiter.vermerken("alice", t0);
        limiter.vermerken("bob", t0 + Duration::seconds(4));

        let entfernt = limiter.aufraeumen(t0 + Duration::seconds(6));
        assert_eq!(entfernt, 1);
        assert_eq!(limiter.eintraege(), 1);
    }
}
