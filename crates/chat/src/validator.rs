//! Validierung eingehender Nachrichten
//!
//! Die Pruefungen laufen in fester Reihenfolge und brechen beim ersten
//! Fehler ab:
//!
//! 1. Sitzung vorhanden
//! 2. Laenge in Zeichen <= `max_message_length`
//! 3. Kanal aktiviert
//! 4. STAFF/ADMIN: Live-Rollenpruefung
//! 5. FACTION/SAFEHOUSE: Mitgliedschaft im Cache
//! 6. Slow-Mode fuer pflichtige Kanaele (Admins befreit)
//!
//! Nur eine bestandene Pruefung aktualisiert den Slow-Mode-Zustand.

use chrono::{DateTime, Utc};
use lagerfeuer_core::{AccessLevel, Channel, NachrichtAnfrage};

use crate::error::{Ablehnung, ChatResult};
use crate::host::LivePermission;
use crate::presence::{PresenceDirectory, Sitzung};
use crate::rate_limit::RateLimiter;
use crate::settings::ChatSettings;

/// Ergebnis einer bestandenen Validierung
#[derive(Debug, Clone)]
pub struct ValidierteNachricht {
    /// Momentaufnahme der Absender-Sitzung
    pub sitzung: Sitzung,
    pub anfrage: NachrichtAnfrage,
    /// Live abgefragte Rolle, falls waehrend der Pruefung benoetigt
    pub zugriffsstufe: Option<AccessLevel>,
}

pub struct MessageValidator<'a> {
    pub einstellungen: &'a ChatSettings,
    pub presence: &'a PresenceDirectory,
    pub rechte: &'a dyn LivePermission,
}

impl MessageValidator<'_> {
    pub fn validieren(
        &self,
        limiter: &mut RateLimiter,
        absender: &str,
        anfrage: NachrichtAnfrage,
        jetzt: DateTime<Utc>,
    ) -> ChatResult<ValidierteNachricht> {
        let sitzung = self
            .presence
            .sitzung(absender)
            .ok_or(Ablehnung::NichtVerbunden)?;

        let laenge = anfrage.text.chars().count();
        let max = self.einstellungen.max_message_length;
        if laenge > max {
            return Err(Ablehnung::ZuLang { laenge, max }.into());
        }

        let kanal = anfrage.channel;
        if !self.einstellungen.ist_aktiviert(kanal) {
            return Err(Ablehnung::KanalDeaktiviert(kanal).into());
        }

        let mut zugriffsstufe = None;
        if kanal.erfordert_live_pruefung() {
            let stufe = self.rechte.zugriffsstufe(absender)?;
            let erlaubt = match kanal {
                Channel::Admin => stufe.ist_admin(),
                _ => stufe.ist_staff(),
            };
            if !erlaubt {
                tracing::info!(
                    username = %absender,
                    kanal = %kanal,
                    gecacht_admin = sitzung.is_admin,
                    live = ?stufe,
                    "Live-Rollenpruefung abgelehnt"
                );
                return Err(Ablehnung::KeineBerechtigung(kanal).into());
            }
            zugriffsstufe = Some(stufe);
        }

        match kanal {
            Channel::Faction if sitzung.fraktion.is_none() => {
                return Err(Ablehnung::KeineFraktion.into());
            }
            Channel::Safehouse if sitzung.safehouse.is_none() => {
                return Err(Ablehnung::KeinSafehouse.into());
            }
            _ => {}
        }

        if kanal.slow_mode_pflichtig() && limiter.ist_aktiv() {
            let stufe = match zugriffsstufe {
                Some(stufe) => stufe,
                None => self.rechte.zugriffsstufe(absender)?,
            };
            if let Err(verbleibend_sek) = limiter.pruefen(absender, jetzt, stufe.ist_admin()) {
                return Err(Ablehnung::SlowMode { verbleibend_sek }.into());
            }
            limiter.vermerken(absender, jetzt);
            zugriffsstufe = Some(stufe);
        }

        Ok(ValidierteNachricht {
            sitzung: sitzung.clone(),
            anfrage,
            zugriffsstufe,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatError;
    use crate::host::{MemoryHost, SpielerZustand};
    use chrono::Duration;

    struct Aufbau {
        host: MemoryHost,
        presence: PresenceDirectory,
        einstellungen: ChatSettings,
        limiter: RateLimiter,
    }

    impl Aufbau {
        fn neu(slow_mode: u64) -> Self {
            let host = MemoryHost::neu();
            host.spieler_setzen(
                "alice",
                SpielerZustand {
                    fraktion: Some("Ranger".into()),
                    ..Default::default()
                },
            );
            host.spieler_setzen(
                "root",
                SpielerZustand {
                    zugriffsstufe: AccessLevel::Admin,
                    ..Default::default()
                },
            );
            let mut presence = PresenceDirectory::neu();
            presence.upsert("alice", &host, &host, Utc::now()).unwrap();
            presence.upsert("root", &host, &host, Utc::now()).unwrap();
            Self {
                host,
                presence,
                einstellungen: ChatSettings {
                    chat_slow_mode: slow_mode,
                    max_message_length: 10,
                    ..Default::default()
                },
                limiter: RateLimiter::neu(slow_mode),
            }
        }

        fn pruefen_um(
            &mut self,
            absender: &str,
            anfrage: NachrichtAnfrage,
            jetzt: DateTime<Utc>,
        ) -> ChatResult<ValidierteNachricht> {
            let validator = MessageValidator {
                einstellungen: &self.einstellungen,
                presence: &self.presence,
                rechte: &self.host,
            };
            validator.validieren(&mut self.limiter, absender, anfrage, jetzt)
        }

        fn pruefen(
            &mut self,
            absender: &str,
            kanal: Channel,
            text: &str,
        ) -> ChatResult<ValidierteNachricht> {
            self.pruefen_um(absender, NachrichtAnfrage::neu(kanal, text), Utc::now())
        }
    }

    fn ablehnung(ergebnis: ChatResult<ValidierteNachricht>) -> Ablehnung {
        match ergebnis {
            Err(ChatError::Validierung(a)) => a,
            andere => panic!("Ablehnung erwartet, erhalten: {:?}", andere),
        }
    }

    #[test]
    fn ohne_sitzung_nicht_verbunden() {
        let mut a = Aufbau::neu(0);
        let e = ablehnung(a.pruefen("zoe", Channel::Global, "hi"));
        assert_eq!(e, Ablehnung::NichtVerbunden);
    }

    #[test]
    fn laenge_in_zeichen() {
        let mut a = Aufbau::neu(0);
        // 10 Umlaute = 20 Bytes, aber nur 10 Zeichen
        assert!(a.pruefen("alice", Channel::Global, &"ää".repeat(5)).is_ok());
        let e = ablehnung(a.pruefen("alice", Channel::Global, &"x".repeat(11)));
        assert_eq!(e, Ablehnung::ZuLang { laenge: 11, max: 10 });
    }

    #[test]
    fn deaktivierter_kanal_auch_fuer_admins() {
        let mut a = Aufbau::neu(0);
        a.einstellungen.kanaele.setzen(Channel::Admin, false);
        let e = ablehnung(a.pruefen("root", Channel::Admin, "hi"));
        assert_eq!(e, Ablehnung::KanalDeaktiviert(Channel::Admin));
    }

    #[test]
    fn jeder_deaktivierte_kanal_abgelehnt() {
        for kanal in Channel::ALLE {
            let mut a = Aufbau::neu(0);
            a.einstellungen.kanaele.setzen(kanal, false);
            for absender in ["alice", "root"] {
                let e = ablehnung(a.pruefen(absender, kanal, "hi"));
                assert_eq!(e, Ablehnung::KanalDeaktiviert(kanal), "{kanal} fuer {absender}");
            }
            // Die uebrigen Kanaele bleiben offen
            let anderer = if kanal == Channel::Global {
                Channel::Local
            } else {
                Channel::Global
            };
            assert!(a.pruefen("root", anderer, "hi").is_ok());
        }
    }

    #[test]
    fn laenge_vor_kanal_geprueft() {
        let mut a = Aufbau::neu(0);
        a.einstellungen.kanaele.setzen(Channel::Global, false);
        let e = ablehnung(a.pruefen("alice", Channel::Global, &"x".repeat(20)));
        assert!(matches!(e, Ablehnung::ZuLang { .. }));
    }

    #[test]
    fn admin_kanal_nach_live_rolle() {
        let mut a = Aufbau::neu(0);
        let e = ablehnung(a.pruefen("alice", Channel::Admin, "hi"));
        assert_eq!(e, Ablehnung::KeineBerechtigung(Channel::Admin));

        let ok = a.pruefen("root", Channel::Admin, "hi").unwrap();
        assert_eq!(ok.zugriffsstufe, Some(AccessLevel::Admin));
    }

    #[test]
    fn veralteter_cache_entscheidet_nicht() {
        let mut a = Aufbau::neu(0);
        assert!(a.presence.sitzung("root").unwrap().is_admin);

        a.host.zugriffsstufe_setzen("root", AccessLevel::None);
        let e = ablehnung(a.pruefen("root", Channel::Admin, "hi"));
        assert_eq!(e, Ablehnung::KeineBerechtigung(Channel::Admin));
    }

    #[test]
    fn fraktion_und_safehouse_erforderlich() {
        let mut a = Aufbau::neu(0);
        assert!(a.pruefen("alice", Channel::Faction, "hi").is_ok());
        let e = ablehnung(a.pruefen("alice", Channel::Safehouse, "hi"));
        assert_eq!(e, Ablehnung::KeinSafehouse);
        let e = ablehnung(a.pruefen("root", Channel::Faction, "hi"));
        assert_eq!(e, Ablehnung::KeineFraktion);
    }

    #[test]
    fn slow_mode_mit_restzeit() {
        let mut a = Aufbau::neu(5);
        let t0 = Utc::now();
        let global = |text: &str| NachrichtAnfrage::neu(Channel::Global, text);

        assert!(a.pruefen_um("alice", global("1"), t0).is_ok());
        let e = ablehnung(a.pruefen_um("alice", global("2"), t0 + Duration::seconds(3)));
        assert_eq!(e, Ablehnung::SlowMode { verbleibend_sek: 2 });
        // Abgelehnter Versuch hat die Zeit nicht zurueckgesetzt
        let spaeter = t0 + Duration::milliseconds(5100);
        assert!(a.pruefen_um("alice", global("3"), spaeter).is_ok());
    }

    #[test]
    fn slow_mode_nur_fuer_pflichtige_kanaele() {
        let mut a = Aufbau::neu(5);
        let t0 = Utc::now();
        let anfrage = |kanal: Channel, text: &str| NachrichtAnfrage::neu(kanal, text);

        assert!(a.pruefen_um("alice", anfrage(Channel::Global, "1"), t0).is_ok());
        assert!(a.pruefen_um("alice", anfrage(Channel::Local, "2"), t0).is_ok());
        assert!(a.pruefen_um("alice", NachrichtAnfrage::privat("root", "3"), t0).is_ok());
        assert!(a.pruefen_um("alice", anfrage(Channel::Faction, "4"), t0).is_err());
    }

    #[test]
    fn admins_vom_slow_mode_befreit() {
        let mut a = Aufbau::neu(5);
        let t0 = Utc::now();
        for _ in 0..3 {
            let anfrage = NachrichtAnfrage::neu(Channel::Global, "hi");
            assert!(a.pruefen_um("root", anfrage, t0).is_ok());
        }
    }
}
