//! Empfaenger-Aufloesung pro Kanal
//!
//! Der `ChannelRouter` bestimmt fuer jede Nachricht (und jeden
//! Tipp-Indikator) die Empfaengermenge. Jede Kanal-Variante hat genau
//! eine Regel; der Match ist erschoepfend.
//!
//! ## Autoritative Quelle pro Kanal
//! | Kanal              | Quelle                                  |
//! |--------------------|-----------------------------------------|
//! | LOCAL              | Host-Positionen (nur Tipp-Indikatoren)  |
//! | GLOBAL / RADIO     | alle Sitzungen                          |
//! | FACTION / SAFEHOUSE| gecachte Sitzungsattribute              |
//! | PRIVATE            | Presence-Verzeichnis (Ziel verbunden?)  |
//! | STAFF / ADMIN      | `LivePermission`, bei jedem Versand     |

use lagerfeuer_core::{AccessLevel, Channel, ChatMessage, Position};

use crate::error::{ChatError, ChatResult};
use crate::host::{LivePermission, WorldQuery};
use crate::presence::{PresenceDirectory, Sitzung};
use crate::settings::ChatSettings;

/// Maximaler Etagenunterschied fuer den Naehe-Chat
pub const MAX_ETAGEN_DIFFERENZ: i32 = 1;

/// Ergebnis der Aufloesung
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Zustellung {
    /// LOCAL: kein Broadcast, nur Ack an den Absender. Die Naehe-Zustellung
    /// uebernimmt der native Spielchat.
    NurAbsender,
    /// Broadcast-Primitive des Transports
    Broadcast,
    /// Einzeln adressierte Empfaenger
    Empfaenger(Vec<String>),
}

/// Prueft, ob `b` von `a` aus in Reichweite ist
///
/// Planare euklidische Distanz <= `radius` und hoechstens eine Etage
/// Unterschied.
pub fn in_reichweite(a: &Position, b: &Position, radius: f64) -> bool {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt() <= radius && (a.etage - b.etage).abs() <= MAX_ETAGEN_DIFFERENZ
}

/// Kanal-Router ueber Presence-Verzeichnis und Host
pub struct ChannelRouter<'a> {
    pub presence: &'a PresenceDirectory,
    pub rechte: &'a dyn LivePermission,
    pub welt: &'a dyn WorldQuery,
    pub einstellungen: &'a ChatSettings,
}

impl ChannelRouter<'_> {
    /// Bestimmt die Zustellung einer validierten Nachricht
    pub fn aufloesen(&self, nachricht: &ChatMessage, absender: &Sitzung) -> ChatResult<Zustellung> {
        let zustellung = match nachricht.channel {
            Channel::Local => Zustellung::NurAbsender,
            Channel::Global => Zustellung::Broadcast,
            // Frequenzen sind nicht modelliert – Funk geht an alle
            Channel::Radio => Zustellung::Broadcast,
            Channel::Faction => Zustellung::Empfaenger(self.gleiche_fraktion(absender)),
            Channel::Safehouse => Zustellung::Empfaenger(self.gleiches_safehouse(absender)),
            Channel::Private => {
                let ziel = nachricht.metadata.to.as_deref().unwrap_or_default();
                Zustellung::Empfaenger(self.privat(absender, ziel)?)
            }
            Channel::Staff => Zustellung::Empfaenger(self.live_berechtigte(AccessLevel::ist_staff)),
            Channel::Admin => Zustellung::Empfaenger(self.live_berechtigte(AccessLevel::ist_admin)),
        };
        Ok(zustellung)
    }

    /// Empfaenger eines Tipp-Indikators (immer ohne den Absender)
    pub fn typing_empfaenger(
        &self,
        channel: Channel,
        absender: &Sitzung,
        ziel: Option<&str>,
    ) -> ChatResult<Vec<String>> {
        let mut empfaenger = match channel {
            Channel::Local => self.in_der_naehe(absender)?,
            Channel::Global | Channel::Radio => self.alle(),
            Channel::Faction => self.gleiche_fraktion(absender),
            Channel::Safehouse => self.gleiches_safehouse(absender),
            Channel::Private => ziel
                .filter(|z| self.presence.ist_verbunden(z))
                .map(|z| vec![z.to_string()])
                .unwrap_or_default(),
            Channel::Staff => self.live_berechtigte(AccessLevel::ist_staff),
            Channel::Admin => self.live_berechtigte(AccessLevel::ist_admin),
        };
        empfaenger.retain(|u| *u != absender.username);
        Ok(empfaenger)
    }

    // -----------------------------------------------------------------------
    // Regeln
    // -----------------------------------------------------------------------

    fn alle(&self) -> Vec<String> {
        self.presence.alle().map(|s| s.username.clone()).collect()
    }

    fn gleiche_fraktion(&self, absender: &Sitzung) -> Vec<String> {
        self.gleiches_attribut(absender.fraktion.as_deref(), |s| s.fraktion.as_deref())
    }

    fn gleiches_safehouse(&self, absender: &Sitzung) -> Vec<String> {
        self.gleiches_attribut(absender.safehouse.as_deref(), |s| s.safehouse.as_deref())
    }

    /// Exakte Uebereinstimmung; ohne eigenes Attribut keine Empfaenger
    fn gleiches_attribut(
        &self,
        eigenes: Option<&str>,
        attribut: impl Fn(&Sitzung) -> Option<&str>,
    ) -> Vec<String> {
        let Some(eigenes) = eigenes else {
            return Vec::new();
        };
        self.presence
            .alle()
            .filter(|s| attribut(s) == Some(eigenes))
            .map(|s| s.username.clone())
            .collect()
    }

    /// Ziel plus Echo an den Absender
    fn privat(&self, absender: &Sitzung, ziel: &str) -> ChatResult<Vec<String>> {
        if !self.presence.ist_verbunden(ziel) {
            return Err(ChatError::ZielNichtGefunden(ziel.to_string()));
        }
        if ziel == absender.username {
            return Ok(vec![ziel.to_string()]);
        }
        Ok(vec![ziel.to_string(), absender.username.clone()])
    }

    /// Alle Sitzungen, deren Live-Rolle das Praedikat erfuellt
    ///
    /// O(n) Host-Abfragen pro Nachricht. Schlaegt die Abfrage fuer einen
    /// Empfaenger fehl, wird er ausgelassen.
    fn live_berechtigte(&self, praedikat: fn(AccessLevel) -> bool) -> Vec<String> {
        let mut empfaenger = Vec::new();
        for sitzung in self.presence.alle() {
            match self.rechte.zugriffsstufe(&sitzung.username) {
                Ok(stufe) if praedikat(stufe) => empfaenger.push(sitzung.username.clone()),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        username = %sitzung.username,
                        fehler = %e,
                        "Live-Rollenpruefung fehlgeschlagen – Empfaenger ausgelassen"
                    );
                }
            }
        }
        empfaenger
    }

    fn in_der_naehe(&self, absender: &Sitzung) -> ChatResult<Vec<String>> {
        let Some(eigene) = self.welt.position(&absender.username)? else {
            return Ok(Vec::new());
        };
        let radius = self.einstellungen.local_chat_range;

        let mut empfaenger = Vec::new();
        for sitzung in self.presence.alle() {
            if sitzung.username == absender.username {
                continue;
            }
            if let Some(pos) = self.welt.position(&sitzung.username)? {
                if in_reichweite(&eigene, &pos, radius) {
                    empfaenger.push(sitzung.username.clone());
                }
            }
        }
        Ok(empfaenger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MemoryHost, SpielerZustand};
    use chrono::Utc;
    use lagerfeuer_core::{MessageId, MessageMetadata};

    fn spieler(
        host: &MemoryHost,
        presence: &mut PresenceDirectory,
        name: &str,
        zustand: SpielerZustand,
    ) {
        host.spieler_setzen(name, zustand);
        presence.upsert(name, host, host, Utc::now()).unwrap();
    }

    fn router_fuer<'a>(
        host: &'a MemoryHost,
        presence: &'a PresenceDirectory,
        settings: &'a ChatSettings,
    ) -> ChannelRouter<'a> {
        ChannelRouter {
            presence,
            rechte: host,
            welt: host,
            einstellungen: settings,
        }
    }

    fn nachricht(channel: Channel, metadata: MessageMetadata) -> ChatMessage {
        ChatMessage {
            id: MessageId::new(),
            channel,
            author: "alice".into(),
            display_name: "alice".into(),
            text: "hallo".into(),
            timestamp: Utc::now(),
            metadata,
            color: channel.farbe(),
            message_type: Default::default(),
        }
    }

    fn aufbau() -> (MemoryHost, PresenceDirectory) {
        let host = MemoryHost::neu();
        let mut presence = PresenceDirectory::neu();
        spieler(&host, &mut presence, "alice", SpielerZustand {
            fraktion: Some("Ranger".into()),
            safehouse: Some("Muldraugh-1".into()),
            position: Some(Position::neu(0.0, 0.0, 0)),
            ..Default::default()
        });
        spieler(&host, &mut presence, "bob", SpielerZustand {
            fraktion: Some("Ranger".into()),
            position: Some(Position::neu(10.0, 10.0, 1)),
            ..Default::default()
        });
        spieler(&host, &mut presence, "carol", SpielerZustand {
            fraktion: Some("Banditen".into()),
            safehouse: Some("Muldraugh-1".into()),
            zugriffsstufe: AccessLevel::Admin,
            position: Some(Position::neu(100.0, 0.0, 0)),
            ..Default::default()
        });
        spieler(&host, &mut presence, "dave", SpielerZustand {
            zugriffsstufe: AccessLevel::Gm,
            position: Some(Position::neu(3.0, 4.0, 2)),
            ..Default::default()
        });
        (host, presence)
    }

    #[test]
    fn reichweite_planar_und_etage() {
        let a = Position::neu(0.0, 0.0, 0);
        assert!(in_reichweite(&a, &Position::neu(3.0, 4.0, 0), 5.0));
        assert!(!in_reichweite(&a, &Position::neu(3.0, 4.1, 0), 5.0));
        assert!(in_reichweite(&a, &Position::neu(3.0, 4.0, 1), 5.0));
        assert!(in_reichweite(&a, &Position::neu(3.0, 4.0, -1), 5.0));
        assert!(!in_reichweite(&a, &Position::neu(0.0, 0.0, 2), 5.0));
    }

    #[test]
    fn lokal_ist_nur_absender() {
        let (host, presence) = aufbau();
        let settings = ChatSettings::default();
        let router = router_fuer(&host, &presence, &settings);
        let alice = presence.sitzung("alice").unwrap();

        let z = router.aufloesen(&nachricht(Channel::Local, Default::default()), alice).unwrap();
        assert_eq!(z, Zustellung::NurAbsender);
    }

    #[test]
    fn global_und_radio_broadcast() {
        let (host, presence) = aufbau();
        let settings = ChatSettings::default();
        let router = router_fuer(&host, &presence, &settings);
        let alice = presence.sitzung("alice").unwrap();

        for kanal in [Channel::Global, Channel::Radio] {
            let z = router.aufloesen(&nachricht(kanal, Default::default()), alice).unwrap();
            assert_eq!(z, Zustellung::Broadcast);
        }
    }

    #[test]
    fn fraktion_nur_exakte_mitglieder() {
        let (host, presence) = aufbau();
        let settings = ChatSettings::default();
        let router = router_fuer(&host, &presence, &settings);
        let alice = presence.sitzung("alice").unwrap();

        let z = router.aufloesen(&nachricht(Channel::Faction, Default::default()), alice).unwrap();
        assert_eq!(z, Zustellung::Empfaenger(vec!["alice".into(), "bob".into()]));
    }

    #[test]
    fn safehouse_mitglieder() {
        let (host, presence) = aufbau();
        let settings = ChatSettings::default();
        let router = router_fuer(&host, &presence, &settings);
        let alice = presence.sitzung("alice").unwrap();

        let z = router
            .aufloesen(&nachricht(Channel::Safehouse, Default::default()), alice)
            .unwrap();
        assert_eq!(z, Zustellung::Empfaenger(vec!["alice".into(), "carol".into()]));
    }

    #[test]
    fn privat_ziel_und_echo() {
        let (host, presence) = aufbau();
        let settings = ChatSettings::default();
        let router = router_fuer(&host, &presence, &settings);
        let alice = presence.sitzung("alice").unwrap();

        let meta = MessageMetadata { to: Some("bob".into()), ..Default::default() };
        let z = router.aufloesen(&nachricht(Channel::Private, meta), alice).unwrap();
        assert_eq!(z, Zustellung::Empfaenger(vec!["bob".into(), "alice".into()]));
    }

    #[test]
    fn privat_ziel_offline() {
        let (host, presence) = aufbau();
        let settings = ChatSettings::default();
        let router = router_fuer(&host, &presence, &settings);
        let alice = presence.sitzung("alice").unwrap();

        let meta = MessageMetadata { to: Some("zoe".into()), ..Default::default() };
        let ergebnis = router.aufloesen(&nachricht(Channel::Private, meta), alice);
        assert!(matches!(ergebnis, Err(ChatError::ZielNichtGefunden(ref z)) if z == "zoe"));
    }

    #[test]
    fn admin_und_staff_nach_live_rolle() {
        let (host, presence) = aufbau();
        let settings = ChatSettings::default();
        let router = router_fuer(&host, &presence, &settings);
        let carol = presence.sitzung("carol").unwrap();

        let z = router.aufloesen(&nachricht(Channel::Admin, Default::default()), carol).unwrap();
        assert_eq!(z, Zustellung::Empfaenger(vec!["carol".into()]));

        let z = router.aufloesen(&nachricht(Channel::Staff, Default::default()), carol).unwrap();
        assert_eq!(z, Zustellung::Empfaenger(vec!["carol".into(), "dave".into()]));

        // Befoerderung wirkt sofort, ohne Auffrischung des Caches
        host.zugriffsstufe_setzen("bob", AccessLevel::Admin);
        let z = router.aufloesen(&nachricht(Channel::Admin, Default::default()), carol).unwrap();
        assert_eq!(z, Zustellung::Empfaenger(vec!["bob".into(), "carol".into()]));
    }

    #[test]
    fn typing_lokal_nach_reichweite() {
        let (host, presence) = aufbau();
        let settings = ChatSettings { local_chat_range: 20.0, ..Default::default() };
        let router = router_fuer(&host, &presence, &settings);
        let alice = presence.sitzung("alice").unwrap();

        // bob: Distanz ~14, eine Etage -> ja; carol: 100 -> nein; dave: zwei Etagen -> nein
        let empfaenger = router.typing_empfaenger(Channel::Local, alice, None).unwrap();
        assert_eq!(empfaenger, vec!["bob".to_string()]);
    }

    #[test]
    fn typing_ohne_absender() {
        let (host, presence) = aufbau();
        let settings = ChatSettings::default();
        let router = router_fuer(&host, &presence, &settings);
        let alice = presence.sitzung("alice").unwrap();

        let empfaenger = router.typing_empfaenger(Channel::Global, alice, None).unwrap();
        assert_eq!(empfaenger, vec!["bob".to_string(), "carol".into(), "dave".into()]);

        let empfaenger = router.typing_empfaenger(Channel::Private, alice, Some("dave")).unwrap();
        assert_eq!(empfaenger, vec!["dave".to_string()]);

        let empfaenger = router.typing_empfaenger(Channel::Private, alice, Some("zoe")).unwrap();
        assert!(empfaenger.is_empty());
    }
}
