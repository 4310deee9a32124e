//! Szenario-Tests fuer Tipp-Indikatoren

use lagerfeuer_core::{AccessLevel, Channel, Position, TypingAnfrage};

use super::{fraktion, Testumgebung};
use crate::host::SpielerZustand;
use crate::typing::TypingSchluessel;

fn anfrage(channel: Channel) -> TypingAnfrage {
    TypingAnfrage {
        channel,
        target: None,
    }
}

fn drei_spieler() -> Testumgebung {
    let mut env = Testumgebung::standard();
    env.verbinden("alice", fraktion("Ranger"));
    env.verbinden("bob", fraktion("Ranger"));
    env.verbinden("carol", fraktion("Banditen"));
    env.transport.leeren();
    env
}

#[test]
fn test_start_an_andere_ohne_absender() {
    let mut env = drei_spieler();
    env.engine.typing_start("alice", anfrage(Channel::Global));

    assert!(env.transport.typing_fuer("alice").is_empty());
    let bei_bob = env.transport.typing_fuer("bob");
    assert_eq!(bei_bob.len(), 1);
    assert!(bei_bob[0].is_typing);
    assert_eq!(bei_bob[0].username, "alice");
    assert_eq!(bei_bob[0].display_name, "alice");
    assert_eq!(env.transport.typing_fuer("carol").len(), 1);
}

#[test]
fn test_wiederholter_start_kein_doppelter_fanout() {
    let mut env = drei_spieler();
    env.engine.typing_start("alice", anfrage(Channel::Global));
    env.uhr.vorstellen_ms(1000);
    env.engine.typing_start("alice", anfrage(Channel::Global));
    env.uhr.vorstellen_ms(1000);
    env.engine.typing_start("alice", anfrage(Channel::Global));

    assert_eq!(env.transport.typing_fuer("bob").len(), 1);
}

#[test]
fn test_stop_verteilt_is_typing_false() {
    let mut env = drei_spieler();
    env.engine.typing_start("alice", anfrage(Channel::Faction));
    env.engine.typing_stop("alice", anfrage(Channel::Faction));
    // Zweiter Stop ohne Wirkung
    env.engine.typing_stop("alice", anfrage(Channel::Faction));

    let bei_bob = env.transport.typing_fuer("bob");
    assert_eq!(bei_bob.len(), 2);
    assert!(bei_bob[0].is_typing);
    assert!(!bei_bob[1].is_typing);
    assert!(env.transport.typing_fuer("carol").is_empty());
}

#[test]
fn test_ohne_stop_nach_timeout_entfernt() {
    let mut env = drei_spieler();
    let schluessel = TypingSchluessel::neu(Channel::Global, None);
    env.engine.typing_start("alice", anfrage(Channel::Global));

    env.uhr.vorstellen_ms(4900);
    assert_eq!(env.engine.tick_typing(), 0);
    assert_eq!(env.engine.typing().tippende(&schluessel), vec!["alice".to_string()]);

    env.uhr.vorstellen_ms(200);
    assert_eq!(env.engine.tick_typing(), 1);
    assert!(env.engine.typing().tippende(&schluessel).is_empty());

    let bei_bob = env.transport.typing_fuer("bob");
    assert_eq!(bei_bob.len(), 2);
    assert!(!bei_bob[1].is_typing);
}

#[test]
fn test_erneuter_start_verlaengert() {
    let mut env = drei_spieler();
    env.engine.typing_start("alice", anfrage(Channel::Global));
    env.uhr.vorstellen_ms(3000);
    env.engine.typing_start("alice", anfrage(Channel::Global));

    env.uhr.vorstellen_ms(2100);
    assert_eq!(env.engine.tick_typing(), 0);
    env.uhr.vorstellen_ms(3000);
    assert_eq!(env.engine.tick_typing(), 1);
}

#[test]
fn test_trennen_stoppt_tippen() {
    let mut env = drei_spieler();
    env.engine.typing_start("alice", anfrage(Channel::Global));
    env.trennen("alice");

    let bei_bob = env.transport.typing_fuer("bob");
    assert_eq!(bei_bob.len(), 2);
    assert!(!bei_bob[1].is_typing);
    assert_eq!(env.engine.typing().anzahl(), 0);
}

#[test]
fn test_tod_stoppt_tippen() {
    let mut env = drei_spieler();
    env.engine.typing_start("alice", anfrage(Channel::Faction));
    env.engine.gestorben("alice");

    let bei_bob = env.transport.typing_fuer("bob");
    assert_eq!(bei_bob.len(), 2);
    assert!(!bei_bob[1].is_typing);
    assert!(env.engine.presence().ist_verbunden("alice"));
}

#[test]
fn test_unbekannte_sitzung_ignoriert() {
    let mut env = drei_spieler();
    env.engine.typing_start("zoe", anfrage(Channel::Global));

    assert_eq!(env.engine.typing().anzahl(), 0);
    assert!(env.transport.typing_fuer("bob").is_empty());
}

#[test]
fn test_privat_nur_an_ziel() {
    let mut env = drei_spieler();
    env.engine.typing_start(
        "alice",
        TypingAnfrage {
            channel: Channel::Private,
            target: Some("bob".into()),
        },
    );

    let bei_bob = env.transport.typing_fuer("bob");
    assert_eq!(bei_bob.len(), 1);
    assert_eq!(bei_bob[0].target.as_deref(), Some("bob"));
    assert!(env.transport.typing_fuer("carol").is_empty());
}

#[test]
fn test_admin_tippen_ohne_berechtigung_ignoriert() {
    let mut env = drei_spieler();
    env.verbinden("root", SpielerZustand {
        zugriffsstufe: AccessLevel::Admin,
        ..Default::default()
    });
    env.transport.leeren();

    env.engine.typing_start("alice", anfrage(Channel::Admin));
    assert!(env.transport.typing_fuer("root").is_empty());

    env.verbinden("root2", SpielerZustand {
        zugriffsstufe: AccessLevel::Admin,
        ..Default::default()
    });
    env.transport.leeren();
    env.engine.typing_start("root", anfrage(Channel::Admin));
    assert_eq!(env.transport.typing_fuer("root2").len(), 1);
    assert!(env.transport.typing_fuer("alice").is_empty());
}

#[test]
fn test_lokal_nach_reichweite() {
    let mut env = Testumgebung::standard();
    let bei = |x: f64, etage: i32| SpielerZustand {
        position: Some(Position::neu(x, 0.0, etage)),
        ..Default::default()
    };
    env.verbinden("alice", bei(0.0, 0));
    env.verbinden("nah", bei(15.0, 1));
    env.verbinden("fern", bei(25.0, 0));
    env.verbinden("keller", bei(5.0, -2));
    env.transport.leeren();

    env.engine.typing_start("alice", anfrage(Channel::Local));

    assert_eq!(env.transport.typing_fuer("nah").len(), 1);
    assert!(env.transport.typing_fuer("fern").is_empty());
    assert!(env.transport.typing_fuer("keller").is_empty());
}
