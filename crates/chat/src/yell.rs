//! Schreien im Naehe-Chat
//!
//! Eine LOCAL-Nachricht gilt als geschrien, wenn
//! - sie mit `!` beginnt (das Zeichen wird entfernt),
//! - sie laenger als drei Zeichen ist und keine Kleinbuchstaben enthaelt,
//! - oder der Client `metadata.isYell` gesetzt hat.
//!
//! Geschriene Nachrichten werden serverseitig in Grossbuchstaben
//! umgewandelt und hervorgehoben, damit alle Beobachter denselben Text
//! sehen, unabhaengig vom Verhalten des Clients.

use lagerfeuer_core::{ChatMessage, SCHREI_FARBE};

/// Mindestlaenge (exklusiv) fuer die Grossbuchstaben-Erkennung
const GROSSSCHRIFT_MIN_LAENGE: usize = 3;

/// Ergebnis der LOCAL-Textverarbeitung
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LokalerText {
    pub text: String,
    pub is_yell: bool,
}

/// Erkennt Schreien und entfernt ein fuehrendes `!`
pub fn lokalen_text_verarbeiten(text: &str, client_yell: bool) -> LokalerText {
    let (rest, ausrufezeichen) = match text.strip_prefix('!') {
        Some(rest) => (rest.trim_start(), true),
        None => (text, false),
    };

    LokalerText {
        is_yell: client_yell || ausrufezeichen || ist_grossgeschrieben(rest),
        text: rest.to_string(),
    }
}

fn ist_grossgeschrieben(text: &str) -> bool {
    text.chars().count() > GROSSSCHRIFT_MIN_LAENGE
        && text.chars().any(char::is_alphabetic)
        && !text.chars().any(char::is_lowercase)
}

/// Wendet die Schrei-Transformation an (Grossbuchstaben + Hervorhebung)
pub fn schrei_anwenden(nachricht: &mut ChatMessage) {
    nachricht.text = nachricht.text.to_uppercase();
    nachricht.color = SCHREI_FARBE;
    nachricht.metadata.is_yell = true;
}
