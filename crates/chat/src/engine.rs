//! ChatEngine – Zustandsbesitzer und Einstiegspunkt aller Chat-Ereignisse
//!
//! Die Engine besitzt Presence-Verzeichnis, Slow-Mode- und Tipp-Zustand
//! als Felder und wird ausschliesslich ueber `&mut self` veraendert. Der
//! Server betreibt sie in genau einem Task, Verbindungs-Tasks leiten
//! ihre Ereignisse per Queue weiter.
//!
//! ## Fehlergrenze
//! Kein Fehler verlaesst die Engine:
//! - Ablehnungen und Routing-Luecken -> Systemmeldung im Kanal + Fehler-Ack
//! - Host-/interne Fehler -> Error-Log + generisches Fehler-Ack

use std::sync::Arc;

use chrono::{DateTime, Utc};
use lagerfeuer_core::{
    Ack, Channel, ChatMessage, ClientEvent, MessageId, MessageMetadata, NachrichtAnfrage,
    NachrichtenTyp, ServerEvent, SpielerListe, TypingAnfrage, TypingEreignis,
};

use crate::clock::Clock;
use crate::delivery::DeliveryEngine;
use crate::error::{Ablehnung, ChatError, ChatResult};
use crate::host::{CommandHook, LivePermission, Transport, WorldQuery};
use crate::presence::{AuffrischungsBericht, PresenceDirectory, Sitzung};
use crate::rate_limit::RateLimiter;
use crate::resolver::ChannelRouter;
use crate::settings::ChatSettings;
use crate::typing::{TypingSchluessel, TypingTracker};
use crate::validator::{MessageValidator, ValidierteNachricht};
use crate::yell::lokalen_text_verarbeiten;

/// Praefix, ab dem ein Text an das Befehlssystem geht
pub const BEFEHL_PRAEFIX: char = '/';

/// Schnittstellen zur Umgebung der Engine
#[derive(Clone)]
pub struct HostPorts {
    pub rechte: Arc<dyn LivePermission>,
    pub welt: Arc<dyn WorldQuery>,
    pub transport: Arc<dyn Transport>,
    pub uhr: Arc<dyn Clock>,
}

pub struct ChatEngine {
    einstellungen: ChatSettings,
    presence: PresenceDirectory,
    limiter: RateLimiter,
    typing: TypingTracker,
    rechte: Arc<dyn LivePermission>,
    welt: Arc<dyn WorldQuery>,
    befehle: Option<Arc<dyn CommandHook>>,
    zustellung: DeliveryEngine,
    uhr: Arc<dyn Clock>,
}

impl ChatEngine {
    pub fn neu(einstellungen: ChatSettings, ports: HostPorts) -> Self {
        Self {
            limiter: RateLimiter::neu(einstellungen.chat_slow_mode),
            zustellung: DeliveryEngine::neu(ports.transport, &einstellungen),
            einstellungen,
            presence: PresenceDirectory::neu(),
            typing: TypingTracker::neu(),
            rechte: ports.rechte,
            welt: ports.welt,
            befehle: None,
            uhr: ports.uhr,
        }
    }

    /// Haengt das externe Befehlssystem an
    pub fn mit_befehlen(mut self, befehle: Arc<dyn CommandHook>) -> Self {
        self.befehle = Some(befehle);
        self
    }

    pub fn einstellungen(&self) -> &ChatSettings {
        &self.einstellungen
    }

    pub fn presence(&self) -> &PresenceDirectory {
        &self.presence
    }

    pub fn typing(&self) -> &TypingTracker {
        &self.typing
    }

    // -----------------------------------------------------------------------
    // Verbindungs-Lebenszyklus
    // -----------------------------------------------------------------------

    /// Spieler hat sich verbunden
    ///
    /// Legt die Sitzung an, sendet dem Spieler die Chat-Einstellungen und
    /// verteilt die neue Spielerliste an alle.
    pub fn verbunden(&mut self, username: &str) -> ChatResult<()> {
        let jetzt = self.uhr.jetzt();
        self.presence
            .upsert(username, self.welt.as_ref(), self.rechte.as_ref(), jetzt)?;

        tracing::info!(
            username = %username,
            online = self.presence.anzahl(),
            "Spieler verbunden"
        );

        self.zustellung.an_einen(
            username,
            &ServerEvent::ChatSettings(self.einstellungen.client_info()),
        );
        self.spielerliste_verteilen();
        Ok(())
    }

    /// Spieler hat die Verbindung getrennt
    ///
    /// Offene Tipp-Indikatoren werden gestoppt, solange die Sitzung noch
    /// fuer die Empfaenger-Aufloesung existiert.
    pub fn getrennt(&mut self, username: &str) {
        self.typing_aufraeumen(username);

        if self.presence.entfernen(username).is_none() {
            tracing::debug!(username = %username, "Trennen ohne Sitzung");
            return;
        }

        tracing::info!(
            username = %username,
            online = self.presence.anzahl(),
            "Spieler getrennt"
        );
        self.spielerliste_verteilen();
    }

    /// Spieler ist gestorben: Tipp-Zustand verwerfen, Attribute neu ableiten
    pub fn gestorben(&mut self, username: &str) {
        self.typing_aufraeumen(username);
        if let Err(e) = self.spieler_aktualisieren(username) {
            tracing::warn!(
                username = %username,
                fehler = %e,
                "Sitzung nach Tod nicht aktualisiert"
            );
        }
    }

    /// Host meldet geaenderte Spielattribute (Fraktion, Safehouse, Rolle)
    ///
    /// Fuer nicht verbundene Spieler ohne Wirkung.
    pub fn spieler_aktualisieren(&mut self, username: &str) -> ChatResult<()> {
        if !self.presence.ist_verbunden(username) {
            return Ok(());
        }
        let jetzt = self.uhr.jetzt();
        self.presence
            .upsert(username, self.welt.as_ref(), self.rechte.as_ref(), jetzt)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Nachrichten
    // -----------------------------------------------------------------------

    /// Verarbeitet eine Nachricht und liefert das Ack fuer den Absender
    pub fn nachricht_verarbeiten(&mut self, absender: &str, anfrage: NachrichtAnfrage) -> Ack {
        let kanal = anfrage.channel;
        match self.nachricht_intern(absender, anfrage) {
            Ok(ack) => ack,
            Err(e) => self.fehler_melden(absender, kanal, e),
        }
    }

    fn nachricht_intern(&mut self, absender: &str, anfrage: NachrichtAnfrage) -> ChatResult<Ack> {
        let jetzt = self.uhr.jetzt();

        if anfrage.text.starts_with(BEFEHL_PRAEFIX) {
            if let Some(befehle) = self.befehle.clone() {
                if !self.presence.ist_verbunden(absender) {
                    return Err(Ablehnung::NichtVerbunden.into());
                }
                tracing::debug!(
                    username = %absender,
                    befehl = %anfrage.text,
                    "Befehl weitergeleitet"
                );
                if let Some(antwort) = befehle.ausfuehren(absender, &anfrage.text)? {
                    self.zustellung
                        .systemnachricht(absender, anfrage.channel, antwort, jetzt);
                }
                return Ok(Ack::befehl());
            }
        }

        let validator = MessageValidator {
            einstellungen: &self.einstellungen,
            presence: &self.presence,
            rechte: self.rechte.as_ref(),
        };
        let validiert = validator.validieren(&mut self.limiter, absender, anfrage, jetzt)?;
        let nachricht = self.nachricht_bauen(&validiert, jetzt)?;

        let router = ChannelRouter {
            presence: &self.presence,
            rechte: self.rechte.as_ref(),
            welt: self.welt.as_ref(),
            einstellungen: &self.einstellungen,
        };
        let zustellung = router.aufloesen(&nachricht, &validiert.sitzung)?;

        tracing::info!(
            username = %absender,
            kanal = %nachricht.channel,
            message_id = %nachricht.id,
            "Nachricht angenommen"
        );
        Ok(self.zustellung.zustellen(nachricht, zustellung))
    }

    /// Baut die ausgehende Nachricht
    ///
    /// Metadaten werden serverseitig gesetzt. Vom Client uebernommen werden
    /// nur Ziel, Funkfrequenz und das Schrei-Flag.
    fn nachricht_bauen(
        &self,
        validiert: &ValidierteNachricht,
        jetzt: DateTime<Utc>,
    ) -> ChatResult<ChatMessage> {
        let ValidierteNachricht {
            sitzung,
            anfrage,
            zugriffsstufe,
        } = validiert;
        let kanal = anfrage.channel;
        let mut metadata = MessageMetadata::default();
        let mut text = anfrage.text.clone();

        match kanal {
            Channel::Local => {
                let lokal = lokalen_text_verarbeiten(&text, anfrage.metadata.is_yell);
                text = lokal.text;
                metadata.is_yell = lokal.is_yell;
            }
            Channel::Faction => metadata.faction_name = sitzung.fraktion.clone(),
            Channel::Safehouse => metadata.safehouse_name = sitzung.safehouse.clone(),
            Channel::Private => {
                let ziel = anfrage
                    .metadata
                    .target
                    .clone()
                    .or_else(|| anfrage.metadata.to.clone())
                    .ok_or(Ablehnung::KeinZiel)?;
                metadata.from = Some(sitzung.username.clone());
                metadata.target = Some(ziel.clone());
                metadata.to = Some(ziel);
            }
            Channel::Staff | Channel::Admin => metadata.role = *zugriffsstufe,
            Channel::Radio => metadata.frequency = anfrage.metadata.frequency,
            Channel::Global => {}
        }

        Ok(ChatMessage {
            id: MessageId::new(),
            channel: kanal,
            author: sitzung.username.clone(),
            display_name: self.anzeigename(sitzung),
            text,
            timestamp: jetzt,
            metadata,
            color: kanal.farbe(),
            message_type: NachrichtenTyp::Text,
        })
    }

    /// Wandelt einen Fehler in Systemmeldung und Ack um
    fn fehler_melden(&self, absender: &str, kanal: Channel, fehler: ChatError) -> Ack {
        let meldung = fehler.meldung();

        if fehler.ist_intern() {
            tracing::error!(
                username = %absender,
                kanal = %kanal,
                fehler = %fehler,
                "Fehler bei der Nachrichtenverarbeitung"
            );
            return Ack::fehler(meldung);
        }

        tracing::debug!(
            username = %absender,
            kanal = %kanal,
            grund = %fehler,
            "Nachricht abgelehnt"
        );
        self.zustellung
            .systemnachricht(absender, kanal, meldung.clone(), self.uhr.jetzt());

        match fehler {
            ChatError::Validierung(Ablehnung::SlowMode { verbleibend_sek }) => {
                Ack::slow_mode(meldung, verbleibend_sek)
            }
            _ => Ack::fehler(meldung),
        }
    }

    fn anzeigename(&self, sitzung: &Sitzung) -> String {
        if self.einstellungen.roleplay_mode {
            sitzung.anzeigename.clone()
        } else {
            sitzung.username.clone()
        }
    }

    // -----------------------------------------------------------------------
    // Tipp-Indikatoren
    // -----------------------------------------------------------------------

    /// `typingStart` eines Spielers
    ///
    /// Ereignisse ohne Sitzung, fuer deaktivierte Kanaele oder fuer
    /// STAFF/ADMIN ohne Live-Berechtigung werden ignoriert.
    pub fn typing_start(&mut self, username: &str, anfrage: TypingAnfrage) {
        match self.typing_darf(username, anfrage.channel) {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => {
                tracing::warn!(username = %username, fehler = %e, "typingStart verworfen");
                return;
            }
        }

        let schluessel = TypingSchluessel::neu(anfrage.channel, anfrage.target.as_deref());
        if self.typing.starten(schluessel.clone(), username, self.uhr.jetzt()) {
            self.typing_verteilen(username, &schluessel, true);
        }
    }

    /// `typingStop` eines Spielers
    pub fn typing_stop(&mut self, username: &str, anfrage: TypingAnfrage) {
        let schluessel = TypingSchluessel::neu(anfrage.channel, anfrage.target.as_deref());
        if self.typing.stoppen(&schluessel, username) {
            self.typing_verteilen(username, &schluessel, false);
        }
    }

    fn typing_darf(&self, username: &str, kanal: Channel) -> ChatResult<bool> {
        if !self.presence.ist_verbunden(username) || !self.einstellungen.ist_aktiviert(kanal) {
            return Ok(false);
        }
        let erlaubt = match kanal {
            Channel::Admin => self.rechte.zugriffsstufe(username)?.ist_admin(),
            Channel::Staff => self.rechte.zugriffsstufe(username)?.ist_staff(),
            _ => true,
        };
        Ok(erlaubt)
    }

    /// Stoppt alle Tipp-Indikatoren eines Spielers mit Fan-out
    fn typing_aufraeumen(&mut self, username: &str) {
        for schluessel in self.typing.benutzer_entfernen(username) {
            self.typing_verteilen(username, &schluessel, false);
        }
    }

    /// Fan-out eines Tipp-Indikators
    ///
    /// Ohne Sitzung (Spieler bereits entfernt) geht ein Stop an alle
    /// anderen Verbindungen.
    fn typing_verteilen(
        &self,
        username: &str,
        schluessel: &TypingSchluessel,
        is_typing: bool,
    ) -> usize {
        let sitzung = self.presence.sitzung(username);
        let ereignis = TypingEreignis {
            username: username.to_string(),
            channel: schluessel.channel,
            is_typing,
            target: schluessel.ziel.clone(),
            display_name: sitzung
                .map(|s| self.anzeigename(s))
                .unwrap_or_else(|| username.to_string()),
        };

        let Some(sitzung) = sitzung else {
            return self
                .zustellung
                .an_alle(&ServerEvent::Typing(ereignis), Some(username));
        };

        let router = ChannelRouter {
            presence: &self.presence,
            rechte: self.rechte.as_ref(),
            welt: self.welt.as_ref(),
            einstellungen: &self.einstellungen,
        };
        match router.typing_empfaenger(schluessel.channel, sitzung, schluessel.ziel.as_deref()) {
            Ok(empfaenger) => self.zustellung.typing_senden(&empfaenger, ereignis),
            Err(e) => {
                tracing::warn!(
                    username = %username,
                    kanal = %schluessel.channel,
                    fehler = %e,
                    "Tipp-Empfaenger nicht aufloesbar"
                );
                0
            }
        }
    }

    // -----------------------------------------------------------------------
    // Spielerliste und Dispatch
    // -----------------------------------------------------------------------

    /// Antwort auf `getPlayers`
    pub fn spieler_abfragen(&self, username: &str) -> SpielerListe {
        tracing::debug!(username = %username, "Spielerliste angefragt");
        self.presence.spielerliste()
    }

    fn spielerliste_verteilen(&self) {
        let gesendet = self
            .zustellung
            .an_alle(&ServerEvent::PlayerList(self.presence.spielerliste()), None);
        tracing::debug!(gesendet, "Spielerliste verteilt");
    }

    /// Verarbeitet ein dekodiertes Client-Ereignis
    ///
    /// Gibt die direkte Antwort an den Absender zurueck (Ack bzw.
    /// Spielerliste), falls es eine gibt.
    pub fn ereignis_verarbeiten(
        &mut self,
        absender: &str,
        event: ClientEvent,
    ) -> Option<ServerEvent> {
        match event {
            ClientEvent::Hello(_) => {
                tracing::debug!(username = %absender, "Doppeltes hello ignoriert");
                None
            }
            ClientEvent::Message(anfrage) => {
                Some(ServerEvent::Ack(self.nachricht_verarbeiten(absender, anfrage)))
            }
            ClientEvent::TypingStart(anfrage) => {
                self.typing_start(absender, anfrage);
                None
            }
            ClientEvent::TypingStop(anfrage) => {
                self.typing_stop(absender, anfrage);
                None
            }
            ClientEvent::GetPlayers => {
                Some(ServerEvent::PlayerList(self.spieler_abfragen(absender)))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Periodische Aufgaben
    // -----------------------------------------------------------------------

    /// Entfernt abgelaufene Tipp-Indikatoren und sendet synthetische Stops
    pub fn tick_typing(&mut self) -> usize {
        let abgelaufen = self.typing.abgelaufene_entfernen(self.uhr.jetzt());
        for (schluessel, username) in &abgelaufen {
            tracing::debug!(
                username = %username,
                kanal = %schluessel.channel,
                "Tipp-Indikator abgelaufen"
            );
            self.typing_verteilen(username, schluessel, false);
        }
        abgelaufen.len()
    }

    /// Frischt alle Sitzungen auf und raeumt den Slow-Mode-Zustand auf
    pub fn tick_presence(&mut self) -> AuffrischungsBericht {
        let jetzt = self.uhr.jetzt();
        let bericht = self
            .presence
            .alle_aktualisieren(self.welt.as_ref(), self.rechte.as_ref(), jetzt);
        let entfernt = self.limiter.aufraeumen(jetzt);

        tracing::debug!(
            geprueft = bericht.geprueft,
            geaendert = bericht.geaendert,
            fehlgeschlagen = bericht.fehlgeschlagen,
            slow_mode_entfernt = entfernt,
            "Presence aufgefrischt"
        );
        if bericht.geaendert > 0 {
            self.spielerliste_verteilen();
        }
        bericht
    }
}
