//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.
//!
//! ```toml
//! [server]
//! name = "Lagerfeuer"
//!
//! [netzwerk]
//! tcp_port = 7777
//!
//! [chat]
//! max_message_length = 200
//! chat_slow_mode = 5
//!
//! [chat.kanaele]
//! radio = false
//!
//! [[welt.spieler]]
//! username = "admin"
//! zugriffsstufe = "admin"
//! ```

use lagerfeuer_chat::{ChatSettings, MemoryHost, SpielerZustand};
use lagerfeuer_core::{AccessLevel, Position};
use serde::{Deserialize, Serialize};

use crate::logging::{logging_pruefen, LoggingFehler};

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Chat-Einstellungen inkl. `[chat.kanaele]`
    pub chat: ChatSettings,
    /// Takt der periodischen Engine-Aufgaben
    pub intervalle: IntervallEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
    /// Vorbelegter Spielzustand fuer den In-Memory-Host
    pub welt: WeltEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers
    pub name: String,
    /// Maximale Anzahl gleichzeitiger Clients
    pub max_clients: u32,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Lagerfeuer".into(),
            max_clients: 256,
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer den TCP-Listener
    pub bind_adresse: String,
    /// Port fuer den TCP-Listener
    pub tcp_port: u16,
    /// Zeit bis zum `hello`-Handshake, danach wird getrennt
    pub hello_timeout_sek: u64,
    /// Maximale Laenge einer JSON-Zeile in Bytes
    pub max_zeilen_laenge: usize,
    /// Groesse der Send-Queue pro Verbindung
    pub send_queue_groesse: usize,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            tcp_port: 7777,
            hello_timeout_sek: 10,
            max_zeilen_laenge: 8 * 1024,
            send_queue_groesse: 64,
        }
    }
}

/// Takt der periodischen Engine-Aufgaben
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervallEinstellungen {
    /// Auffrischung der Presence-Attribute (Sicherheitsnetz zu Host-Ereignissen)
    pub presence_refresh_sek: u64,
    /// Sweep abgelaufener Tipp-Indikatoren
    pub typing_sweep_ms: u64,
}

impl Default for IntervallEinstellungen {
    fn default() -> Self {
        Self {
            presence_refresh_sek: 30,
            typing_sweep_ms: 1000,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Vorbelegter Spielzustand
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeltEinstellungen {
    pub spieler: Vec<WeltSpieler>,
}

/// Ein Spieler im vorbelegten Spielzustand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeltSpieler {
    pub username: String,
    #[serde(default)]
    pub zugriffsstufe: AccessLevel,
    #[serde(default)]
    pub fraktion: Option<String>,
    #[serde(default)]
    pub safehouse: Option<String>,
    #[serde(default)]
    pub anzeigename: Option<String>,
    #[serde(default)]
    pub position: Option<Position>,
}

impl WeltEinstellungen {
    /// Baut den In-Memory-Host aus den vorbelegten Spielern
    pub fn host_aufbauen(&self) -> MemoryHost {
        let host = MemoryHost::neu();
        for spieler in &self.spieler {
            host.spieler_setzen(
                spieler.username.clone(),
                SpielerZustand {
                    zugriffsstufe: spieler.zugriffsstufe,
                    fraktion: spieler.fraktion.clone(),
                    safehouse: spieler.safehouse.clone(),
                    position: spieler.position,
                    anzeigename: spieler.anzeigename.clone(),
                },
            );
        }
        host
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                config.pruefen().map_err(|e| anyhow::anyhow!("[logging] in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Prueft Werte, die TOML allein nicht validieren kann
    pub fn pruefen(&self) -> Result<(), LoggingFehler> {
        logging_pruefen(&self.logging.level, &self.logging.format)
    }

    /// Gibt die vollstaendige Bind-Adresse fuer TCP zurueck
    pub fn tcp_bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.tcp_port)
    }
}
