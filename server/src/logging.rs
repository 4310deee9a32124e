//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable (hat Vorrang vor `[logging]`):
//! - `LF_LOG_LEVEL`: Log-Level oder vollstaendige Filter-Direktive, Standard: info
//! - `LF_LOG_FORMAT`: Format (text/json), Standard: text
//!
//! Ungueltige Werte werden abgelehnt statt stillschweigend ersetzt.

use thiserror::Error;
use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG_LEVEL: &str = "LF_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "LF_LOG_FORMAT";

/// Fehler in den Logging-Einstellungen
#[derive(Debug, Error)]
pub enum LoggingFehler {
    #[error("Ungueltige Log-Direktive '{direktive}': {grund}")]
    Direktive { direktive: String, grund: String },

    #[error("Unbekanntes Log-Format '{0}' (erlaubt: text, json)")]
    Format(String),
}

/// Ausgabeformat der Logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Gross-/Kleinschreibung und umgebende Leerzeichen werden ignoriert
    pub fn parsen(format: &str) -> Result<Self, LoggingFehler> {
        match format.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(LoggingFehler::Format(format.to_string())),
        }
    }
}

fn filter_bauen(direktive: &str) -> Result<EnvFilter, LoggingFehler> {
    EnvFilter::try_new(direktive).map_err(|e| LoggingFehler::Direktive {
        direktive: direktive.to_string(),
        grund: e.to_string(),
    })
}

/// Prueft `[logging]` beim Laden der Konfiguration
pub fn logging_pruefen(level: &str, format: &str) -> Result<(), LoggingFehler> {
    filter_bauen(level)?;
    LogFormat::parsen(format)?;
    Ok(())
}

/// Initialisiert das Logging-System.
///
/// Liest `LF_LOG_LEVEL` und `LF_LOG_FORMAT` aus der Umgebung und faellt
/// auf die Werte aus der Konfiguration zurueck.
pub fn logging_initialisieren(level: &str, format: &str) -> Result<(), LoggingFehler> {
    let level = wert_mit_vorrang(std::env::var(ENV_LOG_LEVEL).ok(), level);
    let format = wert_mit_vorrang(std::env::var(ENV_LOG_FORMAT).ok(), format);

    let filter = filter_bauen(&level)?;

    match LogFormat::parsen(&format)? {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .with_current_span(true)
                .init();
        }
        LogFormat::Text => {
            fmt()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
    Ok(())
}

/// Umgebungswert vor Konfigurationswert; leere Umgebungswerte zaehlen nicht
pub fn wert_mit_vorrang(umgebung: Option<String>, konfiguration: &str) -> String {
    umgebung
        .filter(|w| !w.trim().is_empty())
        .unwrap_or_else(|| konfiguration.to_string())
}
