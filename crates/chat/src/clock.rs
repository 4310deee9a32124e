//! Zeitquelle der Engine
//!
//! Alle Zeitvergleiche (Slow-Mode, Typing-Timeout) laufen ueber `Clock`,
//! damit Tests die Zeit deterministisch vorstellen koennen.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

pub trait Clock: Send + Sync {
    fn jetzt(&self) -> DateTime<Utc>;
}

/// Systemuhr
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn jetzt(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manuell gesteuerte Uhr (Tests, Simulationen)
#[derive(Debug)]
pub struct ManualClock {
    zeit: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn neu(start: DateTime<Utc>) -> Self {
        Self {
            zeit: Mutex::new(start),
        }
    }

    pub fn vorstellen(&self, dauer: Duration) {
        let mut zeit = self.zeit.lock();
        *zeit = *zeit + dauer;
    }

    pub fn vorstellen_ms(&self, ms: i64) {
        self.vorstellen(Duration::milliseconds(ms));
    }
}

impl Clock for ManualClock {
    fn jetzt(&self) -> DateTime<Utc> {
        *self.zeit.lock()
    }
}
