//! lagerfeuer-server – Bibliotheks-Root
//!
//! Deklariert alle Server-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Integrationstests bereit.

pub mod broadcast;
pub mod config;
pub mod connection;
pub mod engine_task;
pub mod error;
pub mod logging;
pub mod tcp;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use lagerfeuer_chat::{ChatEngine, HostPorts, MemoryHost, SystemClock};
use tokio::sync::watch;

use broadcast::EventBroadcaster;
use config::ServerConfig;
use connection::VerbindungsEinstellungen;
use engine_task::EngineTask;
use tcp::ChatServer;

/// Haelt den Server-Zustand vor dem Start zusammen
pub struct Server {
    pub config: ServerConfig,
    host: Arc<MemoryHost>,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    ///
    /// Der In-Memory-Host wird aus `[welt]` vorbelegt.
    pub fn neu(config: ServerConfig) -> Self {
        let host = Arc::new(config.welt.host_aufbauen());
        Self { config, host }
    }

    /// Zugriff auf den Host, z.B. um Rollen zur Laufzeit zu aendern
    pub fn host(&self) -> Arc<MemoryHost> {
        Arc::clone(&self.host)
    }

    /// Bindet den Listener und baut Engine und Broadcaster auf
    pub async fn binden(self) -> Result<LaufenderServer> {
        let config = self.config;
        let broadcaster = EventBroadcaster::mit_queue_groesse(config.netzwerk.send_queue_groesse);

        let engine = ChatEngine::neu(
            config.chat.clone(),
            HostPorts {
                rechte: self.host.clone(),
                welt: self.host.clone(),
                transport: Arc::new(broadcaster.clone()),
                uhr: Arc::new(SystemClock),
            },
        );
        let (engine_task, engine_tx) =
            EngineTask::neu(engine, broadcaster.clone(), config.intervalle.clone());

        let adresse = config.tcp_bind_adresse();
        let chat_server = ChatServer::binden(
            &adresse,
            broadcaster,
            engine_tx,
            VerbindungsEinstellungen {
                hello_timeout: Duration::from_secs(config.netzwerk.hello_timeout_sek),
                max_zeilen_laenge: config.netzwerk.max_zeilen_laenge,
                max_clients: config.server.max_clients as usize,
            },
        )
        .await
        .map_err(|e| anyhow::anyhow!("TCP-Listener '{adresse}' nicht bindbar: {e}"))?;

        tracing::info!(
            server_name = %config.server.name,
            adresse = %chat_server.lokale_adresse()?,
            slow_mode = config.chat.chat_slow_mode,
            kanaele = ?config.chat.kanaele.aktivierte(),
            spieler_vorbelegt = self.host.anzahl(),
            "Server gebunden"
        );

        Ok(LaufenderServer {
            chat_server,
            engine_task,
        })
    }

    /// Startet alle Subsysteme und laeuft bis Ctrl-C
    pub async fn starten(self) -> Result<()> {
        let laufend = self.binden().await?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Shutdown-Signal empfangen, Server wird beendet"),
                Err(e) => tracing::error!(fehler = %e, "Ctrl-C-Handler fehlgeschlagen"),
            }
            let _ = shutdown_tx.send(true);
        });

        laufend.laufen(shutdown_rx).await
    }
}

/// Gebundener Server, bereit zum Laufen
pub struct LaufenderServer {
    chat_server: ChatServer,
    engine_task: EngineTask,
}

impl LaufenderServer {
    pub fn lokale_adresse(&self) -> std::io::Result<SocketAddr> {
        self.chat_server.lokale_adresse()
    }

    /// Laeuft bis `shutdown_rx` ein `true`-Signal empfaengt
    pub async fn laufen(self, shutdown_rx: watch::Receiver<bool>) -> Result<()> {
        let engine = tokio::spawn(self.engine_task.ausfuehren(shutdown_rx.clone()));
        self.chat_server.starten(shutdown_rx).await?;
        engine.await?;
        tracing::info!("Server beendet");
        Ok(())
    }
}
