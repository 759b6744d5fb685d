//! Responder: accept TCP connections and feed them to the engine.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use consent_core::data_service::{DataService, HttpDataService, StaticDataService};
use consent_core::harness::AlwaysAccept;
use consent_core::key_store::{FileKeyStore, KeyStore};
use consent_core::notification::{HttpNotificationChannel, NotificationAuthorizer};
use consent_core::plugins::{AuthorizationPlugin, Validators};
use consent_core::{Engine, EngineHandle};
use consent_crypto::Keychain;
use consent_transport::StreamConnection;

use crate::config::{AuthorizerKind, NodeConfig};

fn authorization_plugin(config: &NodeConfig) -> anyhow::Result<Arc<dyn AuthorizationPlugin>> {
    match config.authorizer {
        AuthorizerKind::AlwaysAccept => {
            warn!("running with the always-accept authorizer");
            Ok(Arc::new(AlwaysAccept))
        }
        AuthorizerKind::Notification => {
            let url = config
                .notification_url
                .as_deref()
                .context("notification authorizer needs a notification URL")?;
            let channel = HttpNotificationChannel::new(url)?;
            let authorizer = NotificationAuthorizer::new(channel)
                .with_polling(config.poll_interval(), config.poll_attempts);
            Ok(Arc::new(authorizer))
        }
    }
}

fn data_service(config: &NodeConfig) -> anyhow::Result<Arc<dyn DataService>> {
    match &config.data_service_url {
        Some(url) => Ok(Arc::new(HttpDataService::new(url.as_str())?)),
        None => {
            warn!("no data service URL configured, serving demo data");
            Ok(Arc::new(StaticDataService::demo()))
        }
    }
}

/// Build and start an engine from `config`.
pub fn start_engine(config: &NodeConfig) -> anyhow::Result<EngineHandle> {
    let engine = Engine::new(
        config.engine_config(),
        authorization_plugin(config)?,
        Validators::standard(),
        data_service(config)?,
    );
    Ok(engine.spawn())
}

/// Hand accepted connections to `engine` until `shutdown` resolves or the
/// engine stops taking them. Shutdown is honored while waiting for room in a
/// full intake queue.
pub async fn accept_connections(
    listener: &TcpListener,
    engine: &EngineHandle,
    shutdown: impl Future<Output = ()>,
) {
    tokio::pin!(shutdown);
    loop {
        let (stream, addr) = tokio::select! {
            _ = &mut shutdown => return,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("accept failed: {}", e);
                    continue;
                }
            },
        };
        info!(%addr, "connection accepted");
        tokio::select! {
            _ = &mut shutdown => {
                warn!(%addr, "dropping connection, shutting down");
                return;
            }
            submitted = engine.submit(StreamConnection::tcp(stream)) => {
                if let Err(e) = submitted {
                    warn!(%addr, "engine refused connection: {}", e);
                    return;
                }
            }
        }
    }
}

/// Accept connections on `listener` until `shutdown` resolves, then stop
/// the engine.
pub async fn serve(
    listener: TcpListener,
    mut engine: EngineHandle,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    accept_connections(&listener, &engine, shutdown).await;
    engine.stop().await;
    Ok(())
}

/// Run a responder until Ctrl-C.
pub async fn run(config: &NodeConfig) -> anyhow::Result<()> {
    let keychain = Keychain::generate();
    let key_store = FileKeyStore::new(config.key_file());
    key_store
        .write(&keychain.main_public_key())
        .await
        .with_context(|| format!("writing public key to {}", key_store.path().display()))?;

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!(
        addr = %listener.local_addr()?,
        key = %keychain.main_public_key().to_hex(),
        key_file = %key_store.path().display(),
        "responder listening"
    );

    let engine = start_engine(config)?;
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("waiting for ctrl-c failed: {}", e);
        }
        info!("shutting down");
    };
    let served = serve(listener, engine, shutdown).await;

    key_store.clean().await?;
    served
}
