//! Responder and requester talking over TCP.

use std::sync::Arc;
use std::time::Duration;

use consent_core::data_service::StaticDataService;
use consent_core::harness::{spawn_engine, AlwaysAccept};
use consent_core::key_store::{FileKeyStore, KeyStore};
use consent_core::{EngineConfig, EngineError, TransactionDetails};
use consent_crypto::Key32;
use consent_node::request::{self, RequestPlan};
use consent_node::respond::{accept_connections, serve, start_engine};
use consent_node::NodeConfig;
use consent_transport::MemoryConnection;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

async fn start_responder() -> (String, oneshot::Sender<()>, tokio::task::JoinHandle<anyhow::Result<()>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let engine = start_engine(&NodeConfig::default()).unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(serve(listener, engine, async {
        let _ = stop_rx.await;
    }));
    (addr, stop_tx, server)
}

fn plan(addr: String, key_file: std::path::PathBuf, query: &str) -> RequestPlan {
    RequestPlan {
        responder_addr: addr,
        responder_key: None,
        key_file,
        requester: "ACME Mortgages".into(),
        details: TransactionDetails::new(query).titled("Mortgage", "Identity check"),
    }
}

#[tokio::test]
async fn test_request_over_tcp() {
    let dir = tempfile::tempdir().unwrap();
    let key_file = dir.path().join("responder.json");
    FileKeyStore::new(&key_file).write(&Key32::random()).await.unwrap();

    let (addr, stop, server) = start_responder().await;

    let content = request::run(&plan(addr.clone(), key_file.clone(), "{ personalDetails { name } }"))
        .await
        .unwrap();
    assert!(content.contains("de Vries"));

    let err = request::run(&plan(addr, key_file, "subscription { a { b } }"))
        .await
        .unwrap_err();
    match err.downcast_ref::<EngineError>() {
        Some(EngineError::TransactionRejected(reason)) => assert_eq!(reason, "query parsing failed"),
        other => panic!("unexpected error: {:?}", other),
    }

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_missing_key_file() {
    let dir = tempfile::tempdir().unwrap();
    let plan = plan("127.0.0.1:1".into(), dir.path().join("absent.json"), "{ a { b } }");
    assert!(request::resolve_responder_key(&plan).await.is_err());
}

#[tokio::test]
async fn test_explicit_responder_key() {
    let dir = tempfile::tempdir().unwrap();
    let key = Key32::random();
    let mut plan = plan("127.0.0.1:1".into(), dir.path().join("absent.json"), "{ a { b } }");
    plan.responder_key = Some(key.to_hex());
    assert_eq!(request::resolve_responder_key(&plan).await.unwrap(), key);

    plan.responder_key = Some("xyz".into());
    assert!(request::resolve_responder_key(&plan).await.is_err());
}

#[tokio::test]
async fn test_shutdown_with_full_intake() {
    // The dispatcher is spawned on a runtime that never runs, so nothing
    // drains the intake queue.
    let idle = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let engine = {
        let _guard = idle.enter();
        let config = EngineConfig {
            intake_capacity: 1,
            ..Default::default()
        };
        spawn_engine(config, Arc::new(AlwaysAccept), Arc::new(StaticDataService::demo()))
    };
    let (_client, server) = MemoryConnection::pair();
    engine.try_submit(server).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let _waiting = TcpStream::connect(listener.local_addr().unwrap()).await.unwrap();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let accepting = tokio::spawn(async move {
        accept_connections(&listener, &engine, async {
            let _ = stop_rx.await;
        })
        .await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    stop_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), accepting)
        .await
        .expect("accept loop ignored shutdown")
        .unwrap();

    idle.shutdown_background();
}
