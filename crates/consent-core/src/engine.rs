//! Transaction handshake engine.
//!
//! A dispatcher task takes accepted connections from a bounded intake queue
//! and spawns one handler per connection. Each handler reads messages in
//! order and runs the two-phase state machine:
//!
//! 1. `PreTransactionRequest`: validate, then register an [`Entry`].
//! 2. `TransactionRequest`: look up the entry, verify the query signature,
//!    parse the query, ask the [`AuthorizationPlugin`], and on acceptance
//!    forward the query to the [`DataService`].
//!
//! Every request gets exactly one reply on the same connection with source
//! and destination swapped. Replies never carry internal error detail.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use consent_crypto::Verifier;
use consent_proto::{Message, PreTransactionReply, PreTransactionRequest, Topic, TransactionReply, TransactionRequest};
use consent_transport::{Connection, TransportError};

use crate::data_service::{DataService, DataServiceRequest};
use crate::errors::{EngineError, RejectReason};
use crate::plugins::{AuthorizationPlugin, PermissionNotificationRequest, Validators};
use crate::query::parse_query;
use crate::queue::TransactionQueue;
use crate::types::{short_id, Entry};

/// Default capacity of the connection intake queue.
pub const DEFAULT_INTAKE_CAPACITY: usize = 16;

/// Default bound on one authorization call. Slightly above the
/// notification authorizer's own polling window.
pub const DEFAULT_AUTHORIZATION_TIMEOUT: Duration = Duration::from_secs(125);

pub type BoxedConnection = Box<dyn Connection>;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub intake_capacity: usize,
    pub authorization_timeout: Duration,
    /// When set, a transaction ID answers exactly one verified transaction
    /// request.
    pub single_use_transactions: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            intake_capacity: DEFAULT_INTAKE_CAPACITY,
            authorization_timeout: DEFAULT_AUTHORIZATION_TIMEOUT,
            single_use_transactions: true,
        }
    }
}

/// Counters for engine activity.
#[derive(Debug, Default)]
pub struct EngineStats {
    pub connections: AtomicU64,
    pub messages: AtomicU64,
    pub malformed_messages: AtomicU64,
    pub ignored_messages: AtomicU64,
    pub pre_transactions_accepted: AtomicU64,
    pub pre_transactions_rejected: AtomicU64,
    pub transactions_completed: AtomicU64,
    pub transactions_rejected: AtomicU64,
}

impl EngineStats {
    pub fn snapshot(&self) -> EngineStatsSnapshot {
        EngineStatsSnapshot {
            connections: self.connections.load(Ordering::Relaxed),
            messages: self.messages.load(Ordering::Relaxed),
            malformed_messages: self.malformed_messages.load(Ordering::Relaxed),
            ignored_messages: self.ignored_messages.load(Ordering::Relaxed),
            pre_transactions_accepted: self.pre_transactions_accepted.load(Ordering::Relaxed),
            pre_transactions_rejected: self.pre_transactions_rejected.load(Ordering::Relaxed),
            transactions_completed: self.transactions_completed.load(Ordering::Relaxed),
            transactions_rejected: self.transactions_rejected.load(Ordering::Relaxed),
        }
    }

    fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStatsSnapshot {
    pub connections: u64,
    pub messages: u64,
    pub malformed_messages: u64,
    pub ignored_messages: u64,
    pub pre_transactions_accepted: u64,
    pub pre_transactions_rejected: u64,
    pub transactions_completed: u64,
    pub transactions_rejected: u64,
}

/// The configured engine, ready to [`spawn`](Engine::spawn).
pub struct Engine {
    shared: Arc<Shared>,
}

struct Shared {
    config: EngineConfig,
    queue: TransactionQueue,
    authorization: Arc<dyn AuthorizationPlugin>,
    validators: Validators,
    data_service: Arc<dyn DataService>,
    stats: EngineStats,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        authorization: Arc<dyn AuthorizationPlugin>,
        validators: Validators,
        data_service: Arc<dyn DataService>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                queue: TransactionQueue::new(),
                authorization,
                validators,
                data_service,
                stats: EngineStats::default(),
            }),
        }
    }

    /// Start the dispatcher on the current tokio runtime.
    pub fn spawn(self) -> EngineHandle {
        let capacity = self.shared.config.intake_capacity.max(1);
        let (intake_tx, intake_rx) = mpsc::channel(capacity);
        let (stop_tx, stop_rx) = oneshot::channel();
        let dispatcher = tokio::spawn(dispatch_loop(self.shared.clone(), intake_rx, stop_rx));
        info!(capacity, validators = self.shared.validators.len(), "engine started");

        EngineHandle {
            intake: intake_tx,
            stop: Some(stop_tx),
            dispatcher: Some(dispatcher),
            shared: self.shared,
        }
    }
}

/// Producer side of a running engine.
pub struct EngineHandle {
    intake: mpsc::Sender<BoxedConnection>,
    stop: Option<oneshot::Sender<()>>,
    dispatcher: Option<JoinHandle<()>>,
    shared: Arc<Shared>,
}

impl EngineHandle {
    /// Hand over a connection, waiting while the intake queue is full.
    pub async fn submit<C: Connection + 'static>(&self, conn: C) -> Result<(), EngineError> {
        self.intake
            .send(Box::new(conn))
            .await
            .map_err(|_| EngineError::Stopped)
    }

    /// Hand over a connection, failing with [`EngineError::Busy`] when the
    /// intake queue is full.
    pub fn try_submit<C: Connection + 'static>(&self, conn: C) -> Result<(), EngineError> {
        self.intake.try_send(Box::new(conn)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EngineError::Busy,
            mpsc::error::TrySendError::Closed(_) => EngineError::Stopped,
        })
    }

    pub fn queue(&self) -> &TransactionQueue {
        &self.shared.queue
    }

    pub fn stats(&self) -> EngineStatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Stop the dispatcher. Handlers already running finish on their own.
    /// Later submissions fail with [`EngineError::Stopped`].
    pub async fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(dispatcher) = self.dispatcher.take() {
            if let Err(e) = dispatcher.await {
                warn!("dispatcher task failed: {}", e);
            }
            info!("engine stopped");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.intake.is_closed()
    }
}

async fn dispatch_loop(
    shared: Arc<Shared>,
    mut intake: mpsc::Receiver<BoxedConnection>,
    mut stop: oneshot::Receiver<()>,
) {
    debug!("dispatcher loop started");
    loop {
        tokio::select! {
            biased;
            _ = &mut stop => break,
            conn = intake.recv() => match conn {
                Some(conn) => {
                    EngineStats::inc(&shared.stats.connections);
                    tokio::spawn(handle_connection(shared.clone(), conn));
                }
                None => break,
            },
        }
    }
    debug!("dispatcher loop finished");
}

async fn handle_connection<C: Connection>(shared: Arc<Shared>, mut conn: C) {
    let peer = conn.peer();
    debug!(%peer, "handling connection");

    loop {
        let message = match conn.read().await {
            Ok(message) => message,
            Err(TransportError::Codec(e)) => {
                warn!(%peer, "dropping undecodable message: {}", e);
                EngineStats::inc(&shared.stats.malformed_messages);
                continue;
            }
            Err(e) if e.is_disconnect() => {
                debug!(%peer, "connection closed by peer");
                break;
            }
            Err(e) => {
                warn!(%peer, "read failed: {}", e);
                break;
            }
        };

        EngineStats::inc(&shared.stats.messages);
        if let Some(reply) = shared.handle_message(&message).await {
            if let Err(e) = conn.write(&reply).await {
                warn!(%peer, "writing reply failed: {}", e);
                break;
            }
        }
    }

    if let Err(e) = conn.close().await {
        warn!(%peer, "closing connection failed: {}", e);
    }
}

impl Shared {
    /// The reply to `message`, if it needs one.
    async fn handle_message(&self, message: &Message) -> Option<Message> {
        match message.topic() {
            Some(Topic::PreTransactionRequest) => {
                let reply = self.handle_pre_transaction(message).await;
                Some(message.reply(&reply))
            }
            Some(Topic::TransactionRequest) => {
                let reply = self.handle_transaction(message).await;
                Some(message.reply(&reply))
            }
            Some(topic) => {
                debug!(%topic, "ignoring reply topic on responder");
                EngineStats::inc(&self.stats.ignored_messages);
                None
            }
            None => {
                warn!(topic = %message.header.topic.to_hex(), "ignoring unknown topic");
                EngineStats::inc(&self.stats.ignored_messages);
                None
            }
        }
    }

    async fn handle_pre_transaction(&self, message: &Message) -> PreTransactionReply {
        let request: PreTransactionRequest = match message.decode_payload() {
            Ok(request) => request,
            Err(e) => {
                warn!("pre-transaction request: invalid payload: {}", e);
                return self.pre_transaction_reply(false);
            }
        };
        let id = short_id(&request.transaction_id);

        if !self.validators.validate_pre_transaction(&request) {
            warn!(transaction = %id, "pre-transaction request failed validation");
            return self.pre_transaction_reply(false);
        }

        if let Err(e) = self.queue.add(Entry::from(&request)).await {
            warn!(transaction = %id, "adding transaction failed: {}", e);
            return self.pre_transaction_reply(false);
        }

        info!(transaction = %id, "transaction registered");
        self.pre_transaction_reply(true)
    }

    fn pre_transaction_reply(&self, success: bool) -> PreTransactionReply {
        if success {
            EngineStats::inc(&self.stats.pre_transactions_accepted);
        } else {
            EngineStats::inc(&self.stats.pre_transactions_rejected);
        }
        PreTransactionReply { success }
    }

    async fn handle_transaction(&self, message: &Message) -> TransactionReply {
        let request: TransactionRequest = match message.decode_payload() {
            Ok(request) => request,
            Err(e) => {
                warn!("transaction request: invalid payload: {}", e);
                return self.reject(RejectReason::DecodeFailed);
            }
        };
        let id = short_id(&request.transaction_id);

        let Some(entry) = self.queue.get(&request.transaction_id).await else {
            warn!(transaction = %id, "transaction is not in queue");
            return self.reject(RejectReason::UnknownTransaction);
        };

        if !verify_query_signature(&entry, &request) {
            warn!(transaction = %id, "query signature verification failed");
            return self.reject(RejectReason::SignatureInvalid);
        }

        let collections = match parse_query(&request.query) {
            Ok(collections) => collections,
            Err(e) => {
                warn!(transaction = %id, "query parsing failed: {}", e);
                return self.reject(RejectReason::QueryParseFailed);
            }
        };

        let entry = if self.config.single_use_transactions {
            match self.queue.consume(&request.transaction_id).await {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(transaction = %id, "transaction already used: {}", e);
                    return self.reject(RejectReason::UnknownTransaction);
                }
            }
        } else {
            entry
        };

        let notification =
            PermissionNotificationRequest::build(&entry, &request, collections, chrono::Utc::now());

        info!(transaction = %id, "calling authorization plugin");
        let decision = tokio::time::timeout(
            self.config.authorization_timeout,
            self.authorization.authorize(&notification),
        )
        .await;
        match decision {
            Ok(Ok(reply)) if reply.accepted => {}
            Ok(Ok(_)) => {
                warn!(transaction = %id, "transaction was not authorized");
                return self.reject(RejectReason::NotAuthorized);
            }
            Ok(Err(e)) => {
                warn!(transaction = %id, "authorization failed: {}", e);
                return self.reject(RejectReason::NotAuthorized);
            }
            Err(_) => {
                warn!(transaction = %id, timeout = ?self.config.authorization_timeout, "authorization timed out");
                return self.reject(RejectReason::NotAuthorized);
            }
        }

        let data_request = DataServiceRequest {
            query: request.query.clone(),
            title: request.title.clone(),
            description: request.description.clone(),
            transaction_id: entry.transaction_id.to_hex(),
            signature: request.signature.clone(),
            requester: entry.requester_public_key.to_hex(),
            requester_name: entry.requester_name.clone(),
        };
        match self.data_service.execute(&data_request).await {
            Ok(content) => {
                info!(transaction = %id, "transaction committed");
                EngineStats::inc(&self.stats.transactions_completed);
                TransactionReply::Content(content)
            }
            Err(e) => {
                warn!(transaction = %id, "data service failed: {}", e);
                self.reject(RejectReason::CommitmentFailed)
            }
        }
    }

    fn reject(&self, reason: RejectReason) -> TransactionReply {
        EngineStats::inc(&self.stats.transactions_rejected);
        TransactionReply::error(reason.as_str())
    }
}

/// The signature field must be hex of `signature || query`, signed by the
/// key registered in the pre-transaction phase.
fn verify_query_signature(entry: &Entry, request: &TransactionRequest) -> bool {
    let Ok(signed) = hex::decode(&request.signature) else {
        return false;
    };
    let Ok(verifier) = Verifier::from_public_key(&entry.signature_public_key) else {
        return false;
    };
    match verifier.verify(&signed) {
        Ok(message) => message == request.query.as_bytes(),
        Err(_) => false,
    }
}
