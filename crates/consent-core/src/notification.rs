//! Authorization by asking the data owner through a notification server.
//!
//! The prompt is pushed once, then the reply endpoint is polled at a fixed
//! interval until a decision for the same transaction arrives or the
//! attempts run out.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::errors::AuthorizationError;
use crate::plugins::{AuthorizationPlugin, PermissionNotificationRequest, PermissionNotificationResponse};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_POLL_ATTEMPTS: u32 = 120;

/// Transport to the notification server.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Publish a consent prompt.
    async fn push(&self, request: &PermissionNotificationRequest) -> Result<(), AuthorizationError>;

    /// Fetch the pending decision, if any.
    async fn poll_reply(&self) -> Result<Option<PermissionNotificationResponse>, AuthorizationError>;
}

pub struct NotificationAuthorizer<C> {
    channel: C,
    interval: Duration,
    max_attempts: u32,
}

impl<C: NotificationChannel> NotificationAuthorizer<C> {
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_POLL_ATTEMPTS,
        }
    }

    pub fn with_polling(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.interval = interval;
        self.max_attempts = max_attempts;
        self
    }

    /// Longest time a single `authorize` call can wait.
    pub fn max_wait(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

#[async_trait]
impl<C: NotificationChannel> AuthorizationPlugin for NotificationAuthorizer<C> {
    async fn authorize(
        &self,
        request: &PermissionNotificationRequest,
    ) -> Result<PermissionNotificationResponse, AuthorizationError> {
        self.channel.push(request).await?;
        info!(transaction = %request.transaction_id, "consent prompt published");

        for attempt in 1..=self.max_attempts {
            tokio::time::sleep(self.interval).await;
            match self.channel.poll_reply().await {
                Ok(Some(reply)) if reply.transaction_id == request.transaction_id => {
                    debug!(attempt, accepted = reply.accepted, "consent decision received");
                    return Ok(reply);
                }
                Ok(Some(reply)) => {
                    warn!(
                        expected = %request.transaction_id,
                        got = %reply.transaction_id,
                        "ignoring decision for another transaction"
                    );
                }
                Ok(None) => {}
                Err(e) => warn!(attempt, "polling consent decision failed: {}", e),
            }
        }

        Err(AuthorizationError::Timeout)
    }
}

#[cfg(feature = "http")]
pub use http::HttpNotificationChannel;

#[cfg(feature = "http")]
mod http {
    use async_trait::async_trait;
    use reqwest::StatusCode;

    use super::NotificationChannel;
    use crate::errors::AuthorizationError;
    use crate::plugins::{PermissionNotificationRequest, PermissionNotificationResponse};

    /// Talks to a notification server exposing `/notification-put` and
    /// `/reply-get`.
    #[derive(Clone)]
    pub struct HttpNotificationChannel {
        base_url: String,
        client: reqwest::Client,
    }

    impl HttpNotificationChannel {
        pub fn new(base_url: impl Into<String>) -> Result<Self, AuthorizationError> {
            let client = reqwest::Client::builder()
                .use_rustls_tls()
                .build()
                .map_err(|e| AuthorizationError::Channel(e.to_string()))?;
            Ok(Self {
                base_url: base_url.into().trim_end_matches('/').to_string(),
                client,
            })
        }

        fn url(&self, path: &str) -> String {
            format!("{}/{}", self.base_url, path)
        }
    }

    #[async_trait]
    impl NotificationChannel for HttpNotificationChannel {
        async fn push(&self, request: &PermissionNotificationRequest) -> Result<(), AuthorizationError> {
            let resp = self
                .client
                .put(self.url("notification-put"))
                .json(request)
                .send()
                .await
                .map_err(|e| AuthorizationError::Channel(e.to_string()))?;

            if resp.status().is_success() {
                Ok(())
            } else {
                Err(AuthorizationError::Channel(format!(
                    "status={} body={:?}",
                    resp.status(),
                    resp.text().await.ok()
                )))
            }
        }

        async fn poll_reply(&self) -> Result<Option<PermissionNotificationResponse>, AuthorizationError> {
            let resp = self
                .client
                .get(self.url("reply-get"))
                .send()
                .await
                .map_err(|e| AuthorizationError::Channel(e.to_string()))?;

            match resp.status() {
                StatusCode::OK => {
                    let reply = resp
                        .json::<PermissionNotificationResponse>()
                        .await
                        .map_err(|e| AuthorizationError::Channel(e.to_string()))?;
                    Ok(Some(reply))
                }
                // the server answers 500 while no decision is stored
                _ => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    #[derive(Default)]
    struct ScriptedChannel {
        pushed: Mutex<Vec<PermissionNotificationRequest>>,
        replies: Mutex<VecDeque<Result<Option<PermissionNotificationResponse>, AuthorizationError>>>,
        polls: Mutex<u32>,
    }

    #[async_trait]
    impl NotificationChannel for Arc<ScriptedChannel> {
        async fn push(&self, request: &PermissionNotificationRequest) -> Result<(), AuthorizationError> {
            self.pushed.lock().push(request.clone());
            Ok(())
        }

        async fn poll_reply(&self) -> Result<Option<PermissionNotificationResponse>, AuthorizationError> {
            *self.polls.lock() += 1;
            self.replies.lock().pop_front().unwrap_or(Ok(None))
        }
    }

    fn prompt(id: &str) -> PermissionNotificationRequest {
        PermissionNotificationRequest {
            transaction_id: id.into(),
            requester_name: "ACME".into(),
            requester_public_key: "00".into(),
            title: "t".into(),
            description: "d".into(),
            reason: "r".into(),
            date: "2026-01-01T00:00:00Z".into(),
            item: vec![],
            analysis: vec![],
            verification: vec![],
        }
    }

    fn decision(id: &str, accepted: bool) -> PermissionNotificationResponse {
        PermissionNotificationResponse {
            transaction_id: id.into(),
            accepted,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_decision() {
        let channel = Arc::new(ScriptedChannel::default());
        channel.replies.lock().extend([
            Ok(None),
            Err(AuthorizationError::Channel("502".into())),
            Ok(Some(decision("other", true))),
            Ok(Some(decision("tx1", false))),
        ]);

        let authorizer = NotificationAuthorizer::new(channel.clone());
        let reply = authorizer.authorize(&prompt("tx1")).await.unwrap();

        assert!(!reply.accepted);
        assert_eq!(*channel.polls.lock(), 4);
        assert_eq!(channel.pushed.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_after_attempts() {
        let channel = Arc::new(ScriptedChannel::default());
        let authorizer = NotificationAuthorizer::new(channel.clone())
            .with_polling(Duration::from_millis(250), 8);
        assert_eq!(authorizer.max_wait(), Duration::from_secs(2));

        let started = tokio::time::Instant::now();
        let result = authorizer.authorize(&prompt("tx1")).await;

        assert_eq!(result, Err(AuthorizationError::Timeout));
        assert_eq!(*channel.polls.lock(), 8);
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[test]
    fn test_default_polling() {
        let authorizer = NotificationAuthorizer::new(Arc::new(ScriptedChannel::default()));
        assert_eq!(authorizer.max_wait(), Duration::from_secs(120));
    }
}
