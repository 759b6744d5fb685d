//! Plugin contracts: authorization and pre-transaction validation.
//!
//! Plugins are injected into the engine at construction. An
//! [`AuthorizationPlugin`] decides whether a transaction's query may be
//! released; a chain of [`PreTransactionValidator`]s decides whether a
//! transaction may be opened at all.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use consent_proto::validation::sizes::MAX_REQUESTER_LEN;
use consent_proto::{PreTransactionRequest, TransactionRequest};

use crate::errors::AuthorizationError;
use crate::types::{CollectionData, Entry};

/// Analysis hints attached to every consent prompt.
pub const DEFAULT_ANALYSIS: &[&str] = &[
    "personal data is GDPR protected data",
    "banking details is sensitive data",
];

/// Verification sources attached to every consent prompt.
pub const DEFAULT_VERIFICATION: &[&str] = &["digid.nl", "planet-blockchain", "kvk"];

/// One requested collection and its fields, as shown to the data owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemField {
    #[serde(rename = "Item")]
    pub item: String,
    #[serde(rename = "Fields", default)]
    pub fields: Vec<String>,
}

impl From<CollectionData> for ItemField {
    fn from(c: CollectionData) -> Self {
        Self {
            item: c.structure,
            fields: c.fields,
        }
    }
}

/// Consent prompt handed to an [`AuthorizationPlugin`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionNotificationRequest {
    #[serde(rename = "transactionID")]
    pub transaction_id: String,
    #[serde(rename = "requesterName")]
    pub requester_name: String,
    #[serde(rename = "RequesterPublicKey")]
    pub requester_public_key: String,
    pub title: String,
    pub description: String,
    pub reason: String,
    /// RFC 3339 timestamp
    pub date: String,
    #[serde(default)]
    pub item: Vec<ItemField>,
    #[serde(default)]
    pub analysis: Vec<String>,
    #[serde(default)]
    pub verification: Vec<String>,
}

impl PermissionNotificationRequest {
    /// Build the prompt for `request` against its queued `entry`.
    pub fn build(
        entry: &Entry,
        request: &TransactionRequest,
        collections: Vec<CollectionData>,
        date: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            transaction_id: entry.transaction_id.to_hex(),
            requester_name: entry.requester_name.clone(),
            requester_public_key: entry.requester_public_key.to_hex(),
            title: request.title.clone(),
            description: request.description.clone(),
            reason: request.law_applying.clone(),
            date: date.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            item: collections.into_iter().map(ItemField::from).collect(),
            analysis: DEFAULT_ANALYSIS.iter().map(|s| s.to_string()).collect(),
            verification: DEFAULT_VERIFICATION.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// The data owner's decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionNotificationResponse {
    #[serde(rename = "transactionID")]
    pub transaction_id: String,
    pub accepted: bool,
}

/// Decides whether a transaction's query may be released.
///
/// May wait on an external decision; the engine bounds each call with a
/// timeout. Implementations must be safe to call from many connections at
/// once.
#[async_trait]
pub trait AuthorizationPlugin: Send + Sync {
    async fn authorize(
        &self,
        request: &PermissionNotificationRequest,
    ) -> Result<PermissionNotificationResponse, AuthorizationError>;
}

/// Gatekeeper for the pre-transaction phase.
pub trait PreTransactionValidator: Send + Sync {
    fn validate(&self, request: &PreTransactionRequest) -> bool;

    fn name(&self) -> &'static str;
}

/// AND-combined chain of validators. An empty chain accepts everything.
#[derive(Clone, Default)]
pub struct Validators {
    chain: Vec<Arc<dyn PreTransactionValidator>>,
}

impl Validators {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in checks: requester name and key distinctness.
    pub fn standard() -> Self {
        Self::new()
            .with(RequesterNameValidator::default())
            .with(DistinctKeysValidator)
    }

    pub fn with(mut self, validator: impl PreTransactionValidator + 'static) -> Self {
        self.chain.push(Arc::new(validator));
        self
    }

    pub fn push(&mut self, validator: Arc<dyn PreTransactionValidator>) {
        self.chain.push(validator);
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Runs every validator and stops at the first rejection.
    pub fn validate_pre_transaction(&self, request: &PreTransactionRequest) -> bool {
        for validator in &self.chain {
            if !validator.validate(request) {
                warn!(validator = validator.name(), "pre-transaction rejected by validator");
                return false;
            }
        }
        true
    }
}

impl std::fmt::Debug for Validators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.chain.iter().map(|v| v.name()))
            .finish()
    }
}

/// Requester name must be non-empty, printable and bounded.
#[derive(Debug, Clone)]
pub struct RequesterNameValidator {
    pub max_len: usize,
}

impl Default for RequesterNameValidator {
    fn default() -> Self {
        Self { max_len: MAX_REQUESTER_LEN }
    }
}

impl PreTransactionValidator for RequesterNameValidator {
    fn validate(&self, request: &PreTransactionRequest) -> bool {
        let name = request.requester.trim();
        !name.is_empty()
            && request.requester.len() <= self.max_len
            && !request.requester.chars().any(char::is_control)
    }

    fn name(&self) -> &'static str {
        "requester-name"
    }
}

/// Main and signature keys must differ, and the transaction ID must not
/// reuse either key.
#[derive(Debug, Clone, Copy)]
pub struct DistinctKeysValidator;

impl PreTransactionValidator for DistinctKeysValidator {
    fn validate(&self, request: &PreTransactionRequest) -> bool {
        request.main_public_key != request.signature_public_key
            && request.transaction_id != request.main_public_key
            && request.transaction_id != request.signature_public_key
    }

    fn name(&self) -> &'static str {
        "distinct-keys"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use consent_crypto::Key32;

    fn request() -> PreTransactionRequest {
        PreTransactionRequest {
            transaction_id: Key32::random(),
            signature_public_key: Key32::random(),
            main_public_key: Key32::random(),
            requester: "Gemeente Amsterdam".into(),
        }
    }

    #[test]
    fn test_notification_json_names() {
        let entry = Entry {
            transaction_id: Key32::new([0xAB; 32]),
            requester_name: "Bank".into(),
            requester_public_key: Key32::new([0x01; 32]),
            signature_public_key: Key32::new([0x02; 32]),
        };
        let tx = TransactionRequest {
            transaction_id: entry.transaction_id,
            query: "{ a { b } }".into(),
            title: "Mortgage".into(),
            description: "Income check".into(),
            law_applying: "GDPR art. 6".into(),
            ..Default::default()
        };
        let date = chrono::Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let collections = vec![CollectionData {
            structure: "a".into(),
            fields: vec!["b".into()],
        }];

        let req = PermissionNotificationRequest::build(&entry, &tx, collections, date);
        let json: serde_json::Value = serde_json::to_value(&req).unwrap();

        assert_eq!(json["transactionID"], entry.transaction_id.to_hex());
        assert_eq!(json["requesterName"], "Bank");
        assert_eq!(json["RequesterPublicKey"], entry.requester_public_key.to_hex());
        assert_eq!(json["reason"], "GDPR art. 6");
        assert_eq!(json["date"], "2026-03-01T12:00:00Z");
        assert_eq!(json["item"][0]["Item"], "a");
        assert_eq!(json["item"][0]["Fields"][0], "b");
        assert_eq!(json["verification"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_response_json() {
        let resp: PermissionNotificationResponse =
            serde_json::from_str(r#"{"transactionID":"ab","accepted":true}"#).unwrap();
        assert!(resp.accepted);
        assert_eq!(resp.transaction_id, "ab");
    }

    #[test]
    fn test_empty_chain_accepts() {
        assert!(Validators::new().validate_pre_transaction(&request()));
    }

    #[test]
    fn test_requester_name_validator() {
        let v = RequesterNameValidator { max_len: 8 };
        let mut req = request();
        req.requester = "ACME".into();
        assert!(v.validate(&req));
        req.requester = "   ".into();
        assert!(!v.validate(&req));
        req.requester = "far too long a name".into();
        assert!(!v.validate(&req));
        req.requester = "a\u{7}b".into();
        assert!(!v.validate(&req));
    }

    #[test]
    fn test_distinct_keys_validator() {
        let mut req = request();
        assert!(DistinctKeysValidator.validate(&req));
        req.signature_public_key = req.main_public_key;
        assert!(!DistinctKeysValidator.validate(&req));

        let mut req = request();
        req.transaction_id = req.signature_public_key;
        assert!(!DistinctKeysValidator.validate(&req));
    }

    struct Never;

    impl PreTransactionValidator for Never {
        fn validate(&self, _request: &PreTransactionRequest) -> bool {
            false
        }

        fn name(&self) -> &'static str {
            "never"
        }
    }

    #[test]
    fn test_chain_is_and_combined() {
        let chain = Validators::standard();
        assert_eq!(chain.len(), 2);
        assert!(chain.validate_pre_transaction(&request()));

        let chain = Validators::standard().with(Never);
        assert!(!chain.validate_pre_transaction(&request()));
        assert_eq!(format!("{:?}", chain), r#"["requester-name", "distinct-keys", "never"]"#);
    }
}
