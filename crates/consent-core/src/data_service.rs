//! Boundary to the data source that executes an approved query.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::errors::DataServiceError;

/// Collection name to field name to value.
pub type DataMap = BTreeMap<String, BTreeMap<String, String>>;

/// Everything forwarded for an approved transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataServiceRequest {
    pub query: String,
    pub title: String,
    pub description: String,
    /// Hex transaction ID
    pub transaction_id: String,
    /// Hex of the signed query
    pub signature: String,
    /// Hex main public key of the requester
    pub requester: String,
    pub requester_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataServiceErrorEntry {
    #[serde(default)]
    pub message: String,
}

/// JSON reply of the data service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataServiceReply {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<DataServiceErrorEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DataMap>,
}

impl DataServiceReply {
    /// Turn a reply into the content string sent back to the requester.
    /// Any reported error fails the whole reply.
    pub fn into_content(self) -> Result<String, DataServiceError> {
        if !self.errors.is_empty() {
            let messages: Vec<String> = self.errors.into_iter().map(|e| e.message).collect();
            return Err(DataServiceError::QueryFailed(messages.join("; ")));
        }
        serde_json::to_string(&self.data.unwrap_or_default())
            .map_err(|e| DataServiceError::Encoding(e.to_string()))
    }
}

/// Executes approved queries.
#[async_trait]
pub trait DataService: Send + Sync {
    async fn execute(&self, request: &DataServiceRequest) -> Result<String, DataServiceError>;
}

/// Serves a fixed reply and records what it was asked.
#[derive(Debug, Default)]
pub struct StaticDataService {
    reply: DataServiceReply,
    requests: Mutex<Vec<DataServiceRequest>>,
}

impl StaticDataService {
    pub fn new(data: DataMap) -> Self {
        Self {
            reply: DataServiceReply {
                errors: Vec::new(),
                data: Some(data),
            },
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A service that reports `message` as a query error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: DataServiceReply {
                errors: vec![DataServiceErrorEntry { message: message.into() }],
                data: None,
            },
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Sample personal data used by the demo responder.
    pub fn demo() -> Self {
        let mut data = DataMap::new();
        data.insert(
            "personalDetails".into(),
            BTreeMap::from([
                ("name".to_string(), "Jan".to_string()),
                ("surname".to_string(), "de Vries".to_string()),
                ("birthDate".to_string(), "1985-04-12".to_string()),
            ]),
        );
        data.insert(
            "bankingDetails".into(),
            BTreeMap::from([
                ("iban".to_string(), "NL91ABNA0417164300".to_string()),
                ("bank".to_string(), "ABN AMRO".to_string()),
            ]),
        );
        Self::new(data)
    }

    pub fn requests(&self) -> Vec<DataServiceRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl DataService for StaticDataService {
    async fn execute(&self, request: &DataServiceRequest) -> Result<String, DataServiceError> {
        self.requests.lock().push(request.clone());
        self.reply.clone().into_content()
    }
}

#[cfg(feature = "http")]
pub use http::HttpDataService;

#[cfg(feature = "http")]
mod http {
    use async_trait::async_trait;
    use reqwest::header::CONTENT_TYPE;

    use super::{DataService, DataServiceReply, DataServiceRequest};
    use crate::errors::DataServiceError;

    #[derive(serde::Serialize)]
    struct QueryBody<'a> {
        query: &'a str,
    }

    /// POSTs `{"query": ...}` with transaction metadata in headers.
    #[derive(Clone)]
    pub struct HttpDataService {
        url: String,
        client: reqwest::Client,
    }

    impl HttpDataService {
        pub fn new(url: impl Into<String>) -> Result<Self, DataServiceError> {
            let client = reqwest::Client::builder()
                .use_rustls_tls()
                .build()
                .map_err(|e| DataServiceError::Http(e.to_string()))?;
            Ok(Self {
                url: url.into(),
                client,
            })
        }

        pub fn url(&self) -> &str {
            &self.url
        }
    }

    #[async_trait]
    impl DataService for HttpDataService {
        async fn execute(&self, request: &DataServiceRequest) -> Result<String, DataServiceError> {
            let resp = self
                .client
                .post(&self.url)
                .header(CONTENT_TYPE, "application/json")
                .header("title", &request.title)
                .header("description", &request.description)
                .header("TransactionID", &request.transaction_id)
                .header("signature", &request.signature)
                .header("requester", &request.requester)
                .header("requester-name", &request.requester_name)
                .json(&QueryBody { query: &request.query })
                .send()
                .await
                .map_err(|e| DataServiceError::Http(e.to_string()))?;

            let status = resp.status();
            let body = resp
                .bytes()
                .await
                .map_err(|e| DataServiceError::Http(e.to_string()))?;
            let reply: DataServiceReply = serde_json::from_slice(&body).map_err(|e| {
                DataServiceError::BadResponse(format!("status={} decode={}", status, e))
            })?;
            reply.into_content()
        }
    }
}
