//! Protobuf wire messages, version 1.
//!
//! Field tags are part of the wire format and must not be renumbered.

/// Framed message as it travels over a connection.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MessageV1 {
    #[prost(bytes = "vec", tag = "1")]
    pub source: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub destination: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub topic: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub payload: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PreTransactionRequestV1 {
    #[prost(bytes = "vec", tag = "1")]
    pub transaction_id: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub signature_public_key: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub main_public_key: ::prost::alloc::vec::Vec<u8>,
    #[prost(string, tag = "4")]
    pub requester: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PreTransactionReplyV1 {
    #[prost(bool, tag = "1")]
    pub success: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TransactionRequestV1 {
    #[prost(bytes = "vec", tag = "1")]
    pub transaction_id: ::prost::alloc::vec::Vec<u8>,
    #[prost(string, tag = "2")]
    pub query: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub title: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub description: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub law_applying: ::prost::alloc::string::String,
    #[prost(string, tag = "6")]
    pub kind: ::prost::alloc::string::String,
    /// Hex of signature || query.
    #[prost(string, tag = "7")]
    pub signature: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TransactionReplyV1 {
    #[prost(string, optional, tag = "1")]
    pub content: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "2")]
    pub error: ::core::option::Option<::prost::alloc::string::String>,
}
