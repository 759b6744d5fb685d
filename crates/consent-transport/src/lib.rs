//! Connection contract and framing for the consent protocol.
//!
//! The handshake engine owns no transport. It is handed values implementing
//! [`Connection`]; this crate provides a length-prefixed stream
//! implementation and an in-memory pair for tests.

pub mod framing;
pub mod stream;
pub mod testing;
pub mod traits;

pub use framing::*;
pub use stream::*;
pub use testing::*;
pub use traits::*;
