//! Remote chat client: request building, context trimming and response decoding.

pub mod client;
pub mod ndjson;
pub mod reasoning;
pub mod wire;

pub use client::{ChatClient, ChatTransport, ClientError};
