//! Outbound HTTP to the marketplace backend.

mod envelope;
mod tokenized;

pub use envelope::Envelope;
pub use tokenized::{ApiRequest, TokenizedClient, REFRESH_TOKEN_PATH};
