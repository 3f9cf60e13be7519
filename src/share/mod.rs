//! Short-code document sharing
//!
//! Server side: code generation, the `shares` table and the create/get
//! service. Client side: the HTTP client with user-facing errors and the
//! URL-embedded document codec.

mod client;
mod codes;
mod service;
mod store;
mod types;
pub mod url_codec;

pub use client::{
    error_message, ErrorBody, LoadOutcome, ShareClient, ShareContext, ShareError,
    SharedDocument, SharedDocumentLoader,
};
pub use codes::{generate_code, is_valid_code, normalize_code, ALPHABET, CODE_LENGTH};
pub use service::ShareService;
pub use store::ShareRepository;
pub use types::{CreateShareResponse, GetShareResponse, ShareRecord};
