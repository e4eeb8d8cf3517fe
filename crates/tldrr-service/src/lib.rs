//! TLDRR Translation Service
//!
//! Turns `(text, request type, api key)` into transformed text through the
//! Gemini `generateContent` API and folds every outcome into the
//! `{success, data | error}` envelope the content script understands.
//!
//! # Modules
//!
//! - `request`: Request types and their prompts
//! - `gemini`: Wire types and the reqwest client
//! - `error`: Error kinds
//! - `message`: Runtime message protocol and the background handler

pub mod request;
pub mod gemini;
pub mod error;
pub mod message;

pub use error::{ErrorKind, ServiceError};
pub use gemini::{GeminiClient, GeminiConfig};
pub use message::{handle_message, ExtensionMessage};
pub use request::RequestType;
