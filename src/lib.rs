//! OpenAI-compatible HTTP gateway in front of the Nele chat backend.

pub mod attachments;
pub mod backend;
pub mod catalog;
pub mod completion;
pub mod config;
pub mod credentials;
pub mod error;
pub mod knowledge;
pub mod media;
pub mod normalize;
pub mod payload;
pub mod responses;
pub mod server;
pub mod stream;
pub mod wire;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use server::{AppState, router};
