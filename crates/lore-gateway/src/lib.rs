//! HTTP gateway: index refresh trigger and workspace-path discovery,
//! behind bearer-session authentication.

mod error;
mod handlers;
mod router;
mod server;
mod session;

pub use error::GatewayError;
pub use server::{AppState, GatewayServer};
pub use session::SessionStore;
