pub mod auth_store;
pub mod gatekeeper;
pub mod session_refresher;

pub use auth_store::{AuthStore, JwtAuthStore};
pub use gatekeeper::{GatePolicy, Gatekeeper};
pub use session_refresher::{JwtSessionRefresher, SessionRefresher};
