pub mod auth;
pub mod locale;

pub use auth::{GateState, gate_middleware};
pub use locale::{LocaleRewriter, PrefixLocaleRewriter};
