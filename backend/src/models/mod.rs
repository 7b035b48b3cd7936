pub mod edge;
pub mod session;

pub use edge::{EdgeAction, EdgeResponse, RequestHead, apply_header_overrides};
pub use session::{AssuranceLevel, AssuranceLevels, Session, SessionClaims};
