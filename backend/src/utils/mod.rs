pub mod cookies;
pub mod error;
pub mod i18n;
pub mod jwt;
pub mod paths;

pub use error::{ApiError, ApiResult};
pub use i18n::{DEFAULT_LOCALE, ResolvedLocale, negotiate_locale, normalize_locale};
pub use jwt::JwtUtil;
pub use paths::{PublicPaths, RequestMatcher};
