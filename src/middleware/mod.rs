pub mod rate_limit;
pub mod security_headers;

pub use rate_limit::{RateLimiter, rate_limit_middleware};
pub use security_headers::{RequestId, security_headers_middleware};
