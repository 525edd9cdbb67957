pub mod fixture;
pub mod http;

pub use fixture::FixtureFetcher;
pub use http::{HttpFetcher, DEFAULT_USER_AGENT};
