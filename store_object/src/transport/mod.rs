//! Transport implementations

pub mod http;
pub mod mock;

pub use http::HttpTransport;
pub use mock::{MockResponse, MockTransport};
