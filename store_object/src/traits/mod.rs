pub mod core;
pub mod model;
pub mod transport;

pub use core::StoreObject;
pub use model::Model;
pub use transport::{Method, Transport, TransportRequest, TransportResponse};
