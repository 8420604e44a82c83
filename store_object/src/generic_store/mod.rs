pub mod core;
pub mod prefetch;
pub mod store_object;

pub use core::Repository;
pub use store_object::UpdateInput;
