pub mod credit_api;

pub use credit_api::*;
