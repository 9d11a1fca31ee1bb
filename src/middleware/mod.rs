//! HTTP middleware

pub mod error_body;
pub mod request_id;

pub use error_body::echo_request_id;
pub use request_id::{request_id_layer, request_span};
