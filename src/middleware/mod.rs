mod error_handler;

pub use error_handler::{REQUEST_ID_HEADER, log_errors};
