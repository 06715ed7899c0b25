pub mod formatter;

pub use formatter::{MAX_BODY_LEN, Report, display_json, shorten, truncate};
