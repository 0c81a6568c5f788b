#![forbid(unsafe_code)]

pub mod config;
pub mod errors;
pub mod path;
pub mod record;
pub mod traits;
pub mod types;
