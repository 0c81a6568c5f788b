#![forbid(unsafe_code)]

pub mod classify;
pub mod dataset;
pub mod export;
pub mod results;
pub mod store;
