//! In-process caches

pub mod local;
pub mod secrets;
