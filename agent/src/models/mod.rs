//! Domain models shared with the platform

pub mod capability;
pub mod deployment;
pub mod secret;
pub mod task;
