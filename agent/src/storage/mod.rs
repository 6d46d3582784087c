//! Local storage: layout, settings and the satellite identity file

pub mod layout;
pub mod satellite;
pub mod settings;
