//! Pairing installer

pub mod pair;
