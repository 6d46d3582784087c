//! Satgent Library
//!
//! Core modules for the satellite agent: task polling, deploy/undeploy
//! orchestration, container runtime integration and the inference proxy.

pub mod app;
pub mod cache;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod installer;
pub mod logs;
pub mod models;
pub mod mserver;
pub mod runtime;
pub mod server;
pub mod storage;
pub mod tasks;
pub mod utils;
pub mod workers;
