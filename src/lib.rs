//! Postbox - message submission front end and storage relay
//!
//! Core library for the HTTP front end, the relay protocol and the storage
//! listener.

pub mod config;
pub mod http;
pub mod relay;
pub mod server;
pub mod storage;
