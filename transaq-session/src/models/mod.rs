//! Transaq data structures as delivered by the connector bridge.
//!
//! Field names follow the connector's XML attribute names on the wire
//! (`secid`, `seccode`, ...) and idiomatic snake_case in Rust.

pub mod market;
pub mod portfolio;
pub mod security;
pub mod status;
