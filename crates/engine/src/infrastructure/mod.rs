//! Infrastructure implementations.
//!
//! Contains the store port and its file-backed implementation.

pub mod persistence;
pub mod ports;
