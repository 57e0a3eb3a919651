//! Core types and utilities for relup.
//!
//! This crate holds what every other relup crate agrees on: the error type,
//! validated inputs, the platform signature and the traits for the release
//! host and the install cache.

mod error;
pub mod inputs;
pub mod tools;

pub use error::{Error, Result};
