//! Utility types shared by the PLY layer and the state store.
//!
//! - [`PrimitiveType`] / [`Primitive`] - element types a dataset can hold
//! - [`Matrix`] - dense column-major matrix payload
//! - [`Error`] / [`Result`] - error handling

mod pod;
mod matrix;
mod error;

pub use pod::*;
pub use matrix::*;
pub use error::*;
