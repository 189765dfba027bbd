//! Typed application state and its PLY persistence.
//!
//! - [`Variant`] - one typed matrix or list payload
//! - [`VariantStore`] - named variants with prefix scoping and typed get/set
//! - [`VariantStore::read`] / [`VariantStore::write`] - decode and encode
//! - [`diff`] - structural and value comparison of two stores
//! - [`is_serialized_file`] - header-only format probe

mod variant;
mod store;
mod serializable;
mod progress;
mod decode;
mod encode;
mod diff;
mod probe;
mod display;

pub use variant::{Payload, Shape, Variant, VariantElement, VariantType};
pub use store::*;
pub use serializable::*;
pub use progress::ProgressFn;
pub use decode::ReadOptions;
pub use encode::WriteOptions;
pub use diff::{diff, diff_with};
pub use probe::{is_serialized_file, STATE_MARKER};
