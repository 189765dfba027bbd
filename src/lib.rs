//! # plystate
//!
//! Typed application state persisted to PLY files.
//!
//! A [`VariantStore`] maps string keys to dense matrices or per-entity
//! lists over `u8`, `u16`, `u32`, `f32` and `f64`. Each entry is written as
//! one PLY element named by its key, so the files stay readable by generic
//! PLY tooling.
//!
//! ## Modules
//!
//! - [`util`] - Primitive types, matrix container, errors
//! - [`ply`] - Low-level PLY reader and writer
//! - [`state`] - Variants, the store, encode/decode, diff, probe
//!
//! ## Example
//!
//! ```ignore
//! use plystate::prelude::*;
//!
//! let mut store = VariantStore::new();
//! {
//!     let mut mesh = store.scope("mesh.");
//!     mesh.set("scale", &1.5f32);
//!     mesh.set("faces", &vec![vec![0u32, 1, 2], vec![2, 3, 0]]);
//! }
//! store.save("state.ply")?;
//!
//! let loaded = VariantStore::open("state.ply")?;
//! assert!(!plystate::diff(&store, &loaded));
//! ```

pub mod util;
pub mod ply;
pub mod state;

// Re-export commonly used types
pub use util::{Error, Matrix, PrimitiveType, Result};
pub use state::{diff, is_serialized_file, ReadOptions, Variant, VariantStore, WriteOptions};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Matrix, PrimitiveType, Result};
    pub use crate::ply::Encoding;
    pub use crate::state::{
        ReadOptions, Serializable, Variant, VariantStore, VariantType, WriteOptions,
    };
}
