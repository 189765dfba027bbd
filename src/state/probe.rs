//! Cheap check whether a file holds serialized application state.

use std::path::Path;

use tracing::debug;

use super::store::VariantStore;
use crate::ply::PlyReader;

/// Header comment that marks a file as written by [`VariantStore::write`].
pub const STATE_MARKER: &str = "Instant Meshes Application State";

/// True if `path` is a readable PLY file whose header carries
/// [`STATE_MARKER`] as a comment. Only the header is read.
pub fn is_serialized_file(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    match PlyReader::open(path) {
        Ok(reader) => reader.header().comments().any(|c| c == STATE_MARKER),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "not a state file");
            false
        }
    }
}

impl VariantStore {
    /// See [`is_serialized_file`].
    pub fn is_serialized_file(path: impl AsRef<Path>) -> bool {
        is_serialized_file(path)
    }
}
