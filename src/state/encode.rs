//! Encoder: write a [`VariantStore`] to a PLY file.
//!
//! Each entry becomes one element named by its full key. A matrix with one
//! row is declared as a single `value` property, a taller matrix as
//! `value_0 .. value_{rows-1}`, and a list as one `value` list property
//! whose length type is the narrowest unsigned integer that holds its
//! longest inner list.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::probe::STATE_MARKER;
use super::progress::{Progress, ProgressFn};
use super::store::VariantStore;
use super::variant::{dispatch, Payload, Variant};
use crate::ply::{is_valid_name, Encoding, PlyWriter, ScalarType};
use crate::util::{Error, Primitive, Result};

/// Options for [`VariantStore::write`].
#[derive(Clone, Copy, Debug, Default)]
pub struct WriteOptions {
    /// Body encoding, binary little endian unless overridden
    pub encoding: Encoding,
}

impl VariantStore {
    /// Write with default options and no progress.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<u64> {
        self.write(path, &WriteOptions::default(), None)
    }

    /// Write every entry to `path`, replacing any existing file.
    ///
    /// The file is written under a temporary name in the same directory
    /// and renamed over `path` once complete; on error `path` is untouched.
    ///
    /// Returns the number of body bytes written, which for binary
    /// encodings equals [`VariantStore::total_size`].
    pub fn write(
        &self,
        path: impl AsRef<Path>,
        options: &WriteOptions,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<u64> {
        let path = path.as_ref();
        let timer = Instant::now();
        info!(path = %path.display(), "serializing application state");

        if let Some(key) = self.entries().keys().find(|k| !is_valid_name(k)) {
            return Err(Error::backend(format!(
                "key \"{key}\" cannot be used as an element name"
            )));
        }

        // The target is only replaced by a completely written sibling file.
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let open_error = |e: std::io::Error| Error::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        let mut temp = NamedTempFile::new_in(dir).map_err(open_error)?;

        let writer = BufWriter::with_capacity(2 * 1024 * 1024, temp.as_file_mut());
        let body = self.encode(PlyWriter::new(writer, options.encoding), progress)?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        info!(
            path = %path.display(),
            entries = self.len(),
            bytes = body,
            elapsed = ?timer.elapsed(),
            "serialized application state"
        );
        Ok(body)
    }

    /// Stream every entry through `ply`, returning the body size.
    fn encode<W: Write>(&self, mut ply: PlyWriter<W>, progress: Option<ProgressFn<'_>>) -> Result<u64> {
        ply.add_comment(STATE_MARKER)?;
        for (key, variant) in self.entries() {
            declare(&mut ply, key, variant)?;
        }
        ply.write_header()?;

        let total = self.total_size();
        let mut written = 0usize;
        let mut progress = Progress::new(progress);
        for (key, variant) in self.entries() {
            dispatch!(variant, p => write_payload(&mut ply, p))?;
            written += variant.byte_size();
            progress.report(&format!("Writing \"{key}\""), written, total);
            debug!(key = %key, kind = %variant.type_id(), bytes = variant.byte_size(), "wrote entry");
        }
        ply.close()
    }
}

fn declare<W: Write>(ply: &mut PlyWriter<W>, key: &str, variant: &Variant) -> Result<()> {
    let value_type = ScalarType::from(variant.primitive());
    ply.add_element(key, variant.instances())?;
    match variant.list_length_type() {
        Some(length) => ply.add_list_property("value", length, value_type),
        None => {
            let rows = dispatch!(variant, p => match p {
                Payload::Matrix(m) => m.rows(),
                Payload::List(_) => 0,
            });
            if rows == 1 {
                return ply.add_scalar_property("value", value_type);
            }
            for row in 0..rows {
                ply.add_scalar_property(&format!("value_{row}"), value_type)?;
            }
            Ok(())
        }
    }
}

fn write_payload<T: Primitive, W: Write>(ply: &mut PlyWriter<W>, payload: &Payload<T>) -> Result<()> {
    match payload {
        // Column-major storage is already instance order.
        Payload::Matrix(m) => m.as_slice().iter().try_for_each(|v| ply.write(v.to_f64())),
        Payload::List(lists) => {
            for inner in lists {
                ply.write(inner.len() as f64)?;
                for v in inner {
                    ply.write(v.to_f64())?;
                }
            }
            Ok(())
        }
    }
}
