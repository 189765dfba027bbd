//! Decoder: build a [`VariantStore`] from a PLY file.
//!
//! One element becomes one variant keyed by the element name. Scalar
//! properties become matrix rows in declaration order; an element with a
//! list property becomes a list variant. Values are delivered by the PLY
//! reader through per-property callbacks while it streams the body.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use super::progress::{Progress, ProgressFn};
use super::store::VariantStore;
use super::variant::{dispatch, Variant};
use crate::ply::{ElementDef, PlyReader, ScalarType};
use crate::util::{Error, PrimitiveType, Result};

/// Options for [`VariantStore::read`].
#[derive(Clone, Debug, Default)]
pub struct ReadOptions {
    /// Passed through to [`VariantStore::compatibility_mode`].
    pub compatibility_mode: bool,
}

/// Per-property callback context, owned by one decode call.
#[derive(Debug)]
struct CallbackState {
    /// Index of the target variant in the pending list
    slot: usize,
    /// Entity offset of this element within the file, for progress
    offset: usize,
    /// Sum of all element counts; filled in after the structural scan
    total: usize,
}

/// Variant under construction.
struct Pending {
    name: String,
    variant: Variant,
    visited: bool,
}

impl VariantStore {
    /// Read a store from `path` with default options and no progress.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::read(path, &ReadOptions::default(), None)
    }

    /// Read a store from `path`.
    ///
    /// On any failure no store is returned and everything allocated for
    /// the read is released.
    pub fn read(
        path: impl AsRef<Path>,
        options: &ReadOptions,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let timer = Instant::now();
        info!(path = %path.display(), "unserializing application state");

        let mut ply = PlyReader::open(path).map_err(|e| Error::Open {
            path: path.to_path_buf(),
            reason: describe_open_error(&e),
        })?;

        let mut pending = Vec::new();
        let mut states = Vec::new();
        let mut targets = Vec::new();
        let mut total = 0usize;
        let encoding = ply.header().encoding;
        let mut remaining = ply.body_len();

        for element in &ply.header().elements {
            if pending.iter().any(|p: &Pending| p.name == element.name) {
                return Err(Error::unsupported(
                    path,
                    format!("element '{}' appears more than once", element.name),
                ));
            }
            // Reject counts the body cannot hold before allocating for them.
            remaining = element
                .min_body_len(encoding)
                .and_then(|needed| remaining.checked_sub(needed))
                .ok_or_else(|| {
                    Error::unsupported(
                        path,
                        format!(
                            "element '{}' declares {} instances but only {remaining} body bytes remain",
                            element.name, element.count
                        ),
                    )
                })?;
            let variant = plan_element(path, element)?;
            debug!(
                element = %element.name,
                kind = %variant.type_id(),
                count = element.count,
                "decoding element"
            );
            pending.push(Pending {
                name: element.name.clone(),
                variant,
                visited: false,
            });
            let slot = pending.len() - 1;
            for (row, property) in element.properties.iter().enumerate() {
                states.push(CallbackState {
                    slot,
                    offset: total,
                    total: 0,
                });
                targets.push((element.name.clone(), property.name.clone(), row));
            }
            total = total.saturating_add(element.count);
        }
        for state in &mut states {
            state.total = total;
        }

        for (index, (element, property, row)) in targets.iter().enumerate() {
            ply.set_read_cb(element, property, index, *row).map_err(|e| {
                Error::backend(format!(
                    "could not register read callback for {element}.{property} in \"{}\": {e}",
                    path.display()
                ))
            })?;
        }

        let mut progress = Progress::new(progress);
        ply.read(|arg| {
            let state = &states[arg.user];
            let target = &mut pending[state.slot];
            dispatch!(&mut target.variant, p => p.store_value(arg.coord, arg.instance, arg.list, arg.value))?;
            if !target.visited {
                target.visited = true;
                let label = format!("Loading field \"{}\"", target.name);
                progress.report(&label, state.offset, state.total);
            }
            Ok(())
        })
        .map_err(|e| {
            Error::backend(format!(
                "error while loading application state from \"{}\": {e}",
                path.display()
            ))
        })?;

        let entries: BTreeMap<String, Variant> = pending
            .into_iter()
            .map(|p| (p.name, p.variant))
            .collect();
        info!(
            path = %path.display(),
            entries = entries.len(),
            elapsed = ?timer.elapsed(),
            "unserialized application state"
        );
        Ok(Self::from_entries(entries, options.compatibility_mode))
    }
}

/// Decide type and shape of the variant for one element.
fn plan_element(path: &Path, element: &ElementDef) -> Result<Variant> {
    let mut value_type: Option<ScalarType> = None;
    let mut scalars = 0usize;
    let mut lists = 0usize;

    for property in &element.properties {
        let ty = property.ty.value_type();
        match value_type {
            None => value_type = Some(ty),
            Some(first) if first != ty => {
                return Err(Error::unsupported(
                    path,
                    format!(
                        "element '{}' mixes property types {first} and {ty}",
                        element.name
                    ),
                ));
            }
            Some(_) => {}
        }
        if property.ty.is_list() {
            lists += 1;
        } else {
            scalars += 1;
        }
    }

    if lists > 0 && scalars > 0 {
        return Err(Error::unsupported(
            path,
            format!("element '{}' mixes scalar and list properties", element.name),
        ));
    }
    if lists > 1 {
        return Err(Error::unsupported(
            path,
            format!("element '{}' has more than one list property", element.name),
        ));
    }

    let primitive = match value_type {
        Some(ty) => ty.primitive().ok_or_else(|| {
            Error::unsupported(
                path,
                format!("element '{}' uses unsupported type {ty}", element.name),
            )
        })?,
        None => PrimitiveType::Uint8,
    };

    if lists == 1 {
        return Variant::list(primitive, element.count);
    }
    let rows = if scalars == 0 && element.count == 0 { 1 } else { scalars };
    Variant::matrix(primitive, rows, element.count)
}

fn describe_open_error(err: &Error) -> String {
    match err {
        Error::Io(e) if e.kind() == ErrorKind::NotFound => "file not found".to_string(),
        Error::InvalidHeader(msg) => format!("unable to parse header: {msg}"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ply::{PropertyDef, PropertyType};
    use crate::state::Shape;

    fn element(name: &str, count: usize, props: &[(&str, PropertyType)]) -> ElementDef {
        ElementDef {
            name: name.to_string(),
            count,
            properties: props
                .iter()
                .map(|(n, ty)| PropertyDef {
                    name: n.to_string(),
                    ty: *ty,
                })
                .collect(),
        }
    }

    const F32: PropertyType = PropertyType::Scalar(ScalarType::Float32);
    const U8: PropertyType = PropertyType::Scalar(ScalarType::Uint8);
    const LIST: PropertyType = PropertyType::List {
        length: ScalarType::Uint8,
        value: ScalarType::Uint32,
    };

    #[test]
    fn test_plan_shapes() -> Result<()> {
        let path = Path::new("x.ply");
        let v = plan_element(path, &element("p", 5, &[("value_0", F32), ("value_1", F32)]))?;
        assert_eq!(v.as_matrix::<f32>()?.shape(), (2, 5));

        let v = plan_element(path, &element("f", 4, &[("value", LIST)]))?;
        assert_eq!(v.shape(), Shape::List);
        assert_eq!(v.instances(), 4);

        let v = plan_element(path, &element("empty", 0, &[]))?;
        assert_eq!(v.as_matrix::<u8>()?.shape(), (1, 0));

        let v = plan_element(path, &element("rowless", 3, &[]))?;
        assert_eq!(v.as_matrix::<u8>()?.shape(), (0, 3));

        let v = plan_element(path, &element("nothing_yet", 0, &[("value_0", F32), ("value_1", F32)]))?;
        assert_eq!(v.as_matrix::<f32>()?.shape(), (2, 0));
        Ok(())
    }

    #[test]
    fn test_plan_rejects_unsupported() {
        let path = Path::new("x.ply");
        let cases = [
            element("mixed", 1, &[("a", F32), ("b", U8)]),
            element("both", 1, &[("a", U8), ("b", PropertyType::List {
                length: ScalarType::Uint8,
                value: ScalarType::Uint8,
            })]),
            element("two_lists", 1, &[("a", LIST), ("b", LIST)]),
            element("signed", 1, &[("a", PropertyType::Scalar(ScalarType::Int16))]),
        ];
        for case in &cases {
            assert!(
                matches!(plan_element(path, case), Err(Error::UnsupportedFormat { .. })),
                "accepted {}",
                case.name
            );
        }
    }
}
