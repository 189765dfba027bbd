//! PLY reader with per-property value callbacks.
//!
//! Reading is declarative: open the file, inspect [`PlyReader::header`],
//! register interest in `(element, property)` pairs with
//! [`PlyReader::set_read_cb`], then call [`PlyReader::read`] once. Every
//! decoded value of a registered property is handed to the callback as an
//! [`Argument`]; unregistered properties are parsed and skipped.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::trace;

use super::format::{ElementDef, PropertyDef, PropertyType};
use super::header::Header;
use super::stream::IStream;
use crate::util::{Error, Result};

/// Position inside a list-valued property.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListCursor {
    /// Number of items in this instance's list
    pub length: usize,
    /// Item index, or `None` for the length value itself
    pub index: Option<usize>,
}

/// One decoded value as seen by a read callback.
#[derive(Debug)]
pub struct Argument<'a> {
    pub element: &'a ElementDef,
    pub property: &'a PropertyDef,
    /// Instance index within the element
    pub instance: usize,
    /// Caller data given at registration
    pub user: usize,
    /// Caller coordinate given at registration
    pub coord: usize,
    /// List position, `None` for scalar properties
    pub list: Option<ListCursor>,
    pub value: f64,
}

#[derive(Clone, Copy)]
struct Registration {
    user: usize,
    coord: usize,
}

/// Reader over one PLY file.
pub struct PlyReader {
    header: Header,
    header_len: u64,
    file_len: u64,
    stream: IStream,
    callbacks: HashMap<(usize, usize), Registration>,
}

impl PlyReader {
    /// Open a file and parse its header.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        let (header, header_len) = Header::parse(&mut reader)?;
        let stream = IStream::new(reader, header.encoding);

        Ok(Self {
            header,
            header_len,
            file_len,
            stream,
            callbacks: HashMap::new(),
        })
    }

    #[inline]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Size of the header in bytes.
    #[inline]
    pub fn header_len(&self) -> u64 {
        self.header_len
    }

    /// Bytes following the header.
    #[inline]
    pub fn body_len(&self) -> u64 {
        self.file_len.saturating_sub(self.header_len)
    }

    /// Register interest in one property.
    ///
    /// `user` and `coord` are handed back unchanged in every [`Argument`]
    /// for that property.
    pub fn set_read_cb(
        &mut self,
        element: &str,
        property: &str,
        user: usize,
        coord: usize,
    ) -> Result<()> {
        let e = self
            .header
            .element_index(element)
            .ok_or_else(|| Error::backend(format!("no element '{element}'")))?;
        let p = self.header.elements[e]
            .property_index(property)
            .ok_or_else(|| Error::backend(format!("no property '{element}.{property}'")))?;

        trace!(element, property, user, coord, "registered read callback");
        self.callbacks.insert((e, p), Registration { user, coord });
        Ok(())
    }

    /// Read the whole body, driving registered callbacks in file order.
    ///
    /// The first error returned by a callback aborts the read.
    pub fn read<F>(&mut self, mut on_value: F) -> Result<()>
    where
        F: FnMut(&Argument<'_>) -> Result<()>,
    {
        let Self {
            header,
            stream,
            callbacks,
            ..
        } = self;

        for (e, element) in header.elements.iter().enumerate() {
            // Instances without properties occupy no bytes.
            if element.properties.is_empty() {
                continue;
            }
            for instance in 0..element.count {
                for (p, property) in element.properties.iter().enumerate() {
                    let registration = callbacks.get(&(e, p)).copied();
                    let mut emit = |list: Option<ListCursor>, value: f64| -> Result<()> {
                        match registration {
                            Some(reg) => on_value(&Argument {
                                element,
                                property,
                                instance,
                                user: reg.user,
                                coord: reg.coord,
                                list,
                                value,
                            }),
                            None => Ok(()),
                        }
                    };

                    match property.ty {
                        PropertyType::Scalar(ty) => {
                            let value = stream.read_scalar(ty)?;
                            emit(None, value)?;
                        }
                        PropertyType::List { length, value } => {
                            let raw = stream.read_scalar(length)?;
                            if raw < 0.0 {
                                return Err(Error::backend(format!(
                                    "negative list length in '{}.{}'",
                                    element.name, property.name
                                )));
                            }
                            let len = raw as usize;
                            emit(Some(ListCursor { length: len, index: None }), raw)?;
                            for index in 0..len {
                                let item = stream.read_scalar(value)?;
                                emit(
                                    Some(ListCursor {
                                        length: len,
                                        index: Some(index),
                                    }),
                                    item,
                                )?;
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
