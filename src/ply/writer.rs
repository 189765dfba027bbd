//! PLY writer.
//!
//! The schema is declared first (comments, elements, properties), then
//! [`PlyWriter::write_header`] freezes it and values are streamed with
//! [`PlyWriter::write`] in declaration order: instance by instance, property
//! by property, a list being its length followed by its items.

use std::io::Write;

use tracing::debug;

use super::format::*;
use super::header::Header;
use super::stream::OStream;
use crate::util::{Error, Result};

/// Position of the next value within the declared schema.
#[derive(Clone, Copy, Debug, Default)]
struct Cursor {
    element: usize,
    instance: usize,
    property: usize,
    /// Items still expected for the current list, once its length is written
    list_remaining: Option<usize>,
}

/// Writer for one PLY file.
///
/// Output goes to any [`Write`]; callers that target a file pass a
/// buffered handle and decide where the file finally lands.
pub struct PlyWriter<W: Write> {
    stream: OStream<W>,
    header: Header,
    header_len: Option<u64>,
    cursor: Cursor,
}

impl<W: Write> PlyWriter<W> {
    pub fn new(writer: W, encoding: Encoding) -> Self {
        Self {
            stream: OStream::new(writer, encoding),
            header: Header::new(encoding),
            header_len: None,
            cursor: Cursor::default(),
        }
    }

    #[inline]
    pub fn header(&self) -> &Header {
        &self.header
    }

    fn ensure_declaring(&self) -> Result<()> {
        if self.header_len.is_some() {
            return Err(Error::backend("header already written"));
        }
        Ok(())
    }

    pub fn add_comment(&mut self, text: &str) -> Result<()> {
        self.ensure_declaring()?;
        if text.contains(['\n', '\r']) {
            return Err(Error::backend("comment must be a single line"));
        }
        self.header.comments.push(text.to_string());
        Ok(())
    }

    /// Declare an element. Following properties attach to it.
    pub fn add_element(&mut self, name: &str, count: usize) -> Result<()> {
        self.ensure_declaring()?;
        if !is_valid_name(name) {
            return Err(Error::backend(format!("invalid element name '{name}'")));
        }
        if self.header.element_index(name).is_some() {
            return Err(Error::backend(format!("duplicate element '{name}'")));
        }
        self.header.elements.push(ElementDef::new(name, count));
        Ok(())
    }

    pub fn add_scalar_property(&mut self, name: &str, ty: ScalarType) -> Result<()> {
        self.add_property(name, PropertyType::Scalar(ty))
    }

    pub fn add_list_property(&mut self, name: &str, length: ScalarType, value: ScalarType) -> Result<()> {
        if !length.is_integer() {
            return Err(Error::backend(format!("list length type {length} is not an integer")));
        }
        self.add_property(name, PropertyType::List { length, value })
    }

    fn add_property(&mut self, name: &str, ty: PropertyType) -> Result<()> {
        self.ensure_declaring()?;
        if !is_valid_name(name) {
            return Err(Error::backend(format!("invalid property name '{name}'")));
        }
        let element = self
            .header
            .elements
            .last_mut()
            .ok_or_else(|| Error::backend("property declared before any element"))?;
        if element.property_index(name).is_some() {
            return Err(Error::backend(format!(
                "duplicate property '{name}' in element '{}'",
                element.name
            )));
        }
        element.properties.push(PropertyDef {
            name: name.to_string(),
            ty,
        });
        Ok(())
    }

    /// Emit the header. No declarations are accepted afterwards.
    pub fn write_header(&mut self) -> Result<u64> {
        self.ensure_declaring()?;
        let len = self.header.emit(self.stream.writer_mut())?;
        self.stream.advance(len);
        self.header_len = Some(len);
        self.skip_empty();
        debug!(
            elements = self.header.elements.len(),
            encoding = %self.header.encoding,
            bytes = len,
            "wrote header"
        );
        Ok(len)
    }

    /// Body bytes written so far.
    pub fn body_bytes(&self) -> u64 {
        self.stream.pos() - self.header_len.unwrap_or(self.stream.pos())
    }

    /// Move the cursor past elements that take no values.
    fn skip_empty(&mut self) {
        while let Some(element) = self.header.elements.get(self.cursor.element) {
            if element.count > 0 && !element.properties.is_empty() {
                break;
            }
            self.cursor.element += 1;
            self.cursor.instance = 0;
            self.cursor.property = 0;
        }
    }

    fn next_property(&mut self) -> Result<()> {
        self.cursor.property += 1;
        self.cursor.list_remaining = None;
        let element = &self.header.elements[self.cursor.element];
        if self.cursor.property == element.properties.len() {
            self.stream.end_instance()?;
            self.cursor.property = 0;
            self.cursor.instance += 1;
            if self.cursor.instance == element.count {
                self.cursor.instance = 0;
                self.cursor.element += 1;
                self.skip_empty();
            }
        }
        Ok(())
    }

    /// Write the next value of the body.
    pub fn write(&mut self, value: f64) -> Result<()> {
        if self.header_len.is_none() {
            return Err(Error::backend("write before header"));
        }
        let Some(element) = self.header.elements.get(self.cursor.element) else {
            return Err(Error::backend("more values written than declared"));
        };
        let property = &element.properties[self.cursor.property];

        match (property.ty, self.cursor.list_remaining) {
            (PropertyType::Scalar(ty), _) => {
                self.stream.write_scalar(ty, value)?;
                self.next_property()
            }
            (PropertyType::List { length, .. }, None) => {
                let fits = length.max_integer().is_some_and(|max| value <= max as f64);
                if value < 0.0 || value.fract() != 0.0 || !fits {
                    return Err(Error::backend(format!(
                        "list length {value} not representable as {length} in '{}.{}'",
                        element.name, property.name
                    )));
                }
                self.stream.write_scalar(length, value)?;
                if value == 0.0 {
                    self.next_property()
                } else {
                    self.cursor.list_remaining = Some(value as usize);
                    Ok(())
                }
            }
            (PropertyType::List { value: ty, .. }, Some(remaining)) => {
                self.stream.write_scalar(ty, value)?;
                if remaining == 1 {
                    self.next_property()
                } else {
                    self.cursor.list_remaining = Some(remaining - 1);
                    Ok(())
                }
            }
        }
    }

    /// Flush and close, returning the body size in bytes.
    ///
    /// Fails if fewer values were written than the header declares.
    pub fn close(mut self) -> Result<u64> {
        if self.header_len.is_none() {
            return Err(Error::backend("closed before header was written"));
        }
        if let Some(element) = self.header.elements.get(self.cursor.element) {
            return Err(Error::backend(format!(
                "incomplete body: element '{}' stopped at instance {} of {}",
                element.name, self.cursor.instance, element.count
            )));
        }
        self.stream.flush()?;
        Ok(self.body_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ply::PlyReader;
    use std::fs::File;
    use std::io::{self, BufWriter};
    use tempfile::NamedTempFile;

    fn create(temp: &NamedTempFile, encoding: Encoding) -> Result<PlyWriter<BufWriter<File>>> {
        Ok(PlyWriter::new(BufWriter::new(temp.reopen()?), encoding))
    }

    /// Accepts `budget` bytes, then fails every write.
    struct FailingWriter {
        budget: usize,
    }

    impl Write for FailingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::other("disk full"));
            }
            let n = buf.len().min(self.budget);
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_and_read_back() -> Result<()> {
        for encoding in [Encoding::Ascii, Encoding::BinaryLittleEndian, Encoding::BinaryBigEndian] {
            let temp = NamedTempFile::new()?;
            let mut writer = create(&temp, encoding)?;
            writer.add_comment("hello")?;
            writer.add_element("empty", 0)?;
            writer.add_scalar_property("value", ScalarType::Float32)?;
            writer.add_element("lists", 2)?;
            writer.add_list_property("value", ScalarType::Uint8, ScalarType::Uint16)?;
            writer.write_header()?;
            for v in [2.0, 10.0, 20.0, 0.0] {
                writer.write(v)?;
            }
            let body = writer.close()?;
            if encoding.is_binary() {
                assert_eq!(body, 1 + 2 * 2 + 1);
            }

            let mut reader = PlyReader::open(temp.path())?;
            assert_eq!(reader.header().encoding, encoding);
            assert_eq!(reader.header().comments, vec!["hello".to_string()]);
            reader.set_read_cb("lists", "value", 0, 0)?;
            let mut values = Vec::new();
            reader.read(|arg| {
                values.push(arg.value);
                Ok(())
            })?;
            assert_eq!(values, vec![2.0, 10.0, 20.0, 0.0]);
        }
        Ok(())
    }

    #[test]
    fn test_rejects_bad_declarations() -> Result<()> {
        let temp = NamedTempFile::new()?;
        let mut writer = create(&temp, Encoding::BinaryLittleEndian)?;
        assert!(writer.add_scalar_property("value", ScalarType::Uint8).is_err());
        assert!(writer.add_element("has space", 1).is_err());
        writer.add_element("a", 1)?;
        assert!(writer.add_element("a", 1).is_err());
        assert!(writer
            .add_list_property("value", ScalarType::Float32, ScalarType::Uint8)
            .is_err());
        writer.add_scalar_property("value", ScalarType::Uint8)?;
        assert!(writer.add_scalar_property("value", ScalarType::Uint8).is_err());
        assert!(writer.add_comment("two\nlines").is_err());
        Ok(())
    }

    #[test]
    fn test_value_count_is_enforced() -> Result<()> {
        let temp = NamedTempFile::new()?;
        let mut writer = create(&temp, Encoding::BinaryLittleEndian)?;
        writer.add_element("a", 1)?;
        writer.add_list_property("value", ScalarType::Uint8, ScalarType::Uint8)?;
        assert!(writer.write(1.0).is_err());
        writer.write_header()?;
        assert!(writer.write(256.0).is_err());
        writer.write(1.0)?;
        writer.write(9.0)?;
        assert!(writer.write(1.0).is_err());
        assert_eq!(writer.close()?, 2);

        let temp = NamedTempFile::new()?;
        let mut writer = create(&temp, Encoding::BinaryLittleEndian)?;
        writer.add_element("a", 2)?;
        writer.add_scalar_property("value", ScalarType::Uint8)?;
        writer.write_header()?;
        writer.write(1.0)?;
        assert!(matches!(writer.close(), Err(Error::Backend(_))));
        Ok(())
    }

    #[test]
    fn test_write_error_surfaces() -> Result<()> {
        let mut writer = PlyWriter::new(FailingWriter { budget: 0 }, Encoding::Ascii);
        writer.add_element("a", 1)?;
        writer.add_scalar_property("value", ScalarType::Uint8)?;
        assert!(matches!(writer.write_header(), Err(Error::Io(_))));

        let mut writer = PlyWriter::new(FailingWriter { budget: 100 }, Encoding::BinaryLittleEndian);
        writer.add_element("a", 64)?;
        writer.add_scalar_property("value", ScalarType::Float64)?;
        writer.write_header()?;
        let result = (0..64).try_for_each(|i| writer.write(i as f64));
        assert!(matches!(result, Err(Error::Io(_))));
        Ok(())
    }
}
