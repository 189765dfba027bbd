//! PLY header parsing and emission.
//!
//! ```text
//! ply
//! format binary_little_endian 1.0
//! comment <free text>
//! element <name> <count>
//! property <type> <name>
//! property list <length type> <value type> <name>
//! end_header
//! ```

use std::io::{BufRead, Write};

use super::format::*;
use crate::util::{Error, Result};

/// Parsed or declared PLY header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Header {
    pub encoding: Encoding,
    pub comments: Vec<String>,
    pub obj_info: Vec<String>,
    pub elements: Vec<ElementDef>,
}

impl Header {
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            ..Default::default()
        }
    }

    /// Find an element index by name.
    pub fn element_index(&self, name: &str) -> Option<usize> {
        self.elements.iter().position(|e| e.name == name)
    }

    /// Iterate over comments in file order.
    pub fn comments(&self) -> impl Iterator<Item = &str> {
        self.comments.iter().map(String::as_str)
    }

    /// Parse a header, returning it with the number of bytes consumed.
    ///
    /// The reader is left positioned at the first body byte.
    pub fn parse<R: BufRead>(reader: &mut R) -> Result<(Self, u64)> {
        let mut consumed = 0u64;
        let mut line = Vec::new();

        let mut next_line = |reader: &mut R, consumed: &mut u64| -> Result<Option<String>> {
            line.clear();
            let n = reader.read_until(b'\n', &mut line)?;
            if n == 0 {
                return Ok(None);
            }
            *consumed += n as u64;
            let text = std::str::from_utf8(&line)
                .map_err(|_| Error::header("header is not valid text"))?;
            Ok(Some(text.trim_end_matches(['\n', '\r']).to_string()))
        };

        match next_line(reader, &mut consumed)? {
            Some(first) if first.trim() == PLY_MAGIC => {}
            _ => return Err(Error::header("missing 'ply' magic")),
        }

        let mut header = Header::default();
        let mut saw_format = false;

        loop {
            let Some(text) = next_line(reader, &mut consumed)? else {
                return Err(Error::header("missing end_header"));
            };
            let trimmed = text.trim_start();
            let (keyword, rest) = match trimmed.split_once(char::is_whitespace) {
                Some((k, r)) => (k, r),
                None => (trimmed, ""),
            };

            match keyword {
                "" => continue,
                "format" => {
                    let mut words = rest.split_whitespace();
                    let encoding = words
                        .next()
                        .and_then(Encoding::from_name)
                        .ok_or_else(|| Error::header(format!("unknown format line '{text}'")))?;
                    if words.next() != Some(FORMAT_VERSION) {
                        return Err(Error::header(format!("unsupported version in '{text}'")));
                    }
                    header.encoding = encoding;
                    saw_format = true;
                }
                "comment" => header.comments.push(strip_separator(rest)),
                "obj_info" => header.obj_info.push(strip_separator(rest)),
                "element" => header.elements.push(parse_element(rest)?),
                "property" => {
                    let element = header.elements.last_mut().ok_or_else(|| {
                        Error::header("property declared before any element")
                    })?;
                    let property = parse_property(rest)?;
                    if element.property_index(&property.name).is_some() {
                        return Err(Error::header(format!(
                            "duplicate property '{}' in element '{}'",
                            property.name, element.name
                        )));
                    }
                    element.properties.push(property);
                }
                END_HEADER => break,
                other => {
                    return Err(Error::header(format!("unexpected keyword '{other}'")));
                }
            }
        }

        if !saw_format {
            return Err(Error::header("missing format line"));
        }

        Ok((header, consumed))
    }

    /// Write the header, returning the number of bytes written.
    pub fn emit<W: Write>(&self, writer: &mut W) -> Result<u64> {
        let mut text = String::new();
        text.push_str(PLY_MAGIC);
        text.push('\n');
        text.push_str(&format!("format {} {}\n", self.encoding, FORMAT_VERSION));
        for comment in &self.comments {
            text.push_str(&format!("comment {comment}\n"));
        }
        for info in &self.obj_info {
            text.push_str(&format!("obj_info {info}\n"));
        }
        for element in &self.elements {
            text.push_str(&format!("element {} {}\n", element.name, element.count));
            for property in &element.properties {
                match property.ty {
                    PropertyType::Scalar(ty) => {
                        text.push_str(&format!("property {} {}\n", ty, property.name));
                    }
                    PropertyType::List { length, value } => {
                        text.push_str(&format!(
                            "property list {} {} {}\n",
                            length, value, property.name
                        ));
                    }
                }
            }
        }
        text.push_str(END_HEADER);
        text.push('\n');

        writer.write_all(text.as_bytes())?;
        Ok(text.len() as u64)
    }
}

/// Drop the single space separating a keyword from free text.
fn strip_separator(rest: &str) -> String {
    rest.strip_prefix([' ', '\t']).unwrap_or(rest).to_string()
}

fn parse_element(rest: &str) -> Result<ElementDef> {
    let words: Vec<&str> = rest.split_whitespace().collect();
    let [name, count] = words[..] else {
        return Err(Error::header(format!("malformed element line 'element {rest}'")));
    };
    let count = count
        .parse::<usize>()
        .map_err(|_| Error::header(format!("invalid count for element '{name}'")))?;
    Ok(ElementDef::new(name, count))
}

fn parse_property(rest: &str) -> Result<PropertyDef> {
    let words: Vec<&str> = rest.split_whitespace().collect();
    let scalar = |name: &str| {
        ScalarType::from_name(name)
            .ok_or_else(|| Error::header(format!("unknown property type '{name}'")))
    };

    match words[..] {
        ["list", length, value, name] => {
            let length = scalar(length)?;
            if !length.is_integer() {
                return Err(Error::header(format!(
                    "list length of '{name}' must be an integer type"
                )));
            }
            Ok(PropertyDef {
                name: name.to_string(),
                ty: PropertyType::List {
                    length,
                    value: scalar(value)?,
                },
            })
        }
        [ty, name] => Ok(PropertyDef {
            name: name.to_string(),
            ty: PropertyType::Scalar(scalar(ty)?),
        }),
        _ => Err(Error::header(format!("malformed property line 'property {rest}'"))),
    }
}
