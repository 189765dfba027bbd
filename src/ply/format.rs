//! PLY format constants and schema structures.

use std::fmt;

use crate::util::PrimitiveType;

/// First header line of every PLY file.
pub const PLY_MAGIC: &str = "ply";

/// Format version written to the `format` line.
pub const FORMAT_VERSION: &str = "1.0";

/// Header terminator line.
pub const END_HEADER: &str = "end_header";

/// Body encoding declared on the `format` line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Whitespace-separated text, one instance per line
    Ascii,
    /// Packed little-endian binary
    #[default]
    BinaryLittleEndian,
    /// Packed big-endian binary
    BinaryBigEndian,
}

impl Encoding {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::BinaryLittleEndian => "binary_little_endian",
            Self::BinaryBigEndian => "binary_big_endian",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ascii" => Some(Self::Ascii),
            "binary_little_endian" => Some(Self::BinaryLittleEndian),
            "binary_big_endian" => Some(Self::BinaryBigEndian),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_binary(self) -> bool {
        !matches!(self, Self::Ascii)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scalar type of a property value or list length.
///
/// The PLY grammar knows two spellings for every type; both are accepted
/// when reading and the sized spelling is written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
}

impl ScalarType {
    #[inline]
    pub const fn num_bytes(self) -> usize {
        match self {
            Self::Int8 | Self::Uint8 => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }

    /// Sized spelling, as written to headers.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Uint8 => "uint8",
            Self::Int16 => "int16",
            Self::Uint16 => "uint16",
            Self::Int32 => "int32",
            Self::Uint32 => "uint32",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }

    /// Parse either spelling.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int8" | "char" => Some(Self::Int8),
            "uint8" | "uchar" => Some(Self::Uint8),
            "int16" | "short" => Some(Self::Int16),
            "uint16" | "ushort" => Some(Self::Uint16),
            "int32" | "int" => Some(Self::Int32),
            "uint32" | "uint" => Some(Self::Uint32),
            "float32" | "float" => Some(Self::Float32),
            "float64" | "double" => Some(Self::Float64),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_integer(self) -> bool {
        !matches!(self, Self::Float32 | Self::Float64)
    }

    /// Largest value representable by an integer type.
    pub const fn max_integer(self) -> Option<u64> {
        match self {
            Self::Int8 => Some(i8::MAX as u64),
            Self::Uint8 => Some(u8::MAX as u64),
            Self::Int16 => Some(i16::MAX as u64),
            Self::Uint16 => Some(u16::MAX as u64),
            Self::Int32 => Some(i32::MAX as u64),
            Self::Uint32 => Some(u32::MAX as u64),
            Self::Float32 | Self::Float64 => None,
        }
    }

    /// Primitive type this scalar maps to, if the store supports it.
    pub const fn primitive(self) -> Option<PrimitiveType> {
        match self {
            Self::Uint8 => Some(PrimitiveType::Uint8),
            Self::Uint16 => Some(PrimitiveType::Uint16),
            Self::Uint32 => Some(PrimitiveType::Uint32),
            Self::Float32 => Some(PrimitiveType::Float32),
            Self::Float64 => Some(PrimitiveType::Float64),
            Self::Int8 | Self::Int16 | Self::Int32 => None,
        }
    }
}

impl From<PrimitiveType> for ScalarType {
    fn from(ty: PrimitiveType) -> Self {
        match ty {
            PrimitiveType::Uint8 => Self::Uint8,
            PrimitiveType::Uint16 => Self::Uint16,
            PrimitiveType::Uint32 => Self::Uint32,
            PrimitiveType::Float32 => Self::Float32,
            PrimitiveType::Float64 => Self::Float64,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Type of a declared property.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyType {
    /// One value per instance
    Scalar(ScalarType),
    /// Length prefix followed by that many values per instance
    List { length: ScalarType, value: ScalarType },
}

impl PropertyType {
    /// Type of the values (list items for list properties).
    #[inline]
    pub const fn value_type(self) -> ScalarType {
        match self {
            Self::Scalar(ty) => ty,
            Self::List { value, .. } => value,
        }
    }

    #[inline]
    pub const fn is_list(self) -> bool {
        matches!(self, Self::List { .. })
    }
}

/// A declared property of an element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyDef {
    pub name: String,
    pub ty: PropertyType,
}

/// A declared element: `count` instances, each carrying every property.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementDef {
    pub name: String,
    pub count: usize,
    pub properties: Vec<PropertyDef>,
}

impl ElementDef {
    pub fn new(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            count,
            properties: Vec::new(),
        }
    }

    /// Find a property index by name.
    pub fn property_index(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name == name)
    }

    /// Fewest body bytes `count` instances can occupy.
    ///
    /// Binary instances need every scalar plus every list length prefix;
    /// ascii instances need at least one character per property. `None`
    /// means the size does not fit in a `u64`.
    pub fn min_body_len(&self, encoding: Encoding) -> Option<u64> {
        let per_instance: u64 = if encoding.is_binary() {
            self.properties
                .iter()
                .map(|p| match p.ty {
                    PropertyType::Scalar(ty) => ty.num_bytes() as u64,
                    PropertyType::List { length, .. } => length.num_bytes() as u64,
                })
                .sum()
        } else {
            self.properties.len() as u64
        };
        u64::try_from(self.count).ok()?.checked_mul(per_instance)
    }
}

/// Smallest unsigned length-prefix type that can hold `max_len`.
///
/// Lengths below 256 fit `uint8`, below 65536 fit `uint16`, anything larger
/// uses `uint32`.
pub const fn length_type_for(max_len: usize) -> ScalarType {
    if max_len < 256 {
        ScalarType::Uint8
    } else if max_len < 65536 {
        ScalarType::Uint16
    } else {
        ScalarType::Uint32
    }
}

/// Check that a name can appear as a single header token.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_spellings() {
        assert_eq!(ScalarType::from_name("uchar"), Some(ScalarType::Uint8));
        assert_eq!(ScalarType::from_name("uint8"), Some(ScalarType::Uint8));
        assert_eq!(ScalarType::from_name("double"), Some(ScalarType::Float64));
        assert_eq!(ScalarType::from_name("list"), None);
        assert_eq!(ScalarType::Float32.name(), "float32");
    }

    #[test]
    fn test_length_type_thresholds() {
        assert_eq!(length_type_for(0), ScalarType::Uint8);
        assert_eq!(length_type_for(255), ScalarType::Uint8);
        assert_eq!(length_type_for(256), ScalarType::Uint16);
        assert_eq!(length_type_for(65535), ScalarType::Uint16);
        assert_eq!(length_type_for(65536), ScalarType::Uint32);
    }

    #[test]
    fn test_primitive_mapping() {
        for ty in PrimitiveType::ALL {
            assert_eq!(ScalarType::from(ty).primitive(), Some(ty));
        }
        assert_eq!(ScalarType::Int16.primitive(), None);
    }

    #[test]
    fn test_min_body_len() {
        let mut element = ElementDef::new("v", 10);
        element.properties.push(PropertyDef {
            name: "x".into(),
            ty: PropertyType::Scalar(ScalarType::Float32),
        });
        element.properties.push(PropertyDef {
            name: "idx".into(),
            ty: PropertyType::List {
                length: ScalarType::Uint16,
                value: ScalarType::Uint32,
            },
        });
        assert_eq!(element.min_body_len(Encoding::BinaryLittleEndian), Some(60));
        assert_eq!(element.min_body_len(Encoding::Ascii), Some(20));

        element.count = usize::MAX;
        assert_eq!(element.min_body_len(Encoding::BinaryBigEndian), None);

        element.properties.clear();
        assert_eq!(element.min_body_len(Encoding::BinaryLittleEndian), Some(0));
    }

    #[test]
    fn test_names() {
        assert!(is_valid_name("faceIndices"));
        assert!(is_valid_name("a.b.c"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("two words"));
        assert_eq!(Encoding::from_name("binary_big_endian"), Some(Encoding::BinaryBigEndian));
    }
}
