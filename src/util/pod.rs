//! Primitive element types - the storage types a variant can hold.

use bytemuck::{Pod, Zeroable};
use std::fmt;

/// Primitive element type of a stored dataset.
///
/// These are the only numeric types a variant can hold. Each type has a
/// fixed size and a well-defined binary representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PrimitiveType {
    /// Unsigned 8-bit integer
    Uint8 = 0,
    /// Unsigned 16-bit integer
    Uint16 = 1,
    /// Unsigned 32-bit integer
    Uint32 = 2,
    /// 32-bit floating point (IEEE 754 single precision)
    Float32 = 3,
    /// 64-bit floating point (IEEE 754 double precision)
    Float64 = 4,
}

impl PrimitiveType {
    /// All primitive types, in tag order.
    pub const ALL: [PrimitiveType; 5] = [
        Self::Uint8,
        Self::Uint16,
        Self::Uint32,
        Self::Float32,
        Self::Float64,
    ];

    /// Returns the size in bytes of a single element of this type.
    #[inline]
    pub const fn num_bytes(self) -> usize {
        match self {
            Self::Uint8 => 1,
            Self::Uint16 => 2,
            Self::Uint32 => 4,
            Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }

    /// Short name used in dumps and messages.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Uint8 => "u8",
            Self::Uint16 => "u16",
            Self::Uint32 => "u32",
            Self::Float32 => "f32",
            Self::Float64 => "f64",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Trait for Rust types that can be stored as dataset elements.
///
/// Values travel through the PLY layer as `f64`, which represents every
/// supported primitive exactly.
pub trait Primitive:
    Pod + Zeroable + Copy + Default + PartialEq + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// The corresponding PrimitiveType tag.
    const TYPE: PrimitiveType;

    /// Size of this type in bytes.
    const SIZE: usize = std::mem::size_of::<Self>();

    /// Convert from the transport representation.
    fn from_f64(value: f64) -> Self;

    /// Convert to the transport representation.
    fn to_f64(self) -> f64;
}

macro_rules! impl_primitive {
    ($ty:ty, $tag:ident) => {
        impl Primitive for $ty {
            const TYPE: PrimitiveType = PrimitiveType::$tag;

            #[inline]
            fn from_f64(value: f64) -> Self {
                value as $ty
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }
        }
    };
}

impl_primitive!(u8, Uint8);
impl_primitive!(u16, Uint16);
impl_primitive!(u32, Uint32);
impl_primitive!(f32, Float32);
impl_primitive!(f64, Float64);
