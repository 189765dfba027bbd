//! Variant - the typed payload stored under one key.
//!
//! A variant is a dense matrix or a list of per-entity value lists, over
//! one of the five [`PrimitiveType`]s. The primitive is carried by the enum
//! tag and the shape by [`Payload`], so every combination is matched
//! exhaustively and code that works on values is written once, generic over
//! [`VariantElement`].

use std::fmt;

use crate::ply::{length_type_for, ListCursor, ScalarType};
use crate::util::{Error, Matrix, Primitive, PrimitiveType, Result};

/// Items reserved up front for one decoded inner list.
const LIST_RESERVE_LIMIT: usize = 4096;

/// Storage shape of a variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Dense `rows x cols` matrix
    Matrix,
    /// One variable-length list per entity
    List,
}

/// Primitive type plus shape: the full type tag of a variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VariantType {
    pub primitive: PrimitiveType,
    pub shape: Shape,
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.shape {
            Shape::Matrix => write!(f, "{} matrix", self.primitive),
            Shape::List => write!(f, "{} list", self.primitive),
        }
    }
}

/// Payload of one primitive type.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload<T> {
    Matrix(Matrix<T>),
    List(Vec<Vec<T>>),
}

impl<T: Primitive> Payload<T> {
    #[inline]
    pub fn shape(&self) -> Shape {
        match self {
            Self::Matrix(_) => Shape::Matrix,
            Self::List(_) => Shape::List,
        }
    }

    /// Number of entities: matrix columns or outer list length.
    pub fn instances(&self) -> usize {
        match self {
            Self::Matrix(m) => m.cols(),
            Self::List(l) => l.len(),
        }
    }

    /// Longest inner list, 0 for matrices.
    pub fn max_list_len(&self) -> usize {
        match self {
            Self::Matrix(_) => 0,
            Self::List(l) => l.iter().map(Vec::len).max().unwrap_or(0),
        }
    }

    /// Length-prefix type used when this list is encoded.
    pub fn list_length_type(&self) -> Option<ScalarType> {
        match self {
            Self::Matrix(_) => None,
            Self::List(_) => Some(length_type_for(self.max_list_len())),
        }
    }

    /// Bytes this payload occupies in a binary body.
    pub fn byte_size(&self) -> usize {
        match self {
            Self::Matrix(m) => m.len() * T::SIZE,
            Self::List(l) => {
                let prefix = length_type_for(self.max_list_len()).num_bytes();
                l.iter().map(|inner| inner.len() * T::SIZE + prefix).sum()
            }
        }
    }

    /// Store one decoded value at a matrix cell or list slot.
    pub(crate) fn store_value(
        &mut self,
        row: usize,
        instance: usize,
        list: Option<ListCursor>,
        value: f64,
    ) -> Result<()> {
        match (self, list) {
            (Self::Matrix(m), None) => {
                if !m.set(row, instance, T::from_f64(value)) {
                    return Err(Error::backend(format!(
                        "cell ({row}, {instance}) outside {}x{} matrix",
                        m.rows(),
                        m.cols()
                    )));
                }
            }
            (Self::List(l), Some(cursor)) => {
                let slot = l
                    .get_mut(instance)
                    .ok_or_else(|| Error::backend(format!("list instance {instance} out of range")))?;
                match cursor.index {
                    // The declared length is untrusted; items grow the slot as they arrive.
                    None => {
                        slot.clear();
                        slot.try_reserve(cursor.length.min(LIST_RESERVE_LIMIT))
                            .map_err(|e| Error::backend(format!("list instance {instance}: {e}")))?;
                    }
                    Some(i) if i == slot.len() && i < cursor.length => {
                        slot.push(T::from_f64(value));
                    }
                    Some(i) => {
                        return Err(Error::backend(format!(
                            "list item {i} out of order (have {} of {})",
                            slot.len(),
                            cursor.length
                        )));
                    }
                }
            }
            (payload, _) => {
                return Err(Error::backend(format!(
                    "{} value delivered to a {:?} payload",
                    if list.is_some() { "list" } else { "scalar" },
                    payload.shape()
                )));
            }
        }
        Ok(())
    }
}

/// Typed value stored under one key.
#[derive(Clone, Debug, PartialEq)]
pub enum Variant {
    U8(Payload<u8>),
    U16(Payload<u16>),
    U32(Payload<u32>),
    F32(Payload<f32>),
    F64(Payload<f64>),
}

/// Run `$body` with `$payload` bound to the typed payload of `$variant`.
macro_rules! dispatch {
    ($variant:expr, $payload:ident => $body:expr) => {
        match $variant {
            $crate::state::Variant::U8($payload) => $body,
            $crate::state::Variant::U16($payload) => $body,
            $crate::state::Variant::U32($payload) => $body,
            $crate::state::Variant::F32($payload) => $body,
            $crate::state::Variant::F64($payload) => $body,
        }
    };
}
pub(crate) use dispatch;

/// Primitive types that map to a [`Variant`] arm.
pub trait VariantElement: Primitive {
    fn wrap(payload: Payload<Self>) -> Variant;
    fn payload(variant: &Variant) -> Option<&Payload<Self>>;
    fn payload_mut(variant: &mut Variant) -> Option<&mut Payload<Self>>;
}

macro_rules! impl_variant_element {
    ($ty:ty, $arm:ident) => {
        impl VariantElement for $ty {
            #[inline]
            fn wrap(payload: Payload<Self>) -> Variant {
                Variant::$arm(payload)
            }

            #[inline]
            fn payload(variant: &Variant) -> Option<&Payload<Self>> {
                match variant {
                    Variant::$arm(p) => Some(p),
                    _ => None,
                }
            }

            #[inline]
            fn payload_mut(variant: &mut Variant) -> Option<&mut Payload<Self>> {
                match variant {
                    Variant::$arm(p) => Some(p),
                    _ => None,
                }
            }
        }
    };
}

impl_variant_element!(u8, U8);
impl_variant_element!(u16, U16);
impl_variant_element!(u32, U32);
impl_variant_element!(f32, F32);
impl_variant_element!(f64, F64);

impl Variant {
    /// Zero-filled matrix of the given type and shape.
    pub fn matrix(ty: PrimitiveType, rows: usize, cols: usize) -> Result<Self> {
        fn make<T: VariantElement>(rows: usize, cols: usize) -> Result<Variant> {
            Ok(T::wrap(Payload::Matrix(Matrix::zeros(rows, cols)?)))
        }
        match ty {
            PrimitiveType::Uint8 => make::<u8>(rows, cols),
            PrimitiveType::Uint16 => make::<u16>(rows, cols),
            PrimitiveType::Uint32 => make::<u32>(rows, cols),
            PrimitiveType::Float32 => make::<f32>(rows, cols),
            PrimitiveType::Float64 => make::<f64>(rows, cols),
        }
    }

    /// List of `count` empty inner lists.
    pub fn list(ty: PrimitiveType, count: usize) -> Result<Self> {
        fn make<T: VariantElement>(count: usize) -> Result<Variant> {
            let mut lists = Vec::new();
            lists
                .try_reserve_exact(count)
                .map_err(|_| Error::backend(format!("list of {count} entries is too large")))?;
            lists.resize_with(count, Vec::new);
            Ok(T::wrap(Payload::List(lists)))
        }
        match ty {
            PrimitiveType::Uint8 => make::<u8>(count),
            PrimitiveType::Uint16 => make::<u16>(count),
            PrimitiveType::Uint32 => make::<u32>(count),
            PrimitiveType::Float32 => make::<f32>(count),
            PrimitiveType::Float64 => make::<f64>(count),
        }
    }

    pub fn primitive(&self) -> PrimitiveType {
        match self {
            Self::U8(_) => PrimitiveType::Uint8,
            Self::U16(_) => PrimitiveType::Uint16,
            Self::U32(_) => PrimitiveType::Uint32,
            Self::F32(_) => PrimitiveType::Float32,
            Self::F64(_) => PrimitiveType::Float64,
        }
    }

    pub fn shape(&self) -> Shape {
        dispatch!(self, p => p.shape())
    }

    /// Full type tag.
    pub fn type_id(&self) -> VariantType {
        VariantType {
            primitive: self.primitive(),
            shape: self.shape(),
        }
    }

    /// Number of entities: matrix columns or outer list length.
    pub fn instances(&self) -> usize {
        dispatch!(self, p => p.instances())
    }

    /// Bytes this variant occupies in a binary body.
    pub fn byte_size(&self) -> usize {
        dispatch!(self, p => p.byte_size())
    }

    /// Length-prefix type the encoder picks for a list variant.
    pub fn list_length_type(&self) -> Option<ScalarType> {
        dispatch!(self, p => p.list_length_type())
    }

    pub fn as_matrix<T: VariantElement>(&self) -> Result<&Matrix<T>> {
        match T::payload(self) {
            Some(Payload::Matrix(m)) => Ok(m),
            _ => Err(mismatch::<T>(Shape::Matrix, self.type_id())),
        }
    }

    pub fn as_matrix_mut<T: VariantElement>(&mut self) -> Result<&mut Matrix<T>> {
        let actual = self.type_id();
        match T::payload_mut(self) {
            Some(Payload::Matrix(m)) => Ok(m),
            _ => Err(mismatch::<T>(Shape::Matrix, actual)),
        }
    }

    pub fn as_list<T: VariantElement>(&self) -> Result<&Vec<Vec<T>>> {
        match T::payload(self) {
            Some(Payload::List(l)) => Ok(l),
            _ => Err(mismatch::<T>(Shape::List, self.type_id())),
        }
    }

    pub fn as_list_mut<T: VariantElement>(&mut self) -> Result<&mut Vec<Vec<T>>> {
        let actual = self.type_id();
        match T::payload_mut(self) {
            Some(Payload::List(l)) => Ok(l),
            _ => Err(mismatch::<T>(Shape::List, actual)),
        }
    }
}

fn mismatch<T: Primitive>(shape: Shape, actual: VariantType) -> Error {
    Error::TypeMismatch {
        expected: VariantType {
            primitive: T::TYPE,
            shape,
        }
        .to_string(),
        actual: actual.to_string(),
    }
}

impl<T: VariantElement> From<Matrix<T>> for Variant {
    fn from(m: Matrix<T>) -> Self {
        T::wrap(Payload::Matrix(m))
    }
}

impl<T: VariantElement> From<Vec<Vec<T>>> for Variant {
    fn from(l: Vec<Vec<T>>) -> Self {
        T::wrap(Payload::List(l))
    }
}
