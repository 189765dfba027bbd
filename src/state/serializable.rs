//! Typed values that can be stored in a [`VariantStore`](super::VariantStore).

use glam::{DVec3, Vec2, Vec3, Vec4};

use super::variant::{Payload, Variant, VariantElement};
use crate::util::{Error, Matrix, Result};

/// Conversion between an application value and a [`Variant`].
pub trait Serializable: Sized {
    fn to_variant(&self) -> Variant;

    /// Rebuild a value. `key` is only used for error context.
    fn from_variant(key: &str, variant: &Variant) -> Result<Self>;
}

fn shape_error(key: &str, expected: &str, m: (usize, usize)) -> Error {
    Error::ShapeMismatch {
        key: key.to_string(),
        expected: expected.to_string(),
        actual: format!("{}x{}", m.0, m.1),
    }
}

/// Scalars are 1x1 matrices.
macro_rules! impl_scalar {
    ($($ty:ty),*) => {$(
        impl Serializable for $ty {
            fn to_variant(&self) -> Variant {
                Matrix::column_vector(&[*self]).into()
            }

            fn from_variant(key: &str, variant: &Variant) -> Result<Self> {
                let m = variant.as_matrix::<$ty>()?;
                match m.shape() {
                    (1, 1) => Ok(m.as_slice()[0]),
                    shape => Err(shape_error(key, "1x1", shape)),
                }
            }
        }
    )*};
}

impl_scalar!(u8, u16, u32, f32, f64);

impl Serializable for bool {
    fn to_variant(&self) -> Variant {
        (*self as u8).to_variant()
    }

    fn from_variant(key: &str, variant: &Variant) -> Result<Self> {
        u8::from_variant(key, variant).map(|v| v != 0)
    }
}

impl<T: VariantElement> Serializable for Matrix<T> {
    fn to_variant(&self) -> Variant {
        self.clone().into()
    }

    fn from_variant(_key: &str, variant: &Variant) -> Result<Self> {
        variant.as_matrix::<T>().cloned()
    }
}

/// Flat vectors are `1 x len` row matrices: one entity per element.
impl<T: VariantElement> Serializable for Vec<T> {
    fn to_variant(&self) -> Variant {
        Matrix::row_vector(self).into()
    }

    fn from_variant(key: &str, variant: &Variant) -> Result<Self> {
        let m = variant.as_matrix::<T>()?;
        if m.rows() != 1 {
            return Err(shape_error(key, "1xN", m.shape()));
        }
        Ok(m.as_slice().to_vec())
    }
}

impl<T: VariantElement> Serializable for Vec<Vec<T>> {
    fn to_variant(&self) -> Variant {
        T::wrap(Payload::List(self.clone()))
    }

    fn from_variant(_key: &str, variant: &Variant) -> Result<Self> {
        variant.as_list::<T>().cloned()
    }
}

/// Fixed-size vectors are column vectors.
macro_rules! impl_glam {
    ($ty:ty, $elem:ty, $n:literal, $shape:literal) => {
        impl Serializable for $ty {
            fn to_variant(&self) -> Variant {
                Matrix::column_vector(&self.to_array()).into()
            }

            fn from_variant(key: &str, variant: &Variant) -> Result<Self> {
                let m = variant.as_matrix::<$elem>()?;
                if m.shape() != ($n, 1) {
                    return Err(shape_error(key, $shape, m.shape()));
                }
                let mut values = [<$elem>::default(); $n];
                values.copy_from_slice(m.as_slice());
                Ok(<$ty>::from_array(values))
            }
        }
    };
}

impl_glam!(Vec2, f32, 2, "2x1");
impl_glam!(Vec3, f32, 3, "3x1");
impl_glam!(Vec4, f32, 4, "4x1");
impl_glam!(DVec3, f64, 3, "3x1");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::VariantStore;

    #[test]
    fn test_scalar_values() -> Result<()> {
        let mut store = VariantStore::new();
        store.set("scale", &1.5f32);
        store.set("iterations", &6u32);
        store.set("enabled", &true);

        assert_eq!(store.get::<f32>("scale")?, 1.5);
        assert_eq!(store.get::<u32>("iterations")?, 6);
        assert!(store.get::<bool>("enabled")?);
        assert!(matches!(
            store.get::<f64>("scale"),
            Err(Error::TypeMismatch { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_vectors_and_lists() -> Result<()> {
        let mut store = VariantStore::new();
        store.set("center", &Vec3::new(1.0, 2.0, 3.0));
        store.set("origin", &DVec3::new(0.5, 0.25, 0.0));
        store.set("weights", &vec![1.0f64, 2.0, 3.0, 4.0, 5.0]);
        store.set("faces", &vec![vec![0u32, 1, 2], vec![2, 3, 0, 1]]);

        assert_eq!(store.get::<Vec3>("center")?, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(store.get::<DVec3>("origin")?, DVec3::new(0.5, 0.25, 0.0));
        assert_eq!(store.get::<Vec<f64>>("weights")?.len(), 5);
        assert_eq!(store.get::<Vec<Vec<u32>>>("faces")?[1], vec![2, 3, 0, 1]);

        let center = store.get_variant("center").map(Variant::type_id);
        assert_eq!(center.map(|t| t.to_string()), Some("f32 matrix".to_string()));
        Ok(())
    }

    #[test]
    fn test_shape_mismatch() {
        let mut store = VariantStore::new();
        store.set("center", &Vec3::ZERO);
        assert!(matches!(
            store.get::<Vec4>("center"),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(matches!(
            store.get::<f32>("center"),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(matches!(
            store.get::<Vec<f32>>("center"),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
