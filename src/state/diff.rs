//! Structural and value comparison of two stores.

use std::collections::BTreeSet;

use super::store::VariantStore;
use super::variant::{Payload, Variant, VariantElement};

/// Compare two stores, printing each difference to stdout.
///
/// Returns true if any difference was found. Every key is visited; the
/// comparison does not stop at the first mismatch.
pub fn diff(a: &VariantStore, b: &VariantStore) -> bool {
    diff_with(a, b, &mut |msg: &str| println!("{msg}"))
}

/// Compare two stores, sending each difference message to `report`.
pub fn diff_with(a: &VariantStore, b: &VariantStore, report: &mut dyn FnMut(&str)) -> bool {
    let keys: BTreeSet<&str> = a
        .entries()
        .keys()
        .chain(b.entries().keys())
        .map(String::as_str)
        .collect();

    let mut differs = false;
    for key in keys {
        let message = match (a.entries().get(key), b.entries().get(key)) {
            (None, _) => format!("Element {key} does not exist in store 1."),
            (_, None) => format!("Element {key} does not exist in store 2."),
            (Some(v1), Some(v2)) if v1.type_id() != v2.type_id() => {
                format!("Element {key} has different types.")
            }
            (Some(v1), Some(v2)) if !same_values(v1, v2) => format!("Element {key} differs."),
            _ => continue,
        };
        report(&message);
        differs = true;
    }
    differs
}

/// Equality of two variants of the same type. Values compare by bit
/// pattern so a NaN written and read back is unchanged.
fn same_values(v1: &Variant, v2: &Variant) -> bool {
    fn compare<T: VariantElement>(p1: &Payload<T>, p2: &Payload<T>) -> bool {
        match (p1, p2) {
            (Payload::Matrix(m1), Payload::Matrix(m2)) => {
                m1.shape() == m2.shape() && m1.as_bytes() == m2.as_bytes()
            }
            (Payload::List(l1), Payload::List(l2)) => {
                l1.len() == l2.len() && l1.iter().zip(l2).all(|(x, y)| bits(x) == bits(y))
            }
            _ => false,
        }
    }

    fn bits<T: VariantElement>(values: &[T]) -> &[u8] {
        bytemuck::cast_slice(values)
    }

    match (v1, v2) {
        (Variant::U8(p1), Variant::U8(p2)) => compare(p1, p2),
        (Variant::U16(p1), Variant::U16(p2)) => compare(p1, p2),
        (Variant::U32(p1), Variant::U32(p2)) => compare(p1, p2),
        (Variant::F32(p1), Variant::F32(p2)) => compare(p1, p2),
        (Variant::F64(p1), Variant::F64(p2)) => compare(p1, p2),
        _ => false,
    }
}

impl VariantStore {
    /// See [`diff`].
    pub fn diff(&self, other: &VariantStore) -> bool {
        diff(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Matrix;

    fn messages(a: &VariantStore, b: &VariantStore) -> (bool, Vec<String>) {
        let mut out = Vec::new();
        let differs = diff_with(a, b, &mut |m: &str| out.push(m.to_string()));
        (differs, out)
    }

    #[test]
    fn test_reports_every_difference() {
        let mut a = VariantStore::new();
        let mut b = VariantStore::new();
        a.set("only_a", &1u8);
        b.set("only_b", &1u8);
        a.set("kind", &1u16);
        b.set("kind", &1u32);
        a.set("shape", &vec![1.0f32, 2.0]);
        b.set("shape", &vec![1.0f32, 2.0, 3.0]);
        a.set("value", &vec![vec![1u32, 2], vec![3]]);
        b.set("value", &vec![vec![1u32, 2], vec![4]]);
        a.set("same", &0.5f64);
        b.set("same", &0.5f64);

        let (differs, out) = messages(&a, &b);
        assert!(differs);
        assert_eq!(
            out,
            vec![
                "Element kind has different types.",
                "Element only_a does not exist in store 2.",
                "Element only_b does not exist in store 1.",
                "Element shape differs.",
                "Element value differs.",
            ]
        );
    }

    #[test]
    fn test_symmetric_result() {
        let mut a = VariantStore::new();
        let mut b = VariantStore::new();
        a.insert("m", Matrix::<u8>::zeros(2, 3).unwrap());
        b.insert("m", Matrix::<u8>::zeros(3, 2).unwrap());
        assert_eq!(messages(&a, &b).0, messages(&b, &a).0);
        assert!(messages(&a, &b).0);

        let c = a.clone();
        assert!(!messages(&a, &c).0);
        assert!(messages(&a, &c).1.is_empty());
    }

    #[test]
    fn test_nan_equals_itself() {
        let mut a = VariantStore::new();
        a.set("nan", &f32::NAN);
        let b = a.clone();
        assert!(!a.diff(&b));
    }

    #[test]
    fn test_inner_list_lengths() {
        let mut a = VariantStore::new();
        let mut b = VariantStore::new();
        a.set("l", &vec![vec![1u8, 2], vec![]]);
        b.set("l", &vec![vec![1u8], vec![2]]);
        assert!(messages(&a, &b).0);
    }
}
