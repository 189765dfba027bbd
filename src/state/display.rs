//! Human-readable dump of a store.

use std::fmt;

use super::store::VariantStore;
use super::variant::{dispatch, Payload};
use crate::util::Primitive;

/// Type tag and value summary of one entry.
fn describe<T: Primitive>(payload: &Payload<T>) -> (String, String) {
    let name = T::TYPE.name();
    match payload {
        Payload::Matrix(m) if m.len() == 1 => (name.to_string(), m.as_slice()[0].to_string()),
        Payload::Matrix(m) if m.cols() == 1 && m.rows() <= 4 => {
            let items: Vec<String> = m.as_slice().iter().map(T::to_string).collect();
            (format!("vec<{name}>"), format!("[{}]", items.join(", ")))
        }
        Payload::Matrix(m) => {
            let kind = if m.cols() == 1 { "vec" } else { "mat" };
            (
                format!("{kind}<{name}>"),
                format!("data[{}x{}]", m.rows(), m.cols()),
            )
        }
        Payload::List(l) => (format!("{name}**"), format!("data[{}][]", l.len())),
    }
}

impl fmt::Display for VariantStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VariantStore[")?;
        for (i, (key, variant)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            let (tname, value) = dispatch!(variant, p => describe(p));
            write!(f, "\n\t{tname} {key} = {value}")?;
        }
        write!(f, "\n]")
    }
}
