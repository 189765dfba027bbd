//! Low-level PLY element/property file format.
//!
//! This is the byte-level backend of the state store: it knows nothing
//! about variants, only about elements, properties and values.
//!
//! ## File Structure
//!
//! ```text
//! +---------------------------+
//! | ply                       |  text header, one declaration per line
//! | format <encoding> 1.0     |
//! | comment ...               |
//! | element <name> <count>    |
//! | property ...              |
//! | end_header                |
//! +---------------------------+
//! | body                      |  instances in element order, properties
//! |                           |  in declaration order
//! +---------------------------+
//! ```

mod format;
mod header;
mod stream;
mod reader;
mod writer;

pub use format::*;
pub use header::*;
pub use stream::*;
pub use reader::*;
pub use writer::*;
