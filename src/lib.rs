//! Paramdef: row schema codec for game param files
//!
//! A param file stores rows of fixed-size binary records; a paramdef is the
//! companion schema ("field list") that describes each field present in
//! those rows: name, primitive storage kind, display metadata, edit bounds,
//! optional bit-packing, optional fixed-length arrays, and an optional
//! free-text description.
//!
//! This crate decodes and encodes that schema in both of its forms:
//!
//! - **Binary** ([`decode_binary`] / [`encode_binary`]) - the compact form
//!   consumed by the runtime, across five historically accumulated layout
//!   versions (101, 102, 103, 104, 201) with different header sizes, field
//!   record sizes, endianness defaults and string encodings.
//! - **Text tree** ([`decode_text`] / [`encode_text`]) - the hierarchical,
//!   human-editable form used by tooling, mirrored losslessly with
//!   write-if-different sparse defaulting.
//!
//! [`compute_row_size`] derives the fixed byte size of one data row from a
//! schema, merging adjacent bit-packed fields into shared storage units,
//! and [`validate`] gates documents before encoding.
//!
//! All operations are synchronous, pure transformations; a decoded
//! [`ParamDef`] owns all of its fields and is safely shared read-only.
//!
//! # Usage
//!
//! ```ignore
//! use paramdef::{DefType, Field, ParamDef, decode_binary, encode_binary};
//!
//! let data = std::fs::read("NpcParam.paramdef")?;
//! let def = decode_binary(&data)?;
//! println!("{}: {} fields, {} bytes per row",
//!     def.param_type, def.fields.len(), def.row_size());
//!
//! let mut def = ParamDef::new("NPC_PARAM_ST");
//! def.fields.push(Field::new(DefType::S32, "hp"));
//! def.validate()?;
//! let bytes = encode_binary(&def)?;
//! ```

mod binary;
mod def;
mod error;
mod row_size;
mod text;
mod validate;

pub use binary::{decode_binary, encode_binary};
pub use def::{DefType, EditFlags, Field, ParamDef};
pub use error::DefError;
pub use row_size::compute_row_size;
pub use text::{Node, TEXT_VERSION_CURRENT, decode_text, encode_text};
pub use validate::validate;

/// Binary format versions the codec supports.
pub const FORMAT_VERSIONS: [i16; 5] = [101, 102, 103, 104, 201];
