//! Text tree encoding

use crate::def::{Field, ParamDef};
use crate::error::DefError;

use super::{Node, TEXT_VERSION_CURRENT};

/// Encode a schema document into its text tree form.
///
/// `text_version` selects the element names used for the document scalars:
/// version 0 writes the legacy `Unk06`/`Version`, version 1 the current
/// `DataVersion`/`FormatVersion`. Optional field children are written only
/// when they differ from the storage kind's computed default, keeping the
/// tree minimal; [`super::decode_text`] reads absent children back through
/// the same default table.
///
/// # Errors
/// * [`DefError::UnsupportedFormat`] - unrecognized text version
pub fn encode_text(def: &ParamDef, text_version: u32) -> Result<Node, DefError> {
    if text_version > TEXT_VERSION_CURRENT {
        return Err(DefError::unsupported(format!(
            "unknown text version {text_version}"
        )));
    }
    let legacy = text_version == 0;

    let mut root = Node::new("PARAMDEF");
    root.set_attribute("XmlVersion", text_version.to_string());
    root.push(Node::with_text("ParamType", &def.param_type));
    root.push(Node::with_text(
        if legacy { "Unk06" } else { "DataVersion" },
        def.data_version.to_string(),
    ));
    root.push(Node::with_text("BigEndian", bool_text(def.big_endian)));
    root.push(Node::with_text("Unicode", bool_text(def.unicode)));
    root.push(Node::with_text(
        if legacy { "Version" } else { "FormatVersion" },
        def.format_version.to_string(),
    ));

    let mut fields = Node::new("Fields");
    for field in &def.fields {
        fields.push(write_field(field));
    }
    root.push(fields);

    Ok(root)
}

fn write_field(field: &Field) -> Node {
    let ty = field.display_type;

    let mut def = format!("{} {}", ty, field.internal_name);
    if ty.is_bit_type() && field.bit_size != -1 {
        def.push_str(&format!(":{}", field.bit_size));
    } else if ty.is_array_type() {
        def.push_str(&format!("[{}]", field.array_length));
    }
    if field.default != 0.0 {
        def.push_str(&format!(" = {}", field.default));
    }

    let mut node = Node::new("Field");
    node.set_attribute("Def", def);

    // Sparse defaulting: a child is written only when it differs from the
    // value the decoder would compute for this storage kind.
    if field.display_name != field.internal_name {
        node.push(Node::with_text("DisplayName", &field.display_name));
    }
    if field.internal_type != ty.name() {
        node.push(Node::with_text("Enum", &field.internal_type));
    }
    if let Some(description) = &field.description {
        node.push(Node::with_text("Description", description));
    }
    if field.display_format != ty.default_format() {
        node.push(Node::with_text("DisplayFormat", &field.display_format));
    }
    if field.edit_flags != ty.default_edit_flags() {
        node.push(Node::with_text("EditFlags", field.edit_flags.to_string()));
    }
    if field.minimum != ty.default_minimum() {
        node.push(Node::with_text("Minimum", field.minimum.to_string()));
    }
    if field.maximum != ty.default_maximum() {
        node.push(Node::with_text("Maximum", field.maximum.to_string()));
    }
    if field.increment != ty.default_increment() {
        node.push(Node::with_text("Increment", field.increment.to_string()));
    }
    if field.sort_id != 0 {
        node.push(Node::with_text("SortID", field.sort_id.to_string()));
    }

    node
}

fn bool_text(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}
