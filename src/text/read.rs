//! Text tree decoding

use crate::def::{DefType, EditFlags, Field, ParamDef};
use crate::error::DefError;

use super::Node;

/// Decode a schema document from its text tree form.
///
/// Accepts both text versions transparently: the document scalars may use
/// the current element names (`DataVersion`, `FormatVersion`) or the legacy
/// ones (`Unk06`, `Version`). Optional field children absent from the tree
/// are filled from the storage kind's default table.
///
/// # Errors
/// * [`DefError::CorruptSchema`] - missing or malformed elements, unknown
///   type names, a suffix on a kind that does not support it
pub fn decode_text(root: &Node) -> Result<ParamDef, DefError> {
    if root.name != "PARAMDEF" {
        return Err(DefError::corrupt(format!(
            "unexpected root element {:?}",
            root.name
        )));
    }

    let param_type = required_text(root, "ParamType")?.to_string();
    let data_version = scalar(root, &["DataVersion", "Unk06"])?;
    let big_endian = parse_bool(root, "BigEndian")?;
    let unicode = parse_bool(root, "Unicode")?;
    let format_version = scalar(root, &["FormatVersion", "Version"])?;

    let mut fields = Vec::new();
    if let Some(list) = root.child("Fields") {
        for node in list.children_named("Field") {
            fields.push(read_field(node)?);
        }
    }

    Ok(ParamDef {
        data_version,
        param_type,
        big_endian,
        unicode,
        format_version,
        fields,
    })
}

fn read_field(node: &Node) -> Result<Field, DefError> {
    let def = node
        .attribute("Def")
        .ok_or_else(|| DefError::corrupt("field is missing its Def attribute"))?;
    let (display_type, internal_name, bit_size, array_length, default) = parse_def(def)?;

    let display_name = node
        .child_text("DisplayName")
        .unwrap_or(&internal_name)
        .to_string();
    let internal_type = node
        .child_text("Enum")
        .unwrap_or(display_type.name())
        .to_string();
    let description = node.child_text("Description").map(str::to_string);
    let display_format = node
        .child_text("DisplayFormat")
        .unwrap_or(display_type.default_format())
        .to_string();
    let edit_flags = match node.child_text("EditFlags") {
        Some(text) => EditFlags::from_text(text)
            .ok_or_else(|| DefError::corrupt(format!("unknown edit flags {text:?}")))?,
        None => display_type.default_edit_flags(),
    };
    let minimum = float_or(node, "Minimum", display_type.default_minimum())?;
    let maximum = float_or(node, "Maximum", display_type.default_maximum())?;
    let increment = float_or(node, "Increment", display_type.default_increment())?;
    let sort_id = match node.child_text("SortID") {
        Some(text) => text
            .trim()
            .parse()
            .map_err(|_| DefError::corrupt(format!("invalid SortID {text:?}")))?,
        None => 0,
    };

    Ok(Field {
        display_name,
        display_type,
        display_format,
        default,
        minimum,
        maximum,
        increment,
        edit_flags,
        array_length,
        description,
        internal_type,
        internal_name,
        bit_size,
        sort_id,
    })
}

/// Parse the composite definition attribute:
/// `<type> <name>[ : <bits> | [ <length> ] ][ = <default>]`.
fn parse_def(def: &str) -> Result<(DefType, String, i32, i32, f32), DefError> {
    let def = def.trim();
    let (type_name, rest) = def
        .split_once(char::is_whitespace)
        .ok_or_else(|| DefError::corrupt(format!("malformed field definition {def:?}")))?;
    let display_type = DefType::from_name(type_name)
        .ok_or_else(|| DefError::corrupt(format!("unknown field type {type_name:?}")))?;

    let (mut name, default) = match rest.split_once('=') {
        Some((name, default)) => {
            let default = default.trim();
            let default: f32 = default
                .parse()
                .map_err(|_| DefError::corrupt(format!("invalid default value {default:?}")))?;
            (name.trim(), default)
        }
        None => (rest.trim(), 0.0),
    };

    let mut bit_size = -1;
    let mut array_length = 1;
    if let Some((base, bits)) = split_suffix(name, ':', None) {
        if !display_type.is_bit_type() {
            return Err(DefError::corrupt(format!(
                "bitfield suffix on non-bit type {display_type} in {name:?}"
            )));
        }
        name = base;
        bit_size = bits;
    } else if let Some((base, length)) = split_suffix(name, '[', Some(']')) {
        if !display_type.is_array_type() {
            return Err(DefError::corrupt(format!(
                "array suffix on non-array type {display_type} in {name:?}"
            )));
        }
        name = base;
        array_length = length;
    }

    if name.is_empty() {
        return Err(DefError::corrupt(format!("malformed field definition {def:?}")));
    }
    Ok((display_type, name.to_string(), bit_size, array_length, default))
}

/// Split a trailing `<open><digits>` or `<open><digits><close>` suffix.
fn split_suffix(name: &str, open: char, close: Option<char>) -> Option<(&str, i32)> {
    let name = match close {
        Some(close) => name.strip_suffix(close)?,
        None => name,
    };
    let (base, digits) = name.rsplit_once(open)?;
    let base = base.trim_end();
    let digits = digits.trim();
    if base.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((base, digits.parse().ok()?))
}

fn required_text<'a>(root: &'a Node, name: &str) -> Result<&'a str, DefError> {
    root.child_text(name)
        .ok_or_else(|| DefError::corrupt(format!("missing {name} element")))
}

/// Read a 16-bit scalar stored under the first present of `names`
/// (current name first, legacy name second).
fn scalar(root: &Node, names: &[&str]) -> Result<i16, DefError> {
    for name in names {
        if let Some(text) = root.child_text(name) {
            return text
                .trim()
                .parse()
                .map_err(|_| DefError::corrupt(format!("invalid {name} value {text:?}")));
        }
    }
    Err(DefError::corrupt(format!("missing {} element", names[0])))
}

fn parse_bool(root: &Node, name: &str) -> Result<bool, DefError> {
    let text = required_text(root, name)?;
    if text.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if text.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(DefError::corrupt(format!("invalid {name} value {text:?}")))
    }
}

fn float_or(node: &Node, name: &str, default: f32) -> Result<f32, DefError> {
    match node.child_text(name) {
        Some(text) => text
            .trim()
            .parse()
            .map_err(|_| DefError::corrupt(format!("invalid {name} value {text:?}"))),
        None => Ok(default),
    }
}
