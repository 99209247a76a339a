//! Schema document and field descriptor types
//!
//! A [`ParamDef`] describes the fixed-size layout of one row type: an ordered
//! list of [`Field`]s plus document-level flags. Field order is
//! layout-significant — the row data codec strides over rows in exactly this
//! order, and adjacent bit-packed fields share storage units.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::error::DefError;

/// Primitive storage kinds for field values.
///
/// Wire and text forms use the lowercase names (`s8`, `u8`, ... `fixstrW`);
/// see [`DefType::name`] and [`DefType::from_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefType {
    /// Signed 1-byte integer
    S8,
    /// Unsigned 1-byte integer
    U8,
    /// Signed 2-byte integer
    S16,
    /// Unsigned 2-byte integer
    U16,
    /// Signed 4-byte integer
    S32,
    /// Unsigned 4-byte integer
    U32,
    /// 32-bit float
    F32,
    /// Padding byte or array of padding bytes
    Dummy8,
    /// Fixed-width single-byte-encoded string
    Fixstr,
    /// Fixed-width double-byte-encoded string
    FixstrW,
}

impl DefType {
    /// All storage kinds, in wire enum order.
    pub const ALL: [DefType; 10] = [
        DefType::S8,
        DefType::U8,
        DefType::S16,
        DefType::U16,
        DefType::S32,
        DefType::U32,
        DefType::F32,
        DefType::Dummy8,
        DefType::Fixstr,
        DefType::FixstrW,
    ];

    /// Name used in the binary and text forms.
    pub fn name(self) -> &'static str {
        match self {
            DefType::S8 => "s8",
            DefType::U8 => "u8",
            DefType::S16 => "s16",
            DefType::U16 => "u16",
            DefType::S32 => "s32",
            DefType::U32 => "u32",
            DefType::F32 => "f32",
            DefType::Dummy8 => "dummy8",
            DefType::Fixstr => "fixstr",
            DefType::FixstrW => "fixstrW",
        }
    }

    /// Look up a storage kind by its wire/text name.
    pub fn from_name(name: &str) -> Option<DefType> {
        DefType::ALL.into_iter().find(|ty| ty.name() == name)
    }

    /// Size in bytes of a single value of this kind.
    pub fn value_size(self) -> usize {
        match self {
            DefType::S8 | DefType::U8 | DefType::Dummy8 | DefType::Fixstr => 1,
            DefType::S16 | DefType::U16 | DefType::FixstrW => 2,
            DefType::S32 | DefType::U32 | DefType::F32 => 4,
        }
    }

    /// Whether fields of this kind may have an array length greater than 1.
    pub fn is_array_type(self) -> bool {
        matches!(self, DefType::Dummy8 | DefType::Fixstr | DefType::FixstrW)
    }

    /// Whether fields of this kind may be bit-packed.
    pub fn is_bit_type(self) -> bool {
        matches!(
            self,
            DefType::U8 | DefType::U16 | DefType::U32 | DefType::Dummy8
        )
    }

    /// Storage kind used for bit-packing purposes; `dummy8` packs as `u8`.
    pub fn bit_storage(self) -> DefType {
        if self == DefType::Dummy8 {
            DefType::U8
        } else {
            self
        }
    }

    /// Maximum packed bits in one storage unit of this kind.
    ///
    /// Only meaningful for bit-capable kinds; call on [`DefType::bit_storage`].
    pub fn bit_limit(self) -> u32 {
        (self.bit_storage().value_size() * 8) as u32
    }

    /// Default printf-style display format for this kind.
    pub fn default_format(self) -> &'static str {
        match self {
            DefType::F32 => "%f",
            _ => "%d",
        }
    }

    /// Default minimum edit bound for this kind.
    pub fn default_minimum(self) -> f32 {
        match self {
            DefType::S8 => i8::MIN as f32,
            DefType::U8 => 0.0,
            DefType::S16 => i16::MIN as f32,
            DefType::U16 => 0.0,
            DefType::S32 => i32::MIN as f32,
            DefType::U32 => 0.0,
            DefType::F32 => f32::MIN,
            DefType::Dummy8 => 0.0,
            DefType::Fixstr | DefType::FixstrW => -1.0,
        }
    }

    /// Default maximum edit bound for this kind.
    pub fn default_maximum(self) -> f32 {
        match self {
            DefType::S8 => i8::MAX as f32,
            DefType::U8 => u8::MAX as f32,
            DefType::S16 => i16::MAX as f32,
            DefType::U16 => u16::MAX as f32,
            DefType::S32 => i32::MAX as f32,
            DefType::U32 => u32::MAX as f32,
            DefType::F32 => f32::MAX,
            DefType::Dummy8 => 0.0,
            DefType::Fixstr | DefType::FixstrW => 1e9,
        }
    }

    /// Default edit step for this kind.
    pub fn default_increment(self) -> f32 {
        match self {
            DefType::F32 => 0.01,
            _ => 1.0,
        }
    }

    /// Default editor flags for this kind.
    pub fn default_edit_flags(self) -> EditFlags {
        match self {
            DefType::Dummy8 => EditFlags::NONE,
            DefType::Fixstr | DefType::FixstrW => EditFlags::LOCK,
            _ => EditFlags::WRAP,
        }
    }
}

impl fmt::Display for DefType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Flags that control editor behavior for a field.
///
/// Stored as a bitmask; unknown bits are preserved so documents written by
/// newer tools round-trip unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EditFlags(u32);

impl EditFlags {
    /// Value is editable and does not wrap.
    pub const NONE: EditFlags = EditFlags(0);
    /// Value wraps around when scrolled past the minimum or maximum.
    pub const WRAP: EditFlags = EditFlags(1);
    /// Value may not be edited.
    pub const LOCK: EditFlags = EditFlags(4);

    /// Raw bitmask.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Build from a raw bitmask, keeping unknown bits.
    pub fn from_bits(bits: u32) -> EditFlags {
        EditFlags(bits)
    }

    /// Whether all bits of `other` are set.
    pub fn contains(self, other: EditFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Bits covered by the named constants.
    const NAMED: u32 = EditFlags::WRAP.0 | EditFlags::LOCK.0;

    /// Parse the text form: flag names separated by commas, e.g. `Wrap, Lock`.
    /// A decimal number carries a raw mask, so unknown bits survive.
    pub fn from_text(text: &str) -> Option<EditFlags> {
        let mut flags = EditFlags::NONE;
        for part in text.split(',') {
            let part = part.trim();
            match part {
                "None" => {}
                "Wrap" => flags |= EditFlags::WRAP,
                "Lock" => flags |= EditFlags::LOCK,
                _ => flags |= EditFlags(part.parse().ok()?),
            }
        }
        Some(flags)
    }
}

impl BitOr for EditFlags {
    type Output = EditFlags;

    fn bitor(self, rhs: EditFlags) -> EditFlags {
        EditFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for EditFlags {
    fn bitor_assign(&mut self, rhs: EditFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for EditFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return f.write_str("None");
        }
        // A mask with bits outside the named set renders numerically; the
        // names alone could not carry it back through the text form.
        if self.0 & !EditFlags::NAMED != 0 {
            return write!(f, "{}", self.0);
        }
        let mut names = Vec::new();
        if self.contains(EditFlags::WRAP) {
            names.push("Wrap");
        }
        if self.contains(EditFlags::LOCK) {
            names.push("Lock");
        }
        f.write_str(&names.join(", "))
    }
}

/// One field present in each row of a param.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Name to display in the editor.
    pub display_name: String,

    /// Storage kind of the value.
    pub display_type: DefType,

    /// Printf-style format string applied to the value in the editor.
    pub display_format: String,

    /// Default value for new rows.
    pub default: f32,

    /// Minimum valid value.
    pub minimum: f32,

    /// Maximum valid value.
    pub maximum: f32,

    /// Amount of change per step when scrolling in the editor.
    pub increment: f32,

    /// Editor behavior flags.
    pub edit_flags: EditFlags,

    /// Number of elements; greater than 1 only for array-capable kinds
    /// (`dummy8`, `fixstr`, `fixstrW`).
    pub array_length: i32,

    /// Optional free-text description.
    pub description: Option<String>,

    /// Type of the value in the engine; may be an enum name.
    pub internal_type: String,

    /// Name of the value in the engine; not present before format version 102.
    pub internal_name: String,

    /// Bits used by a bitfield, or -1 when the field is not bit-packed.
    /// Only supported for the unsigned family (`dummy8` packs as `u8`).
    pub bit_size: i32,

    /// Display sort key; not present before format version 104.
    /// Never affects row layout.
    pub sort_id: i32,
}

impl Field {
    /// Create a field of the given kind with the kind's computed defaults.
    ///
    /// The display name mirrors the internal name and the internal type
    /// mirrors the kind name until changed.
    pub fn new(display_type: DefType, internal_name: impl Into<String>) -> Field {
        let internal_name = internal_name.into();
        Field {
            display_name: internal_name.clone(),
            display_type,
            display_format: display_type.default_format().to_string(),
            default: 0.0,
            minimum: display_type.default_minimum(),
            maximum: display_type.default_maximum(),
            increment: display_type.default_increment(),
            edit_flags: display_type.default_edit_flags(),
            array_length: 1,
            description: None,
            internal_type: display_type.name().to_string(),
            internal_name,
            bit_size: -1,
            sort_id: 0,
        }
    }
}

impl fmt::Display for Field {
    /// Renders the composite definition form: `u8 invisible:1`,
    /// `dummy8 pad[8]`, or `f32 weight`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.display_type.is_bit_type() && self.bit_size != -1 {
            write!(f, "{} {}:{}", self.display_type, self.internal_name, self.bit_size)
        } else if self.display_type.is_array_type() {
            write!(f, "{} {}[{}]", self.display_type, self.internal_name, self.array_length)
        } else {
            write!(f, "{} {}", self.display_type, self.internal_name)
        }
    }
}

/// A complete schema document: ordered fields plus document-level flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDef {
    /// Revision of the row data structure.
    pub data_version: i16,

    /// Identifier linking this schema to its data files.
    pub param_type: String,

    /// Byte order of the binary form.
    pub big_endian: bool,

    /// String encoding of the binary form: double-byte when true,
    /// single-byte otherwise.
    pub unicode: bool,

    /// Binary layout version; one of [`crate::FORMAT_VERSIONS`].
    pub format_version: i16,

    /// Fields in each row, in layout order.
    pub fields: Vec<Field>,
}

impl ParamDef {
    /// Create an empty little-endian document at the default format
    /// version (104).
    pub fn new(param_type: impl Into<String>) -> ParamDef {
        ParamDef {
            data_version: 0,
            param_type: param_type.into(),
            big_endian: false,
            unicode: false,
            format_version: 104,
            fields: Vec::new(),
        }
    }

    /// Fixed byte size of one data row described by this schema.
    ///
    /// See [`crate::compute_row_size`] for the bit-run rules.
    pub fn row_size(&self) -> usize {
        crate::row_size::compute_row_size(self)
    }

    /// Verify that the document can be encoded safely.
    ///
    /// See [`crate::validate`].
    pub fn validate(&self) -> Result<(), DefError> {
        crate::validate::validate(self)
    }
}
