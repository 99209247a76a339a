//! Binary schema format
//!
//! Self-describing byte order: the signed byte at offset 0x2C equals -1 for
//! big-endian documents; the unicode flag at 0x2D selects single- or
//! double-byte string encoding. Both are probed before the header is read.
//!
//! # Layout
//! ```text
//! 0x00: file_size i32            (backfilled on write)
//! 0x04: header_size_tag i16      0x30, or 0xFF from version 201
//! 0x06: data_version i16
//! 0x08: field_count i16
//! 0x0A: field_record_size_tag i16 (per version table)
//! 0x0C: param_type (0x20 bytes, fixed-width)
//! 0x2C: endianness i8            -1 = big-endian
//! 0x2D: unicode u8
//! 0x2E: format_version i16
//! 0x30: marker i64 = 0x38        (version 201 only)
//! var:  field records (field_count * record size)
//! var:  description strings      (zero-terminated, referenced by offset)
//! var:  zero padding to a 16-byte boundary
//! ```
//!
//! Field records are fixed-size per format version:
//!
//! | version | record tag | internal name | sort id | desc offset | reserved |
//! |---------|------------|---------------|---------|-------------|----------|
//! | 101     | 0x8C       | no            | no      | i32         | -        |
//! | 102     | 0xAC       | yes           | no      | i32         | -        |
//! | 103     | 0x6C       | yes           | no      | i32         | -        |
//! | 104     | 0xB0       | yes           | yes     | i32         | -        |
//! | 201     | 0xD0       | yes           | yes     | i64         | 28 zero bytes |
//!
//! The 103 record tag is historically wrong (smaller than the actual
//! record); it is validated as a tag only, records are always read
//! sequentially.

mod read;
mod write;

#[cfg(test)]
mod tests;

pub use read::decode_binary;
pub use write::encode_binary;

use crate::error::DefError;

/// Minimum header size; also the absolute offset of the 201 marker.
pub(crate) const HEADER_SIZE: usize = 0x30;

/// Absolute offset of the probed endianness byte.
pub(crate) const ENDIAN_OFFSET: usize = 0x2C;

/// Absolute offset of the probed unicode flag.
pub(crate) const UNICODE_OFFSET: usize = 0x2D;

/// Fixed marker carried after the header from version 201.
pub(crate) const EXTENDED_HEADER_MARKER: i64 = 0x38;

/// Fixed widths of the header and record strings, in bytes.
pub(crate) const PARAM_TYPE_WIDTH: usize = 0x20;
pub(crate) const DISPLAY_NAME_WIDTH: usize = 0x40;
pub(crate) const TYPE_NAME_WIDTH: usize = 8;
pub(crate) const DISPLAY_FORMAT_WIDTH: usize = 8;
pub(crate) const INTERNAL_WIDTH: usize = 0x20;

/// Trailing regions are padded to this boundary.
pub(crate) const PAD_ALIGN: usize = 0x10;

/// Per-version binary layout, selected once at header-probe time.
///
/// Read and write are parameterized over this table instead of re-testing
/// the version at each field.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FormatLayout {
    pub version: i16,
    pub header_tag: i16,
    pub record_tag: i16,
    pub has_internal_name: bool,
    pub has_sort_id: bool,
    pub wide_description_offset: bool,
    /// Zero bytes at the end of each record.
    pub reserved_tail: usize,
}

/// The closed set of supported layouts.
pub(crate) const LAYOUTS: [FormatLayout; 5] = [
    FormatLayout {
        version: 101,
        header_tag: 0x30,
        record_tag: 0x8C,
        has_internal_name: false,
        has_sort_id: false,
        wide_description_offset: false,
        reserved_tail: 0,
    },
    FormatLayout {
        version: 102,
        header_tag: 0x30,
        record_tag: 0xAC,
        has_internal_name: true,
        has_sort_id: false,
        wide_description_offset: false,
        reserved_tail: 0,
    },
    FormatLayout {
        version: 103,
        header_tag: 0x30,
        record_tag: 0x6C,
        has_internal_name: true,
        has_sort_id: false,
        wide_description_offset: false,
        reserved_tail: 0,
    },
    FormatLayout {
        version: 104,
        header_tag: 0x30,
        record_tag: 0xB0,
        has_internal_name: true,
        has_sort_id: true,
        wide_description_offset: false,
        reserved_tail: 0,
    },
    FormatLayout {
        version: 201,
        header_tag: 0xFF,
        record_tag: 0xD0,
        has_internal_name: true,
        has_sort_id: true,
        wide_description_offset: true,
        reserved_tail: 0x1C,
    },
];

impl FormatLayout {
    /// Look up the layout for a format version.
    pub fn for_version(version: i16) -> Option<&'static FormatLayout> {
        LAYOUTS.iter().find(|l| l.version == version)
    }

    /// Whether this is an extended-header layout (version >= 200).
    pub fn extended(&self) -> bool {
        self.version >= 200
    }
}

/// Whether a header-size tag belongs to any supported layout.
pub(crate) fn known_header_tag(tag: i16) -> bool {
    LAYOUTS.iter().any(|l| l.header_tag == tag)
}

/// Whether a field-record-size tag belongs to any supported layout.
pub(crate) fn known_record_tag(tag: i16) -> bool {
    LAYOUTS.iter().any(|l| l.record_tag == tag)
}

/// Pad byte for fixed-width strings: zero from version 104, space earlier.
pub(crate) fn pad_byte(format_version: i16) -> u8 {
    if format_version >= 104 { 0x00 } else { 0x20 }
}

/// Decode a single-byte string (bytes map to U+0000..U+00FF one-to-one).
pub(crate) fn decode_narrow(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Encode a single-byte string; characters above U+00FF do not fit.
pub(crate) fn encode_narrow(s: &str) -> Result<Vec<u8>, DefError> {
    s.chars()
        .map(|c| {
            u8::try_from(u32::from(c))
                .map_err(|_| DefError::corrupt(format!("character {c:?} does not fit a single-byte string")))
        })
        .collect()
}

/// Decode UTF-16 code units into a string.
pub(crate) fn decode_wide(units: &[u16]) -> Result<String, DefError> {
    String::from_utf16(units).map_err(|_| DefError::corrupt("invalid UTF-16 string data"))
}

/// Strip trailing pad bytes (zero or space) from a fixed-width value.
pub(crate) fn strip_padding(units: &mut Vec<u16>) {
    while let Some(&last) = units.last() {
        if last == 0x00 || last == 0x20 {
            units.pop();
        } else {
            break;
        }
    }
}
