//! Binary schema decoding

use crate::def::{DefType, EditFlags, Field, ParamDef};
use crate::error::DefError;

use super::{
    DISPLAY_FORMAT_WIDTH, DISPLAY_NAME_WIDTH, ENDIAN_OFFSET, EXTENDED_HEADER_MARKER, FormatLayout,
    HEADER_SIZE, INTERNAL_WIDTH, PARAM_TYPE_WIDTH, TYPE_NAME_WIDTH, UNICODE_OFFSET, decode_wide,
    known_header_tag, known_record_tag, strip_padding,
};

/// Decode a schema document from its binary form.
///
/// Byte order and string encoding are self-describing: the endianness byte
/// at offset 0x2C and the unicode flag at 0x2D are probed before the header
/// is read.
///
/// # Errors
/// * [`DefError::UnsupportedFormat`] - version or size tag outside the
///   supported set
/// * [`DefError::CorruptSchema`] - truncated buffer, byte-count/array
///   mismatch, malformed suffix, bad string data
pub fn decode_binary(data: &[u8]) -> Result<ParamDef, DefError> {
    if data.len() < HEADER_SIZE {
        return Err(DefError::corrupt(format!(
            "buffer too small for header: {} bytes",
            data.len()
        )));
    }

    let big_endian = data[ENDIAN_OFFSET] as i8 == -1;
    let unicode = data[UNICODE_OFFSET] != 0;
    let mut reader = Reader::new(data, big_endian);

    let _file_size = reader.read_i32()?;
    let header_tag = reader.read_i16()?;
    let data_version = reader.read_i16()?;
    let field_count = reader.read_i16()?;
    let record_tag = reader.read_i16()?;
    let param_type = reader.read_fixed_str(PARAM_TYPE_WIDTH, unicode)?;
    let _endian = reader.read_u8()?;
    let _unicode = reader.read_u8()?;
    let format_version = reader.read_i16()?;

    let layout = FormatLayout::for_version(format_version).ok_or_else(|| {
        DefError::unsupported(format!("unknown format version {format_version}"))
    })?;

    if layout.extended() {
        let marker = reader.read_i64()?;
        if marker != EXTENDED_HEADER_MARKER {
            return Err(DefError::corrupt(format!(
                "unexpected extended header marker 0x{marker:X}"
            )));
        }
    }

    if !known_header_tag(header_tag) {
        return Err(DefError::unsupported(format!(
            "unknown header size tag 0x{header_tag:X}"
        )));
    }
    if header_tag != layout.header_tag {
        return Err(DefError::corrupt(format!(
            "header size tag 0x{header_tag:X} does not match version {format_version}"
        )));
    }
    if !known_record_tag(record_tag) {
        return Err(DefError::unsupported(format!(
            "unknown field record size tag 0x{record_tag:X}"
        )));
    }
    if record_tag != layout.record_tag {
        return Err(DefError::corrupt(format!(
            "field record size tag 0x{record_tag:X} does not match version {format_version}"
        )));
    }
    if field_count < 0 {
        return Err(DefError::corrupt(format!("negative field count {field_count}")));
    }

    let mut fields = Vec::with_capacity(field_count as usize);
    for _ in 0..field_count {
        fields.push(read_field(&mut reader, layout, unicode)?);
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

fn read_field(reader: &mut Reader<'_>, layout: &FormatLayout, unicode: bool) -> Result<Field, DefError> {
    let display_name = reader.read_fixed_str(DISPLAY_NAME_WIDTH, unicode)?;

    let type_name = reader.read_fixed_str(TYPE_NAME_WIDTH, false)?;
    let display_type = DefType::from_name(&type_name)
        .ok_or_else(|| DefError::corrupt(format!("unknown field type {type_name:?}")))?;

    let display_format = reader.read_fixed_str(DISPLAY_FORMAT_WIDTH, false)?;
    let default = reader.read_f32()?;
    let minimum = reader.read_f32()?;
    let maximum = reader.read_f32()?;
    let increment = reader.read_f32()?;
    let edit_flags = EditFlags::from_bits(reader.read_i32()? as u32);

    // The record carries total bytes, not element count; cross-check against
    // the primitive size before deriving the array length.
    let byte_count = reader.read_i32()?;
    let value_size = display_type.value_size() as i32;
    let array_length = if display_type.is_array_type() {
        if byte_count <= 0 || byte_count % value_size != 0 {
            return Err(DefError::corrupt(format!(
                "unexpected byte count {byte_count} for type {display_type}"
            )));
        }
        byte_count / value_size
    } else {
        if byte_count != value_size {
            return Err(DefError::corrupt(format!(
                "unexpected byte count {byte_count} for type {display_type}"
            )));
        }
        1
    };

    let description_offset = if layout.wide_description_offset {
        reader.read_i64()?
    } else {
        reader.read_i32()? as i64
    };

    let internal_type = reader.read_fixed_str(INTERNAL_WIDTH, false)?;

    let mut internal_name = String::new();
    let mut bit_size = -1;
    if layout.has_internal_name {
        // Some shipped defs carry stray whitespace around the name.
        internal_name = reader.read_fixed_str(INTERNAL_WIDTH, false)?.trim().to_string();

        if let Some((base, bits)) = split_bit_suffix(&internal_name) {
            if !display_type.is_bit_type() {
                return Err(DefError::corrupt(format!(
                    "bitfield suffix on non-bit type {display_type} in {internal_name:?}"
                )));
            }
            internal_name = base.to_string();
            bit_size = bits;
        }

        if display_type.is_array_type() {
            let declared = match split_array_suffix(&internal_name) {
                Some((base, length)) => {
                    internal_name = base.to_string();
                    length
                }
                None => 1,
            };
            if declared != array_length {
                return Err(DefError::corrupt(format!(
                    "array length {declared} in {internal_name:?} does not match byte count {byte_count}"
                )));
            }
        }

        if bit_size != -1 && array_length > 1 {
            return Err(DefError::corrupt(format!(
                "field {internal_name:?} is both a bitfield and an array"
            )));
        }
    }

    let sort_id = if layout.has_sort_id { reader.read_i32()? } else { 0 };

    if layout.reserved_tail > 0 {
        let reserved = reader.read_bytes(layout.reserved_tail)?;
        if reserved.iter().any(|&b| b != 0) {
            return Err(DefError::corrupt("non-zero bytes in reserved record tail"));
        }
    }

    // Offset zero is the "no description" sentinel; offset zero always holds
    // a header byte, so no real description can live there.
    let description = if description_offset != 0 {
        Some(reader.read_str_at(description_offset, unicode)?)
    } else {
        None
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

/// Split a trailing `:<digits>` bitfield suffix off an internal name.
fn split_bit_suffix(name: &str) -> Option<(&str, i32)> {
    let (base, digits) = name.rsplit_once(':')?;
    let base = base.trim_end();
    let digits = digits.trim();
    if base.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((base, digits.parse().ok()?))
}

/// Split a trailing `[<digits>]` array suffix off an internal name.
fn split_array_suffix(name: &str) -> Option<(&str, i32)> {
    let (base, digits) = name.strip_suffix(']')?.rsplit_once('[')?;
    let base = base.trim_end();
    let digits = digits.trim();
    if base.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((base, digits.parse().ok()?))
}

/// Sequential reader over the document buffer with the probed byte order.
///
/// Also serves the absolute reads used to resolve description offsets.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    big_endian: bool,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8], big_endian: bool) -> Reader<'a> {
        Reader {
            data,
            pos: 0,
            big_endian,
        }
    }

    fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], DefError> {
        let end = self
            .pos
            .checked_add(count)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| DefError::corrupt("unexpected end of buffer"))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_u8(&mut self) -> Result<u8, DefError> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16, DefError> {
        let bytes: [u8; 2] = self.read_bytes(2)?.try_into().unwrap();
        Ok(if self.big_endian {
            u16::from_be_bytes(bytes)
        } else {
            u16::from_le_bytes(bytes)
        })
    }

    fn read_i16(&mut self) -> Result<i16, DefError> {
        Ok(self.read_u16()? as i16)
    }

    fn read_u32(&mut self) -> Result<u32, DefError> {
        let bytes: [u8; 4] = self.read_bytes(4)?.try_into().unwrap();
        Ok(if self.big_endian {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        })
    }

    fn read_i32(&mut self) -> Result<i32, DefError> {
        Ok(self.read_u32()? as i32)
    }

    fn read_i64(&mut self) -> Result<i64, DefError> {
        let bytes: [u8; 8] = self.read_bytes(8)?.try_into().unwrap();
        Ok(if self.big_endian {
            i64::from_be_bytes(bytes)
        } else {
            i64::from_le_bytes(bytes)
        })
    }

    fn read_f32(&mut self) -> Result<f32, DefError> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Read a fixed-width string of `width` bytes, stripping trailing pad
    /// bytes (zero or space) of either padding convention.
    fn read_fixed_str(&mut self, width: usize, unicode: bool) -> Result<String, DefError> {
        let mut units: Vec<u16> = if unicode {
            let mut units = Vec::with_capacity(width / 2);
            for _ in 0..width / 2 {
                units.push(self.read_u16()?);
            }
            units
        } else {
            self.read_bytes(width)?.iter().map(|&b| b as u16).collect()
        };
        strip_padding(&mut units);
        if unicode {
            decode_wide(&units)
        } else {
            Ok(units.iter().map(|&unit| (unit as u8) as char).collect())
        }
    }

    /// Read a zero-terminated string at an absolute offset.
    fn read_str_at(&self, offset: i64, unicode: bool) -> Result<String, DefError> {
        let start = usize::try_from(offset)
            .ok()
            .filter(|&start| start < self.data.len())
            .ok_or_else(|| {
                DefError::corrupt(format!("description offset {offset} out of bounds"))
            })?;

        if unicode {
            let mut units = Vec::new();
            let mut pos = start;
            loop {
                let bytes: [u8; 2] = self
                    .data
                    .get(pos..pos + 2)
                    .ok_or_else(|| DefError::corrupt("unterminated description string"))?
                    .try_into()
                    .unwrap();
                let unit = if self.big_endian {
                    u16::from_be_bytes(bytes)
                } else {
                    u16::from_le_bytes(bytes)
                };
                if unit == 0 {
                    break;
                }
                units.push(unit);
                pos += 2;
            }
            decode_wide(&units)
        } else {
            let tail = &self.data[start..];
            let len = tail
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| DefError::corrupt("unterminated description string"))?;
            Ok(super::decode_narrow(&tail[..len]))
        }
    }
}
