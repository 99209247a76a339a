//! Binary schema encoding
//!
//! Two-pass reserve-then-backfill: the fixed-size header and field records
//! are written first with placeholder slots for the file size and each
//! description offset; the variable-length description block follows, and
//! the placeholders are patched from the final positions.

use crate::def::{Field, ParamDef};
use crate::error::DefError;

use super::{
    DISPLAY_FORMAT_WIDTH, DISPLAY_NAME_WIDTH, EXTENDED_HEADER_MARKER, FormatLayout,
    INTERNAL_WIDTH, PAD_ALIGN, PARAM_TYPE_WIDTH, TYPE_NAME_WIDTH, encode_narrow, pad_byte,
};

/// Encode a schema document to its binary form.
///
/// The document is assumed valid; call [`crate::validate`] first. Encode
/// itself only rejects what cannot be represented at all: an unsupported
/// format version, strings that do not fit their fixed width or encoding,
/// and more fields than the 16-bit count can carry.
pub fn encode_binary(def: &ParamDef) -> Result<Vec<u8>, DefError> {
    let layout = FormatLayout::for_version(def.format_version).ok_or_else(|| {
        DefError::unsupported(format!("unknown format version {}", def.format_version))
    })?;

    let field_count = i16::try_from(def.fields.len())
        .map_err(|_| DefError::corrupt(format!("too many fields: {}", def.fields.len())))?;

    let pad = pad_byte(def.format_version);
    let mut writer = Writer::new(def.big_endian);

    let file_size_slot = writer.reserve_i32();
    writer.write_i16(layout.header_tag);
    writer.write_i16(def.data_version);
    writer.write_i16(field_count);
    writer.write_i16(layout.record_tag);
    writer.write_fixed_str(&def.param_type, PARAM_TYPE_WIDTH, pad, def.unicode)?;
    writer.write_u8(if def.big_endian { 0xFF } else { 0x00 });
    writer.write_u8(def.unicode as u8);
    writer.write_i16(def.format_version);
    if layout.extended() {
        writer.write_i64(EXTENDED_HEADER_MARKER);
    }

    let mut description_slots = Vec::with_capacity(def.fields.len());
    for field in &def.fields {
        description_slots.push(write_field(&mut writer, field, layout, pad, def.unicode)?);
    }

    // Description block; absent descriptions keep the zero sentinel.
    let descriptions_start = writer.pos();
    for (field, slot) in def.fields.iter().zip(description_slots) {
        let offset = match &field.description {
            Some(description) => {
                let offset = writer.pos() as i64;
                writer.write_terminated_str(description, def.unicode)?;
                offset
            }
            None => 0,
        };
        match slot {
            Slot::Narrow(at) => writer.patch_i32(at, offset as i32),
            Slot::Wide(at) => writer.patch_i64(at, offset),
        }
    }

    if def.format_version >= 104 {
        // Only the description block is padded to the boundary.
        let length = writer.pos() - descriptions_start;
        if length % PAD_ALIGN != 0 {
            writer.write_zeros(PAD_ALIGN - length % PAD_ALIGN);
        }
    } else {
        writer.pad_to(PAD_ALIGN);
    }

    let file_size = writer.pos() as i32;
    writer.patch_i32(file_size_slot, file_size);
    Ok(writer.into_bytes())
}

/// Reserved description-offset slot, 32- or 64-bit per layout.
enum Slot {
    Narrow(usize),
    Wide(usize),
}

fn write_field(
    writer: &mut Writer,
    field: &Field,
    layout: &FormatLayout,
    pad: u8,
    unicode: bool,
) -> Result<Slot, DefError> {
    writer.write_fixed_str(&field.display_name, DISPLAY_NAME_WIDTH, pad, unicode)?;
    writer.write_fixed_str(field.display_type.name(), TYPE_NAME_WIDTH, pad, false)?;
    writer.write_fixed_str(&field.display_format, DISPLAY_FORMAT_WIDTH, pad, false)?;
    writer.write_f32(field.default);
    writer.write_f32(field.minimum);
    writer.write_f32(field.maximum);
    writer.write_f32(field.increment);
    writer.write_i32(field.edit_flags.bits() as i32);

    let value_size = field.display_type.value_size() as i32;
    let byte_count = if field.display_type.is_array_type() {
        value_size * field.array_length.max(1)
    } else {
        value_size
    };
    writer.write_i32(byte_count);

    let slot = if layout.wide_description_offset {
        Slot::Wide(writer.reserve_i64())
    } else {
        Slot::Narrow(writer.reserve_i32())
    };

    writer.write_fixed_str(&field.internal_type, INTERNAL_WIDTH, pad, false)?;

    if layout.has_internal_name {
        let composed = if field.bit_size != -1 {
            format!("{}:{}", field.internal_name, field.bit_size)
        } else if field.display_type.is_array_type() {
            format!("{}[{}]", field.internal_name, field.array_length)
        } else {
            field.internal_name.clone()
        };
        writer.write_fixed_str(&composed, INTERNAL_WIDTH, pad, false)?;
    }

    if layout.has_sort_id {
        writer.write_i32(field.sort_id);
    }

    if layout.reserved_tail > 0 {
        writer.write_zeros(layout.reserved_tail);
    }

    Ok(slot)
}

/// Growable output buffer with the document byte order and
/// reserve-then-backfill slots addressed by absolute position.
struct Writer {
    buf: Vec<u8>,
    big_endian: bool,
}

impl Writer {
    fn new(big_endian: bool) -> Writer {
        Writer {
            buf: Vec::new(),
            big_endian,
        }
    }

    fn pos(&self) -> usize {
        self.buf.len()
    }

    fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    fn write_u16(&mut self, value: u16) {
        let bytes = if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        self.buf.extend_from_slice(&bytes);
    }

    fn write_i16(&mut self, value: i16) {
        self.write_u16(value as u16);
    }

    fn write_u32(&mut self, value: u32) {
        let bytes = if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        self.buf.extend_from_slice(&bytes);
    }

    fn write_i32(&mut self, value: i32) {
        self.write_u32(value as u32);
    }

    fn write_i64(&mut self, value: i64) {
        let bytes = if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        self.buf.extend_from_slice(&bytes);
    }

    fn write_f32(&mut self, value: f32) {
        self.write_u32(value.to_bits());
    }

    fn write_zeros(&mut self, count: usize) {
        self.buf.resize(self.buf.len() + count, 0);
    }

    /// Zero-pad the whole buffer to an alignment boundary.
    fn pad_to(&mut self, align: usize) {
        let rem = self.buf.len() % align;
        if rem != 0 {
            self.write_zeros(align - rem);
        }
    }

    fn reserve_i32(&mut self) -> usize {
        let at = self.pos();
        self.write_zeros(4);
        at
    }

    fn reserve_i64(&mut self) -> usize {
        let at = self.pos();
        self.write_zeros(8);
        at
    }

    fn patch_i32(&mut self, at: usize, value: i32) {
        let bytes = if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        self.buf[at..at + 4].copy_from_slice(&bytes);
    }

    fn patch_i64(&mut self, at: usize, value: i64) {
        let bytes = if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        self.buf[at..at + 8].copy_from_slice(&bytes);
    }

    /// Write a fixed-width string, padded to `width` bytes with `pad`.
    fn write_fixed_str(
        &mut self,
        value: &str,
        width: usize,
        pad: u8,
        unicode: bool,
    ) -> Result<(), DefError> {
        if unicode {
            let units: Vec<u16> = value.encode_utf16().collect();
            if units.len() * 2 > width {
                return Err(DefError::corrupt(format!(
                    "string {value:?} exceeds fixed width {width}"
                )));
            }
            for unit in &units {
                self.write_u16(*unit);
            }
            for _ in 0..width / 2 - units.len() {
                self.write_u16(pad as u16);
            }
        } else {
            let bytes = encode_narrow(value)?;
            if bytes.len() > width {
                return Err(DefError::corrupt(format!(
                    "string {value:?} exceeds fixed width {width}"
                )));
            }
            self.buf.extend_from_slice(&bytes);
            for _ in 0..width - bytes.len() {
                self.write_u8(pad);
            }
        }
        Ok(())
    }

    /// Write a zero-terminated string in the document encoding.
    fn write_terminated_str(&mut self, value: &str, unicode: bool) -> Result<(), DefError> {
        if unicode {
            for unit in value.encode_utf16() {
                self.write_u16(unit);
            }
            self.write_u16(0);
        } else {
            let bytes = encode_narrow(value)?;
            self.buf.extend_from_slice(&bytes);
            self.write_u8(0);
        }
        Ok(())
    }
}
