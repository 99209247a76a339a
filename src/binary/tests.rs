//! Tests for the binary schema codec

use super::*;
use crate::FORMAT_VERSIONS;
use crate::def::{DefType, Field, ParamDef};
use crate::error::DefError;

/// Header offsets used by the tampering tests.
const HEADER_TAG_OFFSET: usize = 0x04;
const RECORD_TAG_OFFSET: usize = 0x0A;
const FORMAT_VERSION_OFFSET: usize = 0x2E;

fn create_test_def(format_version: i16) -> ParamDef {
    let mut def = ParamDef::new("EQUIP_PARAM_WEAPON_ST");
    def.format_version = format_version;
    def.data_version = 3;

    let mut durability = Field::new(DefType::S32, "durability");
    durability.description = Some("Durability of the weapon.".to_string());
    durability.maximum = 9999.0;

    let mut weight = Field::new(DefType::F32, "weight");
    weight.minimum = 0.0;
    weight.maximum = 99.0;

    let mut enhance = Field::new(DefType::U8, "isEnhance");
    enhance.bit_size = 1;
    let mut custom = Field::new(DefType::U8, "isCustom");
    custom.bit_size = 7;

    let mut pad = Field::new(DefType::Dummy8, "pad0");
    pad.array_length = 6;

    def.fields = vec![durability, weight, enhance, custom, pad];

    if format_version >= 104 {
        for (i, field) in def.fields.iter_mut().enumerate() {
            field.sort_id = (i as i32 + 1) * 100;
        }
    }
    if format_version < 102 {
        // Internal names (and with them bitfield suffixes) only exist in
        // the record from version 102.
        for field in &mut def.fields {
            field.internal_name.clear();
            field.bit_size = -1;
        }
    }
    def
}

fn record_offset(def: &ParamDef, index: usize) -> usize {
    let layout = FormatLayout::for_version(def.format_version).unwrap();
    let header = if layout.extended() { 0x38 } else { HEADER_SIZE };
    header + index * layout.record_tag as usize
}

#[test]
fn test_round_trip_all_versions() {
    for version in FORMAT_VERSIONS {
        let def = create_test_def(version);
        let bytes = encode_binary(&def).unwrap();
        let decoded = decode_binary(&bytes).unwrap();
        assert_eq!(decoded, def, "round trip failed for version {version}");
    }
}

#[test]
fn test_round_trip_big_endian() {
    let mut def = create_test_def(104);
    def.big_endian = true;
    let bytes = encode_binary(&def).unwrap();
    assert_eq!(bytes[ENDIAN_OFFSET] as i8, -1);
    assert_eq!(decode_binary(&bytes).unwrap(), def);
}

#[test]
fn test_round_trip_unicode() {
    let mut def = create_test_def(201);
    def.param_type = "NPC_PARAM_ST".to_string();
    def.unicode = true;
    def.fields[0].display_name = "耐久度".to_string();
    def.fields[0].description = Some("武器の耐久度。".to_string());
    let bytes = encode_binary(&def).unwrap();
    assert_eq!(bytes[UNICODE_OFFSET], 1);
    assert_eq!(decode_binary(&bytes).unwrap(), def);
}

#[test]
fn test_round_trip_big_endian_unicode() {
    let mut def = create_test_def(104);
    def.param_type = "NPC_PARAM_ST".to_string();
    def.big_endian = true;
    def.unicode = true;
    def.fields[1].description = Some("重量。".to_string());
    let bytes = encode_binary(&def).unwrap();
    assert_eq!(decode_binary(&bytes).unwrap(), def);
}

#[test]
fn test_file_size_is_backfilled() {
    let bytes = encode_binary(&create_test_def(104)).unwrap();
    let file_size = i32::from_le_bytes(bytes[0..4].try_into().unwrap());
    assert_eq!(file_size as usize, bytes.len());
}

#[test]
fn test_whole_file_padded_before_104() {
    for version in [101, 102, 103] {
        let bytes = encode_binary(&create_test_def(version)).unwrap();
        assert_eq!(bytes.len() % PAD_ALIGN, 0, "version {version} not padded");
    }
}

#[test]
fn test_description_block_padded_from_104() {
    let def = create_test_def(104);
    let bytes = encode_binary(&def).unwrap();
    let descriptions_start = record_offset(&def, def.fields.len());
    assert_eq!((bytes.len() - descriptions_start) % PAD_ALIGN, 0);
}

#[test]
fn test_missing_description_keeps_zero_sentinel() {
    let mut def = create_test_def(104);
    def.fields[0].description = None;
    let bytes = encode_binary(&def).unwrap();

    // Description offset slot sits after the name/type/format strings,
    // four floats, edit flags, and byte count.
    let slot = record_offset(&def, 0) + 0x40 + 8 + 8 + 16 + 4 + 4;
    assert_eq!(&bytes[slot..slot + 4], &[0, 0, 0, 0]);
    assert_eq!(decode_binary(&bytes).unwrap().fields[0].description, None);
}

#[test]
fn test_array_length_from_byte_count() {
    let def = create_test_def(104);
    let bytes = encode_binary(&def).unwrap();
    let decoded = decode_binary(&bytes).unwrap();
    assert_eq!(decoded.fields[4].array_length, 6);

    // fixstrW stores two bytes per element: 12 bytes decode to length 6.
    let mut def = ParamDef::new("MENU_PARAM_ST");
    let mut name = Field::new(DefType::FixstrW, "menuName");
    name.array_length = 6;
    def.fields = vec![name];
    let bytes = encode_binary(&def).unwrap();
    let byte_count_at = record_offset(&def, 0) + 0x40 + 8 + 8 + 16 + 4;
    let byte_count = i32::from_le_bytes(bytes[byte_count_at..byte_count_at + 4].try_into().unwrap());
    assert_eq!(byte_count, 12);
    assert_eq!(decode_binary(&bytes).unwrap().fields[0].array_length, 6);
}

#[test]
fn test_array_length_mismatch_is_corrupt() {
    // Grow the dummy8 field's byte count so it no longer agrees with the
    // [6] suffix carried by the internal name.
    let def = create_test_def(104);
    let mut bytes = encode_binary(&def).unwrap();
    let byte_count_at = record_offset(&def, 4) + 0x40 + 8 + 8 + 16 + 4;
    bytes[byte_count_at..byte_count_at + 4].copy_from_slice(&12i32.to_le_bytes());
    assert!(matches!(
        decode_binary(&bytes),
        Err(DefError::CorruptSchema(_))
    ));
}

#[test]
fn test_bitfield_suffix_round_trip() {
    let def = create_test_def(102);
    let bytes = encode_binary(&def).unwrap();
    let decoded = decode_binary(&bytes).unwrap();
    assert_eq!(decoded.fields[2].internal_name, "isEnhance");
    assert_eq!(decoded.fields[2].bit_size, 1);
    assert_eq!(decoded.fields[3].bit_size, 7);
}

#[test]
fn test_version_gating_102() {
    let def = create_test_def(102);
    let bytes = encode_binary(&def).unwrap();
    let decoded = decode_binary(&bytes).unwrap();

    // 102 records carry the internal name but no sort id.
    assert_eq!(decoded.fields[0].internal_name, "durability");
    assert!(decoded.fields.iter().all(|f| f.sort_id == 0));

    // Forcing a 104 interpretation leaves a known-but-wrong record tag.
    let mut tampered = bytes.clone();
    tampered[FORMAT_VERSION_OFFSET..FORMAT_VERSION_OFFSET + 2]
        .copy_from_slice(&104i16.to_le_bytes());
    assert!(matches!(
        decode_binary(&tampered),
        Err(DefError::CorruptSchema(_))
    ));
}

#[test]
fn test_internal_name_absent_before_102() {
    let bytes = encode_binary(&create_test_def(101)).unwrap();
    let decoded = decode_binary(&bytes).unwrap();
    assert!(decoded.fields.iter().all(|f| f.internal_name.is_empty()));
    assert!(decoded.fields.iter().all(|f| f.bit_size == -1));
}

#[test]
fn test_unknown_version_is_unsupported() {
    let mut bytes = encode_binary(&create_test_def(104)).unwrap();
    bytes[FORMAT_VERSION_OFFSET..FORMAT_VERSION_OFFSET + 2]
        .copy_from_slice(&105i16.to_le_bytes());
    assert!(matches!(
        decode_binary(&bytes),
        Err(DefError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_unknown_header_tag_is_unsupported() {
    let mut bytes = encode_binary(&create_test_def(104)).unwrap();
    bytes[HEADER_TAG_OFFSET..HEADER_TAG_OFFSET + 2].copy_from_slice(&0x31i16.to_le_bytes());
    assert!(matches!(
        decode_binary(&bytes),
        Err(DefError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_unknown_record_tag_is_unsupported() {
    let mut bytes = encode_binary(&create_test_def(104)).unwrap();
    bytes[RECORD_TAG_OFFSET..RECORD_TAG_OFFSET + 2].copy_from_slice(&0x70i16.to_le_bytes());
    assert!(matches!(
        decode_binary(&bytes),
        Err(DefError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_truncated_buffer_is_corrupt() {
    let bytes = encode_binary(&create_test_def(104)).unwrap();
    assert!(matches!(
        decode_binary(&bytes[..0x20]),
        Err(DefError::CorruptSchema(_))
    ));
    assert!(matches!(
        decode_binary(&bytes[..bytes.len() - 40]),
        Err(DefError::CorruptSchema(_))
    ));
}

#[test]
fn test_non_zero_reserved_tail_is_corrupt() {
    let def = create_test_def(201);
    let mut bytes = encode_binary(&def).unwrap();
    let layout = FormatLayout::for_version(201).unwrap();
    let tail_at = record_offset(&def, 1) - layout.reserved_tail;
    bytes[tail_at] = 1;
    assert!(matches!(
        decode_binary(&bytes),
        Err(DefError::CorruptSchema(_))
    ));
}

#[test]
fn test_narrow_encoding_rejects_wide_chars() {
    let mut def = create_test_def(104);
    def.fields[0].display_name = "耐久度".to_string();
    assert!(matches!(
        encode_binary(&def),
        Err(DefError::CorruptSchema(_))
    ));
}

#[test]
fn test_unknown_type_name_is_corrupt() {
    let def = create_test_def(104);
    let mut bytes = encode_binary(&def).unwrap();
    let type_at = record_offset(&def, 0) + 0x40;
    bytes[type_at..type_at + 4].copy_from_slice(b"vec4");
    assert!(matches!(
        decode_binary(&bytes),
        Err(DefError::CorruptSchema(_))
    ));
}

#[test]
fn test_empty_def_round_trips() {
    let mut def = ParamDef::new("AI_STANDARD_INFO_BANK");
    def.format_version = 104;
    let bytes = encode_binary(&def).unwrap();
    let decoded = decode_binary(&bytes).unwrap();
    assert_eq!(decoded, def);
    assert!(decoded.fields.is_empty());
}

#[test]
fn test_space_padding_before_104() {
    let def = create_test_def(101);
    let bytes = encode_binary(&def).unwrap();
    // "EQUIP_PARAM_WEAPON_ST" is 21 chars; the rest of the 0x20-wide slot
    // is space padding on old versions.
    assert_eq!(bytes[0x0C + 21], 0x20);

    let bytes = encode_binary(&create_test_def(104)).unwrap();
    assert_eq!(bytes[0x0C + 21], 0x00);
}
