//! Row size calculation with bit-run merging
//!
//! The row data codec strides over raw rows using the byte size computed
//! here, so this must agree exactly with how the engine packs rows:
//! adjacent bit-packed fields of the same storage kind share one storage
//! unit until its bit width is exhausted.

use crate::def::ParamDef;

/// Compute the fixed byte size of one data row.
///
/// Fields are charged in declared order: `value_size * array_length` for
/// array-capable kinds, `value_size` otherwise. A bit-capable field with a
/// bit size opens a *bit run*: each immediately following field is absorbed
/// while it is also bit-packed, shares the same normalized storage kind
/// (`dummy8` packs as `u8`), and the cumulative bit total fits the storage
/// kind's bit width. Absorbed fields add no bytes beyond the unit already
/// charged to the run's first field.
///
/// A bit-capable field without a bit size (-1) never joins a run; it is
/// charged a full, unpacked storage unit.
pub fn compute_row_size(def: &ParamDef) -> usize {
    let fields = &def.fields;
    let mut size = 0;
    let mut i = 0;
    while i < fields.len() {
        let field = &fields[i];
        let ty = field.display_type;
        if ty.is_array_type() {
            size += ty.value_size() * field.array_length.max(1) as usize;
        } else {
            size += ty.value_size();
        }

        if ty.is_bit_type() && field.bit_size != -1 {
            let storage = ty.bit_storage();
            let limit = storage.bit_limit();
            let mut bits = field.bit_size as u32;

            while i + 1 < fields.len() {
                let next = &fields[i + 1];
                let next_ty = next.display_type;
                if !next_ty.is_bit_type()
                    || next.bit_size == -1
                    || next_ty.bit_storage() != storage
                    || bits + next.bit_size as u32 > limit
                {
                    break;
                }
                bits += next.bit_size as u32;
                i += 1;
            }
        }
        i += 1;
    }
    size
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def::{DefType, Field};

    fn bit_field(ty: DefType, name: &str, bits: i32) -> Field {
        let mut field = Field::new(ty, name);
        field.bit_size = bits;
        field
    }

    fn def_with(fields: Vec<Field>) -> ParamDef {
        let mut def = ParamDef::new("TEST_PARAM");
        def.fields = fields;
        def
    }

    #[test]
    fn test_plain_fields() {
        let def = def_with(vec![
            Field::new(DefType::S16, "a"),
            Field::new(DefType::F32, "b"),
            Field::new(DefType::U8, "c"),
        ]);
        assert_eq!(compute_row_size(&def), 7);
    }

    #[test]
    fn test_array_fields() {
        let mut pad = Field::new(DefType::Dummy8, "pad");
        pad.array_length = 8;
        let mut name = Field::new(DefType::FixstrW, "name");
        name.array_length = 16;
        let def = def_with(vec![pad, name]);
        assert_eq!(compute_row_size(&def), 8 + 32);
    }

    #[test]
    fn test_bit_run_merges_into_one_byte() {
        // 3 + 4 + 1 bits share one u8; d is unpacked and gets its own byte.
        let def = def_with(vec![
            bit_field(DefType::U8, "a", 3),
            bit_field(DefType::U8, "b", 4),
            bit_field(DefType::U8, "c", 1),
            Field::new(DefType::U8, "d"),
        ]);
        assert_eq!(compute_row_size(&def), 2);
    }

    #[test]
    fn test_bit_run_respects_storage_limit() {
        // 12 + 5 = 17 bits does not fit a u16, so no merge happens.
        let def = def_with(vec![
            bit_field(DefType::U16, "a", 12),
            bit_field(DefType::U16, "b", 5),
        ]);
        assert_eq!(compute_row_size(&def), 4);
    }

    #[test]
    fn test_bit_run_stops_at_storage_kind_change() {
        let def = def_with(vec![
            bit_field(DefType::U8, "a", 2),
            bit_field(DefType::U16, "b", 2),
        ]);
        assert_eq!(compute_row_size(&def), 3);
    }

    #[test]
    fn test_dummy8_packs_as_u8() {
        let def = def_with(vec![
            bit_field(DefType::U8, "a", 4),
            bit_field(DefType::Dummy8, "pad", 4),
        ]);
        assert_eq!(compute_row_size(&def), 1);
    }

    #[test]
    fn test_unpacked_field_never_joins_a_run() {
        // b has no bit size, so it breaks the run even though a third
        // packed field would otherwise fit.
        let def = def_with(vec![
            bit_field(DefType::U8, "a", 2),
            Field::new(DefType::U8, "b"),
            bit_field(DefType::U8, "c", 2),
        ]);
        assert_eq!(compute_row_size(&def), 3);
    }

    #[test]
    fn test_u32_run() {
        let def = def_with(vec![
            bit_field(DefType::U32, "a", 20),
            bit_field(DefType::U32, "b", 10),
            bit_field(DefType::U32, "c", 2),
            bit_field(DefType::U32, "d", 1),
        ]);
        // 20 + 10 + 2 fill the first unit; d starts a second one.
        assert_eq!(compute_row_size(&def), 8);
    }

    #[test]
    fn test_empty_def() {
        assert_eq!(compute_row_size(&def_with(Vec::new())), 0);
    }
}
