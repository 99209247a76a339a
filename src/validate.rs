//! Pre-write document validation

use crate::FORMAT_VERSIONS;
use crate::def::ParamDef;
use crate::error::DefError;

/// Verify that a document can be encoded safely.
///
/// Checks stop at the first violation and report the offending field index
/// where one applies. Callers are expected to validate before
/// [`crate::encode_binary`]; encode does not re-validate.
pub fn validate(def: &ParamDef) -> Result<(), DefError> {
    if !FORMAT_VERSIONS.contains(&def.format_version) {
        return Err(document_error(format!(
            "unknown format version {}",
            def.format_version
        )));
    }
    if def.param_type.is_empty() {
        return Err(document_error("param type may not be empty"));
    }

    for (i, field) in def.fields.iter().enumerate() {
        if field.display_name.is_empty() {
            return Err(field_error(i, "display name may not be empty"));
        }
        if field.display_format.is_empty() {
            return Err(field_error(i, "display format may not be empty"));
        }
        if field.internal_type.is_empty() {
            return Err(field_error(i, "internal type may not be empty"));
        }
        if def.format_version >= 102 && field.internal_name.is_empty() {
            return Err(field_error(
                i,
                format!(
                    "internal name may not be empty on version {}",
                    def.format_version
                ),
            ));
        }
    }

    Ok(())
}

fn document_error(reason: impl Into<String>) -> DefError {
    DefError::ValidationFailed {
        field: None,
        reason: reason.into(),
    }
}

fn field_error(index: usize, reason: impl Into<String>) -> DefError {
    DefError::ValidationFailed {
        field: Some(index),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def::{DefType, Field};

    fn create_test_def() -> ParamDef {
        let mut def = ParamDef::new("EQUIP_PARAM_WEAPON_ST");
        def.fields.push(Field::new(DefType::S32, "weaponId"));
        def.fields.push(Field::new(DefType::F32, "weight"));
        def
    }

    #[test]
    fn test_valid_def() {
        assert_eq!(create_test_def().validate(), Ok(()));
    }

    #[test]
    fn test_unknown_version() {
        let mut def = create_test_def();
        def.format_version = 105;
        assert_eq!(
            def.validate(),
            Err(DefError::ValidationFailed {
                field: None,
                reason: "unknown format version 105".to_string(),
            })
        );
    }

    #[test]
    fn test_empty_param_type() {
        let mut def = create_test_def();
        def.param_type.clear();
        let err = def.validate().unwrap_err();
        assert!(matches!(err, DefError::ValidationFailed { field: None, .. }));
    }

    #[test]
    fn test_empty_internal_name_reports_field_index() {
        let mut def = create_test_def();
        def.fields[1].internal_name.clear();
        assert_eq!(
            def.validate(),
            Err(DefError::ValidationFailed {
                field: Some(1),
                reason: "internal name may not be empty on version 104".to_string(),
            })
        );
    }

    #[test]
    fn test_empty_internal_name_allowed_on_101() {
        let mut def = create_test_def();
        def.format_version = 101;
        def.fields[1].internal_name.clear();
        assert_eq!(def.validate(), Ok(()));
    }

    #[test]
    fn test_empty_display_format() {
        let mut def = create_test_def();
        def.fields[0].display_format.clear();
        assert_eq!(
            def.validate(),
            Err(DefError::ValidationFailed {
                field: Some(0),
                reason: "display format may not be empty".to_string(),
            })
        );
    }
}
