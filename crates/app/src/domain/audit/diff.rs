//! Field-level snapshot diffing.
//!
//! Null, missing and empty-string values are treated as the same "no value".
//! Strings holding timestamps or dates compare by the instant or day they
//! denote, so re-serialized dates do not register as changes.

use jiff::{Timestamp, civil::Date};
use serde_json::{Map, Value};

use crate::domain::audit::records::{AuditChanges, FieldChange};

/// Flat entity snapshot keyed by field name.
pub type AuditSnapshot = Map<String, Value>;

#[derive(Debug, PartialEq)]
enum Normalized<'a> {
    Empty,
    Instant(Timestamp),
    Day(Date),
    Value(&'a Value),
}

fn normalize(value: Option<&Value>) -> Normalized<'_> {
    match value {
        None | Some(Value::Null) => Normalized::Empty,
        Some(original @ Value::String(text)) => {
            if text.is_empty() {
                Normalized::Empty
            } else if let Ok(instant) = text.parse::<Timestamp>() {
                Normalized::Instant(instant)
            } else if let Ok(day) = text.parse::<Date>() {
                Normalized::Day(day)
            } else {
                Normalized::Value(original)
            }
        }
        Some(other) => Normalized::Value(other),
    }
}

fn is_empty(value: Option<&Value>) -> bool {
    normalize(value) == Normalized::Empty
}

fn or_null(value: Option<&Value>) -> Value {
    value.cloned().unwrap_or(Value::Null)
}

/// Minimal field-level changes between two snapshots.
///
/// With no previous snapshot every non-empty field of `new` is reported as
/// added; with no new snapshot every non-empty field of `old` is reported as
/// removed. Otherwise only fields whose normalized values differ are reported.
#[must_use]
pub fn diff(old: Option<&AuditSnapshot>, new: Option<&AuditSnapshot>) -> AuditChanges {
    match (old, new) {
        (None, None) => AuditChanges::new(),
        (None, Some(new)) => new
            .iter()
            .filter(|(_, value)| !is_empty(Some(value)))
            .map(|(field, value)| {
                (
                    field.clone(),
                    FieldChange {
                        old: Value::Null,
                        new: value.clone(),
                    },
                )
            })
            .collect(),
        (Some(old), None) => old
            .iter()
            .filter(|(_, value)| !is_empty(Some(value)))
            .map(|(field, value)| {
                (
                    field.clone(),
                    FieldChange {
                        old: value.clone(),
                        new: Value::Null,
                    },
                )
            })
            .collect(),
        (Some(old), Some(new)) => old
            .keys()
            .chain(new.keys().filter(|field| !old.contains_key(*field)))
            .filter_map(|field| {
                let before = old.get(field);
                let after = new.get(field);

                (normalize(before) != normalize(after)).then(|| {
                    (
                        field.clone(),
                        FieldChange {
                            old: or_null(before),
                            new: or_null(after),
                        },
                    )
                })
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    fn snapshot(value: Value) -> Result<AuditSnapshot, &'static str> {
        match value {
            Value::Object(map) => Ok(map),
            _ => Err("snapshot must be a JSON object"),
        }
    }

    fn change(old: Value, new: Value) -> FieldChange {
        FieldChange { old, new }
    }

    #[test]
    fn created_entity_reports_non_empty_fields() -> TestResult {
        let new = snapshot(json!({ "name": "Acme", "note": "", "fax": null }))?;

        let changes = diff(None, Some(&new));

        assert_eq!(
            changes,
            AuditChanges::from([("name".to_string(), change(Value::Null, json!("Acme")))])
        );

        Ok(())
    }

    #[test]
    fn deleted_entity_reports_non_empty_fields() -> TestResult {
        let old = snapshot(json!({ "name": "Acme", "seats": 4, "note": "" }))?;

        let changes = diff(Some(&old), None);

        assert_eq!(
            changes,
            AuditChanges::from([
                ("name".to_string(), change(json!("Acme"), Value::Null)),
                ("seats".to_string(), change(json!(4), Value::Null)),
            ])
        );

        Ok(())
    }

    #[test]
    fn identical_snapshots_have_no_changes() -> TestResult {
        let old = snapshot(json!({ "name": "A" }))?;
        let new = snapshot(json!({ "name": "A" }))?;

        assert!(diff(Some(&old), Some(&new)).is_empty());

        Ok(())
    }

    #[test]
    fn changed_field_is_reported() -> TestResult {
        let old = snapshot(json!({ "name": "A", "plate": "X1" }))?;
        let new = snapshot(json!({ "name": "B", "plate": "X1" }))?;

        assert_eq!(
            diff(Some(&old), Some(&new)),
            AuditChanges::from([("name".to_string(), change(json!("A"), json!("B")))])
        );

        Ok(())
    }

    #[test]
    fn null_missing_and_empty_string_are_equivalent() -> TestResult {
        let old = snapshot(json!({ "note": null, "fax": "" }))?;
        let new = snapshot(json!({ "note": "", "email": null }))?;

        assert!(diff(Some(&old), Some(&new)).is_empty());

        Ok(())
    }

    #[test]
    fn added_and_removed_fields_are_reported() -> TestResult {
        let old = snapshot(json!({ "vin": "WDB123" }))?;
        let new = snapshot(json!({ "color": "red" }))?;

        assert_eq!(
            diff(Some(&old), Some(&new)),
            AuditChanges::from([
                ("color".to_string(), change(Value::Null, json!("red"))),
                ("vin".to_string(), change(json!("WDB123"), Value::Null)),
            ])
        );

        Ok(())
    }

    #[test]
    fn equal_instants_in_different_notation_are_unchanged() -> TestResult {
        let old = snapshot(json!({ "inspected_at": "2026-03-01T10:00:00Z" }))?;
        let new = snapshot(json!({ "inspected_at": "2026-03-01T12:00:00+02:00" }))?;

        assert!(diff(Some(&old), Some(&new)).is_empty());

        Ok(())
    }

    #[test]
    fn different_instants_are_reported() -> TestResult {
        let old = snapshot(json!({ "inspected_at": "2026-03-01T10:00:00Z" }))?;
        let new = snapshot(json!({ "inspected_at": "2026-03-02T10:00:00Z" }))?;

        assert_eq!(diff(Some(&old), Some(&new)).len(), 1);

        Ok(())
    }

    #[test]
    fn numbers_and_strings_are_not_conflated() -> TestResult {
        let old = snapshot(json!({ "seats": 4 }))?;
        let new = snapshot(json!({ "seats": "4" }))?;

        assert_eq!(diff(Some(&old), Some(&new)).len(), 1);

        Ok(())
    }

    #[test]
    fn nested_values_compare_structurally() -> TestResult {
        let old = snapshot(json!({ "address": { "city": "Riga" } }))?;
        let same = snapshot(json!({ "address": { "city": "Riga" } }))?;
        let moved = snapshot(json!({ "address": { "city": "Tallinn" } }))?;

        assert!(diff(Some(&old), Some(&same)).is_empty());
        assert_eq!(diff(Some(&old), Some(&moved)).len(), 1);

        Ok(())
    }
}
