//! Row-to-struct hydration.
//!
//! A [`Record`] type exposes a static descriptor table mapping column names
//! (plus optional aliases) to setter functions. Hydration walks a result
//! set's columns once, pairs each with its descriptor entry, and reuses that
//! plan for every row. Columns without a descriptor entry are skipped;
//! values that do not fit the target field surface as [`Error::Decode`]
//! naming the column.

use crate::error::{Error, Result};
use crate::handle::Row;
use crate::value::Value;

/// A value that could not be converted into the requested field type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMismatch {
    expected: &'static str,
    found: String,
}

impl TypeMismatch {
    pub fn new(expected: &'static str, found: &Value) -> TypeMismatch {
        TypeMismatch {
            expected,
            found: found.type_name().to_string(),
        }
    }
}

impl std::fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "expected {}, found {}", self.expected, self.found)
    }
}

/// Conversion from a database [`Value`] into a field type.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> std::result::Result<Self, TypeMismatch>;
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> std::result::Result<i64, TypeMismatch> {
        match value {
            Value::Integer(number) => Ok(*number),
            other => Err(TypeMismatch::new("integer", other)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> std::result::Result<i32, TypeMismatch> {
        match value {
            Value::Integer(number) => {
                i32::try_from(*number).map_err(|_| TypeMismatch::new("32-bit integer", value))
            }
            other => Err(TypeMismatch::new("32-bit integer", other)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> std::result::Result<f64, TypeMismatch> {
        match value {
            Value::Real(number) => Ok(*number),
            Value::Integer(number) => Ok(*number as f64),
            other => Err(TypeMismatch::new("real", other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> std::result::Result<bool, TypeMismatch> {
        match value {
            Value::Bool(flag) => Ok(*flag),
            Value::Integer(0) => Ok(false),
            Value::Integer(1) => Ok(true),
            other => Err(TypeMismatch::new("boolean", other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> std::result::Result<String, TypeMismatch> {
        match value {
            Value::Text(text) => Ok(text.clone()),
            other => Err(TypeMismatch::new("text", other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> std::result::Result<Vec<u8>, TypeMismatch> {
        match value {
            Value::Blob(bytes) => Ok(bytes.clone()),
            other => Err(TypeMismatch::new("blob", other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> std::result::Result<Option<T>, TypeMismatch> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> std::result::Result<Value, TypeMismatch> {
        Ok(value.clone())
    }
}

/// One entry of a record's descriptor table.
pub struct RecordColumn<T> {
    /// Column name this field hydrates from.
    pub name: &'static str,
    /// Alternate spelling matched when `name` does not appear in the result
    /// set, typically the lowerCamelCase form of a snake_case field.
    pub alias: Option<&'static str>,
    /// Writes a converted value into the field.
    pub set: fn(&mut T, &Value) -> std::result::Result<(), TypeMismatch>,
}

/// Types hydratable from result rows via a static descriptor table.
///
/// Usually derived:
///
/// ```ignore
/// #[derive(Debug, Default, Record)]
/// struct User {
///     id: i64,
///     name: String,
///     #[record(column = "signup_email")]
///     email: Option<String>,
/// }
/// ```
pub trait Record: Default + 'static {
    fn columns() -> &'static [RecordColumn<Self>];
}

/// Hydrate every row of a result set into `T`.
pub fn hydrate_all<T: Record>(rows: &[Row]) -> Result<Vec<T>> {
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };
    let plan = column_plan::<T>(first.columns());
    rows.iter().map(|row| hydrate_with(&plan, row)).collect()
}

/// Hydrate a single row into `T`.
pub fn hydrate_one<T: Record>(row: &Row) -> Result<T> {
    let plan = column_plan::<T>(row.columns());
    hydrate_with(&plan, row)
}

fn column_plan<T: Record>(columns: &[String]) -> Vec<Option<&'static RecordColumn<T>>> {
    columns
        .iter()
        .map(|column| {
            T::columns().iter().find(|rc| {
                rc.name == column.as_str() || rc.alias.is_some_and(|alias| alias == column.as_str())
            })
        })
        .collect()
}

fn hydrate_with<T: Record>(plan: &[Option<&'static RecordColumn<T>>], row: &Row) -> Result<T> {
    let mut record = T::default();
    for (entry, value) in plan.iter().zip(row.values()) {
        if let Some(rc) = entry {
            (rc.set)(&mut record, value)
                .map_err(|mismatch| Error::decode(rc.name, mismatch.to_string()))?;
        }
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Person {
        id: i64,
        name: String,
        age: Option<i64>,
    }

    fn set_id(record: &mut Person, value: &Value) -> std::result::Result<(), TypeMismatch> {
        record.id = i64::from_value(value)?;
        Ok(())
    }

    fn set_name(record: &mut Person, value: &Value) -> std::result::Result<(), TypeMismatch> {
        record.name = String::from_value(value)?;
        Ok(())
    }

    fn set_age(record: &mut Person, value: &Value) -> std::result::Result<(), TypeMismatch> {
        record.age = Option::<i64>::from_value(value)?;
        Ok(())
    }

    impl Record for Person {
        fn columns() -> &'static [RecordColumn<Person>] {
            static COLUMNS: &[RecordColumn<Person>] = &[
                RecordColumn {
                    name: "id",
                    alias: None,
                    set: set_id,
                },
                RecordColumn {
                    name: "name",
                    alias: None,
                    set: set_name,
                },
                RecordColumn {
                    name: "age",
                    alias: Some("personAge"),
                    set: set_age,
                },
            ];
            COLUMNS
        }
    }

    fn row(columns: &Arc<Vec<String>>, values: Vec<Value>) -> Row {
        Row::new(Arc::clone(columns), values)
    }

    #[test]
    fn test_hydrates_matching_columns_and_skips_the_rest() {
        let columns = Arc::new(vec![
            "id".to_string(),
            "name".to_string(),
            "unrelated".to_string(),
        ]);
        let rows = vec![
            row(
                &columns,
                vec![Value::Integer(1), Value::Text("ada".into()), Value::Null],
            ),
            row(
                &columns,
                vec![
                    Value::Integer(2),
                    Value::Text("grace".into()),
                    Value::Integer(99),
                ],
            ),
        ];
        let people: Vec<Person> = hydrate_all(&rows).unwrap();
        assert_eq!(
            people,
            vec![
                Person {
                    id: 1,
                    name: "ada".into(),
                    age: None
                },
                Person {
                    id: 2,
                    name: "grace".into(),
                    age: None
                },
            ]
        );
    }

    #[test]
    fn test_alias_matches_when_name_is_absent() {
        let columns = Arc::new(vec!["id".to_string(), "personAge".to_string()]);
        let person: Person = hydrate_one(&row(
            &columns,
            vec![Value::Integer(3), Value::Integer(41)],
        ))
        .unwrap();
        assert_eq!(person.age, Some(41));
    }

    #[test]
    fn test_mismatched_value_reports_the_column() {
        let columns = Arc::new(vec!["id".to_string()]);
        let err = hydrate_one::<Person>(&row(&columns, vec![Value::Text("oops".into())]))
            .unwrap_err();
        match err {
            Error::Decode { column, message } => {
                assert_eq!(column, "id");
                assert_eq!(message, "expected integer, found text");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_null_into_non_optional_field_is_a_mismatch() {
        let columns = Arc::new(vec!["name".to_string()]);
        let err = hydrate_one::<Person>(&row(&columns, vec![Value::Null])).unwrap_err();
        assert!(matches!(err, Error::Decode { column, .. } if column == "name"));
    }

    #[test]
    fn test_empty_result_set_hydrates_to_empty_vec() {
        let people: Vec<Person> = hydrate_all(&[]).unwrap();
        assert!(people.is_empty());
    }

    // Downstream helpers carry nothing but the `Record` bound.
    fn hydrate_generically<T: Record>(rows: &[Row]) -> Result<Vec<T>> {
        hydrate_all(rows)
    }

    #[test]
    fn test_record_bound_alone_supports_generic_hydration() {
        let columns = Arc::new(vec!["id".to_string(), "name".to_string()]);
        let people: Vec<Person> = hydrate_generically(&[row(
            &columns,
            vec![Value::Integer(7), Value::Text("ada".into())],
        )])
        .unwrap();
        assert_eq!(people[0].id, 7);
        assert_eq!(people[0].name, "ada");
    }
}
