//! Derive macro for `sqlbind`'s `Record` trait.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod record;

/// Derives `Record` for a struct with named fields, mapping result-set
/// columns onto fields by name.
///
/// Each snake_case field also matches its lowerCamelCase spelling, so a
/// projection like `age AS userAge` still hydrates a `user_age` field.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, Default, Record)]
/// struct User {
///     id: i64,
///     name: String,
///     #[record(column = "signup_email")]
///     email: Option<String>,
///     #[record(skip)]
///     cached_score: f64,
/// }
/// ```
///
/// # Attributes
///
/// - `#[record(column = "...")]`: hydrate from this exact column instead of
///   the field name; disables the camelCase alias.
/// - `#[record(skip)]`: never hydrate this field; it keeps its `Default`
///   value.
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|error| error.to_compile_error())
        .into()
}
