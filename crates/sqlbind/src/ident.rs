//! Identifier quoting.
//!
//! Table and column names pass through [`quote_field`] everywhere the builder
//! emits them. Bound values never do; values always travel as placeholders,
//! which is the engine's injection defense for everything except the raw
//! fragment escape hatches.

use crate::dialect::Dialect;

/// Quote a possibly dotted identifier for the given dialect.
///
/// The name splits on `.`; every non-empty segment that is not already
/// quote-delimited is wrapped in the dialect's quote character, then the
/// segments rejoin with `.`.
///
/// ```
/// use sqlbind::{quote_field, Dialect};
///
/// assert_eq!(quote_field(Dialect::Sqlite, "users.id"), "`users`.`id`");
/// assert_eq!(quote_field(Dialect::Postgres, "users.id"), "\"users\".\"id\"");
/// ```
pub fn quote_field(dialect: Dialect, name: &str) -> String {
    let quote = dialect.quote_char();
    name.split('.')
        .map(|segment| quote_segment(quote, segment))
        .collect::<Vec<_>>()
        .join(".")
}

fn quote_segment(quote: char, segment: &str) -> String {
    if segment.is_empty() {
        return String::new();
    }
    if is_quote_delimited(segment) {
        return segment.to_string();
    }
    format!("{quote}{segment}{quote}")
}

fn is_quote_delimited(segment: &str) -> bool {
    if segment.len() < 2 {
        return false;
    }
    let bytes = segment.as_bytes();
    let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
    (first == b'`' && last == b'`') || (first == b'"' && last == b'"')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quotes_single_identifier() {
        assert_eq!(quote_field(Dialect::Sqlite, "name"), "`name`");
    }

    #[test]
    fn test_quotes_each_dotted_segment() {
        assert_eq!(quote_field(Dialect::Sqlite, "db.users.id"), "`db`.`users`.`id`");
    }

    #[test]
    fn test_postgres_uses_double_quotes() {
        assert_eq!(quote_field(Dialect::Postgres, "users.id"), "\"users\".\"id\"");
    }

    #[test]
    fn test_already_quoted_segments_pass_through() {
        assert_eq!(quote_field(Dialect::Sqlite, "`users`.id"), "`users`.`id`");
        assert_eq!(
            quote_field(Dialect::Postgres, "\"Users\".id"),
            "\"Users\".\"id\""
        );
    }

    #[test]
    fn test_empty_segments_stay_empty() {
        assert_eq!(quote_field(Dialect::Sqlite, ""), "");
        assert_eq!(quote_field(Dialect::Sqlite, "a..b"), "`a`..`b`");
    }

    #[test]
    fn test_lone_quote_char_is_wrapped_not_passed_through() {
        assert_eq!(quote_field(Dialect::Sqlite, "`"), "```");
    }
}
