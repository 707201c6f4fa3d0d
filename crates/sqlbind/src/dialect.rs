//! Dialect strategy.
//!
//! The dialect is selected exactly once, when a builder is constructed, from
//! the handle's reported driver name and server version. It decides the
//! identifier quote character and which upsert conflict clause the insert
//! generator emits; nothing else in SQL generation branches on it.

/// MySQL release that replaced `VALUES(col)` inside `ON DUPLICATE KEY UPDATE`
/// with the row-alias form introduced in 8.0.19.
const MYSQL_ALIAS_CUTOVER: (u64, u64, u64) = (8, 0, 20);

/// Vendor syntax variant, fixed per builder at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `values_alias` is true at/after the 8.0.20 cutover, where the upsert
    /// update list must read `col = new.col` instead of `col = VALUES(col)`.
    MySql { values_alias: bool },
    Postgres,
    Sqlite,
    /// Unrecognized driver: quotes like MySQL, fails at upsert generation.
    Unknown,
}

impl Dialect {
    /// Map a driver name plus server version string to a dialect.
    pub fn from_driver(driver: &str, server_version: &str) -> Dialect {
        match driver.to_ascii_lowercase().as_str() {
            "mysql" => Dialect::MySql {
                values_alias: parse_server_version(server_version) >= MYSQL_ALIAS_CUTOVER,
            },
            "pgsql" | "postgres" | "postgresql" => Dialect::Postgres,
            "sqlite" | "sqlite3" => Dialect::Sqlite,
            _ => Dialect::Unknown,
        }
    }

    /// Identifier quote character.
    ///
    /// SQLite accepts MySQL-style backticks, which keeps identifier output
    /// stable across the two; Postgres requires double quotes.
    pub fn quote_char(self) -> char {
        match self {
            Dialect::Postgres => '"',
            _ => '`',
        }
    }
}

/// Extract the leading `major.minor.patch` triple from a server version
/// string, tolerating vendor suffixes such as `8.0.22-0ubuntu0.20.04.2`.
/// Missing components read as zero.
pub(crate) fn parse_server_version(version: &str) -> (u64, u64, u64) {
    let mut parts = [0u64; 3];
    let mut idx = 0;
    let mut current: Option<u64> = None;
    for ch in version.chars() {
        if let Some(digit) = ch.to_digit(10) {
            current = Some(current.unwrap_or(0) * 10 + u64::from(digit));
        } else {
            if let Some(n) = current.take() {
                parts[idx] = n;
                idx += 1;
                if idx == 3 {
                    break;
                }
            }
            if ch != '.' {
                break;
            }
        }
    }
    if idx < 3 {
        if let Some(n) = current {
            parts[idx] = n;
        }
    }
    (parts[0], parts[1], parts[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_plain_versions() {
        assert_eq!(parse_server_version("8.0.19"), (8, 0, 19));
        assert_eq!(parse_server_version("5.7.44"), (5, 7, 44));
        assert_eq!(parse_server_version("16.2"), (16, 2, 0));
        assert_eq!(parse_server_version(""), (0, 0, 0));
    }

    #[test]
    fn test_parses_vendor_suffixed_versions() {
        assert_eq!(parse_server_version("8.0.22-0ubuntu0.20.04.2"), (8, 0, 22));
        assert_eq!(parse_server_version("10.11.6-MariaDB-log"), (10, 11, 6));
    }

    #[test]
    fn test_mysql_alias_cutover_boundary() {
        assert_eq!(
            Dialect::from_driver("mysql", "8.0.19"),
            Dialect::MySql { values_alias: false }
        );
        assert_eq!(
            Dialect::from_driver("mysql", "8.0.20"),
            Dialect::MySql { values_alias: true }
        );
        assert_eq!(
            Dialect::from_driver("mysql", "8.1.0"),
            Dialect::MySql { values_alias: true }
        );
        assert_eq!(
            Dialect::from_driver("MySQL", "5.7.44"),
            Dialect::MySql { values_alias: false }
        );
    }

    #[test]
    fn test_driver_name_mapping() {
        assert_eq!(Dialect::from_driver("pgsql", "16.2"), Dialect::Postgres);
        assert_eq!(Dialect::from_driver("postgres", "15.3"), Dialect::Postgres);
        assert_eq!(Dialect::from_driver("sqlite", "3.45.0"), Dialect::Sqlite);
        assert_eq!(Dialect::from_driver("mssql", "15.0"), Dialect::Unknown);
    }

    #[test]
    fn test_quote_chars() {
        assert_eq!(Dialect::MySql { values_alias: false }.quote_char(), '`');
        assert_eq!(Dialect::Sqlite.quote_char(), '`');
        assert_eq!(Dialect::Unknown.quote_char(), '`');
        assert_eq!(Dialect::Postgres.quote_char(), '"');
    }
}
