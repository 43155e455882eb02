//! SQL dialect selection, with best-effort detection from `schema.prisma`.

use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

/// SQL dialect used for parsing and resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    #[default]
    Postgres,
    Mysql,
    Sqlite,
    Tsql,
}

impl SqlDialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlDialect::Postgres => "postgres",
            SqlDialect::Mysql => "mysql",
            SqlDialect::Sqlite => "sqlite",
            SqlDialect::Tsql => "tsql",
        }
    }

    /// The sqlparser dialect implementation for this dialect.
    pub fn parser_dialect(&self) -> Box<dyn sqlparser::dialect::Dialect> {
        use sqlparser::dialect::{MsSqlDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
        match self {
            SqlDialect::Postgres => Box::new(PostgreSqlDialect {}),
            SqlDialect::Mysql => Box::new(MySqlDialect {}),
            SqlDialect::Sqlite => Box::new(SQLiteDialect {}),
            SqlDialect::Tsql => Box::new(MsSqlDialect {}),
        }
    }

    /// Map a Prisma datasource provider to a dialect.
    ///
    /// Unrecognized providers fall back to `Postgres`. CockroachDB speaks the
    /// Postgres dialect; the MongoDB connector still issues SQL-like queries.
    pub fn from_provider(provider: &str) -> Self {
        match provider.to_lowercase().as_str() {
            "postgresql" | "postgres" | "cockroachdb" | "mongodb" => SqlDialect::Postgres,
            "mysql" => SqlDialect::Mysql,
            "sqlite" => SqlDialect::Sqlite,
            "sqlserver" => SqlDialect::Tsql,
            _ => SqlDialect::Postgres,
        }
    }

    /// Detect the dialect from `schema.prisma` text.
    ///
    /// Looks for `datasource db { provider = "postgresql" }` (the value may
    /// be unquoted). Absent or unrecognized providers yield `Postgres`.
    pub fn detect(schema_text: &str) -> Self {
        static PROVIDER_RE: OnceLock<Regex> = OnceLock::new();
        let re = PROVIDER_RE.get_or_init(|| {
            Regex::new(r#"datasource\s+\w+\s*\{[^}]*provider\s*=\s*["']?(\w+)["']?"#)
                .expect("provider regex")
        });

        match re.captures(schema_text) {
            Some(caps) => Self::from_provider(&caps[1]),
            None => SqlDialect::Postgres,
        }
    }

    /// Detect the dialect from a `schema.prisma` file.
    ///
    /// Read failures are not surfaced: the default dialect is returned.
    pub fn detect_from_file(path: impl AsRef<Path>) -> Self {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(text) => Self::detect(&text),
            Err(_) => SqlDialect::Postgres,
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SqlDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" => Ok(SqlDialect::Postgres),
            "mysql" => Ok(SqlDialect::Mysql),
            "sqlite" => Ok(SqlDialect::Sqlite),
            "tsql" => Ok(SqlDialect::Tsql),
            other => Err(format!("unknown dialect: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_quoted_and_unquoted_providers() {
        let schema = r#"
datasource db {
  provider = "mysql"
  url      = env("DATABASE_URL")
}
"#;
        assert_eq!(SqlDialect::detect(schema), SqlDialect::Mysql);

        let unquoted = "datasource db {\n  provider = sqlite\n}\n";
        assert_eq!(SqlDialect::detect(unquoted), SqlDialect::Sqlite);
    }

    #[test]
    fn key_order_inside_the_block_is_irrelevant() {
        let schema = r#"
datasource db {
  url      = env("DATABASE_URL")
  provider = "sqlserver"
}
"#;
        assert_eq!(SqlDialect::detect(schema), SqlDialect::Tsql);
    }

    #[test]
    fn provider_aliases_map_to_postgres() {
        assert_eq!(SqlDialect::from_provider("postgresql"), SqlDialect::Postgres);
        assert_eq!(SqlDialect::from_provider("cockroachdb"), SqlDialect::Postgres);
        assert_eq!(SqlDialect::from_provider("mongodb"), SqlDialect::Postgres);
        assert_eq!(SqlDialect::from_provider("oracle"), SqlDialect::Postgres);
    }

    #[test]
    fn missing_block_or_file_defaults_to_postgres() {
        assert_eq!(SqlDialect::detect("generator client {}"), SqlDialect::Postgres);
        assert_eq!(
            SqlDialect::detect_from_file("/nonexistent/prisma/schema.prisma"),
            SqlDialect::Postgres
        );
    }

    #[test]
    fn dialect_names_round_trip() {
        for d in [
            SqlDialect::Postgres,
            SqlDialect::Mysql,
            SqlDialect::Sqlite,
            SqlDialect::Tsql,
        ] {
            assert_eq!(d.as_str().parse::<SqlDialect>().unwrap(), d);
        }
        assert!("mariadb".parse::<SqlDialect>().is_err());
    }
}
