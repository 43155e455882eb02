//! prismaguard
//!
//! Check raw SQL queries against the schema described by a Prisma data model,
//! catching table and column name mismatches before runtime.
//!
//! # Features
//!
//! - **Schema derivation**: convert a Prisma DMMF tree into a table/column map
//! - **Dialect detection**: pick the SQL dialect from the datasource provider
//! - **Query extraction**: pull marked queries out of Python source files
//! - **Validation**: parse each query and resolve its table/column references
//!
//! # Example
//!
//! ```ignore
//! use prismaguard::{SchemaMap, SqlDialect, load_dmmf, validate_query};
//!
//! let dmmf = load_dmmf("dmmf.json")?;
//! let schema = SchemaMap::from_dmmf(&dmmf);
//!
//! let issues = validate_query(
//!     "SELECT id FROM jobs WHERE id = %s",
//!     &schema,
//!     SqlDialect::Postgres,
//! );
//! assert!(issues.is_empty());
//! ```

pub mod dialect;
pub mod dmmf;
pub mod error;
pub mod extract;
pub mod schema;
pub mod sql_analysis;
pub mod sql_check;

pub use dialect::SqlDialect;
pub use dmmf::{Dmmf, load_dmmf, parse_dmmf};
pub use error::{GuardError, GuardResult};
pub use extract::{
    CommentMarkerExtractor, ExtractedQuery, QueryExtractor, SqlCommentMarkerExtractor,
};
pub use schema::{ColumnSchema, SchemaMap, TableSchema, prisma_type_to_sql};
pub use sql_analysis::{SqlAnalysis, analyze_sql};
pub use sql_check::{
    ValidationIssue, ValidationIssueKind, validate_query, validate_query_strict,
};
