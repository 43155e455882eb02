//! Validate SQL queries against a Prisma-derived schema map.
//!
//! Validates table existence and column references in SELECT projections,
//! WHERE/JOIN/ORDER BY/GROUP BY predicates, aggregate arguments, and
//! subqueries.
//!
//! Known limitations:
//! - INSERT column lists and UPDATE SET target columns are not checked
//!   (they are not expression positions).
//! - CTE and derived-table column sets are not tracked; qualified references
//!   through them are accepted.
//! - Scope is flat per statement: an unqualified column is matched against
//!   every referenced table, so a column shared by an outer table and a
//!   subquery table reads as ambiguous.
//! - Data types and constraints are not checked.

use crate::dialect::SqlDialect;
use crate::error::{GuardError, GuardResult};
use crate::schema::SchemaMap;
use crate::sql_analysis::{SqlAnalysis, analyze_sql};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationIssueKind {
    SyntaxError,
    UnknownTable,
    UnknownColumn,
    AmbiguousColumn,
    SchemaError,
}

/// One validation finding; `Display` renders the user-visible error string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub kind: ValidationIssueKind,
    pub message: String,
}

impl ValidationIssue {
    fn new(kind: ValidationIssueKind, message: impl Into<String>) -> Self {
        ValidationIssue {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// Present on every Postgres table without being introspectable from the
// data model.
const SYSTEM_COLUMNS: &[&str] = &["ctid", "xmin", "xmax", "cmin", "cmax", "tableoid"];

/// Validate a query against the schema map.
///
/// Returns an empty list iff the query parses under the dialect, every
/// referenced table exists, and every checked column reference resolves.
/// Pure: identical inputs always yield the identical issue list.
///
/// # Example
/// ```
/// use prismaguard::{SchemaMap, SqlDialect, validate_query};
/// use prismaguard::dmmf::parse_dmmf;
///
/// let dmmf = parse_dmmf(r#"{"datamodel": {"models": [
///     {"name": "jobs", "fields": [
///         {"name": "id", "kind": "scalar", "type": "Int"},
///         {"name": "status", "kind": "scalar", "type": "String"}
///     ]}
/// ]}}"#).unwrap();
/// let schema = SchemaMap::from_dmmf(&dmmf);
///
/// assert!(validate_query("SELECT id FROM jobs", &schema, SqlDialect::Postgres).is_empty());
/// assert!(!validate_query("SELECT id FROM tasks", &schema, SqlDialect::Postgres).is_empty());
/// ```
pub fn validate_query(
    query: &str,
    schema: &SchemaMap,
    dialect: SqlDialect,
) -> Vec<ValidationIssue> {
    // `%s` is not valid SQL; normalize to the parser's placeholder token.
    let normalized = query.replace("%s", "?");

    let analysis = analyze_sql(&normalized, dialect);
    if !analysis.parse_result.valid {
        let detail = analysis
            .parse_result
            .error
            .unwrap_or_else(|| "unknown parse error".to_string());
        return vec![ValidationIssue::new(
            ValidationIssueKind::SyntaxError,
            format!("SQL syntax error: {detail}"),
        )];
    }

    let mut issues = Vec::new();

    for table in &analysis.table_names {
        if !schema.has_table(table) {
            issues.push(ValidationIssue::new(
                ValidationIssueKind::UnknownTable,
                format!("Table \"{table}\" not found in schema"),
            ));
        }
    }

    // A missing table makes column errors pure noise; stop here.
    if !issues.is_empty() {
        return issues;
    }

    check_columns(&analysis, schema, &mut issues);
    issues
}

/// Validate a query, failing on the first issue list.
///
/// The error message is `Query validation failed: ` followed by the
/// semicolon-joined issues.
pub fn validate_query_strict(
    query: &str,
    schema: &SchemaMap,
    dialect: SqlDialect,
) -> GuardResult<()> {
    let issues = validate_query(query, schema, dialect);
    if issues.is_empty() {
        return Ok(());
    }

    let joined = issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    Err(GuardError::Validation(format!(
        "Query validation failed: {joined}"
    )))
}

fn check_columns(analysis: &SqlAnalysis, schema: &SchemaMap, issues: &mut Vec<ValidationIssue>) {
    for column_ref in &analysis.column_refs {
        match column_ref.parts.as_slice() {
            [] => {}

            // Unqualified: col
            [col] => {
                if SYSTEM_COLUMNS.contains(&col.to_lowercase().as_str())
                    || analysis.select_aliases.contains(&col.to_lowercase())
                {
                    continue;
                }

                let matches = analysis
                    .table_names
                    .iter()
                    .filter_map(|t| schema.find_table(t))
                    .filter(|t| t.has_column(col))
                    .count();

                match matches {
                    0 => issues.push(ValidationIssue::new(
                        ValidationIssueKind::UnknownColumn,
                        format!("Column \"{col}\" not found in schema"),
                    )),
                    1 => {}
                    _ => issues.push(ValidationIssue::new(
                        ValidationIssueKind::AmbiguousColumn,
                        format!("Ambiguous column reference: {col} (found in multiple tables)"),
                    )),
                }
            }

            // Qualified: qualifier.col
            [qualifier, col] => {
                check_qualified(analysis, schema, qualifier, col, issues);
            }

            // schema.table.col or catalog.schema.table.col
            [.., table, col] if column_ref.parts.len() <= 4 => {
                check_qualified(analysis, schema, table, col, issues);
            }

            parts => issues.push(ValidationIssue::new(
                ValidationIssueKind::SchemaError,
                format!(
                    "Schema validation error: unsupported column reference form: {}",
                    parts.join(".")
                ),
            )),
        }
    }
}

fn check_qualified(
    analysis: &SqlAnalysis,
    schema: &SchemaMap,
    qualifier: &str,
    col: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    let qualifier_lc = qualifier.to_lowercase();

    if SYSTEM_COLUMNS.contains(&col.to_lowercase().as_str()) {
        return;
    }

    // CTE and derived-table column sets are not tracked; `excluded` is the
    // Postgres ON CONFLICT pseudo-relation.
    if analysis.cte_names.contains(&qualifier_lc)
        || analysis.derived_aliases.contains(&qualifier_lc)
        || qualifier_lc == "excluded"
    {
        return;
    }

    let mut qualifier_to_table: Option<&str> = None;
    for rv in &analysis.range_vars {
        let visible = rv.alias.as_deref().unwrap_or(&rv.table);
        if visible == qualifier_lc {
            qualifier_to_table = Some(&rv.table);
            break;
        }
    }

    let table = match qualifier_to_table {
        Some(table) => table.to_string(),
        // Not a FROM-clause qualifier; accept a bare schema-known table name
        // (covers schema-qualified forms like public.jobs.id).
        None if schema.has_table(&qualifier_lc) => qualifier_lc.clone(),
        None => {
            issues.push(ValidationIssue::new(
                ValidationIssueKind::UnknownTable,
                format!("Unknown table or alias qualifier: {qualifier}"),
            ));
            return;
        }
    };

    if analysis.cte_names.contains(&table) {
        return;
    }

    match schema.find_table(&table) {
        Some(table_schema) => {
            if !table_schema.has_column(col) {
                issues.push(ValidationIssue::new(
                    ValidationIssueKind::UnknownColumn,
                    format!("Column \"{col}\" not found in table \"{table}\""),
                ));
            }
        }
        // Referenced tables were existence-checked before column resolution.
        None => issues.push(ValidationIssue::new(
            ValidationIssueKind::UnknownTable,
            format!("Table \"{table}\" not found in schema"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dmmf::parse_dmmf;

    fn jobs_schema() -> SchemaMap {
        let raw = r#"{
            "datamodel": {
                "models": [
                    {
                        "name": "jobs",
                        "fields": [
                            {"name": "id", "kind": "scalar", "type": "Int"},
                            {"name": "status", "kind": "scalar", "type": "String"},
                            {"name": "user_id", "kind": "scalar", "type": "Int"}
                        ]
                    },
                    {
                        "name": "users",
                        "fields": [
                            {"name": "id", "kind": "scalar", "type": "Int"},
                            {"name": "email", "kind": "scalar", "type": "String"}
                        ]
                    }
                ]
            }
        }"#;
        SchemaMap::from_dmmf(&parse_dmmf(raw).unwrap())
    }

    #[test]
    fn valid_query_with_placeholder() {
        let issues = validate_query(
            "SELECT id FROM jobs WHERE id = %s",
            &jobs_schema(),
            SqlDialect::Postgres,
        );
        assert!(issues.is_empty(), "{issues:?}");
    }

    #[test]
    fn unknown_table_is_reported() {
        let issues = validate_query(
            "SELECT id FROM apply_jobs WHERE id = %s",
            &jobs_schema(),
            SqlDialect::Postgres,
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, ValidationIssueKind::UnknownTable);
        assert_eq!(
            issues[0].to_string(),
            "Table \"apply_jobs\" not found in schema"
        );
    }

    #[test]
    fn unknown_table_short_circuits_column_checks() {
        let issues = validate_query(
            "SELECT bogus_column FROM apply_jobs",
            &jobs_schema(),
            SqlDialect::Postgres,
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, ValidationIssueKind::UnknownTable);
    }

    #[test]
    fn unknown_column_is_reported() {
        let issues = validate_query(
            "SELECT invalid_column FROM jobs",
            &jobs_schema(),
            SqlDialect::Postgres,
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, ValidationIssueKind::UnknownColumn);
        assert!(issues[0].message.contains("invalid_column"));
        assert!(issues[0].message.contains("not found"));
    }

    #[test]
    fn syntax_error_is_reported() {
        let issues = validate_query("SELECTT id FROMM jobs", &jobs_schema(), SqlDialect::Postgres);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, ValidationIssueKind::SyntaxError);
        assert!(issues[0].message.starts_with("SQL syntax error: "));
    }

    #[test]
    fn alias_qualified_columns_resolve() {
        let schema = jobs_schema();
        let issues = validate_query(
            "SELECT j.status FROM jobs j WHERE j.id = %s",
            &schema,
            SqlDialect::Postgres,
        );
        assert!(issues.is_empty(), "{issues:?}");

        let issues = validate_query(
            "SELECT j.nope FROM jobs j",
            &schema,
            SqlDialect::Postgres,
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].to_string(),
            "Column \"nope\" not found in table \"jobs\""
        );
    }

    #[test]
    fn join_with_qualified_columns() {
        let issues = validate_query(
            "SELECT jobs.id, users.email FROM jobs JOIN users ON users.id = jobs.user_id",
            &jobs_schema(),
            SqlDialect::Postgres,
        );
        assert!(issues.is_empty(), "{issues:?}");
    }

    #[test]
    fn ambiguous_unqualified_column() {
        let issues = validate_query(
            "SELECT id FROM jobs JOIN users ON jobs.user_id = users.id",
            &jobs_schema(),
            SqlDialect::Postgres,
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, ValidationIssueKind::AmbiguousColumn);
    }

    #[test]
    fn unknown_qualifier_is_reported() {
        let issues = validate_query(
            "SELECT x.id FROM jobs",
            &jobs_schema(),
            SqlDialect::Postgres,
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, ValidationIssueKind::UnknownTable);
        assert!(issues[0].message.contains("Unknown table or alias qualifier"));
    }

    #[test]
    fn cte_names_and_aliases_are_accepted() {
        let schema = jobs_schema();
        let issues = validate_query(
            "WITH recent AS (SELECT id, status FROM jobs) SELECT r.id FROM recent r",
            &schema,
            SqlDialect::Postgres,
        );
        assert!(issues.is_empty(), "{issues:?}");
    }

    #[test]
    fn select_alias_in_order_by_is_accepted() {
        let issues = validate_query(
            "SELECT status AS current_status FROM jobs ORDER BY current_status",
            &jobs_schema(),
            SqlDialect::Postgres,
        );
        assert!(issues.is_empty(), "{issues:?}");
    }

    #[test]
    fn insert_column_list_is_not_checked() {
        // DML target column lists are outside the resolver's scope.
        let issues = validate_query(
            "INSERT INTO jobs (id, definitely_missing) VALUES (%s, %s)",
            &jobs_schema(),
            SqlDialect::Postgres,
        );
        assert!(issues.is_empty(), "{issues:?}");
    }

    #[test]
    fn update_where_clause_is_checked() {
        let schema = jobs_schema();
        let issues = validate_query(
            "UPDATE jobs SET status = %s WHERE missing_col = %s",
            &schema,
            SqlDialect::Postgres,
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, ValidationIssueKind::UnknownColumn);
        assert!(issues[0].message.contains("missing_col"));
    }

    #[test]
    fn quoted_identifiers_resolve_case_insensitively() {
        let raw = r#"{
            "datamodel": {
                "models": [
                    {
                        "name": "Session",
                        "fields": [
                            {"name": "shop", "kind": "scalar", "type": "String"},
                            {"name": "firstName", "kind": "scalar", "type": "String"},
                            {"name": "isOnline", "kind": "scalar", "type": "Boolean"}
                        ]
                    }
                ]
            }
        }"#;
        let schema = SchemaMap::from_dmmf(&parse_dmmf(raw).unwrap());

        // Unquoted table reference hits the lowercased table key; quoted
        // column references keep their case and match case-insensitively.
        let issues = validate_query(
            r#"SELECT shop, "firstName" FROM "Session" WHERE "isOnline" = true"#,
            &schema,
            SqlDialect::Postgres,
        );
        assert!(issues.is_empty(), "{issues:?}");
    }

    #[test]
    fn validation_is_pure() {
        let schema = jobs_schema();
        let first = validate_query("SELECT id FROM apply_jobs", &schema, SqlDialect::Postgres);
        let second = validate_query("SELECT id FROM apply_jobs", &schema, SqlDialect::Postgres);
        assert_eq!(first, second);
    }

    #[test]
    fn strict_mode_joins_issues() {
        let schema = jobs_schema();
        assert!(validate_query_strict("SELECT id FROM jobs", &schema, SqlDialect::Postgres).is_ok());

        let err = validate_query_strict(
            "SELECT id FROM apply_jobs",
            &schema,
            SqlDialect::Postgres,
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Query validation failed: "));
        assert!(message.contains("apply_jobs"));
    }
}
