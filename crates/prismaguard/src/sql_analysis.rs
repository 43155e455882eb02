//! Dialect-aware SQL analysis.
//!
//! Parses a query and collects everything the schema check needs in a single
//! traversal: referenced tables, aliases, CTE names, and column references.

use crate::dialect::SqlDialect;
use sqlparser::ast::{
    Expr, FromTable, ObjectName, ObjectNamePart, Query, SelectItem, SetExpr, Statement,
    TableFactor, TableWithJoins, Visit, Visitor,
};
use sqlparser::parser::Parser;
use std::collections::HashSet;
use std::ops::ControlFlow;

/// Result of SQL parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    /// Whether the SQL is syntactically valid under the dialect.
    pub valid: bool,
    /// Error message if invalid.
    pub error: Option<String>,
}

impl Default for ParseResult {
    fn default() -> Self {
        ParseResult {
            valid: true,
            error: None,
        }
    }
}

/// A table reference with its optional alias, lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeVarRef {
    pub table: String,
    pub alias: Option<String>,
}

/// A column reference; `parts` holds the identifier path (e.g. `["j", "id"]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub parts: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SqlAnalysis {
    pub parse_result: ParseResult,

    /// Lowercased CTE names declared anywhere in the statement.
    pub cte_names: HashSet<String>,
    /// FROM/JOIN/DML-target table factors with their aliases.
    pub range_vars: Vec<RangeVarRef>,
    /// All referenced table names, lowercased, CTE references excluded,
    /// deduplicated in first-reference order.
    pub table_names: Vec<String>,
    /// Column references in expression position, deduplicated.
    pub column_refs: Vec<ColumnRef>,
    /// Lowercased output aliases from SELECT projections.
    pub select_aliases: HashSet<String>,
    /// Lowercased aliases of derived tables (subqueries in FROM).
    pub derived_aliases: HashSet<String>,
}

impl SqlAnalysis {
    fn invalid(error: String) -> Self {
        SqlAnalysis {
            parse_result: ParseResult {
                valid: false,
                error: Some(error),
            },
            ..SqlAnalysis::default()
        }
    }
}

/// Parse `sql` under `dialect` and collect schema-relevant references.
///
/// All statements in the input are analyzed; the collections are unioned.
pub fn analyze_sql(sql: &str, dialect: SqlDialect) -> SqlAnalysis {
    let parser_dialect = dialect.parser_dialect();
    let statements = match Parser::parse_sql(parser_dialect.as_ref(), sql) {
        Ok(statements) => statements,
        Err(e) => return SqlAnalysis::invalid(e.to_string()),
    };

    if statements.is_empty() {
        return SqlAnalysis::invalid("empty SQL statement".to_string());
    }

    let mut collector = Collector::default();
    let _: ControlFlow<()> = statements.visit(&mut collector);

    // CTE references look like plain table references in the AST; drop them
    // once every WITH clause has been seen.
    let table_names = collector
        .relations
        .into_iter()
        .filter(|t| !collector.cte_names.contains(t))
        .collect();

    SqlAnalysis {
        parse_result: ParseResult::default(),
        cte_names: collector.cte_names,
        range_vars: collector.range_vars,
        table_names,
        column_refs: collector.column_refs,
        select_aliases: collector.select_aliases,
        derived_aliases: collector.derived_aliases,
    }
}

#[derive(Debug, Default)]
struct Collector {
    cte_names: HashSet<String>,
    range_vars: Vec<RangeVarRef>,
    relations: Vec<String>,
    column_refs: Vec<ColumnRef>,
    select_aliases: HashSet<String>,
    derived_aliases: HashSet<String>,
}

impl Visitor for Collector {
    type Break = ();

    fn pre_visit_statement(&mut self, statement: &Statement) -> ControlFlow<()> {
        // UPDATE and DELETE targets sit outside any Query node.
        match statement {
            Statement::Update(update) => self.collect_table_with_joins(&update.table),
            Statement::Delete(delete) => {
                if let FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables) =
                    &delete.from
                {
                    for table in tables {
                        self.collect_table_with_joins(table);
                    }
                }
            }
            _ => {}
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<()> {
        if let Some(with) = &query.with {
            for cte in &with.cte_tables {
                self.cte_names.insert(cte.alias.name.value.to_lowercase());
            }
        }
        self.collect_set_expr(query.body.as_ref());
        ControlFlow::Continue(())
    }

    fn pre_visit_relation(&mut self, relation: &ObjectName) -> ControlFlow<()> {
        let name = object_name_tail(relation).to_lowercase();
        if !self.relations.contains(&name) {
            self.relations.push(name);
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<()> {
        let parts: Vec<String> = match expr {
            Expr::Identifier(ident) => vec![ident.value.clone()],
            Expr::CompoundIdentifier(idents) => {
                idents.iter().map(|i| i.value.clone()).collect()
            }
            _ => return ControlFlow::Continue(()),
        };

        let column_ref = ColumnRef { parts };
        if !self.column_refs.contains(&column_ref) {
            self.column_refs.push(column_ref);
        }
        ControlFlow::Continue(())
    }
}

impl Collector {
    fn collect_set_expr(&mut self, set_expr: &SetExpr) {
        match set_expr {
            SetExpr::Select(select) => {
                for item in &select.projection {
                    if let SelectItem::ExprWithAlias { alias, .. } = item {
                        self.select_aliases.insert(alias.value.to_lowercase());
                    }
                }
                for table in &select.from {
                    self.collect_table_with_joins(table);
                }
            }
            SetExpr::SetOperation { left, right, .. } => {
                self.collect_set_expr(left);
                self.collect_set_expr(right);
            }
            // Parenthesized queries are Query nodes and get their own
            // pre_visit_query call.
            _ => {}
        }
    }

    fn collect_table_with_joins(&mut self, table: &TableWithJoins) {
        self.collect_table_factor(&table.relation);
        for join in &table.joins {
            self.collect_table_factor(&join.relation);
        }
    }

    fn collect_table_factor(&mut self, factor: &TableFactor) {
        match factor {
            TableFactor::Table { name, alias, .. } => {
                let range_var = RangeVarRef {
                    table: object_name_tail(name).to_lowercase(),
                    alias: alias.as_ref().map(|a| a.name.value.to_lowercase()),
                };
                if !self.range_vars.contains(&range_var) {
                    self.range_vars.push(range_var);
                }
            }
            TableFactor::Derived {
                alias: Some(alias), ..
            } => {
                self.derived_aliases.insert(alias.name.value.to_lowercase());
            }
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => {
                self.collect_table_with_joins(table_with_joins);
            }
            _ => {}
        }
    }
}

/// Last identifier segment of a possibly qualified name (`public.jobs` -> `jobs`).
fn object_name_tail(name: &ObjectName) -> String {
    match name.0.last() {
        Some(ObjectNamePart::Identifier(ident)) => ident.value.clone(),
        _ => name.to_string(),
    }
}
