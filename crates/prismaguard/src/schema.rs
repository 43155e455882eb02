//! Schema map derived from a Prisma data model.
//!
//! The map is the ground truth for validation: table name -> column name ->
//! SQL type. Table names are lowercased; column names keep their declared
//! case (queries are matched case-insensitively against them).

use crate::dmmf::Dmmf;

/// Convert a Prisma scalar type to a SQL type name.
///
/// Unrecognized types (including enum type names) fall back to `TEXT`.
pub fn prisma_type_to_sql(prisma_type: &str) -> &'static str {
    match prisma_type {
        "String" => "TEXT",
        "Int" => "INTEGER",
        "BigInt" => "BIGINT",
        "Float" => "DOUBLE PRECISION",
        "Decimal" => "DECIMAL",
        "Boolean" => "BOOLEAN",
        "DateTime" => "TIMESTAMP",
        "Json" => "JSONB",
        "Bytes" => "BYTEA",
        _ => "TEXT",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub sql_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    /// Lowercased table name.
    pub name: String,
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    /// Case-insensitive column lookup.
    pub fn find_column(&self, column: &str) -> Option<&ColumnSchema> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(column))
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.find_column(column).is_some()
    }
}

/// Table -> column -> type mapping in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaMap {
    pub tables: Vec<TableSchema>,
}

impl SchemaMap {
    /// Derive the schema map from a DMMF tree.
    ///
    /// Table name: `dbName` override if present, else the model name,
    /// lowercased. Column name: `dbName` override if present, else the field
    /// name, case preserved. Relation fields carry no column. When two models
    /// map to the same table name the later one replaces the earlier.
    pub fn from_dmmf(dmmf: &Dmmf) -> Self {
        let mut schema = SchemaMap::default();

        for model in &dmmf.datamodel.models {
            let table_name = model
                .db_name
                .as_deref()
                .unwrap_or(&model.name)
                .to_lowercase();

            let mut columns = Vec::new();
            for field in &model.fields {
                if field.is_relation() {
                    continue;
                }

                let column_name = field.db_name.as_deref().unwrap_or(&field.name);
                let prisma_type = field.field_type.as_deref().unwrap_or("String");

                columns.push(ColumnSchema {
                    name: column_name.to_string(),
                    sql_type: prisma_type_to_sql(prisma_type).to_string(),
                });
            }

            schema.insert_table(TableSchema {
                name: table_name,
                columns,
            });
        }

        schema
    }

    /// Case-insensitive table lookup.
    pub fn find_table(&self, table: &str) -> Option<&TableSchema> {
        let table = table.to_lowercase();
        self.tables.iter().find(|t| t.name == table)
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.find_table(table).is_some()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn insert_table(&mut self, table: TableSchema) {
        if let Some(existing) = self.tables.iter_mut().find(|t| t.name == table.name) {
            *existing = table;
        } else {
            self.tables.push(table);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dmmf::parse_dmmf;

    fn sample_schema() -> SchemaMap {
        let raw = r#"{
            "datamodel": {
                "models": [
                    {
                        "name": "Job",
                        "dbName": "jobs",
                        "fields": [
                            {"name": "id", "kind": "scalar", "type": "Int"},
                            {"name": "status", "kind": "scalar", "type": "String"},
                            {"name": "payload", "kind": "scalar", "type": "Json"},
                            {"name": "startedAt", "dbName": "started_at", "kind": "scalar", "type": "DateTime"},
                            {"name": "owner", "kind": "object", "type": "User"}
                        ]
                    },
                    {
                        "name": "User",
                        "fields": [
                            {"name": "id", "kind": "scalar", "type": "BigInt"},
                            {"name": "role", "kind": "enum", "type": "Role"}
                        ]
                    }
                ]
            }
        }"#;
        SchemaMap::from_dmmf(&parse_dmmf(raw).unwrap())
    }

    #[test]
    fn type_mapping_has_a_default() {
        assert_eq!(prisma_type_to_sql("Int"), "INTEGER");
        assert_eq!(prisma_type_to_sql("Float"), "DOUBLE PRECISION");
        assert_eq!(prisma_type_to_sql("Bytes"), "BYTEA");
        assert_eq!(prisma_type_to_sql("SomeEnum"), "TEXT");
    }

    #[test]
    fn relation_fields_are_skipped() {
        let schema = sample_schema();
        let jobs = schema.find_table("jobs").unwrap();
        assert!(jobs.has_column("id"));
        assert!(!jobs.has_column("owner"));
        assert_eq!(jobs.columns.len(), 4);
    }

    #[test]
    fn table_names_are_lowercased_column_case_preserved() {
        let schema = sample_schema();
        // "User" has no dbName: the model name is lowercased.
        assert!(schema.has_table("user"));
        assert!(schema.has_table("USER"));

        // Column override wins; unmapped names keep their declared case.
        let jobs = schema.find_table("jobs").unwrap();
        assert_eq!(jobs.find_column("started_at").unwrap().sql_type, "TIMESTAMP");
        assert!(jobs.columns.iter().all(|c| c.name != "startedAt"));
    }

    #[test]
    fn enum_fields_map_to_text() {
        let schema = sample_schema();
        let user = schema.find_table("user").unwrap();
        assert_eq!(user.find_column("role").unwrap().sql_type, "TEXT");
    }

    #[test]
    fn table_name_collision_keeps_the_last_model() {
        let raw = r#"{
            "datamodel": {
                "models": [
                    {"name": "Log", "fields": [{"name": "old_col", "kind": "scalar", "type": "Int"}]},
                    {"name": "log", "fields": [{"name": "new_col", "kind": "scalar", "type": "Int"}]}
                ]
            }
        }"#;
        let schema = SchemaMap::from_dmmf(&parse_dmmf(raw).unwrap());
        assert_eq!(schema.len(), 1);
        let log = schema.find_table("log").unwrap();
        assert!(log.has_column("new_col"));
        assert!(!log.has_column("old_col"));
    }
}
