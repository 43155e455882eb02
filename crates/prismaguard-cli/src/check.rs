use crate::cli::CheckArgs;
use crate::config::ProjectConfig;
use crate::dmmf_gen::generate_dmmf;
use prismaguard::{
    CommentMarkerExtractor, Dmmf, QueryExtractor, SchemaMap, SqlCommentMarkerExtractor,
    SqlDialect, load_dmmf, validate_query,
};
use std::path::PathBuf;

/// Environment override for the DMMF JSON path (pre-commit hooks, CI).
const DMMF_PATH_ENV: &str = "PRISMAGUARD_DMMF_PATH";

const SCHEMA_SEARCH_PATHS: &[&str] = &[
    "prisma/schema.prisma",
    "frontend/prisma/schema.prisma",
    "backend/prisma/schema.prisma",
    "../prisma/schema.prisma",
];

pub fn run(args: CheckArgs) -> anyhow::Result<()> {
    let project = ProjectConfig::load_optional(&args.config)?;

    let schema_path = resolve_schema_path(&args, &project)?;
    let dmmf = obtain_dmmf(&args, &project, schema_path.as_deref())?;
    let schema = SchemaMap::from_dmmf(&dmmf);

    let dialect = match project.file.schema.dialect {
        Some(dialect) => dialect,
        None => match &schema_path {
            Some(path) => SqlDialect::detect_from_file(path),
            None => SqlDialect::default(),
        },
    };

    println!("Loaded schema: {} tables (dialect: {dialect})", schema.len());
    println!();

    let comment_extractor = CommentMarkerExtractor::new();
    let sql_extractor = SqlCommentMarkerExtractor::new();

    let mut files_checked = 0usize;
    let mut total_queries = 0usize;
    let mut total_errors = 0usize;

    for file in &args.files {
        if !file.exists() {
            eprintln!("warning: file not found: {}", file.display());
            continue;
        }
        if file.extension().and_then(|e| e.to_str()) != Some("py") {
            continue;
        }

        let content = match std::fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("warning: could not read {}: {e}", file.display());
                continue;
            }
        };

        let mut queries = comment_extractor.extract(&content);
        queries.extend(sql_extractor.extract(&content));
        queries.sort_by_key(|q| q.line);
        // A statement marked both ways is still one query.
        queries.dedup_by_key(|q| q.line);

        if queries.is_empty() {
            continue;
        }

        files_checked += 1;
        total_queries += queries.len();
        println!("{} ({} marked queries)", file.display(), queries.len());

        for query in &queries {
            let issues = validate_query(&query.sql, &schema, dialect);
            if issues.is_empty() {
                println!("  ok    line {}: {}", query.line, display_query(&query.sql));
            } else {
                total_errors += issues.len();
                println!("  error line {}: {}", query.line, display_query(&query.sql));
                for issue in &issues {
                    println!("        -> {issue}");
                }
            }
        }
        println!();
    }

    if files_checked == 0 {
        println!("No files with marked queries found");
        return Ok(());
    }

    if total_errors > 0 {
        anyhow::bail!("validation failed with {total_errors} error(s)");
    }

    println!("All marked SQL queries are valid ({total_queries} queries checked)");
    Ok(())
}

fn resolve_schema_path(
    args: &CheckArgs,
    project: &ProjectConfig,
) -> anyhow::Result<Option<PathBuf>> {
    if let Some(path) = &args.schema_path {
        if !path.exists() {
            anyhow::bail!("schema not found at {}", path.display());
        }
        return Ok(Some(path.clone()));
    }

    if let Some(path) = &project.file.schema.path {
        let resolved = project.resolve_path(path);
        if !resolved.exists() {
            anyhow::bail!("schema not found at {} (configured in [schema])", resolved.display());
        }
        return Ok(Some(resolved));
    }

    Ok(SCHEMA_SEARCH_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists()))
}

/// DMMF source precedence: `--dmmf` flag, then the environment override, then
/// the config, then generation from `schema.prisma`.
fn obtain_dmmf(
    args: &CheckArgs,
    project: &ProjectConfig,
    schema_path: Option<&std::path::Path>,
) -> anyhow::Result<Dmmf> {
    if let Some(path) = &args.dmmf_path {
        return Ok(load_dmmf(path)?);
    }
    if let Ok(path) = std::env::var(DMMF_PATH_ENV) {
        return Ok(load_dmmf(&path)?);
    }
    if let Some(path) = &project.file.schema.dmmf_path {
        return Ok(load_dmmf(project.resolve_path(path))?);
    }

    let Some(schema_path) = schema_path else {
        anyhow::bail!(
            "could not find schema.prisma\n\
             \n\
             Searched:\n\
             \u{20} - prisma/schema.prisma\n\
             \u{20} - frontend/prisma/schema.prisma\n\
             \u{20} - backend/prisma/schema.prisma\n\
             \u{20} - ../prisma/schema.prisma\n\
             \n\
             Use --schema-path to specify the location explicitly"
        );
    };

    println!("Generating DMMF from {}", schema_path.display());
    generate_dmmf(schema_path)
}

/// One-line rendering of a query for report output.
fn display_query(sql: &str) -> String {
    let flat = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > 60 {
        let truncated: String = flat.chars().take(60).collect();
        format!("{truncated}...")
    } else {
        flat
    }
}
