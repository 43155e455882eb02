use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum Command {
    Help,
    Check(CheckArgs),
}

#[derive(Debug, Clone)]
pub struct CheckArgs {
    pub config: PathBuf,
    pub schema_path: Option<PathBuf>,
    pub dmmf_path: Option<PathBuf>,
    pub files: Vec<PathBuf>,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);

    let mut config = PathBuf::from("prismaguard.toml");
    let mut schema_path: Option<PathBuf> = None;
    let mut dmmf_path: Option<PathBuf> = None;
    let mut files: Vec<PathBuf> = Vec::new();

    while let Some(token) = it.next() {
        match token.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--config" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--config requires a value");
                };
                config = PathBuf::from(v);
            }
            t if t.starts_with("--config=") => {
                config = PathBuf::from(t.trim_start_matches("--config="));
            }
            "--schema-path" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--schema-path requires a value");
                };
                schema_path = Some(PathBuf::from(v));
            }
            t if t.starts_with("--schema-path=") => {
                schema_path = Some(PathBuf::from(t.trim_start_matches("--schema-path=")));
            }
            "--dmmf" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--dmmf requires a value");
                };
                dmmf_path = Some(PathBuf::from(v));
            }
            t if t.starts_with("--dmmf=") => {
                dmmf_path = Some(PathBuf::from(t.trim_start_matches("--dmmf=")));
            }
            other if other.starts_with('-') => anyhow::bail!("unknown argument: {other}"),
            other => files.push(PathBuf::from(other)),
        }
    }

    if files.is_empty() {
        return Ok(Command::Help);
    }

    Ok(Command::Check(CheckArgs {
        config,
        schema_path,
        dmmf_path,
        files,
    }))
}

pub fn print_help() {
    println!(
        "\
prismaguard - validate SQL queries in source files against a Prisma schema

USAGE:
  prismaguard [OPTIONS] <FILES...>

OPTIONS:
  --config <FILE>        Config file path (default: prismaguard.toml)
  --schema-path <FILE>   Path to schema.prisma (auto-detected if not provided)
  --dmmf <FILE>          Load the DMMF from a JSON file instead of running
                         the Prisma generator (also: PRISMAGUARD_DMMF_PATH)
  -h, --help             Print help

Mark queries for validation with a comment line:
  # prismaguard
  cursor.execute(\"SELECT id FROM jobs WHERE id = %s\", (job_id,))

or with a SQL comment inside the query:
  cursor.execute(\"\"\"
      -- prismaguard
      SELECT id FROM jobs WHERE id = %s
  \"\"\", (job_id,))"
    );
}
