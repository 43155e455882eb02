//! DMMF generation via the Prisma toolchain.
//!
//! Prisma's own schema compiler is the source of truth for parsing
//! `schema.prisma`, so the DMMF is produced by shelling out to Node with
//! `@prisma/internals`. The call blocks until the subprocess finishes.

use prismaguard::Dmmf;
use std::path::Path;
use std::process::Command;

const GENERATE_SCRIPT: &str = r#"
const { getDMMF } = require('@prisma/internals');
const fs = require('fs');

const schema = fs.readFileSync(process.argv[1], 'utf-8');
getDMMF({ datamodel: schema }).then((dmmf) => {
    console.log(JSON.stringify(dmmf));
}).catch((err) => {
    console.error('Failed to generate DMMF:', err);
    process.exit(1);
});
"#;

pub fn generate_dmmf(schema_path: &Path) -> anyhow::Result<Dmmf> {
    let schema_path = schema_path.canonicalize().map_err(|e| {
        anyhow::anyhow!("failed to resolve schema path {}: {e}", schema_path.display())
    })?;
    // Run from the schema directory so @prisma/internals resolves from the
    // project's node_modules.
    let cwd = schema_path.parent().unwrap_or_else(|| Path::new("."));

    let output = Command::new("node")
        .arg("-e")
        .arg(GENERATE_SCRIPT)
        .arg(&schema_path)
        .current_dir(cwd)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!("node not found; install Node.js to generate the DMMF (https://nodejs.org/)")
            } else {
                anyhow::anyhow!("failed to run node: {e}")
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("Cannot find module '@prisma/internals'") {
            anyhow::bail!(
                "@prisma/internals not found\n\
                 \n\
                 Install it in your Node.js project first:\n\
                 \u{20} npm install --save-dev @prisma/internals\n\
                 \n\
                 then re-run prismaguard."
            );
        }
        anyhow::bail!("failed to generate DMMF: {}", stderr.trim());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    prismaguard::parse_dmmf(&stdout)
        .map_err(|e| anyhow::anyhow!("failed to parse generator output: {e}"))
}
