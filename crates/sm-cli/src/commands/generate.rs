//! Generate command implementation

use anyhow::{bail, Context, Result};
use sm_core::discovery::parse_file_name;
use sm_core::{MigrationDefinition, MigrationId};

use crate::cli::{GenerateArgs, GlobalArgs};
use crate::context::ProjectContext;

/// Execute the generate command
pub(crate) fn execute(args: &GenerateArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = ProjectContext::load(global)?;

    if !is_valid_slug(&args.name) {
        bail!(
            "Invalid migration name '{}': use lowercase letters, digits and underscores, starting with a letter",
            args.name
        );
    }
    if !ctx.registry.contains(&args.procedure) {
        let known: Vec<&str> = ctx.registry.names().map(|n| n.as_str()).collect();
        bail!(
            "Unknown procedure '{}'. Known procedures: {}",
            args.procedure,
            known.join(", ")
        );
    }

    let dir = ctx.migration_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    if let Some(existing) = find_by_slug(&dir, &args.name)? {
        bail!(
            "A migration named '{}' already exists: {}",
            args.name,
            existing
        );
    }

    let id = MigrationId::now();
    let path = dir.join(format!("{}_{}.yml", id, args.name));
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    let scaffold = MigrationDefinition::scaffold(&args.procedure)
        .context("Failed to render migration scaffold")?;
    std::fs::write(&path, scaffold)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("  ✓ Created {}", ctx.display_path(&path));
    Ok(())
}

fn is_valid_slug(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_lowercase())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn find_by_slug(dir: &std::path::Path, slug: &str) -> Result<Option<String>> {
    for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if let Some((_, existing)) = parse_file_name(file_name) {
            if existing == slug {
                return Ok(Some(file_name.to_string()));
            }
        }
    }
    Ok(None)
}
