//! List command implementation

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::{GlobalArgs, LsArgs, LsOutput};
use crate::commands::common::{status_of, MigrationStatus};
use crate::context::ProjectContext;

/// Migration information for display
#[derive(Debug, Serialize)]
struct MigrationInfo {
    id: String,
    name: String,
    file: String,
    status: MigrationStatus,
}

/// Execute the ls command
pub(crate) fn execute(args: &LsArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = ProjectContext::load(global)?;
    let selection = ctx.selection(Some(args.files.as_deref().unwrap_or("all")))?;
    let sources = ctx.discover(&selection)?;
    let lockfile = ctx.load_lockfile()?;
    let writer = ctx.writer();

    let mut migrations = Vec::with_capacity(sources.len());
    for source in &sources {
        migrations.push(MigrationInfo {
            id: source.id.to_string(),
            name: source.class_name(),
            file: ctx.display_path(&source.path).to_string(),
            status: status_of(source, &lockfile, &writer)?,
        });
    }

    match args.output {
        LsOutput::Table => print_table(&migrations),
        LsOutput::Json => print_json(&migrations)?,
    }
    Ok(())
}

/// Print migrations in table format
fn print_table(migrations: &[MigrationInfo]) {
    let id_width = 14;
    let name_width = migrations
        .iter()
        .map(|m| m.name.len())
        .max()
        .unwrap_or(4)
        .max(4);
    let status_width = 10;

    println!(
        "{:<id_width$}  {:<name_width$}  {:<status_width$}  FILE",
        "ID", "NAME", "STATUS",
    );
    println!(
        "{:-<id_width$}  {:-<name_width$}  {:-<status_width$}  {}",
        "",
        "",
        "",
        "-".repeat(40),
    );

    for m in migrations {
        println!(
            "{:<id_width$}  {:<name_width$}  {:<status_width$}  {}",
            m.id,
            m.name,
            m.status.to_string(),
            m.file,
        );
    }

    let pending = migrations
        .iter()
        .filter(|m| !m.status.is_up_to_date())
        .count();
    println!();
    println!("{} migrations, {} pending", migrations.len(), pending);
}

/// Print migrations in JSON format
fn print_json(migrations: &[MigrationInfo]) -> Result<()> {
    let json = serde_json::to_string_pretty(migrations).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}
