//! Check command implementation

use anyhow::Result;

use crate::cli::{CheckArgs, GlobalArgs};
use crate::commands::common::{status_of, ExitCode, MigrationStatus};
use crate::context::ProjectContext;

/// Execute the check command. Reads only; never writes.
pub(crate) fn execute(args: &CheckArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = ProjectContext::load(global)?;
    let selection = ctx.selection(args.files.as_deref())?;
    let sources = ctx.discover(&selection)?;
    let lockfile = ctx.load_lockfile()?;
    let writer = ctx.writer();

    let mut outdated = 0;
    let mut drifted = 0;
    for source in &sources {
        let status = status_of(source, &lockfile, &writer)?;
        if status.is_up_to_date() {
            ctx.verbose(format!("{} is up to date", source.id));
            continue;
        }
        if status == MigrationStatus::Drifted {
            drifted += 1;
        } else {
            outdated += 1;
        }
        println!("  ✗ {} {} ({})", source.id, source.slug, status);
    }

    if outdated + drifted == 0 {
        println!("All {} migration(s) are up to date", sources.len());
        return Ok(());
    }

    println!();
    if outdated > 0 {
        println!("{} migration(s) need compiling: run `safemig compile`", outdated);
    }
    if drifted > 0 {
        println!(
            "{} compiled migration(s) were edited by hand: edit the definition instead, or run `safemig compile --force` to overwrite",
            drifted
        );
    }
    Err(ExitCode(1).into())
}
