//! Compile command implementation

use anyhow::{Context, Result};
use sm_core::{CommandPostProcessor, CompileReport, Compiler, Renderer, RendererKind};
use sm_jinja::ActiveRecordRenderer;

use crate::cli::{CompileArgs, GlobalArgs};
use crate::commands::common::ExitCode;
use crate::context::ProjectContext;

/// Execute the compile command
pub(crate) fn execute(args: &CompileArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = ProjectContext::load(global)?;
    let selection = ctx.selection(args.files.as_deref())?;
    let sources = ctx.discover(&selection)?;

    if sources.is_empty() {
        println!("No migrations selected by '{}'", selection);
        return Ok(());
    }

    let lockfile_path = ctx.lockfile_path();
    let mut lockfile = ctx.load_lockfile()?;

    let renderer = build_renderer(&ctx)?;
    let writer = ctx.writer();
    let policy = ctx.config.timeout_policy();
    let hook = ctx
        .config
        .post_process
        .as_ref()
        .map(|p| CommandPostProcessor::new(&p.command, p.args.clone()));

    let mut compiler =
        Compiler::new(&ctx.registry, &policy, renderer.as_ref(), &writer).force(args.force);
    if let Some(hook) = &hook {
        ctx.verbose(format!("Post-processing with '{}'", hook.program()));
        compiler = compiler.with_post_processor(hook);
    }

    println!("Compiling {} migration(s)...", sources.len());
    let report = compiler.compile(&sources, &mut lockfile);

    if !report.compiled.is_empty() {
        lockfile
            .save(&lockfile_path)
            .context("Failed to write lockfile")?;
        ctx.verbose(format!("Updated {}", lockfile_path.display()));
    }

    print_report(&ctx, &report);

    if !report.is_success() {
        return Err(ExitCode(1).into());
    }
    Ok(())
}

fn build_renderer(ctx: &ProjectContext) -> Result<Box<dyn Renderer>> {
    match ctx.config.renderer {
        RendererKind::ActiveRecord => {
            let renderer =
                ActiveRecordRenderer::new(&ctx.registry, &ctx.config.active_record_version)
                    .context("Failed to set up the active_record renderer")?;
            Ok(Box::new(renderer))
        }
    }
}

fn print_report(ctx: &ProjectContext, report: &CompileReport) {
    for compiled in &report.compiled {
        println!(
            "  ✓ {} -> {}",
            compiled.id,
            ctx.display_path(&compiled.path)
        );
    }
    for id in &report.skipped {
        ctx.verbose(format!("Skipped {}: unchanged since last compile", id));
    }
    for failure in &report.failed {
        println!("  ✗ {} ({})", failure.id, ctx.display_path(&failure.source));
        for error in &failure.errors {
            println!("      {}", error);
        }
    }

    println!(
        "\nCompiled {} migration(s), {} unchanged, {} failed",
        report.compiled.len(),
        report.skipped.len(),
        report.failed.len()
    );
    if !report.is_success() {
        eprintln!(
            "{} error(s) in {} migration(s); nothing was written for them",
            report.error_count(),
            report.failed.len()
        );
    }
}
