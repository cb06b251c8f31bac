//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// safemig - compile safe migration definitions into ActiveRecord migrations
#[derive(Parser, Debug)]
#[command(name = "safemig")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true, env = "SAFEMIG_CONFIG")]
    pub config: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile migration definitions into migrations
    Compile(CompileArgs),

    /// Verify compiled migrations are up to date without writing anything
    Check(CheckArgs),

    /// Scaffold a new migration definition
    Generate(GenerateArgs),

    /// List migration definitions and their compile status
    Ls(LsArgs),
}

/// Arguments for the compile command
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Which definitions to compile: all, git-diff, a timestamp or a >=/<= range
    #[arg(short, long)]
    pub files: Option<String>,

    /// Recompile even if the lockfile says a definition is unchanged
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Which definitions to check (defaults to compile_files)
    #[arg(short, long)]
    pub files: Option<String>,
}

/// Arguments for the generate command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Snake-case migration name, e.g. add_payer_index
    pub name: String,

    /// Procedure of the first instruction in the scaffold
    #[arg(long, default_value = "create_table")]
    pub procedure: String,
}

/// Arguments for the ls command
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Which definitions to list (defaults to all)
    #[arg(short, long)]
    pub files: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: LsOutput,
}

/// Output formats for the ls command
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LsOutput {
    /// Aligned columns
    Table,
    /// JSON array
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
