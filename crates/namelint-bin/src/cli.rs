use clap::{Args, Parser, Subcommand};
use namelint_core::CaseStyle;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "namelint")]
#[command(version)]
#[command(about = "Enforce file and folder naming conventions")]
#[command(long_about = "A CLI tool that checks every file and folder in a project against a configured case style (kebab-case, PascalCase, camelCase, snake_case) and safely renames the ones that do not conform.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[arg(long, global = true, help = "Config file to use instead of <root>/.naminglintrc.json")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RuleOverrides {
    #[arg(long, help = "Override the file case style (kebab-case, PascalCase, camelCase, snake_case)")]
    pub file_case: Option<CaseStyle>,

    #[arg(long, help = "Override the folder case style (kebab-case, PascalCase, camelCase, snake_case)")]
    pub folder_case: Option<CaseStyle>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Write a .naminglintrc.json with the chosen case styles")]
    Init {
        #[arg(help = "Project root (defaults to current directory)")]
        target: Option<PathBuf>,

        #[command(flatten)]
        styles: RuleOverrides,

        #[arg(long, help = "Overwrite an existing config")]
        force: bool,
    },

    #[command(about = "Report naming violations under a directory")]
    Scan {
        #[arg(help = "Target directory (defaults to current directory)")]
        target: Option<PathBuf>,

        #[command(flatten)]
        overrides: RuleOverrides,

        #[arg(long, help = "Descend into symlinked directories")]
        follow_symlinks: bool,
    },

    #[command(about = "Check a single file or folder name")]
    Check {
        #[arg(help = "File or folder to check")]
        path: PathBuf,

        #[command(flatten)]
        overrides: RuleOverrides,
    },

    #[command(about = "Rename entries that violate the naming rules")]
    Fix {
        #[arg(help = "Target directory (defaults to current directory)")]
        target: Option<PathBuf>,

        #[command(flatten)]
        overrides: RuleOverrides,

        #[arg(short, long, help = "Apply every suggested rename without prompting")]
        yes: bool,

        #[arg(long, help = "Show the rename plan without making changes")]
        dry_run: bool,

        #[arg(long, help = "Descend into symlinked directories")]
        follow_symlinks: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
