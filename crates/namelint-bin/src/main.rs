mod cli;
mod picker;

use anyhow::{bail, Context, Result};
use cli::{Cli, Commands, RuleOverrides};
use namelint_core::config::{config_path, CONFIG_FILE_NAME};
use namelint_core::{
    check_entry, execute, load_config, load_config_file, plan, scan_and_evaluate, write_config,
    ExecutionReport, LocalFs, NamingRules, PlanOutcome, ScanOptions, Violation,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    setup_logging(&cli)?;

    debug!("Starting namelint");

    match cli.command {
        Commands::Init {
            target,
            styles,
            force,
        } => handle_init(resolve_root(target)?, styles, force)?,
        Commands::Scan {
            target,
            overrides,
            follow_symlinks,
        } => {
            let root = resolve_root(target)?;
            let rules = load_rules(&root, cli.config.as_deref(), &overrides)?;
            handle_scan(&root, &rules, follow_symlinks)?;
        }
        Commands::Check { path, overrides } => {
            handle_check(&path, cli.config.as_deref(), &overrides)?;
        }
        Commands::Fix {
            target,
            overrides,
            yes,
            dry_run,
            follow_symlinks,
        } => {
            let root = resolve_root(target)?;
            let rules = load_rules(&root, cli.config.as_deref(), &overrides)?;
            handle_fix(&root, &rules, yes, dry_run, follow_symlinks)?;
        }
    }

    Ok(())
}

fn resolve_root(target: Option<PathBuf>) -> Result<PathBuf> {
    let root = match target {
        Some(target) => target,
        None => std::env::current_dir()?,
    };

    if !root.exists() {
        bail!("Target directory does not exist: {:?}", root);
    }
    if !root.is_dir() {
        bail!("Target must be a directory: {:?}", root);
    }

    Ok(root)
}

fn load_rules(root: &Path, config: Option<&Path>, overrides: &RuleOverrides) -> Result<NamingRules> {
    let mut rules = match config {
        Some(path) => {
            if !path.is_file() {
                bail!("Config file does not exist: {:?}", path);
            }
            load_config_file(path)?
        }
        None => load_config(root)?,
    };

    if let Some(style) = overrides.file_case {
        rules.rules.file_case = style;
    }
    if let Some(style) = overrides.folder_case {
        rules.rules.folder_case = style;
    }

    Ok(rules)
}

fn handle_init(root: PathBuf, styles: RuleOverrides, force: bool) -> Result<()> {
    let path = config_path(&root);
    if path.exists() && !force {
        bail!("{:?} already exists, pass --force to overwrite it", path);
    }

    let defaults = NamingRules::default();
    let file_case = match styles.file_case {
        Some(style) => style,
        None => picker::select_style("Case style for file names:", defaults.file_case())?,
    };
    let folder_case = match styles.folder_case {
        Some(style) => style,
        None => picker::select_style("Case style for folder names:", defaults.folder_case())?,
    };

    let written = write_config(&root, &NamingRules::new(file_case, folder_case))?;
    println!("Wrote {}", written.display());
    println!("  Files:   {}", file_case);
    println!("  Folders: {}", folder_case);

    Ok(())
}

fn handle_scan(root: &Path, rules: &NamingRules, follow_symlinks: bool) -> Result<()> {
    let options = ScanOptions {
        follow_symlinks,
        ..ScanOptions::default()
    };
    let diagnosis = scan_and_evaluate(root, rules, &options)?;

    for issue in &diagnosis.issues {
        warn!("Skipped {}: {}", issue.path.display(), issue.message);
    }
    for violation in &diagnosis.violations {
        print_violation(violation);
    }

    println!("Scan complete!");
    println!("  Entries scanned: {}", diagnosis.entries_scanned);
    println!("  Violations: {}", diagnosis.violations.len());
    println!("  Fixable: {}", diagnosis.fixable().count());

    if !diagnosis.violations.is_empty() {
        bail!("{} naming violation(s) found", diagnosis.violations.len());
    }
    Ok(())
}

fn handle_check(path: &Path, config: Option<&Path>, overrides: &RuleOverrides) -> Result<()> {
    let (path, violations) = check_path(path, config, overrides)?;

    if violations.is_empty() {
        println!("{} follows the naming rules", path.display());
        return Ok(());
    }
    for violation in &violations {
        print_violation(violation);
    }
    bail!("{} naming violation(s) found", violations.len());
}

/// Resolves the entry and its project root against the working directory, then
/// evaluates the entry.
fn check_path(
    path: &Path,
    config: Option<&Path>,
    overrides: &RuleOverrides,
) -> Result<(PathBuf, Vec<Violation>)> {
    let path = absolute(path)?;
    if !path.exists() {
        bail!("Path does not exist: {:?}", path);
    }

    let root = match config {
        Some(config) => absolute(config)?
            .parent()
            .map(Path::to_path_buf)
            .context("Config file has no parent directory")?,
        None => project_root(&path).context("Cannot determine a project root")?,
    };
    debug!("Checking {:?} against root {:?}", path, root);

    let rules = load_rules(&root, config, overrides)?;
    let violations = check_entry(&root, &path, &rules)?;
    Ok((path, violations))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// The nearest ancestor holding a config file, or the entry's own directory.
fn project_root(path: &Path) -> Option<PathBuf> {
    let parent = path.parent()?;
    parent
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE_NAME).is_file())
        .or(Some(parent))
        .map(Path::to_path_buf)
}

fn handle_fix(
    root: &Path,
    rules: &NamingRules,
    yes: bool,
    dry_run: bool,
    follow_symlinks: bool,
) -> Result<()> {
    if dry_run {
        warn!("Dry run mode - no changes will be made");
    }

    let options = ScanOptions {
        follow_symlinks,
        ..ScanOptions::default()
    };
    let diagnosis = scan_and_evaluate(root, rules, &options)?;

    for issue in &diagnosis.issues {
        warn!("Skipped {}: {}", issue.path.display(), issue.message);
    }
    for violation in diagnosis.violations.iter().filter(|v| !v.is_fixable()) {
        print_violation(violation);
    }

    let fixable: Vec<&Violation> = diagnosis.fixable().collect();
    if fixable.is_empty() {
        println!("Nothing to fix.");
        return Ok(());
    }

    let selected: Vec<Violation> = if yes {
        fixable.into_iter().cloned().collect()
    } else {
        match picker::select_renames(&fixable)? {
            Some(selected) => selected,
            None => {
                println!("Cancelled, nothing was renamed.");
                return Ok(());
            }
        }
    };
    if selected.is_empty() {
        println!("No renames selected.");
        return Ok(());
    }

    let fs = LocalFs::new();
    let outcome = plan(root, &selected, &fs);
    print_plan(root, &outcome);

    if outcome.plan.is_empty() || dry_run {
        return Ok(());
    }
    if !yes && !picker::confirm(&format!("Apply {} rename(s)?", outcome.plan.len()), true)? {
        println!("Cancelled, nothing was renamed.");
        return Ok(());
    }

    info!("Applying {} rename(s) under {:?}", outcome.plan.len(), root);
    let report = execute(&outcome.plan, &fs);
    print_report(root, &report);

    if !report.failed.is_empty() {
        bail!("{} rename(s) failed", report.failed.len());
    }
    Ok(())
}

fn print_violation(violation: &Violation) {
    println!(
        "  [{}] {}: {}",
        violation.kind,
        violation.entry.display_path(),
        violation
    );
}

fn print_plan(root: &Path, outcome: &PlanOutcome) {
    for rejected in &outcome.rejected {
        if rejected.is_warning() {
            warn!("Not renaming {}", rejected);
        } else {
            println!("  \x1b[31mRejected\x1b[0m {}", rejected);
        }
    }

    println!("Planned renames:");
    for op in outcome.plan.iter() {
        let from = relative(root, &op.from);
        let old = op.from.file_name().unwrap_or_default().to_string_lossy();
        let new = op.to.file_name().unwrap_or_default().to_string_lossy();
        println!("  {}  ->  {}", from, picker::highlight_rename(&old, &new));
    }
    println!("  Total: {}", outcome.plan.len());
}

fn print_report(root: &Path, report: &ExecutionReport) {
    for failure in &report.failed {
        println!(
            "  \x1b[31mFailed\x1b[0m {}: {} (now at {})",
            relative(root, &failure.op.from),
            failure.reason,
            relative(root, &failure.actual_path)
        );
    }

    println!("Rename complete!");
    println!("  Renamed: {}", report.succeeded.len());
    println!("  Failed: {}", report.failed.len());
    if !report.cancelled.is_empty() {
        println!("  Cancelled: {}", report.cancelled.len());
    }
    for renamed in &report.succeeded {
        debug!("{} is now {}", relative(root, &renamed.op.from), relative(root, &renamed.final_path));
    }
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn setup_logging(cli: &Cli) -> Result<()> {
    let filter = if cli.quiet {
        EnvFilter::new("error")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .with(filter)
        .init();

    Ok(())
}
