use std::process;

use anyhow::Result;
use clap::{ArgMatches, Command};

const BIN_NAME: &str = "namelint";
const CORE_PACKAGE: &str = "namelint-core";
const BIN_PACKAGE: &str = "namelint-bin";

fn main() -> Result<()> {
    let args = cli().get_matches();

    match args.subcommand() {
        Some(("install", _)) => install(),
        Some(("run", args)) => run(args),
        Some(("test", args)) => handle_test_commands(args),
        Some((command, _)) => anyhow::bail!("Unexpected command: {command}"),
        None => anyhow::bail!("Expected subcommand"),
    }
}

fn cli() -> Command {
    clap::command!()
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("install").about("Install the namelint binary locally"))
        .subcommand(
            Command::new("run")
                .about("Build and run namelint with arguments")
                .trailing_var_arg(true)
                .allow_hyphen_values(true)
                .arg(
                    clap::Arg::new("args")
                        .help("Arguments to pass to namelint")
                        .action(clap::ArgAction::Append)
                        .num_args(0..),
                ),
        )
        .subcommand(
            Command::new("test")
                .about("Test Operations")
                .subcommand(Command::new("all").about("Run every test step"))
                .subcommand(Command::new("core").about("Run tests for namelint-core"))
                .subcommand(Command::new("bin").about("Run tests for namelint-bin"))
                .subcommand(Command::new("smoke").about("Run the namelint binary against its own help output")),
        )
}

fn install() -> Result<()> {
    println!("Installing {BIN_NAME}...");
    cargo(&["install", "--path", "crates/namelint-bin"])?;
    println!("✓ {BIN_NAME} installed successfully");
    Ok(())
}

fn run(args: &ArgMatches) -> Result<()> {
    let run_args: Vec<&str> = args
        .get_many::<String>("args")
        .map_or(Vec::new(), |vals| vals.map(String::as_str).collect());

    let mut full = vec!["run", "--bin", BIN_NAME, "--"];
    full.extend(run_args);
    cargo(&full)
}

fn handle_test_commands(args: &ArgMatches) -> Result<()> {
    match args.subcommand() {
        Some(("all", _)) => test_all(),
        Some(("core", _)) => cargo(&["test", "--package", CORE_PACKAGE]),
        Some(("bin", _)) => cargo(&["test", "--package", BIN_PACKAGE]),
        Some(("smoke", _)) => smoke(),
        _ => {
            println!("Available test commands:");
            println!("  all    - Run every test step");
            println!("  core   - Run tests for {CORE_PACKAGE}");
            println!("  bin    - Run tests for {BIN_PACKAGE}");
            println!("  smoke  - Run the binary against its help output");
            Ok(())
        }
    }
}

type Step = (&'static str, fn() -> Result<()>);

fn test_all() -> Result<()> {
    let steps: [Step; 4] = [
        ("namelint-core tests", || cargo(&["test", "--package", CORE_PACKAGE])),
        ("namelint-bin tests", || cargo(&["test", "--package", BIN_PACKAGE])),
        ("documentation tests", || cargo(&["test", "--doc", "--package", CORE_PACKAGE])),
        ("smoke tests", smoke),
    ];

    let mut failed = Vec::new();
    for (name, step) in steps {
        println!("🧪 Running {name}...");
        match step() {
            Ok(()) => println!("✅ {name} passed\n"),
            Err(e) => {
                println!("❌ {name} failed: {e}\n");
                failed.push(name);
            }
        }
    }

    if !failed.is_empty() {
        anyhow::bail!("Test suite failed: {}", failed.join(", "));
    }
    println!("🎉 All tests passed successfully!");
    Ok(())
}

fn smoke() -> Result<()> {
    cargo(&["build", "--bin", BIN_NAME])?;
    let invocations: [&[&str]; 4] = [&["--version"], &["--help"], &["scan", "--help"], &["fix", "--help"]];
    for sub in invocations {
        let mut args = vec!["run", "--quiet", "--bin", BIN_NAME, "--"];
        args.extend_from_slice(sub);
        cargo(&args)?;
    }
    Ok(())
}

fn cargo(args: &[&str]) -> Result<()> {
    let status = process::Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("`cargo {}` failed", args.join(" "));
    }
    Ok(())
}
