#![forbid(unsafe_code)]

mod constants;
mod layout;
mod randr;
mod store;
mod types;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing::Level as TraceLevel;
use tracing_subscriber::FmtSubscriber;

use layout::ApplyOutcome;
use store::LayoutStore;

/// Save and restore display arrangements
#[derive(Parser)]
#[command(name = "display-manager")]
#[command(version, about = "Save and restore display arrangements")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current displays
    List,
    /// List saved layouts
    Layouts,
    /// Save current layout
    Save { name: Option<String> },
    /// Apply saved layout
    Apply { name: Option<String> },
    /// Delete a layout
    Delete { name: Option<String> },
    #[command(external_subcommand)]
    Unknown(Vec<String>),
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    // Log to stderr; stdout carries the command output
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::List => list()?,
        Commands::Layouts => layouts(&LayoutStore::open_default()),
        Commands::Save { name: Some(name) } => save(&LayoutStore::open_default(), &name)?,
        Commands::Save { name: None } => println!("Usage: save <name>"),
        Commands::Apply { name: Some(name) } => apply(&LayoutStore::open_default(), &name)?,
        Commands::Apply { name: None } => println!("Usage: apply <name>"),
        Commands::Delete { name: Some(name) } => delete(&LayoutStore::open_default(), &name)?,
        Commands::Delete { name: None } => println!("Usage: delete <name>"),
        Commands::Unknown(args) => {
            let arg = args.first().map(String::as_str).unwrap_or_default();
            println!("Unknown command: {arg}");
        }
    }
    Ok(())
}

/// Print each live display's id and geometry
fn list() -> Result<()> {
    let (conn, root) = randr::connect()?;
    let displays = randr::current_displays(&conn, root)?;
    println!("Current displays:");
    for d in &displays {
        println!(
            "  Display {}: {}x{} at ({}, {})",
            d.id, d.width, d.height, d.x, d.y
        );
    }
    Ok(())
}

/// Print the saved layout names, sorted
fn layouts(store: &LayoutStore) {
    let config = store.load();
    if config.layouts.is_empty() {
        println!("No layouts saved. Use: display-manager save <name>");
    } else {
        let mut names: Vec<&str> = config.layouts.keys().map(String::as_str).collect();
        names.sort_unstable();
        println!("Saved layouts: {}", names.join(", "));
    }
}

/// Record the live displays under `name`, overwriting an existing layout
fn save(store: &LayoutStore, name: &str) -> Result<()> {
    let (conn, root) = randr::connect()?;
    let displays = randr::current_displays(&conn, root)?;
    store.set_layout(name, displays)?;
    println!("Saved '{name}'");
    Ok(())
}

/// Reposition live displays to the layout saved under `name`
fn apply(store: &LayoutStore, name: &str) -> Result<()> {
    match layout::apply(store, name)? {
        ApplyOutcome::Applied => println!("Applied '{name}'"),
        ApplyOutcome::LayoutNotFound { available } => println!(
            "Layout '{name}' not found. Available: {}",
            available.join(", ")
        ),
        ApplyOutcome::BeginFailed => println!("Failed to begin configuration"),
        ApplyOutcome::CommitFailed => println!("Failed to apply"),
    }
    Ok(())
}

/// Remove the layout saved under `name`
fn delete(store: &LayoutStore, name: &str) -> Result<()> {
    if store.remove_layout(name)? {
        println!("Deleted '{name}'");
    } else {
        println!("Layout '{name}' not found");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        // Verify the CLI configuration is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_arguments_parses_to_no_command() {
        let cli = Cli::try_parse_from(["display-manager"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_list_subcommand_parses() {
        let cli = Cli::try_parse_from(["display-manager", "list"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::List)));
    }

    #[test]
    fn test_save_takes_layout_name() {
        let cli = Cli::try_parse_from(["display-manager", "save", "home"]).unwrap();
        match cli.command {
            Some(Commands::Save { name }) => assert_eq!(name.as_deref(), Some("home")),
            _ => panic!("expected save subcommand"),
        }
    }

    #[test]
    fn test_save_accepts_missing_name() {
        // A missing name is handled with a usage hint, not a parse error
        let cli = Cli::try_parse_from(["display-manager", "save"]).unwrap();
        match cli.command {
            Some(Commands::Save { name }) => assert!(name.is_none()),
            _ => panic!("expected save subcommand"),
        }
    }

    #[test]
    fn test_unrecognized_command_is_captured() {
        let cli = Cli::try_parse_from(["display-manager", "frobnicate"]).unwrap();
        match cli.command {
            Some(Commands::Unknown(args)) => {
                assert_eq!(args.first().map(String::as_str), Some("frobnicate"));
            }
            _ => panic!("expected external subcommand"),
        }
    }
}
