use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use deepshift::{
    load_for_root, normalize_dropped_path, shift, MatchMode, Phases, RenameOutcome,
    RewriteOutcome, ShiftOptions, ShiftReport, TokenPair,
};
use std::env;
use std::path::{Path, PathBuf};

const EXAMPLES: &str = "Example: deepshift oldName newName
Example: deepshift src/old_feature src/new_module --nogit";

#[derive(Parser)]
#[command(name = "deepshift")]
#[command(
    about = "Rename files, directories and in-file references of an identifier",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// String to replace, or a path to a file/directory whose name is used
    #[arg(value_parser = clap::builder::NonEmptyStringValueParser::new())]
    old: String,

    /// Replacement string
    new: String,

    /// Only rewrite file contents, do not rename anything
    #[arg(short, long, conflicts_with = "files_only")]
    content_only: bool,

    /// Only rename files and directories, do not rewrite contents
    #[arg(short, long)]
    files_only: bool,

    /// Do not consult .gitignore rules (.git and node_modules stay excluded)
    #[arg(short, long)]
    nogit: bool,

    /// Directory to operate on (defaults to DEEPSHIFT_ROOT, then the current directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Increase log verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only print failures
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if err.use_stderr() => {
            let _ = err.print();
            eprintln!("{}", EXAMPLES.dimmed());
            std::process::exit(1);
        }
        // --help / --version
        Err(err) => err.exit(),
    };

    setup_logging(cli.verbose, cli.quiet);
    cmd_shift(cli)
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info"),
            2 => tracing_subscriber::EnvFilter::new("debug"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve the root directory.
///
/// Priority order:
/// 1. Explicit --root flag
/// 2. DEEPSHIFT_ROOT environment variable
/// 3. Current directory
fn resolve_root(cli_root: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = cli_root {
        return path
            .canonicalize()
            .with_context(|| format!("root directory not found: {}", path.display()));
    }

    if let Ok(env_path) = env::var("DEEPSHIFT_ROOT") {
        let path = PathBuf::from(&env_path);
        if path.is_dir() {
            return Ok(path.canonicalize()?);
        }
        eprintln!(
            "{}",
            format!(
                "Warning: DEEPSHIFT_ROOT is set but is not a directory: {}",
                env_path
            )
            .yellow()
        );
    }

    Ok(env::current_dir()?.canonicalize()?)
}

/// Describe the git ignore layer as the run actually used it.
fn gitignore_state(report: &ShiftReport, nogit: bool, configured: bool) -> &'static str {
    if nogit {
        "Disabled (--nogit)"
    } else if !configured {
        "Disabled (vcs_ignore = false)"
    } else if report.consults_vcs {
        "Enabled"
    } else {
        "Unavailable (no repository at root)"
    }
}

fn cmd_shift(cli: Cli) -> Result<()> {
    // 1. Resolve root and per-root config before touching anything
    let root = resolve_root(cli.root)?;
    let config = load_for_root(&root)?;

    let phases = Phases::from_flags(cli.content_only, cli.files_only)?;
    let options = ShiftOptions::from_config(&root, &config)
        .phases(phases)
        .use_vcs_ignore(config.vcs_ignore && !cli.nogit);

    // 2. A dropped path stands for its basename
    let old = normalize_dropped_path(&cli.old, &cli.new);
    let tokens = TokenPair::new(old, cli.new);

    // 3. Run both phases
    let report = shift(&tokens, &options)?;

    if report.is_no_op() {
        if !cli.quiet {
            println!(
                "{} Old and new strings are identical - no changes needed.",
                "⊙".yellow()
            );
        }
        return Ok(());
    }

    if !cli.quiet {
        println!(
            "{} deepshift starting: \"{}\" -> \"{}\"",
            "▶".cyan(),
            tokens.old(),
            tokens.new_token()
        );
        println!("  Mode: {}", phases);
        println!(
            "  Gitignore: {}",
            gitignore_state(&report, cli.nogit, config.vcs_ignore)
        );
        println!("  Root: {}", report.root.display());

        // 4. Report
        print_renames(&report);
        if let Some(rewrites) = &report.rewrites {
            let matched = rewrites
                .iter()
                .filter(|o| !matches!(o, RewriteOutcome::Skipped { .. }))
                .count();
            println!("\nFound {} files with matching content...", matched);
        }
    }

    for failure in report.failures() {
        eprintln!(
            "{} {}: {}",
            "✗".red(),
            report.relative(&failure.path).display(),
            failure.message
        );
    }

    if !cli.quiet {
        print_summary(&report);
    }

    Ok(())
}

fn print_renames(report: &ShiftReport) {
    for outcome in report.renames.iter().flatten() {
        if let RenameOutcome::Renamed { from, to, mode, .. } = outcome {
            match mode {
                MatchMode::Segment => println!(
                    "{} Moved: {} → {}",
                    "✓".green(),
                    report.relative(from).display(),
                    report.relative(to).display()
                ),
                MatchMode::Basename => println!(
                    "{} Renamed: {} → {}",
                    "✓".green(),
                    file_name(from),
                    file_name(to)
                ),
            }
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_summary(report: &ShiftReport) {
    println!();
    println!("{}", "Summary:".bold());
    match &report.rewrites {
        Some(_) => println!(
            "  Content Replacements: {} ({} occurrences)",
            format!("{}", report.files_rewritten()).green(),
            report.replacements()
        ),
        None => println!("  Content Replacements: {}", "Skipped".cyan()),
    }
    match &report.renames {
        Some(_) => println!(
            "  Structural Renames: {} ({} files, {} directories)",
            format!("{}", report.structural_renames()).green(),
            report.files_renamed(),
            report.dirs_renamed()
        ),
        None => println!("  Structural Renames: {}", "Skipped".cyan()),
    }
    let failures = report.failures().len();
    if failures > 0 {
        println!("  {} failed", format!("{}", failures).red());
    }
}
