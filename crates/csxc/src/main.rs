use std::fs;
use std::path::PathBuf;
use std::process;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use clap::{Parser, ValueEnum};
use log::{debug, info};

use csx_checker::ast::Program;
use csx_checker::CheckerOptions;
use csx_common::config::{self, ConfigError};
use csx_common::{CsxConfig, Diagnostic, OutputFormat};

/// CSX semantic checker.
///
/// Checks a CSX syntax tree (JSON, as produced by the parser) for
/// declaration, scoping and type errors.
#[derive(Parser)]
#[command(
    name = "csxc",
    version,
    about,
    long_about = "CSX semantic checker.\n\nReads a CSX syntax tree in JSON form, resolves every name, checks type\nand kind compatibility, and reports diagnostics.\n\nExamples:\n  csxc prog.json                      Check a tree\n  csxc prog.json --source prog.csx    Render diagnostics against the source\n  csxc prog.json --format json        Machine-readable diagnostics\n  csxc prog.json --emit-annotated     Print the tree with resolved types"
)]
struct Cli {
    /// Input syntax tree (.json).
    input: PathBuf,

    /// Original source text, used to render diagnostics in context.
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Configuration file (default: nearest Csx.toml above the input).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Diagnostic output format.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Name of the method the class must end with.
    #[arg(long = "entry-point")]
    entry_point: Option<String>,

    /// Print the checked tree, with resolved types and kinds, as JSON.
    #[arg(long = "emit-annotated")]
    emit_annotated: bool,

    /// Only print diagnostics.
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Human,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Human => OutputFormat::Human,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    // === Configuration ===
    let mut config = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };
    if let Some(format) = cli.format {
        config.output.format = format.into();
    }
    if let Some(ref entry) = cli.entry_point {
        config.checker.entry_point = entry.clone();
    }

    // === Input ===
    let tree = match fs::read_to_string(&cli.input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: could not read '{}': {}", cli.input.display(), e);
            process::exit(1);
        }
    };
    let mut program: Program = match serde_json::from_str(&tree) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: invalid syntax tree '{}': {}", cli.input.display(), e);
            process::exit(1);
        }
    };

    let source = match cli.source {
        Some(ref path) => match fs::read_to_string(path) {
            Ok(text) => Some((path.clone(), text)),
            Err(e) => {
                eprintln!("error: could not read '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => None,
    };

    // === Semantic Analysis ===
    let options = CheckerOptions::from_config(&config);
    info!("checking {} (entry point `{}`)", cli.input.display(), options.entry_point);
    let diagnostics = match csx_checker::analyze_with_options(&mut program, &options) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(2);
        }
    };

    match config.output.format {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "well_typed": diagnostics.is_well_typed(),
                "error_count": diagnostics.error_count(),
                "diagnostics": diagnostics.diagnostics(),
            });
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("error: failed to serialize diagnostics: {}", e);
                    process::exit(1);
                }
            }
        }
        OutputFormat::Human => {
            let display_name = source
                .as_ref()
                .map(|(path, _)| path.as_path())
                .unwrap_or(cli.input.as_path())
                .display()
                .to_string();
            for diag in diagnostics.diagnostics() {
                let text = source.as_ref().map(|(_, text)| text.as_str());
                print_diagnostic(diag, text, &display_name, config.output.color);
            }
            if !cli.quiet {
                if diagnostics.is_well_typed() {
                    println!("No errors found.");
                } else {
                    eprintln!("{} error(s) found.", diagnostics.error_count());
                }
            }
        }
    }

    if cli.emit_annotated {
        match serde_json::to_string_pretty(&program) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: failed to serialize tree: {}", e);
                process::exit(1);
            }
        }
    }

    if diagnostics.has_errors() {
        process::exit(1);
    }
}

/// Load the explicit config file, or the nearest Csx.toml above the input.
/// A missing Csx.toml means defaults.
fn load_config(cli: &Cli) -> Result<CsxConfig, ConfigError> {
    if let Some(ref path) = cli.config {
        return config::load_config(path);
    }
    let abs_input = fs::canonicalize(&cli.input).unwrap_or_else(|_| cli.input.clone());
    match config::find_and_load_config(&abs_input) {
        Ok(c) => {
            debug!("loaded config from {:?}", c.root_dir);
            Ok(c)
        }
        Err(ConfigError::NotFound(_)) => Ok(CsxConfig::default()),
        Err(e) => Err(e),
    }
}

fn print_diagnostic(diag: &Diagnostic, source: Option<&str>, file_name: &str, color: bool) {
    let located = source.and_then(|text| diag.position.offset_in(text).map(|start| (text, start)));

    let Some((text, start)) = located else {
        eprintln!("error[{}]: {}", diag.kind, diag.message);
        eprintln!("  --> {}:{}", file_name, diag.position);
        for related in &diag.related {
            eprintln!("   = note: {} ({})", related.message, related.position);
        }
        if let Some(ref suggestion) = diag.suggestion {
            eprintln!("   = help: {}", suggestion);
        }
        eprintln!();
        return;
    };

    let end = start + 1;
    let mut report = Report::build(ReportKind::Error, file_name, start)
        .with_config(Config::default().with_color(color))
        .with_code(diag.kind.as_str())
        .with_message(&diag.message)
        .with_label(
            Label::new((file_name, start..end))
                .with_message(&diag.message)
                .with_color(Color::Red),
        );

    for related in &diag.related {
        if let Some(rs) = related.position.offset_in(text) {
            report = report.with_label(
                Label::new((file_name, rs..rs + 1))
                    .with_message(&related.message)
                    .with_color(Color::Blue),
            );
        }
    }

    if let Some(ref suggestion) = diag.suggestion {
        report = report.with_help(suggestion);
    }

    if let Err(e) = report.finish().eprint((file_name, Source::from(text))) {
        eprintln!("error: failed to render diagnostic: {}", e);
    }
}
