//! cellcalc CLI - formula evaluation tool

use anyhow::{Context, Result};
use cellcalc::prelude::*;
use cellcalc::{tokenize, EmptySource};
use clap::{ArgAction, Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cellcalc")]
#[command(author, version, about = "Spreadsheet-style formula evaluator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Maximum parenthesis nesting depth
    #[arg(long, global = true, default_value_t = EvaluatorOptions::default().max_depth)]
    max_depth: usize,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a single formula that does not reference other cells
    Eval {
        /// Formula text, e.g. "=(2+3)*4"
        formula: String,
    },

    /// Load a sheet file of `LABEL = formula` lines, recalculate it and print every cell
    Run {
        /// Input sheet file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show information about a sheet file without printing values
    Info {
        /// Input sheet file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = CalculationOptions::default().with_max_depth(cli.max_depth);

    match cli.command {
        Commands::Eval { formula } => eval_formula(&formula, &options),
        Commands::Run { input, output } => run_sheet(&input, output.as_deref(), &options),
        Commands::Info { input } => show_info(&input, &options),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn eval_formula(formula: &str, options: &CalculationOptions) -> Result<()> {
    let tokens = tokenize(formula).with_context(|| format!("Failed to tokenize '{}'", formula))?;
    let result = Evaluator::with_options(&EmptySource, options.evaluator.clone()).evaluate(&tokens);

    println!("{}", format_result(result.value, result.error.as_ref()));
    Ok(())
}

fn run_sheet(input: &Path, output: Option<&Path>, options: &CalculationOptions) -> Result<()> {
    let mut sheet = load_sheet(input)?;

    let stats = sheet
        .calculate_with_options(options)
        .context("Failed to calculate formulas")?;
    tracing::info!(
        calculated = stats.cells_calculated,
        errors = stats.errors,
        "sheet calculated"
    );

    let text = format_sheet(&sheet);

    if let Some(output_path) = output {
        std::fs::write(output_path, &text)
            .with_context(|| format!("Failed to write '{}'", output_path.display()))?;
        eprintln!(
            "Wrote {} cells to '{}'",
            sheet.cell_count(),
            output_path.display()
        );
    } else {
        io::stdout()
            .write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
    }

    Ok(())
}

fn show_info(input: &Path, options: &CalculationOptions) -> Result<()> {
    let mut sheet = load_sheet(input)?;
    let stats = sheet
        .calculate_with_options(options)
        .context("Failed to calculate formulas")?;

    println!("File: {}", input.display());
    println!("Formulas: {}", stats.formula_count);
    println!("Circular references: {}", stats.circular_references);
    println!("Cells with errors: {}", stats.errors);

    Ok(())
}

/// Read a sheet file
///
/// Each non-blank line not starting with `#` is `LABEL = formula`.
fn load_sheet(input: &Path) -> Result<Worksheet> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to open '{}'", input.display()))?;

    let name = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Sheet1".to_string());
    let mut sheet = Worksheet::new(name);

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (label, formula) = line.split_once('=').with_context(|| {
            format!(
                "{}:{}: expected 'LABEL = formula'",
                input.display(),
                line_no + 1
            )
        })?;

        cellcalc::set_formula(&mut sheet, label.trim(), formula)
            .with_context(|| format!("{}:{}", input.display(), line_no + 1))?;
    }

    Ok(sheet)
}

/// One `LABEL<TAB>result` line per cell, row-major
fn format_sheet(sheet: &Worksheet) -> String {
    let mut text = String::new();
    for (addr, cell) in sheet.formula_cells() {
        text.push_str(&format!(
            "{}\t{}\n",
            addr,
            format_result(cell.value, cell.error.as_ref())
        ));
    }
    text
}

/// Render a value, or the error identifier when there is one
fn format_result(value: f64, error: Option<&CellError>) -> String {
    match error {
        Some(e) => e.to_string(),
        None if value.fract() == 0.0 && value.abs() < 1e15 => format!("{}", value as i64),
        None => format!("{}", value),
    }
}
