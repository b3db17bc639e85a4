use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use filterspec::config::EvalConfig;
use filterspec::{Evaluator, Selection, parse, render};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse a filter string and print its canonical form
    Check {
        /// Filter string, e.g. `a~eq~1~and~(b~eq~2~or~b~eq~3)`
        expression: String,

        /// Also print the parsed tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the JSON Lines records matching every --where clause
    Select(SelectArgs),
}

#[derive(Args)]
pub struct SelectArgs {
    /// Filter string; repeat to AND several clauses
    #[arg(short = 'w', long = "where", required = true)]
    pub clauses: Vec<String>,

    /// Input JSON Lines file (default: stdin)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Evaluator configuration file (YAML, TOML or JSON)
    #[arg(short, long, env = "FILTERSPEC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Drop repeated records
    #[arg(long)]
    pub distinct: bool,

    /// Number of threads (default: all cores)
    #[arg(short, long)]
    pub threads: Option<usize>,
}

pub fn run_check(expression: &str, json: bool, out: &mut impl Write) -> Result<()> {
    let filter = parse(expression).with_context(|| format!("Check: invalid filter `{expression}`"))?;

    writeln!(out, "{}", render(filter.as_ref()))?;
    if json {
        serde_json::to_writer_pretty(&mut *out, &filter)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Returns the number of records written.
pub fn run_select(args: &SelectArgs) -> Result<usize> {
    let config = EvalConfig::load(args.config.as_deref()).context("Select: Failed to load config")?;
    let evaluator = Evaluator::new(&config).context("Select: Invalid date format")?;

    let mut selection = Selection::new();
    for clause in &args.clauses {
        selection = selection
            .where_str(clause)
            .with_context(|| format!("Select: invalid filter `{clause}`"))?;
    }
    if args.distinct {
        selection = selection.distinct();
    }
    if let Some(filter) = selection.filter() {
        tracing::info!("Filter: {}", filter);
    }

    let records = match &args.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Select: Failed to open {}", path.display()))?;
            read_records(BufReader::new(file), path)?
        }
        None => read_records(io::stdin().lock(), Path::new("<stdin>"))?,
    };

    let selected = selection.apply(&evaluator, &records)?;

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("Select: Failed to create {}", path.display())
        })?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    for record in &selected {
        serde_json::to_writer(&mut writer, record)?;
        writeln!(writer)?;
    }
    writer.flush().context("Select: Failed to flush output")?;

    Ok(selected.len())
}

/// One JSON value per line; blank lines are skipped.
pub fn read_records(reader: impl BufRead, source: &Path) -> Result<Vec<Value>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Select: Failed to read {}", source.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .with_context(|| format!("Select: {}:{}: invalid JSON record", source.display(), idx + 1))?;
        records.push(record);
    }
    Ok(records)
}
