//! Computes the delta between two JSON documents.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use json_delta_cli::{
    exit_on_error, init_tracing, read_input, udiff_header, write_output, InputSource,
};
use json_delta_core::{diff, udiff, CompressionStats, DiffOptions, Pair, RenderConfig, Value};

#[derive(Debug, Parser)]
#[command(name = "json-diff", version, about = "Compute the delta between two JSON documents.")]
struct Cli {
    /// Left document. When omitted, stdin holds a `[left, right]` pair.
    left: Option<PathBuf>,

    /// Right document. Read from stdin when omitted.
    right: Option<PathBuf>,

    /// Write output to FILE instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print compression statistics on stderr.
    #[arg(short, long)]
    verbose: bool,

    /// Print a udiff instead of the JSON delta.
    #[arg(short, long)]
    unified: bool,

    /// Trade delta size for speed.
    #[arg(short, long)]
    fast: bool,
}

fn main() {
    init_tracing();
    exit_on_error(run(Cli::parse()));
}

fn run(cli: Cli) -> Result<()> {
    let (left, right, headers) = match cli.left.as_deref() {
        None => {
            let text = read_input(&InputSource::Stdin)?;
            let pair = Pair::from_json_str(&text).context("failed to decode the pair on stdin")?;
            (pair.left, pair.right, ("--- <stdin>[0]".to_owned(), "+++ <stdin>[1]".to_owned()))
        }
        Some(left) => {
            let left_source = InputSource::from_arg(Some(left))?;
            let right_source = InputSource::from_arg(cli.right.as_deref())?;
            let left = decode(&left_source)?;
            let right = decode(&right_source)?;
            (left, right, (udiff_header("---", &left_source), udiff_header("+++", &right_source)))
        }
    };

    let options = if cli.fast { DiffOptions::fast() } else { DiffOptions::default() };
    let delta = diff(&left, &right, &options).context("failed to compute the delta")?;
    if cli.verbose {
        eprintln!("{}", CompressionStats::measure(&right, &delta));
    }

    let rendered = if cli.unified {
        let lines = udiff::render(&left, &right, Some(&delta), &RenderConfig::default())
            .context("failed to render the udiff")?;
        let mut rendered = format!("{}\n{}\n", headers.0, headers.1);
        for line in lines {
            rendered.push_str(&line);
            rendered.push('\n');
        }
        rendered
    } else {
        format!("{delta}\n")
    };
    write_output(cli.output.as_deref(), &rendered)
}

fn decode(source: &InputSource) -> Result<Value> {
    let text = read_input(source)?;
    Value::from_json_str(&text).with_context(|| format!("failed to decode {source}"))
}
