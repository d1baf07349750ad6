//! Applies a JSON delta or a udiff to a JSON document.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use json_delta_cli::{exit_on_error, init_tracing, read_input, write_output, InputSource};
use json_delta_core::{apply, udiff, Delta, Pair, ParseConfig, Value};

#[derive(Debug, Parser)]
#[command(name = "json-patch", version, about = "Apply a JSON delta or udiff to a JSON document.")]
struct Cli {
    /// Document to patch. When omitted, stdin holds a `[struc, patch]` pair.
    struc: Option<PathBuf>,

    /// Patch to apply. Read from stdin when omitted.
    patch: Option<PathBuf>,

    /// Apply a udiff backwards, turning its right side into its left.
    #[arg(short, long)]
    reverse: bool,

    /// Parse the patch as a udiff even if it decodes as JSON.
    #[arg(short, long)]
    udiff: bool,

    /// Write output to FILE instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn main() {
    init_tracing();
    exit_on_error(run(Cli::parse()));
}

fn run(cli: Cli) -> Result<()> {
    let (struc, patch) = match cli.struc.as_deref() {
        None => {
            let text = read_input(&InputSource::Stdin)?;
            let pair = Pair::from_json_str(&text).context("failed to decode the pair on stdin")?;
            let patch = match pair.right {
                Value::String(text) => text,
                other => other.to_json_string(),
            };
            (pair.left, patch)
        }
        Some(struc) => {
            let source = InputSource::from_arg(Some(struc))?;
            let text = read_input(&source)?;
            let struc =
                Value::from_json_str(&text).with_context(|| format!("failed to decode {source}"))?;
            (struc, read_input(&InputSource::from_arg(cli.patch.as_deref())?)?)
        }
    };

    let delta = load_patch(&patch, cli.udiff, cli.reverse)?;
    let patched = apply(&struc, &delta).context("failed to apply the patch")?;
    write_output(cli.output.as_deref(), &format!("{patched}\n"))
}

/// Decodes a JSON delta, falling back to udiff for anything else.
fn load_patch(text: &str, force_udiff: bool, reverse: bool) -> Result<Delta> {
    if !force_udiff {
        if let Ok(delta) = Delta::from_json_str(text) {
            if reverse {
                bail!("--reverse only applies to udiff patches");
            }
            return Ok(delta);
        }
    }
    let config = ParseConfig::default().with_reverse(reverse);
    udiff::parse(text, &config).context("failed to parse the udiff patch")
}
