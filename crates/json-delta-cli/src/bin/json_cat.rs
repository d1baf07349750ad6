//! Concatenates files into a single JSON array.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use json_delta_cli::{exit_on_error, init_tracing, read_input, write_output, InputSource};
use json_delta_core::Value;

#[derive(Debug, Parser)]
#[command(
    name = "json-cat",
    version,
    about = "Print the given files as one JSON array. Files that are not JSON become strings."
)]
struct Cli {
    /// Files to read; `-` reads stdin.
    files: Vec<PathBuf>,
}

fn main() {
    init_tracing();
    exit_on_error(run(Cli::parse()));
}

fn run(cli: Cli) -> Result<()> {
    let sources = if cli.files.is_empty() {
        vec![InputSource::Stdin]
    } else {
        cli.files
            .iter()
            .map(|path| InputSource::from_arg(Some(path)))
            .collect::<Result<Vec<_>>>()?
    };

    let mut items = Vec::with_capacity(sources.len());
    for source in &sources {
        let text = read_input(source)?;
        let item = Value::from_json_str(&text).unwrap_or_else(|err| {
            tracing::debug!(%source, %err, "keeping input as a string");
            Value::String(text)
        });
        items.push(item);
    }
    write_output(None, &format!("{}\n", Value::Array(items)))
}
