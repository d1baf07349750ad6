//! Shared plumbing for the `json-diff`, `json-patch` and `json-cat` binaries.

use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use tracing_subscriber::EnvFilter;

/// Where an input document comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputSource {
    /// A file on disk.
    File(PathBuf),
    /// Standard input.
    Stdin,
}

impl InputSource {
    /// Maps an optional path argument to a source, treating `-` and a
    /// missing argument as stdin.
    pub fn from_arg(arg: Option<&Path>) -> Result<Self> {
        match arg {
            None => Ok(Self::Stdin),
            Some(path) if path.as_os_str() == "-" => Ok(Self::Stdin),
            Some(path) if path.as_os_str().is_empty() => bail!("expected file path; got empty string"),
            Some(path) => Ok(Self::File(path.to_path_buf())),
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Stdin => f.write_str("<stdin>"),
        }
    }
}

/// Reads a whole input into memory.
pub fn read_input(source: &InputSource) -> Result<String> {
    let text = match source {
        InputSource::File(path) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?
        }
        InputSource::Stdin => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).context("failed to read stdin")?;
            buffer
        }
    };
    tracing::debug!(%source, bytes = text.len(), "read input");
    Ok(text)
}

/// Writes `rendered` to `path`, or to stdout when no path is given.
pub fn write_output(path: Option<&Path>, rendered: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, rendered.as_bytes())
            .with_context(|| format!("failed to write output to {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(rendered.as_bytes()).context("failed to write to stdout")?;
            stdout.flush().context("failed to flush stdout")
        }
    }
}

/// Formats a udiff header line: the sigil, the source name, a tab and the
/// file's local modification time. The time is left empty for stdin or
/// when it cannot be read.
pub fn udiff_header(sigil: &str, source: &InputSource) -> String {
    let modified = match source {
        InputSource::File(path) => fs::metadata(path).and_then(|meta| meta.modified()).ok(),
        InputSource::Stdin => None,
    };
    let dateline = modified
        .map(|time| DateTime::<Local>::from(time).format("%Y-%m-%d %H:%M:%S %:z").to_string())
        .unwrap_or_default();
    format!("{sigil} {source}\t{dateline}")
}

/// Installs a stderr subscriber filtered by `RUST_LOG`, defaulting to
/// `warn`, so stdout stays machine readable.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).try_init();
}

/// Prints the error chain on stderr and exits with code 1 when `result`
/// is an error.
pub fn exit_on_error(result: Result<()>) {
    if let Err(err) = result {
        let _ = writeln!(io::stderr(), "{err:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_and_missing_arguments_mean_stdin() {
        assert_eq!(InputSource::from_arg(None).unwrap(), InputSource::Stdin);
        assert_eq!(InputSource::from_arg(Some(Path::new("-"))).unwrap(), InputSource::Stdin);
        assert_eq!(
            InputSource::from_arg(Some(Path::new("a.json"))).unwrap(),
            InputSource::File(PathBuf::from("a.json"))
        );
        assert!(InputSource::from_arg(Some(Path::new(""))).is_err());
    }

    #[test]
    fn sources_display_their_names() {
        assert_eq!(InputSource::Stdin.to_string(), "<stdin>");
        assert_eq!(InputSource::File(PathBuf::from("x/y.json")).to_string(), "x/y.json");
    }

    #[test]
    fn headers_carry_the_modification_time() {
        assert_eq!(udiff_header("+++", &InputSource::Stdin), "+++ <stdin>\t");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("left.json");
        fs::write(&path, "{}").unwrap();
        let header = udiff_header("---", &InputSource::File(path.clone()));
        let (name, dateline) = header.split_once('\t').unwrap();
        assert_eq!(name, format!("--- {}", path.display()));
        assert!(DateTime::parse_from_str(dateline, "%Y-%m-%d %H:%M:%S %:z").is_ok(), "{dateline}");

        let missing = udiff_header("---", &InputSource::File(dir.path().join("missing.json")));
        assert!(missing.ends_with("missing.json\t"));
    }

    #[test]
    fn output_files_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_output(Some(&path), "[1]\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[1]\n");
        let missing = read_input(&InputSource::File(dir.path().join("missing.json"))).unwrap_err();
        assert!(format!("{missing:#}").contains("failed to read"));
    }
}
