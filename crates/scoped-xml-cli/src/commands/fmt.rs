//! Fmt command implementation

use anyhow::{Context, Result};
use scoped_xml::{ParseOptions, PrintOptions, parse_file, write_file, write_to};
use std::io::Write;
use std::path::PathBuf;

pub struct FmtArgs {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub parse: ParseOptions,
    pub print: PrintOptions,
}

pub fn execute(args: FmtArgs) -> Result<()> {
    let root = parse_file(&args.input, args.parse)
        .with_context(|| format!("Failed to parse {}", args.input.display()))?;
    tracing::info!(input = %args.input.display(), root = %root.name(), "Parsed document");

    match &args.output {
        Some(path) => write_file(&root, path, &args.print)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            write_to(&root, &mut out, &args.print).context("Failed to write to stdout")?;
            writeln!(out)?;
        }
    }
    Ok(())
}
