//! sxml - inspect and normalize XML documents

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "sxml")]
#[command(version)]
#[command(about = "Inspect and normalize namespace-scoped XML", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a document and print it back with minimal namespace declarations
    Fmt {
        /// Input XML file
        input: PathBuf,

        /// Write output to FILE instead of stdout
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Indent nested elements by N spaces
        #[arg(long, value_name = "N")]
        indent: Option<usize>,

        /// Remove whitespace-only text between elements
        #[arg(long)]
        strip_whitespace: bool,

        /// Write an XML declaration
        #[arg(long)]
        declaration: bool,

        /// Drop comments
        #[arg(long)]
        drop_comments: bool,

        /// Write xmlns:p="" where a prefix has to be undeclared
        #[arg(long)]
        allow_prefix_undeclarations: bool,
    },

    /// Print element, attribute and namespace counts
    Stats {
        /// Input XML file
        input: PathBuf,
    },

    /// Print the parse events of a document, one per line
    Events {
        /// Input XML file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sxml=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fmt {
            input,
            output,
            indent,
            strip_whitespace,
            declaration,
            drop_comments,
            allow_prefix_undeclarations,
        } => commands::fmt::execute(commands::fmt::FmtArgs {
            input,
            output,
            parse: scoped_xml::ParseOptions {
                keep_comments: !drop_comments,
                strip_ignorable_whitespace: strip_whitespace,
            },
            print: scoped_xml::PrintOptions {
                indent,
                xml_declaration: declaration,
                allow_prefix_undeclarations,
            },
        }),
        Commands::Stats { input } => commands::stats::execute(&input),
        Commands::Events { input } => commands::events::execute(&input),
    }
}
