//! `bson` CLI: build, inspect and validate BSON documents from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Build a document (stdout is binary; redirect it)
//! bson build name=str:Alice age=i32:30 -o person.bson
//!
//! # Embed another document
//! bson build owner=doc:person.bson count=i64:1 -o wrapper.bson
//!
//! # Print an indented tree
//! bson inspect -i wrapper.bson
//!
//! # Print one value
//! bson get owner -i wrapper.bson
//!
//! # Check a file from stdin
//! cat wrapper.bson | bson validate --max-depth 4
//!
//! # Hex dump
//! bson hex -i person.bson
//! ```
//!
//! Set `RUST_LOG` (or pass `-v`) to see decoder diagnostics on stderr.

use anyhow::{bail, Context, Result};
use bson_core::{DecodeOptions, Document, Value};
use clap::{Parser, Subcommand};
use std::io::{self, Read, Write};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bson", version, about = "BSON document CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log decoder diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a document from KEY=TYPE:VALUE pairs (types: str, i32, i64, int, doc)
    Build {
        /// Pairs in order, e.g. `name=str:Alice` or `child=doc:child.bson`
        #[arg(required = true)]
        pairs: Vec<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Print every element as an indented tree
    Inspect {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Maximum nesting depth accepted
        #[arg(long, default_value_t = DecodeOptions::DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },
    /// Print the value stored under KEY
    Get {
        key: String,
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Maximum nesting depth accepted
        #[arg(long, default_value_t = DecodeOptions::DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },
    /// Check that the input is a well-formed document
    Validate {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Maximum nesting depth accepted
        #[arg(long, default_value_t = DecodeOptions::DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },
    /// Print the raw bytes as hex
    Hex {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Maximum nesting depth accepted
        #[arg(long, default_value_t = DecodeOptions::DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Build { pairs, output } => {
            let parsed = pairs
                .iter()
                .map(|raw| parse_pair(raw))
                .collect::<Result<Vec<_>>>()?;
            let doc = Document::try_from_pairs(parsed).context("Failed to build document")?;
            debug!(keys = doc.len(), bytes = doc.raw_bytes().len(), "built document");
            write_output(output.as_deref(), doc.raw_bytes())?;
        }
        Commands::Inspect { input, max_depth } => {
            let doc = load(input.as_deref(), max_depth)?;
            let mut out = String::new();
            render_tree(&doc, 0, &mut out);
            print!("{}", out);
        }
        Commands::Get {
            key,
            input,
            max_depth,
        } => {
            let doc = load(input.as_deref(), max_depth)?;
            match doc.get(&key) {
                Some(value) => println!("{}", value),
                None => bail!("Key not found: '{}'", key),
            }
        }
        Commands::Validate { input, max_depth } => {
            let doc = load(input.as_deref(), max_depth)?;
            println!(
                "valid: {} keys, {} bytes",
                doc.len(),
                doc.raw_bytes().len()
            );
        }
        Commands::Hex { input, max_depth } => {
            let doc = load(input.as_deref(), max_depth)?;
            println!("{}", doc.to_hex());
        }
    }

    Ok(())
}

/// Logs go to stderr so binary and text output on stdout stay clean.
///
/// - `-v` forces `debug`
/// - otherwise `RUST_LOG` is honoured, defaulting to `warn`
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Parse one `KEY=TYPE:VALUE` argument.
///
/// - `str` keeps VALUE verbatim (it may contain `:` or `=`)
/// - `i32`/`i64` parse VALUE as that width
/// - `int` uses the platform's native integer width
/// - `doc` reads VALUE as a path to an encoded document
fn parse_pair(raw: &str) -> Result<(String, Value)> {
    let Some((key, typed)) = raw.split_once('=') else {
        bail!("Invalid pair '{}': expected KEY=TYPE:VALUE", raw);
    };
    let Some((ty, value)) = typed.split_once(':') else {
        bail!("Invalid pair '{}': expected KEY=TYPE:VALUE", raw);
    };
    if key.contains('\0') {
        bail!("Invalid key '{}': keys cannot contain NUL", key.escape_debug());
    }

    let value = match ty {
        "str" => Value::from(value),
        "i32" => Value::Int32(
            value
                .parse()
                .with_context(|| format!("Invalid i32 for '{}': {}", key, value))?,
        ),
        "i64" => Value::Int64(
            value
                .parse()
                .with_context(|| format!("Invalid i64 for '{}': {}", key, value))?,
        ),
        "int" => Value::from(
            value
                .parse::<isize>()
                .with_context(|| format!("Invalid int for '{}': {}", key, value))?,
        ),
        "doc" => {
            let bytes = std::fs::read(value)
                .with_context(|| format!("Failed to read file: {}", value))?;
            let doc = Document::from_bytes(bytes)
                .with_context(|| format!("Failed to decode embedded document: {}", value))?;
            Value::Document(doc)
        }
        other => bail!(
            "Unknown type '{}' for '{}'. Available types: str, i32, i64, int, doc",
            other,
            key
        ),
    };
    Ok((key.to_string(), value))
}

/// Render `key (type): value` lines, indenting two spaces per nesting level.
fn render_tree(doc: &Document, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    for (key, value) in doc {
        match &value {
            Value::Document(child) => {
                out.push_str(&format!("{}{} (document):\n", indent, key));
                render_tree(child, depth + 1, out);
            }
            scalar => {
                out.push_str(&format!(
                    "{}{} ({}): {}\n",
                    indent,
                    key,
                    scalar.element_type(),
                    scalar
                ));
            }
        }
    }
}

fn load(path: Option<&str>, max_depth: usize) -> Result<Document> {
    let bytes = read_input(path)?;
    let options = DecodeOptions::default().with_max_depth(max_depth);
    Document::from_bytes_with(bytes, &options).context("Failed to decode BSON input")
}

fn read_input(path: Option<&str>) -> Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path).with_context(|| format!("Failed to read file: {}", path)),
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, bytes: &[u8]) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, bytes).with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(bytes).context("Failed to write to stdout")?;
            stdout.flush().context("Failed to write to stdout")?;
        }
    }
    Ok(())
}
