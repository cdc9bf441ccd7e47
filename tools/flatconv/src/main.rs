//! CLI tool for re-shaping flat files between delimited and fixed-width
//! layouts.
//!
//! # Usage
//!
//! ```bash
//! # CSV (with a header line) to fixed-width columns
//! flatconv -i people.csv --input-layout delimited --output-layout fixed \
//!     --output-widths 8,10,8 -o people.dat
//!
//! # Fixed-width to semicolon-separated, collecting bad lines
//! flatconv -i people.dat --input-layout fixed --widths 8,10,8 \
//!     --output-layout delimited --output-delimiter ';' \
//!     --error-mode save --errors-json bad-lines.json
//!
//! # Read from stdin, write to stdout
//! cat rows.csv | flatconv --input-layout delimited --output-layout delimited \
//!     --output-delimiter '\t' > rows.tsv
//! ```

use std::fs::File;
use std::io::{Read, Write, stdin, stdout};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use flatfile::prelude::*;
use tracing::{debug, info};

/// Re-shape flat files between delimited and fixed-width layouts.
///
/// Reads records from input (file or stdin), decodes them against an
/// inferred or width-declared schema, and writes them to output (file or
/// stdout) in the requested layout.
#[derive(Parser, Debug)]
#[command(name = "flatconv")]
#[command(version, about)]
struct Args {
    /// Input file path. If not specified, reads from stdin.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file path. If not specified, writes to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Input layout.
    #[arg(long, value_enum)]
    input_layout: LayoutArg,

    /// Output layout.
    #[arg(long, value_enum)]
    output_layout: LayoutArg,

    /// Field delimiter of the input (delimited layout).
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Field delimiter of the output. Defaults to the input delimiter.
    #[arg(long)]
    output_delimiter: Option<char>,

    /// Column widths of the input (fixed layout), comma-separated.
    #[arg(long, value_delimiter = ',')]
    widths: Vec<usize>,

    /// Column widths of the output (fixed layout), comma-separated.
    /// Defaults to the input widths.
    #[arg(long, value_delimiter = ',')]
    output_widths: Vec<usize>,

    /// Header lines in the input. For a delimited input the first header
    /// line supplies the field names.
    #[arg(long, default_value_t = 1)]
    header_lines: usize,

    /// Footer lines in the input, withheld from decoding.
    #[arg(long, default_value_t = 0)]
    footer_lines: usize,

    /// How to treat records that fail to decode.
    #[arg(long, value_enum, default_value_t = ErrorModeArg::Throw)]
    error_mode: ErrorModeArg,

    /// With `--error-mode save`: dump the error log as JSON to this path.
    #[arg(long)]
    errors_json: Option<PathBuf>,

    /// Convert at most this many records (0 = all).
    #[arg(long, default_value_t = 0)]
    max_records: usize,
}

/// Flat-file layouts supported on either side of the conversion.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum LayoutArg {
    /// Delimiter-separated fields, quoting per RFC 4180.
    Delimited,
    /// Fixed-width columns.
    Fixed,
}

/// Error tolerance of the decoding pass.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ErrorModeArg {
    /// Stop at the first malformed record.
    Throw,
    /// Drop malformed records silently.
    Ignore,
    /// Keep going and collect malformed records into a log.
    Save,
}

impl From<ErrorModeArg> for ErrorMode {
    fn from(arg: ErrorModeArg) -> Self {
        match arg {
            ErrorModeArg::Throw => Self::ThrowException,
            ErrorModeArg::Ignore => Self::IgnoreAndContinue,
            ErrorModeArg::Save => Self::SaveAndContinue,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let source = read_input(&args)?;
    let input_schema = build_input_schema(&args, &source)?;
    debug!(fields = input_schema.field_count(), "input schema ready");

    let mut decoder = RecordEngine::with_error_mode(input_schema, args.error_mode.into());
    let max = if args.max_records == 0 { None } else { Some(args.max_records) };
    let records = decoder.decode_string(&source, max).context("Failed to decode input")?;
    info!(records = records.len(), errors = decoder.errors().len(), "decode pass finished");

    report_errors(&args, &decoder)?;

    let output_schema = build_output_schema(&args, decoder.schema())?;
    let mut encoder = RecordEngine::new(output_schema);
    if let LayoutArg::Delimited = args.output_layout {
        if args.header_lines > 0 {
            encoder.set_header_text(output_header(&args, encoder.schema()));
        }
    }
    let text = encoder.encode_string(&records, None).context("Failed to encode output")?;

    write_output(&args, &text)?;

    // Final count goes to stderr so it never mixes with stdout output.
    eprintln!("Converted {} record(s)", records.len());
    Ok(())
}

fn read_input(args: &Args) -> Result<String> {
    let mut source = String::new();
    match &args.input {
        Some(path) => {
            File::open(path)
                .with_context(|| format!("Failed to open input file: {}", path.display()))?
                .read_to_string(&mut source)
                .with_context(|| format!("Failed to read input file: {}", path.display()))?;
        }
        None => {
            stdin().lock().read_to_string(&mut source).context("Failed to read stdin")?;
        }
    }
    Ok(source)
}

fn write_output(args: &Args, text: &str) -> Result<()> {
    match &args.output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            file.write_all(text.as_bytes())
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
        }
        None => {
            stdout().lock().write_all(text.as_bytes()).context("Failed to write stdout")?;
        }
    }
    Ok(())
}

/// Builds the decoding schema: field names come from the header line
/// (delimited input) or are generated per declared width (fixed input).
fn build_input_schema(args: &Args, source: &str) -> Result<RecordSchema> {
    let schema = match args.input_layout {
        LayoutArg::Delimited => {
            let builder = SchemaBuilder::new("Row", args.delimiter).header_lines(args.header_lines);
            if args.header_lines > 0 {
                let first_line = source.lines().next().unwrap_or_default();
                builder.from_sample_line(first_line).context("Cannot infer schema from header")?
            } else {
                let first_line = source.lines().next().unwrap_or_default();
                let count = first_line.split(args.delimiter).count();
                builder.with_field_count(count).context("Cannot infer schema from first line")?
            }
        }
        LayoutArg::Fixed => {
            if args.widths.is_empty() {
                bail!("--widths is required for a fixed-width input");
            }
            let fields = args
                .widths
                .iter()
                .enumerate()
                .map(|(i, w)| {
                    FieldDescriptor::text(format!("Field_{}", i + 1))
                        .with_width(*w)
                        .with_trim(Trim::Right)
                })
                .collect();
            RecordSchema::fixed_width("Row", fields)
                .context("Invalid fixed-width input schema")?
                .with_header_lines(args.header_lines)
        }
    };
    Ok(schema.with_footer_lines(args.footer_lines))
}

/// Builds the encoding schema: same field names, the requested layout.
fn build_output_schema(args: &Args, input: &RecordSchema) -> Result<RecordSchema> {
    let schema = match args.output_layout {
        LayoutArg::Delimited => {
            let delimiter = args.output_delimiter.unwrap_or(args.delimiter);
            let fields = input.fields().iter().map(|f| FieldDescriptor::text(&f.name)).collect();
            RecordSchema::delimited("Row", delimiter, fields)
                .context("Invalid delimited output schema")?
        }
        LayoutArg::Fixed => {
            let widths = if args.output_widths.is_empty() { &args.widths } else { &args.output_widths };
            if widths.len() != input.field_count() {
                bail!(
                    "--output-widths declares {} columns, input has {} fields",
                    widths.len(),
                    input.field_count()
                );
            }
            let fields = input
                .fields()
                .iter()
                .zip(widths)
                .map(|(f, w)| FieldDescriptor::text(&f.name).with_width(*w))
                .collect();
            RecordSchema::fixed_width("Row", fields).context("Invalid fixed-width output schema")?
        }
    };
    Ok(schema)
}

fn output_header(args: &Args, schema: &RecordSchema) -> String {
    let delimiter = args.output_delimiter.unwrap_or(args.delimiter);
    let names: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
    names.join(&delimiter.to_string())
}

fn report_errors(args: &Args, decoder: &RecordEngine) -> Result<()> {
    if decoder.errors().is_empty() {
        return Ok(());
    }
    eprintln!("{} record(s) failed to decode", decoder.errors().len());
    if let Some(path) = &args.errors_json {
        let file = File::create(path)
            .with_context(|| format!("Failed to create error log: {}", path.display()))?;
        serde_json::to_writer_pretty(file, decoder.errors())
            .context("Failed to serialize error log")?;
    }
    Ok(())
}
