use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use sebkey::SebFile;

mod response;

use response::{build_response_fields, ResponseConfig, ResponseField};

const SUCCESS_MESSAGE: &str = "SEB configuration file successfully parsed";

#[derive(Debug, Parser)]
#[command(
    name = "sebkey",
    version,
    about = "Print the Safe Exam Browser config key and request hash of a .seb file"
)]
struct Args {
    /// Input .seb file (defaults to stdin)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,
    /// Name reported in the File-Name field (defaults to the input file name)
    #[arg(long, value_name = "NAME")]
    file_name: Option<String>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Include the canonical serialization
    #[arg(long)]
    show_serialized: bool,
    /// Include the parsed dictionary as JSON
    #[arg(long)]
    show_dictionary: bool,
    /// Omit the start URL (Referer) field
    #[arg(long)]
    hide_start_url: bool,
    /// Omit the request hash field
    #[arg(long)]
    hide_request_hash: bool,
    /// Omit the config key hash field
    #[arg(long)]
    hide_config_key: bool,
    /// Fail when the file has no usable startURL
    #[arg(long)]
    require_start_url: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl Args {
    fn response_config(&self) -> ResponseConfig {
        ResponseConfig {
            show_start_url: !self.hide_start_url,
            show_request_hash: !self.hide_request_hash,
            show_config_key: !self.hide_config_key,
            show_serialized: self.show_serialized,
            show_dictionary: self.show_dictionary,
        }
    }

    fn reported_file_name(&self) -> String {
        if let Some(name) = &self.file_name {
            return name.clone();
        }
        self.input
            .as_ref()
            .and_then(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    code: u16,
    status: &'static str,
    message: &'static str,
    data: &'a [ResponseField],
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let args = Args::parse();

    let input_data = read_input(&args.input)?;
    let seb = SebFile::from_bytes(&input_data).context("error parsing SEB file")?;
    info!(keys = seb.dictionary().len(), "parsed SEB file");

    if args.require_start_url && !seb.start_url().is_some_and(|url| !url.is_empty()) {
        bail!("The SEB file does not contain a valid StartUrl");
    }

    let fields = build_response_fields(&seb, &args.reported_file_name(), &args.response_config())
        .context("failed to render dictionary")?;
    debug!(fields = fields.len(), "built response fields");

    let output = match args.format {
        OutputFormat::Text => render_text(&fields),
        OutputFormat::Json => render_json(&fields)?,
    };

    let mut stdout = io::stdout();
    stdout
        .write_all(output.as_bytes())
        .context("failed to write stdout")?;
    Ok(())
}

fn read_input(path: &Option<PathBuf>) -> Result<Vec<u8>> {
    let buffer = match path {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("failed to read input file {}", path.display()))?,
        None => {
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .context("failed to read stdin")?;
            buffer
        }
    };
    if buffer.iter().all(u8::is_ascii_whitespace) {
        bail!("no input provided");
    }
    Ok(buffer)
}

fn render_text(fields: &[ResponseField]) -> String {
    fields
        .iter()
        .map(|field| format!("{}: {}\n", field.name, field.value.as_deref().unwrap_or("-")))
        .collect()
}

fn render_json(fields: &[ResponseField]) -> Result<String> {
    let envelope = Envelope {
        code: 200,
        status: "success",
        message: SUCCESS_MESSAGE,
        data: fields,
    };
    let mut json = serde_json::to_string_pretty(&envelope).context("failed to render JSON")?;
    json.push('\n');
    Ok(json)
}
