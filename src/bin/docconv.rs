//! CLI binary for docconv.
//!
//! A thin shim over the library crate: `serve` runs the upload endpoint,
//! `convert` drives the upload client against a running server, and
//! `local` runs the dispatcher in-process.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use docconv::{
    convert_file, preview_result, save_result, start_server, ClientConfig, ClientSelection,
    ConversionResult, ServerConfig, UploadClient, DEFAULT_MAX_UPLOAD_BYTES,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the upload server on :5000
  docconv serve

  # Upload a workbook and save the rows as converted.json
  docconv convert people.xlsx --target xlsx

  # Print the extracted text of a document instead of saving it
  docconv convert letter.docx --target docx --preview

  # Convert without a server
  docconv local report.pdf -o out/

ENVIRONMENT VARIABLES:
  DOCCONV_HOST              Interface to bind (default 0.0.0.0)
  PORT                      Port to listen on (default 5000)
  DOCCONV_UPLOAD_DIR        Transient upload directory (default ./uploads)
  DOCCONV_MAX_UPLOAD_BYTES  Upload size limit (default 10485760)
  DOCCONV_SERVER_URL        Upload endpoint used by `convert`
  RUST_LOG                  Log filter, overrides -v / -q
"#;

/// Upload and convert PDF, DOCX and XLSX documents.
#[derive(Parser, Debug)]
#[command(
    name = "docconv",
    version,
    about = "Upload and convert PDF, DOCX and XLSX documents",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOCCONV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DOCCONV_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve POST /api/upload.
    Serve(ServeArgs),
    /// Upload a file to a running server and save the result.
    Convert(ConvertArgs),
    /// Convert a file in-process.
    Local(LocalArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, env = "DOCCONV_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// Directory for transient uploads; created if missing.
    #[arg(long, env = "DOCCONV_UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    /// Maximum accepted file size in bytes.
    #[arg(long, env = "DOCCONV_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,

    /// Disable the permissive CORS layer.
    #[arg(long)]
    no_cors: bool,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// File to upload (.pdf, .docx or .xlsx).
    input: PathBuf,

    #[arg(long, env = "DOCCONV_SERVER_URL", default_value = "http://localhost:5000/api/upload")]
    server: String,

    /// Conversion target: pdf, docx or xlsx. Defaults to the file's own type.
    #[arg(long)]
    target: Option<String>,

    /// Where to save the result.
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Print structured results instead of saving them.
    #[arg(long)]
    preview: bool,

    /// Whole-request timeout in seconds.
    #[arg(long, default_value_t = 120)]
    timeout: u64,
}

#[derive(Args, Debug)]
struct LocalArgs {
    /// File to convert (.pdf, .docx or .xlsx).
    input: PathBuf,

    /// Directory to write converted.pdf into. JSON results go to stdout.
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Convert(args) => upload(args, cli.quiet).await,
        Command::Local(args) => local(args).await,
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let config = ServerConfig::builder()
        .host(args.host)
        .port(args.port)
        .upload_dir(args.upload_dir)
        .max_upload_bytes(args.max_upload_bytes)
        .cors_permissive(!args.no_cors)
        .build()
        .context("Invalid configuration")?;
    start_server(config).await.context("Server failed")
}

async fn upload(args: ConvertArgs, quiet: bool) -> Result<()> {
    let mut selection = ClientSelection::new();
    let file = selection
        .select(&args.input)
        .with_context(|| format!("Cannot use {}", args.input.display()))?;
    let target = args
        .target
        .clone()
        .unwrap_or_else(|| file.format().to_string());

    let client = UploadClient::new(ClientConfig {
        server_url: args.server.clone(),
        timeout_secs: args.timeout,
        output_dir: args.output_dir.clone(),
    })
    .context("Failed to create HTTP client")?;

    let spinner = (!quiet).then(|| {
        let sp = ProgressBar::new_spinner();
        sp.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        sp.set_message(format!("Converting {}…", args.input.display()));
        sp.enable_steady_tick(Duration::from_millis(80));
        sp
    });

    let result = client.convert(&mut selection, &target).await;
    if let Some(sp) = &spinner {
        sp.finish_and_clear();
    }
    let response = result.context("Error converting file")?;

    if args.preview {
        if let Some(text) = preview_result(&response) {
            println!("{text}");
            return Ok(());
        }
    }

    let saved = save_result(&response, &client.config().output_dir)
        .await
        .context("Failed to save result")?;
    if !quiet {
        eprintln!(
            "{}  {}  {}",
            green("✔"),
            bold(&saved.display().to_string()),
            dim(&format!("{} bytes", response.body.len())),
        );
    }
    Ok(())
}

async fn local(args: LocalArgs) -> Result<()> {
    let result = convert_file(&args.input)
        .await
        .with_context(|| format!("Conversion of {} failed", args.input.display()))?;

    match result {
        ConversionResult::Binary(payload) => {
            let path = args.output_dir.join(payload.filename);
            tokio::fs::write(&path, &payload.bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("{}  {}", green("✔"), bold(&path.display().to_string()));
        }
        ConversionResult::Structured(value) => {
            let json = serde_json::to_string_pretty(&value).context("Failed to serialise output")?;
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(json.as_bytes())
                .context("Failed to write to stdout")?;
            handle.write_all(b"\n").ok();
        }
    }
    Ok(())
}
