use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

use media_console::document;
use media_console::manager::validate_document;

#[derive(Parser)]
#[command(name = "console-cli")]
#[command(about = "Management CLI for the media server console", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8090", env = "MEDIA_CONSOLE_URL")]
    url: String,

    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION", env = "MEDIA_CONSOLE_KEY")]
    key: String,

    /// Name recorded on snapshots and audit events
    #[arg(short, long, default_value = "admin")]
    operator: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show console and media server status
    Status,
    /// Print the live Server.xml
    Config,
    /// Validate, snapshot and write a new Server.xml
    Apply {
        file: PathBuf,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// List configuration snapshots, newest first
    Snapshots {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Restore a snapshot to the live file
    Restore { id: i64 },
    /// List virtual hosts in the live file
    Vhosts,
    /// Reload the console settings
    Reload,
    /// Check a Server.xml locally without contacting the console
    Validate { file: PathBuf },
    /// Summarize a Server.xml locally
    Summary { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );
    headers.insert("x-operator", HeaderValue::from_str(&cli.operator)?);

    let base = cli.url.trim_end_matches('/');
    let request = match cli.command {
        Commands::Status => client.get(format!("{}/admin/status", base)),
        Commands::Config => {
            let res = client
                .get(format!("{}/admin/config", base))
                .headers(headers)
                .send()
                .await?;
            return print_field(res, "content").await;
        }
        Commands::Apply { file, description } => {
            let content = std::fs::read_to_string(&file)?;
            client
                .put(format!("{}/admin/config", base))
                .json(&json!({ "content": content, "description": description }))
        }
        Commands::Snapshots { limit } => {
            let mut req = client.get(format!("{}/admin/snapshots", base));
            if let Some(limit) = limit {
                req = req.query(&[("limit", limit)]);
            }
            req
        }
        Commands::Restore { id } => client.post(format!("{}/admin/snapshots/{}/restore", base, id)),
        Commands::Vhosts => client.get(format!("{}/admin/vhosts", base)),
        Commands::Reload => client.post(format!("{}/admin/reload", base)),
        Commands::Validate { file } => return validate_file(&file),
        Commands::Summary { file } => return summarize_file(&file),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

fn summarize_file(file: &Path) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let doc = document::parse(&std::fs::read_to_string(file)?)?;
    println!("{}", serde_json::to_string_pretty(&document::extract_summary(&doc))?);
    Ok(ExitCode::SUCCESS)
}

fn validate_file(file: &Path) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(file)?;
    let result = document::parse(&text)
        .map_err(|e| e.to_string())
        .and_then(|doc| validate_document(&doc).map_err(|e| e.to_string()));

    match result {
        Ok(()) => {
            println!("{}: valid", file.display());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{}: {}", file.display(), e);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn print_response(res: reqwest::Response) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(ExitCode::FAILURE);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(ExitCode::SUCCESS)
}

/// Print one string field of a JSON response verbatim.
async fn print_field(res: reqwest::Response, field: &str) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        return print_response(res).await;
    }

    let json: Value = res.json().await?;
    match json.get(field).and_then(Value::as_str) {
        Some(text) => println!("{}", text),
        None => println!("{}", serde_json::to_string_pretty(&json)?),
    }
    Ok(ExitCode::SUCCESS)
}
