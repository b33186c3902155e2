use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use url::Url;

#[derive(Parser)]
#[command(name = "devel-cli")]
#[command(about = "Inspect a running devel-diagnostics server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8088")]
    url: Url,

    /// Bearer token granting diagnostic access.
    #[arg(short, long)]
    token: Option<String>,

    /// Mount point of the admin API.
    #[arg(long, default_value = "/_devel")]
    prefix: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show live diagnostic settings and counters
    Status,
    /// List the most recent diagnostic reports
    Reports {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
    }

    let prefix = cli.prefix.trim_end_matches('/');
    let endpoint = match &cli.command {
        Commands::Status => cli.url.join(&format!("{}/status", prefix))?,
        Commands::Reports { limit } => {
            let mut url = cli.url.join(&format!("{}/reports", prefix))?;
            url.query_pairs_mut().append_pair("limit", &limit.to_string());
            url
        }
    };

    let res = client.get(endpoint).headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
