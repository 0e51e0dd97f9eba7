use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "wabiz-cli")]
#[command(about = "Client for the mock WhatsApp Business API", long_about = None)]
struct Cli {
    #[arg(short, long, env = "WABIZ_URL", default_value = "http://localhost:8080")]
    url: String,

    /// Caller API key, sent as `Authorization: Bearer`.
    #[arg(long, env = "WABIZ_API_KEY", default_value = "CHANGE_ME_API_KEY")]
    api_key: String,

    /// Admin key, sent as `Authorization: Apikey`.
    #[arg(long, env = "WABIZ_ADMIN_KEY", default_value = "CHANGE_ME_ADMIN_KEY")]
    admin_key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a text message
    Send {
        #[arg(long)]
        to: String,
        #[arg(long)]
        text: String,
        #[arg(long, default_value = "106540352242922")]
        phone_number_id: String,
    },
    /// Show application settings
    Settings,
    /// Replace the webhook URL (empty string disables deliveries)
    SetWebhook { url: String },
    /// Check server health
    Health,
}

fn auth_headers(scheme: &str, key: &str) -> Result<HeaderMap, Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("{} {}", scheme, key))?,
    );
    Ok(headers)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Send {
            to,
            text,
            phone_number_id,
        } => {
            let body = json!({
                "messaging_product": "whatsapp",
                "to": to,
                "type": "text",
                "text": { "body": text },
            });
            let res = client
                .post(format!("{}/v1/{}/messages", cli.url, phone_number_id))
                .headers(auth_headers("Bearer", &cli.api_key)?)
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Settings => {
            let res = client
                .get(format!("{}/v1/settings/application", cli.url))
                .headers(auth_headers("Apikey", &cli.admin_key)?)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::SetWebhook { url } => {
            let res = client
                .patch(format!("{}/v1/settings/application", cli.url))
                .headers(auth_headers("Apikey", &cli.admin_key)?)
                .json(&json!({ "webhooks": { "url": url } }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let request_id = res
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Some(id) = request_id {
            eprintln!("Request ID: {}", id);
        }
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
