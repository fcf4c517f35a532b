use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "isp-cli")]
#[command(about = "Management CLI for the isp-ops service", long_about = None)]
struct Cli {
    #[arg(short, long, env = "ISP_OPS_URL", default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, env = "ISP_OPS_API_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service liveness
    Health,
    /// Manage webhook registrations
    #[command(subcommand)]
    Webhooks(WebhookCommands),
    /// Show the delivery log of a webhook
    Deliveries {
        id: String,
        #[arg(long)]
        skip: Option<usize>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Dispatch an event to its subscribers
    Emit {
        event: String,
        /// Event data as a JSON document
        #[arg(default_value = "{}")]
        data: String,
    },
    /// Inspect or reset circuit breakers
    #[command(subcommand)]
    Circuits(CircuitCommands),
}

#[derive(Subcommand)]
enum WebhookCommands {
    /// List registered webhooks
    List {
        #[arg(long)]
        skip: Option<usize>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Show one webhook
    Get { id: String },
    /// Register a webhook
    Create {
        url: String,
        /// Events to subscribe to (`*` for all)
        #[arg(short, long = "event", required = true)]
        events: Vec<String>,
        #[arg(long)]
        secret: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a webhook and its delivery log
    Delete { id: String },
    /// Send a webhook.test delivery
    Test { id: String },
}

#[derive(Subcommand)]
enum CircuitCommands {
    /// List known circuits
    List,
    /// Show the circuit guarding a path
    Status { path: String },
    /// Force a circuit closed
    Reset { path: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", key))?,
        );
    }
    let api = format!("{}/api/v1", cli.url.trim_end_matches('/'));

    let request = match cli.command {
        Commands::Health => client.get(format!("{}/health", cli.url.trim_end_matches('/'))),
        Commands::Webhooks(WebhookCommands::List { skip, limit, active }) => {
            let mut query: Vec<(&str, String)> = Vec::new();
            if let Some(skip) = skip {
                query.push(("skip", skip.to_string()));
            }
            if let Some(limit) = limit {
                query.push(("limit", limit.to_string()));
            }
            if let Some(active) = active {
                query.push(("active", active.to_string()));
            }
            client.get(format!("{}/webhooks", api)).query(&query)
        }
        Commands::Webhooks(WebhookCommands::Get { id }) => {
            client.get(format!("{}/webhooks/{}", api, id))
        }
        Commands::Webhooks(WebhookCommands::Create {
            url,
            events,
            secret,
            description,
        }) => client.post(format!("{}/webhooks", api)).json(&json!({
            "url": url,
            "events": events,
            "secret": secret,
            "description": description,
        })),
        Commands::Webhooks(WebhookCommands::Delete { id }) => {
            client.delete(format!("{}/webhooks/{}", api, id))
        }
        Commands::Webhooks(WebhookCommands::Test { id }) => {
            client.post(format!("{}/webhooks/{}/test", api, id))
        }
        Commands::Deliveries { id, skip, limit } => {
            let mut query: Vec<(&str, usize)> = Vec::new();
            if let Some(skip) = skip {
                query.push(("skip", skip));
            }
            if let Some(limit) = limit {
                query.push(("limit", limit));
            }
            client
                .get(format!("{}/webhooks/{}/deliveries", api, id))
                .query(&query)
        }
        Commands::Emit { event, data } => {
            let data: Value = serde_json::from_str(&data)?;
            client
                .post(format!("{}/events", api))
                .json(&json!({ "event": event, "data": data }))
        }
        Commands::Circuits(CircuitCommands::List) => client.get(format!("{}/circuits", api)),
        Commands::Circuits(CircuitCommands::Status { path }) => client
            .get(format!("{}/circuits/status", api))
            .query(&[("path", path)]),
        Commands::Circuits(CircuitCommands::Reset { path }) => client
            .post(format!("{}/circuits/reset", api))
            .json(&json!({ "path": path })),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let text = res.text().await?;
    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }
    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
