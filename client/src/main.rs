//! Docket CLI - prints the request a query would send.
//!
//! Usage: `docket <find|first|count> <ClassName> [limit]`

use docket_client::{Client, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docket_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::info!("Building requests for {}", config.server_url);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, class_name) = match args.as_slice() {
        [command, class_name, ..] => (command.as_str(), class_name.as_str()),
        _ => return Err("usage: docket <find|first|count> <ClassName> [limit]".into()),
    };

    let client = Client::new(config);
    let mut query = client.query(class_name);
    if let Some(limit) = args.get(2) {
        query = query.limit(limit.parse()?);
    }

    let request = match command {
        "find" => client.find(&query)?,
        "first" => client.first(&query)?,
        "count" => client.count(&query)?,
        other => return Err(format!("unknown command: {other}").into()),
    };

    println!("{} {}", request.method, client.url(&request));
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}
