use clap::Parser;
use quotetrace::search::{
    self, CseClient, HttpPageValidator, SearchError, TranscriptClient,
};
use tracing::{info, warn};

/// Run the search half of the attribution pipeline: take a ready query,
/// fan it out over the configured backends and print validated candidates.
#[derive(Parser, Debug)]
#[command(name = "quotetrace", version, about)]
struct Args {
    /// Search query (already assembled, e.g. "Donald Trump November 29, 2024 Venezuela")
    query: String,

    /// Treat the query as special context and try the transcript archive first
    #[arg(long)]
    focused: bool,

    /// Maximum number of candidates to collect
    #[arg(long, default_value_t = 6)]
    max_results: usize,

    /// Emit candidates as JSON instead of plain lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quotetrace=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let http = reqwest::Client::new();
    let focused_backend = TranscriptClient::new(http.clone());
    let general_backend = match CseClient::from_env(http.clone()) {
        Ok(client) => Some(client),
        Err(SearchError::CredentialsNotSet) => {
            warn!("GOOGLE_API_KEY / GOOGLE_CSE_CX not set, general search disabled");
            None
        }
        Err(e) => return Err(e.into()),
    };
    let validator = HttpPageValidator::new(http);

    let candidates = search::search(
        Some(&focused_backend),
        general_backend.as_ref(),
        &validator,
        &args.query,
        args.focused,
        true,
        args.max_results,
    )
    .await;

    info!(count = candidates.len(), "search finished");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&candidates)?);
    } else if candidates.is_empty() {
        println!("no candidates found");
    } else {
        for c in &candidates {
            println!("[{}] {}", c.domain, c.url);
            if !c.title.is_empty() {
                println!("    {}", c.title);
            }
            if !c.snippet.is_empty() {
                println!("    {}", c.snippet);
            }
        }
    }
    Ok(())
}
