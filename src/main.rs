use anyhow::Result;
use chatapi::commands::{self, services};
use clap::Parser;

/// chatapi - command-line client for a chat-completion relay
///
/// Sends messages to the relay's chat endpoint and prints the replies.
///
/// The credential is read from --api-key or the CHATAPI_KEY environment variable.
/// The relay address comes from --base-url, CHATAPI_BASE_URL, or defaults to
/// http://localhost:8787 (http://localhost:5173/api when CHATAPI_ENV=development).
///
/// Examples:
///   chatapi send "Hello there"     # One message, one reply
///   chatapi chat                   # Interactive conversation
///   chatapi diagnose               # Check the relay setup
#[derive(Parser, Debug)]
#[command(author, version = env!("CHATAPI_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Relay base URL (also via CHATAPI_BASE_URL)
    #[arg(long = "base-url", value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// Per-attempt request timeout in milliseconds (default 30000)
    #[arg(long = "timeout-ms", value_name = "MS", global = true)]
    pub timeout_ms: Option<u64>,

    /// Retries after a failed attempt (default 3)
    #[arg(long = "retries", value_name = "N", global = true)]
    pub retries: Option<u32>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Send one message and print the reply
    Send(SendArgs),

    /// Start an interactive conversation
    Chat(ChatArgs),

    /// Check whether the relay is reachable
    Ping,

    /// Print the relay's status document
    Status,

    /// Diagnose the connection to the relay
    Diagnose,
}

#[derive(clap::Args, Debug)]
pub struct ModelArgs {
    /// API key (also via CHATAPI_KEY)
    #[arg(long = "api-key", value_name = "KEY")]
    pub api_key: Option<String>,

    /// Model name (default gpt-3.5-turbo)
    #[arg(long, short = 'm')]
    pub model: Option<String>,

    /// Sampling temperature (default 0.7)
    #[arg(long, short = 't')]
    pub temperature: Option<f32>,

    /// Maximum tokens in the reply (default 1000)
    #[arg(long = "max-tokens")]
    pub max_tokens: Option<u32>,
}

#[derive(clap::Args, Debug)]
pub struct SendArgs {
    /// The message to send
    #[arg(value_name = "MESSAGE")]
    pub message: String,

    /// Print token usage after the reply
    #[arg(long)]
    pub usage: bool,

    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(clap::Args, Debug)]
pub struct ChatArgs {
    #[command(flatten)]
    pub model: ModelArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = chatapi::runtime::RealRuntime;

    let overrides = services::ClientOverrides {
        base_url: cli.base_url,
        timeout_ms: cli.timeout_ms,
        max_retries: cli.retries,
    };
    let client = services::build_client(&runtime, &overrides)?;

    match cli.command {
        Commands::Send(args) => {
            let credential = services::resolve_credential(&runtime, args.model.api_key);
            let options = services::build_options(
                args.model.model,
                args.model.temperature,
                args.model.max_tokens,
            );
            commands::send(&client, &credential, &args.message, &options, args.usage).await?
        }
        Commands::Chat(args) => {
            let credential = services::resolve_credential(&runtime, args.model.api_key);
            let options = services::build_options(
                args.model.model,
                args.model.temperature,
                args.model.max_tokens,
            );
            let mut stdout = std::io::stdout();
            let input = std::sync::Arc::new(chatapi::runtime::RealRuntime);
            commands::chat(input, &client, &credential, &options, &mut stdout).await?;
        }
        Commands::Ping => commands::ping(&client).await?,
        Commands::Status => commands::status(&client).await?,
        Commands::Diagnose => commands::diagnose(&client).await?,
    }
    Ok(())
}
