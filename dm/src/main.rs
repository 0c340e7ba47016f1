//! AI Dungeon Master with persistent conversational memory.
//!
//! ```bash
//! GROQ_API_KEY=... cargo run -p dm -- --lightweight
//! cargo run -p dm --features semantic -- --semantic
//! ```

mod headless;
mod prompt;
mod session;

use dm_memory::MemoryConfig;
use llm::ChatClient;
use session::{Session, SessionConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let chat = match ChatClient::from_env() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Set the provider and API key in a .env file or the environment (see --help).");
            std::process::exit(1);
        }
    };

    let mut memory_config = MemoryConfig::from_env();
    if let Some(semantic) = headless::parse_mode_override(&args) {
        memory_config = memory_config.with_semantic_rag(semantic);
    }

    let game = Session::new(chat, memory_config, SessionConfig::from_env());
    headless::run_headless(game).await?;
    Ok(())
}

fn print_help() {
    println!("AI Dungeon Master");
    println!();
    println!("USAGE:");
    println!("    dm [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --semantic      Use embedding-based note recall");
    println!("    --lightweight   Use keyword-based note recall");
    println!("    -h, --help      Print this help");
    println!();
    println!("ENVIRONMENT:");
    println!("    PROVIDER            groq (default) or openai");
    println!("    GROQ_API_KEY        API key for Groq");
    println!("    OPENAI_API_KEY      API key for OpenAI");
    println!("    MODEL_NAME          Chat model name");
    println!("    MAX_TOKENS          Reply token limit");
    println!("    SHORT_WINDOW        Dialogue turns kept in the prompt");
    println!("    USE_SEMANTIC_RAG    1/true/yes to enable semantic recall");
    println!("    MAX_NOTES           Notes kept after compaction");
    println!("    DM_DATA_DIR         Directory for memory files");
    println!("    EMBEDDING_MODEL     Sentence embedding model");
    println!("    DM_KEYWORDS_FILE    JSON file overriding keyword tables");
    println!("    RUST_LOG            Log filter (default: warn)");
}
