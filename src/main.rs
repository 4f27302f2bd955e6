//! Interviewer - adaptive mock-interview server
//!
//! # Usage
//!
//! ```bash
//! # Serve on the default port with the OpenAI key from the environment
//! OPENAI_API_KEY=sk-... ./target/debug/interviewer
//!
//! # OpenRouter, custom questions, any free port
//! ./target/debug/interviewer -p openrouter -m openai/gpt-4o-mini \
//!     --questions bank.toml --port 0
//! ```

use anyhow::Result;

use interviewer_lib::cli::{initialize, load_args};
use interviewer_lib::server::start_server;

#[tokio::main]
async fn main() -> Result<()> {
    let (args, dotenv_error) = load_args();

    let ctx = initialize(&args, dotenv_error).await?;
    if args.verbose {
        eprintln!("[cli] Settings loaded from {}", ctx.settings_path.display());
    }
    tracing::info!("Scoring with {}", ctx.oracle.description());

    let server = start_server(&ctx.config, ctx.bank, ctx.oracle).await?;
    println!("Interview server running at http://{}", server.addr);

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    // Open interviews are cancelled through child tokens
    server.shutdown().await;
    Ok(())
}
