//! # mojo-chat
//!
//! Command-line chatbot that answers questions about the Mojo programming
//! language from a markdown file of previous team answers.
//!
//! ```text
//! mojo-chat --corpus mojo-team-answers.md --question "Who made Mojo?"
//! mojo-chat --corpus mojo-team-answers.md --offline
//! ```
//!
//! `OPENAI_API_KEY` (and optionally `OPENAI_BASE_URL`) configure the hosted
//! backends. A `.env` file in the working directory is read on start-up.

pub mod cli;
pub mod console;
pub mod session;
pub mod telemetry;

use std::sync::Arc;

pub use cli::Args;
pub use session::ChatSession;

/// Load the corpus, then answer one question or start the interactive loop.
pub async fn run(args: Args) -> anyhow::Result<()> {
    let session = ChatSession::from_args(&args).await?;

    match args.question.as_deref() {
        Some(question) => {
            let text = session.respond(question).await?;
            println!("{text}");
            Ok(())
        }
        None => console::run_console(Arc::new(session)).await,
    }
}
