use clap::Parser;
use mojo_chat::{Args, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Must run before parsing so `.env` values can feed `MOJO_CHAT_*` flags.
    let _ = dotenvy::dotenv();
    telemetry::init_logging();

    let args = Args::parse();
    mojo_chat::run(args).await
}
