//! NeuralFlow - pump specification lookup client
//!
//! Interactive terminal client for the NeuralFlow lookup service. Type a pump
//! model or a question about one; results are shown as they arrive and every
//! conversation is kept in local history.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod conversation;
mod core;
mod providers;
mod render;
mod storage;

use commands::{Command, HELP};
use config::Config;
use crate::core::{ChatEngine, ChatError, HistoryStore, Orchestrator};
use providers::BackendClient;
use render::TerminalSink;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "neuralflow=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load()?;
    let sink = Arc::new(TerminalSink::new());

    // History
    let backend = storage::open(config.storage, config.data_dir()).await?;
    let history = HistoryStore::new(backend, config.history_key.clone(), sink.clone())
        .with_max_entries(config.max_conversations);

    // Lookup service
    let api = Arc::new(BackendClient::new(config.api_url.clone(), config.request_timeout)?);
    let orchestrator = Orchestrator::new(api, sink.clone(), config.request_timeout)
        .with_reveal_delays(config.reveal_delay, config.fallback_reveal_delay);

    let engine = Arc::new(ChatEngine::new(orchestrator, history, sink.clone()));

    tracing::info!("🔎 Using lookup service at {}", config.api_url);
    engine.start().await?;
    println!("{}", HELP);

    let mut pending = JoinSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        while pending.try_join_next().is_some() {}

        match Command::parse(&line) {
            Command::Quit => break,
            Command::Help => println!("{}", HELP),
            Command::History => sink.print_history(),
            Command::New => report(engine.new_conversation().await),
            Command::Clear => report(engine.clear_history().await),
            Command::Search(term) => {
                report(engine.enter_search_mode());
                match term {
                    Some(term) => report(engine.search(&term).map(|_| ())),
                    None => println!("Search conversations..."),
                }
            }
            Command::Open(n) => match engine.conversation_at(n) {
                Ok(id) => report(engine.open_conversation(id).await),
                Err(e) => report::<()>(Err(e)),
            },
            Command::Delete(n) => match engine.conversation_at(n) {
                Ok(id) => report(engine.delete_conversation(id).await.map(|_| ())),
                Err(e) => report::<()>(Err(e)),
            },
            Command::Invalid(message) => println!("{}", message),
            Command::Input(text) => {
                // Runs in the background so a second submission can be refused
                let engine = engine.clone();
                pending.spawn(async move {
                    report(engine.handle_input(&text).await.map(|outcome| {
                        tracing::debug!("Input handled: {:?}", outcome);
                    }));
                });
            }
        }
    }

    while pending.join_next().await.is_some() {}
    engine.finish().await;

    tracing::info!("👋 Bye");
    Ok(())
}

fn report<T>(result: Result<T, ChatError>) {
    match result {
        Ok(_) => {}
        Err(ChatError::Busy) => println!("Still working on the previous request, please wait."),
        Err(ChatError::UnknownConversation(_) | ChatError::UnknownPosition(_)) => {
            println!("No such conversation.")
        }
        Err(e) => {
            tracing::warn!("{}", e);
            println!("Something went wrong: {}", e);
        }
    }
}
