use chat_relay::cli::ClientArgs;
use chat_relay::client::keys::{ key_action, Key, KeyAction, Modifiers };
use chat_relay::client::notify::ConsoleNotifier;
use chat_relay::client::storage::FileStorage;
use chat_relay::client::transport::HttpTransport;
use chat_relay::client::{ ConversationController, Speaker, SubmitOutcome, Turn, TurnStatus };
use clap::Parser;
use dotenv::dotenv;
use log::info;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{ AsyncBufReadExt, BufReader };

fn print_turn(turn: &Turn) {
    let label = match turn.speaker {
        Speaker::User => "you",
        Speaker::Assistant => "assistant",
    };
    let marker = if turn.status == TurnStatus::Failed { " (not delivered)" } else { "" };
    println!("{}{}> {}", label, marker, turn.text);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = ClientArgs::parse();

    let timeout = Some(args.request_timeout_secs)
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs);
    let transport = Arc::new(HttpTransport::new(&args.relay_url, timeout)?);
    let storage = Arc::new(FileStorage::open(&args.storage_path)?);
    let controller = ConversationController::new(transport, storage, Arc::new(ConsoleNotifier));
    info!("Relay: {}, storage: {}", args.relay_url, args.storage_path);

    controller.restore();
    for turn in controller.transcript() {
        print_turn(&turn);
    }
    println!("Type a message and press Enter. End a line with '\\' to continue it, /reset clears history, /quit exits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut buffer = String::new();
    while let Some(line) = lines.next_line().await? {
        match line.as_str() {
            "/quit" if buffer.is_empty() => break,
            "/reset" if buffer.is_empty() => {
                controller.reset();
                println!("History cleared.");
                continue;
            }
            _ => {}
        }

        let (text, modifiers) = match line.strip_suffix('\\') {
            Some(head) => (head, Modifiers { shift: true, ..Modifiers::default() }),
            None => (line.as_str(), Modifiers::default()),
        };
        buffer.push_str(text);

        match key_action(Key::Enter, modifiers, controller.is_submitting()) {
            KeyAction::InsertNewline => buffer.push('\n'),
            KeyAction::Submit => {
                let message = std::mem::take(&mut buffer);
                if controller.submit(&message).await == SubmitOutcome::Replied {
                    if let Some(reply) = controller.transcript().last() {
                        print_turn(reply);
                    }
                }
            }
            KeyAction::Passthrough => {}
        }
    }

    Ok(())
}
