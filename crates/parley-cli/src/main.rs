//! parley - line-oriented driver for the conversation session controller

mod commands;
mod config;
mod echo;

use clap::Parser;
use parley_api::AssistantEvent;
use parley_session::{SessionController, SessionEvent};
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::broadcast;

/// parley - talk to a conversation backend through the session controller
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model to use (default: auto)
    #[arg(short, long)]
    model: Option<String>,

    /// Send a single message, print the reply, and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Have the backend answer with one whole-object completion
    #[arg(long)]
    whole_object: bool,

    /// Start with the backend signed out
    #[arg(long)]
    signed_out: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

fn init_tracing(verbose: bool) {
    if verbose {
        tracing_subscriber::fmt()
            .with_env_filter("parley=debug,parley_session=debug,parley_api=debug")
            .with_writer(io::stderr)
            .init();
    } else if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let mut cfg = config::Config::load();
    if let Some(model) = args.model {
        cfg.model = Some(model);
    }
    let whole_object = args.whole_object || cfg.whole_object.unwrap_or(false);
    let signed_in = !args.signed_out && cfg.start_signed_in.unwrap_or(true);

    let auth = echo::ToggleAuth::new(signed_in);
    let service = Arc::new(echo::EchoService::new(auth.clone(), whole_object));
    let controller = SessionController::new(service, auth.clone(), cfg.session_config());

    let printer = tokio::spawn(print_events(controller.clone(), controller.subscribe()));
    controller.initialize().await;

    let result = match args.command {
        Some(command) => run_command(&controller, &command).await,
        None => run_interactive(&controller, &auth).await,
    };

    controller.shutdown();
    printer.abort();
    result
}

async fn run_command(controller: &SessionController, command: &str) -> anyhow::Result<()> {
    println!("parley> {}", command);
    println!();
    controller.send_conversation(command).await?;
    Ok(())
}

async fn run_interactive(
    controller: &SessionController,
    auth: &Arc<echo::ToggleAuth>,
) -> anyhow::Result<()> {
    if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        let snapshot = controller.snapshot();
        eprintln!(
            "parley (model: {}, {})",
            snapshot.state.selected_model,
            if snapshot.state.is_authenticated() {
                "signed in"
            } else {
                "signed out"
            }
        );
        eprintln!("Type /help for commands.");
        eprintln!();
    }

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // EOF
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let snapshot = controller.snapshot();
        let Some(result) = commands::execute_command(input, &snapshot) else {
            if let Err(e) = controller.send_conversation(input).await {
                eprintln!("Error: {}", e);
                if e.is_auth_required() && auth.sign_in_requested() {
                    eprintln!("Sign in with /login, then /retry.");
                }
            }
            continue;
        };

        match result {
            commands::CommandResult::NewConversation => {
                controller.create_new_conversation();
                println!("Started a new conversation.");
            }
            commands::CommandResult::LoadConversation(remote_id) => {
                match controller.load_conversation(&remote_id).await {
                    Ok(conversation) => {
                        println!("== {} ==", conversation.title);
                        for message in &conversation.messages {
                            println!("[{}] {}", message.role.as_str(), message.content);
                        }
                    }
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            commands::CommandResult::SelectModel(slug) => match controller.select_model(&slug) {
                Ok(()) => println!("Switched to: {}", slug),
                Err(e) => eprintln!("Error: {}", e),
            },
            commands::CommandResult::ToggleDebug => {
                let on = controller.toggle_debug();
                println!("Debug mode {}", if on { "on" } else { "off" });
            }
            commands::CommandResult::Retry => {
                if let Err(e) = controller.retry_send().await {
                    eprintln!("Error: {}", e);
                }
            }
            commands::CommandResult::Refresh => {
                controller.refresh_on_auth().await;
                let snapshot = controller.snapshot();
                println!(
                    "{} models, {} conversations",
                    snapshot.models.len(),
                    snapshot.history.len()
                );
            }
            commands::CommandResult::Login => {
                auth.set(true);
                controller.recheck_auth().await;
                println!("Signed in.");
            }
            commands::CommandResult::Logout => {
                auth.set(false);
                println!("Signed out. The session notices on its next call.");
            }
            commands::CommandResult::Message(msg) => {
                println!("{}", msg);
            }
            commands::CommandResult::Exit => {
                break;
            }
            commands::CommandResult::Unknown(cmd) => {
                println!("Unknown command: /{}", cmd);
                println!("Type /help for available commands.");
            }
        }
    }

    Ok(())
}

/// Print reply text as it streams in; raw events too in debug mode
async fn print_events(controller: SessionController, mut receiver: broadcast::Receiver<SessionEvent>) {
    loop {
        let event = match receiver.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Event printer lagged, skipped {} events", skipped);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        match event {
            SessionEvent::Assistant { event, .. } => {
                if controller.snapshot().state.debug {
                    match serde_json::to_string(&event) {
                        Ok(raw) => eprintln!("[event] {}", raw),
                        Err(_) => eprintln!("[event] {:?}", event),
                    }
                }
                match event {
                    AssistantEvent::Delta { text } => {
                        print!("{}", text);
                        let _ = io::stdout().flush();
                    }
                    AssistantEvent::Structured { text } => {
                        print!("\r{}", text);
                        let _ = io::stdout().flush();
                    }
                    AssistantEvent::Completed {
                        conversation: Some(_),
                    } => {
                        if let Some(reply) = controller.snapshot().active.last_message() {
                            print!("{}", reply.content);
                        }
                    }
                    _ => {}
                }
            }
            SessionEvent::SendFinished { .. } => {
                println!();
            }
            SessionEvent::AuthChanged { authenticated } => {
                tracing::debug!("Authenticated: {}", authenticated);
                if !authenticated {
                    eprintln!("[signed out]");
                }
            }
            SessionEvent::Error { message } => {
                tracing::debug!("Session error: {}", message);
            }
            _ => {}
        }
    }
}
