//! Terminal chat against a running relay server.

use std::io::Write;
use std::time::Instant;

use anyhow::{bail, Result};
use clap::Parser;
use colored::Colorize;
use futures::StreamExt;
use relay_client::{
    ClientConfig, ConversationSession, DeltaPrinter, RelayClient, Segment, StreamEvent,
    StreamStatus, DEFAULT_SERVER_URL,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "relay-chat", version, about = "Chat with models behind a relay server")]
struct Cli {
    /// Relay server address
    #[arg(long, default_value = DEFAULT_SERVER_URL)]
    url: String,

    /// Print the model's reasoning before its answer
    #[arg(long)]
    show_reasoning: bool,

    /// Model to start with; prompts for one when omitted
    #[arg(short, long)]
    model: Option<String>,
}

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = RelayClient::new(ClientConfig::new(&cli.url))?;

    if !client.check_connection().await {
        bail!("cannot reach relay server at {}", cli.url);
    }

    println!("{}", "Relay chat".bold());
    println!("Commands: 'exit' quits, 'switch' changes model, 'reasoning' toggles reasoning output");

    let mut show_reasoning = cli.show_reasoning;
    if show_reasoning {
        println!("Reasoning output enabled");
    }

    let models = client.list_models().await.unwrap_or_else(|e| {
        tracing::warn!("Failed to list models: {}", e);
        Vec::new()
    });

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut model = match cli.model {
        Some(model) => model,
        None => match choose_model(&models, &mut input).await? {
            Some(model) => model,
            None => return Ok(()),
        },
    };
    println!("\nUsing model: {}\n", model.cyan());

    let mut session = ConversationSession::new();

    loop {
        prompt("You: ")?;
        let Some(line) = input.next_line().await? else {
            break;
        };
        let message = line.trim();
        if message.is_empty() {
            continue;
        }

        match message.to_lowercase().as_str() {
            "exit" => break,
            "reasoning" => {
                show_reasoning = !show_reasoning;
                let state = if show_reasoning { "enabled" } else { "disabled" };
                println!("Reasoning output {}", state);
                continue;
            }
            "switch" => {
                match choose_model(&models, &mut input).await? {
                    Some(next) => model = next,
                    None => break,
                }
                session.reset();
                println!("\nSwitched to model: {}\n", model.cyan());
                continue;
            }
            _ => {}
        }

        session.push_user(message);
        let started = Instant::now();

        if !stream_turn(&client, &model, &mut session, show_reasoning).await? {
            println!("{}", "Streaming failed, retrying without streaming...".yellow());
            match client.conversation(&model, &mut session, show_reasoning).await {
                Ok(reply) => {
                    if let Some(reasoning) = reply.reasoning.filter(|r| show_reasoning && !r.is_empty()) {
                        println!("{}\n{}\n\n-----------------\n", "Reasoning:".dimmed(), reasoning.dimmed());
                    }
                    println!("{} {}", "AI:".green().bold(), reply.response);
                }
                Err(e) => println!("{} {}", "Error:".red().bold(), e),
            }
        }

        println!("\n({:.2}s)\n", started.elapsed().as_secs_f64());
    }

    Ok(())
}

/// Run one streamed turn. Returns `false` when it failed before any
/// output, so the caller can fall back to a plain request.
async fn stream_turn(
    client: &RelayClient,
    model: &str,
    session: &mut ConversationSession,
    show_reasoning: bool,
) -> Result<bool> {
    let mut printer = DeltaPrinter::new(show_reasoning);
    let mut waiting_shown = false;
    let mut events = client.conversation_stream(model, session, show_reasoning);

    prompt("Requesting...")?;

    while let Some(event) = events.next().await {
        match event {
            StreamEvent::Status {
                status: StreamStatus::Connected,
                ..
            } => clear_line()?,
            StreamEvent::Status {
                status: StreamStatus::Waiting,
                ..
            } => {
                if !printer.has_output() && !waiting_shown {
                    prompt("\rWaiting for the model...")?;
                    waiting_shown = true;
                }
            }
            StreamEvent::Status {
                status: StreamStatus::Completed,
                ..
            } => break,
            StreamEvent::Error { error } => {
                if !printer.has_output() {
                    clear_line()?;
                    tracing::warn!("Stream failed: {}", error);
                    println!("{} {}", "Error:".red().bold(), error);
                    return Ok(false);
                }
                println!("\n\n{} {}", "Error:".red().bold(), error);
                return Ok(true);
            }
            StreamEvent::Delta(delta) => {
                if !printer.has_output() {
                    clear_line()?;
                }
                for segment in printer.update(&delta) {
                    print_segment(segment)?;
                }
            }
        }
    }

    Ok(true)
}

fn print_segment(segment: Segment) -> Result<()> {
    match segment {
        Segment::ReasoningStart => println!("{}", "Reasoning:".dimmed()),
        Segment::Reasoning(text) => prompt(&text.dimmed().to_string())?,
        Segment::ResponseStart { after_reasoning } => {
            if after_reasoning {
                println!("\n\n-----------------\n");
            }
            prompt(&format!("{} ", "AI:".green().bold()))?;
        }
        Segment::Response(text) => prompt(&text)?,
    }
    Ok(())
}

/// Ask for a model by list number or name. `None` on end of input.
async fn choose_model(models: &[String], input: &mut Input) -> Result<Option<String>> {
    if models.is_empty() {
        println!("{}", "No models reported by the server".yellow());
        prompt("Model name: ")?;
        return Ok(input.next_line().await?.map(|line| line.trim().to_string()));
    }

    println!("\nAvailable models:");
    for (i, model) in models.iter().enumerate() {
        println!("{}. {}", i + 1, model);
    }
    println!();

    loop {
        prompt("Choose a model by number or name: ")?;
        let Some(line) = input.next_line().await? else {
            return Ok(None);
        };
        let choice = line.trim();

        if let Ok(index) = choice.parse::<usize>() {
            if (1..=models.len()).contains(&index) {
                return Ok(Some(models[index - 1].clone()));
            }
        } else if models.iter().any(|m| m == choice) {
            return Ok(Some(choice.to_string()));
        }
        println!("Invalid choice, try again");
    }
}

fn prompt(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{}", text)?;
    stdout.flush()?;
    Ok(())
}

fn clear_line() -> Result<()> {
    prompt(&format!("\r{}\r", " ".repeat(30)))
}
