//! tictactoe_lab - command-line front end.

#![warn(missing_docs)]

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tictactoe_lab::cli::{Cli, Command};
use tictactoe_lab::console::{self, PlayInput};
use tictactoe_lab::{
    model_availability_channel, GameMode, HttpBackend, LabConfig, Providers, SessionCommand,
    SessionController, SessionEvent, TrainingCommand, TrainingError, TrainingEvent,
    TrainingJobClient, TrainingParams, TrainingService,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tictactoe_lab=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = LabConfig::load(&cli.config)?;
    if let Some(url) = cli.server_url {
        config = config.with_server_url(url);
    }
    info!(server_url = %config.server_url(), "Starting tictactoe_lab");

    match cli.command {
        Command::Play { mode } => run_play(config, mode).await,
        Command::Train {
            generations,
            games,
            population,
        } => {
            let defaults = TrainingParams::from(*config.training());
            let params = TrainingParams::new(
                generations.unwrap_or(defaults.generations),
                games.unwrap_or(defaults.games),
                population.unwrap_or(defaults.population_size),
            );
            run_train(config, params).await
        }
        Command::ModelStatus => run_model_status(config).await,
    }
}

/// Plays one game session on stdin/stdout.
#[instrument(skip(config))]
async fn run_play(config: LabConfig, mode: GameMode) -> Result<()> {
    let backend = Arc::new(HttpBackend::new(config)?);
    let (writer, reader) = model_availability_channel();

    if mode == GameMode::Neural {
        match writer.refresh(backend.as_ref()).await {
            Ok((availability, _)) => println!("{}", console::render_model(&availability)),
            Err(e) => warn!(error = %e, "Could not check model status"),
        }
    }

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let (commands, commands_rx) = mpsc::unbounded_channel();
    let providers = Providers::new(backend, reader.clone());
    let controller = SessionController::new(providers, reader, events_tx);
    let session = tokio::spawn(controller.run(commands_rx));
    commands.send(SessionCommand::Start(mode))?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let command = match console::parse_play_input(&line) {
                    Some(PlayInput::Move(position)) => Some(SessionCommand::HumanMove(position)),
                    Some(PlayInput::Reset) => Some(SessionCommand::Reset),
                    Some(PlayInput::Quit) => break,
                    None => {
                        println!("Enter `row col` (0-2 each), `reset` or `quit`.");
                        None
                    }
                };
                if let Some(command) = command {
                    commands.send(command)?;
                }
            }
            Some(event) = events_rx.recv() => print_session_event(event),
        }
    }

    drop(commands);
    session.await?;
    info!("Leaving game");
    Ok(())
}

fn print_session_event(event: SessionEvent) {
    match event {
        SessionEvent::Changed { session, state } => {
            println!("\n{}", console::render_session(session.as_ref(), state));
        }
        SessionEvent::Error(e) => println!("Error: {}", e),
    }
}

/// Submits a training job and prints its progress until it finishes.
#[instrument(skip(config))]
async fn run_train(config: LabConfig, params: TrainingParams) -> Result<()> {
    let retry_delay = config.reconnect_delay();
    let backend: Arc<dyn TrainingService> = Arc::new(HttpBackend::new(config)?);
    let (writer, reader) = model_availability_channel();
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let (commands, commands_rx) = mpsc::unbounded_channel();
    let client = TrainingJobClient::new(backend, writer, retry_delay, events_tx);
    let training = tokio::spawn(client.run(commands_rx));
    commands.send(TrainingCommand::Submit(params))?;

    let mut printed_log = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("Cancelling...");
                commands.send(TrainingCommand::Cancel)?;
            }
            event = events_rx.recv() => {
                let Some(event) = event else {
                    break;
                };
                if print_training_event(event, &mut printed_log) {
                    break;
                }
            }
        }
    }

    drop(commands);
    training.await?;
    while let Ok(event) = events_rx.try_recv() {
        print_training_event(event, &mut printed_log);
    }
    println!("{}", console::render_model(&reader.current()));
    Ok(())
}

/// Prints one training event. Returns `true` once the job is over.
fn print_training_event(event: TrainingEvent, printed_log: &mut usize) -> bool {
    match event {
        TrainingEvent::Changed(job) => {
            if job.log().len() < *printed_log {
                *printed_log = 0;
            }
            for entry in &job.log()[*printed_log..] {
                println!("{} {}", entry.at.format("%H:%M:%S"), entry.message);
            }
            *printed_log = job.log().len();
            println!("{}", console::render_training(&job));
            job.status().is_terminal()
        }
        TrainingEvent::Error(e) => {
            println!("Error: {}", e);
            matches!(
                e,
                TrainingError::InvalidParameters { .. } | TrainingError::AlreadyRunning { .. }
            )
        }
        TrainingEvent::ModelAvailabilityChanged(availability) => {
            println!("{}", console::render_model(&availability));
            false
        }
    }
}

/// Prints the model availability reported by the server.
#[instrument(skip(config))]
async fn run_model_status(config: LabConfig) -> Result<()> {
    let backend = HttpBackend::new(config)?;
    let availability = backend.model_status().await?;
    println!("{}", console::render_model(&availability));
    Ok(())
}
