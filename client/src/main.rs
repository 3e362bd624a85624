//! Command line entry point of the schedule client
//!
//! Reads entity records from a JSON file, submits generation jobs and
//! follows them on the event channel.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::signal;

use client::core::PayloadPipeline;
use client::{
    ClientConfig, JobNotice, ScheduleApi, ScheduleData, ScheduleSession, Selection, SelectionSet, StartOutcome,
    StopOutcome,
};
use shared::{component_info, logging, ComponentId};

#[derive(Parser, Debug)]
#[command(name = "schedule-client")]
#[command(about = "Submit and follow timetable generation jobs")]
struct Cli {
    /// REST base URL (overrides SCHEDULE_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Event channel URL (overrides SCHEDULE_EVENTS_URL)
    #[arg(long, global = true)]
    events_url: Option<String>,

    /// Login page URL (overrides SCHEDULE_LOGIN_URL)
    #[arg(long, global = true)]
    login_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the generation payload and print it without submitting
    Payload(InputArgs),
    /// Submit a job and follow it until it finishes; Ctrl+C stops it
    Generate(InputArgs),
    /// Ask the server to stop the running job
    Stop,
    /// List the files the server currently offers
    Results {
        /// Seconds to wait for the results snapshot
        #[arg(long, default_value = "10")]
        wait: u64,
    },
    /// Download a result file
    Download {
        name: String,
        /// Output path, defaults to the file name
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Seconds to wait for the results snapshot
        #[arg(long, default_value = "10")]
        wait: u64,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// JSON file with programs, rooms, lecturers, classes, semesters, subjects and time_slots
    #[arg(long, short)]
    input: PathBuf,

    /// Program ids to include (all when omitted)
    #[arg(long, value_delimiter = ',')]
    programs: Option<Vec<String>>,

    /// Room ids to include (all when omitted)
    #[arg(long, value_delimiter = ',')]
    rooms: Option<Vec<String>>,

    /// Lecturer ids to include (all when omitted)
    #[arg(long, value_delimiter = ',')]
    lecturers: Option<Vec<String>>,

    /// Class ids to include (all when omitted)
    #[arg(long, value_delimiter = ',')]
    classes: Option<Vec<String>>,
}

impl InputArgs {
    fn selection(&self) -> SelectionSet {
        fn to_selection(ids: &Option<Vec<String>>) -> Selection {
            match ids {
                Some(ids) => Selection::only(ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty())),
                None => Selection::All,
            }
        }

        SelectionSet {
            programs: to_selection(&self.programs),
            rooms: to_selection(&self.rooms),
            lecturers: to_selection(&self.lecturers),
            classes: to_selection(&self.classes),
        }
    }

    async fn load(&self) -> Result<ScheduleData> {
        ScheduleData::from_file(&self.input)
            .await
            .with_context(|| format!("Failed to load schedule data from {}", self.input.display()))
    }
}

fn build_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url)?;
    }
    if let Some(url) = &cli.events_url {
        config = config.with_events_url(url)?;
    }
    if let Some(url) = &cli.login_url {
        config = config.with_login_url(url)?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing_with_level(Some(&cli.log_level));

    let config = build_config(&cli)?;
    logging::log_startup(&ComponentId::Cli, &format!("schedule client against {}", config.api_url));

    let result = match &cli.command {
        Command::Payload(input) => print_payload(&config, input).await,
        Command::Generate(input) => generate(&config, input).await,
        Command::Stop => stop(&config).await,
        Command::Results { wait } => results(&config, Duration::from_secs(*wait)).await,
        Command::Download { name, output, wait } => {
            download(&config, name, output.as_deref(), Duration::from_secs(*wait)).await
        }
    };

    match &result {
        Ok(()) => logging::log_success(&ComponentId::Cli, "Command finished"),
        Err(e) => logging::log_error(&ComponentId::Cli, "Command", e),
    }
    result
}

async fn print_payload(config: &ClientConfig, input: &InputArgs) -> Result<()> {
    let data = input.load().await?;
    let payload = PayloadPipeline::new(config.pipeline.clone()).build(&data, &input.selection())?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

async fn generate(config: &ClientConfig, input: &InputArgs) -> Result<()> {
    let data = input.load().await?;
    let session = ScheduleSession::connect(config)?;
    let _subscription = session.attach();

    let mut notices = session.orchestrator().subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(notice) = notices.recv().await {
            print_notice(&notice);
        }
    });

    let outcome = session.orchestrator().generate(&data, &input.selection()).await;
    if let Some(url) = session.navigator().last_redirect() {
        eprintln!("Sign in again at {url}");
    }
    if outcome? == StartOutcome::Aborted {
        printer.abort();
        println!("Generation aborted by the server");
        return Ok(());
    }

    let finished = session.wait_until_finished();
    tokio::pin!(finished);
    let interrupted = tokio::select! {
        stage = &mut finished => Some(stage),
        _ = signal::ctrl_c() => None,
    };
    let stage = match interrupted {
        Some(stage) => stage,
        None => {
            logging::log_shutdown(&ComponentId::Cli, "Received Ctrl+C signal, stopping job");
            let outcome = session.orchestrator().stop().await?;
            component_info!(ComponentId::Cli, "🛑 Stop: {:?}", outcome);
            if outcome == StopOutcome::NotRunning {
                printer.abort();
                return Ok(());
            }
            finished.await
        }
    };
    printer.abort();

    let stage = stage?;
    let snapshot = session.orchestrator().snapshot().await;
    println!("Finished in {stage}");
    for file in &snapshot.downloadable_files {
        println!("  {} ({:?})", file.name, file.kind);
    }
    Ok(())
}

async fn stop(config: &ClientConfig) -> Result<()> {
    let session = ScheduleSession::connect(config)?;
    session.api().stop_generation().await?;
    println!("Stop requested");
    Ok(())
}

/// Attach and wait for the `ga_results` answer to `get_results`
async fn synced_session(config: &ClientConfig, wait: Duration) -> Result<(ScheduleSession, client::Subscription)> {
    let session = ScheduleSession::connect(config)?;
    let mut notices = session.orchestrator().subscribe();
    let subscription = session.attach();

    let synced = tokio::time::timeout(wait, async {
        loop {
            match notices.recv().await {
                Ok(JobNotice::ResultsSynced { .. }) => return true,
                Ok(_) => {}
                Err(_) => return false,
            }
        }
    })
    .await;
    if !matches!(synced, Ok(true)) {
        bail!("No results snapshot received within {:?}", wait);
    }
    Ok((session, subscription))
}

async fn results(config: &ClientConfig, wait: Duration) -> Result<()> {
    let (session, _subscription) = synced_session(config, wait).await?;
    let snapshot = session.orchestrator().snapshot().await;
    if snapshot.downloadable_files.is_empty() {
        println!("No result files available");
    }
    for file in snapshot.downloadable_files {
        let semester = file.semester.as_deref().unwrap_or("-");
        println!("{}\t{:?}\t{}\t{}", file.name, file.kind, semester, file.timestamp);
    }
    Ok(())
}

async fn download(config: &ClientConfig, name: &str, output: Option<&Path>, wait: Duration) -> Result<()> {
    let (session, _subscription) = synced_session(config, wait).await?;
    let (file, bytes) = session.orchestrator().download(name).await?;

    // Registry names are plain file names, so the default stays in the working directory
    let target = output.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(&file.name));
    tokio::fs::write(&target, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", target.display()))?;
    println!("Saved {} ({} bytes) to {}", file.name, bytes.len(), target.display());
    Ok(())
}

fn print_notice(notice: &JobNotice) {
    match notice {
        // Every stage already produces a StageChanged line
        JobNotice::VisibilityChanged { .. } => {}
        notice => println!("[{:?}] {}", notice.level(), notice),
    }
}
