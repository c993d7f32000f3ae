use clap::Parser;
use log::info;
use shared::{DEFAULT_SERVER_IP, DEFAULT_SERVER_PORT};
use std::path::PathBuf;
use supervisor::backend::NullVision;
use supervisor::config::SupervisorConfig;
use supervisor::kinematic::KinematicBackend;
use supervisor::launcher::Participants;
use supervisor::session::SessionManager;
use supervisor::supervisor::{prepare_registry, Supervisor, SupervisorSettings};

/// Referee for a simulated robot soccer match.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Match configuration file
    #[clap(short, long, default_value = "config.json")]
    config: PathBuf,
    /// Address to accept participants on
    #[clap(short = 'H', long, default_value = DEFAULT_SERVER_IP)]
    host: String,
    /// Port to accept participants on
    #[clap(short, long, default_value_t = DEFAULT_SERVER_PORT)]
    port: u16,
    /// Do not start the configured participant executables
    #[clap(long)]
    no_launch: bool,
    /// Directory the reporter's text is written to
    #[clap(long, default_value = "reports")]
    reports_dir: PathBuf,
    /// Run ticks back to back instead of in real time
    #[clap(long)]
    fast: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = if args.config.exists() {
        SupervisorConfig::load(&args.config)?
    } else {
        info!("No config at {}, using defaults", args.config.display());
        SupervisorConfig::default()
    };

    let launch = !args.no_launch;
    let registry = prepare_registry(&config, launch, &mut rand::thread_rng());
    let sessions = SessionManager::bind(&format!("{}:{}", args.host, args.port)).await?;

    let mut participants = if launch {
        Participants::launch_all(&config, &registry, &args.host, args.port)?
    } else {
        Participants::default()
    };

    let settings = SupervisorSettings {
        repeat: config.tool.repeat,
        reports_dir: args.reports_dir,
        realtime: !args.fast,
    };
    let mut supervisor = Supervisor::new(
        sessions,
        registry,
        config.match_rules(),
        KinematicBackend::new(),
        NullVision,
        settings,
    );

    tokio::select! {
        result = supervisor.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            supervisor.save_report()?;
        }
    }

    participants.shutdown().await;
    Ok(())
}
