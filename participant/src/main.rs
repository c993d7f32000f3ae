use clap::Parser;
use log::info;
use participant::network::Participant;
use participant::player::SkeletonPlayer;
use std::path::PathBuf;

/// Reference team client. The supervisor launches it with
/// `<server-ip> <port> <key> <datapath>`.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Supervisor address
    server_ip: String,

    /// Supervisor port
    port: u16,

    /// Key identifying this participant's role
    key: String,

    /// Directory for the participant's own data
    datapath: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let addr = format!("{}:{}", args.server_ip, args.port);

    info!("Starting participant, data in {}", args.datapath.display());
    let mut participant = Participant::connect(&addr, &args.key, SkeletonPlayer::new()).await?;
    let summary = participant.run().await?;

    info!(
        "Match over after {} frames, score {}-{}",
        summary.frames, summary.score[0], summary.score[1]
    );
    Ok(())
}
