use clap::{Parser, Subcommand};
use std::io::Write;
use std::os::unix::net::UnixStream;

#[derive(Parser, Debug)]
#[command(name = "mkctl", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Arm the marking menu overlay on the focused monitor
    Show,
    /// Dismiss the overlay and cancel any gesture in progress
    Hide,
    /// Re-read the configuration file
    Reload,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Show => send_command("show"),
        Commands::Hide => send_command("hide"),
        Commands::Reload => send_command("reload"),
    }
}

fn send_command(cmd: &str) -> anyhow::Result<()> {
    let mut stream = UnixStream::connect(mkctl::SOCKET_PATH).map_err(|e| {
        anyhow::anyhow!(
            "Failed to connect to mkmenu at {}: {}. Is mkmenu running?",
            mkctl::SOCKET_PATH,
            e
        )
    })?;

    writeln!(stream, "{}", cmd)?;
    log::debug!("sent '{}'", cmd);
    Ok(())
}
