//! Nuggets Game Server
//!
//! Loads a map, scatters the gold and serves one session over UDP until
//! every nugget has been collected.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use nuggets::{
    VERSION,
    config::GameConfig,
    core::rng::SessionRng,
    game::{map::GameMap, state::Session},
    network::server::{GameOutcome, GameServer, ServerConfig},
};

const EXIT_INTERRUPTED: u8 = 1;
const EXIT_BAD_MAP: u8 = 2;
const EXIT_BAD_SEED: u8 = 3;
const EXIT_BAD_CONFIG: u8 = 4;

#[derive(Parser)]
#[command(name = "nugget-server")]
#[command(about = "Nuggets game server", version)]
struct Args {
    /// Map file to play on
    map: PathBuf,

    /// Random seed (non-negative integer); defaults to the clock
    seed: Option<String>,

    /// JSON file overriding the game configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind; port 0 picks a free port
    #[arg(short, long, default_value = "0.0.0.0:0")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr; stdout only carries the port announcement
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    info!("Nugget Server v{}", VERSION);

    let map = match load_map(&args.map) {
        Ok(map) => map,
        Err(e) => return fail(EXIT_BAD_MAP, e),
    };
    let rng = match parse_seed(args.seed.as_deref()) {
        Ok(rng) => rng,
        Err(e) => return fail(EXIT_BAD_SEED, e),
    };
    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => return fail(EXIT_BAD_CONFIG, e),
    };

    let mut session = match Session::initialize(map, config, rng) {
        Ok(session) => session,
        Err(e) => return fail(EXIT_BAD_CONFIG, e.into()),
    };

    match serve(&mut session, args.bind).await {
        Ok(GameOutcome::Completed) => ExitCode::SUCCESS,
        Ok(GameOutcome::Interrupted) => ExitCode::from(EXIT_INTERRUPTED),
        Err(e) => {
            session.teardown();
            fail(EXIT_INTERRUPTED, e)
        }
    }
}

async fn serve(session: &mut Session, bind_addr: SocketAddr) -> Result<GameOutcome> {
    let server = GameServer::bind(ServerConfig { bind_addr, ..Default::default() }).await?;
    let port = server.local_addr()?.port();
    println!("ready at port {port}");

    Ok(server.run(session).await?)
}

fn load_map(path: &Path) -> Result<GameMap> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read map {}", path.display()))?;
    GameMap::parse(&text).with_context(|| format!("bad map {}", path.display()))
}

fn parse_seed(seed: Option<&str>) -> Result<SessionRng> {
    match seed {
        Some(text) => {
            let seed: u64 = text
                .parse()
                .with_context(|| format!("seed must be a non-negative integer, got {text:?}"))?;
            info!(seed, "Seeded RNG");
            Ok(SessionRng::new(seed))
        }
        None => Ok(SessionRng::from_clock()),
    }
}

fn load_config(path: Option<&Path>) -> Result<GameConfig> {
    let config = match path {
        Some(path) => GameConfig::from_json_file(path)?,
        None => GameConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn fail(code: u8, e: anyhow::Error) -> ExitCode {
    error!("{e:#}");
    ExitCode::from(code)
}
