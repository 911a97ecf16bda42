#![deny(warnings)]

//! Headless console for a territory match: admin commands, live status, and
//! a scripted demo on a manual clock.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use territory_core::clock::clock_label;
use territory_core::{base_status, normalize, GameConfig, Interaction, MatchState, Team};
use territory_runtime::{
    spawn_frame_loop, FeedEvent, GameClient, ManualClock, SystemClock, TimeSource,
};
use territory_store::{MemoryStore, SqliteStore, StateStore};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, PartialEq)]
enum Command {
    Reset(Option<u32>),
    Start(Option<u32>),
    Pause,
    Stop,
    Act {
        action: Interaction,
        base: String,
        team: Team,
    },
    Status,
    Watch(u64),
    Demo,
    Version,
}

#[derive(Debug, PartialEq)]
struct Args {
    db: Option<String>,
    config: Option<String>,
    command: Command,
}

const USAGE: &str = "usage: territory [--db URL] [--config FILE] \
<reset [min] | start [min] | pause | stop | hold|release|capture <base> <team> | status | watch [secs] | demo | --version>";

fn parse_minutes(arg: Option<String>) -> Result<Option<u32>> {
    match arg {
        None => Ok(None),
        Some(s) => match s.parse::<u32>() {
            Ok(m) if m > 0 => Ok(Some(m)),
            _ => bail!("invalid minutes: {s}"),
        },
    }
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Args> {
    let mut db = None;
    let mut config = None;
    let mut rest = Vec::new();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--db" => db = Some(it.next().ok_or_else(|| anyhow!("--db needs a url"))?),
            "--config" => config = Some(it.next().ok_or_else(|| anyhow!("--config needs a file"))?),
            "--version" | "-V" => rest.push("version".to_string()),
            _ => rest.push(arg),
        }
    }

    let mut words = rest.into_iter();
    let name = words.next().ok_or_else(|| anyhow!(USAGE))?;
    let command = match name.as_str() {
        "reset" => Command::Reset(parse_minutes(words.next())?),
        "start" => Command::Start(parse_minutes(words.next())?),
        "pause" => Command::Pause,
        "stop" => Command::Stop,
        "hold" | "release" | "capture" => {
            let action: Interaction = name.parse()?;
            let base = words.next().ok_or_else(|| anyhow!("{name} needs <base> <team>"))?;
            let team: Team = words
                .next()
                .ok_or_else(|| anyhow!("{name} needs <base> <team>"))?
                .parse()?;
            Command::Act { action, base, team }
        }
        "status" => Command::Status,
        "watch" => Command::Watch(match words.next() {
            Some(s) => s.parse().map_err(|_| anyhow!("invalid seconds: {s}"))?,
            None => 10,
        }),
        "demo" => Command::Demo,
        "version" => Command::Version,
        other => bail!("unknown command {other:?}\n{USAGE}"),
    };
    if let Some(extra) = words.next() {
        bail!("unexpected argument {extra:?}");
    }
    Ok(Args {
        db,
        config,
        command,
    })
}

fn load_config(path: Option<&str>) -> Result<GameConfig> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };
    let text = std::fs::read_to_string(path)?;
    Ok(GameConfig::from_yaml_str(&text)?)
}

fn render(state: &MatchState, now: i64, cfg: &GameConfig) -> String {
    let mut out = format!(
        "{:?} | {}",
        state.status,
        clock_label(state, now, cfg.default_duration_minutes)
    );
    for base in state.bases.values() {
        let pct = normalize(&base.scores);
        out.push_str(&format!(
            "\n  {:<8} {:<18} R{:>3}% G{:>3}% B{:>3}% Y{:>3}%",
            base.id,
            base_status(base).to_string(),
            pct.red,
            pct.green,
            pct.blue,
            pct.yellow
        ));
    }
    out
}

async fn sync<S: StateStore>(client: &GameClient<S>) {
    if let FeedEvent::Snapshot(state) = client.feed().latest() {
        client.rebase(state).await;
    }
}

async fn print_status<S: StateStore>(client: &GameClient<S>) {
    sync(client).await;
    let state = client.display().await;
    println!("{}", render(&state, client.now(), client.config()));
}

async fn run<S: StateStore + 'static>(client: GameClient<S>, command: Command) -> Result<()> {
    match command {
        Command::Reset(minutes) => {
            let minutes = minutes.unwrap_or(client.config().default_duration_minutes);
            client.reset_game(minutes).await;
        }
        Command::Start(minutes) => client.start_game(minutes).await,
        Command::Pause => client.pause_game().await,
        Command::Stop => client.stop_game().await,
        Command::Act { action, base, team } => {
            client.signal_interaction(&base, action, team).await
        }
        Command::Status => {}
        Command::Watch(secs) => {
            let frames = spawn_frame_loop(client.clone());
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            for _ in 0..secs.max(1) {
                ticker.tick().await;
                let state = frames.display.borrow().clone();
                println!("{}\n", render(&state, client.now(), client.config()));
            }
            frames.shutdown().await;
            return Ok(());
        }
        Command::Demo | Command::Version => return Ok(()),
    }
    print_status(&client).await;
    Ok(())
}

async fn demo(cfg: GameConfig) -> Result<()> {
    let clock = Arc::new(ManualClock::new(SystemClock.now_ms()));
    let time: Arc<dyn TimeSource> = clock.clone();
    let store = Arc::new(MemoryStore::new(MatchState::initial(cfg.base_ids.clone(), 0)));
    let first = cfg
        .base_ids
        .first()
        .cloned()
        .ok_or_else(|| anyhow!("no bases configured"))?;
    let second = cfg.base_ids.get(1).cloned().unwrap_or_else(|| first.clone());
    let client = GameClient::new(store, time, cfg);

    let step = |label: &str| println!("-- {label}");
    step("reset and start");
    client.reset_game(client.config().default_duration_minutes).await;
    client.start_game(None).await;
    print_status(&client).await;

    step("red holds for 2.5s");
    client.signal_interaction(&first, Interaction::Start, Team::Red).await;
    clock.advance(2_500);
    print_status(&client).await;

    step("green takes over for 2s");
    client.signal_interaction(&first, Interaction::Start, Team::Green).await;
    clock.advance(2_000);
    client.signal_interaction(&first, Interaction::Abort, Team::Green).await;
    print_status(&client).await;

    step("blue holds until full and captures");
    client.signal_interaction(&second, Interaction::Start, Team::Blue).await;
    clock.advance(10_000);
    client.signal_interaction(&second, Interaction::Capture, Team::Blue).await;
    print_status(&client).await;

    step("pause for a minute, resume, stop");
    client.pause_game().await;
    clock.advance(60_000);
    print_status(&client).await;
    client.start_game(None).await;
    clock.advance(1_000);
    client.stop_game().await;
    print_status(&client).await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = parse_args(std::env::args().skip(1))?;
    if args.command == Command::Version {
        println!(
            "territory {} ({} built {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_SHA"),
            env!("BUILD_DATE")
        );
        return Ok(());
    }
    let cfg = load_config(args.config.as_deref())?;
    info!(db = ?args.db, command = ?args.command, "starting CLI");

    if args.command == Command::Demo {
        return demo(cfg).await;
    }

    let time: Arc<dyn TimeSource> = Arc::new(SystemClock);
    let seed = MatchState::initial(cfg.base_ids.clone(), 0);
    match args.db {
        Some(url) => {
            let store = Arc::new(SqliteStore::connect(&url, &seed).await?);
            let (stop_tx, stop_rx) = watch::channel(false);
            let poller = store
                .clone()
                .spawn_poller(Duration::from_millis(cfg.poll_interval_ms), stop_rx);
            let client = GameClient::new(store, time, cfg);
            let result = run(client, args.command).await;
            let _ = stop_tx.send(true);
            if let Err(e) = poller.await {
                warn!(error = %e, "poller task failed");
            }
            result
        }
        None => {
            let store = Arc::new(MemoryStore::new(seed));
            run(GameClient::new(store, time, cfg), args.command).await
        }
    }
}
