//! Felling simulator
//!
//! Grows a tree in an in-memory world, probes it and fells it, printing what
//! a player would see.
//!
//! Usage:
//!     fell_sim [OPTIONS]
//!
//! Options:
//!     -c, --config <PATH>     JSON config file (default: built-in defaults)
//!     --height <N>            Trunk height (default: 12)
//!     --branches <N>          Diagonal branches off the crown, up to 4 (default: 4)
//!     --damage <N>            Tool damage before felling (default: 0)
//!     --durability <N>        Tool max durability (default: 250)
//!     --unbreaking <N>        Unbreaking level (default: 0)
//!     --immersive             Pause between removal batches
//!     -h, --help              Show this help message

use std::env;
use std::path::PathBuf;
use std::time::Instant;

use treefell::config::FellingConfig;
use treefell::core::logging;
use treefell::core::types::ActorId;
use treefell::felling::{FellingReport, Lumberjack, ToolState};
use treefell::host::{BlockSink, MemoryHost};
use treefell::session::{BreakOutcome, ProbeOutcome, ProbeResult, Session};
use treefell::voxel::{Coord, VoxelGrid};

const LOG: &str = "minecraft:oak_log";
const MAX_TICKS: u64 = 10_000;
const PLAYER: ActorId = ActorId(1);

fn print_help() {
    eprintln!("fell_sim - Tree felling simulator");
    eprintln!();
    eprintln!("Usage: fell_sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("    -c, --config <PATH>     JSON config file (default: built-in defaults)");
    eprintln!("    --height <N>            Trunk height (default: 12)");
    eprintln!("    --branches <N>          Diagonal branches off the crown, up to 4 (default: 4)");
    eprintln!("    --damage <N>            Tool damage before felling (default: 0)");
    eprintln!("    --durability <N>        Tool max durability (default: 250)");
    eprintln!("    --unbreaking <N>        Unbreaking level (default: 0)");
    eprintln!("    --immersive             Pause between removal batches");
    eprintln!("    -h, --help              Show this help message");
    eprintln!();
    eprintln!("Example:");
    eprintln!("    fell_sim --height 40 --damage 200");
    eprintln!("    fell_sim -c felling.json --immersive");
}

#[derive(Debug)]
struct Args {
    config: Option<PathBuf>,
    height: i32,
    branches: usize,
    damage: u32,
    durability: u32,
    unbreaking: u8,
    immersive: bool,
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> Result<T, String> {
    let raw = args.get(i).ok_or_else(|| format!("Missing value for {}", flag))?;
    raw.parse()
        .map_err(|_| format!("Invalid value for {}: {}", flag, raw))
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut parsed = Args {
        config: None,
        height: 12,
        branches: 4,
        damage: 0,
        durability: 250,
        unbreaking: 0,
        immersive: false,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-c" | "--config" => {
                i += 1;
                parsed.config = Some(PathBuf::from(parse_value::<String>(&args, i, "--config")?));
            }
            "--height" => {
                i += 1;
                parsed.height = parse_value(&args, i, "--height")?;
            }
            "--branches" => {
                i += 1;
                parsed.branches = parse_value::<usize>(&args, i, "--branches")?.min(4);
            }
            "--damage" => {
                i += 1;
                parsed.damage = parse_value(&args, i, "--damage")?;
            }
            "--durability" => {
                i += 1;
                parsed.durability = parse_value(&args, i, "--durability")?;
            }
            "--unbreaking" => {
                i += 1;
                parsed.unbreaking = parse_value(&args, i, "--unbreaking")?;
            }
            "--immersive" => parsed.immersive = true,
            other => return Err(format!("Unknown option: {}", other)),
        }
        i += 1;
    }

    if parsed.height < 1 {
        return Err("Height must be at least 1".to_string());
    }
    Ok(parsed)
}

/// Trunk column with diagonal branches leaving the crown
fn grow_tree(host: &mut MemoryHost, height: i32, branches: usize) -> usize {
    let base = Coord::new(0, 64, 0);
    host.place_column(base, height, LOG);

    let crown = base.offset(0, height - 1, 0);
    let directions = [(1, 1), (-1, 1), (1, -1), (-1, -1)];
    for &(dx, dz) in directions.iter().take(branches) {
        let length = (height / 3).max(1);
        for step in 1..=length {
            host.place_block(crown.offset(dx * step, step, dz * step), LOG);
        }
    }
    host.count_blocks(LOG)
}

#[tokio::main]
async fn main() {
    logging::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_help();
            std::process::exit(1);
        }
    };

    let mut config = match &args.config {
        Some(path) => match FellingConfig::load_async(path).await {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => FellingConfig::default(),
    };
    config.immersive_mode |= args.immersive;

    let mut session = match Session::new(config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut host = MemoryHost::new();
    let logs = grow_tree(&mut host, args.height, args.branches);
    let tool = ToolState::new(args.durability, args.unbreaking).with_damage(args.damage);
    host.add_actor(Lumberjack::new(PLAYER, true, Some(tool)));
    log::info!("Grew a tree of {} logs", logs);

    let origin = Coord::new(0, 64, 0);

    // Probe
    let ticket = match session.probe(&host, PLAYER, origin) {
        ProbeOutcome::Pending(ticket) => ticket,
        other => {
            eprintln!("Probe refused: {:?}", other);
            std::process::exit(1);
        }
    };
    let ticks = session.run_jobs(&mut host, MAX_TICKS);
    match ticket.wait().await {
        Some(ProbeResult::Reported(report)) => {
            println!("Probe ({} ticks):", ticks);
            println!("  Size:          {}", report.size);
            println!("  Cost:          {}", report.cost);
            println!("  Durability:    {}/{}", report.damage, report.max_durability);
            match report.infeasible {
                Some(why) => println!("  Can be felled: no ({})", why),
                None => println!("  Can be felled: yes"),
            }
        }
        other => println!("Probe did not finish: {:?}", other),
    }

    // Fell
    let started = Instant::now();
    let broken = host.resolve(origin);
    host.remove_block(origin);
    let ticket = match session.break_block(&host, PLAYER, origin, &broken) {
        BreakOutcome::Pending(ticket) => ticket,
        other => {
            eprintln!("Break ignored: {:?}", other);
            std::process::exit(1);
        }
    };
    let ticks = session.run_jobs(&mut host, MAX_TICKS);
    match ticket.wait().await {
        Some(FellingReport::Felled(summary)) => {
            println!("Felled in {} ticks ({:.2?}):", ticks, started.elapsed());
            println!("  Removed:       {}", summary.removed);
            println!("  Cost:          {}", summary.cost);
            println!("  Tool:          {:?}", summary.wear);
            println!("  Items dropped: {}", summary.items);
            println!("  Logs left:     {}", host.count_blocks(LOG));
        }
        Some(other) => println!("Felling did not happen: {:?}", other),
        None => println!("Felling job was dropped"),
    }
}
