use anyhow::{bail, Context};

use dungeon_core::config::{Difficulty, FloorParams, GenerationConfig, LadderDirection};
use dungeon_core::level::generate_level;
use dungeon_core::logging::init_tracing;
use dungeon_core::rng::FloorRng;
use dungeon_core::survey::{run_survey, SurveyConfig};
use dungeon_core::visualization::{render_cells, render_points};

const USAGE: &str = "usage: dungeon-floor [--seed N] [--difficulty easy|normal|hard|hardcore] \
[--depth N] [--exit none|up|down|left|right] [--config FILE] [--survey FLOORS] [--json]";

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut config = match parse_str_arg(&args, "--config") {
        Some(path) => GenerationConfig::from_file(&path)
            .with_context(|| format!("loading config from {}", path))?,
        None => GenerationConfig::default(),
    };
    if let Some(name) = parse_str_arg(&args, "--difficulty") {
        config.difficulty = Difficulty::from_name(&name)
            .with_context(|| format!("unknown difficulty '{}'", name))?;
    }
    init_tracing(&config.tracing);

    let seed: u64 = parse_num_arg(&args, "--seed").unwrap_or(42);
    let depth: u32 = parse_num_arg(&args, "--depth").unwrap_or(1);
    let exit = match parse_str_arg(&args, "--exit") {
        Some(name) => LadderDirection::from_name(&name)
            .with_context(|| format!("unknown exit direction '{}'", name))?,
        None => LadderDirection::Down,
    };
    if depth == 0 {
        bail!("depth starts at 1");
    }

    if let Some(floors) = parse_num_arg::<u64>(&args, "--survey") {
        let report = run_survey(&SurveyConfig {
            difficulty: config.difficulty,
            floors,
            base_seed: seed,
            depth,
            exit,
            max_attempts: config.max_attempts,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        if !report.is_clean() {
            bail!(
                "{} failed floors, {} invariant violations",
                report.failed,
                report.violations.len()
            );
        }
        return Ok(());
    }

    let mut params = FloorParams::first_floor(exit);
    params.depth = depth;
    let mut rng = FloorRng::for_floor(seed, depth);
    let level = generate_level(&config, params, &mut rng)
        .with_context(|| format!("generating floor {} from seed {}", depth, seed))?;

    if args.iter().any(|a| a == "--json") {
        println!("{}", level.to_json()?);
        return Ok(());
    }

    println!("=== Floor {} ({:?}, seed {}) ===", depth, config.difficulty, seed);
    println!("  Attempts:  {}", level.attempts);
    println!("  Creatures: {}", level.creatures.len());
    println!("  Chests:    {}", level.chests.len());
    println!("  Doors:     {}", level.door_descriptors.len());
    if let Some(code) = level.bonus_code {
        println!("  Bonus code: {}{}{}{}", code[0], code[1], code[2], code[3]);
    }
    println!();
    print!("{}", render_points(&level.points, &level.edges));
    println!();
    print!("{}", render_cells(&level.cells));

    for defect in level.verify() {
        eprintln!("defect: {}", defect);
    }
    Ok(())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_num_arg<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    parse_str_arg(args, flag).and_then(|v| v.parse().ok())
}
