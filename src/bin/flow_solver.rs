use anyhow::{Context, Result};
use clap::Parser;
use flow_solver::solver::{solve_dfs, SolveOutcome};
use flow_solver::utils::{apply_order_hint, puzzle_from_str};
use flow_solver::{order_colors_seeded, Options};
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Solve a flow puzzle by backtracking search", long_about = None)]
struct Args {
    /// Path to the puzzle file ('.' free, '#' wall, letters/digits are endpoints)
    puzzle_file: PathBuf,

    /// Shuffle the branching order instead of using the color heuristic
    #[clap(short, long)]
    random_order: bool,

    /// Seed for --random-order (defaults to the current time)
    #[clap(long)]
    seed: Option<u64>,

    /// Always extend the color with the fewest legal moves
    #[clap(short, long)]
    most_constrained: bool,

    /// Colors to try first, in order (e.g. "RGB")
    #[clap(long)]
    hint: Option<String>,

    /// Disable dead-end pruning
    #[clap(long)]
    no_deadends: bool,

    /// Stop after expanding this many search nodes
    #[clap(long)]
    max_nodes: Option<u64>,

    /// Suppress the branching-order banner
    #[clap(short, long)]
    quiet: bool,

    /// Log search progress (repeat for more detail)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let text = fs::read_to_string(&args.puzzle_file)
        .with_context(|| format!("failed to read puzzle file {}", args.puzzle_file.display()))?;
    let (mut info, state) = puzzle_from_str(&text)
        .with_context(|| format!("invalid puzzle in {}", args.puzzle_file.display()))?;
    if let Some(hint) = &args.hint {
        apply_order_hint(&mut info, hint).context("invalid --hint")?;
    }

    let options = Options {
        order_random: args.random_order,
        order_most_constrained: args.most_constrained,
        display_quiet: args.quiet,
        seed: args.seed.unwrap_or_else(time_seed),
        check_deadends: !args.no_deadends,
        max_nodes: args.max_nodes,
    };
    if options.order_random {
        tracing::info!(seed = options.seed, "random branching order");
    }

    println!("Loaded {}x{} puzzle with {} colors from {}\n", info.width(), info.height(), info.num_colors(), args.puzzle_file.display());
    println!("{}\n", state.display(&info));

    order_colors_seeded(&mut info, &state, &options);
    let solution = solve_dfs(&info, &state, &options);

    match &solution.outcome {
        SolveOutcome::Solved(solved) => {
            println!("Solved:\n{}\n", solved.display(&info));
        }
        SolveOutcome::Unsolvable => println!("No solution exists.\n"),
        SolveOutcome::NodeLimit => println!("Gave up after {} nodes.\n", solution.stats.nodes),
    }
    println!("Nodes expanded: {}", solution.stats.nodes);
    println!("Dead ends pruned: {}", solution.stats.deadend_prunes);
    Ok(())
}
