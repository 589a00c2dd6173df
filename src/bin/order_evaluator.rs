use anyhow::{Context, Result};
use clap::Parser;
use flow_solver::solver::{solve_dfs, Solution, SolveOutcome};
use flow_solver::utils::puzzle_from_str;
use flow_solver::{order_colors_seeded, Options};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Compare heuristic and random branching orders", long_about = None)]
struct Args {
    /// Puzzle files to evaluate
    #[clap(required = true)]
    puzzle_files: Vec<PathBuf>,

    /// Number of random orders to try per puzzle
    #[clap(short, long, default_value_t = 20)]
    trials: u64,

    /// Seed of the first random order; trial i uses start_seed + i
    #[clap(long, default_value_t = 0)]
    start_seed: u64,

    /// Node budget per search
    #[clap(long, default_value_t = 1_000_000)]
    max_nodes: u64,

    /// Disable dead-end pruning
    #[clap(long)]
    no_deadends: bool,
}

fn run(path: &PathBuf, options: &Options) -> Result<Solution> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read puzzle file {}", path.display()))?;
    let (mut info, state) =
        puzzle_from_str(&text).with_context(|| format!("invalid puzzle in {}", path.display()))?;
    order_colors_seeded(&mut info, &state, options);
    Ok(solve_dfs(&info, &state, options))
}

fn outcome_label(outcome: &SolveOutcome) -> &'static str {
    match outcome {
        SolveOutcome::Solved(_) => "solved",
        SolveOutcome::Unsolvable => "unsolvable",
        SolveOutcome::NodeLimit => "node limit",
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let base = Options {
        display_quiet: true,
        check_deadends: !args.no_deadends,
        max_nodes: Some(args.max_nodes),
        ..Options::default()
    };

    println!("Evaluating {} puzzles, {} random orders each...", args.puzzle_files.len(), args.trials);

    let mut heuristic_total = 0u64;
    let mut random_total = 0f64;

    for path in &args.puzzle_files {
        let heuristic = run(path, &base)?;
        println!("\n{}", path.display());
        println!(
            "  Heuristic: {:<10} nodes: {:<10} pruned: {}",
            outcome_label(&heuristic.outcome),
            heuristic.stats.nodes,
            heuristic.stats.deadend_prunes
        );

        let mut nodes = Vec::with_capacity(args.trials as usize);
        let mut solved = 0;
        for trial in 0..args.trials {
            let options = Options {
                order_random: true,
                seed: args.start_seed + trial,
                ..base.clone()
            };
            let solution = run(path, &options)?;
            if matches!(solution.outcome, SolveOutcome::Solved(_)) {
                solved += 1;
            }
            nodes.push(solution.stats.nodes);
        }
        let average = if nodes.is_empty() {
            0.0
        } else {
            nodes.iter().sum::<u64>() as f64 / nodes.len() as f64
        };
        println!(
            "  Random:    solved {}/{}  avg nodes: {:.1}  min: {}  max: {}",
            solved,
            args.trials,
            average,
            nodes.iter().min().copied().unwrap_or(0),
            nodes.iter().max().copied().unwrap_or(0)
        );

        heuristic_total += heuristic.stats.nodes;
        random_total += average;
    }

    println!("\n--- Evaluation Complete ---");
    println!("Total heuristic nodes:       {}", heuristic_total);
    println!("Total average random nodes:  {:.1}", random_total);
    Ok(())
}
