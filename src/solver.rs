use crate::engine::{Color, Direction, GameInfo, GameState};
use crate::heuristics::check_deadends;
use crate::options::Options;
use tracing::{debug, trace};

/// Counters collected during a search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Number of moves applied, including those later pruned.
    pub nodes: u64,
    /// Number of moves rejected by the dead-end detector.
    pub deadend_prunes: u64,
}

/// How a search ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolveOutcome {
    /// Every color is connected and every cell is covered.
    Solved(GameState),
    /// The whole search space was explored without finding a solution.
    Unsolvable,
    /// The node budget in `Options::max_nodes` ran out first.
    NodeLimit,
}

/// Result of `solve_dfs`.
#[derive(Clone, Debug)]
pub struct Solution {
    pub outcome: SolveOutcome,
    pub stats: SearchStats,
}

enum Step {
    Found(GameState),
    Exhausted,
    Aborted,
}

/// Solves a puzzle by depth-first backtracking.
///
/// At every node one color is chosen (see `choose_color`) and its path is
/// extended by one cell in each legal direction in turn. Each child state is
/// a fresh clone, so the caller's `initial` state is never modified. When
/// `options.check_deadends` is set, children flagged by
/// `heuristics::check_deadends` are discarded without being searched.
///
/// The branching order must already be stored in `info` (see
/// `heuristics::order_colors`).
pub fn solve_dfs(info: &GameInfo, initial: &GameState, options: &Options) -> Solution {
    let mut stats = SearchStats::default();
    let outcome = match search(info, initial.clone(), options, &mut stats) {
        Step::Found(state) => SolveOutcome::Solved(state),
        Step::Exhausted => SolveOutcome::Unsolvable,
        Step::Aborted => SolveOutcome::NodeLimit,
    };
    debug!(
        nodes = stats.nodes,
        deadend_prunes = stats.deadend_prunes,
        solved = matches!(outcome, SolveOutcome::Solved(_)),
        "search finished"
    );
    Solution { outcome, stats }
}

fn search(info: &GameInfo, state: GameState, options: &Options, stats: &mut SearchStats) -> Step {
    if state.is_solved() {
        return Step::Found(state);
    }
    // All colors connected but free cells left over.
    let Some(color) = choose_color(info, &state, options) else {
        return Step::Exhausted;
    };

    for dir in Direction::ALL {
        let mut child = state.clone();
        if !child.make_move(info, color, dir) {
            continue;
        }
        if options.max_nodes.map_or(false, |limit| stats.nodes >= limit) {
            return Step::Aborted;
        }
        stats.nodes += 1;

        if options.check_deadends && check_deadends(info, &child) {
            stats.deadend_prunes += 1;
            trace!(color = %info.color_name(color), ?dir, "dead end, pruning");
            continue;
        }

        match search(info, child, options, stats) {
            Step::Exhausted => continue,
            done => return done,
        }
    }
    Step::Exhausted
}

/// Picks the color to extend next.
///
/// With `options.order_most_constrained` this is the incomplete color with
/// the fewest legal moves (earliest in the branching order on ties);
/// otherwise it is the first incomplete color in the branching order.
/// Returns `None` once every color is complete.
pub fn choose_color(info: &GameInfo, state: &GameState, options: &Options) -> Option<Color> {
    let mut open = info
        .color_order()
        .iter()
        .copied()
        .filter(|&c| !state.is_completed(c));
    if options.order_most_constrained {
        open.min_by_key(|&c| state.num_moves(info, c))
    } else {
        open.next()
    }
}
