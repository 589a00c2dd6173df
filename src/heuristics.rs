use crate::engine::{Color, GameInfo, GameState, Pos};
use crate::options::Options;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;
use tracing::{debug, info};

/// Priority given to colors without an explicit user priority. Sorts after
/// every real priority.
const UNPRIORITIZED: usize = usize::MAX;

/// How many free cells away from the path head the dead-end detector looks
/// for a cell with at most one accessible neighbor.
pub const DEADEND_LOOKAHEAD: usize = 2;

/// Per-color features the heuristic branching order sorts on.
///
/// Ordering (see the `Ord` impl) is ascending on `user_index` and on the
/// init endpoint's wall distance, then descending on the goal endpoint's
/// wall distance and on the endpoint distance. Remaining ties fall back to the
/// color index so the order is total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorFeatures {
    pub index: Color,
    pub user_index: usize,
    pub wall_dist: [usize; 2],
    pub min_dist: usize,
}

impl ColorFeatures {
    /// Computes the features of `color`.
    ///
    /// # Arguments
    /// * `info`: Static puzzle information (endpoints, wall distances, priorities).
    /// * `state`: The initial search state; the color's head is taken as its first endpoint.
    /// * `color`: The color to describe.
    pub fn compute(info: &GameInfo, state: &GameState, color: Color) -> Self {
        let color_info = info.color(color);
        let (x0, y0) = info.coords(state.head(color));
        let (x1, y1) = info.coords(color_info.goal_pos());
        ColorFeatures {
            index: color,
            user_index: color_info.user_index.unwrap_or(UNPRIORITIZED),
            wall_dist: color_info.wall_dist,
            min_dist: x0.abs_diff(x1) + y0.abs_diff(y1),
        }
    }
}

impl Ord for ColorFeatures {
    fn cmp(&self, other: &Self) -> Ordering {
        self.user_index
            .cmp(&other.user_index)
            .then(self.wall_dist[0].cmp(&other.wall_dist[0]))
            .then(other.wall_dist[1].cmp(&self.wall_dist[1]))
            .then(other.min_dist.cmp(&self.min_dist))
            .then(self.index.cmp(&other.index))
    }
}

impl PartialOrd for ColorFeatures {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Computes the branching order of a puzzle and stores it in `info`.
///
/// In random mode (`options.order_random`) the colors are shuffled with an
/// unbiased Fisher-Yates shuffle drawing from `rng`. Otherwise colors are
/// sorted by their `ColorFeatures`: user priority first, then colors whose
/// init endpoint hugs a wall, then colors whose goal is far from a wall, then
/// colors whose endpoints lie far apart.
///
/// Unless `options.display_quiet` is set, the chosen order is printed to
/// stdout as a banner (see `branching_order_summary`).
///
/// # Arguments
/// * `info`: Static puzzle information; its color order is overwritten.
/// * `state`: The puzzle's initial search state.
/// * `options`: Selects random vs. heuristic mode and controls the banner.
/// * `rng`: Random source for random mode. Untouched in heuristic mode.
pub fn order_colors<R: Rng>(
    info: &mut GameInfo,
    state: &GameState,
    options: &Options,
    rng: &mut R,
) {
    let order = if options.order_random {
        let mut order: Vec<Color> = (0..info.num_colors()).collect();
        shuffle(&mut order, rng);
        order
    } else {
        let mut features: Vec<ColorFeatures> = (0..info.num_colors())
            .map(|color| ColorFeatures::compute(info, state, color))
            .collect();
        for f in &features {
            debug!(
                color = %info.color_name(f.index),
                user_index = f.user_index,
                wall_dist_init = f.wall_dist[0],
                wall_dist_goal = f.wall_dist[1],
                min_dist = f.min_dist,
                "color features"
            );
        }
        features.sort();
        features.into_iter().map(|f| f.index).collect()
    };

    info.set_color_order(order);
    info!(
        random = options.order_random,
        order = %order_names(info),
        "branching order chosen"
    );

    if !options.display_quiet {
        println!("{}", branching_order_summary(info, options));
    }
}

/// Like `order_colors`, but draws random-mode shuffles from a generator
/// seeded with `options.seed`, so the same options always give the same order.
pub fn order_colors_seeded(info: &mut GameInfo, state: &GameState, options: &Options) {
    let mut rng = SmallRng::seed_from_u64(options.seed);
    order_colors(info, state, options, &mut rng);
}

// Iterates from the last index down, swapping each slot with a uniformly
// chosen slot at or before it.
fn shuffle<T, R: Rng>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

fn order_names(info: &GameInfo) -> String {
    info.color_order()
        .iter()
        .map(|&c| info.color_name(c))
        .collect()
}

/// Builds the human-readable banner describing how colors will be chosen.
///
/// # Returns
/// A multi-line `String` listing the color labels in branching order, or a
/// note that the most constrained color will be picked dynamically.
pub fn branching_order_summary(info: &GameInfo, options: &Options) -> String {
    let mut out = String::new();
    out.push_str("************************************************\n");
    out.push_str("*               Branching Order                *\n");
    if options.order_most_constrained {
        out.push_str("* Will choose color by most constrained\n");
    } else {
        out.push_str("* Will choose colors in order: ");
        out.push_str(&order_names(info));
        out.push('\n');
    }
    out.push_str("************************************************\n");
    out
}

/// Returns `true` if `pos` could still serve as a path continuation.
///
/// Free cells are accessible. An occupied cell is accessible only if it is
/// the current head or the goal of a color that is not yet complete;
/// endpoints of completed colors can no longer act as an exit.
pub fn is_accessible(info: &GameInfo, state: &GameState, pos: Pos) -> bool {
    let cell = state.cell(pos);
    if cell.is_free() {
        return true;
    }
    // A head or goal of color c always sits on a cell tagged with c.
    match cell.color() {
        Some(c) => !state.is_completed(c) && (state.head(c) == pos || info.goal_pos(c) == pos),
        None => false,
    }
}

/// Counts the on-board orthogonal neighbors of `pos` that are accessible.
pub fn accessible_neighbor_count(info: &GameInfo, state: &GameState, pos: Pos) -> usize {
    info.neighbors(pos)
        .filter(|&n| is_accessible(info, state, n))
        .count()
}

/// Checks whether the last move isolated a pocket of free space.
///
/// Looks at the free cells up to `DEADEND_LOOKAHEAD` steps from the head of
/// the most recently extended color. If any of them has at most one
/// accessible neighbor, no path can both enter and leave it, so the board can
/// no longer be fully covered.
///
/// This is a local check: it catches narrow pockets near the head in
/// constant time and misses dead ends further away.
///
/// # Returns
/// `true` if a dead end was found (the branch should be pruned), `false`
/// otherwise, including when no color has been extended yet.
pub fn check_deadends(info: &GameInfo, state: &GameState) -> bool {
    check_deadends_within(info, state, DEADEND_LOOKAHEAD)
}

/// `check_deadends` with an explicit lookahead radius.
///
/// A `lookahead` of 1 only inspects the head's free neighbors; every extra
/// step also inspects free cells one step further out. A `lookahead` of 0
/// never reports a dead end.
pub fn check_deadends_within(info: &GameInfo, state: &GameState, lookahead: usize) -> bool {
    let color = match state.last_color {
        Some(c) if c < info.num_colors() => c,
        _ => return false,
    };
    if lookahead == 0 {
        return false;
    }
    info.neighbors(state.head(color))
        .any(|pos| is_narrow_free_cell(info, state, pos, lookahead - 1))
}

// A free cell is narrow if it has at most one accessible neighbor, or if
// (depth permitting) any free neighbor of it is narrow.
fn is_narrow_free_cell(info: &GameInfo, state: &GameState, pos: Pos, depth: usize) -> bool {
    if !state.cell(pos).is_free() {
        return false;
    }
    if depth > 0
        && info
            .neighbors(pos)
            .any(|next| is_narrow_free_cell(info, state, next, depth - 1))
    {
        return true;
    }
    accessible_neighbor_count(info, state, pos) <= 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Cell, Direction};
    use crate::utils::puzzle_from_str_array;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn quiet() -> Options {
        Options {
            display_quiet: true,
            ..Options::default()
        }
    }

    fn quiet_random(seed: u64) -> Options {
        Options {
            order_random: true,
            seed,
            ..quiet()
        }
    }

    // Seven colors on a 7x7 board, chosen so that every sort key decides at
    // least one pair.
    fn feature_puzzle() -> (GameInfo, GameState) {
        let info = GameInfo::new(
            7,
            7,
            &[
                ('A', (0, 3), (6, 3)), // wd [0, 0], dist 6
                ('B', (3, 3), (3, 4)), // wd [3, 2], dist 1
                ('C', (0, 0), (3, 3)), // wd [0, 3], dist 6
                ('D', (1, 1), (1, 2)), // wd [1, 1], dist 1
                ('E', (0, 6), (3, 2)), // wd [0, 2], dist 7
                ('F', (6, 0), (4, 3)), // wd [0, 2], dist 5
                ('G', (5, 5), (5, 4)), // wd [1, 1], dist 1
            ],
        );
        let state = GameState::new(&info, vec![Cell::Free; info.num_cells()]);
        (info, state)
    }

    fn is_permutation(order: &[Color], n: usize) -> bool {
        let mut sorted = order.to_vec();
        sorted.sort_unstable();
        sorted == (0..n).collect::<Vec<_>>()
    }

    #[test]
    fn test_heuristic_order_sort_keys() {
        let (mut info, state) = feature_puzzle();
        order_colors_seeded(&mut info, &state, &quiet());
        // C, E, F, A share wall_dist 0 at init; goal wall distance descending
        // gives C, then E/F tie broken by endpoint distance, then A.
        // D and G tie on every key and fall back to index; B hugs no wall.
        assert_eq!(info.color_order(), &[2, 4, 5, 0, 3, 6, 1]);
    }

    #[test]
    fn test_user_priority_precedes_distance_keys() {
        let (mut info, state) = feature_puzzle();
        info.set_user_index(1, Some(0));
        info.set_user_index(6, Some(1));
        order_colors_seeded(&mut info, &state, &quiet());
        assert_eq!(info.color_order(), &[1, 6, 2, 4, 5, 0, 3]);
    }

    #[test]
    fn test_user_priority_values_are_ranked() {
        let (mut info, state) = feature_puzzle();
        info.set_user_index(0, Some(5));
        info.set_user_index(3, Some(2));
        order_colors_seeded(&mut info, &state, &quiet());
        assert_eq!(&info.color_order()[..2], &[3, 0]);
    }

    #[test]
    fn test_heuristic_order_is_deterministic() {
        let (mut first, state) = feature_puzzle();
        let mut second = first.clone();
        order_colors_seeded(&mut first, &state, &quiet());
        // A different seed must not matter outside random mode.
        let options = Options { seed: 99, ..quiet() };
        order_colors_seeded(&mut second, &state, &options);
        assert_eq!(first.color_order(), second.color_order());
    }

    #[test]
    fn test_features_from_parsed_puzzle() {
        let (info, state) = puzzle_from_str_array(&["R...", "....", "...R"]).unwrap();
        let f = ColorFeatures::compute(&info, &state, 0);
        assert_eq!(f.user_index, UNPRIORITIZED);
        assert_eq!(f.wall_dist, [0, 0]);
        assert_eq!(f.min_dist, 5);
    }

    #[test]
    fn test_random_order_reproducible_for_seed() {
        let (mut first, state) = feature_puzzle();
        let mut second = first.clone();
        order_colors_seeded(&mut first, &state, &quiet_random(7));
        order_colors_seeded(&mut second, &state, &quiet_random(7));
        assert_eq!(first.color_order(), second.color_order());
        assert!(is_permutation(first.color_order(), 7));
    }

    #[test]
    fn test_random_order_is_uniform() {
        let info = GameInfo::new(
            3,
            3,
            &[('A', (0, 0), (2, 0)), ('B', (0, 1), (2, 1)), ('C', (0, 2), (2, 2))],
        );
        let state = GameState::new(&info, vec![Cell::Free; 9]);
        let options = quiet_random(0);
        let mut rng = SmallRng::seed_from_u64(20240611);

        const TRIALS: usize = 6000;
        let mut counts: HashMap<Vec<Color>, usize> = HashMap::new();
        for _ in 0..TRIALS {
            let mut trial = info.clone();
            order_colors(&mut trial, &state, &options, &mut rng);
            *counts.entry(trial.color_order().to_vec()).or_insert(0) += 1;
        }

        assert_eq!(counts.len(), 6, "every permutation of 3 colors should appear");
        let expected = TRIALS as f64 / 6.0;
        let chi_square: f64 = counts
            .values()
            .map(|&observed| {
                let diff = observed as f64 - expected;
                diff * diff / expected
            })
            .sum();
        // 5 degrees of freedom; 25.7 is the 0.01% critical value.
        assert!(chi_square < 25.7, "chi-square {} too large: {:?}", chi_square, counts);
    }

    #[test]
    fn test_summary_lists_order() {
        let (mut info, state) = feature_puzzle();
        order_colors_seeded(&mut info, &state, &quiet());
        let summary = branching_order_summary(&info, &quiet());
        assert!(summary.contains("Branching Order"));
        assert!(summary.contains("* Will choose colors in order: CEFADGB\n"));

        let constrained = Options {
            order_most_constrained: true,
            ..quiet()
        };
        let summary = branching_order_summary(&info, &constrained);
        assert!(summary.contains("most constrained"));
        assert!(!summary.contains("CEFADGB"));
    }

    proptest! {
        #[test]
        fn prop_orders_are_permutations(
            endpoints in prop::collection::vec(((0usize..6, 0usize..6), (0usize..6, 0usize..6), prop::option::of(0usize..4)), 0..12),
            random in any::<bool>(),
            seed in any::<u64>(),
        ) {
            let labels: Vec<(char, (usize, usize), (usize, usize))> = endpoints
                .iter()
                .enumerate()
                .map(|(i, &(init, goal, _))| ((b'a' + i as u8) as char, init, goal))
                .collect();
            let mut info = GameInfo::new(6, 6, &labels);
            for (i, &(_, _, user_index)) in endpoints.iter().enumerate() {
                info.set_user_index(i, user_index);
            }
            let state = GameState::new(&info, vec![Cell::Free; info.num_cells()]);
            let options = Options { order_random: random, seed, ..quiet() };
            order_colors_seeded(&mut info, &state, &options);
            prop_assert!(is_permutation(info.color_order(), endpoints.len()));

            if !random {
                // Every prioritized color precedes every unprioritized one.
                let first_unprioritized = info
                    .color_order()
                    .iter()
                    .position(|&c| info.color(c).user_index.is_none())
                    .unwrap_or(endpoints.len());
                prop_assert!(info.color_order()[first_unprioritized..]
                    .iter()
                    .all(|&c| info.color(c).user_index.is_none()));
            }
        }
    }

    fn with_last_color(mut state: GameState, color: Color) -> GameState {
        state.last_color = Some(color);
        state
    }

    #[test]
    fn test_no_last_color_is_not_a_deadend() {
        let (info, state) = puzzle_from_str_array(&["#.#", "#A#", "A##"]).unwrap();
        assert_eq!(state.last_color, None);
        assert!(!check_deadends(&info, &state));
    }

    #[test]
    fn test_open_board_is_not_a_deadend() {
        let (info, state) = puzzle_from_str_array(&["...", ".A.", "..A"]).unwrap();
        let state = with_last_color(state, 0);
        assert!(!check_deadends(&info, &state));
    }

    #[test]
    fn test_walled_in_head_with_single_free_cell() {
        let (info, state) = puzzle_from_str_array(&["#.#", "#A#", "A##"]).unwrap();
        let state = with_last_color(state, 0);
        assert!(check_deadends(&info, &state));
    }

    #[test]
    fn test_two_deep_pocket_is_a_deadend() {
        let (info, state) = puzzle_from_str_array(&[
            "#.#..",
            "#.#..",
            "#A#..",
            "###.A",
        ])
        .unwrap();
        let state = with_last_color(state, 0);
        assert!(check_deadends(&info, &state));
        // The narrow cell is two steps out, so a radius of one misses it.
        assert!(!check_deadends_within(&info, &state, 1));
        assert!(!check_deadends_within(&info, &state, 0));
    }

    #[test]
    fn test_widened_pocket_is_not_a_deadend() {
        let (info, state) = puzzle_from_str_array(&[
            "..#..",
            "..#..",
            "#A#..",
            "###.A",
        ])
        .unwrap();
        let state = with_last_color(state, 0);
        assert!(!check_deadends(&info, &state));
    }

    #[test]
    fn test_completed_endpoints_are_not_exits() {
        let (info, state) = puzzle_from_str_array(&[
            "B.#..",
            "B.#..",
            "#A#..",
            "###.A",
        ])
        .unwrap();
        let a = info.color_by_name('A').unwrap();
        let b = info.color_by_name('B').unwrap();

        // While B is still open, its head and goal keep the pocket alive.
        let state = with_last_color(state, a);
        assert!(!check_deadends(&info, &state));

        let mut state = state;
        assert!(state.make_move(&info, b, Direction::Down));
        assert!(state.is_completed(b));
        let state = with_last_color(state, a);
        assert!(check_deadends(&info, &state));
    }

    #[test]
    fn test_accessible_neighbor_count() {
        let (info, mut state) = puzzle_from_str_array(&["R.R", "#.."]).unwrap();
        let middle = info.pos(1, 0).unwrap();
        // Head of R, free cell below, goal of R.
        assert_eq!(accessible_neighbor_count(&info, &state, middle), 3);
        assert!(!is_accessible(&info, &state, info.pos(0, 1).unwrap()));

        assert!(state.make_move(&info, 0, Direction::Right));
        assert!(state.make_move(&info, 0, Direction::Right));
        // R is complete: its head and goal no longer count.
        let below = info.pos(1, 1).unwrap();
        assert_eq!(accessible_neighbor_count(&info, &state, below), 1);
        assert!(!is_accessible(&info, &state, middle));
    }

    #[test]
    fn test_path_body_is_not_accessible() {
        let (info, mut state) = puzzle_from_str_array(&["R..R", "...."]).unwrap();
        assert!(state.make_move(&info, 0, Direction::Right));
        assert!(state.make_move(&info, 0, Direction::Down));
        let body = info.pos(1, 0).unwrap();
        assert_eq!(state.cell(body), Cell::Path(0));
        assert!(!is_accessible(&info, &state, body));
        assert!(is_accessible(&info, &state, state.head(0)));
    }
}
