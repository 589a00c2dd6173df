//! Solver configuration.

/// Settings that steer color ordering, pruning and output.
///
/// The binaries build this from command-line flags; library users can start
/// from `Options::default()` and override individual fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Shuffle the branching order instead of sorting colors by their features.
    pub order_random: bool,
    /// Let the search pick the color with the fewest legal moves at every step
    /// instead of following the fixed branching order.
    pub order_most_constrained: bool,
    /// Suppress the branching-order banner.
    pub display_quiet: bool,
    /// Seed for the random branching order.
    pub seed: u64,
    /// Prune branches flagged by the dead-end detector.
    pub check_deadends: bool,
    /// Give up after expanding this many search nodes.
    pub max_nodes: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            order_random: false,
            order_most_constrained: false,
            display_quiet: false,
            seed: 0,
            check_deadends: true,
            max_nodes: None,
        }
    }
}
