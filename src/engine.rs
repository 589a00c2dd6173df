//! Core board model for the flow puzzle.
//!
//! This module defines the data the solver and its heuristics operate on:
//! - `Pos`, `Direction`: grid cells and the four orthogonal moves between them.
//! - `Cell` / `CellType`: what currently occupies a grid cell.
//! - `ColorSet`: a growable set of color indices, used to track completed colors.
//! - `GameInfo`: per-puzzle static information (board size, endpoints, wall
//!   distances, branching order). Built once, read-only during search.
//! - `GameState`: the mutable search state (cells, path heads, completion set,
//!   last extended color). Cloned per branch by the solver.
use std::fmt;

/// Index of a color in `[0, num_colors)`.
pub type Color = usize;

/// An opaque board position.
///
/// A `Pos` is only meaningful together with the `GameInfo` that produced it;
/// use `GameInfo::pos` to encode coordinates and `GameInfo::coords` to decode.
/// Off-board positions are never materialized: `GameInfo::offset` returns
/// `None` instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos(u32);

impl Pos {
    /// Row-major cell index, suitable for indexing `GameState::cells`.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One of the four orthogonal directions a path can be extended in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// All directions, in the order the solver tries them.
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    /// Returns the `(dx, dy)` offset of this direction. `y` grows downwards.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
        }
    }
}

/// Coarse classification of a cell, ignoring which color occupies it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellType {
    Free,
    Wall,
    Path,
    Init,
    Goal,
}

/// Contents of a single board cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    /// Not yet covered by any path.
    Free,
    /// Permanently blocked.
    Wall,
    /// Covered by a path segment of the given color.
    Path(Color),
    /// Starting endpoint of the given color.
    Init(Color),
    /// Goal endpoint of the given color.
    Goal(Color),
}

impl Cell {
    /// Returns the coarse `CellType` tag of this cell.
    pub fn cell_type(&self) -> CellType {
        match self {
            Cell::Free => CellType::Free,
            Cell::Wall => CellType::Wall,
            Cell::Path(_) => CellType::Path,
            Cell::Init(_) => CellType::Init,
            Cell::Goal(_) => CellType::Goal,
        }
    }

    /// Returns the color occupying this cell, if any.
    pub fn color(&self) -> Option<Color> {
        match *self {
            Cell::Path(c) | Cell::Init(c) | Cell::Goal(c) => Some(c),
            Cell::Free | Cell::Wall => None,
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, Cell::Free)
    }
}

const WORD_BITS: usize = u64::BITS as usize;

/// A set of colors backed by a growable bit vector.
///
/// The set is sized for a fixed number of colors at construction time, so
/// there is no compile-time cap on how many colors a puzzle may have.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct ColorSet {
    words: Vec<u64>,
    capacity: usize,
}

impl ColorSet {
    /// Creates an empty set able to hold colors `0..num_colors`.
    pub fn with_capacity(num_colors: usize) -> Self {
        ColorSet {
            words: vec![0; num_colors.div_ceil(WORD_BITS)],
            capacity: num_colors,
        }
    }

    /// Number of colors this set was sized for.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Adds `color` to the set. Returns `true` if it was not already present.
    ///
    /// # Panics
    /// Panics if `color >= capacity()`.
    pub fn insert(&mut self, color: Color) -> bool {
        assert!(color < self.capacity, "color {} out of range", color);
        let (word, bit) = (color / WORD_BITS, color % WORD_BITS);
        let was_present = self.words[word] & (1 << bit) != 0;
        self.words[word] |= 1 << bit;
        !was_present
    }

    /// Removes `color` from the set. Returns `true` if it was present.
    pub fn remove(&mut self, color: Color) -> bool {
        if color >= self.capacity {
            return false;
        }
        let (word, bit) = (color / WORD_BITS, color % WORD_BITS);
        let was_present = self.words[word] & (1 << bit) != 0;
        self.words[word] &= !(1 << bit);
        was_present
    }

    /// Returns `true` if `color` is in the set. Out-of-range colors are never members.
    pub fn contains(&self, color: Color) -> bool {
        color < self.capacity && self.words[color / WORD_BITS] & (1 << (color % WORD_BITS)) != 0
    }

    /// Number of colors in the set.
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Returns `true` if every color `0..capacity()` is in the set.
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity
    }

    /// Iterates over the members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Color> + '_ {
        (0..self.capacity).filter(move |&c| self.contains(c))
    }
}

/// Static per-color information.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorInfo {
    /// Single-character label used in puzzle files and output.
    pub name: char,
    /// `[init, goal]` endpoint positions.
    pub endpoints: [Pos; 2],
    /// Distance from each endpoint to the nearest board edge.
    pub wall_dist: [usize; 2],
    /// Optional externally supplied branching priority; lower goes first.
    pub user_index: Option<usize>,
}

impl ColorInfo {
    pub fn init_pos(&self) -> Pos {
        self.endpoints[0]
    }

    pub fn goal_pos(&self) -> Pos {
        self.endpoints[1]
    }
}

/// Immutable per-puzzle information shared by every search branch.
///
/// The only field that changes after construction is the branching order,
/// which `heuristics::order_colors` fills in once before the search starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameInfo {
    width: usize,
    height: usize,
    colors: Vec<ColorInfo>,
    color_order: Vec<Color>,
}

impl GameInfo {
    /// Builds the static information for a `width` x `height` board.
    ///
    /// Each entry of `endpoints` is `(name, init, goal)`. Wall distances are
    /// computed here; every color starts without a user priority and the
    /// branching order starts as the identity permutation.
    ///
    /// # Panics
    /// Panics if the board has more cells than a `Pos` can address.
    pub fn new(width: usize, height: usize, endpoints: &[(char, (usize, usize), (usize, usize))]) -> Self {
        assert!(
            width.checked_mul(height).map_or(false, |n| n <= u32::MAX as usize),
            "board of {}x{} cells is too large",
            width,
            height
        );
        let mut info = GameInfo {
            width,
            height,
            colors: Vec::with_capacity(endpoints.len()),
            color_order: (0..endpoints.len()).collect(),
        };
        for &(name, init, goal) in endpoints {
            let color = ColorInfo {
                name,
                endpoints: [info.encode(init.0, init.1), info.encode(goal.0, goal.1)],
                wall_dist: [
                    info.wall_dist(init.0, init.1),
                    info.wall_dist(goal.0, goal.1),
                ],
                user_index: None,
            };
            info.colors.push(color);
        }
        info
    }

    fn encode(&self, x: usize, y: usize) -> Pos {
        Pos((y * self.width + x) as u32)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells on the board.
    pub fn num_cells(&self) -> usize {
        self.width * self.height
    }

    pub fn num_colors(&self) -> usize {
        self.colors.len()
    }

    pub fn colors(&self) -> &[ColorInfo] {
        &self.colors
    }

    /// Returns the static information of `color`.
    ///
    /// # Panics
    /// Panics if `color >= num_colors()`.
    pub fn color(&self, color: Color) -> &ColorInfo {
        &self.colors[color]
    }

    pub fn goal_pos(&self, color: Color) -> Pos {
        self.colors[color].goal_pos()
    }

    /// Label of `color` for display purposes.
    pub fn color_name(&self, color: Color) -> char {
        self.colors[color].name
    }

    /// Looks a color up by its label.
    pub fn color_by_name(&self, name: char) -> Option<Color> {
        self.colors.iter().position(|c| c.name == name)
    }

    /// Sets or clears the branching priority of `color`.
    pub fn set_user_index(&mut self, color: Color, user_index: Option<usize>) {
        self.colors[color].user_index = user_index;
    }

    /// The static color visit order used by the search engine.
    pub fn color_order(&self) -> &[Color] {
        &self.color_order
    }

    /// Replaces the branching order.
    ///
    /// # Panics
    /// Panics if `order` is not a permutation of `0..num_colors()`.
    pub fn set_color_order(&mut self, order: Vec<Color>) {
        let mut seen = ColorSet::with_capacity(self.num_colors());
        assert!(
            order.len() == self.num_colors() && order.iter().all(|&c| c < self.num_colors() && seen.insert(c)),
            "color order {:?} is not a permutation of 0..{}",
            order,
            self.num_colors()
        );
        self.color_order = order;
    }

    /// Encodes `(x, y)` as a position, or `None` if it lies off the board.
    pub fn pos(&self, x: usize, y: usize) -> Option<Pos> {
        (x < self.width && y < self.height).then(|| self.encode(x, y))
    }

    /// Decodes a position into `(x, y)` coordinates.
    pub fn coords(&self, pos: Pos) -> (usize, usize) {
        (pos.index() % self.width, pos.index() / self.width)
    }

    /// Returns the neighbor of `pos` in direction `dir`, or `None` if that
    /// neighbor would be off the board.
    pub fn offset(&self, pos: Pos, dir: Direction) -> Option<Pos> {
        let (x, y) = self.coords(pos);
        let (dx, dy) = dir.delta();
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        self.pos(nx, ny)
    }

    /// Iterates over the on-board orthogonal neighbors of `pos`.
    pub fn neighbors(&self, pos: Pos) -> impl Iterator<Item = Pos> + '_ {
        Direction::ALL.into_iter().filter_map(move |dir| self.offset(pos, dir))
    }

    /// Distance from `(x, y)` to the nearest board edge.
    pub fn wall_dist(&self, x: usize, y: usize) -> usize {
        let dx = x.min(self.width.saturating_sub(1 + x));
        let dy = y.min(self.height.saturating_sub(1 + y));
        dx.min(dy)
    }
}

/// Mutable search state, threaded through (and cloned by) the search engine.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GameState {
    /// Row-major cell contents, indexed by `Pos::index`.
    pub cells: Vec<Cell>,
    /// Current path head of every color.
    pub heads: Vec<Pos>,
    /// Colors whose path already reaches their goal.
    pub completed: ColorSet,
    /// Color extended by the most recent move, `None` before the first move.
    pub last_color: Option<Color>,
}

impl GameState {
    /// Creates the initial state of a puzzle from its cell contents.
    ///
    /// Every path head starts at its color's init endpoint.
    pub fn new(info: &GameInfo, cells: Vec<Cell>) -> Self {
        debug_assert_eq!(cells.len(), info.num_cells());
        GameState {
            cells,
            heads: info.colors().iter().map(ColorInfo::init_pos).collect(),
            completed: ColorSet::with_capacity(info.num_colors()),
            last_color: None,
        }
    }

    pub fn cell(&self, pos: Pos) -> Cell {
        self.cells[pos.index()]
    }

    pub fn cell_type(&self, pos: Pos) -> CellType {
        self.cells[pos.index()].cell_type()
    }

    pub fn head(&self, color: Color) -> Pos {
        self.heads[color]
    }

    pub fn is_completed(&self, color: Color) -> bool {
        self.completed.contains(color)
    }

    /// Number of cells not yet covered by any path.
    pub fn num_free(&self) -> usize {
        self.cells.iter().filter(|c| c.is_free()).count()
    }

    /// Returns the cell `color` would move into when extended in `dir`, or
    /// `None` if the move is illegal.
    ///
    /// A move is legal when the color is not yet complete and the target is
    /// on the board and either free or the color's own goal.
    pub fn move_target(&self, info: &GameInfo, color: Color, dir: Direction) -> Option<Pos> {
        if self.is_completed(color) {
            return None;
        }
        let target = info.offset(self.heads[color], dir)?;
        match self.cell(target) {
            Cell::Free => Some(target),
            Cell::Goal(c) if c == color => Some(target),
            _ => None,
        }
    }

    /// Number of legal moves available to `color`.
    pub fn num_moves(&self, info: &GameInfo, color: Color) -> usize {
        Direction::ALL
            .into_iter()
            .filter(|&dir| self.move_target(info, color, dir).is_some())
            .count()
    }

    /// Extends the path of `color` by one cell in direction `dir`.
    ///
    /// Moving into a free cell turns it into a path segment; moving into the
    /// color's goal marks the color as completed. In both cases the head
    /// advances and `last_color` is set to `color`.
    ///
    /// # Returns
    /// `true` if the move was legal and applied, `false` otherwise (the state
    /// is left untouched).
    pub fn make_move(&mut self, info: &GameInfo, color: Color, dir: Direction) -> bool {
        let Some(target) = self.move_target(info, color, dir) else {
            return false;
        };
        if self.cell(target).is_free() {
            self.cells[target.index()] = Cell::Path(color);
        } else {
            self.completed.insert(color);
        }
        self.heads[color] = target;
        self.last_color = Some(color);
        true
    }

    /// Returns `true` if every color is complete and no free cell remains.
    pub fn is_solved(&self) -> bool {
        self.completed.is_full() && self.num_free() == 0
    }

    /// Wraps the state in a `Display` adapter using the labels from `info`.
    pub fn display<'a>(&'a self, info: &'a GameInfo) -> BoardDisplay<'a> {
        BoardDisplay { info, state: self }
    }
}

/// Text rendering of a `GameState`.
///
/// Endpoints print as their uppercase label, path segments as the lowercase
/// label, free cells as `.` and walls as `#`.
pub struct BoardDisplay<'a> {
    info: &'a GameInfo,
    state: &'a GameState,
}

impl fmt::Display for BoardDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.info.height() {
            if y > 0 {
                writeln!(f)?;
            }
            for x in 0..self.info.width() {
                let pos = self.info.encode(x, y);
                let ch = match self.state.cell(pos) {
                    Cell::Free => '.',
                    Cell::Wall => '#',
                    Cell::Path(c) => self.info.color_name(c).to_ascii_lowercase(),
                    Cell::Init(c) | Cell::Goal(c) => self.info.color_name(c),
                };
                write!(f, "{}", ch)?;
            }
        }
        Ok(())
    }
}
