use crate::engine::{Cell, Color, GameInfo, GameState};
use thiserror::Error;

/// Errors produced while loading a puzzle or an order hint.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PuzzleError {
    /// The puzzle has no rows, or its rows have no cells.
    #[error("puzzle is empty")]
    Empty,
    /// A row has a different number of cells than the first row.
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
    /// A character is neither `.`, `#` nor an ASCII alphanumeric color label.
    #[error("unrecognized character '{ch}' in row {row} col {col}")]
    UnknownChar { ch: char, row: usize, col: usize },
    /// A color label does not appear exactly twice.
    #[error("color '{name}' has {count} endpoints, expected 2")]
    EndpointCount { name: char, count: usize },
    /// An order hint mentions a color the puzzle does not have.
    #[error("order hint names unknown color '{0}'")]
    UnknownHintColor(char),
    /// An order hint mentions the same color twice.
    #[error("order hint names color '{0}' more than once")]
    DuplicateHintColor(char),
}

/// Parses a puzzle given as one string slice per row.
///
/// Valid characters are:
/// - '.': a free cell
/// - '#': a wall
/// - any ASCII letter or digit: an endpoint of the color with that label
///
/// Every label must appear exactly twice. Colors are numbered in order of
/// first appearance (row by row, left to right); the first occurrence is the
/// color's init endpoint and the second its goal.
///
/// # Arguments
/// * `rows`: The rows of the board, top to bottom. All rows must have the same length.
///
/// # Returns
/// * `Ok((GameInfo, GameState))` with the static puzzle information and the
///   initial search state.
/// * `Err(PuzzleError)` if the board is empty or ragged, contains an unknown
///   character, or a label does not appear exactly twice.
///
/// # Examples
/// ```
/// use flow_solver::utils::puzzle_from_str_array;
///
/// let (info, state) = puzzle_from_str_array(&["R.B", "...", "R.B"]).unwrap();
/// assert_eq!(info.num_colors(), 2);
/// assert_eq!(info.color_name(1), 'B');
/// assert_eq!(state.num_free(), 5);
///
/// assert!(puzzle_from_str_array(&["R.R", ".."]).is_err());
/// assert!(puzzle_from_str_array(&["R.R", "..?"]).is_err());
/// ```
pub fn puzzle_from_str_array(rows: &[&str]) -> Result<(GameInfo, GameState), PuzzleError> {
    let width = rows.first().map_or(0, |r| r.chars().count());
    if width == 0 {
        return Err(PuzzleError::Empty);
    }
    let height = rows.len();

    // (label, occurrences in reading order)
    let mut labels: Vec<(char, Vec<(usize, usize)>)> = Vec::new();
    let mut kinds = Vec::with_capacity(width * height);

    for (y, row) in rows.iter().enumerate() {
        let found = row.chars().count();
        if found != width {
            return Err(PuzzleError::RaggedRow {
                row: y,
                found,
                expected: width,
            });
        }
        for (x, ch) in row.chars().enumerate() {
            let kind = match ch {
                '.' => Cell::Free,
                '#' => Cell::Wall,
                c if c.is_ascii_alphanumeric() => {
                    let color = match labels.iter().position(|(name, _)| *name == c) {
                        Some(color) => color,
                        None => {
                            labels.push((c, Vec::new()));
                            labels.len() - 1
                        }
                    };
                    labels[color].1.push((x, y));
                    // Placeholder; init/goal is decided once all occurrences are known.
                    Cell::Path(color)
                }
                _ => return Err(PuzzleError::UnknownChar { ch, row: y, col: x }),
            };
            kinds.push(kind);
        }
    }

    let mut endpoints = Vec::with_capacity(labels.len());
    for (name, occurrences) in &labels {
        if occurrences.len() != 2 {
            return Err(PuzzleError::EndpointCount {
                name: *name,
                count: occurrences.len(),
            });
        }
        endpoints.push((*name, occurrences[0], occurrences[1]));
    }

    let info = GameInfo::new(width, height, &endpoints);
    let cells = kinds
        .into_iter()
        .enumerate()
        .map(|(index, kind)| match kind {
            Cell::Path(color) if info.color(color).init_pos().index() == index => Cell::Init(color),
            Cell::Path(color) => Cell::Goal(color),
            other => other,
        })
        .collect();
    let state = GameState::new(&info, cells);
    Ok((info, state))
}

/// Parses a puzzle from text, one row per line.
///
/// Surrounding whitespace on each line is ignored, as are blank lines.
/// See `puzzle_from_str_array` for the cell format.
pub fn puzzle_from_str(text: &str) -> Result<(GameInfo, GameState), PuzzleError> {
    let rows: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    puzzle_from_str_array(&rows)
}

/// Assigns branching priorities from an order hint.
///
/// Each character of `hint` names a color; the first named color gets
/// priority 0, the next 1, and so on. Colors not named keep no priority and
/// are ordered after all named ones by `heuristics::order_colors`.
///
/// # Returns
/// `Err(PuzzleError)` if the hint names an unknown color or repeats one. In
/// that case `info` is left unchanged.
pub fn apply_order_hint(info: &mut GameInfo, hint: &str) -> Result<(), PuzzleError> {
    let mut named: Vec<Color> = Vec::new();
    for ch in hint.chars() {
        let color = info
            .color_by_name(ch)
            .ok_or(PuzzleError::UnknownHintColor(ch))?;
        if named.contains(&color) {
            return Err(PuzzleError::DuplicateHintColor(ch));
        }
        named.push(color);
    }
    for (priority, &color) in named.iter().enumerate() {
        info.set_user_index(color, Some(priority));
    }
    Ok(())
}
