//! Paylines and win evaluation

use serde::{Deserialize, Serialize};

use crate::config::MathSpec;
use crate::hold::HoldMask;
use crate::symbols::{Cell, Grid, SymbolId};

/// A payline definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payline {
    /// Payline id (0-based)
    pub id: u8,
    /// Row for each reel (e.g. `[0, 1, 2, 1, 0]` for a "V")
    pub rows: Vec<u8>,
}

/// The seven canonical 5×3 row paths
pub const CANONICAL_PAYLINES: [[u8; 5]; 7] = [
    [1, 1, 1, 1, 1], // Middle
    [0, 0, 0, 0, 0], // Top
    [2, 2, 2, 2, 2], // Bottom
    [0, 1, 2, 1, 0], // V
    [2, 1, 0, 1, 2], // Inverted V
    [0, 0, 1, 2, 2], // Step down
    [2, 2, 1, 0, 0], // Step up
];

impl Payline {
    /// Canonical line `id` fitted to a `reels × rows` grid.
    ///
    /// Rows are clamped to the grid height; reels past the fifth repeat the
    /// pattern's last row.
    pub fn canonical(id: u8, reels: usize, rows: usize) -> Self {
        let pattern = &CANONICAL_PAYLINES[id as usize % CANONICAL_PAYLINES.len()];
        let max_row = rows.saturating_sub(1) as u8;
        let rows = (0..reels)
            .map(|reel| pattern[reel.min(pattern.len() - 1)].min(max_row))
            .collect();
        Self { id, rows }
    }
}

/// The first `count` canonical lines for a grid shape.
///
/// On short grids clamping can fold two patterns onto the same path; only
/// the first (lowest id) of identical paths is kept so no cell run pays twice.
pub fn active_paylines(count: u8, reels: usize, rows: usize) -> Vec<Payline> {
    let mut lines: Vec<Payline> = Vec::new();
    for id in 0..count.min(CANONICAL_PAYLINES.len() as u8) {
        let line = Payline::canonical(id, reels, rows);
        if !lines.iter().any(|l| l.rows == line.rows) {
            lines.push(line);
        }
    }
    lines
}

/// Rows on which a leftmost run of three can pay: some active payline
/// stays on that row across the first three reels.
pub fn winnable_rows(count: u8, reels: usize, rows: usize) -> Vec<usize> {
    let span = reels.min(3);
    let mut winnable: Vec<usize> = active_paylines(count, reels, rows)
        .iter()
        .filter(|line| line.rows[..span].iter().all(|&r| r == line.rows[0]))
        .map(|line| line.rows[0] as usize)
        .collect();
    winnable.sort_unstable();
    winnable.dedup();
    winnable
}

/// A win on a single payline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinLine {
    pub payline_id: u8,
    /// Symbol the line paid as
    pub symbol: SymbolId,
    /// Matching cells from the left, capped at 5
    pub match_count: u8,
    /// A wild stood in for `symbol` somewhere on the line
    pub used_wild: bool,
    /// bet × pay, unrounded
    pub amount: f64,
    /// Contributing cells as (reel, row)
    pub cells: Vec<Cell>,
}

/// Complete evaluation of one stopped grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedSpin {
    /// Rounded total in currency units, multiplier applied
    pub total_win: u64,
    pub win_lines: Vec<WinLine>,
    pub scatter_count: usize,
    pub scatter_positions: Vec<Cell>,
    /// Unrounded scatter pay (before the free-spin multiplier)
    pub scatter_win: f64,
    /// Multiplier applied to this evaluation
    pub multiplier: f64,
    /// Reels showing a wild; candidates for holding next spin
    pub held_reels_next: HoldMask,
}

impl EvaluatedSpin {
    /// Check if this is a winning spin
    pub fn is_win(&self) -> bool {
        self.total_win > 0
    }

    /// Win-to-bet ratio
    pub fn win_ratio(&self, bet: u64) -> f64 {
        if bet > 0 {
            self.total_win as f64 / bet as f64
        } else {
            0.0
        }
    }
}

/// Score a grid. Pure: no RNG, same inputs give the same result.
pub fn evaluate(grid: &Grid, bet: u64, spec: &MathSpec, in_free_spins: bool) -> EvaluatedSpin {
    let bet_f = bet as f64;
    let scatter = spec.scatter.symbol;

    let win_lines: Vec<WinLine> = active_paylines(spec.paylines, grid.reels(), grid.rows())
        .iter()
        .filter_map(|line| evaluate_line(grid, line, bet_f, spec))
        .collect();

    let scatter_positions = grid.positions_of(scatter);
    let scatter_count = scatter_positions.len();
    let scatter_win = if spec.scatter.pays_enabled && scatter_count >= 3 {
        bet_f * spec.scatter_pay(scatter_count)
    } else {
        0.0
    };

    let multiplier = if in_free_spins {
        spec.bonus.win_multiplier
    } else {
        1.0
    };
    let line_total: f64 = win_lines.iter().map(|w| w.amount).sum();
    // Round once on the combined total
    let total_win = ((line_total + scatter_win) * multiplier).round().max(0.0) as u64;

    EvaluatedSpin {
        total_win,
        win_lines,
        scatter_count,
        scatter_positions,
        scatter_win,
        multiplier,
        held_reels_next: HoldMask::from_wilds(grid),
    }
}

fn evaluate_line(grid: &Grid, line: &Payline, bet: f64, spec: &MathSpec) -> Option<WinLine> {
    let symbols: Vec<SymbolId> = line
        .rows
        .iter()
        .enumerate()
        .map(|(reel, &row)| grid.get(reel, row as usize))
        .collect();

    let first = *symbols.first()?;
    if first.is_scatter() {
        return None;
    }

    // Base symbol: first non-wild before any scatter, else the wild itself
    let base = symbols
        .iter()
        .copied()
        .take_while(|s| !s.is_scatter())
        .find(|s| !s.is_wild())
        .unwrap_or(SymbolId::Wild);
    if base.is_wild() && !spec.wild_pays_itself {
        return None;
    }

    let substitutes = !base.is_wild() && spec.wild_substitutes;
    let mut cells = Vec::new();
    let mut used_wild = false;
    for (reel, &symbol) in symbols.iter().enumerate() {
        if symbol.is_scatter() {
            break;
        }
        if symbol == base {
            cells.push((reel as u8, line.rows[reel]));
        } else if substitutes && symbol.is_wild() {
            used_wild = true;
            cells.push((reel as u8, line.rows[reel]));
        } else {
            break;
        }
    }

    let count = cells.len();
    if count < 3 {
        return None;
    }
    let pay = spec.line_pay(base, count);
    if pay <= 0.0 {
        return None;
    }

    Some(WinLine {
        payline_id: line.id,
        symbol: base,
        match_count: count.min(5) as u8,
        used_wild,
        amount: bet * pay,
        cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawConfig;
    use crate::symbols::SymbolId::*;

    /// Build a grid from row-major rows (as it reads on screen)
    fn grid_from_rows(rows: &[[SymbolId; 5]]) -> Grid {
        let columns: Vec<Vec<SymbolId>> = (0..5)
            .map(|reel| rows.iter().map(|row| row[reel]).collect())
            .collect();
        Grid::from_columns(columns).unwrap()
    }

    #[test]
    fn test_canonical_shapes() {
        assert_eq!(Payline::canonical(3, 5, 3).rows, vec![0, 1, 2, 1, 0]);
        // Short grid clamps rows
        assert_eq!(Payline::canonical(2, 5, 2).rows, vec![1, 1, 1, 1, 1]);
        // Wide grid repeats the last row
        assert_eq!(Payline::canonical(5, 7, 3).rows, vec![0, 0, 1, 2, 2, 2, 2]);
        assert_eq!(active_paylines(9, 5, 3).len(), 7);
    }

    #[test]
    fn test_single_row_grid_pays_once() {
        let spec = MathSpec::resolve(&RawConfig::new().with("rows", 1i64));
        assert_eq!(active_paylines(spec.paylines, 5, 1).len(), 1);

        let grid = Grid::filled(5, 1, Ace);
        let result = evaluate(&grid, 10, &spec, false);
        assert_eq!(result.win_lines.len(), 1);
        assert_eq!(result.total_win, (10.0 * spec.line_pay(Ace, 5)).round() as u64);
    }

    #[test]
    fn test_two_row_grid_has_no_duplicate_lines() {
        let spec = MathSpec::resolve(&RawConfig::new().with("rows", 2i64));
        let lines = active_paylines(spec.paylines, 5, 2);
        assert_eq!(lines.len(), 6);
        for (i, a) in lines.iter().enumerate() {
            assert!(lines[i + 1..].iter().all(|b| b.rows != a.rows));
        }

        let result = evaluate(&Grid::filled(5, 2, Ace), 10, &spec, false);
        let mut paths: Vec<_> = result.win_lines.iter().map(|w| w.cells.clone()).collect();
        let paid = paths.len();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), paid);
    }

    #[test]
    fn test_winnable_rows() {
        assert_eq!(winnable_rows(7, 5, 3), vec![0, 1, 2]);
        assert_eq!(winnable_rows(7, 5, 1), vec![0]);
        assert_eq!(winnable_rows(7, 5, 2), vec![0, 1]);
        // Row 3 of a four-row grid sits on no payline
        assert_eq!(winnable_rows(7, 5, 4), vec![0, 1, 2]);
        assert_eq!(winnable_rows(1, 5, 3), vec![1]);
    }

    #[test]
    fn test_five_of_a_kind_middle() {
        let spec = MathSpec::default();
        let grid = grid_from_rows(&[
            [King, Queen, Jack, Ten, Nine],
            [Ace, Ace, Ace, Ace, Ace],
            [Nine, Ten, Jack, Queen, King],
        ]);
        let result = evaluate(&grid, 10, &spec, false);

        let middle = result.win_lines.iter().find(|w| w.payline_id == 0).unwrap();
        assert_eq!(middle.symbol, Ace);
        assert_eq!(middle.match_count, 5);
        assert!(!middle.used_wild);
        assert_eq!(middle.amount, 10.0 * spec.line_pay(Ace, 5));
        assert_eq!(middle.cells, vec![(0, 1), (1, 1), (2, 1), (3, 1), (4, 1)]);
    }

    #[test]
    fn test_scatter_leftmost_never_wins() {
        let spec = MathSpec::default();
        let grid = grid_from_rows(&[
            [Nine, Ten, Jack, Queen, King],
            [Scatter, Ace, Ace, Ace, Ace],
            [Ten, Jack, Queen, King, Nine],
        ]);
        let result = evaluate(&grid, 10, &spec, false);
        assert!(result.win_lines.iter().all(|w| w.payline_id != 0));
    }

    #[test]
    fn test_scatter_breaks_scan() {
        let spec = MathSpec::default();
        let grid = grid_from_rows(&[
            [Nine, Ten, Jack, Queen, King],
            [Ace, Ace, Scatter, Ace, Ace],
            [Ten, Jack, Queen, King, Nine],
        ]);
        let result = evaluate(&grid, 10, &spec, false);
        assert!(result.win_lines.is_empty());
        assert_eq!(result.scatter_count, 1);
    }

    #[test]
    fn test_wild_substitution() {
        let spec = MathSpec::default();
        let grid = grid_from_rows(&[
            [Nine, Ten, Jack, Queen, King],
            [Wild, King, Wild, King, Nine],
            [Ten, Jack, Queen, King, Nine],
        ]);
        let result = evaluate(&grid, 10, &spec, false);
        let middle = result.win_lines.iter().find(|w| w.payline_id == 0).unwrap();

        assert_eq!(middle.symbol, King);
        assert_eq!(middle.match_count, 4);
        assert!(middle.used_wild);
    }

    #[test]
    fn test_wild_substitution_disabled() {
        let spec = MathSpec::resolve(&RawConfig::new().with("wild_substitutes", false));
        let grid = grid_from_rows(&[
            [Nine, Ten, Jack, Queen, King],
            [King, King, Wild, King, Nine],
            [Ten, Jack, Queen, King, Nine],
        ]);
        let result = evaluate(&grid, 10, &spec, false);
        assert!(result.win_lines.iter().all(|w| w.payline_id != 0));
    }

    #[test]
    fn test_all_wild_line() {
        let grid = grid_from_rows(&[
            [Nine, Ten, Jack, Queen, King],
            [Wild, Wild, Wild, Scatter, Ace],
            [Ten, Jack, Queen, King, Nine],
        ]);

        let skipped = evaluate(&grid, 10, &MathSpec::default(), false);
        assert!(skipped.win_lines.iter().all(|w| w.payline_id != 0));

        let spec = MathSpec::resolve(&RawConfig::new().with("wild_pays_itself", true));
        let paid = evaluate(&grid, 10, &spec, false);
        let middle = paid.win_lines.iter().find(|w| w.payline_id == 0).unwrap();
        assert_eq!(middle.symbol, Wild);
        assert_eq!(middle.match_count, 3);
        assert!(!middle.used_wild);
    }

    #[test]
    fn test_zero_pay_not_recorded() {
        let spec = MathSpec::resolve(&RawConfig::new().with("pay.ace.3", 0i64));
        let grid = grid_from_rows(&[
            [Nine, Ten, Jack, Queen, King],
            [Ace, Ace, Ace, Queen, Nine],
            [Ten, Jack, Queen, King, Nine],
        ]);
        assert!(evaluate(&grid, 10, &spec, false).win_lines.is_empty());
    }

    #[test]
    fn test_scatter_pay_and_multiplier() {
        let spec = MathSpec::default();
        let grid = grid_from_rows(&[
            [Scatter, Ten, Jack, Queen, King],
            [Nine, Ten, Scatter, Queen, King],
            [Ten, Jack, Queen, King, Scatter],
        ]);

        let base = evaluate(&grid, 10, &spec, false);
        assert_eq!(base.scatter_count, 3);
        assert_eq!(base.scatter_positions, vec![(0, 0), (2, 1), (4, 2)]);
        assert_eq!(base.scatter_win, 10.0 * spec.scatter_pay(3));
        assert_eq!(base.total_win, 20);

        let free = evaluate(&grid, 10, &spec, true);
        assert_eq!(free.total_win, 40);
    }

    #[test]
    fn test_single_rounding_on_total() {
        // Two 0.3 × 5 lines: 1.5 + 1.5 = 3; per-line rounding would give 4
        let spec = MathSpec::resolve(&RawConfig::new().with("paylines", 3i64));
        let grid = grid_from_rows(&[
            [Jack, Jack, Jack, Nine, Ten],
            [Queen, Queen, Queen, Ten, Nine],
            [Nine, Ten, Nine, Ten, Nine],
        ]);
        let result = evaluate(&grid, 5, &spec, false);
        assert_eq!(result.win_lines.len(), 2);
        assert_eq!(result.total_win, 3);
    }

    #[test]
    fn test_hold_mask_from_any_wild() {
        let spec = MathSpec::default();
        let grid = grid_from_rows(&[
            [Nine, Ten, Jack, Queen, Wild],
            [Ten, Jack, Queen, King, Nine],
            [Wild, Jack, Queen, King, Nine],
        ]);
        let result = evaluate(&grid, 10, &spec, false);
        assert_eq!(
            result.held_reels_next.as_slice(),
            &[true, false, false, false, true]
        );
    }

    #[test]
    fn test_evaluation_idempotent() {
        let spec = MathSpec::default();
        let grid = grid_from_rows(&[
            [Wild, Ten, Jack, Scatter, King],
            [Ace, Wild, Ace, King, Nine],
            [Scatter, Jack, Queen, King, Scatter],
        ]);
        assert_eq!(
            evaluate(&grid, 25, &spec, true),
            evaluate(&grid, 25, &spec, true)
        );
    }
}
