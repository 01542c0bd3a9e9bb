//! Weighted grid generator with hit-rate and bonus-frequency bias passes

use crate::config::MathSpec;
use crate::paytable::winnable_rows;
use crate::rng::RandomSource;
use crate::symbols::{Grid, SymbolId};

/// Draws allowed when picking a symbol that satisfies a constraint
const SYMBOL_DRAW_ATTEMPTS: usize = 10;

/// Cell picks allowed per scatter bias pass
const SCATTER_PASS_BUDGET: usize = 200;

/// A freshly generated grid and the bias decisions behind it
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedGrid {
    pub grid: Grid,
    /// A win line was injected
    pub forced_win: bool,
    /// Scatters were planted up to the bonus trigger count
    pub forced_scatter: bool,
}

/// Generate a `reels × rows` grid from `spec`.
///
/// RNG draw order is fixed: scatter decision, win decision, one draw per
/// cell (reel-major), then whatever the bias passes consume.
pub fn generate(
    rng: &mut dyn RandomSource,
    spec: &MathSpec,
    reels: usize,
    rows: usize,
) -> GeneratedGrid {
    let forced_scatter = rng.next_unit() < spec.bonus_frequency || spec.qa.force_bonus;
    let forced_win = rng.next_unit() < spec.hit_rate || spec.qa.force_win;

    let columns: Vec<Vec<SymbolId>> = (0..reels)
        .map(|_| (0..rows).map(|_| sample_symbol(rng, spec)).collect::<Vec<_>>())
        .collect();
    let mut grid = Grid::from_columns(columns)
        .unwrap_or_else(|| Grid::filled(reels.max(1), rows.max(1), SymbolId::Nine));

    if let Some(symbol) = spec.qa.force_symbol {
        log::debug!("qa: forcing every cell to {symbol}");
        grid = Grid::filled(grid.reels(), grid.rows(), symbol);
        return GeneratedGrid {
            grid,
            forced_win,
            forced_scatter,
        };
    }

    let line_rows = winnable_rows(spec.paylines, grid.reels(), grid.rows());
    if forced_win {
        inject_win_line(rng, spec, &mut grid, &line_rows);
    } else {
        break_accidental_runs(rng, spec, &mut grid, &line_rows);
    }

    if forced_scatter {
        plant_scatters(rng, spec, &mut grid);
    } else {
        suppress_scatters(rng, spec, &mut grid);
    }

    GeneratedGrid {
        grid,
        forced_win,
        forced_scatter,
    }
}

/// Roulette-wheel sample over the weight table in declaration order.
///
/// Zero-weight symbols can never be chosen; if floating error runs the
/// wheel past its end the last positive-weight symbol is returned.
pub fn sample_symbol(rng: &mut dyn RandomSource, spec: &MathSpec) -> SymbolId {
    let mut remaining = rng.next_unit() * spec.total_weight();
    let mut last = SymbolId::Nine;
    for symbol in SymbolId::ALL {
        let weight = spec.weight(symbol);
        if weight <= 0.0 {
            continue;
        }
        last = symbol;
        remaining -= weight;
        if remaining <= 0.0 {
            return symbol;
        }
    }
    last
}

/// Weighted draw restricted to symbols matching `accept`, with a bounded
/// number of redraws and a deterministic regular-symbol fallback.
fn sample_where(
    rng: &mut dyn RandomSource,
    spec: &MathSpec,
    accept: impl Fn(SymbolId) -> bool,
) -> SymbolId {
    for _ in 0..SYMBOL_DRAW_ATTEMPTS {
        let symbol = sample_symbol(rng, spec);
        if accept(symbol) {
            return symbol;
        }
    }
    SymbolId::REGULAR
        .iter()
        .copied()
        .filter(|&s| accept(s))
        .max_by(|a, b| spec.weight(*a).total_cmp(&spec.weight(*b)))
        .unwrap_or(SymbolId::Nine)
}

/// Overwrite the leftmost 3/4/5 cells of one payline row with a regular
/// symbol. Accidental wins elsewhere on the grid are left as they are.
fn inject_win_line(
    rng: &mut dyn RandomSource,
    spec: &MathSpec,
    grid: &mut Grid,
    line_rows: &[usize],
) {
    let row = match line_rows {
        [] => rng.next_index(grid.rows()),
        rows => rows[rng.next_index(rows.len())],
    };
    let roll = rng.next_unit();
    let count = if roll < 0.82 {
        3
    } else if roll < 0.98 {
        4
    } else {
        5
    };
    let count = count.min(grid.reels());
    let symbol = sample_where(rng, spec, |s| !s.is_special());

    for reel in 0..count {
        grid.set(reel, row, symbol);
    }
    log::debug!("forced win: {count}x {symbol} on row {row}");
}

/// Break any payline row whose first three reels hold the same non-scatter
/// symbol. The replacement is never wild, which would keep the run paying.
fn break_accidental_runs(
    rng: &mut dyn RandomSource,
    spec: &MathSpec,
    grid: &mut Grid,
    line_rows: &[usize],
) {
    if grid.reels() < 3 {
        return;
    }
    for &row in line_rows {
        let first = grid.get(0, row);
        if first.is_scatter() || grid.get(1, row) != first || grid.get(2, row) != first {
            continue;
        }
        let replacement = sample_where(rng, spec, |s| !s.is_special() && s != first);
        grid.set(2, row, replacement);
        log::trace!("broke accidental {first} run on row {row}");
    }
}

/// Convert random cells to scatter until the trigger count is reached
fn plant_scatters(rng: &mut dyn RandomSource, spec: &MathSpec, grid: &mut Grid) {
    let scatter = spec.scatter.symbol;
    let target = spec.bonus.trigger_count as usize;
    let mut count = grid.count(scatter);

    let mut attempts = 0;
    while count < target && attempts < SCATTER_PASS_BUDGET {
        attempts += 1;
        let reel = rng.next_index(grid.reels());
        let row = rng.next_index(grid.rows());
        if grid.get(reel, row) != scatter {
            grid.set(reel, row, scatter);
            count += 1;
        }
    }
    if count < target {
        log::debug!("scatter plant budget exhausted at {count}/{target}");
    }
}

/// Remove chance scatters until the count is below the trigger threshold
fn suppress_scatters(rng: &mut dyn RandomSource, spec: &MathSpec, grid: &mut Grid) {
    let scatter = spec.scatter.symbol;
    let threshold = spec.bonus.trigger_count as usize;

    let mut attempts = 0;
    loop {
        let positions = grid.positions_of(scatter);
        if positions.len() < threshold || attempts >= SCATTER_PASS_BUDGET {
            break;
        }
        attempts += 1;
        let (reel, row) = positions[rng.next_index(positions.len())];
        let replacement = sample_where(rng, spec, |s| s != scatter);
        grid.set(reel as usize, row as usize, replacement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawConfig;
    use crate::paytable::evaluate;
    use crate::rng::{ScriptedRng, SessionRng};

    fn spec_with(raw: RawConfig) -> MathSpec {
        MathSpec::resolve(&raw)
    }

    #[test]
    fn test_sampling_converges_to_weights() {
        let spec = MathSpec::default();
        let mut rng = SessionRng::new(2024);
        let n = 200_000;
        let mut counts = [0usize; SymbolId::COUNT];
        for _ in 0..n {
            counts[sample_symbol(&mut rng, &spec).index()] += 1;
        }

        let total = spec.total_weight();
        for symbol in SymbolId::ALL {
            let expected = spec.weight(symbol) / total;
            let observed = counts[symbol.index()] as f64 / n as f64;
            assert!(
                (observed - expected).abs() < 0.01,
                "{symbol}: observed {observed}, expected {expected}"
            );
        }
    }

    #[test]
    fn test_zero_weight_never_sampled() {
        let spec = spec_with(RawConfig::new().with("excluded_symbols", "nine"));
        let mut rng = ScriptedRng::new(vec![0.0]);
        assert_ne!(sample_symbol(&mut rng, &spec), SymbolId::Nine);
    }

    #[test]
    fn test_roulette_edges() {
        let spec = MathSpec::default();
        let mut low = ScriptedRng::new(vec![0.0]);
        assert_eq!(sample_symbol(&mut low, &spec), SymbolId::Nine);
        let mut high = ScriptedRng::new(vec![0.999_999_999]);
        assert_eq!(sample_symbol(&mut high, &spec), SymbolId::Scatter);
    }

    #[test]
    fn test_force_symbol_overrides_everything() {
        let spec = spec_with(
            RawConfig::new()
                .with("qa_force_symbol", "ace")
                .with("qa_force_win", true)
                .with("qa_force_bonus", true),
        );
        let mut rng = SessionRng::new(5);
        let generated = generate(&mut rng, &spec, 5, 3);

        assert_eq!(generated.grid.count(SymbolId::Ace), 15);
        assert!(generated.forced_win);
        assert!(generated.forced_scatter);
    }

    #[test]
    fn test_forced_win_injects_leftmost_run() {
        let spec = spec_with(
            RawConfig::new()
                .with("qa_force_win", true)
                .with("bonus_frequency", 0i64),
        );
        let mut rng = SessionRng::new(99);
        for _ in 0..200 {
            let generated = generate(&mut rng, &spec, 5, 3);
            assert!(generated.forced_win);
            let grid = &generated.grid;
            let has_run = (0..3).any(|row| {
                let first = grid.get(0, row);
                !first.is_special() && grid.get(1, row) == first && grid.get(2, row) == first
            });
            assert!(has_run, "no injected run:\n{}", grid.render());
        }
    }

    #[test]
    fn test_no_forced_win_breaks_runs() {
        let spec = spec_with(
            RawConfig::new()
                .with("hit_rate", 0i64)
                .with("bonus_frequency", 0i64)
                .with("weight.scatter", 0i64),
        );
        let mut rng = SessionRng::new(31337);
        for _ in 0..500 {
            let generated = generate(&mut rng, &spec, 5, 3);
            assert!(!generated.forced_win);
            let grid = &generated.grid;
            for row in 0..3 {
                let first = grid.get(0, row);
                if first.is_scatter() {
                    continue;
                }
                assert!(
                    !(grid.get(1, row) == first && grid.get(2, row) == first),
                    "unbroken run on row {row}:\n{}",
                    grid.render()
                );
            }
        }
    }

    #[test]
    fn test_forced_scatter_reaches_trigger() {
        let spec = spec_with(RawConfig::new().with("qa_force_bonus", true));
        let mut rng = SessionRng::new(8);
        for _ in 0..100 {
            let generated = generate(&mut rng, &spec, 5, 3);
            assert!(generated.grid.count(SymbolId::Scatter) >= 3);
        }
    }

    #[test]
    fn test_unforced_scatter_stays_below_trigger() {
        let spec = spec_with(
            RawConfig::new()
                .with("bonus_frequency", 0i64)
                .with("weight.scatter", 500i64),
        );
        let mut rng = SessionRng::new(17);
        for _ in 0..100 {
            let generated = generate(&mut rng, &spec, 5, 3);
            assert!(generated.grid.count(SymbolId::Scatter) < 3);
        }
    }

    #[test]
    fn test_unreachable_trigger_accepted() {
        let spec = spec_with(
            RawConfig::new()
                .with("qa_force_bonus", true)
                .with("bonus_trigger_count", 40i64),
        );
        let mut rng = SessionRng::new(3);
        let generated = generate(&mut rng, &spec, 5, 3);
        assert!(generated.grid.count(SymbolId::Scatter) >= 10);
    }

    #[test]
    fn test_decision_draws_precede_cells() {
        // Scatter decision reads 0.9 (miss), win decision reads 0.1 (hit)
        let spec = spec_with(
            RawConfig::new()
                .with("bonus_frequency", 0.5)
                .with("hit_rate", 0.5)
                .with("qa_force_symbol", "king"),
        );
        let mut rng = ScriptedRng::new(vec![0.9, 0.1, 0.5]);
        let generated = generate(&mut rng, &spec, 5, 3);

        assert!(!generated.forced_scatter);
        assert!(generated.forced_win);
        assert_eq!(rng.draws(), 2 + 15);
    }

    #[test]
    fn test_forced_win_pays_on_tall_grid() {
        let spec = spec_with(
            RawConfig::new()
                .with("rows", 4i64)
                .with("qa_force_win", true)
                .with("bonus_frequency", 0i64)
                .with("weight.scatter", 0i64),
        );
        let mut rng = SessionRng::new(404);
        for _ in 0..500 {
            let generated = generate(&mut rng, &spec, 5, 4);
            let result = evaluate(&generated.grid, 10, &spec, false);
            assert!(
                !result.win_lines.is_empty(),
                "forced win on no payline:\n{}",
                generated.grid.render()
            );
        }
    }

    #[test]
    fn test_forced_win_on_short_grids() {
        for rows in [1usize, 2] {
            let spec = spec_with(
                RawConfig::new()
                    .with("rows", rows as i64)
                    .with("qa_force_win", true)
                    .with("bonus_frequency", 0i64)
                    .with("weight.scatter", 0i64),
            );
            let mut rng = SessionRng::new(rows as u64);
            for _ in 0..200 {
                let generated = generate(&mut rng, &spec, 5, rows);
                assert!(!evaluate(&generated.grid, 10, &spec, false).win_lines.is_empty());
            }
        }
    }

    #[test]
    fn test_run_break_never_uses_wild() {
        // 0.9654 lands in the wild slice of the default wheel (124..127 of 130)
        let spec = MathSpec::default();
        let columns: Vec<Vec<SymbolId>> = vec![
            vec![SymbolId::Ace, SymbolId::Nine, SymbolId::Jack],
            vec![SymbolId::Ace, SymbolId::Ten, SymbolId::Queen],
            vec![SymbolId::Ace, SymbolId::Bell, SymbolId::Bar],
            vec![SymbolId::King, SymbolId::King, SymbolId::King],
            vec![SymbolId::Seven, SymbolId::Seven, SymbolId::Seven],
        ];
        let mut grid = Grid::from_columns(columns).unwrap();
        let mut rng = ScriptedRng::new(vec![0.9654]);
        assert_eq!(sample_symbol(&mut rng, &spec), SymbolId::Wild);

        break_accidental_runs(&mut rng, &spec, &mut grid, &[0, 1, 2]);

        let replacement = grid.get(2, 0);
        assert_ne!(replacement, SymbolId::Wild);
        assert_ne!(replacement, SymbolId::Ace);
        assert!(!replacement.is_special());
        assert_eq!(grid.get(2, 1), SymbolId::Bell);
    }

    #[test]
    fn test_same_seed_same_grid() {
        let spec = MathSpec::default();
        let mut a = SessionRng::new(1234);
        let mut b = SessionRng::new(1234);
        for _ in 0..50 {
            assert_eq!(generate(&mut a, &spec, 5, 3), generate(&mut b, &spec, 5, 3));
        }
    }
}
