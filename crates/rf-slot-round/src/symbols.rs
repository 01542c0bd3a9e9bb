//! Symbol definitions and the reel grid

use serde::{Deserialize, Serialize};

/// Reel symbol identifier
///
/// Ten regular paying symbols (lowest to highest), plus the two specials.
/// Declaration order is the sampling order used by the weighted generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SymbolId {
    Nine = 0,
    Ten = 1,
    Jack = 2,
    Queen = 3,
    King = 4,
    Ace = 5,
    Bell = 6,
    Bar = 7,
    Seven = 8,
    Diamond = 9,
    /// Substitutes for regular symbols on paylines
    Wild = 10,
    /// Pays anywhere, triggers the bonus
    Scatter = 11,
}

impl SymbolId {
    /// Number of symbols in the closed set
    pub const COUNT: usize = 12;

    /// Every symbol in declaration order
    pub const ALL: [SymbolId; Self::COUNT] = [
        SymbolId::Nine,
        SymbolId::Ten,
        SymbolId::Jack,
        SymbolId::Queen,
        SymbolId::King,
        SymbolId::Ace,
        SymbolId::Bell,
        SymbolId::Bar,
        SymbolId::Seven,
        SymbolId::Diamond,
        SymbolId::Wild,
        SymbolId::Scatter,
    ];

    /// Regular (line paying, substitutable) symbols
    pub const REGULAR: [SymbolId; 10] = [
        SymbolId::Nine,
        SymbolId::Ten,
        SymbolId::Jack,
        SymbolId::Queen,
        SymbolId::King,
        SymbolId::Ace,
        SymbolId::Bell,
        SymbolId::Bar,
        SymbolId::Seven,
        SymbolId::Diamond,
    ];

    /// Dense index, usable for per-symbol tables
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_wild(self) -> bool {
        self == SymbolId::Wild
    }

    pub fn is_scatter(self) -> bool {
        self == SymbolId::Scatter
    }

    /// Check if this is a special symbol (wild or scatter)
    pub fn is_special(self) -> bool {
        self.is_wild() || self.is_scatter()
    }

    /// Canonical config key fragment (e.g. `weight.ace`)
    pub fn key(self) -> &'static str {
        match self {
            SymbolId::Nine => "nine",
            SymbolId::Ten => "ten",
            SymbolId::Jack => "jack",
            SymbolId::Queen => "queen",
            SymbolId::King => "king",
            SymbolId::Ace => "ace",
            SymbolId::Bell => "bell",
            SymbolId::Bar => "bar",
            SymbolId::Seven => "seven",
            SymbolId::Diamond => "diamond",
            SymbolId::Wild => "wild",
            SymbolId::Scatter => "scatter",
        }
    }

    /// Short glyph used in grid dumps
    pub fn glyph(self) -> &'static str {
        match self {
            SymbolId::Nine => "9",
            SymbolId::Ten => "T",
            SymbolId::Jack => "J",
            SymbolId::Queen => "Q",
            SymbolId::King => "K",
            SymbolId::Ace => "A",
            SymbolId::Bell => "BL",
            SymbolId::Bar => "BR",
            SymbolId::Seven => "7",
            SymbolId::Diamond => "D",
            SymbolId::Wild => "W",
            SymbolId::Scatter => "S",
        }
    }

    /// Resolve a config token through the alias table (case-insensitive).
    ///
    /// `joker` (wild) and `bonus` / `star` (scatter) are deprecated names
    /// still accepted from older configs.
    pub fn from_alias(token: &str) -> Option<SymbolId> {
        let token = token.trim().to_ascii_lowercase();
        let symbol = match token.as_str() {
            "9" | "nine" => SymbolId::Nine,
            "10" | "t" | "ten" => SymbolId::Ten,
            "j" | "jack" => SymbolId::Jack,
            "q" | "queen" => SymbolId::Queen,
            "k" | "king" => SymbolId::King,
            "a" | "ace" => SymbolId::Ace,
            "bl" | "bell" => SymbolId::Bell,
            "br" | "bar" => SymbolId::Bar,
            "7" | "seven" => SymbolId::Seven,
            "d" | "diamond" => SymbolId::Diamond,
            "w" | "wild" | "joker" => SymbolId::Wild,
            "s" | "scatter" | "bonus" | "star" => SymbolId::Scatter,
            _ => return None,
        };
        Some(symbol)
    }
}

impl std::fmt::Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.glyph())
    }
}

/// A cell coordinate on the grid: (reel, row)
pub type Cell = (u8, u8);

/// Rectangular symbol grid indexed `[reel][row]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    columns: Vec<Vec<SymbolId>>,
}

impl Grid {
    /// Create a grid filled with a single symbol
    pub fn filled(reels: usize, rows: usize, symbol: SymbolId) -> Self {
        Self {
            columns: vec![vec![symbol; rows]; reels],
        }
    }

    /// Build from explicit columns. Returns `None` for ragged or empty input.
    pub fn from_columns(columns: Vec<Vec<SymbolId>>) -> Option<Self> {
        let rows = columns.first()?.len();
        if rows == 0 || columns.iter().any(|c| c.len() != rows) {
            return None;
        }
        Some(Self { columns })
    }

    pub fn reels(&self) -> usize {
        self.columns.len()
    }

    pub fn rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Symbol at (reel, row)
    ///
    /// Panics when out of bounds; callers iterate within `reels()`/`rows()`.
    pub fn get(&self, reel: usize, row: usize) -> SymbolId {
        self.columns[reel][row]
    }

    pub fn set(&mut self, reel: usize, row: usize, symbol: SymbolId) {
        self.columns[reel][row] = symbol;
    }

    /// One reel, top to bottom
    pub fn column(&self, reel: usize) -> &[SymbolId] {
        &self.columns[reel]
    }

    /// Replace a whole reel with a copy of `column`
    pub fn set_column(&mut self, reel: usize, column: &[SymbolId]) {
        self.columns[reel].clear();
        self.columns[reel].extend_from_slice(column);
    }

    pub fn columns(&self) -> &[Vec<SymbolId>] {
        &self.columns
    }

    /// Iterate every cell as ((reel, row), symbol)
    pub fn cells(&self) -> impl Iterator<Item = (Cell, SymbolId)> + '_ {
        self.columns.iter().enumerate().flat_map(|(reel, column)| {
            column
                .iter()
                .enumerate()
                .map(move |(row, &symbol)| ((reel as u8, row as u8), symbol))
        })
    }

    /// Count cells equal to `symbol`
    pub fn count(&self, symbol: SymbolId) -> usize {
        self.columns
            .iter()
            .map(|c| c.iter().filter(|&&s| s == symbol).count())
            .sum()
    }

    /// Positions of every cell equal to `symbol`, reel-major order
    pub fn positions_of(&self, symbol: SymbolId) -> Vec<Cell> {
        self.cells()
            .filter(|&(_, s)| s == symbol)
            .map(|(cell, _)| cell)
            .collect()
    }

    /// Row-major text dump, one line per row
    pub fn render(&self) -> String {
        (0..self.rows())
            .map(|row| {
                (0..self.reels())
                    .map(|reel| format!("{:>2}", self.get(reel, row).glyph()))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
