//! Math model configuration and its tolerant resolver
//!
//! Raw key/value input (from a JSON/YAML document or built in code) is
//! resolved into an immutable [`MathSpec`]. Resolution never fails: every
//! malformed or missing field falls back to the default table below.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::symbols::SymbolId;

// ═══════════════════════════════════════════════════════════════════════════════
// RAW INPUT
// ═══════════════════════════════════════════════════════════════════════════════

/// One raw configuration value, as loosely typed as it arrived
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Empty,
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Errors from the config *loading* step. Resolution itself is infallible.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("Config root must be a mapping")]
    NotAMapping,
}

/// Flat key/value configuration. Nested documents are flattened to dotted
/// keys (`pay.ace.5`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawConfig {
    entries: BTreeMap<String, RawValue>,
}

impl RawConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        self.entries
            .insert(key.into().trim().to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_document(value)
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_yml::from_str(yaml)?;
        Self::from_document(value)
    }

    /// Load from disk; `.yaml`/`.yml` are read as YAML, everything else as JSON
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            _ => Self::from_json_str(&text),
        }
    }

    fn from_document(value: serde_json::Value) -> Result<Self, ConfigError> {
        let serde_json::Value::Object(map) = value else {
            return Err(ConfigError::NotAMapping);
        };
        let mut config = Self::new();
        for (key, value) in map {
            config.flatten_into(key, value);
        }
        Ok(config)
    }

    fn flatten_into(&mut self, key: String, value: serde_json::Value) {
        use serde_json::Value;
        match value {
            Value::Object(map) => {
                for (child, value) in map {
                    self.flatten_into(format!("{key}.{child}"), value);
                }
            }
            Value::Bool(b) => self.set(key, b),
            Value::Number(n) => match n.as_f64() {
                Some(v) => self.set(key, v),
                None => self.set(key, RawValue::Empty),
            },
            Value::String(s) => self.set(key, s),
            Value::Null => self.set(key, RawValue::Empty),
            // Arrays carry symbol lists; keep them in their comma-joined text form
            Value::Array(items) => {
                let joined = items
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(",");
                self.set(key, joined);
            }
        }
    }

    fn number(&self, key: &str, default: f64) -> f64 {
        parse_number(self.get(key), default)
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        parse_bool(self.get(key), default)
    }

    /// Integer field, rounded and clamped into `[lo, hi]`
    fn count(&self, key: &str, default: u64, lo: u64, hi: u64) -> u64 {
        let v = self.number(key, default as f64).round();
        if v < lo as f64 {
            lo
        } else if v > hi as f64 {
            hi
        } else {
            v as u64
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FIELD PARSERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Tolerant numeric parse.
///
/// Text values yield the first signed decimal found anywhere in the string,
/// so `"12 ; was 10"` reads as 12. Anything absent or non-finite falls back
/// to `default`.
pub fn parse_number(value: Option<&RawValue>, default: f64) -> f64 {
    let parsed = match value {
        Some(RawValue::Number(n)) => Some(*n),
        Some(RawValue::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        Some(RawValue::Text(s)) => first_decimal(s),
        Some(RawValue::Empty) | None => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(default)
}

/// `1/true/yes/on` (any case) is true, empty or missing is `default`,
/// anything else is false.
pub fn parse_bool(value: Option<&RawValue>, default: bool) -> bool {
    match value {
        Some(RawValue::Bool(b)) => *b,
        Some(RawValue::Number(n)) => *n == 1.0,
        Some(RawValue::Text(s)) => {
            let s = s.trim().to_ascii_lowercase();
            if s.is_empty() {
                default
            } else {
                matches!(s.as_str(), "1" | "true" | "yes" | "on")
            }
        }
        Some(RawValue::Empty) | None => default,
    }
}

/// Comma-separated symbol tokens through the alias table; unknown tokens
/// are dropped.
pub fn parse_symbol_list(value: Option<&RawValue>) -> Vec<SymbolId> {
    let text = match value {
        Some(RawValue::Text(s)) => s.clone(),
        Some(RawValue::Number(n)) => n.to_string(),
        _ => return Vec::new(),
    };
    text.split(',').filter_map(SymbolId::from_alias).collect()
}

fn first_decimal(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let digit_at = |i: usize| bytes.get(i).is_some_and(u8::is_ascii_digit);

    let mut start = None;
    for i in 0..bytes.len() {
        let c = bytes[i];
        let starts_number = c.is_ascii_digit()
            || (c == b'.' && digit_at(i + 1))
            || ((c == b'-' || c == b'+')
                && (digit_at(i + 1) || (bytes.get(i + 1) == Some(&b'.') && digit_at(i + 2))));
        if starts_number {
            start = Some(i);
            break;
        }
    }
    let start = start?;

    let mut end = start;
    if bytes[end] == b'-' || bytes[end] == b'+' {
        end += 1;
    }
    while digit_at(end) {
        end += 1;
    }
    if bytes.get(end) == Some(&b'.') && digit_at(end + 1) {
        end += 1;
        while digit_at(end) {
            end += 1;
        }
    }
    text[start..end].parse().ok()
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEFAULT TABLES
// ═══════════════════════════════════════════════════════════════════════════════

/// Default sampling weights, indexed by `SymbolId::index()`
pub const DEFAULT_WEIGHTS: [f64; SymbolId::COUNT] = [
    18.0, // Nine
    18.0, // Ten
    16.0, // Jack
    16.0, // Queen
    14.0, // King
    14.0, // Ace
    10.0, // Bell
    8.0,  // Bar
    6.0,  // Seven
    4.0,  // Diamond
    3.0,  // Wild
    3.0,  // Scatter
];

/// Default line pays (bet multipliers for 3, 4, 5 of a kind)
pub const DEFAULT_PAYS: [[f64; 3]; SymbolId::COUNT] = [
    [0.2, 0.5, 1.0],   // Nine
    [0.2, 0.5, 1.0],   // Ten
    [0.3, 0.8, 1.5],   // Jack
    [0.3, 0.8, 1.5],   // Queen
    [0.5, 1.0, 2.5],   // King
    [0.5, 1.0, 2.5],   // Ace
    [1.0, 2.5, 5.0],   // Bell
    [1.5, 4.0, 8.0],   // Bar
    [2.5, 6.0, 12.0],  // Seven
    [5.0, 12.0, 25.0], // Diamond
    [10.0, 25.0, 50.0], // Wild (only when wild pays itself)
    [0.0, 0.0, 0.0],   // Scatter never pays on lines
];

/// Default scatter pays (total bet multiplier for 3, 4, 5+ scatters)
pub const DEFAULT_SCATTER_PAYS: [f64; 3] = [2.0, 5.0, 20.0];

/// Maximum number of canonical paylines
pub const MAX_PAYLINES: u8 = 7;

// ═══════════════════════════════════════════════════════════════════════════════
// MATH SPEC
// ═══════════════════════════════════════════════════════════════════════════════

/// Bet bounds in integer currency units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetLimits {
    pub min: u64,
    pub max: u64,
    pub step: u64,
    /// Initial session bet
    pub default: u64,
}

impl BetLimits {
    /// Clamp into bounds and snap down onto the step ladder above `min`
    pub fn clamp(&self, bet: u64) -> u64 {
        let bet = bet.clamp(self.min, self.max);
        self.min + (bet - self.min) / self.step * self.step
    }

    /// Next rung up, saturating at the top of the ladder
    pub fn step_up(&self, bet: u64) -> u64 {
        let next = self.clamp(bet).saturating_add(self.step);
        if next > self.max { self.clamp(bet) } else { next }
    }

    /// Next rung down, saturating at `min`
    pub fn step_down(&self, bet: u64) -> u64 {
        let bet = self.clamp(bet);
        if bet >= self.min + self.step {
            bet - self.step
        } else {
            self.min
        }
    }
}

/// Scatter symbol and its optional pay table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterRules {
    pub symbol: SymbolId,
    /// Whether scatters pay by count at all
    pub pays_enabled: bool,
    /// Total bet multipliers for 3, 4, 5+ scatters
    pub pays: [f64; 3],
}

/// Bonus trigger, retrigger and free-spin rules
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BonusRules {
    pub enabled: bool,
    /// Scatters needed to trigger from any spin
    pub trigger_count: u32,
    /// Free spins awarded on trigger
    pub free_spins_award: u32,
    pub retrigger_enabled: bool,
    /// Scatters needed to retrigger while already in free spins
    pub retrigger_count: u32,
    pub retrigger_award: u32,
    /// Win multiplier applied to free-spin rounds
    pub win_multiplier: f64,
}

/// QA overrides. Debug only.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QaOverrides {
    pub force_win: bool,
    pub force_bonus: bool,
    /// Fill every cell with this symbol
    pub force_symbol: Option<SymbolId>,
    pub verbose: bool,
}

/// Immutable, session-scoped math model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MathSpec {
    pub reels: u8,
    pub rows: u8,
    pub bet: BetLimits,
    pub starting_balance: u64,
    /// Number of canonical paylines scored (1..=7)
    pub paylines: u8,
    /// Sampling weight per symbol, indexed by `SymbolId::index()`
    pub weights: [f64; SymbolId::COUNT],
    /// Line pays per symbol for 3, 4, 5 of a kind
    pub pays: [[f64; 3]; SymbolId::COUNT],
    pub wild_substitutes: bool,
    pub wild_pays_itself: bool,
    pub scatter: ScatterRules,
    pub bonus: BonusRules,
    /// Win ≥ bet × this is presented as a big win
    pub big_win_multiplier: f64,
    /// Target probability of a forced line win per spin
    pub hit_rate: f64,
    /// Target probability of a forced bonus trigger per spin
    pub bonus_frequency: f64,
    /// Auto-play a free respin while reels are held
    pub hold_respin_enabled: bool,
    /// 0 = non-deterministic
    pub rng_seed: u64,
    pub qa: QaOverrides,
}

impl MathSpec {
    /// Resolve a spec from raw input, substituting defaults for anything
    /// missing or malformed.
    pub fn resolve(raw: &RawConfig) -> Self {
        let reels = raw.count("reels", 5, 3, 8) as u8;
        let rows = raw.count("rows", 3, 1, 6) as u8;

        let mut bet_min = raw.count("bet_min", 1, 1, u32::MAX as u64);
        let mut bet_max = raw.count("bet_max", 100, 1, u32::MAX as u64);
        if bet_min > bet_max {
            log::warn!("bet_min {bet_min} > bet_max {bet_max}, swapping");
            std::mem::swap(&mut bet_min, &mut bet_max);
        }
        let step = raw.count("bet_step", 1, 1, u32::MAX as u64);
        let mut bet = BetLimits {
            min: bet_min,
            max: bet_max,
            step,
            default: bet_min,
        };
        bet.default = bet.clamp(raw.count("bet_default", 10, 0, u32::MAX as u64));

        let mut weights = DEFAULT_WEIGHTS;
        for symbol in SymbolId::ALL {
            let key = format!("weight.{}", symbol.key());
            weights[symbol.index()] = raw.number(&key, DEFAULT_WEIGHTS[symbol.index()]).max(0.0);
        }
        for symbol in parse_symbol_list(raw.get("excluded_symbols")) {
            weights[symbol.index()] = 0.0;
        }
        if weights.iter().all(|&w| w <= 0.0) {
            log::warn!("weight table has no positive entry, using defaults");
            weights = DEFAULT_WEIGHTS;
        }

        let mut pays = DEFAULT_PAYS;
        for symbol in SymbolId::ALL {
            for (slot, count) in (3..=5).enumerate() {
                let key = format!("pay.{}.{}", symbol.key(), count);
                pays[symbol.index()][slot] =
                    raw.number(&key, DEFAULT_PAYS[symbol.index()][slot]).max(0.0);
            }
        }

        let mut scatter_pays = DEFAULT_SCATTER_PAYS;
        for (slot, count) in (3..=5).enumerate() {
            let key = format!("scatter_pay.{count}");
            scatter_pays[slot] = raw.number(&key, DEFAULT_SCATTER_PAYS[slot]).max(0.0);
        }

        let force_symbol = parse_symbol_list(raw.get("qa_force_symbol")).first().copied();

        Self {
            reels,
            rows,
            bet,
            starting_balance: raw.count("starting_balance", 1000, 0, u64::MAX / 2),
            paylines: raw.count("paylines", MAX_PAYLINES as u64, 1, MAX_PAYLINES as u64) as u8,
            weights,
            pays,
            wild_substitutes: raw.flag("wild_substitutes", true),
            wild_pays_itself: raw.flag("wild_pays_itself", false),
            scatter: ScatterRules {
                symbol: SymbolId::Scatter,
                pays_enabled: raw.flag("scatter_pays", true),
                pays: scatter_pays,
            },
            bonus: BonusRules {
                enabled: raw.flag("bonus_enabled", true),
                trigger_count: raw.count("bonus_trigger_count", 3, 1, 64) as u32,
                free_spins_award: raw.count("free_spins_award", 10, 0, 1000) as u32,
                retrigger_enabled: raw.flag("retrigger_enabled", true),
                retrigger_count: raw.count("retrigger_count", 2, 1, 64) as u32,
                retrigger_award: raw.count("retrigger_award", 5, 0, 1000) as u32,
                win_multiplier: raw.number("free_spins_multiplier", 2.0).max(0.0),
            },
            big_win_multiplier: raw.number("big_win_multiplier", 15.0).max(0.0),
            hit_rate: raw.number("hit_rate", 0.28).clamp(0.0, 1.0),
            bonus_frequency: raw.number("bonus_frequency", 0.008).clamp(0.0, 1.0),
            hold_respin_enabled: raw.flag("hold_respin_enabled", false),
            rng_seed: raw.count("rng_seed", 0, 0, u64::MAX / 2),
            qa: QaOverrides {
                force_win: raw.flag("qa_force_win", false),
                force_bonus: raw.flag("qa_force_bonus", false),
                force_symbol,
                verbose: raw.flag("qa_verbose", false),
            },
        }
    }

    /// Sampling weight of one symbol
    pub fn weight(&self, symbol: SymbolId) -> f64 {
        self.weights[symbol.index()]
    }

    /// Sum of all weights
    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Line pay multiplier for `count` of `symbol`; 0 for anything below 3
    pub fn line_pay(&self, symbol: SymbolId, count: usize) -> f64 {
        if count < 3 {
            return 0.0;
        }
        self.pays[symbol.index()][count.min(5) - 3]
    }

    /// Scatter pay multiplier for `count` scatters; 0 below 3
    pub fn scatter_pay(&self, count: usize) -> f64 {
        if count < 3 {
            return 0.0;
        }
        self.scatter.pays[count.min(5) - 3]
    }

    /// Clamp a requested bet into this spec's ladder
    pub fn clamp_bet(&self, bet: u64) -> u64 {
        self.bet.clamp(bet)
    }
}

impl Default for MathSpec {
    fn default() -> Self {
        Self::resolve(&RawConfig::default())
    }
}
