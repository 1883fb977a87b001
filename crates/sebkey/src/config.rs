//! Parser limits

/// Hard nesting ceiling. Parsing, walking and serializing all recurse
/// once per level, so depth stays bounded even for `Config::unlimited()`.
pub const MAX_NESTING_DEPTH: u16 = 512;

/// Limits applied while parsing a SEB document
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum element nesting depth (0 means [`MAX_NESTING_DEPTH`])
    pub max_depth: u16,
    /// Maximum input size in bytes (0 means unlimited)
    pub max_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 128,
            max_size: 10 * 1024 * 1024, // 10 MB default
        }
    }
}

impl Config {
    /// Create a new config with unlimited size and the hard depth ceiling
    pub const fn unlimited() -> Self {
        Self {
            max_depth: 0,
            max_size: 0,
        }
    }

    /// Create a new config with specific limits
    pub const fn new(max_depth: u16, max_size: usize) -> Self {
        Self {
            max_depth,
            max_size,
        }
    }

    /// Depth limit actually enforced, never above [`MAX_NESTING_DEPTH`]
    pub const fn effective_max_depth(&self) -> u16 {
        if self.max_depth == 0 || self.max_depth > MAX_NESTING_DEPTH {
            MAX_NESTING_DEPTH
        } else {
            self.max_depth
        }
    }
}
