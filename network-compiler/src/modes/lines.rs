//! Line categories for map rendering.
//!
//! Renderers colour an edge by the kind of line its two stations share.
//! The classification is a rule table read top to bottom; the first rule
//! that matches a line id decides its category.

use std::collections::BTreeSet;
use std::fmt;

/// Vehicle family of a line, as shown on network maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineCategory {
    Metro,
    Funicular,
    Tram,
    Trambus,
    Navigone,
    Bus,
}

impl fmt::Display for LineCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LineCategory::Metro => "metro",
            LineCategory::Funicular => "funicular",
            LineCategory::Tram => "tram",
            LineCategory::Trambus => "trambus",
            LineCategory::Navigone => "navigone",
            LineCategory::Bus => "bus",
        };
        f.write_str(s)
    }
}

enum Pattern {
    Exact(&'static str),
    /// Starts with the prefix and is shorter than `max_len` characters.
    ShortPrefix {
        prefix: &'static str,
        max_len: usize,
    },
}

impl Pattern {
    fn matches(&self, line: &str) -> bool {
        match *self {
            Pattern::Exact(id) => line == id,
            Pattern::ShortPrefix { prefix, max_len } => {
                line.starts_with(prefix) && line.chars().count() < max_len
            }
        }
    }
}

struct Rule {
    pattern: Pattern,
    category: LineCategory,
}

const RULES: &[Rule] = &[
    Rule {
        pattern: Pattern::Exact("A"),
        category: LineCategory::Metro,
    },
    Rule {
        pattern: Pattern::Exact("B"),
        category: LineCategory::Metro,
    },
    Rule {
        pattern: Pattern::Exact("C"),
        category: LineCategory::Metro,
    },
    Rule {
        pattern: Pattern::Exact("D"),
        category: LineCategory::Metro,
    },
    Rule {
        pattern: Pattern::ShortPrefix {
            prefix: "F",
            max_len: 4,
        },
        category: LineCategory::Funicular,
    },
    Rule {
        pattern: Pattern::ShortPrefix {
            prefix: "T",
            max_len: 4,
        },
        category: LineCategory::Tram,
    },
    Rule {
        pattern: Pattern::ShortPrefix {
            prefix: "C",
            max_len: 4,
        },
        category: LineCategory::Trambus,
    },
    Rule {
        pattern: Pattern::ShortPrefix {
            prefix: "N",
            max_len: 4,
        },
        category: LineCategory::Navigone,
    },
];

/// Position of the first matching rule. Unmatched lines rank last.
fn rank(line: &str) -> usize {
    RULES
        .iter()
        .position(|rule| rule.pattern.matches(line))
        .unwrap_or(RULES.len())
}

impl LineCategory {
    /// Category of a single line id. Anything unmatched is a bus.
    pub fn classify(line: &str) -> Self {
        RULES
            .get(rank(line))
            .map_or(LineCategory::Bus, |rule| rule.category)
    }
}

/// Category of a connection between two stations, from the lines they
/// share. `None` if they share no line.
pub fn connection_category(
    modes_u: &BTreeSet<String>,
    modes_v: &BTreeSet<String>,
) -> Option<LineCategory> {
    modes_u
        .intersection(modes_v)
        .min_by_key(|line| rank(line))
        .map(|line| LineCategory::classify(line))
}
