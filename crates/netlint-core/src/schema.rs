//! The block-starter schema: which lines open a nested configuration block.
//!
//! Indentation alone is not enough to reconstruct structure from flattened
//! snippets, so the parser additionally consults this ordered set of
//! whole-line prefix patterns. The set is data, not behavior: it is closed
//! and compiled once; callers that need vendor extensions build their own
//! [`BlockStarterSchema`] before constructing a parse.

use once_cell::sync::Lazy;
use regex::RegexSet;

/// Anchored, case-insensitive patterns naming keywords that open a block.
///
/// Every pattern is a whole-line prefix matcher with quantifiers over
/// disjoint character classes, so matching is linear and free of
/// pathological backtracking.
const BLOCK_STARTERS: &[&str] = &[
    r"(?i)^interface \S+",
    r"(?i)^router \S+",
    r"(?i)^vlan \d+",
    r"(?i)^line (vty|console|aux) \S+",
    r"(?i)^ip access-list \S+",
    r"(?i)^ipv6 access-list \S+",
    r"(?i)^class-map \S+",
    r"(?i)^policy-map \S+",
    r"(?i)^object-group \S+",
    r"(?i)^route-map \S+",
    r"(?i)^crypto (map|isakmp|ipsec) \S+",
    r"(?i)^dial-peer voice \S+",
    r"(?i)^vrf definition \S+",
    r"(?i)^address-family \S+",
    r"(?i)^banner (motd|login|exec)",
    r"(?i)^control-plane",
];

/// Lines that match a starter pattern but are plain commands anyway.
///
/// `router router-id 1.1.1.1` sets an attribute; only `router <protocol>`
/// opens a block.
const STARTER_EXCEPTIONS: &[&str] = &[r"(?i)^router router-id(\s|$)"];

static BUILTIN: Lazy<BlockStarterSchema> = Lazy::new(|| {
    BlockStarterSchema::new(BLOCK_STARTERS, STARTER_EXCEPTIONS)
        .expect("built-in block-starter patterns are valid")
});

/// A compiled block-starter pattern set.
///
/// Two `RegexSet` automata: the starter union and the exception union. A
/// sanitized line is a block starter iff the first matches and the second
/// does not.
#[derive(Debug)]
pub struct BlockStarterSchema {
    starters: RegexSet,
    exceptions: RegexSet,
}

impl BlockStarterSchema {
    /// Compile a schema from pattern lists. Patterns should be anchored at
    /// the line start; compilation is the only fallible step in the parsing
    /// pipeline and happens before any text is seen.
    pub fn new(starters: &[&str], exceptions: &[&str]) -> Result<Self, regex::Error> {
        Ok(Self {
            starters: RegexSet::new(starters)?,
            exceptions: RegexSet::new(exceptions)?,
        })
    }

    /// The schema shipped with the crate.
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    /// Extend the built-in schema with additional starter patterns.
    pub fn with_extra_starters(extra: &[&str]) -> Result<Self, regex::Error> {
        let mut starters: Vec<&str> = BLOCK_STARTERS.to_vec();
        starters.extend_from_slice(extra);
        Self::new(&starters, STARTER_EXCEPTIONS)
    }

    /// Decide whether a sanitized line opens a nested block.
    pub fn is_block_starter(&self, sanitized: &str) -> bool {
        self.starters.is_match(sanitized) && !self.exceptions.is_match(sanitized)
    }
}
