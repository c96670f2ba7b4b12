//! # netlint core
//!
//! Validation of hierarchical text-based device configurations (Cisco IOS
//! and similar dialects) against a library of business and security rules.
//! The same core backs the batch CLI and the editor language server.
//!
//! Two subsystems do the work:
//!
//! - a *permissive, schema-aware parser* ([`parser`]) that reconstructs a
//!   tree from configuration text even when indentation is missing or
//!   inconsistent — it never rejects input;
//! - a *rule engine* ([`linter`]) that walks the tree, selects rules by a
//!   prefix selector, isolates rule failures, and exposes the whole tree to
//!   cross-reference rules.
//!
//! A scan is pure and synchronous: no I/O, no shared mutable state.
//! Independent scans may run concurrently on separate threads.
//!
//! ```rust
//! use netlint_core::config::NetlintConfig;
//! use netlint_core::linter::lint;
//! use netlint_core::parser::ParserOptions;
//!
//! let config = NetlintConfig::default_with_normalized_severities();
//! let text = "interface Gi0/1\n ip address 10.0.0.1 255.255.255.0\n";
//! let results = lint(text, &config, &ParserOptions::default());
//! assert!(results.iter().any(|r| !r.passed)); // missing description
//! ```

pub mod config;
pub mod linter;
pub mod parser;
pub mod rules;
pub mod sanitize;
pub mod schema;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;
