//! Rule evaluation over a parsed configuration forest.
//!
//! A scan is a pure function from `(text, rules)` to a result sequence: the
//! engine holds no state between runs, performs no I/O and never mutates the
//! forest. Results refer to nodes by id and location only, so they outlive
//! the tree they were produced from.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::Serialize;
use tracing::debug;

use crate::config::NetlintConfig;
use crate::parser::{parse_with_options, ConfigNode, Loc, ParserOptions};
use crate::rules::{Rule, ALL_RULES};

/// Severity of a single result on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warning,
    Info,
}

/// Outcome of one rule invocation on one node.
///
/// The engine emits a result for every invocation, passes included, so a
/// report can show positive evidence; consumers filter as they wish.
#[derive(Debug, Clone, Serialize)]
pub struct RuleResult {
    pub passed: bool,
    pub message: String,
    pub rule_id: String,
    pub node_id: String,
    pub level: Level,
    pub loc: Loc,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl RuleResult {
    pub fn pass(rule: &Rule, node: &ConfigNode) -> Self {
        Self {
            passed: true,
            message: rule.description.to_string(),
            rule_id: rule.id.to_string(),
            node_id: node.id.clone(),
            level: rule.metadata.level,
            loc: node.loc,
            remediation: None,
        }
    }

    pub fn fail(rule: &Rule, node: &ConfigNode, message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            rule_id: rule.id.to_string(),
            node_id: node.id.clone(),
            level: rule.metadata.level,
            loc: node.loc,
            remediation: rule.metadata.remediation.map(str::to_string),
        }
    }
}

/// Read-only handle passed to every rule check.
///
/// `ast` is the whole forest, for cross-reference rules; `config` carries
/// the per-rule settings tables.
#[derive(Debug)]
pub struct Context<'a> {
    pub ast: &'a [ConfigNode],
    pub config: &'a NetlintConfig,
}

/// Decide whether a node satisfies a rule selector.
///
/// An absent selector matches every node. A present selector matches iff it
/// is an ASCII-case-insensitive prefix of the node id followed by
/// end-of-string or whitespace, so `"ip"` matches `"ip address …"` but not
/// `"ipv6 …"`. A present-but-empty or leading-whitespace selector is
/// malformed and matches nothing.
pub fn selector_matches(node: &ConfigNode, selector: Option<&str>) -> bool {
    let Some(selector) = selector else {
        return true;
    };
    if selector.is_empty() || selector.starts_with(char::is_whitespace) {
        return false;
    }
    let id = node.id.as_str();
    if id.len() < selector.len() || !id.is_char_boundary(selector.len()) {
        return false;
    }
    let (head, rest) = id.split_at(selector.len());
    head.eq_ignore_ascii_case(selector) && (rest.is_empty() || rest.starts_with(char::is_whitespace))
}

/// Walk the forest in document order and apply every matching rule to every
/// node. Result order is the flattened pre-order walk; within one node, the
/// order of `rules`.
pub fn run(forest: &[ConfigNode], rules: &[&Rule], config: &NetlintConfig) -> Vec<RuleResult> {
    let ctx = Context { ast: forest, config };
    let mut results = Vec::new();
    for node in forest {
        run_node(node, rules, &ctx, &mut results);
    }
    debug!(rules = rules.len(), results = results.len(), "rule run complete");
    results
}

fn run_node(node: &ConfigNode, rules: &[&Rule], ctx: &Context<'_>, out: &mut Vec<RuleResult>) {
    for rule in rules {
        if !selector_matches(node, rule.selector) {
            continue;
        }
        // Failure barrier: a misbehaving rule must never abort the scan.
        match catch_unwind(AssertUnwindSafe(|| (rule.check)(node, ctx))) {
            Ok(result) => out.push(result),
            Err(payload) => out.push(barrier_result(rule, node, payload.as_ref())),
        }
    }
    for child in &node.children {
        run_node(child, rules, ctx, out);
    }
}

fn barrier_result(rule: &Rule, node: &ConfigNode, payload: &(dyn Any + Send)) -> RuleResult {
    let reason = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    RuleResult {
        passed: false,
        message: format!("rule check failed: {reason}"),
        rule_id: rule.id.to_string(),
        node_id: node.id.clone(),
        level: Level::Error,
        loc: node.loc,
        remediation: None,
    }
}

/// Rules enabled by the configuration, in registry order.
pub fn active_rules(config: &NetlintConfig) -> Vec<&'static Rule> {
    ALL_RULES
        .iter()
        .filter(|rule| config.severity_for(rule.alias).level().is_some())
        .collect()
}

/// The full scan pipeline shared by the CLI and the editor integration:
/// parse, run the enabled rules, then re-level results according to the
/// configured severities.
pub fn lint(text: &str, config: &NetlintConfig, options: &ParserOptions) -> Vec<RuleResult> {
    let forest = parse_with_options(text, options);
    let rules = active_rules(config);
    let mut results = run(&forest, &rules, config);
    for result in &mut results {
        if let Some(level) = rules
            .iter()
            .find(|rule| rule.id == result.rule_id)
            .and_then(|rule| config.severity_for(rule.alias).level())
        {
            result.level = level;
        }
    }
    results
}

#[cfg(test)]
mod test {
    use super::{lint, run, selector_matches, Level, RuleResult};
    use crate::config::NetlintConfig;
    use crate::parser::{parse, ParserOptions};
    use crate::rules::{Rule, RuleMetadata};
    use crate::test_utils::test_helpers::lint_config;
    use crate::config::RuleSeverity;

    fn count_nodes(forest: &[crate::parser::ConfigNode]) -> usize {
        forest
            .iter()
            .map(|n| 1 + count_nodes(&n.children))
            .sum()
    }

    const PASSING_RULE: Rule = Rule {
        id: "TST001",
        alias: "always-pass",
        description: "Visits every node",
        selector: None,
        metadata: RuleMetadata {
            level: Level::Info,
            obu: "testing",
            owner: "core",
            remediation: None,
        },
        check: |node, _ctx| RuleResult::pass(&PASSING_RULE, node),
    };

    const PANICKING_RULE: Rule = Rule {
        id: "TST002",
        alias: "always-panic",
        description: "Dies on every node",
        selector: Some("interface"),
        metadata: RuleMetadata {
            level: Level::Warning,
            obu: "testing",
            owner: "core",
            remediation: None,
        },
        check: |_node, _ctx| panic!("boom"),
    };

    #[test]
    fn test_empty_rules_yield_no_results() {
        let forest = parse("interface Gi0/1\n no shutdown");
        let config = NetlintConfig::default();
        assert!(run(&forest, &[], &config).is_empty());
    }

    #[test]
    fn test_empty_forest_yields_no_results() {
        let config = NetlintConfig::default();
        assert!(run(&[], &[&PASSING_RULE], &config).is_empty());
    }

    #[test]
    fn test_selectorless_rule_visits_every_node_once() {
        let input = "hostname R1\ninterface Gi0/1\n description x\nntp server 1.1.1.1";
        let forest = parse(input);
        let config = NetlintConfig::default();
        let results = run(&forest, &[&PASSING_RULE], &config);
        // one result per node, virtual roots included
        assert_eq!(count_nodes(&forest), results.len());
        assert!(results.iter().all(|r| r.passed));
    }

    #[test]
    fn test_result_order_is_preorder_then_rule_order() {
        const SECOND_RULE: Rule = Rule {
            id: "TST003",
            alias: "also-pass",
            description: "Second in rule order",
            selector: None,
            metadata: RuleMetadata {
                level: Level::Info,
                obu: "testing",
                owner: "core",
                remediation: None,
            },
            check: |node, _ctx| RuleResult::pass(&SECOND_RULE, node),
        };

        let forest = parse("interface Gi0/1\n no shutdown");
        let config = NetlintConfig::default();
        let results = run(&forest, &[&PASSING_RULE, &SECOND_RULE], &config);

        assert_eq!(4, results.len());
        assert_eq!("TST001", results[0].rule_id);
        assert_eq!("interface Gi0/1", results[0].node_id);
        assert_eq!("TST003", results[1].rule_id);
        assert_eq!("interface Gi0/1", results[1].node_id);
        assert_eq!("TST001", results[2].rule_id);
        assert_eq!("no shutdown", results[2].node_id);
        assert_eq!("TST003", results[3].rule_id);
    }

    #[test]
    fn test_failure_barrier_contains_panics() {
        let forest = parse("interface Gi0/1\n no shutdown\ninterface Gi0/2");
        let config = NetlintConfig::default();
        let results = run(&forest, &[&PANICKING_RULE, &PASSING_RULE], &config);

        let barrier: Vec<&RuleResult> =
            results.iter().filter(|r| r.rule_id == "TST002").collect();
        assert_eq!(2, barrier.len());
        for result in &barrier {
            assert!(!result.passed);
            assert_eq!(Level::Error, result.level);
            assert!(result.message.contains("boom"));
        }
        // the healthy rule still saw every node
        let passes = results.iter().filter(|r| r.rule_id == "TST001").count();
        assert_eq!(4, passes);
        // panicking node ids are preserved
        assert_eq!("interface Gi0/1", barrier[0].node_id);
        assert_eq!("interface Gi0/2", barrier[1].node_id);
    }

    #[test]
    fn test_selector_prefix_and_boundary() {
        let forest = parse("ipv6 address 2001::1/64\nip address 10.0.0.1 255.255.255.0\nip\nIP ADDRESS 10.0.0.2 255.255.255.0");
        let nodes = &forest[0].children;

        assert!(!selector_matches(&nodes[0], Some("ip")));
        assert!(selector_matches(&nodes[1], Some("ip")));
        assert!(selector_matches(&nodes[2], Some("ip")));
        assert!(selector_matches(&nodes[3], Some("ip address")));
        assert!(selector_matches(&nodes[1], Some("IP Address")));
        assert!(selector_matches(&nodes[0], None));
    }

    #[test]
    fn test_malformed_selectors_match_nothing() {
        let forest = parse("ip address 10.0.0.1 255.255.255.0");
        let node = &forest[0].children[0];
        assert!(!selector_matches(node, Some("")));
        assert!(!selector_matches(node, Some(" ip")));
    }

    #[test]
    fn test_selector_longer_than_id() {
        let forest = parse("ip");
        let node = &forest[0].children[0];
        assert!(!selector_matches(node, Some("ip address")));
    }

    #[test]
    fn test_lint_respects_off_and_overrides() {
        let input = "enable password cisco123\nip http server";
        let config = lint_config(
            &[
                ("enable-secret", RuleSeverity::Warning),
                ("no-http-server", RuleSeverity::Off),
            ],
            None,
        );
        let results = lint(input, &config, &ParserOptions::default());

        assert!(results.iter().all(|r| r.rule_id != "NET002"));
        let downgraded: Vec<_> = results
            .iter()
            .filter(|r| r.rule_id == "NET001" && !r.passed)
            .collect();
        assert_eq!(1, downgraded.len());
        assert_eq!(Level::Warning, downgraded[0].level);
    }

    #[test]
    fn test_result_wire_shape() {
        let input = "enable password cisco123";
        let config = lint_config(&[("enable-secret", RuleSeverity::Error)], None);
        let results = lint(input, &config, &ParserOptions::default());
        let failure = results.iter().find(|r| !r.passed).expect("one failure");

        let json = serde_json::to_value(failure).expect("serializes");
        assert_eq!(false, json["passed"]);
        assert_eq!("NET001", json["rule_id"]);
        assert_eq!("error", json["level"]);
        assert_eq!("enable password cisco123", json["node_id"]);
        assert_eq!(0, json["loc"]["start_line"]);
        assert!(json["remediation"].is_string());

        let pass = results.iter().find(|r| r.passed);
        if let Some(pass) = pass {
            let json = serde_json::to_value(pass).expect("serializes");
            assert!(json.get("remediation").is_none());
        }
    }
}
