use crate::linter::{Context, Level, RuleResult};
use crate::parser::ConfigNode;
use crate::rules::{Rule, RuleMetadata};

/// Complements the section-level vty check: fires on the `transport input`
/// command itself, wherever it appears.
fn check(node: &ConfigNode, _ctx: &Context<'_>) -> RuleResult {
    let telnet = node.params[2..]
        .iter()
        .any(|proto| proto.eq_ignore_ascii_case("telnet") || proto.eq_ignore_ascii_case("all"));
    if telnet {
        RuleResult::fail(
            &NET008,
            node,
            "cleartext telnet is accepted as an input transport",
        )
    } else {
        RuleResult::pass(&NET008, node)
    }
}

pub const NET008: Rule = Rule {
    id: "NET008",
    alias: "no-telnet-transport",
    description: "Telnet must not be accepted as an input transport",
    selector: Some("transport input"),
    metadata: RuleMetadata {
        level: Level::Error,
        obu: "network-security",
        owner: "secops",
        remediation: Some("replace with `transport input ssh`"),
    },
    check,
};
