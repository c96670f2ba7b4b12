use crate::linter::{Context, Level, RuleResult};
use crate::parser::ConfigNode;
use crate::rules::{Rule, RuleMetadata};

/// `snmp-server community <string> [RO|RW] [acl]`
fn check(node: &ConfigNode, ctx: &Context<'_>) -> RuleResult {
    let Some(community) = node.params.get(2) else {
        return RuleResult::fail(&NET003, node, "snmp-server community has no community string");
    };

    let forbidden = &ctx.config.linters.settings.snmp_community.forbidden;
    if forbidden
        .iter()
        .any(|banned| banned.eq_ignore_ascii_case(community))
    {
        return RuleResult::fail(
            &NET003,
            node,
            format!("well-known SNMP community string `{community}` is configured"),
        );
    }
    RuleResult::pass(&NET003, node)
}

pub const NET003: Rule = Rule {
    id: "NET003",
    alias: "snmp-community",
    description: "SNMP community strings must not be guessable defaults",
    selector: Some("snmp-server community"),
    metadata: RuleMetadata {
        level: Level::Error,
        obu: "network-security",
        owner: "secops",
        remediation: Some("rotate the community string and restrict it with an access-list"),
    },
    check,
};
