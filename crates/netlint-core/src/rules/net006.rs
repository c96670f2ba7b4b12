use crate::linter::{Context, Level, RuleResult};
use crate::parser::ConfigNode;
use crate::rules::{Rule, RuleMetadata};

/// Collect every static `ip address <addr> <mask>` assignment in the forest.
fn collect_assignments<'a>(forest: &'a [ConfigNode], out: &mut Vec<&'a ConfigNode>) {
    for node in forest {
        if node.params.first().map(String::as_str) == Some("ip")
            && node.params.get(1).map(String::as_str) == Some("address")
            && node.params.len() >= 4
        {
            out.push(node);
        }
        collect_assignments(&node.children, out);
    }
}

/// Cross-reference rule: the same address and mask assigned on two different
/// lines of one configuration is almost always a paste error.
fn check(node: &ConfigNode, ctx: &Context<'_>) -> RuleResult {
    if node.params.len() < 4 {
        // `ip address dhcp`, `ip address negotiated` and friends
        return RuleResult::pass(&NET006, node);
    }
    let addr = &node.params[2];
    let mask = &node.params[3];

    let mut assignments = Vec::new();
    collect_assignments(ctx.ast, &mut assignments);

    let duplicate = assignments.iter().find(|other| {
        other.loc.start_line != node.loc.start_line
            && other.params[2] == *addr
            && other.params[3] == *mask
    });

    match duplicate {
        Some(other) => RuleResult::fail(
            &NET006,
            node,
            format!(
                "address {addr} {mask} is also assigned at line {}",
                other.loc.start_line + 1
            ),
        ),
        None => RuleResult::pass(&NET006, node),
    }
}

pub const NET006: Rule = Rule {
    id: "NET006",
    alias: "duplicate-ip-address",
    description: "The same address/mask must not be assigned more than once",
    selector: Some("ip address"),
    metadata: RuleMetadata {
        level: Level::Error,
        obu: "network-operations",
        owner: "netops",
        remediation: Some("remove or renumber one of the duplicate assignments"),
    },
    check,
};
