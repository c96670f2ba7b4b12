use crate::linter::{Context, Level, RuleResult};
use crate::parser::{ConfigNode, Source};
use crate::rules::{Rule, RuleMetadata};

fn check(node: &ConfigNode, ctx: &Context<'_>) -> RuleResult {
    let settings = &ctx.config.linters.settings.interface_description;
    if let Some(name) = node.params.get(1) {
        if settings
            .ignored_prefixes
            .iter()
            .any(|prefix| {
                name.len() >= prefix.len()
                    && name.is_char_boundary(prefix.len())
                    && name[..prefix.len()].eq_ignore_ascii_case(prefix)
            })
        {
            return RuleResult::pass(&NET005, node);
        }
    }

    let described = node
        .children
        .iter()
        .any(|child| child.params.first().map(String::as_str) == Some("description"));
    if described {
        return RuleResult::pass(&NET005, node);
    }
    if node.source == Source::Snippet && node.children.is_empty() {
        return RuleResult::pass(&NET005, node);
    }
    RuleResult::fail(
        &NET005,
        node,
        format!(
            "interface `{}` has no description",
            node.params.get(1).map_or("", String::as_str)
        ),
    )
}

pub const NET005: Rule = Rule {
    id: "NET005",
    alias: "interface-description",
    description: "Interfaces should carry a description",
    selector: Some("interface"),
    metadata: RuleMetadata {
        level: Level::Warning,
        obu: "network-operations",
        owner: "netops",
        remediation: Some("add a `description` line naming the peer or purpose"),
    },
    check,
};
