use crate::linter::{Context, Level, RuleResult};
use crate::parser::{ConfigNode, Source};
use crate::rules::{Rule, RuleMetadata};

/// Find the `transport input …` command inside a `line vty` section.
fn transport_input(node: &ConfigNode) -> Option<&ConfigNode> {
    node.children.iter().find(|child| {
        child.params.first().map(String::as_str) == Some("transport")
            && child.params.get(1).map(String::as_str) == Some("input")
    })
}

fn check(node: &ConfigNode, ctx: &Context<'_>) -> RuleResult {
    let allowed = &ctx.config.linters.settings.vty_transport.allowed_transports;

    match transport_input(node) {
        Some(transport) => {
            let offending: Vec<&str> = transport.params[2..]
                .iter()
                .map(String::as_str)
                .filter(|proto| !allowed.iter().any(|a| a.eq_ignore_ascii_case(proto)))
                .collect();
            if offending.is_empty() {
                RuleResult::pass(&NET004, node)
            } else {
                RuleResult::fail(
                    &NET004,
                    node,
                    format!("vty line accepts disallowed transport(s): {}", offending.join(", ")),
                )
            }
        }
        None => {
            // A flattened fragment may carry the line without its body.
            if node.source == Source::Snippet && node.children.is_empty() {
                RuleResult::pass(&NET004, node)
            } else {
                RuleResult::fail(
                    &NET004,
                    node,
                    "vty line does not restrict `transport input`",
                )
            }
        }
    }
}

pub const NET004: Rule = Rule {
    id: "NET004",
    alias: "vty-transport-ssh",
    description: "vty lines must restrict inbound transport to the allowed set",
    selector: Some("line vty"),
    metadata: RuleMetadata {
        level: Level::Error,
        obu: "network-security",
        owner: "netops",
        remediation: Some("configure `transport input ssh` under every `line vty` block"),
    },
    check,
};
