use crate::linter::{Context, Level, RuleResult};
use crate::parser::{ConfigNode, Source};
use crate::rules::{Rule, RuleMetadata};

fn check(node: &ConfigNode, ctx: &Context<'_>) -> RuleResult {
    let line_kind = node.params.get(1).map(String::as_str);
    let applies = match line_kind {
        Some("vty") => true,
        Some("console") => ctx.config.linters.settings.exec_timeout.require_console,
        _ => false,
    };
    if !applies {
        return RuleResult::pass(&NET007, node);
    }

    let timeout = node
        .children
        .iter()
        .find(|child| child.params.first().map(String::as_str) == Some("exec-timeout"));

    match timeout {
        Some(timeout) => {
            let minutes = timeout.params.get(1).map(String::as_str);
            let seconds = timeout.params.get(2).map(String::as_str);
            if minutes == Some("0") && (seconds == Some("0") || seconds.is_none()) {
                RuleResult::fail(
                    &NET007,
                    node,
                    "exec-timeout 0 0 disables the idle timeout entirely",
                )
            } else {
                RuleResult::pass(&NET007, node)
            }
        }
        None => {
            if node.source == Source::Snippet && node.children.is_empty() {
                RuleResult::pass(&NET007, node)
            } else {
                RuleResult::fail(&NET007, node, "line has no exec-timeout configured")
            }
        }
    }
}

pub const NET007: Rule = Rule {
    id: "NET007",
    alias: "vty-exec-timeout",
    description: "vty and console lines must set a non-disabled exec-timeout",
    selector: Some("line"),
    metadata: RuleMetadata {
        level: Level::Warning,
        obu: "network-security",
        owner: "netops",
        remediation: Some("configure `exec-timeout 10 0` (or a site-appropriate idle timeout)"),
    },
    check,
};
