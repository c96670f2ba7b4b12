use crate::linter::{Context, Level, RuleResult};
use crate::parser::ConfigNode;
use crate::rules::{Rule, RuleMetadata};

/// `enable password` stores the privileged credential with a reversible
/// encoding; `enable secret` hashes it. Any occurrence is a finding.
fn check(node: &ConfigNode, _ctx: &Context<'_>) -> RuleResult {
    RuleResult::fail(
        &NET001,
        node,
        "privileged credential uses reversible `enable password`",
    )
}

pub const NET001: Rule = Rule {
    id: "NET001",
    alias: "enable-secret",
    description: "Privileged access must use `enable secret`, not `enable password`",
    selector: Some("enable password"),
    metadata: RuleMetadata {
        level: Level::Error,
        obu: "network-security",
        owner: "secops",
        remediation: Some("replace with `enable secret <hash>` and remove `enable password`"),
    },
    check,
};
