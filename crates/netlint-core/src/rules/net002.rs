use crate::linter::{Context, Level, RuleResult};
use crate::parser::ConfigNode;
use crate::rules::{Rule, RuleMetadata};

fn check(node: &ConfigNode, _ctx: &Context<'_>) -> RuleResult {
    RuleResult::fail(&NET002, node, "embedded HTTP management server is enabled")
}

pub const NET002: Rule = Rule {
    id: "NET002",
    alias: "no-http-server",
    description: "The embedded HTTP management server must be disabled",
    selector: Some("ip http server"),
    metadata: RuleMetadata {
        level: Level::Error,
        obu: "network-security",
        owner: "secops",
        remediation: Some("configure `no ip http server`; use `ip http secure-server` if web management is required"),
    },
    check,
};
