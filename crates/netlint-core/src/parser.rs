//! Permissive hierarchical parser for device configurations.
//!
//! The parser never rejects input. It reconstructs a forest of
//! [`ConfigNode`]s from configuration text even when indentation is missing,
//! partial or inconsistent, by combining measured indentation with the
//! block-starter schema. Comment lines (`!`) and blank lines are dropped;
//! every surviving input line becomes exactly one node, with the original
//! text preserved verbatim in `raw_text`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::sanitize::sanitize;
use crate::schema::BlockStarterSchema;

/// Block-starter detection is skipped for lines longer than this many
/// codepoints; such lines are parsed as plain commands.
pub const DEFAULT_MAX_STARTER_SCAN: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Opens a nested block and owns the lines beneath it.
    Section,
    /// A leaf configuration line.
    Command,
    /// Reserved; comments are filtered out before tree construction.
    Comment,
    /// Synthetic container grouping a run of top-level orphan commands.
    VirtualRoot,
}

/// Where the parsed text came from. Rules may soften checks for snippets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// A full configuration file.
    Base,
    /// An ad-hoc fragment, e.g. an editor selection or a paste.
    Snippet,
}

/// Line span of a node, 0-based. `end_line` is the last line covered: equal
/// to `start_line` for a single line, and the maximum descendant `end_line`
/// for a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loc {
    pub start_line: u32,
    pub end_line: u32,
}

/// A node of the configuration tree.
///
/// Nodes are created once during parsing and never mutated afterwards. The
/// field order here is the wire order for serialized dumps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigNode {
    /// Sanitized textual identity of the line; what selectors match on.
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// The original line exactly as read, including leading whitespace.
    pub raw_text: String,
    /// The sanitized line split on whitespace runs; `params[0]` is the head
    /// keyword.
    pub params: Vec<String>,
    pub children: Vec<ConfigNode>,
    pub source: Source,
    pub loc: Loc,
    /// Leading whitespace column count of the originating line, measured on
    /// the raw text. Tabs count one column each.
    pub indent: u32,
}

/// Options for a single parse.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Absolute line number of the first line of `text`.
    pub start_line: u32,
    /// Origin tag propagated to every node.
    pub source: Source,
    /// Codepoint cap above which block-starter detection is skipped.
    pub max_starter_scan: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            start_line: 0,
            source: Source::Base,
            max_starter_scan: DEFAULT_MAX_STARTER_SCAN,
        }
    }
}

impl ParserOptions {
    /// Options for parsing an ad-hoc fragment.
    pub fn snippet() -> Self {
        Self {
            source: Source::Snippet,
            ..Self::default()
        }
    }
}

/// Parse a full configuration with default options.
pub fn parse(text: &str) -> Vec<ConfigNode> {
    parse_with_options(text, &ParserOptions::default())
}

/// Parse with explicit options, using the built-in block-starter schema.
pub fn parse_with_options(text: &str, options: &ParserOptions) -> Vec<ConfigNode> {
    parse_with_schema(text, options, BlockStarterSchema::builtin())
}

/// Parse with an explicit block-starter schema.
///
/// Maintains an explicit parent stack. A new line pops the stack top on an
/// indentation break (its indent does not exceed the top's), or by
/// block-starter promotion (the line is a block starter and the top is not
/// a section). One carve-out makes flattened snippets hold together: a
/// freshly opened section keeps an equal-indent plain command as its first
/// child instead of being popped by it, so `ip address …` directly after an
/// unindented `interface Gi0/1` lands inside the interface. Once a section
/// owns children, an equal-indent line closes it as usual.
pub fn parse_with_schema(
    text: &str,
    options: &ParserOptions,
    schema: &BlockStarterSchema,
) -> Vec<ConfigNode> {
    let mut roots: Vec<ConfigNode> = Vec::new();
    let mut stack: Vec<ConfigNode> = Vec::new();

    for (index, raw) in text.split('\n').enumerate() {
        let sanitized = sanitize(raw);
        if sanitized.is_empty() || sanitized.starts_with('!') {
            continue;
        }

        let line_number = options.start_line + index as u32;
        // Indent is measured on the original line, never the sanitized one.
        let indent = raw.chars().take_while(|c| c.is_whitespace()).count() as u32;
        let is_starter = sanitized.chars().count() <= options.max_starter_scan
            && schema.is_block_starter(&sanitized);

        loop {
            let pops = match stack.last() {
                Some(top) => {
                    // a just-opened section retains the first equal-indent
                    // command of a flattened snippet
                    let top_retains = top.node_type == NodeType::Section
                        && top.children.is_empty()
                        && !is_starter
                        && indent == top.indent;
                    (indent <= top.indent && !top_retains)
                        || (is_starter && top.node_type != NodeType::Section)
                }
                None => false,
            };
            if !pops {
                break;
            }
            if let Some(done) = stack.pop() {
                attach(&mut stack, &mut roots, done);
            }
        }

        let params: Vec<String> = sanitized.split_whitespace().map(str::to_string).collect();
        stack.push(ConfigNode {
            id: sanitized,
            node_type: if is_starter {
                NodeType::Section
            } else {
                NodeType::Command
            },
            raw_text: raw.to_string(),
            params,
            children: Vec::new(),
            source: options.source,
            loc: Loc {
                start_line: line_number,
                end_line: line_number,
            },
            indent,
        });
    }

    while let Some(done) = stack.pop() {
        attach(&mut stack, &mut roots, done);
    }

    for root in &mut roots {
        fix_end_lines(root);
    }

    let forest = wrap_orphan_runs(roots, options.source);
    debug!(roots = forest.len(), source = ?options.source, "parsed configuration forest");
    forest
}

/// Hand a completed subtree to the open parent, or to the root forest.
fn attach(stack: &mut Vec<ConfigNode>, roots: &mut Vec<ConfigNode>, done: ConfigNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(done),
        None => roots.push(done),
    }
}

/// Post-order sweep propagating `end_line` up through sections.
fn fix_end_lines(node: &mut ConfigNode) -> u32 {
    let mut end = node.loc.end_line;
    for child in &mut node.children {
        end = end.max(fix_end_lines(child));
    }
    node.loc.end_line = end;
    end
}

/// Replace every maximal run of consecutive top-level command nodes with a
/// single `virtual_root` container so orphan snippets stay addressable.
/// Sections pass through unchanged and break the run.
fn wrap_orphan_runs(roots: Vec<ConfigNode>, source: Source) -> Vec<ConfigNode> {
    let mut wrapped = Vec::with_capacity(roots.len());
    let mut run: Vec<ConfigNode> = Vec::new();

    for node in roots {
        if node.node_type == NodeType::Section {
            flush_run(&mut wrapped, &mut run, source);
            wrapped.push(node);
        } else {
            run.push(node);
        }
    }
    flush_run(&mut wrapped, &mut run, source);
    wrapped
}

fn flush_run(wrapped: &mut Vec<ConfigNode>, run: &mut Vec<ConfigNode>, source: Source) {
    if run.is_empty() {
        return;
    }
    let children = std::mem::take(run);
    let start = children.first().map_or(0, |c| c.loc.start_line);
    let end = children.last().map_or(start, |c| c.loc.end_line);
    wrapped.push(ConfigNode {
        id: format!("virtual_root_line_{start}"),
        node_type: NodeType::VirtualRoot,
        raw_text: String::new(),
        params: Vec::new(),
        children,
        source,
        loc: Loc {
            start_line: start,
            end_line: end,
        },
        indent: 0,
    });
}

#[cfg(test)]
mod test {
    use super::{parse, parse_with_options, ConfigNode, NodeType, ParserOptions, Source};

    fn flatten<'a>(forest: &'a [ConfigNode], out: &mut Vec<&'a ConfigNode>) {
        for node in forest {
            out.push(node);
            flatten(&node.children, out);
        }
    }

    #[test]
    fn test_well_formed_nested_section() {
        let input = "interface GigabitEthernet0/1\n description uplink\n ip address 10.0.0.1 255.255.255.0";
        let forest = parse(input);

        assert_eq!(1, forest.len());
        let section = &forest[0];
        assert_eq!("interface GigabitEthernet0/1", section.id);
        assert_eq!(NodeType::Section, section.node_type);
        assert_eq!(0, section.loc.start_line);
        assert_eq!(2, section.loc.end_line);

        assert_eq!(2, section.children.len());
        assert_eq!("description uplink", section.children[0].id);
        assert_eq!(NodeType::Command, section.children[0].node_type);
        assert_eq!("ip address 10.0.0.1 255.255.255.0", section.children[1].id);
        assert_eq!(" description uplink", section.children[0].raw_text);
        assert_eq!(1, section.children[0].indent);
    }

    #[test]
    fn test_flat_snippet_promotion() {
        // No indentation at all: the command still lands under the first
        // interface, and the second interface becomes a sibling section.
        let input = "interface Gi0/1\nip address 10.0.0.1 255.255.255.0\ninterface Gi0/2";
        let forest = parse(input);

        assert_eq!(2, forest.len());
        assert_eq!("interface Gi0/1", forest[0].id);
        assert_eq!(1, forest[0].children.len());
        assert_eq!(
            "ip address 10.0.0.1 255.255.255.0",
            forest[0].children[0].id
        );
        assert_eq!("interface Gi0/2", forest[1].id);
        assert!(forest[1].children.is_empty());
    }

    #[test]
    fn test_orphan_commands_get_a_virtual_root() {
        let input = "ip address 10.0.0.1 255.255.255.0\nno shutdown";
        let forest = parse(input);

        assert_eq!(1, forest.len());
        let root = &forest[0];
        assert_eq!(NodeType::VirtualRoot, root.node_type);
        assert_eq!("virtual_root_line_0", root.id);
        assert_eq!(0, root.loc.start_line);
        assert_eq!(1, root.loc.end_line);
        assert_eq!(2, root.children.len());
        assert_eq!("ip address 10.0.0.1 255.255.255.0", root.children[0].id);
        assert_eq!("no shutdown", root.children[1].id);
    }

    #[test]
    fn test_mixed_orphans_and_sections() {
        let input = "hostname R1\ninterface Gi0/1\n description core\nntp server 1.1.1.1";
        let forest = parse(input);

        assert_eq!(3, forest.len());
        assert_eq!(NodeType::VirtualRoot, forest[0].node_type);
        assert_eq!(1, forest[0].children.len());
        assert_eq!("hostname R1", forest[0].children[0].id);

        assert_eq!(NodeType::Section, forest[1].node_type);
        assert_eq!("interface Gi0/1", forest[1].id);
        assert_eq!(1, forest[1].children.len());

        assert_eq!(NodeType::VirtualRoot, forest[2].node_type);
        assert_eq!("virtual_root_line_3", forest[2].id);
        assert_eq!("ntp server 1.1.1.1", forest[2].children[0].id);
    }

    #[test]
    fn test_flat_run_attaches_only_first_command() {
        // Once the section owns a child, a further equal-indent command
        // closes it; only the first command of a flat run is retained.
        let input = "interface Gi0/1\nip address 10.0.0.1 255.255.255.0\nno shutdown";
        let forest = parse(input);

        assert_eq!(2, forest.len());
        assert_eq!("interface Gi0/1", forest[0].id);
        assert_eq!(1, forest[0].children.len());
        assert_eq!(NodeType::VirtualRoot, forest[1].node_type);
        assert_eq!("no shutdown", forest[1].children[0].id);
    }

    #[test]
    fn test_equal_indent_command_closes_populated_section() {
        // A section whose body is properly indented is closed by the next
        // unindented command, which becomes an orphan.
        let input = "interface Gi0/1\n description core\nntp server 1.1.1.1";
        let forest = parse(input);

        assert_eq!(2, forest.len());
        assert_eq!(1, forest[0].children.len());
        assert_eq!(NodeType::VirtualRoot, forest[1].node_type);
        assert_eq!("ntp server 1.1.1.1", forest[1].children[0].id);
    }

    #[test]
    fn test_sibling_sections_at_equal_indent() {
        let input = "interface Gi0/1\n no shutdown\ninterface Gi0/2\n shutdown";
        let forest = parse(input);
        assert_eq!(2, forest.len());
        assert_eq!("interface Gi0/1", forest[0].id);
        assert_eq!("interface Gi0/2", forest[1].id);
        assert_eq!(1, forest[0].children.len());
        assert_eq!(1, forest[1].children.len());
    }

    #[test]
    fn test_command_nests_under_deeper_command() {
        let input = "line vty 0 4\n exec-timeout 5 0\n  session-timeout 10";
        let forest = parse(input);
        let line = &forest[0];
        assert_eq!(NodeType::Section, line.node_type);
        let exec = &line.children[0];
        assert_eq!("exec-timeout 5 0", exec.id);
        assert_eq!(1, exec.children.len());
        assert_eq!("session-timeout 10", exec.children[0].id);
        // the parent command's span covers its child
        assert_eq!(2, exec.loc.end_line);
        assert_eq!(2, line.loc.end_line);
    }

    #[test]
    fn test_section_keeps_deeper_block_starter_child() {
        // Promotion never pops a section ancestor, so address-family nests
        // under router bgp.
        let input = "router bgp 65000\n address-family ipv4 unicast\n  network 10.0.0.0 mask 255.0.0.0";
        let forest = parse(input);

        assert_eq!(1, forest.len());
        let bgp = &forest[0];
        assert_eq!(NodeType::Section, bgp.node_type);
        assert_eq!(1, bgp.children.len());
        let af = &bgp.children[0];
        assert_eq!("address-family ipv4 unicast", af.id);
        assert_eq!(NodeType::Section, af.node_type);
        assert_eq!(1, af.children.len());
        assert_eq!(2, bgp.loc.end_line);
    }

    #[test]
    fn test_comments_and_blanks_are_dropped() {
        let input = "!\n! system section\nhostname R1\n\n   \ninterface Gi0/1\n ! inline note\n no shutdown\n!";
        let forest = parse(input);

        let mut nodes = Vec::new();
        flatten(&forest, &mut nodes);
        let ids: Vec<&str> = nodes
            .iter()
            .filter(|n| n.node_type != NodeType::VirtualRoot)
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(
            vec!["hostname R1", "interface Gi0/1", "no shutdown"],
            ids
        );
    }

    #[test]
    fn test_preorder_reproduces_surviving_lines() {
        let input = "hostname R1\ninterface Gi0/1\n description a\n ip address 10.0.0.1 255.255.255.0\nntp server 1.1.1.1\nline vty 0 4\n transport input ssh";
        let forest = parse(input);

        let mut nodes = Vec::new();
        flatten(&forest, &mut nodes);
        let raw: Vec<&str> = nodes
            .iter()
            .filter(|n| n.node_type != NodeType::VirtualRoot)
            .map(|n| n.raw_text.as_str())
            .collect();
        let expected: Vec<&str> = input.split('\n').collect();
        assert_eq!(expected, raw);
    }

    #[test]
    fn test_deterministic() {
        let input = "interface Gi0/1\n description x\nvlan 10\nsnmp-server community public RO";
        assert_eq!(parse(input), parse(input));
    }

    #[test]
    fn test_parent_indent_invariant() {
        let input = "interface Gi0/1\nip address 10.0.0.1 255.255.255.0\n no shutdown\nhostname R1\nrouter ospf 1\n network 0.0.0.0 255.255.255.255 area 0";
        let forest = parse(input);

        fn check(parent: &ConfigNode) {
            for child in &parent.children {
                assert!(
                    child.indent > parent.indent
                        || parent.node_type == NodeType::Section
                        || parent.node_type == NodeType::VirtualRoot,
                    "child {:?} violates the parent invariant under {:?}",
                    child.id,
                    parent.id
                );
                check(child);
            }
        }
        for root in &forest {
            check(root);
        }
    }

    #[test]
    fn test_stable_under_trailing_blanks_and_comments() {
        let input = "interface Gi0/1\n no shutdown";
        let forest = parse(input);
        assert_eq!(forest, parse("interface Gi0/1\n no shutdown\n\n!\n!\n"));
        assert_eq!(forest, parse("interface Gi0/1\n no shutdown\n"));
    }

    #[test]
    fn test_start_line_offset() {
        let options = ParserOptions {
            start_line: 100,
            ..ParserOptions::default()
        };
        let forest = parse_with_options("interface Gi0/1\n no shutdown", &options);
        assert_eq!(100, forest[0].loc.start_line);
        assert_eq!(101, forest[0].loc.end_line);
        assert_eq!(101, forest[0].children[0].loc.start_line);
    }

    #[test]
    fn test_snippet_source_tagging() {
        let forest = parse_with_options("no shutdown", &ParserOptions::snippet());
        assert_eq!(Source::Snippet, forest[0].source);
        assert_eq!(Source::Snippet, forest[0].children[0].source);
    }

    #[test]
    fn test_tabs_count_one_column() {
        let input = "interface Gi0/1\n\tno shutdown";
        let forest = parse(input);
        assert_eq!(1, forest[0].children.len());
        assert_eq!(1, forest[0].children[0].indent);
    }

    #[test]
    fn test_params_split_on_whitespace_runs() {
        let forest = parse("ip   address  10.0.0.1   255.255.255.0");
        let node = &forest[0].children[0];
        assert_eq!(
            vec!["ip", "address", "10.0.0.1", "255.255.255.0"],
            node.params
        );
        assert_eq!("ip", node.params[0]);
    }

    #[test]
    fn test_long_lines_skip_starter_detection() {
        let options = ParserOptions {
            max_starter_scan: 20,
            ..ParserOptions::default()
        };
        let long = format!("interface {}", "G".repeat(32));
        let forest = parse_with_options(&long, &options);
        // over the scan cap the line is parsed as a plain command
        assert_eq!(NodeType::VirtualRoot, forest[0].node_type);
        assert_eq!(NodeType::Command, forest[0].children[0].node_type);
    }

    #[test]
    fn test_virtual_root_runs_broken_by_sections() {
        let input = "hostname R1\nclock timezone UTC 0\ninterface Gi0/1\nntp server 1.1.1.1\nntp server 2.2.2.2\nvlan 10\nlogging host 10.1.1.1";
        let forest = parse(input);
        let kinds: Vec<NodeType> = forest.iter().map(|n| n.node_type).collect();
        assert_eq!(
            vec![
                NodeType::VirtualRoot,
                NodeType::Section,
                NodeType::VirtualRoot,
                NodeType::Section,
                NodeType::VirtualRoot
            ],
            kinds
        );
        assert_eq!(2, forest[0].children.len());
        assert_eq!(2, forest[2].children.len());
        assert_eq!(1, forest[4].children.len());
    }

    #[test]
    fn test_exotic_whitespace_in_ids_is_sanitized_but_raw_is_kept() {
        let input = "interface\u{00A0}Gi0/1";
        let forest = parse(input);
        assert_eq!("interface Gi0/1", forest[0].id);
        assert_eq!(NodeType::Section, forest[0].node_type);
        assert_eq!(input, forest[0].raw_text);
    }

    #[test]
    fn test_wire_shape_field_order() {
        let forest = parse("interface Gi0/1\n no shutdown");
        // a leaf node has every key exactly once, so string positions give
        // the serialized field order
        let json = serde_json::to_string(&forest[0].children[0]).expect("serializes");
        let pos = |needle: &str| json.find(needle).expect("field present");
        assert!(pos("\"id\"") < pos("\"type\""));
        assert!(pos("\"type\"") < pos("\"raw_text\""));
        assert!(pos("\"raw_text\"") < pos("\"params\""));
        assert!(pos("\"params\"") < pos("\"children\""));
        assert!(pos("\"children\"") < pos("\"source\""));
        assert!(pos("\"source\"") < pos("\"loc\""));
        assert!(pos("\"loc\"") < pos("\"indent\""));
        assert!(json.contains("\"type\":\"command\""));
        assert!(json.contains("\"source\":\"base\""));

        let section = serde_json::to_string(&forest[0]).expect("serializes");
        assert!(section.contains("\"type\":\"section\""));
        let orphans = parse("no shutdown");
        let wrapped = serde_json::to_string(&orphans[0]).expect("serializes");
        assert!(wrapped.contains("\"type\":\"virtual_root\""));
    }
}
