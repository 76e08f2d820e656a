//! JSON text for wire policies, written without recursion.
//!
//! Compiled policies can nest hundreds of thousands of levels deep, well past
//! what serde's recursive `Serialize` can walk on a thread stack. The writer
//! here drives an explicit work stack instead and produces the same text
//! `serde_json::to_string` / `to_string_pretty` would for a shallow tree.
//! Leaf payloads (headers and values) are bounded in depth and still go
//! through serde.

use serde::Serialize;

use crate::types::{WirePolicy, WirePred};

impl WirePolicy {
    /// Compact JSON, one line.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        emit(self, false)
    }

    /// JSON indented by two spaces per level.
    pub fn to_json_string_pretty(&self) -> Result<String, serde_json::Error> {
        emit(self, true)
    }
}

// ── Writer ──────────────────────────────────────────────────────────

struct Writer {
    out: String,
    pretty: bool,
    /// One entry per open object or array: whether it has a member yet.
    open: Vec<bool>,
}

impl Writer {
    fn begin(&mut self, bracket: char) {
        self.out.push(bracket);
        self.open.push(false);
    }

    fn end(&mut self, bracket: char) {
        let has_members = self.open.pop().unwrap_or(false);
        if self.pretty && has_members {
            self.newline();
        }
        self.out.push(bracket);
    }

    fn newline(&mut self) {
        self.out.push('\n');
        for _ in 0..self.open.len() {
            self.out.push_str("  ");
        }
    }

    /// Separator before the next member of the innermost container.
    fn next_member(&mut self) {
        if let Some(has_members) = self.open.last_mut() {
            if *has_members {
                self.out.push(',');
            }
            *has_members = true;
        }
        if self.pretty {
            self.newline();
        }
    }

    fn key(&mut self, name: &str) {
        self.next_member();
        self.out.push('"');
        self.out.push_str(name);
        self.out.push('"');
        self.out.push_str(if self.pretty { ": " } else { ":" });
    }

    /// Opens a node object and writes its `"type"` tag.
    fn node(&mut self, tag: &str) {
        self.begin('{');
        self.key("type");
        self.out.push('"');
        self.out.push_str(tag);
        self.out.push('"');
    }

    fn leaf<T: Serialize>(&mut self, value: &T) -> Result<(), serde_json::Error> {
        if self.pretty {
            let text = serde_json::to_string_pretty(value)?;
            let mut indent = String::from("\n");
            for _ in 0..self.open.len() {
                indent.push_str("  ");
            }
            // JSON strings never hold a raw newline, so every one is layout.
            self.out.push_str(&text.replace('\n', &indent));
        } else {
            self.out.push_str(&serde_json::to_string(value)?);
        }
        Ok(())
    }
}

// ── Traversal ───────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Node<'a> {
    Policy(&'a WirePolicy),
    Pred(&'a WirePred),
}

enum Step<'a> {
    /// A node written straight after its key.
    Value(Node<'a>),
    /// A node written as an array element.
    Element(Node<'a>),
    Close(char),
}

fn emit(root: &WirePolicy, pretty: bool) -> Result<String, serde_json::Error> {
    let mut w = Writer {
        out: String::new(),
        pretty,
        open: Vec::new(),
    };
    let mut steps = vec![Step::Value(Node::Policy(root))];

    while let Some(step) = steps.pop() {
        let node = match step {
            Step::Close(bracket) => {
                w.end(bracket);
                continue;
            }
            Step::Element(node) => {
                w.next_member();
                node
            }
            Step::Value(node) => node,
        };

        match node {
            Node::Policy(WirePolicy::Filter { pred }) => {
                w.node("filter");
                w.key("pred");
                steps.push(Step::Close('}'));
                steps.push(Step::Value(Node::Pred(pred)));
            }
            Node::Policy(WirePolicy::Mod { header, value }) => {
                w.node("mod");
                w.key("header");
                w.leaf(header)?;
                w.key("value");
                w.leaf(value)?;
                w.end('}');
            }
            Node::Policy(WirePolicy::Union { pols }) => {
                open_list(&mut w, &mut steps, "union", "pols", pols.iter().map(Node::Policy));
            }
            Node::Policy(WirePolicy::Disjoint { pols }) => {
                open_list(&mut w, &mut steps, "disjoint", "pols", pols.iter().map(Node::Policy));
            }
            Node::Policy(WirePolicy::Seq { pols }) => {
                open_list(&mut w, &mut steps, "seq", "pols", pols.iter().map(Node::Policy));
            }
            Node::Pred(WirePred::Test { header, value }) => {
                w.node("test");
                w.key("header");
                w.leaf(header)?;
                w.key("value");
                w.leaf(value)?;
                w.end('}');
            }
            Node::Pred(WirePred::True) => {
                w.node("true");
                w.end('}');
            }
            Node::Pred(WirePred::False) => {
                w.node("false");
                w.end('}');
            }
            Node::Pred(WirePred::Neg { pred }) => {
                w.node("neg");
                w.key("pred");
                steps.push(Step::Close('}'));
                steps.push(Step::Value(Node::Pred(pred)));
            }
            Node::Pred(WirePred::And { preds }) => {
                open_list(&mut w, &mut steps, "and", "preds", preds.iter().map(Node::Pred));
            }
            Node::Pred(WirePred::Or { preds }) => {
                open_list(&mut w, &mut steps, "or", "preds", preds.iter().map(Node::Pred));
            }
        }
    }

    Ok(w.out)
}

/// Writes `{"type": tag, key: [` and schedules the children and both closers.
fn open_list<'a, I>(w: &mut Writer, steps: &mut Vec<Step<'a>>, tag: &str, key: &str, children: I)
where
    I: DoubleEndedIterator<Item = Node<'a>>,
{
    w.node(tag);
    w.key(key);
    w.begin('[');
    steps.push(Step::Close('}'));
    steps.push(Step::Close(']'));
    steps.extend(children.rev().map(Step::Element));
}

#[cfg(test)]
mod tests {
    use crate::types::*;

    fn every_node_kind() -> WirePolicy {
        WirePolicy::Union {
            pols: vec![
                WirePolicy::Seq {
                    pols: vec![
                        WirePolicy::filter(WirePred::And {
                            preds: vec![
                                WirePred::Test {
                                    header: WireHeader::Ip4Src,
                                    value: WireValue::Ip(IpMask {
                                        addr: "10.0.0.1".to_string(),
                                        mask: 32,
                                    }),
                                },
                                WirePred::neg(WirePred::Or {
                                    preds: vec![WirePred::True, WirePred::False],
                                }),
                                WirePred::And { preds: vec![] },
                            ],
                        }),
                        WirePolicy::Mod {
                            header: WireHeader::Location,
                            value: WireValue::Location(Location::Physical { port: 2 }),
                        },
                        WirePolicy::Mod {
                            header: WireHeader::EthDst,
                            value: WireValue::Text("00:00:00:00:00:02".to_string()),
                        },
                    ],
                },
                WirePolicy::Disjoint { pols: vec![] },
                WirePolicy::Mod {
                    header: WireHeader::Vlan,
                    value: WireValue::Int(10),
                },
            ],
        }
    }

    #[test]
    fn test_compact_matches_serde() {
        let pol = every_node_kind();
        assert_eq!(
            pol.to_json_string().unwrap(),
            serde_json::to_string(&pol).unwrap()
        );
    }

    #[test]
    fn test_pretty_matches_serde() {
        let pol = every_node_kind();
        assert_eq!(
            pol.to_json_string_pretty().unwrap(),
            serde_json::to_string_pretty(&pol).unwrap()
        );
    }

    #[test]
    fn test_single_leaf() {
        let pol = WirePolicy::filter(WirePred::True);
        assert_eq!(
            pol.to_json_string().unwrap(),
            r#"{"type":"filter","pred":{"type":"true"}}"#
        );
        assert_eq!(
            pol.to_json_string_pretty().unwrap(),
            "{\n  \"type\": \"filter\",\n  \"pred\": {\n    \"type\": \"true\"\n  }\n}"
        );
    }

    #[test]
    fn test_deep_seq_chain() {
        let depth = 200_000;
        let mut pol = WirePolicy::filter(WirePred::True);
        for _ in 0..depth {
            pol = WirePolicy::Seq {
                pols: vec![WirePolicy::filter(WirePred::False), pol],
            };
        }
        let text = pol.to_json_string().unwrap();
        assert!(text.starts_with(r#"{"type":"seq","pols":[{"type":"filter""#));
        assert_eq!(text.matches(r#""type":"seq""#).count(), depth);
        assert!(text.ends_with(&"]}".repeat(depth)));
    }

    #[test]
    fn test_deep_neg_chain() {
        let depth = 200_000;
        let mut pred = WirePred::True;
        for _ in 0..depth {
            pred = WirePred::neg(pred);
        }
        let text = WirePolicy::filter(pred).to_json_string().unwrap();
        assert_eq!(text.matches(r#""type":"neg""#).count(), depth);
        assert!(text.contains(r#""pred":{"type":"true"}"#));
    }
}
