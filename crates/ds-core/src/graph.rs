use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::DialogueError;
use crate::expr::Expression;

pub type NodeIndex = usize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NodeKind {
    Start,
    End,
    #[serde(rename_all = "camelCase")]
    Text {
        speaker_id: String,
        text: String,
        #[serde(default)]
        param_names: Vec<String>,
    },
    Choice,
    Select,
    #[serde(rename_all = "camelCase")]
    SetVariable { target: String, value: Expression },
    Event {
        name: String,
        #[serde(default)]
        args: Vec<Expression>,
    },
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Text { .. } => "text",
            Self::Choice => "choice",
            Self::Select => "select",
            Self::SetVariable { .. } => "setVariable",
            Self::Event { .. } => "event",
        }
    }

    fn max_edges(&self) -> Option<usize> {
        match self {
            Self::End => Some(0),
            Self::Start | Self::Text { .. } | Self::SetVariable { .. } | Self::Event { .. } => {
                Some(1)
            }
            Self::Choice | Self::Select => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<Expression>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub param_names: Vec<String>,
}

impl EdgeDef {
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            to: Some(target.into()),
            id: None,
            text: None,
            guard: None,
            param_names: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
    pub id: String,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default)]
    pub edges: Vec<EdgeDef>,
}

/// Serialized form of a compiled script, as produced by an external compiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDef {
    pub start: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    pub nodes: Vec<NodeDef>,
}

/// Points at a real edge in the graph: the `edge`-th outgoing edge of `node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeRef {
    pub node: NodeIndex,
    pub edge: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: Option<String>,
    pub text: Option<String>,
    pub guard: Option<Expression>,
    pub param_names: Vec<String>,
    target: Option<NodeIndex>,
}

impl Edge {
    /// `None` when the edge leads nowhere, which ends the dialogue.
    pub fn target(&self) -> Option<NodeIndex> {
        self.target
    }

    pub fn display_text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// An edge without display text is structural, never a user-facing option.
    pub fn is_silent(&self) -> bool {
        self.display_text().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub edges: Vec<Edge>,
}

impl Node {
    pub fn is_observable_kind(&self) -> bool {
        matches!(self.kind, NodeKind::Text { .. } | NodeKind::Choice)
    }
}

/// Immutable, validated dialogue graph. Nodes live in an arena and all links
/// are indices into it, so one graph can back any number of dialogues.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptGraph {
    nodes: Vec<Node>,
    index_by_id: HashMap<String, NodeIndex>,
    edge_ids: HashSet<String>,
    start: NodeIndex,
    header: Option<NodeIndex>,
    labels: BTreeMap<String, NodeIndex>,
}

fn placeholder_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_.]*)\}").expect("placeholder regex must compile")
    })
}

/// Names of the `{name}` placeholders in a line, in first-use order.
pub fn extract_param_names(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for captures in placeholder_regex().captures_iter(text) {
        if let Some(name) = captures.get(1) {
            if !names.iter().any(|existing| existing == name.as_str()) {
                names.push(name.as_str().to_string());
            }
        }
    }
    names
}

/// Replaces each `{name}` placeholder with what `lookup` returns for it.
/// Placeholders `lookup` does not know are left as written.
pub fn fill_placeholders(text: &str, mut lookup: impl FnMut(&str) -> Option<String>) -> String {
    placeholder_regex()
        .replace_all(text, |captures: &regex::Captures<'_>| {
            lookup(&captures[1]).unwrap_or_else(|| captures[0].to_string())
        })
        .into_owned()
}

impl ScriptGraph {
    pub fn from_json(raw: &str) -> Result<Self, DialogueError> {
        let def: GraphDef = serde_json::from_str(raw)
            .map_err(|error| DialogueError::new("GRAPH_FORMAT", error.to_string()))?;
        Self::from_def(def)
    }

    pub fn from_def(def: GraphDef) -> Result<Self, DialogueError> {
        let mut index_by_id = HashMap::new();
        for (index, node) in def.nodes.iter().enumerate() {
            if index_by_id.insert(node.id.clone(), index).is_some() {
                return Err(DialogueError::new(
                    "GRAPH_DUPLICATE_NODE",
                    format!("Node id \"{}\" is declared more than once.", node.id),
                ));
            }
        }

        let resolve = |id: &str, context: &str| -> Result<NodeIndex, DialogueError> {
            index_by_id.get(id).copied().ok_or_else(|| {
                DialogueError::new(
                    "GRAPH_UNKNOWN_TARGET",
                    format!("{} refers to unknown node \"{}\".", context, id),
                )
            })
        };

        let start = resolve(&def.start, "Graph start")?;
        if def.nodes[start].kind != NodeKind::Start {
            return Err(DialogueError::new(
                "GRAPH_START",
                format!("Start node \"{}\" is not a start node.", def.start),
            ));
        }
        let header = def
            .header
            .as_deref()
            .map(|id| resolve(id, "Graph header"))
            .transpose()?;
        let mut labels = BTreeMap::new();
        for (label, id) in &def.labels {
            labels.insert(label.clone(), resolve(id, &format!("Label \"{}\"", label))?);
        }

        let mut edge_ids = HashSet::new();
        let mut nodes = Vec::with_capacity(def.nodes.len());
        for node_def in &def.nodes {
            if let Some(max) = node_def.kind.max_edges() {
                if node_def.edges.len() > max {
                    return Err(DialogueError::new(
                        "GRAPH_EDGE_COUNT",
                        format!(
                            "Node \"{}\" ({}) has {} edges, at most {} allowed.",
                            node_def.id,
                            node_def.kind.name(),
                            node_def.edges.len(),
                            max
                        ),
                    ));
                }
            }

            let is_select = node_def.kind == NodeKind::Select;
            let is_choice = node_def.kind == NodeKind::Choice;
            let mut fallbacks = 0usize;
            let mut edges = Vec::with_capacity(node_def.edges.len());
            for edge_def in &node_def.edges {
                if edge_def.guard.is_some() && !is_select {
                    return Err(DialogueError::new(
                        "GRAPH_GUARD_PLACEMENT",
                        format!(
                            "Node \"{}\" has a guarded edge but is not a select node.",
                            node_def.id
                        ),
                    ));
                }
                if is_select && edge_def.guard.is_none() {
                    fallbacks += 1;
                    if fallbacks > 1 {
                        return Err(DialogueError::new(
                            "GRAPH_SELECT_FALLBACK",
                            format!(
                                "Select node \"{}\" has more than one unguarded edge.",
                                node_def.id
                            ),
                        ));
                    }
                }
                if edge_def.text.is_some() && !is_choice {
                    return Err(DialogueError::new(
                        "GRAPH_EDGE_TEXT",
                        format!(
                            "Node \"{}\" carries choice text but is not a choice node.",
                            node_def.id
                        ),
                    ));
                }
                let has_text = edge_def.text.as_deref().is_some_and(|text| !text.is_empty());
                if has_text && edge_def.id.is_none() {
                    return Err(DialogueError::new(
                        "GRAPH_CHOICE_EDGE_ID",
                        format!(
                            "Node \"{}\" offers an option without an edge id.",
                            node_def.id
                        ),
                    ));
                }
                if let Some(edge_id) = &edge_def.id {
                    if !edge_ids.insert(edge_id.clone()) {
                        return Err(DialogueError::new(
                            "GRAPH_DUPLICATE_EDGE",
                            format!("Edge id \"{}\" is declared more than once.", edge_id),
                        ));
                    }
                }
                let target = edge_def
                    .to
                    .as_deref()
                    .map(|id| resolve(id, &format!("Edge of node \"{}\"", node_def.id)))
                    .transpose()?;
                let param_names = if edge_def.param_names.is_empty() {
                    extract_param_names(edge_def.text.as_deref().unwrap_or(""))
                } else {
                    edge_def.param_names.clone()
                };
                edges.push(Edge {
                    id: edge_def.id.clone(),
                    text: edge_def.text.clone(),
                    guard: edge_def.guard.clone(),
                    param_names,
                    target,
                });
            }

            let kind = match &node_def.kind {
                NodeKind::Text {
                    speaker_id,
                    text,
                    param_names,
                } if param_names.is_empty() => NodeKind::Text {
                    speaker_id: speaker_id.clone(),
                    text: text.clone(),
                    param_names: extract_param_names(text),
                },
                other => other.clone(),
            };
            nodes.push(Node {
                id: node_def.id.clone(),
                kind,
                edges,
            });
        }

        Ok(Self {
            nodes,
            index_by_id,
            edge_ids,
            start,
            header,
            labels,
        })
    }

    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.index_by_id.get(id).copied()
    }

    pub fn node_by_id(&self, id: &str) -> Option<&Node> {
        self.node_index(id).and_then(|index| self.node(index))
    }

    pub fn edge(&self, edge_ref: EdgeRef) -> Option<&Edge> {
        self.node(edge_ref.node)
            .and_then(|node| node.edges.get(edge_ref.edge))
    }

    pub fn has_edge_id(&self, id: &str) -> bool {
        self.edge_ids.contains(id)
    }

    pub fn start_index(&self) -> NodeIndex {
        self.start
    }

    pub fn header_index(&self) -> Option<NodeIndex> {
        self.header
    }

    pub fn label_index(&self, label: &str) -> Option<NodeIndex> {
        self.labels.get(label).copied()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.keys().map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }
}
