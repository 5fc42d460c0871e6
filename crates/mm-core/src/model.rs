//! Core data model for mind-map documents.
//!
//! A document is an ordered list of sheets. Each sheet owns a flat
//! [`NodeStore`] keyed by [`NodeId`]; tree edges are stored ids
//! (`children` on the parent, `parent_id` on the child), never references.
//! Positions (`x`, `y`) are derived by the layout engine, sizes (`width`,
//! `height`) by the text-measurement collaborator.

use crate::error::TreeError;
use crate::id::{NodeId, SheetId};
use crate::theme::Tier;
use petgraph::Direction;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

// ─── Styling ─────────────────────────────────────────────────────────────

/// Outline shape of a topic box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Shape {
    Rectangle,
    Rounded,
    Ellipse,
    Diamond,
    Capsule,
    Hexagon,
    Cloud,
    Underline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BorderStyle {
    Solid,
    Dashed,
    Dotted,
    None,
}

/// How the connector from a parent to its children is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineStyle {
    Straight,
    Bezier,
    Step,
    #[serde(rename = "hand-drawn")]
    HandDrawn,
}

/// Visual attributes of a topic. Every field is optional so a style can act
/// as a partial override layered over a theme tier default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_style: Option<BorderStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_blur: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Shape>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_style: Option<LineStyle>,
}

impl NodeStyle {
    /// Shallow-merge `src` into `self`, overwriting only `Some` fields.
    pub fn merge(&mut self, src: &NodeStyle) {
        if src.background_color.is_some() {
            self.background_color = src.background_color.clone();
        }
        if src.color.is_some() {
            self.color = src.color.clone();
        }
        if src.border_color.is_some() {
            self.border_color = src.border_color.clone();
        }
        if src.border_width.is_some() {
            self.border_width = src.border_width;
        }
        if src.border_style.is_some() {
            self.border_style = src.border_style;
        }
        if src.border_radius.is_some() {
            self.border_radius = src.border_radius;
        }
        if src.shadow_color.is_some() {
            self.shadow_color = src.shadow_color.clone();
        }
        if src.shadow_blur.is_some() {
            self.shadow_blur = src.shadow_blur;
        }
        if src.font_size.is_some() {
            self.font_size = src.font_size;
        }
        if src.shape.is_some() {
            self.shape = src.shape;
        }
        if src.line_style.is_some() {
            self.line_style = src.line_style;
        }
    }

    /// True when this (partial) style touches a field that changes the
    /// measured box: font size, shape, or border width.
    pub fn affects_geometry(&self) -> bool {
        self.font_size.is_some() || self.shape.is_some() || self.border_width.is_some()
    }

    pub fn is_empty(&self) -> bool {
        *self == NodeStyle::default()
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// A single topic in a sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub text: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Child ids in display order.
    #[serde(default)]
    pub children: SmallVec<[NodeId; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_root: bool,
    /// The node's own style override; `None` means "tier default only".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<NodeStyle>,
}

impl Node {
    pub fn new(id: NodeId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            children: SmallVec::new(),
            parent_id: None,
            is_root: false,
            style: None,
        }
    }

    /// A root topic: `is_root` set, no parent.
    pub fn root(id: NodeId, text: impl Into<String>) -> Self {
        Self {
            is_root: true,
            ..Self::new(id, text)
        }
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_parent(mut self, parent: NodeId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    pub fn with_style(mut self, style: NodeStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

// ─── Node store ──────────────────────────────────────────────────────────

/// Flat id → node map scoped to one sheet.
///
/// The store is passive: it never re-links nodes on its own. Lookups that
/// feed an edit go through [`NodeStore::node`] so absence is an explicit
/// [`TreeError::NodeNotFound`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeStore {
    nodes: HashMap<NodeId, Node>,
}

impl NodeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Checked lookup.
    pub fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.nodes.get(&id).ok_or(TreeError::NodeNotFound(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.nodes.get_mut(&id).ok_or(TreeError::NodeNotFound(id))
    }

    /// Insert or replace a node under its own id.
    pub fn insert(&mut self, node: Node) -> Option<Node> {
        self.nodes.insert(node.id, node)
    }

    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        self.nodes.remove(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Children of `id` in display order. Dangling ids are skipped.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &Node> {
        self.nodes
            .get(&id)
            .into_iter()
            .flat_map(|n| n.children.iter())
            .filter_map(|c| self.nodes.get(c))
    }

    /// Walk parent links upward starting at `id`'s parent.
    ///
    /// Stops at the root, at a missing link, or after `len()` steps, so it
    /// terminates even on a store that already contains a cycle.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            store: self,
            next: self.nodes.get(&id).and_then(|n| n.parent_id),
            budget: self.nodes.len(),
        }
    }

    /// Check if `ancestor` is a parent/grandparent/etc. of `descendant`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        ancestor != descendant && self.ancestors(descendant).any(|a| a == ancestor)
    }

    /// Number of parent links between `id` and its root.
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// `id` and all of its descendants in pre-order. Each id is visited once
    /// and dangling children are ignored.
    pub fn subtree_ids(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut seen = HashSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            out.push(current);
            // Reverse so the first child is popped first.
            stack.extend(
                node.children
                    .iter()
                    .rev()
                    .filter(|c| self.nodes.contains_key(c)),
            );
        }
        out
    }
}

impl FromIterator<Node> for NodeStore {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().map(|n| (n.id, n)).collect(),
        }
    }
}

/// Iterator returned by [`NodeStore::ancestors`].
pub struct Ancestors<'a> {
    store: &'a NodeStore,
    next: Option<NodeId>,
    budget: usize,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.budget == 0 {
            return None;
        }
        self.budget -= 1;
        let current = self.next.take()?;
        let node = self.store.get(current)?;
        if !node.is_root {
            self.next = node.parent_id;
        }
        Some(current)
    }
}

// ─── Sheets ──────────────────────────────────────────────────────────────

/// Which tree layout algorithm positions a sheet's topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayoutKind {
    /// Root on the left, branches grow rightward.
    #[default]
    Logic,
    /// Root in the center, first-level branches alternate right/left.
    Mindmap,
    /// Root on top, levels stack downward.
    OrgChart,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub x: f32,
    pub y: f32,
}

/// Per-sheet viewport and selection. Changes here are never recorded in
/// history on their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorState {
    pub zoom: f32,
    pub offset: Offset,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_id: Option<NodeId>,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            offset: Offset::default(),
            selected_id: None,
        }
    }
}

/// One independent mind-map canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    pub id: SheetId,
    pub title: String,
    pub root_id: NodeId,
    pub nodes: NodeStore,
    pub theme: String,
    #[serde(default)]
    pub layout: LayoutKind,
    #[serde(default)]
    pub editor_state: EditorState,
}

impl Sheet {
    /// Create a sheet holding only `root`.
    pub fn new(id: SheetId, title: impl Into<String>, root: Node, theme: impl Into<String>) -> Self {
        let root_id = root.id;
        let mut nodes = NodeStore::new();
        nodes.insert(root);
        Self {
            id,
            title: title.into(),
            root_id,
            nodes,
            theme: theme.into(),
            layout: LayoutKind::default(),
            editor_state: EditorState::default(),
        }
    }

    pub fn root(&self) -> Option<&Node> {
        self.nodes.get(self.root_id)
    }

    /// Depth class of `id`: root, direct child of the root, or deeper.
    pub fn tier_of(&self, id: NodeId) -> Option<Tier> {
        let node = self.nodes.get(id)?;
        if node.is_root {
            return Some(Tier::Root);
        }
        let parent_is_root = node
            .parent_id
            .and_then(|p| self.nodes.get(p))
            .is_some_and(|p| p.is_root);
        Some(if parent_is_root {
            Tier::Primary
        } else {
            Tier::Secondary
        })
    }

    /// Check every tree invariant: a single root without a parent, children
    /// that exist and point back at their parent, no duplicates, no cycles,
    /// and every node reachable from the root.
    pub fn validate(&self) -> Result<(), TreeError> {
        let fail = |msg: String| Err(TreeError::Invariant(format!("sheet {}: {msg}", self.id)));

        let Some(root) = self.nodes.get(self.root_id) else {
            return fail(format!("root {} missing", self.root_id));
        };
        if !root.is_root || root.parent_id.is_some() {
            return fail(format!("{} is not a parentless root", self.root_id));
        }
        let roots = self.nodes.iter().filter(|n| n.is_root).count();
        if roots != 1 {
            return fail(format!("expected exactly one root, found {roots}"));
        }

        let mut graph: DiGraph<NodeId, ()> =
            DiGraph::with_capacity(self.nodes.len(), self.nodes.len());
        let index: HashMap<NodeId, NodeIndex> = self
            .nodes
            .nodes
            .iter()
            .map(|(key, node)| (*key, graph.add_node(node.id)))
            .collect();

        for (key, node) in &self.nodes.nodes {
            if *key != node.id {
                return fail(format!("{} stored under key {key}", node.id));
            }
            let mut seen = HashSet::new();
            for child in &node.children {
                if !seen.insert(*child) {
                    return fail(format!("{child} listed twice under {}", node.id));
                }
                let Some(child_node) = self.nodes.get(*child) else {
                    return fail(format!("{} lists missing child {child}", node.id));
                };
                if child_node.parent_id != Some(node.id) {
                    return fail(format!("{child} does not point back at {}", node.id));
                }
                graph.add_edge(index[&node.id], index[child], ());
            }
            if let Some(parent) = node.parent_id {
                let listed = self
                    .nodes
                    .get(parent)
                    .is_some_and(|p| p.children.contains(&node.id));
                if !listed {
                    return fail(format!("{} is not listed by its parent {parent}", node.id));
                }
            } else if !node.is_root {
                return fail(format!("non-root {} has no parent", node.id));
            }
        }

        if is_cyclic_directed(&graph) {
            return fail("parent/child relation contains a cycle".into());
        }
        if let Some(idx) = graph
            .node_indices()
            .find(|&i| graph.neighbors_directed(i, Direction::Incoming).count() > 1)
        {
            return fail(format!("{} has more than one parent", graph[idx]));
        }

        let mut reached = 0;
        let mut bfs = Bfs::new(&graph, index[&self.root_id]);
        while bfs.next(&graph).is_some() {
            reached += 1;
        }
        if reached != self.nodes.len() {
            return fail(format!(
                "{} of {} nodes unreachable from root",
                self.nodes.len() - reached,
                self.nodes.len()
            ));
        }
        Ok(())
    }
}

// ─── Document ────────────────────────────────────────────────────────────

/// The complete document: sheets in tab order plus the active sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub version: String,
    pub sheets: Vec<Sheet>,
    pub active_sheet_id: SheetId,
}

impl Document {
    /// Format version written by this crate.
    pub const VERSION: &'static str = "0.7.0";

    /// A document holding a single, active sheet.
    pub fn new(sheet: Sheet) -> Self {
        Self {
            version: Self::VERSION.to_string(),
            active_sheet_id: sheet.id,
            sheets: vec![sheet],
        }
    }

    pub fn sheet_index(&self, id: SheetId) -> Option<usize> {
        self.sheets.iter().position(|s| s.id == id)
    }

    pub fn sheet(&self, id: SheetId) -> Result<&Sheet, TreeError> {
        self.sheets
            .iter()
            .find(|s| s.id == id)
            .ok_or(TreeError::SheetNotFound(id))
    }

    pub fn sheet_mut(&mut self, id: SheetId) -> Result<&mut Sheet, TreeError> {
        self.sheets
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(TreeError::SheetNotFound(id))
    }

    pub fn active_sheet(&self) -> Option<&Sheet> {
        self.sheet(self.active_sheet_id).ok()
    }

    pub fn active_sheet_mut(&mut self) -> Option<&mut Sheet> {
        let id = self.active_sheet_id;
        self.sheet_mut(id).ok()
    }

    /// Validate every sheet, unique sheet ids, and the active sheet pointer.
    pub fn validate(&self) -> Result<(), TreeError> {
        if self.sheets.is_empty() {
            return Err(TreeError::Invariant("document has no sheets".into()));
        }
        let mut ids = HashSet::new();
        let mut owners: HashMap<NodeId, SheetId> = HashMap::new();
        for sheet in &self.sheets {
            if !ids.insert(sheet.id) {
                return Err(TreeError::Invariant(format!("duplicate sheet {}", sheet.id)));
            }
            for id in sheet.nodes.ids() {
                if let Some(other) = owners.insert(id, sheet.id) {
                    return Err(TreeError::Invariant(format!(
                        "node {id} shared by sheets {other} and {}",
                        sheet.id
                    )));
                }
            }
            sheet.validate()?;
        }
        if !ids.contains(&self.active_sheet_id) {
            return Err(TreeError::Invariant(format!(
                "active sheet {} does not exist",
                self.active_sheet_id
            )));
        }
        Ok(())
    }
}
