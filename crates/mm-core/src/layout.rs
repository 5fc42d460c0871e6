//! Tidy-tree layout engine.
//!
//! All three algorithms run in two passes over a sheet's node store:
//!
//! 1. **Aggregate** (post-order): each subtree's footprint along the stacking
//!    axis is cached per node: heights for Logic/Mindmap, widths for
//!    Org-chart.
//! 2. **Place** (pre-order): absolute `x`/`y` are assigned from the cache,
//!    centering each node's children block on the node's own center line.
//!
//! The engine only moves nodes; sizes are inputs. It never fails: a missing
//! root is a no-op, dangling or repeated child ids are skipped with a
//! warning, and nodes unreachable from the root are left untouched.

use crate::id::NodeId;
use crate::model::{LayoutKind, Node, NodeStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─── Config ──────────────────────────────────────────────────────────────

/// Spacing used by the layout algorithms, in canvas pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Vertical gap between consecutive siblings (Logic, Mindmap).
    pub sibling_gap: f32,
    /// Horizontal gap from a parent at depth `i` to its children. The last
    /// entry repeats for deeper levels.
    pub level_gaps: Vec<f32>,
    /// Horizontal gap between consecutive siblings (Org-chart).
    pub org_sibling_gap: f32,
    /// Vertical gap between levels (Org-chart).
    pub org_level_gap: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            sibling_gap: 20.0,
            level_gaps: vec![64.0, 40.0, 32.0],
            org_sibling_gap: 20.0,
            org_level_gap: 50.0,
        }
    }
}

impl LayoutConfig {
    /// Horizontal gap between a parent at `depth` and its children.
    pub fn level_gap(&self, depth: usize) -> f32 {
        self.level_gaps
            .get(depth)
            .or_else(|| self.level_gaps.last())
            .copied()
            .unwrap_or(0.0)
    }
}

// ─── Entry points ────────────────────────────────────────────────────────

/// Lay out the tree under `root` with the default spacing.
pub fn apply_layout(root: NodeId, nodes: &mut NodeStore, kind: LayoutKind) {
    apply_layout_with(root, nodes, kind, &LayoutConfig::default());
}

/// Lay out the tree under `root`, overwriting `x`/`y` of every reachable node.
pub fn apply_layout_with(root: NodeId, nodes: &mut NodeStore, kind: LayoutKind, config: &LayoutConfig) {
    let (axis, gap) = match kind {
        LayoutKind::Logic | LayoutKind::Mindmap => (Axis::Vertical, config.sibling_gap),
        LayoutKind::OrgChart => (Axis::Horizontal, config.org_sibling_gap),
    };

    let Some(cache) = aggregate(root, nodes, axis, gap) else {
        log::debug!("layout: root {root} not in store, nothing to do");
        return;
    };

    let placer = Placer {
        cache: &cache,
        config,
    };
    placer.place(nodes, root, kind);
}

// ─── Pass 1: aggregate ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Axis {
    Vertical,
    Horizontal,
}

impl Axis {
    fn extent(self, node: &Node) -> f32 {
        match self {
            Axis::Vertical => node.height,
            Axis::Horizontal => node.width,
        }
    }
}

/// Cached footprint of one subtree.
#[derive(Debug, Clone, Default)]
struct Extent {
    /// max(own extent, children block).
    subtree: f32,
    /// Sum of child footprints plus the gaps between them.
    children: f32,
    /// Children that were laid out, in display order.
    kids: Vec<NodeId>,
}

type ExtentCache = HashMap<NodeId, Extent>;

/// Step of the explicit post-order walk.
enum Visit {
    Enter { id: NodeId, parent: Option<NodeId> },
    Exit(NodeId),
}

/// Post-order walk from `root` with an explicit stack, so tree depth is
/// bounded by the heap rather than the call stack. `None` if `root` is
/// missing.
fn aggregate(root: NodeId, nodes: &NodeStore, axis: Axis, gap: f32) -> Option<ExtentCache> {
    nodes.get(root)?;

    let mut cache = ExtentCache::new();
    let mut stack = vec![Visit::Enter { id: root, parent: None }];
    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter { id, parent } => {
                // A node enters the cache on first visit; later visits are repeats.
                let node = match nodes.get(id) {
                    Some(node) if !cache.contains_key(&id) => node,
                    _ => {
                        if let Some(parent) = parent {
                            log::warn!("layout: skipping child {id} of {parent} (dangling or revisited)");
                        }
                        continue;
                    }
                };
                cache.insert(id, Extent::default());
                if let Some(extent) = parent.and_then(|p| cache.get_mut(&p)) {
                    extent.kids.push(id);
                }
                stack.push(Visit::Exit(id));
                stack.extend(
                    node.children
                        .iter()
                        .rev()
                        .map(|&child| Visit::Enter { id: child, parent: Some(id) }),
                );
            }
            Visit::Exit(id) => {
                let (Some(node), Some(extent)) = (nodes.get(id), cache.get(&id)) else {
                    continue;
                };
                let footprints: f32 = extent
                    .kids
                    .iter()
                    .filter_map(|kid| cache.get(kid))
                    .map(|kid| kid.subtree)
                    .sum();
                let children = footprints + gap * extent.kids.len().saturating_sub(1) as f32;
                let subtree = axis.extent(node).max(children);
                if let Some(extent) = cache.get_mut(&id) {
                    extent.children = children;
                    extent.subtree = subtree;
                }
            }
        }
    }
    Some(cache)
}

// ─── Pass 2: place ───────────────────────────────────────────────────────

/// Which way a horizontal branch grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Right,
    Left,
}

/// A node waiting for its position. Children are pushed once the parent's
/// own box is known.
#[derive(Debug, Clone, Copy)]
struct Frame {
    id: NodeId,
    x: f32,
    y: f32,
    depth: usize,
    side: Side,
}

struct Placer<'a> {
    cache: &'a ExtentCache,
    config: &'a LayoutConfig,
}

impl Placer<'_> {
    fn place(&self, nodes: &mut NodeStore, root: NodeId, kind: LayoutKind) {
        let mut work = Vec::new();
        match kind {
            LayoutKind::Mindmap => self.mindmap_root(nodes, root, &mut work),
            LayoutKind::Logic | LayoutKind::OrgChart => work.push(Frame {
                id: root,
                x: 0.0,
                y: 0.0,
                depth: 0,
                side: Side::Right,
            }),
        }
        while let Some(frame) = work.pop() {
            match kind {
                LayoutKind::OrgChart => self.org(nodes, frame, &mut work),
                LayoutKind::Logic | LayoutKind::Mindmap => self.branch(nodes, frame, &mut work),
            }
        }
    }

    fn set_position(nodes: &mut NodeStore, id: NodeId, x: f32, y: f32) -> Option<(f32, f32)> {
        let node = nodes.get_mut(id)?;
        node.x = x;
        node.y = y;
        Some((node.width, node.height))
    }

    /// Logic-style placement: children stacked vertically, growing toward `side`.
    fn branch(&self, nodes: &mut NodeStore, frame: Frame, work: &mut Vec<Frame>) {
        let Frame { id, x, y, depth, side } = frame;
        let Some(extent) = self.cache.get(&id) else {
            return;
        };
        let Some((width, height)) = Self::set_position(nodes, id, x, y) else {
            return;
        };
        let gap = self.config.level_gap(depth);
        let mut cursor = y + height / 2.0 - extent.children / 2.0;
        for &child in &extent.kids {
            let next = self.stacked(nodes, child, &mut cursor, side, depth + 1, |child_w| match side {
                Side::Right => x + width + gap,
                Side::Left => x - gap - child_w,
            });
            work.extend(next);
        }
    }

    /// Frame for `child` inside its vertical slot starting at `cursor`, which
    /// is advanced past the slot.
    fn stacked(
        &self,
        nodes: &NodeStore,
        child: NodeId,
        cursor: &mut f32,
        side: Side,
        depth: usize,
        child_x: impl Fn(f32) -> f32,
    ) -> Option<Frame> {
        let (Some(extent), Some(node)) = (self.cache.get(&child), nodes.get(child)) else {
            return None;
        };
        let frame = Frame {
            id: child,
            x: child_x(node.width),
            y: *cursor + (extent.subtree - node.height) / 2.0,
            depth,
            side,
        };
        *cursor += extent.subtree + self.config.sibling_gap;
        Some(frame)
    }

    /// Root at the origin; even-indexed children go right, odd go left, and
    /// each side is centered on the root independently.
    fn mindmap_root(&self, nodes: &mut NodeStore, root: NodeId, work: &mut Vec<Frame>) {
        let Some(extent) = self.cache.get(&root) else {
            return;
        };
        let Some((width, height)) = Self::set_position(nodes, root, 0.0, 0.0) else {
            return;
        };

        let (right, left): (Vec<(usize, NodeId)>, Vec<(usize, NodeId)>) =
            extent.kids.iter().copied().enumerate().partition(|(i, _)| i % 2 == 0);
        let gap = self.config.level_gap(0);

        for (group, side) in [(right, Side::Right), (left, Side::Left)] {
            let ids: Vec<NodeId> = group.into_iter().map(|(_, id)| id).collect();
            let mut cursor = height / 2.0 - self.group_extent(&ids) / 2.0;
            for child in ids {
                let next = self.stacked(nodes, child, &mut cursor, side, 1, |child_w| match side {
                    Side::Right => width + gap,
                    Side::Left => -gap - child_w,
                });
                work.extend(next);
            }
        }
    }

    fn group_extent(&self, ids: &[NodeId]) -> f32 {
        let total: f32 = ids
            .iter()
            .filter_map(|id| self.cache.get(id))
            .map(|e| e.subtree)
            .sum();
        total + self.config.sibling_gap * ids.len().saturating_sub(1) as f32
    }

    /// Org-chart placement: children centered horizontally under the parent.
    fn org(&self, nodes: &mut NodeStore, frame: Frame, work: &mut Vec<Frame>) {
        let Frame { id, x, y, depth, .. } = frame;
        let Some(extent) = self.cache.get(&id) else {
            return;
        };
        let Some((width, height)) = Self::set_position(nodes, id, x, y) else {
            return;
        };
        let child_y = y + height + self.config.org_level_gap;
        let mut cursor = x + width / 2.0 - extent.children / 2.0;
        for &child in &extent.kids {
            let (Some(child_extent), Some(node)) = (self.cache.get(&child), nodes.get(child)) else {
                continue;
            };
            work.push(Frame {
                id: child,
                x: cursor + (child_extent.subtree - node.width) / 2.0,
                y: child_y,
                depth: depth + 1,
                side: Side::Right,
            });
            cursor += child_extent.subtree + self.config.org_sibling_gap;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Build a store from `(id, parent, width, height)` rows; the first row is the root.
    fn store(rows: &[(&str, Option<&str>, f32, f32)]) -> NodeStore {
        let mut nodes = NodeStore::new();
        for &(id, parent, w, h) in rows {
            let id = NodeId::intern(id);
            let node = match parent {
                None => Node::root(id, id.as_str()),
                Some(p) => Node::new(id, id.as_str()).with_parent(NodeId::intern(p)),
            };
            nodes.insert(node.with_size(w, h));
        }
        for &(id, parent, _, _) in rows {
            if let Some(p) = parent {
                nodes
                    .get_mut(NodeId::intern(p))
                    .unwrap()
                    .children
                    .push(NodeId::intern(id));
            }
        }
        nodes
    }

    fn pos(nodes: &NodeStore, id: &str) -> (f32, f32) {
        let n = nodes.get(NodeId::intern(id)).unwrap();
        (n.x, n.y)
    }

    #[test]
    fn logic_children_right_of_root() {
        let mut nodes = store(&[
            ("lg_root", None, 100.0, 50.0),
            ("lg_c1", Some("lg_root"), 80.0, 40.0),
            ("lg_c2", Some("lg_root"), 80.0, 40.0),
        ]);
        apply_layout(NodeId::intern("lg_root"), &mut nodes, LayoutKind::Logic);

        assert_eq!(pos(&nodes, "lg_root"), (0.0, 0.0));
        assert_eq!(pos(&nodes, "lg_c1"), (164.0, -25.0));
        assert_eq!(pos(&nodes, "lg_c2"), (164.0, 35.0));
    }

    #[test]
    fn logic_gap_shrinks_with_depth() {
        let mut nodes = store(&[
            ("gap_root", None, 100.0, 50.0),
            ("gap_l1", Some("gap_root"), 80.0, 40.0),
            ("gap_l2", Some("gap_l1"), 80.0, 40.0),
            ("gap_l3", Some("gap_l2"), 80.0, 40.0),
            ("gap_l4", Some("gap_l3"), 80.0, 40.0),
        ]);
        apply_layout(NodeId::intern("gap_root"), &mut nodes, LayoutKind::Logic);

        let xs: Vec<f32> = ["gap_l1", "gap_l2", "gap_l3", "gap_l4"]
            .iter()
            .map(|id| pos(&nodes, id).0)
            .collect();
        assert_eq!(xs, vec![164.0, 284.0, 396.0, 508.0]);
    }

    #[test]
    fn single_child_is_centered_on_parent() {
        let mut nodes = store(&[
            ("one_root", None, 100.0, 50.0),
            ("one_c", Some("one_root"), 80.0, 40.0),
        ]);
        apply_layout(NodeId::intern("one_root"), &mut nodes, LayoutKind::Logic);
        // Center lines match: 0 + 50/2 == 5 + 40/2.
        assert_eq!(pos(&nodes, "one_c"), (164.0, 5.0));
    }

    #[test]
    fn subtree_height_spaces_siblings() {
        // c1 has two children, so c2 must start below c1's whole subtree.
        let mut nodes = store(&[
            ("sp_root", None, 100.0, 50.0),
            ("sp_c1", Some("sp_root"), 80.0, 40.0),
            ("sp_c2", Some("sp_root"), 80.0, 40.0),
            ("sp_g1", Some("sp_c1"), 60.0, 30.0),
            ("sp_g2", Some("sp_c1"), 60.0, 30.0),
        ]);
        apply_layout(NodeId::intern("sp_root"), &mut nodes, LayoutKind::Logic);

        // c1 subtree = 30 + 20 + 30 = 80; block = 80 + 20 + 40 = 140.
        assert_eq!(pos(&nodes, "sp_c1"), (164.0, -45.0 + 20.0));
        assert_eq!(pos(&nodes, "sp_c2"), (164.0, -45.0 + 100.0));
        let (gx, gy1) = pos(&nodes, "sp_g1");
        let (_, gy2) = pos(&nodes, "sp_g2");
        assert_eq!(gx, 164.0 + 80.0 + 40.0);
        assert_eq!(gy2 - gy1, 50.0);
    }

    #[test]
    fn mindmap_alternates_sides() {
        let mut nodes = store(&[
            ("mm_root", None, 100.0, 50.0),
            ("mm_c1", Some("mm_root"), 80.0, 40.0),
            ("mm_c2", Some("mm_root"), 80.0, 40.0),
            ("mm_c3", Some("mm_root"), 80.0, 40.0),
            ("mm_d", Some("mm_c2"), 60.0, 30.0),
        ]);
        apply_layout(NodeId::intern("mm_root"), &mut nodes, LayoutKind::Mindmap);

        assert_eq!(pos(&nodes, "mm_c1"), (164.0, -25.0));
        assert_eq!(pos(&nodes, "mm_c3"), (164.0, 35.0));
        assert_eq!(pos(&nodes, "mm_c2"), (-144.0, 5.0));
        // Left branches keep growing left.
        assert_eq!(pos(&nodes, "mm_d"), (-144.0 - 40.0 - 60.0, 10.0));
    }

    #[test]
    fn org_chart_single_child_centered_below() {
        let mut nodes = store(&[
            ("org_root", None, 100.0, 50.0),
            ("org_c", Some("org_root"), 80.0, 40.0),
        ]);
        apply_layout(NodeId::intern("org_root"), &mut nodes, LayoutKind::OrgChart);
        assert_eq!(pos(&nodes, "org_c"), (10.0, 100.0));
    }

    #[test]
    fn org_chart_siblings_spread_horizontally() {
        let mut nodes = store(&[
            ("org2_root", None, 100.0, 50.0),
            ("org2_a", Some("org2_root"), 80.0, 40.0),
            ("org2_b", Some("org2_root"), 80.0, 40.0),
        ]);
        apply_layout(NodeId::intern("org2_root"), &mut nodes, LayoutKind::OrgChart);
        assert_eq!(pos(&nodes, "org2_a"), (-40.0, 100.0));
        assert_eq!(pos(&nodes, "org2_b"), (60.0, 100.0));
    }

    #[test]
    fn dangling_child_is_skipped() {
        let mut nodes = store(&[
            ("dg_root", None, 100.0, 50.0),
            ("dg_c", Some("dg_root"), 80.0, 40.0),
        ]);
        let root = NodeId::intern("dg_root");
        nodes
            .get_mut(root)
            .unwrap()
            .children
            .insert(0, NodeId::intern("dg_ghost"));
        apply_layout(root, &mut nodes, LayoutKind::Logic);
        assert_eq!(pos(&nodes, "dg_c"), (164.0, 5.0));
    }

    #[test]
    fn cyclic_children_terminate() {
        let mut nodes = store(&[
            ("cy_root", None, 100.0, 50.0),
            ("cy_a", Some("cy_root"), 80.0, 40.0),
            ("cy_b", Some("cy_a"), 80.0, 40.0),
        ]);
        // Corrupt: b lists a as a child.
        nodes
            .get_mut(NodeId::intern("cy_b"))
            .unwrap()
            .children
            .push(NodeId::intern("cy_a"));
        for kind in [LayoutKind::Logic, LayoutKind::Mindmap, LayoutKind::OrgChart] {
            apply_layout(NodeId::intern("cy_root"), &mut nodes, kind);
        }
        assert_eq!(pos(&nodes, "cy_root"), (0.0, 0.0));
    }

    #[test]
    fn unreachable_nodes_untouched_and_missing_root_is_noop() {
        let mut nodes = store(&[
            ("ur_root", None, 100.0, 50.0),
            ("ur_c", Some("ur_root"), 80.0, 40.0),
        ]);
        let mut stray = Node::new(NodeId::intern("ur_stray"), "stray").with_size(10.0, 10.0);
        stray.x = 999.0;
        stray.y = -999.0;
        nodes.insert(stray);

        apply_layout(NodeId::intern("ur_root"), &mut nodes, LayoutKind::Logic);
        assert_eq!(pos(&nodes, "ur_stray"), (999.0, -999.0));

        let before = nodes.clone();
        apply_layout(NodeId::intern("ur_nowhere"), &mut nodes, LayoutKind::Mindmap);
        assert_eq!(nodes, before);
    }

    #[test]
    fn layout_is_deterministic() {
        let rows = [
            ("dt_root", None, 120.0, 50.0),
            ("dt_a", Some("dt_root"), 90.0, 40.0),
            ("dt_b", Some("dt_root"), 70.0, 35.0),
            ("dt_c", Some("dt_a"), 60.0, 30.0),
        ];
        for kind in [LayoutKind::Logic, LayoutKind::Mindmap, LayoutKind::OrgChart] {
            let mut first = store(&rows);
            let mut second = store(&rows);
            apply_layout(NodeId::intern("dt_root"), &mut first, kind);
            apply_layout(NodeId::intern("dt_root"), &mut second, kind);
            apply_layout(NodeId::intern("dt_root"), &mut second, kind);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn custom_spacing() {
        let config = LayoutConfig {
            sibling_gap: 10.0,
            level_gaps: vec![30.0],
            ..Default::default()
        };
        let mut nodes = store(&[
            ("cs_root", None, 100.0, 50.0),
            ("cs_a", Some("cs_root"), 80.0, 40.0),
            ("cs_b", Some("cs_root"), 80.0, 40.0),
        ]);
        apply_layout_with(NodeId::intern("cs_root"), &mut nodes, LayoutKind::Logic, &config);
        assert_eq!(pos(&nodes, "cs_a"), (130.0, -20.0));
        assert_eq!(pos(&nodes, "cs_b"), (130.0, 30.0));
        assert_eq!(config.level_gap(5), 30.0);
    }

    #[test]
    fn very_deep_chain_lays_out_without_recursion() {
        const DEPTH: usize = 100_000;
        let ids: Vec<NodeId> = (0..DEPTH).map(|i| NodeId::intern(&format!("deep_{i}"))).collect();
        let mut nodes = NodeStore::new();
        nodes.insert(Node::root(ids[0], "deep").with_size(100.0, 50.0));
        for pair in ids.windows(2) {
            nodes.get_mut(pair[0]).unwrap().children.push(pair[1]);
            nodes.insert(Node::new(pair[1], "link").with_parent(pair[0]).with_size(80.0, 40.0));
        }
        let last = ids[DEPTH - 1];

        apply_layout(ids[0], &mut nodes, LayoutKind::Logic);
        let n = nodes.get(last).unwrap();
        // 164 to depth 1, 120 to depth 2, then 112 per level.
        assert_eq!((n.x, n.y), (164.0 + 120.0 + 112.0 * (DEPTH - 3) as f32, 5.0));

        apply_layout(ids[0], &mut nodes, LayoutKind::Mindmap);
        assert_eq!(nodes.get(ids[1]).unwrap().x, 164.0);
        assert_eq!(nodes.get(last).unwrap().y, 5.0);

        apply_layout(ids[0], &mut nodes, LayoutKind::OrgChart);
        let n = nodes.get(last).unwrap();
        assert_eq!((n.x, n.y), (10.0, 100.0 + 90.0 * (DEPTH - 2) as f32));
    }
}
