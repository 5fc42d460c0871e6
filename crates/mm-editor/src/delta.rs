//! Reversible deltas.
//!
//! A [`Delta`] is a literal description of what one edit changed: whole node
//! records put or removed, positions moved by re-layout, and sheet fields
//! overwritten. Every forward patch is paired with an inverse patch, so the
//! history manager can replay either direction without recomputing anything.
//!
//! [`Transaction`] produces deltas: operations mutate a sheet through it, and
//! on commit it diffs the touched records against their first-touch
//! snapshots. Nodes only moved by layout become cheap `SetPosition` patches.

use mm_core::layout::{LayoutConfig, apply_layout_with};
use mm_core::model::{Document, LayoutKind, Node, Offset, Sheet};
use mm_core::{NodeId, SheetId, TreeError};
use std::collections::HashMap;

/// One literal change to a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    /// Insert or overwrite a node record.
    PutNode { sheet: SheetId, node: Box<Node> },
    RemoveNode { sheet: SheetId, id: NodeId },
    SetPosition { sheet: SheetId, id: NodeId, x: f32, y: f32 },
    SetSelection { sheet: SheetId, selected: Option<NodeId> },
    SetViewport { sheet: SheetId, zoom: f32, offset: Offset },
    SetTheme { sheet: SheetId, theme: String },
    SetLayout { sheet: SheetId, layout: LayoutKind },
    SetTitle { sheet: SheetId, title: String },
    InsertSheet { index: usize, sheet: Box<Sheet> },
    RemoveSheet { id: SheetId },
    MoveSheet { from: usize, to: usize },
    SetActiveSheet { id: SheetId },
}

impl Patch {
    /// Apply to `doc`. A patch whose sheet or node is gone is skipped.
    pub fn apply(&self, doc: &mut Document) {
        match self {
            Patch::InsertSheet { index, sheet } => {
                let at = (*index).min(doc.sheets.len());
                doc.sheets.insert(at, (**sheet).clone());
            }
            Patch::RemoveSheet { id } => match doc.sheet_index(*id) {
                Some(idx) => {
                    doc.sheets.remove(idx);
                    // Switching sheets is not recorded, so a replayed removal
                    // can hit the sheet that is active now.
                    if doc.active_sheet_id == *id {
                        if let Some(next) = doc.sheets.get(idx.saturating_sub(1)) {
                            log::debug!("patch: removed active sheet {id}, activating {}", next.id);
                            doc.active_sheet_id = next.id;
                        }
                    }
                }
                None => log::warn!("patch: sheet {id} already removed"),
            },
            Patch::MoveSheet { from, to } => {
                if *from < doc.sheets.len() && *to < doc.sheets.len() {
                    let sheet = doc.sheets.remove(*from);
                    doc.sheets.insert(*to, sheet);
                } else {
                    log::warn!("patch: sheet move {from} -> {to} out of range");
                }
            }
            Patch::SetActiveSheet { id } => doc.active_sheet_id = *id,
            _ => {
                let Some(sheet_id) = self.sheet_id() else {
                    return;
                };
                match doc.sheet_mut(sheet_id) {
                    Ok(sheet) => self.apply_to_sheet(sheet),
                    Err(err) => log::warn!("patch: {err}"),
                }
            }
        }
    }

    fn sheet_id(&self) -> Option<SheetId> {
        match self {
            Patch::PutNode { sheet, .. }
            | Patch::RemoveNode { sheet, .. }
            | Patch::SetPosition { sheet, .. }
            | Patch::SetSelection { sheet, .. }
            | Patch::SetViewport { sheet, .. }
            | Patch::SetTheme { sheet, .. }
            | Patch::SetLayout { sheet, .. }
            | Patch::SetTitle { sheet, .. } => Some(*sheet),
            _ => None,
        }
    }

    fn apply_to_sheet(&self, sheet: &mut Sheet) {
        match self {
            Patch::PutNode { node, .. } => {
                sheet.nodes.insert((**node).clone());
            }
            Patch::RemoveNode { id, .. } => {
                if sheet.nodes.remove(*id).is_none() {
                    log::warn!("patch: node {id} already removed");
                }
            }
            Patch::SetPosition { id, x, y, .. } => match sheet.nodes.get_mut(*id) {
                Some(node) => {
                    node.x = *x;
                    node.y = *y;
                }
                None => log::warn!("patch: cannot position missing node {id}"),
            },
            Patch::SetSelection { selected, .. } => sheet.editor_state.selected_id = *selected,
            Patch::SetViewport { zoom, offset, .. } => {
                sheet.editor_state.zoom = *zoom;
                sheet.editor_state.offset = *offset;
            }
            Patch::SetTheme { theme, .. } => sheet.theme.clone_from(theme),
            Patch::SetLayout { layout, .. } => sheet.layout = *layout,
            Patch::SetTitle { title, .. } => sheet.title.clone_from(title),
            _ => {}
        }
    }
}

/// Forward patches plus their inverses for one recorded transaction.
///
/// `inverse[i]` undoes `forward[i]`; inverses are applied last-to-first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delta {
    pub forward: Vec<Patch>,
    pub inverse: Vec<Patch>,
}

impl Delta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn push(&mut self, forward: Patch, inverse: Patch) {
        self.forward.push(forward);
        self.inverse.push(inverse);
    }

    /// Append `other` so that it runs after `self`.
    pub fn extend(&mut self, other: Delta) {
        self.forward.extend(other.forward);
        self.inverse.extend(other.inverse);
    }

    pub fn apply_forward(&self, doc: &mut Document) {
        for patch in &self.forward {
            patch.apply(doc);
        }
    }

    pub fn apply_inverse(&self, doc: &mut Document) {
        for patch in self.inverse.iter().rev() {
            patch.apply(doc);
        }
    }
}

// ─── Transaction ─────────────────────────────────────────────────────────

/// Records every change made to one sheet and turns it into a [`Delta`].
pub struct Transaction<'a> {
    sheet: &'a mut Sheet,
    /// First-touch snapshot of each node; `None` if it did not exist.
    originals: HashMap<NodeId, Option<Node>>,
    touched: Vec<NodeId>,
    positions: HashMap<NodeId, (f32, f32)>,
    selection: Option<NodeId>,
    /// Set once the operation assigns a selection, even an unchanged one.
    selection_set: bool,
    theme: String,
    layout: LayoutKind,
}

impl<'a> Transaction<'a> {
    pub fn begin(sheet: &'a mut Sheet) -> Self {
        let positions = sheet.nodes.iter().map(|n| (n.id, (n.x, n.y))).collect();
        Self {
            selection: sheet.editor_state.selected_id,
            selection_set: false,
            theme: sheet.theme.clone(),
            layout: sheet.layout,
            originals: HashMap::new(),
            touched: Vec::new(),
            positions,
            sheet,
        }
    }

    /// Read-only view of the sheet as edited so far.
    pub fn sheet(&self) -> &Sheet {
        self.sheet
    }

    fn touch(&mut self, id: NodeId) {
        if !self.originals.contains_key(&id) {
            self.originals.insert(id, self.sheet.nodes.get(id).cloned());
            self.touched.push(id);
        }
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.sheet.nodes.node(id)?;
        self.touch(id);
        self.sheet.nodes.node_mut(id)
    }

    pub fn insert_node(&mut self, node: Node) {
        self.touch(node.id);
        self.sheet.nodes.insert(node);
    }

    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        self.touch(id);
        self.sheet.nodes.remove(id)
    }

    pub fn set_selection(&mut self, selected: Option<NodeId>) {
        self.selection_set = true;
        self.sheet.editor_state.selected_id = selected;
    }

    pub fn set_theme(&mut self, theme: &str) {
        theme.clone_into(&mut self.sheet.theme);
    }

    pub fn set_layout(&mut self, layout: LayoutKind) {
        self.sheet.layout = layout;
    }

    /// Re-derive positions for the whole sheet.
    pub fn relayout(&mut self, config: &LayoutConfig) {
        let Sheet {
            root_id,
            nodes,
            layout,
            ..
        } = &mut *self.sheet;
        apply_layout_with(*root_id, nodes, *layout, config);
    }

    pub fn commit(self) -> Delta {
        let sheet_id = self.sheet.id;
        let mut delta = Delta::new();

        for id in &self.touched {
            let before = self.originals.get(id).cloned().flatten();
            let after = self.sheet.nodes.get(*id).cloned();
            match (before, after) {
                (None, Some(after)) => delta.push(
                    Patch::PutNode {
                        sheet: sheet_id,
                        node: Box::new(after),
                    },
                    Patch::RemoveNode {
                        sheet: sheet_id,
                        id: *id,
                    },
                ),
                (Some(before), None) => delta.push(
                    Patch::RemoveNode {
                        sheet: sheet_id,
                        id: *id,
                    },
                    Patch::PutNode {
                        sheet: sheet_id,
                        node: Box::new(before),
                    },
                ),
                (Some(before), Some(after)) if before != after => delta.push(
                    Patch::PutNode {
                        sheet: sheet_id,
                        node: Box::new(after),
                    },
                    Patch::PutNode {
                        sheet: sheet_id,
                        node: Box::new(before),
                    },
                ),
                _ => {}
            }
        }

        let mut moved: Vec<(NodeId, (f32, f32), (f32, f32))> = self
            .sheet
            .nodes
            .iter()
            .filter(|n| !self.originals.contains_key(&n.id))
            .filter_map(|n| {
                let old = *self.positions.get(&n.id)?;
                (old != (n.x, n.y)).then_some((n.id, old, (n.x, n.y)))
            })
            .collect();
        moved.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        for (id, (ox, oy), (nx, ny)) in moved {
            delta.push(
                Patch::SetPosition {
                    sheet: sheet_id,
                    id,
                    x: nx,
                    y: ny,
                },
                Patch::SetPosition {
                    sheet: sheet_id,
                    id,
                    x: ox,
                    y: oy,
                },
            );
        }

        let state = &self.sheet.editor_state;
        // An explicit selection is always recorded so that redo restores it
        // even after an unrecorded selection change.
        if self.selection_set || state.selected_id != self.selection {
            delta.push(
                Patch::SetSelection {
                    sheet: sheet_id,
                    selected: state.selected_id,
                },
                Patch::SetSelection {
                    sheet: sheet_id,
                    selected: self.selection,
                },
            );
        }
        if self.sheet.theme != self.theme {
            delta.push(
                Patch::SetTheme {
                    sheet: sheet_id,
                    theme: self.sheet.theme.clone(),
                },
                Patch::SetTheme {
                    sheet: sheet_id,
                    theme: self.theme.clone(),
                },
            );
        }
        if self.sheet.layout != self.layout {
            delta.push(
                Patch::SetLayout {
                    sheet: sheet_id,
                    layout: self.sheet.layout,
                },
                Patch::SetLayout {
                    sheet: sheet_id,
                    layout: self.layout,
                },
            );
        }
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc() -> Document {
        let root_id = NodeId::intern("dl_root");
        let kid = NodeId::intern("dl_kid");
        let mut root = Node::root(root_id, "Root").with_size(100.0, 50.0);
        root.children.push(kid);
        let mut sheet = Sheet::new(SheetId::intern("dl_sheet"), "Sheet 1", root, "business");
        sheet
            .nodes
            .insert(Node::new(kid, "Kid").with_parent(root_id).with_size(80.0, 40.0));
        Document::new(sheet)
    }

    #[test]
    fn untouched_transaction_is_empty() {
        let mut d = doc();
        let sheet = d.active_sheet_mut().unwrap();
        let tx = Transaction::begin(sheet);
        assert!(tx.commit().is_empty());
    }

    #[test]
    fn text_edit_records_one_node() {
        let mut d = doc();
        let before = d.clone();
        let kid = NodeId::intern("dl_kid");

        let delta = {
            let mut tx = Transaction::begin(d.active_sheet_mut().unwrap());
            tx.node_mut(kid).unwrap().text = "Renamed".into();
            tx.commit()
        };
        assert_eq!(delta.len(), 1);

        let after = d.clone();
        delta.apply_inverse(&mut d);
        assert_eq!(d, before);
        delta.apply_forward(&mut d);
        assert_eq!(d, after);
    }

    #[test]
    fn layout_moves_become_position_patches() {
        let mut d = doc();
        let before = d.clone();
        let delta = {
            let mut tx = Transaction::begin(d.active_sheet_mut().unwrap());
            tx.relayout(&LayoutConfig::default());
            tx.commit()
        };
        assert!(
            delta
                .forward
                .iter()
                .all(|p| matches!(p, Patch::SetPosition { .. }))
        );
        delta.apply_inverse(&mut d);
        assert_eq!(d, before);
    }

    #[test]
    fn touching_a_missing_node_fails_without_recording() {
        let mut d = doc();
        let mut tx = Transaction::begin(d.active_sheet_mut().unwrap());
        let ghost = NodeId::intern("dl_ghost");
        assert_eq!(tx.node_mut(ghost).err(), Some(TreeError::NodeNotFound(ghost)));
        assert!(tx.commit().is_empty());
    }

    #[test]
    fn sheet_patches_tolerate_missing_targets() {
        let mut d = doc();
        let before = d.clone();
        Patch::RemoveSheet {
            id: SheetId::intern("dl_nowhere"),
        }
        .apply(&mut d);
        Patch::SetPosition {
            sheet: SheetId::intern("dl_sheet"),
            id: NodeId::intern("dl_ghost"),
            x: 1.0,
            y: 1.0,
        }
        .apply(&mut d);
        assert_eq!(d, before);
    }
}
