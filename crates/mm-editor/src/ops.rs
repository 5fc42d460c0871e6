//! Mutation operations.
//!
//! Each operation checks every precondition against the current document
//! first, then mutates through a [`Transaction`] and returns the resulting
//! [`Delta`]. A rejected operation returns an error and leaves the document
//! untouched.
//!
//! Node operations act on one sheet; the `Editor` passes the active one.

use crate::config::EditorConfig;
use crate::delta::{Delta, Patch, Transaction};
use mm_core::model::{Document, LayoutKind, Node, NodeStyle, Offset, Sheet};
use mm_core::theme::{ThemeTable, Tier, resolve_style};
use mm_core::{NodeId, SheetId, Size, TextMeasure, TreeError};

/// Read-only collaborators an operation needs.
pub struct EditContext<'a> {
    pub themes: &'a ThemeTable,
    pub measure: &'a dyn TextMeasure,
    pub config: &'a EditorConfig,
}

impl EditContext<'_> {
    /// Size of `text` under the effective style of a node in `tier`.
    fn size_of(&self, theme: &str, tier: Tier, style: Option<&NodeStyle>, text: &str) -> Size {
        let effective = resolve_style(&self.themes.tier_style(theme, tier), style);
        self.measure.measure(text, &effective)
    }

    fn new_topic(&self, sheet: &Sheet, parent: NodeId, tier: Tier) -> Node {
        let text = &self.config.topic_text;
        let style = self.themes.tier_style(&sheet.theme, tier);
        let size = self.measure.measure(text, &style);
        let mut node = Node::new(NodeId::generate(), text.as_str())
            .with_parent(parent)
            .with_size(size.width, size.height);
        node.style = stored(style);
        node
    }
}

fn stored(style: NodeStyle) -> Option<NodeStyle> {
    (!style.is_empty()).then_some(style)
}

fn child_tier(parent: &Node) -> Tier {
    if parent.is_root {
        Tier::Primary
    } else {
        Tier::Secondary
    }
}

// ─── Node operations ─────────────────────────────────────────────────────

/// Append a new topic under `parent` and select it.
pub fn insert_child(
    doc: &mut Document,
    ctx: &EditContext,
    sheet_id: SheetId,
    parent: NodeId,
) -> Result<Delta, TreeError> {
    let sheet = doc.sheet_mut(sheet_id)?;
    let tier = child_tier(sheet.nodes.node(parent)?);
    let topic = ctx.new_topic(sheet, parent, tier);
    let id = topic.id;

    let mut tx = Transaction::begin(sheet);
    tx.insert_node(topic);
    tx.node_mut(parent)?.children.push(id);
    tx.set_selection(Some(id));
    tx.relayout(&ctx.config.layout);
    Ok(tx.commit())
}

/// Insert a new topic right after `id` in its parent's children and select it.
pub fn insert_sibling(
    doc: &mut Document,
    ctx: &EditContext,
    sheet_id: SheetId,
    id: NodeId,
) -> Result<Delta, TreeError> {
    let sheet = doc.sheet_mut(sheet_id)?;
    let node = sheet.nodes.node(id)?;
    let parent = node.parent_id.ok_or(TreeError::NoParent(id))?;
    let position = sheet
        .nodes
        .node(parent)?
        .children
        .iter()
        .position(|c| *c == id);
    let tier = sheet.tier_of(id).unwrap_or(Tier::Secondary);
    let topic = ctx.new_topic(sheet, parent, tier);
    let new_id = topic.id;

    let mut tx = Transaction::begin(sheet);
    tx.insert_node(topic);
    let children = &mut tx.node_mut(parent)?.children;
    match position {
        Some(i) => children.insert(i + 1, new_id),
        None => children.push(new_id),
    }
    tx.set_selection(Some(new_id));
    tx.relayout(&ctx.config.layout);
    Ok(tx.commit())
}

/// Remove `id` and every descendant, then select the former parent.
pub fn delete_subtree(
    doc: &mut Document,
    ctx: &EditContext,
    sheet_id: SheetId,
    id: NodeId,
) -> Result<Delta, TreeError> {
    let sheet = doc.sheet_mut(sheet_id)?;
    let node = sheet.nodes.node(id)?;
    if node.is_root {
        return Err(TreeError::DeleteRoot(id));
    }
    let parent = node.parent_id.ok_or(TreeError::NoParent(id))?;
    sheet.nodes.node(parent)?;
    let doomed = sheet.nodes.subtree_ids(id);

    let mut tx = Transaction::begin(sheet);
    tx.node_mut(parent)?.children.retain(|c| *c != id);
    for d in doomed {
        tx.remove_node(d);
    }
    tx.set_selection(Some(parent));
    tx.relayout(&ctx.config.layout);
    Ok(tx.commit())
}

/// Set a topic's text and re-measure it.
pub fn rename_node(
    doc: &mut Document,
    ctx: &EditContext,
    sheet_id: SheetId,
    id: NodeId,
    text: &str,
) -> Result<Delta, TreeError> {
    let sheet = doc.sheet_mut(sheet_id)?;
    let node = sheet.nodes.node(id)?;
    let tier = sheet.tier_of(id).unwrap_or(Tier::Secondary);
    let size = ctx.size_of(&sheet.theme, tier, node.style.as_ref(), text);

    let mut tx = Transaction::begin(sheet);
    let node = tx.node_mut(id)?;
    text.clone_into(&mut node.text);
    node.width = size.width;
    node.height = size.height;
    tx.relayout(&ctx.config.layout);
    Ok(tx.commit())
}

/// Merge `patch` into a topic's own style. Geometry changes re-measure the
/// topic and re-run layout.
pub fn restyle_node(
    doc: &mut Document,
    ctx: &EditContext,
    sheet_id: SheetId,
    id: NodeId,
    patch: &NodeStyle,
) -> Result<Delta, TreeError> {
    let sheet = doc.sheet_mut(sheet_id)?;
    let node = sheet.nodes.node(id)?;
    let tier = sheet.tier_of(id).unwrap_or(Tier::Secondary);
    let mut style = node.style.clone().unwrap_or_default();
    style.merge(patch);
    let resize = patch
        .affects_geometry()
        .then(|| ctx.size_of(&sheet.theme, tier, Some(&style), &node.text));

    let mut tx = Transaction::begin(sheet);
    let node = tx.node_mut(id)?;
    node.style = stored(style);
    if let Some(size) = resize {
        node.width = size.width;
        node.height = size.height;
        tx.relayout(&ctx.config.layout);
    }
    Ok(tx.commit())
}

/// Re-parent `id` under `target`.
///
/// Rejected when `id == target`, when `target` already is the parent, when
/// `id` is the root, or when `target` lies inside `id`'s subtree. The
/// ancestor walk is bounded, so a corrupt parent chain cannot hang it.
///
/// The moved subtree takes the font size of its new tier and is re-measured.
pub fn move_node(
    doc: &mut Document,
    ctx: &EditContext,
    sheet_id: SheetId,
    id: NodeId,
    target: NodeId,
) -> Result<Delta, TreeError> {
    if id == target {
        return Err(TreeError::MoveToSelf(id));
    }
    let sheet = doc.sheet_mut(sheet_id)?;
    let node = sheet.nodes.node(id)?;
    let target_node = sheet.nodes.node(target)?;
    if node.parent_id == Some(target) {
        return Err(TreeError::AlreadyChild { node: id, parent: target });
    }
    if node.is_root {
        return Err(TreeError::MoveRoot(id));
    }
    if sheet.nodes.ancestors(target).any(|a| a == id) {
        return Err(TreeError::Cycle { node: id, target });
    }

    let old_parent = node.parent_id;
    let top_tier = child_tier(target_node);
    let refreshed: Vec<(NodeId, Option<NodeStyle>, Size)> = sheet
        .nodes
        .subtree_ids(id)
        .into_iter()
        .enumerate()
        .filter_map(|(i, sub)| {
            let n = sheet.nodes.get(sub)?;
            let tier = if i == 0 { top_tier } else { Tier::Secondary };
            let tier_default = ctx.themes.tier_style(&sheet.theme, tier);
            let mut style = n.style.clone().unwrap_or_default();
            style.font_size = tier_default.font_size;
            let size = ctx
                .measure
                .measure(&n.text, &resolve_style(&tier_default, Some(&style)));
            Some((sub, stored(style), size))
        })
        .collect();

    let mut tx = Transaction::begin(sheet);
    if let Some(p) = old_parent {
        if let Ok(parent) = tx.node_mut(p) {
            parent.children.retain(|c| *c != id);
        }
    }
    tx.node_mut(target)?.children.push(id);
    tx.node_mut(id)?.parent_id = Some(target);
    for (sub, style, size) in refreshed {
        let n = tx.node_mut(sub)?;
        n.style = style;
        n.width = size.width;
        n.height = size.height;
    }
    tx.relayout(&ctx.config.layout);
    Ok(tx.commit())
}

/// Switch a sheet's theme, resetting every reachable topic to its tier
/// style and re-measuring it.
pub fn retheme(
    doc: &mut Document,
    ctx: &EditContext,
    sheet_id: SheetId,
    theme: &str,
) -> Result<Delta, TreeError> {
    if !ctx.themes.contains(theme) {
        return Err(TreeError::ThemeNotFound(theme.to_string()));
    }
    let sheet = doc.sheet_mut(sheet_id)?;
    let restyled: Vec<(NodeId, NodeStyle, Size)> = sheet
        .nodes
        .subtree_ids(sheet.root_id)
        .into_iter()
        .filter_map(|id| {
            let tier = sheet.tier_of(id)?;
            let text = &sheet.nodes.get(id)?.text;
            let style = ctx.themes.tier_style(theme, tier);
            let size = ctx.measure.measure(text, &style);
            Some((id, style, size))
        })
        .collect();

    let mut tx = Transaction::begin(sheet);
    tx.set_theme(theme);
    for (id, style, size) in restyled {
        let n = tx.node_mut(id)?;
        n.style = stored(style);
        n.width = size.width;
        n.height = size.height;
    }
    tx.relayout(&ctx.config.layout);
    Ok(tx.commit())
}

pub fn set_layout_algorithm(
    doc: &mut Document,
    ctx: &EditContext,
    sheet_id: SheetId,
    layout: LayoutKind,
) -> Result<Delta, TreeError> {
    let sheet = doc.sheet_mut(sheet_id)?;
    let mut tx = Transaction::begin(sheet);
    tx.set_layout(layout);
    tx.relayout(&ctx.config.layout);
    Ok(tx.commit())
}

// ─── Cosmetic operations ─────────────────────────────────────────────────

pub fn select_node(
    doc: &mut Document,
    sheet_id: SheetId,
    id: Option<NodeId>,
) -> Result<Delta, TreeError> {
    let sheet = doc.sheet_mut(sheet_id)?;
    if let Some(id) = id {
        sheet.nodes.node(id)?;
    }
    if sheet.editor_state.selected_id == id {
        return Ok(Delta::new());
    }
    let mut tx = Transaction::begin(sheet);
    tx.set_selection(id);
    Ok(tx.commit())
}

/// Update zoom and/or pan offset. A non-finite or non-positive zoom is
/// ignored.
pub fn set_viewport(
    doc: &mut Document,
    sheet_id: SheetId,
    zoom: Option<f32>,
    offset: Option<Offset>,
) -> Result<Delta, TreeError> {
    let sheet = doc.sheet(sheet_id)?;
    let old = &sheet.editor_state;
    let zoom = zoom.filter(|z| {
        let ok = z.is_finite() && *z > 0.0;
        if !ok {
            log::debug!("set_viewport: ignoring zoom {z}");
        }
        ok
    });
    let new_zoom = zoom.unwrap_or(old.zoom);
    let new_offset = offset.unwrap_or(old.offset);

    let mut delta = Delta::new();
    if new_zoom != old.zoom || new_offset != old.offset {
        delta.push(
            Patch::SetViewport {
                sheet: sheet_id,
                zoom: new_zoom,
                offset: new_offset,
            },
            Patch::SetViewport {
                sheet: sheet_id,
                zoom: old.zoom,
                offset: old.offset,
            },
        );
    }
    delta.apply_forward(doc);
    Ok(delta)
}

// ─── Sheet operations ────────────────────────────────────────────────────

/// Append a sheet holding a single measured root and make it active.
pub fn add_sheet(doc: &mut Document, ctx: &EditContext) -> Result<Delta, TreeError> {
    let theme = ctx.config.default_theme.as_str();
    let root_text = ctx.config.root_text.as_str();
    let size = ctx.size_of(theme, Tier::Root, None, root_text);
    let root = Node::root(NodeId::with_prefix("root"), root_text).with_size(size.width, size.height);
    let title = format!("Sheet {}", doc.sheets.len() + 1);
    let sheet = Sheet::new(SheetId::generate(), title, root, theme);
    let id = sheet.id;

    let mut delta = Delta::new();
    delta.push(
        Patch::InsertSheet {
            index: doc.sheets.len(),
            sheet: Box::new(sheet),
        },
        Patch::RemoveSheet { id },
    );
    delta.push(
        Patch::SetActiveSheet { id },
        Patch::SetActiveSheet {
            id: doc.active_sheet_id,
        },
    );
    delta.apply_forward(doc);
    Ok(delta)
}

/// Remove a sheet and all of its topics. Deleting the active sheet
/// activates the one before it.
pub fn delete_sheet(doc: &mut Document, id: SheetId) -> Result<Delta, TreeError> {
    let index = doc.sheet_index(id).ok_or(TreeError::SheetNotFound(id))?;
    if doc.sheets.len() <= 1 {
        return Err(TreeError::LastSheet);
    }
    let removed = doc.sheets[index].clone();

    let mut delta = Delta::new();
    delta.push(
        Patch::RemoveSheet { id },
        Patch::InsertSheet {
            index,
            sheet: Box::new(removed),
        },
    );
    if doc.active_sheet_id == id {
        // The sheet before it, or the next one when it is first.
        let survivor = if index == 0 { 1 } else { index - 1 };
        delta.push(
            Patch::SetActiveSheet {
                id: doc.sheets[survivor].id,
            },
            Patch::SetActiveSheet { id },
        );
    }
    delta.apply_forward(doc);
    Ok(delta)
}

pub fn rename_sheet(doc: &mut Document, id: SheetId, title: &str) -> Result<Delta, TreeError> {
    let sheet = doc.sheet(id)?;
    let mut delta = Delta::new();
    if sheet.title != title {
        delta.push(
            Patch::SetTitle {
                sheet: id,
                title: title.to_string(),
            },
            Patch::SetTitle {
                sheet: id,
                title: sheet.title.clone(),
            },
        );
    }
    delta.apply_forward(doc);
    Ok(delta)
}

/// Move the sheet at `from` so it ends up at index `to`.
pub fn reorder_sheets(doc: &mut Document, from: usize, to: usize) -> Result<Delta, TreeError> {
    let len = doc.sheets.len();
    if from >= len || to >= len || from == to {
        return Err(TreeError::SheetIndex { from, to, len });
    }
    let mut delta = Delta::new();
    delta.push(
        Patch::MoveSheet { from, to },
        Patch::MoveSheet { from: to, to: from },
    );
    delta.apply_forward(doc);
    Ok(delta)
}

pub fn set_active_sheet(doc: &mut Document, id: SheetId) -> Result<Delta, TreeError> {
    doc.sheet(id)?;
    let mut delta = Delta::new();
    if doc.active_sheet_id != id {
        delta.push(
            Patch::SetActiveSheet { id },
            Patch::SetActiveSheet {
                id: doc.active_sheet_id,
            },
        );
    }
    delta.apply_forward(doc);
    Ok(delta)
}

// ─── Command enum ────────────────────────────────────────────────────────

/// Every edit the editor accepts. Node variants target the active sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOp {
    InsertChild { parent: NodeId },
    InsertSibling { id: NodeId },
    DeleteSubtree { id: NodeId },
    RenameNode { id: NodeId, text: String },
    RestyleNode { id: NodeId, style: NodeStyle },
    MoveNode { id: NodeId, target: NodeId },
    Retheme { sheet: SheetId, theme: String },
    SetLayoutAlgorithm { sheet: SheetId, layout: LayoutKind },
    SelectNode { id: Option<NodeId> },
    SetViewport { zoom: Option<f32>, offset: Option<Offset> },
    AddSheet,
    DeleteSheet { id: SheetId },
    RenameSheet { id: SheetId, title: String },
    ReorderSheets { from: usize, to: usize },
    SetActiveSheet { id: SheetId },
}

impl EditOp {
    /// Whether the edit goes into undo history.
    pub fn is_recorded(&self) -> bool {
        !matches!(
            self,
            EditOp::SelectNode { .. } | EditOp::SetViewport { .. } | EditOp::SetActiveSheet { .. }
        )
    }

    pub fn description(&self) -> &'static str {
        match self {
            EditOp::InsertChild { .. } => "insert child",
            EditOp::InsertSibling { .. } => "insert sibling",
            EditOp::DeleteSubtree { .. } => "delete subtree",
            EditOp::RenameNode { .. } => "rename topic",
            EditOp::RestyleNode { .. } => "restyle topic",
            EditOp::MoveNode { .. } => "move topic",
            EditOp::Retheme { .. } => "change theme",
            EditOp::SetLayoutAlgorithm { .. } => "change layout",
            EditOp::SelectNode { .. } => "select",
            EditOp::SetViewport { .. } => "viewport",
            EditOp::AddSheet => "add sheet",
            EditOp::DeleteSheet { .. } => "delete sheet",
            EditOp::RenameSheet { .. } => "rename sheet",
            EditOp::ReorderSheets { .. } => "reorder sheets",
            EditOp::SetActiveSheet { .. } => "switch sheet",
        }
    }

    pub fn apply(&self, doc: &mut Document, ctx: &EditContext) -> Result<Delta, TreeError> {
        let active = doc.active_sheet_id;
        match self {
            EditOp::InsertChild { parent } => insert_child(doc, ctx, active, *parent),
            EditOp::InsertSibling { id } => insert_sibling(doc, ctx, active, *id),
            EditOp::DeleteSubtree { id } => delete_subtree(doc, ctx, active, *id),
            EditOp::RenameNode { id, text } => rename_node(doc, ctx, active, *id, text),
            EditOp::RestyleNode { id, style } => restyle_node(doc, ctx, active, *id, style),
            EditOp::MoveNode { id, target } => move_node(doc, ctx, active, *id, *target),
            EditOp::Retheme { sheet, theme } => retheme(doc, ctx, *sheet, theme),
            EditOp::SetLayoutAlgorithm { sheet, layout } => {
                set_layout_algorithm(doc, ctx, *sheet, *layout)
            }
            EditOp::SelectNode { id } => select_node(doc, active, *id),
            EditOp::SetViewport { zoom, offset } => set_viewport(doc, active, *zoom, *offset),
            EditOp::AddSheet => add_sheet(doc, ctx),
            EditOp::DeleteSheet { id } => delete_sheet(doc, *id),
            EditOp::RenameSheet { id, title } => rename_sheet(doc, *id, title),
            EditOp::ReorderSheets { from, to } => reorder_sheets(doc, *from, *to),
            EditOp::SetActiveSheet { id } => set_active_sheet(doc, *id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_core::FixedMeasure;
    use pretty_assertions::assert_eq;

    struct Fixture {
        doc: Document,
        themes: ThemeTable,
        measure: FixedMeasure,
        config: EditorConfig,
    }

    impl Fixture {
        fn new(tag: &str) -> Self {
            let root = Node::root(NodeId::intern(&format!("{tag}_root")), "Root").with_size(100.0, 50.0);
            let sheet = Sheet::new(SheetId::intern(&format!("{tag}_sheet")), "Sheet 1", root, "business");
            Self {
                doc: Document::new(sheet),
                themes: ThemeTable::presets(),
                measure: FixedMeasure::new(80.0, 40.0),
                config: EditorConfig::default(),
            }
        }

        fn run(&mut self, op: EditOp) -> Result<Delta, TreeError> {
            let ctx = EditContext {
                themes: &self.themes,
                measure: &self.measure,
                config: &self.config,
            };
            op.apply(&mut self.doc, &ctx)
        }

        fn sheet(&self) -> &Sheet {
            self.doc.active_sheet().unwrap()
        }

        fn root(&self) -> NodeId {
            self.sheet().root_id
        }

        fn selected(&self) -> NodeId {
            self.sheet().editor_state.selected_id.unwrap()
        }
    }

    #[test]
    fn insert_child_selects_and_styles_by_tier() {
        let mut f = Fixture::new("op_ic");
        let root = f.root();
        f.run(EditOp::InsertChild { parent: root }).unwrap();
        let a = f.selected();
        f.run(EditOp::InsertChild { parent: a }).unwrap();
        let b = f.selected();

        let primary = f.themes.tier_style("business", Tier::Primary);
        let secondary = f.themes.tier_style("business", Tier::Secondary);
        assert_eq!(f.sheet().nodes.get(a).unwrap().style.as_ref(), Some(&primary));
        assert_eq!(f.sheet().nodes.get(b).unwrap().style.as_ref(), Some(&secondary));
        assert_eq!(f.sheet().nodes.get(b).unwrap().text, "Subtopic");
        assert_eq!(f.sheet().nodes.get(a).unwrap().x, 164.0);
    }

    #[test]
    fn insert_sibling_lands_right_after() {
        let mut f = Fixture::new("op_is");
        let root = f.root();
        f.run(EditOp::InsertChild { parent: root }).unwrap();
        let a = f.selected();
        f.run(EditOp::InsertChild { parent: root }).unwrap();
        let b = f.selected();
        f.run(EditOp::InsertSibling { id: a }).unwrap();
        let s = f.selected();

        let kids: Vec<NodeId> = f.sheet().nodes.get(root).unwrap().children.to_vec();
        assert_eq!(kids, vec![a, s, b]);
        assert_eq!(
            f.run(EditOp::InsertSibling { id: root }),
            Err(TreeError::NoParent(root))
        );
    }

    #[test]
    fn restyle_without_geometry_keeps_positions() {
        let mut f = Fixture::new("op_rs");
        let root = f.root();
        f.run(EditOp::InsertChild { parent: root }).unwrap();
        let a = f.selected();
        let patch = NodeStyle {
            background_color: Some("#ff0000".into()),
            ..Default::default()
        };
        let delta = f.run(EditOp::RestyleNode { id: a, style: patch }).unwrap();
        assert_eq!(delta.len(), 1);
        let style = f.sheet().nodes.get(a).unwrap().style.clone().unwrap();
        assert_eq!(style.background_color.as_deref(), Some("#ff0000"));
    }

    #[test]
    fn retheme_rejects_unknown_theme() {
        let mut f = Fixture::new("op_rt");
        let sheet = f.sheet().id;
        let before = f.doc.clone();
        assert_eq!(
            f.run(EditOp::Retheme {
                sheet,
                theme: "neon".into()
            }),
            Err(TreeError::ThemeNotFound("neon".into()))
        );
        assert_eq!(f.doc, before);
    }

    #[test]
    fn retheme_resets_every_tier() {
        let mut f = Fixture::new("op_rt2");
        let root = f.root();
        f.run(EditOp::InsertChild { parent: root }).unwrap();
        let a = f.selected();
        let sheet = f.sheet().id;
        f.run(EditOp::Retheme {
            sheet,
            theme: "dark".into(),
        })
        .unwrap();
        assert_eq!(f.sheet().theme, "dark");
        assert_eq!(
            f.sheet().nodes.get(a).unwrap().style.clone().unwrap_or_default(),
            f.themes.tier_style("dark", Tier::Primary)
        );
        assert_eq!(
            f.sheet().nodes.get(root).unwrap().style.clone().unwrap_or_default(),
            f.themes.tier_style("dark", Tier::Root)
        );
    }

    #[test]
    fn move_refreshes_font_size_from_new_tier() {
        let mut f = Fixture::new("op_mv");
        let root = f.root();
        f.run(EditOp::InsertChild { parent: root }).unwrap();
        let a = f.selected();
        f.run(EditOp::InsertChild { parent: root }).unwrap();
        let b = f.selected();
        f.run(EditOp::MoveNode { id: b, target: a }).unwrap();

        let moved = f.sheet().nodes.get(b).unwrap();
        assert_eq!(moved.parent_id, Some(a));
        let secondary = f.themes.tier_style("business", Tier::Secondary);
        assert_eq!(moved.style.as_ref().unwrap().font_size, secondary.font_size);
        assert!(f.sheet().validate().is_ok());
    }

    #[test]
    fn sheet_lifecycle() {
        let mut f = Fixture::new("op_sh");
        let first = f.sheet().id;
        f.run(EditOp::AddSheet).unwrap();
        let second = f.doc.active_sheet_id;
        assert_ne!(first, second);
        assert_eq!(f.sheet().title, "Sheet 2");
        assert!(f.doc.validate().is_ok());

        f.run(EditOp::RenameSheet {
            id: second,
            title: "Ideas".into(),
        })
        .unwrap();
        f.run(EditOp::ReorderSheets { from: 1, to: 0 }).unwrap();
        assert_eq!(f.doc.sheets[0].title, "Ideas");
        assert_eq!(
            f.run(EditOp::ReorderSheets { from: 0, to: 0 }),
            Err(TreeError::SheetIndex { from: 0, to: 0, len: 2 })
        );

        f.run(EditOp::DeleteSheet { id: second }).unwrap();
        assert_eq!(f.doc.active_sheet_id, first);
        assert_eq!(f.run(EditOp::DeleteSheet { id: first }), Err(TreeError::LastSheet));
    }

    #[test]
    fn deleting_first_active_sheet_activates_the_next() {
        let mut f = Fixture::new("op_sh2");
        let first = f.sheet().id;
        f.run(EditOp::AddSheet).unwrap();
        let second = f.doc.active_sheet_id;
        f.run(EditOp::SetActiveSheet { id: first }).unwrap();
        f.run(EditOp::DeleteSheet { id: first }).unwrap();
        assert_eq!(f.doc.active_sheet_id, second);
        assert!(f.doc.validate().is_ok());
    }

    #[test]
    fn viewport_ignores_bad_zoom() {
        let mut f = Fixture::new("op_vp");
        let delta = f
            .run(EditOp::SetViewport {
                zoom: Some(0.0),
                offset: Some(Offset { x: 10.0, y: -5.0 }),
            })
            .unwrap();
        assert_eq!(delta.len(), 1);
        let state = &f.sheet().editor_state;
        assert_eq!(state.zoom, 1.0);
        assert_eq!(state.offset, Offset { x: 10.0, y: -5.0 });
    }

    #[test]
    fn cosmetic_ops_are_not_recorded() {
        assert!(!EditOp::SelectNode { id: None }.is_recorded());
        assert!(!EditOp::SetActiveSheet { id: SheetId::intern("x") }.is_recorded());
        assert!(EditOp::AddSheet.is_recorded());
    }
}
