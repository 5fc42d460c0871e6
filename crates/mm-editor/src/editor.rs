//! The editor service.
//!
//! [`Editor`] owns the authoritative [`Document`] together with its undo
//! history and the collaborators every edit needs (themes, text measurement,
//! config). Every edit runs to completion before control returns: mutate,
//! re-layout, record.
//!
//! Illegal edits are no-ops. `execute` reports them as `Ok(false)` and only
//! surfaces an error when a finished edit left the document invalid, which
//! means a bug rather than bad input. Such an edit is rolled back first.

use crate::config::EditorConfig;
use crate::delta::Delta;
use crate::history::History;
use crate::ops::{EditContext, EditOp};
use mm_core::codec::{self, CodecError};
use mm_core::layout::apply_layout_with;
use mm_core::model::{Document, LayoutKind, Node, NodeStyle, Offset, Sheet};
use mm_core::theme::{ThemeTable, Tier, resolve_style};
use mm_core::{EstimatedMeasure, NodeId, SheetId, TextMeasure, TreeError};

pub struct Editor {
    doc: Document,
    history: History,
    themes: ThemeTable,
    measure: Box<dyn TextMeasure>,
    config: EditorConfig,
}

impl Editor {
    /// A blank document with one sheet, the preset themes, and estimated
    /// text measurement.
    pub fn new(config: EditorConfig) -> Self {
        Self::with_parts(
            None,
            config,
            ThemeTable::presets(),
            Box::new(EstimatedMeasure::default()),
        )
    }

    /// Build from explicit collaborators. `doc` defaults to a blank
    /// single-sheet document; an invalid `doc` is replaced by one.
    pub fn with_parts(
        doc: Option<Document>,
        config: EditorConfig,
        themes: ThemeTable,
        measure: Box<dyn TextMeasure>,
    ) -> Self {
        let doc = match doc.map(|doc| doc.validate().map(|()| doc)) {
            Some(Ok(doc)) => doc,
            Some(Err(err)) => {
                log::warn!("editor: rejected invalid document, starting blank: {err}");
                blank_document(&config, &themes, measure.as_ref())
            }
            None => blank_document(&config, &themes, measure.as_ref()),
        };
        let mut editor = Self {
            history: History::new(config.history_depth),
            doc,
            themes,
            measure,
            config,
        };
        editor.layout_all();
        editor
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn themes(&self) -> &ThemeTable {
        &self.themes
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn active_sheet(&self) -> Option<&Sheet> {
        self.doc.active_sheet()
    }

    /// Currently selected topic on the active sheet.
    pub fn selection(&self) -> Option<NodeId> {
        self.active_sheet()?.editor_state.selected_id
    }

    /// Replace the document, lay out every sheet, and forget history.
    pub fn load(&mut self, doc: Document) -> Result<(), TreeError> {
        doc.validate()?;
        log::debug!("editor: loaded {} sheet(s)", doc.sheets.len());
        self.doc = doc;
        self.history.clear();
        self.layout_all();
        Ok(())
    }

    /// Decode JSON (current or legacy single-sheet shape) and load it.
    pub fn load_json(&mut self, text: &str) -> Result<(), CodecError> {
        let doc = codec::from_json(text)?;
        self.load(doc)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, CodecError> {
        codec::to_json(&self.doc)
    }

    fn layout_all(&mut self) {
        for sheet in &mut self.doc.sheets {
            apply_layout_with(sheet.root_id, &mut sheet.nodes, sheet.layout, &self.config.layout);
        }
    }

    pub fn validate(&self) -> Result<(), TreeError> {
        self.doc.validate()
    }

    // ─── Execution ───────────────────────────────────────────────────────

    /// Run one edit. Returns whether it changed anything.
    pub fn execute(&mut self, op: EditOp) -> Result<bool, TreeError> {
        let ctx = EditContext {
            themes: &self.themes,
            measure: self.measure.as_ref(),
            config: &self.config,
        };
        let delta = match op.apply(&mut self.doc, &ctx) {
            Ok(delta) => delta,
            Err(err) if err.is_expected() => {
                log::debug!("{}: rejected: {err}", op.description());
                return Ok(false);
            }
            Err(err) => return Err(err),
        };

        if self.config.validate_edits {
            if let Err(err) = self.doc.validate() {
                log::warn!("{}: left the document invalid, rolling back: {err}", op.description());
                delta.apply_inverse(&mut self.doc);
                return Err(TreeError::Invariant(format!("{}: {err}", op.description())));
            }
        }

        let changed = !delta.is_empty();
        if changed && op.is_recorded() {
            log::trace!("{}: recording {} patch(es)", op.description(), delta.len());
            self.history.record(delta, op.description());
        }
        Ok(changed)
    }

    /// Apply a prebuilt delta and record it. For hosts that compute edits
    /// outside [`EditOp`].
    pub fn apply_delta(&mut self, delta: Delta, description: &str) {
        delta.apply_forward(&mut self.doc);
        self.history.record(delta, description);
    }

    pub fn undo(&mut self) -> Option<String> {
        self.history.undo(&mut self.doc)
    }

    pub fn redo(&mut self) -> Option<String> {
        self.history.redo(&mut self.doc)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn begin_batch(&mut self) {
        self.history.begin_batch();
    }

    pub fn end_batch(&mut self) {
        self.history.end_batch();
    }

    // ─── Convenience wrappers ────────────────────────────────────────────

    /// Insert a child topic. Returns its id, or `None` if rejected.
    pub fn insert_child(&mut self, parent: NodeId) -> Result<Option<NodeId>, TreeError> {
        let done = self.execute(EditOp::InsertChild { parent })?;
        Ok(done.then(|| self.selection()).flatten())
    }

    /// Insert a sibling topic after `id`. Returns its id, or `None` if rejected.
    pub fn insert_sibling(&mut self, id: NodeId) -> Result<Option<NodeId>, TreeError> {
        let done = self.execute(EditOp::InsertSibling { id })?;
        Ok(done.then(|| self.selection()).flatten())
    }

    pub fn delete_subtree(&mut self, id: NodeId) -> Result<bool, TreeError> {
        self.execute(EditOp::DeleteSubtree { id })
    }

    pub fn rename_node(&mut self, id: NodeId, text: &str) -> Result<bool, TreeError> {
        self.execute(EditOp::RenameNode {
            id,
            text: text.to_string(),
        })
    }

    pub fn restyle_node(&mut self, id: NodeId, style: NodeStyle) -> Result<bool, TreeError> {
        self.execute(EditOp::RestyleNode { id, style })
    }

    pub fn move_node(&mut self, id: NodeId, target: NodeId) -> Result<bool, TreeError> {
        self.execute(EditOp::MoveNode { id, target })
    }

    pub fn retheme(&mut self, sheet: SheetId, theme: &str) -> Result<bool, TreeError> {
        self.execute(EditOp::Retheme {
            sheet,
            theme: theme.to_string(),
        })
    }

    pub fn set_layout_algorithm(&mut self, sheet: SheetId, layout: LayoutKind) -> Result<bool, TreeError> {
        self.execute(EditOp::SetLayoutAlgorithm { sheet, layout })
    }

    pub fn select_node(&mut self, id: Option<NodeId>) -> Result<bool, TreeError> {
        self.execute(EditOp::SelectNode { id })
    }

    pub fn set_viewport(&mut self, zoom: Option<f32>, offset: Option<Offset>) -> Result<bool, TreeError> {
        self.execute(EditOp::SetViewport { zoom, offset })
    }

    /// Add a sheet and switch to it. Returns its id.
    pub fn add_sheet(&mut self) -> Result<Option<SheetId>, TreeError> {
        let done = self.execute(EditOp::AddSheet)?;
        Ok(done.then_some(self.doc.active_sheet_id))
    }

    pub fn delete_sheet(&mut self, id: SheetId) -> Result<bool, TreeError> {
        self.execute(EditOp::DeleteSheet { id })
    }

    pub fn rename_sheet(&mut self, id: SheetId, title: &str) -> Result<bool, TreeError> {
        self.execute(EditOp::RenameSheet {
            id,
            title: title.to_string(),
        })
    }

    pub fn reorder_sheets(&mut self, from: usize, to: usize) -> Result<bool, TreeError> {
        self.execute(EditOp::ReorderSheets { from, to })
    }

    pub fn set_active_sheet(&mut self, id: SheetId) -> Result<bool, TreeError> {
        self.execute(EditOp::SetActiveSheet { id })
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

fn blank_document(config: &EditorConfig, themes: &ThemeTable, measure: &dyn TextMeasure) -> Document {
    let theme = config.default_theme.as_str();
    let style = resolve_style(&themes.tier_style(theme, Tier::Root), None);
    let size = measure.measure(&config.root_text, &style);
    let root = Node::root(NodeId::with_prefix("root"), config.root_text.as_str())
        .with_size(size.width, size.height);
    Document::new(Sheet::new(SheetId::generate(), "Sheet 1", root, theme))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_core::FixedMeasure;
    use pretty_assertions::assert_eq;

    fn editor() -> Editor {
        Editor::with_parts(
            None,
            EditorConfig::default(),
            ThemeTable::presets(),
            Box::new(FixedMeasure::new(80.0, 40.0)),
        )
    }

    #[test]
    fn blank_editor_is_valid() {
        let ed = editor();
        assert!(ed.validate().is_ok());
        let sheet = ed.active_sheet().unwrap();
        assert_eq!(sheet.title, "Sheet 1");
        assert_eq!(sheet.root().unwrap().text, "Central Topic");
        assert!(!ed.can_undo());
    }

    #[test]
    fn rejected_edits_are_silent_noops() {
        let mut ed = editor();
        let root = ed.active_sheet().unwrap().root_id;
        let before = ed.document().clone();
        assert_eq!(ed.delete_subtree(root), Ok(false));
        assert_eq!(ed.rename_node(NodeId::intern("ed_ghost"), "x"), Ok(false));
        assert_eq!(ed.document(), &before);
        assert!(!ed.can_undo());
    }

    #[test]
    fn selection_is_not_recorded() {
        let mut ed = editor();
        let root = ed.active_sheet().unwrap().root_id;
        let kid = ed.insert_child(root).unwrap().unwrap();
        assert_eq!(ed.history().past_len(), 1);
        assert_eq!(ed.select_node(Some(root)), Ok(true));
        assert_eq!(ed.selection(), Some(root));
        assert_eq!(ed.history().past_len(), 1);

        ed.undo();
        assert!(ed.active_sheet().unwrap().nodes.get(kid).is_none());
    }

    #[test]
    fn load_clears_history_and_lays_out() {
        let mut ed = editor();
        let root = ed.active_sheet().unwrap().root_id;
        ed.insert_child(root).unwrap();
        assert!(ed.can_undo());

        let mut other = editor().into_document();
        let sheet = other.active_sheet_mut().unwrap();
        let other_root = sheet.root_id;
        let kid = NodeId::intern("ed_load_kid");
        sheet.nodes.get_mut(other_root).unwrap().children.push(kid);
        sheet
            .nodes
            .insert(Node::new(kid, "Kid").with_parent(other_root).with_size(80.0, 40.0));

        ed.load(other).unwrap();
        assert!(!ed.can_undo());
        let placed = ed.active_sheet().unwrap().nodes.get(kid).unwrap();
        assert_eq!(placed.x, 80.0 + 64.0);
    }

    #[test]
    fn invalid_document_is_replaced_by_a_blank_one() {
        let mut doc = editor().into_document();
        let sheet = doc.active_sheet_mut().unwrap();
        let root = sheet.root_id;
        let orphan = NodeId::intern("ed_orphan");
        sheet
            .nodes
            .insert(Node::new(orphan, "Orphan").with_parent(root).with_size(80.0, 40.0));
        assert!(doc.validate().is_err());

        let ed = Editor::with_parts(
            Some(doc),
            EditorConfig::default(),
            ThemeTable::presets(),
            Box::new(FixedMeasure::new(80.0, 40.0)),
        );
        assert!(ed.validate().is_ok());
        let sheet = ed.active_sheet().unwrap();
        assert_eq!(sheet.nodes.len(), 1);
        assert!(sheet.nodes.get(orphan).is_none());
    }

    #[test]
    fn oversized_history_depth_from_config_is_accepted() {
        let config: EditorConfig =
            serde_json::from_str(r#"{"historyDepth": 18446744073709551615}"#).unwrap();
        let mut ed = Editor::new(config);
        let root = ed.active_sheet().unwrap().root_id;
        assert!(ed.insert_child(root).unwrap().is_some());
        assert!(ed.undo().is_some());
    }
}
