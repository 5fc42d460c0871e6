use mm_core::layout::LayoutConfig;
use serde::{Deserialize, Serialize};

/// Editor-level knobs. Every field has a default, so a host can deserialize
/// a partial config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum number of undoable steps kept in the past. Default: **20**.
    pub history_depth: usize,

    /// Spacing handed to the layout engine after every structural edit.
    pub layout: LayoutConfig,

    /// Text given to freshly inserted topics.
    pub topic_text: String,

    /// Text given to the root of a new sheet.
    pub root_text: String,

    /// Theme assigned to new sheets.
    pub default_theme: String,

    /// Re-validate the whole document after each edit and roll back on
    /// failure. Default: on in debug builds.
    pub validate_edits: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: 20,
            layout: LayoutConfig::default(),
            topic_text: "Subtopic".to_string(),
            root_text: "Central Topic".to_string(),
            default_theme: "business".to_string(),
            validate_edits: cfg!(debug_assertions),
        }
    }
}
