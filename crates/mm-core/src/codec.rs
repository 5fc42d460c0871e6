//! Document encode/decode boundary.
//!
//! JSON uses the persisted field names (`parentId`, `isRoot`,
//! `activeSheetId`, ...). MessagePack carries the same shape in binary.
//! Decoding accepts the legacy single-sheet layout (tree fields at the top
//! level, no `sheets`) and migrates it into one sheet. Every decoded
//! document is validated before it is returned, so the editor never sees a
//! cyclic or orphaned tree.

use crate::error::TreeError;
use crate::id::{NodeId, SheetId};
use crate::model::{Document, EditorState, LayoutKind, NodeStore, Sheet};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MessagePack encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("MessagePack decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("document has neither sheets nor a legacy root")]
    Empty,

    #[error("invalid document: {0}")]
    Invalid(#[from] TreeError),
}

/// Either shape a stored document may take.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredDocument {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    sheets: Vec<Sheet>,
    #[serde(default)]
    active_sheet_id: Option<SheetId>,

    // Legacy single-sheet fields.
    #[serde(default)]
    root_id: Option<NodeId>,
    #[serde(default)]
    nodes: Option<NodeStore>,
    #[serde(default)]
    theme: Option<String>,
    #[serde(default)]
    layout: Option<LayoutKind>,
    #[serde(default)]
    editor_state: Option<EditorState>,
}

impl StoredDocument {
    fn into_document(self) -> Result<Document, CodecError> {
        if !self.sheets.is_empty() {
            let active = self
                .active_sheet_id
                .filter(|id| self.sheets.iter().any(|s| s.id == *id))
                .unwrap_or(self.sheets[0].id);
            return Ok(Document {
                version: self.version.unwrap_or_else(|| Document::VERSION.to_string()),
                sheets: self.sheets,
                active_sheet_id: active,
            });
        }

        let nodes = self.nodes.ok_or(CodecError::Empty)?;
        log::debug!("codec: migrating legacy single-sheet document");
        let sheet = Sheet {
            id: SheetId::generate(),
            title: "Sheet 1".to_string(),
            root_id: self.root_id.unwrap_or_else(|| NodeId::intern("root")),
            nodes,
            theme: self.theme.unwrap_or_else(|| "default".to_string()),
            layout: self.layout.unwrap_or_default(),
            editor_state: self.editor_state.unwrap_or_default(),
        };
        Ok(Document::new(sheet))
    }
}

fn finish(stored: StoredDocument) -> Result<Document, CodecError> {
    let doc = stored.into_document()?;
    doc.validate()?;
    Ok(doc)
}

pub fn to_json(doc: &Document) -> Result<String, CodecError> {
    Ok(serde_json::to_string_pretty(doc)?)
}

pub fn from_json(text: &str) -> Result<Document, CodecError> {
    finish(serde_json::from_str(text)?)
}

pub fn to_msgpack(doc: &Document) -> Result<Vec<u8>, CodecError> {
    Ok(rmp_serde::to_vec_named(doc)?)
}

pub fn from_msgpack(bytes: &[u8]) -> Result<Document, CodecError> {
    finish(rmp_serde::from_slice(bytes)?)
}
