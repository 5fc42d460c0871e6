pub mod config;
pub mod delta;
pub mod editor;
pub mod history;
pub mod ops;

pub use config::EditorConfig;
pub use delta::{Delta, Patch, Transaction};
pub use editor::Editor;
pub use history::{History, HistoryEntry};
pub use ops::{EditContext, EditOp};
