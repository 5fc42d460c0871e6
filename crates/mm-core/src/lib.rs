pub mod codec;
pub mod error;
pub mod id;
pub mod layout;
pub mod measure;
pub mod model;
pub mod theme;

pub use codec::CodecError;
pub use error::{ErrorKind, TreeError};
pub use id::{NodeId, SheetId};
pub use layout::{LayoutConfig, apply_layout, apply_layout_with};
pub use measure::{EstimatedMeasure, FixedMeasure, Size, TextMeasure};
pub use model::*;
pub use theme::{ThemeConfig, ThemeTable, Tier, resolve_style};
