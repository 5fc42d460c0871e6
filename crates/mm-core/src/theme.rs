//! Theme tables and layered style resolution.
//!
//! A theme assigns a default style to each depth tier (root, direct
//! children of the root, everything deeper). A node's effective style is its
//! tier default with the node's own override merged on top.

use crate::model::{LineStyle, NodeStyle, Shape};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Depth class of a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Root,
    Primary,
    Secondary,
}

impl Tier {
    /// Tier for a node `depth` parent links below the root.
    pub fn for_depth(depth: usize) -> Self {
        match depth {
            0 => Tier::Root,
            1 => Tier::Primary,
            _ => Tier::Secondary,
        }
    }
}

/// A named bundle of tier defaults plus connector/background settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeConfig {
    pub name: String,
    pub root_style: NodeStyle,
    pub primary_style: NodeStyle,
    pub secondary_style: NodeStyle,
    pub line_style: LineStyle,
    pub background_color: String,
    #[serde(default)]
    pub palette: Vec<String>,
}

impl ThemeConfig {
    pub fn tier_style(&self, tier: Tier) -> &NodeStyle {
        match tier {
            Tier::Root => &self.root_style,
            Tier::Primary => &self.primary_style,
            Tier::Secondary => &self.secondary_style,
        }
    }
}

/// Effective style: `tier_default` with `node_override` merged on top.
pub fn resolve_style(tier_default: &NodeStyle, node_override: Option<&NodeStyle>) -> NodeStyle {
    let mut resolved = tier_default.clone();
    if let Some(over) = node_override {
        resolved.merge(over);
    }
    resolved
}

/// Read-only registry of themes keyed by short name (`business`, `fresh`, ...).
#[derive(Debug, Clone, Default)]
pub struct ThemeTable {
    themes: HashMap<String, ThemeConfig>,
}

impl ThemeTable {
    /// Name used when a sheet references an unknown theme.
    pub const FALLBACK: &'static str = "business";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, theme: ThemeConfig) {
        self.themes.insert(key.into(), theme);
    }

    pub fn get(&self, key: &str) -> Option<&ThemeConfig> {
        self.themes.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.themes.contains_key(key)
    }

    /// Theme `key`, or the fallback theme. `None` only for a table that holds
    /// neither.
    pub fn get_or_fallback(&self, key: &str) -> Option<&ThemeConfig> {
        self.themes.get(key).or_else(|| self.themes.get(Self::FALLBACK))
    }

    /// Tier default for `key`, or an empty style when nothing matches.
    pub fn tier_style(&self, key: &str, tier: Tier) -> NodeStyle {
        self.get_or_fallback(key)
            .map(|t| t.tier_style(tier).clone())
            .unwrap_or_default()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.themes.keys().map(String::as_str)
    }

    /// The built-in light themes.
    pub fn presets() -> Self {
        let mut table = Self::new();
        table.insert(
            "business",
            ThemeConfig {
                name: "Business".into(),
                background_color: "#F0FDFA".into(),
                line_style: LineStyle::Step,
                palette: palette(&["#0D9488", "#14B8A6", "#0F766E", "#134E4A"]),
                root_style: NodeStyle {
                    border_color: Some("#0D9488".into()),
                    border_radius: Some(8.0),
                    shadow_blur: Some(10.0),
                    shadow_color: Some("rgba(13, 148, 136, 0.2)".into()),
                    ..tier("#0D9488", "#FFFFFF", 0.0, 24.0, Shape::Rounded)
                },
                primary_style: NodeStyle {
                    border_color: Some("#CCF2ED".into()),
                    border_radius: Some(6.0),
                    ..tier("#FFFFFF", "#134E4A", 2.0, 18.0, Shape::Rounded)
                },
                secondary_style: NodeStyle {
                    border_color: Some("transparent".into()),
                    ..tier("transparent", "#5E7E7B", 0.0, 14.0, Shape::Underline)
                },
            },
        );
        table.insert(
            "fresh",
            ThemeConfig {
                name: "Fresh Mint".into(),
                background_color: "#F0FDF4".into(),
                line_style: LineStyle::Bezier,
                palette: palette(&["#10B981", "#34D399", "#059669", "#064E3B"]),
                root_style: NodeStyle {
                    border_color: Some("#10B981".into()),
                    border_radius: Some(20.0),
                    ..tier("#10B981", "#FFFFFF", 0.0, 24.0, Shape::Capsule)
                },
                primary_style: NodeStyle {
                    border_color: Some("#BBF7D0".into()),
                    border_radius: Some(12.0),
                    ..tier("#DCFCE7", "#064E3B", 1.0, 18.0, Shape::Rounded)
                },
                secondary_style: NodeStyle {
                    border_color: Some("#BBF7D0".into()),
                    ..tier("transparent", "#065F46", 0.0, 14.0, Shape::Rounded)
                },
            },
        );
        table.insert(
            "minimal",
            ThemeConfig {
                name: "Minimal".into(),
                background_color: "#FFFFFF".into(),
                line_style: LineStyle::Straight,
                palette: palette(&["#000000", "#333333"]),
                root_style: NodeStyle {
                    border_radius: Some(8.0),
                    ..tier("#000000", "#FFFFFF", 0.0, 24.0, Shape::Rounded)
                },
                primary_style: NodeStyle {
                    border_color: Some("#000000".into()),
                    ..tier("#FFFFFF", "#000000", 2.0, 18.0, Shape::Underline)
                },
                secondary_style: tier("transparent", "#000000", 1.0, 14.0, Shape::Underline),
            },
        );
        table.insert(
            "vibrant",
            ThemeConfig {
                name: "Vibrant".into(),
                background_color: "#FFF7ED".into(),
                line_style: LineStyle::Bezier,
                palette: palette(&["#F97316", "#FB923C", "#EA580C", "#7C2D12"]),
                root_style: NodeStyle {
                    border_color: Some("#F97316".into()),
                    border_radius: Some(4.0),
                    ..tier("#F97316", "#FFFFFF", 0.0, 24.0, Shape::Diamond)
                },
                primary_style: NodeStyle {
                    border_color: Some("#FED7AA".into()),
                    border_radius: Some(8.0),
                    ..tier("#FFEDD5", "#7C2D12", 1.0, 18.0, Shape::Rounded)
                },
                secondary_style: NodeStyle {
                    border_color: Some("transparent".into()),
                    ..tier("transparent", "#9A3412", 0.0, 14.0, Shape::Underline)
                },
            },
        );
        table.insert(
            "dark",
            ThemeConfig {
                name: "Cyber Tech".into(),
                background_color: "#1E1E1E".into(),
                line_style: LineStyle::Straight,
                palette: palette(&["#00FF9D", "#FF0055", "#00D2FF", "#FF00FF"]),
                root_style: NodeStyle {
                    border_color: Some("#00FF9D".into()),
                    shadow_color: Some("#00FF9D".into()),
                    shadow_blur: Some(10.0),
                    ..tier("transparent", "#FFFFFF", 2.0, 24.0, Shape::Hexagon)
                },
                primary_style: NodeStyle {
                    border_color: Some("#FF0055".into()),
                    shadow_color: Some("#FF0055".into()),
                    shadow_blur: Some(5.0),
                    ..tier("transparent", "#FFFFFF", 1.0, 18.0, Shape::Rectangle)
                },
                secondary_style: NodeStyle {
                    border_color: Some("#00D2FF".into()),
                    shadow_color: Some("#00D2FF".into()),
                    shadow_blur: Some(3.0),
                    ..tier("transparent", "#00D2FF", 1.0, 14.0, Shape::Rectangle)
                },
            },
        );
        table.insert(
            "handDrawn",
            ThemeConfig {
                name: "Hand Drawn".into(),
                background_color: "#fffef0".into(),
                line_style: LineStyle::HandDrawn,
                palette: palette(&["#E74C3C", "#3498DB", "#F1C40F", "#2ECC71"]),
                root_style: NodeStyle {
                    border_color: Some("#333".into()),
                    ..tier("transparent", "#333", 2.0, 24.0, Shape::Cloud)
                },
                primary_style: NodeStyle {
                    border_color: Some("#333".into()),
                    ..tier("transparent", "#333", 2.0, 18.0, Shape::Ellipse)
                },
                secondary_style: tier("transparent", "#333", 0.0, 14.0, Shape::Underline),
            },
        );
        table
    }
}

fn tier(background: &str, color: &str, border_width: f32, font_size: f32, shape: Shape) -> NodeStyle {
    NodeStyle {
        background_color: Some(background.into()),
        color: Some(color.into()),
        border_width: Some(border_width),
        font_size: Some(font_size),
        shape: Some(shape),
        ..Default::default()
    }
}

fn palette(colors: &[&str]) -> Vec<String> {
    colors.iter().map(|c| (*c).to_string()).collect()
}
