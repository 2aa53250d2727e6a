//! Debug visualization of layer stacks.
//!
//! ```ignore
//! use horizon_grid::layer::debug::LayerStackDebug;
//!
//! tracing::debug!("\n{}", LayerStackDebug::new().format(&*grid));
//! ```

use std::collections::HashSet;
use std::fmt::Write as FmtWrite;

use super::{Layer, LayerId};
use crate::coordinate::Orientation;

/// Style options for layer tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
}

/// Configuration for layer stack debug output.
#[derive(Debug, Clone)]
pub struct StackFormatOptions {
    pub style: TreeStyle,
    /// Whether to show layer IDs.
    pub show_ids: bool,
    /// Whether to show column/row counts and pixel extents.
    pub show_geometry: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
}

impl Default for StackFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_geometry: true,
            max_depth: None,
        }
    }
}

impl StackFormatOptions {
    /// Create options for minimal output.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_geometry: false,
            ..Default::default()
        }
    }
}

/// Formats a layer and everything underneath it as an indented tree.
///
/// A layer reachable through several parents (a dimensionally dependent
/// header shares its body) is printed once and referenced afterwards.
#[derive(Debug, Clone, Default)]
pub struct LayerStackDebug {
    options: StackFormatOptions,
}

impl LayerStackDebug {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: StackFormatOptions) -> Self {
        Self { options }
    }

    pub fn format(&self, top: &dyn Layer) -> String {
        let mut output = String::new();
        let mut seen = HashSet::new();
        self.format_into(top, 0, "", true, &mut seen, &mut output);
        output
    }

    fn format_into(
        &self,
        layer: &dyn Layer,
        depth: usize,
        indent: &str,
        is_last: bool,
        seen: &mut HashSet<LayerId>,
        output: &mut String,
    ) {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return;
        }

        let (branch, corner, last) = match self.options.style {
            TreeStyle::Ascii => ("|   ", "+-- ", "`-- "),
            TreeStyle::Unicode => ("\u{2502}   ", "\u{251c}\u{2500}\u{2500} ", "\u{2514}\u{2500}\u{2500} "),
        };

        output.push_str(indent);
        if depth > 0 {
            output.push_str(if is_last { last } else { corner });
        }
        output.push_str(layer.name());
        if self.options.show_ids {
            let _ = write!(output, " [{}]", layer.id());
        }
        let first_visit = seen.insert(layer.id());
        if !first_visit {
            output.push_str(" (shared)\n");
            return;
        }
        if self.options.show_geometry {
            let _ = write!(
                output,
                " {}x{} ({}x{}px)",
                layer.count(Orientation::Horizontal),
                layer.count(Orientation::Vertical),
                layer.extent(Orientation::Horizontal),
                layer.extent(Orientation::Vertical),
            );
        }
        output.push('\n');

        let child_indent = if depth == 0 {
            String::new()
        } else {
            format!("{indent}{}", if is_last { "    " } else { branch })
        };
        let children = layer.underlying_layers();
        let child_count = children.len();
        for (i, child) in children.iter().enumerate() {
            self.format_into(
                child.as_ref(),
                depth + 1,
                &child_indent,
                i + 1 == child_count,
                seen,
                output,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::dimensional::DimensionallyDependentLayer;
    use crate::fixture::LayerFixture;
    use crate::hide_show::HideShowLayer;

    fn ascii() -> StackFormatOptions {
        StackFormatOptions {
            style: TreeStyle::Ascii,
            ..StackFormatOptions::minimal()
        }
    }

    #[test]
    fn test_format_chain() {
        let fixture = LayerFixture::parse("100:100 ; 20 | hidden=0").unwrap();
        let output = LayerStackDebug::with_options(ascii()).format(&*fixture.top());
        assert_eq!(output, "HideShowLayer\n`-- DataLayer\n");
    }

    #[test]
    fn test_shared_layer_printed_once() {
        let fixture = LayerFixture::parse("100:100 ; 20:20").unwrap();
        let data: Arc<dyn Layer> = fixture.data.clone();
        let hide: Arc<dyn Layer> = HideShowLayer::new(data.clone());
        let header = DimensionallyDependentLayer::new(data.clone(), hide, data);

        let output = LayerStackDebug::with_options(ascii()).format(&*header);
        assert_eq!(
            output,
            "DimensionallyDependentLayer\n\
             +-- DataLayer\n\
             `-- HideShowLayer\n    \
             `-- DataLayer (shared)\n"
        );
    }

    #[test]
    fn test_geometry_and_depth_limit() {
        let fixture = LayerFixture::parse("100:100:50 ; 20:20 | hidden=2").unwrap();
        let output = LayerStackDebug::new().format(&*fixture.top());
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("2x2 (200x40px)"), "{output}");
        assert!(lines[1].ends_with("3x2 (250x40px)"), "{output}");

        let options = StackFormatOptions {
            max_depth: Some(0),
            ..StackFormatOptions::minimal()
        };
        let output = LayerStackDebug::with_options(options).format(&*fixture.top());
        assert_eq!(output, "HideShowLayer\n");
    }
}
