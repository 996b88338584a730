//! Logging and debugging facilities for megawidgets.
//!
//! This module provides:
//! - Target names for filtering the `tracing` output of each subsystem
//! - Debug visualization for specifier and megawidget trees
//! - Performance tracing hooks for profiling
//!
//! # Tracing Integration
//!
//! Every subsystem logs through `tracing` with a stable target. Install a
//! subscriber in the host application to see the output:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("megawidget::state=debug,megawidget_core::signal=trace")
//!     .init();
//! ```
//!
//! # Debug Visualization
//!
//! Anything implementing [`DebugTreeNode`] can be rendered with [`TreeDebug`]:
//!
//! ```
//! use megawidget_core::logging::{DebugTreeNode, TreeDebug, TreeFormatOptions};
//!
//! struct Leaf(&'static str);
//!
//! impl DebugTreeNode for Leaf {
//!     fn debug_label(&self) -> String {
//!         self.0.to_string()
//!     }
//! }
//!
//! let roots: Vec<Box<dyn DebugTreeNode>> = vec![Box::new(Leaf("name"))];
//! let output = TreeDebug::with_options(TreeFormatOptions::minimal()).format(&roots);
//! assert_eq!(output, "name\n");
//! ```

use std::fmt::Write as FmtWrite;

/// Span names used throughout the megawidget crates for tracing.
pub mod span_names {
    /// Specifier tree construction.
    pub const BUILD: &str = "megawidget::build";
    /// Runtime megawidget construction.
    pub const CREATE: &str = "megawidget::create";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "megawidget_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "megawidget_core::signal";
    /// Specifier registry and factory target.
    pub const FACTORY: &str = "megawidget::factory";
    /// Specifier and megawidget managers target.
    pub const MANAGER: &str = "megawidget::manager";
    /// State mutation and notification target.
    pub const STATE: &str = "megawidget::state";
    /// Mutable property target.
    pub const PROPERTY: &str = "megawidget::property";
    /// Choice list and selection pruning target.
    pub const CHOICES: &str = "megawidget::choices";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact single-line representation.
    Compact,
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show type names.
    pub show_types: bool,
    /// Whether to show per-node property lines.
    pub show_properties: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_types: true,
            show_properties: false,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_properties: true,
            ..Default::default()
        }
    }

    /// Create options for minimal output.
    pub fn minimal() -> Self {
        Self {
            show_types: false,
            show_properties: false,
            ..Default::default()
        }
    }
}

/// A node that can be rendered by [`TreeDebug`].
pub trait DebugTreeNode {
    /// The text shown for this node.
    fn debug_label(&self) -> String;

    /// Short type name, shown in parentheses after the label.
    fn debug_type(&self) -> Option<String> {
        None
    }

    /// Extra `key=value` lines shown under the node in detailed mode.
    fn debug_properties(&self) -> Vec<String> {
        Vec::new()
    }

    /// Child nodes, in order.
    fn debug_children(&self) -> Vec<Box<dyn DebugTreeNode + '_>> {
        Vec::new()
    }
}

/// Debug utility for visualizing trees of [`DebugTreeNode`]s.
#[derive(Debug, Clone, Default)]
pub struct TreeDebug {
    options: TreeFormatOptions,
}

impl TreeDebug {
    /// Create a new debug visualizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a debug visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format a forest of root nodes.
    pub fn format(&self, roots: &[Box<dyn DebugTreeNode + '_>]) -> String {
        let mut output = String::new();
        for root in roots {
            self.format_subtree_into(root.as_ref(), 0, &mut Vec::new(), true, &mut output);
        }
        output
    }

    /// Format a single subtree.
    pub fn format_subtree(&self, root: &dyn DebugTreeNode) -> String {
        let mut output = String::new();
        self.format_subtree_into(root, 0, &mut Vec::new(), true, &mut output);
        output
    }

    /// `guides` holds one entry per ancestor below the root: whether that
    /// ancestor has later siblings, so its vertical line continues.
    fn format_subtree_into(
        &self,
        node: &dyn DebugTreeNode,
        depth: usize,
        guides: &mut Vec<bool>,
        is_last: bool,
        output: &mut String,
    ) {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return;
        }

        output.push_str(&self.build_prefix(depth, guides, is_last));

        let label = node.debug_label();
        output.push_str(if label.is_empty() { "(unnamed)" } else { &label });

        if self.options.show_types
            && let Some(type_name) = node.debug_type()
        {
            let _ = write!(output, " ({type_name})");
        }
        output.push('\n');

        if depth > 0 {
            guides.push(!is_last);
        }
        if self.options.show_properties {
            let prop_prefix = self.build_guides(guides);
            for property in node.debug_properties() {
                let _ = writeln!(output, "{prop_prefix}  .{property}");
            }
        }

        let children = node.debug_children();
        let child_count = children.len();
        for (i, child) in children.iter().enumerate() {
            let is_last = i + 1 == child_count;
            self.format_subtree_into(child.as_ref(), depth + 1, guides, is_last, output);
        }
        if depth > 0 {
            guides.pop();
        }
    }

    fn branch(&self) -> &'static str {
        match self.options.style {
            TreeStyle::Ascii => "|",
            TreeStyle::Unicode => "\u{2502}",
            TreeStyle::Compact => "",
        }
    }

    /// Build the prefix string for a tree node.
    fn build_prefix(&self, depth: usize, guides: &[bool], is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (corner, last) = match self.options.style {
            TreeStyle::Ascii => ("+--", "`--"),
            TreeStyle::Unicode => ("\u{251c}\u{2500}\u{2500}", "\u{2514}\u{2500}\u{2500}"),
            TreeStyle::Compact => ("-", "-"),
        };

        let mut prefix = self.build_guides(guides);
        prefix.push_str(if is_last { last } else { corner });
        prefix.push(' ');
        prefix
    }

    /// Vertical lines for every ancestor that has later siblings.
    fn build_guides(&self, guides: &[bool]) -> String {
        let branch = self.branch();
        let gap = if branch.is_empty() { "" } else { " " };
        let mut prefix = String::new();
        for &continues in guides {
            prefix.push_str(if continues { branch } else { gap });
            prefix.extend(std::iter::repeat_n(' ', self.options.indent_size));
        }
        prefix
    }
}

/// A guard that emits a tracing span when dropped.
///
/// This is useful for tracking the duration of operations.
#[derive(Debug)]
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "megawidget::perf", "perf", operation = name);
        Self {
            _span: span.entered(),
        }
    }
}

/// Trace-level event under the core target.
#[macro_export]
macro_rules! megawidget_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "megawidget_core", $($arg)*)
    };
}
