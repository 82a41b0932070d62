//! Logging and debugging facilities for Horizon Bridge.
//!
//! This module provides:
//! - Target names for filtering `tracing` output per subsystem
//! - Debug visualization of the identity registry and delegation tables
//! - Performance tracing hooks for profiling
//!
//! # Tracing Integration
//!
//! Horizon Bridge uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("horizon_bridge_core::delegate=warn")
//!         .init();
//! }
//! ```
//!
//! # Debug Visualization
//!
//! Use [`RegistryDebug`] to print the widget hierarchy known to a bridge:
//!
//! ```
//! use std::sync::Arc;
//! use horizon_bridge_core::logging::RegistryDebug;
//! use horizon_bridge_core::IdentityRegistry;
//!
//! let registry = IdentityRegistry::new();
//! registry.register(".f", Arc::new(()));
//! registry.register_child(".f.b", ".f", Arc::new(()));
//!
//! let tree = RegistryDebug::new().format_identities(&registry);
//! assert!(tree.contains(".f.b"));
//! ```

use std::fmt;

use crate::composite::Composite;
use crate::identity::IdentityRegistry;

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "horizon_bridge_core";
    /// Codec registry and built-in codecs.
    pub const CODEC: &str = "horizon_bridge_core::codec";
    /// Identity registry.
    pub const IDENTITY: &str = "horizon_bridge_core::identity";
    /// Configuration engine.
    pub const CONFIG: &str = "horizon_bridge_core::config";
    /// Delegation engine.
    pub const DELEGATE: &str = "horizon_bridge_core::delegate";
    /// Native invocation.
    pub const NATIVE: &str = "horizon_bridge_core::native";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Indentation only.
    Compact,
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// ASCII output, handy in test assertions.
    pub fn ascii() -> Self {
        Self {
            style: TreeStyle::Ascii,
            ..Default::default()
        }
    }
}

/// Debug utility for the identity registry and composite routing tables.
#[derive(Debug, Clone, Default)]
pub struct RegistryDebug {
    options: TreeFormatOptions,
}

impl RegistryDebug {
    /// Create a visualizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format every registered path as a tree built from recorded parents.
    ///
    /// Entries registered without a parent, or whose parent is not
    /// registered, are printed as roots.
    pub fn format_identities(&self, registry: &IdentityRegistry) -> String {
        registry.with_read(|table| {
            let mut output = format!("Identity Registry ({} entries):\n", table.len());
            let roots = table.roots();
            if roots.is_empty() {
                output.push_str("  (empty)\n");
            }
            let count = roots.len();
            for (i, root) in roots.iter().enumerate() {
                self.format_node(table, root, 0, i + 1 == count, &mut output);
            }
            output
        })
    }

    fn format_node(
        &self,
        table: &crate::identity::IdentityTable,
        path: &str,
        depth: usize,
        is_last: bool,
        output: &mut String,
    ) {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return;
        }

        output.push_str(&self.build_prefix(depth, is_last));
        output.push_str(path);
        output.push('\n');

        let children = table.children_of(path);
        let count = children.len();
        for (i, child) in children.iter().enumerate() {
            self.format_node(table, child, depth + 1, i + 1 == count, output);
        }
    }

    /// Format a composite's option routing.
    pub fn format_composite(&self, composite: &Composite) -> String {
        use crate::config::Configurable;

        let mut output = format!("Composite {}:\n", composite.path());
        if let Some(primary) = composite.primary() {
            output.push_str(&format!("  primary -> {}\n", primary.path()));
        }
        for name in composite.option_method_names() {
            output.push_str(&format!("  {name} -> (option method)\n"));
        }
        for (alias, entries) in composite.delegations() {
            for entry in entries {
                let target = if entry.option == alias {
                    String::new()
                } else {
                    format!(" as {}", entry.option)
                };
                output.push_str(&format!(
                    "  {alias}{target} -> {}\n",
                    entry.child_paths().join(", ")
                ));
            }
        }
        output
    }

    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, corner, last) = match self.options.style {
            TreeStyle::Ascii => ("|", "+-- ", "`-- "),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500} ", "\u{2514}\u{2500}\u{2500} "),
            TreeStyle::Compact => ("", "", ""),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            prefix.push_str(&" ".repeat(self.options.indent_size));
        }
        if self.options.style == TreeStyle::Compact {
            prefix.push_str(&" ".repeat(self.options.indent_size));
        } else {
            prefix.push_str(if is_last { last } else { corner });
        }
        prefix
    }
}

/// Displays the identity registry with default options.
pub struct IdentityTree<'a>(pub &'a IdentityRegistry);

impl fmt::Display for IdentityTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&RegistryDebug::new().format_identities(self.0))
    }
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Useful for timing a batch of configuration calls.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Enter a new performance span named `name`.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "horizon_bridge::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

/// Trace-level event under the core target.
#[macro_export]
macro_rules! bridge_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: $crate::logging::targets::CORE, $($arg)*)
    };
}

/// Debug-level event under the core target.
#[macro_export]
macro_rules! bridge_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: $crate::logging::targets::CORE, $($arg)*)
    };
}

/// Warn-level event under the core target.
#[macro_export]
macro_rules! bridge_warn {
    ($($arg:tt)*) => {
        tracing::warn!(target: $crate::logging::targets::CORE, $($arg)*)
    };
}
