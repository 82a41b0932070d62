//! Horizon Bridge - option conversion and delegation for command-driven GUI toolkits.
//!
//! This is the main umbrella crate. It re-exports the core engine and adds
//! the standard widget classes plus a ready-made composite widget.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_bridge::classes::StandardClasses;
//! use horizon_bridge::prelude::*;
//!
//! let surface = Arc::new(HeadlessSurface::new(NativeVersion::new(9, 0)));
//! let bridge = Bridge::headless(surface.clone());
//! let classes = StandardClasses::new(bridge.codecs());
//! classes.install_headless(&surface);
//!
//! let field = LabeledEntry::create(&bridge, &classes, ".").unwrap();
//! field.configure("label", Value::from("Name:")).unwrap();
//! assert_eq!(surface.value_of(".frame1.label", "text").as_deref(), Some("Name:"));
//! ```

pub use horizon_bridge_core::*;

pub mod classes;
mod labeled_entry;
pub mod prelude;

pub use labeled_entry::{LabeledEntry, LABEL_SIDES};
