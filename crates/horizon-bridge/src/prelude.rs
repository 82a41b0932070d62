//! Prelude module for Horizon Bridge.
//!
//! This module re-exports the most commonly used types for convenient importing:
//!
//! ```ignore
//! use horizon_bridge::prelude::*;
//! ```
//!
//! This provides access to:
//! - Bridge setup (`Bridge`, `NativeSurface`, `HeadlessSurface`)
//! - Values and callbacks (`Value`, `Callback`)
//! - Configuration (`Configurable`, `Widget`, `OptionInfo`)
//! - Composite widgets (`Composite`, `OptionMethods`, `LabeledEntry`)

// ============================================================================
// Bridge
// ============================================================================

pub use crate::{Bridge, BridgeConfig, NativeSurface, NativeVersion};

// ============================================================================
// Values
// ============================================================================

pub use crate::{Callback, Value, WireRepresentable};

// ============================================================================
// Option Descriptors
// ============================================================================

pub use crate::{OptionDescriptor, OptionTable};

// ============================================================================
// Configuration
// ============================================================================

pub use crate::{Configurable, OptionInfo, Widget};

// ============================================================================
// Composite Widgets
// ============================================================================

pub use crate::{Composite, ConfigurableRef, OptionMethods, DEFAULT_OPTION};
pub use crate::LabeledEntry;

// ============================================================================
// Standard Classes
// ============================================================================

pub use crate::classes::{StandardClasses, WidgetClass};

// ============================================================================
// Testing
// ============================================================================

pub use crate::{HeadlessSurface, OptionSpec};

// ============================================================================
// Errors
// ============================================================================

pub use crate::{BridgeError, Result};
