//! Core systems for Horizon Bridge.
//!
//! This crate converts option values between Rust and a command-driven
//! native GUI toolkit and routes option requests through composite widgets:
//!
//! - **Value Model**: [`Value`] and the [`WireRepresentable`] capability
//! - **Codec Registry**: Named bidirectional converters with a `string` fallback
//! - **Option Descriptors**: Wire names, aliases, version gates, per-option overrides
//! - **Identity Registry**: Native path to wrapper object mapping
//! - **Configuration Engine**: `cget`/`configure`/`configinfo` over a native surface
//! - **Delegation Engine**: Composite widgets routing options to their children
//! - **Headless Surface**: An in-memory native toolkit for tests and tooling
//!
//! # Configuration Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_bridge_core::{
//!     Bridge, Configurable, HeadlessSurface, NativeVersion, OptionDescriptor, OptionSpec,
//!     OptionTable, Value, Widget,
//! };
//!
//! let surface = Arc::new(
//!     HeadlessSurface::new(NativeVersion::new(8, 6))
//!         .with_class("scale", [OptionSpec::new("length", "length", "Length", "100")]),
//! );
//! let bridge = Bridge::headless(surface.clone());
//! let table = Arc::new(
//!     OptionTable::new("Scale")
//!         .with(OptionDescriptor::from_codec_name("length", bridge.codecs(), "integer")),
//! );
//!
//! let scale = Widget::create(&bridge, "scale", ".s", table, &[]).unwrap();
//! scale.configure("length", Value::Int(250)).unwrap();
//! assert_eq!(scale.cget("length").unwrap(), Value::Int(250));
//!
//! // Unset numbers use the legacy sentinel before version 9.
//! scale.configure("length", Value::Nil).unwrap();
//! assert_eq!(surface.value_of(".s", "length").as_deref(), Some("-1"));
//! ```
//!
//! # Custom Codec Example
//!
//! ```
//! use horizon_bridge_core::{CodecContext, CodecRegistry, FnCodec, NativeVersion, Value};
//!
//! let codecs = CodecRegistry::with_builtins();
//! codecs.register_codec(FnCodec::new(
//!     "upper",
//!     |v, _| Ok(v.as_str().unwrap_or_default().to_uppercase()),
//!     |w, _| Ok(Value::from(w.to_lowercase())),
//! ));
//!
//! let cx = CodecContext::new(NativeVersion::new(9, 0));
//! assert_eq!(codecs.lookup("upper").encode(&Value::from("abc"), &cx).unwrap(), "ABC");
//! assert_eq!(codecs.lookup("missing").name(), "string");
//! ```

mod bridge;
pub mod codec;
mod composite;
mod config;
mod descriptor;
mod error;
mod headless;
mod identity;
mod ids;
pub mod logging;
mod native;
mod value;
pub mod wire;

pub use bridge::{
    Bridge, BridgeBuilder, BridgeConfig, DEFAULT_EMPTY_UNSET_MIN_MAJOR,
    DEFAULT_LEGACY_UNSET_SENTINEL,
};
pub use codec::{
    global_codecs, Codec, CodecContext, CodecRegistry, DecodeFn, EncodeFn, FnCodec,
    FALLBACK_CODEC,
};
pub use composite::{
    Composite, ConfigurableRef, DelegationEntry, NotHandled, OptionHandler, OptionMethods,
    DEFAULT_OPTION,
};
pub use config::{parent_path, Configurable, OptionInfo, Widget};
pub use descriptor::{OptionDescriptor, OptionTable};
pub use error::{BridgeError, Result};
pub use headless::{Call, HeadlessSurface, OptionSpec, CALLBACK_TOKEN_PREFIX};
pub use identity::{IdentityRegistry, IdentityTable, WidgetKey};
pub use ids::{IdGenerator, VIRTUAL_EVENT_PREFIX};
pub use logging::{PerfSpan, RegistryDebug, TreeFormatOptions, TreeStyle};
pub use native::{CallbackSurface, NativeSurface, NativeVersion};
pub use value::{Callback, Value, WidgetRef, WireRepresentable};
