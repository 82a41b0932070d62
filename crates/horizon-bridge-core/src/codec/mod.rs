//! Value codecs and the codec registry.
//!
//! A [`Codec`] converts between a [`Value`] and the wire string understood by
//! the native layer. Codecs are registered by symbolic name in a
//! [`CodecRegistry`]; looking up an unknown name silently yields the `string`
//! codec, so option declarations never fail because of a typo in a codec name.
//!
//! # Built-in codecs
//!
//! | Name | Encodes | Decodes |
//! |------|---------|---------|
//! | `string` | any value rendered as-is | the raw string |
//! | `integer` | numbers; nil as the unset sentinel | leading integer, ignoring unit suffixes |
//! | `float` | numbers; nil as the unset sentinel | leading float, ignoring unit suffixes |
//! | `boolean` | falsey words and false as `0`, everything else `1` | `0`/`false`/`no`/`off`/empty as false |
//! | `list` | elements joined by single spaces | split on whitespace |
//! | `quoted_list` | elements quoted in native list syntax | brace/quote aware split |
//! | `number_or_string` | rendered as-is | integer, float, or the raw string |
//! | `color` | names, `#rrggbb`, or `[r, g, b]` | the color string |
//! | `widget` | the widget path | a registered widget or the raw path |
//! | `font` | font object id, description string or list | a registered font object or the string |
//! | `callback` | a registration token for callables | the raw token |
//!
//! # Example
//!
//! ```
//! use horizon_bridge_core::{CodecContext, CodecRegistry, NativeVersion, Value};
//!
//! let codecs = CodecRegistry::with_builtins();
//! let cx = CodecContext::new(NativeVersion::new(8, 6));
//!
//! let integer = codecs.lookup("integer");
//! assert_eq!(integer.decode("10c", &cx).unwrap(), Value::Int(10));
//! assert_eq!(integer.encode(&Value::Nil, &cx).unwrap(), "-1");
//!
//! // Unknown names fall back to the string codec.
//! assert_eq!(codecs.lookup("no-such-codec").name(), "string");
//! ```

mod builtin;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::bridge::BridgeConfig;
use crate::error::Result;
use crate::identity::IdentityRegistry;
use crate::logging::targets;
use crate::native::{CallbackSurface, NativeVersion};
use crate::value::Value;

pub use builtin::{
    BooleanCodec, CallbackCodec, ColorCodec, FloatCodec, FontCodec, IntegerCodec, ListCodec,
    NumberOrStringCodec, QuotedListCodec, StringCodec, WidgetCodec,
};

/// Name of the codec used when a lookup misses.
pub const FALLBACK_CODEC: &str = "string";

static DEFAULT_CONFIG: BridgeConfig = BridgeConfig::new();

/// Everything a codec may need besides the value itself.
///
/// Codecs for embedded objects, fonts, or callbacks need access to the
/// owning object and the services around it; simple scalar codecs only look
/// at the native version.
#[derive(Clone, Copy)]
pub struct CodecContext<'a> {
    /// Version of the running native layer.
    pub version: NativeVersion,
    /// Path of the object whose option is being converted.
    pub owner: Option<&'a str>,
    /// Registry used to resolve paths back to wrapper objects.
    pub identities: Option<&'a IdentityRegistry>,
    /// Surface used to register callables.
    pub callbacks: Option<&'a dyn CallbackSurface>,
    /// Bridge-wide conversion settings.
    pub config: &'a BridgeConfig,
}

impl<'a> CodecContext<'a> {
    /// A context with only a version and default settings.
    pub fn new(version: NativeVersion) -> Self {
        Self {
            version,
            owner: None,
            identities: None,
            callbacks: None,
            config: &DEFAULT_CONFIG,
        }
    }

    /// Attach the owning object's path.
    pub fn with_owner(mut self, owner: &'a str) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Attach an identity registry.
    pub fn with_identities(mut self, identities: &'a IdentityRegistry) -> Self {
        self.identities = Some(identities);
        self
    }

    /// Attach a callback surface.
    pub fn with_callbacks(mut self, callbacks: &'a dyn CallbackSurface) -> Self {
        self.callbacks = Some(callbacks);
        self
    }

    /// Use explicit conversion settings.
    pub fn with_config(mut self, config: &'a BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// The wire string meaning "unset" for numeric options.
    ///
    /// Newer native layers accept an empty string; older ones need a legacy
    /// sentinel.
    pub fn unset_sentinel(&self) -> &'a str {
        let config: &'a BridgeConfig = self.config;
        if self.version.major >= config.empty_unset_min_major {
            ""
        } else {
            config.legacy_unset_sentinel.as_ref()
        }
    }
}

impl fmt::Debug for CodecContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecContext")
            .field("version", &self.version)
            .field("owner", &self.owner)
            .field("identities", &self.identities.is_some())
            .field("callbacks", &self.callbacks.is_some())
            .finish()
    }
}

/// A named, bidirectional value converter.
pub trait Codec: Send + Sync {
    /// The name the codec is registered under.
    fn name(&self) -> &str;

    /// Convert a language value into its wire form.
    fn encode(&self, value: &Value, cx: &CodecContext<'_>) -> Result<String>;

    /// Convert a wire string back into a language value.
    fn decode(&self, wire: &str, cx: &CodecContext<'_>) -> Result<Value>;
}

/// Encoder function used by [`FnCodec`] and descriptor overrides.
pub type EncodeFn = Arc<dyn Fn(&Value, &CodecContext<'_>) -> Result<String> + Send + Sync>;

/// Decoder function used by [`FnCodec`] and descriptor overrides.
pub type DecodeFn = Arc<dyn Fn(&str, &CodecContext<'_>) -> Result<Value> + Send + Sync>;

/// A codec assembled from two closures.
///
/// ```
/// use horizon_bridge_core::{Codec, CodecContext, FnCodec, NativeVersion, Value};
/// use horizon_bridge_core::WireRepresentable;
///
/// let upper = FnCodec::new(
///     "upper",
///     |v, _| Ok(v.render().to_uppercase()),
///     |w, _| Ok(Value::from(w.to_lowercase())),
/// );
/// let cx = CodecContext::new(NativeVersion::new(9, 0));
/// assert_eq!(upper.encode(&Value::from("abc"), &cx).unwrap(), "ABC");
/// ```
#[derive(Clone)]
pub struct FnCodec {
    name: String,
    encode: EncodeFn,
    decode: DecodeFn,
}

impl FnCodec {
    /// Build a codec from an encoder and a decoder.
    pub fn new<E, D>(name: impl Into<String>, encode: E, decode: D) -> Self
    where
        E: Fn(&Value, &CodecContext<'_>) -> Result<String> + Send + Sync + 'static,
        D: Fn(&str, &CodecContext<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            encode: Arc::new(encode),
            decode: Arc::new(decode),
        }
    }
}

impl Codec for FnCodec {
    fn name(&self) -> &str {
        &self.name
    }

    fn encode(&self, value: &Value, cx: &CodecContext<'_>) -> Result<String> {
        (self.encode)(value, cx)
    }

    fn decode(&self, wire: &str, cx: &CodecContext<'_>) -> Result<Value> {
        (self.decode)(wire, cx)
    }
}

impl fmt::Debug for FnCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCodec").field("name", &self.name).finish()
    }
}

/// Table of codecs keyed by symbolic name.
///
/// Registration is expected to happen at startup, before concurrent readers
/// exist; the table is nevertheless guarded by an `RwLock` so late
/// registrations stay sound.
pub struct CodecRegistry {
    codecs: RwLock<HashMap<String, Arc<dyn Codec>>>,
    fallback: Arc<dyn Codec>,
}

impl CodecRegistry {
    /// Create a registry containing only the `string` codec.
    pub fn new() -> Self {
        let fallback: Arc<dyn Codec> = Arc::new(StringCodec);
        let mut codecs = HashMap::new();
        codecs.insert(FALLBACK_CODEC.to_string(), fallback.clone());
        Self {
            codecs: RwLock::new(codecs),
            fallback,
        }
    }

    /// Create a registry pre-populated with every built-in codec.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register_codec(IntegerCodec);
        registry.register_codec(FloatCodec);
        registry.register_codec(BooleanCodec);
        registry.register_codec(ListCodec);
        registry.register_codec(QuotedListCodec);
        registry.register_codec(NumberOrStringCodec);
        registry.register_codec(ColorCodec);
        registry.register_codec(WidgetCodec);
        registry.register_codec(FontCodec);
        registry.register_codec(CallbackCodec);
        registry
    }

    /// Install a codec under `name`, replacing any previous one.
    pub fn register(&self, name: impl Into<String>, codec: Arc<dyn Codec>) {
        let name = name.into();
        tracing::trace!(target: targets::CODEC, %name, "registered codec");
        self.codecs.write().insert(name, codec);
    }

    /// Install a codec under its own name.
    pub fn register_codec<C: Codec + 'static>(&self, codec: C) {
        let name = codec.name().to_string();
        self.register(name, Arc::new(codec));
    }

    /// Look up a codec, falling back to `string` when the name is unknown.
    pub fn lookup(&self, name: &str) -> Arc<dyn Codec> {
        match self.codecs.read().get(name) {
            Some(codec) => codec.clone(),
            None => {
                tracing::trace!(target: targets::CODEC, name, "unknown codec, using fallback");
                self.fallback.clone()
            }
        }
    }

    /// Whether a codec is registered under `name`.
    pub fn is_registered(&self, name: &str) -> bool {
        self.codecs.read().contains_key(name)
    }

    /// All registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.codecs.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("codecs", &self.names())
            .finish()
    }
}

static GLOBAL_CODECS: OnceLock<Arc<CodecRegistry>> = OnceLock::new();

/// The process-wide codec registry with all built-ins installed.
///
/// Bridges created without an explicit registry share this instance.
pub fn global_codecs() -> Arc<CodecRegistry> {
    GLOBAL_CODECS
        .get_or_init(|| Arc::new(CodecRegistry::with_builtins()))
        .clone()
}

static_assertions::assert_impl_all!(CodecRegistry: Send, Sync);
