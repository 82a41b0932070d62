//! Option descriptors and per-class option tables.
//!
//! An [`OptionDescriptor`] binds a logical option name to the name used on the
//! wire, the codec that converts its values, alias names, and an optional
//! minimum native version. Descriptors are built once, usually while a widget
//! class is being defined, and are immutable afterwards.
//!
//! # Example
//!
//! ```
//! use horizon_bridge_core::{CodecRegistry, NativeVersion, OptionDescriptor};
//!
//! let codecs = CodecRegistry::with_builtins();
//! let relief = OptionDescriptor::from_codec_name("activerelief", &codecs, "string")
//!     .with_min_version(9);
//!
//! assert!(!relief.is_available(NativeVersion::new(8, 6)));
//! assert_eq!(relief.version_required(), Some(9));
//! assert!(relief.is_available(NativeVersion::new(9, 0)));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::codec::{Codec, CodecContext, CodecRegistry, DecodeFn, EncodeFn};
use crate::error::Result;
use crate::native::NativeVersion;
use crate::value::Value;

/// Metadata for a single configuration option.
#[derive(Clone)]
pub struct OptionDescriptor {
    name: String,
    wire_name: String,
    codec: Arc<dyn Codec>,
    aliases: Vec<String>,
    min_version: Option<u32>,
    encoder: Option<EncodeFn>,
    decoder: Option<DecodeFn>,
}

impl OptionDescriptor {
    /// Create a descriptor whose wire name equals its logical name.
    pub fn new(name: impl Into<String>, codec: Arc<dyn Codec>) -> Self {
        let name = name.into();
        Self {
            wire_name: name.clone(),
            name,
            codec,
            aliases: Vec::new(),
            min_version: None,
            encoder: None,
            decoder: None,
        }
    }

    /// Create a descriptor, resolving the codec by name.
    ///
    /// Unknown codec names resolve to the `string` codec.
    pub fn from_codec_name(name: impl Into<String>, codecs: &CodecRegistry, codec: &str) -> Self {
        Self::new(name, codecs.lookup(codec))
    }

    /// Use a different name on the wire.
    pub fn with_wire_name(mut self, wire_name: impl Into<String>) -> Self {
        self.wire_name = wire_name.into();
        self
    }

    /// Add an alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Add several aliases.
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Require at least this native major version.
    pub fn with_min_version(mut self, major: u32) -> Self {
        self.min_version = Some(major);
        self
    }

    /// Override the codec's encoder for this option only.
    pub fn with_encoder<F>(mut self, encoder: F) -> Self
    where
        F: Fn(&Value, &CodecContext<'_>) -> Result<String> + Send + Sync + 'static,
    {
        self.encoder = Some(Arc::new(encoder));
        self
    }

    /// Override the codec's decoder for this option only.
    pub fn with_decoder<F>(mut self, decoder: F) -> Self
    where
        F: Fn(&str, &CodecContext<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        self.decoder = Some(Arc::new(decoder));
        self
    }

    /// The logical option name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The option name used on the wire.
    pub fn wire_name(&self) -> &str {
        &self.wire_name
    }

    /// The wire name as a command-line flag (`-text`).
    pub fn wire_flag(&self) -> String {
        format!("-{}", self.wire_name)
    }

    /// The codec converting this option's values.
    pub fn codec(&self) -> &Arc<dyn Codec> {
        &self.codec
    }

    /// Alias names.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// The minimum native major version, if gated.
    pub fn version_required(&self) -> Option<u32> {
        self.min_version
    }

    /// Whether the option exists on a native layer of `version`.
    pub fn is_available(&self, version: NativeVersion) -> bool {
        self.min_version.is_none_or(|min| version.major >= min)
    }

    /// Whether `name` is this option's name or one of its aliases.
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }

    /// Encode a value for the wire.
    pub fn to_wire(&self, value: &Value, cx: &CodecContext<'_>) -> Result<String> {
        match &self.encoder {
            Some(encode) => encode(value, cx),
            None => self.codec.encode(value, cx),
        }
    }

    /// Decode a wire value.
    pub fn from_wire(&self, wire: &str, cx: &CodecContext<'_>) -> Result<Value> {
        match &self.decoder {
            Some(decode) => decode(wire, cx),
            None => self.codec.decode(wire, cx),
        }
    }
}

impl fmt::Debug for OptionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionDescriptor")
            .field("name", &self.name)
            .field("wire_name", &self.wire_name)
            .field("codec", &self.codec.name())
            .field("aliases", &self.aliases)
            .field("min_version", &self.min_version)
            .field("encoder", &self.encoder.is_some())
            .field("decoder", &self.decoder.is_some())
            .finish()
    }
}

/// The options understood by one widget class.
///
/// Descriptors keep their declaration order. Names may be given with or
/// without the leading `-`.
#[derive(Clone, Default)]
pub struct OptionTable {
    class_name: String,
    descriptors: IndexMap<String, Arc<OptionDescriptor>>,
    aliases: HashMap<String, String>,
    wire_names: HashMap<String, String>,
}

impl OptionTable {
    /// Create an empty table for `class_name`.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    /// Add a descriptor and return the table.
    pub fn with(mut self, descriptor: OptionDescriptor) -> Self {
        self.insert(descriptor);
        self
    }

    /// Copy every descriptor of `base` that this table does not define yet.
    pub fn inherit(mut self, base: &OptionTable) -> Self {
        for descriptor in base.descriptors.values() {
            if !self.descriptors.contains_key(descriptor.name()) {
                self.insert_shared(descriptor.clone());
            }
        }
        self
    }

    /// Add or replace a descriptor.
    pub fn insert(&mut self, descriptor: OptionDescriptor) {
        self.insert_shared(Arc::new(descriptor));
    }

    fn insert_shared(&mut self, descriptor: Arc<OptionDescriptor>) {
        for alias in descriptor.aliases() {
            self.aliases.insert(alias.clone(), descriptor.name().to_string());
        }
        self.wire_names
            .entry(descriptor.wire_name().to_string())
            .or_insert_with(|| descriptor.name().to_string());
        self.descriptors
            .insert(descriptor.name().to_string(), descriptor);
    }

    /// The native class name of the widgets using this table.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Resolve an option name or alias to its descriptor.
    pub fn resolve(&self, name: &str) -> Option<&Arc<OptionDescriptor>> {
        let name = name.strip_prefix('-').unwrap_or(name);
        if let Some(descriptor) = self.descriptors.get(name) {
            return Some(descriptor);
        }
        self.aliases
            .get(name)
            .and_then(|real| self.descriptors.get(real))
    }

    /// Resolve a wire name (as reported by the native layer) to its descriptor.
    pub fn resolve_wire(&self, wire_name: &str) -> Option<&Arc<OptionDescriptor>> {
        let wire_name = wire_name.strip_prefix('-').unwrap_or(wire_name);
        self.wire_names
            .get(wire_name)
            .and_then(|name| self.descriptors.get(name))
    }

    /// Iterate descriptors in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<OptionDescriptor>> {
        self.descriptors.values()
    }

    /// Descriptors usable with the given native version.
    pub fn available(&self, version: NativeVersion) -> Vec<&Arc<OptionDescriptor>> {
        self.iter().filter(|d| d.is_available(version)).collect()
    }

    /// Number of descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl fmt::Debug for OptionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionTable")
            .field("class_name", &self.class_name)
            .field("options", &self.descriptors.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;

    fn codecs() -> CodecRegistry {
        CodecRegistry::with_builtins()
    }

    #[test]
    fn test_wire_name_defaults_to_name() {
        let d = OptionDescriptor::from_codec_name("text", &codecs(), "string");
        assert_eq!(d.wire_name(), "text");
        assert_eq!(d.wire_flag(), "-text");

        let d = d.with_wire_name("label");
        assert_eq!(d.wire_flag(), "-label");
    }

    #[test]
    fn test_unknown_codec_name_uses_string() {
        let d = OptionDescriptor::from_codec_name("x", &codecs(), "made-up");
        assert_eq!(d.codec().name(), "string");
    }

    #[test]
    fn test_version_gate() {
        let d = OptionDescriptor::from_codec_name("activerelief", &codecs(), "string")
            .with_min_version(9);
        assert!(!d.is_available(NativeVersion::new(8, 6)));
        assert_eq!(d.version_required(), Some(9));
        assert!(d.is_available(NativeVersion::new(9, 0)));

        let ungated = OptionDescriptor::from_codec_name("text", &codecs(), "string");
        assert!(ungated.is_available(NativeVersion::new(1, 0)));
        assert_eq!(ungated.version_required(), None);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let d = OptionDescriptor::from_codec_name("width", &codecs(), "integer")
            .with_encoder(|v, _| Ok(format!("{}c", v.as_int().unwrap_or(0))))
            .with_decoder(|w, _| Ok(Value::from(format!("<{w}>"))));
        let cx = CodecContext::new(NativeVersion::new(9, 0));

        assert_eq!(d.to_wire(&Value::Int(3), &cx).unwrap(), "3c");
        assert_eq!(d.from_wire("3c", &cx).unwrap(), Value::from("<3c>"));
    }

    #[test]
    fn test_codec_used_without_overrides() {
        let d = OptionDescriptor::from_codec_name("width", &codecs(), "integer");
        let cx = CodecContext::new(NativeVersion::new(9, 0));
        assert_eq!(d.from_wire("3c", &cx).unwrap(), Value::Int(3));
        assert!(matches!(d.from_wire("wide", &cx), Err(BridgeError::Conversion { .. })));
    }

    #[test]
    fn test_table_resolves_aliases_and_flags() {
        let codecs = codecs();
        let table = OptionTable::new("Button")
            .with(
                OptionDescriptor::from_codec_name("background", &codecs, "color")
                    .with_aliases(["bg"]),
            )
            .with(OptionDescriptor::from_codec_name("borderwidth", &codecs, "integer").with_alias("bd"));

        assert_eq!(table.resolve("bg").unwrap().name(), "background");
        assert_eq!(table.resolve("-bd").unwrap().name(), "borderwidth");
        assert_eq!(table.resolve_wire("-background").unwrap().name(), "background");
        assert!(table.resolve("nope").is_none());
        assert!(table.resolve("bg").unwrap().answers_to("bg"));
    }

    #[test]
    fn test_table_order_and_inherit() {
        let codecs = codecs();
        let base = OptionTable::new("Widget")
            .with(OptionDescriptor::from_codec_name("background", &codecs, "color"))
            .with(OptionDescriptor::from_codec_name("cursor", &codecs, "string"));
        let table = OptionTable::new("Label")
            .with(OptionDescriptor::from_codec_name("text", &codecs, "string"))
            .with(OptionDescriptor::from_codec_name("background", &codecs, "string"))
            .inherit(&base);

        let names: Vec<&str> = table.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["text", "background", "cursor"]);
        assert_eq!(table.resolve("background").unwrap().codec().name(), "string");
        assert_eq!(table.class_name(), "Label");
    }

    #[test]
    fn test_available_filters_by_version() {
        let codecs = codecs();
        let table = OptionTable::new("Button")
            .with(OptionDescriptor::from_codec_name("text", &codecs, "string"))
            .with(OptionDescriptor::from_codec_name("activerelief", &codecs, "string").with_min_version(9));

        assert_eq!(table.available(NativeVersion::new(8, 6)).len(), 1);
        assert_eq!(table.available(NativeVersion::new(9, 0)).len(), 2);
    }
}
