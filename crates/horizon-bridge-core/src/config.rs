//! The configuration engine.
//!
//! Every configurable object answers the same small protocol, captured by the
//! [`Configurable`] trait: read an option, write an option, describe an
//! option, describe all options. [`Widget`] implements it for a single native
//! widget by converting values through its class's [`OptionTable`] and
//! forwarding to the bridge's native surface.
//!
//! Options missing from the table are not rejected locally. Their names go
//! to the native layer as given and values cross unconverted; the native
//! layer decides whether they exist.
//!
//! # Key Types
//!
//! - [`Configurable`] - The option protocol shared by widgets and composites
//! - [`Widget`] - A native widget driven through a bridge
//! - [`OptionInfo`] - What `configinfo` reports for one option
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_bridge_core::{
//!     Bridge, CodecRegistry, Configurable, HeadlessSurface, NativeVersion, OptionDescriptor,
//!     OptionSpec, OptionTable, Value, Widget,
//! };
//!
//! let surface = Arc::new(
//!     HeadlessSurface::new(NativeVersion::new(9, 0))
//!         .with_class("label", [OptionSpec::new("text", "text", "Text", "")]),
//! );
//! let bridge = Bridge::headless(surface);
//! let codecs = CodecRegistry::with_builtins();
//! let table = Arc::new(
//!     OptionTable::new("Label").with(OptionDescriptor::from_codec_name("text", &codecs, "string")),
//! );
//!
//! let label = Widget::create(&bridge, "label", ".l", table, &[]).unwrap();
//! label.configure("text", Value::from("Hello")).unwrap();
//! assert_eq!(label.cget("text").unwrap(), Value::from("Hello"));
//! ```

use std::fmt;
use std::sync::Arc;

use crate::bridge::Bridge;
use crate::codec::FALLBACK_CODEC;
use crate::descriptor::{OptionDescriptor, OptionTable};
use crate::error::{BridgeError, Result};
use crate::logging::targets;
use crate::value::{Value, WireRepresentable};
use crate::wire::split_list;

const TARGET: &str = targets::CONFIG;

// ============================================================================
// OptionInfo
// ============================================================================

/// Introspection record for one option.
///
/// Mirrors the native `configure -option` reply: the option name, its wire
/// name, its option database name and class, its default and its current
/// value. Synonym options (`-bg` standing for `-background`) only carry the
/// name they stand for in [`OptionInfo::alias_of`].
#[derive(Debug, Clone, PartialEq)]
pub struct OptionInfo {
    /// The logical option name.
    pub name: String,
    /// The option name on the wire, without the leading `-`.
    pub wire_name: String,
    /// The option database name.
    pub db_name: String,
    /// The option database class (the wire class name).
    pub db_class: String,
    /// The default value, decoded.
    pub default: Value,
    /// The current value, decoded.
    pub current: Value,
    /// For synonyms, the option this name stands for.
    pub alias_of: Option<String>,
}

impl OptionInfo {
    /// Build an info record for a real option.
    pub fn new(name: impl Into<String>, wire_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            wire_name: wire_name.into(),
            db_name: String::new(),
            db_class: String::new(),
            default: Value::Nil,
            current: Value::Nil,
            alias_of: None,
        }
    }

    /// Set the option database name and class.
    pub fn with_database(mut self, db_name: impl Into<String>, db_class: impl Into<String>) -> Self {
        self.db_name = db_name.into();
        self.db_class = db_class.into();
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    /// Set the current value.
    pub fn with_current(mut self, current: impl Into<Value>) -> Self {
        self.current = current.into();
        self
    }

    /// Whether this record describes a synonym.
    pub fn is_synonym(&self) -> bool {
        self.alias_of.is_some()
    }

    /// Return the same record under a different logical name.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The five-element form: name, wire name, wire class, default, current.
    pub fn as_tuple(&self) -> (&str, &str, &str, &Value, &Value) {
        (
            &self.name,
            &self.wire_name,
            &self.db_class,
            &self.default,
            &self.current,
        )
    }
}

// ============================================================================
// Configurable
// ============================================================================

/// The option protocol shared by widgets and composites.
pub trait Configurable: Send + Sync {
    /// The native path of the object.
    fn path(&self) -> &str;

    /// Read the current value of `option`.
    fn cget(&self, option: &str) -> Result<Value>;

    /// Set `option` to `value`.
    fn configure(&self, option: &str, value: Value) -> Result<()>;

    /// Describe one option.
    fn configinfo(&self, option: &str) -> Result<OptionInfo>;

    /// Describe every option.
    fn configinfo_all(&self) -> Result<Vec<OptionInfo>>;

    /// Apply several options in order.
    ///
    /// There is no rollback: if one pair fails, earlier pairs stay applied.
    fn configure_many(&self, pairs: &[(&str, Value)]) -> Result<()> {
        for (option, value) in pairs {
            self.configure(option, value.clone())?;
        }
        Ok(())
    }

    /// Query when `value` is omitted, set when it is given.
    ///
    /// `Some(Value::Nil)` sets the option to nil; only `None` queries. A set
    /// returns `Value::Nil`.
    fn access(&self, option: &str, value: Option<Value>) -> Result<Value> {
        match value {
            None => self.cget(option),
            Some(value) => self.configure(option, value).map(|()| Value::Nil),
        }
    }
}

static_assertions::assert_obj_safe!(Configurable);

// ============================================================================
// Widget
// ============================================================================

/// A native widget configured through a bridge.
#[derive(Clone)]
pub struct Widget {
    bridge: Bridge,
    path: String,
    options: Arc<OptionTable>,
}

impl Widget {
    /// Wrap an existing native widget without creating it.
    pub fn new(bridge: Bridge, path: impl Into<String>, options: Arc<OptionTable>) -> Self {
        Self {
            bridge,
            path: path.into(),
            options,
        }
    }

    /// Create a native widget with `class_command` and register it.
    ///
    /// Initial options are converted like [`Configurable::configure`] and sent
    /// with the creation command. The wrapper is registered in the bridge's
    /// identity registry before the native call, so callbacks fired during
    /// creation can already resolve it.
    pub fn create(
        bridge: &Bridge,
        class_command: &str,
        path: &str,
        options: Arc<OptionTable>,
        initial: &[(&str, Value)],
    ) -> Result<Arc<Widget>> {
        let widget = Arc::new(Self::new(bridge.clone(), path, options));

        let mut args = vec![path.to_string()];
        for (option, value) in initial {
            let (flag, wire) = widget.encode(option, value)?;
            args.push(flag);
            args.push(wire);
        }

        let previous = bridge.identities().with_write(|table| {
            let previous = table
                .get(path)
                .map(|wrapper| (wrapper, table.parent_of(path).map(str::to_string)));
            table.insert(path, parent_path(path), widget.clone());
            previous
        });
        if let Err(err) = bridge.invoke(class_command, &args) {
            // A failed create must not disturb whoever owned the path before.
            bridge.identities().with_write(|table| match previous {
                Some((wrapper, parent)) => {
                    table.insert(path, parent.as_deref(), wrapper.object().clone());
                }
                None => {
                    table.remove(path);
                }
            });
            return Err(err);
        }
        tracing::debug!(target: TARGET, path, class = widget.class_name(), "created widget");
        Ok(widget)
    }

    /// The bridge this widget talks through.
    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    /// The option table of this widget's class.
    pub fn options(&self) -> &Arc<OptionTable> {
        &self.options
    }

    /// The class name from the option table.
    pub fn class_name(&self) -> &str {
        self.options.class_name()
    }

    /// Same as [`Configurable::configinfo`].
    pub fn describe(&self, option: &str) -> Result<OptionInfo> {
        self.configinfo(option)
    }

    /// Descriptors usable with the running native version.
    pub fn available_options(&self) -> Vec<Arc<OptionDescriptor>> {
        self.options
            .available(self.bridge.version())
            .into_iter()
            .cloned()
            .collect()
    }

    /// Destroy the native widget and drop its identity entry.
    pub fn destroy(&self) -> Result<()> {
        self.bridge.invoke("destroy", &[self.path.clone()])?;
        self.bridge.identities().remove(&self.path);
        Ok(())
    }

    fn descriptor(&self, option: &str) -> Option<&Arc<OptionDescriptor>> {
        let descriptor = self.options.resolve(option);
        if descriptor.is_none() {
            tracing::trace!(target: TARGET, path = %self.path, option, "option not in table, passing through");
        }
        descriptor
    }

    fn flag(&self, option: &str) -> String {
        match self.descriptor(option) {
            Some(d) => d.wire_flag(),
            None if option.starts_with('-') => option.to_string(),
            None => format!("-{option}"),
        }
    }

    fn encode(&self, option: &str, value: &Value) -> Result<(String, String)> {
        match self.descriptor(option) {
            Some(d) => {
                if !d.is_available(self.bridge.version()) {
                    tracing::debug!(
                        target: TARGET,
                        path = %self.path,
                        option,
                        required = ?d.version_required(),
                        "option is not available on this native version"
                    );
                }
                let cx = self.bridge.codec_context(Some(&self.path));
                Ok((d.wire_flag(), d.to_wire(value, &cx)?))
            }
            None => {
                let cx = self.bridge.codec_context(Some(&self.path));
                let codec = self.bridge.codecs().lookup(FALLBACK_CODEC);
                Ok((self.flag(option), codec.encode(value, &cx)?))
            }
        }
    }

    fn decode(&self, descriptor: Option<&Arc<OptionDescriptor>>, wire: &str) -> Result<Value> {
        match descriptor {
            Some(d) => d.from_wire(wire, &self.bridge.codec_context(Some(&self.path))),
            None => Ok(Value::Str(wire.to_string())),
        }
    }

    fn parse_info(&self, reply: &str) -> Result<OptionInfo> {
        let fields = split_list(reply)?;
        match fields.as_slice() {
            [flag, target] => {
                let wire_name = flag.trim_start_matches('-');
                let alias_of = target.trim_start_matches('-');
                let name = self
                    .options
                    .resolve_wire(wire_name)
                    .map_or(wire_name, |d| d.name());
                let mut info = OptionInfo::new(name, wire_name);
                info.alias_of = Some(alias_of.to_string());
                Ok(info)
            }
            [flag, db_name, db_class, default, current] => {
                let wire_name = flag.trim_start_matches('-');
                let descriptor = self.options.resolve_wire(wire_name);
                let name = descriptor.map_or(wire_name, |d| d.name());
                Ok(OptionInfo::new(name, wire_name)
                    .with_database(db_name.as_str(), db_class.as_str())
                    .with_default(self.decode(descriptor, default)?)
                    .with_current(self.decode(descriptor, current)?))
            }
            _ => Err(BridgeError::conversion(
                "configinfo",
                reply,
                "expected 2 or 5 elements",
            )),
        }
    }
}

impl Configurable for Widget {
    fn path(&self) -> &str {
        &self.path
    }

    fn cget(&self, option: &str) -> Result<Value> {
        let flag = self.flag(option);
        let wire = self
            .bridge
            .invoke(&self.path, &["cget".to_string(), flag])?;
        self.decode(self.descriptor(option), &wire)
    }

    fn configure(&self, option: &str, value: Value) -> Result<()> {
        let (flag, wire) = self.encode(option, &value)?;
        self.bridge
            .invoke(&self.path, &["configure".to_string(), flag, wire])?;
        Ok(())
    }

    fn configinfo(&self, option: &str) -> Result<OptionInfo> {
        let flag = self.flag(option);
        let reply = self
            .bridge
            .invoke(&self.path, &["configure".to_string(), flag])?;
        let mut info = self.parse_info(&reply)?;
        // Aliases report under the canonical name.
        if let Some(d) = self.descriptor(option) {
            info.name = d.name().to_string();
        }
        Ok(info)
    }

    fn configinfo_all(&self) -> Result<Vec<OptionInfo>> {
        let reply = self
            .bridge
            .invoke(&self.path, &["configure".to_string()])?;
        split_list(&reply)?
            .iter()
            .map(|entry| self.parse_info(entry))
            .collect()
    }
}

impl fmt::Debug for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Widget")
            .field("path", &self.path)
            .field("class", &self.class_name())
            .finish()
    }
}

static_assertions::assert_impl_all!(Widget: Send, Sync);

/// The parent of a widget path, or `None` for the root and top-level names.
pub fn parent_path(path: &str) -> Option<&str> {
    match path.rfind('.') {
        Some(0) if path.len() > 1 => Some("."),
        Some(0) | None => None,
        Some(idx) => Some(&path[..idx]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecRegistry;
    use crate::headless::{HeadlessSurface, OptionSpec};
    use crate::native::NativeVersion;

    fn setup(version: NativeVersion) -> (Arc<HeadlessSurface>, Bridge, Arc<OptionTable>) {
        let surface = Arc::new(HeadlessSurface::new(version).with_class(
            "button",
            [
                OptionSpec::new("text", "text", "Text", ""),
                OptionSpec::new("width", "width", "Width", "0"),
                OptionSpec::new("state", "state", "State", "normal"),
                OptionSpec::new("background", "background", "Background", "#d9d9d9"),
                OptionSpec::synonym("bg", "background"),
                OptionSpec::new("underline", "underline", "Underline", "-1"),
            ],
        ));
        let bridge = Bridge::headless(surface.clone());
        let codecs = CodecRegistry::with_builtins();
        let table = Arc::new(
            OptionTable::new("Button")
                .with(OptionDescriptor::from_codec_name("text", &codecs, "string"))
                .with(OptionDescriptor::from_codec_name("width", &codecs, "integer"))
                .with(
                    OptionDescriptor::from_codec_name("background", &codecs, "color")
                        .with_alias("bg"),
                )
                .with(OptionDescriptor::from_codec_name("underline", &codecs, "integer"))
                .with(
                    OptionDescriptor::from_codec_name("caption", &codecs, "string")
                        .with_wire_name("text"),
                ),
        );
        (surface, bridge, table)
    }

    #[test]
    fn test_configure_and_cget_convert() {
        let (surface, bridge, table) = setup(NativeVersion::new(9, 0));
        let button = Widget::create(&bridge, "button", ".b", table, &[("width", Value::Int(4))]).unwrap();

        assert_eq!(surface.value_of(".b", "width").as_deref(), Some("4"));
        assert_eq!(button.cget("width").unwrap(), Value::Int(4));

        button.configure("bg", Value::from(vec![Value::Int(255), Value::Int(0), Value::Int(0)])).unwrap();
        assert_eq!(surface.value_of(".b", "background").as_deref(), Some("#ff0000"));
    }

    #[test]
    fn test_unset_sentinel_depends_on_version() {
        let (surface, bridge, table) = setup(NativeVersion::new(8, 6));
        let b = Widget::create(&bridge, "button", ".b", table, &[]).unwrap();
        b.configure("underline", Value::Nil).unwrap();
        assert_eq!(surface.value_of(".b", "underline").as_deref(), Some("-1"));

        surface.set_version(NativeVersion::new(9, 0));
        b.configure("underline", Value::Nil).unwrap();
        assert_eq!(surface.value_of(".b", "underline").as_deref(), Some(""));
        assert_eq!(b.cget("underline").unwrap(), Value::Nil);
    }

    #[test]
    fn test_unknown_option_passes_through() {
        let (surface, bridge, table) = setup(NativeVersion::new(9, 0));
        let b = Widget::create(&bridge, "button", ".b", table, &[]).unwrap();

        // Not in the table, but the native class knows it.
        b.configure("state", Value::from("disabled")).unwrap();
        assert_eq!(b.cget("-state").unwrap(), Value::from("disabled"));

        // Unknown everywhere: the native error propagates unchanged.
        let err = b.configure("bogus", Value::from("x")).unwrap_err();
        assert_eq!(err, BridgeError::native(".b", "unknown option \"-bogus\""));
        let last = surface.calls().pop().unwrap();
        assert_eq!(last.args, vec!["configure", "-bogus", "x"]);
    }

    #[test]
    fn test_untabled_callback_is_registered() {
        use crate::native::CallbackSurface;
        use crate::value::Callback;

        let surface = Arc::new(HeadlessSurface::new(NativeVersion::new(9, 0)).with_class(
            "button",
            [OptionSpec::new("command", "command", "Command", "")],
        ));
        let bridge = Bridge::headless(surface.clone());
        let b = Widget::create(&bridge, "button", ".b", Arc::new(OptionTable::new("Button")), &[]).unwrap();

        b.configure("command", Value::from(Callback::new(|_| Ok("pressed".into())))).unwrap();
        assert_eq!(surface.callback_count(), 1);
        let token = surface.value_of(".b", "command").unwrap();
        assert!(!token.is_empty());
        assert_eq!(surface.invoke_callback(&token, &[]).unwrap(), "pressed");
    }

    #[test]
    fn test_wire_name_differs_from_name() {
        let (surface, bridge, table) = setup(NativeVersion::new(9, 0));
        let b = Widget::create(&bridge, "button", ".b", table, &[]).unwrap();
        b.configure("caption", Value::from("OK")).unwrap();
        assert_eq!(surface.value_of(".b", "text").as_deref(), Some("OK"));
    }

    #[test]
    fn test_configure_many_is_not_atomic() {
        let (surface, bridge, table) = setup(NativeVersion::new(9, 0));
        let b = Widget::create(&bridge, "button", ".b", table, &[]).unwrap();

        let result = b.configure_many(&[
            ("text", Value::from("first")),
            ("bogus", Value::from("x")),
            ("width", Value::Int(9)),
        ]);
        assert!(result.unwrap_err().is_native());
        assert_eq!(surface.value_of(".b", "text").as_deref(), Some("first"));
        assert_eq!(surface.value_of(".b", "width").as_deref(), Some("0"));
    }

    #[test]
    fn test_describe() {
        let (_surface, bridge, table) = setup(NativeVersion::new(9, 0));
        let b = Widget::create(&bridge, "button", ".b", table, &[("width", Value::Int(3))]).unwrap();

        let info = b.describe("width").unwrap();
        assert_eq!(
            info.as_tuple(),
            ("width", "width", "Width", &Value::Int(0), &Value::Int(3))
        );
        assert_eq!(info.db_name, "width");

        let bg = b.describe("bg").unwrap();
        assert_eq!(bg.name, "background");
        assert_eq!(bg.current, Value::from("#d9d9d9"));
    }

    #[test]
    fn test_configinfo_all() {
        let (_surface, bridge, table) = setup(NativeVersion::new(9, 0));
        let b = Widget::create(&bridge, "button", ".b", table, &[]).unwrap();
        let all = b.configinfo_all().unwrap();
        assert_eq!(all.len(), 6);
        let synonym = all.iter().find(|i| i.wire_name == "bg").unwrap();
        assert_eq!(synonym.alias_of.as_deref(), Some("background"));
        assert!(synonym.is_synonym());
    }

    #[test]
    fn test_access_distinguishes_omitted_from_nil() {
        let (surface, bridge, table) = setup(NativeVersion::new(9, 0));
        let b = Widget::create(&bridge, "button", ".b", table, &[("text", Value::from("x"))]).unwrap();

        assert_eq!(b.access("text", None).unwrap(), Value::from("x"));
        assert_eq!(b.access("text", Some(Value::Nil)).unwrap(), Value::Nil);
        assert_eq!(surface.value_of(".b", "text").as_deref(), Some(""));
    }

    #[test]
    fn test_create_registers_identity() {
        let (_surface, bridge, table) = setup(NativeVersion::new(9, 0));
        let b = Widget::create(&bridge, "button", ".b", table.clone(), &[]).unwrap();
        let found = bridge.identities().lookup(".b").unwrap();
        assert!(std::ptr::eq(found.downcast_ref::<Widget>().unwrap(), &*b));

        // A failed creation leaves nothing behind.
        assert!(Widget::create(&bridge, "button", ".c", table, &[("bogus", Value::Int(1))]).is_err());
        assert!(bridge.identities().lookup(".c").is_none());

        b.destroy().unwrap();
        assert!(bridge.identities().lookup(".b").is_none());
    }

    #[test]
    fn test_duplicate_create_keeps_existing_identity() {
        let (surface, bridge, table) = setup(NativeVersion::new(9, 0));
        let frame = Widget::create(&bridge, "button", ".f", table.clone(), &[]).unwrap();
        let first = Widget::create(&bridge, "button", ".f.b", table.clone(), &[]).unwrap();

        let err = Widget::create(&bridge, "button", ".f.b", table, &[]).unwrap_err();
        assert!(err.is_native());
        assert!(surface.exists(".f.b"));

        let found = bridge.identities().lookup(".f.b").unwrap();
        assert!(std::ptr::eq(found.downcast_ref::<Widget>().unwrap(), &*first));
        assert_eq!(bridge.identities().parent_of(".f.b").as_deref(), Some(frame.path()));
    }

    #[test]
    fn test_available_options_follow_version() {
        let codecs = CodecRegistry::with_builtins();
        let table = Arc::new(
            OptionTable::new("Button")
                .with(OptionDescriptor::from_codec_name("text", &codecs, "string"))
                .with(OptionDescriptor::from_codec_name("activerelief", &codecs, "string").with_min_version(9)),
        );
        let surface = Arc::new(HeadlessSurface::new(NativeVersion::new(8, 6)));
        let bridge = Bridge::headless(surface.clone());
        let w = Widget::new(bridge, ".b", table);
        assert_eq!(w.available_options().len(), 1);
        surface.set_version(NativeVersion::new(9, 0));
        assert_eq!(w.available_options().len(), 2);
    }

    #[test]
    fn test_parent_path() {
        assert_eq!(parent_path(".f.b"), Some(".f"));
        assert_eq!(parent_path(".f"), Some("."));
        assert_eq!(parent_path("."), None);
        assert_eq!(parent_path("font1"), None);
    }
}
