//! The delegation engine for composite widgets.
//!
//! A [`Composite`] is one configurable object made of several native
//! widgets: a base container (usually a frame) plus children. Options are
//! routed per name, trying each tier in turn until one handles the request:
//!
//! 1. An option handler registered with [`Composite::option_methods`]
//! 2. An explicit delegation for the option name
//! 3. The `DEFAULT` delegation, if any
//! 4. The primary component, if one is designated (writes only)
//! 5. The base container
//!
//! Writes to a delegated option fan out to every child of every entry.
//! Reads ask only the last child of the last entry.
//!
//! A failing explicit delegation is logged once per option with
//! `tracing::warn!` and then treated as handled. A `DEFAULT` delegation that
//! no child accepts is skipped silently and the request moves on to the next
//! tier.
//!
//! # Key Types
//!
//! - [`Composite`] - The composite object
//! - [`OptionHandler`] - Custom per-option logic
//! - [`OptionMethods`] - Closure-backed [`OptionHandler`]
//! - [`DelegationEntry`] - One target option and its children
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_bridge_core::{
//!     Bridge, Composite, Configurable, ConfigurableRef, HeadlessSurface, NativeVersion,
//!     OptionSpec, OptionTable, Value, Widget,
//! };
//!
//! let surface = Arc::new(
//!     HeadlessSurface::new(NativeVersion::new(9, 0))
//!         .with_class("frame", [])
//!         .with_class("label", [OptionSpec::new("text", "text", "Text", "")]),
//! );
//! let bridge = Bridge::headless(surface.clone());
//! let table = Arc::new(OptionTable::new("Frame"));
//!
//! let frame = Widget::create(&bridge, "frame", ".f", table.clone(), &[]).unwrap();
//! let label: ConfigurableRef = Widget::create(&bridge, "label", ".f.l", table, &[]).unwrap();
//!
//! let composite = Composite::new(frame);
//! composite.delegate_alias("label_text", "text", [label]).unwrap();
//! composite.configure("label_text", Value::from("Hello")).unwrap();
//!
//! assert_eq!(composite.cget("label_text").unwrap(), Value::from("Hello"));
//! assert_eq!(surface.count_calls(".f.l", "configure"), 1);
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};

use crate::config::{parent_path, Configurable, OptionInfo, Widget};
use crate::error::{BridgeError, Result};
use crate::logging::targets;
use crate::value::Value;

const TARGET: &str = targets::DELEGATE;

/// Delegation key that catches every option without a more specific rule.
pub const DEFAULT_OPTION: &str = "DEFAULT";

/// A shared, type-erased configurable child.
pub type ConfigurableRef = Arc<dyn Configurable>;

fn bare(option: &str) -> &str {
    option.strip_prefix('-').unwrap_or(option)
}

// ============================================================================
// Option handlers
// ============================================================================

/// Custom logic behind one composite option.
pub trait OptionHandler: Send + Sync {
    /// Apply a new value.
    fn set(&self, value: Value) -> Result<()>;

    /// Read the current value.
    ///
    /// `None` means the handler has no getter; the composite then answers
    /// with the last value it passed to [`OptionHandler::set`].
    fn get(&self) -> Option<Result<Value>> {
        None
    }

    /// Describe the option.
    ///
    /// `None` lets the composite build a record from the current value.
    fn info(&self, _name: &str) -> Option<Result<OptionInfo>> {
        None
    }
}

static_assertions::assert_obj_safe!(OptionHandler);

type SetFn = Arc<dyn Fn(Value) -> Result<()> + Send + Sync>;
type GetFn = Arc<dyn Fn() -> Result<Value> + Send + Sync>;
type InfoFn = Arc<dyn Fn(&str) -> Result<OptionInfo> + Send + Sync>;

/// An [`OptionHandler`] built from closures.
#[derive(Clone)]
pub struct OptionMethods {
    setter: SetFn,
    getter: Option<GetFn>,
    info: Option<InfoFn>,
}

impl OptionMethods {
    /// One callable serving both directions.
    ///
    /// It receives `Some(value)` to set and `None` to read; the result of a
    /// set call is discarded.
    pub fn accessor<F>(f: F) -> Self
    where
        F: Fn(Option<Value>) -> Result<Value> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let getter = f.clone();
        Self {
            setter: Arc::new(move |value| f(Some(value)).map(|_| ())),
            getter: Some(Arc::new(move || getter(None))),
            info: None,
        }
    }

    /// A setter without a getter. Reads return the last value set.
    pub fn setter_only<F>(f: F) -> Self
    where
        F: Fn(Value) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            setter: Arc::new(f),
            getter: None,
            info: None,
        }
    }

    /// Add (or replace) the getter.
    pub fn with_getter<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Result<Value> + Send + Sync + 'static,
    {
        self.getter = Some(Arc::new(f));
        self
    }

    /// Add an info method.
    pub fn with_info<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Result<OptionInfo> + Send + Sync + 'static,
    {
        self.info = Some(Arc::new(f));
        self
    }
}

impl OptionHandler for OptionMethods {
    fn set(&self, value: Value) -> Result<()> {
        (self.setter)(value)
    }

    fn get(&self) -> Option<Result<Value>> {
        self.getter.as_ref().map(|get| get())
    }

    fn info(&self, name: &str) -> Option<Result<OptionInfo>> {
        self.info.as_ref().map(|info| info(name))
    }
}

impl fmt::Debug for OptionMethods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionMethods")
            .field("getter", &self.getter.is_some())
            .field("info", &self.info.is_some())
            .finish()
    }
}

// ============================================================================
// Delegation table
// ============================================================================

/// One target option and the children it is forwarded to.
#[derive(Clone)]
pub struct DelegationEntry {
    /// The option name used on the children.
    pub option: String,
    /// Children in registration order.
    pub children: Vec<ConfigurableRef>,
}

impl DelegationEntry {
    /// The child consulted for reads.
    pub fn reader(&self) -> Option<&ConfigurableRef> {
        self.children.last()
    }

    /// Paths of all children.
    pub fn child_paths(&self) -> Vec<String> {
        self.children.iter().map(|c| c.path().to_string()).collect()
    }
}

impl fmt::Debug for DelegationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegationEntry")
            .field("option", &self.option)
            .field("children", &self.child_paths())
            .finish()
    }
}

/// Marker returned by a tier that does not handle an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotHandled;

type Tier<T> = std::result::Result<Result<T>, NotHandled>;

#[derive(Default)]
struct CompositeState {
    primary: Option<ConfigurableRef>,
    delegations: IndexMap<String, Vec<DelegationEntry>>,
    methods: IndexMap<String, Arc<dyn OptionHandler>>,
    shadow: HashMap<String, Value>,
}

/// Where a delegated request is routed.
struct Route {
    entries: Vec<DelegationEntry>,
    is_default: bool,
}

// ============================================================================
// Composite
// ============================================================================

/// A configurable object aggregating several native widgets.
pub struct Composite {
    base: Arc<Widget>,
    state: RwLock<CompositeState>,
    warned: Mutex<HashSet<String>>,
}

impl Composite {
    /// Create a composite around its base container.
    ///
    /// The identity registry keeps pointing at the base widget. Wrappers that
    /// own a composite register themselves under its path; a standalone
    /// composite should use [`Composite::registered`].
    pub fn new(base: Arc<Widget>) -> Self {
        Self {
            base,
            state: RwLock::new(CompositeState::default()),
            warned: Mutex::new(HashSet::new()),
        }
    }

    /// Create a composite and register it under the base container's path.
    pub fn registered(base: Arc<Widget>) -> Arc<Self> {
        let identities = base.bridge().identities().clone();
        let composite = Arc::new(Self::new(base));
        let path = composite.path();
        identities.register_dyn(path, parent_path(path), composite.clone());
        composite
    }

    /// The base container.
    pub fn base(&self) -> &Arc<Widget> {
        &self.base
    }

    /// Designate the component that receives otherwise unhandled writes.
    pub fn set_primary(&self, component: ConfigurableRef) {
        self.state.write().primary = Some(component);
    }

    /// The primary component, if any.
    pub fn primary(&self) -> Option<ConfigurableRef> {
        self.state.read().primary.clone()
    }

    /// Delegate `option` to `children` under its own name.
    pub fn delegate<I>(&self, option: &str, children: I) -> Result<()>
    where
        I: IntoIterator<Item = ConfigurableRef>,
    {
        self.delegate_alias(option, option, children)
    }

    /// Delegate `alias` on the composite to `real` on `children`.
    ///
    /// Repeated calls for the same alias and real option append children to
    /// the existing entry. Fails without touching the table if no children
    /// are given or if exactly one of the two names is `DEFAULT`.
    pub fn delegate_alias<I>(&self, alias: &str, real: &str, children: I) -> Result<()>
    where
        I: IntoIterator<Item = ConfigurableRef>,
    {
        let alias = bare(alias);
        let real = bare(real);
        let children: Vec<ConfigurableRef> = children.into_iter().collect();

        if children.is_empty() {
            return Err(BridgeError::invalid_argument(format!(
                "no target widgets given for option {alias:?}"
            )));
        }
        if alias != real && (alias == DEFAULT_OPTION || real == DEFAULT_OPTION) {
            return Err(BridgeError::invalid_argument(format!(
                "cannot alias {DEFAULT_OPTION} ({alias:?} -> {real:?})"
            )));
        }

        tracing::debug!(
            target: TARGET,
            composite = %self.base.path(),
            alias,
            real,
            children = children.len(),
            "delegate"
        );

        let mut state = self.state.write();
        let entries = state.delegations.entry(alias.to_string()).or_default();
        match entries.iter_mut().find(|e| e.option == real) {
            Some(entry) => entry.children.extend(children),
            None => entries.push(DelegationEntry {
                option: real.to_string(),
                children,
            }),
        }
        Ok(())
    }

    /// Register option handlers, replacing earlier ones with the same name.
    pub fn option_methods<I, S>(&self, specs: I)
    where
        I: IntoIterator<Item = (S, OptionMethods)>,
        S: Into<String>,
    {
        for (name, methods) in specs {
            let name: String = name.into();
            self.option_handler(&name, Arc::new(methods));
        }
    }

    /// Register a single option handler.
    pub fn option_handler(&self, name: &str, handler: Arc<dyn OptionHandler>) {
        let name = bare(name).to_string();
        tracing::debug!(target: TARGET, composite = %self.base.path(), option = %name, "option method");
        self.state.write().methods.insert(name, handler);
    }

    /// Whether a delegation entry exists under `alias`.
    pub fn is_delegated(&self, alias: &str) -> bool {
        self.state.read().delegations.contains_key(bare(alias))
    }

    /// Snapshot of the delegation table in registration order.
    pub fn delegations(&self) -> Vec<(String, Vec<DelegationEntry>)> {
        self.state
            .read()
            .delegations
            .iter()
            .map(|(alias, entries)| (alias.clone(), entries.clone()))
            .collect()
    }

    /// Names with an option handler, in registration order.
    pub fn option_method_names(&self) -> Vec<String> {
        self.state.read().methods.keys().cloned().collect()
    }

    /// The last value passed to the handler of `option`.
    pub fn shadow_value(&self, option: &str) -> Option<Value> {
        self.state.read().shadow.get(bare(option)).cloned()
    }

    // ------------------------------------------------------------------------
    // Routing helpers
    // ------------------------------------------------------------------------

    fn handler(&self, option: &str) -> Option<Arc<dyn OptionHandler>> {
        self.state.read().methods.get(option).cloned()
    }

    fn route(&self, option: &str) -> Option<Route> {
        let state = self.state.read();
        if option != DEFAULT_OPTION {
            if let Some(entries) = state.delegations.get(option) {
                return Some(Route {
                    entries: entries.clone(),
                    is_default: false,
                });
            }
        }
        state.delegations.get(DEFAULT_OPTION).map(|entries| Route {
            entries: entries.clone(),
            is_default: true,
        })
    }

    /// The option name a child sees for `option` under `entry`.
    fn target<'a>(entry: &'a DelegationEntry, option: &'a str) -> &'a str {
        if entry.option == DEFAULT_OPTION {
            option
        } else {
            &entry.option
        }
    }

    fn warn_once(&self, option: &str, err: &BridgeError) {
        let enabled = self.base.bridge().config().warn_on_delegate_failure;
        if enabled && self.warned.lock().insert(option.to_string()) {
            tracing::warn!(
                target: TARGET,
                composite = %self.base.path(),
                option,
                error = %err,
                "delegated option failed"
            );
        } else {
            tracing::trace!(target: TARGET, composite = %self.base.path(), option, error = %err, "delegated option failed again");
        }
    }

    fn skip_default(&self, option: &str, err: &BridgeError) {
        tracing::trace!(target: TARGET, composite = %self.base.path(), option, error = %err, "DEFAULT delegation skipped");
    }

    // ------------------------------------------------------------------------
    // Write tiers
    // ------------------------------------------------------------------------

    fn set_by_method(&self, option: &str, value: &Value) -> Tier<()> {
        let handler = self.handler(option).ok_or(NotHandled)?;
        tracing::trace!(target: TARGET, composite = %self.base.path(), option, "configure via option method");
        let result = handler.set(value.clone());
        if result.is_ok() {
            self.state
                .write()
                .shadow
                .insert(option.to_string(), value.clone());
        }
        Ok(result)
    }

    fn set_by_delegation(&self, option: &str, value: &Value) -> Tier<()> {
        let route = self.route(option).ok_or(NotHandled)?;
        tracing::trace!(
            target: TARGET,
            composite = %self.base.path(),
            option,
            default = route.is_default,
            "configure via delegation"
        );

        // Every child gets the write even when an earlier one rejects it.
        let mut applied = 0usize;
        let mut failure = None;
        for entry in &route.entries {
            let target = Self::target(entry, option);
            for child in &entry.children {
                match child.configure(target, value.clone()) {
                    Ok(()) => applied += 1,
                    Err(err) => {
                        failure.get_or_insert(err);
                    }
                }
            }
        }

        match failure {
            None => Ok(Ok(())),
            Some(err) if route.is_default => {
                self.skip_default(option, &err);
                if applied > 0 {
                    Ok(Ok(()))
                } else {
                    Err(NotHandled)
                }
            }
            Some(err) => {
                self.warn_once(option, &err);
                Ok(Ok(()))
            }
        }
    }

    fn set_by_primary(&self, option: &str, value: &Value) -> Tier<()> {
        let primary = self.primary().ok_or(NotHandled)?;
        tracing::trace!(target: TARGET, composite = %self.base.path(), option, "configure via primary component");
        Ok(primary.configure(option, value.clone()))
    }

    // ------------------------------------------------------------------------
    // Read tiers
    // ------------------------------------------------------------------------

    fn get_by_method(&self, option: &str) -> Tier<Value> {
        let handler = self.handler(option).ok_or(NotHandled)?;
        Ok(match handler.get() {
            Some(result) => result,
            None => Ok(self.shadow_value(option).unwrap_or_default()),
        })
    }

    fn get_by_delegation(&self, option: &str) -> Tier<Value> {
        let route = self.route(option).ok_or(NotHandled)?;
        let entry = route.entries.last().ok_or(NotHandled)?;
        let child = entry.reader().ok_or(NotHandled)?;

        match child.cget(Self::target(entry, option)) {
            Ok(value) => Ok(Ok(value)),
            Err(err) => {
                if route.is_default {
                    self.skip_default(option, &err);
                } else {
                    self.warn_once(option, &err);
                }
                Err(NotHandled)
            }
        }
    }

    fn info_by_method(&self, option: &str) -> Tier<OptionInfo> {
        let handler = self.handler(option).ok_or(NotHandled)?;
        Ok(match handler.info(option) {
            Some(result) => result,
            None => self
                .cget(option)
                .map(|current| OptionInfo::new(option, option).with_current(current)),
        })
    }

    fn info_by_delegation(&self, option: &str) -> Tier<OptionInfo> {
        let route = self.route(option).ok_or(NotHandled)?;
        let entry = route.entries.last().ok_or(NotHandled)?;
        let child = entry.reader().ok_or(NotHandled)?;

        match child.configinfo(Self::target(entry, option)) {
            Ok(info) if route.is_default => Ok(Ok(info)),
            Ok(info) => Ok(Ok(info.renamed(option))),
            Err(err) => {
                if route.is_default {
                    self.skip_default(option, &err);
                } else {
                    self.warn_once(option, &err);
                }
                Err(NotHandled)
            }
        }
    }
}

impl Configurable for Composite {
    fn path(&self) -> &str {
        self.base.path()
    }

    fn configure(&self, option: &str, value: Value) -> Result<()> {
        let option = bare(option);
        self.set_by_method(option, &value)
            .or_else(|NotHandled| self.set_by_delegation(option, &value))
            .or_else(|NotHandled| self.set_by_primary(option, &value))
            .unwrap_or_else(|NotHandled| self.base.configure(option, value.clone()))
    }

    fn cget(&self, option: &str) -> Result<Value> {
        let option = bare(option);
        self.get_by_method(option)
            .or_else(|NotHandled| self.get_by_delegation(option))
            .unwrap_or_else(|NotHandled| self.base.cget(option))
    }

    fn configinfo(&self, option: &str) -> Result<OptionInfo> {
        let option = bare(option);
        self.info_by_method(option)
            .or_else(|NotHandled| self.info_by_delegation(option))
            .unwrap_or_else(|NotHandled| self.base.configinfo(option))
    }

    fn configinfo_all(&self) -> Result<Vec<OptionInfo>> {
        let mut merged: IndexMap<String, OptionInfo> = self
            .base
            .configinfo_all()?
            .into_iter()
            .map(|info| (info.name.clone(), info))
            .collect();

        let (delegations, methods) = {
            let state = self.state.read();
            (state.delegations.clone(), state.methods.clone())
        };

        if let Some(child) = delegations
            .get(DEFAULT_OPTION)
            .and_then(|entries| entries.last())
            .and_then(DelegationEntry::reader)
        {
            match child.configinfo_all() {
                Ok(infos) => {
                    for info in infos {
                        merged.insert(info.name.clone(), info);
                    }
                }
                Err(err) => self.skip_default(DEFAULT_OPTION, &err),
            }
        }

        for (alias, entries) in &delegations {
            if alias == DEFAULT_OPTION {
                continue;
            }
            let Some(entry) = entries.last() else { continue };
            let Some(child) = entry.reader() else { continue };
            match child.configinfo(&entry.option) {
                Ok(info) => {
                    merged.insert(alias.clone(), info.renamed(alias.as_str()));
                }
                Err(err) => self.warn_once(alias, &err),
            }
        }

        for (name, handler) in &methods {
            let info = match handler.info(name) {
                Some(result) => result?,
                None => OptionInfo::new(name.as_str(), name.as_str()).with_current(self.cget(name)?),
            };
            merged.insert(name.clone(), info);
        }

        Ok(merged.into_values().collect())
    }
}

impl fmt::Debug for Composite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Composite")
            .field("path", &self.base.path())
            .field("primary", &state.primary.as_ref().map(|p| p.path().to_string()))
            .field("delegations", &state.delegations)
            .field("option_methods", &state.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

static_assertions::assert_impl_all!(Composite: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{Bridge, BridgeConfig};
    use crate::descriptor::OptionTable;
    use crate::headless::{HeadlessSurface, OptionSpec};
    use crate::native::NativeVersion;

    struct Fixture {
        surface: Arc<HeadlessSurface>,
        bridge: Bridge,
        composite: Composite,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_config(BridgeConfig::new())
        }

        fn with_config(config: BridgeConfig) -> Self {
            let surface = Arc::new(
                HeadlessSurface::new(NativeVersion::new(9, 0))
                    .with_class(
                        "frame",
                        [
                            OptionSpec::new("background", "background", "Background", "gray"),
                            OptionSpec::new("relief", "relief", "Relief", "flat"),
                        ],
                    )
                    .with_class(
                        "label",
                        [
                            OptionSpec::new("text", "text", "Text", ""),
                            OptionSpec::new("foreground", "foreground", "Foreground", "black"),
                            OptionSpec::new("background", "background", "Background", "white"),
                        ],
                    )
                    .with_class(
                        "entry",
                        [
                            OptionSpec::new("foreground", "foreground", "Foreground", "black"),
                            OptionSpec::new("width", "width", "Width", "20"),
                        ],
                    ),
            );
            let bridge = Bridge::builder(surface.clone())
                .callbacks(surface.clone())
                .config(config)
                .build();
            let frame = Widget::create(&bridge, "frame", ".c", table(), &[]).unwrap();
            Self {
                surface,
                composite: Composite::new(frame),
                bridge,
            }
        }

        fn child(&self, class: &str, path: &str) -> ConfigurableRef {
            Widget::create(&self.bridge, class, path, table(), &[]).unwrap()
        }
    }

    fn table() -> Arc<OptionTable> {
        Arc::new(OptionTable::new("Test"))
    }

    #[test]
    fn test_single_child_round_trip() {
        let fx = Fixture::new();
        let label = fx.child("label", ".c.l");
        fx.composite.delegate_alias("caption", "text", [label]).unwrap();

        fx.composite.configure("caption", Value::from("Hello")).unwrap();
        assert_eq!(fx.composite.cget("caption").unwrap(), Value::from("Hello"));
        assert_eq!(fx.surface.count_calls(".c.l", "configure"), 1);
        assert_eq!(fx.surface.count_calls(".c.l", "cget"), 1);
    }

    #[test]
    fn test_fan_out_write_narrow_read() {
        let fx = Fixture::new();
        let a = fx.child("label", ".c.a");
        let b = fx.child("label", ".c.b");
        fx.composite.delegate("foreground", [a.clone(), b.clone()]).unwrap();

        fx.composite.configure("foreground", Value::from("red")).unwrap();
        assert_eq!(fx.surface.value_of(".c.a", "foreground").as_deref(), Some("red"));
        assert_eq!(fx.surface.value_of(".c.b", "foreground").as_deref(), Some("red"));

        b.configure("foreground", Value::from("blue")).unwrap();
        fx.surface.clear_calls();
        assert_eq!(fx.composite.cget("foreground").unwrap(), Value::from("blue"));
        assert_eq!(fx.surface.count_calls(".c.a", "cget"), 0);
        assert_eq!(fx.surface.count_calls(".c.b", "cget"), 1);
    }

    #[test]
    fn test_repeated_delegation_appends_children() {
        let fx = Fixture::new();
        let a = fx.child("label", ".c.a");
        let b = fx.child("entry", ".c.b");
        fx.composite.delegate("foreground", [a]).unwrap();
        fx.composite.delegate("foreground", [b]).unwrap();

        let table = fx.composite.delegations();
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].1.len(), 1);
        assert_eq!(table[0].1[0].child_paths(), vec![".c.a", ".c.b"]);
    }

    #[test]
    fn test_option_method_wins_over_delegation() {
        let fx = Fixture::new();
        let label = fx.child("label", ".c.l");
        fx.composite.delegate("text", [label]).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        fx.composite.option_methods([(
            "text",
            OptionMethods::setter_only(move |v| {
                sink.lock().push(v);
                Ok(())
            }),
        )]);

        fx.composite.configure("text", Value::from("x")).unwrap();
        assert_eq!(*seen.lock(), vec![Value::from("x")]);
        assert_eq!(fx.surface.count_calls(".c.l", "configure"), 0);
        // No getter: the shadow value answers.
        assert_eq!(fx.composite.cget("text").unwrap(), Value::from("x"));
        assert_eq!(fx.surface.count_calls(".c.l", "cget"), 0);
    }

    #[test]
    fn test_accessor_serves_both_directions() {
        let fx = Fixture::new();
        let store = Arc::new(Mutex::new(Value::Int(1)));
        let cell = store.clone();
        fx.composite.option_methods([(
            "-level",
            OptionMethods::accessor(move |value| {
                let mut cell = cell.lock();
                match value {
                    Some(v) => {
                        *cell = v;
                        Ok(Value::Nil)
                    }
                    None => Ok(cell.clone()),
                }
            }),
        )]);

        assert_eq!(fx.composite.cget("level").unwrap(), Value::Int(1));
        // Explicit nil is a set, not a query.
        fx.composite.configure("level", Value::Nil).unwrap();
        assert_eq!(*store.lock(), Value::Nil);
        assert_eq!(fx.composite.access("level", Some(Value::Int(5))).unwrap(), Value::Nil);
        assert_eq!(fx.composite.access("level", None).unwrap(), Value::Int(5));
    }

    #[test]
    fn test_default_alias_guard_leaves_table_untouched() {
        let fx = Fixture::new();
        let label = fx.child("label", ".c.l");

        for (alias, real) in [("DEFAULT", "text"), ("text", "DEFAULT")] {
            let err = fx.composite.delegate_alias(alias, real, [label.clone()]).unwrap_err();
            assert!(matches!(err, BridgeError::InvalidArgument(_)));
        }
        let err = fx.composite.delegate("text", Vec::new()).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidArgument(_)));
        assert!(fx.composite.delegations().is_empty());

        fx.composite.delegate("DEFAULT", [label]).unwrap();
        assert!(fx.composite.is_delegated("DEFAULT"));
    }

    #[test]
    fn test_default_catches_unrouted_options() {
        let fx = Fixture::new();
        let label = fx.child("label", ".c.l");
        fx.composite.delegate("DEFAULT", [label]).unwrap();

        fx.composite.configure("text", Value::from("via default")).unwrap();
        assert_eq!(fx.surface.value_of(".c.l", "text").as_deref(), Some("via default"));
        assert_eq!(fx.composite.cget("text").unwrap(), Value::from("via default"));
    }

    #[test]
    fn test_default_failure_falls_through_silently() {
        let fx = Fixture::new();
        let label = fx.child("label", ".c.l");
        fx.composite.delegate("DEFAULT", [label]).unwrap();

        // The label has no relief option; the frame does.
        fx.composite.configure("relief", Value::from("sunken")).unwrap();
        assert_eq!(fx.surface.value_of(".c", "relief").as_deref(), Some("sunken"));
        assert_eq!(fx.composite.cget("relief").unwrap(), Value::from("sunken"));
    }

    #[test]
    fn test_explicit_failure_is_swallowed_and_warned_once() {
        let fx = Fixture::new();
        let label = fx.child("label", ".c.l");
        fx.composite.delegate("text", [label]).unwrap();
        fx.surface.fail_option(".c.l", "text", "boom");

        assert!(fx.composite.configure("text", Value::from("a")).is_ok());
        assert!(fx.composite.configure("text", Value::from("b")).is_ok());
        assert_eq!(fx.composite.warned.lock().len(), 1);
        // The failing read falls back to the base container, which rejects it.
        assert!(fx.composite.cget("text").unwrap_err().is_native());
    }

    #[test]
    fn test_failing_child_does_not_stop_fan_out() {
        let fx = Fixture::new();
        let first = fx.child("label", ".c.a");
        let second = fx.child("label", ".c.b");
        fx.composite.delegate("foreground", [first, second]).unwrap();
        fx.surface.fail_option(".c.a", "foreground", "locked");

        fx.composite.configure("foreground", Value::from("red")).unwrap();
        assert_eq!(fx.surface.value_of(".c.b", "foreground").as_deref(), Some("red"));
        assert_eq!(fx.surface.value_of(".c.a", "foreground").as_deref(), Some("black"));
        assert_eq!(fx.composite.warned.lock().len(), 1);
    }

    #[test]
    fn test_default_partial_failure_counts_as_handled() {
        let fx = Fixture::new();
        let label = fx.child("label", ".c.l");
        let entry = fx.child("entry", ".c.e");
        fx.composite.delegate("DEFAULT", [label, entry]).unwrap();

        // Only the entry knows `width`; the frame never sees it.
        fx.composite.configure("width", Value::Int(8)).unwrap();
        assert_eq!(fx.surface.value_of(".c.e", "width").as_deref(), Some("8"));
        assert_eq!(fx.surface.count_calls(".c", "configure"), 0);
        assert!(fx.composite.warned.lock().is_empty());
    }

    #[test]
    fn test_registered_composite_owns_its_path() {
        let fx = Fixture::new();
        let before = fx.bridge.identities().lookup(".c").unwrap();
        assert!(before.downcast_ref::<Widget>().is_some());

        let composite = Composite::registered(fx.composite.base().clone());
        let found = fx.bridge.identities().resolve(".c");
        match found {
            Value::Widget(w) => {
                assert!(std::ptr::eq(w.downcast_ref::<Composite>().unwrap(), &*composite));
            }
            other => panic!("expected a widget, got {other:?}"),
        }
        assert_eq!(fx.bridge.identities().parent_of(".c").as_deref(), Some("."));
    }

    #[test]
    fn test_warnings_can_be_disabled() {
        let fx = Fixture::with_config(BridgeConfig::new().with_delegate_warnings(false));
        let label = fx.child("label", ".c.l");
        fx.composite.delegate("text", [label]).unwrap();
        fx.surface.fail_option(".c.l", "text", "boom");

        fx.composite.configure("text", Value::from("a")).unwrap();
        assert!(fx.composite.warned.lock().is_empty());
    }

    #[test]
    fn test_primary_component_receives_unrouted_writes() {
        let fx = Fixture::new();
        let entry = fx.child("entry", ".c.e");
        fx.composite.set_primary(entry);

        fx.composite.configure("width", Value::Int(5)).unwrap();
        assert_eq!(fx.surface.value_of(".c.e", "width").as_deref(), Some("5"));

        // Errors from the primary component propagate.
        assert!(fx.composite.configure("relief", Value::from("raised")).is_err());
    }

    #[test]
    fn test_unrouted_options_reach_base() {
        let fx = Fixture::new();
        fx.composite.configure("-background", Value::from("blue")).unwrap();
        assert_eq!(fx.surface.value_of(".c", "background").as_deref(), Some("blue"));
        assert_eq!(fx.composite.path(), ".c");
    }

    #[test]
    fn test_configinfo_tiers() {
        let fx = Fixture::new();
        let label = fx.child("label", ".c.l");
        fx.composite.delegate_alias("caption", "text", [label]).unwrap();
        fx.composite.configure("caption", Value::from("hi")).unwrap();

        let info = fx.composite.configinfo("caption").unwrap();
        assert_eq!(info.name, "caption");
        assert_eq!(info.wire_name, "text");
        assert_eq!(info.current, Value::from("hi"));

        let base = fx.composite.configinfo("relief").unwrap();
        assert_eq!(base.current, Value::from("flat"));
    }

    #[test]
    fn test_configinfo_all_merges_by_name() {
        let fx = Fixture::new();
        let label = fx.child("label", ".c.l");
        let entry = fx.child("entry", ".c.e");
        fx.composite.delegate("DEFAULT", [label.clone()]).unwrap();
        fx.composite.delegate("foreground", [entry]).unwrap();
        fx.composite.option_methods([(
            "text",
            OptionMethods::setter_only(|_| Ok(())).with_info(|name| {
                Ok(OptionInfo::new(name, name).with_current("custom"))
            }),
        )]);
        fx.composite.option_methods([("mode", OptionMethods::setter_only(|_| Ok(())))]);
        fx.composite.configure("mode", Value::from("fast")).unwrap();

        let all = fx.composite.configinfo_all().unwrap();
        let by_name = |n: &str| all.iter().filter(|i| i.name == n).collect::<Vec<_>>();

        // One record per name.
        assert_eq!(by_name("background").len(), 1);
        // DEFAULT child overrides the base container.
        assert_eq!(by_name("background")[0].current, Value::from("white"));
        // Base-only options survive.
        assert_eq!(by_name("relief")[0].current, Value::from("flat"));
        // Explicit delegation overrides DEFAULT.
        assert_eq!(by_name("foreground")[0].default, Value::from("black"));
        assert_eq!(by_name("foreground").len(), 1);
        // Option methods override everything.
        assert_eq!(by_name("text")[0].current, Value::from("custom"));
        assert_eq!(by_name("mode")[0].current, Value::from("fast"));
    }
}
