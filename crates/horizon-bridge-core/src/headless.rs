//! An in-memory native surface.
//!
//! [`HeadlessSurface`] implements both [`NativeSurface`] and
//! [`CallbackSurface`] without a real toolkit behind them. It understands the
//! small command vocabulary the configuration engine produces:
//!
//! - `<class> <path> ?-option value ...?` creates a widget
//! - `<path> configure` lists every option
//! - `<path> configure -option` describes one option
//! - `<path> configure -option value ?-option value ...?` sets options
//! - `<path> cget -option` reads an option
//! - `destroy <path> ...` removes widgets and their descendants
//!
//! Option specs are declared per class. Options a class does not declare are
//! rejected with `unknown option "-x"`, which is what a real toolkit reports.
//! Every invocation is recorded so tests can assert on the exact native
//! traffic, and failures can be injected per `(path, option)`.
//!
//! # Example
//!
//! ```
//! use horizon_bridge_core::{HeadlessSurface, NativeSurface, NativeVersion, OptionSpec};
//!
//! let surface = HeadlessSurface::new(NativeVersion::new(9, 0))
//!     .with_class("label", [OptionSpec::new("text", "text", "Text", "")]);
//!
//! surface.invoke("label", &[".l".into(), "-text".into(), "Hi".into()]).unwrap();
//! assert_eq!(surface.invoke(".l", &["cget".into(), "-text".into()]).unwrap(), "Hi");
//! assert_eq!(surface.calls().len(), 2);
//! ```

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::error::{BridgeError, Result};
use crate::native::{CallbackSurface, NativeSurface, NativeVersion};
use crate::value::Callback;
use crate::wire::join_list;

/// Prefix of the tokens handed out for registered callbacks.
pub const CALLBACK_TOKEN_PREFIX: &str = "cb";

// ============================================================================
// Option specs
// ============================================================================

/// How a headless widget class declares one of its options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionSpec {
    /// A real option.
    Option {
        /// Name on the wire, without the leading `-`.
        wire_name: String,
        /// Option database name.
        db_name: String,
        /// Option database class.
        db_class: String,
        /// Value a fresh widget starts with.
        default: String,
    },
    /// A short name standing in for another option (`-bg` for `-background`).
    Synonym {
        /// The synonym, without the leading `-`.
        wire_name: String,
        /// The option it stands for, without the leading `-`.
        target: String,
    },
}

impl OptionSpec {
    /// Declare a real option.
    pub fn new(
        wire_name: impl Into<String>,
        db_name: impl Into<String>,
        db_class: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        Self::Option {
            wire_name: wire_name.into(),
            db_name: db_name.into(),
            db_class: db_class.into(),
            default: default.into(),
        }
    }

    /// Declare a synonym.
    pub fn synonym(wire_name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::Synonym {
            wire_name: wire_name.into(),
            target: target.into(),
        }
    }

    /// The declared wire name.
    pub fn wire_name(&self) -> &str {
        match self {
            Self::Option { wire_name, .. } | Self::Synonym { wire_name, .. } => wire_name,
        }
    }
}

// ============================================================================
// Call log
// ============================================================================

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// The command name (a class command, a widget path, or `destroy`).
    pub command: String,
    /// The arguments exactly as received.
    pub args: Vec<String>,
}

impl Call {
    /// The first argument, which is the subcommand for widget commands.
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            f.write_str(&self.command)
        } else {
            write!(f, "{} {}", self.command, join_list(&self.args))
        }
    }
}

// ============================================================================
// Surface
// ============================================================================

#[derive(Debug)]
struct HeadlessWidget {
    class: String,
    values: HashMap<String, String>,
}

#[derive(Default)]
struct HeadlessState {
    classes: HashMap<String, Vec<OptionSpec>>,
    widgets: IndexMap<String, HeadlessWidget>,
    calls: Vec<Call>,
    failures: HashMap<(String, String), String>,
    callbacks: HashMap<String, Callback>,
    next_callback: u64,
}

/// A native surface that keeps all widget state in memory.
pub struct HeadlessSurface {
    version: Mutex<NativeVersion>,
    state: Mutex<HeadlessState>,
}

impl HeadlessSurface {
    /// Create a surface reporting `version` with no classes declared.
    pub fn new(version: NativeVersion) -> Self {
        Self {
            version: Mutex::new(version),
            state: Mutex::new(HeadlessState::default()),
        }
    }

    /// Declare a widget class and return the surface.
    pub fn with_class<I>(self, command: &str, specs: I) -> Self
    where
        I: IntoIterator<Item = OptionSpec>,
    {
        self.define_class(command, specs);
        self
    }

    /// Declare (or redeclare) a widget class creation command.
    pub fn define_class<I>(&self, command: &str, specs: I)
    where
        I: IntoIterator<Item = OptionSpec>,
    {
        self.state
            .lock()
            .classes
            .insert(command.to_string(), specs.into_iter().collect());
    }

    /// Change the reported native version.
    pub fn set_version(&self, version: NativeVersion) {
        *self.version.lock() = version;
    }

    /// Make every `configure` or `cget` of `option` on `path` fail with `message`.
    pub fn fail_option(&self, path: &str, option: &str, message: impl Into<String>) {
        self.state
            .lock()
            .failures
            .insert((path.to_string(), bare(option).to_string()), message.into());
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    /// Every invocation so far, oldest first.
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// Invocations whose command is `command`.
    pub fn calls_to(&self, command: &str) -> Vec<Call> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.command == command)
            .cloned()
            .collect()
    }

    /// Number of `<path> <subcommand> ...` invocations.
    pub fn count_calls(&self, path: &str, subcommand: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.command == path && c.subcommand() == Some(subcommand))
            .count()
    }

    /// Forget the call log.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Whether a widget exists at `path`.
    pub fn exists(&self, path: &str) -> bool {
        self.state.lock().widgets.contains_key(path)
    }

    /// The class command a widget was created with.
    pub fn class_of(&self, path: &str) -> Option<String> {
        self.state.lock().widgets.get(path).map(|w| w.class.clone())
    }

    /// The stored value of an option, bypassing the call log.
    pub fn value_of(&self, path: &str, option: &str) -> Option<String> {
        let state = self.state.lock();
        let widget = state.widgets.get(path)?;
        let specs = state.classes.get(&widget.class)?;
        let wire = canonical(specs, bare(option))?;
        widget.values.get(wire).cloned()
    }

    /// Paths of all live widgets in creation order.
    pub fn widgets(&self) -> Vec<String> {
        self.state.lock().widgets.keys().cloned().collect()
    }

    /// Number of registered callbacks.
    pub fn callback_count(&self) -> usize {
        self.state.lock().callbacks.len()
    }
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new(NativeVersion::default())
    }
}

impl fmt::Debug for HeadlessSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("HeadlessSurface")
            .field("version", &*self.version.lock())
            .field("classes", &state.classes.keys().collect::<Vec<_>>())
            .field("widgets", &state.widgets.keys().collect::<Vec<_>>())
            .field("calls", &state.calls.len())
            .finish()
    }
}

fn bare(option: &str) -> &str {
    option.strip_prefix('-').unwrap_or(option)
}

/// Resolve `option` (synonyms included) to the wire name of a real option.
fn canonical<'a>(specs: &'a [OptionSpec], option: &str) -> Option<&'a str> {
    match specs.iter().find(|s| s.wire_name() == option)? {
        OptionSpec::Option { wire_name, .. } => Some(wire_name.as_str()),
        OptionSpec::Synonym { target, .. } => specs.iter().find_map(|s| match s {
            OptionSpec::Option { wire_name, .. } if wire_name == target => Some(wire_name.as_str()),
            _ => None,
        }),
    }
}

fn unknown_option(command: &str, option: &str) -> BridgeError {
    BridgeError::native(command, format!("unknown option \"-{}\"", bare(option)))
}

impl HeadlessState {
    fn create(&mut self, class: &str, args: &[String]) -> Result<String> {
        let Some(path) = args.first() else {
            return Err(BridgeError::native(
                class,
                format!("wrong # args: should be \"{class} pathName ?-option value ...?\""),
            ));
        };
        if !path.starts_with('.') {
            return Err(BridgeError::native(class, format!("bad window path name \"{path}\"")));
        }
        if self.widgets.contains_key(path) {
            return Err(BridgeError::native(
                class,
                format!("window name \"{}\" already exists in parent", path.rsplit('.').next().unwrap_or(path)),
            ));
        }
        let specs = self.classes.get(class).cloned().unwrap_or_default();
        let values = specs
            .iter()
            .filter_map(|s| match s {
                OptionSpec::Option { wire_name, default, .. } => Some((wire_name.clone(), default.clone())),
                OptionSpec::Synonym { .. } => None,
            })
            .collect();
        self.widgets.insert(
            path.clone(),
            HeadlessWidget {
                class: class.to_string(),
                values,
            },
        );
        if let Err(err) = self.set_pairs(path, &args[1..]) {
            self.widgets.shift_remove(path.as_str());
            return Err(err);
        }
        Ok(path.clone())
    }

    fn destroy(&mut self, paths: &[String]) -> Result<String> {
        for path in paths {
            let prefix = format!("{path}.");
            self.widgets
                .retain(|p, _| p != path && !(path == "." || p.starts_with(&prefix)));
        }
        Ok(String::new())
    }

    fn widget_command(&mut self, path: &str, args: &[String]) -> Result<String> {
        match args.first().map(String::as_str) {
            Some("cget") => match args.get(1) {
                Some(option) if args.len() == 2 => self.cget(path, option),
                _ => Err(BridgeError::native(
                    path,
                    format!("wrong # args: should be \"{path} cget option\""),
                )),
            },
            Some("configure") => match &args[1..] {
                [] => self.configure_all(path),
                [option] => self.configure_one(path, option),
                pairs => self.set_pairs(path, pairs).map(|()| String::new()),
            },
            Some(other) => Err(BridgeError::native(
                path,
                format!("bad option \"{other}\": must be cget or configure"),
            )),
            None => Err(BridgeError::native(
                path,
                format!("wrong # args: should be \"{path} option ?arg ...?\""),
            )),
        }
    }

    fn injected(&self, path: &str, wire: &str) -> Result<()> {
        match self.failures.get(&(path.to_string(), wire.to_string())) {
            Some(message) => Err(BridgeError::native(path, message.clone())),
            None => Ok(()),
        }
    }

    fn specs_of(&self, path: &str) -> &[OptionSpec] {
        self.widgets
            .get(path)
            .and_then(|w| self.classes.get(&w.class))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn cget(&self, path: &str, option: &str) -> Result<String> {
        let wire = canonical(self.specs_of(path), bare(option))
            .ok_or_else(|| unknown_option(path, option))?;
        self.injected(path, wire)?;
        Ok(self
            .widgets
            .get(path)
            .and_then(|w| w.values.get(wire))
            .cloned()
            .unwrap_or_default())
    }

    fn set_pairs(&mut self, path: &str, pairs: &[String]) -> Result<()> {
        for pair in pairs.chunks(2) {
            let option = &pair[0];
            let Some(value) = pair.get(1) else {
                return Err(BridgeError::native(
                    path,
                    format!("value for \"-{}\" missing", bare(option)),
                ));
            };
            let wire = canonical(self.specs_of(path), bare(option))
                .ok_or_else(|| unknown_option(path, option))?
                .to_string();
            self.injected(path, &wire)?;
            if let Some(widget) = self.widgets.get_mut(path) {
                widget.values.insert(wire, value.clone());
            }
        }
        Ok(())
    }

    fn info_of(&self, path: &str, spec: &OptionSpec) -> String {
        match spec {
            OptionSpec::Option {
                wire_name,
                db_name,
                db_class,
                default,
            } => {
                let current = self
                    .widgets
                    .get(path)
                    .and_then(|w| w.values.get(wire_name))
                    .map(String::as_str)
                    .unwrap_or("");
                let flag = format!("-{wire_name}");
                join_list([
                    flag.as_str(),
                    db_name.as_str(),
                    db_class.as_str(),
                    default.as_str(),
                    current,
                ])
            }
            OptionSpec::Synonym { wire_name, target } => {
                join_list([format!("-{wire_name}"), format!("-{target}")])
            }
        }
    }

    fn configure_one(&self, path: &str, option: &str) -> Result<String> {
        let specs = self.specs_of(path);
        let spec = specs
            .iter()
            .find(|s| s.wire_name() == bare(option))
            .ok_or_else(|| unknown_option(path, option))?;
        let spec = match spec {
            OptionSpec::Synonym { target, .. } => specs
                .iter()
                .find(|s| s.wire_name() == target)
                .ok_or_else(|| unknown_option(path, option))?,
            real => real,
        };
        self.injected(path, spec.wire_name())?;
        Ok(self.info_of(path, spec))
    }

    fn configure_all(&self, path: &str) -> Result<String> {
        let entries: Vec<String> = self
            .specs_of(path)
            .iter()
            .map(|spec| self.info_of(path, spec))
            .collect();
        Ok(join_list(entries))
    }
}

impl NativeSurface for HeadlessSurface {
    fn invoke(&self, command: &str, args: &[String]) -> Result<String> {
        let mut state = self.state.lock();
        state.calls.push(Call {
            command: command.to_string(),
            args: args.to_vec(),
        });

        if command == "destroy" {
            return state.destroy(args);
        }
        if state.classes.contains_key(command) {
            return state.create(command, args);
        }
        if state.widgets.contains_key(command) {
            return state.widget_command(command, args);
        }
        Err(BridgeError::native(
            command,
            format!("invalid command name \"{command}\""),
        ))
    }

    fn version(&self) -> NativeVersion {
        *self.version.lock()
    }
}

impl CallbackSurface for HeadlessSurface {
    fn register_callback(&self, callback: Callback) -> String {
        let mut state = self.state.lock();
        state.next_callback += 1;
        let token = format!("{CALLBACK_TOKEN_PREFIX}{}", state.next_callback);
        state.callbacks.insert(token.clone(), callback);
        token
    }

    fn invoke_callback(&self, token: &str, args: &[String]) -> Result<String> {
        // Release the lock before re-entering user code.
        let callback = self
            .state
            .lock()
            .callbacks
            .get(token)
            .cloned()
            .ok_or_else(|| BridgeError::UnknownCallback(token.to_string()))?;
        callback.call(args)
    }
}

static_assertions::assert_impl_all!(HeadlessSurface: Send, Sync);
