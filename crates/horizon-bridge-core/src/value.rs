//! Language-level values exchanged with the native toolkit.
//!
//! A [`Value`] is what user code reads and writes through the configuration
//! engine. Codecs turn values into wire strings and back; anything that has to
//! appear as a wire argument implements [`WireRepresentable`].
//!
//! # Omitted vs. nil
//!
//! Several operations need to tell "no argument was passed" apart from "the
//! argument is explicitly nil". Throughout this crate the omitted case is
//! `Option::<Value>::None` and the explicit case is `Some(Value::Nil)`.
//!
//! ```
//! use horizon_bridge_core::{Value, WireRepresentable};
//!
//! let items = Value::from(vec![Value::from("a"), Value::from(2)]);
//! assert_eq!(items.render(), "a 2");
//! assert_eq!(Value::from(true).render(), "1");
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;

/// Something that can render itself as a single wire argument.
pub trait WireRepresentable {
    /// Render the value the way the native layer expects to receive it.
    fn render(&self) -> String;
}

impl WireRepresentable for str {
    fn render(&self) -> String {
        self.to_string()
    }
}

impl WireRepresentable for String {
    fn render(&self) -> String {
        self.clone()
    }
}

impl WireRepresentable for bool {
    fn render(&self) -> String {
        String::from(if *self { "1" } else { "0" })
    }
}

impl WireRepresentable for f64 {
    fn render(&self) -> String {
        format!("{self:?}")
    }
}

macro_rules! render_via_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl WireRepresentable for $ty {
                fn render(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

render_via_display!(i32, i64, u32, u64, usize);

impl<T: WireRepresentable + ?Sized> WireRepresentable for &T {
    fn render(&self) -> String {
        (**self).render()
    }
}

/// A shareable callable that the native layer can re-enter.
///
/// The callable receives the string arguments supplied by the native side
/// and returns a string result.
#[derive(Clone)]
pub struct Callback {
    inner: Arc<dyn Fn(&[String]) -> Result<String> + Send + Sync>,
}

impl Callback {
    /// Wrap a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[String]) -> Result<String> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Invoke the callable.
    pub fn call(&self, args: &[String]) -> Result<String> {
        (self.inner)(args)
    }

    /// Whether two callbacks share the same underlying closure.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.inner), Arc::as_ptr(&other.inner))
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Arc::as_ptr(&self.inner))
    }
}

/// A handle to a registered wrapper object.
///
/// Holds the native path together with the wrapper that owns it. Cloning is
/// cheap and preserves identity: [`WidgetRef::ptr_eq`] compares the wrapper
/// allocation, not the path.
#[derive(Clone)]
pub struct WidgetRef {
    path: Arc<str>,
    object: Arc<dyn Any + Send + Sync>,
}

impl WidgetRef {
    /// Create a handle from a typed wrapper.
    pub fn new<T: Any + Send + Sync>(path: impl Into<Arc<str>>, object: Arc<T>) -> Self {
        Self {
            path: path.into(),
            object,
        }
    }

    /// Create a handle from an already type-erased wrapper.
    pub fn from_dyn(path: impl Into<Arc<str>>, object: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            path: path.into(),
            object,
        }
    }

    /// The native path of the widget.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The type-erased wrapper.
    pub fn object(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.object
    }

    /// Borrow the wrapper as a concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.object.downcast_ref::<T>()
    }

    /// Whether both handles point at the same wrapper instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.object), Arc::as_ptr(&other.object))
    }
}

impl fmt::Debug for WidgetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetRef")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl WireRepresentable for WidgetRef {
    fn render(&self) -> String {
        self.path.to_string()
    }
}

/// A value on the language side of the boundary.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// No value ("unset").
    #[default]
    Nil,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    Str(String),
    /// A sequence of values.
    List(Vec<Value>),
    /// A registered wrapper object.
    Widget(WidgetRef),
    /// A callable.
    Callback(Callback),
}

impl Value {
    /// Whether this is [`Value::Nil`].
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// The string payload, if this is a [`Value::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The integer payload, if this is a [`Value::Int`].
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The float payload; integers widen.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// The boolean payload, if this is a [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The elements, if this is a [`Value::List`].
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// The widget handle, if this is a [`Value::Widget`].
    pub fn as_widget(&self) -> Option<&WidgetRef> {
        match self {
            Self::Widget(w) => Some(w),
            _ => None,
        }
    }

    /// The callable, if this is a [`Value::Callback`].
    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            Self::Callback(cb) => Some(cb),
            _ => None,
        }
    }

    /// A short name for the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Widget(_) => "widget",
            Self::Callback(_) => "callback",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Widget(a), Self::Widget(b)) => a.ptr_eq(b),
            (Self::Callback(a), Self::Callback(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// Renders the value as a single wire argument.
///
/// Lists are joined with single spaces without quoting. Callbacks render as
/// an empty string: only a codec with a callback surface can turn them into
/// tokens.
impl WireRepresentable for Value {
    fn render(&self) -> String {
        match self {
            Self::Nil => String::new(),
            Self::Bool(b) => b.render(),
            Self::Int(n) => n.render(),
            Self::Float(n) => n.render(),
            Self::Str(s) => s.clone(),
            Self::List(items) => items
                .iter()
                .map(WireRepresentable::render)
                .collect::<Vec<_>>()
                .join(" "),
            Self::Widget(w) => w.render(),
            Self::Callback(_) => String::new(),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

impl From<WidgetRef> for Value {
    fn from(value: WidgetRef) -> Self {
        Self::Widget(value)
    }
}

impl From<Callback> for Value {
    fn from(value: Callback) -> Self {
        Self::Callback(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Nil, Into::into)
    }
}

static_assertions::assert_impl_all!(Value: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_scalars() {
        assert_eq!(Value::Nil.render(), "");
        assert_eq!(Value::from(false).render(), "0");
        assert_eq!(Value::from(42).render(), "42");
        assert_eq!(Value::from(2.5).render(), "2.5");
        assert_eq!(Value::from("hello").render(), "hello");
    }

    #[test]
    fn test_render_list_joins_with_spaces() {
        let list = Value::from(vec![Value::from("a b"), Value::from(1)]);
        assert_eq!(list.render(), "a b 1");
    }

    #[test]
    fn test_widget_identity_equality() {
        let obj = Arc::new(5u8);
        let a = WidgetRef::new(".a", obj.clone());
        let b = WidgetRef::new(".a", obj);
        let c = WidgetRef::new(".a", Arc::new(5u8));

        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
        assert_eq!(Value::from(a.clone()), Value::from(b));
        assert_ne!(Value::from(a), Value::from(c));
    }

    #[test]
    fn test_widget_downcast() {
        let w = WidgetRef::new(".w", Arc::new(String::from("payload")));
        assert_eq!(w.downcast_ref::<String>().map(String::as_str), Some("payload"));
        assert!(w.downcast_ref::<i32>().is_none());
    }

    #[test]
    fn test_callback_identity() {
        let cb = Callback::new(|args| Ok(args.join(",")));
        let same = cb.clone();
        let other = Callback::new(|_| Ok(String::new()));

        assert!(cb.ptr_eq(&same));
        assert!(!cb.ptr_eq(&other));
        assert_eq!(cb.call(&["x".into(), "y".into()]).unwrap(), "x,y");
    }

    #[test]
    fn test_option_into_value() {
        assert_eq!(Value::from(None::<i64>), Value::Nil);
        assert_eq!(Value::from(Some(3)), Value::Int(3));
    }
}
