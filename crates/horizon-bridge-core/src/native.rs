//! Boundary to the native toolkit.
//!
//! The bridge never renders, lays out, or dispatches events itself. It talks
//! to the toolkit through two narrow surfaces:
//!
//! - [`NativeSurface`] runs a command (usually a widget path) with string
//!   arguments and returns a wire string.
//! - [`CallbackSurface`] turns a [`Callback`] into an opaque token that can be
//!   embedded in a wire value and re-entered later.
//!
//! Both are synchronous and assumed fast. Errors raised by the toolkit are
//! returned as [`BridgeError::Native`](crate::BridgeError::Native) and are
//! never retried here.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{BridgeError, Result};
use crate::value::{Callback, WireRepresentable};

/// The reported version of the native layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
}

impl NativeVersion {
    /// Create a version.
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl Default for NativeVersion {
    fn default() -> Self {
        Self::new(8, 6)
    }
}

impl PartialOrd for NativeVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NativeVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
    }
}

impl fmt::Display for NativeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl WireRepresentable for NativeVersion {
    fn render(&self) -> String {
        self.to_string()
    }
}

/// Parses `"8.6"`, `"9.0"`, `"9"` and patch-level strings such as `"8.6.13"`.
impl FromStr for NativeVersion {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.trim().split('.');
        let parse = |part: Option<&str>| -> Result<u32> {
            match part {
                None => Ok(0),
                Some(p) => p
                    .parse::<u32>()
                    .map_err(|e| BridgeError::conversion("version", s, e.to_string())),
            }
        };
        let major = match parts.next() {
            Some(p) if !p.is_empty() => parse(Some(p))?,
            _ => return Err(BridgeError::conversion("version", s, "empty version")),
        };
        let minor = parse(parts.next())?;
        Ok(Self::new(major, minor))
    }
}

/// Command invocation surface of the native toolkit.
pub trait NativeSurface: Send + Sync {
    /// Run `command` with `args` and return the wire result.
    fn invoke(&self, command: &str, args: &[String]) -> Result<String>;

    /// The version of the running native layer.
    fn version(&self) -> NativeVersion;
}

/// Callback registration surface of the native toolkit.
pub trait CallbackSurface: Send + Sync {
    /// Register a callable and return the token that names it on the wire.
    fn register_callback(&self, callback: Callback) -> String;

    /// Re-enter the callable registered under `token`.
    fn invoke_callback(&self, token: &str, args: &[String]) -> Result<String>;
}

static_assertions::assert_obj_safe!(NativeSurface, CallbackSurface);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parse() {
        assert_eq!("8.6".parse::<NativeVersion>().unwrap(), NativeVersion::new(8, 6));
        assert_eq!("9".parse::<NativeVersion>().unwrap(), NativeVersion::new(9, 0));
        assert_eq!(
            "8.6.13".parse::<NativeVersion>().unwrap(),
            NativeVersion::new(8, 6)
        );
        assert!("".parse::<NativeVersion>().is_err());
        assert!("x.1".parse::<NativeVersion>().is_err());
    }

    #[test]
    fn test_version_ordering() {
        assert!(NativeVersion::new(8, 6) < NativeVersion::new(9, 0));
        assert!(NativeVersion::new(9, 1) > NativeVersion::new(9, 0));
        assert_eq!(NativeVersion::new(9, 0).render(), "9.0");
    }
}
