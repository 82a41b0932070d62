//! The bridge service object.
//!
//! A [`Bridge`] bundles everything the configuration engine needs: the
//! native surfaces, the codec registry, the identity registry, the id
//! generator, and conversion settings. It is injected into every widget and
//! composite instead of living in global state, so tests can run isolated
//! bridges side by side.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_bridge_core::{Bridge, BridgeConfig, HeadlessSurface, NativeVersion};
//!
//! let surface = Arc::new(HeadlessSurface::new(NativeVersion::new(9, 0)));
//! let bridge = Bridge::builder(surface.clone())
//!     .callbacks(surface)
//!     .config(BridgeConfig::new().with_delegate_warnings(false))
//!     .build();
//!
//! assert_eq!(bridge.version(), NativeVersion::new(9, 0));
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::codec::{global_codecs, CodecContext, CodecRegistry};
use crate::error::Result;
use crate::headless::HeadlessSurface;
use crate::identity::IdentityRegistry;
use crate::ids::IdGenerator;
use crate::logging::targets;
use crate::native::{CallbackSurface, NativeSurface, NativeVersion};

/// Native major version from which an empty string means "unset".
pub const DEFAULT_EMPTY_UNSET_MIN_MAJOR: u32 = 9;

/// Sentinel used for "unset" numeric options on older native layers.
pub const DEFAULT_LEGACY_UNSET_SENTINEL: &str = "-1";

/// Conversion and diagnostics settings for a bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// First native major version that accepts `""` for unset numbers.
    pub empty_unset_min_major: u32,
    /// What to send for unset numbers on older native layers.
    pub legacy_unset_sentinel: Cow<'static, str>,
    /// Whether failing explicit delegations log a warning.
    pub warn_on_delegate_failure: bool,
}

impl BridgeConfig {
    /// The default settings.
    pub const fn new() -> Self {
        Self {
            empty_unset_min_major: DEFAULT_EMPTY_UNSET_MIN_MAJOR,
            legacy_unset_sentinel: Cow::Borrowed(DEFAULT_LEGACY_UNSET_SENTINEL),
            warn_on_delegate_failure: true,
        }
    }

    /// Change the version threshold for the empty unset sentinel.
    pub fn with_empty_unset_min_major(mut self, major: u32) -> Self {
        self.empty_unset_min_major = major;
        self
    }

    /// Change the legacy unset sentinel.
    pub fn with_legacy_unset_sentinel(mut self, sentinel: impl Into<Cow<'static, str>>) -> Self {
        self.legacy_unset_sentinel = sentinel.into();
        self
    }

    /// Enable or disable delegation failure warnings.
    pub fn with_delegate_warnings(mut self, enabled: bool) -> Self {
        self.warn_on_delegate_failure = enabled;
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new()
    }
}

struct BridgeInner {
    native: Arc<dyn NativeSurface>,
    callbacks: Option<Arc<dyn CallbackSurface>>,
    codecs: Arc<CodecRegistry>,
    identities: Arc<IdentityRegistry>,
    ids: Arc<IdGenerator>,
    config: BridgeConfig,
}

/// Shared handle to the services behind the configuration engine.
///
/// Cloning is cheap; all clones share the same registries.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

impl Bridge {
    /// Create a bridge over `native` with default services.
    ///
    /// Uses the process-wide codec registry and a fresh identity registry.
    pub fn new(native: Arc<dyn NativeSurface>) -> Self {
        Self::builder(native).build()
    }

    /// Create a bridge over a headless surface used for both invocation and
    /// callbacks.
    pub fn headless(surface: Arc<HeadlessSurface>) -> Self {
        Self::builder(surface.clone()).callbacks(surface).build()
    }

    /// Start building a bridge over `native`.
    pub fn builder(native: Arc<dyn NativeSurface>) -> BridgeBuilder {
        BridgeBuilder::new(native)
    }

    /// The native invocation surface.
    pub fn native(&self) -> &Arc<dyn NativeSurface> {
        &self.inner.native
    }

    /// The callback surface, if one is attached.
    pub fn callbacks(&self) -> Option<&Arc<dyn CallbackSurface>> {
        self.inner.callbacks.as_ref()
    }

    /// The codec registry.
    pub fn codecs(&self) -> &Arc<CodecRegistry> {
        &self.inner.codecs
    }

    /// The identity registry.
    pub fn identities(&self) -> &Arc<IdentityRegistry> {
        &self.inner.identities
    }

    /// The id generator.
    pub fn ids(&self) -> &Arc<IdGenerator> {
        &self.inner.ids
    }

    /// Conversion settings.
    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// The version reported by the native layer.
    pub fn version(&self) -> NativeVersion {
        self.inner.native.version()
    }

    /// Invoke a native command.
    ///
    /// Errors from the native layer are returned unchanged.
    pub fn invoke(&self, command: &str, args: &[String]) -> Result<String> {
        tracing::trace!(target: targets::NATIVE, command, ?args, "invoke");
        let result = self.inner.native.invoke(command, args);
        if let Err(err) = &result {
            tracing::debug!(target: targets::NATIVE, command, %err, "native invocation failed");
        }
        result
    }

    /// Build a codec context for converting options owned by `owner`.
    pub fn codec_context<'a>(&'a self, owner: Option<&'a str>) -> CodecContext<'a> {
        let mut cx = CodecContext::new(self.version())
            .with_identities(&self.inner.identities)
            .with_config(&self.inner.config);
        if let Some(callbacks) = &self.inner.callbacks {
            cx = cx.with_callbacks(callbacks.as_ref());
        }
        if let Some(owner) = owner {
            cx = cx.with_owner(owner);
        }
        cx
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("version", &self.version())
            .field("widgets", &self.inner.identities.len())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Bridge`].
pub struct BridgeBuilder {
    native: Arc<dyn NativeSurface>,
    callbacks: Option<Arc<dyn CallbackSurface>>,
    codecs: Option<Arc<CodecRegistry>>,
    identities: Option<Arc<IdentityRegistry>>,
    ids: Option<Arc<IdGenerator>>,
    config: BridgeConfig,
}

impl BridgeBuilder {
    /// Create a builder over `native`.
    pub fn new(native: Arc<dyn NativeSurface>) -> Self {
        Self {
            native,
            callbacks: None,
            codecs: None,
            identities: None,
            ids: None,
            config: BridgeConfig::default(),
        }
    }

    /// Attach a callback surface.
    pub fn callbacks(mut self, callbacks: Arc<dyn CallbackSurface>) -> Self {
        self.callbacks = Some(callbacks);
        self
    }

    /// Use a specific codec registry instead of the process-wide one.
    pub fn codecs(mut self, codecs: Arc<CodecRegistry>) -> Self {
        self.codecs = Some(codecs);
        self
    }

    /// Share an identity registry with other bridges.
    pub fn identities(mut self, identities: Arc<IdentityRegistry>) -> Self {
        self.identities = Some(identities);
        self
    }

    /// Share an id generator with other bridges.
    pub fn ids(mut self, ids: Arc<IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Set conversion settings.
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the bridge.
    pub fn build(self) -> Bridge {
        crate::bridge_debug!(
            version = %self.native.version(),
            callbacks = self.callbacks.is_some(),
            "bridge ready"
        );
        Bridge {
            inner: Arc::new(BridgeInner {
                native: self.native,
                callbacks: self.callbacks,
                codecs: self.codecs.unwrap_or_else(global_codecs),
                identities: self.identities.unwrap_or_default(),
                ids: self.ids.unwrap_or_default(),
                config: self.config,
            }),
        }
    }
}

static_assertions::assert_impl_all!(Bridge: Send, Sync);
