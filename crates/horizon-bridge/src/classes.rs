//! Standard widget classes.
//!
//! Each [`WidgetClass`] pairs a native creation command with the option
//! table describing its options. The tables are built from static option
//! definitions so the same data can also declare the class on a
//! [`HeadlessSurface`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_bridge::classes::StandardClasses;
//! use horizon_bridge::prelude::*;
//!
//! let surface = Arc::new(HeadlessSurface::new(NativeVersion::new(9, 0)));
//! let bridge = Bridge::headless(surface.clone());
//! let classes = StandardClasses::new(bridge.codecs());
//! classes.install_headless(&surface);
//!
//! let button = classes.button.create(&bridge, ".", &[("text", Value::from("OK"))]).unwrap();
//! assert_eq!(button.path(), ".button1");
//! assert_eq!(button.cget("text").unwrap(), Value::from("OK"));
//! ```

use std::sync::Arc;

use horizon_bridge_core::{
    Bridge, CodecRegistry, HeadlessSurface, OptionDescriptor, OptionSpec, OptionTable, Result,
    Value, Widget,
};

/// Static definition of one option.
#[derive(Debug, Clone, Copy)]
pub struct OptionDef {
    /// Logical (and wire) name.
    pub name: &'static str,
    /// Codec name.
    pub codec: &'static str,
    /// Option database class.
    pub db_class: &'static str,
    /// Default value on the wire.
    pub default: &'static str,
    /// Short synonyms.
    pub aliases: &'static [&'static str],
    /// Minimum native major version.
    pub min_version: Option<u32>,
}

impl OptionDef {
    const fn new(
        name: &'static str,
        codec: &'static str,
        db_class: &'static str,
        default: &'static str,
    ) -> Self {
        Self {
            name,
            codec,
            db_class,
            default,
            aliases: &[],
            min_version: None,
        }
    }

    const fn aliased(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    const fn since(mut self, major: u32) -> Self {
        self.min_version = Some(major);
        self
    }

    fn descriptor(&self, codecs: &CodecRegistry) -> OptionDescriptor {
        let descriptor = OptionDescriptor::from_codec_name(self.name, codecs, self.codec)
            .with_aliases(self.aliases.iter().copied());
        match self.min_version {
            Some(major) => descriptor.with_min_version(major),
            None => descriptor,
        }
    }
}

const COMMON: &[OptionDef] = &[
    OptionDef::new("background", "color", "Background", "#d9d9d9").aliased(&["bg"]),
    OptionDef::new("borderwidth", "integer", "BorderWidth", "1").aliased(&["bd"]),
    OptionDef::new("cursor", "string", "Cursor", ""),
    OptionDef::new("relief", "string", "Relief", "flat"),
    OptionDef::new("takefocus", "string", "TakeFocus", ""),
    OptionDef::new("highlightthickness", "integer", "HighlightThickness", "0"),
];

const FRAME: &[OptionDef] = &[
    OptionDef::new("width", "integer", "Width", "0"),
    OptionDef::new("height", "integer", "Height", "0"),
    OptionDef::new("padx", "integer", "Pad", "0"),
    OptionDef::new("pady", "integer", "Pad", "0"),
    OptionDef::new("container", "boolean", "Container", "0"),
];

const LABEL: &[OptionDef] = &[
    OptionDef::new("text", "string", "Text", ""),
    OptionDef::new("foreground", "color", "Foreground", "#000000").aliased(&["fg"]),
    OptionDef::new("font", "font", "Font", "TkDefaultFont"),
    OptionDef::new("anchor", "string", "Anchor", "center"),
    OptionDef::new("justify", "string", "Justify", "center"),
    OptionDef::new("width", "integer", "Width", "0"),
    OptionDef::new("wraplength", "integer", "WrapLength", "0"),
    OptionDef::new("underline", "integer", "Underline", "-1"),
    OptionDef::new("image", "string", "Image", ""),
    OptionDef::new("textvariable", "string", "Variable", ""),
];

const BUTTON_EXTRA: &[OptionDef] = &[
    OptionDef::new("command", "callback", "Command", ""),
    OptionDef::new("state", "string", "State", "normal"),
    OptionDef::new("default", "string", "Default", "disabled"),
    OptionDef::new("overrelief", "string", "OverRelief", ""),
    OptionDef::new("repeatdelay", "integer", "RepeatDelay", "0"),
    OptionDef::new("activerelief", "string", "Relief", "raised").since(9),
];

const ENTRY: &[OptionDef] = &[
    OptionDef::new("foreground", "color", "Foreground", "#000000").aliased(&["fg"]),
    OptionDef::new("font", "font", "Font", "TkTextFont"),
    OptionDef::new("width", "integer", "Width", "20"),
    OptionDef::new("justify", "string", "Justify", "left"),
    OptionDef::new("show", "string", "Show", ""),
    OptionDef::new("state", "string", "State", "normal"),
    OptionDef::new("textvariable", "string", "Variable", ""),
    OptionDef::new("exportselection", "boolean", "ExportSelection", "1"),
    OptionDef::new("validate", "string", "Validate", "none"),
    OptionDef::new("validatecommand", "callback", "ValidateCommand", "").aliased(&["vcmd"]),
    OptionDef::new("insertwidth", "integer", "InsertWidth", "2"),
];

/// A native widget class: its creation command and option table.
#[derive(Debug, Clone)]
pub struct WidgetClass {
    command: &'static str,
    table: Arc<OptionTable>,
    defs: Vec<OptionDef>,
}

impl WidgetClass {
    /// Build a class from option definitions.
    ///
    /// Later definitions win over earlier ones with the same name.
    pub fn new(
        command: &'static str,
        class_name: &str,
        codecs: &CodecRegistry,
        groups: &[&[OptionDef]],
    ) -> Self {
        let mut defs: Vec<OptionDef> = Vec::new();
        for def in groups.iter().flat_map(|group| group.iter()) {
            match defs.iter_mut().find(|d| d.name == def.name) {
                Some(existing) => *existing = *def,
                None => defs.push(*def),
            }
        }

        let mut table = OptionTable::new(class_name);
        for def in &defs {
            table.insert(def.descriptor(codecs));
        }

        Self {
            command,
            table: Arc::new(table),
            defs,
        }
    }

    /// The native creation command.
    pub fn command(&self) -> &'static str {
        self.command
    }

    /// The option table.
    pub fn table(&self) -> &Arc<OptionTable> {
        &self.table
    }

    /// Create a widget under `parent` with a generated name.
    pub fn create(
        &self,
        bridge: &Bridge,
        parent: &str,
        initial: &[(&str, Value)],
    ) -> Result<Arc<Widget>> {
        let path = bridge.ids().child_path(parent, self.command);
        self.create_at(bridge, &path, initial)
    }

    /// Create a widget at an explicit path.
    pub fn create_at(
        &self,
        bridge: &Bridge,
        path: &str,
        initial: &[(&str, Value)],
    ) -> Result<Arc<Widget>> {
        Widget::create(bridge, self.command, path, self.table.clone(), initial)
    }

    /// Option specs for declaring this class on a headless surface.
    ///
    /// Options gated above `major` are left out, as an older toolkit would
    /// not know them.
    pub fn headless_specs(&self, major: u32) -> Vec<OptionSpec> {
        let mut specs = Vec::new();
        for def in &self.defs {
            if def.min_version.is_some_and(|min| major < min) {
                continue;
            }
            specs.push(OptionSpec::new(def.name, def.name, def.db_class, def.default));
            for alias in def.aliases {
                specs.push(OptionSpec::synonym(*alias, def.name));
            }
        }
        specs
    }
}

/// The standard classes: frame, label, button and entry.
#[derive(Debug, Clone)]
pub struct StandardClasses {
    /// `frame`
    pub frame: WidgetClass,
    /// `label`
    pub label: WidgetClass,
    /// `button`
    pub button: WidgetClass,
    /// `entry`
    pub entry: WidgetClass,
}

impl StandardClasses {
    /// Build the standard option tables with `codecs`.
    pub fn new(codecs: &CodecRegistry) -> Self {
        Self {
            frame: WidgetClass::new("frame", "Frame", codecs, &[COMMON, FRAME]),
            label: WidgetClass::new("label", "Label", codecs, &[COMMON, LABEL]),
            button: WidgetClass::new("button", "Button", codecs, &[COMMON, LABEL, BUTTON_EXTRA]),
            entry: WidgetClass::new("entry", "Entry", codecs, &[COMMON, ENTRY]),
        }
    }

    /// Iterate all classes.
    pub fn iter(&self) -> impl Iterator<Item = &WidgetClass> {
        [&self.frame, &self.label, &self.button, &self.entry].into_iter()
    }

    /// Declare every class on a headless surface, honoring its version.
    pub fn install_headless(&self, surface: &HeadlessSurface) {
        use horizon_bridge_core::NativeSurface;

        let major = surface.version().major;
        for class in self.iter() {
            surface.define_class(class.command(), class.headless_specs(major));
        }
    }
}
