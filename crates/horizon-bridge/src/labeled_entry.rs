//! A label and an entry inside a frame, configured as one widget.

use std::sync::Arc;

use horizon_bridge_core::{
    Bridge, BridgeError, Composite, Configurable, ConfigurableRef, OptionInfo, OptionMethods,
    Result, Value, Widget,
};

use crate::classes::StandardClasses;

/// Accepted values of the `labelside` option.
pub const LABEL_SIDES: [&str; 4] = ["left", "right", "top", "bottom"];

const TARGET: &str = "horizon_bridge::labeled_entry";

/// A labeled text entry.
///
/// Option routing:
///
/// | Option | Goes to |
/// |--------|---------|
/// | `label` | the label's `text` |
/// | `labelfont` | the label's `font` |
/// | `foreground` | label and entry |
/// | `labelside` | kept on the composite |
/// | anything else | the entry, then the frame |
#[derive(Debug)]
pub struct LabeledEntry {
    composite: Composite,
    label: Arc<Widget>,
    entry: Arc<Widget>,
}

impl LabeledEntry {
    /// Create the widget under `parent` and register it.
    pub fn create(bridge: &Bridge, classes: &StandardClasses, parent: &str) -> Result<Arc<Self>> {
        let frame = classes.frame.create(bridge, parent, &[])?;
        let label = match classes
            .label
            .create_at(bridge, &format!("{}.label", frame.path()), &[])
        {
            Ok(label) => label,
            Err(err) => {
                discard(&[&frame]);
                return Err(err);
            }
        };
        let entry = match classes
            .entry
            .create_at(bridge, &format!("{}.entry", frame.path()), &[])
        {
            Ok(entry) => entry,
            Err(err) => {
                discard(&[&label, &frame]);
                return Err(err);
            }
        };

        let composite = Composite::new(frame);
        let label_ref: ConfigurableRef = label.clone();
        let entry_ref: ConfigurableRef = entry.clone();

        composite.delegate_alias("label", "text", [label_ref.clone()])?;
        composite.delegate_alias("labelfont", "font", [label_ref.clone()])?;
        composite.delegate("foreground", [label_ref, entry_ref.clone()])?;
        composite.delegate("DEFAULT", [entry_ref])?;
        composite.option_methods([(
            "labelside",
            OptionMethods::setter_only(|value| match value.as_str() {
                Some(side) if LABEL_SIDES.contains(&side) => Ok(()),
                _ => Err(BridgeError::invalid_argument(format!(
                    "labelside must be one of {}, got {:?}",
                    LABEL_SIDES.join(", "),
                    value
                ))),
            }),
        )]);

        let widget = Arc::new(Self {
            composite,
            label,
            entry,
        });
        let path = widget.path().to_string();
        tracing::debug!(target: TARGET, path = %path, "labeled entry created");
        bridge
            .identities()
            .register_dyn(&path, horizon_bridge_core::parent_path(&path), widget.clone());
        Ok(widget)
    }

    /// The routing engine behind this widget.
    pub fn composite(&self) -> &Composite {
        &self.composite
    }

    /// The label child.
    pub fn label(&self) -> &Arc<Widget> {
        &self.label
    }

    /// The entry child.
    pub fn entry(&self) -> &Arc<Widget> {
        &self.entry
    }
}

/// Destroy partly built children, innermost first.
fn discard(widgets: &[&Arc<Widget>]) {
    for widget in widgets {
        if let Err(err) = widget.destroy() {
            tracing::debug!(target: TARGET, path = %widget.path(), error = %err, "cleanup failed");
        }
    }
}

impl Configurable for LabeledEntry {
    fn path(&self) -> &str {
        self.composite.path()
    }

    fn cget(&self, option: &str) -> Result<Value> {
        self.composite.cget(option)
    }

    fn configure(&self, option: &str, value: Value) -> Result<()> {
        self.composite.configure(option, value)
    }

    fn configinfo(&self, option: &str) -> Result<OptionInfo> {
        self.composite.configinfo(option)
    }

    fn configinfo_all(&self) -> Result<Vec<OptionInfo>> {
        self.composite.configinfo_all()
    }
}
