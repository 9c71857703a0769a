use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::merge::merge_all;
use crate::dom::StyleMap;
use crate::registry::ModuleSpec;

/// Effective extension configuration, immutable once built
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    /// Capability modules to activate, in creation and paint order
    pub modules: Vec<ModuleSpec>,
    #[serde(deserialize_with = "deserialize_styles")]
    pub overlay_styles: StyleMap,
    #[serde(deserialize_with = "deserialize_styles")]
    pub handle_styles: StyleMap,
    #[serde(deserialize_with = "deserialize_styles")]
    pub display_styles: StyleMap,
    #[serde(deserialize_with = "deserialize_styles")]
    pub toolbar_styles: StyleMap,
    #[serde(deserialize_with = "deserialize_styles")]
    pub toolbar_button_styles: StyleMap,
    #[serde(deserialize_with = "deserialize_styles")]
    pub toolbar_button_svg_styles: StyleMap,
}

/// Style maps accept numbers as well as strings (`"opacity": 0.8`)
fn deserialize_styles<'de, D>(deserializer: D) -> Result<StyleMap, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StyleValue {
        Text(String),
        Number(serde_json::Number),
    }

    let raw = BTreeMap::<String, StyleValue>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(property, value)| {
            let value = match value {
                StyleValue::Text(text) => text,
                StyleValue::Number(number) => number.to_string(),
            };
            (property, value)
        })
        .collect())
}

impl Options {
    /// Build options from the built-in defaults, the options passed at
    /// construction and the host instance settings, in increasing precedence
    pub fn from_layers(passed: &Value, instance: &Value) -> Result<Self> {
        let defaults =
            serde_json::to_value(Self::default()).context("Failed to serialize default options")?;
        let merged = merge_all(defaults, [passed, instance]);
        debug!(options = %merged, "merged image resize options");

        let options: Options =
            serde_json::from_value(merged).context("Invalid image resize options")?;
        options.validate();
        Ok(options)
    }

    /// Replace the module list, e.g. with custom modules that have no JSON name
    pub fn with_modules(mut self, modules: Vec<ModuleSpec>) -> Self {
        self.modules = modules;
        self.validate();
        self
    }

    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(ModuleSpec::name).collect()
    }

    /// Warn about module lists that are legal but probably unintended
    fn validate(&self) {
        if self.modules.is_empty() {
            warn!("no image modules configured, selections will only show the overlay");
        }

        let names = self.module_names();
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                warn!(module = %name, "image module listed more than once");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_without_overrides() {
        let options = Options::from_layers(&Value::Null, &Value::Null).unwrap();
        assert_eq!(options.module_names(), vec!["DisplaySize", "Toolbar", "Resize"]);
        assert_eq!(options.handle_styles.get("width").map(String::as_str), Some("12px"));
        assert_eq!(
            options.overlay_styles.get("border").map(String::as_str),
            Some("1px dashed #444")
        );
    }

    #[test]
    fn test_overrides_merge_at_every_level() {
        let passed = json!({
            "modules": ["Resize"],
            "handleStyles": { "width": "20px", "backgroundColor": "black" },
            "displayStyles": { "opacity": 1 }
        });
        let options = Options::from_layers(&passed, &Value::Null).unwrap();

        assert_eq!(options.module_names(), vec!["Resize"]);
        assert_eq!(options.handle_styles["width"], "20px");
        assert_eq!(options.handle_styles["backgroundColor"], "black");
        assert_eq!(options.handle_styles["height"], "12px");
        assert_eq!(options.handle_styles["border"], "1px solid #777");
        assert_eq!(options.display_styles["opacity"], "1");
        assert_eq!(options.display_styles["padding"], "4px 8px");
        assert_eq!(options.toolbar_styles["top"], "-12px");
    }

    #[test]
    fn test_instance_settings_take_precedence() {
        let passed = json!({ "overlayStyles": { "border": "2px solid red" } });
        let instance = json!({
            "theme": "snow",
            "overlayStyles": { "border": "3px dotted blue" }
        });
        let options = Options::from_layers(&passed, &instance).unwrap();
        assert_eq!(options.overlay_styles["border"], "3px dotted blue");
        assert_eq!(options.overlay_styles["position"], "absolute");
    }

    #[test]
    fn test_unknown_module_names_parse() {
        let passed = json!({ "modules": ["DisplaySize", "Caption"] });
        let options = Options::from_layers(&passed, &Value::Null).unwrap();
        assert_eq!(options.module_names(), vec!["DisplaySize", "Caption"]);
    }

    #[test]
    fn test_malformed_styles_rejected() {
        let passed = json!({ "overlayStyles": ["not", "a", "map"] });
        let err = Options::from_layers(&passed, &Value::Null).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid image resize options"));
    }
}
