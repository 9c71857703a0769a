use super::Options;
use crate::dom::StyleMap;
use crate::registry::ModuleSpec;

const FONT: &str = "12px/1.0 Arial, Helvetica, sans-serif";

fn styles(entries: &[(&str, &str)]) -> StyleMap {
    entries
        .iter()
        .map(|(property, value)| (property.to_string(), value.to_string()))
        .collect()
}

impl Default for Options {
    fn default() -> Self {
        Self {
            modules: vec![ModuleSpec::DisplaySize, ModuleSpec::Toolbar, ModuleSpec::Resize],
            overlay_styles: styles(&[
                ("position", "absolute"),
                ("boxSizing", "border-box"),
                ("border", "1px dashed #444"),
            ]),
            handle_styles: styles(&[
                ("position", "absolute"),
                ("height", "12px"),
                ("width", "12px"),
                ("backgroundColor", "white"),
                ("border", "1px solid #777"),
                ("boxSizing", "border-box"),
                ("opacity", "0.80"),
            ]),
            display_styles: styles(&[
                ("position", "absolute"),
                ("font", FONT),
                ("padding", "4px 8px"),
                ("textAlign", "center"),
                ("backgroundColor", "white"),
                ("color", "#333"),
                ("border", "1px solid #777"),
                ("boxSizing", "border-box"),
                ("opacity", "0.80"),
                ("cursor", "default"),
            ]),
            toolbar_styles: styles(&[
                ("position", "absolute"),
                ("top", "-12px"),
                ("right", "0"),
                ("left", "0"),
                ("height", "0"),
                ("minWidth", "100px"),
                ("font", FONT),
                ("textAlign", "center"),
                ("color", "#333"),
                ("boxSizing", "border-box"),
                ("cursor", "default"),
            ]),
            toolbar_button_styles: styles(&[
                ("display", "inline-block"),
                ("width", "24px"),
                ("height", "24px"),
                ("background", "white"),
                ("border", "1px solid #999"),
                ("verticalAlign", "middle"),
            ]),
            toolbar_button_svg_styles: styles(&[
                ("fill", "#444"),
                ("stroke", "#444"),
                ("strokeWidth", "2"),
            ]),
        }
    }
}
