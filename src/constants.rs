//! Application-wide constants
//!
//! This module contains the magic numbers and string literals used throughout
//! the extension, providing a single source of truth for constant values.

/// Host registration constants
pub mod extension {
    /// Key the host resolves to construct the extension
    pub const KEY: &str = "modules/imageResize";
}

/// Element tags the extension creates or reacts to
pub mod tags {
    /// Tag of eligible target elements (compared case-insensitively)
    pub const IMAGE: &str = "img";

    pub const DIV: &str = "div";
    pub const SPAN: &str = "span";
    pub const SVG: &str = "svg";
    pub const HTML: &str = "html";
    pub const BODY: &str = "body";
}

/// Key codes carried by `keyup` events
pub mod keys {
    pub const DELETE: u32 = 46;
    pub const BACKSPACE: u32 = 8;
}

/// Native text selection suppression while a session is active
pub mod selection {
    /// Vendor variants of the user-select style property
    pub const USER_SELECT_PROPERTIES: [&str; 4] =
        ["userSelect", "mozUserSelect", "webkitUserSelect", "msUserSelect"];

    pub const SUPPRESSED: &str = "none";
    pub const RESTORED: &str = "";
}

/// Overlay placement constants
pub mod overlay {
    /// Left shift compensating the overlay's 1px border
    pub const BORDER_COMPENSATION: f64 = 1.0;

    /// Positioning applied to the host container when it has none
    pub const CONTAINER_POSITION: &str = "relative";
}

/// Dimension readout constants
pub mod readout {
    /// Width above which the readout fits inside the image
    pub const MIN_INSIDE_WIDTH: f64 = 120.0;

    /// Height above which the readout fits inside the image
    pub const MIN_INSIDE_HEIGHT: f64 = 30.0;

    /// Gap between the readout and the image edge
    pub const INSET: f64 = 4.0;

    /// Separator between width and height in the label
    pub const SEPARATOR: &str = " × ";
}

/// Resize handle constants
pub mod handles {
    pub const CURSOR_NWSE: &str = "nwse-resize";
    pub const CURSOR_NESW: &str = "nesw-resize";

    /// Handle cursors in corner order: top-left, top-right, bottom-right, bottom-left
    pub const CURSORS: [&str; 4] = [CURSOR_NWSE, CURSOR_NESW, CURSOR_NWSE, CURSOR_NESW];

    /// Handle size used when `handleStyles` carries no parsable width/height
    pub const FALLBACK_SIZE: f64 = 12.0;
}

/// Alignment toolbar constants
pub mod toolbar {
    /// Filter marking the button of the applied alignment
    pub const ACTIVE_FILTER: &str = "invert(20%)";

    pub const CLASS_LEFT: &str = "quill-align-left";
    pub const CLASS_CENTER: &str = "quill-align-center";
    pub const CLASS_RIGHT: &str = "quill-align-right";
}

/// Text measurement used by the headless document for unsized elements
pub mod text_metrics {
    /// Average glyph advance as a fraction of the font size
    pub const CHAR_WIDTH_RATIO: f64 = 0.6;

    /// Font size assumed when the element's `font` style has none
    pub const DEFAULT_FONT_SIZE: f64 = 16.0;
}

/// Configuration file locations
pub mod config {
    pub const APP_DIR: &str = "image-resize-overlay";
    pub const FILENAME: &str = "options.json";
}
