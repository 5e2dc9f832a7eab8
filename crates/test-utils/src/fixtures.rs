//! Common test fixtures for heatmap tests.
//!
//! This module provides pre-defined inputs for the scenarios the renderer
//! is expected to handle.

use std::io::Write;

use tempfile::NamedTempFile;

/// Point scenarios.
pub mod points {
    /// Three coincident points and one isolated point. With radius 25 and
    /// blur 35 the stack at (10, 10) is the peak and (50, 50) stays below it.
    pub const STACKED_AND_SINGLE: [[f64; 2]; 4] =
        [[10.0, 10.0], [10.0, 10.0], [10.0, 10.0], [50.0, 50.0]];

    /// One point in the middle of a 100x100 surface
    pub const CENTER_100: [[f64; 2]; 1] = [[50.0, 50.0]];

    /// Points far outside any reasonable surface
    pub const FAR_AWAY: [[f64; 2]; 3] = [[-5000.0, -5000.0], [9000.0, 20.0], [40.0, 1.0e6]];
}

/// Gradient presets as `(position, css color)` stops.
pub mod gradients {
    /// Default renderer gradient
    pub const DEFAULT: [(f64, &str); 5] = [
        (0.4, "blue"),
        (0.6, "cyan"),
        (0.7, "lime"),
        (0.8, "yellow"),
        (1.0, "red"),
    ];

    pub const BLACK_WHITE: [(f64, &str); 2] = [(0.0, "black"), (1.0, "white")];

    pub const BLUE_RED: [(f64, &str); 2] = [(0.0, "blue"), (1.0, "red")];

    /// Deep teal to green
    pub const SEA: [(f64, &str); 2] = [(0.0, "#134E5E"), (1.0, "#71B280")];

    pub const SUNSET: [(f64, &str); 5] = [
        (0.0, "#F9F23D"),
        (0.25, "#F9D738"),
        (0.5, "#FBA330"),
        (0.75, "#FC7529"),
        (1.0, "#FC5E25"),
    ];

    pub const WINE: [(f64, &str); 5] = [
        (0.0, "#FFFFFF"),
        (0.25, "#BD2B2B"),
        (0.5, "#9E1B30"),
        (0.75, "#780E3D"),
        (1.0, "red"),
    ];

    /// Stops in descending order
    pub const UNORDERED: [(f64, &str); 3] = [(1.0, "red"), (0.0, "blue"), (0.5, "lime")];

    /// Single stop (constant color)
    pub const SINGLE: [(f64, &str); 1] = [(0.5, "orange")];
}

/// Sample JSON configurations.
pub mod configs {
    /// Only the required fields
    pub const MINIMAL: &str = r#"{ "width": 320, "height": 240 }"#;

    /// Pan/zoom heatmap with a custom gradient and fill
    pub const INTERACTIVE: &str = r##"{
        "width": 400,
        "height": 300,
        "radius": 12,
        "blur": 18,
        "min_alpha": 0.2,
        "gradient": { "0": "#134E5E", "1": "#71B280" },
        "background": { "fill": "#000000" },
        "interactive": { "scale_factor": 1.25, "min_scale": 0.5, "max_scale": 8.0 }
    }"##;

    /// Gradient key outside [0, 1]
    pub const BAD_STOP: &str = r#"{ "width": 10, "height": 10, "gradient": { "1.5": "red" } }"#;

    /// Unknown color name
    pub const BAD_COLOR: &str = r#"{ "width": 10, "height": 10, "gradient": { "0.5": "notacolor" } }"#;
}

/// Write `contents` to a temporary `.json` file that lives as long as the
/// returned handle.
pub fn write_temp_config(contents: &str) -> std::io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_temp_config_round_trips() {
        let file = write_temp_config(configs::MINIMAL).unwrap();
        let read = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(read, configs::MINIMAL);
        assert_eq!(file.path().extension().and_then(|e| e.to_str()), Some("json"));
    }
}
