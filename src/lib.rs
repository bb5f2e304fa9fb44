#[cfg(feature = "cli")]
pub mod cli;
pub mod compat;
pub mod config;
pub mod cover;
pub mod error;
pub mod fallback;
pub mod gradient;
pub mod process;
pub mod render;
pub mod session;
pub mod svgdom;
pub mod theme;
pub mod zodiac;

#[cfg(feature = "cli")]
pub use cli::run;
pub use compat::{CompatibilityEntry, CompatibilityTable, get_compatibility};
pub use config::{Config, load_config};
pub use cover::{Compositor, Cover, CoverInputs, CoverLayout, CoverState, compose_cover};
pub use error::{Error, Result};
pub use fallback::fallback_chart;
pub use process::{ProcessedSvg, SvgStyle, process_or_fallback, process_svg};
pub use session::{AssetSource, FileAssetSource, PreviewSession};
pub use theme::{ColorScheme, SchemeRegistry};
pub use zodiac::Sign;

/// Composes a cover with the built-in schemes and default layout.
pub fn render_cover(inputs: &CoverInputs) -> Result<String> {
    Config::default().compositor().compose(inputs)
}
