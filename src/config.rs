use crate::cover::{Compositor, CoverLayout};
use crate::error::{Error, Result};
use crate::process::SvgStyle;
use crate::theme::{ColorScheme, DEFAULT_SCHEME, SchemeRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    pub default_scheme: String,
    /// Extra schemes offered in the standard tier. They never shadow a premium key.
    pub custom_schemes: BTreeMap<String, ColorScheme>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            default_scheme: DEFAULT_SCHEME.to_string(),
            custom_schemes: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let layout = CoverLayout::default();
        Self {
            width: layout.width,
            height: layout.height(),
            background: "#000000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: ThemeConfig,
    pub svg: SvgStyle,
    pub cover: CoverLayout,
    pub render: RenderConfig,
}

impl Config {
    pub fn registry(&self) -> SchemeRegistry {
        let mut registry = SchemeRegistry::builtin();
        for (key, scheme) in &self.theme.custom_schemes {
            registry.insert_standard(key, scheme.clone());
        }
        registry
    }

    pub fn compositor(&self) -> Compositor {
        Compositor::new(self.registry(), self.svg.clone(), self.cover.clone())
    }

    pub fn validate(&self) -> Result<()> {
        let registry = self.registry();
        registry.validate()?;
        if !registry.contains(&self.theme.default_scheme) {
            return Err(Error::config(format!(
                "default scheme `{}` is not defined",
                self.theme.default_scheme
            )));
        }
        let cover = &self.cover;
        if !(cover.width.is_finite() && cover.width > 0.0) {
            return Err(Error::config("cover.width must be positive"));
        }
        if !(cover.chart_scale > 0.0 && cover.chart_scale <= 1.0) {
            return Err(Error::config("cover.chartScale must be in (0, 1]"));
        }
        if cover.name_font_size <= 0.0 || cover.detail_font_size <= 0.0 {
            return Err(Error::config("font sizes must be positive"));
        }
        let delays = [
            cover.first_name_delay,
            cover.last_name_delay,
            cover.birth_date_delay,
            cover.birth_place_delay,
            cover.animation_duration,
        ];
        if delays.iter().any(|value| !value.is_finite() || *value < 0.0) {
            return Err(Error::config("animation timings must be non-negative"));
        }
        if self.render.width <= 0.0 || self.render.height <= 0.0 {
            return Err(Error::config("render size must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<ThemeConfigFile>,
    svg: Option<SvgStyle>,
    cover: Option<CoverLayout>,
    render: Option<RenderConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeConfigFile {
    default_scheme: Option<String>,
    #[serde(default)]
    custom_schemes: BTreeMap<String, ColorScheme>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
    background: Option<String>,
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    let config = parse_config(&contents)?;
    tracing::debug!(
        path = %path.display(),
        custom_schemes = config.theme.custom_schemes.len(),
        "loaded config"
    );
    Ok(config)
}

pub fn parse_config(contents: &str) -> Result<Config> {
    let parsed: ConfigFile = serde_json::from_str(contents)?;
    let mut config = Config::default();

    if let Some(theme) = parsed.theme {
        if let Some(v) = theme.default_scheme {
            config.theme.default_scheme = v;
        }
        config.theme.custom_schemes = theme.custom_schemes;
    }
    if let Some(svg) = parsed.svg {
        config.svg = svg;
    }
    if let Some(cover) = parsed.cover {
        config.cover = cover;
        config.render.width = config.cover.width;
        config.render.height = config.cover.height();
    }
    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
        if let Some(v) = render.background {
            config.render.background = v;
        }
    }

    config.validate()?;
    Ok(config)
}
