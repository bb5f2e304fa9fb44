use crate::error::Result;
use crate::gradient::{fmt_num, parse_css_gradient};
use crate::process::{ProcessedSvg, SvgStyle, process_or_fallback};
use crate::svgdom::{SvgDocument, escape_xml};
use crate::theme::{ColorScheme, SchemeRegistry};
use serde::{Deserialize, Serialize};

const BACKGROUND_ID: &str = "starbook-cover-bg";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverInputs {
    pub name: String,
    pub birth_date: String,
    pub birth_place: String,
    pub color_scheme_key: String,
    #[serde(default)]
    pub chart_svg: Option<String>,
    #[serde(default)]
    pub cover_design_svg: Option<String>,
}

/// Geometry and timing of the composed cover. Height always follows a 3:4 ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoverLayout {
    pub width: f32,
    /// Chart width as a fraction of the cover width.
    pub chart_scale: f32,
    pub font_family: String,
    pub name_font_size: f32,
    pub detail_font_size: f32,
    pub first_name_delay: f32,
    pub last_name_delay: f32,
    pub birth_date_delay: f32,
    pub birth_place_delay: f32,
    pub animation_duration: f32,
    /// Emit the entrance animation. Rasterizers ignore keyframes, so PNG output turns this off.
    pub animate: bool,
}

impl Default for CoverLayout {
    fn default() -> Self {
        Self {
            width: 600.0,
            chart_scale: 0.75,
            font_family: "'Cormorant Garamond', Georgia, serif".to_string(),
            name_font_size: 44.0,
            detail_font_size: 20.0,
            first_name_delay: 0.2,
            last_name_delay: 0.4,
            birth_date_delay: 0.6,
            birth_place_delay: 0.8,
            animation_duration: 0.8,
            animate: true,
        }
    }
}

impl CoverLayout {
    pub fn height(&self) -> f32 {
        self.width * 4.0 / 3.0
    }

    pub fn chart_size(&self) -> f32 {
        self.width * self.chart_scale
    }
}

/// Splits a full name into first name and the remainder.
pub fn split_name(name: &str) -> (String, Option<String>) {
    let mut parts = name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let rest: Vec<&str> = parts.collect();
    if rest.is_empty() {
        (first, None)
    } else {
        (first, Some(rest.join(" ")))
    }
}

#[derive(Debug, Clone)]
pub struct Compositor {
    registry: SchemeRegistry,
    style: SvgStyle,
    layout: CoverLayout,
}

impl Compositor {
    pub fn new(registry: SchemeRegistry, style: SvgStyle, layout: CoverLayout) -> Self {
        Self {
            registry,
            style,
            layout,
        }
    }

    pub fn registry(&self) -> &SchemeRegistry {
        &self.registry
    }

    pub fn layout(&self) -> &CoverLayout {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut CoverLayout {
        &mut self.layout
    }

    pub fn style(&self) -> &SvgStyle {
        &self.style
    }

    pub fn scheme(&self, key: &str) -> Result<&ColorScheme> {
        self.registry.get(key)
    }

    pub fn process_chart(&self, raw: Option<&str>, scheme_key: &str) -> Result<ProcessedSvg> {
        let scheme = self.registry.get(scheme_key)?;
        Ok(process_or_fallback(raw, scheme, &self.style))
    }

    /// One-shot composition: process the chart (or fall back) and stack every layer.
    pub fn compose(&self, inputs: &CoverInputs) -> Result<String> {
        let chart = self.process_chart(inputs.chart_svg.as_deref(), &inputs.color_scheme_key)?;
        self.compose_with_chart(inputs, &chart)
    }

    pub fn compose_with_chart(&self, inputs: &CoverInputs, chart: &ProcessedSvg) -> Result<String> {
        compose_cover(inputs, chart, &self.registry, &self.layout)
    }

    /// Shown while the chart is still loading: background plus an indicator, no user layers.
    pub fn placeholder(&self, scheme_key: &str) -> Result<String> {
        let scheme = self.registry.get(scheme_key)?;
        let layout = &self.layout;
        let center_x = layout.width / 2.0;
        let center_y = layout.height() / 2.0;
        let mut svg = open_cover(layout);
        svg.push_str(&background_layer(scheme)?);
        svg.push_str(&format!(
            "<g class=\"layer-loading\"><circle cx=\"{x}\" cy=\"{y}\" r=\"{r}\" fill=\"none\" stroke=\"{}\" stroke-width=\"3\" stroke-dasharray=\"12 8\" opacity=\"0.8\"/><text x=\"{x}\" y=\"{ty}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">Loading chart\u{2026}</text></g>",
            escape_xml(&scheme.accent_color),
            escape_xml(&layout.font_family),
            fmt_num(layout.detail_font_size),
            escape_xml(&scheme.text_color),
            x = fmt_num(center_x),
            y = fmt_num(center_y),
            r = fmt_num(layout.width * 0.08),
            ty = fmt_num(center_y + layout.width * 0.08 + layout.detail_font_size * 1.6),
        ));
        svg.push_str("</svg>");
        Ok(svg)
    }
}

/// Stacks background, optional design, chart and text into a 3:4 cover SVG.
pub fn compose_cover(
    inputs: &CoverInputs,
    chart: &ProcessedSvg,
    registry: &SchemeRegistry,
    layout: &CoverLayout,
) -> Result<String> {
    let scheme = registry.get(&inputs.color_scheme_key)?;
    let width = layout.width;
    let height = layout.height();

    let mut svg = open_cover(layout);
    svg.push_str(&background_layer(scheme)?);
    if layout.animate {
        svg.push_str(&animation_style(layout));
    }

    if let Some(design) = inputs.cover_design_svg.as_deref() {
        svg.push_str(&design_layer(design, width, height));
    }

    svg.push_str(&chart_layer(chart, layout));
    svg.push_str(&text_layer(inputs, scheme, layout));
    svg.push_str("</svg>");

    tracing::debug!(
        scheme = scheme.name.as_str(),
        fallback_chart = chart.is_fallback,
        design = inputs.cover_design_svg.is_some(),
        bytes = svg.len(),
        "composed cover"
    );
    Ok(svg)
}

fn background_layer(scheme: &ColorScheme) -> Result<String> {
    let gradient = parse_css_gradient(&scheme.bg_gradient)?;
    Ok(format!(
        "<defs>{}</defs><g class=\"layer-background\"><rect width=\"100%\" height=\"100%\" fill=\"url(#{BACKGROUND_ID})\"/></g>",
        gradient.to_svg_def(BACKGROUND_ID)
    ))
}

fn open_cover(layout: &CoverLayout) -> String {
    let width = fmt_num(layout.width);
    let height = fmt_num(layout.height());
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" class=\"starbook-cover\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">"
    )
}

fn animation_style(layout: &CoverLayout) -> String {
    format!(
        "<style>@keyframes starbook-reveal {{ from {{ opacity: 0; transform: translateY(12px); }} to {{ opacity: 1; transform: translateY(0); }} }} .reveal {{ opacity: 0; animation: starbook-reveal {}s ease-out forwards; }}</style>",
        fmt_num(layout.animation_duration)
    )
}

fn design_layer(design: &str, width: f32, height: f32) -> String {
    let mut doc = match SvgDocument::parse(design) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::warn!(error = %err, "cover design rejected, skipping layer");
            return String::new();
        }
    };
    doc.prefix_ids("starbook-design");
    let root = doc.root_mut();
    root.set_attr("x", "0");
    root.set_attr("y", "0");
    root.set_attr("width", fmt_num(width));
    root.set_attr("height", fmt_num(height));
    if !root.has_attr("preserveAspectRatio") {
        root.set_attr("preserveAspectRatio", "xMidYMid slice");
    }
    format!(
        "<g class=\"layer-design\" pointer-events=\"none\" aria-hidden=\"true\">{}</g>",
        doc.to_svg_string()
    )
}

fn chart_layer(chart: &ProcessedSvg, layout: &CoverLayout) -> String {
    let size = layout.chart_size();
    let x = (layout.width - size) / 2.0;
    let y = (layout.height() - size) / 2.0;
    let mut nested = chart.document().clone();
    nested.prefix_ids("starbook-chart");
    let root = nested.root_mut();
    root.set_attr("x", fmt_num(x));
    root.set_attr("y", fmt_num(y));
    root.set_attr("width", fmt_num(size));
    root.set_attr("height", fmt_num(size));
    format!("<g class=\"layer-chart\">{}</g>", nested.to_svg_string())
}

fn text_layer(inputs: &CoverInputs, scheme: &ColorScheme, layout: &CoverLayout) -> String {
    let height = layout.height();
    let center_x = fmt_num(layout.width / 2.0);
    let name_top = height * 0.12;
    let details_top = height * 0.88;
    let (first, last) = split_name(&inputs.name);

    let mut out = format!(
        "<g class=\"layer-text\" font-family=\"{}\" fill=\"{}\" text-anchor=\"middle\">",
        escape_xml(&layout.font_family),
        escape_xml(&scheme.text_color)
    );

    let lines = [
        (
            "first-name",
            Some(first),
            name_top,
            layout.name_font_size,
            layout.first_name_delay,
        ),
        (
            "last-name",
            last,
            name_top + layout.name_font_size * 1.1,
            layout.name_font_size,
            layout.last_name_delay,
        ),
        (
            "birth-date",
            Some(inputs.birth_date.trim().to_string()),
            details_top,
            layout.detail_font_size,
            layout.birth_date_delay,
        ),
        (
            "birth-place",
            Some(inputs.birth_place.trim().to_string()),
            details_top + layout.detail_font_size * 1.5,
            layout.detail_font_size,
            layout.birth_place_delay,
        ),
    ];

    for (class, value, y, font_size, delay) in lines {
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            continue;
        };
        let (class_attr, timing) = if layout.animate {
            (
                format!("reveal {class}"),
                format!(" style=\"animation-delay: {}s\"", fmt_num(delay)),
            )
        } else {
            (class.to_string(), String::new())
        };
        out.push_str(&format!(
            "<text class=\"{class_attr}\" x=\"{center_x}\" y=\"{}\" font-size=\"{}\"{timing}>{}</text>",
            fmt_num(y),
            fmt_num(font_size),
            escape_xml(&value)
        ));
    }

    let divider_y = details_top - layout.detail_font_size * 1.5;
    out.push_str(&format!(
        "<line x1=\"{}\" y1=\"{y}\" x2=\"{}\" y2=\"{y}\" stroke=\"{}\" stroke-width=\"1\" opacity=\"0.7\"/>",
        fmt_num(layout.width * 0.35),
        fmt_num(layout.width * 0.65),
        escape_xml(&scheme.accent_color),
        y = fmt_num(divider_y)
    ));
    out.push_str("</g>");
    out
}

/// Where a cover is in its lifecycle. There is no error state: failed or
/// missing charts resolve to `Ready` with the fallback chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverState {
    Loading,
    Ready(ProcessedSvg),
}

/// A cover being previewed. `inputs.chart_svg` holds the raw chart the ready state was built from.
#[derive(Debug, Clone)]
pub struct Cover {
    inputs: CoverInputs,
    state: CoverState,
}

impl Cover {
    pub fn new(inputs: CoverInputs) -> Self {
        Self {
            inputs,
            state: CoverState::Loading,
        }
    }

    pub fn inputs(&self) -> &CoverInputs {
        &self.inputs
    }

    pub fn state(&self) -> &CoverState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, CoverState::Ready(_))
    }

    /// Moves to `Ready`, using the fallback chart when `chart` is `None` or unparsable.
    pub fn resolve_chart(&mut self, compositor: &Compositor, chart: Option<String>) -> Result<()> {
        let processed = compositor.process_chart(chart.as_deref(), &self.inputs.color_scheme_key)?;
        self.inputs.chart_svg = chart;
        self.state = CoverState::Ready(processed);
        Ok(())
    }

    /// Switches schemes, rebuilding the processed chart from its source.
    /// Returns `false` when the scheme is unchanged.
    pub fn set_scheme(&mut self, compositor: &Compositor, key: &str) -> Result<bool> {
        compositor.scheme(key)?;
        if self.inputs.color_scheme_key.trim().eq_ignore_ascii_case(key.trim()) {
            return Ok(false);
        }
        self.inputs.color_scheme_key = key.trim().to_string();
        if self.is_ready() {
            let processed =
                compositor.process_chart(self.inputs.chart_svg.as_deref(), &self.inputs.color_scheme_key)?;
            self.state = CoverState::Ready(processed);
        }
        Ok(true)
    }

    pub fn set_cover_design(&mut self, design: Option<String>) {
        self.inputs.cover_design_svg = design;
    }

    pub fn set_details(&mut self, name: &str, birth_date: &str, birth_place: &str) {
        self.inputs.name = name.to_string();
        self.inputs.birth_date = birth_date.to_string();
        self.inputs.birth_place = birth_place.to_string();
    }

    pub fn render(&self, compositor: &Compositor) -> Result<String> {
        match &self.state {
            CoverState::Loading => compositor.placeholder(&self.inputs.color_scheme_key),
            CoverState::Ready(chart) => compositor.compose_with_chart(&self.inputs, chart),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn compositor() -> Compositor {
        Compositor::new(
            SchemeRegistry::builtin(),
            SvgStyle::default(),
            CoverLayout::default(),
        )
    }

    fn inputs() -> CoverInputs {
        CoverInputs {
            name: "Jane Doe".to_string(),
            birth_date: "March 14, 1990".to_string(),
            birth_place: "Lisbon, Portugal".to_string(),
            color_scheme_key: "cosmic-blue".to_string(),
            ..Default::default()
        }
    }

    fn text_nodes(svg: &str) -> Vec<(String, String, Option<String>)> {
        let doc = SvgDocument::parse(svg).unwrap();
        doc.root()
            .descendants_named("g")
            .into_iter()
            .filter(|g| g.attr("class") == Some("layer-text"))
            .flat_map(|g| g.descendants_named("text"))
            .map(|t| {
                (
                    t.attr("class").unwrap_or_default().to_string(),
                    t.text_content(),
                    t.attr("style").map(str::to_string),
                )
            })
            .collect()
    }

    #[test]
    fn splits_names() {
        assert_eq!(split_name("Jane Doe"), ("Jane".to_string(), Some("Doe".to_string())));
        assert_eq!(
            split_name("  Mary Ann  Smith "),
            ("Mary".to_string(), Some("Ann Smith".to_string()))
        );
        assert_eq!(split_name("Cher"), ("Cher".to_string(), None));
        assert_eq!(split_name(""), (String::new(), None));
    }

    #[test]
    fn places_first_and_last_name_with_staggered_delays() {
        let svg = compositor().compose(&inputs()).unwrap();
        let texts = text_nodes(&svg);
        assert_eq!(texts.len(), 4);
        assert_eq!(texts[0].1, "Jane");
        assert_eq!(texts[0].2.as_deref(), Some("animation-delay: 0.2s"));
        assert_eq!(texts[1].1, "Doe");
        assert_eq!(texts[1].2.as_deref(), Some("animation-delay: 0.4s"));
        assert_eq!(texts[2].1, "March 14, 1990");
        assert_eq!(texts[2].2.as_deref(), Some("animation-delay: 0.6s"));
        assert_eq!(texts[3].1, "Lisbon, Portugal");
        assert_eq!(texts[3].2.as_deref(), Some("animation-delay: 0.8s"));
    }

    #[test]
    fn stacks_layers_back_to_front_in_three_by_four_box() {
        let mut with_design = inputs();
        with_design.cover_design_svg = Some(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 30 40"><rect width="30" height="40" fill="gold"/></svg>"#
                .to_string(),
        );
        let svg = compositor().compose(&with_design).unwrap();
        let doc = SvgDocument::parse(&svg).unwrap();
        assert_eq!(doc.root().attr("viewBox"), Some("0 0 600 800"));

        let layers: Vec<&str> = doc
            .root()
            .child_elements()
            .filter(|el| el.local_name() == "g")
            .filter_map(|el| el.attr("class"))
            .collect();
        assert_eq!(layers, vec!["layer-background", "layer-design", "layer-chart", "layer-text"]);

        let chart = doc
            .root()
            .child_elements()
            .find(|el| el.attr("class") == Some("layer-chart"))
            .and_then(|g| g.child_elements().next())
            .unwrap();
        assert_eq!(chart.attr("width"), Some("450"));
        assert_eq!(chart.attr("x"), Some("75"));
        assert_eq!(chart.attr("y"), Some("175"));
    }

    #[test]
    fn single_name_produces_one_name_node() {
        let mut single = inputs();
        single.name = "Cher".to_string();
        let svg = compositor().compose(&single).unwrap();
        let texts = text_nodes(&svg);
        assert_eq!(texts.len(), 3);
        assert_eq!(texts[0].1, "Cher");
    }

    #[test]
    fn static_layout_drops_animation() {
        let mut compositor = compositor();
        compositor.layout_mut().animate = false;
        let svg = compositor.compose(&inputs()).unwrap();
        assert!(!svg.contains("<style>"));
        assert!(text_nodes(&svg).iter().all(|(_, _, style)| style.is_none()));
    }

    #[test]
    fn escapes_user_text() {
        let mut odd = inputs();
        odd.birth_place = "<Paris & \"Co\">".to_string();
        let svg = compositor().compose(&odd).unwrap();
        assert!(svg.contains("&lt;Paris &amp; &quot;Co&quot;&gt;"));
        SvgDocument::parse(&svg).unwrap();
    }

    #[test]
    fn unknown_scheme_fails_compose() {
        let mut bad = inputs();
        bad.color_scheme_key = "plaid".to_string();
        assert!(matches!(
            compositor().compose(&bad),
            Err(Error::SchemeNotFound { .. })
        ));
    }

    #[test]
    fn loading_renders_placeholder_only() {
        let compositor = compositor();
        let cover = Cover::new(inputs());
        assert!(!cover.is_ready());
        let svg = cover.render(&compositor).unwrap();
        assert!(svg.contains("layer-loading"));
        assert!(!svg.contains("Jane"));
        assert!(!svg.contains("layer-chart"));
    }

    #[test]
    fn resolving_without_chart_reaches_ready_with_fallback() {
        let compositor = compositor();
        let mut cover = Cover::new(inputs());
        cover.resolve_chart(&compositor, None).unwrap();
        match cover.state() {
            CoverState::Ready(chart) => assert!(chart.is_fallback),
            CoverState::Loading => panic!("cover should be ready"),
        }
        let svg = cover.render(&compositor).unwrap();
        assert!(svg.contains("Natal Chart"));
    }

    #[test]
    fn scheme_change_rebuilds_and_same_scheme_is_noop() {
        let compositor = compositor();
        let mut cover = Cover::new(inputs());
        cover.resolve_chart(&compositor, None).unwrap();
        let before = cover.render(&compositor).unwrap();

        assert!(!cover.set_scheme(&compositor, "Cosmic-Blue").unwrap());
        assert_eq!(cover.render(&compositor).unwrap(), before);

        assert!(cover.set_scheme(&compositor, "celestial-gold").unwrap());
        let gold = compositor.scheme("celestial-gold").unwrap().text_color.clone();
        let after = cover.render(&compositor).unwrap();
        assert!(after.contains(&gold));
        assert_ne!(after, before);

        assert!(cover.set_scheme(&compositor, "plaid").is_err());
        assert_eq!(cover.inputs().color_scheme_key, "celestial-gold");
    }

    #[test]
    fn scheme_colors_are_escaped_in_markup() {
        let mut registry = SchemeRegistry::builtin();
        registry.insert_standard(
            "unchecked",
            ColorScheme::new("Unchecked", "linear-gradient(#000, #111)", "#fff\" onload=\"x", "#000"),
        );
        let compositor = Compositor::new(registry, SvgStyle::default(), CoverLayout::default());
        let mut unchecked = inputs();
        unchecked.color_scheme_key = "unchecked".to_string();

        for svg in [
            compositor.compose(&unchecked).unwrap(),
            compositor.placeholder("unchecked").unwrap(),
        ] {
            let doc = SvgDocument::parse(&svg).unwrap();
            let mut injected = false;
            doc.root().walk(&mut |el| injected |= el.has_attr("onload"));
            assert!(!injected);
        }
    }

    #[test]
    fn layer_ids_do_not_collide() {
        let gradient_svg = |color: &str| {
            format!(
                r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"><defs><linearGradient id="grad1"><stop offset="0" stop-color="{color}"/></linearGradient></defs><rect width="10" height="10" fill="url(#grad1)"/></svg>"##
            )
        };
        let mut layered = inputs();
        layered.chart_svg = Some(gradient_svg("red"));
        layered.cover_design_svg = Some(gradient_svg("blue"));
        let svg = compositor().compose(&layered).unwrap();

        let doc = SvgDocument::parse(&svg).unwrap();
        let mut ids = Vec::new();
        doc.root().walk(&mut |el| {
            if let Some(id) = el.attr("id") {
                ids.push(id.to_string());
            }
        });
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(ids.len(), unique.len(), "{ids:?}");
        assert!(svg.contains("fill=\"url(#starbook-chart-grad1)\""));
        assert!(svg.contains("fill=\"url(#starbook-design-grad1)\""));
    }
}
