use crate::error::Result;
use crate::fallback::fallback_chart;
use crate::svgdom::{SvgDocument, SvgElement};
use crate::theme::ColorScheme;
use serde::{Deserialize, Serialize};

pub const DEFAULT_VIEW_BOX: &str = "0 0 800 800";

/// Fixed attributes the processor writes alongside the scheme colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SvgStyle {
    pub default_view_box: String,
    pub width: String,
    pub height: String,
    pub text_outline_color: String,
    pub text_outline_width: String,
    pub default_stroke_width: String,
}

impl Default for SvgStyle {
    fn default() -> Self {
        Self {
            default_view_box: DEFAULT_VIEW_BOX.to_string(),
            width: "100%".to_string(),
            height: "100%".to_string(),
            text_outline_color: "rgba(0, 0, 0, 0.35)".to_string(),
            text_outline_width: "0.5".to_string(),
            default_stroke_width: "1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedSvg {
    document: SvgDocument,
    markup: String,
    pub text_count: usize,
    pub stroke_count: usize,
    /// True when the markup came from the fallback chart instead of the caller's input.
    pub is_fallback: bool,
}

impl ProcessedSvg {
    pub fn as_str(&self) -> &str {
        &self.markup
    }

    pub fn into_string(self) -> String {
        self.markup
    }

    pub fn document(&self) -> &SvgDocument {
        &self.document
    }

    pub fn view_box(&self) -> &str {
        self.document.root().attr("viewBox").unwrap_or(DEFAULT_VIEW_BOX)
    }
}

pub fn process_svg(raw: &str, scheme: &ColorScheme, style: &SvgStyle) -> Result<ProcessedSvg> {
    let mut document = SvgDocument::parse(raw)?;
    let (text_count, stroke_count) = apply_scheme(&mut document, scheme, style);
    let markup = document.to_svg_string();
    tracing::debug!(
        scheme = scheme.name.as_str(),
        text_count,
        stroke_count,
        bytes = markup.len(),
        "processed chart svg"
    );
    Ok(ProcessedSvg {
        document,
        markup,
        text_count,
        stroke_count,
        is_fallback: false,
    })
}

/// Processes `raw`, substituting the fallback chart when it is absent or unparsable.
pub fn process_or_fallback(raw: Option<&str>, scheme: &ColorScheme, style: &SvgStyle) -> ProcessedSvg {
    if let Some(raw) = raw {
        match process_svg(raw, scheme, style) {
            Ok(processed) => return processed,
            Err(err) => tracing::warn!(error = %err, "chart svg rejected, using fallback chart"),
        }
    } else {
        tracing::debug!("no chart svg supplied, using fallback chart");
    }
    process_fallback(scheme, style)
}

pub fn process_fallback(scheme: &ColorScheme, style: &SvgStyle) -> ProcessedSvg {
    let mut processed = match process_svg(fallback_chart(), scheme, style) {
        Ok(processed) => processed,
        Err(err) => {
            tracing::error!(error = %err, "fallback chart failed to parse");
            let mut document = SvgDocument::from_root(SvgElement::new("svg"));
            document
                .root_mut()
                .set_attr("xmlns", "http://www.w3.org/2000/svg");
            apply_scheme(&mut document, scheme, style);
            let markup = document.to_svg_string();
            ProcessedSvg {
                document,
                markup,
                text_count: 0,
                stroke_count: 0,
                is_fallback: true,
            }
        }
    };
    processed.is_fallback = true;
    processed
}

/// Rewrites sizing and colors in place. Returns how many text and stroked
/// elements were touched.
pub fn apply_scheme(document: &mut SvgDocument, scheme: &ColorScheme, style: &SvgStyle) -> (usize, usize) {
    let root = document.root_mut();
    if !root.has_attr("viewBox") {
        root.set_attr("viewBox", style.default_view_box.as_str());
    }
    root.set_attr("width", style.width.as_str());
    root.set_attr("height", style.height.as_str());

    let mut text_count = 0usize;
    let mut stroke_count = 0usize;
    root.walk_mut(&mut |el| {
        let is_text = el.local_name() == "text";
        let is_primitive = matches!(el.local_name(), "path" | "circle" | "line");
        if is_text {
            recolor_text(el, scheme, style);
            text_count += 1;
        } else if is_primitive && recolor_stroke(el, scheme, style) {
            stroke_count += 1;
        }
    });
    (text_count, stroke_count)
}

fn recolor_text(el: &mut SvgElement, scheme: &ColorScheme, style: &SvgStyle) {
    el.set_attr("fill", scheme.text_color.as_str());
    el.set_attr("stroke", style.text_outline_color.as_str());
    el.set_attr("stroke-width", style.text_outline_width.as_str());
    el.set_attr("paint-order", "stroke");
    // Inline declarations beat presentation attributes, so they are rewritten too.
    let decls: Option<Vec<(String, String)>> = el.attr("style").map(parse_style);
    if let Some(mut decls) = decls {
        set_decl_if_present(&mut decls, "fill", &scheme.text_color);
        set_decl_if_present(&mut decls, "stroke", &style.text_outline_color);
        set_decl_if_present(&mut decls, "stroke-width", &style.text_outline_width);
        el.set_attr("style", write_style(&decls));
    }
}

fn recolor_stroke(el: &mut SvgElement, scheme: &ColorScheme, style: &SvgStyle) -> bool {
    let attr_stroke = el.attr("stroke").is_some_and(is_painted);
    let mut decls: Vec<(String, String)> = el.attr("style").map(parse_style).unwrap_or_default();
    let style_stroke = decls
        .iter()
        .any(|(name, value)| name == "stroke" && is_painted(value));
    if !attr_stroke && !style_stroke {
        return false;
    }

    if attr_stroke {
        el.set_attr("stroke", scheme.text_color.as_str());
    }
    if style_stroke {
        set_decl_if_present(&mut decls, "stroke", &scheme.text_color);
        el.set_attr("style", write_style(&decls));
    }
    let has_width = el.has_attr("stroke-width") || decls.iter().any(|(name, _)| name == "stroke-width");
    if !has_width {
        el.set_attr("stroke-width", style.default_stroke_width.as_str());
    }
    true
}

fn is_painted(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !value.eq_ignore_ascii_case("none") && !value.eq_ignore_ascii_case("transparent")
}

fn parse_style(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect()
}

fn write_style(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

fn set_decl_if_present(decls: &mut [(String, String)], name: &str, value: &str) {
    for decl in decls.iter_mut().filter(|(key, _)| key == name) {
        decl.1 = value.to_string();
    }
}
