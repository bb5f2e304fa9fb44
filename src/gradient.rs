//! CSS `linear-gradient(...)` values converted to SVG `<linearGradient>` definitions.
//!
//! Color schemes describe their backgrounds the way a stylesheet would. The
//! cover is a standalone SVG, so the gradient is re-expressed as a gradient
//! def in object-bounding-box units.

use crate::error::{Error, Result};
use crate::svgdom::escape_xml;
use once_cell::sync::Lazy;
use regex::Regex;

static ANGLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(-?\d+(?:\.\d+)?)(deg|turn)$").unwrap());
static COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(#[0-9a-fA-F]{3}|#[0-9a-fA-F]{4}|#[0-9a-fA-F]{6}|#[0-9a-fA-F]{8}|rgba?\([^()]*\)|hsla?\([^()]*\)|[a-zA-Z]+)$",
    )
    .unwrap()
});

#[derive(Debug, Clone, PartialEq)]
pub struct GradientStop {
    /// Position along the gradient line, 0.0 to 1.0.
    pub offset: f32,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    /// CSS convention: 0deg points up, angles grow clockwise.
    pub angle_deg: f32,
    pub stops: Vec<GradientStop>,
}

/// Hex, `rgb[a]()`, `hsl[a]()` or a named color. Markup characters are never accepted.
pub fn is_css_color(value: &str) -> bool {
    COLOR_RE.is_match(value) && !value.contains(['"', '\'', '<', '>', '&'])
}

pub fn parse_css_gradient(input: &str) -> Result<LinearGradient> {
    let fail = |message: &str| Error::Gradient {
        input: input.to_string(),
        message: message.to_string(),
    };

    let trimmed = input.trim();
    let body = trimmed
        .strip_prefix("linear-gradient(")
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| fail("expected linear-gradient(...)"))?;

    let mut args = split_top_level(body);
    if args.is_empty() {
        return Err(fail("empty gradient"));
    }

    let mut angle_deg = 180.0;
    if let Some(angle) = parse_direction(args[0]) {
        angle_deg = angle;
        args.remove(0);
    } else if args[0].starts_with("to ") {
        return Err(fail("unknown side keyword"));
    }

    let mut raw_stops: Vec<(String, Option<f32>)> = Vec::new();
    for arg in args {
        let (color, position) = split_stop(arg);
        if !is_css_color(color) {
            return Err(fail(&format!("invalid color `{color}`")));
        }
        let position = match position {
            Some(raw) => Some(parse_percent(raw).ok_or_else(|| fail("invalid stop position"))?),
            None => None,
        };
        raw_stops.push((color.to_string(), position));
    }

    if raw_stops.len() < 2 {
        return Err(fail("at least two color stops are required"));
    }

    Ok(LinearGradient {
        angle_deg,
        stops: resolve_offsets(raw_stops),
    })
}

impl LinearGradient {
    /// Endpoints of the gradient line in object-bounding-box units.
    pub fn endpoints(&self) -> ((f32, f32), (f32, f32)) {
        let rad = self.angle_deg.to_radians();
        let dx = rad.sin() / 2.0;
        let dy = -rad.cos() / 2.0;
        ((0.5 - dx, 0.5 - dy), (0.5 + dx, 0.5 + dy))
    }

    pub fn to_svg_def(&self, id: &str) -> String {
        let ((x1, y1), (x2, y2)) = self.endpoints();
        let mut def = format!(
            "<linearGradient id=\"{id}\" x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\">",
            fmt_num(x1),
            fmt_num(y1),
            fmt_num(x2),
            fmt_num(y2)
        );
        for stop in &self.stops {
            def.push_str(&format!(
                "<stop offset=\"{}%\" stop-color=\"{}\"/>",
                fmt_num(stop.offset * 100.0),
                escape_xml(&stop.color)
            ));
        }
        def.push_str("</linearGradient>");
        def
    }
}

fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (idx, ch) in body.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(body[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    let tail = body[start..].trim();
    if !tail.is_empty() {
        parts.push(tail);
    }
    parts
}

fn parse_direction(arg: &str) -> Option<f32> {
    if let Some(caps) = ANGLE_RE.captures(arg) {
        let value: f32 = caps[1].parse().ok()?;
        return Some(if &caps[2] == "turn" { value * 360.0 } else { value });
    }
    let side = arg.strip_prefix("to ")?;
    let mut words: Vec<&str> = side.split_whitespace().collect();
    words.sort_unstable();
    match words.as_slice() {
        ["top"] => Some(0.0),
        ["right", "top"] => Some(45.0),
        ["right"] => Some(90.0),
        ["bottom", "right"] => Some(135.0),
        ["bottom"] => Some(180.0),
        ["bottom", "left"] => Some(225.0),
        ["left"] => Some(270.0),
        ["left", "top"] => Some(315.0),
        _ => None,
    }
}

fn split_stop(arg: &str) -> (&str, Option<&str>) {
    if arg.ends_with('%') {
        if let Some(idx) = arg.rfind(char::is_whitespace) {
            return (arg[..idx].trim(), Some(arg[idx..].trim()));
        }
    }
    (arg, None)
}

fn parse_percent(raw: &str) -> Option<f32> {
    let value: f32 = raw.strip_suffix('%')?.trim().parse().ok()?;
    Some((value / 100.0).clamp(0.0, 1.0))
}

fn resolve_offsets(raw: Vec<(String, Option<f32>)>) -> Vec<GradientStop> {
    let count = raw.len();
    let mut offsets: Vec<Option<f32>> = raw.iter().map(|(_, pos)| *pos).collect();
    if offsets[0].is_none() {
        offsets[0] = Some(0.0);
    }
    if offsets[count - 1].is_none() {
        offsets[count - 1] = Some(1.0);
    }

    let mut idx = 1;
    while idx < count {
        if offsets[idx].is_some() {
            idx += 1;
            continue;
        }
        let prev = idx - 1;
        let mut next = idx;
        while offsets[next].is_none() {
            next += 1;
        }
        let start = offsets[prev].unwrap_or(0.0);
        let end = offsets[next].unwrap_or(1.0);
        let span = (next - prev) as f32;
        for (step, slot) in offsets.iter_mut().enumerate().take(next).skip(idx) {
            *slot = Some(start + (end - start) * (step - prev) as f32 / span);
        }
        idx = next + 1;
    }

    // Stops never move backwards along the line.
    let mut last = 0.0f32;
    raw.into_iter()
        .zip(offsets)
        .map(|((color, _), offset)| {
            let offset = offset.unwrap_or(last).max(last);
            last = offset;
            GradientStop { offset, color }
        })
        .collect()
}

pub(crate) fn fmt_num(value: f32) -> String {
    let mut out = format!("{value:.4}");
    if out.contains('.') {
        while out.ends_with('0') {
            out.pop();
        }
        if out.ends_with('.') {
            out.pop();
        }
    }
    if out == "-0" {
        out = "0".to_string();
    }
    out
}
