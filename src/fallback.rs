//! Placeholder natal chart used whenever a real chart is missing, fails to
//! load, or fails to parse.
//!
//! Every stroked primitive carries an explicit `stroke` attribute so the SVG
//! processor recolors the placeholder like any real chart.

use crate::gradient::fmt_num;
use crate::zodiac::Sign;
use once_cell::sync::Lazy;

const SIZE: f32 = 800.0;
const CENTER: f32 = SIZE / 2.0;
const OUTER_R: f32 = 380.0;
const SIGN_RING_R: f32 = 320.0;
const HOUSE_RING_R: f32 = 260.0;
const INNER_R: f32 = 110.0;
const GLYPH_R: f32 = 350.0;

static FALLBACK_CHART: Lazy<String> = Lazy::new(build_fallback_chart);

pub fn fallback_chart() -> &'static str {
    FALLBACK_CHART.as_str()
}

fn polar(radius: f32, deg: f32) -> (f32, f32) {
    // 0deg sits at nine o'clock and signs run counter-clockwise, as on a natal wheel.
    let rad = (180.0 - deg).to_radians();
    (CENTER + radius * rad.cos(), CENTER - radius * rad.sin())
}

fn build_fallback_chart() -> String {
    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {s} {s}\" width=\"{s}\" height=\"{s}\">",
        s = fmt_num(SIZE)
    ));
    svg.push_str("<g class=\"wheel\" fill=\"none\">");
    for radius in [OUTER_R, SIGN_RING_R, HOUSE_RING_R, INNER_R] {
        svg.push_str(&format!(
            "<circle cx=\"{c}\" cy=\"{c}\" r=\"{}\" stroke=\"#cccccc\" stroke-width=\"2\"/>",
            fmt_num(radius),
            c = fmt_num(CENTER)
        ));
    }

    for idx in 0..12 {
        let deg = idx as f32 * 30.0;
        let (x1, y1) = polar(SIGN_RING_R, deg);
        let (x2, y2) = polar(OUTER_R, deg);
        svg.push_str(&format!(
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#cccccc\" stroke-width=\"1.5\"/>",
            fmt_num(x1),
            fmt_num(y1),
            fmt_num(x2),
            fmt_num(y2)
        ));
        let (hx1, hy1) = polar(INNER_R, deg + 15.0);
        let (hx2, hy2) = polar(HOUSE_RING_R, deg + 15.0);
        svg.push_str(&format!(
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#cccccc\" stroke-width=\"1\"/>",
            fmt_num(hx1),
            fmt_num(hy1),
            fmt_num(hx2),
            fmt_num(hy2)
        ));
    }
    svg.push_str("</g>");

    svg.push_str("<g class=\"signs\" font-family=\"serif\" font-size=\"28\" text-anchor=\"middle\" dominant-baseline=\"central\">");
    for sign in Sign::ALL {
        let (x, y) = polar(GLYPH_R, sign.index() as f32 * 30.0 + 15.0);
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" fill=\"#cccccc\">{}</text>",
            fmt_num(x),
            fmt_num(y),
            sign.glyph()
        ));
    }
    svg.push_str("</g>");

    // Decorative aspect web between evenly spaced points on the inner ring.
    let points: Vec<(f32, f32)> = [20.0, 95.0, 140.0, 215.0, 260.0, 330.0]
        .iter()
        .map(|deg| polar(HOUSE_RING_R - 10.0, *deg))
        .collect();
    let mut d = String::new();
    for (idx, (x, y)) in points.iter().enumerate() {
        let cmd = if idx == 0 { "M" } else { "L" };
        d.push_str(&format!("{cmd} {} {} ", fmt_num(*x), fmt_num(*y)));
    }
    d.push('Z');
    svg.push_str(&format!(
        "<path class=\"aspects\" d=\"{d}\" fill=\"none\" stroke=\"#cccccc\" stroke-width=\"1\" stroke-dasharray=\"4 4\"/>"
    ));

    svg.push_str(&format!(
        "<text x=\"{c}\" y=\"{c}\" fill=\"#cccccc\" font-family=\"serif\" font-size=\"22\" text-anchor=\"middle\" dominant-baseline=\"central\">Natal Chart</text>",
        c = fmt_num(CENTER)
    ));
    svg.push_str("</svg>");
    svg
}
