use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use starbook::compat::CompatibilityTable;
use starbook::cover::{Compositor, CoverInputs, CoverLayout};
use starbook::process::{SvgStyle, process_svg};
use starbook::theme::SchemeRegistry;
use starbook::zodiac::Sign;
use std::hint::black_box;

/// A wheel with `spokes` stroked lines and one glyph per spoke.
fn dense_chart_source(spokes: usize) -> String {
    let mut out = String::from(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 800 800\"><g fill=\"none\">",
    );
    for i in 0..spokes {
        let angle = (i as f32 / spokes.max(1) as f32) * std::f32::consts::TAU;
        let (x, y) = (400.0 + 380.0 * angle.cos(), 400.0 + 380.0 * angle.sin());
        out.push_str(&format!(
            "<line x1=\"400\" y1=\"400\" x2=\"{x:.2}\" y2=\"{y:.2}\" stroke=\"#333\"/>"
        ));
        out.push_str(&format!(
            "<text x=\"{x:.2}\" y=\"{y:.2}\" style=\"fill: #000; font-size: 12px\">{i}</text>"
        ));
    }
    out.push_str("</g></svg>");
    out
}

fn fixture(name: &str) -> &'static str {
    match name {
        "natal_wheel" => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/natal_wheel.svg"
        )),
        "no_viewbox" => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/no_viewbox.svg"
        )),
        "starfield_design" => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/starfield_design.svg"
        )),
        _ => panic!("unknown fixture {name}"),
    }
}

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_svg");
    let registry = SchemeRegistry::builtin();
    let scheme = registry.get("cosmic-blue").expect("builtin scheme");
    let style = SvgStyle::default();

    let mut inputs: Vec<(String, String)> = ["natal_wheel", "no_viewbox"]
        .iter()
        .map(|name| (name.to_string(), fixture(name).to_string()))
        .collect();
    for spokes in [12, 144, 1024] {
        inputs.push((format!("dense_{spokes}"), dense_chart_source(spokes)));
    }

    for (name, input) in &inputs {
        group.bench_with_input(BenchmarkId::from_parameter(name), input, |b, data| {
            b.iter(|| {
                let processed = process_svg(black_box(data), scheme, &style).expect("process failed");
                black_box(processed.as_str().len());
            });
        });
    }
    group.finish();
}

fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose_cover");
    let compositor = Compositor::new(
        SchemeRegistry::builtin(),
        SvgStyle::default(),
        CoverLayout::default(),
    );
    let base = CoverInputs {
        name: "Jane Doe".to_string(),
        birth_date: "March 14, 1990".to_string(),
        birth_place: "Lisbon, Portugal".to_string(),
        color_scheme_key: "celestial-gold".to_string(),
        chart_svg: Some(fixture("natal_wheel").to_string()),
        cover_design_svg: None,
    };
    let with_design = CoverInputs {
        cover_design_svg: Some(fixture("starfield_design").to_string()),
        ..base.clone()
    };
    let fallback = CoverInputs {
        chart_svg: None,
        ..base.clone()
    };

    for (name, inputs) in [
        ("chart", &base),
        ("chart_and_design", &with_design),
        ("fallback", &fallback),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), inputs, |b, data| {
            b.iter(|| {
                let svg = compositor.compose(black_box(data)).expect("compose failed");
                black_box(svg.len());
            });
        });
    }
    group.finish();
}

fn bench_compat(c: &mut Criterion) {
    let table = CompatibilityTable::builtin().expect("bundled table");
    c.bench_function("compat_lookup_all_pairs", |b| {
        b.iter(|| {
            let mut total = 0u32;
            for from in Sign::ALL {
                for to in Sign::ALL {
                    total += table.get(from, to).map(|e| e.score as u32).unwrap_or(0);
                }
            }
            black_box(total);
        });
    });
    c.bench_function("compat_lookup_by_name", |b| {
        b.iter(|| black_box(table.lookup(black_box("Scorpio"), black_box("pisces"))));
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_process, bench_compose, bench_compat
);
criterion_main!(benches);
