use crate::compat::CompatibilityTable;
use crate::config::{Config, load_config};
use crate::process::process_svg;
use crate::render::{write_output_png, write_output_svg};
use crate::session::{Customization, FileAssetSource, PreviewSession, QuizAnswers};
use crate::theme::Tier;
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use futures::executor::block_on;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "starbook", version, about = "Astrology book cover compositor")]
pub struct Args {
    /// Config JSON file (schemes, svg style, cover layout)
    #[arg(short = 'c', long = "configFile", global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compose a full book cover
    Cover(CoverArgs),
    /// Recolor a chart SVG with a scheme
    Process(ProcessArgs),
    /// Look up compatibility between two signs
    Compat(CompatArgs),
    /// List available color schemes
    Schemes,
}

#[derive(clap::Args, Debug)]
pub struct CoverArgs {
    #[arg(long)]
    pub name: String,

    /// Birth date as YYYY-MM-DD
    #[arg(long = "birth-date")]
    pub birth_date: String,

    /// Local birth time, e.g. 14:30
    #[arg(long = "birth-time")]
    pub birth_time: Option<String>,

    #[arg(long = "birth-place")]
    pub birth_place: String,

    /// Color scheme key. Defaults to the configured default scheme.
    #[arg(short = 's', long)]
    pub scheme: Option<String>,

    /// Natal chart SVG. The placeholder chart is used when omitted or unreadable.
    #[arg(long)]
    pub chart: Option<PathBuf>,

    /// Decorative cover design SVG
    #[arg(long)]
    pub design: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct ProcessArgs {
    /// Input file (.svg) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    #[arg(short = 's', long)]
    pub scheme: Option<String>,

    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct CompatArgs {
    pub sign_a: String,
    pub sign_b: String,

    /// Print the full entry as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Cover(cover) => run_cover(&config, cover),
        Command::Process(process) => run_process(&config, process),
        Command::Compat(compat) => run_compat(compat),
        Command::Schemes => run_schemes(&config),
    }
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run_cover(config: &Config, args: CoverArgs) -> Result<()> {
    let mut compositor = config.compositor();
    if matches!(args.output_format, OutputFormat::Png) {
        // Keyframes start text at opacity 0, which a rasterizer would freeze.
        compositor.layout_mut().animate = false;
    }

    let (birth_year, birth_month, birth_day) = parse_birth_date(&args.birth_date)?;
    let answers = QuizAnswers {
        name: args.name,
        birth_year,
        birth_month,
        birth_day,
        birth_time: args.birth_time,
        birth_place: args.birth_place,
    };
    let customization = Customization {
        color_scheme: args
            .scheme
            .unwrap_or_else(|| config.theme.default_scheme.clone()),
        cover_design: args.design.map(|path| path.to_string_lossy().into_owned()),
    };
    let source = FileAssetSource {
        chart_path: args.chart,
        design_dir: None,
    };

    let mut session = PreviewSession::new(compositor, answers, customization)?;
    block_on(session.refresh(&source))?;
    let svg = session.render()?;

    match args.output_format {
        OutputFormat::Svg => write_output_svg(&svg, args.output.as_deref()),
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_output_png(&svg, &output, &config.render)
        }
    }
}

fn parse_birth_date(raw: &str) -> Result<(i32, u32, u32)> {
    let invalid = || anyhow::anyhow!("Invalid birth date `{raw}`, expected YYYY-MM-DD");
    let mut parts = raw.trim().splitn(3, '-');
    let year = parts.next().and_then(|v| v.parse().ok()).ok_or_else(invalid)?;
    let month: u32 = parts.next().and_then(|v| v.parse().ok()).ok_or_else(invalid)?;
    let day: u32 = parts.next().and_then(|v| v.parse().ok()).ok_or_else(invalid)?;
    if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
        return Err(invalid());
    }
    Ok((year, month, day))
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

fn run_process(config: &Config, args: ProcessArgs) -> Result<()> {
    let input = read_input(args.input.as_deref())?;
    let registry = config.registry();
    let key = args.scheme.as_deref().unwrap_or(&config.theme.default_scheme);
    let scheme = registry.get(key)?;
    let processed = process_svg(&input, scheme, &config.svg)?;
    write_output_svg(processed.as_str(), args.output.as_deref())
}

fn run_compat(args: CompatArgs) -> Result<()> {
    let table = CompatibilityTable::builtin()?;
    let entry = table.lookup(&args.sign_a, &args.sign_b).ok_or_else(|| {
        anyhow::anyhow!(
            "No compatibility entry for `{}` and `{}`",
            args.sign_a,
            args.sign_b
        )
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(entry)?);
        return Ok(());
    }

    println!("{} + {}: {}/10 ({})", args.sign_a.trim(), args.sign_b.trim(), entry.score, entry.element);
    println!("{}", entry.summary);
    let ratings = &entry.compatibility;
    println!(
        "emotional {}  physical {}  intellectual {}  overall {}",
        ratings.emotional, ratings.physical, ratings.intellectual, ratings.overall
    );
    println!("advice: {}", entry.advice);
    Ok(())
}

fn run_schemes(config: &Config) -> Result<()> {
    let registry = config.registry();
    for (key, tier, scheme) in registry.iter() {
        let tier = match tier {
            Tier::Standard => "standard",
            Tier::Premium => "premium",
        };
        let marker = if key == config.theme.default_scheme { "*" } else { " " };
        println!("{marker} {key:<18} {tier:<9} {}", scheme.name);
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(std::fs::read_to_string(path)?);
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_cover_command() {
        let args = Args::try_parse_from([
            "starbook",
            "-c",
            "cfg.json",
            "cover",
            "--name",
            "Jane Doe",
            "--birth-date",
            "1990-03-14",
            "--birth-place",
            "Lisbon",
            "-s",
            "celestial-gold",
            "-e",
            "png",
            "-o",
            "out.png",
        ])
        .unwrap();
        assert_eq!(args.config.as_deref(), Some(Path::new("cfg.json")));
        match args.command {
            Command::Cover(cover) => {
                assert_eq!(cover.name, "Jane Doe");
                assert_eq!(cover.scheme.as_deref(), Some("celestial-gold"));
                assert!(matches!(cover.output_format, OutputFormat::Png));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_compat_and_verbosity() {
        let args = Args::try_parse_from(["starbook", "compat", "aries", "leo", "--json", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
        assert!(matches!(
            args.command,
            Command::Compat(CompatArgs { json: true, .. })
        ));
    }

    #[test]
    fn parses_iso_birth_dates() {
        assert_eq!(parse_birth_date("1990-03-14").unwrap(), (1990, 3, 14));
        assert_eq!(parse_birth_date(" 2001-12-01 ").unwrap(), (2001, 12, 1));
        assert!(parse_birth_date("March 14, 1990").is_err());
        assert!(parse_birth_date("1990-13-01").is_err());
        assert!(parse_birth_date("1990-03").is_err());
    }

    #[test]
    fn rejects_days_past_month_end() {
        assert!(parse_birth_date("1990-02-31").is_err());
        assert!(parse_birth_date("1990-04-31").is_err());
        assert!(parse_birth_date("1990-02-29").is_err());
        assert!(parse_birth_date("1900-02-29").is_err());
        assert_eq!(parse_birth_date("2000-02-29").unwrap(), (2000, 2, 29));
        assert_eq!(parse_birth_date("1992-02-29").unwrap(), (1992, 2, 29));
        assert_eq!(parse_birth_date("1990-12-31").unwrap(), (1990, 12, 31));
    }

    #[test]
    fn png_requires_output_path() {
        assert!(ensure_output(&None, "png").is_err());
        assert_eq!(
            ensure_output(&Some(PathBuf::from("a.png")), "png").unwrap(),
            PathBuf::from("a.png")
        );
    }
}
