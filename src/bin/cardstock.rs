use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "cardstock", version)]
struct Cli {
    /// Log pipeline progress to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a layout to an image file.
    Render(RenderArgs),
    /// List registered themes, or print one theme's flattened tokens.
    Themes(ThemesArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Layout JSON file.
    #[arg(long)]
    layout: PathBuf,

    /// Data JSON file (a flat object).
    #[arg(long)]
    data: Option<PathBuf>,

    /// Output image path.
    #[arg(long)]
    out: PathBuf,

    /// Theme name. Defaults to the active theme.
    #[arg(long)]
    theme: Option<String>,

    /// Output format. Inferred from the output extension when omitted.
    #[arg(long, value_enum)]
    format: Option<FormatChoice>,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 300)]
    height: u32,

    #[arg(long, default_value_t = 1.0)]
    dpi: f64,

    /// JPEG quality (1-100).
    #[arg(long, default_value_t = 90)]
    quality: u8,

    /// Fail on the first asset that cannot be loaded.
    #[arg(long)]
    strict_assets: bool,
}

#[derive(Parser, Debug)]
struct ThemesArgs {
    /// Print the flattened tokens of this theme.
    #[arg(long)]
    tokens: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Png,
    Jpeg,
    Webp,
}

impl FormatChoice {
    fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Themes(args) => cmd_themes(args),
    }
}

fn read_json(path: &Path, what: &str) -> anyhow::Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read {what} '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse {what} JSON"))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let layout = read_json(&args.layout, "layout")?;
    let data: cardstock::TokenMap = match &args.data {
        Some(p) => serde_json::from_value(read_json(p, "data")?)
            .with_context(|| "data must be a JSON object")?,
        None => cardstock::TokenMap::new(),
    };

    let format = match args.format {
        Some(f) => f.as_str().to_owned(),
        None => args
            .out
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("png")
            .to_owned(),
    };

    let mut opts = cardstock::EngineOpts::from_env();
    if std::env::var_os("CARDSTOCK_ASSET_ROOT").is_none()
        && let Some(parent) = args.layout.parent()
    {
        opts.loader.asset_root = parent.to_path_buf();
    }
    let engine = cardstock::CardEngine::new(opts);

    let options = cardstock::RenderOptions {
        width: args.width,
        height: args.height,
        dpi: args.dpi,
        theme: args.theme,
        format,
        quality: args.quality,
        throw_on_asset_error: args.strict_assets,
    };
    let output = engine.render(layout, &data, &options)?;
    for failure in &output.asset_errors {
        eprintln!("warning: asset '{}' failed: {}", failure.url, failure.error);
    }

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, &output.buffer)
        .with_context(|| format!("write '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({}x{} {})",
        args.out.display(),
        output.width,
        output.height,
        output.format.as_str()
    );
    Ok(())
}

fn cmd_themes(args: ThemesArgs) -> anyhow::Result<()> {
    let engine = cardstock::CardEngine::new(cardstock::EngineOpts {
        system_fonts: false,
        ..cardstock::EngineOpts::from_env()
    });
    match args.tokens {
        Some(name) => {
            let tokens = engine.theme_tokens(&name);
            println!("{}", serde_json::to_string_pretty(&tokens)?);
        }
        None => {
            let active = engine.active_theme();
            for name in engine.theme_names() {
                let marker = if name == active { " (active)" } else { "" };
                println!("{name}{marker}");
            }
        }
    }
    Ok(())
}
