use anyhow::{Context, Result};
use clap::Parser;
use common::GridMode;
use engine::{Config, HttpTransport, Provider, pipeline};
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "tilewall")]
#[command(about = "Build a photo grid wallpaper from a profile's recent photos", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// User profile name (500px: <feature> or user:<username>)
    #[arg(long)]
    profile: Option<String>,

    /// Photo provider (instagram, 500px, tumblr)
    #[arg(long)]
    provider: Option<String>,

    /// API key of the provider
    #[arg(long, env = "TILEWALL_API_KEY")]
    api_key: Option<String>,

    /// Only use photos with this tag
    #[arg(long)]
    tag: Option<String>,

    /// Maximum number of photos
    #[arg(long)]
    limit: Option<usize>,

    /// Cache and wallpaper directory
    #[arg(long)]
    dir: Option<String>,

    /// Background hex color
    #[arg(long)]
    bg: Option<String>,

    /// Image tiled as background instead of the color
    #[arg(long)]
    pattern: Option<String>,

    /// Wallpaper size (<width>x<height>)
    #[arg(long)]
    size: Option<String>,

    /// Grid size
    #[arg(long)]
    grid: Option<u32>,

    /// Space between images
    #[arg(long)]
    spacing: Option<u32>,

    /// Number of image columns
    #[arg(long)]
    cols: Option<usize>,

    /// Output JPEG quality (1-100)
    #[arg(short, long)]
    quality: Option<u8>,

    /// Keep the aspect ratio of the photos instead of square tiles
    #[arg(long)]
    justified: bool,

    /// Maximum number of simultaneous downloads
    #[arg(long)]
    concurrency: Option<usize>,

    /// Set the system wallpaper
    #[arg(long)]
    set: bool,

    /// Desktop used to set the wallpaper (gnome, gnome3, macos)
    #[arg(long)]
    setter: Option<String>,

    /// Also set the lock screen image (gnome3)
    #[arg(long)]
    set_lock_screen: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Overlay the flags that were given onto `config`
    fn apply(self, config: &mut Config) {
        if let Some(level) = self.log_level {
            config.general.log_level = level;
        }

        if let Some(provider) = self.provider {
            config.source.provider = provider;
        }
        if let Some(profile) = self.profile {
            config.source.profile = profile;
        }
        if let Some(api_key) = self.api_key {
            config.source.api_key = api_key;
        }
        if let Some(tag) = self.tag {
            config.source.tag = Some(tag);
        }
        if let Some(limit) = self.limit {
            config.source.limit = limit;
        }

        if self.justified {
            config.grid.mode = GridMode::Justified;
        }
        if let Some(size) = self.grid {
            config.grid.size = size;
        }
        if let Some(spacing) = self.spacing {
            config.grid.spacing = spacing;
        }
        if let Some(cols) = self.cols {
            config.grid.columns = cols;
        }

        if let Some(dir) = self.dir {
            config.output.cache_dir = Some(dir);
        }
        if let Some(bg) = self.bg {
            config.output.background = bg;
        }
        if let Some(pattern) = self.pattern {
            config.output.pattern = Some(pattern);
        }
        if let Some(size) = self.size {
            config.output.size = size;
        }
        if let Some(quality) = self.quality {
            config.output.quality = quality;
        }
        if self.set {
            config.output.set_wallpaper = true;
        }
        if let Some(setter) = self.setter {
            config.output.setter = setter;
        }
        if self.set_lock_screen {
            config.output.set_lock_screen = true;
        }

        if let Some(concurrency) = self.concurrency {
            config.download.concurrency = concurrency;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_config_path()?,
    };
    let mut config = Config::load_from_path(&config_path)?;
    cli.apply(&mut config);

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.general.log_level.as_str()),
    )
    .init();

    log::info!("Starting tilewall v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Configuration file {}", config_path.display());

    let settings = config.resolve()?;

    let transport =
        HttpTransport::new(settings.timeout).context("Failed to create the HTTP client")?;
    let provider = Provider::new(&settings.provider, &settings.api_key, transport.client().clone())
        .with_context(|| format!("Unknown provider: {}", settings.provider))?;

    log::info!(
        "Using {} profile {:?} ({} grid)",
        provider.name(),
        settings.query.profile,
        settings.mode.name()
    );

    let summary = pipeline::run(&settings, &provider, &transport)
        .await
        .context("Fatal")?;

    if let Some(path) = &summary.wallpaper {
        log::info!(
            "Placed {} of {} images ({} downloaded, {} cached, {} failed, {} removed)",
            summary.placed,
            summary.fetched,
            summary.downloaded,
            summary.cached,
            summary.failed,
            summary.evicted
        );
        println!("{}", path.display());
    }

    Ok(())
}
