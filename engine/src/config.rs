use crate::compositor::BackgroundSpec;
use crate::layout::GridSpec;
use crate::setter::DesktopSetter;
use crate::validate_enum;
use anyhow::{Context, Result};
use common::{FetchQuery, GridMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralSettings,

    #[serde(default)]
    pub source: SourceSettings,

    #[serde(default)]
    pub grid: GridSettings,

    #[serde(default)]
    pub output: OutputSettings,

    #[serde(default)]
    pub download: DownloadSettings,
}

/// General settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralSettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Media provider settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceSettings {
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default)]
    pub profile: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub tag: Option<String>,

    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            profile: String::new(),
            api_key: String::new(),
            tag: None,
            limit: default_limit(),
        }
    }
}

fn default_provider() -> String {
    "instagram".to_string()
}
fn default_limit() -> usize {
    20
}

/// Grid layout settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GridSettings {
    #[serde(default)]
    pub mode: GridMode,

    /// Tile edge length in pixels
    #[serde(default = "default_grid_size")]
    pub size: u32,

    #[serde(default = "default_spacing")]
    pub spacing: u32,

    #[serde(default = "default_columns")]
    pub columns: usize,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            mode: GridMode::default(),
            size: default_grid_size(),
            spacing: default_spacing(),
            columns: default_columns(),
        }
    }
}

fn default_grid_size() -> u32 {
    212
}
fn default_spacing() -> u32 {
    10
}
fn default_columns() -> usize {
    5
}

/// Rendered wallpaper settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputSettings {
    /// Wallpaper size as `<width>x<height>`
    #[serde(default = "default_size")]
    pub size: String,

    /// JPEG quality (1-100)
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Background hex color
    #[serde(default = "default_background")]
    pub background: String,

    /// Image tiled across the background instead of the flat color
    #[serde(default)]
    pub pattern: Option<String>,

    /// Cache and wallpaper directory
    #[serde(default)]
    pub cache_dir: Option<String>,

    #[serde(default)]
    pub set_wallpaper: bool,

    #[serde(default = "default_setter")]
    pub setter: String,

    #[serde(default)]
    pub set_lock_screen: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            size: default_size(),
            quality: default_quality(),
            background: default_background(),
            pattern: None,
            cache_dir: None,
            set_wallpaper: false,
            setter: default_setter(),
            set_lock_screen: false,
        }
    }
}

fn default_size() -> String {
    "1920x1080".to_string()
}
fn default_quality() -> u8 {
    90
}
fn default_background() -> String {
    "FFFFFF".to_string()
}
fn default_setter() -> String {
    if cfg!(target_os = "macos") {
        "macos".to_string()
    } else {
        "gnome3".to_string()
    }
}

/// Download phase settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadSettings {
    /// Maximum number of photos fetched at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_concurrency() -> usize {
    8
}
fn default_timeout() -> u64 {
    30
}

/// Fully resolved, immutable settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub provider: String,
    pub api_key: String,
    pub query: FetchQuery,
    pub mode: GridMode,
    pub grid: GridSpec,
    pub quality: u8,
    pub background: BackgroundSpec,
    pub cache_dir: PathBuf,
    pub concurrency: usize,
    pub timeout: Duration,
    pub setter: Option<DesktopSetter>,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    ///
    /// The result is not validated yet: command line overrides are applied
    /// first and [`Config::resolve`] validates the merged value.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded configuration from {}", path.display());

        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("tilewall");

        Ok(config_dir.join("config.toml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        validate_enum!(
            "log level",
            self.general.log_level.as_str(),
            "trace",
            "debug",
            "info",
            "warn",
            "error"
        )?;

        validate_enum!(
            "provider",
            self.source.provider.as_str(),
            "instagram",
            "500px",
            "tumblr"
        )?;

        if self.source.profile.trim().is_empty() {
            anyhow::bail!("\"profile\" not specified");
        }

        if self.source.limit == 0 {
            anyhow::bail!("Limit must be at least 1");
        }

        if self.grid.size == 0 {
            anyhow::bail!("Grid size must be positive");
        }

        if self.grid.columns == 0 {
            anyhow::bail!("Number of columns must be at least 1");
        }

        if common::parse_size(&self.output.size).is_none() {
            anyhow::bail!(
                "Invalid size: {} (expected <width>x<height>)",
                self.output.size
            );
        }

        if common::parse_hex_color(&self.output.background).is_none() {
            anyhow::bail!(
                "Background color not in hex format: {}",
                self.output.background
            );
        }

        if !(1..=100).contains(&self.output.quality) {
            anyhow::bail!("Invalid quality (must be 1-100): {}", self.output.quality);
        }

        validate_enum!("setter", self.output.setter.as_str(), "gnome", "gnome3", "macos")?;

        if self.download.concurrency == 0 {
            anyhow::bail!("Download concurrency must be at least 1");
        }

        Ok(())
    }

    /// Resolve the cache directory, expanding `~`
    pub fn cache_dir(&self) -> Result<PathBuf> {
        match &self.output.cache_dir {
            Some(dir) => Ok(PathBuf::from(shellexpand::tilde(dir).as_ref())),
            None => Ok(dirs::cache_dir()
                .context("Failed to get cache directory")?
                .join("tilewall")),
        }
    }

    /// Validate and freeze the configuration into run settings
    pub fn resolve(&self) -> Result<Settings> {
        self.validate()?;

        let (width, height) =
            common::parse_size(&self.output.size).context("Invalid output size")?;

        let background = match &self.output.pattern {
            Some(pattern) => {
                BackgroundSpec::Pattern(PathBuf::from(shellexpand::tilde(pattern).as_ref()))
            }
            None => {
                let (r, g, b, a) = common::parse_hex_color(&self.output.background)
                    .context("Invalid background color")?;
                BackgroundSpec::Color([r, g, b, a])
            }
        };

        let setter = if self.output.set_wallpaper {
            Some(
                DesktopSetter::from_name(&self.output.setter, self.output.set_lock_screen)
                    .with_context(|| format!("Unknown setter: {}", self.output.setter))?,
            )
        } else {
            None
        };

        Ok(Settings {
            provider: self.source.provider.clone(),
            api_key: self.source.api_key.clone(),
            query: FetchQuery {
                profile: self.source.profile.clone(),
                size: self.grid.size,
                tag: self.source.tag.clone().filter(|t| !t.is_empty()),
                limit: self.source.limit,
                square: self.grid.mode.is_square(),
            },
            mode: self.grid.mode,
            grid: GridSpec {
                canvas_width: width,
                canvas_height: height,
                tile: self.grid.size,
                spacing: self.grid.spacing,
                columns: self.grid.columns,
            },
            quality: self.output.quality,
            background,
            cache_dir: self.cache_dir()?,
            concurrency: self.download.concurrency,
            timeout: Duration::from_secs(self.download.timeout_secs),
            setter,
        })
    }
}
