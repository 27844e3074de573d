use crate::error::{HallError, HallResult};
use crate::viewport::Viewport;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Viewports at or below this pixel width count as touch-class devices
pub const TOUCH_WIDTH_PX: f64 = 768.0;

/// Half-extent of the walkable square
pub const DEFAULT_BOUNDS: f64 = 35.0;

/// Command line options
#[derive(Parser, Debug, Clone)]
#[command(name = "hall3d", version, about = "Walk a 3D exhibit hall in your terminal")]
pub struct Cli {
    /// Input device class (auto picks touch for narrow viewports)
    #[arg(long, value_enum, default_value_t = DeviceChoice::Auto)]
    pub device: DeviceChoice,

    /// Frame rate cap
    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// Half-extent of the walkable square
    #[arg(long, default_value_t = DEFAULT_BOUNDS)]
    pub bounds: f64,

    /// Start with the debug overlay visible
    #[arg(long)]
    pub debug: bool,

    /// Write logs to this file (stdout is the render surface)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log verbosity
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceChoice {
    Auto,
    Desktop,
    Touch,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Resolved device class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceTier {
    Desktop,
    Touch,
}

impl DeviceChoice {
    pub fn resolve(self, viewport: &Viewport) -> DeviceTier {
        match self {
            DeviceChoice::Desktop => DeviceTier::Desktop,
            DeviceChoice::Touch => DeviceTier::Touch,
            DeviceChoice::Auto if viewport.width() <= TOUCH_WIDTH_PX => DeviceTier::Touch,
            DeviceChoice::Auto => DeviceTier::Desktop,
        }
    }
}

/// Per-tier performance and feel settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierSettings {
    /// World units per nominal frame
    pub move_speed: f64,
    /// Radians per pixel of pointer movement
    pub mouse_sensitivity: f64,
    /// Radians per pixel of touch drag
    pub touch_sensitivity: f64,
    /// Sphere tessellation for small scene geometry
    pub geometry_segments: u32,
    /// Draw ground shadows under exhibits
    pub shadows: bool,
    /// Supersampling factor per axis (1 = no anti-aliasing)
    pub supersample: usize,
}

impl TierSettings {
    pub fn for_tier(tier: DeviceTier) -> Self {
        match tier {
            DeviceTier::Desktop => TierSettings {
                move_speed: 0.1,
                mouse_sensitivity: 0.002,
                touch_sensitivity: 0.008,
                geometry_segments: 8,
                shadows: true,
                supersample: 2,
            },
            DeviceTier::Touch => TierSettings {
                move_speed: 0.05,
                mouse_sensitivity: 0.002,
                touch_sensitivity: 0.008,
                geometry_segments: 6,
                shadows: false,
                supersample: 1,
            },
        }
    }
}

/// Validated runtime configuration
#[derive(Debug, Clone, PartialEq)]
pub struct HallConfig {
    pub tier: DeviceTier,
    pub settings: TierSettings,
    pub bounds: f64,
    pub frame_interval: Duration,
    pub debug: bool,
}

impl HallConfig {
    pub fn from_cli(cli: &Cli, viewport: &Viewport) -> HallResult<Self> {
        if cli.fps == 0 || cli.fps > 240 {
            return Err(HallError::InvalidConfig(format!(
                "fps must be within 1..=240, got {}",
                cli.fps
            )));
        }
        if !cli.bounds.is_finite() || cli.bounds <= 0.0 {
            return Err(HallError::InvalidConfig(format!(
                "bounds must be a positive number, got {}",
                cli.bounds
            )));
        }

        let tier = cli.device.resolve(viewport);
        Ok(HallConfig {
            tier,
            settings: TierSettings::for_tier(tier),
            bounds: cli.bounds,
            frame_interval: Duration::from_secs_f64(1.0 / cli.fps as f64),
            debug: cli.debug,
        })
    }

    /// Desktop defaults, used when no command line is involved
    #[cfg(test)]
    pub fn desktop() -> Self {
        Self::for_tier(DeviceTier::Desktop)
    }

    #[cfg(test)]
    pub fn for_tier(tier: DeviceTier) -> Self {
        HallConfig {
            tier,
            settings: TierSettings::for_tier(tier),
            bounds: DEFAULT_BOUNDS,
            frame_interval: Duration::from_millis(1000 / 30),
            debug: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["hall3d"];
        full.extend_from_slice(args);
        Cli::parse_from(full)
    }

    #[test]
    fn defaults_parse() {
        let cli = cli(&[]);
        assert_eq!(cli.device, DeviceChoice::Auto);
        assert_eq!(cli.fps, 30);
        assert_eq!(cli.bounds, DEFAULT_BOUNDS);
        assert!(cli.log_file.is_none());
    }

    #[test]
    fn auto_picks_touch_for_narrow_viewports() {
        let narrow = Viewport::new(80, 24);
        let wide = Viewport::new(200, 50);
        assert_eq!(DeviceChoice::Auto.resolve(&narrow), DeviceTier::Touch);
        assert_eq!(DeviceChoice::Auto.resolve(&wide), DeviceTier::Desktop);
        assert_eq!(DeviceChoice::Desktop.resolve(&narrow), DeviceTier::Desktop);
    }

    #[test]
    fn touch_tier_moves_slower() {
        let desktop = TierSettings::for_tier(DeviceTier::Desktop);
        let touch = TierSettings::for_tier(DeviceTier::Touch);
        assert!(touch.move_speed < desktop.move_speed);
        assert!(touch.geometry_segments < desktop.geometry_segments);
        assert_eq!(touch.supersample, 1);
    }

    #[test]
    fn rejects_zero_fps() {
        let result = HallConfig::from_cli(&cli(&["--fps", "0"]), &Viewport::new(200, 50));
        assert!(matches!(result, Err(HallError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_negative_bounds() {
        let result = HallConfig::from_cli(&cli(&["--bounds=-3"]), &Viewport::new(200, 50));
        assert!(matches!(result, Err(HallError::InvalidConfig(_))));
    }

    #[test]
    fn explicit_device_overrides_viewport() {
        let config =
            HallConfig::from_cli(&cli(&["--device", "touch"]), &Viewport::new(200, 50)).unwrap();
        assert_eq!(config.tier, DeviceTier::Touch);
        assert_eq!(config.settings.move_speed, 0.05);
    }
}
