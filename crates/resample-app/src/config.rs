use anyhow::{Context, Result};
use clap::Parser;
use resample_core::{
    AddressMode, ConfigError, FilterMode, FullscreenGeometry, SamplerConfig, TILE_SIZE,
};
use resample_gpu::ResamplePass;

use crate::input::{MAX_SCALE, MIN_SCALE};

#[derive(Debug, Clone, Parser)]
#[command(name = "resample", version, about = "Tiled supersampled scene, downscaled by a fullscreen resample pass")]
struct Args {
    /// Sampler filter used for the downscale (`linear` or `nearest`).
    ///
    /// Environment variable: `RESAMPLE_FILTER`.
    #[arg(long, env = "RESAMPLE_FILTER", default_value = "linear")]
    filter: String,

    /// Address mode applied to both axes (`clamp`, `repeat` or `mirror`).
    ///
    /// Environment variable: `RESAMPLE_ADDRESS`.
    #[arg(long, env = "RESAMPLE_ADDRESS", default_value = "clamp")]
    address: String,

    /// Offscreen supersampling factor, 1 to 8.
    ///
    /// Environment variable: `RESAMPLE_SCALE`.
    #[arg(long, env = "RESAMPLE_SCALE", default_value_t = 4)]
    scale: u32,

    /// Edge length of an output tile in window pixels. Each tile is drawn at
    /// `scale` times this size before it is downscaled.
    #[arg(long, env = "RESAMPLE_TILE_SIZE", default_value_t = TILE_SIZE)]
    tile_size: u32,

    /// Fullscreen geometry (`triangle` or `quad`).
    #[arg(long, env = "RESAMPLE_GEOMETRY", default_value = "triangle")]
    geometry: String,

    /// Start with the placeholder stage instead of the resample stage.
    #[arg(long)]
    placeholder: bool,

    /// Log filter (env_logger syntax). Falls back to `RUST_LOG`.
    ///
    /// Environment variable: `RESAMPLE_LOG`.
    #[arg(long, env = "RESAMPLE_LOG")]
    log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub pass: ResamplePass,
    pub scale: u32,
    pub tile_size: u32,
    pub log_level: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    fn from_args(args: Args) -> Result<Self> {
        let filter: FilterMode = args.filter.parse().context("invalid --filter")?;
        let address: AddressMode = args.address.parse().context("invalid --address")?;
        let geometry: FullscreenGeometry = args.geometry.parse().context("invalid --geometry")?;

        if !(MIN_SCALE..=MAX_SCALE).contains(&args.scale) {
            return Err(ConfigError::InvalidScale(args.scale))
                .with_context(|| format!("--scale must be within {MIN_SCALE}..={MAX_SCALE}"));
        }
        if args.tile_size == 0 {
            return Err(ConfigError::InvalidTileSize(args.tile_size)).context("invalid --tile-size");
        }

        let sampler = SamplerConfig {
            filter,
            ..SamplerConfig::default()
        }
        .with_address_mode(address);

        Ok(Self {
            pass: ResamplePass {
                sampler,
                geometry,
                placeholder: args.placeholder,
            },
            scale: args.scale,
            tile_size: args.tile_size,
            log_level: args.log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<Config> {
        let mut full = vec!["resample"];
        full.extend_from_slice(argv);
        Config::from_args(Args::try_parse_from(full)?)
    }

    #[test]
    fn defaults_are_linear_clamp_triangle() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.pass.sampler, SamplerConfig::linear());
        assert_eq!(config.pass.geometry, FullscreenGeometry::Triangle);
        assert!(!config.pass.placeholder);
        assert_eq!(config.scale, 4);
        assert_eq!(config.tile_size, TILE_SIZE);
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse(&[
            "--filter",
            "nearest",
            "--address",
            "repeat",
            "--geometry",
            "quad",
            "--scale",
            "2",
            "--tile-size",
            "32",
            "--placeholder",
        ])
        .unwrap();
        assert_eq!(config.pass.sampler.filter, FilterMode::Nearest);
        assert_eq!(config.pass.sampler.address_u, AddressMode::Repeat);
        assert_eq!(config.pass.sampler.address_v, AddressMode::Repeat);
        assert_eq!(config.pass.geometry, FullscreenGeometry::Quad);
        assert!(config.pass.placeholder);
        assert_eq!(config.scale, 2);
        assert_eq!(config.tile_size, 32);
    }

    #[test]
    fn zero_tile_size_is_rejected() {
        let err = parse(&["--tile-size", "0"]).unwrap_err();
        assert_eq!(err.downcast_ref::<ConfigError>(), Some(&ConfigError::InvalidTileSize(0)));
    }

    #[test]
    fn unknown_filter_is_rejected() {
        let err = parse(&["--filter", "cubic"]).unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }

    #[test]
    fn scale_out_of_range_is_rejected() {
        for scale in ["0", "9"] {
            let err = parse(&["--scale", scale]).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<ConfigError>(),
                Some(ConfigError::InvalidScale(_))
            ));
        }
    }
}
