use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// How a lookup between texel centres is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

impl FilterMode {
    pub fn name(self) -> &'static str {
        match self {
            FilterMode::Nearest => "nearest",
            FilterMode::Linear => "linear",
        }
    }
}

impl FromStr for FilterMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(FilterMode::Nearest),
            "linear" => Ok(FilterMode::Linear),
            _ => Err(ConfigError::UnknownFilter(s.to_string())),
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Edge handling for coordinates outside [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    #[default]
    ClampToEdge,
    Repeat,
    MirrorRepeat,
}

impl AddressMode {
    pub fn name(self) -> &'static str {
        match self {
            AddressMode::ClampToEdge => "clamp",
            AddressMode::Repeat => "repeat",
            AddressMode::MirrorRepeat => "mirror",
        }
    }

    /// Map a possibly out-of-range texel index onto `0..len`.
    pub fn resolve(self, index: i64, len: u32) -> u32 {
        let n = i64::from(len.max(1));
        let resolved = match self {
            AddressMode::ClampToEdge => index.clamp(0, n - 1),
            AddressMode::Repeat => index.rem_euclid(n),
            AddressMode::MirrorRepeat => {
                let period = index.rem_euclid(2 * n);
                if period < n {
                    period
                } else {
                    2 * n - 1 - period
                }
            }
        };
        resolved as u32
    }
}

impl FromStr for AddressMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clamp" | "clamp-to-edge" => Ok(AddressMode::ClampToEdge),
            "repeat" | "wrap" => Ok(AddressMode::Repeat),
            "mirror" | "mirror-repeat" => Ok(AddressMode::MirrorRepeat),
            _ => Err(ConfigError::UnknownAddressMode(s.to_string())),
        }
    }
}

impl fmt::Display for AddressMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable filtering policy shared by every invocation of a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SamplerConfig {
    pub filter: FilterMode,
    pub address_u: AddressMode,
    pub address_v: AddressMode,
}

impl SamplerConfig {
    pub fn linear() -> Self {
        Self {
            filter: FilterMode::Linear,
            ..Default::default()
        }
    }

    pub fn nearest() -> Self {
        Self {
            filter: FilterMode::Nearest,
            ..Default::default()
        }
    }

    /// Look up a sampler by filter name, with clamp-to-edge addressing.
    pub fn named(name: &str) -> Result<Self, ConfigError> {
        let filter = name.parse()?;
        Ok(Self {
            filter,
            ..Default::default()
        })
    }

    pub fn with_address_mode(self, mode: AddressMode) -> Self {
        Self {
            address_u: mode,
            address_v: mode,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_names_parse_case_insensitively() {
        assert_eq!("Linear".parse::<FilterMode>(), Ok(FilterMode::Linear));
        assert_eq!(" nearest ".parse::<FilterMode>(), Ok(FilterMode::Nearest));
        assert_eq!(
            "cubic".parse::<FilterMode>(),
            Err(ConfigError::UnknownFilter("cubic".into()))
        );
    }

    #[test]
    fn address_aliases() {
        assert_eq!("wrap".parse::<AddressMode>(), Ok(AddressMode::Repeat));
        assert_eq!("clamp-to-edge".parse::<AddressMode>(), Ok(AddressMode::ClampToEdge));
        assert_eq!("mirror-repeat".parse::<AddressMode>(), Ok(AddressMode::MirrorRepeat));
        assert!("border".parse::<AddressMode>().is_err());
    }

    #[test]
    fn named_sampler_defaults_to_clamp() {
        let s = SamplerConfig::named("nearest").unwrap();
        assert_eq!(s.filter, FilterMode::Nearest);
        assert_eq!(s.address_u, AddressMode::ClampToEdge);
        assert_eq!(s.address_v, AddressMode::ClampToEdge);
    }

    #[test]
    fn clamp_resolves_to_edges() {
        assert_eq!(AddressMode::ClampToEdge.resolve(-3, 4), 0);
        assert_eq!(AddressMode::ClampToEdge.resolve(2, 4), 2);
        assert_eq!(AddressMode::ClampToEdge.resolve(9, 4), 3);
    }

    #[test]
    fn repeat_wraps_both_directions() {
        assert_eq!(AddressMode::Repeat.resolve(-1, 4), 3);
        assert_eq!(AddressMode::Repeat.resolve(4, 4), 0);
        assert_eq!(AddressMode::Repeat.resolve(9, 4), 1);
    }

    #[test]
    fn mirror_reflects_each_period() {
        // 0 1 2 3 | 3 2 1 0 | 0 1 ...
        let got: Vec<u32> = (-2..10).map(|i| AddressMode::MirrorRepeat.resolve(i, 4)).collect();
        assert_eq!(got, vec![1, 0, 0, 1, 2, 3, 3, 2, 1, 0, 0, 1]);
    }
}
