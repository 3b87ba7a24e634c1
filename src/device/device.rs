use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::EvalError;

/// Where tensor storage lives and where a forward pass runs.
///
/// Storage can be tagged with any device, but only `Cpu` has kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    #[default]
    Cpu,
    Gpu(u32),
}

impl Device {
    pub fn has_kernels(&self) -> bool {
        matches!(self, Device::Cpu)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Gpu(ordinal) => write!(f, "gpu:{ordinal}"),
        }
    }
}

/// Accepts `cpu`, `gpu` (ordinal 0) and `gpu:N`, case-insensitive.
impl FromStr for Device {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "cpu" => Ok(Device::Cpu),
            "gpu" => Ok(Device::Gpu(0)),
            other => other
                .strip_prefix("gpu:")
                .and_then(|n| n.parse::<u32>().ok())
                .map(Device::Gpu)
                .ok_or_else(|| EvalError::InvalidDevice(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_selectors() {
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("GPU".parse::<Device>().unwrap(), Device::Gpu(0));
        assert_eq!("gpu:3".parse::<Device>().unwrap(), Device::Gpu(3));
        assert!(matches!("tpu".parse::<Device>(), Err(EvalError::InvalidDevice(_))));
        assert!("gpu:x".parse::<Device>().is_err());
    }

    #[test]
    fn display_round_trips() {
        let d = Device::Gpu(1);
        assert_eq!(d.to_string().parse::<Device>().unwrap(), d);
    }
}
