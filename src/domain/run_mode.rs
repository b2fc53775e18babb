// ============================================================
// Layer 3 — Run Mode
// ============================================================
// The dataset and device mode requested on the command line.
//
// Both parse from any string: unknown values are kept rather
// than rejected, because an unsupported choice ends the run
// quietly with exit status 0 instead of failing argument parsing.

use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatasetKind {
    Cifar10,
    ImageNet,
    Other(String),
}

impl DatasetKind {
    /// Classes the classification head predicts for this dataset.
    pub fn num_classes(&self) -> Option<usize> {
        match self {
            DatasetKind::Cifar10  => Some(10),
            DatasetKind::ImageNet => Some(1000),
            DatasetKind::Other(_) => None,
        }
    }

    /// Only CIFAR-10 has a data pipeline.
    pub fn is_trainable(&self) -> bool {
        matches!(self, DatasetKind::Cifar10)
    }
}

impl FromStr for DatasetKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "cifar10"  => DatasetKind::Cifar10,
            "imagenet" => DatasetKind::ImageNet,
            other      => DatasetKind::Other(other.to_string()),
        })
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetKind::Cifar10   => f.write_str("cifar10"),
            DatasetKind::ImageNet  => f.write_str("imagenet"),
            DatasetKind::Other(s)  => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GpuMode {
    Single,
    Other(String),
}

impl GpuMode {
    pub fn is_supported(&self) -> bool {
        matches!(self, GpuMode::Single)
    }
}

impl FromStr for GpuMode {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "single" => GpuMode::Single,
            other    => GpuMode::Other(other.to_string()),
        })
    }
}

impl fmt::Display for GpuMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuMode::Single   => f.write_str("single"),
            GpuMode::Other(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_known_datasets() {
        assert_eq!("cifar10".parse::<DatasetKind>().unwrap(), DatasetKind::Cifar10);
        assert_eq!("imagenet".parse::<DatasetKind>().unwrap().num_classes(), Some(1000));
        assert!(!DatasetKind::ImageNet.is_trainable());
    }

    #[test]
    fn test_keeps_unknown_values() {
        let kind: DatasetKind = "mnist".parse().unwrap();
        assert_eq!(kind, DatasetKind::Other("mnist".into()));
        assert_eq!(kind.to_string(), "mnist");

        let mode: GpuMode = "multi".parse().unwrap();
        assert!(!mode.is_supported());
        assert_eq!(mode.to_string(), "multi");
    }
}
