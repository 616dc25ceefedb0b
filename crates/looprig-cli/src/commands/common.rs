//! Shared CLI helpers used across multiple commands.

use looprig_config::RigConfig;
use std::path::Path;

/// Loads a rig file, or the stock rig when `path` is `None`.
pub fn load_rig(path: Option<&Path>) -> anyhow::Result<RigConfig> {
    match path {
        Some(path) => RigConfig::load(path)
            .map_err(|e| anyhow::anyhow!("loading rig {}: {}", path.display(), e)),
        None => Ok(RigConfig::default()),
    }
}

pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}

pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0, f32::max)
}

pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        -120.0
    } else {
        20.0 * linear.log10()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels() {
        assert_eq!(rms(&[]), 0.0);
        assert!((rms(&[0.5, -0.5]) - 0.5).abs() < 1e-6);
        assert_eq!(peak(&[0.1, -0.7, 0.3]), 0.7);
        assert!((linear_to_db(1.0)).abs() < 1e-6);
        assert_eq!(linear_to_db(0.0), -120.0);
    }

    #[test]
    fn missing_rig_file_is_an_error() {
        let err = load_rig(Some(Path::new("/no/such/rig.toml"))).unwrap_err();
        assert!(err.to_string().contains("/no/such/rig.toml"));
        assert_eq!(load_rig(None).unwrap(), RigConfig::default());
    }
}
