//! Configuration loading and validation

mod schema;

pub use schema::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Example configuration written by `tonebank init`
pub const EXAMPLE_CONFIG: &str = include_str!("../../tonebank.example.yaml");

/// Load configuration from a YAML file
pub fn load_config(path: &Path) -> Result<SynthConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {:?}", path))?;
    let config: SynthConfig = serde_yaml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::Shape;
    use tempfile::NamedTempFile;
    use std::io::Write;

    #[test]
    fn test_load_minimal_config() {
        let yaml = r#"
audio:
  sample_rate: 44100

oscillators:
  - shape: Rectangle
    amplitude: 0.4
    duty: 0.5
"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.audio.sample_rate, 44100);
        assert_eq!(config.oscillators.len(), 1);
        assert_eq!(config.oscillators[0].shape, Shape::Rectangle);
        assert_eq!(config.oscillators[0].frequency, 800.0);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let yaml = "oscillators:\n  - amplitude: 2.0\n";
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_example_config_is_valid() {
        let config: SynthConfig = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
        config.validate().unwrap();
        assert!(!config.oscillators.is_empty());
    }
}
