//! Configuration loading and validation

mod schema;

pub use schema::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a YAML file
pub fn load_config(path: &Path) -> Result<TheremidiConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {:?}", path))?;
    let config: TheremidiConfig = serde_yaml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;
    use std::io::Write;

    #[test]
    fn test_load_minimal_config() {
        let yaml = r#"
midi:
  channel: 2

output:
  kind: stdout

pitch:
  low: 48
  high: 72
"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.midi.channel, 2);
        assert_eq!(config.output, OutputConfig::Stdout);
        assert_eq!(config.pitch.low, 48.0);
        assert_eq!(config.timing.poll_ms, 10);
    }

    #[test]
    fn test_load_rejects_invalid_config() {
        let yaml = "instruments:\n  first: 10\n  last: 5\n";
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_example_config_is_valid() {
        let yaml = include_str!("../../theremidi.example.yaml");
        let config: TheremidiConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
    }
}
