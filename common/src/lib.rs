use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

pub mod float_ext;
pub mod log_setup;
pub mod test_utils;

pub const EPSILON: f64 = 1e-6;

#[derive(Debug, thiserror::Error)]
pub enum FileExtensionError {
    #[error("Failed to get file extension")]
    MissingFileExtension,
    #[error("Unsupported file extension for file: {0}")]
    UnsupportedFileExtension(String),
}

pub type FileFormatResult<T> = Result<T, FileExtensionError>;

#[derive(Debug, thiserror::Error)]
pub enum SerdeFormatError {
    #[error("YAML serialization failed")]
    Yaml(#[from] serde_yml::Error),
    #[error("JSON serialization failed")]
    Json(#[from] serde_json::Error),
}

pub type SerdeFormatResult<T> = Result<T, SerdeFormatError>;

pub fn get_file_extension(filename: &str) -> Option<&str> {
    Path::new(filename)
        .extension()
        .and_then(|os_str| os_str.to_str())
}

/// Text formats that configuration structs can be stored in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Json,
}

impl FileFormat {
    pub fn from_file_name(file_name: &str) -> FileFormatResult<Self> {
        let extension = get_file_extension(file_name)
            .map(|ext| ext.to_ascii_lowercase())
            .ok_or(FileExtensionError::MissingFileExtension)?;

        match extension.as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => Err(FileExtensionError::UnsupportedFileExtension(
                file_name.to_string(),
            )),
        }
    }
}

pub fn serialize<T: Serialize>(value: &T, format: FileFormat) -> SerdeFormatResult<String> {
    let mut text = match format {
        FileFormat::Yaml => serde_yml::to_string(value)?,
        FileFormat::Json => serde_json::to_string_pretty(value)?,
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Ok(text)
}

pub fn deserialize<T: DeserializeOwned>(
    serialized: &str,
    format: FileFormat,
) -> SerdeFormatResult<T> {
    match format {
        FileFormat::Yaml => Ok(serde_yml::from_str(serialized)?),
        FileFormat::Json => Ok(serde_json::from_str(serialized)?),
    }
}

/// Reads a config struct from a `.yaml`/`.yml`/`.json` file, picking the
/// format from the extension.
pub fn read_config<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    let format = FileFormat::from_file_name(&path.to_string_lossy())?;
    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config '{}': {}", path.display(), e))?;
    let value = deserialize(&text, format)?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(value)
}

/// Writes a config struct to a file, picking the format from the extension.
pub fn write_config<T: Serialize>(value: &T, path: impl AsRef<Path>) -> anyhow::Result<()> {
    let path = path.as_ref();
    let format = FileFormat::from_file_name(&path.to_string_lossy())?;
    let text = serialize(value, format)?;
    std::fs::write(path, text)
        .map_err(|e| anyhow::anyhow!("Failed to write config '{}': {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        bins: usize,
        sigma: f64,
        label: Option<String>,
    }

    #[test]
    fn file_format_from_extension() {
        assert_eq!(FileFormat::from_file_name("a.yaml").unwrap(), FileFormat::Yaml);
        assert_eq!(FileFormat::from_file_name("a.YML").unwrap(), FileFormat::Yaml);
        assert_eq!(FileFormat::from_file_name("a.json").unwrap(), FileFormat::Json);
        assert!(matches!(
            FileFormat::from_file_name("a.lua"),
            Err(FileExtensionError::UnsupportedFileExtension(_))
        ));
        assert!(matches!(
            FileFormat::from_file_name("noext"),
            Err(FileExtensionError::MissingFileExtension)
        ));
    }

    #[test]
    fn yaml_and_json_roundtrip() {
        let sample = Sample {
            bins: 100,
            sigma: 3.0,
            label: None,
        };
        for format in [FileFormat::Yaml, FileFormat::Json] {
            let text = serialize(&sample, format).unwrap();
            assert!(text.ends_with('\n'));
            let back: Sample = deserialize(&text, format).unwrap();
            assert_eq!(back, sample);
        }
    }

    #[test]
    fn config_file_roundtrip() {
        let path = test_utils::test_output_path("common_config_roundtrip.yaml");
        let sample = Sample {
            bins: 40,
            sigma: 2.5,
            label: Some("pm".to_string()),
        };
        write_config(&sample, &path).unwrap();
        let back: Sample = read_config(&path).unwrap();
        assert_eq!(back, sample);
    }

    #[test]
    fn read_config_missing_file_fails() {
        let result: anyhow::Result<Sample> = read_config("/nonexistent/dir/config.yaml");
        assert!(result.is_err());
    }
}
