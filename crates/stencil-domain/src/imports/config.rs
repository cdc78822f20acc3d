use std::path::{Path, PathBuf};

use toml_edit::{DocumentMut, Item, TableLike};

use super::NamingMode;

pub const DEFAULT_IMPORT_METHOD: &str = "from library.types";
pub const DEFAULT_CONVERSION_METHOD: &str = "camel_case";
pub const DEFAULT_FAMILY_MARKER: &str = "from library.types";

const CONFIG_TABLE: &str = "types_config";

/// Settings for one import-insertion run, read from a `_types.toml` file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportsConfig {
    /// Statement prefix, e.g. `from library.types`.
    pub import_prefix: String,
    pub naming_mode: NamingMode,
    /// Schema file path relative to the project root.
    pub target_file: PathBuf,
    pub module_files: Vec<String>,
    /// Lines starting with this text form the import family that new
    /// statements are appended to.
    pub family_marker: String,
}

impl ImportsConfig {
    pub fn new(target_file: impl Into<PathBuf>, module_files: Vec<String>) -> Self {
        Self {
            import_prefix: DEFAULT_IMPORT_METHOD.to_string(),
            naming_mode: NamingMode::from_conversion_method(DEFAULT_CONVERSION_METHOD),
            target_file: target_file.into(),
            module_files,
            family_marker: DEFAULT_FAMILY_MARKER.to_string(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml_edit::TomlError,
    },
    #[error("{path} is missing required key `{key}`")]
    MissingKey { path: PathBuf, key: &'static str },
    #[error("{path}: `{key}` must be {expected}")]
    InvalidKey {
        path: PathBuf,
        key: &'static str,
        expected: &'static str,
    },
}

/// Parse an imports config document. Keys are read from a `[types_config]`
/// table when present, otherwise from the top level; `origin` only feeds
/// error messages.
pub fn imports_config_from_str(
    contents: &str,
    origin: &Path,
) -> Result<ImportsConfig, ConfigError> {
    let doc: DocumentMut = contents.parse().map_err(|source| ConfigError::Parse {
        path: origin.to_path_buf(),
        source,
    })?;
    let table: &dyn TableLike = match doc.get(CONFIG_TABLE).and_then(Item::as_table_like) {
        Some(table) => table,
        None => doc.as_table(),
    };

    let import_prefix = string_key(table, "import_method", origin)?
        .unwrap_or_else(|| DEFAULT_IMPORT_METHOD.to_string());
    let conversion = string_key(table, "conversion_method", origin)?
        .unwrap_or_else(|| DEFAULT_CONVERSION_METHOD.to_string());
    let family_marker =
        string_key(table, "marker", origin)?.unwrap_or_else(|| DEFAULT_FAMILY_MARKER.to_string());
    let target_file = string_key(table, "relative_file_path", origin)?
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingKey {
            path: origin.to_path_buf(),
            key: "relative_file_path",
        })?;
    let module_files = match table.get("types") {
        None => Vec::new(),
        Some(item) => {
            let invalid = || ConfigError::InvalidKey {
                path: origin.to_path_buf(),
                key: "types",
                expected: "an array of strings",
            };
            let array = item.as_array().ok_or_else(invalid)?;
            array
                .iter()
                .map(|value| value.as_str().map(ToString::to_string).ok_or_else(invalid))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok(ImportsConfig {
        import_prefix,
        naming_mode: NamingMode::from_conversion_method(&conversion),
        target_file: PathBuf::from(target_file),
        module_files,
        family_marker,
    })
}

fn string_key(
    table: &dyn TableLike,
    key: &'static str,
    origin: &Path,
) -> Result<Option<String>, ConfigError> {
    match table.get(key) {
        None => Ok(None),
        Some(item) => item
            .as_str()
            .map(|value| Some(value.to_string()))
            .ok_or_else(|| ConfigError::InvalidKey {
                path: origin.to_path_buf(),
                key,
                expected: "a string",
            }),
    }
}
