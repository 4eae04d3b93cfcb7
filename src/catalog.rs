//! Metric catalog loaded from the CSV register list.
//!
//! The catalog is read once at startup and never mutated afterwards. Every
//! collection cycle walks it in file order.

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// How a given address on the controller is read and interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterKind {
    /// Integer register.
    Register,
    /// Register interpreted as IEEE float.
    RegisterFloat,
    Flag,
    Input,
    Output,
    /// Reserved, never produced by the CSV loader.
    Counter,
    /// Reserved, never produced by the CSV loader.
    Timer,
}

impl RegisterKind {
    /// Token used in the CSV file and in the `/info` output.
    pub fn as_str(&self) -> &'static str {
        match self {
            RegisterKind::Register => "R",
            RegisterKind::RegisterFloat => "R Float",
            RegisterKind::Flag => "Flag",
            RegisterKind::Input => "Input",
            RegisterKind::Output => "Output",
            RegisterKind::Counter => "Counter",
            RegisterKind::Timer => "Timer",
        }
    }
}

impl fmt::Display for RegisterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a register-kind token is not one the loader accepts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown register type: {0:?}")]
pub struct UnknownRegisterToken(pub String);

impl FromStr for RegisterKind {
    type Err = UnknownRegisterToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "R" => Ok(RegisterKind::Register),
            "R Float" => Ok(RegisterKind::RegisterFloat),
            "Flag" => Ok(RegisterKind::Flag),
            "Input" => Ok(RegisterKind::Input),
            "Output" => Ok(RegisterKind::Output),
            other => Err(UnknownRegisterToken(other.to_string())),
        }
    }
}

/// One configured register reading.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDefinition {
    pub name: String,
    pub register_kind: RegisterKind,
    pub address: u32,
    pub description: String,
}

impl MetricDefinition {
    pub fn new(
        name: impl Into<String>,
        register_kind: RegisterKind,
        address: u32,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            register_kind,
            address,
            description: description.into(),
        }
    }
}

/// Errors raised while building the catalog. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read CSV file {}: {error}", .path.display())]
    Io { path: PathBuf, error: std::io::Error },

    #[error("failed to parse CSV: {0}")]
    Csv(csv::Error),

    #[error("line {line}: {token}")]
    UnknownRegisterKind {
        line: u64,
        token: UnknownRegisterToken,
    },
}

impl From<csv::Error> for CatalogError {
    fn from(error: csv::Error) -> Self {
        CatalogError::Csv(error)
    }
}

/// Raw CSV row. Column headers are the ones used by the plant's register sheet.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(rename = "Nom Métrique Prometheus")]
    name: String,
    #[serde(rename = "Type Registre")]
    register_kind: String,
    #[serde(rename = "Adresse")]
    address: u32,
    #[serde(rename = "Description", default)]
    description: String,
}

/// Immutable, ordered list of metric definitions.
#[derive(Debug, Clone, Default)]
pub struct MetricCatalog {
    definitions: Arc<[MetricDefinition]>,
}

impl MetricCatalog {
    /// Builds a catalog from already-parsed definitions.
    pub fn new(definitions: Vec<MetricDefinition>) -> Self {
        Self {
            definitions: definitions.into(),
        }
    }

    /// Loads the catalog from a CSV file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let io_error = |error| CatalogError::Io {
            path: path.to_path_buf(),
            error,
        };
        let content = fs::read(path).map_err(io_error)?;
        let catalog = Self::from_bytes(&content)?;
        info!(
            "Loaded {} metric definitions from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Loads the catalog from any CSV source.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, CatalogError> {
        let mut content = Vec::new();
        reader
            .read_to_end(&mut content)
            .map_err(|error| CatalogError::Io {
                path: PathBuf::new(),
                error,
            })?;
        Self::from_bytes(&content)
    }

    /// Parses CSV content. A leading UTF-8 BOM is ignored; invalid UTF-8 is
    /// reported by the CSV parser with its record position.
    fn from_bytes(content: &[u8]) -> Result<Self, CatalogError> {
        let content = content.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(content);

        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b',')
            .trim(csv::Trim::All)
            .from_reader(content);

        let headers = csv_reader.headers()?.clone();
        let mut raw = csv::StringRecord::new();
        let mut definitions = Vec::new();
        while csv_reader.read_record(&mut raw)? {
            let line = raw.position().map(|p| p.line()).unwrap_or_default();
            let record: CsvRecord = raw.deserialize(Some(&headers))?;
            let register_kind = record
                .register_kind
                .parse::<RegisterKind>()
                .map_err(|token| CatalogError::UnknownRegisterKind { line, token })?;

            debug!(
                "Catalog entry {}: kind={} address={}",
                record.name, register_kind, record.address
            );
            definitions.push(MetricDefinition {
                name: record.name,
                register_kind,
                address: record.address,
                description: record.description,
            });
        }

        Ok(Self::new(definitions))
    }

    pub fn definitions(&self) -> &[MetricDefinition] {
        &self.definitions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MetricDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl<'a> IntoIterator for &'a MetricCatalog {
    type Item = &'a MetricDefinition;
    type IntoIter = std::slice::Iter<'a, MetricDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
