//! Run context: metadata computed once per invocation and stamped onto
//! every emitted record.
//!
//! Harvest files follow the naming convention
//! `{source}-{YYYY-MM-DD}-{run_type}-{stage}-records-to-{action}[_{n}].{ext}`,
//! e.g. `libguides-2024-03-01-daily-extracted-records-to-index.xml`. The
//! source, run date and run type are read from the name unless overridden.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use timdex_model::TimdexProvenance;

use crate::error::ConfigError;

const FILE_NAME_PATTERN: &str =
    r"^([\w\-]+?)-(\d{4}-\d{2}-\d{2})-(\w+)-(\w+)-records-to-(.+?)(?:_(\d+))?\.(\w+)$";

const PLACEHOLDER_SOURCE: &str = "placeholder";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunType {
    Full,
    Daily,
    Incremental,
}

impl RunType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Daily => "daily",
            Self::Incremental => "incremental",
        }
    }
}

impl fmt::Display for RunType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunType {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "daily" => Ok(Self::Daily),
            "incremental" => Ok(Self::Incremental),
            _ => Err(ConfigError::InvalidRunType {
                value: value.to_string(),
            }),
        }
    }
}

/// Immutable run metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunContext {
    pub source: String,
    pub run_date: NaiveDate,
    pub run_type: RunType,
    pub run_id: String,
    pub run_timestamp: DateTime<Utc>,
}

impl RunContext {
    pub fn builder() -> RunContextBuilder {
        RunContextBuilder::default()
    }

    /// `YYYY-MM-DD`.
    pub fn run_date_string(&self) -> String {
        self.run_date.format("%Y-%m-%d").to_string()
    }

    /// Provenance block for the indexed record at `run_record_offset`.
    pub fn provenance(&self, run_record_offset: u64) -> TimdexProvenance {
        TimdexProvenance {
            source: self.source.clone(),
            run_date: self.run_date_string(),
            run_id: self.run_id.clone(),
            run_record_offset,
        }
    }
}

/// Values read from a harvest file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNameParts {
    pub source: String,
    pub run_date: NaiveDate,
    pub run_type: RunType,
}

/// Parse a harvest file name into source, run date and run type.
pub fn parse_source_file_name(path: &Path) -> Result<FileNameParts, ConfigError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let unrecognized = || ConfigError::UnrecognizedFileName {
        file_name: file_name.clone(),
    };
    let pattern = Regex::new(FILE_NAME_PATTERN)?;
    let captures = pattern.captures(&file_name).ok_or_else(unrecognized)?;
    let run_date_text = &captures[2];
    let run_date = NaiveDate::parse_from_str(run_date_text, "%Y-%m-%d").map_err(|source| {
        ConfigError::InvalidRunDate {
            value: run_date_text.to_string(),
            source,
        }
    })?;
    Ok(FileNameParts {
        source: captures[1].to_string(),
        run_date,
        run_type: captures[3].parse()?,
    })
}

/// True when `WORKSPACE=test` is set.
pub fn is_test_environment() -> bool {
    std::env::var("WORKSPACE").is_ok_and(|workspace| workspace.eq_ignore_ascii_case("test"))
}

/// Builder for [`RunContext`]. Explicit values win over values parsed from
/// the source file name.
#[derive(Debug, Clone, Default)]
pub struct RunContextBuilder {
    source_file: Option<PathBuf>,
    source: Option<String>,
    run_date: Option<NaiveDate>,
    run_type: Option<RunType>,
    run_id: Option<String>,
    run_timestamp: Option<DateTime<Utc>>,
    test_environment: Option<bool>,
}

impl RunContextBuilder {
    #[must_use]
    pub fn source_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn run_date(mut self, run_date: NaiveDate) -> Self {
        self.run_date = Some(run_date);
        self
    }

    #[must_use]
    pub fn run_type(mut self, run_type: RunType) -> Self {
        self.run_type = Some(run_type);
        self
    }

    #[must_use]
    pub fn run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    #[must_use]
    pub fn run_timestamp(mut self, run_timestamp: DateTime<Utc>) -> Self {
        self.run_timestamp = Some(run_timestamp);
        self
    }

    /// Override `WORKSPACE` detection.
    #[must_use]
    pub fn test_environment(mut self, enabled: bool) -> Self {
        self.test_environment = Some(enabled);
        self
    }

    pub fn build(self) -> Result<RunContext, ConfigError> {
        let test_environment = self.test_environment.unwrap_or_else(is_test_environment);
        let parsed = match &self.source_file {
            Some(path) => match parse_source_file_name(path) {
                Ok(parts) => Some(parts),
                // An unconventional name is fine when every value is overridden.
                Err(_) if self.run_date.is_some() && self.run_type.is_some() => None,
                Err(_) if test_environment => None,
                Err(error) => return Err(error),
            },
            None => None,
        };

        let (source, run_date, run_type) = match (parsed, self.run_date) {
            (Some(parts), run_date) => (
                self.source.unwrap_or(parts.source),
                run_date.unwrap_or(parts.run_date),
                self.run_type.unwrap_or(parts.run_type),
            ),
            (None, Some(run_date)) => (
                self.source.ok_or_else(|| ConfigError::missing("source"))?,
                run_date,
                self.run_type.ok_or_else(|| ConfigError::missing("run_type"))?,
            ),
            (None, None) if test_environment => {
                debug!("no source file in test environment, using placeholder run data");
                (
                    self.source.unwrap_or_else(|| PLACEHOLDER_SOURCE.to_string()),
                    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default(),
                    self.run_type.unwrap_or(RunType::Daily),
                )
            }
            (None, None) => return Err(ConfigError::missing("source_file")),
        };

        let run_id = self.run_id.unwrap_or_else(|| {
            info!("explicit run_id not passed, minting new UUID");
            Uuid::new_v4().to_string()
        });
        let run_timestamp = self
            .run_timestamp
            .unwrap_or_else(|| run_date.and_time(NaiveTime::MIN).and_utc());

        Ok(RunContext {
            source,
            run_date,
            run_type,
            run_id,
            run_timestamp,
        })
    }
}
