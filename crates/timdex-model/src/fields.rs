//! Subfield value objects carried by the optional record fields.
//!
//! All of them serialize with absent values omitted. Nested lists follow the
//! same rule as top-level lists: absent is `None`, never an empty vector.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// Invariant check for one element of a list-valued field.
pub(crate) trait Validate {
    fn validate(&self, field: &str) -> Result<()>;
}

impl Validate for String {
    fn validate(&self, _field: &str) -> Result<()> {
        Ok(())
    }
}

pub(crate) fn check_nested<T: std::fmt::Debug>(
    field: &str,
    name: &str,
    value: Option<&Vec<T>>,
) -> Result<()> {
    match value {
        Some(items) if items.is_empty() => Err(ValidationError::EmptyList {
            field: format!("{field}.{name}"),
            value: format!("{items:?}"),
        }),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlternateTitle {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl AlternateTitle {
    pub fn new(value: impl Into<String>, kind: Option<&str>) -> Self {
        Self {
            value: value.into(),
            kind: kind.map(str::to_string),
        }
    }
}

impl Validate for AlternateTitle {
    fn validate(&self, _field: &str) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Contributor {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mit_affiliated: Option<bool>,
}

impl Contributor {
    pub fn new(value: impl Into<String>, kind: Option<&str>) -> Self {
        Self {
            value: value.into(),
            kind: kind.map(str::to_string),
            ..Self::default()
        }
    }
}

impl Validate for Contributor {
    fn validate(&self, field: &str) -> Result<()> {
        check_nested(field, "affiliation", self.affiliation.as_ref())?;
        check_nested(field, "identifier", self.identifier.as_ref())
    }
}

/// Bounds of a date range. At most one lower and one upper bound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DateRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<String>,
}

impl DateRange {
    /// Inclusive range `[gte, lte]`.
    pub fn inclusive(gte: impl Into<String>, lte: impl Into<String>) -> Self {
        Self {
            gte: Some(gte.into()),
            lte: Some(lte.into()),
            ..Self::default()
        }
    }
}

impl Validate for DateRange {
    fn validate(&self, field: &str) -> Result<()> {
        if self.gt.is_some() && self.gte.is_some() {
            return Err(ValidationError::ConflictingLowerBound {
                field: field.to_string(),
                value: format!("{self:?}"),
            });
        }
        if self.lt.is_some() && self.lte.is_some() {
            return Err(ValidationError::ConflictingUpperBound {
                field: field.to_string(),
                value: format!("{self:?}"),
            });
        }
        Ok(())
    }
}

/// A date is a scalar value, a free-text note, a range, or some combination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Date {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<DateRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Date {
    pub fn new(value: impl Into<String>, kind: Option<&str>) -> Self {
        Self {
            value: Some(value.into()),
            kind: kind.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn range(range: DateRange, kind: Option<&str>) -> Self {
        Self {
            range: Some(range),
            kind: kind.map(str::to_string),
            ..Self::default()
        }
    }
}

impl Validate for Date {
    fn validate(&self, field: &str) -> Result<()> {
        match &self.range {
            Some(range) => range.validate(&format!("{field}.range")),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Funder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funder_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funder_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funder_identifier_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub award_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub award_uri: Option<String>,
}

impl Validate for Funder {
    fn validate(&self, _field: &str) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Holding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Validate for Holding {
    fn validate(&self, _field: &str) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Identifier {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Identifier {
    pub fn new(value: impl Into<String>, kind: Option<&str>) -> Self {
        Self {
            value: value.into(),
            kind: kind.map(str::to_string),
        }
    }
}

impl Validate for Identifier {
    fn validate(&self, _field: &str) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Link {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Link {
    pub fn new(url: impl Into<String>, kind: Option<&str>) -> Self {
        Self {
            url: url.into(),
            kind: kind.map(str::to_string),
            ..Self::default()
        }
    }
}

impl Validate for Link {
    fn validate(&self, _field: &str) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geoshape: Option<String>,
}

impl Validate for Location {
    fn validate(&self, _field: &str) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Note {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Validate for Note {
    fn validate(&self, field: &str) -> Result<()> {
        check_nested(field, "value", self.value.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Publisher {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Publisher {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

impl Validate for Publisher {
    fn validate(&self, _field: &str) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelatedItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl Validate for RelatedItem {
    fn validate(&self, _field: &str) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rights {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl Validate for Rights {
    fn validate(&self, _field: &str) -> Result<()> {
        Ok(())
    }
}

/// Subject terms grouped under one scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Subject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Subject {
    pub fn new(values: Vec<String>, kind: Option<&str>) -> Self {
        Self {
            value: Some(values),
            kind: kind.map(str::to_string),
        }
    }
}

impl Validate for Subject {
    fn validate(&self, field: &str) -> Result<()> {
        check_nested(field, "value", self.value.as_ref())
    }
}
