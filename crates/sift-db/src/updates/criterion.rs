//! Criterion update builder.

use serde::Serialize;
use sift_core::enums::CriterionType;
use sift_core::errors::CoreError;
use sift_core::inputs::{validate_code, validate_description, validate_rationale};

#[derive(Debug, Clone, Default, Serialize)]
pub struct CriterionUpdate {
    #[serde(skip_serializing_if = "Option::is_none", rename = "type")]
    pub criterion_type: Option<CriterionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl CriterionUpdate {
    /// Validate only the fields being changed.
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(code) = &self.code {
            validate_code(code)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        if let Some(rationale) = &self.rationale {
            validate_rationale(rationale.as_deref())?;
        }
        Ok(())
    }
}

pub struct CriterionUpdateBuilder(CriterionUpdate);

impl CriterionUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(CriterionUpdate::default())
    }

    #[must_use]
    pub const fn criterion_type(mut self, criterion_type: CriterionType) -> Self {
        self.0.criterion_type = Some(criterion_type);
        self
    }

    #[must_use]
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.0.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.0.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn rationale(mut self, rationale: Option<String>) -> Self {
        self.0.rationale = Some(rationale);
        self
    }

    #[must_use]
    pub const fn order(mut self, order: i64) -> Self {
        self.0.order = Some(order);
        self
    }

    #[must_use]
    pub const fn is_active(mut self, is_active: bool) -> Self {
        self.0.is_active = Some(is_active);
        self
    }

    #[must_use]
    pub fn build(self) -> CriterionUpdate {
        self.0
    }
}

impl Default for CriterionUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_changed_fields_only() {
        let update = CriterionUpdateBuilder::new()
            .description("Adults only")
            .is_active(false)
            .build();
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({ "description": "Adults only", "is_active": false })
        );
    }

    #[test]
    fn validates_changed_code() {
        let update = CriterionUpdateBuilder::new().code("").build();
        assert!(update.validate().is_err());
        assert!(CriterionUpdate::default().validate().is_ok());
    }
}
