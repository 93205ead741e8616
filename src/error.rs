use thiserror::Error;

use crate::network::EntityKind;
use crate::model::ConstraintFamily;

/// Errors raised while constructing, building or solving an energy system.
#[derive(Debug, Error)]
pub enum ModelError {
    // Structural (construction time)
    #[error("{kind} '{uid}' has invalid {side} edges: {reason}")]
    EdgeCardinality {
        kind: EntityKind,
        uid: String,
        side: EdgeSide,
        reason: String,
    },

    #[error("Missing attribute \"{attribute}\" for {kind} '{uid}'")]
    MissingParameter {
        kind: EntityKind,
        uid: String,
        attribute: &'static str,
    },

    #[error("Invalid attribute \"{attribute}\" for {kind} '{uid}': {reason}")]
    InvalidParameter {
        kind: EntityKind,
        uid: String,
        attribute: &'static str,
        reason: String,
    },

    #[error("Failed to set {attribute} automatically for storage '{uid}'. Did you specify {c_rate} and cap_max?")]
    UnderivableLimit {
        uid: String,
        attribute: &'static str,
        c_rate: &'static str,
    },

    #[error("Entity uid '{0}' is already in use")]
    DuplicateUid(String),

    #[error("Cannot connect '{bus_a}' ({commodity_a}) with '{bus_b}' ({commodity_b}): commodities differ")]
    CommodityMismatch {
        bus_a: String,
        commodity_a: String,
        bus_b: String,
        commodity_b: String,
    },

    // Modeling (build time)
    #[error("Entity '{entity}' references '{reference}', which is not a bus of this energy system")]
    DanglingReference { entity: String, reference: String },

    #[error("{kind} '{uid}' does not support {family} constraints")]
    IncompatibleConstraint {
        kind: EntityKind,
        uid: String,
        family: ConstraintFamily,
    },

    #[error("{family} constraints on '{uid}' require the milp formulation")]
    RequiresMilp { uid: String, family: ConstraintFamily },

    #[error("Profile '{attribute}' of '{uid}' has {actual} values, expected {expected} (one per timestep)")]
    ProfileLength {
        uid: String,
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown solver: {0}")]
    UnknownSolver(String),

    // Solve outcomes
    #[error("Problem is infeasible")]
    Infeasible,

    #[error("Solver '{solver}' failed: {message}")]
    Solver { solver: String, message: String },

    // Configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Which edge list of an entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum EdgeSide {
    Input,
    Output,
}

/// Coarse classification of [`ModelError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ErrorClass {
    /// Rejected while constructing an entity.
    Structural,
    /// Rejected while translating the graph into a model.
    Modeling,
    /// The solver proved that no feasible dispatch exists.
    Infeasible,
    /// The solver failed to run or returned something unusable.
    Solver,
    Configuration,
}

impl ModelError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ModelError::EdgeCardinality { .. }
            | ModelError::MissingParameter { .. }
            | ModelError::InvalidParameter { .. }
            | ModelError::UnderivableLimit { .. }
            | ModelError::DuplicateUid(_)
            | ModelError::CommodityMismatch { .. } => ErrorClass::Structural,
            ModelError::DanglingReference { .. }
            | ModelError::IncompatibleConstraint { .. }
            | ModelError::RequiresMilp { .. }
            | ModelError::ProfileLength { .. } => ErrorClass::Modeling,
            ModelError::Infeasible => ErrorClass::Infeasible,
            ModelError::UnknownSolver(_) | ModelError::Solver { .. } => ErrorClass::Solver,
            ModelError::Configuration(_) => ErrorClass::Configuration,
        }
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self, ModelError::Infeasible)
    }

    /// Infeasibility and solver failures may succeed on a fresh instance with
    /// adjusted inputs; structural and modeling errors never will.
    pub fn is_retryable(&self) -> bool {
        matches!(self.class(), ErrorClass::Infeasible | ErrorClass::Solver)
    }

    pub(crate) fn missing(kind: EntityKind, uid: &str, attribute: &'static str) -> Self {
        ModelError::MissingParameter {
            kind,
            uid: uid.to_string(),
            attribute,
        }
    }

    pub(crate) fn invalid(
        kind: EntityKind,
        uid: &str,
        attribute: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        ModelError::InvalidParameter {
            kind,
            uid: uid.to_string(),
            attribute,
            reason: reason.into(),
        }
    }
}

impl From<validator::ValidationErrors> for ModelError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ModelError::Configuration(errors.to_string())
    }
}

pub type Result<T, E = ModelError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert_eq!(
            ModelError::missing(EntityKind::SimpleExtractionChp, "chp", "sigma").class(),
            ErrorClass::Structural
        );
        assert_eq!(
            ModelError::DanglingReference {
                entity: "pp".into(),
                reference: "b_gas".into()
            }
            .class(),
            ErrorClass::Modeling
        );
        assert_eq!(ModelError::Infeasible.class(), ErrorClass::Infeasible);
        assert_eq!(
            ModelError::Solver {
                solver: "clarabel".into(),
                message: "numerical issue".into()
            }
            .class(),
            ErrorClass::Solver
        );
    }

    #[test]
    fn test_missing_parameter_message_names_attribute_and_type() {
        let err = ModelError::missing(EntityKind::SimpleExtractionChp, "chp1", "sigma");
        let msg = err.to_string();
        assert!(msg.contains("\"sigma\""));
        assert!(msg.contains("SimpleExtractionCHP"));
        assert!(msg.contains("chp1"));
    }

    #[test]
    fn test_retryable() {
        assert!(ModelError::Infeasible.is_retryable());
        assert!(!ModelError::DuplicateUid("b".into()).is_retryable());
    }
}
