use thiserror::Error;

/// Everything that can stop an analyzer, or be recorded against a single
/// entity of a scene.
///
/// Whole-scene conditions (`MissingFloor`, `EmptyScene`) abort the analyzer
/// that hit them. Per-entity conditions are normally formatted into that
/// entity's result slot instead of being propagated.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("scene has no usable floor mesh")]
    MissingFloor,
    #[error("scene has no objects to evaluate for `{metric}`")]
    EmptyScene { metric: &'static str },
    #[error("`{id}` is neither a door nor a window")]
    UnknownOpening { id: String },
    #[error("no element with id `{id}` in scene")]
    UnknownElement { id: String },
    #[error("element id `{id}` is already present")]
    DuplicateId { id: String },
    #[error("mesh `{id}` is invalid: {reason}")]
    InvalidMesh { id: String, reason: String },
    #[error("mesh `{id}` is degenerate (no finite, non-zero-area triangles)")]
    DegenerateMesh { id: String },
    #[error("internal consistency check failed: {context}")]
    Invariant { context: String },
    #[error("unknown metric `{name}`")]
    UnknownMetric { name: String },
}

pub type EvalResult<T> = Result<T, EvalError>;

impl EvalError {
    pub fn invariant(context: impl Into<String>) -> Self {
        EvalError::Invariant {
            context: context.into(),
        }
    }

    pub fn unknown_element(id: impl Into<String>) -> Self {
        EvalError::UnknownElement { id: id.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_offending_id() {
        let err = EvalError::UnknownOpening {
            id: "skylight_0".into(),
        };
        assert!(err.to_string().contains("skylight_0"));

        let err = EvalError::invariant("hit count 3 > sample count 2");
        assert!(err.to_string().contains("3 > sample count 2"));
    }
}
