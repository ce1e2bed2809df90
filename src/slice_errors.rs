use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SliceError {
    #[error("No usable data in range: {0}")]
    NoDataInRange(String),

    #[error("Rotation '{rotation}' requires {required} data")]
    MissingSupportData {
        rotation: String,
        required: &'static str,
    },

    #[error("Rotation is undefined (singular basis): {0}")]
    SingularRotation(String),

    #[error("Unexpected array shape: {0}")]
    ShapeMismatch(String),

    #[error("Invalid distribution sample: {0}")]
    InvalidSample(String),

    #[error("Invalid slice parameter: {0}")]
    InvalidSliceParameter(String),
}

impl PartialEq for SliceError {
    fn eq(&self, other: &Self) -> bool {
        use SliceError::*;
        match (self, other) {
            (NoDataInRange(a), NoDataInRange(b)) => a == b,
            (
                MissingSupportData {
                    rotation: r1,
                    required: q1,
                },
                MissingSupportData {
                    rotation: r2,
                    required: q2,
                },
            ) => r1 == r2 && q1 == q2,
            (SingularRotation(a), SingularRotation(b)) => a == b,
            (ShapeMismatch(a), ShapeMismatch(b)) => a == b,
            (InvalidSample(a), InvalidSample(b)) => a == b,
            (InvalidSliceParameter(a), InvalidSliceParameter(b)) => a == b,
            _ => false,
        }
    }
}

impl SliceError {
    /// Whether the caller should report "no data" and skip plotting rather than abort.
    pub fn is_no_data(&self) -> bool {
        matches!(self, SliceError::NoDataInRange(_))
    }
}
