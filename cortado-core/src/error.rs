use cortado_model::{AssignmentId, StaffId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(#[from] cortado_model::ModelError),

    #[error("invalid measurement uncertainty: {0}")]
    InvalidUncertainty(f64),

    #[error("degenerate polygon: {vertices} vertices, need at least 3")]
    DegeneratePolygon { vertices: usize },

    #[error("empty candidate pool")]
    EmptyPool,

    #[error("assignment not found: {0}")]
    AssignmentNotFound(AssignmentId),

    #[error("assignment {assignment_id} is not offered to candidate {candidate_id}")]
    NotYourOffer {
        assignment_id: AssignmentId,
        candidate_id: StaffId,
    },

    #[error("assignment {assignment_id} already claimed by {claimed_by}")]
    AlreadyClaimed {
        assignment_id: AssignmentId,
        claimed_by: StaffId,
    },
}

pub type Result<T> = std::result::Result<T, DispatchError>;
