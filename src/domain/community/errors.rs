// ============================================================================
// Community Business Rule Errors
// ============================================================================

/// Malformed primitive input to a value-object constructor.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("community name cannot be empty")]
    EmptyName,

    #[error("community name exceeds {max} characters")]
    NameTooLong { max: usize },

    #[error("description exceeds {max} characters")]
    DescriptionTooLong { max: usize },

    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// Business rule violations raised by community operations.
///
/// A failed operation leaves state, version, and the event outbox exactly as
/// they were before the call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommunityError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("cannot add members to inactive community")]
    MembersRequireActive,

    #[error("cannot add stories to inactive community")]
    StoriesRequireActive,

    #[error("impact value cannot be negative, got {0}")]
    NegativeImpact(f64),
}
