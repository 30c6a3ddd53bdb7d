use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::errors::ValidationError;

// ============================================================================
// Community Value Objects
// ============================================================================
//
// Immutable, self-validating wrappers around primitive input. Invalid data
// is rejected at construction, so the aggregate never re-validates these.
// The `from_stored` constructors are crate-private and exist only for the
// snapshot reconstitution path, where the data was validated when it was
// originally written.
//
// ============================================================================

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 2000;

/// Opaque community identifier; the sole basis of aggregate equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommunityId(Uuid);

impl CommunityId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for CommunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Community name: non-empty after trimming, at most `MAX_NAME_LEN` chars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityName(String);

impl CommunityName {
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if trimmed.chars().count() > MAX_NAME_LEN {
            return Err(ValidationError::NameTooLong { max: MAX_NAME_LEN });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub(crate) fn from_stored(name: String) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Free-text description, at most `MAX_DESCRIPTION_LEN` chars. May be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description(String);

impl Description {
    pub fn new(text: impl Into<String>) -> Result<Self, ValidationError> {
        let text = text.into();
        if text.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(ValidationError::DescriptionTooLong {
                max: MAX_DESCRIPTION_LEN,
            });
        }
        Ok(Self(text))
    }

    pub(crate) fn from_stored(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Geographic location with range-checked coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    latitude: f64,
    longitude: f64,
    address: String,
}

impl GeoLocation {
    pub fn new(
        latitude: f64,
        longitude: f64,
        address: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
            address: address.into(),
        })
    }

    pub(crate) fn from_stored(latitude: f64, longitude: f64, address: String) -> Self {
        Self {
            latitude,
            longitude,
            address,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_rejects_empty_and_whitespace() {
        assert!(matches!(
            CommunityName::new(""),
            Err(ValidationError::EmptyName)
        ));
        assert!(matches!(
            CommunityName::new("   "),
            Err(ValidationError::EmptyName)
        ));
    }

    #[test]
    fn name_rejects_overlong() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(matches!(
            CommunityName::new(long),
            Err(ValidationError::NameTooLong { .. })
        ));
    }

    #[test]
    fn name_trims_surrounding_whitespace() {
        let name = CommunityName::new("  Riverside  ").unwrap();
        assert_eq!(name.as_str(), "Riverside");
    }

    #[test]
    fn names_with_same_text_are_equal() {
        let a = CommunityName::new("Riverside").unwrap();
        let b = CommunityName::new("Riverside").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn description_may_be_empty_but_not_overlong() {
        assert!(Description::new("").is_ok());

        let long = "x".repeat(MAX_DESCRIPTION_LEN + 1);
        assert!(matches!(
            Description::new(long),
            Err(ValidationError::DescriptionTooLong { .. })
        ));
    }

    #[test]
    fn location_accepts_boundary_coordinates() {
        assert!(GeoLocation::new(90.0, 180.0, "North-east corner").is_ok());
        assert!(GeoLocation::new(-90.0, -180.0, "South-west corner").is_ok());
    }

    #[test]
    fn location_rejects_out_of_range_latitude() {
        let result = GeoLocation::new(90.5, 0.0, "Nowhere");
        assert!(matches!(
            result,
            Err(ValidationError::LatitudeOutOfRange(_))
        ));
    }

    #[test]
    fn location_rejects_out_of_range_longitude() {
        let result = GeoLocation::new(0.0, -180.1, "Nowhere");
        assert!(matches!(
            result,
            Err(ValidationError::LongitudeOutOfRange(_))
        ));
    }

    #[test]
    fn locations_compare_structurally() {
        let a = GeoLocation::new(-33.8, 151.2, "Sydney").unwrap();
        let b = GeoLocation::new(-33.8, 151.2, "Sydney").unwrap();
        let c = GeoLocation::new(-33.8, 151.2, "Elsewhere").unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn community_ids_are_unique() {
        assert_ne!(CommunityId::generate(), CommunityId::generate());
    }
}
