// ============================================================================
// Community Domain - Business Logic for the Community Aggregate
// ============================================================================
//
// This module contains ALL Community-specific code:
// - Value objects (CommunityId, CommunityName, Description, GeoLocation)
// - Events (CommunityCreated, MemberJoined, StoryAdded, ...)
// - Commands (RegisterCommunity, CommunityCommand)
// - Errors (ValidationError, CommunityError)
// - Aggregate (Community with business logic and the event outbox)
// - Command Handler (CommunityCommandHandler)
//
// This is completely separate from the generic aggregate infrastructure.
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod snapshot;
pub mod command_handler;

// Re-export for convenience
pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use snapshot::*;
pub use command_handler::*;
