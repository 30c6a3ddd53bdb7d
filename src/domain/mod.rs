// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// This module contains domain-specific aggregates and business logic.
// Each aggregate has its own subdirectory with:
// - Value objects
// - Events
// - Commands
// - Errors
// - Aggregate implementation
// - Snapshot
// - Command handler
//
// This layer is completely separate from the aggregate infrastructure.
//
// ============================================================================

pub mod community;

// Future aggregates can be added here:
// pub mod member;
// pub mod story;
