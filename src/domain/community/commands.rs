use chrono::NaiveDate;
use uuid::Uuid;

// ============================================================================
// Community Domain Commands
// ============================================================================
//
// Commands carry primitive input from the application layer; value objects
// are constructed (and validated) by the command handler before the
// aggregate sees them.
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct RegisterCommunity {
    pub name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub founded_date: NaiveDate,
}

/// Commands against an existing community.
#[derive(Debug, Clone)]
pub enum CommunityCommand {
    UpdateDetails {
        name: Option<String>,
        description: Option<String>,
        location: Option<(f64, f64, String)>,
    },
    AddMember {
        member_id: Uuid,
        member_name: String,
    },
    AddStory {
        story_id: Uuid,
        impact_value: f64,
    },
    Deactivate,
    Reactivate,
}
