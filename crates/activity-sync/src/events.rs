//! Fixed mapping from provider event names to canonical transitions.

use database::models::{ActivityType, EnrollmentStatus, LeadStatus};

/// What a provider event translates to locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMapping {
    pub activity: ActivityType,
    pub lead_status: Option<LeadStatus>,
    pub enrollment_status: Option<EnrollmentStatus>,
}

/// Map a provider event type to its local transition.
///
/// Unknown event types map to `None`; the reconciler logs and accepts them
/// without recording anything.
pub fn map_event_type(event_type: &str) -> Option<EventMapping> {
    let mapping = match event_type {
        "emailsSent" => EventMapping {
            activity: ActivityType::EmailSent,
            lead_status: Some(LeadStatus::Contacted),
            enrollment_status: Some(EnrollmentStatus::Active),
        },
        "emailsOpened" => EventMapping {
            activity: ActivityType::EmailOpened,
            lead_status: None,
            enrollment_status: None,
        },
        "emailsClicked" => EventMapping {
            activity: ActivityType::EmailClicked,
            lead_status: None,
            enrollment_status: None,
        },
        "emailsReplied" => EventMapping {
            activity: ActivityType::EmailReplied,
            lead_status: Some(LeadStatus::Replied),
            enrollment_status: Some(EnrollmentStatus::Paused),
        },
        "emailsBounced" => EventMapping {
            activity: ActivityType::EmailBounced,
            lead_status: None,
            enrollment_status: Some(EnrollmentStatus::Completed),
        },
        "emailsUnsubscribed" => EventMapping {
            activity: ActivityType::EmailUnsubscribed,
            lead_status: None,
            enrollment_status: Some(EnrollmentStatus::Completed),
        },
        _ => return None,
    };

    Some(mapping)
}
