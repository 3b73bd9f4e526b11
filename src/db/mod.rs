//! Table names and typed rows for the hosted database.
//!
//! The schema lives on the platform; this module only mirrors the columns
//! the handlers read and write.

mod models;

pub use models::*;

pub const PROFILES: &str = "profiles";
pub const INFLUENCERS: &str = "influencers";
pub const BRANDS: &str = "brands";
pub const TASKS: &str = "tasks";
pub const TASK_ASSIGNMENTS: &str = "task_assignments";
pub const CAMPAIGNS: &str = "campaigns";
pub const CAMPAIGN_PARTICIPANTS: &str = "campaign_participants";
pub const VIDEO_SUBMISSIONS: &str = "video_submissions";

/// Every table the service touches, in dependency order.
pub const ALL_TABLES: &[&str] = &[
    PROFILES,
    INFLUENCERS,
    BRANDS,
    TASKS,
    TASK_ASSIGNMENTS,
    CAMPAIGNS,
    CAMPAIGN_PARTICIPANTS,
    VIDEO_SUBMISSIONS,
];
