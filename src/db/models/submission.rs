//! Video submissions: an influencer's proof of work for an assignment.

use serde::{Deserialize, Serialize};

use super::common::{deserialize_id, deserialize_opt_id, row_status};

row_status!(SubmissionStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSubmission {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub assignment_id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub influencer_id: String,
    pub video_url: String,
    #[serde(default)]
    pub caption: Option<String>,
    pub status: SubmissionStatus,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSubmissionRequest {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub assignment_id: Option<String>,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmissionListQuery {
    pub status: Option<SubmissionStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewSubmissionRequest {
    pub status: SubmissionStatus,
    #[serde(default)]
    pub feedback: Option<String>,
}
