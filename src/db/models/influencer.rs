//! Influencer profiles and approval state.

use serde::{Deserialize, Serialize};

use super::common::{deserialize_id, deserialize_opt_id, row_status};

row_status!(InfluencerStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Influencer {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub user_id: Option<String>,
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub followers: Option<i64>,
    pub status: InfluencerStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Influencer {
    /// Only approved influencers can be given tasks or join campaigns.
    pub fn is_assignable(&self) -> bool {
        self.status == InfluencerStatus::Approved
    }
}

#[derive(Debug, Deserialize)]
pub struct InfluencerListQuery {
    #[serde(default)]
    pub status: Option<InfluencerStatus>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInfluencerStatusRequest {
    pub status: InfluencerStatus,
}
