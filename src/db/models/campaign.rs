//! Brands, their campaigns and campaign participation.

use serde::{Deserialize, Serialize};

use super::common::{deserialize_id, deserialize_opt_id, row_status};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brand {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub user_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// The embedded `brands(name)` join on a campaign row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandSummary {
    pub name: String,
}

row_status!(CampaignStatus {
    Draft => "draft",
    Active => "active",
    Paused => "paused",
    Completed => "completed",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub brand_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub budget: f64,
    pub status: CampaignStatus,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brands: Option<BrandSummary>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    /// Required for admins; brands always create under their own brand
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub brand_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub budget: f64,
    #[serde(default)]
    pub status: Option<CampaignStatus>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignParticipant {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub campaign_id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub influencer_id: String,
    pub status: String,
    #[serde(default)]
    pub joined_at: Option<String>,
}
