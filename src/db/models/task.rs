//! Tasks and monthly task assignments.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{deserialize_id, deserialize_opt_id, row_status};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub guidelines: Option<String>,
    #[serde(default)]
    pub reward_amount: f64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub guidelines: Option<String>,
    #[serde(default)]
    pub reward_amount: f64,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
    #[serde(rename = "default")]
    pub is_default: Option<bool>,
}

row_status!(AssignmentStatus {
    Assigned => "assigned",
    InProgress => "in_progress",
    Submitted => "submitted",
    Completed => "completed",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAssignment {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub influencer_id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub task_id: String,
    pub month: u32,
    pub year: i32,
    pub status: AssignmentStatus,
    #[serde(default)]
    pub assigned_at: Option<String>,
    /// Embedded `tasks(*)` when selected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Value>,
    /// Embedded `influencers(full_name,email)` when selected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub influencers: Option<Value>,
}

/// Admin form for assigning one task. Fields arrive as strings from the
/// form's select inputs; empty means "nothing selected".
#[derive(Debug, Deserialize)]
pub struct CreateAssignmentRequest {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub influencer_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub task_id: Option<String>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct AssignDefaultsRequest {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub influencer_id: Option<String>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct AssignmentListQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub influencer_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_from_row() {
        let task: Task = serde_json::from_value(json!({
            "id": 3,
            "title": "Unboxing video",
            "description": "Film an unboxing",
            "topic": "tech",
            "guidelines": null,
            "reward_amount": 150.5,
            "created_at": "2026-03-01T10:00:00Z",
            "month": 3,
            "year": 2026,
            "is_default": true
        }))
        .unwrap();

        assert_eq!(task.id, "3");
        assert!(task.is_default);
        assert!(task.guidelines.is_none());
        assert_eq!(task.month, Some(3));
    }

    #[test]
    fn test_assignment_request_accepts_string_and_numeric_ids() {
        let req: CreateAssignmentRequest =
            serde_json::from_value(json!({ "influencer_id": "", "task_id": 9 })).unwrap();
        assert_eq!(req.influencer_id.as_deref(), Some(""));
        assert_eq!(req.task_id.as_deref(), Some("9"));
        assert!(req.month.is_none());
    }

    #[test]
    fn test_assignment_status_serde() {
        assert_eq!(
            serde_json::to_value(AssignmentStatus::InProgress).unwrap(),
            json!("in_progress")
        );
        assert_eq!(AssignmentStatus::Assigned.to_string(), "assigned");
    }
}
