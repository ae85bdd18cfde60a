use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateFeedbackRequest {
    pub user_name: String,
    pub feedback: String,
    pub prediction_made: String,
    pub correct_prediction: String,
}

#[derive(Debug, Serialize)]
pub struct FeedbackCreatedDetail {
    pub message: String,
    pub feedback_id: Uuid,
    pub status_code: u16,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackTally {
    pub total_quantity: u32,
    pub total_quantity_correct: u32,
}

#[derive(Debug, Serialize)]
pub struct FeedbackSummaryDetail {
    pub message: String,
    pub feedbacks: BTreeMap<String, FeedbackTally>,
    pub status_code: u16,
}
