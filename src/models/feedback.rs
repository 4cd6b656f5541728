// src/models/feedback.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{models::quiz::not_blank, utils::html::strip_markup};

/// Represents the 'feedback' table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Feedback {
    pub id: i64,
    pub team: String,

    /// Star rating from 1 to 5.
    pub rating: i16,
    pub comment: String,
    pub helpful: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub team: String,
    pub rating: i16,
    pub comment: String,
}

/// DTO for submitting feedback after a quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFeedbackRequest {
    #[validate(custom(function = not_blank), length(max = 100))]
    pub team: String,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5."))]
    pub rating: i16,
    #[validate(custom(function = not_blank), length(max = 2000))]
    pub comment: String,
}

impl From<CreateFeedbackRequest> for NewFeedback {
    fn from(req: CreateFeedbackRequest) -> Self {
        Self {
            team: strip_markup(req.team.trim()).trim().to_string(),
            rating: req.rating,
            comment: strip_markup(req.comment.trim()).trim().to_string(),
        }
    }
}
