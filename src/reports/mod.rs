// src/reports/mod.rs

//! Read-side aggregates for the admin panel.

pub mod csv;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    models::{
        feedback::Feedback,
        participant::Participant,
        quiz::{Quiz, QuizStatus},
        quiz_result::QuizResult,
    },
    utils::time::{format_elapsed, parse_elapsed},
};

/// Score buckets shown in the distribution, highest first: (label, lower bound).
const SCORE_BUCKETS: [(&str, f64); 6] = [
    ("90-100", 90.0),
    ("80-89", 80.0),
    ("70-79", 70.0),
    ("60-69", 60.0),
    ("50-59", 50.0),
    ("0-49", 0.0),
];

/// Assigns 1-based ranks in leaderboard order.
///
/// Sorts by score descending; equal scores keep the earlier submission first.
pub fn rank_results(mut results: Vec<QuizResult>) -> Vec<QuizResult> {
    results.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.submitted_at.cmp(&b.submitted_at))
    });
    for (i, result) in results.iter_mut().enumerate() {
        result.rank = i as i32 + 1;
    }
    results
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub range: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultStats {
    pub total_participants: usize,
    pub average_score: f64,
    pub highest_score: f64,
    /// `m:ss`, floor of the mean time taken.
    pub average_time: String,
    pub distribution: Vec<Bucket>,
}

pub fn summarize(results: &[QuizResult]) -> ResultStats {
    let total = results.len();

    let distribution = SCORE_BUCKETS
        .iter()
        .enumerate()
        .map(|(i, (label, low))| {
            let high = if i == 0 { f64::INFINITY } else { SCORE_BUCKETS[i - 1].1 };
            let count = results
                .iter()
                .filter(|r| r.score >= *low && r.score < high)
                .count();
            Bucket {
                range: label.to_string(),
                count,
                percentage: percentage(count, total),
            }
        })
        .collect();

    if total == 0 {
        return ResultStats {
            total_participants: 0,
            average_score: 0.0,
            highest_score: 0.0,
            average_time: format_elapsed(0),
            distribution,
        };
    }

    let average_score = results.iter().map(|r| r.score).sum::<f64>() / total as f64;
    let highest_score = results.iter().map(|r| r.score).fold(f64::MIN, f64::max);

    let seconds: u64 = results
        .iter()
        .map(|r| match parse_elapsed(&r.time_taken) {
            Some(s) => u64::from(s),
            None => {
                tracing::warn!("Result {} has malformed time '{}'", r.id, r.time_taken);
                0
            }
        })
        .sum();
    let average_seconds = u32::try_from(seconds / total as u64).unwrap_or(u32::MAX);

    ResultStats {
        total_participants: total,
        average_score,
        highest_score,
        average_time: format_elapsed(average_seconds),
        distribution,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_teams: usize,
    pub active_quizzes: usize,
    /// Results submitted on the current UTC day.
    pub completed_today: usize,
    pub total_members: usize,
}

pub fn dashboard(
    participants: &[Participant],
    quizzes: &[Quiz],
    results: &[QuizResult],
    now: DateTime<Utc>,
) -> DashboardStats {
    let today = now.date_naive();
    DashboardStats {
        total_teams: participants.len(),
        active_quizzes: quizzes
            .iter()
            .filter(|q| q.status == QuizStatus::Active)
            .count(),
        completed_today: results
            .iter()
            .filter(|r| r.submitted_at.date_naive() == today)
            .count(),
        total_members: participants.iter().map(|p| p.members.len()).sum(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingShare {
    pub rating: i16,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackSummary {
    pub total: usize,
    /// Rounded to one decimal.
    pub average_rating: f64,
    /// Ratings 5 down to 1.
    pub distribution: Vec<RatingShare>,
    /// Whole-number share of ratings of 4 or 5.
    pub positive_percentage: u32,
    pub helpful_total: i64,
}

pub fn summarize_feedback(feedback: &[Feedback]) -> FeedbackSummary {
    let total = feedback.len();

    let average_rating = if total == 0 {
        0.0
    } else {
        let mean = feedback.iter().map(|f| f64::from(f.rating)).sum::<f64>() / total as f64;
        (mean * 10.0).round() / 10.0
    };

    let distribution = (1..=5)
        .rev()
        .map(|rating| {
            let count = feedback.iter().filter(|f| f.rating == rating).count();
            RatingShare {
                rating,
                count,
                percentage: percentage(count, total),
            }
        })
        .collect();

    let positive = feedback.iter().filter(|f| f.rating >= 4).count();

    FeedbackSummary {
        total,
        average_rating,
        distribution,
        positive_percentage: percentage(positive, total).round() as u32,
        helpful_total: feedback.iter().map(|f| i64::from(f.helpful)).sum(),
    }
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64 * 100.0
}
