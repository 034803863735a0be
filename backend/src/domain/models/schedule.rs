//! Weekly class schedules.
//!
//! A schedule pins one classroom to one (academic year, semester, week)
//! slot and carries the full 7-day grid as an embedded document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    pub classroom_id: String,
    /// Academic year label such as "2024-2025".
    pub academic_year: String,
    /// 1 or 2.
    pub semester: i64,
    /// Week number within the year (1–40+).
    pub week: i64,
    /// Monday through Sunday, in order.
    #[serde(default)]
    pub days: Vec<ScheduleDay>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDay {
    /// 1 = Monday ... 7 = Sunday.
    pub day_of_week: i64,
    #[serde(default)]
    pub morning: Vec<SchedulePeriod>,
    #[serde(default)]
    pub afternoon: Vec<SchedulePeriod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulePeriod {
    /// Period slot within the half-day (1–5).
    pub period: i64,
    pub subject_id: String,
    pub teacher_id: String,
    /// Set when the period runs in a different room than the schedule's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classroom_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Free-text note, e.g. substitution or cancellation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleRequest {
    pub classroom_id: String,
    pub academic_year: String,
    pub semester: i64,
    pub week: i64,
    #[serde(default)]
    pub days: Vec<ScheduleDay>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateScheduleRequest {
    pub id: String,
    #[serde(default)]
    pub classroom_id: Option<String>,
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default)]
    pub semester: Option<i64>,
    #[serde(default)]
    pub week: Option<i64>,
    #[serde(default)]
    pub days: Option<Vec<ScheduleDay>>,
}

impl UpdateScheduleRequest {
    pub fn is_empty(&self) -> bool {
        self.classroom_id.is_none()
            && self.academic_year.is_none()
            && self.semester.is_none()
            && self.week.is_none()
            && self.days.is_none()
    }
}
