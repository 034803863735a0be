//! Domain model for a person node in the family graph.
//!
//! Relationship fields are denormalized onto each document: a parent lists
//! its children and a child points back at father/mother, spouse lists are
//! kept on both sides. The person service is responsible for keeping those
//! mirrored edges consistent; nothing here enforces it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const GENDER_MALE: &str = "male";
pub const GENDER_FEMALE: &str = "female";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,

    /// Full legal name, e.g. "Nguyễn Văn A".
    pub name: String,

    /// Nickname or alternative name, e.g. "Ba Lúa".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Accent-folded copy of `name`, recomputed on every write.
    pub name_normalized: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_normalized: Option<String>,

    /// "male" or "female". Stored as an open string; only those two exact
    /// values drive parent-edge selection.
    pub gender: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<DateTime<Utc>>,

    /// Lunar-calendar birth year label, e.g. "Mậu Dần".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_year_can_chi: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_year_can_chi: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother_id: Option<String>,

    /// Spouse references; order irrelevant, no duplicates.
    #[serde(default)]
    pub spouse_ids: Vec<String>,

    /// Children references; order irrelevant, no duplicates.
    #[serde(default)]
    pub children_ids: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Person {
    pub fn is_male(&self) -> bool {
        self.gender == GENDER_MALE
    }

    pub fn is_female(&self) -> bool {
        self.gender == GENDER_FEMALE
    }
}

/// Payload for creating a person; the server assigns id and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePersonRequest {
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
    pub gender: String,
    #[serde(default)]
    pub birth_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub birth_year_can_chi: Option<String>,
    #[serde(default)]
    pub death_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub death_year_can_chi: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub father_id: Option<String>,
    #[serde(default)]
    pub mother_id: Option<String>,
    #[serde(default)]
    pub spouse_ids: Vec<String>,
    #[serde(default)]
    pub children_ids: Vec<String>,
}

/// Sparse update payload. Omitted fields keep their stored value; the spouse
/// and children lists are wholesale-replaced when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePersonRequest {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub birth_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub birth_year_can_chi: Option<String>,
    #[serde(default)]
    pub death_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub death_year_can_chi: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub father_id: Option<String>,
    #[serde(default)]
    pub mother_id: Option<String>,
    #[serde(default)]
    pub spouse_ids: Option<Vec<String>>,
    #[serde(default)]
    pub children_ids: Option<Vec<String>>,
}

/// Bundle returned by the family-info read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyInfo {
    pub person: Person,
    pub father: Option<Person>,
    pub mother: Option<Person>,
    pub spouses: Vec<Person>,
    pub children: Vec<Person>,
}
