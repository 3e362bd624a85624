//! Entity records as returned by the CRUD endpoints
//!
//! Optional fields are the ones the admin screens allow to be left blank;
//! defaults are applied by the payload pipeline, not here.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Program {
    pub program_id: String,
    pub program_name: String,
    /// Program length in semesters
    pub duration: u32,
    #[serde(default)]
    pub semester_ids: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Room {
    pub room_id: String,
    /// Localized label as entered in the admin screen, e.g. "Lý thuyết"
    #[serde(alias = "type")]
    pub room_type: String,
    pub capacity: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Lecturer {
    pub lecturer_id: String,
    pub lecturer_name: String,
    #[serde(default, alias = "subjects")]
    pub subject_ids: Vec<String>,
    #[serde(default)]
    pub busy_slots: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub semester_busy_slots: Option<Vec<serde_json::Value>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Class {
    pub class_id: String,
    pub size: u32,
    pub program_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Semester {
    pub semester_id: String,
    #[serde(default)]
    pub subject_ids: Vec<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub duration_weeks: Option<u32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Subject {
    pub subject_id: String,
    pub name: String,
    /// "theory", "practice" or blank for mixed subjects
    #[serde(default)]
    pub subject_type: Option<String>,
    #[serde(default)]
    pub theory_hours: Option<u32>,
    #[serde(default)]
    pub practice_hours: Option<u32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TimeSlot {
    pub slot_id: String,
    pub start: String,
    pub end: String,
    #[serde(rename = "type")]
    pub slot_type: String,
}
