//! Optimizer input contract
//!
//! A `GenerationPayload` can only be built by [`PayloadPipeline`](super::PayloadPipeline),
//! which guarantees every referenced id resolves inside the payload.

use chrono::NaiveDate;
use serde::Serialize;

use shared::TimeSlot;

/// Canonical room type understood by the optimizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomKind {
    Theory,
    Practice,
}

impl RoomKind {
    /// Map a localized room-type label onto the canonical enum
    pub fn from_label(label: &str) -> Option<Self> {
        let folded = fold_label(label);
        match folded.as_str() {
            "theory" | "lecture" | "lt" | "ly thuyet" | "phong ly thuyet" | "phong hoc" => Some(RoomKind::Theory),
            "practice" | "lab" | "laboratory" | "th" | "thuc hanh" | "phong thuc hanh" | "phong may" => {
                Some(RoomKind::Practice)
            }
            other if other.contains("ly thuyet") => Some(RoomKind::Theory),
            other if other.contains("thuc hanh") => Some(RoomKind::Practice),
            _ => None,
        }
    }
}

/// Lowercase, trim, collapse whitespace and strip Vietnamese diacritics
pub(crate) fn fold_label(label: &str) -> String {
    let lowered: String = label.trim().to_lowercase().chars().map(strip_diacritic).collect();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'ả' | 'ã' | 'ạ' | 'ă' | 'ắ' | 'ằ' | 'ẳ' | 'ẵ' | 'ặ' | 'â' | 'ấ' | 'ầ' | 'ẩ' | 'ẫ' | 'ậ' => 'a',
        'è' | 'é' | 'ẻ' | 'ẽ' | 'ẹ' | 'ê' | 'ế' | 'ề' | 'ể' | 'ễ' | 'ệ' => 'e',
        'ì' | 'í' | 'ỉ' | 'ĩ' | 'ị' => 'i',
        'ò' | 'ó' | 'ỏ' | 'õ' | 'ọ' | 'ô' | 'ố' | 'ồ' | 'ổ' | 'ỗ' | 'ộ' | 'ơ' | 'ớ' | 'ờ' | 'ở' | 'ỡ' | 'ợ' => 'o',
        'ù' | 'ú' | 'ủ' | 'ũ' | 'ụ' | 'ư' | 'ứ' | 'ừ' | 'ử' | 'ữ' | 'ự' => 'u',
        'ỳ' | 'ý' | 'ỷ' | 'ỹ' | 'ỵ' => 'y',
        'đ' => 'd',
        other => other,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadClass {
    pub class_id: String,
    pub size: u32,
    pub program_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadRoom {
    pub room_id: String,
    #[serde(rename = "type")]
    pub kind: RoomKind,
    pub capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadLecturer {
    pub lecturer_id: String,
    pub lecturer_name: String,
    pub subjects: Vec<String>,
    pub busy_slots: Vec<serde_json::Value>,
    pub semester_busy_slots: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramSemester {
    pub semester_id: String,
    pub subject_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadProgram {
    pub program_id: String,
    pub program_name: String,
    pub duration: u32,
    pub semesters: Vec<ProgramSemester>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadSemester {
    pub semester_id: String,
    pub subject_ids: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub duration_weeks: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadSubject {
    pub subject_id: String,
    pub name: String,
    pub theory_hours: u32,
    pub practice_hours: u32,
}

/// Input of the generate endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationPayload {
    classes: Vec<PayloadClass>,
    rooms: Vec<PayloadRoom>,
    lecturers: Vec<PayloadLecturer>,
    programs: Vec<PayloadProgram>,
    semesters: Vec<PayloadSemester>,
    subjects: Vec<PayloadSubject>,
    time_slots: Vec<TimeSlot>,
    days_of_week: Vec<String>,
}

impl GenerationPayload {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        classes: Vec<PayloadClass>,
        rooms: Vec<PayloadRoom>,
        lecturers: Vec<PayloadLecturer>,
        programs: Vec<PayloadProgram>,
        semesters: Vec<PayloadSemester>,
        subjects: Vec<PayloadSubject>,
        time_slots: Vec<TimeSlot>,
        days_of_week: Vec<String>,
    ) -> Self {
        Self {
            classes,
            rooms,
            lecturers,
            programs,
            semesters,
            subjects,
            time_slots,
            days_of_week,
        }
    }

    pub fn classes(&self) -> &[PayloadClass] {
        &self.classes
    }

    pub fn rooms(&self) -> &[PayloadRoom] {
        &self.rooms
    }

    pub fn lecturers(&self) -> &[PayloadLecturer] {
        &self.lecturers
    }

    pub fn programs(&self) -> &[PayloadProgram] {
        &self.programs
    }

    pub fn semesters(&self) -> &[PayloadSemester] {
        &self.semesters
    }

    pub fn subjects(&self) -> &[PayloadSubject] {
        &self.subjects
    }

    pub fn time_slots(&self) -> &[TimeSlot] {
        &self.time_slots
    }

    pub fn days_of_week(&self) -> &[String] {
        &self.days_of_week
    }
}
