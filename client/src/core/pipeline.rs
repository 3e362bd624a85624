//! Selections + entity records → `GenerationPayload`
//!
//! Semesters and subjects are never selected directly; they are whatever the
//! selected programs reach. Any reference that does not resolve refuses the
//! whole payload.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use tracing::debug;

use shared::{component_info, ComponentId, Semester, Subject};

use super::payload::{
    fold_label, GenerationPayload, PayloadClass, PayloadLecturer, PayloadProgram, PayloadRoom,
    PayloadSemester, PayloadSubject, ProgramSemester, RoomKind,
};
use crate::config::PipelineConfig;
use crate::error::ValidationError;
use crate::types::{ScheduleData, Selection, SelectionSet};

#[derive(Debug, Clone, Default)]
pub struct PayloadPipeline {
    config: PipelineConfig,
}

impl PayloadPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, data: &ScheduleData, selection: &SelectionSet) -> Result<GenerationPayload, ValidationError> {
        let programs = select(&data.programs, &selection.programs, |p| &p.program_id);
        let rooms = select(&data.rooms, &selection.rooms, |r| &r.room_id);
        let lecturers = select(&data.lecturers, &selection.lecturers, |l| &l.lecturer_id);
        let classes = select(&data.classes, &selection.classes, |c| &c.class_id);

        for (collection, len) in [
            ("programs", programs.len()),
            ("rooms", rooms.len()),
            ("lecturers", lecturers.len()),
            ("classes", classes.len()),
        ] {
            if len == 0 {
                return Err(ValidationError::EmptySelection { collection });
            }
        }

        let semester_index: HashMap<&str, &Semester> =
            data.semesters.iter().map(|s| (s.semester_id.as_str(), s)).collect();
        let subject_index: HashMap<&str, &Subject> =
            data.subjects.iter().map(|s| (s.subject_id.as_str(), s)).collect();

        // programs → semesters
        let mut reached_semesters: Vec<&Semester> = Vec::new();
        let mut seen_semesters = HashSet::new();
        let mut payload_programs = Vec::with_capacity(programs.len());
        for program in &programs {
            let mut semesters = Vec::with_capacity(program.semester_ids.len());
            for semester_id in &program.semester_ids {
                let semester = semester_index.get(semester_id.as_str()).ok_or_else(|| {
                    ValidationError::UnresolvedReference {
                        from_kind: "program",
                        from_id: program.program_id.clone(),
                        to_kind: "semester",
                        to_id: semester_id.clone(),
                    }
                })?;
                if seen_semesters.insert(semester.semester_id.as_str()) {
                    reached_semesters.push(semester);
                }
                semesters.push(ProgramSemester {
                    semester_id: semester.semester_id.clone(),
                    subject_ids: semester.subject_ids.clone(),
                });
            }
            payload_programs.push(PayloadProgram {
                program_id: program.program_id.clone(),
                program_name: program.program_name.clone(),
                duration: program.duration,
                semesters,
            });
        }

        // semesters → subjects
        let mut reached_subjects: Vec<&Subject> = Vec::new();
        let mut seen_subjects = HashSet::new();
        for semester in &reached_semesters {
            for subject_id in &semester.subject_ids {
                let subject = subject_index.get(subject_id.as_str()).ok_or_else(|| {
                    ValidationError::UnresolvedReference {
                        from_kind: "semester",
                        from_id: semester.semester_id.clone(),
                        to_kind: "subject",
                        to_id: subject_id.clone(),
                    }
                })?;
                if seen_subjects.insert(subject.subject_id.as_str()) {
                    reached_subjects.push(subject);
                }
            }
        }

        let selected_programs: HashSet<&str> = programs.iter().map(|p| p.program_id.as_str()).collect();
        let payload_classes = classes
            .iter()
            .map(|class| {
                if !selected_programs.contains(class.program_id.as_str()) {
                    return Err(ValidationError::UnresolvedReference {
                        from_kind: "class",
                        from_id: class.class_id.clone(),
                        to_kind: "program",
                        to_id: class.program_id.clone(),
                    });
                }
                Ok(PayloadClass {
                    class_id: class.class_id.clone(),
                    size: class.size,
                    program_id: class.program_id.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let payload_rooms = rooms
            .iter()
            .map(|room| {
                let kind = RoomKind::from_label(&room.room_type).ok_or_else(|| ValidationError::UnknownRoomType {
                    room_id: room.room_id.clone(),
                    label: room.room_type.clone(),
                })?;
                Ok(PayloadRoom {
                    room_id: room.room_id.clone(),
                    kind,
                    capacity: room.capacity,
                })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        let payload_lecturers = lecturers
            .iter()
            .map(|lecturer| {
                let mut seen = HashSet::new();
                let subjects: Vec<String> = lecturer
                    .subject_ids
                    .iter()
                    .filter(|id| seen_subjects.contains(id.as_str()) && seen.insert(id.as_str()))
                    .cloned()
                    .collect();
                if subjects.len() < lecturer.subject_ids.len() {
                    debug!(
                        "Lecturer {} narrowed from {} to {} subjects",
                        lecturer.lecturer_id,
                        lecturer.subject_ids.len(),
                        subjects.len()
                    );
                }
                PayloadLecturer {
                    lecturer_id: lecturer.lecturer_id.clone(),
                    lecturer_name: lecturer.lecturer_name.clone(),
                    subjects,
                    busy_slots: lecturer.busy_slots.clone().unwrap_or_default(),
                    semester_busy_slots: lecturer.semester_busy_slots.clone().unwrap_or_default(),
                }
            })
            .collect();

        let payload_semesters = reached_semesters
            .iter()
            .map(|semester| PayloadSemester {
                semester_id: semester.semester_id.clone(),
                subject_ids: semester.subject_ids.clone(),
                start_date: semester.start_date,
                end_date: semester.end_date,
                duration_weeks: self.duration_weeks(semester),
            })
            .collect();

        let payload_subjects = reached_subjects
            .iter()
            .map(|subject| {
                let (theory, practice) = self.default_hours(subject.subject_type.as_deref());
                PayloadSubject {
                    subject_id: subject.subject_id.clone(),
                    name: subject.name.clone(),
                    theory_hours: subject.theory_hours.unwrap_or(theory),
                    practice_hours: subject.practice_hours.unwrap_or(practice),
                }
            })
            .collect::<Vec<_>>();

        component_info!(
            ComponentId::Pipeline,
            "📦 Built payload: {} programs, {} semesters, {} subjects, {} classes, {} rooms, {} lecturers",
            payload_programs.len(),
            reached_semesters.len(),
            payload_subjects.len(),
            payload_classes.len(),
            payload_rooms.len(),
            lecturers.len()
        );

        Ok(GenerationPayload::new(
            payload_classes,
            payload_rooms,
            payload_lecturers,
            payload_programs,
            payload_semesters,
            payload_subjects,
            data.time_slots.clone(),
            self.config.days_of_week.clone(),
        ))
    }

    fn duration_weeks(&self, semester: &Semester) -> u32 {
        semester
            .duration_weeks
            .or_else(|| match (semester.start_date, semester.end_date) {
                (Some(start), Some(end)) => weeks_between(start, end),
                _ => None,
            })
            .unwrap_or(self.config.default_duration_weeks)
    }

    fn default_hours(&self, subject_type: Option<&str>) -> (u32, u32) {
        let folded = subject_type.map(fold_label).unwrap_or_default();
        match folded.as_str() {
            "theory" | "lt" | "ly thuyet" => self.config.theory_subject_hours,
            "practice" | "th" | "thuc hanh" => self.config.practice_subject_hours,
            _ => self.config.mixed_subject_hours,
        }
    }
}

fn select<'a, T>(records: &'a [T], selection: &Selection, id: impl Fn(&T) -> &String) -> Vec<&'a T> {
    records.iter().filter(|record| selection.includes(id(record))).collect()
}

/// Days from `start` to `end` (end exclusive) in weeks, rounded up; `None` when
/// the range is empty or inverted
fn weeks_between(start: NaiveDate, end: NaiveDate) -> Option<u32> {
    let days = (end - start).num_days();
    if days <= 0 {
        return None;
    }
    u32::try_from((days + 6) / 7).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Class, Lecturer, Program, Room};

    fn program(id: &str, semesters: &[&str]) -> Program {
        Program {
            program_id: id.to_string(),
            program_name: format!("Program {id}"),
            duration: 8,
            semester_ids: semesters.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn semester(id: &str, subjects: &[&str]) -> Semester {
        Semester {
            semester_id: id.to_string(),
            subject_ids: subjects.iter().map(|s| s.to_string()).collect(),
            start_date: None,
            end_date: None,
            duration_weeks: None,
        }
    }

    fn subject(id: &str, subject_type: Option<&str>) -> Subject {
        Subject {
            subject_id: id.to_string(),
            name: format!("Subject {id}"),
            subject_type: subject_type.map(str::to_string),
            theory_hours: None,
            practice_hours: None,
        }
    }

    fn sample_data() -> ScheduleData {
        ScheduleData {
            programs: vec![program("P1", &["S1", "S2"]), program("P2", &["S2", "S3"])],
            rooms: vec![
                Room { room_id: "R1".into(), room_type: "Lý thuyết".into(), capacity: 60 },
                Room { room_id: "R2".into(), room_type: "Thực hành".into(), capacity: 30 },
            ],
            lecturers: vec![Lecturer {
                lecturer_id: "L1".into(),
                lecturer_name: "Nguyen Van A".into(),
                subject_ids: vec!["SUB1".into(), "SUB9".into(), "SUB1".into()],
                busy_slots: None,
                semester_busy_slots: None,
            }],
            classes: vec![
                Class { class_id: "C1".into(), size: 40, program_id: "P1".into() },
                Class { class_id: "C2".into(), size: 35, program_id: "P2".into() },
            ],
            semesters: vec![
                semester("S1", &["SUB1", "SUB2"]),
                semester("S2", &["SUB2", "SUB3"]),
                semester("S3", &["SUB4"]),
            ],
            subjects: vec![
                subject("SUB1", Some("theory")),
                subject("SUB2", Some("Thực hành")),
                subject("SUB3", None),
                subject("SUB4", None),
                subject("SUB9", None),
            ],
            time_slots: vec![],
        }
    }

    #[test]
    fn test_semesters_and_subjects_follow_selected_programs() {
        let selection = SelectionSet {
            programs: Selection::only(["P1"]),
            classes: Selection::only(["C1"]),
            ..Default::default()
        };
        let payload = PayloadPipeline::default().build(&sample_data(), &selection).unwrap();

        let semesters: Vec<_> = payload.semesters().iter().map(|s| s.semester_id.as_str()).collect();
        assert_eq!(semesters, vec!["S1", "S2"]);

        let subjects: Vec<_> = payload.subjects().iter().map(|s| s.subject_id.as_str()).collect();
        assert_eq!(subjects, vec!["SUB1", "SUB2", "SUB3"]);

        // SUB9 is not reachable from P1, duplicates collapse
        assert_eq!(payload.lecturers()[0].subjects, vec!["SUB1".to_string()]);
        assert!(payload.lecturers()[0].busy_slots.is_empty());
    }

    #[test]
    fn test_shared_semester_is_emitted_once() {
        let payload = PayloadPipeline::default()
            .build(&sample_data(), &SelectionSet::default())
            .unwrap();

        let semesters: Vec<_> = payload.semesters().iter().map(|s| s.semester_id.as_str()).collect();
        assert_eq!(semesters, vec!["S1", "S2", "S3"]);
        assert_eq!(payload.programs()[1].semesters.len(), 2);
    }

    #[test]
    fn test_empty_selection_is_refused_in_order() {
        let selection = SelectionSet {
            rooms: Selection::only(Vec::<String>::new()),
            classes: Selection::only(Vec::<String>::new()),
            ..Default::default()
        };
        let error = PayloadPipeline::default().build(&sample_data(), &selection).unwrap_err();
        assert_eq!(error, ValidationError::EmptySelection { collection: "rooms" });
    }

    #[test]
    fn test_empty_classes_collection_is_refused() {
        let mut data = sample_data();
        data.classes.clear();
        let error = PayloadPipeline::default().build(&data, &SelectionSet::default()).unwrap_err();
        assert_eq!(error, ValidationError::EmptySelection { collection: "classes" });
    }

    #[test]
    fn test_class_of_unselected_program_is_refused() {
        let selection = SelectionSet {
            programs: Selection::only(["P1"]),
            ..Default::default()
        };
        let error = PayloadPipeline::default().build(&sample_data(), &selection).unwrap_err();
        assert_eq!(
            error,
            ValidationError::UnresolvedReference {
                from_kind: "class",
                from_id: "C2".into(),
                to_kind: "program",
                to_id: "P2".into(),
            }
        );
    }

    #[test]
    fn test_unknown_semester_is_refused() {
        let mut data = sample_data();
        data.programs[0].semester_ids.push("S404".into());
        let error = PayloadPipeline::default().build(&data, &SelectionSet::default()).unwrap_err();
        assert!(matches!(
            error,
            ValidationError::UnresolvedReference { to_kind: "semester", ref to_id, .. } if to_id == "S404"
        ));
    }

    #[test]
    fn test_unknown_room_label_is_refused() {
        let mut data = sample_data();
        data.rooms[1].room_type = "Hội trường".into();
        let error = PayloadPipeline::default().build(&data, &SelectionSet::default()).unwrap_err();
        assert_eq!(
            error,
            ValidationError::UnknownRoomType { room_id: "R2".into(), label: "Hội trường".into() }
        );
    }

    #[test]
    fn test_defaults_are_applied() {
        let mut data = sample_data();
        data.semesters[0].start_date = NaiveDate::from_ymd_opt(2024, 9, 2);
        data.semesters[0].end_date = NaiveDate::from_ymd_opt(2024, 12, 20);
        data.subjects[2].practice_hours = Some(20);

        let payload = PayloadPipeline::default().build(&data, &SelectionSet::default()).unwrap();

        // 109 days
        assert_eq!(payload.semesters()[0].duration_weeks, 16);
        assert_eq!(payload.semesters()[1].duration_weeks, 15);

        let hours: Vec<_> = payload.subjects().iter().map(|s| (s.theory_hours, s.practice_hours)).collect();
        assert_eq!(hours[0], (45, 0));
        assert_eq!(hours[1], (0, 45));
        assert_eq!(hours[2], (30, 20));
        assert_eq!(payload.days_of_week().len(), 6);
        assert_eq!(payload.rooms()[0].kind, RoomKind::Theory);
    }

    #[test]
    fn test_weeks_between() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(weeks_between(start, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()), Some(1));
        assert_eq!(weeks_between(start, NaiveDate::from_ymd_opt(2024, 1, 9).unwrap()), Some(2));
        assert_eq!(weeks_between(start, start), None);
    }
}
