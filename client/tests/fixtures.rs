//! Test fixtures for client integration tests

#![allow(dead_code)]

use serde_json::{json, Value};

/// Entity collections as the admin screens export them
pub fn schedule_data_json() -> Value {
    json!({
        "programs": [
            { "program_id": "CNTT", "program_name": "Công nghệ thông tin", "duration": 8, "semester_ids": ["HK1", "HK2"] },
            { "program_id": "KT", "program_name": "Kế toán", "duration": 8, "semester_ids": ["HK3"] }
        ],
        "rooms": [
            { "room_id": "A101", "type": "Lý thuyết", "capacity": 80 },
            { "room_id": "B201", "type": "Phòng thực hành", "capacity": 40 }
        ],
        "lecturers": [
            { "lecturer_id": "GV01", "lecturer_name": "Nguyễn Văn A", "subjects": ["CTDL", "KTVM"] },
            { "lecturer_id": "GV02", "lecturer_name": "Lê Thị C", "subjects": ["MMT"], "busy_slots": [{ "day": "Monday", "slot": "S1" }] }
        ],
        "classes": [
            { "class_id": "CNTT-K20A", "size": 60, "program_id": "CNTT" },
            { "class_id": "KT-K20A", "size": 50, "program_id": "KT" }
        ],
        "semesters": [
            { "semester_id": "HK1", "subject_ids": ["CTDL"], "start_date": "2024-09-02", "end_date": "2024-12-20" },
            { "semester_id": "HK2", "subject_ids": ["MMT", "CTDL"] },
            { "semester_id": "HK3", "subject_ids": ["KTVM"], "duration_weeks": 12 }
        ],
        "subjects": [
            { "subject_id": "CTDL", "name": "Cấu trúc dữ liệu", "subject_type": "theory" },
            { "subject_id": "MMT", "name": "Mạng máy tính", "subject_type": "thực hành" },
            { "subject_id": "KTVM", "name": "Kinh tế vi mô" }
        ],
        "time_slots": [
            { "slot_id": "S1", "start": "07:00", "end": "09:30", "type": "morning" }
        ]
    })
}

pub fn downloadable_file_json(name: &str, kind: &str) -> Value {
    json!({
        "name": name,
        "path": format!("/exports/{name}"),
        "type": kind,
        "timestamp": "2024-09-01T08:00:00Z"
    })
}
