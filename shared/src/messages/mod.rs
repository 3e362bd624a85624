//! Message types exchanged with the scheduling server
//!
//! - `events`: the duplex event channel (optimizer status, progress, exports)
//! - `entities`: records returned by the CRUD endpoints, input to the payload pipeline

pub mod events;
pub mod entities;

pub use events::{
    ServerEvent, StatusEvent, ProgressEvent, GenerationInfo, FitnessMetrics,
    ExportEvent, LogEvent, ErrorEvent, ResultsEvent, DownloadableFile, FileKind,
    ClientEvent,
};

pub use entities::{Program, Room, Lecturer, Class, Semester, Subject, TimeSlot};
