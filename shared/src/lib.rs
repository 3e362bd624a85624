//! Shared types for the schedule client
//!
//! Contains the wire protocol spoken with the scheduling server: the
//! optimizer's stage enum, event-channel messages and the entity records
//! returned by the CRUD endpoints. Client-internal types (job state,
//! notices, payload) live in the client crate.

pub mod types;
pub mod errors;
pub mod logging;
pub mod messages;

pub use types::*;
pub use errors::*;

// Re-export the wire protocol
pub use messages::{
    // Server → client event channel
    ServerEvent, StatusEvent, ProgressEvent, GenerationInfo, FitnessMetrics,
    ExportEvent, LogEvent, ErrorEvent, ResultsEvent, DownloadableFile, FileKind,

    // Client → server event channel
    ClientEvent,

    // CRUD entity records
    Program, Room, Lecturer, Class, Semester, Subject, TimeSlot,
};
