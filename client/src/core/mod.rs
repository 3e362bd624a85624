//! Core business logic for the schedule client
//!
//! Pure transformations with no I/O:
//! - `payload`: the optimizer input contract
//! - `pipeline`: selections + entity records → payload

pub mod payload;
pub mod pipeline;

pub use payload::{
    GenerationPayload, PayloadClass, PayloadLecturer, PayloadProgram, PayloadRoom,
    PayloadSemester, PayloadSubject, ProgramSemester, RoomKind,
};
pub use pipeline::PayloadPipeline;
