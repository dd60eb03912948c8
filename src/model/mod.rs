//! Data model shared between the engine and its collaborators

pub mod resume;
pub mod job;
pub mod signal;
pub mod evaluation;

pub use evaluation::{EvaluationResult, EvaluationStatus, Verdict};
pub use job::{JobDescriptionBuilder, ParsedJobDescription};
pub use resume::{DegreeLevel, EducationEntry, ExperienceEntry, ParsedResume};
pub use signal::{MatchSignal, SignalDetail, SignalKind, SignalStatus};
