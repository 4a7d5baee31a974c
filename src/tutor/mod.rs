//! Tutoring core: prompt templates, student context, mock replies, and the
//! service that ties them to an LLM provider.

pub mod context;
pub mod gadie;
pub mod mock;
pub mod prompt;
pub mod service;

pub use context::{ContextBuilder, ContextSettings};
pub use gadie::{GadieContext, LessonPhase, PromptStyle};
pub use service::{TutorReply, TutorRequest, TutorService, TutorSettings};
