//! Upload → transcribe → (gate) → summarize.

pub mod audio;
pub mod flow;
pub mod status;

pub use audio::audio_content_type;
pub use flow::{UploadError, UploadFlow, UploadOutcome};
pub use status::{UploadPhase, UploadState, UploadStatusHandle};
