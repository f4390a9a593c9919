//! Procedural music engine
//!
//! - `sequencer`: lookahead step sequencer (which notes, when)
//! - `scheduler`: wall-clock timer thread feeding the sequencer's output to the mixer
//! - `synth`: fire-and-forget tone and noise triggers
//! - `mixer`: real-time voice rendering and the audio clock
//! - `analyser`: spectrum loudness for reactive visuals
//! - `output`: cpal device binding

pub mod analyser;
pub mod event;
pub mod mixer;
pub mod output;
pub mod scheduler;
pub mod sequencer;
pub mod synth;
pub mod voice;

use thiserror::Error;

pub use analyser::SpectrumAnalyser;
pub use event::{ScheduledEvent, Voice, Waveform};
pub use mixer::{Mixer, SharedMixer};
pub use output::AudioOutput;
pub use scheduler::Scheduler;
pub use sequencer::{Pattern, Sequencer, SequencerState};
pub use synth::Synthesizer;

/// Failures opening the audio output. Never raised once running.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device found")]
    NoDevice,
    #[error("unsupported sample format {0}")]
    UnsupportedFormat(String),
    #[error("failed to query output config: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),
    #[error("failed to build audio stream: {0}")]
    Build(#[from] cpal::BuildStreamError),
    #[error("failed to start audio stream: {0}")]
    Play(#[from] cpal::PlayStreamError),
}
