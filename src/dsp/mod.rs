//! DSP building blocks for the control core.
//!
//! Nothing here renders audio. These modules compute what the audio graph
//! is asked to do: automation curves, envelope schedules, pitch, filter and
//! mix values, and the reverb impulse.

pub mod automation;
pub mod envelope;
pub mod filter;
pub mod mixer;
pub mod oscillator;
pub mod reverb;
