//! Acorde Core - DSP primitives for the acorde synthesizer
//!
//! This crate provides the low-level building blocks the synthesizer engine is
//! assembled from, designed for real-time rendering with zero allocation in
//! the audio path.
//!
//! # Parameter Smoothing
//!
//! Live parameter changes (filter cutoff from a UI slider, gain
//! redistribution as voices come and go) must not jump discontinuously or
//! they produce audible zipper noise and clicks:
//!
//! - [`SmoothedParam`] - Exponential one-pole smoothing, used for frequency
//!   glides, mix levels, and filter parameters
//! - [`LinearSmoothedParam`] - Linear ramp with an exact duration and end
//!   snap, used where a transition must complete at a known time (gain
//!   crossfades between voices)
//!
//! # Filter
//!
//! - [`StateVariableFilter`] - Topology-preserving-transform SVF producing
//!   lowpass, highpass, bandpass, and notch responses from one state pair
//!
//! # Utilities
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Level conversions
//! - [`flush_denormal`] - Denormal protection for recursive filter state
//! - [`ms_to_samples`] / [`lerp`]
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! acorde-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod math;
pub mod param;
pub mod svf;

pub use math::{db_to_linear, flush_denormal, lerp, linear_to_db, ms_to_samples};
pub use param::{LinearSmoothedParam, SmoothedParam};
pub use svf::{StateVariableFilter, SvfOutputs};
