//! Clip extraction and normalization.
//!
//! A source recording goes through a fixed sequence: downmix, resample,
//! segment selection, duration enforcement and loudness normalization. The
//! [`ClipAssembler`] runs that sequence and writes each clip with its
//! spectrogram; [`command`] wires it to the catalog for the CLI.

mod assembler;
pub mod command;
mod duration;
mod ids;
mod loudness;
mod manifest;
mod request;
mod selector;

pub use assembler::{ClipAssembler, RenderedClip};
pub use duration::{DurationBounds, enforce_duration};
pub use ids::{IdAllocator, IdKey, IdScheme, content_hash_id, sequential_prefix};
pub use loudness::{Normalized, measure_lufs, normalize_loudness};
pub use manifest::{DEFAULT_SOURCE, ManifestEntry, parse_manifest};
pub use request::{ClipRequest, Selection, normalize_species_code, validate_quality};
pub use selector::{SegmentWindow, rms, scan_windows, select_best, select_distinct, step_samples};
