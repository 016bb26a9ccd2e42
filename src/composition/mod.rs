//! # Composition Module
//!
//! Lays the clips out on a timeline and drives the render pipeline.

pub mod engine;
pub mod timeline;

pub use engine::CompositionEngine;
pub use timeline::{Overlay, SegmentInfo, Timeline};
