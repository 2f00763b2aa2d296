//! Vitrum Visual Test Suite
//!
//! Visual regression testing for liquid glass rendering. Every case paints a
//! background (and optionally a foreground mask), places glass shapes, renders
//! through the CPU reference renderer and compares against a reference PNG.
//!
//! # Test Categories
//!
//! - **shapes**: each primitive kind on its own
//! - **blending**: smooth unions between neighbouring shapes
//! - **glass**: presets, refraction, chromatic aberration and lighting
//! - **mask**: glass reconstructed from a raster coverage mask

pub mod harness;
pub mod runner;
pub mod tests;

pub use harness::{TestContext, TestHarness, TestResult};
pub use runner::TestRunner;
