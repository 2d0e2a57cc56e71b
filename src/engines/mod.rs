//! Synthesis backends.
//!
//! Standard text-to-speech models implement [`standard::StandardModel`];
//! voice cloning goes through [`cloned::CloningBackend`].
//!
//! # Available Backends
//!
//! - `cloned::SilenceStub` - placeholder cloning backend, always available
//! - `onnx::OnnxStandardModel` - ONNX-based standard models, behind the
//!   `onnx` Cargo feature

pub mod cloned;
pub mod standard;

#[cfg(feature = "onnx")]
pub mod onnx;
