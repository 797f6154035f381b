//! Risk severity scoring built on the Kinney method.
//!
//! The crate hosts two workflows: `assessment` turns questionnaire answers
//! into persisted, deterministically scored analyses (including residual
//! re-scoring after mitigation measures), and `learning` grows a statistical
//! classifier from analyst feedback and curated scenarios. Shared scoring
//! primitives live in [`kinney`], fixed business catalogs in [`catalog`], and
//! the advisor seam consumed by the API layer in [`advisor`].

pub mod advisor;
pub mod catalog;
pub mod config;
pub mod error;
pub mod kinney;
pub mod storage;
pub mod telemetry;
pub mod workflows;
