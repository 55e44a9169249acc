//! # Comprehensive Test Suite for the Column Profiler
//!
//! Cross-module tests verifying the data model contracts and end-to-end
//! behavior of the interpolation engine. Per-module unit tests live next to
//! the code they exercise; the scenarios here cut across module boundaries
//! the way a real loader/renderer pair would.

mod model_tests;
