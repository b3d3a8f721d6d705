//! Small stateless helpers shared by the use cases, kept separate from the
//! orchestration logic that owns ports.

pub mod outline_parser;
