//! Betting math: odds conversion and stake sizing.

pub mod odds;
pub mod stake;
