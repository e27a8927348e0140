//! Command implementations for spanpack-cmd

pub mod decode;
pub mod encode;
pub mod inspect;
