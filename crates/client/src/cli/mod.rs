pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Blind, Id, Init, Match, SendRequest, SignRequest, Version, VersionCheck};
