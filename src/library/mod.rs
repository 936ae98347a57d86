//! Turns a directory of audio files into the answer key the game plays from.

pub mod catalog;
pub mod error;
pub mod fs;
pub mod tags;
pub mod wiki;
