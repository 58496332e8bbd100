pub mod matching;
pub mod plex;
pub mod spotify;
pub mod sync;
