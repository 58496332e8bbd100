//! Thin async bindings for the parts of the Plex Media Server API used as a source catalog.
//!
//! Docs:
//! https://developer.plex.tv/pms/#section/API-Info/Authenticating-with-Plex

pub mod all_tracks;
pub mod playlist;
