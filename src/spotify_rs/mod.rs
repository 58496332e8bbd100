//! Minimal Spotify Web API client for the destination side of the sync.
//!
//! Authentication happens elsewhere, this client only needs a user access token
//! with the `playlist-modify-public` and `playlist-modify-private` scopes.

pub mod client;
pub mod types;
