//! Alternate (title, artist) spellings for collaborations.
//!
//! Catalogs disagree on where a featured artist goes: one folds it into the
//! title ("Song (feat. Other)"), another into the artist ("Main & Other").
//! The generator splits both shapes so the matcher can try every combination.

use std::sync::LazyLock;

use regex::Regex;

/// `<base> (feat. <other>)` and `<base> featuring <other>`.
static TITLE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(.*) \(feat\. (.*)\)").unwrap(),
        Regex::new(r"(.*) featuring (.*)").unwrap(),
    ]
});

/// `<a> & <b>`, `<a> ft. <b>`, `<a> vs <b>`, `<a> - <b>`, `<a> + <b>`, `<a> / <b>`.
static ARTIST_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(.*) & (.*)").unwrap(),
        Regex::new(r"(.*) ft\. (.*)").unwrap(),
        Regex::new(r"(.*) vs (.*)").unwrap(),
        Regex::new(r"(.*) - (.*)").unwrap(),
        Regex::new(r"(.*) \+ (.*)").unwrap(),
        Regex::new(r"(.*) / (.*)").unwrap(),
    ]
});

/// Candidate titles and artists for one track. The original values always come first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameVariants {
    pub titles: Vec<String>,
    pub artists: Vec<String>,
}

impl NameVariants {
    /// Every (title, artist) combination, titles in the outer loop.
    pub fn combinations(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.titles.iter().flat_map(move |title| {
            self.artists
                .iter()
                .map(move |artist| (title.as_str(), artist.as_str()))
        })
    }
}

/// Split collaboration credits out of a title and artist.
///
/// Every pattern is checked, a single track can pick up candidates from several
/// of them. Values are used verbatim: no case folding or trimming.
pub fn generate(title: &str, artist: &str) -> NameVariants {
    let mut titles = vec![title.to_string()];
    let mut artists = vec![artist.to_string()];

    for pattern in TITLE_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(title) {
            push_unique(&mut titles, &caps[1]);
            push_unique(&mut artists, &caps[2]);
        }
    }

    for pattern in ARTIST_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(artist) {
            push_unique(&mut artists, &caps[1]);
            push_unique(&mut artists, &caps[2]);
        }
    }

    NameVariants { titles, artists }
}

fn push_unique(values: &mut Vec<String>, candidate: &str) {
    if !values.iter().any(|v| v == candidate) {
        values.push(candidate.to_string());
    }
}
