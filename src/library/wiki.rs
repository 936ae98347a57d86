//! Release years from the English Wikipedia, for files whose tags carry none.
//!
//! A song page is looked up under its plain title first, then as
//! `Title (song)` and `Title (Artist song)`. The year comes from the
//! `released` field of the page's `Infobox song`, and only when the
//! infobox names the same artist.

use std::{collections::HashMap, sync::LazyLock, time::Duration};

use log::{debug, info};
use regex::{Captures, Regex};
use serde::Deserialize;

use crate::library::{error::LibraryError, tags::earliest_year};

const WIKIPEDIA_API: &str = "https://en.wikipedia.org/w/api.php";
const USER_AGENT: &str = concat!("HitPlay/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const INFOBOX_START: &str = "{{Infobox song";

/// Templates whose numeric arguments spell out a date.
const DATE_TEMPLATES: &[&str] = &[
    "start date",
    "start date and age",
    "start-date",
    "birth date",
    "birth-date",
    "date",
];

static INFOBOX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\{\{\s*infobox\s+song").expect("valid infobox pattern"));
static DISAMBIG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\{\{[^}]*disambig").expect("valid disambig pattern"));
static REF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<ref[^>]*>.*?</ref>").expect("valid ref pattern"));
static SELF_CLOSING_REF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<ref[^/]*/>").expect("valid ref pattern"));
static HTML_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid html pattern"));
static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[(?:[^|\]]*\|)?([^\]]+)\]\]").expect("valid link pattern")
});
static TEMPLATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^}]*)\}\}").expect("valid template pattern"));
static BRACKET_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\[\]]").expect("valid bracket pattern"));
static SPACE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Source of release years for tracks whose tags do not have one.
pub trait YearLookup {
    fn release_year(&self, title: &str, artist: &str) -> Result<Option<u16>, LibraryError>;
}

pub struct WikiClient {
    http: reqwest::blocking::Client,
}

impl WikiClient {
    pub fn new() -> Result<Self, LibraryError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http })
    }

    fn fetch_page(&self, title: &str) -> Result<Option<Page>, LibraryError> {
        debug!("Querying Wikipedia for {title:?}");
        let response: QueryResponse = self
            .http
            .get(WIKIPEDIA_API)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("titles", title),
                ("prop", "categories|revisions"),
                ("rvprop", "content"),
                ("rvslots", "main"),
                ("redirects", "1"),
            ])
            .send()?
            .error_for_status()?
            .json()?;
        Ok(response.into_page())
    }
}

impl YearLookup for WikiClient {
    fn release_year(&self, title: &str, artist: &str) -> Result<Option<u16>, LibraryError> {
        let title = title.trim().trim_matches(|c: char| c == '"' || c == '\'');
        let artist = artist.trim();

        let mut year = None;
        for candidate in candidate_titles(title, artist) {
            let Some(page) = self.fetch_page(&candidate)? else {
                continue;
            };
            if candidate == title && page.is_disambiguation() {
                continue;
            }
            year = page.release_year(artist);
            break;
        }

        match year {
            Some(year) => info!("Wikipedia dates {title:?} by {artist} to {year}"),
            None => debug!("Wikipedia has no release date for {title:?} by {artist}"),
        }
        Ok(year)
    }
}

/// Page titles to try, most likely first.
fn candidate_titles(title: &str, artist: &str) -> Vec<String> {
    let artist_for_title = artist
        .chars()
        .filter(|c| !matches!(*c, '/' | '(' | ')'))
        .collect::<String>();
    vec![
        title.to_string(),
        format!("{title} (song)"),
        format!("{title} ({} song)", artist_for_title.trim()),
    ]
}

#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    query: Option<Query>,
}

#[derive(Debug, Default, Deserialize)]
struct Query {
    #[serde(default)]
    pages: HashMap<String, Page>,
}

#[derive(Debug, Default, Deserialize)]
struct Page {
    #[serde(default)]
    missing: Option<serde_json::Value>,
    #[serde(default)]
    categories: Vec<Category>,
    #[serde(default)]
    revisions: Vec<Revision>,
}

#[derive(Debug, Deserialize)]
struct Category {
    title: String,
}

#[derive(Debug, Deserialize)]
struct Revision {
    slots: Slots,
}

#[derive(Debug, Deserialize)]
struct Slots {
    main: Slot,
}

#[derive(Debug, Deserialize)]
struct Slot {
    #[serde(rename = "*", default)]
    content: String,
}

impl QueryResponse {
    /// The single page a one-title query returns, unless it does not exist.
    fn into_page(self) -> Option<Page> {
        self.query?
            .pages
            .into_values()
            .next()
            .filter(|page| page.missing.is_none())
    }
}

impl Page {
    fn content(&self) -> &str {
        self.revisions
            .first()
            .map(|r| r.slots.main.content.as_str())
            .unwrap_or_default()
    }

    fn is_disambiguation(&self) -> bool {
        self.categories
            .iter()
            .any(|c| c.title.to_lowercase().contains("disambiguation"))
            || DISAMBIG_PATTERN.is_match(self.content())
    }

    fn release_year(&self, artist: &str) -> Option<u16> {
        let infobox = extract_infobox(self.content())?;
        let released = released_from_infobox(infobox, artist)?;
        earliest_year(&released)
    }
}

/// The whole `Infobox song` template, braces included.
fn extract_infobox(wikitext: &str) -> Option<&str> {
    let start = wikitext
        .find(INFOBOX_START)
        .or_else(|| INFOBOX_PATTERN.find(wikitext).map(|m| m.start()))?;

    let bytes = wikitext.as_bytes();
    let mut depth = 0usize;
    let mut i = start;
    while i + 1 < bytes.len() {
        match &bytes[i..i + 2] {
            b"{{" => {
                depth += 1;
                i += 2;
            }
            b"}}" => {
                depth = depth.saturating_sub(1);
                i += 2;
                if depth == 0 {
                    return Some(&wikitext[start..i]);
                }
            }
            _ => i += 1,
        }
    }
    None
}

/// `| key = value` pairs of a template, keys lowercased. Values may span
/// several lines.
fn infobox_fields(infobox: &str) -> Vec<(String, String)> {
    let body = infobox.strip_suffix("}}").unwrap_or(infobox);
    let mut fields: Vec<(String, String)> = Vec::new();
    for line in body.lines() {
        let line = line.trim();
        if let Some(field) = line.strip_prefix('|') {
            let (key, value) = field.split_once('=').unwrap_or((field, ""));
            fields.push((key.trim().to_lowercase(), value.trim().to_string()));
        } else if let Some((_, value)) = fields.last_mut() {
            value.push('\n');
            value.push_str(line);
        }
    }
    fields
}

/// Cleaned `released` value, if the infobox is about `artist`'s song.
fn released_from_infobox(infobox: &str, artist: &str) -> Option<String> {
    let fields = infobox_fields(infobox);
    let field = |name: &str| {
        fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| clean_wikitext(value))
    };

    let infobox_artist = field("artist")?;
    if infobox_artist.to_lowercase() != artist.trim().to_lowercase() {
        debug!("Infobox artist {infobox_artist:?} is not {artist:?}");
        return None;
    }
    field("released").filter(|released| !released.is_empty())
}

/// Plain text of a wikitext fragment. Date templates keep their numbers,
/// other templates and references are dropped.
fn clean_wikitext(text: &str) -> String {
    let s = REF_PATTERN.replace_all(text, "");
    let s = SELF_CLOSING_REF_PATTERN.replace_all(&s, "");
    let s = HTML_PATTERN.replace_all(&s, "");
    let s = LINK_PATTERN.replace_all(&s, "$1");
    let s = TEMPLATE_PATTERN.replace_all(&s, |caps: &Captures| {
        let mut parts = caps[1].split('|');
        let name = parts.next().unwrap_or_default().trim().to_lowercase();
        if !DATE_TEMPLATES.contains(&name.as_str()) {
            return String::new();
        }
        parts
            .map(str::trim)
            .filter(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
            .collect::<Vec<_>>()
            .join("-")
    });
    let s = BRACKET_PATTERN.replace_all(&s, "");
    SPACE_PATTERN.replace_all(&s, " ").trim().to_string()
}
