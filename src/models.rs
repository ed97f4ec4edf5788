use chrono::{Datelike, NaiveDateTime, Timelike};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Section name under which the exported library lands.
pub const LIBRARY_SECTION: &str = "YourLibrary";
/// Section name under which the exported search history lands.
pub const SEARCH_SECTION: &str = "SearchQueries";

/// One user's exported data, merged from every file listed for them.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct UserRecord {
    pub user: String,
    pub playlists: Vec<Playlist>,
    #[serde(rename = "streamingHistory")]
    pub streaming_history: StreamingHistory,
    /// Every other file, keyed by its name without extension.
    pub sections: IndexMap<String, serde_json::Value>,
}

impl UserRecord {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            ..Default::default()
        }
    }

    pub fn section(&self, name: &str) -> Option<&serde_json::Value> {
        self.sections.get(name)
    }

    /// Typed view of the `YourLibrary` section. Absent or unreadable yields `None`.
    pub fn library(&self) -> Option<Library> {
        self.typed_section(LIBRARY_SECTION)
    }

    /// Typed view of the `SearchQueries` section. Entries that do not read as a
    /// search are skipped; a section that is not a list yields `None`.
    pub fn search_queries(&self) -> Option<Vec<SearchEvent>> {
        match self.sections.get(SEARCH_SECTION)? {
            serde_json::Value::Array(items) => Some(readable_items(items)),
            _ => {
                tracing::warn!(user = %self.user, section = SEARCH_SECTION, "Ignoring section that is not a list");
                None
            }
        }
    }

    fn typed_section<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let value = self.sections.get(name)?;
        match T::deserialize(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!(user = %self.user, section = name, "Ignoring unreadable section: {}", e);
                None
            }
        }
    }
}

// Keeps the elements that deserialize as `T`, drops the rest.
fn readable_items<T: DeserializeOwned>(items: &[serde_json::Value]) -> Vec<T> {
    let kept: Vec<T> = items.iter().filter_map(|v| T::deserialize(v).ok()).collect();
    if kept.len() < items.len() {
        tracing::debug!("Skipped {} unreadable entries", items.len() - kept.len());
    }
    kept
}

fn readable_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(items) => readable_items(&items),
        _ => Vec::new(),
    })
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StreamingHistory {
    pub music: Vec<PlayEvent>,
    pub podcast: Vec<PlayEvent>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Playlist {
    pub name: Option<String>,
    #[serde(rename = "lastModifiedDate", default, skip_serializing_if = "Option::is_none")]
    pub last_modified_date: Option<String>,
    #[serde(default, deserialize_with = "items_or_empty")]
    pub items: Vec<serde_json::Value>,
}

// A missing, null or non-array `items` counts as an empty playlist.
fn items_or_empty<'de, D>(deserializer: D) -> Result<Vec<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(items) => items,
        _ => Vec::new(),
    })
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct PlayEvent {
    #[serde(rename = "trackName", alias = "episodeName", default)]
    pub track_name: String,
    #[serde(rename = "artistName", alias = "podcastName", default)]
    pub artist_name: String,
    #[serde(rename = "endTime")]
    pub end_time: String,
    #[serde(rename = "msPlayed")]
    pub ms_played: u64,
}

impl PlayEvent {
    /// Parses `endTime`, which the export writes as local "YYYY-MM-DD HH:MM".
    pub fn ended_at(&self) -> Option<NaiveDateTime> {
        const FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%SZ"];
        let raw = self.end_time.trim();
        FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    }

    pub fn hour(&self) -> Option<u32> {
        self.ended_at().map(|dt| dt.hour())
    }

    pub fn year_month(&self) -> Option<YearMonth> {
        self.ended_at().map(|dt| YearMonth {
            year: dt.year(),
            month: dt.month(),
        })
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Library {
    #[serde(default, deserialize_with = "readable_list")]
    pub tracks: Vec<LibraryTrack>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct LibraryTrack {
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct SearchEvent {
    #[serde(rename = "searchQuery", default)]
    pub search_query: String,
    #[serde(rename = "searchTime", default, skip_serializing_if = "Option::is_none")]
    pub search_time: Option<String>,
}

/// Artist name -> genres, in the order the genre file lists them.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct GenreMap(pub IndexMap<String, Vec<String>>);

impl GenreMap {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn genres_of(&self, artist: &str) -> &[String] {
        self.0.get(artist).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl FromIterator<(String, Vec<String>)> for GenreMap {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        GenreMap(iter.into_iter().collect())
    }
}

/// A genre map together with the user it was loaded for.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserGenres {
    pub user: String,
    pub genres: GenreMap,
}

impl UserGenres {
    pub fn new(user: impl Into<String>, genres: GenreMap) -> Self {
        Self { user: user.into(), genres }
    }

    /// The map, if it belongs to `user`.
    pub fn for_user(&self, user: &str) -> Option<&GenreMap> {
        (self.user == user).then_some(&self.genres)
    }
}

/// User identifier -> file names, in the order the index lists them.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct FileIndex(pub IndexMap<String, Vec<String>>);

impl FileIndex {
    pub fn users(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Vec<String>)> for FileIndex {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        FileIndex(iter.into_iter().collect())
    }
}

/// Calendar month bucket; orders chronologically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// "May 2023"
    pub fn short_label(&self) -> String {
        format!("{} {}", month_abbrev(self.month), self.year)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

fn month_abbrev(m: u32) -> &'static str {
    match m { 1 => "Jan", 2 => "Feb", 3 => "Mar", 4 => "Apr", 5 => "May", 6 => "Jun", 7 => "Jul", 8 => "Aug", 9 => "Sep", 10 => "Oct", 11 => "Nov", 12 => "Dec", _ => "???" }
}
