//! Folds one user's exported files into a single `UserRecord`.
use crate::error::{CatalogError, Result};
use crate::models::{PlayEvent, Playlist, UserRecord};
use serde_json::Value;

const MUSIC_PREFIX: &str = "StreamingHistory_music";
const PODCAST_PREFIX: &str = "StreamingHistory_podcast";
const PLAYLIST_PREFIX: &str = "Playlist";

/// Where a file's content goes, decided by its name. First match wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileKind {
    MusicHistory,
    PodcastHistory,
    Playlists,
    Section(String),
}

impl FileKind {
    pub fn classify(file_name: &str) -> Self {
        if file_name.starts_with(MUSIC_PREFIX) {
            FileKind::MusicHistory
        } else if file_name.starts_with(PODCAST_PREFIX) {
            FileKind::PodcastHistory
        } else if file_name.starts_with(PLAYLIST_PREFIX) {
            FileKind::Playlists
        } else {
            FileKind::Section(section_key(file_name).to_string())
        }
    }
}

/// File name with its extension stripped.
pub fn section_key(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    }
}

/// Merges `(file name, parsed JSON)` pairs, in the order given, into one record.
pub fn merge<I>(user: &str, files: I) -> Result<UserRecord>
where
    I: IntoIterator<Item = (String, Value)>,
{
    if user.trim().is_empty() {
        return Err(CatalogError::EmptyUserId);
    }

    let mut record = UserRecord::new(user);
    for (file_name, payload) in files {
        match FileKind::classify(&file_name) {
            FileKind::MusicHistory => {
                let events = play_events(&file_name, payload)?;
                record.streaming_history.music.extend(events);
            }
            FileKind::PodcastHistory => {
                let events = play_events(&file_name, payload)?;
                record.streaming_history.podcast.extend(events);
            }
            FileKind::Playlists => {
                let playlists = playlists(&file_name, payload)?;
                record.playlists.extend(playlists);
            }
            FileKind::Section(key) => {
                if record.sections.insert(key.clone(), payload).is_some() {
                    tracing::warn!(user, section = %key, "Section listed twice, keeping {}", file_name);
                }
            }
        }
    }
    Ok(record)
}

fn play_events(file_name: &str, payload: Value) -> Result<Vec<PlayEvent>> {
    if !payload.is_array() {
        return Err(CatalogError::shape(file_name, "expected an array of play events"));
    }
    serde_json::from_value(payload).map_err(|e| CatalogError::shape(file_name, e))
}

fn playlists(file_name: &str, mut payload: Value) -> Result<Vec<Playlist>> {
    match payload.get_mut("playlists").map(Value::take) {
        Some(list @ Value::Array(_)) => {
            serde_json::from_value(list).map_err(|e| CatalogError::shape(file_name, e))
        }
        Some(_) => Err(CatalogError::shape(file_name, "`playlists` is not an array")),
        None => Err(CatalogError::shape(file_name, "missing `playlists` field")),
    }
}
