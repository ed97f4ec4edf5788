//! Aggregations over a single user's merged export.
//!
//! Everything here is a pure function of its inputs. Sections a record does
//! not carry produce empty results rather than errors.
use crate::config::ChartLimits;
use crate::models::{GenreMap, PlayEvent, UserRecord, YearMonth};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_TOP_ARTISTS: usize = 8;
pub const DEFAULT_TOP_GENRES: usize = 10;
pub const DEFAULT_TOP_SEARCHES: usize = 15;

/// Local-hour buckets as `[start, end)`; together they cover 0..24 exactly once.
pub const TIME_OF_DAY_BUCKETS: [(&str, u32, u32); 5] = [
    ("0h-6h", 0, 6),
    ("6h-9h", 6, 9),
    ("9h-12h", 9, 12),
    ("12h-18h", 12, 18),
    ("18h-24h", 18, 24),
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedItem {
    pub name: String,
    pub value: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSize {
    pub name: String,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeOfDayAverage {
    pub label: String,
    pub events: usize,
    pub mean_seconds: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthlyMinutes {
    pub month: YearMonth,
    pub minutes: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthTopTrack {
    pub month: YearMonth,
    pub track: String,
    pub artist: String,
    pub ms_played: u64,
}

/// Everything the dashboard draws for one user.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct UserSummary {
    pub user: String,
    pub playlists: Vec<PlaylistSize>,
    pub top_artists: Vec<RankedItem>,
    pub genres: Vec<RankedItem>,
    pub time_of_day: Vec<TimeOfDayAverage>,
    pub monthly: Vec<MonthlyMinutes>,
    pub top_tracks: Vec<MonthTopTrack>,
    pub searches: Vec<RankedItem>,
}

pub fn summarize(record: &UserRecord, genres: &GenreMap, limits: &ChartLimits) -> UserSummary {
    UserSummary {
        user: record.user.clone(),
        playlists: playlist_sizes(record),
        top_artists: top_artists(record, limits.top_artists),
        genres: genre_ranking(genres, limits.genres),
        time_of_day: listening_by_time_of_day(record),
        monthly: monthly_listening(record),
        top_tracks: top_tracks_per_month(record),
        searches: top_search_queries(record, limits.search_terms),
    }
}

/// Counts occurrences and keeps the `k` most frequent. Ties keep first-seen order.
pub fn rank_top_k<I, S>(items: I, k: usize) -> Vec<RankedItem>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for item in items {
        *counts.entry(item.into()).or_insert(0) += 1;
    }
    let mut ranked: Vec<RankedItem> = counts
        .into_iter()
        .map(|(name, value)| RankedItem { name, value })
        .collect();
    ranked.sort_by(|a, b| b.value.cmp(&a.value));
    ranked.truncate(k);
    ranked
}

pub fn playlist_sizes(record: &UserRecord) -> Vec<PlaylistSize> {
    record
        .playlists
        .iter()
        .enumerate()
        .map(|(i, p)| PlaylistSize {
            name: p.name.clone().unwrap_or_else(|| format!("Playlist {}", i + 1)),
            count: p.items.len(),
        })
        .collect()
}

/// Most frequent artists across the saved library tracks.
pub fn top_artists(record: &UserRecord, k: usize) -> Vec<RankedItem> {
    match record.library() {
        Some(library) => rank_top_k(library.tracks.into_iter().map(|t| t.artist), k),
        None => Vec::new(),
    }
}

/// Most frequent genres over every artist in `genres`.
pub fn genre_ranking(genres: &GenreMap, k: usize) -> Vec<RankedItem> {
    rank_top_k(genres.0.values().flatten().map(String::as_str), k)
}

/// Mean seconds played per music event, bucketed by the hour of `endTime`.
/// Events whose `endTime` does not parse are left out.
pub fn listening_by_time_of_day(record: &UserRecord) -> Vec<TimeOfDayAverage> {
    let mut totals = [(0usize, 0u64); 5];
    for event in &record.streaming_history.music {
        let Some(hour) = event.hour() else { continue };
        if let Some(i) = TIME_OF_DAY_BUCKETS.iter().position(|(_, lo, hi)| (*lo..*hi).contains(&hour)) {
            totals[i].0 += 1;
            totals[i].1 += event.ms_played;
        }
    }

    TIME_OF_DAY_BUCKETS
        .iter()
        .zip(totals)
        .map(|((label, _, _), (events, ms))| TimeOfDayAverage {
            label: label.to_string(),
            events,
            mean_seconds: if events == 0 { 0.0 } else { ms as f64 / 1000.0 / events as f64 },
        })
        .collect()
}

/// Minutes listened per calendar month, oldest first.
pub fn monthly_listening(record: &UserRecord) -> Vec<MonthlyMinutes> {
    let mut months: BTreeMap<YearMonth, u64> = BTreeMap::new();
    for (month, event) in dated(&record.streaming_history.music) {
        *months.entry(month).or_insert(0) += event.ms_played;
    }
    months
        .into_iter()
        .map(|(month, ms)| MonthlyMinutes { month, minutes: ms as f64 / 60_000.0 })
        .collect()
}

/// The (track, artist) pair with the most play time in each month, oldest first.
/// A month where nothing was played for a positive duration gets no row at all,
/// so the result can be shorter than the monthly listening series.
pub fn top_tracks_per_month(record: &UserRecord) -> Vec<MonthTopTrack> {
    let mut months: BTreeMap<YearMonth, IndexMap<(&str, &str), u64>> = BTreeMap::new();
    for (month, event) in dated(&record.streaming_history.music) {
        let tracks = months.entry(month).or_default();
        *tracks.entry((event.track_name.as_str(), event.artist_name.as_str())).or_insert(0) += event.ms_played;
    }

    months
        .into_iter()
        .filter_map(|(month, tracks)| {
            let mut best: Option<((&str, &str), u64)> = None;
            for (key, ms) in tracks {
                if ms > best.map(|(_, b)| b).unwrap_or(0) {
                    best = Some((key, ms));
                }
            }
            best.map(|((track, artist), ms_played)| MonthTopTrack {
                month,
                track: track.to_string(),
                artist: artist.to_string(),
                ms_played,
            })
        })
        .collect()
}

/// Trimmed, lowercased search terms by frequency. Blank queries are ignored.
pub fn top_search_queries(record: &UserRecord, k: usize) -> Vec<RankedItem> {
    let searches = record.search_queries().unwrap_or_default();
    rank_top_k(
        searches
            .iter()
            .map(|s| s.search_query.trim().to_lowercase())
            .filter(|q| !q.is_empty()),
        k,
    )
}

/// Distinct music artists in the order they first appear.
pub fn unique_artists(record: &UserRecord) -> Vec<String> {
    let mut seen: IndexMap<&str, ()> = IndexMap::new();
    for event in &record.streaming_history.music {
        seen.entry(event.artist_name.as_str()).or_insert(());
    }
    seen.into_keys().map(str::to_string).collect()
}

fn dated(events: &[PlayEvent]) -> impl Iterator<Item = (YearMonth, &PlayEvent)> {
    events.iter().filter_map(|e| e.year_month().map(|m| (m, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Playlist, LIBRARY_SECTION, SEARCH_SECTION};
    use serde_json::json;

    fn play(track: &str, artist: &str, end: &str, ms: u64) -> PlayEvent {
        PlayEvent {
            track_name: track.into(),
            artist_name: artist.into(),
            end_time: end.into(),
            ms_played: ms,
        }
    }

    fn with_music(events: Vec<PlayEvent>) -> UserRecord {
        let mut record = UserRecord::new("u");
        record.streaming_history.music = events;
        record
    }

    fn bucket<'a>(rows: &'a [TimeOfDayAverage], label: &str) -> &'a TimeOfDayAverage {
        rows.iter().find(|r| r.label == label).unwrap()
    }

    #[test]
    fn single_morning_event_lands_in_6_to_9() {
        let rows = listening_by_time_of_day(&with_music(vec![play("A", "X", "2023-05-01 07:15", 120_000)]));
        assert_eq!(rows.len(), 5);
        assert_eq!(bucket(&rows, "6h-9h").mean_seconds, 120.0);
        for row in rows.iter().filter(|r| r.label != "6h-9h") {
            assert_eq!(row.mean_seconds, 0.0);
        }
    }

    #[test]
    fn time_of_day_averages_within_bucket() {
        let rows = listening_by_time_of_day(&with_music(vec![
            play("A", "X", "2023-05-01 12:00", 10_000),
            play("B", "X", "2023-05-01 17:59", 30_000),
            play("C", "X", "2023-05-01 18:00", 5_000),
            play("D", "X", "garbage", 99_000),
        ]));
        assert_eq!(bucket(&rows, "12h-18h").mean_seconds, 20.0);
        assert_eq!(bucket(&rows, "18h-24h").mean_seconds, 5.0);
        assert_eq!(rows.iter().map(|r| r.events).sum::<usize>(), 3);
    }

    #[test]
    fn every_hour_falls_in_exactly_one_bucket() {
        for hour in 0..24u32 {
            let hits = TIME_OF_DAY_BUCKETS.iter().filter(|(_, lo, hi)| (*lo..*hi).contains(&hour)).count();
            assert_eq!(hits, 1, "hour {}", hour);
        }
        let events = (0..24).map(|h| play("t", "a", &format!("2023-01-01 {:02}:30", h), 1000)).collect();
        let rows = listening_by_time_of_day(&with_music(events));
        assert_eq!(rows.iter().map(|r| r.events).collect::<Vec<_>>(), vec![6, 3, 3, 6, 6]);
    }

    #[test]
    fn top_artists_counts_library_tracks() {
        let mut record = UserRecord::new("u");
        record.sections.insert(
            LIBRARY_SECTION.to_string(),
            json!({ "tracks": [{ "artist": "X" }, { "artist": "Y" }, { "artist": "X" }] }),
        );
        let top = top_artists(&record, 2);
        assert_eq!(
            top,
            vec![
                RankedItem { name: "X".into(), value: 2 },
                RankedItem { name: "Y".into(), value: 1 },
            ]
        );
        assert_eq!(top_artists(&record, 2), top);
        assert_eq!(top_artists(&record, 1).len(), 1);
    }

    #[test]
    fn top_artists_skip_tracks_without_an_artist() {
        let mut record = UserRecord::new("u");
        record.sections.insert(
            LIBRARY_SECTION.to_string(),
            json!({ "tracks": [{ "artist": "X" }, { "track": "t" }, { "artist": null }, { "artist": "X" }] }),
        );
        assert_eq!(top_artists(&record, DEFAULT_TOP_ARTISTS), vec![RankedItem { name: "X".into(), value: 2 }]);
    }

    #[test]
    fn top_searches_skip_unreadable_entries() {
        let mut record = UserRecord::new("u");
        record.sections.insert(
            SEARCH_SECTION.to_string(),
            json!([{ "searchQuery": "Rock" }, { "searchQuery": "rock" }, { "searchQuery": null }]),
        );
        assert_eq!(
            top_search_queries(&record, DEFAULT_TOP_SEARCHES),
            vec![RankedItem { name: "rock".into(), value: 2 }]
        );
    }

    #[test]
    fn top_artists_without_library_is_empty() {
        assert!(top_artists(&UserRecord::new("u"), DEFAULT_TOP_ARTISTS).is_empty());
    }

    #[test]
    fn ranking_ties_keep_first_seen_order() {
        let ranked = rank_top_k(["b", "a", "c", "a", "c", "d"], 3);
        let names: Vec<_> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c", "b"]);
        assert!(ranked.iter().all(|r| r.value > 0));
        assert!(rank_top_k(["x"], 0).is_empty());
    }

    #[test]
    fn genres_are_flattened_across_artists() {
        let genres: GenreMap = [
            ("A".to_string(), vec!["rock".to_string(), "indie".to_string()]),
            ("B".to_string(), vec!["pop".to_string()]),
            ("C".to_string(), vec!["indie".to_string(), "pop".to_string()]),
            ("D".to_string(), vec![]),
        ]
        .into_iter()
        .collect();
        let ranked = genre_ranking(&genres, DEFAULT_TOP_GENRES);
        let pairs: Vec<_> = ranked.iter().map(|r| (r.name.as_str(), r.value)).collect();
        assert_eq!(pairs, vec![("indie", 2), ("pop", 2), ("rock", 1)]);
        assert!(genre_ranking(&GenreMap::default(), 20).is_empty());
    }

    #[test]
    fn playlists_fall_back_to_positional_names() {
        let mut record = UserRecord::new("u");
        record.playlists = vec![
            Playlist { items: vec![json!(1), json!(2), json!(3)], ..Default::default() },
            Playlist::default(),
        ];
        assert_eq!(
            playlist_sizes(&record),
            vec![
                PlaylistSize { name: "Playlist 1".into(), count: 3 },
                PlaylistSize { name: "Playlist 2".into(), count: 0 },
            ]
        );
    }

    #[test]
    fn search_terms_are_normalized() {
        let mut record = UserRecord::new("u");
        record.sections.insert(
            SEARCH_SECTION.to_string(),
            json!([
                { "searchQuery": "Rock" },
                { "searchQuery": "rock " },
                { "searchQuery": "" },
                { "searchQuery": "   " },
                { "searchQuery": "Jazz" }
            ]),
        );
        let terms = top_search_queries(&record, DEFAULT_TOP_SEARCHES);
        assert_eq!(
            terms,
            vec![
                RankedItem { name: "rock".into(), value: 2 },
                RankedItem { name: "jazz".into(), value: 1 },
            ]
        );
        assert!(top_search_queries(&UserRecord::new("u"), 15).is_empty());
    }

    #[test]
    fn months_are_chronological_and_keep_years_apart() {
        let record = with_music(vec![
            play("a", "x", "2024-05-03 10:00", 60_000),
            play("b", "x", "2023-05-03 10:00", 120_000),
            play("c", "x", "2023-12-31 23:59", 30_000),
            play("d", "x", "2023-05-20 08:00", 60_000),
        ]);
        let months = monthly_listening(&record);
        let labels: Vec<_> = months.iter().map(|m| m.month.to_string()).collect();
        assert_eq!(labels, vec!["2023-05", "2023-12", "2024-05"]);
        assert_eq!(months[0].minutes, 3.0);
        assert_eq!(months[1].minutes, 0.5);

        let total: f64 = months.iter().map(|m| m.minutes).sum();
        let expected: f64 = record.streaming_history.music.iter().map(|e| e.ms_played as f64 / 60_000.0).sum();
        assert!((total - expected).abs() < 1e-9);
    }

    #[test]
    fn top_track_per_month_sums_play_time() {
        let record = with_music(vec![
            play("Song", "A", "2023-01-01 10:00", 100),
            play("Other", "B", "2023-01-02 10:00", 150),
            play("Song", "A", "2023-01-03 10:00", 100),
            play("Tie1", "C", "2023-02-01 10:00", 50),
            play("Tie2", "C", "2023-02-01 11:00", 50),
            play("Skipped", "D", "2023-03-01 11:00", 0),
        ]);
        let top = top_tracks_per_month(&record);
        assert_eq!(top.len(), 2);
        assert_eq!(monthly_listening(&record).len(), 3);
        assert!(top.iter().all(|t| t.month != YearMonth::new(2023, 3)));
        assert_eq!((top[0].track.as_str(), top[0].artist.as_str(), top[0].ms_played), ("Song", "A", 200));
        assert_eq!(top[1].track, "Tie1");
        assert_eq!(top[1].month, YearMonth::new(2023, 2));
    }

    #[test]
    fn unique_artists_in_first_seen_order() {
        let record = with_music(vec![
            play("1", "B", "2023-01-01 10:00", 1),
            play("2", "A", "2023-01-01 10:00", 1),
            play("3", "B", "2023-01-01 10:00", 1),
        ]);
        assert_eq!(unique_artists(&record), vec!["B", "A"]);
    }

    #[test]
    fn summary_collects_every_chart() {
        let record = with_music(vec![play("A", "X", "2023-05-01 07:15", 120_000)]);
        let summary = summarize(&record, &GenreMap::default(), &ChartLimits::default());
        assert_eq!(summary.user, "u");
        assert_eq!(summary.time_of_day.len(), 5);
        assert_eq!(summary.monthly.len(), 1);
        assert_eq!(summary.top_tracks.len(), 1);
        assert!(summary.top_artists.is_empty());
        assert!(summary.searches.is_empty());
    }
}
