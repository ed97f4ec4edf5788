//! Loading every user's export, and keeping the last good catalog around.
use crate::api::DataSource;
use crate::config::{DataLayout, LoadStrategy};
use crate::error::{CatalogError, Result};
use crate::merge::merge;
use crate::models::{FileIndex, GenreMap, UserRecord};
use futures::future::try_join_all;
use serde_json::Value;
use std::sync::Arc;

pub async fn fetch_json<S: DataSource + ?Sized>(source: &S, location: &str) -> Result<Value> {
    let text = source.fetch_text(location).await?;
    serde_json::from_str(&text).map_err(|e| CatalogError::Parse {
        location: location.to_string(),
        source: e,
    })
}

pub async fn load_index<S: DataSource + ?Sized>(source: &S, layout: &DataLayout) -> Result<FileIndex> {
    let raw = fetch_json(source, &layout.index_url).await?;
    let index: FileIndex =
        serde_json::from_value(raw).map_err(|e| CatalogError::shape(layout.index_url.as_str(), e))?;
    tracing::info!("Index lists {} users", index.len());
    Ok(index)
}

/// Fetches and merges one user's files. Merge order follows `files`,
/// whatever order the fetches complete in.
pub async fn load_user<S: DataSource + ?Sized>(
    source: &S,
    layout: &DataLayout,
    user: &str,
    files: &[String],
    strategy: LoadStrategy,
) -> Result<UserRecord> {
    tracing::debug!(user, "Loading {} files ({:?})", files.len(), strategy);

    let payloads = match strategy {
        LoadStrategy::Sequential => {
            let mut payloads = Vec::with_capacity(files.len());
            for file in files {
                payloads.push(fetch_json(source, &layout.user_file(user, file)).await?);
            }
            payloads
        }
        LoadStrategy::Concurrent => {
            let locations: Vec<String> = files.iter().map(|f| layout.user_file(user, f)).collect();
            try_join_all(locations.iter().map(|loc| fetch_json(source, loc))).await?
        }
    };

    let record = merge(user, files.iter().cloned().zip(payloads))?;
    tracing::info!(
        user,
        playlists = record.playlists.len(),
        music = record.streaming_history.music.len(),
        podcast = record.streaming_history.podcast.len(),
        "Loaded user"
    );
    Ok(record)
}

/// Loads every user in index order. The first failure aborts the whole load.
pub async fn load_all<S: DataSource + ?Sized>(
    source: &S,
    layout: &DataLayout,
    index: &FileIndex,
    strategy: LoadStrategy,
) -> Result<Vec<UserRecord>> {
    let mut records = Vec::with_capacity(index.len());
    for (user, files) in &index.0 {
        let record = load_user(source, layout, user, files, strategy)
            .await
            .map_err(|e| {
                tracing::warn!(user = %user, "Load failed: {}", e);
                e
            })?;
        records.push(record);
    }
    Ok(records)
}

pub async fn load_catalog<S: DataSource + ?Sized>(
    source: &S,
    layout: &DataLayout,
    strategy: LoadStrategy,
) -> Result<Vec<UserRecord>> {
    let index = load_index(source, layout).await?;
    load_all(source, layout, &index, strategy).await
}

/// Genres for one user's artists. Never fails: a missing or broken file is an empty map.
pub async fn load_genres<S: DataSource + ?Sized>(source: &S, layout: &DataLayout, user: &str) -> GenreMap {
    let location = layout.genre_file(user);
    let parsed = match fetch_json(source, &location).await {
        Ok(raw) => serde_json::from_value::<GenreMap>(raw).map_err(|e| CatalogError::shape(location.as_str(), e)),
        Err(e) => Err(e),
    };
    match parsed {
        Ok(genres) => genres,
        Err(e) => {
            tracing::warn!(user, "No genre data: {}", e);
            GenreMap::default()
        }
    }
}

/// Issued by [`CatalogCache::begin_load`]; only the newest ticket may install a result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Owns the last successfully loaded catalog.
///
/// Loads are not cancelled. Instead every load takes a ticket, and a load
/// that finishes after a newer one was started (or after `invalidate`) is
/// dropped, so the most recently requested load is the one that sticks.
#[derive(Debug, Default)]
pub struct CatalogCache {
    generation: u64,
    in_flight: Option<u64>,
    records: Option<Arc<Vec<UserRecord>>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.in_flight = Some(self.generation);
        LoadTicket(self.generation)
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.0 == self.generation
    }

    /// Installs `records` if `ticket` is still current. Returns whether it was.
    pub fn complete(&mut self, ticket: LoadTicket, records: Vec<UserRecord>) -> bool {
        if !self.is_current(ticket) {
            tracing::info!("Discarding stale catalog load #{} (latest #{})", ticket.0, self.generation);
            return false;
        }
        self.in_flight = None;
        self.records = Some(Arc::new(records));
        true
    }

    /// Ends a failed load. Whatever was cached before stays.
    pub fn fail(&mut self, ticket: LoadTicket) {
        if self.is_current(ticket) {
            self.in_flight = None;
        }
    }

    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.in_flight = None;
        self.records = None;
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn records(&self) -> Option<Arc<Vec<UserRecord>>> {
        self.records.clone()
    }

    pub fn users(&self) -> Vec<String> {
        self.records
            .as_ref()
            .map(|r| r.iter().map(|u| u.user.clone()).collect())
            .unwrap_or_default()
    }

    pub fn find(&self, user: &str) -> Option<UserRecord> {
        self.records.as_ref()?.iter().find(|u| u.user == user).cloned()
    }
}

/// Runs a full catalog load through `cache`. A load overtaken by a newer
/// `begin_load` or an `invalidate` returns `Superseded`.
pub async fn refresh_catalog<S: DataSource + ?Sized>(
    cache: &std::cell::RefCell<CatalogCache>,
    source: &S,
    layout: &DataLayout,
    strategy: LoadStrategy,
) -> Result<Arc<Vec<UserRecord>>> {
    let ticket = cache.borrow_mut().begin_load();
    match load_catalog(source, layout, strategy).await {
        Ok(records) => {
            let mut cache = cache.borrow_mut();
            if !cache.complete(ticket, records) {
                return Err(CatalogError::Superseded);
            }
            cache.records().ok_or(CatalogError::Superseded)
        }
        Err(e) => {
            cache.borrow_mut().fail(ticket);
            Err(e)
        }
    }
}
