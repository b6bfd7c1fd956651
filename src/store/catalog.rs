use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::StoreError;
use crate::protocol::{DetailReply, GameKind, GameSummary, Review, Status, UploadInitRequest};

/// Reviews returned by DETAIL are capped to the most recent five.
const DETAIL_REVIEW_LIMIT: usize = 5;

/// Scores are clamped server-side; the client enforces the same bounds.
const SCORE_MIN: i64 = 1;
const SCORE_MAX: i64 = 5;

/// One committed archive version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub checksum: String,
    pub archive_path: String,
}

/// One catalogue entry. Ownership is fixed by the first successful upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEntry {
    pub id: u32,
    pub owner: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: GameKind,
    pub min_players: u32,
    pub max_players: u32,
    pub latest_version: String,
    pub versions: BTreeMap<String, VersionEntry>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub played_by: BTreeSet<String>,
    #[serde(default)]
    pub review_count: u64,
}

impl GameEntry {
    pub fn latest(&self) -> Option<&VersionEntry> {
        self.versions.get(&self.latest_version)
    }

    fn average_score(&self) -> f64 {
        if self.reviews.is_empty() {
            return 0.0;
        }
        let sum: i64 = self.reviews.iter().map(|r| r.score).sum();
        let avg = sum as f64 / self.reviews.len() as f64;
        (avg * 10.0).round() / 10.0
    }
}

/// The authoritative game table, keyed by unique game name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    games: BTreeMap<String, GameEntry>,
}

impl Catalog {
    pub fn get(&self, name: &str) -> Option<&GameEntry> {
        self.games.get(name)
    }

    pub fn get_by_id(&self, id: u32) -> Option<(&String, &GameEntry)> {
        self.games.iter().find(|(_, g)| g.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Commit a verified upload. The archive has already been renamed into
    /// place; this mutates metadata only.
    ///
    /// A new name creates the entry with the caller as immutable owner. An
    /// existing name is writable by the owner alone; any other developer is
    /// refused and the entry is untouched.
    pub fn commit_upload(
        &mut self,
        caller: &str,
        init: &UploadInitRequest,
        archive_path: String,
    ) -> Result<(), StoreError> {
        if let Some(existing) = self.games.get(&init.name) {
            if existing.owner != caller {
                return Err(StoreError::NotOwner);
            }
        }

        let next_id = self.games.len() as u32 + 1;
        let entry = self.games.entry(init.name.clone()).or_insert_with(|| GameEntry {
            id: next_id,
            owner: caller.to_string(),
            description: String::new(),
            kind: init.kind,
            min_players: init.min_players,
            max_players: init.max_players,
            latest_version: String::new(),
            versions: BTreeMap::new(),
            reviews: Vec::new(),
            played_by: BTreeSet::new(),
            review_count: 0,
        });

        // Metadata always reflects the latest accepted manifest.
        entry.description = init.description.clone();
        entry.kind = init.kind;
        entry.min_players = init.min_players;
        entry.max_players = init.max_players;
        entry.latest_version = init.version.clone();
        entry.versions.insert(
            init.version.clone(),
            VersionEntry {
                checksum: init.checksum.clone(),
                archive_path,
            },
        );
        Ok(())
    }

    pub fn list(&self) -> Vec<GameSummary> {
        self.games
            .iter()
            .map(|(name, g)| GameSummary {
                id: g.id,
                name: name.clone(),
                version: g.latest_version.clone(),
                min_players: g.min_players,
                max_players: g.max_players,
                owner: g.owner.clone(),
            })
            .collect()
    }

    pub fn owned_by(&self, owner: &str) -> Vec<GameSummary> {
        self.games
            .iter()
            .filter(|(_, g)| g.owner == owner)
            .map(|(name, g)| GameSummary {
                id: g.id,
                name: name.clone(),
                version: g.latest_version.clone(),
                min_players: g.min_players,
                max_players: g.max_players,
                owner: g.owner.clone(),
            })
            .collect()
    }

    pub fn detail(&self, name: &str, caller: &str) -> Result<DetailReply, StoreError> {
        let game = self.games.get(name).ok_or(StoreError::GameNotFound)?;
        let recent = game
            .reviews
            .iter()
            .rev()
            .take(DETAIL_REVIEW_LIMIT)
            .cloned()
            .collect();
        Ok(DetailReply {
            status: Status::Ok,
            name: name.to_string(),
            version: game.latest_version.clone(),
            owner: game.owner.clone(),
            description: game.description.clone(),
            kind: game.kind,
            min_players: game.min_players,
            max_players: game.max_players,
            avg_score: game.average_score(),
            reviews: recent,
            has_played: game.played_by.contains(caller),
        })
    }

    /// Append a review. The caller must appear in the game's play history.
    pub fn rate(
        &mut self,
        name: &str,
        user: &str,
        score: i64,
        comment: String,
        time: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let game = self.games.get_mut(name).ok_or(StoreError::GameNotFound)?;
        if !game.played_by.contains(user) {
            return Err(StoreError::NotPlayed);
        }
        game.reviews.push(Review {
            user: user.to_string(),
            score: score.clamp(SCORE_MIN, SCORE_MAX),
            comment,
            time,
        });
        game.review_count += 1;
        Ok(())
    }

    /// Drop a catalogue entry. Archives on disk are retained. The caller must
    /// be the owner; the hub refuses removal while any room references the
    /// game before calling this.
    pub fn remove(&mut self, name: &str, caller: &str) -> Result<GameEntry, StoreError> {
        let game = self.games.get(name).ok_or(StoreError::GameNotFound)?;
        if game.owner != caller {
            return Err(StoreError::NotOwner);
        }
        self.games.remove(name).ok_or(StoreError::GameNotFound)
    }

    /// Record that a set of players launched this game. Duplicates never
    /// accumulate.
    pub fn record_play<'a>(&mut self, name: &str, players: impl IntoIterator<Item = &'a str>) {
        if let Some(game) = self.games.get_mut(name) {
            for player in players {
                game.played_by.insert(player.to_string());
            }
        }
    }
}
