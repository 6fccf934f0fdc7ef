//! Text rendering for games, search results and the backlog

use agrd_common::GameSummary;
use chrono::{DateTime, Datelike};

use crate::dispatcher::{Phase, Snapshot};
use crate::selection::SelectionStore;

/// Default cover size in the image CDN
pub const DEFAULT_COVER_SIZE: &str = "cover_big";

const COVER_BASE_URL: &str = "https://images.igdb.com/igdb/image/upload";

/// Cover image URL for `image_id` at `size` (e.g. `cover_big`, `thumb`)
pub fn cover_url(image_id: &str, size: &str) -> String {
    format!("{}/t_{}/{}.jpg", COVER_BASE_URL, size, image_id)
}

/// Release year, or `N/A` when unknown (a zero timestamp counts as unknown)
pub fn release_year(game: &GameSummary) -> String {
    game.first_release_date
        .filter(|&secs| secs != 0)
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.year().to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Genres joined with `, `, or `Unknown genre`
pub fn genre_line(game: &GameSummary) -> String {
    let names = game.genre_names();
    if names.is_empty() {
        "Unknown genre".to_string()
    } else {
        names.join(", ")
    }
}

/// Multi-line card for a backlog entry
pub fn game_card(game: &GameSummary) -> String {
    let mut card = format!(
        "[{}] {}\n    {} | {}",
        game.id,
        game.name,
        genre_line(game),
        release_year(game)
    );
    if let Some(image_id) = game.cover_image_id() {
        card.push_str("\n    ");
        card.push_str(&cover_url(image_id, DEFAULT_COVER_SIZE));
    }
    card
}

/// One numbered result line, marked when the game is already in the backlog
pub fn result_line(index: usize, game: &GameSummary, store: &SelectionStore) -> String {
    let marker = if store.contains(game.id) { " (added)" } else { "" };
    format!("{:>2}. {} ({}){}", index + 1, game.name, release_year(game), marker)
}

/// Everything the terminal shows for a dispatcher snapshot
pub fn render_snapshot(snapshot: &Snapshot, store: &SelectionStore) -> Vec<String> {
    let mut lines = Vec::new();
    match &snapshot.phase {
        Phase::Idle => {}
        Phase::Pending { .. } => {}
        Phase::Loading { query } => lines.push(format!("Searching \"{}\"...", query)),
        Phase::Settled { query, results } => {
            if results.is_empty() && snapshot.notice.is_none() {
                lines.push(format!("No games found for \"{}\"", query));
            }
            for (i, game) in results.iter().enumerate() {
                lines.push(result_line(i, game, store));
            }
        }
    }
    if let Some(notice) = &snapshot.notice {
        lines.push(format!("! {}", notice));
    }
    lines
}
