use std::collections::HashSet;

use serde::Serialize;

use crate::models::{LibraryEntry, LibraryStatus};

/// Genres that mark a title as built around an invented world
const WORLDBUILDING_GENRES: [&str; 5] = ["rpg", "role-playing", "fantasy", "sci-fi", "science fiction"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Worldbuilder,
    Completionist,
    BingeMachine,
    Critic,
    Explorer,
    Loyalist,
    Curator,
}

impl Archetype {
    /// Declaration order; earlier archetypes win exact ties
    pub const ALL: [Archetype; 7] = [
        Archetype::Worldbuilder,
        Archetype::Completionist,
        Archetype::BingeMachine,
        Archetype::Critic,
        Archetype::Explorer,
        Archetype::Loyalist,
        Archetype::Curator,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Archetype::Worldbuilder => "The Worldbuilder",
            Archetype::Completionist => "The Completionist",
            Archetype::BingeMachine => "The Binge Machine",
            Archetype::Critic => "The Critic",
            Archetype::Explorer => "The Explorer",
            Archetype::Loyalist => "The Loyalist",
            Archetype::Curator => "The Curator",
        }
    }

    pub fn tagline(&self) -> &'static str {
        match self {
            Archetype::Worldbuilder => "You live for sprawling lore and worlds you can get lost in.",
            Archetype::Completionist => "If you start it, you finish it.",
            Archetype::BingeMachine => "One more episode is never just one more.",
            Archetype::Critic => "Every title earns its score, and few earn a high one.",
            Archetype::Explorer => "Anime, books, games, films: you sample everything.",
            Archetype::Loyalist => "You know what you love and you stick with it.",
            Archetype::Curator => "Your watchlist is a carefully tended collection.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArchetypeScore {
    pub archetype: Archetype,
    pub score: u32,
}

/// Winning archetype plus every archetype's points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Personality {
    pub archetype: Archetype,
    pub label: &'static str,
    pub tagline: &'static str,
    pub scores: Vec<ArchetypeScore>,
}

/// Library ratios the archetype rules are evaluated against
#[derive(Debug, Clone, Default, PartialEq)]
struct LibraryStats {
    total: usize,
    completion_rate: f64,
    planning_ratio: f64,
    worldbuilding_concentration: f64,
    type_variety: usize,
    rated_ratio: f64,
    rated: usize,
    avg_rating: f64,
    favorite_ratio: f64,
    in_progress: usize,
    dropped: usize,
}

fn is_worldbuilding(entry: &LibraryEntry) -> bool {
    entry.media.genres.iter().any(|genre| {
        let genre = genre.to_lowercase();
        WORLDBUILDING_GENRES.iter().any(|g| genre.contains(g))
    })
}

fn library_stats(entries: &[LibraryEntry]) -> LibraryStats {
    let total = entries.len();
    if total == 0 {
        return LibraryStats::default();
    }

    let count = |status: LibraryStatus| entries.iter().filter(|e| e.status == status).count();
    let ratings: Vec<f64> = entries.iter().filter_map(|e| e.rating).collect();
    let types: HashSet<_> = entries.iter().map(|e| e.media.media_type).collect();
    let n = total as f64;

    LibraryStats {
        total,
        completion_rate: count(LibraryStatus::Completed) as f64 / n,
        planning_ratio: count(LibraryStatus::Planning) as f64 / n,
        worldbuilding_concentration: entries.iter().filter(|e| is_worldbuilding(e)).count() as f64 / n,
        type_variety: types.len(),
        rated_ratio: ratings.len() as f64 / n,
        rated: ratings.len(),
        avg_rating: if ratings.is_empty() {
            0.0
        } else {
            ratings.iter().sum::<f64>() / ratings.len() as f64
        },
        favorite_ratio: entries.iter().filter(|e| e.favorite).count() as f64 / n,
        in_progress: count(LibraryStatus::InProgress),
        dropped: count(LibraryStatus::Dropped),
    }
}

fn points(archetype: Archetype, stats: &LibraryStats) -> u32 {
    let mut score = 0;
    match archetype {
        Archetype::Worldbuilder => {
            if stats.worldbuilding_concentration > 0.4 {
                score += 3;
            } else if stats.worldbuilding_concentration > 0.25 {
                score += 1;
            }
        }
        Archetype::Completionist => {
            if stats.completion_rate > 0.7 {
                score += 3;
            } else if stats.completion_rate > 0.5 {
                score += 1;
            }
        }
        Archetype::BingeMachine => {
            if stats.total >= 50 {
                score += 2;
            }
            if stats.in_progress >= 5 {
                score += 2;
            }
        }
        Archetype::Critic => {
            if stats.rated_ratio > 0.8 {
                score += 2;
            }
            if stats.rated >= 5 && stats.avg_rating < 6.5 {
                score += 2;
            }
        }
        Archetype::Explorer => {
            if stats.type_variety >= 4 {
                score += 3;
            } else if stats.type_variety == 3 {
                score += 1;
            }
        }
        Archetype::Loyalist => {
            if stats.favorite_ratio > 0.2 {
                score += 2;
            }
            if stats.total >= 10 && stats.dropped == 0 {
                score += 1;
            }
        }
        Archetype::Curator => {
            if stats.planning_ratio > 0.4 {
                score += 3;
            }
        }
    }
    score
}

/// Labels a library with one of seven archetypes
pub fn classify(entries: &[LibraryEntry]) -> Personality {
    let stats = library_stats(entries);

    let scores: Vec<ArchetypeScore> = Archetype::ALL
        .iter()
        .map(|&archetype| ArchetypeScore {
            archetype,
            score: points(archetype, &stats),
        })
        .collect();

    // Strict comparison keeps the earliest archetype on a tie
    let mut winner = scores[0];
    for candidate in &scores[1..] {
        if candidate.score > winner.score {
            winner = *candidate;
        }
    }

    Personality {
        archetype: winner.archetype,
        label: winner.archetype.label(),
        tagline: winner.archetype.tagline(),
        scores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaSnapshot, MediaType};
    use chrono::Utc;
    use uuid::Uuid;

    fn entry(media_type: MediaType, status: LibraryStatus, genres: &[&str]) -> LibraryEntry {
        LibraryEntry {
            user_id: Uuid::nil(),
            media_id: Uuid::new_v4().to_string(),
            media: MediaSnapshot {
                title: "Title".to_string(),
                media_type,
                cover_url: None,
                year: None,
                rating: None,
                popularity: None,
                genres: genres.iter().map(|g| g.to_string()).collect(),
                tags: vec![],
            },
            status,
            progress: 0,
            rating: None,
            favorite: false,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn score_of(personality: &Personality, archetype: Archetype) -> u32 {
        personality
            .scores
            .iter()
            .find(|s| s.archetype == archetype)
            .map(|s| s.score)
            .unwrap()
    }

    #[test]
    fn test_completionist_high_completion() {
        let mut library: Vec<LibraryEntry> = (0..8)
            .map(|_| entry(MediaType::Film, LibraryStatus::Completed, &["Drama"]))
            .collect();
        library.push(entry(MediaType::Film, LibraryStatus::Planning, &["Drama"]));
        library.push(entry(MediaType::Film, LibraryStatus::Dropped, &["Drama"]));

        let personality = classify(&library);
        assert!(score_of(&personality, Archetype::Completionist) >= 3);
        assert_eq!(personality.archetype, Archetype::Completionist);
        assert_eq!(personality.label, "The Completionist");
    }

    #[test]
    fn test_tie_goes_to_first_declared() {
        // Fantasy concentration and completion both score 3
        let library = vec![
            entry(MediaType::Anime, LibraryStatus::Completed, &["Fantasy"]),
            entry(MediaType::Anime, LibraryStatus::Completed, &["Fantasy"]),
        ];
        let personality = classify(&library);
        assert_eq!(score_of(&personality, Archetype::Worldbuilder), 3);
        assert_eq!(score_of(&personality, Archetype::Completionist), 3);
        assert_eq!(personality.archetype, Archetype::Worldbuilder);
    }

    #[test]
    fn test_empty_library_defaults_to_first() {
        let personality = classify(&[]);
        assert!(personality.scores.iter().all(|s| s.score == 0));
        assert_eq!(personality.archetype, Archetype::Worldbuilder);
        assert_eq!(personality.scores.len(), 7);
    }

    #[test]
    fn test_explorer_and_curator() {
        let library = vec![
            entry(MediaType::Anime, LibraryStatus::Planning, &[]),
            entry(MediaType::Book, LibraryStatus::Planning, &[]),
            entry(MediaType::Game, LibraryStatus::Planning, &[]),
            entry(MediaType::Tv, LibraryStatus::Planning, &[]),
            entry(MediaType::Film, LibraryStatus::InProgress, &[]),
        ];
        let personality = classify(&library);
        assert_eq!(score_of(&personality, Archetype::Explorer), 3);
        assert_eq!(score_of(&personality, Archetype::Curator), 3);
        // Explorer is declared first
        assert_eq!(personality.archetype, Archetype::Explorer);
    }

    #[test]
    fn test_harsh_critic() {
        let library: Vec<LibraryEntry> = (0..5)
            .map(|_| {
                let mut e = entry(MediaType::Film, LibraryStatus::InProgress, &["Horror"]);
                e.rating = Some(4.0);
                e
            })
            .collect();
        let personality = classify(&library);
        assert_eq!(score_of(&personality, Archetype::Critic), 4);
        assert_eq!(score_of(&personality, Archetype::BingeMachine), 2);
        assert_eq!(personality.archetype, Archetype::Critic);
    }

    #[test]
    fn test_loyalist_rules() {
        let library: Vec<LibraryEntry> = (0..10)
            .map(|i| {
                let mut e = entry(MediaType::Manga, LibraryStatus::InProgress, &["Romance"]);
                e.favorite = i < 3;
                e
            })
            .collect();
        let personality = classify(&library);
        assert_eq!(score_of(&personality, Archetype::Loyalist), 3);
    }

    #[test]
    fn test_worldbuilding_genre_matching() {
        let rpg = entry(MediaType::Game, LibraryStatus::Completed, &["Role-playing (RPG)"]);
        let scifi = entry(MediaType::Film, LibraryStatus::Completed, &["Science Fiction"]);
        let drama = entry(MediaType::Film, LibraryStatus::Completed, &["Drama"]);
        assert!(is_worldbuilding(&rpg));
        assert!(is_worldbuilding(&scifi));
        assert!(!is_worldbuilding(&drama));
    }
}
