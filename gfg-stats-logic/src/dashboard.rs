use crate::payload::{
    Payload, ProblemRef, ProblemsResponse, ProfileResponse, StatsResponse, display_value,
    is_truthy,
};

pub const ALL_DIFFICULTIES: &str = "All";
pub const NO_PROBLEMS_MESSAGE: &str = "No problems found for this difficulty";

/// The three payloads of a finished search, stored as received
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub username: String,
    pub profile: ProfileResponse,
    pub stats: StatsResponse,
    pub problems: ProblemsResponse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileHeader {
    pub display_name: String,
    pub designation: Option<String>,
    pub handle: String,
    pub coding_score: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    ProblemsSolved,
    InstituteRank,
    Articles,
    LongestStreak,
}

impl CardKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::ProblemsSolved => "Problems Solved",
            Self::InstituteRank => "Institute Rank",
            Self::Articles => "Articles",
            Self::LongestStreak => "Longest Streak",
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::ProblemsSolved => "problemsSolved",
            Self::InstituteRank => "instituteRank",
            Self::Articles => "articlesPublished",
            Self::LongestStreak => "longestStreak",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    pub kind: CardKind,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifficultyCount {
    pub difficulty: String,
    pub count: String,
}

/// Markdown and URL for embedding the stats card elsewhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedSnippet {
    pub image_url: String,
    pub markdown: String,
}

impl Dashboard {
    fn profile_text(&self, key: &str) -> Option<String> {
        self.profile
            .field(key)
            .filter(|v| is_truthy(v))
            .map(display_value)
    }

    pub fn header(&self) -> ProfileHeader {
        ProfileHeader {
            display_name: self
                .profile_text("fullName")
                .unwrap_or_else(|| self.username.clone()),
            designation: self.profile_text("designation"),
            handle: format!("@{}", self.username),
            coding_score: self
                .profile
                .field("codingScore")
                .map(display_value)
                .unwrap_or_default(),
        }
    }

    pub fn stat_cards(&self) -> Vec<StatCard> {
        [
            CardKind::ProblemsSolved,
            CardKind::InstituteRank,
            CardKind::Articles,
            CardKind::LongestStreak,
        ]
        .into_iter()
        .map(|kind| {
            let value = if kind == CardKind::InstituteRank {
                self.profile_text(kind.key())
                    .unwrap_or_else(|| "N/A".to_string())
            } else {
                self.profile
                    .field(kind.key())
                    .map(display_value)
                    .unwrap_or_default()
            };
            StatCard { kind, value }
        })
        .collect()
    }

    pub fn difficulty_breakdown(&self) -> Vec<DifficultyCount> {
        self.stats
            .difficulties()
            .into_iter()
            .map(|(difficulty, count)| DifficultyCount {
                difficulty: difficulty.to_string(),
                count: display_value(count),
            })
            .collect()
    }

    /// Filter choices for the problem list, `All` first
    pub fn difficulty_filters(&self) -> Vec<&str> {
        std::iter::once(ALL_DIFFICULTIES)
            .chain(self.problems.difficulties())
            .collect()
    }

    pub fn problems_for(&self, difficulty: &str) -> Vec<ProblemRef<'_>> {
        if difficulty == ALL_DIFFICULTIES {
            self.problems.all()
        } else {
            self.problems.bucket(difficulty)
        }
    }

    pub fn embed_snippet(&self, origin: &str) -> EmbedSnippet {
        let image_url = format!(
            "{}/api/stats/{}?format=svg",
            origin.trim_end_matches('/'),
            self.username
        );
        EmbedSnippet {
            markdown: format!("![GFG Stats]({image_url})"),
            image_url,
        }
    }

    /// Whether the problem list section should be shown at all
    pub fn show_problems(&self) -> bool {
        self.problems.has_problems()
    }
}
