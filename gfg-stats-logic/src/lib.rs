mod dashboard;
mod payload;
mod search;
mod username;

pub use dashboard::{
    ALL_DIFFICULTIES, CardKind, Dashboard, DifficultyCount, EmbedSnippet, NO_PROBLEMS_MESSAGE,
    ProfileHeader, StatCard,
};
pub use payload::{
    Payload, ProblemRef, ProblemsResponse, ProfileResponse, StatsResponse, display_value,
    is_truthy,
};
pub use search::{
    EMPTY_USERNAME_MESSAGE, FALLBACK_MESSAGE, SearchOutcome, SearchSession, SearchState,
    StatsSource,
};
pub use username::{Username, UsernameError, UsernameRule};

pub mod prelude {
    use anyhow::Error as AnyhowError;
    use std::result::Result as StdResult;
    pub type Result<T = (), E = AnyhowError> = StdResult<T, E>;
    pub use anyhow::{Context, anyhow, bail};
}
