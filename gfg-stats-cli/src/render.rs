use std::fmt;

use gfg_stats_logic::{Dashboard, NO_PROBLEMS_MESSAGE};

/// Terminal rendition of a loaded dashboard
pub struct DashboardView<'a> {
    pub dashboard: &'a Dashboard,
    pub difficulty: &'a str,
    pub origin: &'a str,
}

impl fmt::Display for DashboardView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dash = self.dashboard;
        let header = dash.header();

        writeln!(f, "{}", header.display_name)?;
        if let Some(designation) = &header.designation {
            writeln!(f, "{designation}")?;
        }
        writeln!(f, "{}", header.handle)?;
        writeln!(f, "Coding Score: {}", header.coding_score)?;
        writeln!(f)?;

        let cards = dash
            .stat_cards()
            .into_iter()
            .map(|card| format!("{}: {}", card.kind.label(), card.value))
            .collect::<Vec<_>>();
        writeln!(f, "{}", cards.join(" | "))?;
        writeln!(f)?;

        writeln!(f, "Problems by Difficulty")?;
        for entry in dash.difficulty_breakdown() {
            writeln!(f, "  {:<8} {}", entry.difficulty, entry.count)?;
        }

        if dash.show_problems() {
            writeln!(f)?;
            let filters = dash
                .difficulty_filters()
                .into_iter()
                .map(|d| {
                    if d == self.difficulty {
                        format!("[{d}]")
                    } else {
                        d.to_string()
                    }
                })
                .collect::<Vec<_>>();
            writeln!(f, "Solved Problems  {}", filters.join(" "))?;

            let problems = dash.problems_for(self.difficulty);
            if problems.is_empty() {
                writeln!(f, "  {NO_PROBLEMS_MESSAGE}")?;
            }
            for problem in problems {
                writeln!(f, "  - {} <{}>", problem.question, problem.question_url)?;
            }
        }

        writeln!(f)?;
        let snippet = dash.embed_snippet(self.origin);
        writeln!(f, "Embeddable Stats Card")?;
        writeln!(f, "  {}", snippet.image_url)?;
        write!(f, "  {}", snippet.markdown)
    }
}
