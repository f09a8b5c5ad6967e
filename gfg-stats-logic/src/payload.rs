use serde_json::Value;

/// Keys in a stats payload that aren't difficulty buckets
const STATS_META_KEYS: [&str; 3] = ["userName", "totalProblemsSolved", "error"];

/// Whether a JSON value would count as "set" to the dashboard (non-empty, non-zero, non-null)
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a JSON value the way it should appear in a card
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A JSON document received verbatim from the backend
pub trait Payload {
    fn raw(&self) -> &Value;

    fn field(&self, key: &str) -> Option<&Value> {
        self.raw().get(key)
    }

    /// The application-level `error` field, if the backend set one
    fn app_error(&self) -> Option<String> {
        self.field("error")
            .filter(|v| is_truthy(v))
            .map(display_value)
    }
}

macro_rules! payload_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name(Value);

        impl $name {
            pub fn new(raw: Value) -> Self {
                Self(raw)
            }
        }

        impl Payload for $name {
            fn raw(&self) -> &Value {
                &self.0
            }
        }

        impl From<Value> for $name {
            fn from(raw: Value) -> Self {
                Self(raw)
            }
        }
    };
}

payload_type!(
    /// Profile summary: name, designation, coding score, streaks
    ProfileResponse
);
payload_type!(
    /// Solved problem counts keyed by difficulty
    StatsResponse
);
payload_type!(
    /// Solved problems grouped by difficulty under `Problems`
    ProblemsResponse
);

impl StatsResponse {
    /// Difficulty buckets in the order the backend sent them
    pub fn difficulties(&self) -> Vec<(&str, &Value)> {
        self.0
            .as_object()
            .map(|obj| {
                obj.iter()
                    .filter(|(k, _)| !STATS_META_KEYS.contains(&k.as_str()))
                    .map(|(k, v)| (k.as_str(), v))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProblemRef<'a> {
    pub question: &'a str,
    pub question_url: &'a str,
}

impl<'a> ProblemRef<'a> {
    fn from_value(value: &'a Value) -> Self {
        let text = |key| value.get(key).and_then(Value::as_str).unwrap_or_default();
        Self {
            question: text("question"),
            question_url: text("questionUrl"),
        }
    }
}

impl ProblemsResponse {
    fn buckets(&self) -> Option<&serde_json::Map<String, Value>> {
        self.field("Problems").and_then(Value::as_object)
    }

    pub fn has_problems(&self) -> bool {
        self.field("Problems").is_some_and(is_truthy)
    }

    /// Difficulty names under `Problems`, in backend order
    pub fn difficulties(&self) -> Vec<&str> {
        self.buckets()
            .map(|b| b.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Problems for one difficulty, empty when the difficulty isn't present
    pub fn bucket(&self, difficulty: &str) -> Vec<ProblemRef<'_>> {
        self.buckets()
            .and_then(|b| b.get(difficulty))
            .and_then(Value::as_array)
            .map(|list| list.iter().map(ProblemRef::from_value).collect())
            .unwrap_or_default()
    }

    /// Every problem across every difficulty, bucket order preserved
    pub fn all(&self) -> Vec<ProblemRef<'_>> {
        self.buckets()
            .map(|b| {
                b.values()
                    .filter_map(Value::as_array)
                    .flatten()
                    .map(ProblemRef::from_value)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(false)));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!(3)));
        assert!(is_truthy(&json!({})));
    }

    #[test]
    fn test_app_error() {
        assert_eq!(
            ProfileResponse::new(json!({"error": "User not found"})).app_error(),
            Some("User not found".to_string())
        );
        assert_eq!(ProfileResponse::new(json!({"error": ""})).app_error(), None);
        assert_eq!(ProfileResponse::new(json!({"error": null})).app_error(), None);
        assert_eq!(ProfileResponse::new(json!([1, 2])).app_error(), None);
    }

    #[test]
    fn test_stats_difficulties_skip_meta() {
        let stats = StatsResponse::new(json!({
            "userName": "geek",
            "School": 1,
            "Basic": 2,
            "Easy": 3,
            "totalProblemsSolved": 6,
            "Medium": 0,
            "Hard": 0,
        }));
        let names = stats
            .difficulties()
            .into_iter()
            .map(|(k, _)| k)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["School", "Basic", "Easy", "Medium", "Hard"]);
    }

    #[test]
    fn test_problem_buckets() {
        let problems = ProblemsResponse::new(json!({
            "Problems": {
                "Easy": [
                    {"question": "Two Sum", "questionUrl": "https://x/two-sum"},
                ],
                "Hard": [
                    {"question": "N Queens", "questionUrl": "https://x/n-queens"},
                    {"question": "Word Break"},
                ],
            }
        }));

        assert!(problems.has_problems());
        assert_eq!(problems.difficulties(), vec!["Easy", "Hard"]);
        assert_eq!(problems.bucket("Hard").len(), 2);
        assert_eq!(problems.bucket("Hard")[1].question_url, "");
        assert!(problems.bucket("Medium").is_empty());

        let all = problems.all();
        assert_eq!(
            all.iter().map(|p| p.question).collect::<Vec<_>>(),
            vec!["Two Sum", "N Queens", "Word Break"]
        );
    }

    #[test]
    fn test_missing_problems_key() {
        let problems = ProblemsResponse::new(json!({"userName": "geek"}));
        assert!(!problems.has_problems());
        assert!(problems.difficulties().is_empty());
        assert!(problems.all().is_empty());
    }
}
