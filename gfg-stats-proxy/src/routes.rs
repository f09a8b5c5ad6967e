use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::{Path, RawQuery, State, rejection::PathRejection},
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
};
use gfg_stats_logic::{Username, UsernameError, UsernameRule};
use log::{error, info};
use serde_json::Value;

use crate::{error::ProxyError, state::ProxyState};

const SVG_CONTENT_TYPE: &str = "image/svg+xml";
const SVG_CACHE_CONTROL: &str = "public, max-age=14400";
const PROBLEMS_CACHE_CONTROL: &str = "public, s-maxage=7200";

const CONNECT_FAILED: &str = "Failed to connect to backend service";
const PROBLEMS_FAILED: &str = "Failed to fetch problems";

#[derive(Debug, Clone, Copy)]
enum BackendErrors {
    /// Log the backend's body, answer with its status and this message
    Passthrough(&'static str),
    /// Collapse into a 500 with the route's failure message
    Generalize,
}

/// How one proxy route validates, forwards, and reshapes
#[derive(Debug, Clone, Copy)]
struct ProxyRoute {
    name: &'static str,
    rule: UsernameRule,
    timeout: Duration,
    failure: &'static str,
    backend_errors: BackendErrors,
    svg_passthrough: bool,
    json_cache_control: Option<&'static str>,
}

const STATS: ProxyRoute = ProxyRoute {
    name: "stats",
    rule: UsernameRule::Dotted,
    timeout: Duration::from_secs(30),
    failure: CONNECT_FAILED,
    backend_errors: BackendErrors::Passthrough("User not found or backend error"),
    svg_passthrough: true,
    json_cache_control: None,
};

const PROBLEMS: ProxyRoute = ProxyRoute {
    name: "problems",
    rule: UsernameRule::Strict,
    timeout: Duration::from_secs(60),
    failure: PROBLEMS_FAILED,
    backend_errors: BackendErrors::Generalize,
    svg_passthrough: false,
    json_cache_control: Some(PROBLEMS_CACHE_CONTROL),
};

const PROFILE: ProxyRoute = ProxyRoute {
    name: "profile",
    rule: UsernameRule::Dotted,
    timeout: Duration::from_secs(30),
    failure: CONNECT_FAILED,
    backend_errors: BackendErrors::Passthrough("Profile not found or backend error"),
    svg_passthrough: false,
    json_cache_control: None,
};

type RouteResult = Result<Response, ProxyError>;
type UsernamePath = Result<Path<String>, PathRejection>;

fn is_svg(resp: &reqwest::Response) -> bool {
    resp.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains(SVG_CONTENT_TYPE))
}

impl ProxyRoute {
    /// Validate the `{username}` segment, a segment that isn't UTF-8 counts as a bad format
    fn validate(&self, path: UsernamePath) -> Result<Username, ProxyError> {
        let Path(raw) = path.map_err(|why| {
            info!("Rejected {} request: {why}", self.name);
            UsernameError::InvalidFormat(self.rule)
        })?;

        Username::parse(&raw, self.rule).map_err(|why| {
            info!("Rejected {} request for {raw:?}: {why}", self.name);
            why.into()
        })
    }

    async fn forward(&self, state: &ProxyState, url: String) -> RouteResult {
        let resp = state
            .client()
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|why| {
                error!("Request to backend for {} failed: {why:?}", self.name);
                ProxyError::Upstream(self.failure)
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(match self.backend_errors {
                BackendErrors::Passthrough(message) => {
                    let body = resp.text().await.unwrap_or_default();
                    error!("Backend error ({status}) on {}: {body}", self.name);
                    ProxyError::Backend { status, message }
                }
                BackendErrors::Generalize => {
                    error!("Backend error ({status}) on {}", self.name);
                    ProxyError::Upstream(self.failure)
                }
            });
        }

        if self.svg_passthrough && is_svg(&resp) {
            let svg = resp.bytes().await.map_err(|why| {
                error!("Failed to read SVG for {}: {why:?}", self.name);
                ProxyError::Upstream(self.failure)
            })?;

            return Ok((
                [
                    (CONTENT_TYPE, SVG_CONTENT_TYPE),
                    (CACHE_CONTROL, SVG_CACHE_CONTROL),
                ],
                svg,
            )
                .into_response());
        }

        let data = resp.json::<Value>().await.map_err(|why| {
            error!("Backend sent invalid JSON for {}: {why:?}", self.name);
            ProxyError::Upstream(self.failure)
        })?;

        Ok(match self.json_cache_control {
            Some(cache) => ([(CACHE_CONTROL, cache)], Json(data)).into_response(),
            None => Json(data).into_response(),
        })
    }
}

async fn stats_handler(
    State(state): State<Arc<ProxyState>>,
    path: UsernamePath,
    RawQuery(query): RawQuery,
) -> RouteResult {
    let username = STATS.validate(path)?;
    // The query (e.g. format=svg) goes to the backend as-is
    let url = state.endpoint(&format!(
        "stats/{username}?{}",
        query.unwrap_or_default()
    ));
    STATS.forward(&state, url).await
}

async fn problems_handler(
    State(state): State<Arc<ProxyState>>,
    path: UsernamePath,
) -> RouteResult {
    let username = PROBLEMS.validate(path)?;
    let url = state.endpoint(&format!("problems/{username}"));
    PROBLEMS.forward(&state, url).await
}

async fn profile_handler(
    State(state): State<Arc<ProxyState>>,
    path: UsernamePath,
) -> RouteResult {
    let username = PROFILE.validate(path)?;
    let url = state.endpoint(&format!("profile/{username}"));
    PROFILE.forward(&state, url).await
}

pub fn router(state: Arc<ProxyState>) -> Router {
    Router::new()
        .route("/api/stats/{username}", get(stats_handler))
        .route("/api/problems/{username}", get(problems_handler))
        .route("/api/profile/{username}", get(profile_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;
    use tokio::net::TcpListener;

    const SVG_BODY: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"><text>geek</text></svg>"#;

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn fake_stats(Path(user): Path<String>, RawQuery(query): RawQuery) -> Response {
        match user.as_str() {
            "missing" => (StatusCode::NOT_FOUND, "no such user").into_response(),
            "teapot" => (StatusCode::IM_A_TEAPOT, "short and stout").into_response(),
            "garbled" => ([(CONTENT_TYPE, "application/json")], "{not json").into_response(),
            "sleepy" => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"userName": user})).into_response()
            }
            _ if query.as_deref() == Some("format=svg") => {
                ([(CONTENT_TYPE, "image/svg+xml; charset=utf-8")], SVG_BODY).into_response()
            }
            _ => Json(json!({"userName": user, "Easy": 3, "query": query})).into_response(),
        }
    }

    async fn fake_problems(Path(user): Path<String>, RawQuery(query): RawQuery) -> Response {
        match user.as_str() {
            "missing" => (StatusCode::NOT_FOUND, "no such user").into_response(),
            "sleepy" => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"Problems": {}})).into_response()
            }
            _ => Json(json!({
                "Problems": {"Easy": [{"question": "Two Sum", "questionUrl": "https://x/1"}]},
                "query": query,
            }))
            .into_response(),
        }
    }

    async fn fake_profile(Path(user): Path<String>) -> Response {
        match user.as_str() {
            "missing" => (StatusCode::NOT_FOUND, "no such user").into_response(),
            _ => Json(json!({"fullName": "Geek", "userName": user})).into_response(),
        }
    }

    async fn backend() -> String {
        serve(
            Router::new()
                .route("/stats/{user}", get(fake_stats))
                .route("/problems/{user}", get(fake_problems))
                .route("/profile/{user}", get(fake_profile)),
        )
        .await
    }

    async fn setup() -> String {
        serve(router(ProxyState::new(&backend().await).unwrap())).await
    }

    async fn get_json(url: String) -> (StatusCode, Option<String>, Value) {
        let resp = reqwest::get(url).await.unwrap();
        let status = resp.status();
        let cache = resp
            .headers()
            .get(CACHE_CONTROL)
            .map(|v| v.to_str().unwrap().to_string());
        (status, cache, resp.json().await.unwrap())
    }

    #[tokio::test]
    async fn test_stats_json() {
        let proxy = setup().await;
        let (status, cache, body) = get_json(format!("{proxy}/api/stats/john.doe")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache, None);
        assert_eq!(body["userName"], "john.doe");
        assert_eq!(body["Easy"], 3);
    }

    #[tokio::test]
    async fn test_stats_svg_passthrough() {
        let proxy = setup().await;
        let resp = reqwest::get(format!("{proxy}/api/stats/geek?format=svg"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "image/svg+xml");
        assert_eq!(resp.headers()[CACHE_CONTROL], SVG_CACHE_CONTROL);
        assert_eq!(resp.bytes().await.unwrap(), SVG_BODY.as_bytes());
    }

    #[tokio::test]
    async fn test_stats_forwards_query() {
        let proxy = setup().await;
        let (_, _, body) = get_json(format!("{proxy}/api/stats/geek?format=json&x=1")).await;
        assert_eq!(body["query"], "format=json&x=1");

        // Not re-serialized, a bare key stays bare
        let (_, _, body) = get_json(format!("{proxy}/api/stats/geek?flag")).await;
        assert_eq!(body["query"], "flag");
    }

    #[tokio::test]
    async fn test_stats_status_passthrough() {
        let proxy = setup().await;

        let (status, _, body) = get_json(format!("{proxy}/api/stats/missing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "User not found or backend error"}));

        let (status, _, _) = get_json(format!("{proxy}/api/stats/teapot")).await;
        assert_eq!(status, StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test]
    async fn test_stats_invalid_json() {
        let proxy = setup().await;
        let (status, _, body) = get_json(format!("{proxy}/api/stats/garbled")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": CONNECT_FAILED}));
    }

    #[tokio::test]
    async fn test_stats_validation() {
        let proxy = setup().await;

        let (status, _, body) = get_json(format!("{proxy}/api/stats/ab")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Username too short"}));

        let long = "a".repeat(51);
        let (status, _, body) = get_json(format!("{proxy}/api/stats/{long}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Username too long"}));

        let (status, _, body) = get_json(format!("{proxy}/api/stats/bad%24name")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Invalid username format"}));
    }

    #[tokio::test]
    async fn test_non_utf8_username() {
        let proxy = setup().await;

        for (route, message) in [
            ("stats", "Invalid username format"),
            ("profile", "Invalid username format"),
            ("problems", "Invalid"),
        ] {
            let resp = reqwest::get(format!("{proxy}/api/{route}/%FF%FE%FD"))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{route}");
            assert!(
                resp.headers()[CONTENT_TYPE]
                    .to_str()
                    .unwrap()
                    .starts_with("application/json")
            );
            assert_eq!(resp.json::<Value>().await.unwrap(), json!({"error": message}));
        }
    }

    #[tokio::test]
    async fn test_problems_cache_and_no_query() {
        let proxy = setup().await;
        let (status, cache, body) = get_json(format!("{proxy}/api/problems/geek?format=svg")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache.as_deref(), Some(PROBLEMS_CACHE_CONTROL));
        assert_eq!(body["Problems"]["Easy"][0]["question"], "Two Sum");
        assert_eq!(body["query"], Value::Null);
    }

    #[tokio::test]
    async fn test_problems_generalizes_backend_errors() {
        let proxy = setup().await;
        let (status, _, body) = get_json(format!("{proxy}/api/problems/missing")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": PROBLEMS_FAILED}));
    }

    #[tokio::test]
    async fn test_problems_rejects_dot() {
        let proxy = setup().await;
        let (status, _, body) = get_json(format!("{proxy}/api/problems/john.doe")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Invalid"}));
    }

    #[tokio::test]
    async fn test_profile() {
        let proxy = setup().await;

        let (status, cache, body) = get_json(format!("{proxy}/api/profile/john.doe")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache, None);
        assert_eq!(body["fullName"], "Geek");

        let (status, _, body) = get_json(format!("{proxy}/api/profile/missing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Profile not found or backend error"}));
    }

    #[test]
    fn test_route_timeouts() {
        assert_eq!(STATS.timeout, Duration::from_secs(30));
        assert_eq!(PROFILE.timeout, Duration::from_secs(30));
        assert_eq!(PROBLEMS.timeout, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_backend_timeout() {
        let state = ProxyState::new(&backend().await).unwrap();

        for (route, path, message) in [
            (STATS, "stats/sleepy?", CONNECT_FAILED),
            (PROBLEMS, "problems/sleepy", PROBLEMS_FAILED),
        ] {
            let route = ProxyRoute {
                timeout: Duration::from_millis(50),
                ..route
            };
            let Err(err) = route.forward(&state, state.endpoint(path)).await else {
                panic!("{path} should have timed out");
            };
            assert_eq!(err.to_string(), message);

            let resp = err.into_response();
            assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        // Nothing listens on port 1
        let proxy = serve(router(ProxyState::new("http://127.0.0.1:1").unwrap())).await;

        let (status, _, body) = get_json(format!("{proxy}/api/stats/geek")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": CONNECT_FAILED}));

        let (status, _, body) = get_json(format!("{proxy}/api/problems/geek")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": PROBLEMS_FAILED}));
    }
}
