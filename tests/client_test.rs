use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex},
};

use axum::{
    Json, Router,
    extract::Query,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use serde_json::{Value, json};
use songsim::{
    config::Config,
    error::{ApiError, AuthError, FetchError},
    management::TokenManager,
    spotify::{
        auth::establish_session,
        client::{SpotifyClient, build_http},
        recommendations, search,
    },
    types::{Fetched, RecommendationConstraints, Resolution, ResolvedTrack, Token},
};

type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn config_for(base: &str, cache: &Path) -> Config {
    let vars: HashMap<&str, String> = HashMap::from([
        ("SPOTIFY_API_AUTH_CLIENT_ID", "client".to_string()),
        ("SPOTIFY_API_URL", format!("{}/v1", base)),
        ("SPOTIFY_API_TOKEN_URL", format!("{}/api/token", base)),
        ("SONGSIM_TOKEN_CACHE", cache.display().to_string()),
        ("SONGSIM_HTTP_TIMEOUT_SECS", "5".to_string()),
    ]);
    Config::from_lookup(|name| vars.get(name).cloned()).unwrap()
}

fn fresh_token(access: &str) -> Token {
    Token {
        access_token: access.to_string(),
        refresh_token: "refresh".to_string(),
        scope: "user-read-private".to_string(),
        expires_in: 3600,
        obtained_at: Utc::now().timestamp() as u64,
    }
}

fn client_for(config: &Config, token: Token) -> SpotifyClient {
    let http = build_http(config.http_timeout).unwrap();
    let tokens = TokenManager::new(token, &config.token_cache);
    SpotifyClient::new(http, &config.api_url, config.oauth.clone(), tokens)
}

fn track_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "artists": [{"id": format!("{}_artist", id), "name": "Queen"}],
        "album": {"name": "A Night At The Opera"},
        "popularity": 80,
        "preview_url": null,
        "external_urls": {"spotify": format!("https://open.spotify.com/track/{}", id)}
    })
}

fn seed() -> ResolvedTrack {
    ResolvedTrack {
        track_id: "seed".to_string(),
        artist_id: "seed_artist".to_string(),
        name: "Bohemian Rhapsody".to_string(),
        artist_name: "Queen".to_string(),
    }
}

fn recording_route(seen: &Seen, auth: &Arc<Mutex<Vec<String>>>, body: Value) -> axum::routing::MethodRouter {
    let seen = Arc::clone(seen);
    let auth = Arc::clone(auth);
    get(move |headers: HeaderMap, Query(q): Query<HashMap<String, String>>| async move {
        seen.lock().unwrap().push(q);
        let header = headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default()
            .to_string();
        auth.lock().unwrap().push(header);
        Json(body)
    })
}

#[tokio::test]
async fn test_search_sends_query_and_bearer_token() {
    let seen: Seen = Default::default();
    let auth = Arc::new(Mutex::new(Vec::new()));
    let base = spawn(Router::new().route(
        "/v1/search",
        recording_route(
            &seen,
            &auth,
            json!({"tracks": {"items": [track_json("bohemian", "Bohemian Rhapsody")]}}),
        ),
    ))
    .await;

    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&base, &dir.path().join("token.json"));
    let mut client = client_for(&config, fresh_token("abc"));

    let resolution = search::resolve(&mut client, "Bohemian Rhapsody", "Queen")
        .await
        .unwrap();

    assert_eq!(
        resolution,
        Resolution::Found(ResolvedTrack {
            track_id: "bohemian".to_string(),
            artist_id: "bohemian_artist".to_string(),
            name: "Bohemian Rhapsody".to_string(),
            artist_name: "Queen".to_string(),
        })
    );

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0]["q"], "track:Bohemian Rhapsody artist:Queen");
    assert_eq!(seen[0]["type"], "track");
    assert_eq!(seen[0]["limit"], "1");
    assert_eq!(auth.lock().unwrap()[0], "Bearer abc");
}

#[tokio::test]
async fn test_search_without_items_is_not_found() {
    let seen: Seen = Default::default();
    let auth = Arc::new(Mutex::new(Vec::new()));
    let base = spawn(Router::new().route(
        "/v1/search",
        recording_route(&seen, &auth, json!({"tracks": {"items": []}})),
    ))
    .await;

    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&base, &dir.path().join("token.json"));
    let mut client = client_for(&config, fresh_token("abc"));

    let resolution = search::resolve(&mut client, "zzzznotasong", "nobody")
        .await
        .unwrap();
    assert_eq!(resolution, Resolution::NotFound);
}

#[tokio::test]
async fn test_recommendations_request_and_order() {
    let seen: Seen = Default::default();
    let auth = Arc::new(Mutex::new(Vec::new()));
    let base = spawn(Router::new().route(
        "/v1/recommendations",
        recording_route(
            &seen,
            &auth,
            json!({"tracks": [
                track_json("r1", "Killer Queen"),
                track_json("r2", "Somebody to Love"),
                track_json("r3", "We Are the Champions")
            ]}),
        ),
    ))
    .await;

    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&base, &dir.path().join("token.json"));
    let mut client = client_for(&config, fresh_token("abc"));

    let request = recommendations::build_request(&seed(), 3, &config.constraints);
    let fetched = recommendations::fetch(&mut client, &request).await.unwrap();

    let Fetched::Tracks(tracks) = fetched else {
        panic!("expected tracks");
    };
    let names: Vec<&str> = tracks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Killer Queen", "Somebody to Love", "We Are the Champions"]
    );
    assert!(tracks.iter().all(|t| t.preview_url == "Not available"));

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0]["seed_tracks"], "seed");
    assert_eq!(seen[0]["seed_artists"], "seed_artist");
    assert_eq!(seen[0]["limit"], "3");
    assert_eq!(seen[0]["market"], "US");
    assert_eq!(seen[0]["min_popularity"], "20");
    assert_eq!(seen[0]["max_popularity"], "100");
}

#[tokio::test]
async fn test_recommendations_without_constraints() {
    let seen: Seen = Default::default();
    let auth = Arc::new(Mutex::new(Vec::new()));
    let base = spawn(Router::new().route(
        "/v1/recommendations",
        recording_route(&seen, &auth, json!({"tracks": []})),
    ))
    .await;

    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&base, &dir.path().join("token.json"));
    let mut client = client_for(&config, fresh_token("abc"));

    let request =
        recommendations::build_request(&seed(), 5, &RecommendationConstraints::default());
    let fetched = recommendations::fetch(&mut client, &request).await.unwrap();

    assert_eq!(fetched, Fetched::Empty);
    let seen = seen.lock().unwrap();
    assert!(!seen[0].contains_key("market"));
    assert!(!seen[0].contains_key("min_popularity"));
    assert!(!seen[0].contains_key("max_popularity"));
}

#[test]
fn test_build_request_clamps_count() {
    let constraints = RecommendationConstraints::default();
    assert_eq!(recommendations::build_request(&seed(), 0, &constraints).limit, 1);
    assert_eq!(recommendations::build_request(&seed(), 25, &constraints).limit, 10);
    assert_eq!(recommendations::build_request(&seed(), 6, &constraints).limit, 6);
}

async fn fetch_with_status(status: StatusCode, body: Option<Value>) -> FetchError {
    let router = Router::new().route(
        "/v1/recommendations",
        get(move || async move {
            match body {
                Some(body) => (status, Json(body)).into_response(),
                None => (status, "<html>upstream error</html>").into_response(),
            }
        }),
    );
    let base = spawn(router).await;

    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&base, &dir.path().join("token.json"));
    let mut client = client_for(&config, fresh_token("abc"));

    let request = recommendations::build_request(&seed(), 3, &config.constraints);
    recommendations::fetch(&mut client, &request)
        .await
        .unwrap_err()
}

fn error_body(status: u16, message: &str) -> Option<Value> {
    Some(json!({"error": {"status": status, "message": message}}))
}

#[tokio::test]
async fn test_status_mapping() {
    assert_eq!(
        fetch_with_status(StatusCode::UNAUTHORIZED, error_body(401, "The access token expired")).await,
        FetchError::Api(ApiError::Unauthorized)
    );
    assert_eq!(
        fetch_with_status(StatusCode::FORBIDDEN, error_body(403, "Forbidden")).await,
        FetchError::Api(ApiError::Forbidden)
    );
    assert_eq!(
        fetch_with_status(StatusCode::NOT_FOUND, None).await,
        FetchError::Api(ApiError::NotFoundEndpoint)
    );
    assert_eq!(
        fetch_with_status(
            StatusCode::TOO_MANY_REQUESTS,
            Some(json!({"error": {"status": 429, "message": "API rate limit exceeded", "reason": "RATE_LIMITED"}}))
        )
        .await,
        FetchError::Api(ApiError::Generic {
            status: 429,
            code: Some("RATE_LIMITED".to_string()),
            message: "API rate limit exceeded".to_string(),
        })
    );
    assert_eq!(
        fetch_with_status(StatusCode::BAD_GATEWAY, None).await,
        FetchError::Api(ApiError::Generic {
            status: 502,
            code: None,
            message: "Bad Gateway".to_string(),
        })
    );
}

#[tokio::test]
async fn test_html_error_page_keeps_a_message() {
    let err = fetch_with_status(StatusCode::SERVICE_UNAVAILABLE, None).await;
    assert_eq!(
        err.to_string(),
        "Spotify API error: http status: 503, code:-1 - Service Unavailable"
    );
}

#[tokio::test]
async fn test_malformed_body_is_transport_error() {
    let err = fetch_with_status(StatusCode::OK, Some(json!({"unexpected": true}))).await;
    assert!(matches!(err, FetchError::Transport(_)));
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    // Grab a free port and close it again
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&base, &dir.path().join("token.json"));
    let mut client = client_for(&config, fresh_token("abc"));

    let err = search::resolve(&mut client, "Song", "Artist")
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
    assert!(err.to_string().starts_with("An error occurred: "));
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_persisted() {
    let seen: Seen = Default::default();
    let auth = Arc::new(Mutex::new(Vec::new()));
    let forms: Arc<Mutex<Vec<String>>> = Default::default();
    let router = Router::new()
        .route(
            "/v1/me",
            recording_route(&seen, &auth, json!({"id": "user", "display_name": "Freddie"})),
        )
        .route(
            "/api/token",
            post({
                let forms = Arc::clone(&forms);
                move |body: String| async move {
                    forms.lock().unwrap().push(body);
                    Json(json!({"access_token": "fresh", "scope": "user-read-private", "expires_in": 3600}))
                }
            }),
        );
    let base = spawn(router).await;

    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&base, &dir.path().join("token.json"));
    let mut expired = fresh_token("stale");
    expired.obtained_at = 0;
    let mut client = client_for(&config, expired);

    let user = client.current_user().await.unwrap();
    assert_eq!(user.display_name.as_deref(), Some("Freddie"));
    assert_eq!(auth.lock().unwrap()[0], "Bearer fresh");

    let form = forms.lock().unwrap()[0].clone();
    assert!(form.contains("grant_type=refresh_token"));
    assert!(form.contains("refresh_token=refresh"));
    assert!(form.contains("client_id=client"));

    // The refresh response had no refresh token, so the old one is kept
    let cached = TokenManager::load(&config.token_cache).await.unwrap();
    assert_eq!(cached.current_token().access_token, "fresh");
    assert_eq!(cached.current_token().refresh_token, "refresh");
}

#[tokio::test]
async fn test_establish_session_with_cached_token() {
    let seen: Seen = Default::default();
    let auth = Arc::new(Mutex::new(Vec::new()));
    let base = spawn(Router::new().route(
        "/v1/me",
        recording_route(&seen, &auth, json!({"id": "user", "display_name": "Freddie"})),
    ))
    .await;

    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&base, &dir.path().join("token.json"));
    TokenManager::new(fresh_token("cached"), &config.token_cache)
        .persist()
        .await
        .unwrap();

    let (_, user) = establish_session(&config, false).await.unwrap();
    assert_eq!(user.id, "user");
    assert_eq!(auth.lock().unwrap()[0], "Bearer cached");
}

#[tokio::test]
async fn test_establish_session_rejected_credentials() {
    let router = Router::new().route(
        "/v1/me",
        get(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": {"status": 401, "message": "Invalid access token"}})),
            )
        }),
    );
    let base = spawn(router).await;

    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&base, &dir.path().join("token.json"));
    TokenManager::new(fresh_token("revoked"), &config.token_cache)
        .persist()
        .await
        .unwrap();

    let err = match establish_session(&config, false).await {
        Ok(_) => panic!("session should be rejected"),
        Err(e) => e,
    };
    assert_eq!(
        err,
        AuthError::Verification(FetchError::Api(ApiError::Unauthorized))
    );
    assert!(err.to_string().starts_with("Spotify authentication error: "));
}
