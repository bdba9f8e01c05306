use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde_json::{json, Value};
use sobasa_lavalink::{LavalinkClient, LavalinkConfig, LavalinkError, UpdatePlayer, VoiceState};
use sobasa_types::{CommunityId, FilterChainState, Requester, Track, TrackInfo, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct Recorded {
    requests: Arc<Mutex<Vec<(String, String, Value)>>>,
}

async fn load_tracks(
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("secret") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"status": 401, "error": "Unauthorized", "message": "", "path": "/v4/loadtracks"})),
        );
    }
    let identifier = query.get("identifier").cloned().unwrap_or_default();
    if identifier == "missing.mp3" {
        return (
            StatusCode::OK,
            Json(json!({"loadType": "empty", "data": {}})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "loadType": "track",
            "data": {
                "encoded": format!("enc:{identifier}"),
                "info": {"identifier": identifier, "title": "Unknown title", "length": 4000},
                "pluginInfo": {},
                "userData": {}
            }
        })),
    )
}

async fn update_player(
    State(recorded): State<Recorded>,
    Path((session, guild)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if guild == "13" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"status": 400, "error": "Bad Request", "message": "Invalid track", "path": ""})),
        );
    }
    recorded
        .requests
        .lock()
        .unwrap()
        .push(("PATCH".to_string(), format!("{session}/{guild}"), body));
    (StatusCode::OK, Json(json!({})))
}

async fn destroy_player(
    State(recorded): State<Recorded>,
    Path((session, guild)): Path<(String, String)>,
) -> StatusCode {
    if guild == "404" {
        return StatusCode::NOT_FOUND;
    }
    recorded
        .requests
        .lock()
        .unwrap()
        .push(("DELETE".to_string(), format!("{session}/{guild}"), Value::Null));
    StatusCode::NO_CONTENT
}

async fn spawn_node() -> (LavalinkClient, Recorded) {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/v4/loadtracks", get(load_tracks))
        .route(
            "/v4/sessions/{session}/players/{guild}",
            patch(update_player).delete(destroy_player),
        )
        .with_state(recorded.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = LavalinkClient::new(LavalinkConfig {
        host: addr.ip().to_string(),
        port: addr.port(),
        password: "secret".to_string(),
        ..LavalinkConfig::default()
    })
    .unwrap();
    (client, recorded)
}

#[tokio::test]
async fn load_tracks_resolves_an_identifier() {
    let (client, _) = spawn_node().await;

    let tracks = client
        .load_tracks("fragments/4.mp3")
        .await
        .unwrap()
        .into_tracks()
        .unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].encoded, "enc:fragments/4.mp3");
    assert_eq!(tracks[0].info.length, 4000);

    let empty = client.load_tracks("missing.mp3").await.unwrap();
    assert!(empty.into_tracks().unwrap().is_empty());
}

#[tokio::test]
async fn wrong_password_is_reported() {
    let (client, _) = spawn_node().await;
    let client = LavalinkClient::new(LavalinkConfig {
        password: "wrong".to_string(),
        ..client.config().clone()
    })
    .unwrap();

    match client.load_tracks("x").await {
        Err(LavalinkError::Status { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Unauthorized");
        }
        other => panic!("expected a status error, got {other:?}"),
    }
}

#[tokio::test]
async fn player_updates_carry_track_requester_and_filters() {
    let (client, recorded) = spawn_node().await;
    client.set_session_id(Some("s1".to_string()));

    let track = Track {
        encoded: "QAAA".to_string(),
        info: TrackInfo::default(),
        requester: Some(Requester {
            id: UserId(42),
            username: "sobas".to_string(),
            avatar: None,
        }),
    };
    let mut filters = FilterChainState::default();
    filters.rotation = true;

    client
        .update_player(CommunityId(9), &UpdatePlayer::play(&track))
        .await
        .unwrap();
    client
        .update_player(
            CommunityId(9),
            &UpdatePlayer {
                filters: Some((&filters).into()),
                voice: Some(VoiceState {
                    token: "tok".to_string(),
                    endpoint: "eu.discord.media:443".to_string(),
                    session_id: "vs".to_string(),
                }),
                ..UpdatePlayer::default()
            },
        )
        .await
        .unwrap();

    let requests = recorded.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].1, "s1/9");
    assert_eq!(requests[0].2["track"]["encoded"], "QAAA");
    assert_eq!(requests[0].2["track"]["userData"]["requester"]["id"], "42");
    assert_eq!(requests[1].2["filters"]["rotation"]["rotationHz"], 0.2);
    assert_eq!(requests[1].2["voice"]["sessionId"], "vs");
}

#[tokio::test]
async fn rejected_update_surfaces_lavalink_message() {
    let (client, _) = spawn_node().await;
    client.set_session_id(Some("s1".to_string()));

    let err = client
        .update_player(CommunityId(13), &UpdatePlayer::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LavalinkError::Status { status: 400, ref message } if message == "Invalid track"
    ));
}

#[tokio::test]
async fn destroy_tolerates_a_missing_player() {
    let (client, recorded) = spawn_node().await;
    client.set_session_id(Some("s1".to_string()));

    client.destroy_player(CommunityId(404)).await.unwrap();
    client.destroy_player(CommunityId(5)).await.unwrap();

    let requests = recorded.requests.lock().unwrap().clone();
    assert_eq!(requests, vec![("DELETE".to_string(), "s1/5".to_string(), Value::Null)]);
}

#[tokio::test]
async fn player_calls_wait_for_a_session() {
    let (client, _) = spawn_node().await;
    assert!(matches!(
        client.destroy_player(CommunityId(1)).await,
        Err(LavalinkError::NotReady)
    ));
}
