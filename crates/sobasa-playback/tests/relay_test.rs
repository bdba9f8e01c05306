mod common;

use common::{binding, bot, community, harness, user, voice_room, Call, Harness};
use sobasa_playback::{BackendEvent, ContentSource, GatewayEvent, TrackEndReason};
use sobasa_types::{ChannelId, CommunityId, OutboundMessage, Track, TrackInfo};
use std::sync::atomic::Ordering;
use std::time::Duration;

async fn anthem(h: &Harness) -> sobasa_types::Track {
    h.orchestrator
        .open_session(binding(1, 10, 500), ContentSource::Anthem, &user(42))
        .await
        .unwrap()
        .current
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn track_start_posts_now_playing_to_the_text_channel() {
    let h = harness(vec![]);
    let mut track = anthem(&h).await;
    // The backend echoes the track without our metadata overrides.
    track.info.title = "bezzebna-stara-sobasa.mp3".to_string();
    track.info.artwork_url = None;

    h.orchestrator
        .handle_backend_event(BackendEvent::TrackStart {
            community: CommunityId(1),
            track,
        })
        .await;

    let sent = h.gateway.sent();
    assert_eq!(sent.len(), 1);
    let (channel, OutboundMessage::Embed { embed }) = &sent[0] else {
        panic!("expected an embed");
    };
    assert_eq!(*channel, ChannelId(500));
    assert_eq!(embed.title, "Now Playing");
    assert_eq!(embed.description, "Various Artists **-** Bezzębna Stara Sobasa");
    assert_eq!(embed.author.as_ref().unwrap().name, "Requested by user42");
}

#[tokio::test(start_paused = true)]
async fn start_event_ahead_of_the_play_response_is_still_announced() {
    let h = harness(vec![]);
    h.backend.play_delay_ms.store(50, Ordering::SeqCst);
    let orchestrator = h.orchestrator.clone();
    let open = tokio::spawn(async move {
        orchestrator
            .open_session(binding(1, 10, 500), ContentSource::Anthem, &user(42))
            .await
    });

    // Connect settles for 500 ms, then play hangs for another 50.
    tokio::time::sleep(Duration::from_millis(520)).await;
    let encoded = h
        .backend
        .calls()
        .into_iter()
        .find_map(|call| match call {
            Call::Play(_, encoded, _) => Some(encoded),
            _ => None,
        })
        .expect("play in flight");
    assert!(!open.is_finished());

    h.orchestrator
        .handle_backend_event(BackendEvent::TrackStart {
            community: CommunityId(1),
            track: Track {
                encoded,
                info: TrackInfo {
                    title: "bezzebna-stara-sobasa.mp3".to_string(),
                    ..TrackInfo::default()
                },
                requester: None,
            },
        })
        .await;
    open.await.unwrap().unwrap();

    let sent = h.gateway.sent();
    assert_eq!(sent.len(), 1);
    let (_, OutboundMessage::Embed { embed }) = &sent[0] else {
        panic!("expected an embed");
    };
    assert_eq!(embed.description, "Various Artists **-** Bezzębna Stara Sobasa");
    assert_eq!(embed.author.as_ref().unwrap().name, "Requested by user42");
}

#[tokio::test(start_paused = true)]
async fn track_without_artwork_is_not_announced() {
    let h = harness(vec![]);
    let track = h
        .orchestrator
        .open_session(binding(1, 10, 10), ContentSource::Ambient, &bot())
        .await
        .unwrap()
        .current
        .unwrap();

    h.orchestrator
        .handle_backend_event(BackendEvent::TrackStart {
            community: CommunityId(1),
            track,
        })
        .await;
    assert!(h.gateway.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn finished_queue_destroys_the_session() {
    let h = harness(vec![]);
    let track = anthem(&h).await;

    h.orchestrator
        .handle_backend_event(BackendEvent::TrackEnd {
            community: CommunityId(1),
            track,
            reason: TrackEndReason::Finished,
        })
        .await;
    assert_eq!(h.orchestrator.session_count(), 1);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.orchestrator.session_count(), 0);
    assert!(h
        .backend
        .calls()
        .contains(&Call::Destroy(CommunityId(1), "Queue has ended".to_string())));
}

#[tokio::test(start_paused = true)]
async fn replaced_track_does_not_end_the_session() {
    let h = harness(vec![]);
    let track = anthem(&h).await;

    h.orchestrator
        .handle_backend_event(BackendEvent::TrackEnd {
            community: CommunityId(1),
            track,
            reason: TrackEndReason::Replaced,
        })
        .await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(h.orchestrator.session(CommunityId(1)).unwrap().playing);
}

#[tokio::test(start_paused = true)]
async fn idle_destroy_spares_a_replacement_session() {
    let h = harness(vec![]);
    let track = anthem(&h).await;
    h.orchestrator
        .handle_backend_event(BackendEvent::TrackEnd {
            community: CommunityId(1),
            track,
            reason: TrackEndReason::Finished,
        })
        .await;
    let replacement = h
        .orchestrator
        .open_session(binding(1, 11, 11), ContentSource::Ambient, &bot())
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.orchestrator.session(CommunityId(1)).unwrap().id, replacement.id);
}

#[tokio::test(start_paused = true)]
async fn empty_room_clears_suppression_and_destroys_the_session() {
    let h = harness(vec![community(1, None, vec![voice_room(10, &[], &[])])]);
    anthem(&h).await;
    h.orchestrator.toggle_suppression(CommunityId(1), ChannelId(10));

    h.orchestrator
        .handle_gateway_event(GatewayEvent::OccupancyChanged {
            community: CommunityId(1),
            room: ChannelId(10),
            humans: 0,
        })
        .await;

    assert!(!h.orchestrator.is_suppressed(CommunityId(1), ChannelId(10)));
    assert_eq!(h.orchestrator.session_count(), 0);
    assert!(h.backend.calls().contains(&Call::Destroy(
        CommunityId(1),
        "Everyone left the voice channel".to_string()
    )));
}

#[tokio::test(start_paused = true)]
async fn emptying_another_room_keeps_the_session() {
    let h = harness(vec![]);
    anthem(&h).await;

    for humans in [0, 3] {
        h.orchestrator
            .handle_gateway_event(GatewayEvent::OccupancyChanged {
                community: CommunityId(1),
                room: ChannelId(11),
                humans,
            })
            .await;
    }
    assert_eq!(h.orchestrator.session_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn deleted_voice_room_ends_the_session() {
    let h = harness(vec![]);
    anthem(&h).await;

    h.orchestrator
        .handle_gateway_event(GatewayEvent::RoomDeleted {
            community: CommunityId(1),
            room: ChannelId(10),
        })
        .await;
    assert_eq!(h.orchestrator.session_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn deleted_text_channel_rebinds_to_the_voice_room() {
    let h = harness(vec![]);
    anthem(&h).await;

    h.orchestrator
        .handle_gateway_event(GatewayEvent::RoomDeleted {
            community: CommunityId(1),
            room: ChannelId(500),
        })
        .await;
    let session = h.orchestrator.session(CommunityId(1)).unwrap();
    assert_eq!(session.text_channel, ChannelId(10));
}

#[tokio::test(start_paused = true)]
async fn deleted_community_forgets_everything() {
    let h = harness(vec![]);
    anthem(&h).await;
    h.orchestrator.toggle_suppression(CommunityId(1), ChannelId(12));

    h.orchestrator
        .handle_gateway_event(GatewayEvent::CommunityDeleted {
            community: CommunityId(1),
        })
        .await;
    assert_eq!(h.orchestrator.session_count(), 0);
    assert!(!h.orchestrator.is_suppressed(CommunityId(1), ChannelId(12)));
}

#[tokio::test(start_paused = true)]
async fn disconnecting_the_bot_ends_the_session() {
    let h = harness(vec![]);
    anthem(&h).await;

    h.orchestrator
        .handle_gateway_event(GatewayEvent::BotVoiceChanged {
            community: CommunityId(1),
            room: None,
        })
        .await;
    assert_eq!(h.orchestrator.session_count(), 0);
    assert!(h.backend.calls().contains(&Call::Destroy(
        CommunityId(1),
        "Disconnected from the voice channel".to_string()
    )));
}

#[tokio::test(start_paused = true)]
async fn moving_the_bot_rebinds_the_session() {
    let h = harness(vec![]);
    let before = h
        .orchestrator
        .open_session(binding(1, 10, 500), ContentSource::Anthem, &user(42))
        .await
        .unwrap();

    h.orchestrator
        .handle_gateway_event(GatewayEvent::BotVoiceChanged {
            community: CommunityId(1),
            room: Some(ChannelId(12)),
        })
        .await;

    let after = h.orchestrator.session(CommunityId(1)).unwrap();
    assert_eq!(after.id, before.id);
    assert_eq!(after.voice_room, ChannelId(12));
    assert_eq!(after.text_channel, ChannelId(500));
}

#[tokio::test(start_paused = true)]
async fn stale_leave_does_not_touch_a_joining_session() {
    let h = harness(vec![]);
    h.backend.hang_connect.store(true, Ordering::SeqCst);
    let orchestrator = h.orchestrator.clone();
    tokio::spawn(async move {
        let _ = orchestrator
            .open_session(binding(1, 10, 500), ContentSource::Anthem, &user(42))
            .await;
    });
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert!(h.orchestrator.session(CommunityId(1)).is_some());

    let orchestrator = h.orchestrator.clone();
    let leave = tokio::spawn(async move {
        orchestrator
            .handle_gateway_event(GatewayEvent::BotVoiceChanged {
                community: CommunityId(1),
                room: None,
            })
            .await
    });
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert!(leave.is_finished());
    assert!(h.orchestrator.session(CommunityId(1)).is_some());
    assert!(!h
        .backend
        .calls()
        .iter()
        .any(|c| matches!(c, Call::Destroy(..))));
}
