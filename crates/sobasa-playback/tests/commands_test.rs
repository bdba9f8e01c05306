mod common;

use common::{binding, community, harness, message, user, voice_room, Call, Harness};
use sobasa_playback::{ContentSource, GatewayEvent};
use sobasa_types::{ChannelId, CommunityId, OutboundMessage};
use std::sync::atomic::Ordering;

/// A harness with a playing session in community 1, room 10.
async fn playing() -> Harness {
    let h = harness(vec![community(1, None, vec![voice_room(10, &[42], &[])])]);
    h.orchestrator
        .open_session(binding(1, 10, 500), ContentSource::Anthem, &user(42))
        .await
        .unwrap();
    h
}

async fn send(h: &Harness, voice_room: Option<u64>, content: &str) -> Option<String> {
    h.orchestrator
        .handle_message(message(1, voice_room, content))
        .await;
    h.gateway.last_text()
}

#[tokio::test(start_paused = true)]
async fn preconditions_are_checked_in_order() {
    let h = harness(vec![]);
    assert_eq!(
        send(&h, None, "!jebnij_reset").await.unwrap(),
        "You must be in a voice channel."
    );
    assert_eq!(
        send(&h, Some(10), "!jebnij_reset").await.unwrap(),
        "Bot is not connected."
    );

    let h = playing().await;
    assert_eq!(
        send(&h, Some(11), "!jebnij_reset").await.unwrap(),
        "You must be in the same voice channel as the bot."
    );
}

#[tokio::test(start_paused = true)]
async fn commands_without_a_track_are_rejected() {
    let h = harness(vec![]);
    h.backend.fail_play.store(true, Ordering::SeqCst);
    let _ = h
        .orchestrator
        .open_session(binding(1, 10, 500), ContentSource::Ambient, &user(42))
        .await;

    assert_eq!(send(&h, Some(10), "!jebnij_reset").await.unwrap(), "No song playing.");
    assert!(!h
        .backend
        .calls()
        .iter()
        .any(|c| matches!(c, Call::Filters(..))));
}

#[tokio::test(start_paused = true)]
async fn volume_boundaries() {
    let h = playing().await;

    assert_eq!(
        send(&h, Some(10), "!daj_glos 0").await.unwrap(),
        "Invalid command. Try `!daj_glos <procent>`"
    );
    assert_eq!(
        send(&h, Some(10), "!daj_glos 1001").await.unwrap(),
        "Invalid command. Try `!daj_glos <procent>`"
    );
    assert_eq!(send(&h, Some(10), "!daj_glos 1000").await.unwrap(), "Changed the volume.");
    assert_eq!(send(&h, Some(10), "!daj_glos 1").await.unwrap(), "Changed the volume.");

    let volumes: Vec<u16> = h
        .backend
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Volume(_, v) => Some(v),
            _ => None,
        })
        .collect();
    assert_eq!(volumes, vec![1000, 1]);
    assert_eq!(h.orchestrator.session(CommunityId(1)).unwrap().volume, 1);
}

#[tokio::test(start_paused = true)]
async fn argument_errors_win_over_missing_session() {
    let h = harness(vec![]);
    assert_eq!(
        send(&h, None, "!daj_glos abc").await.unwrap(),
        "Invalid command. Try `!daj_glos <procent>`"
    );
}

#[tokio::test(start_paused = true)]
async fn seek_within_and_beyond_the_track() {
    let h = playing().await;

    assert_eq!(send(&h, Some(10), "!tepnij 1:30").await.unwrap(), "Seeked the current song.");
    assert_eq!(
        send(&h, Some(10), "!tepnij 5:00").await.unwrap(),
        "The position can't be bigger than the song's duration."
    );
    assert_eq!(
        send(&h, Some(10), "!tepnij 1:xx").await.unwrap(),
        "Invalid seconds number. Try `!tepnij <Hours:Minutes:Seconds>`"
    );

    let seeks: Vec<u64> = h
        .backend
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Seek(_, ms) => Some(ms),
            _ => None,
        })
        .collect();
    assert_eq!(seeks, vec![90_000]);
}

#[tokio::test(start_paused = true)]
async fn filter_changes_are_recorded_after_backend_success() {
    let h = playing().await;

    assert_eq!(
        send(&h, Some(10), "!jebnij_nightcore").await.unwrap(),
        "Applied nightcore effect."
    );
    let filters = h.orchestrator.session(CommunityId(1)).unwrap().filters;
    assert!(filters.nightcore);

    h.backend.fail_filters.store(true, Ordering::SeqCst);
    let reply = send(&h, Some(10), "!jebnij_vaporwave").await.unwrap();
    assert!(reply.starts_with("Something went wrong"));
    assert_eq!(h.orchestrator.session(CommunityId(1)).unwrap().filters, filters);
}

#[tokio::test(start_paused = true)]
async fn concurrent_toggles_both_survive() {
    let h = playing().await;
    h.backend.filters_delay_ms.store(50, Ordering::SeqCst);

    let a = h.orchestrator.clone();
    let b = h.orchestrator.clone();
    tokio::join!(
        async move { a.handle_message(message(1, Some(10), "!jebnij_rotation")).await },
        async move { b.handle_message(message(1, Some(10), "!jebnij_karaoke")).await },
    );

    let filters = h.orchestrator.session(CommunityId(1)).unwrap().filters;
    assert!(filters.rotation);
    assert!(filters.karaoke);

    let sent: Vec<_> = h
        .backend
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Filters(_, filters) => Some(filters),
            _ => None,
        })
        .collect();
    assert_eq!(sent.len(), 2);
    assert!(sent[1].rotation && sent[1].karaoke);
}

#[tokio::test(start_paused = true)]
async fn unknown_effect_lists_the_catalogue() {
    let h = playing().await;
    let reply = send(&h, Some(10), "!jebnij_efektem polka").await.unwrap();
    assert!(reply.starts_with("Invalid command. Try `!jebnij_efektem <efekt>`"));
    assert!(reply.contains("\nclear\n"));
}

#[tokio::test(start_paused = true)]
async fn suppress_toggles_twice() {
    let h = harness(vec![]);
    assert_eq!(
        send(&h, Some(10), "!do_spania").await.unwrap(),
        "Temporarily disabled auto joining for your channel."
    );
    assert!(h.orchestrator.is_suppressed(CommunityId(1), ChannelId(10)));
    assert_eq!(
        send(&h, Some(10), "!spac").await.unwrap(),
        "Re-enabled auto joining for your channel."
    );
    assert!(!h.orchestrator.is_suppressed(CommunityId(1), ChannelId(10)));
}

#[tokio::test(start_paused = true)]
async fn join_opens_a_session_in_the_authors_room() {
    let h = harness(vec![]);
    h.orchestrator
        .handle_message(message(1, Some(10), "!chodz"))
        .await;

    let session = h.orchestrator.session(CommunityId(1)).unwrap();
    assert_eq!(session.voice_room, ChannelId(10));
    assert_eq!(session.text_channel, ChannelId(500));
    assert!(h.gateway.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn leave_destroys_the_session() {
    let h = playing().await;
    assert_eq!(send(&h, Some(10), "!wyjdz").await.unwrap(), "Stopped the playback.");
    assert_eq!(h.orchestrator.session_count(), 0);
    assert!(h
        .backend
        .calls()
        .contains(&Call::Destroy(CommunityId(1), "user42 stopped the playback.".to_string())));
}

#[tokio::test(start_paused = true)]
async fn bots_and_plain_chatter_are_ignored() {
    let h = playing().await;
    let mut from_bot = message(1, Some(10), "!wyjdz");
    from_bot.author_is_bot = true;
    h.orchestrator
        .handle_gateway_event(GatewayEvent::Message(from_bot))
        .await;
    h.orchestrator
        .handle_message(message(1, Some(10), "hello there"))
        .await;
    h.orchestrator
        .handle_message(message(1, Some(10), "!unknown_word"))
        .await;

    assert!(h.gateway.sent().is_empty());
    assert_eq!(h.orchestrator.session_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn help_lists_every_command_word() {
    let h = harness(vec![]);
    let reply = send(&h, None, "!co_umiesz?").await.unwrap();
    for word in ["!chodz", "!tepnij", "!daj_glos", "!jebnij_reset", "!wyjdz"] {
        assert!(reply.contains(word), "{word} missing from help");
    }
    let lyrics = send(&h, None, "!tekst").await.unwrap();
    assert!(!lyrics.is_empty());
    assert!(h.gateway.sent().iter().all(|(channel, m)| {
        *channel == ChannelId(500) && matches!(m, OutboundMessage::Text { .. })
    }));
}
