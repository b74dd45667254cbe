use super::*;
use crate::leaderboard::LEADERBOARD_CAPACITY;
use crate::test_utils::{test_track, FakeUpstream};

fn service(upstream: FakeUpstream) -> MatchService<FakeUpstream> {
    MatchService::new(upstream, QueryCache::single_slot(), Leaderboard::new())
}

fn query(username: &str, limit: u32, color: Rgb) -> MatchQuery {
    MatchQuery {
        username: username.to_string(),
        period: "12month".to_string(),
        limit,
        color,
    }
}

#[tokio::test]
async fn test_playcount_breaks_distance_tie() {
    let track_a = test_track("Track A", "Band", 100);
    let track_b = test_track("Track B", "Band", 50);
    let upstream = FakeUpstream::new(Some(vec![track_b.clone(), track_a.clone()]))
        .with_color(&track_a, Rgb(250, 5, 5))
        .with_color(&track_b, Rgb(250, 5, 5))
        .with_links(
            "https://open.spotify.com/track/a",
            Some("https://p.scdn.co/mp3-preview/a"),
        );
    let service = service(upstream);

    let matched = service
        .fetch_and_match(&query("alice", 5, Rgb(255, 0, 0)))
        .await
        .unwrap();

    assert_eq!(matched.name, "Track A");
    assert_eq!(matched.artist, "Band");
    assert_eq!(matched.rgb, Rgb(250, 5, 5));
    assert_eq!(matched.image_url, track_a.artwork_url);
    assert_eq!(matched.lastfm_url, track_a.canonical_url);
    assert_eq!(matched.spotify_url, "https://open.spotify.com/track/a");
    assert_eq!(matched.preview_url, "https://p.scdn.co/mp3-preview/a");
    assert_eq!(matched.leaderboard.len(), 1);
    assert_eq!(matched.leaderboard[0].username, "alice");
}

#[tokio::test]
async fn test_failed_fetch() {
    let service = service(FakeUpstream::new(None));

    let result = service
        .fetch_and_match(&query("nobody", 10, Rgb(0, 0, 0)))
        .await;

    assert_eq!(result, Err(MatchError::TracksUnavailable));
    assert!(service.leaderboard().is_empty().await);
}

#[tokio::test]
async fn test_empty_track_list_is_a_failed_fetch() {
    let service = service(FakeUpstream::new(Some(Vec::new())));

    let result = service
        .fetch_and_match(&query("quiet", 10, Rgb(0, 0, 0)))
        .await;

    assert_eq!(result, Err(MatchError::TracksUnavailable));
}

#[tokio::test]
async fn test_no_artwork_colors() {
    let tracks = vec![test_track("A", "Band", 3), test_track("B", "Band", 2)];
    let service = service(FakeUpstream::new(Some(tracks)));

    let result = service
        .fetch_and_match(&query("alice", 10, Rgb(0, 0, 0)))
        .await;

    assert_eq!(result, Err(MatchError::NoArtworkColors));
    assert!(service.leaderboard().is_empty().await);
}

#[tokio::test]
async fn test_tracks_without_color_are_skipped() {
    let broken = test_track("Broken", "Band", 1000);
    let working = test_track("Working", "Band", 1);
    let upstream = FakeUpstream::new(Some(vec![broken, working.clone()]))
        .with_color(&working, Rgb(0, 0, 255));
    let service = service(upstream);

    let matched = service
        .fetch_and_match(&query("alice", 10, Rgb(255, 0, 0)))
        .await
        .unwrap();

    assert_eq!(matched.name, "Working");
}

#[tokio::test]
async fn test_missing_links_degrade() {
    let track = test_track("Solo", "Band", 1);
    let upstream = FakeUpstream::new(Some(vec![track.clone()])).with_color(&track, Rgb(9, 9, 9));
    let service = service(upstream);

    let matched = service
        .fetch_and_match(&query("alice", 10, Rgb(0, 0, 0)))
        .await
        .unwrap();

    assert_eq!(matched.spotify_url, SPOTIFY_URL_UNAVAILABLE);
    assert_eq!(matched.preview_url, "");
}

#[tokio::test]
async fn test_missing_preview_is_empty_string() {
    let track = test_track("Solo", "Band", 1);
    let upstream = FakeUpstream::new(Some(vec![track.clone()]))
        .with_color(&track, Rgb(9, 9, 9))
        .with_links("https://open.spotify.com/track/solo", None);
    let service = service(upstream);

    let matched = service
        .fetch_and_match(&query("alice", 10, Rgb(0, 0, 0)))
        .await
        .unwrap();

    assert_eq!(matched.spotify_url, "https://open.spotify.com/track/solo");
    assert_eq!(matched.preview_url, "");
}

#[tokio::test]
async fn test_repeated_query_uses_cache() {
    let track = test_track("Solo", "Band", 1);
    let upstream = FakeUpstream::new(Some(vec![track.clone()])).with_color(&track, Rgb(9, 9, 9));
    let service = service(upstream);

    service
        .fetch_and_match(&query("alice", 5, Rgb(0, 0, 0)))
        .await
        .unwrap();
    service
        .fetch_and_match(&query("alice", 5, Rgb(255, 255, 255)))
        .await
        .unwrap();
    assert_eq!(service.upstream().fetch_calls(), 1);

    service
        .fetch_and_match(&query("alice", 6, Rgb(0, 0, 0)))
        .await
        .unwrap();
    assert_eq!(service.upstream().fetch_calls(), 2);
}

#[tokio::test]
async fn test_failed_fetch_is_replayed_from_cache() {
    let service = service(FakeUpstream::new(None));

    for _ in 0..3 {
        let result = service
            .fetch_and_match(&query("nobody", 10, Rgb(0, 0, 0)))
            .await;
        assert_eq!(result, Err(MatchError::TracksUnavailable));
    }

    assert_eq!(service.upstream().fetch_calls(), 1);
}

#[tokio::test]
async fn test_leaderboard_snapshot_in_response() {
    let track = test_track("Solo", "Band", 1);
    let upstream = FakeUpstream::new(Some(vec![track.clone()])).with_color(&track, Rgb(9, 9, 9));
    let service = service(upstream);

    let mut last = None;
    for i in 0..12 {
        let username = format!("user{}", i);
        last = Some(
            service
                .fetch_and_match(&query(&username, 10, Rgb(0, 0, 0)))
                .await
                .unwrap(),
        );
    }

    let leaderboard = last.unwrap().leaderboard;
    assert_eq!(leaderboard.len(), LEADERBOARD_CAPACITY);
    assert_eq!(leaderboard[0].username, "user11");
    assert_eq!(leaderboard[9].username, "user2");
}

#[tokio::test]
async fn test_success_serializes_to_wire_shape() {
    let track = test_track("Solo", "Band", 1);
    let upstream = FakeUpstream::new(Some(vec![track.clone()])).with_color(&track, Rgb(1, 2, 3));
    let service = service(upstream);

    let matched = service
        .fetch_and_match(&query("alice", 10, Rgb(0, 0, 0)))
        .await
        .unwrap();
    let json = serde_json::to_value(&matched).unwrap();

    assert_eq!(json["rgb"], serde_json::json!([1, 2, 3]));
    assert_eq!(json["spotify_url"], "not available");
    assert_eq!(json["leaderboard"][0]["image_url"], track.artwork_url);
    assert_eq!(json["leaderboard"][0]["username"], "alice");
}

#[tokio::test]
async fn test_artwork_downloads_are_bounded() {
    let tracks: Vec<Track> = (0..40)
        .map(|i| test_track(&format!("Track {}", i), "Band", i))
        .collect();
    let upstream = tracks
        .iter()
        .fold(FakeUpstream::new(Some(tracks.clone())), |upstream, track| {
            upstream.with_color(track, Rgb(0, 0, 0))
        });
    let service = service(upstream);

    let matched = service
        .fetch_and_match(&query("alice", 40, Rgb(0, 0, 0)))
        .await
        .unwrap();

    // every candidate ties, so the most played one wins
    assert_eq!(matched.name, "Track 39");
    let peak = service.upstream().peak_downloads();
    assert!(peak >= 1 && peak <= MAX_CONCURRENT_DOWNLOADS, "peak was {}", peak);
}
