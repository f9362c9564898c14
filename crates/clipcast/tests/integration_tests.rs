mod mocks;

use std::path::Path;

use chrono::{Duration, TimeZone, Utc};
use clipcast::{
    growth::ChannelGrowth,
    social::{InstagramClient, Platform, SocialMediaManager},
    yt::client::YouTubeClient,
    AudioInput, ContentPipeline, ContentPipelineBuilder, RepurposeOptions, ScrapeOptions,
    VideoMetadata,
};
use clipcast_store::PostStatus;
use mocks::{
    datastore::MockDataStore, downloader::MockDownloader, generator::MockGenerator,
    page_fetcher::MockPageFetcher, publisher::MockPublisher, transcriber::MockTranscriber,
    video_processor::MockVideoProcessor,
};

const VIDEO_ID: &str = "dQw4w9WgXcQ";
const VIDEO_URL: &str = "https://youtu.be/dQw4w9WgXcQ";
const VIDEO_TITLE: &str = "Building a Garden Shed in One Weekend";
const CHANNEL_ID: &str = "UCbuilds0000000000000001";

type TestPipeline = ContentPipeline<
    MockDataStore,
    MockPageFetcher,
    MockDownloader,
    MockTranscriber,
    MockGenerator,
    MockVideoProcessor,
>;

#[allow(clippy::too_many_arguments)]
fn build_pipeline(
    dir: &Path,
    store: MockDataStore,
    fetcher: MockPageFetcher,
    downloader: MockDownloader,
    transcriber: MockTranscriber,
    generator: Option<MockGenerator>,
    video: MockVideoProcessor,
    max_videos: usize,
) -> TestPipeline {
    ContentPipelineBuilder::new(dir.join("downloads"), dir.join("output"))
        .store(store)
        .fetcher(fetcher)
        .downloader(downloader)
        .transcriber(Some(transcriber))
        .generator(generator)
        .video_processor(video)
        .max_videos(max_videos)
        .chunk_duration_seconds(900)
        .build()
}

fn default_pipeline(dir: &Path, store: MockDataStore) -> TestPipeline {
    build_pipeline(
        dir,
        store,
        MockPageFetcher::default(),
        MockDownloader::default(),
        MockTranscriber::new(&[(0.0, 5.0, "unused")]),
        None,
        MockVideoProcessor::default(),
        5,
    )
}

// ─── Scraping ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_scrape_fetches_info_media_and_captions() {
    let dir = tempfile::tempdir().unwrap();
    let store = MockDataStore::default();
    let downloader = MockDownloader::default();
    let transcriber = MockTranscriber::new(&[(0.0, 5.0, "unused")]);

    let inserted = store.inserted.clone();
    let download_calls = downloader.calls.clone();
    let transcriber_calls = transcriber.calls.clone();

    let pipeline = build_pipeline(
        dir.path(),
        store,
        MockPageFetcher::default(),
        downloader,
        transcriber,
        None,
        MockVideoProcessor::default(),
        5,
    );

    let result = pipeline.scrape(VIDEO_URL, ScrapeOptions::default()).await;
    assert!(result.is_ok(), "Scrape should succeed: {:?}", result.err());
    let report = result.unwrap();

    assert_eq!(report.info.id, VIDEO_ID);
    assert_eq!(report.info.title, VIDEO_TITLE);
    assert_eq!(report.info.channel_title.as_deref(), Some("Weekend Builds"));
    assert_eq!(report.info.channel_id.as_deref(), Some(CHANNEL_ID));
    assert!(report.errors.is_empty(), "No errors expected: {:?}", report.errors);

    assert_eq!(report.transcript_entries, 3, "Fixture captions have 3 lines");
    assert!(!report.transcribed, "Captions should be used as-is");
    assert!(
        transcriber_calls.lock().unwrap().is_empty(),
        "Transcriber should not run when captions exist"
    );

    let download_dir = dir.path().join("downloads").join(VIDEO_ID);
    assert_eq!(report.video_path, Some(download_dir.join(format!("{VIDEO_ID}.mp4"))));
    assert_eq!(report.audio_path, Some(download_dir.join(format!("{VIDEO_ID}.mp3"))));
    assert_eq!(download_calls.lock().unwrap().len(), 2);

    let transcript_path = report.transcript_path.expect("Transcript should be saved");
    let transcript = std::fs::read_to_string(transcript_path).unwrap();
    assert!(transcript.starts_with("[00:00] Welcome back to the workshop."));

    let metadata: VideoMetadata =
        serde_json::from_slice(&std::fs::read(&report.metadata_path).unwrap()).unwrap();
    assert_eq!(metadata.video_info.id, VIDEO_ID);
    assert!(metadata.has_transcript);
    assert_eq!(
        report.metadata_path,
        dir.path()
            .join("output/metadata")
            .join(format!("{VIDEO_ID}_metadata.json"))
    );

    let inserted = inserted.lock().unwrap();
    assert_eq!(inserted.len(), 1, "Should store exactly one video record");
    assert_eq!(inserted[0].video_id, VIDEO_ID);
    assert!(inserted[0].has_transcript);
    assert!(inserted[0].video_path.is_some());
}

#[tokio::test]
async fn test_scrape_transcribes_audio_when_captions_missing() {
    let dir = tempfile::tempdir().unwrap();
    let transcriber = MockTranscriber::new(&[
        (0.0, 6.0, "Hello and welcome."),
        (6.0, 14.0, "Today we build a shed."),
    ]);
    let transcriber_calls = transcriber.calls.clone();

    let pipeline = build_pipeline(
        dir.path(),
        MockDataStore::default(),
        MockPageFetcher::without_captions(),
        MockDownloader::default(),
        transcriber,
        None,
        MockVideoProcessor::default(),
        5,
    );

    let report = pipeline
        .scrape(VIDEO_URL, ScrapeOptions::default())
        .await
        .expect("Scrape should succeed");

    assert!(report.transcribed, "Transcript should come from speech-to-text");
    assert_eq!(report.transcript_entries, 2);
    assert!(report.transcript_path.is_some());

    let calls = transcriber_calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        AudioInput::Chunked {
            chunk_duration_seconds,
            chunks_dir_path,
            file_path,
        } => {
            assert_eq!(*chunk_duration_seconds, 900, "Chunk duration should be 900s");
            assert_eq!(
                chunks_dir_path,
                &dir.path().join("downloads").join(VIDEO_ID).join("chunks")
            );
            assert_eq!(Some(file_path), report.audio_path.as_ref());
        }
        AudioInput::File(_) => panic!("Expected chunked audio input"),
    }
}

#[tokio::test]
async fn test_scrape_skips_media_that_was_not_requested() {
    let dir = tempfile::tempdir().unwrap();
    let downloader = MockDownloader::default();
    let download_calls = downloader.calls.clone();

    let pipeline = build_pipeline(
        dir.path(),
        MockDataStore::default(),
        MockPageFetcher::default(),
        downloader,
        MockTranscriber::new(&[]),
        None,
        MockVideoProcessor::default(),
        5,
    );

    let options = ScrapeOptions {
        video: false,
        audio: false,
        transcript: false,
    };
    let report = pipeline.scrape(VIDEO_URL, options).await.unwrap();

    assert!(report.video_path.is_none());
    assert!(report.audio_path.is_none());
    assert!(report.transcript_path.is_none());
    assert!(download_calls.lock().unwrap().is_empty(), "Nothing should be downloaded");
}

// ─── Non-fatal scrape failures ───────────────────────────────────────────────

#[tokio::test]
async fn test_download_failure_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let store = MockDataStore::default();
    let inserted = store.inserted.clone();

    let pipeline = build_pipeline(
        dir.path(),
        store,
        MockPageFetcher::default(),
        MockDownloader::failing("HTTP Error 403: Forbidden"),
        MockTranscriber::new(&[]),
        None,
        MockVideoProcessor::default(),
        5,
    );

    let report = pipeline
        .scrape(VIDEO_URL, ScrapeOptions::default())
        .await
        .expect("Download failures should not fail the scrape");

    assert!(report.video_path.is_none());
    assert!(report.audio_path.is_none());
    assert_eq!(report.errors.len(), 2, "Both downloads should be reported");
    assert!(report.errors.iter().all(|e| e.contains("403")));
    assert_eq!(report.transcript_entries, 3, "Captions do not need the download");

    let inserted = inserted.lock().unwrap();
    assert_eq!(inserted.len(), 1, "Record should still be stored");
    assert!(inserted[0].video_path.is_none());
}

#[tokio::test]
async fn test_transcription_failure_is_recorded() {
    let dir = tempfile::tempdir().unwrap();

    let pipeline = build_pipeline(
        dir.path(),
        MockDataStore::default(),
        MockPageFetcher::without_captions(),
        MockDownloader::default(),
        MockTranscriber::failing("Whisper API timeout"),
        None,
        MockVideoProcessor::default(),
        5,
    );

    let report = pipeline
        .scrape(VIDEO_URL, ScrapeOptions::default())
        .await
        .expect("Transcription failures should not fail the scrape");

    assert!(report.transcript_path.is_none());
    assert!(!report.transcribed);
    assert!(
        report.errors.iter().any(|e| e.contains("Whisper API timeout")),
        "Errors should mention the transcriber, got: {:?}",
        report.errors
    );
}

// ─── Error propagation ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_page_fetch_failure_propagates_error() {
    let dir = tempfile::tempdir().unwrap();
    let downloader = MockDownloader::default();
    let download_calls = downloader.calls.clone();

    let pipeline = build_pipeline(
        dir.path(),
        MockDataStore::default(),
        MockPageFetcher::failing("Scraper network error"),
        downloader,
        MockTranscriber::new(&[]),
        None,
        MockVideoProcessor::default(),
        5,
    );

    let result = pipeline.scrape(VIDEO_URL, ScrapeOptions::default()).await;
    assert!(result.is_err(), "Should propagate page fetch error");

    let err_msg = format!("{:?}", result.unwrap_err());
    assert!(
        err_msg.contains("Scraper network error"),
        "Error should contain fetcher message, got: {}",
        err_msg
    );
    assert!(download_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_url_is_rejected_before_fetching() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = MockPageFetcher::default();
    let fetch_calls = fetcher.calls.clone();

    let pipeline = build_pipeline(
        dir.path(),
        MockDataStore::default(),
        fetcher,
        MockDownloader::default(),
        MockTranscriber::new(&[]),
        None,
        MockVideoProcessor::default(),
        5,
    );

    let result = pipeline
        .scrape("https://example.com/not-a-video", ScrapeOptions::default())
        .await;
    assert!(result.is_err(), "Should reject a URL without a video id");
    assert!(fetch_calls.lock().unwrap().is_empty(), "Nothing should be fetched");
}

#[tokio::test]
async fn test_store_failure_propagates_error() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = default_pipeline(dir.path(), MockDataStore::failing("Connection refused"));

    let result = pipeline.scrape(VIDEO_URL, ScrapeOptions::default()).await;
    assert!(result.is_err(), "Should propagate store error");
    assert!(format!("{:?}", result.unwrap_err()).contains("Connection refused"));
}

// ─── Repurposing ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_repurpose_builds_every_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let video = MockVideoProcessor::default();
    let clips = video.clips.clone();
    let frames = video.frames.clone();

    let pipeline = build_pipeline(
        dir.path(),
        MockDataStore::default(),
        MockPageFetcher::default(),
        MockDownloader::default(),
        MockTranscriber::new(&[]),
        None,
        video,
        5,
    );

    pipeline
        .scrape(VIDEO_URL, ScrapeOptions::default())
        .await
        .expect("Scrape should succeed");
    let report = pipeline
        .repurpose(VIDEO_ID, RepurposeOptions::default())
        .await
        .expect("Repurpose should succeed");

    assert!(report.errors.is_empty(), "No errors expected: {:?}", report.errors);
    let output = dir.path().join("output");

    let blog = report.blog.expect("Blog should be written");
    assert_eq!(blog, output.join(format!("blogs/{VIDEO_ID}/{VIDEO_ID}_blog.md")));
    let blog = std::fs::read_to_string(blog).unwrap();
    assert!(blog.starts_with(&format!("# {VIDEO_TITLE}")));

    assert_eq!(report.posts.len(), 6, "Template posts for both platforms");
    assert!(report.posts.contains_key("instagram_1"));
    assert!(report.posts.contains_key("facebook_3"));
    assert!(report.posts.values().all(|p| p.exists()));

    // three caption lines, one clip per platform each
    assert_eq!(report.shorts.len(), 6);
    assert!(report.shorts.values().all(|p| p.exists()));
    let clips = clips.lock().unwrap();
    for (path, style) in clips.iter() {
        let name = path.file_name().unwrap().to_string_lossy();
        if name.contains("instagram") {
            assert_eq!(style.frame, Some((1080, 1920)), "Landscape input gets a story frame");
        } else {
            assert_eq!(style.frame, None);
        }
        assert_eq!(style.footer.as_deref(), Some("Source: Weekend Builds"));
    }

    let thumbnail = report.thumbnail.expect("Thumbnail should be written");
    assert_eq!(
        thumbnail,
        output.join(format!("thumbnails/{VIDEO_ID}/{VIDEO_ID}_thumbnail.jpg"))
    );
    assert_eq!(frames.lock().unwrap()[0].0, 360.0, "Frame is taken at the midpoint");
}

#[tokio::test]
async fn test_repurpose_uses_generator_output() {
    let dir = tempfile::tempdir().unwrap();
    let generator = MockGenerator::new(
        "Here you go:\n```json\n{\"instagram_1\": \"Shed day! #diy\", \"facebook_1\": \"We built a shed.\"}\n```",
    );
    let generator_calls = generator.calls.clone();

    let pipeline = build_pipeline(
        dir.path(),
        MockDataStore::default(),
        MockPageFetcher::default(),
        MockDownloader::default(),
        MockTranscriber::new(&[]),
        Some(generator),
        MockVideoProcessor::default(),
        5,
    );

    pipeline
        .scrape(VIDEO_URL, ScrapeOptions::default())
        .await
        .unwrap();
    let options = RepurposeOptions {
        shorts: false,
        thumbnail: false,
        ..Default::default()
    };
    let report = pipeline.repurpose(VIDEO_ID, options).await.unwrap();

    assert_eq!(
        report.posts.keys().collect::<Vec<_>>(),
        vec!["facebook_1", "instagram_1"]
    );
    assert_eq!(
        std::fs::read_to_string(&report.posts["instagram_1"]).unwrap(),
        "Shed day! #diy"
    );
    assert!(report.shorts.is_empty());
    assert!(report.thumbnail.is_none());

    let calls = generator_calls.lock().unwrap();
    assert_eq!(calls.len(), 2, "One request for the blog, one for the posts");
    assert!(calls[0].user.contains(VIDEO_TITLE));
    assert!(calls[0].user.contains("framing the walls"), "Blog prompt carries the transcript");
}

#[tokio::test]
async fn test_repurpose_falls_back_when_generator_fails() {
    let dir = tempfile::tempdir().unwrap();

    let pipeline = build_pipeline(
        dir.path(),
        MockDataStore::default(),
        MockPageFetcher::default(),
        MockDownloader::default(),
        MockTranscriber::new(&[]),
        Some(MockGenerator::failing("GPT rate limit")),
        MockVideoProcessor::default(),
        5,
    );

    pipeline
        .scrape(VIDEO_URL, ScrapeOptions::default())
        .await
        .unwrap();
    let report = pipeline
        .repurpose(VIDEO_ID, RepurposeOptions::default())
        .await
        .unwrap();

    assert!(report.errors.is_empty(), "Fallbacks are not errors: {:?}", report.errors);
    let blog = std::fs::read_to_string(report.blog.unwrap()).unwrap();
    assert!(blog.starts_with(&format!("# {VIDEO_TITLE}")));
    assert!(blog.contains("## Introduction"));
    assert_eq!(report.posts.len(), 6);
}

#[tokio::test]
async fn test_repurpose_without_video_records_errors() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = default_pipeline(dir.path(), MockDataStore::default());

    let options = ScrapeOptions {
        video: false,
        ..Default::default()
    };
    pipeline.scrape(VIDEO_URL, options).await.unwrap();
    let report = pipeline
        .repurpose(VIDEO_ID, RepurposeOptions::default())
        .await
        .unwrap();

    assert!(report.blog.is_some(), "Text artifacts do not need the video");
    assert!(report.shorts.is_empty());
    assert!(report.thumbnail.is_none());
    assert_eq!(
        report.errors,
        vec![
            "shorts: no downloaded video".to_string(),
            "thumbnail: no downloaded video".to_string()
        ]
    );
}

#[tokio::test]
async fn test_render_failures_are_recorded() {
    let dir = tempfile::tempdir().unwrap();

    let pipeline = build_pipeline(
        dir.path(),
        MockDataStore::default(),
        MockPageFetcher::default(),
        MockDownloader::default(),
        MockTranscriber::new(&[]),
        None,
        MockVideoProcessor::failing("ffmpeg exited with status 1"),
        5,
    );

    pipeline
        .scrape(VIDEO_URL, ScrapeOptions::default())
        .await
        .unwrap();
    let report = pipeline
        .repurpose(VIDEO_ID, RepurposeOptions::default())
        .await
        .unwrap();

    assert!(report.blog.is_some());
    assert!(report.shorts.is_empty());
    assert!(report.thumbnail.is_none());
    assert!(report
        .errors
        .contains(&"shorts: no clip could be rendered".to_string()));
    assert!(
        report.errors.iter().any(|e| e.starts_with("thumbnail: Failed to probe")),
        "got: {:?}",
        report.errors
    );
}

#[tokio::test]
async fn test_repurpose_unknown_video_errors() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = default_pipeline(dir.path(), MockDataStore::default());

    let result = pipeline
        .repurpose("zzzzzzzzzzz", RepurposeOptions::default())
        .await;
    assert!(result.is_err(), "Unknown videos must be scraped first");
    assert!(format!("{:#}", result.unwrap_err()).contains("scrape it first"));
}

// ─── Batch runs ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_run_respects_max_videos() {
    let dir = tempfile::tempdir().unwrap();
    let store = MockDataStore::default();
    let inserted = store.inserted.clone();

    let pipeline = build_pipeline(
        dir.path(),
        store,
        MockPageFetcher::default(),
        MockDownloader::default(),
        MockTranscriber::new(&[]),
        None,
        MockVideoProcessor::default(),
        2,
    );

    let urls = (1..=4)
        .map(|n| format!("https://www.youtube.com/watch?v=vid0000000{n}"))
        .collect::<Vec<_>>();
    let results = pipeline.run(&urls).await.expect("Run should succeed");

    let ids = results
        .iter()
        .map(|(scraped, _)| scraped.info.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["vid00000001", "vid00000002"], "Should keep input order");
    assert!(results.iter().all(|(_, repurposed)| repurposed.blog.is_some()));
    assert_eq!(inserted.lock().unwrap().len(), 2, "Should respect max_videos limit of 2");
}

#[tokio::test]
async fn test_existing_and_duplicate_videos_are_filtered_out() {
    let dir = tempfile::tempdir().unwrap();
    let store = MockDataStore::with_existing(&["vid00000001"]);
    let inserted = store.inserted.clone();
    let pipeline = default_pipeline(dir.path(), store);

    let urls = vec![
        "https://www.youtube.com/watch?v=vid00000001".to_string(),
        "https://youtu.be/vid00000002".to_string(),
        "vid00000002".to_string(),
        "not a video".to_string(),
    ];
    let results = pipeline.run(&urls).await.expect("Run should succeed");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0.info.id, "vid00000002");

    let inserted = inserted.lock().unwrap();
    assert!(
        inserted.iter().all(|v| v.video_id != "vid00000001"),
        "Existing video should have been filtered out"
    );
}

#[tokio::test]
async fn test_run_with_nothing_new_returns_ok() {
    let dir = tempfile::tempdir().unwrap();
    let downloader = MockDownloader::default();
    let download_calls = downloader.calls.clone();

    let pipeline = build_pipeline(
        dir.path(),
        MockDataStore::with_existing(&[VIDEO_ID]),
        MockPageFetcher::default(),
        downloader,
        MockTranscriber::new(&[]),
        None,
        MockVideoProcessor::default(),
        5,
    );

    let results = pipeline.run(&[VIDEO_URL.to_string()]).await;
    assert!(results.is_ok(), "Should return Ok when every video exists");
    assert!(results.unwrap().is_empty());
    assert!(download_calls.lock().unwrap().is_empty(), "No media should be downloaded");

    let results = pipeline.run(&[]).await.expect("Empty batch should be Ok");
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_run_stops_on_store_failure() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = default_pipeline(dir.path(), MockDataStore::failing("Connection refused"));

    let result = pipeline.run(&[VIDEO_URL.to_string()]).await;
    assert!(result.is_err(), "Should propagate store error");
}

// ─── Channel growth ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_similar_channels_from_related_videos() {
    let fetcher = MockPageFetcher::default();
    let growth = ChannelGrowth::<_, MockGenerator>::new(YouTubeClient::new(fetcher));

    let channels = growth.find_similar_channels(CHANNEL_ID, 5).await;

    assert_eq!(channels.len(), 1, "Own channel should be excluded");
    assert_eq!(channels[0].id, "UCother00000000000000001");
    assert_eq!(channels[0].title, "Tiny House Co");
    // two related videos on each of the three source videos
    assert_eq!(channels[0].count, 6);
}

#[tokio::test]
async fn test_growth_degrades_to_empty_lists() {
    let growth = ChannelGrowth::<_, MockGenerator>::new(YouTubeClient::new(
        MockPageFetcher::failing("offline"),
    ));

    assert!(growth.find_similar_channels(CHANNEL_ID, 5).await.is_empty());
    assert!(growth.analyze_trending_keywords(None).await.is_empty());
}

#[tokio::test]
async fn test_video_ideas_prompt_uses_recent_titles() {
    let generator = MockGenerator::new("Ideas:\n1. Shed Tour After One Year\n2. Roofing Mistakes");
    let generator_calls = generator.calls.clone();
    let growth = ChannelGrowth::new(YouTubeClient::new(MockPageFetcher::default()))
        .with_generator(Some(generator));

    let ideas = growth
        .suggest_video_ideas(CHANNEL_ID, &["shed".to_string(), "roofing".to_string()])
        .await;

    assert_eq!(ideas, vec!["Shed Tour After One Year", "Roofing Mistakes"]);

    let calls = generator_calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].user.contains("Pouring the Foundation"));
    assert!(calls[0].user.contains("shed, roofing"));
}

#[tokio::test]
async fn test_video_ideas_without_generator_use_templates() {
    let growth =
        ChannelGrowth::<_, MockGenerator>::new(YouTubeClient::new(MockPageFetcher::default()));

    let ideas = growth.suggest_video_ideas(CHANNEL_ID, &["sheds".to_string()]).await;
    assert!(ideas.contains(&"The Ultimate Guide to sheds".to_string()));
}

// ─── Social scheduling ───────────────────────────────────────────────────────

fn build_manager(
    dir: &Path,
    store: MockDataStore,
    facebook: MockPublisher,
) -> SocialMediaManager<MockPublisher, InstagramClient, MockDataStore> {
    SocialMediaManager::new(store, dir)
        .with_facebook(Some(facebook))
        .with_instagram(None)
}

#[tokio::test]
async fn test_due_posts_are_dispatched_and_marked() {
    let dir = tempfile::tempdir().unwrap();
    let store = MockDataStore::default();
    let facebook = MockPublisher::failing("reject");

    let posts = store.posts.clone();
    let updates = store.updates.clone();
    let facebook_calls = facebook.calls.clone();

    let manager = build_manager(dir.path(), store, facebook);
    let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();

    manager
        .schedule_posts(
            Platform::Facebook,
            vec![
                ("Morning shed update".to_string(), None),
                ("Please reject this one".to_string(), None),
                ("Evening recap".to_string(), None),
            ],
            start,
            1,
        )
        .await
        .expect("Scheduling should succeed");
    manager
        .schedule_posts(
            Platform::Instagram,
            vec![("Story time".to_string(), Some("shed.jpg".to_string()))],
            start,
            1,
        )
        .await
        .unwrap();

    let report = manager
        .dispatch_due_posts(start + Duration::minutes(90))
        .await
        .expect("Dispatch should succeed");

    assert_eq!(report.posted.len(), 1);
    assert_eq!(report.posted[0].0, 1);
    assert_eq!(report.posted[0].1.post_id, "page_1");

    let failed_ids = report.failed.iter().map(|(id, _)| *id).collect::<Vec<_>>();
    assert_eq!(failed_ids, vec![4, 2], "Failures are reported in due order");
    assert!(report.failed.iter().any(|(_, e)| e.contains("not configured")));

    assert_eq!(facebook_calls.lock().unwrap().len(), 2);
    let written = updates
        .lock()
        .unwrap()
        .iter()
        .map(|u| (u.id, u.status))
        .collect::<Vec<_>>();
    assert_eq!(
        written,
        vec![
            (1, PostStatus::Publishing),
            (1, PostStatus::Posted),
            (4, PostStatus::Publishing),
            (4, PostStatus::Failed),
            (2, PostStatus::Publishing),
            (2, PostStatus::Failed),
        ],
        "Each post is claimed before it is sent"
    );

    let posts = posts.lock().unwrap();
    let status = |id: i64| posts.iter().find(|p| p.id == Some(id)).unwrap().status;
    assert_eq!(status(1), PostStatus::Posted);
    assert_eq!(status(2), PostStatus::Failed);
    assert_eq!(status(3), PostStatus::Scheduled, "Not due yet");
    assert_eq!(status(4), PostStatus::Failed);
}

#[tokio::test]
async fn test_engagement_is_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let store = MockDataStore::default();
    let engagement = store.engagement.clone();
    let facebook = MockPublisher {
        likes: 12,
        ..Default::default()
    };

    let manager = build_manager(dir.path(), store, facebook);
    let snapshot = manager
        .monitor_engagement(Platform::Facebook, "page_1")
        .await;

    assert_eq!(snapshot.likes, 12);
    assert_eq!(snapshot.post_id, "page_1");
    assert_eq!(engagement.lock().unwrap().len(), 1);
}
