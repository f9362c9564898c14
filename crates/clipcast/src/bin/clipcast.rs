use std::{path::PathBuf, str::FromStr, sync::Arc};

use anyhow::Context;
use apalis::{
    layers::{retry::RetryPolicy, sentry::SentryLayer},
    prelude::*,
};
use apalis_cron::{CronStream, Tick};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use clipcast::{
    config::{Secrets, Settings},
    growth::ChannelGrowth,
    openai::OpenAIClient,
    social::{FacebookClient, InstagramClient, Platform, PostDraft, SocialMediaManager},
    stealth::Stealth,
    tracing::init_tracing_subscriber,
    yt::{api::YouTubeApi, client::YouTubeClient, downloader::YtDlpDownloader, scraper::Scraper},
    ContentPipeline, ContentPipelineBuilder, RepurposeOptions, ScrapeOptions,
};
use clipcast_media::{FfMpeg, YtDlp};
use clipcast_store::AnyStore;
use cron::Schedule;

#[derive(Parser)]
#[command(
    name = "clipcast",
    about = "Scrape YouTube videos, repurpose them and publish to social media"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Clone)]
struct GlobalArgs {
    /// YouTube Data API key; pages are scraped without one
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    youtube_api_key: Option<String>,

    /// OpenAI API key; templates are used without one
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    #[arg(long, env = "FACEBOOK_ACCESS_TOKEN", hide_env_values = true)]
    facebook_access_token: Option<String>,

    #[arg(long, env = "FACEBOOK_PAGE_ID")]
    facebook_page_id: Option<String>,

    #[arg(long, env = "INSTAGRAM_ACCESS_TOKEN", hide_env_values = true)]
    instagram_access_token: Option<String>,

    #[arg(long, env = "INSTAGRAM_USER_ID")]
    instagram_user_id: Option<String>,

    /// Public URL under which the output directory is served
    #[arg(long, env = "INSTAGRAM_MEDIA_BASE_URL")]
    instagram_media_base_url: Option<String>,

    #[arg(long, env = "DOWNLOAD_PATH", default_value = "./downloads")]
    download_path: PathBuf,

    #[arg(long, env = "OUTPUT_PATH", default_value = "./output")]
    output_path: PathBuf,

    /// One proxy per line
    #[arg(long, env = "PROXY_LIST_PATH", default_value = "./proxies.txt")]
    proxy_list_path: PathBuf,

    /// Path to yt-dlp cookies file
    #[arg(long, env = "YTDLP_COOKIES_PATH")]
    cookies_path: Option<PathBuf>,

    /// Postgres connection URL; the file store under the output path is used without one
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Settings file merged over these options when it exists
    #[arg(long, env = "CLIPCAST_CONFIG", default_value = "config.json")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch a video's details, media and transcript
    Scrape {
        url: String,
        #[arg(long)]
        no_video: bool,
        #[arg(long)]
        no_audio: bool,
        #[arg(long)]
        no_transcript: bool,
    },
    /// Build blog, posts, shorts and thumbnail for a scraped video
    Repurpose {
        video_id: String,
        #[arg(long)]
        no_blog: bool,
        #[arg(long)]
        no_posts: bool,
        #[arg(long)]
        no_shorts: bool,
        #[arg(long)]
        no_thumbnail: bool,
    },
    /// Scrape and repurpose every new video among the given URLs
    Run {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Publish a post right away
    Post {
        platform: Platform,
        content: String,
        #[arg(long)]
        media: Option<PathBuf>,
    },
    /// Queue posts at a fixed interval
    Schedule {
        platform: Platform,
        /// RFC 3339 timestamp, or a local date-time when --timezone is given
        #[arg(long)]
        start: String,
        #[arg(long, default_value = "24")]
        interval_hours: u32,
        #[arg(long)]
        timezone: Option<Tz>,
        /// `<content>` or `<content>::<media path>`; repeatable
        #[arg(long = "item", required = true)]
        items: Vec<String>,
    },
    /// Show engagement for a published post
    Engagement { platform: Platform, post_id: String },
    #[command(subcommand)]
    Growth(GrowthCommand),
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Dispatch due scheduled posts on a cron schedule
    Cron {
        #[arg(long, env = "CRON_SCHEDULE", default_value = "0 */15 * * * *")]
        schedule: String,
    },
}

#[derive(Subcommand)]
enum GrowthCommand {
    /// Channels that appear next to this channel's videos
    Similar {
        channel_id: String,
        #[arg(long, default_value = "5")]
        max: usize,
    },
    /// Most frequent words in trending videos
    Trending {
        #[arg(long)]
        category: Option<String>,
    },
    /// Video title ideas from the channel and trending keywords
    Ideas {
        channel_id: String,
        /// Use these keywords instead of the trending ones
        #[arg(long = "keyword")]
        keywords: Vec<String>,
        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the resolved settings
    Show,
    /// Write the settings (without secrets) to a file
    Save { path: Option<PathBuf> },
    /// Validate a settings file and print the merged result
    Load { path: PathBuf },
}

#[derive(Clone)]
struct Config {
    settings: Settings,
    database_url: Option<String>,
}

type Pipeline = ContentPipeline<
    AnyStore,
    Scraper,
    YtDlpDownloader,
    OpenAIClient<FfMpeg>,
    OpenAIClient<FfMpeg>,
    FfMpeg,
>;

type Manager = SocialMediaManager<FacebookClient, InstagramClient, AnyStore>;

impl GlobalArgs {
    fn into_config(self) -> Config {
        let mut settings = Settings {
            secrets: Secrets {
                youtube_api_key: self.youtube_api_key,
                openai_api_key: self.openai_api_key,
                facebook_access_token: self.facebook_access_token,
                instagram_access_token: self.instagram_access_token,
            },
            download_path: self.download_path,
            output_path: self.output_path,
            proxy_list_path: self.proxy_list_path,
            cookies_path: self.cookies_path,
            facebook_page_id: self.facebook_page_id,
            instagram_user_id: self.instagram_user_id,
            instagram_media_base_url: self.instagram_media_base_url,
            ..Default::default()
        };

        if self.config.exists() {
            settings.load_overrides(&self.config);
        }

        Config {
            settings,
            database_url: self.database_url,
        }
    }
}

async fn open_store(config: &Config) -> anyhow::Result<AnyStore> {
    AnyStore::connect(config.database_url.as_deref(), &config.settings.output_path)
        .await
        .context("Failed to open the data store")
}

fn youtube_api(settings: &Settings) -> Option<YouTubeApi> {
    settings.secrets.youtube_api_key.clone().map(YouTubeApi::new)
}

/// Text model for growth ideas; ffmpeg is only needed for transcription,
/// so its absence just disables the model here
fn idea_generator(settings: &Settings) -> Option<OpenAIClient<FfMpeg>> {
    let key = settings.secrets.openai_api_key.as_ref()?;
    let ffmpeg = FfMpeg::new()
        .inspect_err(|e| tracing::warn!(error = ?e, "ffmpeg not found, using idea templates"))
        .ok()?;
    Some(OpenAIClient::new(key, ffmpeg))
}

async fn build_pipeline(config: &Config) -> anyhow::Result<Pipeline> {
    let settings = &config.settings;
    settings.ensure_directories()?;

    let store = open_store(config).await?;
    let stealth = Arc::new(Stealth::new(settings));
    let yt_dlp = YtDlp::new_with_cookies(settings.cookies_path.clone())?;
    let ffmpeg = FfMpeg::new()?;

    // handles both transcription and generation
    let openai = settings
        .secrets
        .openai_api_key
        .as_ref()
        .map(|key| OpenAIClient::new(key, ffmpeg.clone()));

    Ok(ContentPipelineBuilder::new(&settings.download_path, &settings.output_path)
        .store(store)
        .fetcher(Scraper::new(stealth.clone()))
        .downloader(YtDlpDownloader::new(yt_dlp, stealth))
        .transcriber(openai.clone())
        .generator(openai)
        .video_processor(ffmpeg)
        .youtube_api(youtube_api(settings))
        .region_code(&settings.region_code)
        .resize_dims(settings.resize_dims)
        .build())
}

async fn build_manager(config: &Config) -> anyhow::Result<Manager> {
    let settings = &config.settings;
    let secrets = &settings.secrets;

    let facebook = match (&secrets.facebook_access_token, &settings.facebook_page_id) {
        (Some(token), Some(page_id)) => Some(FacebookClient::new(token, page_id)),
        (Some(_), None) => {
            tracing::warn!("FACEBOOK_PAGE_ID is not set, Facebook posting disabled");
            None
        }
        _ => None,
    };
    let instagram = match (&secrets.instagram_access_token, &settings.instagram_user_id) {
        (Some(token), Some(user_id)) => Some(InstagramClient::new(
            token,
            user_id,
            settings.instagram_media_base_url.clone(),
        )),
        (Some(_), None) => {
            tracing::warn!("INSTAGRAM_USER_ID is not set, Instagram posting disabled");
            None
        }
        _ => None,
    };

    Ok(SocialMediaManager::new(open_store(config).await?, &settings.output_path)
        .with_facebook(facebook)
        .with_instagram(instagram))
}

fn build_growth(settings: &Settings) -> ChannelGrowth<Scraper, OpenAIClient<FfMpeg>> {
    let client = YouTubeClient::new(Scraper::new(Arc::new(Stealth::new(settings))))
        .with_api(youtube_api(settings))
        .with_region_code(&settings.region_code);
    ChannelGrowth::new(client).with_generator(idea_generator(settings))
}

/// `content` or `content::media`
fn parse_item(raw: &str) -> (String, Option<String>) {
    match raw.split_once("::") {
        Some((content, media)) if !media.trim().is_empty() => {
            (content.to_string(), Some(media.trim().to_string()))
        }
        Some((content, _)) => (content.to_string(), None),
        None => (raw.to_string(), None),
    }
}

fn parse_start(raw: &str, timezone: Option<Tz>) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::from_str(raw)
        .with_context(|| format!("Invalid start time: {raw}"))?;
    let tz = timezone.unwrap_or(Tz::UTC);
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|at| at.with_timezone(&Utc))
        .with_context(|| format!("{raw} does not exist in {tz}"))
}

async fn dispatch_due(config: &Config) -> anyhow::Result<()> {
    let manager = build_manager(config).await?;
    let report = manager.dispatch_due_posts(Utc::now()).await?;
    tracing::info!(
        posted = report.posted.len(),
        failed = report.failed.len(),
        "Dispatch finished"
    );
    Ok(())
}

async fn handle_tick(_tick: Tick, config: Data<Config>) -> anyhow::Result<()> {
    tracing::info!("Dispatching scheduled posts...");
    dispatch_due(&config).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some("production".into()),
            ..Default::default()
        },
    ));

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    let config = cli.global.into_config();

    match cli.command {
        Command::Scrape {
            url,
            no_video,
            no_audio,
            no_transcript,
        } => {
            let pipeline = build_pipeline(&config).await?;
            let options = ScrapeOptions {
                video: !no_video,
                audio: !no_audio,
                transcript: !no_transcript,
            };
            let report = pipeline.scrape(&url, options).await?;

            println!("{} ({})", report.info.title, report.info.id);
            if let Some(path) = &report.video_path {
                println!("  video:      {}", path.display());
            }
            if let Some(path) = &report.audio_path {
                println!("  audio:      {}", path.display());
            }
            match &report.transcript_path {
                Some(path) => println!(
                    "  transcript: {} ({} lines{})",
                    path.display(),
                    report.transcript_entries,
                    if report.transcribed { ", transcribed" } else { "" }
                ),
                None => println!("  transcript: none"),
            }
            println!("  metadata:   {}", report.metadata_path.display());
            for error in &report.errors {
                println!("  warning: {error}");
            }
        }
        Command::Repurpose {
            video_id,
            no_blog,
            no_posts,
            no_shorts,
            no_thumbnail,
        } => {
            let pipeline = build_pipeline(&config).await?;
            let options = RepurposeOptions {
                blog: !no_blog,
                posts: !no_posts,
                shorts: !no_shorts,
                thumbnail: !no_thumbnail,
            };
            let report = pipeline.repurpose(&video_id, options).await?;

            if let Some(path) = &report.blog {
                println!("blog: {}", path.display());
            }
            for (key, path) in report.posts.iter().chain(&report.shorts) {
                println!("{key}: {}", path.display());
            }
            if let Some(path) = &report.thumbnail {
                println!("thumbnail: {}", path.display());
            }
            for error in &report.errors {
                println!("warning: {error}");
            }
        }
        Command::Run { urls } => {
            let pipeline = build_pipeline(&config).await?;
            let results = pipeline.run(&urls).await?;
            if results.is_empty() {
                println!("No new videos to process");
            }
            for (scraped, repurposed) in results {
                println!(
                    "{} ({}): {} posts, {} shorts, {} warnings",
                    scraped.info.title,
                    scraped.info.id,
                    repurposed.posts.len(),
                    repurposed.shorts.len(),
                    scraped.errors.len() + repurposed.errors.len()
                );
            }
        }
        Command::Post {
            platform,
            content,
            media,
        } => {
            let manager = build_manager(&config).await?;
            let draft = PostDraft::new(content, media.map(|p| p.display().to_string()));
            let published = manager.post(platform, &draft).await?;
            println!("Posted to {platform}: {}", published.post_id);
        }
        Command::Schedule {
            platform,
            start,
            interval_hours,
            timezone,
            items,
        } => {
            let start = parse_start(&start, timezone)?;
            let items = items.iter().map(String::as_str).map(parse_item).collect();
            let manager = build_manager(&config).await?;
            let scheduled = manager
                .schedule_posts(platform, items, start, interval_hours)
                .await?;

            println!("Scheduled {} {platform} posts", scheduled.len());
            for post in scheduled {
                println!(
                    "  #{} at {}: {}",
                    post.id.unwrap_or_default(),
                    post.scheduled_time.to_rfc3339(),
                    post.content
                );
            }
        }
        Command::Engagement { platform, post_id } => {
            let manager = build_manager(&config).await?;
            let e = manager.monitor_engagement(platform, &post_id).await;
            println!(
                "{platform} {post_id}: {} likes, {} comments, {} shares, {} views",
                e.likes, e.comments, e.shares, e.views
            );
        }
        Command::Growth(command) => {
            let growth = build_growth(&config.settings);
            match command {
                GrowthCommand::Similar { channel_id, max } => {
                    let channels = growth.find_similar_channels(&channel_id, max).await;
                    if channels.is_empty() {
                        println!("No similar channels found");
                    }
                    for channel in channels {
                        println!("{} ({}): {}", channel.title, channel.id, channel.count);
                    }
                }
                GrowthCommand::Trending { category } => {
                    let keywords = growth.analyze_trending_keywords(category.as_deref()).await;
                    println!("{}", keywords.join(", "));
                }
                GrowthCommand::Ideas {
                    channel_id,
                    keywords,
                    category,
                } => {
                    let keywords = if keywords.is_empty() {
                        growth.analyze_trending_keywords(category.as_deref()).await
                    } else {
                        keywords
                    };
                    for idea in growth.suggest_video_ideas(&channel_id, &keywords).await {
                        println!("- {idea}");
                    }
                }
            }
        }
        Command::Config(command) => match command {
            ConfigCommand::Show => {
                println!("{}", serde_json::to_string_pretty(&config.settings)?);
                println!("{:?}", config.settings.secrets);
            }
            ConfigCommand::Save { path } => {
                let path = path.unwrap_or_else(|| PathBuf::from("config.json"));
                config.settings.save(&path)?;
                println!("Saved settings to {}", path.display());
            }
            ConfigCommand::Load { path } => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let patch = serde_json::from_str(&raw)
                    .with_context(|| format!("Malformed settings file {}", path.display()))?;
                let mut settings = config.settings.clone();
                settings.update(patch)?;
                println!("{}", serde_json::to_string_pretty(&settings)?);
            }
        },
        Command::Cron { schedule } => {
            tracing::info!(%schedule, "Starting cron scheduler...");
            let schedule = Schedule::from_str(&schedule)?;

            let worker = WorkerBuilder::new("clipcast-cron")
                .backend(CronStream::new(schedule))
                .retry(RetryPolicy::retries(3))
                .layer(SentryLayer::new())
                .data(config)
                .build(handle_tick);

            worker.run().await?;
        }
    }

    Ok(())
}
