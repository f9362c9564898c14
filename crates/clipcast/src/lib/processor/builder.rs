use std::path::PathBuf;

use clipcast_media::VideoProcessor;
use clipcast_store::DataStore;

use crate::{
    config::ResizeDims,
    content::ContentRepurposer,
    llm::{generator::TextGenerator, transcriber::Transcriber},
    yt::{api::YouTubeApi, client::YouTubeClient, MediaDownloader, PageFetcher},
    ContentPipeline,
};

pub struct ContentPipelineBuilder<D = (), F = (), M = (), T = (), G = (), V = ()> {
    download_path: PathBuf,
    output_path: PathBuf,
    store: D,
    fetcher: F,
    downloader: M,
    transcriber: Option<T>,
    generator: Option<G>,
    video: V,
    api: Option<YouTubeApi>,
    region_code: String,
    resize_dims: ResizeDims,
    max_videos: usize,
    chunk_duration_seconds: u16,
}

impl ContentPipelineBuilder {
    pub fn new(download_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            download_path: download_path.into(),
            output_path: output_path.into(),
            store: (),
            fetcher: (),
            downloader: (),
            transcriber: None,
            generator: None,
            video: (),
            api: None,
            region_code: "US".into(),
            resize_dims: ResizeDims::default(),
            max_videos: 5,
            // 15 * 60 seconds
            chunk_duration_seconds: 900,
        }
    }
}

impl<D, F, M, T, G, V> ContentPipelineBuilder<D, F, M, T, G, V> {
    pub fn store<D2: DataStore + Send + Sync + 'static>(
        self,
        store: D2,
    ) -> ContentPipelineBuilder<D2, F, M, T, G, V> {
        ContentPipelineBuilder {
            download_path: self.download_path,
            output_path: self.output_path,
            store,
            fetcher: self.fetcher,
            downloader: self.downloader,
            transcriber: self.transcriber,
            generator: self.generator,
            video: self.video,
            api: self.api,
            region_code: self.region_code,
            resize_dims: self.resize_dims,
            max_videos: self.max_videos,
            chunk_duration_seconds: self.chunk_duration_seconds,
        }
    }

    pub fn fetcher<F2: PageFetcher + 'static>(
        self,
        fetcher: F2,
    ) -> ContentPipelineBuilder<D, F2, M, T, G, V> {
        ContentPipelineBuilder {
            download_path: self.download_path,
            output_path: self.output_path,
            store: self.store,
            fetcher,
            downloader: self.downloader,
            transcriber: self.transcriber,
            generator: self.generator,
            video: self.video,
            api: self.api,
            region_code: self.region_code,
            resize_dims: self.resize_dims,
            max_videos: self.max_videos,
            chunk_duration_seconds: self.chunk_duration_seconds,
        }
    }

    pub fn downloader<M2: MediaDownloader + Send + Sync + 'static>(
        self,
        downloader: M2,
    ) -> ContentPipelineBuilder<D, F, M2, T, G, V> {
        ContentPipelineBuilder {
            download_path: self.download_path,
            output_path: self.output_path,
            store: self.store,
            fetcher: self.fetcher,
            downloader,
            transcriber: self.transcriber,
            generator: self.generator,
            video: self.video,
            api: self.api,
            region_code: self.region_code,
            resize_dims: self.resize_dims,
            max_videos: self.max_videos,
            chunk_duration_seconds: self.chunk_duration_seconds,
        }
    }

    /// Speech-to-text used when a video has no captions
    pub fn transcriber<T2: Transcriber + Send + Sync + 'static>(
        self,
        transcriber: Option<T2>,
    ) -> ContentPipelineBuilder<D, F, M, T2, G, V> {
        ContentPipelineBuilder {
            download_path: self.download_path,
            output_path: self.output_path,
            store: self.store,
            fetcher: self.fetcher,
            downloader: self.downloader,
            transcriber,
            generator: self.generator,
            video: self.video,
            api: self.api,
            region_code: self.region_code,
            resize_dims: self.resize_dims,
            max_videos: self.max_videos,
            chunk_duration_seconds: self.chunk_duration_seconds,
        }
    }

    /// Text model for blogs and social posts; templates are used without one
    pub fn generator<G2: TextGenerator + Send + Sync + 'static>(
        self,
        generator: Option<G2>,
    ) -> ContentPipelineBuilder<D, F, M, T, G2, V> {
        ContentPipelineBuilder {
            download_path: self.download_path,
            output_path: self.output_path,
            store: self.store,
            fetcher: self.fetcher,
            downloader: self.downloader,
            transcriber: self.transcriber,
            generator,
            video: self.video,
            api: self.api,
            region_code: self.region_code,
            resize_dims: self.resize_dims,
            max_videos: self.max_videos,
            chunk_duration_seconds: self.chunk_duration_seconds,
        }
    }

    pub fn video_processor<V2: VideoProcessor + Send + Sync + 'static>(
        self,
        video: V2,
    ) -> ContentPipelineBuilder<D, F, M, T, G, V2> {
        ContentPipelineBuilder {
            download_path: self.download_path,
            output_path: self.output_path,
            store: self.store,
            fetcher: self.fetcher,
            downloader: self.downloader,
            transcriber: self.transcriber,
            generator: self.generator,
            video,
            api: self.api,
            region_code: self.region_code,
            resize_dims: self.resize_dims,
            max_videos: self.max_videos,
            chunk_duration_seconds: self.chunk_duration_seconds,
        }
    }

    pub fn youtube_api(mut self, api: Option<YouTubeApi>) -> Self {
        self.api = api;
        self
    }

    pub fn region_code(mut self, region_code: impl Into<String>) -> Self {
        self.region_code = region_code.into();
        self
    }

    pub fn resize_dims(mut self, resize_dims: ResizeDims) -> Self {
        self.resize_dims = resize_dims;
        self
    }

    pub fn max_videos(mut self, max_videos: usize) -> Self {
        self.max_videos = max_videos;
        self
    }

    pub fn chunk_duration_seconds(mut self, seconds: u16) -> Self {
        self.chunk_duration_seconds = seconds;
        self
    }
}

impl<D, F, M, T, G, V> ContentPipelineBuilder<D, F, M, T, G, V>
where
    D: DataStore + Send + Sync + 'static,
    F: PageFetcher + 'static,
    M: MediaDownloader + Send + Sync + 'static,
    T: Transcriber + Send + Sync + 'static,
    G: TextGenerator + Send + Sync + 'static,
    V: VideoProcessor + Send + Sync + 'static,
{
    pub fn build(self) -> ContentPipeline<D, F, M, T, G, V> {
        let youtube = YouTubeClient::new(self.fetcher)
            .with_api(self.api)
            .with_region_code(self.region_code);

        let repurposer = ContentRepurposer::new(self.output_path, self.video)
            .with_generator(self.generator)
            .with_resize_dims(self.resize_dims);

        ContentPipeline {
            download_path: self.download_path,
            store: self.store,
            youtube,
            downloader: self.downloader,
            transcriber: self.transcriber,
            repurposer,
            max_videos: self.max_videos,
            chunk_duration_seconds: self.chunk_duration_seconds,
        }
    }
}
