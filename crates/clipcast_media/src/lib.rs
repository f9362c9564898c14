//! # clipcast_media
//!
//! Thin bindings over the `yt-dlp`, `ffmpeg` and `ffprobe` executables.
//!
//! Every operation shells out to the external tool and maps a non-zero exit
//! status into [`MediaError::CommandFailed`] with the tool's stderr attached.

mod error;
mod ffmpeg;
mod tools;
mod ytdlp;

pub use error::{DownloadFailure, MediaError};
pub use ffmpeg::{
    escape_drawtext, AudioProcessor, ClipStyle, FfMpeg, FrameStyle, VideoProbe, VideoProcessor,
};
pub use tools::{locate, Tool};
pub use ytdlp::{DownloadOptions, YtDlp};
