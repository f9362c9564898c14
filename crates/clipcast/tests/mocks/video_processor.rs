use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use clipcast_media::{ClipStyle, FrameStyle, MediaError, VideoProbe, VideoProcessor};

/// Pretends every input is a 12 minute 1080p video and writes placeholder
/// outputs
#[derive(Clone)]
pub struct MockVideoProcessor {
    pub probe: VideoProbe,
    pub clips: Arc<Mutex<Vec<(PathBuf, ClipStyle)>>>,
    pub frames: Arc<Mutex<Vec<(f64, PathBuf)>>>,
    pub fail_with: Option<String>,
}

impl Default for MockVideoProcessor {
    fn default() -> Self {
        Self {
            probe: VideoProbe {
                duration_secs: 720.0,
                width: 1920,
                height: 1080,
            },
            clips: Arc::new(Mutex::new(Vec::new())),
            frames: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }
}

impl MockVideoProcessor {
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }

    fn check(&self) -> Result<(), MediaError> {
        match &self.fail_with {
            Some(msg) => Err(MediaError::Parse(msg.clone())),
            None => Ok(()),
        }
    }
}

impl VideoProcessor for MockVideoProcessor {
    fn probe(&self, _input: &Path) -> Result<VideoProbe, MediaError> {
        self.check()?;
        Ok(self.probe)
    }

    fn cut_clip(
        &self,
        _input: &Path,
        _start_secs: f64,
        _end_secs: f64,
        output: &Path,
        style: &ClipStyle,
    ) -> Result<(), MediaError> {
        self.check()?;
        std::fs::write(output, b"clip")?;
        self.clips
            .lock()
            .unwrap()
            .push((output.to_path_buf(), style.clone()));
        Ok(())
    }

    fn extract_frame(
        &self,
        _input: &Path,
        at_secs: f64,
        output: &Path,
        _style: &FrameStyle,
    ) -> Result<(), MediaError> {
        self.check()?;
        std::fs::write(output, b"jpeg")?;
        self.frames
            .lock()
            .unwrap()
            .push((at_secs, output.to_path_buf()));
        Ok(())
    }
}
