use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use serde::Deserialize;

use crate::{
    tools::{locate, path_arg, run},
    MediaError, Tool,
};

pub trait AudioProcessor {
    /// Splits `input` into consecutive `chunk_seconds` pieces named by
    /// `output_pattern` (a printf-style pattern such as `/dir/base_%03d.mp3`).
    fn split_audio_to_chunks(
        &self,
        input: &Path,
        chunk_seconds: u16,
        output_pattern: PathBuf,
    ) -> Result<(), MediaError>;
}

pub trait VideoProcessor {
    fn probe(&self, input: &Path) -> Result<VideoProbe, MediaError>;

    fn cut_clip(
        &self,
        input: &Path,
        start_secs: f64,
        end_secs: f64,
        output: &Path,
        style: &ClipStyle,
    ) -> Result<(), MediaError>;

    fn extract_frame(
        &self,
        input: &Path,
        at_secs: f64,
        output: &Path,
        style: &FrameStyle,
    ) -> Result<(), MediaError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoProbe {
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
}

impl VideoProbe {
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }

    pub fn is_valid(&self) -> bool {
        self.duration_secs > 0.0 && self.width > 0 && self.height > 0
    }
}

/// Overlays and framing applied to a rendered clip
#[derive(Debug, Clone, Default)]
pub struct ClipStyle {
    pub title: Option<String>,
    pub footer: Option<String>,
    /// Letterbox the clip into this `(width, height)` frame
    pub frame: Option<(u32, u32)>,
}

#[derive(Debug, Clone)]
pub struct FrameStyle {
    pub width: u32,
    pub height: u32,
    pub caption: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FfMpeg {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfMpeg {
    pub fn new() -> Result<Self, MediaError> {
        Ok(Self {
            ffmpeg: locate(Tool::FfMpeg)?,
            ffprobe: locate(Tool::FfProbe)?,
        })
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-hide_banner", "-loglevel", "error", "-y"]);
        cmd
    }
}

/// Escapes a value for use inside an ffmpeg filter option
pub fn escape_drawtext(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | ':' | '\'' | '%' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' | '\r' => escaped.push(' '),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Overlay text is written next to the output and handed to drawtext via
/// `textfile`, so titles never pass through the filtergraph parser.
struct TextOverlay {
    path: PathBuf,
}

impl TextOverlay {
    fn write(output: &Path, suffix: &str, text: &str) -> Result<Self, MediaError> {
        let mut name = output
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{suffix}.txt"));
        let path = output.with_file_name(name);
        fs::write(&path, text)?;
        Ok(Self { path })
    }

    fn filter(&self, font_size: u32, y: &str, box_color: &str) -> String {
        format!(
            "drawtext=textfile={}:expansion=none:fontcolor=white:fontsize={font_size}:box=1:boxcolor={box_color}:boxborderw=8:x=(w-text_w)/2:y={y}",
            escape_drawtext(&path_arg(&self.path))
        )
    }
}

impl Drop for TextOverlay {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn frame_filter(width: u32, height: u32) -> String {
    format!(
        "scale={width}:{height}:force_original_aspect_ratio=decrease,pad={width}:{height}:(ow-iw)/2:(oh-ih)/2:color=black"
    )
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

fn parse_probe(raw: &[u8]) -> Result<VideoProbe, MediaError> {
    let probe: ProbeOutput =
        serde_json::from_slice(raw).map_err(|e| MediaError::Parse(e.to_string()))?;

    let stream = probe
        .streams
        .first()
        .ok_or_else(|| MediaError::Parse("ffprobe reported no video stream".into()))?;
    let duration_secs = probe
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(VideoProbe {
        duration_secs,
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
    })
}

impl AudioProcessor for FfMpeg {
    fn split_audio_to_chunks(
        &self,
        input: &Path,
        chunk_seconds: u16,
        output_pattern: PathBuf,
    ) -> Result<(), MediaError> {
        let mut cmd = self.command();
        cmd.arg("-i")
            .arg(input)
            .args(["-f", "segment", "-segment_time"])
            .arg(chunk_seconds.to_string())
            .args(["-c", "copy"])
            .arg(output_pattern);

        run(Tool::FfMpeg, cmd).map(|_| ())
    }
}

impl VideoProcessor for FfMpeg {
    fn probe(&self, input: &Path) -> Result<VideoProbe, MediaError> {
        let mut cmd = Command::new(&self.ffprobe);
        cmd.args(["-v", "error", "-select_streams", "v:0"])
            .args(["-show_entries", "stream=width,height:format=duration"])
            .args(["-of", "json"])
            .arg(input);

        let output = run(Tool::FfProbe, cmd)?;
        parse_probe(&output.stdout)
    }

    fn cut_clip(
        &self,
        input: &Path,
        start_secs: f64,
        end_secs: f64,
        output: &Path,
        style: &ClipStyle,
    ) -> Result<(), MediaError> {
        let mut filters = Vec::new();
        if let Some((w, h)) = style.frame {
            filters.push(frame_filter(w, h));
        }

        let title = style
            .title
            .as_deref()
            .map(|t| TextOverlay::write(output, "title", t))
            .transpose()?;
        let footer = style
            .footer
            .as_deref()
            .map(|t| TextOverlay::write(output, "footer", t))
            .transpose()?;

        if let Some(title) = &title {
            filters.push(title.filter(24, "10", "black"));
        }
        if let Some(footer) = &footer {
            filters.push(footer.filter(20, "h-text_h-10", "black"));
        }

        let mut cmd = self.command();
        cmd.args(["-ss", &format!("{start_secs:.3}")])
            .arg("-i")
            .arg(input)
            .args(["-t", &format!("{:.3}", (end_secs - start_secs).max(0.0))]);
        if !filters.is_empty() {
            cmd.args(["-vf", &filters.join(",")]);
        }
        cmd.args(["-c:v", "libx264", "-preset", "ultrafast"])
            .args(["-c:a", "aac", "-threads", "4"])
            .arg(output);

        run(Tool::FfMpeg, cmd).map(|_| ())
    }

    fn extract_frame(
        &self,
        input: &Path,
        at_secs: f64,
        output: &Path,
        style: &FrameStyle,
    ) -> Result<(), MediaError> {
        let caption = style
            .caption
            .as_deref()
            .map(|t| TextOverlay::write(output, "caption", t))
            .transpose()?;

        let mut filters = vec![format!("scale={}:{}", style.width, style.height)];
        if let Some(caption) = &caption {
            filters.push(caption.filter(40, "h-text_h-20", "black@0.5"));
        }

        let mut cmd = self.command();
        cmd.args(["-ss", &format!("{at_secs:.3}")])
            .arg("-i")
            .arg(input)
            .args(["-frames:v", "1", "-q:v", "2"])
            .args(["-vf", &filters.join(",")])
            .arg(output);

        run(Tool::FfMpeg, cmd).map(|_| ())
    }
}
