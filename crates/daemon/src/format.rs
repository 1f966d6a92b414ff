//! Format resolution for yt-dlp
//!
//! Maps the quality selector from a submission onto yt-dlp's format-selection
//! grammar: a tiered fallback expression for video requests, or audio
//! extraction flags when only the audio track is wanted.

/// Tiered fallback expressions per target height.
///
/// Tier one asks for an mp4 video stream at or below the target height paired
/// with m4a audio, tier two drops the container constraints, and tier three
/// takes the best single stream yt-dlp can find. yt-dlp walks the tiers left
/// to right and uses the first one the video satisfies.
const FMT_2160P: &str = "bestvideo[height<=2160][ext=mp4]+bestaudio[ext=m4a]/bestvideo[height<=2160]+bestaudio/best";
const FMT_1080P: &str = "bestvideo[height<=1080][ext=mp4]+bestaudio[ext=m4a]/bestvideo[height<=1080]+bestaudio/best";
const FMT_720P: &str = "bestvideo[height<=720][ext=mp4]+bestaudio[ext=m4a]/bestvideo[height<=720]+bestaudio/best";
const FMT_480P: &str = "bestvideo[height<=480][ext=mp4]+bestaudio[ext=m4a]/bestvideo[height<=480]+bestaudio/best";
const FMT_360P: &str = "bestvideo[height<=360][ext=mp4]+bestaudio[ext=m4a]/bestvideo[height<=360]+bestaudio/best";

/// Quality selector as submitted by the extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    /// 2160p (4K) ceiling
    P2160,
    /// 1080p ceiling, the default
    P1080,
    /// 720p ceiling
    P720,
    /// 480p ceiling
    P480,
    /// 360p ceiling
    P360,
    /// Audio-only extraction
    Audio,
}

impl Quality {
    /// Parse a selector label from the wire
    ///
    /// Total: anything that is not one of the six known labels falls back to
    /// 1080p rather than rejecting the request.
    pub fn parse(label: &str) -> Self {
        match label {
            "2160p" => Quality::P2160,
            "1080p" => Quality::P1080,
            "720p" => Quality::P720,
            "480p" => Quality::P480,
            "360p" => Quality::P360,
            "audio" => Quality::Audio,
            _ => Quality::P1080,
        }
    }

    /// Height ceiling for video selectors, None for audio
    pub fn height(&self) -> Option<u32> {
        match self {
            Quality::P2160 => Some(2160),
            Quality::P1080 => Some(1080),
            Quality::P720 => Some(720),
            Quality::P480 => Some(480),
            Quality::P360 => Some(360),
            Quality::Audio => None,
        }
    }

    /// The wire label, used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::P2160 => "2160p",
            Quality::P1080 => "1080p",
            Quality::P720 => "720p",
            Quality::P480 => "480p",
            Quality::P360 => "360p",
            Quality::Audio => "audio",
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolved yt-dlp format flags for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatSelection {
    /// Extract the best audio stream and transcode to mp3 at top quality
    AudioOnly,
    /// Select video by the tiered expression and merge into an mp4 container
    Video { selector: &'static str },
}

impl FormatSelection {
    /// Arguments passed to yt-dlp ahead of the URL
    pub fn args(&self) -> Vec<&'static str> {
        match *self {
            FormatSelection::AudioOnly => {
                vec!["-x", "--audio-format", "mp3", "--audio-quality", "0"]
            }
            FormatSelection::Video { selector } => {
                vec!["-f", selector, "--merge-output-format", "mp4"]
            }
        }
    }
}

/// Resolve a quality selector to yt-dlp format flags
///
/// The audio-only flag wins over whatever selector was submitted, so a
/// request carrying both `format: "720p"` and `audioOnly: true` extracts
/// audio.
pub fn resolve(quality: Quality, audio_only: bool) -> FormatSelection {
    if audio_only {
        return FormatSelection::AudioOnly;
    }

    match quality {
        Quality::Audio => FormatSelection::AudioOnly,
        Quality::P2160 => FormatSelection::Video {
            selector: FMT_2160P,
        },
        Quality::P1080 => FormatSelection::Video {
            selector: FMT_1080P,
        },
        Quality::P720 => FormatSelection::Video { selector: FMT_720P },
        Quality::P480 => FormatSelection::Video { selector: FMT_480P },
        Quality::P360 => FormatSelection::Video { selector: FMT_360P },
    }
}
