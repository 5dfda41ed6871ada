//! Video layer payload.

use super::image::ImageRef;
use serde::{Deserialize, Serialize};

/// Playback state mirrored from the rendering collaborator's player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPlayback {
    /// Current position in seconds.
    pub current_time: f64,
    /// Clip duration in seconds, `0.0` until known.
    pub duration: f64,
    /// Volume in `[0, 1]`.
    pub volume: f64,
    pub muted: bool,
    pub looping: bool,
    /// Playback rate multiplier, `1.0` = realtime.
    pub rate: f64,
    pub playing: bool,
}

impl Default for VideoPlayback {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            duration: 0.0,
            volume: 1.0,
            muted: false,
            looping: false,
            rate: 1.0,
            playing: false,
        }
    }
}

/// Payload of a video layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VideoLayer {
    pub src: ImageRef,
    #[serde(default)]
    pub playback: VideoPlayback,
}

impl VideoLayer {
    pub fn new(src: ImageRef) -> Self {
        Self {
            src,
            playback: VideoPlayback::default(),
        }
    }

    /// Seek clamped into the known duration.
    pub fn seek(&mut self, time: f64) {
        let max = if self.playback.duration > 0.0 {
            self.playback.duration
        } else {
            f64::MAX
        };
        self.playback.current_time = time.clamp(0.0, max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seek_clamps_to_duration() {
        let mut video = VideoLayer::new("clip.mp4".to_string());
        video.playback.duration = 12.0;
        video.seek(30.0);
        assert!((video.playback.current_time - 12.0).abs() < f64::EPSILON);
        video.seek(-3.0);
        assert!(video.playback.current_time.abs() < f64::EPSILON);
    }

    #[test]
    fn test_seek_unbounded_until_duration_known() {
        let mut video = VideoLayer::new("clip.mp4".to_string());
        video.seek(99.0);
        assert!((video.playback.current_time - 99.0).abs() < f64::EPSILON);
    }
}
