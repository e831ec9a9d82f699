//! Vision observations and their wire codec
//!
//! The perception process sends one JSON record per line:
//!
//! ```text
//! {"vision_data": {"perclos": 0.12, "yawn_freq": 0, "gaze_distraction": false, "head_pose": "Forward"}}
//! ```
//!
//! The `vision_data` envelope is optional; a bare object with the same
//! fields is accepted too. Decoding never panics and never partially
//! succeeds: a record either yields a validated [`VisionObservation`] or a
//! [`DecodeError`] naming the offending field.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Why an incoming vision record was rejected
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Payload bytes are not UTF-8
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Payload is not JSON, or a field has the wrong JSON type
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Required field absent
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    /// Numeric field outside its allowed range
    #[error("field '{field}' out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },

    /// `head_pose` is not one of the known poses
    #[error("unknown head pose '{0}'")]
    UnknownHeadPose(String),

    /// `yawn_freq` is negative or not finite
    #[error("invalid yawn_freq: {0}")]
    InvalidYawn(f64),

    /// Frame exceeded the configured size limit and was discarded
    #[error("frame exceeds {limit} bytes")]
    FrameTooLarge { limit: usize },
}

/// Coarse head orientation reported by the perception process
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "PascalCase")]
pub enum HeadPose {
    Forward,
    Left,
    Right,
    Up,
    Down,
}

/// Yaw beyond this many degrees counts as looking left/right
pub const YAW_THRESHOLD_DEG: f64 = 15.0;
/// Pitch beyond this many degrees counts as looking up/down
pub const PITCH_THRESHOLD_DEG: f64 = 10.0;

impl HeadPose {
    /// Bucket Euler angles (degrees) into a pose; yaw takes precedence
    pub fn from_euler(pitch_deg: f64, yaw_deg: f64) -> Self {
        if yaw_deg > YAW_THRESHOLD_DEG {
            HeadPose::Right
        } else if yaw_deg < -YAW_THRESHOLD_DEG {
            HeadPose::Left
        } else if pitch_deg > PITCH_THRESHOLD_DEG {
            HeadPose::Down
        } else if pitch_deg < -PITCH_THRESHOLD_DEG {
            HeadPose::Up
        } else {
            HeadPose::Forward
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HeadPose::Forward => "Forward",
            HeadPose::Left => "Left",
            HeadPose::Right => "Right",
            HeadPose::Up => "Up",
            HeadPose::Down => "Down",
        }
    }
}

impl std::fmt::Display for HeadPose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HeadPose {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" => Ok(HeadPose::Forward),
            "left" => Ok(HeadPose::Left),
            "right" => Ok(HeadPose::Right),
            "up" => Ok(HeadPose::Up),
            "down" => Ok(HeadPose::Down),
            _ => Err(DecodeError::UnknownHeadPose(s.to_string())),
        }
    }
}

/// One cycle's worth of already-abstracted vision signals
///
/// PERCLOS is windowed upstream; the fusion core keeps no vision history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct VisionObservation {
    /// Fraction of the recent window with eyes closed, 0.0 to 1.0
    pub perclos: f64,
    pub yawn_active: bool,
    pub gaze_distracted: bool,
    pub head_pose: HeadPose,
}

impl VisionObservation {
    /// Build a validated observation
    pub fn new(
        perclos: f64,
        yawn_active: bool,
        gaze_distracted: bool,
        head_pose: HeadPose,
    ) -> Result<Self, DecodeError> {
        if !perclos.is_finite() || !(0.0..=1.0).contains(&perclos) {
            return Err(DecodeError::OutOfRange {
                field: "perclos",
                value: perclos,
            });
        }
        Ok(Self {
            perclos,
            yawn_active,
            gaze_distracted,
            head_pose,
        })
    }

    /// Decode one frame (without its trailing newline)
    pub fn decode(frame: &[u8]) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(frame)?;
        Self::decode_str(text)
    }

    pub fn decode_str(text: &str) -> Result<Self, DecodeError> {
        let mut root: Value = serde_json::from_str(text)?;
        let body = if root.get("vision_data").is_some() {
            root["vision_data"].take()
        } else {
            root
        };
        let raw: RawVision = serde_json::from_value(body)?;
        raw.validate()
    }

    /// Encode as an enveloped, newline-terminated frame
    pub fn to_frame(&self) -> String {
        let packet = VisionPacket {
            vision_data: WireVision {
                perclos: self.perclos,
                yawn_freq: u8::from(self.yawn_active),
                gaze_distraction: self.gaze_distracted,
                head_pose: self.head_pose,
            },
        };
        // Serializing plain numbers, bools and a unit enum cannot fail
        let mut line = serde_json::to_string(&packet).unwrap_or_default();
        line.push('\n');
        line
    }
}

#[derive(Serialize)]
struct VisionPacket {
    vision_data: WireVision,
}

#[derive(Serialize)]
struct WireVision {
    perclos: f64,
    yawn_freq: u8,
    gaze_distraction: bool,
    head_pose: HeadPose,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum YawnField {
    Flag(bool),
    Count(f64),
}

#[derive(Deserialize)]
struct RawVision {
    perclos: Option<f64>,
    yawn_freq: Option<YawnField>,
    gaze_distraction: Option<bool>,
    head_pose: Option<String>,
}

impl RawVision {
    fn validate(self) -> Result<VisionObservation, DecodeError> {
        let perclos = self.perclos.ok_or(DecodeError::MissingField("perclos"))?;
        let yawn_active = match self.yawn_freq.ok_or(DecodeError::MissingField("yawn_freq"))? {
            YawnField::Flag(flag) => flag,
            YawnField::Count(count) if count.is_finite() && count >= 0.0 => count > 0.0,
            YawnField::Count(count) => return Err(DecodeError::InvalidYawn(count)),
        };
        let gaze_distracted = self
            .gaze_distraction
            .ok_or(DecodeError::MissingField("gaze_distraction"))?;
        let head_pose = self
            .head_pose
            .ok_or(DecodeError::MissingField("head_pose"))?
            .parse::<HeadPose>()?;

        VisionObservation::new(perclos, yawn_active, gaze_distracted, head_pose)
    }
}
