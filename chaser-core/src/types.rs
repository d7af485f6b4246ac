use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pixel dimensions of a captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Horizontal center in pixels
    pub fn center_x(&self) -> f32 {
        self.width as f32 / 2.0
    }
}

/// Axis-aligned box in pixel coordinates, corners (x1, y1) and (x2, y2)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn center_x(&self) -> f32 {
        (self.x1 + self.x2) / 2.0
    }

    /// Finite corners with x1 < x2 and y1 < y2
    pub fn is_valid(&self) -> bool {
        [self.x1, self.y1, self.x2, self.y2].iter().all(|v| v.is_finite())
            && self.x1 < self.x2
            && self.y1 < self.y2
    }

    /// True when the box is valid and lies inside a frame of the given size
    pub fn fits_within(&self, frame: FrameSize) -> bool {
        self.is_valid()
            && self.x1 >= 0.0
            && self.y1 >= 0.0
            && self.x2 <= frame.width as f32
            && self.y2 <= frame.height as f32
    }
}

/// One detector hit for a single frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }
}

/// Discrete command understood by the rover firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Command {
    Forward,
    Left,
    Right,
    Stop,
    /// Speed calibration step
    Minus,
    LedOn,
    LedOff,
}

impl Command {
    pub const ALL: [Command; 7] = [
        Command::Forward,
        Command::Left,
        Command::Right,
        Command::Stop,
        Command::Minus,
        Command::LedOn,
        Command::LedOff,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Forward => "forward",
            Command::Left => "left",
            Command::Right => "right",
            Command::Stop => "stop",
            Command::Minus => "minus",
            Command::LedOn => "led=on",
            Command::LedOff => "led=off",
        }
    }

    /// Query parameter carrying this command on the action endpoint
    pub fn query_pair(&self) -> (&'static str, &'static str) {
        match self {
            Command::LedOn => ("led", "on"),
            Command::LedOff => ("led", "off"),
            other => ("go", other.as_str()),
        }
    }

    /// Commands that set the wheels moving
    pub fn is_motion(&self) -> bool {
        matches!(self, Command::Forward | Command::Left | Command::Right)
    }

    pub fn is_led(&self) -> bool {
        matches!(self, Command::LedOn | Command::LedOff)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Command::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| Error::UnknownCommand(s.to_string()))
    }
}

impl TryFrom<String> for Command {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Command> for String {
    fn from(command: Command) -> Self {
        command.as_str().to_string()
    }
}
