use serde::{Deserialize, Serialize};

pub const DEFAULT_COLOR: &str = "#000000";
pub const MAX_COLOR_LEN: usize = 20;
pub const DEFAULT_SIZE: f32 = 6.0;
pub const MIN_SIZE: f32 = 1.0;
pub const MAX_SIZE: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Pen,
    /// Paints with the canvas background colour.
    Eraser,
}

/// One line segment of a drawing, relayed to guessers as it is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub color: String,
    pub size: f32,
    pub tool: Tool,
}

impl Stroke {
    /// Clean up a client-supplied stroke. Returns `None` if any endpoint is
    /// not a finite number.
    pub fn sanitize(mut self) -> Option<Self> {
        if ![self.x0, self.y0, self.x1, self.y1]
            .iter()
            .all(|v| v.is_finite())
        {
            return None;
        }
        self.color = sanitize_color(self.color);
        self.size = sanitize_size(self.size);
        Some(self)
    }
}

fn sanitize_color(color: String) -> String {
    let color = color.trim();
    if color.is_empty() {
        return DEFAULT_COLOR.to_string();
    }
    color.chars().take(MAX_COLOR_LEN).collect()
}

fn sanitize_size(size: f32) -> f32 {
    if !size.is_finite() || size <= 0.0 {
        return DEFAULT_SIZE;
    }
    size.clamp(MIN_SIZE, MAX_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke(color: &str, size: f32) -> Stroke {
        Stroke {
            x0: 0.0,
            y0: 0.0,
            x1: 10.0,
            y1: 10.0,
            color: color.to_string(),
            size,
            tool: Tool::Pen,
        }
    }

    #[test]
    fn keeps_valid_stroke() {
        let s = stroke("#ff0000", 8.0);
        assert_eq!(s.clone().sanitize(), Some(s));
    }

    #[test]
    fn clamps_size_and_defaults_color() {
        let s = stroke("", 500.0).sanitize().unwrap();
        assert_eq!(s.color, DEFAULT_COLOR);
        assert_eq!(s.size, MAX_SIZE);

        let s = stroke("#abc", 0.2).sanitize().unwrap();
        assert_eq!(s.size, MIN_SIZE);

        let s = stroke("#abc", f32::NAN).sanitize().unwrap();
        assert_eq!(s.size, DEFAULT_SIZE);
    }

    #[test]
    fn truncates_long_color() {
        let s = stroke(&"x".repeat(64), 4.0).sanitize().unwrap();
        assert_eq!(s.color.len(), MAX_COLOR_LEN);
    }

    #[test]
    fn rejects_non_finite_points() {
        let mut s = stroke("#000", 4.0);
        s.x1 = f32::INFINITY;
        assert!(s.sanitize().is_none());
    }
}
