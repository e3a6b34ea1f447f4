//! Progress measurement along a closed polyline track.
//!
//! `Track` holds the immutable geometry. `TrackTracker` is the cursor that
//! follows a vehicle from segment to segment and turns its position into a
//! signed, lap-aware progress value.

use super::kinematics::Vec2;
use super::traits::TrackReading;

/// Closed polyline with per-point tangents and per-segment lengths.
///
/// Segment `i` runs from point `i` to point `i + 1` (wrapping).
#[derive(Clone, Debug)]
pub struct Track {
    points: Vec<Vec2>,
    tangents: Vec<Vec2>,
    lengths: Vec<f32>,
}

impl Track {
    /// Build a track from its center-line points.
    ///
    /// # Panics
    ///
    /// Panics if fewer than 3 points are given or two consecutive points coincide.
    pub fn new(points: Vec<Vec2>) -> Self {
        assert!(points.len() >= 3, "a closed track needs at least 3 points");
        let n = points.len();
        let tangents = (0..n)
            .map(|i| points[(i + 1) % n] - points[(i + n - 1) % n])
            .collect();
        let lengths: Vec<f32> = (0..n)
            .map(|i| (points[(i + 1) % n] - points[i]).length())
            .collect();
        assert!(
            lengths.iter().all(|&l| l > 0.0),
            "consecutive track points must differ"
        );
        Self {
            points,
            tangents,
            lengths,
        }
    }

    /// Number of points (and segments).
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    #[must_use]
    pub fn point(&self, index: usize) -> Vec2 {
        self.points[index % self.points.len()]
    }

    /// Central-difference tangent at a point (not normalised).
    #[must_use]
    pub fn tangent(&self, index: usize) -> Vec2 {
        self.tangents[index % self.tangents.len()]
    }

    /// Unit normal at a point, to the right of the direction of travel
    /// in a y-up frame.
    #[must_use]
    pub fn normal(&self, index: usize) -> Vec2 {
        self.tangent(index).perp().normalized()
    }

    #[must_use]
    pub fn segment_length(&self, segment: usize) -> f32 {
        self.lengths[segment % self.lengths.len()]
    }

    /// Unit direction of forward travel along a segment.
    #[must_use]
    pub fn segment_direction(&self, segment: usize) -> Vec2 {
        (self.point(segment + 1) - self.point(segment)).normalized()
    }

    /// Segment whose center-line passes closest to `position`.
    #[must_use]
    pub fn nearest_segment(&self, position: Vec2) -> usize {
        let mut best = 0;
        let mut best_dist = f32::INFINITY;
        for seg in 0..self.len() {
            let a = self.point(seg);
            let ab = self.point(seg + 1) - a;
            let t = ((position - a).dot(ab) / ab.length_squared()).clamp(0.0, 1.0);
            let dist = (position - (a + ab * t)).length_squared();
            if dist < best_dist {
                best_dist = dist;
                best = seg;
            }
        }
        best
    }
}

/// Cursor following a vehicle along a [`Track`].
///
/// The cursor moves at most one segment per update, so it must be updated
/// often enough that the vehicle never skips a whole segment between calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackTracker {
    segment: usize,
    forward: bool,
}

impl Default for TrackTracker {
    fn default() -> Self {
        Self {
            segment: 0,
            forward: true,
        }
    }
}

impl TrackTracker {
    /// Cursor on segment 0, counting forward.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn segment(&self) -> usize {
        self.segment
    }

    /// `false` after the vehicle has backed over the start line, until it
    /// crosses it forward again.
    #[must_use]
    pub fn is_forward(&self) -> bool {
        self.forward
    }

    /// Jump to the segment nearest `position`, e.g. after a teleport, and
    /// count forward from there.
    pub fn relocate(&mut self, track: &Track, position: Vec2) {
        self.segment = track.nearest_segment(position);
        self.forward = true;
    }

    /// Advance the cursor for `position` and compute the progress reading.
    pub fn update(&mut self, track: &Track, position: Vec2) -> TrackReading {
        let n = track.len();
        let mut lap_completed = false;

        let last = track.point(self.segment);
        let next = track.point(self.segment + 1);
        if (position - next).dot(track.tangent(self.segment + 1)) > 0.0 {
            self.segment = (self.segment + 1) % n;
            if self.segment == 0 {
                lap_completed = self.forward;
                self.forward = true;
            }
        } else if (position - last).dot(track.tangent(self.segment)) < 0.0 {
            if self.segment == 0 {
                self.forward = false;
            }
            self.segment = if self.segment > 0 { self.segment - 1 } else { n - 1 };
        }

        let last = track.point(self.segment);
        let next = track.point(self.segment + 1);
        let direction = track.segment_direction(self.segment);
        let scale = track.segment_length(self.segment) * n as f32;
        let progress = if self.forward {
            self.segment as f32 / n as f32 + (position - last).dot(direction) / scale
        } else {
            -((n - self.segment - 1) as f32 / n as f32 + (position - next).dot(-direction) / scale)
        };

        TrackReading {
            progress,
            lap_completed,
            track_direction: direction,
        }
    }
}
