//! Axis-aligned geometry and collision primitives

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub};

/// 2D float vector, also used as the wire position type
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle` (radians)
    pub fn from_angle(angle: f32) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Returns the zero vector when the length is zero
    pub fn normalize_or_zero(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self::new(self.x / len, self.y / len)
        } else {
            Self::ZERO
        }
    }

    pub fn lerp(self, other: Vec2, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned rectangle anchored at its top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle of the given size centered on `center`
    pub fn centered(center: Vec2, w: f32, h: f32) -> Self {
        Self::new(center.x - w / 2.0, center.y - h / 2.0, w, h)
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Half-open containment: left/top edges are inside, right/bottom are not
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left()
            && point.x < self.right()
            && point.y >= self.top()
            && point.y < self.bottom()
    }

    /// True when the two rectangles overlap with a non-zero area
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    pub fn translate(&self, offset: Vec2) -> Rect {
        Rect::new(self.x + offset.x, self.y + offset.y, self.w, self.h)
    }
}

/// Face of an obstacle that a moving box ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

/// Determine which face of `obstacle` the overlapping `mover` hit.
///
/// The face is the one with the smallest penetration depth. Returns `None`
/// when the rectangles do not overlap.
pub fn collision_side(mover: &Rect, obstacle: &Rect) -> Option<Side> {
    if !mover.intersects(obstacle) {
        return None;
    }

    let from_left = mover.right() - obstacle.left();
    let from_right = obstacle.right() - mover.left();
    let from_top = mover.bottom() - obstacle.top();
    let from_bottom = obstacle.bottom() - mover.top();

    let candidates = [
        (from_left, Side::Left),
        (from_right, Side::Right),
        (from_top, Side::Top),
        (from_bottom, Side::Bottom),
    ];

    candidates
        .into_iter()
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, side)| side)
}

/// Offset that moves `mover` out of `obstacle` through the face it hit
pub fn push_out(mover: &Rect, obstacle: &Rect) -> Vec2 {
    match collision_side(mover, obstacle) {
        Some(Side::Left) => Vec2::new(obstacle.left() - mover.right(), 0.0),
        Some(Side::Right) => Vec2::new(obstacle.right() - mover.left(), 0.0),
        Some(Side::Top) => Vec2::new(0.0, obstacle.top() - mover.bottom()),
        Some(Side::Bottom) => Vec2::new(0.0, obstacle.bottom() - mover.top()),
        None => Vec2::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_angle_is_unit_length() {
        let v = Vec2::from_angle(0.0);
        assert_eq!(v, Vec2::new(1.0, 0.0));

        let v = Vec2::from_angle(1.234);
        assert!((v.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rect_containment_is_half_open() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Vec2::new(0.0, 0.0)));
        assert!(r.contains(Vec2::new(9.99, 9.99)));
        assert!(!r.contains(Vec2::new(10.0, 5.0)));
        assert!(!r.contains(Vec2::new(5.0, -0.01)));
    }

    #[test]
    fn centered_rect_is_a_square_hit_box() {
        let r = Rect::centered(Vec2::new(100.0, 100.0), 20.0, 20.0);
        assert_eq!(r, Rect::new(90.0, 90.0, 20.0, 20.0));
        // Corner of the square lies outside the circle of radius 10 but is still a hit
        assert!(r.contains(Vec2::new(91.0, 91.0)));
    }

    #[test]
    fn touching_rects_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        assert_eq!(collision_side(&a, &b), None);
    }

    #[test]
    fn collision_side_picks_shallowest_face() {
        let wall = Rect::new(100.0, 100.0, 50.0, 50.0);

        let from_left = Rect::new(92.0, 110.0, 10.0, 10.0);
        assert_eq!(collision_side(&from_left, &wall), Some(Side::Left));

        let from_above = Rect::new(120.0, 95.0, 10.0, 10.0);
        assert_eq!(collision_side(&from_above, &wall), Some(Side::Top));

        let from_right = Rect::new(148.0, 120.0, 10.0, 10.0);
        assert_eq!(collision_side(&from_right, &wall), Some(Side::Right));

        let from_below = Rect::new(120.0, 147.0, 10.0, 10.0);
        assert_eq!(collision_side(&from_below, &wall), Some(Side::Bottom));
    }

    #[test]
    fn push_out_resolves_overlap() {
        let wall = Rect::new(100.0, 100.0, 50.0, 50.0);
        let mover = Rect::new(92.0, 110.0, 10.0, 10.0);
        let offset = push_out(&mover, &wall);
        assert_eq!(offset, Vec2::new(-2.0, 0.0));
        assert!(!mover.translate(offset).intersects(&wall));
    }
}
