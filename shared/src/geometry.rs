use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

///Represents a vector in 2D space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vector2 {
    ///Value along the x-axis.
    /// Positive direction points at team blue's goal in the canonical frame.
    pub x: f64,
    ///Value along the y-axis.
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    ///Returns the magnitude of the vector.
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    ///Returns the normalized vector, or zero for a zero-length vector.
    pub fn normalize(&self) -> Vector2 {
        let mag = self.magnitude();
        if mag == 0.0 {
            Vector2::ZERO
        } else {
            self.scale(1.0 / mag)
        }
    }

    pub fn scale(&self, scalar: f64) -> Vector2 {
        Vector2::new(self.x * scalar, self.y * scalar)
    }

    pub fn add(&self, other: &Vector2) -> Vector2 {
        Vector2::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(&self, other: &Vector2) -> Vector2 {
        Vector2::new(self.x - other.x, self.y - other.y)
    }

    pub fn dot(&self, other: &Vector2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn distance(&self, other: &Vector2) -> f64 {
        self.sub(other).magnitude()
    }
}

/// Position plus heading (radians, counter-clockwise from +x).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub th: f64,
}

impl Pose {
    pub const fn new(x: f64, y: f64, th: f64) -> Self {
        Self { x, y, th }
    }

    pub fn position(&self) -> Vector2 {
        Vector2::new(self.x, self.y)
    }

    /// Rotates the pose half a turn about the field centre.
    pub fn rotated_half_turn(&self) -> Pose {
        Pose::new(-self.x, -self.y, normalize_angle(self.th + PI))
    }

    /// Reflects the pose across the x axis.
    pub fn reflected_y(&self) -> Pose {
        Pose::new(self.x, -self.y, normalize_angle(-self.th))
    }
}

/// Wraps an angle into (-π, π].
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % (2.0 * PI);
    if a <= -PI {
        a += 2.0 * PI;
    } else if a > PI {
        a -= 2.0 * PI;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_vector_operations() {
        let a = Vector2::new(3.0, 4.0);
        assert_approx_eq!(a.magnitude(), 5.0);
        assert_approx_eq!(a.normalize().x, 0.6);
        assert_approx_eq!(a.distance(&Vector2::ZERO), 5.0);
        assert_eq!(a.sub(&a), Vector2::ZERO);
        assert_eq!(Vector2::ZERO.normalize(), Vector2::ZERO);
    }

    #[test]
    fn test_normalize_angle() {
        assert_approx_eq!(normalize_angle(3.0 * PI), PI);
        assert_approx_eq!(normalize_angle(-PI), PI);
        assert_approx_eq!(normalize_angle(-PI / 2.0), -PI / 2.0);
        assert_approx_eq!(normalize_angle(5.0 * PI / 2.0), PI / 2.0);
    }

    #[test]
    fn test_half_turn_is_involutive() {
        let pose = Pose::new(1.2, -0.4, 0.3);
        let back = pose.rotated_half_turn().rotated_half_turn();
        assert_approx_eq!(back.x, pose.x);
        assert_approx_eq!(back.y, pose.y);
        assert_approx_eq!(back.th, pose.th);
    }
}
