//! Plain geometric value types.

pub type Point = na::Point2<f64>;

/// Closed interval `[left, right]` on the real line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
  left: f64,
  right: f64,
}
impl Interval {
  pub fn new(left: f64, right: f64) -> Self {
    Self { left, right }
  }

  pub fn left(&self) -> f64 {
    self.left
  }
  pub fn right(&self) -> f64 {
    self.right
  }
  pub fn center(&self) -> f64 {
    (self.left + self.right) / 2.0
  }
  pub fn length(&self) -> f64 {
    (self.right - self.left).abs()
  }

  pub fn contains(&self, x: f64) -> bool {
    x >= self.left && x <= self.right
  }

  /// Local coordinate in `[0,1]` of the physical coordinate `x`.
  pub fn to_local(&self, x: f64) -> f64 {
    (x - self.left) / self.length()
  }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
  left_bottom: Point,
  right_top: Point,
}
impl Rectangle {
  pub fn new(left_bottom: Point, right_top: Point) -> Self {
    Self {
      left_bottom,
      right_top,
    }
  }
  pub fn unit() -> Self {
    Self::new(Point::new(0.0, 0.0), Point::new(1.0, 1.0))
  }

  pub fn left_bottom(&self) -> Point {
    self.left_bottom
  }
  pub fn right_top(&self) -> Point {
    self.right_top
  }

  pub fn width(&self) -> f64 {
    self.right_top.x - self.left_bottom.x
  }
  pub fn height(&self) -> f64 {
    self.right_top.y - self.left_bottom.y
  }
  pub fn area(&self) -> f64 {
    self.width() * self.height()
  }

  pub fn contains(&self, p: &Point) -> bool {
    p.x >= self.left_bottom.x
      && p.x <= self.right_top.x
      && p.y >= self.left_bottom.y
      && p.y <= self.right_top.y
  }
}
