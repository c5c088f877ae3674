//! Pure layout math for the eight-slot ring: where each item box goes, which
//! slot a drag vector points at, and the easing curves used by animations.

use mkctl::wm::Point;
use serde_with::DeserializeFromStr;
use std::f64::consts::PI;
use strum::{Display as StrumDisplay, EnumIter, EnumString, IntoEnumIterator};

/// Squared radius around the gesture origin inside which no slot is selected.
pub const DEAD_ZONE_SQ: f64 = 255.0;

/// Slots in canonical order, clockwise from north-west.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    DeserializeFromStr,
    EnumString,
    EnumIter,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive)]
pub enum Direction {
    #[strum(to_string = "NorthWest", serialize = "nw", serialize = "0")]
    NorthWest,
    #[strum(to_string = "North", serialize = "n", serialize = "1")]
    North,
    #[strum(to_string = "NorthEast", serialize = "ne", serialize = "2")]
    NorthEast,
    #[strum(to_string = "East", serialize = "e", serialize = "3")]
    East,
    #[strum(to_string = "SouthEast", serialize = "se", serialize = "4")]
    SouthEast,
    #[strum(to_string = "South", serialize = "s", serialize = "5")]
    South,
    #[strum(to_string = "SouthWest", serialize = "sw", serialize = "6")]
    SouthWest,
    #[strum(to_string = "West", serialize = "w", serialize = "7")]
    West,
}

impl Direction {
    pub fn as_index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::iter().nth(idx)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    /// Smallest rectangle covering the segment `from -> to`, grown by `margin`.
    pub fn around_segment(from: Point, to: Point, margin: f64) -> Self {
        Self::new(
            Point::new(from.x.min(to.x) - margin, from.y.min(to.y) - margin),
            Size::new(
                (from.x - to.x).abs() + 2.0 * margin,
                (from.y - to.y).abs() + 2.0 * margin,
            ),
        )
    }

    pub fn center(&self) -> Point {
        self.origin
            .offset(self.size.width / 2.0, self.size.height / 2.0)
    }
}

/// Furthest extent of the ring from its center in each direction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Bounds {
    /// Grows the bounds to cover an item box whose top-left sits at `pos`
    /// relative to the ring center.
    pub fn include(&mut self, slot: Direction, pos: Point, size: Size) {
        use Direction::*;

        match slot {
            North => self.top = self.top.max(-pos.y),
            South => self.bottom = self.bottom.max(pos.y + size.height),
            _ => {}
        }
        if matches!(slot, North | NorthEast | East | SouthEast | South) {
            self.right = self.right.max(pos.x + size.width);
        }
        if matches!(slot, NorthWest | North | South | SouthWest | West) {
            self.left = self.left.max(-pos.x);
        }
    }

    /// Moves `raw` inward just enough for the ring to fit in `viewport`.
    pub fn clamp_anchor(&self, raw: Point, viewport: Size) -> Point {
        let mut p = raw;
        if p.x - self.left < 0.0 {
            p.x = self.left;
        } else if p.x + self.right > viewport.width {
            p.x = viewport.width - self.right;
        }
        if p.y - self.top < 0.0 {
            p.y = self.top;
        } else if p.y + self.bottom > viewport.height {
            p.y = viewport.height - self.bottom;
        }
        p
    }
}

// Per-slot coefficients for [width, height / tan(pi/8), diagonal clearance].
const COEF_X: [[f64; 3]; 8] = [
    [-1.0, 0.0, -1.0], // NW
    [-0.5, 0.0, 0.0],  // N
    [0.0, 0.0, 1.0],   // NE
    [0.0, 0.5, 0.0],   // E
    [0.0, 0.0, 1.0],   // SE
    [-0.5, 0.0, 0.0],  // S
    [-1.0, 0.0, -1.0], // SW
    [-1.0, -0.5, 0.0], // W
];

// Per-slot coefficients for [height, spacing].
const COEF_Y: [[f64; 2]; 8] = [
    [-1.5, -1.0], // NW
    [-2.5, -2.0], // N
    [-1.5, -1.0], // NE
    [-0.5, 0.0],  // E
    [0.5, 1.0],   // SE
    [1.5, 2.0],   // S
    [0.5, 1.0],   // SW
    [-0.5, 0.0],  // W
];

/// Rounds half-way values towards positive infinity, so that mirrored slots
/// land on the same pixel grid.
pub fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

/// Top-left corner of a `width` x `height` item box in `slot`, relative to
/// the ring center shifted by `center`. Items are `spacing` pixels apart.
pub fn slot_position(slot: Direction, size: Size, spacing: f64, center: Point) -> Point {
    let t = (PI / 8.0).tan();
    let clearance = (1.5 + size.height + spacing) * t;
    let cx = COEF_X[slot.as_index()];
    let cy = COEF_Y[slot.as_index()];

    Point::new(
        round_half_up(
            cx[0] * size.width + cx[1] * size.height / t + cx[2] * clearance + center.x,
        ),
        round_half_up(cy[0] * size.height + cy[1] * spacing + center.y),
    )
}

/// Slot a drag of `(dx, dy)` points at, or `None` inside the dead zone.
pub fn slot_from_drag(dx: f64, dy: f64) -> Option<Direction> {
    if dx * dx + dy * dy < DEAD_ZONE_SQ {
        return None;
    }
    let theta = dy.atan2(dx);
    let idx = (4.0 * theta / PI + 3.5).floor();
    // -pi lands on -1, which wraps around to the west slot
    let idx = if (0.0..=7.0).contains(&idx) {
        idx as usize
    } else {
        Direction::West.as_index()
    };
    Direction::from_index(idx)
}

pub fn ease_out(t: f64) -> f64 {
    if t >= 1.0 {
        1.0
    } else {
        1.0 - 2f64.powf(-10.0 * t)
    }
}

pub fn swing(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    0.5 - (t * PI).cos() / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot_at_degrees(deg: f64) -> Option<Direction> {
        let r = deg.to_radians();
        slot_from_drag(100.0 * r.cos(), 100.0 * r.sin())
    }

    #[test]
    fn test_direction_deserialization() {
        let cases = vec![
            ("\"north\"", Direction::North),
            ("\"North\"", Direction::North),
            ("\"n\"", Direction::North),
            ("\"1\"", Direction::North),
            ("\"nw\"", Direction::NorthWest),
            ("\"0\"", Direction::NorthWest),
            ("\"WEST\"", Direction::West),
        ];

        for (json, expected) in cases {
            let deserialized: Direction = serde_json::from_str(json).unwrap();
            assert_eq!(deserialized, expected);
        }
    }

    #[test]
    fn display_names_parse_back() {
        for slot in Direction::iter() {
            let name = slot.to_string();
            assert_eq!(name.parse::<Direction>().unwrap(), slot, "{name}");
            let json = format!("\"{name}\"");
            assert_eq!(serde_json::from_str::<Direction>(&json).unwrap(), slot);
        }
    }

    #[test]
    fn dead_zone_selects_nothing() {
        assert_eq!(slot_from_drag(0.0, 0.0), None);
        assert_eq!(slot_from_drag(15.0, 5.0), None);
        assert_eq!(slot_from_drag(-11.0, 11.0), None);
        assert_eq!(slot_from_drag(16.0, 0.0), Some(Direction::East));
    }

    #[test]
    fn compass_directions() {
        let cases = [
            ((0.0, -50.0), Direction::North),
            ((50.0, -50.0), Direction::NorthEast),
            ((50.0, 0.0), Direction::East),
            ((50.0, 50.0), Direction::SouthEast),
            ((0.0, 50.0), Direction::South),
            ((-50.0, 50.0), Direction::SouthWest),
            ((-50.0, 0.0), Direction::West),
            ((-50.0, -50.0), Direction::NorthWest),
            ((-50.0, -0.0), Direction::West),
        ];
        for ((dx, dy), expected) in cases {
            assert_eq!(slot_from_drag(dx, dy), Some(expected), "({dx}, {dy})");
        }
    }

    #[test]
    fn sectors_step_by_one_around_the_circle() {
        let mut steps = 0;
        let mut prev = slot_at_degrees(-180.0).unwrap().as_index();
        for tenth in -1799..=1800 {
            let idx = slot_at_degrees(tenth as f64 / 10.0).unwrap().as_index();
            assert!(idx < 8);
            if idx != prev {
                assert_eq!(idx, (prev + 1) % 8, "at {} degrees", tenth as f64 / 10.0);
                steps += 1;
            }
            prev = idx;
        }
        assert_eq!(steps, 8);
    }

    #[test]
    fn sector_boundaries_sit_between_compass_points() {
        assert_eq!(slot_at_degrees(22.0), Some(Direction::East));
        assert_eq!(slot_at_degrees(23.0), Some(Direction::SouthEast));
        assert_eq!(slot_at_degrees(-67.0), Some(Direction::NorthEast));
        assert_eq!(slot_at_degrees(-68.0), Some(Direction::North));
        assert_eq!(slot_at_degrees(179.0), Some(Direction::West));
        assert_eq!(slot_at_degrees(-179.0), Some(Direction::West));
        assert_eq!(slot_at_degrees(-157.0), Some(Direction::NorthWest));
    }

    #[test]
    fn slot_positions_tile_the_ring() {
        let size = Size::new(100.0, 20.0);
        let at = |d| slot_position(d, size, 2.0, Point::default());

        assert_eq!(at(Direction::North), Point::new(-50.0, -54.0));
        assert_eq!(at(Direction::South), Point::new(-50.0, 34.0));
        assert_eq!(at(Direction::East), Point::new(24.0, -10.0));
        assert_eq!(at(Direction::West), Point::new(-124.0, -10.0));
        assert_eq!(at(Direction::NorthEast), Point::new(10.0, -32.0));
        assert_eq!(at(Direction::SouthEast), Point::new(10.0, 12.0));
        assert_eq!(at(Direction::NorthWest), Point::new(-110.0, -32.0));
        assert_eq!(at(Direction::SouthWest), Point::new(-110.0, 12.0));
    }

    #[test]
    fn slot_position_honours_center_offset() {
        let size = Size::new(80.0, 18.0);
        let base = slot_position(Direction::East, size, 2.0, Point::default());
        let shifted = slot_position(Direction::East, size, 2.0, Point::new(10.0, -4.0));
        assert_eq!(shifted, base.offset(10.0, -4.0));
    }

    #[test]
    fn bounds_cover_every_slot() {
        let size = Size::new(100.0, 20.0);
        let mut bounds = Bounds::default();
        for slot in Direction::iter() {
            bounds.include(slot, slot_position(slot, size, 2.0, Point::default()), size);
        }
        assert_eq!(
            bounds,
            Bounds {
                left: 124.0,
                right: 124.0,
                top: 54.0,
                bottom: 54.0,
            }
        );
    }

    #[test]
    fn anchor_is_pushed_inside_the_viewport() {
        let bounds = Bounds {
            left: 124.0,
            right: 124.0,
            top: 54.0,
            bottom: 54.0,
        };
        let viewport = Size::new(800.0, 600.0);
        let clamp = |x, y| bounds.clamp_anchor(Point::new(x, y), viewport);

        assert_eq!(clamp(400.0, 300.0), Point::new(400.0, 300.0));
        assert_eq!(clamp(10.0, 10.0), Point::new(124.0, 54.0));
        assert_eq!(clamp(790.0, 590.0), Point::new(676.0, 546.0));
    }

    #[test]
    fn ease_out_is_monotonic_from_zero_to_one() {
        assert_eq!(ease_out(0.0), 0.0);
        assert_eq!(ease_out(1.0), 1.0);
        assert_eq!(ease_out(3.0), 1.0);
        let mut last = ease_out(0.0);
        for i in 1..=100 {
            let v = ease_out(i as f64 / 100.0);
            assert!(v >= last);
            last = v;
        }
    }

    #[test]
    fn swing_spans_zero_to_one() {
        assert_eq!(swing(0.0), 0.0);
        assert!((swing(0.5) - 0.5).abs() < 1e-12);
        assert!((swing(1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rounding_matches_half_up() {
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-109.734), -110.0);
    }
}
