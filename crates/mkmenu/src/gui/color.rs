//! Colors as they appear in the preferences: `#rgb`, `#rrggbb`, `rgb(..)`
//! and `rgba(..)`. Parsing never fails; anything unreadable is opaque black.

use super::geometry::Direction;
use palette::Srgba;
use std::fmt;

/// Interpolation parameter per slot, so the ring shades from the north pole
/// (`t = 0`) to the south pole (`t = 1`).
const SLOT_GRADIENT: [f64; 8] = [0.25, 0.0, 0.25, 0.5, 0.75, 1.0, 0.75, 0.5];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self {
            r,
            g,
            b,
            a: a.clamp(0.0, 1.0),
        }
    }

    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        let parsed = if let Some(hex) = spec.strip_prefix('#') {
            parse_hex(hex)
        } else if spec.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("rgb")) {
            parse_functional(spec)
        } else {
            None
        };
        parsed.unwrap_or(Self::BLACK)
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self::rgba(self.r, self.g, self.b, a)
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut digits = hex.chars().map(|c| channel(&format!("{c}{c}")));
            Some(Color::rgb(digits.next()??, digits.next()??, digits.next()??))
        }
        6 => Some(Color::rgb(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        _ => None,
    }
}

fn parse_functional(spec: &str) -> Option<Color> {
    let open = spec.find('(')?;
    let close = spec.rfind(')')?;
    let args: Vec<&str> = spec.get(open + 1..close)?.split(',').map(str::trim).collect();
    if args.len() < 3 {
        return None;
    }

    let number = |s: &str| s.parse::<f64>().ok().filter(|v| v.is_finite());
    let channel = |s: &str| -> Option<u8> { Some(number(s)?.clamp(0.0, 255.0) as u8) };
    let alpha = match args.get(3) {
        Some(a) => number(a)?,
        None => 1.0,
    };

    Some(Color::rgba(
        channel(args[0])?,
        channel(args[1])?,
        channel(args[2])?,
        alpha,
    ))
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a > 0.999 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "rgba({},{},{},{})", self.r, self.g, self.b, self.a)
        }
    }
}

impl From<Color> for Srgba<f64> {
    fn from(c: Color) -> Self {
        Srgba::new(
            c.r as f64 / 255.0,
            c.g as f64 / 255.0,
            c.b as f64 / 255.0,
            c.a,
        )
    }
}

fn lerp(v1: f64, v2: f64, t: f64) -> f64 {
    v1 + t.clamp(0.0, 1.0) * (v2 - v1)
}

pub fn interpolate(c1: Color, c2: Color, t: f64) -> Color {
    let channel = |a: u8, b: u8| lerp(a as f64, b as f64, t).round() as u8;
    Color::rgba(
        channel(c1.r, c2.r),
        channel(c1.g, c2.g),
        channel(c1.b, c2.b),
        lerp(c1.a, c2.a, t),
    )
}

pub fn slot_color(c1: Color, c2: Color, slot: Direction) -> Color {
    interpolate(c1, c2, SLOT_GRADIENT[slot.as_index()])
}

/// A two-stop gradient read from a `[from, to]` preference pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gradient {
    pub from: Color,
    pub to: Color,
}

impl Gradient {
    pub fn parse(stops: &[String; 2]) -> Self {
        Self {
            from: Color::parse(&stops[0]),
            to: Color::parse(&stops[1]),
        }
    }

    pub fn at(&self, slot: Direction) -> Color {
        slot_color(self.from, self.to, slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn hex_forms_are_equivalent() {
        assert_eq!(Color::parse("#f00"), Color::parse("#ff0000"));
        assert_eq!(Color::parse("#f00"), Color::rgb(255, 0, 0));
        assert_eq!(Color::parse("#C6c6C6"), Color::rgb(198, 198, 198));
    }

    #[test]
    fn opaque_colors_serialize_as_hex() {
        assert_eq!(Color::parse("#ff0000").to_string(), "#ff0000");
        assert_eq!(Color::parse("#0a0").to_string(), "#00aa00");
        assert_eq!(Color::parse("rgb(1, 2, 3)").to_string(), "#010203");
    }

    #[test]
    fn translucent_colors_serialize_as_rgba() {
        let c = Color::parse("rgba(0,0,0,0.7)");
        assert_eq!(c, Color::rgba(0, 0, 0, 0.7));
        assert_eq!(c.to_string(), "rgba(0,0,0,0.7)");
    }

    #[test]
    fn alpha_is_clamped() {
        assert_eq!(Color::parse("rgba(10,20,30,4)").a, 1.0);
        assert_eq!(Color::parse("RGBA(10,20,30,-1)").a, 0.0);
    }

    #[test]
    fn garbage_is_opaque_black() {
        for spec in [
            "",
            "#",
            "#12",
            "#ggg",
            "#12345",
            "red",
            "rgb(1,2)",
            "rgb(a,b,c)",
            "#ffé",
            "éé",
            "rgba(0,0,0,nan)",
            "rgba(0,0,0,inf)",
            "rgba(0,0,0,-inf)",
            "rgb(nan,0,0)",
        ] {
            assert_eq!(Color::parse(spec), Color::BLACK, "{spec:?}");
        }
    }

    #[test]
    fn interpolation_rounds_and_clamps() {
        let black = Color::rgb(0, 0, 0);
        let white = Color::rgb(255, 255, 255);
        assert_eq!(interpolate(black, white, 0.5), Color::rgb(128, 128, 128));
        assert_eq!(interpolate(black, white, -3.0), black);
        assert_eq!(interpolate(black, white, 7.0), white);
        assert_eq!(
            interpolate(Color::rgba(0, 0, 0, 0.0), white, 0.5).a,
            0.5
        );
    }

    #[test]
    fn slot_colors_follow_the_ring_gradient() {
        let c1 = Color::parse("#f7f7f7");
        let c2 = Color::parse("#c6c6c6");
        assert_eq!(slot_color(c1, c2, Direction::NorthWest), interpolate(c1, c2, 0.25));
        assert_eq!(slot_color(c1, c2, Direction::North), c1);
        assert_eq!(slot_color(c1, c2, Direction::South), interpolate(c1, c2, 1.0));
        assert_eq!(slot_color(c1, c2, Direction::South), c2);

        // east and west share a shade, as do the diagonals on each side
        let g = Gradient { from: c1, to: c2 };
        assert_eq!(g.at(Direction::East), g.at(Direction::West));
        assert_eq!(g.at(Direction::NorthEast), g.at(Direction::NorthWest));
        assert_eq!(g.at(Direction::SouthEast), g.at(Direction::SouthWest));
        assert_eq!(Direction::iter().count(), SLOT_GRADIENT.len());
    }
}
