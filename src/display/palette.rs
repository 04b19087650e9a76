//! Named colours.
//!
//! Seven base colours each come in eight shades, `name0` (brightest, 255)
//! down to `name7` (31), stepping 32 per shade. A bare name is shade 0.
//! Greys are shades of white; `violet` and `purple` are the same colour.

use super::frame::Rgb;

const BASES: [&str; 7] = ["red", "green", "blue", "yellow", "cyan", "magenta", "white"];

/// Highest shade suffix.
pub const MAX_SHADE: u8 = 7;

/// Violet, also reachable as `purple`.
pub const VIOLET: Rgb = Rgb::new(159, 0, 255);

/// Look up a colour by name, ignoring case.
pub fn named(name: &str) -> Option<Rgb> {
    let name = name.trim().to_ascii_lowercase();
    match name.as_str() {
        "black" => return Some(Rgb::BLACK),
        "violet" | "purple" => return Some(VIOLET),
        "lgrey" => return shade("white", 2),
        "grey" => return shade("white", 4),
        "dgrey" => return shade("white", 6),
        _ => {}
    }

    let split = name
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(name.len());
    let (base, suffix) = name.split_at(split);
    let level = if suffix.is_empty() {
        0
    } else {
        suffix.parse::<u8>().ok()?
    };
    shade(base, level)
}

/// Shade `level` (0..=7) of one of the seven base colours.
pub fn shade(base: &str, level: u8) -> Option<Rgb> {
    if level > MAX_SHADE {
        return None;
    }
    let v = 255 - 32 * level;
    let rgb = match base {
        "red" => Rgb::new(v, 0, 0),
        "green" => Rgb::new(0, v, 0),
        "blue" => Rgb::new(0, 0, v),
        "yellow" => Rgb::new(v, v, 0),
        "cyan" => Rgb::new(0, v, v),
        "magenta" => Rgb::new(v, 0, v),
        "white" => Rgb::new(v, v, v),
        _ => return None,
    };
    Some(rgb)
}

/// Every base colour name.
pub fn base_names() -> &'static [&'static str] {
    &BASES
}

/// Named colour, or black for an unknown name.
pub(crate) fn named_or_black(name: &str) -> Rgb {
    named(name).unwrap_or(Rgb::BLACK)
}
