use std::str::FromStr;

use crate::error::InputError;

/// A 24bit RGB color.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl std::fmt::Display for Color {
    /// Prints the color as a terminal swatch followed by its channel values.
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "\x1b[48;2;{};{};{}m  \x1b[0m {:?}",
            self.red, self.green, self.blue, self,
        )
    }
}

impl Color {
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Parses a `#RRGGBB` / `RRGGBB` hex color. Short inputs of 1, 2 or 3
    /// digits are repeated out to 6, so `#3CF` means `#33CCFF`.
    pub fn from_hex(hex: &str) -> Result<Self, InputError> {
        let digits = hex.trim().trim_start_matches('#');
        let expanded: String = match digits.len() {
            1 => digits.repeat(6),
            2 => digits.repeat(3),
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Err(InputError::Color(hex.to_string())),
        };
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&expanded[range], 16)
                .map_err(|_| InputError::Color(hex.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Parses a space-separated `R G B` decimal triplet.
    pub fn from_triplet(triplet: &str) -> Result<Self, InputError> {
        let values = triplet
            .split_whitespace()
            .map(|v| {
                v.parse::<u8>()
                    .map_err(|_| InputError::Channel(v.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        match values[..] {
            [red, green, blue] => Ok(Self::new(red, green, blue)),
            _ => Err(InputError::Color(triplet.to_string())),
        }
    }

    /// Whether `rgb` lies within `tolerance` of this color.
    ///
    /// The metric is per-channel: every channel must differ by at most
    /// `tolerance`. This keeps the default tolerance of 30 meaning what it
    /// always meant for this tool, and it implies a tolerance of 255 or more
    /// accepts every color. A Euclidean aggregate would accept a different
    /// set of pixels near the boundary; the per-channel box is the documented
    /// choice here.
    pub fn matches(&self, rgb: &[u8], tolerance: u8) -> bool {
        self.red.abs_diff(rgb[0]) <= tolerance
            && self.green.abs_diff(rgb[1]) <= tolerance
            && self.blue.abs_diff(rgb[2]) <= tolerance
    }
}

/// Checks a raw tolerance value. Negative values are rejected; anything at
/// or above 255 already matches every color under the per-channel metric,
/// so larger values clamp to 255.
pub fn validate_tolerance(value: i64) -> Result<u8, InputError> {
    if value < 0 {
        return Err(InputError::NegativeTolerance(value));
    }
    Ok(value.min(255) as u8)
}

impl FromStr for Color {
    type Err = InputError;

    /// A color argument is either a hex string or, when it contains
    /// whitespace, an `R G B` triplet.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().contains(char::is_whitespace) {
            Self::from_triplet(s)
        } else {
            Self::from_hex(s)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn hex_full_form() {
        assert_eq!(Color::from_hex("#33CCCC").unwrap(), Color::new(51, 204, 204));
        assert_eq!(Color::from_hex("33cccc").unwrap(), Color::new(51, 204, 204));
    }

    #[test]
    fn hex_short_forms_repeat() {
        assert_eq!(Color::from_hex("a").unwrap(), Color::from_hex("aaaaaa").unwrap());
        assert_eq!(Color::from_hex("ab").unwrap(), Color::from_hex("ababab").unwrap());
        assert_eq!(Color::from_hex("#3CF").unwrap(), Color::from_hex("33CCFF").unwrap());
    }

    #[test]
    fn hex_rejects_bad_input() {
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("zzzzzz").is_err());
        assert!(Color::from_hex("").is_err());
    }

    #[test]
    fn triplet_parses() {
        assert_eq!(
            Color::from_triplet("51 204 204").unwrap(),
            Color::new(51, 204, 204)
        );
    }

    #[test]
    fn triplet_rejects_bad_input() {
        assert!(Color::from_triplet("51 204").is_err());
        assert!(Color::from_triplet("51 204 204 0").is_err());
        assert!(Color::from_triplet("51 204 300").is_err());
        assert!(Color::from_triplet("51 204 -1").is_err());
    }

    #[test]
    fn from_str_dispatches_on_whitespace() {
        assert_eq!("255 0 0".parse::<Color>().unwrap(), Color::new(255, 0, 0));
        assert_eq!("#FF0000".parse::<Color>().unwrap(), Color::new(255, 0, 0));
    }

    #[test]
    fn matches_is_per_channel() {
        let target = Color::new(255, 0, 0);
        assert!(target.matches(&[255, 0, 0], 0));
        assert!(!target.matches(&[254, 0, 0], 0));
        assert!(target.matches(&[250, 5, 5], 30));
        // One channel out of range fails even if the others are exact.
        assert!(!target.matches(&[255, 0, 31], 30));
        assert!(!target.matches(&[0, 0, 0], 30));
    }

    #[test]
    fn tolerance_validation() {
        assert_eq!(validate_tolerance(0).unwrap(), 0);
        assert_eq!(validate_tolerance(30).unwrap(), 30);
        assert_eq!(validate_tolerance(441).unwrap(), 255);
        assert!(matches!(
            validate_tolerance(-1),
            Err(InputError::NegativeTolerance(-1))
        ));
    }

    #[test]
    fn max_tolerance_matches_everything() {
        let target = Color::new(10, 200, 77);
        assert!(target.matches(&[255, 0, 0], 255));
        assert!(target.matches(&[0, 255, 255], 255));
    }
}
