//! Frequency values and operating modes
//!
//! All frequencies in this crate are counted in 10 Hz units, the resolution
//! of the 5-byte CAT wire format. The usable range is the HF ham allocation,
//! 1.8 MHz to 30.0 MHz.
//!
//! # Display format
//! ```text
//! 7.030.00     under 10 MHz  (MHz . kHz . 10Hz)
//! 14.074.00    10 MHz and up
//! ```
//!
//! # Input format
//! [`Frequency::parse_display`] accepts digit strings with or without
//! `.`/`,`/space separators. The magnitude decides the unit: a value that
//! lands in band as 10 Hz units is taken as such (this is what the display
//! format strips down to), otherwise Hz, otherwise kHz. So `"14.074.00"`,
//! `"14074000"` and `"14074"` all mean the same frequency.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// Lower band edge, 1.8 MHz in 10 Hz units
pub const BAND_MIN: u32 = 180_000;
/// Upper band edge, 30.0 MHz in 10 Hz units
pub const BAND_MAX: u32 = 3_000_000;

/// A band-validated frequency in 10 Hz units
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frequency(u32);

impl Frequency {
    /// Construct from raw 10 Hz units, rejecting out-of-band values
    pub fn from_units(units: u32) -> Result<Self, ParseError> {
        if (BAND_MIN..=BAND_MAX).contains(&units) {
            Ok(Self(units))
        } else {
            Err(ParseError::InvalidFrequency(format!(
                "{} is outside 1.8-30.0 MHz",
                units as f64 / 100_000.0
            )))
        }
    }

    /// Parse a display-style or raw digit string
    ///
    /// Separators are stripped, then the digit value is interpreted by
    /// magnitude: 10 Hz units first, then Hz, then kHz. Out-of-band values
    /// are rejected, never clamped.
    pub fn parse_display(input: &str) -> Result<Self, ParseError> {
        let digits: String = input
            .chars()
            .filter(|c| !matches!(c, '.' | ',' | ' '))
            .collect();

        if digits.is_empty() || digits.len() > 8 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ParseError::InvalidFrequency(input.to_string()));
        }

        // Cannot overflow u64: at most 8 digits
        let value: u64 = digits
            .parse()
            .map_err(|_| ParseError::InvalidFrequency(input.to_string()))?;

        let in_band = |v: u64| (BAND_MIN as u64..=BAND_MAX as u64).contains(&v);
        let units = if in_band(value) {
            value
        } else if in_band(value / 10) {
            // Hz entry; the trailing digit is below wire resolution
            value / 10
        } else if in_band(value * 100) {
            // kHz entry
            value * 100
        } else {
            return Err(ParseError::InvalidFrequency(input.to_string()));
        };

        Ok(Self(units as u32))
    }

    /// Parse a numeric MHz value
    pub fn parse_mhz(mhz: f64) -> Result<Self, ParseError> {
        if !mhz.is_finite() {
            return Err(ParseError::InvalidFrequency(mhz.to_string()));
        }
        let units = (mhz * 100_000.0).round();
        if units < BAND_MIN as f64 || units > BAND_MAX as f64 {
            return Err(ParseError::InvalidFrequency(format!("{} MHz", mhz)));
        }
        Ok(Self(units as u32))
    }

    /// Render as `X.XXX.XX` (under 10 MHz) or `XX.XXX.XX`
    pub fn display(&self) -> String {
        let digits = format!("{:07}", self.0);
        let formatted = format!("{}.{}.{}", &digits[0..2], &digits[2..5], &digits[5..7]);
        match formatted.strip_prefix('0') {
            Some(rest) => rest.to_string(),
            None => formatted,
        }
    }

    /// Pack into 4 big-endian BCD bytes (8 decimal digits)
    pub fn to_bcd(&self) -> [u8; 4] {
        let mut remaining = self.0;
        let mut bcd = [0u8; 4];
        for slot in bcd.iter_mut().rev() {
            let low = (remaining % 10) as u8;
            remaining /= 10;
            let high = (remaining % 10) as u8;
            remaining /= 10;
            *slot = (high << 4) | low;
        }
        bcd
    }

    /// Unpack 4 big-endian BCD bytes, rejecting bad nibbles and
    /// out-of-band values
    pub fn from_bcd(bytes: [u8; 4]) -> Result<Self, ParseError> {
        let mut units: u32 = 0;
        for byte in bytes {
            let high = byte >> 4;
            let low = byte & 0x0F;
            if high > 9 || low > 9 {
                return Err(ParseError::InvalidBcd(byte));
            }
            units = units * 100 + (high as u32) * 10 + low as u32;
        }
        Self::from_units(units)
    }

    /// Mode conventionally used at this frequency: LSB below 10 MHz, USB above
    pub fn infer_mode(&self) -> Mode {
        if self.0 < 1_000_000 {
            Mode::Lsb
        } else {
            Mode::Usb
        }
    }

    /// Apply a kHz delta, saturating at the band edges
    pub fn saturating_add_khz(&self, delta_khz: f64) -> Frequency {
        let delta_units = (delta_khz * 100.0).round();
        if !delta_units.is_finite() {
            return *self;
        }
        let target = self.0 as f64 + delta_units;
        Self(target.clamp(BAND_MIN as f64, BAND_MAX as f64) as u32)
    }

    /// Raw value in 10 Hz units
    pub fn as_units(&self) -> u32 {
        self.0
    }

    /// Value in Hz
    pub fn as_hz(&self) -> u64 {
        self.0 as u64 * 10
    }

    /// Value in MHz
    pub fn as_mhz(&self) -> f64 {
        self.0 as f64 / 100_000.0
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    Lsb,
    Usb,
    Cw,
    Am,
    Fm,
}

impl Mode {
    /// Wire byte for the set-mode command (low 3 bits of the reply mode byte)
    pub fn to_wire(&self) -> u8 {
        match self {
            Mode::Lsb => 0,
            Mode::Usb => 1,
            Mode::Cw => 2,
            Mode::Am => 3,
            Mode::Fm => 4,
        }
    }

    /// Decode a reply mode byte (low 3 bits)
    ///
    /// Codes 5-7 are data modes the front panel does not expose; callers
    /// keep whatever mode they already have.
    pub fn from_wire(byte: u8) -> Option<Mode> {
        match byte & 0x07 {
            0 => Some(Mode::Lsb),
            1 => Some(Mode::Usb),
            2 => Some(Mode::Cw),
            3 => Some(Mode::Am),
            4 => Some(Mode::Fm),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Lsb => "LSB",
            Mode::Usb => "USB",
            Mode::Cw => "CW",
            Mode::Am => "AM",
            Mode::Fm => "FM",
        }
    }
}

impl FromStr for Mode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LSB" => Ok(Mode::Lsb),
            "USB" => Ok(Mode::Usb),
            "CW" => Ok(Mode::Cw),
            "AM" => Ok(Mode::Am),
            "FM" => Ok(Mode::Fm),
            _ => Err(ParseError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_display_hz_entry() {
        let f = Frequency::parse_display("14074000").unwrap();
        assert_eq!(f.display(), "14.074.00");
        assert_eq!(f.infer_mode(), Mode::Usb);

        let f = Frequency::parse_display("7030000").unwrap();
        assert_eq!(f.display(), "7.030.00");
        assert_eq!(f.infer_mode(), Mode::Lsb);
    }

    #[test]
    fn test_parse_display_separators() {
        let f = Frequency::parse_display("14.074.00").unwrap();
        assert_eq!(f.as_units(), 1_407_400);
        let f = Frequency::parse_display("7,030.00").unwrap();
        assert_eq!(f.as_units(), 703_000);
    }

    #[test]
    fn test_parse_display_khz_entry() {
        let f = Frequency::parse_display("14074").unwrap();
        assert_eq!(f.as_units(), 1_407_400);
        let f = Frequency::parse_display("1800").unwrap();
        assert_eq!(f.as_units(), BAND_MIN);
    }

    #[test]
    fn test_parse_display_rejects() {
        assert!(Frequency::parse_display("").is_err());
        assert!(Frequency::parse_display("abc").is_err());
        assert!(Frequency::parse_display("31000000").is_err());
        assert!(Frequency::parse_display("1432").is_err());
        assert!(Frequency::parse_display("140740000").is_err());
    }

    #[test]
    fn test_parse_mhz() {
        assert_eq!(Frequency::parse_mhz(14.32).unwrap().as_units(), 1_432_000);
        assert_eq!(Frequency::parse_mhz(1.8).unwrap().as_units(), BAND_MIN);
        assert_eq!(Frequency::parse_mhz(30.0).unwrap().as_units(), BAND_MAX);
        assert!(Frequency::parse_mhz(30.001).is_err());
        assert!(Frequency::parse_mhz(0.5).is_err());
        assert!(Frequency::parse_mhz(f64::NAN).is_err());
    }

    #[test]
    fn test_display_no_leading_zero() {
        assert_eq!(Frequency::from_units(703_000).unwrap().display(), "7.030.00");
        assert_eq!(
            Frequency::from_units(1_432_000).unwrap().display(),
            "14.320.00"
        );
        assert_eq!(Frequency::from_units(BAND_MIN).unwrap().display(), "1.800.00");
        assert_eq!(
            Frequency::from_units(BAND_MAX).unwrap().display(),
            "30.000.00"
        );
    }

    #[test]
    fn test_bcd_layout() {
        let f = Frequency::from_units(1_432_000).unwrap();
        assert_eq!(f.to_bcd(), [0x01, 0x43, 0x20, 0x00]);
        let f = Frequency::from_units(703_000).unwrap();
        assert_eq!(f.to_bcd(), [0x00, 0x70, 0x30, 0x00]);
    }

    #[test]
    fn test_from_bcd_rejects_bad_nibbles() {
        assert!(matches!(
            Frequency::from_bcd([0x01, 0x4A, 0x20, 0x00]),
            Err(ParseError::InvalidBcd(0x4A))
        ));
    }

    #[test]
    fn test_from_bcd_rejects_out_of_band() {
        // 99.999.99 MHz is valid BCD but not a valid frequency
        assert!(Frequency::from_bcd([0x99, 0x99, 0x99, 0x90]).is_err());
    }

    #[test]
    fn test_infer_mode_boundary() {
        assert_eq!(
            Frequency::from_units(999_999).unwrap().infer_mode(),
            Mode::Lsb
        );
        assert_eq!(
            Frequency::from_units(1_000_000).unwrap().infer_mode(),
            Mode::Usb
        );
    }

    #[test]
    fn test_saturating_add() {
        let f = Frequency::from_units(1_432_000).unwrap();
        assert_eq!(f.saturating_add_khz(1.0).as_units(), 1_432_100);
        assert_eq!(f.saturating_add_khz(-0.5).as_units(), 1_431_950);
        assert_eq!(f.saturating_add_khz(1e9).as_units(), BAND_MAX);
        assert_eq!(f.saturating_add_khz(-1e9).as_units(), BAND_MIN);
    }

    #[test]
    fn test_mode_strings() {
        for (s, m) in [
            ("LSB", Mode::Lsb),
            ("usb", Mode::Usb),
            ("Cw", Mode::Cw),
            ("AM", Mode::Am),
            ("fm", Mode::Fm),
        ] {
            assert_eq!(s.parse::<Mode>().unwrap(), m);
        }
        assert!("DATA".parse::<Mode>().is_err());
    }

    #[test]
    fn test_mode_wire_table() {
        assert_eq!(Mode::from_wire(0), Some(Mode::Lsb));
        assert_eq!(Mode::from_wire(4), Some(Mode::Fm));
        assert_eq!(Mode::from_wire(5), None);
        // Only the low 3 bits matter
        assert_eq!(Mode::from_wire(0xF9), Some(Mode::Usb));
    }

    proptest! {
        #[test]
        fn prop_bcd_roundtrip(units in BAND_MIN..=BAND_MAX) {
            let f = Frequency::from_units(units).unwrap();
            let back = Frequency::from_bcd(f.to_bcd()).unwrap();
            prop_assert_eq!(back, f);
        }

        #[test]
        fn prop_display_roundtrip(units in BAND_MIN..=BAND_MAX) {
            let f = Frequency::from_units(units).unwrap();
            let back = Frequency::parse_display(&f.display()).unwrap();
            prop_assert_eq!(back, f);
        }

        #[test]
        fn prop_adjust_stays_in_band(units in BAND_MIN..=BAND_MAX, delta in -1e6f64..1e6f64) {
            let f = Frequency::from_units(units).unwrap();
            let adjusted = f.saturating_add_khz(delta);
            prop_assert!(adjusted.as_units() >= BAND_MIN);
            prop_assert!(adjusted.as_units() <= BAND_MAX);
        }
    }
}
