//! Infrared frame model and the protocol name table.
//!
//! An IR remote does not send "volume up"; it sends a pulse train that a
//! decoder recognises as, say, *NEC protocol, 32 bits, value 0x20DF40BF*.
//! [`IrFrame`] is exactly that triple plus a repeat flag.  The gateway never
//! interprets the value: it only moves frames between the transceiver and
//! the bus.

use std::fmt;

/// Identifier of an IR encoding scheme.
///
/// The textual names are the ones used on the wire (`"NEC"`, `"SONY"`, …).
/// Name resolution is permissive: any string that is not in the table
/// resolves to [`Protocol::Unknown`] instead of failing, and it is up to the
/// transceiver to decide what sending an `UNKNOWN` frame means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Sentinel for anything the decoder (or the name table) does not know.
    Unknown,
    Rc5,
    Rc5x,
    Rc6,
    Nec,
    NecLike,
    Sony,
    Panasonic,
    Jvc,
    Samsung,
    Samsung36,
    Whynter,
    AiwaRcT501,
    Lg,
    Lg2,
    Sanyo,
    SanyoLc7461,
    Mitsubishi,
    Mitsubishi2,
    Dish,
    Sharp,
    Coolix,
    Denon,
    Sherwood,
    Rcmm,
    Pronto,
    Nikai,
    Raw,
    GlobalCache,
    MagiQuest,
    LaserTag,
    GiCable,
    Xmp,
    Epson,
    Symphony,
}

impl Protocol {
    /// Every protocol in the table, [`Protocol::Unknown`] first.
    pub const ALL: [Protocol; 35] = [
        Protocol::Unknown,
        Protocol::Rc5,
        Protocol::Rc5x,
        Protocol::Rc6,
        Protocol::Nec,
        Protocol::NecLike,
        Protocol::Sony,
        Protocol::Panasonic,
        Protocol::Jvc,
        Protocol::Samsung,
        Protocol::Samsung36,
        Protocol::Whynter,
        Protocol::AiwaRcT501,
        Protocol::Lg,
        Protocol::Lg2,
        Protocol::Sanyo,
        Protocol::SanyoLc7461,
        Protocol::Mitsubishi,
        Protocol::Mitsubishi2,
        Protocol::Dish,
        Protocol::Sharp,
        Protocol::Coolix,
        Protocol::Denon,
        Protocol::Sherwood,
        Protocol::Rcmm,
        Protocol::Pronto,
        Protocol::Nikai,
        Protocol::Raw,
        Protocol::GlobalCache,
        Protocol::MagiQuest,
        Protocol::LaserTag,
        Protocol::GiCable,
        Protocol::Xmp,
        Protocol::Epson,
        Protocol::Symphony,
    ];

    /// The wire name of this protocol.
    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Rc5 => "RC5",
            Self::Rc5x => "RC5X",
            Self::Rc6 => "RC6",
            Self::Nec => "NEC",
            Self::NecLike => "NEC_LIKE",
            Self::Sony => "SONY",
            Self::Panasonic => "PANASONIC",
            Self::Jvc => "JVC",
            Self::Samsung => "SAMSUNG",
            Self::Samsung36 => "SAMSUNG36",
            Self::Whynter => "WHYNTER",
            Self::AiwaRcT501 => "AIWA_RC_T501",
            Self::Lg => "LG",
            Self::Lg2 => "LG2",
            Self::Sanyo => "SANYO",
            Self::SanyoLc7461 => "SANYO_LC7461",
            Self::Mitsubishi => "MITSUBISHI",
            Self::Mitsubishi2 => "MITSUBISHI2",
            Self::Dish => "DISH",
            Self::Sharp => "SHARP",
            Self::Coolix => "COOLIX",
            Self::Denon => "DENON",
            Self::Sherwood => "SHERWOOD",
            Self::Rcmm => "RCMM",
            Self::Pronto => "PRONTO",
            Self::Nikai => "NIKAI",
            Self::Raw => "RAW",
            Self::GlobalCache => "GLOBALCACHE",
            Self::MagiQuest => "MAGIQUEST",
            Self::LaserTag => "LASERTAG",
            Self::GiCable => "GICABLE",
            Self::Xmp => "XMP",
            Self::Epson => "EPSON",
            Self::Symphony => "SYMPHONY",
        }
    }

    /// Resolves a wire name to a protocol, ignoring ASCII case.
    ///
    /// Never fails: unrecognised names (including the empty string) resolve
    /// to [`Protocol::Unknown`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ir_gateway_core::Protocol;
    ///
    /// assert_eq!(Protocol::from_name("nec"), Protocol::Nec);
    /// assert_eq!(Protocol::from_name("TELEFUNKEN-9000"), Protocol::Unknown);
    /// ```
    pub fn from_name(name: &str) -> Protocol {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(name))
            .unwrap_or(Protocol::Unknown)
    }

    /// Returns `true` for the [`Protocol::Unknown`] sentinel.
    pub fn is_unknown(self) -> bool {
        self == Self::Unknown
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Largest number of significant bits a frame value can carry.
pub const MAX_BIT_LENGTH: u8 = 64;

/// One decoded (received) or to-be-sent infrared signal.
///
/// Frames delivered by the transceiver are accepted as-is.  Frames built from
/// inbound commands are validated by the decoder: `bit_length` is within
/// `1..=64` and `value` fits in that many bits (see [`IrFrame::is_well_formed`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrFrame {
    /// Encoding scheme of the signal.
    pub protocol: Protocol,
    /// Signal payload.
    pub value: u64,
    /// Number of significant bits in `value`.
    pub bit_length: u8,
    /// `true` when the decoder saw a protocol-level repeat of the previous
    /// signal (a held-down button).  Receive-only; ignored when sending.
    pub is_repeat: bool,
}

impl IrFrame {
    /// Creates a non-repeat frame.
    pub fn new(protocol: Protocol, value: u64, bit_length: u8) -> Self {
        Self {
            protocol,
            value,
            bit_length,
            is_repeat: false,
        }
    }

    /// Returns the same frame flagged as a protocol-level repeat.
    pub fn into_repeat(self) -> Self {
        Self {
            is_repeat: true,
            ..self
        }
    }

    /// `true` when `bit_length` is in `1..=64` and `value` has no significant
    /// bits above `bit_length`.
    pub fn is_well_formed(&self) -> bool {
        value_fits(self.value, self.bit_length)
    }
}

/// Returns `true` when `bit_length` is in `1..=64` and `value < 2^bit_length`.
pub(crate) fn value_fits(value: u64, bit_length: u8) -> bool {
    match bit_length {
        0 => false,
        MAX_BIT_LENGTH => true,
        n if n > MAX_BIT_LENGTH => false,
        n => value >> n == 0,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_is_case_insensitive() {
        assert_eq!(Protocol::from_name("SONY"), Protocol::Sony);
        assert_eq!(Protocol::from_name("sony"), Protocol::Sony);
        assert_eq!(Protocol::from_name("Samsung36"), Protocol::Samsung36);
    }

    #[test]
    fn test_from_name_unknown_string_resolves_to_sentinel() {
        // Arrange / Act
        let resolved = Protocol::from_name("NOT_A_PROTOCOL");

        // Assert: permissive resolution, no failure
        assert_eq!(resolved, Protocol::Unknown);
        assert!(resolved.is_unknown());
    }

    #[test]
    fn test_from_name_empty_string_resolves_to_sentinel() {
        assert_eq!(Protocol::from_name(""), Protocol::Unknown);
    }

    #[test]
    fn test_every_name_resolves_back_to_its_protocol() {
        for protocol in Protocol::ALL {
            assert_eq!(Protocol::from_name(protocol.name()), protocol, "{protocol}");
        }
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = Protocol::ALL.iter().map(|p| p.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Protocol::ALL.len());
    }

    #[test]
    fn test_new_frame_is_not_a_repeat() {
        let frame = IrFrame::new(Protocol::Nec, 0x20DF_10EF, 32);
        assert!(!frame.is_repeat);
        assert!(frame.into_repeat().is_repeat);
    }

    #[test]
    fn test_value_fits_boundaries() {
        assert!(value_fits(0xFFF, 12));
        assert!(!value_fits(0x1000, 12));
        assert!(value_fits(u64::MAX, 64));
        assert!(value_fits(0, 1));
        assert!(!value_fits(1, 0));
        assert!(!value_fits(1, 65));
    }

    #[test]
    fn test_is_well_formed_rejects_value_wider_than_bit_length() {
        let frame = IrFrame::new(Protocol::Sony, 0xA90, 8);
        assert!(!frame.is_well_formed());
    }
}
