//! Text encodings understood by the file-backed storage.
//!
//! Files are scanned in code units: one byte for UTF-8 and Latin-1, two for UTF-16 and
//! four for UTF-32. Line breaks are always a single code unit with value `0x0A` or `0x0D`,
//! which is what allows the line index to be built without decoding the whole file.

/// Supported encodings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8.
    #[default]
    Utf8,
    /// UTF-16 little endian.
    Utf16Le,
    /// UTF-16 big endian.
    Utf16Be,
    /// UTF-32 little endian.
    Utf32Le,
    /// UTF-32 big endian.
    Utf32Be,
    /// ISO-8859-1: every byte is the code point of the same value.
    Latin1,
}

impl TextEncoding {
    /// Detect an encoding from a byte-order mark.
    ///
    /// Returns the encoding and the length of the mark. The UTF-32 LE mark starts with the
    /// UTF-16 LE one, so it is checked first.
    pub fn detect_bom(prefix: &[u8]) -> Option<(Self, usize)> {
        match prefix {
            [0xFF, 0xFE, 0x00, 0x00, ..] => Some((Self::Utf32Le, 4)),
            [0x00, 0x00, 0xFE, 0xFF, ..] => Some((Self::Utf32Be, 4)),
            [0xEF, 0xBB, 0xBF, ..] => Some((Self::Utf8, 3)),
            [0xFE, 0xFF, ..] => Some((Self::Utf16Be, 2)),
            [0xFF, 0xFE, ..] => Some((Self::Utf16Le, 2)),
            _ => None,
        }
    }

    /// The byte-order mark written when saving with a mark.
    pub const fn bom(self) -> &'static [u8] {
        match self {
            Self::Utf8 => &[0xEF, 0xBB, 0xBF],
            Self::Utf16Le => &[0xFF, 0xFE],
            Self::Utf16Be => &[0xFE, 0xFF],
            Self::Utf32Le => &[0xFF, 0xFE, 0x00, 0x00],
            Self::Utf32Be => &[0x00, 0x00, 0xFE, 0xFF],
            Self::Latin1 => &[],
        }
    }

    /// Size of one code unit in bytes.
    pub const fn unit_len(self) -> usize {
        match self {
            Self::Utf8 | Self::Latin1 => 1,
            Self::Utf16Le | Self::Utf16Be => 2,
            Self::Utf32Le | Self::Utf32Be => 4,
        }
    }

    /// Value of the code unit stored in `unit` (which must be `unit_len()` bytes long).
    pub fn unit_value(self, unit: &[u8]) -> u32 {
        match self {
            Self::Utf8 | Self::Latin1 => u32::from(unit[0]),
            Self::Utf16Le => u32::from(u16::from_le_bytes([unit[0], unit[1]])),
            Self::Utf16Be => u32::from(u16::from_be_bytes([unit[0], unit[1]])),
            Self::Utf32Le => u32::from_le_bytes([unit[0], unit[1], unit[2], unit[3]]),
            Self::Utf32Be => u32::from_be_bytes([unit[0], unit[1], unit[2], unit[3]]),
        }
    }

    /// Decode bytes; malformed sequences become U+FFFD.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            Self::Utf16Le | Self::Utf16Be => {
                let units = bytes.chunks_exact(2).map(|u| self.unit_value(u) as u16);
                char::decode_utf16(units)
                    .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
                    .collect()
            }
            Self::Utf32Le | Self::Utf32Be => bytes
                .chunks_exact(4)
                .map(|u| char::from_u32(self.unit_value(u)).unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect(),
        }
    }

    /// Encode text; characters Latin-1 cannot represent become `'?'`.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
            Self::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            Self::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
            Self::Utf32Le => text.chars().flat_map(|c| u32::from(c).to_le_bytes()).collect(),
            Self::Utf32Be => text.chars().flat_map(|c| u32::from(c).to_be_bytes()).collect(),
        }
    }
}
