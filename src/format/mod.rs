//! Rendering of reported payloads.
//!
//! Payloads are rendered either as text ([`Encoding::Text`]) or as a hex dump
//! ([`Encoding::Hex`]), and then substituted into a [`Template`].

use std::fmt;

mod template;

pub use self::template::Template;

/// How payload bytes are rendered into a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Render bytes as UTF-8 text, replacing invalid sequences.
    #[default]
    Text,

    /// Render bytes as lowercase hex pairs separated by single spaces.
    Hex,
}

impl Encoding {
    /// Render `data` with this encoding.
    pub fn render(&self, data: &[u8]) -> String {
        match self {
            Encoding::Text => String::from_utf8_lossy(data).into_owned(),
            Encoding::Hex => Hex(data).to_string(),
        }
    }
}

/// Displays bytes as lowercase hex pairs separated by single spaces.
///
/// ```
/// use loggedio::format::Hex;
///
/// assert_eq!(Hex(&[0x01, 0x02, 0xae, 0xf1]).to_string(), "01 02 ae f1");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Hex<'a>(pub &'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bytes = self.0.iter();
        if let Some(first) = bytes.next() {
            write!(f, "{first:02x}")?;
        }
        for byte in bytes {
            write!(f, " {byte:02x}")?;
        }
        Ok(())
    }
}
