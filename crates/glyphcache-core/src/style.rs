//! Style flags that distinguish face variants of the same font

use bitflags::bitflags;

bitflags! {
    /// Bitmask of style flags carried by a [`FaceKey`](crate::FaceKey)
    ///
    /// `BOLD`/`ITALIC` are what the caller asked for. The `SYNTHETIC_*` bits
    /// record that the engine must fake the style because the font file itself
    /// does not provide it. `ANTIALIAS` selects alpha coverage over mono bitmaps.
    #[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
    pub struct StyleFlags: u32 {
        const BOLD = 1 << 0;
        const ITALIC = 1 << 1;
        const ANTIALIAS = 1 << 2;
        const SYNTHETIC_BOLD = 1 << 3;
        const SYNTHETIC_ITALIC = 1 << 4;
    }
}

impl StyleFlags {
    /// Builds the flag set for a request against a font's native style
    ///
    /// Bold or italic requested on a font that is not natively bold or
    /// italic also sets the matching synthetic bit.
    pub fn synthesize(
        bold: bool,
        italic: bool,
        antialias: bool,
        font_is_bold: bool,
        font_is_italic: bool,
    ) -> Self {
        let mut flags = Self::empty();
        flags.set(Self::BOLD, bold);
        flags.set(Self::ITALIC, italic);
        flags.set(Self::ANTIALIAS, antialias);
        flags.set(Self::SYNTHETIC_BOLD, bold && !font_is_bold);
        flags.set(Self::SYNTHETIC_ITALIC, italic && !font_is_italic);
        flags
    }

    pub const fn wants_synthetic_bold(self) -> bool {
        self.contains(Self::SYNTHETIC_BOLD)
    }

    pub const fn wants_synthetic_italic(self) -> bool {
        self.contains(Self::SYNTHETIC_ITALIC)
    }

    pub const fn antialias(self) -> bool {
        self.contains(Self::ANTIALIAS)
    }
}
