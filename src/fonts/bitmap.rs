//! Minimal 5x7 bitmap font used when no scalable font can be loaded.
//!
//! Glyphs are stored column by column, bit 0 being the top row. Printable
//! ASCII is stored directly; Latin-1 letters are composed from their base
//! letter plus a mark drawn in two rows above it (or one row below, for the
//! cedilla), so every glyph sits in a 10-row cell with the base letter at row 2.

use image::{Rgb, RgbImage};

use super::blend;

const COLUMNS: usize = 5;
const ROWS: u32 = 10;
const BASE_ROW: u32 = 2;
/// Base letter height plus one row of leading, used to map a point size to a scale.
const CELL_HEIGHT: f32 = 8.0;
/// Advance, in columns, of glyphs without ink (the space).
const BLANK_ADVANCE: i32 = 3;

static GLYPHS: [[u8; COLUMNS]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x00, 0x00, 0x5F, 0x00, 0x00], // '!'
    [0x00, 0x07, 0x00, 0x07, 0x00], // '"'
    [0x14, 0x7F, 0x14, 0x7F, 0x14], // '#'
    [0x24, 0x2A, 0x7F, 0x2A, 0x12], // '$'
    [0x23, 0x13, 0x08, 0x64, 0x62], // '%'
    [0x36, 0x49, 0x55, 0x22, 0x50], // '&'
    [0x00, 0x05, 0x03, 0x00, 0x00], // '\''
    [0x00, 0x1C, 0x22, 0x41, 0x00], // '('
    [0x00, 0x41, 0x22, 0x1C, 0x00], // ')'
    [0x08, 0x2A, 0x1C, 0x2A, 0x08], // '*'
    [0x08, 0x08, 0x3E, 0x08, 0x08], // '+'
    [0x00, 0x50, 0x30, 0x00, 0x00], // ','
    [0x08, 0x08, 0x08, 0x08, 0x08], // '-'
    [0x00, 0x60, 0x60, 0x00, 0x00], // '.'
    [0x20, 0x10, 0x08, 0x04, 0x02], // '/'
    [0x3E, 0x51, 0x49, 0x45, 0x3E], // '0'
    [0x00, 0x42, 0x7F, 0x40, 0x00], // '1'
    [0x42, 0x61, 0x51, 0x49, 0x46], // '2'
    [0x21, 0x41, 0x45, 0x4B, 0x31], // '3'
    [0x18, 0x14, 0x12, 0x7F, 0x10], // '4'
    [0x27, 0x45, 0x45, 0x45, 0x39], // '5'
    [0x3C, 0x4A, 0x49, 0x49, 0x30], // '6'
    [0x01, 0x71, 0x09, 0x05, 0x03], // '7'
    [0x36, 0x49, 0x49, 0x49, 0x36], // '8'
    [0x06, 0x49, 0x49, 0x29, 0x1E], // '9'
    [0x00, 0x36, 0x36, 0x00, 0x00], // ':'
    [0x00, 0x56, 0x36, 0x00, 0x00], // ';'
    [0x08, 0x14, 0x22, 0x41, 0x00], // '<'
    [0x14, 0x14, 0x14, 0x14, 0x14], // '='
    [0x00, 0x41, 0x22, 0x14, 0x08], // '>'
    [0x02, 0x01, 0x51, 0x09, 0x06], // '?'
    [0x32, 0x49, 0x79, 0x41, 0x3E], // '@'
    [0x7E, 0x11, 0x11, 0x11, 0x7E], // 'A'
    [0x7F, 0x49, 0x49, 0x49, 0x36], // 'B'
    [0x3E, 0x41, 0x41, 0x41, 0x22], // 'C'
    [0x7F, 0x41, 0x41, 0x22, 0x1C], // 'D'
    [0x7F, 0x49, 0x49, 0x49, 0x41], // 'E'
    [0x7F, 0x09, 0x09, 0x01, 0x01], // 'F'
    [0x3E, 0x41, 0x41, 0x51, 0x32], // 'G'
    [0x7F, 0x08, 0x08, 0x08, 0x7F], // 'H'
    [0x00, 0x41, 0x7F, 0x41, 0x00], // 'I'
    [0x20, 0x40, 0x41, 0x3F, 0x01], // 'J'
    [0x7F, 0x08, 0x14, 0x22, 0x41], // 'K'
    [0x7F, 0x40, 0x40, 0x40, 0x40], // 'L'
    [0x7F, 0x02, 0x04, 0x02, 0x7F], // 'M'
    [0x7F, 0x04, 0x08, 0x10, 0x7F], // 'N'
    [0x3E, 0x41, 0x41, 0x41, 0x3E], // 'O'
    [0x7F, 0x09, 0x09, 0x09, 0x06], // 'P'
    [0x3E, 0x41, 0x51, 0x21, 0x5E], // 'Q'
    [0x7F, 0x09, 0x19, 0x29, 0x46], // 'R'
    [0x46, 0x49, 0x49, 0x49, 0x31], // 'S'
    [0x01, 0x01, 0x7F, 0x01, 0x01], // 'T'
    [0x3F, 0x40, 0x40, 0x40, 0x3F], // 'U'
    [0x1F, 0x20, 0x40, 0x20, 0x1F], // 'V'
    [0x7F, 0x20, 0x18, 0x20, 0x7F], // 'W'
    [0x63, 0x14, 0x08, 0x14, 0x63], // 'X'
    [0x03, 0x04, 0x78, 0x04, 0x03], // 'Y'
    [0x61, 0x51, 0x49, 0x45, 0x43], // 'Z'
    [0x00, 0x7F, 0x41, 0x41, 0x00], // '['
    [0x02, 0x04, 0x08, 0x10, 0x20], // '\\'
    [0x00, 0x41, 0x41, 0x7F, 0x00], // ']'
    [0x04, 0x02, 0x01, 0x02, 0x04], // '^'
    [0x40, 0x40, 0x40, 0x40, 0x40], // '_'
    [0x00, 0x01, 0x02, 0x04, 0x00], // '`'
    [0x20, 0x54, 0x54, 0x54, 0x78], // 'a'
    [0x7F, 0x48, 0x44, 0x44, 0x38], // 'b'
    [0x38, 0x44, 0x44, 0x44, 0x20], // 'c'
    [0x38, 0x44, 0x44, 0x48, 0x7F], // 'd'
    [0x38, 0x54, 0x54, 0x54, 0x18], // 'e'
    [0x08, 0x7E, 0x09, 0x01, 0x02], // 'f'
    [0x0C, 0x52, 0x52, 0x52, 0x3E], // 'g'
    [0x7F, 0x08, 0x04, 0x04, 0x78], // 'h'
    [0x00, 0x44, 0x7D, 0x40, 0x00], // 'i'
    [0x20, 0x40, 0x44, 0x3D, 0x00], // 'j'
    [0x7F, 0x10, 0x28, 0x44, 0x00], // 'k'
    [0x00, 0x41, 0x7F, 0x40, 0x00], // 'l'
    [0x7C, 0x04, 0x18, 0x04, 0x78], // 'm'
    [0x7C, 0x08, 0x04, 0x04, 0x78], // 'n'
    [0x38, 0x44, 0x44, 0x44, 0x38], // 'o'
    [0x7C, 0x14, 0x14, 0x14, 0x08], // 'p'
    [0x08, 0x14, 0x14, 0x18, 0x7C], // 'q'
    [0x7C, 0x08, 0x04, 0x04, 0x08], // 'r'
    [0x48, 0x54, 0x54, 0x54, 0x20], // 's'
    [0x04, 0x3F, 0x44, 0x40, 0x20], // 't'
    [0x3C, 0x40, 0x40, 0x20, 0x7C], // 'u'
    [0x1C, 0x20, 0x40, 0x20, 0x1C], // 'v'
    [0x3C, 0x40, 0x30, 0x40, 0x3C], // 'w'
    [0x44, 0x28, 0x10, 0x28, 0x44], // 'x'
    [0x0C, 0x50, 0x50, 0x50, 0x3C], // 'y'
    [0x44, 0x64, 0x54, 0x4C, 0x44], // 'z'
    [0x00, 0x08, 0x36, 0x41, 0x00], // '{'
    [0x00, 0x00, 0x7F, 0x00, 0x00], // '|'
    [0x00, 0x41, 0x36, 0x08, 0x00], // '}'
    [0x08, 0x04, 0x08, 0x10, 0x08], // '~'
];

type Mark = [u16; COLUMNS];

const ACUTE: Mark = [0, 0, 0b10, 0b01, 0];
const GRAVE: Mark = [0, 0b01, 0b10, 0, 0];
const CIRCUMFLEX: Mark = [0, 0b10, 0b01, 0b10, 0];
const TILDE: Mark = [0b10, 0b01, 0b10, 0b01, 0];
const DIAERESIS: Mark = [0, 0b10, 0, 0b10, 0];
const RING: Mark = [0, 0b11, 0b01, 0b11, 0];
const CEDILLA: Mark = [0, 0, 1 << 9, 1 << 9, 0];

// Inverted punctuation, already in base coordinates.
const INVERTED_EXCLAMATION: [u8; COLUMNS] = [0x00, 0x00, 0x7D, 0x00, 0x00];
const INVERTED_QUESTION: [u8; COLUMNS] = [0x30, 0x48, 0x45, 0x40, 0x20];

/// Base letter and mark of a composed Latin-1 letter.
fn decompose(ch: char) -> Option<(char, Mark)> {
    let composed = match ch {
        'À' => ('A', GRAVE),
        'Á' => ('A', ACUTE),
        'Â' => ('A', CIRCUMFLEX),
        'Ã' => ('A', TILDE),
        'Ä' => ('A', DIAERESIS),
        'Å' => ('A', RING),
        'Ç' => ('C', CEDILLA),
        'È' => ('E', GRAVE),
        'É' => ('E', ACUTE),
        'Ê' => ('E', CIRCUMFLEX),
        'Ë' => ('E', DIAERESIS),
        'Ì' => ('I', GRAVE),
        'Í' => ('I', ACUTE),
        'Î' => ('I', CIRCUMFLEX),
        'Ï' => ('I', DIAERESIS),
        'Ñ' => ('N', TILDE),
        'Ò' => ('O', GRAVE),
        'Ó' => ('O', ACUTE),
        'Ô' => ('O', CIRCUMFLEX),
        'Õ' => ('O', TILDE),
        'Ö' => ('O', DIAERESIS),
        'Ù' => ('U', GRAVE),
        'Ú' => ('U', ACUTE),
        'Û' => ('U', CIRCUMFLEX),
        'Ü' => ('U', DIAERESIS),
        'Ý' => ('Y', ACUTE),
        'à' => ('a', GRAVE),
        'á' => ('a', ACUTE),
        'â' => ('a', CIRCUMFLEX),
        'ã' => ('a', TILDE),
        'ä' => ('a', DIAERESIS),
        'å' => ('a', RING),
        'ç' => ('c', CEDILLA),
        'è' => ('e', GRAVE),
        'é' => ('e', ACUTE),
        'ê' => ('e', CIRCUMFLEX),
        'ë' => ('e', DIAERESIS),
        'ì' => ('i', GRAVE),
        'í' => ('i', ACUTE),
        'î' => ('i', CIRCUMFLEX),
        'ï' => ('i', DIAERESIS),
        'ñ' => ('n', TILDE),
        'ò' => ('o', GRAVE),
        'ó' => ('o', ACUTE),
        'ô' => ('o', CIRCUMFLEX),
        'õ' => ('o', TILDE),
        'ö' => ('o', DIAERESIS),
        'ù' => ('u', GRAVE),
        'ú' => ('u', ACUTE),
        'û' => ('u', CIRCUMFLEX),
        'ü' => ('u', DIAERESIS),
        'ý' => ('y', ACUTE),
        'ÿ' => ('y', DIAERESIS),
        _ => return None,
    };
    Some(composed)
}

fn ascii(ch: char) -> Option<[u8; COLUMNS]> {
    let code = ch as u32;
    match ch {
        '¡' => Some(INVERTED_EXCLAMATION),
        '¿' => Some(INVERTED_QUESTION),
        _ if (0x20..=0x7E).contains(&code) => Some(GLYPHS[(code - 0x20) as usize]),
        _ => None,
    }
}

/// Full 10-row columns for `ch`, or `None` when the font has no glyph for it.
fn columns(ch: char) -> Option<[u16; COLUMNS]> {
    let (base, mark) = decompose(ch).unwrap_or((ch, [0; COLUMNS]));
    let mut base_columns = ascii(base)?;
    if base == 'i' && ch != 'i' {
        // The dot of 'i' gives way to the mark above it.
        for col in base_columns.iter_mut() {
            *col &= !1;
        }
    }
    let mut out = [0u16; COLUMNS];
    for (i, col) in out.iter_mut().enumerate() {
        *col = ((base_columns[i] as u16) << BASE_ROW) | mark[i];
    }
    Some(out)
}

/// First and last inked column, or `None` for blank glyphs.
fn ink_span(columns: &[u16; COLUMNS]) -> Option<(usize, usize)> {
    let first = columns.iter().position(|c| *c != 0)?;
    let last = columns.iter().rposition(|c| *c != 0)?;
    Some((first, last))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BitmapFont {
    scale: u32,
}

impl BitmapFont {
    pub fn new(size: f32) -> Self {
        let scale = (size / CELL_HEIGHT).round().max(1.0) as u32;
        Self { scale }
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn glyph_width(&self, ch: char) -> Option<i32> {
        let glyph = columns(ch)?;
        let cols = match ink_span(&glyph) {
            Some((first, last)) => (last - first + 1) as i32,
            None => BLANK_ADVANCE,
        };
        Some(cols * self.scale as i32)
    }

    /// Draws `ch` with its ink starting at column `x` and the top of its cell at `y`.
    pub fn draw_glyph(&self, surface: &mut RgbImage, ch: char, x: i32, y: i32, color: Rgb<u8>) -> bool {
        let Some(glyph) = columns(ch) else {
            return false;
        };
        let Some((first, last)) = ink_span(&glyph) else {
            return true;
        };
        let s = self.scale as i32;
        for (i, bits) in glyph[first..=last].iter().enumerate() {
            for row in 0..ROWS {
                if bits & (1 << row) == 0 {
                    continue;
                }
                let left = x.saturating_add(i as i32 * s);
                let top = y.saturating_add(row as i32 * s);
                for py in top..top.saturating_add(s) {
                    for px in left..left.saturating_add(s) {
                        blend(surface, px, py, color, 1.0);
                    }
                }
            }
        }
        true
    }
}
