//! Advance widths of the standard Helvetica faces, in 1/1000 em.
//!
//! Values come from the Adobe core-font AFM files and are indexed by
//! WinAnsi code point, starting at the space character.

use super::pdf::Font;

const FIRST: u32 = 0x20;

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,      // 'p'..'~'
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Latin-1 supplement glyphs are measured as a capital letter.
const LATIN1_WIDTH: u16 = 722;

/// Width of one character as drawn; anything outside Latin-1 prints as `?`.
pub(crate) fn advance(font: Font, c: char) -> u16 {
    let table = match font {
        Font::Regular => &HELVETICA,
        Font::Bold => &HELVETICA_BOLD,
    };
    let code = u32::from(c);
    match code {
        0x20..=0x7e => table[(code - FIRST) as usize],
        0xa0..=0xff => LATIN1_WIDTH,
        _ => table[('?' as u32 - FIRST) as usize],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_follow_the_core_font_metrics() {
        assert_eq!(advance(Font::Regular, ' '), 278);
        assert_eq!(advance(Font::Regular, 'W'), 944);
        assert_eq!(advance(Font::Regular, 'i'), 222);
        assert_eq!(advance(Font::Regular, '~'), 584);
        assert_eq!(advance(Font::Bold, 'i'), 278);
        assert_eq!(advance(Font::Bold, 'm'), 889);
        assert_eq!(advance(Font::Bold, '~'), 584);
        assert_eq!(advance(Font::Regular, '漢'), advance(Font::Regular, '?'));
    }
}
