// src/pdf/metrics.rs
//
// Larguras (em milésimos de em) das fontes base Helvetica e Helvetica-Bold,
// tiradas dos AFM padrão, para os caracteres ASCII 32..=126.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,                               // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015,                                             // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,                // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,                // 'N'..'Z'
    278, 278, 278, 469, 556, 333,                                                   // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,                // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,                // 'n'..'z'
    334, 260, 334, 584,                                                             // '{'..'~'
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

const DEFAULT_WIDTH: u16 = 600;

// Letras acentuadas têm a largura da letra base
fn fold(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        'ñ' => 'n',
        'Ñ' => 'N',
        _ => c,
    }
}

pub fn char_width(c: char, font: Font) -> u16 {
    let c = fold(c);
    let table = match font {
        Font::Regular => &HELVETICA,
        Font::Bold => &HELVETICA_BOLD,
    };
    match c {
        ' '..='~' => table[c as usize - 32],
        '•' => 350,
        'º' | 'ª' => 370,
        '–' => 556,
        '—' | '…' => 1000,
        _ => DEFAULT_WIDTH,
    }
}

/// Largura em pontos de `text` no tamanho `size`.
pub fn text_width(text: &str, font: Font, size: f32) -> f32 {
    let units: u64 = text.chars().map(|c| u64::from(char_width(c, font))).sum();
    units as f32 * size / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_afm_widths() {
        assert_eq!(char_width(' ', Font::Regular), 278);
        assert_eq!(char_width('A', Font::Regular), 667);
        assert_eq!(char_width('i', Font::Regular), 222);
        assert_eq!(char_width('~', Font::Regular), 584);
        assert_eq!(char_width('i', Font::Bold), 278);
        assert_eq!(char_width('m', Font::Bold), 889);
    }

    #[test]
    fn accents_use_base_letter() {
        assert_eq!(char_width('ã', Font::Regular), char_width('a', Font::Regular));
        assert_eq!(char_width('Ê', Font::Bold), char_width('E', Font::Bold));
        assert_eq!(char_width('ç', Font::Regular), 500);
    }

    #[test]
    fn width_scales_with_size() {
        let w10 = text_width("Tutoria", Font::Regular, 10.0);
        let w20 = text_width("Tutoria", Font::Regular, 20.0);
        assert!((w20 - 2.0 * w10).abs() < 0.001);
        assert_eq!(text_width("", Font::Bold, 12.0), 0.0);
    }

    #[test]
    fn huge_word_does_not_overflow() {
        // 5M x 944 milésimos passa de u32::MAX
        let word = "W".repeat(5_000_000);
        let w = text_width(&word, Font::Regular, 10.0);
        assert!((w - 47_200_000.0).abs() < 100.0);
    }
}
