use icu_normalizer::{ComposingNormalizerBorrowed, DecomposingNormalizerBorrowed};

/// Which non-ASCII characters a keyboard layout can produce.
#[derive(Clone, Copy, Debug)]
pub struct TypeableChars {
    pub layout: &'static str,
    /// Non-ASCII characters typed directly.
    pub specials: &'static str,
    /// Combining mark and the base letters it may be composed with.
    pub accents: &'static [(char, &'static str)],
}

const COMBINING_GRAVE: char = '\u{0300}';
const COMBINING_ACUTE: char = '\u{0301}';
const COMBINING_CIRCUMFLEX: char = '\u{0302}';
const COMBINING_DIAERESIS: char = '\u{0308}';

pub static LAYOUTS: &[TypeableChars] = &[
    TypeableChars {
        layout: "en_US",
        specials: "",
        accents: &[],
    },
    TypeableChars {
        layout: "de_DE",
        specials: "ß§°€µ²³",
        accents: &[
            (COMBINING_DIAERESIS, "aouAOU"),
            (COMBINING_ACUTE, "aeiouAEIOU"),
            (COMBINING_GRAVE, "aeiouAEIOU"),
            (COMBINING_CIRCUMFLEX, "aeiouAEIOU"),
        ],
    },
];

impl TypeableChars {
    pub fn for_layout(layout: &str) -> Option<&'static TypeableChars> {
        LAYOUTS.iter().find(|l| l.layout == layout)
    }

    fn accent_allowed(&self, mark: char, base: char) -> bool {
        self.accents
            .iter()
            .any(|&(m, bases)| m == mark && bases.contains(base))
    }

    /// Reduce arbitrary text to what can be typed on this layout.
    ///
    /// Text is decomposed first. ASCII passes through, combining marks are
    /// recomposed onto a base letter that accepts them, listed specials are
    /// kept, other letters become `?` and everything else is dropped.
    pub fn convert(&self, text: &str) -> String {
        let decomposed = DecomposingNormalizerBorrowed::new_nfd().normalize(text);
        let nfc = ComposingNormalizerBorrowed::new_nfc();
        let mut out = String::with_capacity(text.len());
        let mut last: Option<char> = None;

        for ch in decomposed.chars() {
            if ch.is_ascii() {
                out.push(ch);
                last = Some(ch);
                continue;
            }
            if let Some(base) = last.filter(|&b| self.accent_allowed(ch, b)) {
                out.pop();
                let pair: String = [base, ch].iter().collect();
                out.push_str(&nfc.normalize(&pair));
                // A composed letter takes no further marks.
                last = None;
                continue;
            }
            if self.specials.contains(ch) {
                out.push(ch);
                last = Some(ch);
            } else if ch.is_alphabetic() {
                out.push('?');
                last = Some('?');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passes_through() {
        let en = TypeableChars::for_layout("en_US").unwrap();
        assert_eq!(en.convert("Hello, world!"), "Hello, world!");
    }

    #[test]
    fn test_accents_stripped_without_layout_support() {
        let en = TypeableChars::for_layout("en_US").unwrap();
        assert_eq!(en.convert("café naïve"), "cafe naive");
    }

    #[test]
    fn test_layout_accents_recomposed() {
        let de = TypeableChars::for_layout("de_DE").unwrap();
        assert_eq!(de.convert("Grüße aus Köln"), "Grüße aus Köln");
        assert_eq!(de.convert("café"), "café");
    }

    #[test]
    fn test_untypeable_letters_become_question_marks() {
        let de = TypeableChars::for_layout("de_DE").unwrap();
        assert_eq!(de.convert("Ωmega łódź"), "?mega ?ódz");
    }

    #[test]
    fn test_unknown_layout() {
        assert!(TypeableChars::for_layout("xx_XX").is_none());
    }
}
