//! Standardize free-form column headers into SQL-safe identifiers
//!
//! `"CoLuMN~W1th!-Spé&ciál-Cháractérs   "` becomes
//! `"COLUMN_W1TH_SPE_CIAL_CHARACTERS"`: newlines removed, ends trimmed, accents
//! folded, upper-cased, punctuation blanked, spaces turned into single
//! underscores.

use log::warn;
use regex::Regex;
use thiserror::Error;

/// Characters blanked in addition to ASCII punctuation
pub const EXTRA_PUNCTUATION: &str = "¡¿“”‘’´¨°";

#[derive(Debug, Error)]
pub enum NameError {
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Which optional steps to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub remove_punct: bool,
    pub remove_accents: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            remove_punct: true,
            remove_accents: true,
        }
    }
}

/// Reusable normalizer holding the compiled underscore pattern
#[derive(Debug, Clone)]
pub struct SqlNameNormalizer {
    options: NormalizeOptions,
    underscores: Regex,
}

impl SqlNameNormalizer {
    pub fn new(options: NormalizeOptions) -> Result<Self, NameError> {
        Ok(Self {
            options,
            underscores: Regex::new(r"_+")?,
        })
    }

    pub fn options(&self) -> NormalizeOptions {
        self.options
    }

    /// Standardize a single name; empty and all-punctuation input yield ""
    pub fn standardize(&self, name: &str) -> String {
        let stripped: String = name.chars().filter(|&c| c != '\n').collect();
        let mut s = stripped.trim().to_string();

        if self.options.remove_accents {
            s = fold_accents(&s);
        }
        s = s.to_uppercase();
        if self.options.remove_punct {
            s = s.chars().map(|c| if is_punctuation(c) { ' ' } else { c }).collect();
        }
        s = s.replace(' ', "_");

        let collapsed = self.underscores.replace_all(&s, "_");
        collapsed.trim_end_matches('_').to_string()
    }

    /// Standardize every name, warning once per disabled step
    pub fn standardize_all<I, S>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !self.options.remove_punct {
            warn!("Punctuation was not removed from column names; this can cause encoding problems");
        }
        if !self.options.remove_accents {
            warn!("Accents were not removed from column names; this can cause encoding problems");
        }
        names.into_iter().map(|n| self.standardize(n.as_ref())).collect()
    }
}

/// Standardize `names` with a one-off normalizer
pub fn standardize<I, S>(names: I, options: NormalizeOptions) -> Result<Vec<String>, NameError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Ok(SqlNameNormalizer::new(options)?.standardize_all(names))
}

fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || EXTRA_PUNCTUATION.contains(c)
}

/// Drop diacritics from Latin letters, leaving other characters alone
pub fn fold_accents(s: &str) -> String {
    s.chars().filter(|c| !is_combining_mark(*c)).map(fold_char).collect()
}

fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}')
}

fn fold_char(c: char) -> char {
    match c {
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => 'A',
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'Ç' | 'Ć' | 'Ĉ' | 'Ċ' | 'Č' => 'C',
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'Ď' => 'D',
        'ď' => 'd',
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ĕ' | 'Ė' | 'Ę' | 'Ě' => 'E',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'Ĝ' | 'Ğ' | 'Ġ' | 'Ģ' => 'G',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
        'Ĥ' => 'H',
        'ĥ' => 'h',
        'Ì' | 'Í' | 'Î' | 'Ï' | 'Ĩ' | 'Ī' | 'Ĭ' | 'Į' | 'İ' => 'I',
        'ì' | 'í' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' => 'i',
        'Ĵ' => 'J',
        'ĵ' => 'j',
        'Ķ' => 'K',
        'ķ' => 'k',
        'Ĺ' | 'Ļ' | 'Ľ' => 'L',
        'ĺ' | 'ļ' | 'ľ' => 'l',
        'Ñ' | 'Ń' | 'Ņ' | 'Ň' => 'N',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ō' | 'Ŏ' | 'Ő' => 'O',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ō' | 'ŏ' | 'ő' => 'o',
        'Ŕ' | 'Ŗ' | 'Ř' => 'R',
        'ŕ' | 'ŗ' | 'ř' => 'r',
        'Ś' | 'Ŝ' | 'Ş' | 'Š' => 'S',
        'ś' | 'ŝ' | 'ş' | 'š' => 's',
        'Ţ' | 'Ť' => 'T',
        'ţ' | 'ť' => 't',
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ũ' | 'Ū' | 'Ŭ' | 'Ů' | 'Ű' | 'Ų' => 'U',
        'ù' | 'ú' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'Ŵ' => 'W',
        'ŵ' => 'w',
        'Ý' | 'Ŷ' | 'Ÿ' => 'Y',
        'ý' | 'ÿ' | 'ŷ' => 'y',
        'Ź' | 'Ż' | 'Ž' => 'Z',
        'ź' | 'ż' | 'ž' => 'z',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> SqlNameNormalizer {
        SqlNameNormalizer::new(NormalizeOptions::default()).unwrap()
    }

    #[test]
    fn test_mixed_headers() {
        let names = [
            "Fasón",
            "CoLuMN~W1th!-Spé&ciál-Cháractérs   ",
            "Ánother-Çolumn\n",
            "Yét_Another-Çolumn",
        ];
        let out = standardize(names, NormalizeOptions::default()).unwrap();
        assert_eq!(
            out,
            vec!["FASON", "COLUMN_W1TH_SPE_CIAL_CHARACTERS", "ANOTHER_COLUMN", "YET_ANOTHER_COLUMN"]
        );
    }

    #[test]
    fn test_embedded_newline_is_removed() {
        assert_eq!(defaults().standardize("Total\nVentas"), "TOTALVENTAS");
        assert_eq!(defaults().standardize("Total \nVentas"), "TOTAL_VENTAS");
    }

    #[test]
    fn test_extra_punctuation() {
        assert_eq!(defaults().standardize("¿Año?"), "_ANO");
        assert_eq!(defaults().standardize("“Temp” °C"), "_TEMP_C");
    }

    #[test]
    fn test_empty_and_punctuation_only() {
        assert_eq!(defaults().standardize(""), "");
        assert_eq!(defaults().standardize("   "), "");
        assert_eq!(defaults().standardize("?!-"), "");
    }

    #[test]
    fn test_keep_punctuation() {
        let n = SqlNameNormalizer::new(NormalizeOptions {
            remove_punct: false,
            remove_accents: true,
        })
        .unwrap();
        assert_eq!(n.standardize("Costo (USD)"), "COSTO_(USD)");
    }

    #[test]
    fn test_keep_accents() {
        let n = SqlNameNormalizer::new(NormalizeOptions {
            remove_punct: true,
            remove_accents: false,
        })
        .unwrap();
        assert_eq!(n.standardize("Producción"), "PRODUCCIÓN");
    }

    #[test]
    fn test_fold_accents_decomposed_input() {
        assert_eq!(fold_accents("Cafe\u{0301}"), "Cafe");
        assert_eq!(fold_accents("Øre straße"), "Øre straße");
    }

    #[test]
    fn test_trailing_underscores_trimmed() {
        assert_eq!(defaults().standardize("Name?!"), "NAME");
        assert_eq!(defaults().standardize("a  -  b"), "A_B");
    }
}
