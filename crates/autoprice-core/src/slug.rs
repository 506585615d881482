//! Brand/model URL tokens. The two listing sites normalize names differently
//! and the rules are not interchangeable.

/// Source A token: `brand:model`, lower-cased, whitespace runs inside each
/// segment collapsed to `-`. Accented characters are kept as-is.
///
/// `("Mercedes Benz", "Clase  A")` → `"mercedes-benz:clase-a"`.
#[must_use]
pub fn classifieds_make_model(brand: &str, model: &str) -> String {
    let segment = |s: &str| {
        s.to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
    };
    format!("{}:{}", segment(brand), segment(model))
}

/// Source B slug: every word of brand then model joined with `-`, with
/// diacritics folded to their base letter and anything other than ASCII
/// alphanumerics and `-` dropped.
///
/// `("Citroën", "C3 Aircross")` → `"citroen-c3-aircross"`.
#[must_use]
pub fn tabular_slug(brand: &str, model: &str) -> String {
    format!("{brand} {model}")
        .chars()
        .map(fold_diacritic)
        .collect::<String>()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else if c.is_whitespace() {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|&c| c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Folds Latin-1 / Latin Extended-A accented letters to their base letter.
fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'ā' => 'a',
        'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' | 'Ā' => 'A',
        'é' | 'è' | 'ê' | 'ë' | 'ē' | 'ě' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' | 'Ē' | 'Ě' => 'E',
        'í' | 'ì' | 'î' | 'ï' | 'ī' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' | 'Ī' => 'I',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'ø' | 'ō' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' | 'Ø' | 'Ō' => 'O',
        'ú' | 'ù' | 'û' | 'ü' | 'ū' | 'ů' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' | 'Ū' | 'Ů' => 'U',
        'ñ' | 'ń' | 'ň' => 'n',
        'Ñ' | 'Ń' | 'Ň' => 'N',
        'ç' | 'ć' | 'č' => 'c',
        'Ç' | 'Ć' | 'Č' => 'C',
        'š' | 'ś' => 's',
        'Š' | 'Ś' => 'S',
        'ž' | 'ź' | 'ż' => 'z',
        'Ž' | 'Ź' | 'Ż' => 'Z',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        'ř' => 'r',
        'Ř' => 'R',
        _ => c,
    }
}
