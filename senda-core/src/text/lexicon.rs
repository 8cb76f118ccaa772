// File: senda-core/src/text/lexicon.rs
//
// Term lists and text normalization shared by the quality analyzer and the
// local toxicity fallback. All entries are stored pre-normalized: lowercase,
// accents stripped, ñ folded to n. Match against `fold_leet(&normalize(text))`.

/// Slurs and insults that reject a text outright.
pub const EXTREME_TERMS: &[&str] = &[
    "puta",
    "puto",
    "mierda",
    "hijueputa",
    "hijueputas",
    "malparido",
    "malparida",
    "gonorrea",
    "carechimba",
    "pirobo",
    "piroba",
    "verga",
    "cabron",
    "cabrona",
    "culero",
    "pendejo",
    "pendeja",
    "fuck",
    "fucking",
    "shit",
    "bitch",
    "asshole",
    "rape",
];

/// Offensive but milder vocabulary, and violence/drug references that make a
/// text suspicious without being an outright slur.
pub const MODERATE_TERMS: &[&str] = &[
    "idiota",
    "imbecil",
    "estupido",
    "estupida",
    "tarado",
    "tarada",
    "baboso",
    "babosa",
    "asqueroso",
    "asquerosa",
    "basura",
    "escoria",
    "maldito",
    "maldita",
    "arma",
    "armas",
    "matar",
    "droga",
    "drogas",
    "stupid",
    "idiot",
];

/// Commercial-spam vocabulary; two or more distinct hits flag the text.
pub const SPAM_TERMS: &[&str] = &[
    "vendo",
    "venta",
    "barato",
    "barata",
    "oferta",
    "ofertas",
    "descuento",
    "descuentos",
    "gratis",
    "promocion",
    "promociones",
    "rebaja",
    "cripto",
    "bitcoin",
    "casino",
    "apuesta",
    "apuestas",
    "premio",
    "ganaste",
    "sorteo",
    "inversion",
    "ganancias",
    "multinivel",
    "whatsapp",
    "telegram",
];

/// Multi-word threats and scam come-ons. Substring match on normalized text.
pub const PROHIBITED_PHRASES: &[&str] = &[
    "te voy a matar",
    "te voy a buscar",
    "te voy a encontrar",
    "gana dinero facil",
    "gana dinero rapido",
    "dinero facil",
    "link en bio",
    "compra ahora",
    "haz clic aqui",
    "haz click aqui",
    "trabaja desde casa",
    "envia un mensaje al",
];

/// Short words that count as valid even below the three-letter floor:
/// greetings, interjections and common tourism vocabulary.
pub const ALLOWED_EXPRESSIONS: &[&str] = &[
    "hola",
    "buenas",
    "gracias",
    "jaja",
    "jajaja",
    "jeje",
    "jiji",
    "ok",
    "vale",
    "si",
    "no",
    "wow",
    "uy",
    "eh",
    "ah",
    "oh",
    "va",
    "genial",
    "chevere",
    "bacano",
    "lindo",
    "linda",
    "bello",
    "bella",
    "mirador",
    "paisaje",
    "cascada",
    "sendero",
    "laguna",
    "montana",
    "pueblo",
    "finca",
];

/// Whole-text matches that bypass the external toxicity call entirely.
pub const TRIVIAL_GREETINGS: &[&str] = &[
    "hola",
    "buenas",
    "buenos dias",
    "buenas tardes",
    "buenas noches",
    "gracias",
    "muchas gracias",
    "mil gracias",
    "ok",
    "vale",
    "listo",
    "saludos",
    "de acuerdo",
    "perfecto",
    "genial",
    "excelente",
    "de nada",
    "con gusto",
];

/// Academic/administrative vocabulary; two or more distinct hits mark a
/// document as academic.
pub const ACADEMIC_TERMS: &[&str] = &[
    "universidad",
    "capitulo",
    "bibliografia",
    "resumen",
    "abstract",
    "introduccion",
    "conclusion",
    "conclusiones",
    "metodologia",
    "investigacion",
    "articulo",
    "revista",
    "facultad",
    "tesis",
    "profesor",
    "estudiante",
    "referencias",
    "analisis",
    "objetivo",
    "objetivos",
    "estudio",
    "semestre",
    "asignatura",
    "docente",
    "evaluacion",
    "informe",
];

/// Function words whose presence is a weak signal of real grammar.
pub const CONNECTIVE_WORDS: &[&str] = &[
    "de", "la", "el", "en", "y", "a", "los", "las", "del", "se", "que", "con", "por", "para",
    "un", "una", "unos", "unas", "es", "son", "al", "lo", "su", "sus", "o", "como", "mas",
    "pero", "este", "esta", "muy",
];

const KEYBOARD_ROWS: &[&str] = &["qwertyuiop", "asdfghjkl", "zxcvbnm"];

/// Lowercases, strips diacritics and collapses whitespace runs.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true;
    for c in text.chars() {
        let c = c.to_lowercase().next().unwrap_or(c);
        let c = fold_accent(c);
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out.trim_end().to_string()
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

/// Folds the common digit/symbol substitutions used to evade word filters.
pub fn fold_leet(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '0' => 'o',
            '1' | '!' => 'i',
            '3' => 'e',
            '4' | '@' => 'a',
            '5' | '$' => 's',
            '7' => 't',
            '8' => 'b',
            other => other,
        })
        .collect()
}

/// Alphanumeric word tokens of the given text.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Terms found in `text`: single words match whole tokens, phrases match as
/// substrings. `text` must already be normalized (and leet-folded for the
/// offensive lists).
pub fn find_terms<'a>(text: &str, terms: &[&'a str]) -> Vec<&'a str> {
    let tokens = tokenize(text);
    let mut found = Vec::new();
    for term in terms {
        let hit = if term.contains(' ') {
            text.contains(term)
        } else {
            tokens.iter().any(|t| t == term)
        };
        if hit && !found.contains(term) {
            found.push(*term);
        }
    }
    found
}

pub fn count_distinct_terms(text: &str, terms: &[&str]) -> usize {
    find_terms(text, terms).len()
}

pub fn is_academic_text(text: &str) -> bool {
    count_distinct_terms(&normalize(text), ACADEMIC_TERMS) >= 2
}

/// Whole-text greeting/acknowledgement check, tolerant of punctuation.
pub fn is_trivial_greeting(text: &str) -> bool {
    let normalized = normalize(text);
    let stripped: String = normalized
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    let stripped = stripped.trim();
    !stripped.is_empty() && TRIVIAL_GREETINGS.contains(&stripped)
}

pub fn is_allowed_expression(word: &str) -> bool {
    ALLOWED_EXPRESSIONS.contains(&word)
}

pub fn has_vowel(word: &str) -> bool {
    word.chars().any(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'))
}

/// A token reads as a real word: explicitly allowed, a function word, or
/// long enough and pronounceable. Pure digit tokens (years, counts) pass as
/// well.
pub fn is_plausible_word(word: &str) -> bool {
    if word.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    is_allowed_expression(word)
        || CONNECTIVE_WORDS.contains(&word)
        || (word.chars().count() >= 3 && has_vowel(word))
}

pub fn has_grammar_signal(tokens: &[&str]) -> bool {
    tokens.iter().any(|t| CONNECTIVE_WORDS.contains(t))
}

/// Word drawn entirely from one physical keyboard row, e.g. "asdfasdf".
pub fn is_keyboard_row_mash(word: &str) -> bool {
    if word.chars().count() < 5 {
        return false;
    }
    KEYBOARD_ROWS
        .iter()
        .any(|row| word.chars().all(|c| row.contains(c)))
}

pub fn contains_url(text: &str) -> bool {
    let lower = text.to_lowercase();
    if lower.contains("http://") || lower.contains("https://") {
        return true;
    }
    lower.split_whitespace().any(|t| {
        t.starts_with("www.")
            || t.contains(".com")
            || t.contains(".net")
            || t.contains(".org")
            || t.contains(".info")
            || t.contains(".xyz")
    })
}

pub fn contains_email(text: &str) -> bool {
    for token in text.split_whitespace() {
        if let Some(at) = token.find('@') {
            let (local, rest) = token.split_at(at);
            let domain = &rest[1..];
            if !local.is_empty()
                && domain.contains('.')
                && domain.chars().next().is_some_and(|c| c.is_alphanumeric())
            {
                return true;
            }
        }
    }
    false
}

/// Seven or more digits in a row, allowing common phone separators between
/// them.
pub fn contains_phone(text: &str) -> bool {
    let mut run = 0usize;
    for c in text.chars() {
        if c.is_ascii_digit() {
            run += 1;
            if run >= 7 {
                return true;
            }
        } else if matches!(c, ' ' | '-' | '.' | '(' | ')' | '+') {
            // separators keep the run alive
        } else {
            run = 0;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_accents_and_collapses_whitespace() {
        assert_eq!(normalize("  Camino   al  Páramo  "), "camino al paramo");
        assert_eq!(normalize("Montaña"), "montana");
    }

    #[test]
    fn leet_folding_exposes_disguised_insults() {
        let folded = fold_leet(&normalize("h1juepu7a"));
        assert_eq!(find_terms(&folded, EXTREME_TERMS), vec!["hijueputa"]);
    }

    #[test]
    fn single_word_terms_do_not_match_inside_other_words() {
        // "computadora" contains "puta" as a substring but is a real word
        let folded = fold_leet(&normalize("mi computadora nueva"));
        assert!(find_terms(&folded, EXTREME_TERMS).is_empty());
    }

    #[test]
    fn phrases_match_as_substrings() {
        let folded = fold_leet(&normalize("oye, te voy a matar si vuelves"));
        assert_eq!(find_terms(&folded, PROHIBITED_PHRASES), vec!["te voy a matar"]);
    }

    #[test]
    fn trivial_greetings_tolerate_punctuation() {
        assert!(is_trivial_greeting("¡Hola!"));
        assert!(is_trivial_greeting("muchas gracias"));
        assert!(!is_trivial_greeting("hola, quiero vender bitcoin"));
    }

    #[test]
    fn academic_text_needs_two_distinct_terms() {
        assert!(is_academic_text(
            "Capítulo 3 de la tesis presentada a la universidad"
        ));
        assert!(!is_academic_text("visita la universidad del pueblo"));
    }

    #[test]
    fn contact_patterns_are_detected() {
        assert!(contains_url("mira www.ofertas-ya.com"));
        assert!(contains_url("https://sitio.co/promo"));
        assert!(contains_email("escribeme a juan.perez@correo.com"));
        assert!(contains_phone("llámame al 310 456 7890"));
        assert!(!contains_phone("llegamos en 2023 y volvimos en 2024"));
    }

    #[test]
    fn keyboard_row_mash_detection() {
        assert!(is_keyboard_row_mash("asdfgasdfg"));
        assert!(!is_keyboard_row_mash("paisaje"));
    }
}
