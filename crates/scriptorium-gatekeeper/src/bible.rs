//! Canonical biblical book abbreviations and reference grammar
//!
//! References are normalized to the Portuguese canonical form used in the
//! extraction prompts: `[n]Book chapter[:verse[-verse]]`, e.g. `1Co 2:2`.
//! Alias lookup works on a folded key (lowercase, no diacritics, no dots or
//! spaces), except that an exact canonical spelling always wins, so `Jó`
//! stays Job while `Jo` and `jo` resolve to John.

use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// One book of the canon
struct Book {
    canonical: &'static str,
    /// Highest allowed numeric prefix (0 for unnumbered books)
    max_number: u8,
    aliases: &'static [&'static str],
}

const BOOKS: &[Book] = &[
    book("Gn", 0, &["genesis", "gen", "ge", "gn"]),
    book("Ex", 0, &["exodo", "exodus", "exo", "exod", "ex"]),
    book("Lv", 0, &["levitico", "leviticus", "lev", "lv"]),
    book("Nm", 0, &["numeros", "numbers", "num", "nu", "nm"]),
    book("Dt", 0, &["deuteronomio", "deuteronomy", "deut", "deu", "dt"]),
    book("Js", 0, &["josue", "joshua", "josh", "jos", "js"]),
    book("Jz", 0, &["juizes", "judges", "judg", "jdg", "jz"]),
    book("Rt", 0, &["rute", "ruth", "rth", "rt"]),
    book("Sm", 2, &["samuel", "sam", "sa", "sm"]),
    book("Rs", 2, &["reis", "rei", "kings", "kgs", "ki", "rs"]),
    book("Cr", 2, &["cronicas", "chronicles", "chron", "chr", "ch", "cr"]),
    book("Ed", 0, &["esdras", "ezra", "ezr", "esd", "ed"]),
    book("Ne", 0, &["neemias", "nehemiah", "neh", "ne"]),
    book("Et", 0, &["ester", "esther", "esth", "est", "et"]),
    book("Jó", 0, &["job", "jb"]),
    book("Sl", 0, &["salmos", "salmo", "psalms", "psalm", "psa", "ps", "sal", "sl"]),
    book("Pv", 0, &["proverbios", "proverbs", "prov", "pro", "prv", "pr", "pv"]),
    book("Ec", 0, &["eclesiastes", "ecclesiastes", "eccl", "ecc", "ecl", "qo", "ec"]),
    book(
        "Ct",
        0,
        &[
            "canticos",
            "canticodoscanticos",
            "cantares",
            "songofsongs",
            "songofsolomon",
            "song",
            "cant",
            "ss",
            "ct",
        ],
    ),
    book("Is", 0, &["isaias", "isaiah", "isa", "is"]),
    book("Jr", 0, &["jeremias", "jeremiah", "jer", "jr"]),
    book("Lm", 0, &["lamentacoes", "lamentations", "lam", "lm"]),
    book("Ez", 0, &["ezequiel", "ezekiel", "ezek", "eze", "ez"]),
    book("Dn", 0, &["daniel", "dan", "dn"]),
    book("Os", 0, &["oseias", "hosea", "hos", "os"]),
    book("Jl", 0, &["joel", "jl"]),
    book("Am", 0, &["amos", "am"]),
    book("Ob", 0, &["obadias", "obadiah", "obad", "abdias", "ob"]),
    book("Jn", 0, &["jonas", "jonah", "jon", "jn"]),
    book("Mq", 0, &["miqueias", "micah", "mic", "mq"]),
    book("Na", 0, &["naum", "nahum", "nah", "na"]),
    book("Hc", 0, &["habacuque", "habakkuk", "hab", "hc"]),
    book("Sf", 0, &["sofonias", "zephaniah", "zeph", "zep", "sf"]),
    book("Ag", 0, &["ageu", "haggai", "hag", "ag"]),
    book("Zc", 0, &["zacarias", "zechariah", "zech", "zec", "zc"]),
    book("Ml", 0, &["malaquias", "malachi", "mal", "ml"]),
    book("Mt", 0, &["mateus", "matthew", "matt", "mat", "mt"]),
    book("Mc", 0, &["marcos", "mark", "mrk", "mk", "mc"]),
    book("Lc", 0, &["lucas", "luke", "luk", "lk", "lc"]),
    book("Jo", 0, &["joao", "john", "jhn", "jo"]),
    book("At", 0, &["atos", "acts", "act", "at"]),
    book("Rm", 0, &["romanos", "romans", "rom", "ro", "rm"]),
    book("Co", 2, &["corintios", "corinthians", "cor", "co"]),
    book("Gl", 0, &["galatas", "galatians", "gal", "gl"]),
    book("Ef", 0, &["efesios", "ephesians", "eph", "ef"]),
    book("Fp", 0, &["filipenses", "philippians", "phil", "php", "fl", "fp"]),
    book("Cl", 0, &["colossenses", "colossians", "col", "cl"]),
    book("Ts", 2, &["tessalonicenses", "thessalonians", "thess", "th", "ts"]),
    book("Tm", 2, &["timoteo", "timothy", "tim", "ti", "tm"]),
    book("Tt", 0, &["tito", "titus", "tit", "tt"]),
    book("Fm", 0, &["filemom", "filemon", "philemon", "phlm", "phm", "flm", "fm"]),
    book("Hb", 0, &["hebreus", "hebrews", "heb", "hb"]),
    book("Tg", 0, &["tiago", "james", "jas", "tg"]),
    book("Pe", 2, &["pedro", "peter", "pet", "pt", "pe"]),
    book("Jo", 3, &["joao", "john", "jhn", "jn", "jo"]),
    book("Jd", 0, &["judas", "jude", "jud", "jd"]),
    book("Ap", 0, &["apocalipse", "revelation", "rev", "apoc", "re", "ap"]),
];

const fn book(canonical: &'static str, max_number: u8, aliases: &'static [&'static str]) -> Book {
    Book {
        canonical,
        max_number,
        aliases,
    }
}

/// (numeric prefix, folded alias) -> index into BOOKS
static ALIASES: LazyLock<HashMap<(u8, String), usize>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    for (index, book) in BOOKS.iter().enumerate() {
        let numbers = if book.max_number == 0 {
            0..=0
        } else {
            1..=book.max_number
        };
        for number in numbers {
            for alias in book.aliases {
                map.entry((number, (*alias).to_string())).or_insert(index);
            }
        }
    }
    map
});

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:([1-3])\s*|(I{1,3})\s+)?(\p{L}[\p{L}.\s]*?)\.?\s*(\d{1,3})(?:\s*[:.,]\s*(\d{1,3})(?:\s*[-–—]\s*(\d{1,3}))?)?$",
    )
    .expect("valid regex")
});

/// A parsed biblical reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibleRef {
    /// Canonical book abbreviation including its numeric prefix
    pub book: String,
    /// Chapter number
    pub chapter: u16,
    /// First verse, if any
    pub verse: Option<u16>,
    /// Last verse of a range
    pub verse_end: Option<u16>,
}

impl BibleRef {
    /// Whether the reference names a verse and not just a chapter
    pub fn has_verse(&self) -> bool {
        self.verse.is_some()
    }
}

impl fmt::Display for BibleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.book, self.chapter)?;
        if let Some(verse) = self.verse {
            write!(f, ":{}", verse)?;
        }
        if let Some(end) = self.verse_end {
            write!(f, "-{}", end)?;
        }
        Ok(())
    }
}

/// Parse a reference against the canonical grammar
///
/// Returns `None` when the book is unknown or the shape does not match.
pub fn parse(reference: &str) -> Option<BibleRef> {
    let caps = REFERENCE.captures(reference.trim())?;

    let number = match (caps.get(1), caps.get(2)) {
        (Some(digit), _) => digit.as_str().parse::<u8>().ok()?,
        (None, Some(roman)) => roman.as_str().len() as u8,
        (None, None) => 0,
    };
    let name = caps.get(3)?.as_str();
    let index = lookup(number, name)?;
    let book = &BOOKS[index];

    let chapter = caps.get(4)?.as_str().parse::<u16>().ok()?;
    let verse = match caps.get(5) {
        Some(v) => Some(v.as_str().parse::<u16>().ok()?),
        None => None,
    };
    let verse_end = match caps.get(6) {
        Some(v) => Some(v.as_str().parse::<u16>().ok()?),
        None => None,
    };
    if chapter == 0 || verse == Some(0) {
        return None;
    }
    if let (Some(start), Some(end)) = (verse, verse_end) {
        if end <= start {
            return None;
        }
    }

    let book = if number == 0 {
        book.canonical.to_string()
    } else {
        format!("{}{}", number, book.canonical)
    };
    Some(BibleRef {
        book,
        chapter,
        verse,
        verse_end,
    })
}

/// Normalize a reference, or `None` if it does not parse
pub fn normalize(reference: &str) -> Option<String> {
    parse(reference).map(|r| r.to_string())
}

fn lookup(number: u8, name: &str) -> Option<usize> {
    // Exact canonical spelling first: folding erases the Jó/Jo distinction
    let trimmed = name.trim().trim_end_matches('.');
    let exact = BOOKS.iter().position(|b| {
        b.canonical.to_lowercase() == trimmed.to_lowercase()
            && (if number == 0 {
                b.max_number == 0
            } else {
                number <= b.max_number
            })
    });
    if exact.is_some() {
        return exact;
    }
    ALIASES.get(&(number, fold(name))).copied()
}

fn fold(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}
