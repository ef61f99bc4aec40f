//! ISO 639-2 language codes as carried by Blu-ray stream descriptors.
//!
//! Discs store a three-letter code per stream, sometimes in the terminology
//! (T) form (`deu`) and sometimes in the bibliographic (B) form (`ger`).
//! Output always prefers the B form.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Code printed for streams whose language is not known.
pub const UNDETERMINED: &str = "und";

/// Terminology to bibliographic pairs, sorted by the T code.
const T_TO_B: &[(&str, &str)] = &[
    ("bod", "tib"),
    ("ces", "cze"),
    ("cym", "wel"),
    ("deu", "ger"),
    ("ell", "gre"),
    ("eus", "baq"),
    ("fas", "per"),
    ("fra", "fre"),
    ("hye", "arm"),
    ("isl", "ice"),
    ("kat", "geo"),
    ("mkd", "mac"),
    ("mri", "mao"),
    ("msa", "may"),
    ("mya", "bur"),
    ("nld", "dut"),
    ("ron", "rum"),
    ("slk", "slo"),
    ("sqi", "alb"),
    ("zho", "chi"),
];

/// Bibliographic codes of individual languages and macrolanguages, sorted.
/// Collective codes are left out.
const KNOWN_B: &[&str] = &[
    "aar", "abk", "ace", "ach", "ada", "ady", "afh", "afr", "ain", "aka",
    "akk", "alb", "ale", "alt", "amh", "ang", "anp", "ara", "arc", "arg",
    "arm", "arn", "arp", "arw", "asm", "ast", "ava", "ave", "awa", "aym",
    "aze", "bak", "bal", "bam", "ban", "baq", "bas", "bej", "bel", "bem",
    "ben", "bho", "bik", "bin", "bis", "bla", "bos", "bra", "bre", "bua",
    "bug", "bul", "bur", "byn", "cad", "car", "cat", "ceb", "cha", "chb",
    "che", "chg", "chi", "chk", "chm", "chn", "cho", "chp", "chr", "chu",
    "chv", "chy", "cnr", "cop", "cor", "cos", "cre", "crh", "csb", "cze",
    "dak", "dan", "dar", "del", "den", "dgr", "din", "div", "doi", "dsb",
    "dua", "dum", "dut", "dyu", "dzo", "efi", "egy", "eka", "elx", "eng",
    "enm", "epo", "est", "ewe", "ewo", "fan", "fao", "fat", "fij", "fil",
    "fin", "fon", "fre", "frm", "fro", "frr", "frs", "fry", "ful", "fur",
    "gaa", "gay", "gba", "geo", "ger", "gez", "gil", "gla", "gle", "glg",
    "glv", "gmh", "goh", "gon", "gor", "got", "grb", "grc", "gre", "grn",
    "gsw", "guj", "gwi", "hai", "hat", "hau", "haw", "heb", "her", "hil",
    "hin", "hit", "hmn", "hmo", "hrv", "hsb", "hun", "hup", "iba", "ibo",
    "ice", "ido", "iii", "iku", "ile", "ilo", "ina", "ind", "inh", "ipk",
    "ita", "jav", "jbo", "jpn", "jpr", "jrb", "kaa", "kab", "kac", "kal",
    "kam", "kan", "kas", "kau", "kaw", "kaz", "kbd", "kha", "khm", "kho",
    "kik", "kin", "kir", "kmb", "kok", "kom", "kon", "kor", "kos", "kpe",
    "krc", "krl", "kru", "kua", "kum", "kur", "kut", "lad", "lah", "lam",
    "lao", "lat", "lav", "lez", "lim", "lin", "lit", "lol", "loz", "ltz",
    "lua", "lub", "lug", "lui", "lun", "luo", "lus", "mac", "mad", "mag",
    "mah", "mai", "mak", "mal", "man", "mao", "mar", "mas", "may", "mdf",
    "mdr", "men", "mga", "mic", "min", "mlg", "mlt", "mnc", "mni", "moh",
    "mon", "mos", "mus", "mwl", "mwr", "myv", "nap", "nau", "nav", "nbl",
    "nde", "ndo", "nds", "nep", "new", "nia", "niu", "nno", "nob", "nog",
    "non", "nor", "nqo", "nso", "nwc", "nya", "nym", "nyn", "nyo", "nzi",
    "oci", "oji", "ori", "orm", "osa", "oss", "ota", "pag", "pal", "pam",
    "pan", "pap", "pau", "peo", "per", "phn", "pli", "pol", "pon", "por",
    "pro", "pus", "que", "raj", "rap", "rar", "roh", "rom", "rum", "run",
    "rup", "rus", "sad", "sag", "sah", "sam", "san", "sas", "sat", "scn",
    "sco", "sel", "sga", "shn", "sid", "sin", "slo", "slv", "sma", "sme",
    "smj", "smn", "smo", "sms", "sna", "snd", "snk", "sog", "som", "sot",
    "spa", "srd", "srn", "srp", "srr", "ssw", "suk", "sun", "sus", "sux",
    "swa", "swe", "syc", "syr", "tah", "tam", "tat", "tel", "tem", "ter",
    "tet", "tgk", "tgl", "tha", "tib", "tig", "tir", "tiv", "tkl", "tlh",
    "tli", "tmh", "tog", "ton", "tpi", "tsi", "tsn", "tso", "tuk", "tum",
    "tur", "tvl", "twi", "tyv", "udm", "uga", "uig", "ukr", "umb", "und",
    "urd", "uzb", "vai", "ven", "vie", "vol", "vot", "wal", "war", "was",
    "wel", "wln", "wol", "xal", "xho", "yao", "yap", "yid", "yor", "zap",
    "zbl", "zen", "zgh", "zha", "zul", "zun", "zza",
];

/// A language code of at most four bytes. Empty means undetermined.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode {
    bytes: [u8; 4],
    len: u8,
}

impl LanguageCode {
    /// The undetermined (empty) code.
    pub const UNDETERMINED: Self = Self {
        bytes: [0; 4],
        len: 0,
    };

    /// Parse a code of up to four ASCII bytes. A trailing NUL terminator, as
    /// found in raw descriptor buffers, ends the code early.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.split('\0').next().unwrap_or_default();
        if s.len() > 4 || !s.is_ascii() {
            return Err(Error::Validation(format!("invalid language code: {s:?}")));
        }
        let mut bytes = [0u8; 4];
        bytes[..s.len()].copy_from_slice(s.as_bytes());
        Ok(Self {
            bytes,
            len: s.len() as u8,
        })
    }

    /// Whether no language is recorded.
    pub fn is_undetermined(&self) -> bool {
        self.len == 0
    }

    /// The raw code; empty when undetermined.
    pub fn as_str(&self) -> &str {
        // Only ever built from ASCII.
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or_default()
    }

    /// The code in its preferred (bibliographic) form, or `und`.
    pub fn preferred(&self) -> &str {
        if self.is_undetermined() {
            UNDETERMINED
        } else {
            preferred_iso6392(self.as_str())
        }
    }
}

impl fmt::Debug for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LanguageCode({:?})", self.as_str())
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.preferred())
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.as_str().to_string()
    }
}

/// Map a terminology code to its bibliographic twin; other codes pass through.
pub fn preferred_iso6392(lang: &str) -> &str {
    match T_TO_B.binary_search_by(|(t, _)| (*t).cmp(lang)) {
        Ok(i) => T_TO_B[i].1,
        Err(_) => lang,
    }
}

/// The other spelling of a code that has distinct T and B forms.
pub fn iso6392_twin(lang: &str) -> Option<&'static str> {
    T_TO_B.iter().find_map(|&(t, b)| {
        if t == lang {
            Some(b)
        } else if b == lang {
            Some(t)
        } else {
            None
        }
    })
}

/// Whether `lang` is an ISO 639-2 code, in either form.
pub fn iso6392_known(lang: &str) -> bool {
    KNOWN_B.binary_search(&preferred_iso6392(lang)).is_ok()
}

/// Expand a user language list into every code that should match it: each
/// entry plus its T/B twin, duplicates removed, order preserved.
///
/// Codes that are not ISO 639-2 are skipped with a warning.
pub fn expand_language_list<S: AsRef<str>>(langs: &[S]) -> Result<Vec<LanguageCode>> {
    let mut out: Vec<LanguageCode> = Vec::with_capacity(langs.len() * 2);
    for lang in langs {
        let lang = lang.as_ref().trim();
        if lang.is_empty() {
            continue;
        }
        if !iso6392_known(lang) {
            tracing::warn!(language = lang, "Unknown ISO 639-2 language requested, skipping");
            continue;
        }
        let code = LanguageCode::parse(lang)?;
        if !out.contains(&code) {
            out.push(code);
        }
        if let Some(twin) = iso6392_twin(lang) {
            let twin = LanguageCode::parse(twin)?;
            if !out.contains(&twin) {
                out.push(twin);
            }
        }
    }
    Ok(out)
}
