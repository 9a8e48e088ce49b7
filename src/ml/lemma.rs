// ============================================================
// Layer 5 — Rule-Based Lemmatizer
// ============================================================
// Reduces an (already lower-cased) English word to its base
// noun form so "movies", "movie" and "Movie" share one feature.
//
// Lookup order:
//   1. words of 3 characters or fewer are left alone
//   2. irregular plurals ("children" → "child")
//   3. words that merely end in "s" ("always", "series")
//   4. suffix rules, most specific first:
//        sses → ss     (classes  → class)
//        ies  → y      (stories  → story)
//        xes  → x      (boxes    → box)
//        ches → ch     (watches  → watch)
//        shes → sh     (dishes   → dish)
//        men  → man    (firemen  → fireman)
//        s    → ""     (films    → film)
//      "ss", "us" and "is" endings are not plurals.
//
// There is no dictionary behind this, so some rare words come
// out slightly wrong; the same word always maps to the same
// form, which is all the vectorizer needs.

const IRREGULAR: &[(&str, &str)] = &[
    ("children", "child"),
    ("women",    "woman"),
    ("people",   "person"),
    ("feet",     "foot"),
    ("teeth",    "tooth"),
    ("geese",    "goose"),
    ("mice",     "mouse"),
    ("oxen",     "ox"),
    ("wives",    "wife"),
    ("knives",   "knife"),
    ("lives",    "life"),
    ("leaves",   "leaf"),
    ("wolves",   "wolf"),
    ("halves",   "half"),
    ("shelves",  "shelf"),
    ("thieves",  "thief"),
    ("heroes",   "hero"),
    ("potatoes", "potato"),
    ("tomatoes", "tomato"),
    ("criteria", "criterion"),
    ("phenomena", "phenomenon"),
];

// Plural "-ies" words whose singular ends in "-ie", not "-y"
const IE_PLURALS: &[&str] = &[
    "movies", "cookies", "zombies", "rookies", "calories", "brownies",
    "hippies", "goalies", "selfies", "aunties", "smoothies", "freebies",
    "sweeties", "boogies", "newbies", "pixies", "ties", "lies", "pies",
    "dies",
];

// Words ending in "s" that are not plurals
const NOT_PLURAL: &[&str] = &[
    "always", "perhaps", "sometimes", "afterwards", "towards", "whereas",
    "nevertheless", "besides", "news", "series", "species", "physics",
    "mathematics", "politics", "economics", "lens", "yes", "was", "has",
    "does", "his", "hers", "its", "ours", "yours", "theirs", "this",
    "thus", "plus", "unless", "across", "whereabouts",
    "nowadays", "overseas", "indoors", "outdoors", "downstairs", "upstairs",
    "gas", "bias", "atlas", "canvas", "chaos", "kudos", "pathos", "ethos",
];

pub fn lemmatize(word: &str) -> String {
    if word.chars().count() <= 3 {
        return word.to_string();
    }

    if let Some((_, base)) = IRREGULAR.iter().find(|(plural, _)| *plural == word) {
        return (*base).to_string();
    }

    if NOT_PLURAL.contains(&word) {
        return word.to_string();
    }

    if IE_PLURALS.contains(&word) {
        return word[..word.len() - 1].to_string();
    }

    if let Some(stem) = word.strip_suffix("sses") {
        return format!("{stem}ss");
    }
    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{stem}y");
    }
    for suffix in ["xes", "ches", "shes"] {
        if let Some(stem) = word.strip_suffix(suffix) {
            // keep the consonant cluster, drop "es"
            return format!("{stem}{}", &suffix[..suffix.len() - 2]);
        }
    }
    if let Some(stem) = word.strip_suffix("men") {
        return format!("{stem}man");
    }

    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }

    match word.strip_suffix('s') {
        Some(stem) if !stem.ends_with('\'') => stem.to_string(),
        _ => word.to_string(),
    }
}
