//! Turns a raw search term into an ordered list of fashion-biased candidate
//! queries for the photo provider. Earlier candidates are more specific and
//! are tried first.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

const LATIN_TEMPLATES: [&str; 3] = ["{t} fashion clothing", "{t} fashion style", "{t} outfit"];
const HANGUL_TEMPLATES: [&str; 4] = [
    "{t} 패션 fashion",
    "{t} 패션 스타일 fashion style",
    "{t} 코디 outfit",
    "{t} 패션",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryScript {
    Hangul,
    Latin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub raw: String,
    pub script: QueryScript,
}

impl SearchQuery {
    pub fn new(raw: &str) -> Self {
        SearchQuery {
            raw: raw.to_string(),
            script: detect_script(raw),
        }
    }

    pub fn candidates(&self) -> Vec<String> {
        let term = normalize_term(&self.raw);
        if term.is_empty() {
            return vec![self.raw.clone()];
        }

        let mut candidates: Vec<String> = match self.script {
            QueryScript::Hangul => HANGUL_TEMPLATES
                .iter()
                .map(|template| template.replace("{t}", &term))
                .collect(),
            QueryScript::Latin => {
                let mut list: Vec<String> = LATIN_TEMPLATES
                    .iter()
                    .map(|template| template.replace("{t}", &term))
                    .collect();
                if let Some((first_word, _)) = term.split_once(' ') {
                    list.push(format!("{first_word} fashion"));
                }
                list
            }
        };
        candidates.push(term);

        let mut unique = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if !unique.contains(&candidate) {
                unique.push(candidate);
            }
        }
        unique
    }
}

fn is_hangul(ch: char) -> bool {
    matches!(
        ch,
        '\u{1100}'..='\u{11FF}'
            | '\u{3130}'..='\u{318F}'
            | '\u{A960}'..='\u{A97F}'
            | '\u{AC00}'..='\u{D7A3}'
            | '\u{D7B0}'..='\u{D7FF}'
    )
}

pub fn detect_script(text: &str) -> QueryScript {
    if text.chars().any(is_hangul) {
        QueryScript::Hangul
    } else {
        QueryScript::Latin
    }
}

fn normalize_term(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

pub fn expand(raw: &str) -> Vec<String> {
    SearchQuery::new(raw).candidates()
}
