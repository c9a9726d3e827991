//! Entity extraction from free-text messages
//!
//! Pure functions over static tables: detects country mentions (standalone
//! alpha-3 codes, full names, aliases) and topic tags. Mention order is
//! preserved because downstream focus resolution is first-mention-priority.

use crate::countries;
use crate::models::Topic;

/// Common English words that collide with valid alpha-3 codes
const CODE_STOPLIST: &[&str] = &[
    "THE", "AND", "FOR", "ARE", "CAN", "NOT", "YOU", "HAS", "HIM", "HER", "ITS", "OUR", "WHO",
    "ALL", "ANY", "GET", "SET", "USE", "WAY", "HOW", "NOW", "DAY", "NEW", "OLD", "TRY", "TWO",
    "MAY", "SAY", "SEE", "ASK", "LET", "PUT", "END", "TOO", "OWN", "RUN", "OUT", "OFF", "GOT",
    "DID", "BIG", "TOP", "LOW", "ADD", "AGO", "AIR",
];

/// Alias phrases resolving to country codes
const COUNTRY_ALIASES: &[(&str, &str)] = &[
    ("uk", "GBR"),
    ("united kingdom", "GBR"),
    ("britain", "GBR"),
    ("england", "GBR"),
    ("usa", "USA"),
    ("u.s", "USA"),
    ("u.s.a", "USA"),
    ("united states", "USA"),
    ("america", "USA"),
    ("uae", "ARE"),
    ("emirates", "ARE"),
    ("dubai", "ARE"),
    ("nz", "NZL"),
    ("new zealand", "NZL"),
];

/// Topic keyword table; phrases are matched at word boundaries
const TOPIC_KEYWORDS: &[(Topic, &[&str])] = &[
    (
        Topic::Overview,
        &["overview", "about", "general", "info", "information"],
    ),
    (
        Topic::Work,
        &[
            "work",
            "job",
            "employment",
            "career",
            "skilled",
            "professional",
            "h1b",
            "blue card",
            "working",
        ],
    ),
    (
        Topic::Study,
        &[
            "study",
            "student",
            "education",
            "university",
            "college",
            "school",
            "degree",
            "studying",
        ],
    ),
    (
        Topic::Family,
        &[
            "family",
            "spouse",
            "partner",
            "marriage",
            "reunification",
            "dependent",
        ],
    ),
    (
        Topic::Citizenship,
        &[
            "citizen",
            "citizenship",
            "naturalization",
            "passport",
            "permanent resident",
            "pr",
        ],
    ),
    (Topic::Visas, &["visa", "visas", "permit", "entry"]),
];

/// Result of extracting entities from a single message
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Country codes in first-mention order, de-duplicated
    pub countries: Vec<String>,
    /// Matched topics; never empty (defaults to overview/work/study)
    pub topics: Vec<Topic>,
}

/// Extract countries and topics from a message
pub fn extract(message: &str) -> Extraction {
    Extraction {
        countries: extract_countries(message),
        topics: extract_topics(message),
    }
}

/// Extract country codes mentioned in a message, in first-mention order
pub fn extract_countries(message: &str) -> Vec<String> {
    let lowered = message.to_lowercase();
    let mut hits: Vec<(usize, String)> = Vec::new();

    // Pass 1: standalone three-letter codes
    for (pos, token) in three_letter_tokens(&lowered) {
        let code = token.to_uppercase();
        if CODE_STOPLIST.contains(&code.as_str()) {
            continue;
        }
        if countries::is_known_code(&code) {
            hits.push((pos, code));
        }
    }

    // Pass 2: full country names; every mentioned country is collected,
    // not just the first one found
    for entry in countries::all() {
        if let Some(pos) = find_word(&lowered, &entry.name.to_lowercase()) {
            hits.push((pos, entry.code.clone()));
        }
    }

    // Pass 3: aliases
    for (alias, code) in COUNTRY_ALIASES {
        if let Some(pos) = find_word(&lowered, alias) {
            hits.push((pos, (*code).to_string()));
        }
    }

    // First mention wins; stable sort keeps pass order for equal positions
    hits.sort_by_key(|(pos, _)| *pos);
    let mut countries = Vec::new();
    for (_, code) in hits {
        if !countries.contains(&code) {
            countries.push(code);
        }
    }
    countries
}

/// Extract topic tags from a message
pub fn extract_topics(message: &str) -> Vec<Topic> {
    let lowered = message.to_lowercase();
    let mut topics = Vec::new();

    for (topic, keywords) in TOPIC_KEYWORDS {
        let matched = keywords.iter().any(|keyword| match *keyword {
            // "pr" is a residency abbreviation only when not part of "work pr..."
            "pr" => find_word_not_preceded_by(&lowered, "pr", "work ").is_some(),
            keyword => find_word(&lowered, keyword).is_some(),
        });
        if matched {
            topics.push(*topic);
        }
    }

    if topics.is_empty() {
        topics = vec![Topic::Overview, Topic::Work, Topic::Study];
    }
    topics
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Find the first word-boundary occurrence of `needle` in `haystack`.
///
/// `needle` may be a multi-word phrase; boundaries are only enforced at its
/// edges, so "canada" does not match inside "canadian".
fn find_word(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    for (start, _) in haystack.match_indices(needle) {
        let before_ok = haystack[..start].chars().next_back().map_or(true, |c| !is_word_char(c));
        let after_ok = haystack[start + needle.len()..]
            .chars()
            .next()
            .map_or(true, |c| !is_word_char(c));
        if before_ok && after_ok {
            return Some(start);
        }
    }
    None
}

/// Like [`find_word`] but skips matches directly preceded by `prefix`
fn find_word_not_preceded_by(haystack: &str, needle: &str, prefix: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    for (start, _) in haystack.match_indices(needle) {
        let before_ok = haystack[..start].chars().next_back().map_or(true, |c| !is_word_char(c));
        let after_ok = haystack[start + needle.len()..]
            .chars()
            .next()
            .map_or(true, |c| !is_word_char(c));
        if before_ok && after_ok && !haystack[..start].ends_with(prefix) {
            return Some(start);
        }
    }
    None
}

/// Standalone tokens of exactly three alphabetic characters, with positions
fn three_letter_tokens(haystack: &str) -> Vec<(usize, &str)> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (idx, c) in haystack.char_indices() {
        if is_word_char(c) {
            if start.is_none() {
                start = Some(idx);
            }
        } else if let Some(s) = start.take() {
            push_if_code_shaped(haystack, s, idx, &mut tokens);
        }
    }
    if let Some(s) = start {
        push_if_code_shaped(haystack, s, haystack.len(), &mut tokens);
    }
    tokens
}

fn push_if_code_shaped<'a>(
    haystack: &'a str,
    start: usize,
    end: usize,
    tokens: &mut Vec<(usize, &'a str)>,
) {
    let token = &haystack[start..end];
    if token.chars().count() == 3 && token.chars().all(char::is_alphabetic) {
        tokens.push((start, token));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_detection() {
        assert_eq!(extract_countries("I want to move to Canada"), vec!["CAN"]);
        assert_eq!(extract_countries("Is Germany a good option?"), vec!["DEU"]);
    }

    #[test]
    fn test_substring_is_not_a_mention() {
        // "Canadian" must not match "Canada"
        assert!(extract_countries("I met a Canadian engineer").is_empty());
        // "american" must not match the "america" alias
        assert!(extract_countries("She has an american accent").is_empty());
    }

    #[test]
    fn test_code_detection_with_stoplist() {
        // "are" and "for" collide with valid codes but are stoplisted;
        // "USA" itself is detected
        assert_eq!(
            extract_countries("What are the visa requirements for USA?"),
            vec!["USA"]
        );
    }

    #[test]
    fn test_mention_order_is_preserved() {
        assert_eq!(
            extract_countries("Compare Canada and Australia for immigration"),
            vec!["CAN", "AUS"]
        );
        assert_eq!(
            extract_countries("Compare Australia and Canada for immigration"),
            vec!["AUS", "CAN"]
        );
    }

    #[test]
    fn test_alias_detection() {
        assert_eq!(extract_countries("Tell me about working in the UK"), vec!["GBR"]);
        assert_eq!(extract_countries("Thinking of Dubai next year"), vec!["ARE"]);
        assert_eq!(extract_countries("Is NZ easier than Australia?"), vec!["NZL", "AUS"]);
    }

    #[test]
    fn test_duplicate_mentions_collapse() {
        // Name and alias both resolve to GBR; reported once
        assert_eq!(
            extract_countries("The United Kingdom... is the UK expensive?"),
            vec!["GBR"]
        );
    }

    #[test]
    fn test_no_country_detected() {
        assert!(extract_countries("How do I write a good resume?").is_empty());
    }

    #[test]
    fn test_topic_detection() {
        assert_eq!(
            extract_topics("How to get a work visa?"),
            vec![Topic::Work, Topic::Visas]
        );
        assert_eq!(extract_topics("Student visa requirements"), vec![Topic::Study, Topic::Visas]);
        assert_eq!(
            extract_topics("Family reunification process"),
            vec![Topic::Family]
        );
    }

    #[test]
    fn test_topic_default_set() {
        assert_eq!(
            extract_topics("Hello there!"),
            vec![Topic::Overview, Topic::Work, Topic::Study]
        );
    }

    #[test]
    fn test_pr_abbreviation() {
        assert!(extract_topics("How long until PR?").contains(&Topic::Citizenship));
        // "work pr..." is a work-permit phrase, not permanent residency
        assert!(!extract_topics("Do I need a work pr permit?").contains(&Topic::Citizenship));
    }

    #[test]
    fn test_multiple_topics_kept() {
        let topics = extract_topics("Can my spouse study while I work on an h1b visa?");
        assert!(topics.contains(&Topic::Work));
        assert!(topics.contains(&Topic::Study));
        assert!(topics.contains(&Topic::Family));
        assert!(topics.contains(&Topic::Visas));
    }

    #[test]
    fn test_extract_combines_both() {
        let extraction = extract("What are the visa requirements for USA?");
        assert_eq!(extraction.countries, vec!["USA"]);
        assert!(extraction.topics.contains(&Topic::Visas));
    }
}
