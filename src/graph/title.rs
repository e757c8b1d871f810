//! Game title normalization
//!
//! Titles starting with the article "The" are stored with the article moved
//! to the end: "The Witcher 3" is stored as "Witcher 3, The".

use regex::Regex;
use std::sync::OnceLock;

/// Moves a leading "The " to the end of a title
///
/// The moved article is always written "The", whatever its case in the
/// input. Titles already in stored form are returned unchanged.
///
/// # Examples
///
/// ```
/// use nextlevelbot::graph::title::normalize_title;
///
/// assert_eq!(normalize_title("The Witcher 3"), "Witcher 3, The");
/// assert_eq!(normalize_title("Witcher 3, The"), "Witcher 3, The");
/// assert_eq!(normalize_title("the Witcher 3"), "Witcher 3, The");
/// assert_eq!(normalize_title("Hades"), "Hades");
/// ```
pub fn normalize_title(title: &str) -> String {
    match strip_article(title) {
        Some(rest) => format!("{}, The", rest),
        None => title.trim().to_string(),
    }
}

/// The title without its leading "The ", if it has one
fn strip_article(title: &str) -> Option<&str> {
    let trimmed = title.trim();
    match trimmed.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("the ") => {
            Some(trimmed[4..].trim_start()).filter(|rest| !rest.is_empty())
        }
        _ => None,
    }
}

/// Whether two titles name the same game after normalization
pub fn titles_match(a: &str, b: &str) -> bool {
    normalize_title(a).eq_ignore_ascii_case(&normalize_title(b))
}

fn title_literal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // `title: 'The X'`, `g.title = 'The X'`, `g.title CONTAINS 'The X'` and
        // `g.title STARTS WITH 'The X'`; either side may sit in toLower/toUpper
        Regex::new(
            r#"(?i)(?P<lead>(?P<wrap>\bto(?:lower|upper))?\s*\(?\s*(?:\w+\s*\.\s*)?\btitle\s*\)?\s*(?P<op>:|=|CONTAINS|STARTS\s+WITH)\s*(?P<fold>to(?:lower|upper)\s*\(\s*)?)(?P<open>["'])(?P<title>the\s+[^"']+)(?P<close>["'])"#,
        )
        .expect("Invalid title pattern")
    })
}

/// Rewrites title literals in a Cypher query to the stored form
///
/// Equality predicates get the full stored form. `CONTAINS` and
/// `STARTS WITH` drop the leading article, which matches the stored title
/// either way. When only the property is case-folded the literal is folded
/// the same way.
///
/// # Examples
///
/// ```
/// use nextlevelbot::graph::title::rewrite_title_literals;
///
/// let query = r#"MATCH (g:Game {title: "The Witcher 3"}) RETURN g.price"#;
/// assert_eq!(
///     rewrite_title_literals(query),
///     r#"MATCH (g:Game {title: "Witcher 3, The"}) RETURN g.price"#
/// );
/// ```
pub fn rewrite_title_literals(query: &str) -> String {
    title_literal_pattern()
        .replace_all(query, |caps: &regex::Captures<'_>| {
            let title = &caps["title"];
            let op = caps["op"].to_ascii_lowercase();
            let mut literal = if op == ":" || op == "=" {
                normalize_title(title)
            } else {
                strip_article(title).unwrap_or(title).to_string()
            };

            if caps.name("fold").is_none() {
                match caps.name("wrap").map(|m| m.as_str().to_ascii_lowercase()) {
                    Some(f) if f == "tolower" => literal = literal.to_lowercase(),
                    Some(_) => literal = literal.to_uppercase(),
                    None => {}
                }
            }

            format!("{}{}{}{}", &caps["lead"], &caps["open"], literal, &caps["close"])
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_title_moves_article() {
        assert_eq!(normalize_title("The Witcher 3"), "Witcher 3, The");
        assert_eq!(normalize_title("  The Sims 4 "), "Sims 4, The");
    }

    #[test]
    fn test_normalize_title_leaves_other_titles() {
        assert_eq!(normalize_title("Theatrhythm"), "Theatrhythm");
        assert_eq!(normalize_title("The"), "The");
        assert_eq!(normalize_title("Stardew Valley"), "Stardew Valley");
    }

    #[test]
    fn test_titles_match_both_forms() {
        assert!(titles_match("The Witcher 3", "Witcher 3, The"));
        assert!(titles_match("the witcher 3", "Witcher 3, The"));
        assert!(!titles_match("The Witcher 2", "Witcher 3, The"));
    }

    #[test]
    fn test_rewrite_where_predicate() {
        let query = "MATCH (g:Game) WHERE g.title = 'The Witcher 3' RETURN g.app_id";
        assert_eq!(
            rewrite_title_literals(query),
            "MATCH (g:Game) WHERE g.title = 'Witcher 3, The' RETURN g.app_id"
        );
    }

    #[test]
    fn test_normalize_title_always_capitalizes_article() {
        assert_eq!(normalize_title("the Witcher 3"), "Witcher 3, The");
        assert_eq!(normalize_title("THE Witcher 3"), "Witcher 3, The");
    }

    #[test]
    fn test_rewrite_lowercase_article_in_map() {
        let query = "MATCH (g:Game {title: 'the Witcher 3'}) RETURN g.price";
        assert_eq!(
            rewrite_title_literals(query),
            "MATCH (g:Game {title: 'Witcher 3, The'}) RETURN g.price"
        );
    }

    #[test]
    fn test_rewrite_contains_and_starts_with() {
        assert_eq!(
            rewrite_title_literals("MATCH (g:Game) WHERE g.title CONTAINS 'The Witcher 3' RETURN g.title"),
            "MATCH (g:Game) WHERE g.title CONTAINS 'Witcher 3' RETURN g.title"
        );
        assert_eq!(
            rewrite_title_literals("MATCH (g:Game) WHERE g.title STARTS WITH \"The Witcher\" RETURN g.title"),
            "MATCH (g:Game) WHERE g.title STARTS WITH \"Witcher\" RETURN g.title"
        );
    }

    #[test]
    fn test_rewrite_case_folded_comparisons() {
        assert_eq!(
            rewrite_title_literals(
                "MATCH (g:Game) WHERE toLower(g.title) = toLower('The Witcher 3') RETURN g.app_id"
            ),
            "MATCH (g:Game) WHERE toLower(g.title) = toLower('Witcher 3, The') RETURN g.app_id"
        );
        assert_eq!(
            rewrite_title_literals("MATCH (g:Game) WHERE toLower(g.title) = 'the witcher 3' RETURN g.app_id"),
            "MATCH (g:Game) WHERE toLower(g.title) = 'witcher 3, the' RETURN g.app_id"
        );
        assert_eq!(
            rewrite_title_literals(
                "MATCH (g:Game) WHERE toLower(g.title) CONTAINS 'the witcher' RETURN g.app_id"
            ),
            "MATCH (g:Game) WHERE toLower(g.title) CONTAINS 'witcher' RETURN g.app_id"
        );
    }

    #[test]
    fn test_rewrite_leaves_other_properties() {
        let query = r#"MATCH (t:Tag {name: "The Best"}) RETURN t.name"#;
        assert_eq!(rewrite_title_literals(query), query);
    }
}
