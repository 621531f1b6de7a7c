//! Group filter expressions.
//!
//! Grammar: comma-separated clauses; `*` matches any run of characters
//! (including none); a leading `!` negates a clause. Clauses are applied
//! left to right, so a name is selected iff the last clause matching it is
//! not negated. A name no clause matches is not selected.
//!
//! ```
//! use rateline_core::terminal::group::{exclusion_filter, GroupFilter};
//!
//! let expr = exclusion_filter(&["USD", "EUR"]);
//! assert_eq!(expr, "*,!*USD,!*EUR");
//!
//! let filter = GroupFilter::parse(&expr);
//! assert!(filter.matches("GBPJPY"));
//! assert!(!filter.matches("GBPUSD"));
//! ```

/// Token selecting every symbol.
pub const WILDCARD_ALL: &str = "*";

/// Clause separator.
pub const SEPARATOR: char = ',';

/// Negation prefix.
pub const NEGATION: char = '!';

/// Build "everything except names ending in each pattern".
///
/// The expression is `*` followed by one `!*<pattern>` clause per exclusion,
/// in the order given. Patterns are passed through verbatim.
pub fn exclusion_filter<S: AsRef<str>>(exclusions: &[S]) -> String {
    let mut expr = String::from(WILDCARD_ALL);
    for pattern in exclusions {
        expr.push(SEPARATOR);
        expr.push(NEGATION);
        expr.push_str(WILDCARD_ALL);
        expr.push_str(pattern.as_ref());
    }
    expr
}

/// One parsed clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub negated: bool,
    pub pattern: String,
}

/// A parsed group filter expression.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupFilter {
    clauses: Vec<Clause>,
}

impl GroupFilter {
    /// Parse an expression. Empty clauses are dropped; nothing else is rejected.
    pub fn parse(expr: &str) -> Self {
        let clauses = expr
            .split(SEPARATOR)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| match c.strip_prefix(NEGATION) {
                Some(rest) => Clause {
                    negated: true,
                    pattern: rest.to_string(),
                },
                None => Clause {
                    negated: false,
                    pattern: c.to_string(),
                },
            })
            .collect();
        Self { clauses }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Whether `name` is selected.
    pub fn matches(&self, name: &str) -> bool {
        self.clauses
            .iter()
            .rev()
            .find(|c| wildcard_match(&c.pattern, name))
            .is_some_and(|c| !c.negated)
    }
}

/// Case-sensitive glob match where `*` is the only metacharacter.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0usize, 0usize);
    // Position of the last `*` seen, and the text index it was tried at.
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && p[pi] == '*' {
            backtrack = Some((pi, ti));
            pi += 1;
        } else if pi < p.len() && p[pi] == t[ti] {
            pi += 1;
            ti += 1;
        } else if let Some((star, mark)) = backtrack {
            pi = star + 1;
            ti = mark + 1;
            backtrack = Some((star, mark + 1));
        } else {
            return false;
        }
    }

    p[pi..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_exclusions_is_wildcard_all() {
        let none: [&str; 0] = [];
        assert_eq!(exclusion_filter(&none), "*");
    }

    #[test]
    fn exclusions_keep_their_order() {
        assert_eq!(exclusion_filter(&["USD", "EUR"]), "*,!*USD,!*EUR");
        assert_eq!(exclusion_filter(&["EUR", "USD"]), "*,!*EUR,!*USD");
    }

    #[test]
    fn patterns_pass_through_verbatim() {
        let owned = vec!["US*".to_string(), "!".to_string()];
        assert_eq!(exclusion_filter(&owned), "*,!*US*,!*!");
    }

    #[test]
    fn parse_splits_and_negates() {
        let f = GroupFilter::parse("*, !*USD,,!EURGBP");
        assert_eq!(f.clauses().len(), 3);
        assert!(!f.clauses()[0].negated);
        assert_eq!(f.clauses()[1].pattern, "*USD");
        assert!(f.clauses()[2].negated);
    }

    #[test]
    fn wildcard_semantics() {
        assert!(wildcard_match("*", ""));
        assert!(wildcard_match("*", "EURUSD"));
        assert!(wildcard_match("*USD", "EURUSD"));
        assert!(!wildcard_match("*USD", "USDJPY"));
        assert!(wildcard_match("USD*", "USDJPY"));
        assert!(wildcard_match("*USD*", "XAUUSD.m"));
        assert!(wildcard_match("E*R*D", "EURUSD"));
        assert!(!wildcard_match("EURUSD", "eurusd"));
        assert!(wildcard_match("*A*A", "AAAA"));
    }

    #[test]
    fn last_matching_clause_wins() {
        let f = GroupFilter::parse("*,!*USD,EURUSD");
        assert!(f.matches("EURUSD"));
        assert!(!f.matches("GBPUSD"));
        assert!(f.matches("EURGBP"));
    }

    #[test]
    fn unmatched_names_are_not_selected() {
        let f = GroupFilter::parse("EUR*");
        assert!(f.matches("EURJPY"));
        assert!(!f.matches("GBPJPY"));
        assert!(!GroupFilter::parse("").matches("EURJPY"));
    }

    #[test]
    fn exclusion_only_expression_selects_nothing() {
        let f = GroupFilter::parse("!*USD");
        assert!(!f.matches("EURGBP"));
        assert!(!f.matches("EURUSD"));
    }
}
