// 🔎 Member Patterns
// Shell-style globs for picking archive members, with `|` alternatives

use glob::{MatchOptions, Pattern, PatternError};

/// Glob with alternatives, e.g. `*.shp|*.dbf`.
///
/// `*` matches across `/` so that `*/data.csv` finds a file one directory
/// deep and `*.csv` finds CSV files at any depth.
#[derive(Debug, Clone)]
pub struct MemberPattern {
    source: String,
    alternatives: Vec<Pattern>,
}

const OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

impl MemberPattern {
    pub fn new(source: &str) -> Result<Self, PatternError> {
        let alternatives = source
            .split('|')
            .map(str::trim)
            .filter(|alt| !alt.is_empty())
            .map(Pattern::new)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MemberPattern {
            source: source.to_string(),
            alternatives,
        })
    }

    /// Pattern matching everything.
    pub fn any() -> Self {
        // "*" always compiles
        MemberPattern {
            source: "*".to_string(),
            alternatives: vec![Pattern::new("*").unwrap_or_default()],
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.alternatives
            .iter()
            .any(|p| p.matches_with(name, OPTIONS))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Display for MemberPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// Pick the single candidate matching `pattern`.
///
/// Names whose file part starts with `.` are never selected.
pub fn select_one<'a>(
    pattern: &MemberPattern,
    candidates: impl IntoIterator<Item = &'a str>,
) -> crate::Result<&'a str> {
    let matched: Vec<&str> = candidates
        .into_iter()
        .filter(|name| !is_hidden(name) && pattern.matches(name))
        .collect();

    match matched.as_slice() {
        [one] => Ok(one),
        [] => Err(crate::ImportError::NoMatchingMember {
            pattern: pattern.to_string(),
        }),
        many => Err(crate::ImportError::AmbiguousMember {
            pattern: pattern.to_string(),
            candidates: many.iter().map(|s| s.to_string()).collect(),
        }),
    }
}

fn is_hidden(name: &str) -> bool {
    name.rsplit('/')
        .next()
        .map(|file| file.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ImportError;

    #[test]
    fn test_alternatives() {
        let pattern = MemberPattern::new("*.shp|*.dbf").unwrap();

        assert!(pattern.matches("data.shp"));
        assert!(pattern.matches("data.dbf"));
        assert!(!pattern.matches("readme.txt"));
    }

    #[test]
    fn test_star_crosses_directories() {
        let pattern = MemberPattern::new("*/GeoLiteCity-Location.csv").unwrap();

        assert!(pattern.matches("GeoLiteCity_20130101/GeoLiteCity-Location.csv"));
        assert!(!pattern.matches("GeoLiteCity-Location.csv"));
        assert!(!pattern.matches("GeoLiteCity_20130101/GeoLiteCity-Blocks.csv"));
    }

    #[test]
    fn test_select_single_shapefile() {
        let extract = MemberPattern::new("*.shp|*.dbf").unwrap();
        let archive = ["data.shp", "data.dbf", "readme.txt"];
        let extracted: Vec<&str> = archive.iter().copied().filter(|n| extract.matches(n)).collect();

        let pattern = MemberPattern::new("*.shp").unwrap();
        let chosen = select_one(&pattern, extracted).unwrap();

        assert_eq!(chosen, "data.shp");
    }

    #[test]
    fn test_select_skips_hidden_files() {
        let pattern = MemberPattern::new("*.shp").unwrap();
        let chosen = select_one(&pattern, ["__MACOSX/.data.shp", "tz/data.shp"]).unwrap();

        assert_eq!(chosen, "tz/data.shp");
    }

    #[test]
    fn test_select_no_match_is_explicit() {
        let pattern = MemberPattern::new("*.shp").unwrap();
        let result = select_one(&pattern, ["readme.txt"]);

        assert!(matches!(result, Err(ImportError::NoMatchingMember { .. })));
    }

    #[test]
    fn test_select_ambiguous() {
        let pattern = MemberPattern::new("*.csv").unwrap();
        let result = select_one(&pattern, ["a.csv", "b.csv"]);

        match result {
            Err(ImportError::AmbiguousMember { candidates, .. }) => {
                assert_eq!(candidates, vec!["a.csv", "b.csv"]);
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_any_matches_everything() {
        let pattern = MemberPattern::any();
        assert!(pattern.matches("dir/file.bin"));
        assert_eq!(pattern.as_str(), "*");
    }
}
