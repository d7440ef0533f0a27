//! Team name resolution
//!
//! Box scores, standings and odds feeds spell team names differently
//! ("Kansas City Chiefs", "Chiefs", "KC", "Oakland Raiders" for the same
//! franchise as "Las Vegas Raiders"). Resolution runs in two passes against
//! a candidate list:
//!
//! 1. exact case-insensitive match
//! 2. substring match in either direction
//!
//! Both the query and each candidate are first mapped through the alias
//! table, so abbreviation-keyed records and relocated franchises land on the
//! same canonical name.

use std::collections::HashMap;

/// Current franchises: (canonical name, abbreviation)
const NFL_TEAMS: &[(&str, &str)] = &[
    ("Buffalo Bills", "BUF"),
    ("Miami Dolphins", "MIA"),
    ("New England Patriots", "NE"),
    ("New York Jets", "NYJ"),
    ("Baltimore Ravens", "BAL"),
    ("Cincinnati Bengals", "CIN"),
    ("Cleveland Browns", "CLE"),
    ("Pittsburgh Steelers", "PIT"),
    ("Houston Texans", "HOU"),
    ("Indianapolis Colts", "IND"),
    ("Jacksonville Jaguars", "JAX"),
    ("Tennessee Titans", "TEN"),
    ("Denver Broncos", "DEN"),
    ("Kansas City Chiefs", "KC"),
    ("Las Vegas Raiders", "LV"),
    ("Los Angeles Chargers", "LAC"),
    ("Dallas Cowboys", "DAL"),
    ("New York Giants", "NYG"),
    ("Philadelphia Eagles", "PHI"),
    ("Washington Commanders", "WAS"),
    ("Chicago Bears", "CHI"),
    ("Detroit Lions", "DET"),
    ("Green Bay Packers", "GB"),
    ("Minnesota Vikings", "MIN"),
    ("Atlanta Falcons", "ATL"),
    ("Carolina Panthers", "CAR"),
    ("New Orleans Saints", "NO"),
    ("Tampa Bay Buccaneers", "TB"),
    ("Arizona Cardinals", "ARI"),
    ("Los Angeles Rams", "LAR"),
    ("San Francisco 49ers", "SF"),
    ("Seattle Seahawks", "SEA"),
];

/// Historical names and alternate abbreviations: (alias, canonical name)
const NFL_ALIASES: &[(&str, &str)] = &[
    ("Oakland Raiders", "Las Vegas Raiders"),
    ("OAK", "Las Vegas Raiders"),
    ("San Diego Chargers", "Los Angeles Chargers"),
    ("SD", "Los Angeles Chargers"),
    ("St. Louis Rams", "Los Angeles Rams"),
    ("STL", "Los Angeles Rams"),
    ("LA", "Los Angeles Rams"),
    ("Washington Football Team", "Washington Commanders"),
    ("Washington Redskins", "Washington Commanders"),
    ("WSH", "Washington Commanders"),
    ("JAC", "Jacksonville Jaguars"),
    ("GNB", "Green Bay Packers"),
    ("KAN", "Kansas City Chiefs"),
    ("NWE", "New England Patriots"),
    ("NOR", "New Orleans Saints"),
    ("SFO", "San Francisco 49ers"),
    ("TAM", "Tampa Bay Buccaneers"),
    ("LVR", "Las Vegas Raiders"),
];

/// Two-pass team name resolver with an alias table
#[derive(Debug, Clone, Default)]
pub struct TeamResolver {
    /// Lowercased alias -> canonical name
    aliases: HashMap<String, String>,
}

impl TeamResolver {
    /// Resolver with no aliases (plain exact/substring matching)
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver preloaded with NFL abbreviations and relocated franchises
    pub fn nfl() -> Self {
        let mut resolver = TeamResolver::new();
        for (name, abbr) in NFL_TEAMS {
            resolver.insert_alias(abbr, name);
        }
        for (alias, name) in NFL_ALIASES {
            resolver.insert_alias(alias, name);
        }
        resolver
    }

    /// Add an alias mapping
    pub fn with_alias(mut self, alias: &str, canonical: &str) -> Self {
        self.insert_alias(alias, canonical);
        self
    }

    fn insert_alias(&mut self, alias: &str, canonical: &str) {
        self.aliases
            .insert(alias.trim().to_lowercase(), canonical.to_string());
    }

    /// Canonical lowercase form of a name after alias lookup
    pub fn canonical(&self, name: &str) -> String {
        let key = name.trim().to_lowercase();
        match self.aliases.get(&key) {
            Some(canonical) => canonical.to_lowercase(),
            None => key,
        }
    }

    /// Whether two spellings refer to the same team under exact matching
    pub fn same_team(&self, a: &str, b: &str) -> bool {
        self.canonical(a) == self.canonical(b)
    }

    /// Find the candidate whose name refers to `name`.
    ///
    /// Exact matches win over substring matches; within the substring pass the
    /// first candidate in order is returned.
    pub fn resolve<'a, T, F>(&self, name: &str, candidates: &'a [T], key: F) -> Option<&'a T>
    where
        F: Fn(&T) -> &str,
    {
        let target = self.canonical(name);
        if target.is_empty() {
            return None;
        }

        let keyed: Vec<(String, &T)> = candidates
            .iter()
            .map(|c| (self.canonical(key(c)), c))
            .filter(|(k, _)| !k.is_empty())
            .collect();

        if let Some((_, found)) = keyed.iter().find(|(k, _)| *k == target) {
            return Some(*found);
        }

        let found = keyed
            .iter()
            .find(|(k, _)| k.contains(&target) || target.contains(k.as_str()))
            .map(|(_, c)| *c);

        if let Some(c) = found {
            log::debug!("Resolved '{}' by substring to '{}'", name, key(c));
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec![
            "Kansas City Chiefs".to_string(),
            "Las Vegas Raiders".to_string(),
            "New York Jets".to_string(),
            "Washington Commanders".to_string(),
        ]
    }

    #[test]
    fn test_exact_case_insensitive() {
        let resolver = TeamResolver::new();
        let teams = names();
        let found = resolver.resolve("kansas city CHIEFS", &teams, |s| s.as_str());
        assert_eq!(found.map(String::as_str), Some("Kansas City Chiefs"));
    }

    #[test]
    fn test_substring_both_directions() {
        let resolver = TeamResolver::new();
        let teams = names();

        // query inside candidate
        let found = resolver.resolve("Jets", &teams, |s| s.as_str());
        assert_eq!(found.map(String::as_str), Some("New York Jets"));

        // candidate inside query
        let short = vec!["Chiefs".to_string()];
        let found = resolver.resolve("Kansas City Chiefs", &short, |s| s.as_str());
        assert_eq!(found.map(String::as_str), Some("Chiefs"));
    }

    #[test]
    fn test_exact_beats_substring() {
        let resolver = TeamResolver::new();
        let teams = vec!["New York Giants Legacy".to_string(), "Giants".to_string()];
        let found = resolver.resolve("Giants", &teams, |s| s.as_str());
        assert_eq!(found.map(String::as_str), Some("Giants"));
    }

    #[test]
    fn test_abbreviation_and_relocation_aliases() {
        let resolver = TeamResolver::nfl();
        let teams = names();

        let found = resolver.resolve("KC", &teams, |s| s.as_str());
        assert_eq!(found.map(String::as_str), Some("Kansas City Chiefs"));

        let found = resolver.resolve("Oakland Raiders", &teams, |s| s.as_str());
        assert_eq!(found.map(String::as_str), Some("Las Vegas Raiders"));

        let found = resolver.resolve("Washington Football Team", &teams, |s| s.as_str());
        assert_eq!(found.map(String::as_str), Some("Washington Commanders"));
    }

    #[test]
    fn test_abbreviation_keyed_candidates() {
        let resolver = TeamResolver::nfl();
        let keyed = vec!["NYJ".to_string(), "KC".to_string()];
        let found = resolver.resolve("Kansas City Chiefs", &keyed, |s| s.as_str());
        assert_eq!(found.map(String::as_str), Some("KC"));
        assert!(resolver.same_team("LV", "Oakland Raiders"));
    }

    #[test]
    fn test_unresolved_and_empty() {
        let resolver = TeamResolver::new();
        let teams = names();
        assert!(resolver.resolve("Packers", &teams, |s| s.as_str()).is_none());
        assert!(resolver.resolve("  ", &teams, |s| s.as_str()).is_none());

        let blank = vec![String::new()];
        assert!(resolver.resolve("Packers", &blank, |s| s.as_str()).is_none());
    }
}
