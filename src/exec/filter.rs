// src/exec/filter.rs

use regex::Regex;

/// Predicate selecting backend output lines worth echoing to the console.
///
/// A line is echoed when any pattern matches anywhere in it. An empty
/// filter echoes nothing.
#[derive(Debug, Clone, Default)]
pub struct EchoFilter {
    patterns: Vec<Regex>,
}

impl EchoFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn matches(&self, line: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(line))
    }
}
