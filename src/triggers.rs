use anyhow::{Context, Result};
use regex::Regex;

/// Which flow a slash command starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Post one GIF straight into the channel.
    Direct,
    /// Open an ephemeral shuffle session.
    Shuffle,
}

/// A slash-command trigger word, e.g. `gifshuffle` for `/gifshuffle cat nap`.
#[derive(Debug, Clone)]
pub struct Trigger {
    word: String,
    flow: Flow,
    pattern: Regex,
}

impl Trigger {
    pub fn new(word: &str, flow: Flow) -> Result<Self> {
        let word = word.trim().trim_start_matches('/').to_string();
        let pattern = Regex::new(&format!(r"^\s*/{}(\s+|$)", regex::escape(&word)))
            .with_context(|| format!("Unable to build a pattern for trigger `{word}`"))?;
        Ok(Self { word, flow, pattern })
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn flow(&self) -> Flow {
        self.flow
    }

    /// Does this raw command line start with our trigger?
    pub fn matches(&self, raw: &str) -> bool {
        self.pattern.is_match(raw)
    }

    /// Strip the trigger token and normalize whitespace. Text that does not
    /// start with the trigger is taken to be keywords already.
    pub fn keywords(&self, raw: &str) -> String {
        let rest = self.pattern.replace(raw, "");
        rest.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// The set of triggers we answer to.
#[derive(Debug, Clone)]
pub struct Triggers {
    triggers: Vec<Trigger>,
}

impl Triggers {
    pub fn new(direct: &str, shuffle: &str) -> Result<Self> {
        // Longest first, so `/gifshuffle` never gets claimed by `/gif`.
        let mut triggers = vec![
            Trigger::new(direct, Flow::Direct)?,
            Trigger::new(shuffle, Flow::Shuffle)?,
        ];
        triggers.sort_by(|a, b| b.word().len().cmp(&a.word().len()));
        Ok(Self { triggers })
    }

    pub fn find(&self, raw: &str) -> Option<&Trigger> {
        self.triggers.iter().find(|t| t.matches(raw))
    }

    pub fn word_for(&self, flow: Flow) -> &str {
        self.triggers
            .iter()
            .find(|t| t.flow() == flow)
            .map(Trigger::word)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_strip_the_trigger() {
        let trigger = Trigger::new("gifshuffle", Flow::Shuffle).unwrap();
        assert_eq!(trigger.keywords("/gifshuffle cat nap"), "cat nap");
        assert_eq!(trigger.keywords("  /gifshuffle   cat   nap  "), "cat nap");
        assert_eq!(trigger.keywords("/gifshuffle"), "");
        assert_eq!(trigger.keywords("cat nap"), "cat nap");
    }

    #[test]
    fn trigger_needs_a_word_boundary() {
        let trigger = Trigger::new("/gif", Flow::Direct).unwrap();
        assert_eq!(trigger.word(), "gif");
        assert!(trigger.matches("/gif cat"));
        assert!(trigger.matches("/gif"));
        assert!(!trigger.matches("/gifshuffle cat"));
        assert_eq!(trigger.keywords("/gifshuffle cat"), "/gifshuffle cat");
    }

    #[test]
    fn the_right_flow_wins() {
        let triggers = Triggers::new("gif", "gifshuffle").unwrap();
        assert_eq!(triggers.find("/gifshuffle cat nap").map(Trigger::flow), Some(Flow::Shuffle));
        assert_eq!(triggers.find("/gif cat nap").map(Trigger::flow), Some(Flow::Direct));
        assert!(triggers.find("/giphy cat nap").is_none());
        assert_eq!(triggers.word_for(Flow::Shuffle), "gifshuffle");
    }

    #[test]
    fn regex_characters_are_escaped() {
        let trigger = Trigger::new("g.f", Flow::Direct).unwrap();
        assert!(trigger.matches("/g.f cat"));
        assert!(!trigger.matches("/gif cat"));
    }
}
