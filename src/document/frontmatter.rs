/// The YAML-like frontmatter block. Only `key: value` lines the engine owns
/// are ever touched; unrecognized keys pass through untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    pub lines: Vec<String>,
}

impl Frontmatter {
    /// Returns the parsed frontmatter plus the index of the first body line.
    pub fn parse(lines: &[&str]) -> (Self, usize) {
        if lines.first().map(|l| l.trim()) != Some("---") {
            return (Self::default(), 0);
        }
        for (i, line) in lines.iter().enumerate().skip(1) {
            if line.trim() == "---" {
                let inner = lines[1..i].iter().map(|l| l.to_string()).collect();
                return (Self { lines: inner }, i + 1);
            }
        }
        // unterminated fence: treat the whole thing as body
        (Self::default(), 0)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn key_position(&self, key: &str) -> Option<usize> {
        let prefix = format!("{}:", key);
        self.lines.iter().position(|l| l.trim_start().starts_with(&prefix))
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let position = self.key_position(key)?;
        let line = &self.lines[position];
        let value = line.splitn(2, ':').nth(1).unwrap_or("").trim();
        Some(value.to_string())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        let line = format!("{}: {}", key, value);
        match self.key_position(key) {
            Some(position) => self.lines[position] = line,
            None => self.lines.push(line),
        }
    }

    /// Merge tag lists rather than overwrite: existing tags keep their order,
    /// missing defaults are appended.
    pub fn merge_tags(&mut self, tags: &[String]) {
        let mut merged: Vec<String> = self
            .get("tags")
            .map(|raw| {
                raw.trim_start_matches('[')
                    .trim_end_matches(']')
                    .split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        for tag in tags {
            if !merged.iter().any(|t| t == tag) {
                merged.push(tag.clone());
            }
        }

        self.set("tags", &format!("[{}]", merged.join(", ")));
    }

    /// Ensure the keys the engine owns exist; never clobber user values.
    pub fn upsert(&mut self, date: &str, source: &str, tags: &[String]) {
        if self.get("date").is_none() {
            self.set("date", date);
        }
        if self.get("source").is_none() {
            self.set("source", source);
        }
        self.merge_tags(tags);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn parses_fenced_block() {
        let lines = vec!["---", "date: 2026-02-09", "custom: kept", "---", "body"];
        let (fm, next) = Frontmatter::parse(&lines);
        assert_eq!(next, 4);
        assert_eq!(fm.get("date").as_deref(), Some("2026-02-09"));
        assert_eq!(fm.get("custom").as_deref(), Some("kept"));
        assert_eq!(fm.get("missing"), None);
    }

    #[test]
    fn unterminated_fence_is_body() {
        let lines = vec!["---", "not frontmatter"];
        let (fm, next) = Frontmatter::parse(&lines);
        assert!(fm.is_empty());
        assert_eq!(next, 0);
    }

    #[test]
    fn upsert_preserves_user_values_and_unknown_keys() {
        let lines = vec!["---", "date: 2025-12-31", "mood: tired", "---"];
        let (mut fm, _) = Frontmatter::parse(&lines);
        fm.upsert("2026-02-09", "imported", &tags(&["english", "review"]));

        assert_eq!(fm.get("date").as_deref(), Some("2025-12-31"));
        assert_eq!(fm.get("mood").as_deref(), Some("tired"));
        assert_eq!(fm.get("source").as_deref(), Some("imported"));
        assert_eq!(fm.get("tags").as_deref(), Some("[english, review]"));
    }

    #[test]
    fn merge_tags_unions_not_overwrites() {
        let mut fm = Frontmatter::default();
        fm.set("tags", "[personal, english]");
        fm.merge_tags(&tags(&["english", "review"]));
        assert_eq!(fm.get("tags").as_deref(), Some("[personal, english, review]"));
    }
}
