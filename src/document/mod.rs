use std::collections::BTreeSet;

use crate::identity;

pub mod blocks;
pub mod frontmatter;
pub mod highlight;
pub mod layout;
pub mod synchronizer;

#[cfg(test)]
mod synchronizer_tests;

pub use blocks::EntryBlock;
pub use frontmatter::Frontmatter;
pub use synchronizer::{
    DocumentTotals,
    SyncOutcome,
};

pub const SECTION_VOCABULARY: &str = "Vocabulary";
pub const SECTION_SENTENCES: &str = "Sentences";
pub const SECTION_REVIEW: &str = "Review";
pub const SECTION_MASTERED_VOCABULARY: &str = "Mastered Vocabulary";
pub const SECTION_MASTERED_SENTENCES: &str = "Mastered Sentences";

pub const OVERVIEW_PREFIX: &str = "**Overview:**";

const HEADING_PREFIX: &str = "## ";

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Entry(EntryBlock),
    /// Anything the engine does not understand is carried verbatim.
    Opaque(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub nodes: Vec<Node>,
}

impl Section {
    pub fn new(title: &str) -> Self {
        Self { title: title.to_string(), nodes: Vec::new() }
    }

    pub fn entries(&self) -> impl Iterator<Item = &EntryBlock> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Entry(block) => Some(block),
            Node::Opaque(_) => None,
        })
    }

    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut EntryBlock> {
        self.nodes.iter_mut().filter_map(|node| match node {
            Node::Entry(block) => Some(block),
            Node::Opaque(_) => None,
        })
    }

    pub fn entry_ids(&self) -> Vec<String> {
        self.entries().filter_map(|e| e.id().map(str::to_string)).collect()
    }

    pub fn push_entry(&mut self, block: EntryBlock) {
        self.nodes.push(Node::Entry(block));
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// In-memory form of one date-partitioned review document. Parsing is
/// line-prefix classification, not a grammar; the format is narrow and
/// self-produced, and anything unrecognized survives as opaque lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub frontmatter: Frontmatter,
    pub preamble: Vec<String>,
    pub sections: Vec<Section>,
}

impl Document {
    pub fn parse(text: &str) -> Self {
        let lines: Vec<&str> = text.lines().collect();
        let (frontmatter, mut i) = Frontmatter::parse(&lines);

        let mut doc = Document { frontmatter, ..Default::default() };
        let mut current: Option<Section> = None;

        while i < lines.len() {
            let line = lines[i];

            if let Some(title) = line.strip_prefix(HEADING_PREFIX) {
                if let Some(section) = current.take() {
                    doc.sections.push(section);
                }
                current = Some(Section::new(title.trim()));
                i += 1;
                continue;
            }

            match current.as_mut() {
                None => {
                    doc.preamble.push(line.to_string());
                    i += 1;
                }
                Some(section) => {
                    if line.trim().is_empty() {
                        i += 1;
                    } else if blocks::is_checklist_line(line) {
                        let mut block = EntryBlock::new(line);
                        i += 1;
                        while i < lines.len()
                            && blocks::is_detail_line(lines[i])
                        {
                            block.details.push(lines[i].to_string());
                            i += 1;
                        }
                        section.push_entry(block);
                    } else {
                        let mut group = Vec::new();
                        while i < lines.len()
                            && !lines[i].starts_with(HEADING_PREFIX)
                            && !blocks::is_checklist_line(lines[i])
                        {
                            group.push(lines[i].to_string());
                            i += 1;
                        }
                        while group.last().map(|l| l.trim().is_empty()).unwrap_or(false) {
                            group.pop();
                        }
                        if !group.is_empty() {
                            section.nodes.push(Node::Opaque(group));
                        }
                    }
                }
            }
        }
        if let Some(section) = current.take() {
            doc.sections.push(section);
        }

        trim_blank_edges(&mut doc.preamble);
        doc
    }

    pub fn render(&self) -> String {
        let mut out: Vec<String> = Vec::new();

        if !self.frontmatter.is_empty() {
            out.push("---".to_string());
            out.extend(self.frontmatter.lines.iter().cloned());
            out.push("---".to_string());
        }

        if !self.preamble.is_empty() {
            if !out.is_empty() {
                out.push(String::new());
            }
            out.extend(self.preamble.iter().cloned());
        }

        for section in &self.sections {
            if !out.is_empty() {
                out.push(String::new());
            }
            out.push(format!("{}{}", HEADING_PREFIX, section.title));
            for (n, node) in section.nodes.iter().enumerate() {
                match node {
                    Node::Entry(block) => {
                        out.push(block.head.clone());
                        out.extend(block.details.iter().cloned());
                    }
                    Node::Opaque(lines) => {
                        if n > 0 {
                            out.push(String::new());
                        }
                        out.extend(lines.iter().cloned());
                    }
                }
            }
        }

        let mut text = out.join("\n");
        text.push('\n');
        text
    }

    pub fn position(&self, title: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.title == title)
    }

    pub fn section(&self, title: &str) -> Option<&Section> {
        self.position(title).map(|i| &self.sections[i])
    }

    pub fn section_mut(&mut self, title: &str) -> Option<&mut Section> {
        self.position(title).map(move |i| &mut self.sections[i])
    }

    pub fn remove_section(&mut self, title: &str) -> Option<Section> {
        self.position(title).map(|i| self.sections.remove(i))
    }

    pub fn all_ids(&self) -> BTreeSet<String> {
        identity::extract_ids(&self.render()).into_iter().collect()
    }

    /// Strip every Overview line, wherever the user moved or copied it.
    pub fn remove_overview_lines(&mut self) {
        self.preamble.retain(|line| !line.trim_start().starts_with(OVERVIEW_PREFIX));
        trim_blank_edges(&mut self.preamble);
        for section in &mut self.sections {
            for node in &mut section.nodes {
                if let Node::Opaque(lines) = node {
                    lines.retain(|line| !line.trim_start().starts_with(OVERVIEW_PREFIX));
                }
            }
            section.nodes.retain(|node| match node {
                Node::Opaque(lines) => !lines.is_empty(),
                Node::Entry(_) => true,
            });
        }
    }

    /// Reinsert the single Overview line immediately after frontmatter.
    pub fn set_overview(&mut self, line: String) {
        if self.preamble.is_empty() {
            self.preamble.push(line);
        } else {
            self.preamble.insert(0, line);
            self.preamble.insert(1, String::new());
        }
    }
}

fn trim_blank_edges(lines: &mut Vec<String>) {
    while lines.first().map(|l| l.trim().is_empty()).unwrap_or(false) {
        lines.remove(0);
    }
    while lines.last().map(|l| l.trim().is_empty()).unwrap_or(false) {
        lines.pop();
    }
}
