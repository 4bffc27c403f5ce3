//! Corpus data model.
//!
//! A corpus is a list of numbered sections, each an ordered run of verses.
//! Every verse carries the page it is printed on, so windows over the corpus
//! (a whole part, a single page) are expressed by filtering verses by page.
//! All of these values are immutable once loaded; a new view produces a new
//! [`Document`] rather than mutating the old one.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Section ordinal, `1..=114` in the bundled corpus.
pub type SectionId = u16;

/// Ordinal of a verse within its section, starting at 1.
pub type VerseNumber = u16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footnote {
    pub id: u32,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    #[serde(rename = "numberInSurah")]
    pub number: VerseNumber,
    /// Locator of the recitation clip (URL or file path).
    #[serde(default)]
    pub audio: String,
    pub page: u32,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub translation: String,
    #[serde(default)]
    pub footnotes: Vec<Footnote>,
}

/// Descriptor of a section as listed in the corpus index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionInfo {
    pub number: SectionId,
    #[serde(rename = "transliteration")]
    pub name: String,
    #[serde(rename = "nameArabic", default)]
    pub native_name: String,
    #[serde(rename = "versesCount", default)]
    pub verse_count: usize,
}

/// Descriptor of a part: a contiguous page range starting at `start_page`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartInfo {
    pub number: u16,
    pub start_page: u32,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub info: SectionInfo,
    pub verses: Vec<Verse>,
}

impl Section {
    pub fn number(&self) -> SectionId {
        self.info.number
    }

    pub fn verse(&self, number: VerseNumber) -> Option<&Verse> {
        self.verses.iter().find(|verse| verse.number == number)
    }

    pub fn first_position(&self) -> Option<Position> {
        self.verses
            .first()
            .map(|verse| Position::new(self.number(), verse.number))
    }

    /// Copy of this section keeping only verses whose page satisfies `keep`.
    /// Returns `None` when no verse qualifies.
    pub fn restricted(&self, keep: impl Fn(u32) -> bool) -> Option<Section> {
        let verses: Vec<Verse> = self
            .verses
            .iter()
            .filter(|verse| keep(verse.page))
            .cloned()
            .collect();
        if verses.is_empty() {
            return None;
        }
        Some(Section {
            info: self.info.clone(),
            verses,
        })
    }
}

/// Kind of view a document was assembled for, as used by bookmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewType {
    Section,
    Part,
    Page,
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ViewType::Section => "section",
            ViewType::Part => "part",
            ViewType::Page => "page",
        };
        write!(f, "{label}")
    }
}

/// The window a [`Document`] covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "view", content = "id", rename_all = "kebab-case")]
pub enum ViewMode {
    WholeSection(SectionId),
    WholePart(u16),
    SinglePage(u32),
}

impl ViewMode {
    pub fn view_type(self) -> ViewType {
        match self {
            ViewMode::WholeSection(_) => ViewType::Section,
            ViewMode::WholePart(_) => ViewType::Part,
            ViewMode::SinglePage(_) => ViewType::Page,
        }
    }

    pub fn identifier(self) -> u32 {
        match self {
            ViewMode::WholeSection(id) => u32::from(id),
            ViewMode::WholePart(id) => u32::from(id),
            ViewMode::SinglePage(page) => page,
        }
    }

    /// Rebuild a view mode from a bookmark's `(view_type, identifier)` pair.
    pub fn from_parts(view_type: ViewType, identifier: u32) -> Option<Self> {
        match view_type {
            ViewType::Section => u16::try_from(identifier).ok().map(ViewMode::WholeSection),
            ViewType::Part => u16::try_from(identifier).ok().map(ViewMode::WholePart),
            ViewType::Page => Some(ViewMode::SinglePage(identifier)),
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.view_type(), self.identifier())
    }
}

/// `(section, verse)` pair naming the verse targeted for playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub section: SectionId,
    pub verse: VerseNumber,
}

impl Position {
    pub const fn new(section: SectionId, verse: VerseNumber) -> Self {
        Self { section, verse }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.section, self.verse)
    }
}

/// Assembled window of sections the playback controller operates over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    mode: ViewMode,
    sections: Vec<Section>,
}

impl Document {
    /// Sections without verses are dropped; order is kept as given.
    pub fn new(mode: ViewMode, sections: Vec<Section>) -> Self {
        let sections = sections
            .into_iter()
            .filter(|section| !section.verses.is_empty())
            .collect();
        Self { mode, sections }
    }

    pub fn empty(mode: ViewMode) -> Self {
        Self {
            mode,
            sections: Vec::new(),
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn verse_count(&self) -> usize {
        self.sections.iter().map(|section| section.verses.len()).sum()
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|section| section.number() == id)
    }

    pub fn verse(&self, position: Position) -> Option<&Verse> {
        self.section(position.section)?.verse(position.verse)
    }

    pub fn contains(&self, position: Position) -> bool {
        self.verse(position).is_some()
    }

    pub fn first_position(&self) -> Option<Position> {
        self.sections.first().and_then(Section::first_position)
    }

    pub fn first_verse(&self) -> Option<&Verse> {
        self.sections.first().and_then(|section| section.verses.first())
    }

    /// Every position in document order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.sections.iter().flat_map(|section| {
            section
                .verses
                .iter()
                .map(move |verse| Position::new(section.number(), verse.number))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::section;

    #[test]
    fn document_drops_sections_without_verses() {
        let mut hollow = section(3, &[1]);
        hollow.verses.clear();
        let doc = Document::new(ViewMode::WholePart(1), vec![section(2, &[1, 1]), hollow]);

        assert_eq!(doc.sections().len(), 1);
        assert_eq!(doc.verse_count(), 2);
        assert_eq!(doc.first_position(), Some(Position::new(2, 1)));
    }

    #[test]
    fn restricted_keeps_only_matching_pages() {
        let source = section(2, &[2, 2, 3, 3, 4]);
        let window = source.restricted(|page| page == 3).map(|s| s.verses);
        let numbers: Vec<u16> = window.unwrap_or_default().iter().map(|v| v.number).collect();
        assert_eq!(numbers, vec![3, 4]);
        assert!(source.restricted(|page| page == 9).is_none());
    }

    #[test]
    fn view_mode_round_trips_through_bookmark_key() {
        for mode in [
            ViewMode::WholeSection(18),
            ViewMode::WholePart(30),
            ViewMode::SinglePage(604),
        ] {
            assert_eq!(
                ViewMode::from_parts(mode.view_type(), mode.identifier()),
                Some(mode)
            );
        }
        assert_eq!(ViewMode::from_parts(ViewType::Section, 70_000), None);
    }

    #[test]
    fn verse_deserializes_from_corpus_json() {
        let verse: Verse = serde_json::from_str(
            r#"{"numberInSurah": 3, "audio": "a.mp3", "page": 1, "text": "t",
                "translation": "x [1]", "footnotes": [{"id": 1, "note": "n"}]}"#,
        )
        .expect("verse json should parse");
        assert_eq!(verse.number, 3);
        assert_eq!(verse.footnotes.len(), 1);
    }
}
