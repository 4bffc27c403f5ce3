//! Content loading.
//!
//! [`ContentSource`] resolves a section id to its full verse list and exposes
//! the corpus index (section descriptors, part start pages, last page). The
//! JSON implementation reads the on-disk layout of the bundled corpus and
//! memoises sections after their first successful load.

use crate::model::{PartInfo, Section, SectionId, SectionInfo, Verse};
use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Last printed page of the bundled corpus.
pub const DEFAULT_MAX_PAGE: u32 = 604;

const SECTION_LIST_FILE: &str = "surah-list.json";
const PART_INDEX_FILE: &str = "juz_index.json";
const SECTION_DIR: &str = "surahs";

/// Capability the document assembler needs from storage.
pub trait ContentSource {
    fn index(&self) -> &CorpusIndex;

    /// Load one section with all of its verses.
    fn resolve_section(&self, id: SectionId) -> Result<Section>;
}

impl<T: ContentSource + ?Sized> ContentSource for &T {
    fn index(&self) -> &CorpusIndex {
        (**self).index()
    }

    fn resolve_section(&self, id: SectionId) -> Result<Section> {
        (**self).resolve_section(id)
    }
}

/// Corpus-wide metadata, available without loading any section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusIndex {
    pub sections: Vec<SectionInfo>,
    pub parts: Vec<PartInfo>,
    pub max_page: u32,
}

impl CorpusIndex {
    pub fn new(mut sections: Vec<SectionInfo>, mut parts: Vec<PartInfo>, max_page: u32) -> Self {
        sections.sort_by_key(|info| info.number);
        parts.sort_by_key(|part| part.number);
        Self {
            sections,
            parts,
            max_page,
        }
    }

    pub fn section_ids(&self) -> impl Iterator<Item = SectionId> + '_ {
        self.sections.iter().map(|info| info.number)
    }

    pub fn section_info(&self, id: SectionId) -> Option<&SectionInfo> {
        self.sections.iter().find(|info| info.number == id)
    }

    pub fn part(&self, number: u16) -> Option<&PartInfo> {
        self.parts.iter().find(|part| part.number == number)
    }

    /// Half-open page range covered by a part. The last part runs through
    /// `max_page` inclusive.
    pub fn part_page_range(&self, number: u16) -> Option<Range<u32>> {
        let start = self.part(number)?.start_page;
        let end = number
            .checked_add(1)
            .and_then(|next| self.part(next))
            .map(|next| next.start_page)
            .unwrap_or(self.max_page.saturating_add(1));
        Some(start..end.max(start))
    }

    /// Part whose page range covers `page`.
    pub fn part_for_page(&self, page: u32) -> Option<u16> {
        self.parts
            .iter()
            .filter(|part| part.start_page <= page)
            .max_by_key(|part| part.start_page)
            .map(|part| part.number)
    }
}

#[derive(Deserialize)]
struct PartIndexFile {
    juzs: Vec<PartInfo>,
}

#[derive(Deserialize)]
struct SectionFile {
    verses: Vec<Verse>,
}

/// Corpus stored as JSON files under a data directory.
pub struct JsonCorpus {
    root: PathBuf,
    index: CorpusIndex,
    loaded: RefCell<HashMap<SectionId, Section>>,
}

impl JsonCorpus {
    pub fn open(root: impl Into<PathBuf>, max_page: u32) -> Result<Self> {
        let root = root.into();
        let sections: Vec<SectionInfo> = read_json(&root.join(SECTION_LIST_FILE))?;
        let parts = read_json::<PartIndexFile>(&root.join(PART_INDEX_FILE))?.juzs;
        info!(
            root = %root.display(),
            sections = sections.len(),
            parts = parts.len(),
            max_page,
            "Opened JSON corpus"
        );
        Ok(Self {
            root,
            index: CorpusIndex::new(sections, parts, max_page),
            loaded: RefCell::new(HashMap::new()),
        })
    }

    fn section_path(&self, id: SectionId) -> PathBuf {
        self.root.join(SECTION_DIR).join(format!("{id}.json"))
    }
}

impl ContentSource for JsonCorpus {
    fn index(&self) -> &CorpusIndex {
        &self.index
    }

    fn resolve_section(&self, id: SectionId) -> Result<Section> {
        if let Some(section) = self.loaded.borrow().get(&id) {
            return Ok(section.clone());
        }
        let info = self
            .index
            .section_info(id)
            .cloned()
            .ok_or_else(|| anyhow!("section {id} is not listed in the corpus index"))?;
        let file: SectionFile = read_json(&self.section_path(id))?;
        check_verse_order(id, &file.verses)?;
        let section = Section {
            info,
            verses: file.verses,
        };
        debug!(section = id, verses = section.verses.len(), "Loaded section");
        self.loaded.borrow_mut().insert(id, section.clone());
        Ok(section)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn check_verse_order(id: SectionId, verses: &[Verse]) -> Result<()> {
    if let Some(pair) = verses
        .windows(2)
        .find(|pair| pair[0].number >= pair[1].number)
    {
        bail!(
            "section {id}: verse {} follows verse {}",
            pair[1].number,
            pair[0].number
        );
    }
    if verses.iter().any(|verse| verse.number == 0 || verse.page == 0) {
        bail!("section {id}: verse and page numbers start at 1");
    }
    Ok(())
}

/// In-memory corpus, handy for embedding small texts and for tests. Sections
/// listed in `failing` report an error when resolved.
#[derive(Debug, Clone, Default)]
pub struct StaticCorpus {
    index: CorpusIndex,
    sections: BTreeMap<SectionId, Section>,
    failing: HashSet<SectionId>,
}

impl Default for CorpusIndex {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new(), DEFAULT_MAX_PAGE)
    }
}

impl StaticCorpus {
    pub fn new(sections: Vec<Section>, parts: Vec<PartInfo>, max_page: u32) -> Self {
        let infos = sections.iter().map(|section| section.info.clone()).collect();
        Self {
            index: CorpusIndex::new(infos, parts, max_page),
            sections: sections
                .into_iter()
                .map(|section| (section.number(), section))
                .collect(),
            failing: HashSet::new(),
        }
    }

    pub fn fail_section(mut self, id: SectionId) -> Self {
        self.failing.insert(id);
        self
    }
}

impl ContentSource for StaticCorpus {
    fn index(&self) -> &CorpusIndex {
        &self.index
    }

    fn resolve_section(&self, id: SectionId) -> Result<Section> {
        if self.failing.contains(&id) {
            bail!("section {id} is unavailable");
        }
        self.sections
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow!("section {id} not found"))
    }
}
