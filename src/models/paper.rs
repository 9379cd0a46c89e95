//! Structured paper model: the root aggregate built by the structurer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::element::{ContentElement, ParagraphElement};

/// Descriptive metadata about a paper, when the caller has it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaperMetadata {
    /// Paper title
    #[serde(default)]
    pub title: Option<String>,

    /// Author names in publication order
    #[serde(default)]
    pub authors: Vec<String>,

    /// Abstract text
    #[serde(default)]
    pub abstract_text: Option<String>,

    /// Publication date (ISO format)
    #[serde(default)]
    pub published: Option<String>,

    /// arXiv identifier without version suffix
    #[serde(default)]
    pub arxiv_id: Option<String>,

    /// Digital Object Identifier
    #[serde(default)]
    pub doi: Option<String>,
}

impl PaperMetadata {
    /// Create metadata carrying only a title
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }
}

/// One entry of a paper's reference list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BibliographyEntry {
    /// Canonical marker, e.g. `[1]`
    pub ref_id: String,

    /// Human-readable reference string
    pub full_citation: String,
}

impl BibliographyEntry {
    pub fn new(ref_id: impl Into<String>, full_citation: impl Into<String>) -> Self {
        Self {
            ref_id: ref_id.into(),
            full_citation: full_citation.into(),
        }
    }
}

/// A titled run of content elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Section number; not necessarily numeric ("A.1", "Appendix")
    pub section_number: String,

    /// Section heading
    pub title: String,

    /// Elements in reading order
    #[serde(default)]
    pub content: Vec<ContentElement>,
}

impl Section {
    pub fn new(section_number: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            section_number: section_number.into(),
            title: title.into(),
            content: Vec::new(),
        }
    }

    /// Append an element
    pub fn with_element(mut self, element: impl Into<ContentElement>) -> Self {
        self.content.push(element.into());
        self
    }

    /// Paragraph elements of this section, in order
    pub fn paragraphs(&self) -> impl Iterator<Item = &ParagraphElement> {
        self.content.iter().filter_map(ContentElement::as_paragraph)
    }
}

/// A paper broken into sections and a bibliography
///
/// Citations inside paragraphs refer to bibliography entries by string
/// equality of `Citation::key` and `BibliographyEntry::ref_id`; there is no
/// owning link between the two, so the paper stays a plain tree. Use
/// [`StructuredPaper::bibliography_index`] to build the lookup table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredPaper {
    /// Caller-assigned identifier
    pub paper_id: String,

    /// Optional descriptive metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PaperMetadata>,

    /// Sections in document order
    #[serde(default)]
    pub sections: Vec<Section>,

    /// Reference list; `ref_id` is unique within it
    #[serde(default)]
    pub bibliography: Vec<BibliographyEntry>,
}

impl StructuredPaper {
    /// Create an empty paper with the given id
    pub fn new(paper_id: impl Into<String>) -> Self {
        Self {
            paper_id: paper_id.into(),
            metadata: None,
            sections: Vec::new(),
            bibliography: Vec::new(),
        }
    }

    /// Set metadata
    pub fn with_metadata(mut self, metadata: PaperMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Append a section
    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Replace the bibliography
    pub fn with_bibliography(mut self, bibliography: Vec<BibliographyEntry>) -> Self {
        self.bibliography = bibliography;
        self
    }

    /// Title from metadata, if any
    pub fn title(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.title.as_deref())
    }

    /// Every paragraph across all sections, in document order
    pub fn paragraphs(&self) -> impl Iterator<Item = &ParagraphElement> {
        self.sections.iter().flat_map(Section::paragraphs)
    }

    /// Look up an element anywhere in the paper by id
    pub fn element(&self, element_id: &str) -> Option<&ContentElement> {
        self.sections
            .iter()
            .flat_map(|s| s.content.iter())
            .find(|e| e.element_id() == element_id)
    }

    /// Build a `ref_id` lookup table over the bibliography
    ///
    /// If `ref_id`s repeat, the first entry wins.
    pub fn bibliography_index(&self) -> HashMap<&str, &BibliographyEntry> {
        let mut index = HashMap::with_capacity(self.bibliography.len());
        for entry in &self.bibliography {
            index.entry(entry.ref_id.as_str()).or_insert(entry);
        }
        index
    }

    /// Find a bibliography entry by its marker
    pub fn find_reference(&self, ref_id: &str) -> Option<&BibliographyEntry> {
        self.bibliography.iter().find(|e| e.ref_id == ref_id)
    }
}
