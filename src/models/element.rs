//! Content elements that make up a section.

use serde::{Deserialize, Serialize};

use crate::parsing::extract_citation_keys;

/// Discriminator for [`ContentElement`] variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Paragraph,
    Figure,
    Table,
    Equation,
    Algorithm,
}

impl ElementType {
    /// The serialized `type` tag
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Paragraph => "paragraph",
            ElementType::Figure => "figure",
            ElementType::Table => "table",
            ElementType::Equation => "equation",
            ElementType::Algorithm => "algorithm",
        }
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An inline citation marker found in a paragraph, e.g. `[2]`
///
/// Refers to a bibliography entry by `ref_id` equality only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Citation {
    pub key: String,
}

impl Citation {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// A block of prose with the citation markers it contains
///
/// Deserialization ignores any serialized `citations` and re-extracts them
/// from `text`, so the list always matches the prose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawParagraph")]
pub struct ParagraphElement {
    pub element_id: String,

    pub text: String,

    /// Markers in order of occurrence, duplicates kept
    pub citations: Vec<Citation>,
}

/// Wire form of a paragraph; citations are derived, not read
#[derive(Deserialize)]
struct RawParagraph {
    element_id: String,
    text: String,
}

impl From<RawParagraph> for ParagraphElement {
    fn from(raw: RawParagraph) -> Self {
        ParagraphElement::from_text(raw.element_id, raw.text)
    }
}

impl ParagraphElement {
    /// Build a paragraph, extracting its citations from `text`
    pub fn from_text(element_id: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let citations = extract_citation_keys(&text)
            .into_iter()
            .map(Citation::new)
            .collect();

        Self {
            element_id: element_id.into(),
            text,
            citations,
        }
    }

    /// Citation keys in order
    pub fn citation_keys(&self) -> impl Iterator<Item = &str> {
        self.citations.iter().map(|c| c.key.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FigureElement {
    pub element_id: String,

    #[serde(default)]
    pub caption: Option<String>,

    #[serde(default)]
    pub image_path: Option<String>,

    #[serde(default)]
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableElement {
    pub element_id: String,

    #[serde(default)]
    pub caption: Option<String>,

    /// Cell text, row-major
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquationElement {
    pub element_id: String,

    #[serde(default)]
    pub latex: String,

    #[serde(default)]
    pub label: Option<String>,
}

/// An algorithm or pseudocode block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmElement {
    pub element_id: String,

    /// Label such as "Algorithm 1"
    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub caption: Option<String>,

    #[serde(default)]
    pub pseudocode: String,
}

impl AlgorithmElement {
    pub fn new(element_id: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
            ..Default::default()
        }
    }
}

/// Any element that can appear in a section
///
/// Serialized with an internal `type` tag so the discriminator always
/// matches the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentElement {
    Paragraph(ParagraphElement),
    Figure(FigureElement),
    Table(TableElement),
    Equation(EquationElement),
    Algorithm(AlgorithmElement),
}

impl ContentElement {
    pub fn element_type(&self) -> ElementType {
        match self {
            ContentElement::Paragraph(_) => ElementType::Paragraph,
            ContentElement::Figure(_) => ElementType::Figure,
            ContentElement::Table(_) => ElementType::Table,
            ContentElement::Equation(_) => ElementType::Equation,
            ContentElement::Algorithm(_) => ElementType::Algorithm,
        }
    }

    pub fn element_id(&self) -> &str {
        match self {
            ContentElement::Paragraph(e) => &e.element_id,
            ContentElement::Figure(e) => &e.element_id,
            ContentElement::Table(e) => &e.element_id,
            ContentElement::Equation(e) => &e.element_id,
            ContentElement::Algorithm(e) => &e.element_id,
        }
    }

    pub fn as_paragraph(&self) -> Option<&ParagraphElement> {
        match self {
            ContentElement::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_algorithm(&self) -> Option<&AlgorithmElement> {
        match self {
            ContentElement::Algorithm(a) => Some(a),
            _ => None,
        }
    }
}

impl From<ParagraphElement> for ContentElement {
    fn from(e: ParagraphElement) -> Self {
        ContentElement::Paragraph(e)
    }
}

impl From<FigureElement> for ContentElement {
    fn from(e: FigureElement) -> Self {
        ContentElement::Figure(e)
    }
}

impl From<TableElement> for ContentElement {
    fn from(e: TableElement) -> Self {
        ContentElement::Table(e)
    }
}

impl From<EquationElement> for ContentElement {
    fn from(e: EquationElement) -> Self {
        ContentElement::Equation(e)
    }
}

impl From<AlgorithmElement> for ContentElement {
    fn from(e: AlgorithmElement) -> Self {
        ContentElement::Algorithm(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_element_defaults() {
        let alg: ContentElement = AlgorithmElement::new("a1").into();
        assert_eq!(alg.element_type(), ElementType::Algorithm);
        assert_eq!(alg.element_id(), "a1");
        assert!(alg.as_algorithm().unwrap().pseudocode.is_empty());
    }

    #[test]
    fn test_paragraph_from_text_extracts_citations() {
        let para = ParagraphElement::from_text("p3", "We follow previous work [2, 3] and [2].");
        let keys: Vec<&str> = para.citation_keys().collect();
        assert_eq!(keys, vec!["[2]", "[3]", "[2]"]);
    }

    #[test]
    fn test_type_tag_matches_variant() {
        let elements: Vec<ContentElement> = vec![
            ParagraphElement::from_text("p", "text").into(),
            FigureElement {
                element_id: "f".into(),
                ..Default::default()
            }
            .into(),
            TableElement {
                element_id: "t".into(),
                ..Default::default()
            }
            .into(),
            EquationElement {
                element_id: "e".into(),
                ..Default::default()
            }
            .into(),
            AlgorithmElement::new("a").into(),
        ];

        for element in elements {
            let json = serde_json::to_value(&element).unwrap();
            assert_eq!(json["type"], element.element_type().as_str());
        }
    }

    #[test]
    fn test_deserialize_tagged_element() {
        let json = r#"{"type": "figure", "element_id": "fig1", "caption": "Overview"}"#;
        let element: ContentElement = serde_json::from_str(json).unwrap();

        match element {
            ContentElement::Figure(fig) => {
                assert_eq!(fig.element_id, "fig1");
                assert_eq!(fig.caption.as_deref(), Some("Overview"));
                assert_eq!(fig.page, None);
            }
            other => panic!("expected figure, got {:?}", other.element_type()),
        }
    }

    #[test]
    fn test_deserialized_citations_follow_text() {
        let json = r#"[
            {"type": "paragraph", "element_id": "p1", "text": "previous work with no markers at all",
             "citations": [{"key": "[2]"}]},
            {"type": "paragraph", "element_id": "p2", "text": "previous work cites [1]"}
        ]"#;
        let elements: Vec<ContentElement> = serde_json::from_str(json).unwrap();

        for element in &elements {
            let paragraph = element.as_paragraph().unwrap();
            let keys: Vec<&str> = paragraph.citation_keys().collect();
            assert_eq!(keys, extract_citation_keys(&paragraph.text));
        }
        assert!(elements[0].as_paragraph().unwrap().citations.is_empty());
        assert_eq!(
            elements[1].as_paragraph().unwrap().citations,
            vec![Citation::new("[1]")]
        );
    }
}
