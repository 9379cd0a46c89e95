//! Core data models for structured papers and reference linking.

mod element;
mod link;
mod page;
mod paper;

pub use element::{
    AlgorithmElement, Citation, ContentElement, ElementType, EquationElement, FigureElement,
    ParagraphElement, TableElement,
};
pub use link::{LinkMode, LinkResponse, LinkedReference};
pub use page::{PageText, TextChunk};
pub use paper::{BibliographyEntry, PaperMetadata, Section, StructuredPaper};
