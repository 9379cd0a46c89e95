//! Text segmentation, citation extraction and paper structuring.

mod citations;
mod segmenter;
mod structurer;

pub use citations::{extract_citation_keys, has_citation_markers};
pub use segmenter::segment;
pub use structurer::{PaperStructurer, StructuringError, BODY_SECTION_NUMBER, BODY_SECTION_TITLE};
