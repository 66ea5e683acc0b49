pub mod assemble;
pub mod boundary;

use serde::{Deserialize, Serialize};

use crate::core::model::{
    AmbiguousBoundary, DuplicateSegment, IncompletePacket, Page, Segment, SegmentPage,
    StudentPacket, UnclassifiedPage,
};

pub use assemble::PacketAssembler;
pub use boundary::{Decision, LinearBoundaryResolver};

pub trait BoundaryResolver {
    fn resolve(&self, file_name: &str, pages: &[Page]) -> Resolution;
}

/// Segments of one file plus the pages the scan could not place confidently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Resolution {
    pub segments: Vec<Segment>,
    pub unclassified: Vec<UnclassifiedPage>,
    pub ambiguous: Vec<AmbiguousBoundary>,
}

impl Resolution {
    pub fn placement(&self, page_index: usize) -> Option<(&Segment, &SegmentPage)> {
        self.segments.iter().find_map(|segment| {
            segment
                .pages
                .iter()
                .find(|page| page.page_index == page_index)
                .map(|page| (segment, page))
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Assembly {
    pub packets: Vec<StudentPacket>,
    pub incomplete: Vec<IncompletePacket>,
    pub duplicates: Vec<DuplicateSegment>,
}

impl Assembly {
    pub fn extend(&mut self, other: Assembly) {
        self.packets.extend(other.packets);
        self.incomplete.extend(other.incomplete);
        self.duplicates.extend(other.duplicates);
    }
}
