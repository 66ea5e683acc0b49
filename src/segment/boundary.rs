use tracing::debug;

use crate::core::confidence::score_confidence;
use crate::core::model::{
    AmbiguousBoundary, DocumentType, Language, Page, PageRole, Segment, SegmentPage, SegmentRef,
    UnclassifiedPage,
};
use crate::segment::{BoundaryResolver, Resolution};

/// Where the scan puts one page. Variants are listed in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Student id and form title: opens a new segment.
    Start,
    Translation { segment: usize },
    Continuation { segment: usize },
    /// Best guess among the open segments.
    Ambiguous { segment: usize },
    Unclassified,
}

#[derive(Debug, Default)]
pub struct LinearBoundaryResolver;

impl LinearBoundaryResolver {
    pub fn new() -> Self {
        Self
    }
}

impl BoundaryResolver for LinearBoundaryResolver {
    fn resolve(&self, file_name: &str, pages: &[Page]) -> Resolution {
        pages
            .iter()
            .fold(ScanState::new(file_name), ScanState::step)
            .finish()
    }
}

/// Accumulator of the forward scan.
struct ScanState<'a> {
    file_name: &'a str,
    segments: Vec<Segment>,
    /// Segments of the student in progress, oldest first.
    open: Vec<usize>,
    /// The segment continuation pages extend.
    current: Option<usize>,
    last_attached: Option<usize>,
    unclassified: Vec<UnclassifiedPage>,
    ambiguous: Vec<AmbiguousBoundary>,
}

impl<'a> ScanState<'a> {
    fn new(file_name: &'a str) -> Self {
        Self {
            file_name,
            segments: Vec::new(),
            open: Vec::new(),
            current: None,
            last_attached: None,
            unclassified: Vec::new(),
            ambiguous: Vec::new(),
        }
    }

    fn step(mut self, page: &Page) -> Self {
        let decision = self.decide(page);
        debug!(
            file = self.file_name,
            page = page.index,
            class = ?page.class,
            language = %page.language,
            student = page.student_id().unwrap_or("-"),
            ?decision,
            "boundary decision"
        );
        self.apply(page, decision);
        self
    }

    fn finish(self) -> Resolution {
        Resolution {
            segments: self.segments,
            unclassified: self.unclassified,
            ambiguous: self.ambiguous,
        }
    }

    fn current_student(&self) -> Option<&str> {
        self.current
            .map(|index| self.segments[index].student_id.as_str())
    }

    fn open_for(&self, student_id: &str, document_type: DocumentType) -> Option<usize> {
        self.open.iter().rev().copied().find(|&index| {
            let segment = &self.segments[index];
            segment.student_id == student_id && segment.document_type == document_type
        })
    }

    fn nearest_open(&self, document_type: DocumentType) -> Option<usize> {
        self.open
            .iter()
            .rev()
            .copied()
            .find(|&index| self.segments[index].document_type == document_type)
    }

    /// Segment whose last page is a translation in `language`.
    fn translation_run(&self, language: Language) -> Option<usize> {
        let segment = self.last_attached?;
        let last = self.segments[segment].pages.last()?;
        (last.role.is_translation() && last.language == language).then_some(segment)
    }

    fn decide(&self, page: &Page) -> Decision {
        let document_type = page.document_type();
        let foreign = page.language.is_foreign();

        if let (Some(student_id), Some(doc)) = (page.student_id(), document_type) {
            if foreign {
                if let Some(segment) = self.open_for(student_id, doc) {
                    return Decision::Translation { segment };
                }
            } else if let Some(segment) = self.current.filter(|&index| {
                let current = &self.segments[index];
                current.student_id == student_id && current.document_type == doc
            }) {
                // the form header repeated on its second page
                return Decision::Continuation { segment };
            }
            return Decision::Start;
        }

        // another student's id without a form title never joins this student
        if page
            .student_id()
            .is_some_and(|student_id| Some(student_id) != self.current_student())
        {
            return Decision::Unclassified;
        }

        if foreign {
            let translated = match document_type {
                Some(doc) => self.nearest_open(doc),
                None => self.translation_run(page.language),
            };
            if let Some(segment) = translated {
                return Decision::Translation { segment };
            }
        } else if let Some(segment) = self.current {
            let same_form = document_type
                .map_or(true, |doc| doc == self.segments[segment].document_type);
            if same_form {
                return Decision::Continuation { segment };
            }
        }

        // nothing open to guess from: the page lands in no segment
        match document_type
            .and_then(|doc| self.nearest_open(doc))
            .or(self.current)
        {
            Some(segment) => Decision::Ambiguous { segment },
            None => Decision::Unclassified,
        }
    }

    fn apply(&mut self, page: &Page, decision: Decision) {
        match decision {
            Decision::Start => self.start_segment(page),
            Decision::Continuation { segment } => {
                self.attach(segment, page, PageRole::Continuation, true);
            }
            Decision::Translation { segment } => {
                let role = self.translation_role(segment);
                self.attach(segment, page, role, true);
            }
            Decision::Ambiguous { segment } => {
                let role = if page.language.is_foreign() {
                    self.translation_role(segment)
                } else {
                    PageRole::Continuation
                };
                let confidence = self.attach(segment, page, role, false);
                let target = &self.segments[segment];
                self.ambiguous.push(AmbiguousBoundary {
                    file_name: self.file_name.to_string(),
                    page_index: page.index,
                    class: page.class,
                    language: page.language,
                    assigned_to: SegmentRef {
                        student_id: target.student_id.clone(),
                        document_type: target.document_type,
                    },
                    confidence,
                });
            }
            Decision::Unclassified => {
                let reason = match (page.student_id(), page.document_type()) {
                    (Some(_), _) => "student id without a form title, outside that student's forms",
                    (None, Some(_)) => "form title without a student id and no open segment",
                    (None, None) => "no form title and no open segment",
                };
                self.unclassified.push(UnclassifiedPage {
                    file_name: self.file_name.to_string(),
                    page_index: page.index,
                    language: page.language,
                    student_id: page.student_id().map(str::to_string),
                    reason: reason.to_string(),
                });
            }
        }
    }

    fn start_segment(&mut self, page: &Page) {
        let (Some(identity), Some(document_type)) = (page.identity.as_ref(), page.document_type())
        else {
            return;
        };

        if self.current_student() != Some(identity.id.as_str()) {
            self.open.clear();
        }
        // a repeated form for the same slot supersedes the open one
        let segments = &self.segments;
        self.open.retain(|&index| {
            segments[index].student_id != identity.id
                || segments[index].document_type != document_type
        });

        let confidence = score_confidence(true, true, true, !page.language.is_foreign());
        self.segments.push(Segment {
            file_name: self.file_name.to_string(),
            student_id: identity.id.clone(),
            student_name: identity.name.clone(),
            document_type,
            pages: vec![SegmentPage {
                page_index: page.index,
                role: PageRole::Primary,
                language: page.language,
                confidence,
                text: page.text.clone(),
            }],
        });

        let index = self.segments.len() - 1;
        self.open.push(index);
        self.current = Some(index);
        self.last_attached = Some(index);
    }

    fn translation_role(&self, segment: usize) -> PageRole {
        let target = &self.segments[segment];
        let linked_to = target
            .pages
            .iter()
            .rev()
            .find(|page| !page.role.is_translation())
            .map(|page| page.page_index)
            .unwrap_or(target.primary().page_index);
        PageRole::Translation { linked_to }
    }

    fn attach(&mut self, segment: usize, page: &Page, role: PageRole, fits_context: bool) -> f32 {
        let language_expected = role.is_translation() == page.language.is_foreign();
        let confidence = score_confidence(
            page.student_id().is_some(),
            page.document_type().is_some(),
            fits_context,
            language_expected,
        );

        let target = &mut self.segments[segment];
        if target.student_name.is_none() && page.student_id() == Some(target.student_id.as_str()) {
            target.student_name = page.student_name().map(str::to_string);
        }
        target.pages.push(SegmentPage {
            page_index: page.index,
            role,
            language: page.language,
            confidence,
            text: page.text.clone(),
        });
        self.last_attached = Some(segment);
        confidence
    }
}
