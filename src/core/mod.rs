pub mod confidence;
pub mod model;
pub mod page_classifier;
pub mod rfep_date;
pub mod student_identifier;

pub use page_classifier::PageClassifier;
pub use student_identifier::StudentIdentifier;
