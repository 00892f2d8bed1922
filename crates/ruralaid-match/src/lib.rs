//! Matching pipeline — keywords → topic check → catalog search → reply text.
//!
//! Everything here is stateless. The only suspending step is the catalog
//! search in [`ProgramMatcher`], which degrades to "no matches" on failure.

pub mod compose;
pub mod extract;
pub mod matcher;
pub mod pipeline;
pub mod vocabulary;

pub use compose::{ResponseComposer, DESCRIPTION_CAP, DETAIL_CAP, OFF_TOPIC_MESSAGE};
pub use extract::{extract_keywords, is_on_topic};
pub use matcher::{ProgramMatcher, MAX_RESULTS};
pub use pipeline::{Analysis, Pipeline};
pub use vocabulary::{Vocabulary, DEFAULT_TERMS};
