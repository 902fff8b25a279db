//! Pipeline orchestration and document logic for econpub.
//!
//! Ties the fetcher, article extraction, Markdown assembly and the external
//! EPUB compiler into the end-to-end "latest edition to EPUB" workflow.

pub mod assembler;
pub mod compiler;
pub mod extract;
pub mod pipeline;

pub use assembler::{AssembledDocument, article_files, write_articles_to_markdown};
pub use compiler::{compiler_args, create_epub};
pub use extract::{ArticleContent, ContentBlock, Extracted, extract_article};
pub use pipeline::{Pipeline, PipelineResult, ProgressReporter, SilentProgress};
