//! Extract tyre allocation rules from sporting regulation documents whose heading
//! conventions and phrasing change between editions.
//!
//! Per document: [`segment`] → [`locate`] → [`fields`], folded into a
//! [`RegulationDatabase`] by [`aggregate`].

pub mod aggregate;
pub mod config;
pub mod deps;
pub mod emit;
pub mod fields;
pub mod locate;
pub mod segment;
pub mod source;

pub use aggregate::{
    build_database, documents_from_paths, process_document, process_pages, run_pipeline, DocumentOutcome,
    DocumentRef, PipelineRun, RegulationDatabase, TyreConstraints, ZERO_ALLOCATION_WARNING,
};
pub use config::{discover_documents, load_config, parse_config, ConfigError, DiscoverError, RunConfig};
pub use deps::{check_deps, install_help_for, DepsResult};
pub use emit::{emit_run, sha256_hex, to_pretty_json, EmitError, EmitPaths};
pub use fields::{extract_tyre_fields, text_to_int, FieldExtraction, TyreFields};
pub use locate::find_tyre_article_id;
pub use segment::{segment_articles, segment_document, Article, ArticleCollection, HeadingStyle};
pub use source::{AutoSource, PageTextSource, PlainTextSource, PopplerSource, SourceError};
