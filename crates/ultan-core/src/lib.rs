//! ultan-core: storage and turn engine for ultan
//!
//! Keeps per-world knowledge on disk: a codex summarizing the world and an
//! append-only log of question/answer sessions. Generated questions and codex
//! rewrites are validated before they touch that state.
//!
//! # Quick Start
//!
//! ```no_run
//! use ultan_core::{Archive, Config, Engine, HttpGenerator, WorldId};
//!
//! # async fn run() -> ultan_core::Result<()> {
//! let archive = Archive::new("/path/to/repo");
//! let config = Config::load(std::path::Path::new("/path/to/repo"))?;
//! let world = WorldId::parse("The Drowned Coast")?;
//!
//! let session = archive.create_session(&world)?;
//! let generator = HttpGenerator::from_config(&config)?;
//! let engine = Engine::new(&archive, &generator, config.engine.clone());
//!
//! let question = engine.process_turn(&world, &session, "The tide is a god.").await?;
//! println!("{}", question.text());
//! engine.finalize_codex(&world, &session, None).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod prompts;
pub mod safe_io;
pub mod slug;
pub mod state;
pub mod validators;

pub use config::{Config, EngineConfig};
pub use engine::{Engine, FinalizeOutcome, QuestionOutcome};
pub use error::{Error, Result};
pub use gateway::{Generator, HttpGenerator};
pub use slug::{WorldId, slugify};
pub use state::{Archive, ArchivePaths, WorldPaths, discover_root};
pub use validators::{Verdict, validate_codex, validate_question};
