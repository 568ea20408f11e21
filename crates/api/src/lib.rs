//! Job-building API for Spoke streaming jobs.
//!
//! ```
//! use spoke_api::prelude::*;
//!
//! let mut env = StreamEnvironment::new("wordcount");
//! env.enable_checkpointing(10_000)?;
//! env.checkpoint_config_mut()
//!     .set_externalized_checkpoint_retention(ExternalizedCheckpointRetention::RetainOnCancellation);
//!
//! let job = env.build();
//! assert!(job.checkpoint_config().is_externalized_checkpoints_enabled());
//! # Ok::<(), spoke_api::Error>(())
//! ```

pub mod environment;
pub mod prelude;

pub use spoke_checkpoint::{Error, Result};
