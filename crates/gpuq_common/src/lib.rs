//! gpuq common - capability-report analysis for GPU API designers.
//!
//! Takes a corpus of per-device capability reports (one JSON document per
//! sampled device) and answers two questions:
//!
//! 1. Which minimum-capability requirement, if adopted, would first exclude
//!    which real devices? (requirement waterfall, see [`waterfall`])
//! 2. Which vendor architecture does each observed device belong to?
//!    (ID-plus-mask classification, see [`classifier`])
//!
//! ```text
//!   corpus ──► view ──► waterfall ──► summary ──► render
//!     │                    ▲
//!     │          requirement (catalog, bitmask)
//!     └──► devices ──► classifier ──► inventory
//! ```

pub mod bitmask;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod constants;
pub mod corpus;
pub mod devices;
pub mod error;
pub mod fetch;
pub mod inventory;
pub mod limits;
pub mod literal;
pub mod render;
pub mod report;
pub mod requirement;
pub mod summary;
pub mod version;
pub mod view;
pub mod waterfall;

pub use classifier::{Classification, Taxonomy};
pub use config::QueryConfig;
pub use constants::VkConstants;
pub use corpus::{CorpusEntry, ReportCorpus};
pub use devices::ObservedDevices;
pub use error::{QueryError, Result};
pub use requirement::Requirement;
pub use version::ApiVersion;
pub use view::CapabilityView;
pub use waterfall::{Aggregator, ReportVerdict};
