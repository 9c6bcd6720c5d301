//! Archive output: the call history and the atomic downloader.
//!
//! # Submodules
//!
//! - [`history`]: per-run record of which URL each target path was claimed by
//! - [`download`]: fetch-to-temp-then-rename persistence of single files
//!
//! # Output Structure
//!
//! ```text
//! store_root/
//! └── central/
//!     ├── council/
//!     │   └── 20160105/
//!     │       ├── agenda/<file leaf>
//!     │       ├── minutes/<file leaf>
//!     │       ├── recordings/01_<label>.mp3
//!     │       └── docSets/01_<id>/{mainDocs,annexDocs,remarkDocs}/<label>.pdf
//!     ├── committee/<committee>/<date key>/...
//!     └── workgroup/<work group>/<date key>/...
//! ```

pub mod download;
pub mod history;

pub use history::{CallHistory, Claim};
