//! # tfcascade - layered terraform configuration
//!
//! ## Introduction for developers
//!
//! Read this to understand how `tfcascade` works internally.
//!
//! ### Trees and layers
//!
//! A project is a directory tree. Its root holds a `.tfcascade.yaml` (see [settings::Settings]), every directory
//! below it may hold an `env/` directory with fragments:
//!
//! ```text
//! .tfcascade.yaml
//! env/dev.tfvars              <- values shared by everything in dev
//! env/variables.tf
//! network/
//!   env/dev.tfvars            <- values for everything below network/
//!   vpc/
//!     env/dev.tfvars          <- values for vpc only
//!     env/derived.tfvars
//! ```
//!
//! Terraform is run in a leaf (`network/vpc`). The directories from the root down to that leaf are its layers.
//! Later layers override earlier ones simply by coming later in the combined file.
//!
//! ### Resolving
//!
//! see [descriptor::Descriptor::resolve]
//!
//! A (root, leaf, environment) triple resolves into a [descriptor::Descriptor]: the layers, and per
//! [category::Category] one candidate fragment per layer plus the path of the combined file. This step only does path
//! arithmetic. A leaf outside of the root fails here, before any file is touched.
//!
//! | **category** | **fragment**             | **combined file**        |
//! |--------------|--------------------------|--------------------------|
//! | values       | `env/<env>.tfvars`       | `_combined.tfvars`       |
//! | variables    | `env/<env>_variables.tf` | `_combined_variables.tf` |
//! | resources    | `env/variables.tf`       | `_combined.tf`           |
//! | derived      | `env/derived.tfvars`     | `_combined_derived.tf`   |
//!
//! ### Combining
//!
//! see [combine::Combiner]
//!
//! Each category is combined on its own. Candidates that do not exist are skipped, that is how a layer opts out of a
//! category. Fragments are not parsed, with one exception: derived fragments are rendered as templates first
//! ([render::Render]).
//!
//! The combined file is staged in a temporary file next to its destination and renamed into place, so a failed run
//! leaves the previous combined file as it was.
pub mod category;
pub mod combine;
pub mod descriptor;
pub mod render;
pub mod settings;
mod util;

pub use category::Category;
pub use combine::{clean, CombineAllError, CombineError, CombineReport, Combiner};
pub use descriptor::{resolve, Descriptor, LoadError, ResolveError, ResolveInput};
