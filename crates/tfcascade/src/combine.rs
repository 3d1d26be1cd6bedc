//! Combination of fragments into combined files
//!
//! For each [Category] the candidates of a [Descriptor] are visited root first. Missing candidates are skipped, all
//! others are appended below a provenance comment and the result replaces the category's combined file in one
//! rename. A combined file is therefore either the previous version or the complete new one.
//!
//! Categories are independent of each other: they read disjoint candidates and write different combined files.
use crate::category::Category;
use crate::descriptor::Descriptor;
use crate::render::{LiquidRenderer, Render, RenderContext, TemplateError};
use crate::util::{read_fragment, StagedFile};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Result of combining each category on its own
pub type CombineReport = IndexMap<Category, Result<PathBuf, CombineError>>;

#[derive(derive_new::new, Debug)]
pub struct Combiner<R = LiquidRenderer> {
    renderer: R,
    #[new(default)]
    deadline: Option<Instant>,
}

impl Combiner {
    /// A combiner with the [LiquidRenderer]
    pub fn liquid() -> Result<Self, TemplateError> {
        Ok(Self::new(LiquidRenderer::new()?))
    }
}

impl<R: Render> Combiner<R> {
    /// Give up once `timeout` has passed, counted from now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Combine a single category, returns the path of the combined file
    #[tracing::instrument(level = "debug", skip_all, fields(%category))]
    pub fn combine(
        &self,
        descriptor: &Descriptor,
        category: Category,
    ) -> Result<PathBuf, CombineError> {
        let paths = descriptor.category(category);
        let combined = paths.combined();

        let header = format!("# {}\n", descriptor.settings().autogenerate_comment);
        let mut contents = header.into_bytes();

        for (depth, candidate) in paths.candidates().iter().enumerate() {
            self.check_deadline()?;

            let fragment =
                read_fragment(candidate).map_err(|e| CombineError::io(candidate, e))?;
            let Some(fragment) = fragment else {
                tracing::debug!(path=%candidate.display(), "no fragment");
                continue;
            };

            let fragment = if category.is_templated() {
                self.render(descriptor, depth, candidate, &fragment)?.into_bytes()
            } else {
                fragment
            };

            tracing::debug!(path=%candidate.display(), bytes = fragment.len(), "append fragment");
            append_fragment(&mut contents, &fragment);
        }

        let mut staged = StagedFile::create(combined).map_err(|e| CombineError::io(combined, e))?;
        staged
            .write_all(&contents)
            .map_err(|e| CombineError::io(combined, e))?;

        // an expired deadline drops `staged`, which removes the temporary file
        self.check_deadline()?;
        staged.commit().map_err(|e| CombineError::io(combined, e))?;

        tracing::info!(path=%combined.display(), "combined file written");
        Ok(combined.to_path_buf())
    }

    /// Combine all categories, stopping at the first failure
    ///
    /// Files already written for earlier categories stay in place.
    pub fn combine_all(&self, descriptor: &Descriptor) -> Result<Vec<PathBuf>, CombineAllError> {
        Category::ALL
            .into_iter()
            .map(|category| {
                self.combine(descriptor, category)
                    .map_err(|source| CombineAllError { category, source })
            })
            .collect()
    }

    /// Combine the given categories, every one is attempted regardless of failures of the others
    pub fn combine_each(
        &self,
        descriptor: &Descriptor,
        categories: impl IntoIterator<Item = Category>,
    ) -> CombineReport {
        categories
            .into_iter()
            .map(|category| (category, self.combine(descriptor, category)))
            .collect()
    }

    fn render(
        &self,
        descriptor: &Descriptor,
        depth: usize,
        candidate: &Path,
        fragment: &[u8],
    ) -> Result<String, CombineError> {
        let template_error = |source| CombineError::Template {
            path: candidate.to_owned(),
            source,
        };

        let fragment =
            std::str::from_utf8(fragment).map_err(|e| template_error(TemplateError::Utf8(e)))?;
        let context = RenderContext::new(descriptor, depth);

        self.renderer.render(fragment, &context).map_err(template_error)
    }

    fn check_deadline(&self) -> Result<(), CombineError> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(CombineError::TimedOut),
            _ => Ok(()),
        }
    }
}

impl<R: Render + Sync> Combiner<R> {
    /// Like [Combiner::combine_each] for all categories, one thread per category
    pub fn combine_concurrently(&self, descriptor: &Descriptor) -> CombineReport {
        std::thread::scope(|scope| {
            let handles: Vec<_> = Category::ALL
                .into_iter()
                .map(|category| {
                    (
                        category,
                        scope.spawn(move || self.combine(descriptor, category)),
                    )
                })
                .collect();

            handles
                .into_iter()
                .map(|(category, handle)| {
                    let result = match handle.join() {
                        Ok(result) => result,
                        Err(panic) => std::panic::resume_unwind(panic),
                    };
                    (category, result)
                })
                .collect()
        })
    }
}

/// Remove all combined files of a descriptor, missing files are fine
pub fn clean(descriptor: &Descriptor) -> Result<(), CombineError> {
    for category in Category::ALL {
        let combined = descriptor.category(category).combined();
        match std::fs::remove_file(combined) {
            Ok(()) => tracing::info!(path=%combined.display(), "combined file removed"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(CombineError::io(combined, err)),
        }
    }

    Ok(())
}

/// Each fragment starts on a new line
fn append_fragment(contents: &mut Vec<u8>, fragment: &[u8]) {
    if fragment.is_empty() {
        return;
    }

    contents.extend_from_slice(fragment);
    if !fragment.ends_with(b"\n") {
        contents.push(b'\n');
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CombineError {
    #[error("IO error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to render {path}")]
    Template {
        path: PathBuf,
        #[source]
        source: TemplateError,
    },
    #[error("Timed out")]
    TimedOut,
}

impl CombineError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_owned(),
            source,
        }
    }

    /// The path involved, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            CombineError::Io { path, .. } | CombineError::Template { path, .. } => Some(path),
            CombineError::TimedOut => None,
        }
    }
}

#[derive(thiserror::Error, Debug)]
#[error("Unable to combine {category}")]
pub struct CombineAllError {
    pub category: Category,
    #[source]
    pub source: CombineError,
}
