//! Resolution of a (root, origin, environment) triple into all fragment paths
//!
//! Given
//! ```text
//! root        = ../test
//! origin      = ../test/foo/bar
//! environment = dev
//! ```
//! the layers (ancestor chain) are `../test`, `../test/foo` and `../test/foo/bar`. Every layer contributes one
//! candidate per [Category], e.g. `../test/foo/env/dev.tfvars` for [Category::Values]. Combined files always land in
//! the origin: `../test/foo/bar/_combined.tfvars`.
//!
//! Resolution is pure path arithmetic. Nothing is read from disk except the settings file in
//! [Descriptor::load_in_tree].
use crate::category::Category;
use crate::settings::{Settings, SettingsError};
use std::path::{Component, Path, PathBuf};

/// Candidate fragments and the combined output of one [Category]
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CategoryPaths {
    candidates: Vec<PathBuf>,
    combined: PathBuf,
}

impl CategoryPaths {
    /// One candidate per layer, root first
    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    pub fn combined(&self) -> &Path {
        &self.combined
    }
}

/// Everything needed to resolve a [Descriptor]
#[derive(Debug, Clone)]
pub struct ResolveInput {
    pub environment: String,
    pub root_path: PathBuf,
    pub origin_path: PathBuf,
    pub settings: Settings,
    /// Where `settings` were loaded from, if anywhere
    pub settings_path: Option<PathBuf>,
}

impl ResolveInput {
    pub fn new(
        root_path: impl Into<PathBuf>,
        origin_path: impl Into<PathBuf>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            environment: environment.into(),
            root_path: root_path.into(),
            origin_path: origin_path.into(),
            settings: Settings::default(),
            settings_path: None,
        }
    }
}

/// Resolved layers and fragment paths for one environment of one leaf directory
///
/// Immutable once built, resolve again to get a different one.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Descriptor {
    environment: String,
    root_path: PathBuf,
    origin_path: PathBuf,
    settings_path: Option<PathBuf>,
    settings: Settings,

    tmpl_name: String,
    tmpl_path: PathBuf,
    tmpl_rel_paths: Vec<PathBuf>,

    walkable_paths: Vec<PathBuf>,

    values: CategoryPaths,
    variables: CategoryPaths,
    resources: CategoryPaths,
    derived: CategoryPaths,
}

/// Resolve with default [Settings]
pub fn resolve(
    root: impl Into<PathBuf>,
    origin: impl Into<PathBuf>,
    environment: impl Into<String>,
) -> Result<Descriptor, ResolveError> {
    Descriptor::resolve(ResolveInput::new(root, origin, environment))
}

impl Descriptor {
    #[tracing::instrument(level = "debug", skip_all, fields(root=%input.root_path.display(), origin=%input.origin_path.display(), environment=%input.environment))]
    pub fn resolve(input: ResolveInput) -> Result<Self, ResolveError> {
        let ResolveInput {
            environment,
            root_path,
            origin_path,
            settings,
            settings_path,
        } = input;

        check_environment(&environment)?;

        let relative = relative_components(&root_path, &origin_path)?;

        let mut tmpl_rel_paths = Vec::with_capacity(relative.len());
        let mut prefix = PathBuf::new();
        for component in &relative {
            prefix.push(component);
            tmpl_rel_paths.push(prefix.clone());
        }

        let walkable_paths: Vec<PathBuf> = std::iter::once(root_path.clone())
            .chain(tmpl_rel_paths.iter().map(|rel| root_path.join(rel)))
            .collect();
        tracing::trace!(?walkable_paths, "layers");

        let category_paths = |category: Category| {
            let fragment = category.fragment_file_name(&settings, &environment);
            CategoryPaths {
                candidates: walkable_paths
                    .iter()
                    .map(|layer| layer.join(&settings.environments_dir).join(&fragment))
                    .collect(),
                combined: origin_path.join(category.combined_file_name(&settings)),
            }
        };

        let values = category_paths(Category::Values);
        let variables = category_paths(Category::Variables);
        let resources = category_paths(Category::Resources);
        let derived = category_paths(Category::Derived);

        let tmpl_name = relative
            .last()
            .cloned()
            .or_else(|| {
                root_path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .unwrap_or_default();

        Ok(Self {
            environment,
            tmpl_name,
            tmpl_path: prefix,
            tmpl_rel_paths,
            walkable_paths,
            values,
            variables,
            resources,
            derived,
            root_path,
            origin_path,
            settings,
            settings_path,
        })
    }

    /// Resolve for `path`, using the directory of the nearest `.tfcascade.yaml` as root
    pub fn load_in_tree(
        path: impl Into<PathBuf>,
        environment: impl Into<String>,
    ) -> Result<Self, LoadError> {
        let origin_path = path.into();
        let settings_path = Settings::find_in_tree(&origin_path)
            .ok_or_else(|| LoadError::SettingsNotFound(origin_path.clone()))?;

        let settings = Settings::load(&settings_path)?;
        let root_path = settings_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(Self::resolve(ResolveInput {
            environment: environment.into(),
            root_path,
            origin_path,
            settings,
            settings_path: Some(settings_path),
        })?)
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// The leaf directory
    pub fn origin_path(&self) -> &Path {
        &self.origin_path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_path(&self) -> Option<&Path> {
        self.settings_path.as_deref()
    }

    /// Name of the leaf directory
    pub fn tmpl_name(&self) -> &str {
        &self.tmpl_name
    }

    /// Origin relative to root, empty when they are the same
    pub fn tmpl_path(&self) -> &Path {
        &self.tmpl_path
    }

    /// Every non-empty prefix of [Self::tmpl_path], shortest first
    pub fn tmpl_rel_paths(&self) -> &[PathBuf] {
        &self.tmpl_rel_paths
    }

    /// The ancestor chain: root first, origin last
    pub fn walkable_paths(&self) -> &[PathBuf] {
        &self.walkable_paths
    }

    pub fn values(&self) -> &CategoryPaths {
        &self.values
    }

    pub fn variables(&self) -> &CategoryPaths {
        &self.variables
    }

    pub fn resources(&self) -> &CategoryPaths {
        &self.resources
    }

    pub fn derived(&self) -> &CategoryPaths {
        &self.derived
    }

    pub fn category(&self, category: Category) -> &CategoryPaths {
        match category {
            Category::Values => &self.values,
            Category::Variables => &self.variables,
            Category::Resources => &self.resources,
            Category::Derived => &self.derived,
        }
    }

    /// Fragment path relative to a layer, e.g. `env/dev.tfvars`
    pub fn env_path(&self, category: Category) -> PathBuf {
        Path::new(&self.settings.environments_dir)
            .join(category.fragment_file_name(&self.settings, &self.environment))
    }
}

fn check_environment(environment: &str) -> Result<(), ResolveError> {
    let mut components = Path::new(environment).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name == environment => Ok(()),
        _ => Err(ResolveError::InvalidEnvironment(environment.to_string())),
    }
}

/// Path segments of `origin` below `root`
fn relative_components(root: &Path, origin: &Path) -> Result<Vec<String>, ResolveError> {
    let invalid = || ResolveError::InvalidTree {
        root: root.to_owned(),
        origin: origin.to_owned(),
    };

    // `.` and `foo` are as relative as `./foo`
    let relative = without_cur_dir(origin)
        .strip_prefix(without_cur_dir(root))
        .map_err(|_| invalid())?;

    let mut segments = vec![];
    for component in relative.components() {
        match component {
            Component::CurDir => continue,
            Component::Normal(segment) => segments.push(segment.to_string_lossy().into_owned()),
            _ => return Err(invalid()),
        }
    }

    Ok(segments)
}

fn without_cur_dir(path: &Path) -> &Path {
    let mut components = path.components();
    if path.components().next() == Some(Component::CurDir) {
        components.next();
    }
    components.as_path()
}

#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    #[error("{origin} is not inside of {root}")]
    InvalidTree { root: PathBuf, origin: PathBuf },
    #[error("Invalid environment name {0:?}")]
    InvalidEnvironment(String),
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("No {} found in {} or any parent directory", crate::settings::SETTINGS_FILE_NAME, .0.display())]
    SettingsNotFound(PathBuf),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}
