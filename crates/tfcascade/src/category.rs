//! the four fragment categories
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// `<env>.tfvars`, copied verbatim
    Values,
    /// `<env>_variables.tf`, copied verbatim
    Variables,
    /// `variables.tf`, shared by all environments, copied verbatim
    Resources,
    /// `derived.tfvars`, rendered as a template before it is appended
    Derived,
}

impl Category {
    /// All categories in the order they are combined
    pub const ALL: [Category; 4] = [
        Category::Values,
        Category::Variables,
        Category::Resources,
        Category::Derived,
    ];

    /// File name of this category's fragment inside a layer's environments directory
    pub fn fragment_file_name(self, settings: &Settings, environment: &str) -> String {
        match self {
            Category::Values => format!("{environment}{}", settings.vals_file_env_post_string),
            Category::Variables => format!("{environment}{}", settings.vars_file_env_post_string),
            Category::Resources => settings.variable_tf_file.clone(),
            Category::Derived => settings.derived_file.clone(),
        }
    }

    /// File name of this category's combined output in the leaf directory
    pub fn combined_file_name(self, settings: &Settings) -> &str {
        match self {
            Category::Values => &settings.combined_vals_file,
            Category::Variables => &settings.combined_vars_file,
            Category::Resources => &settings.combined_tf_file,
            Category::Derived => &settings.combined_derived_file,
        }
    }

    pub fn is_templated(self) -> bool {
        matches!(self, Category::Derived)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Values => "values",
            Category::Variables => "variables",
            Category::Resources => "resources",
            Category::Derived => "derived",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("Unknown category {0:?} (expected one of: values, variables, resources, derived)")]
pub struct UnknownCategory(pub String);
