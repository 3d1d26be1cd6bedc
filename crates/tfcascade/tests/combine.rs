//! Combining fragment trees on disk
//!
//! Every test builds its own tree in a temporary directory:
//!
//! ```text
//! <root>/env/...
//! <root>/foo/env/...
//! <root>/foo/bar/env/...   <- leaf
//! ```

use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tfcascade::render::TemplateError;
use tfcascade::{Category, CombineError, Combiner, Descriptor};

struct Tree {
    dir: tempfile::TempDir,
}

impl Tree {
    fn new() -> Self {
        let tree = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        std::fs::create_dir_all(tree.leaf()).unwrap();
        tree
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn leaf(&self) -> PathBuf {
        self.root().join("foo/bar")
    }

    /// Write `contents` to `<root>/<layer>/env/<file>`
    fn fragment(&self, layer: &str, file: &str, contents: &str) -> PathBuf {
        let path = self.root().join(layer).join("env").join(file);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn descriptor(&self) -> Descriptor {
        tfcascade::resolve(self.root(), self.leaf(), "dev").unwrap()
    }

    fn read(&self, file: &str) -> String {
        std::fs::read_to_string(self.leaf().join(file)).unwrap()
    }

    fn leaf_entries(&self) -> Vec<String> {
        let mut entries: Vec<_> = std::fs::read_dir(self.leaf())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        entries.sort();
        entries
    }
}

fn combiner() -> Combiner {
    Combiner::liquid().unwrap()
}

#[test]
fn values_in_layer_order() {
    let tree = Tree::new();
    tree.fragment("", "dev.tfvars", "region = \"eu-west-1\"\n");
    tree.fragment("foo/bar", "dev.tfvars", "region = \"us-east-1\"\ncidr = \"10.0.0.0/16\"");
    tree.fragment("foo", "prod.tfvars", "ignored = true\n");

    combiner().combine(&tree.descriptor(), Category::Values).unwrap();

    insta::assert_snapshot!(tree.read("_combined.tfvars"), @r###"
    # This file generated by tfcascade.
    region = "eu-west-1"
    region = "us-east-1"
    cidr = "10.0.0.0/16"
    "###);
}

#[test]
fn verbatim_categories_copy_bytes() {
    let tree = Tree::new();
    let latin1 = b"# caf\xe9\na = 1\n";
    for (layer, file) in [
        ("", "dev.tfvars"),
        ("foo", "dev_variables.tf"),
        ("foo/bar", "variables.tf"),
    ] {
        let path = tree.fragment(layer, file, "");
        std::fs::write(path, latin1).unwrap();
    }
    let descriptor = tree.descriptor();

    for category in [Category::Values, Category::Variables, Category::Resources] {
        let combined = combiner().combine(&descriptor, category).unwrap();

        let mut expected = b"# This file generated by tfcascade.\n".to_vec();
        expected.extend_from_slice(latin1);
        assert_eq!(std::fs::read(combined).unwrap(), expected, "{category}");
    }
}

#[test]
fn derived_must_be_utf8() {
    let tree = Tree::new();
    let path = tree.fragment("foo", "derived.tfvars", "");
    std::fs::write(&path, b"# caf\xe9\n").unwrap();

    let err = combiner()
        .combine(&tree.descriptor(), Category::Derived)
        .expect_err("templates are text");

    assert!(matches!(
        err,
        CombineError::Template {
            source: TemplateError::Utf8(_),
            ..
        }
    ));
    assert_eq!(err.path(), Some(path.as_path()));
    assert!(tree.leaf_entries().is_empty());
}

#[test]
fn all_categories() {
    let tree = Tree::new();
    tree.fragment("", "dev_variables.tf", "variable \"region\" {}\n");
    tree.fragment("foo", "variables.tf", "resource \"null_resource\" \"foo\" {}\n");
    tree.fragment("foo/bar", "derived.tfvars", "name = \"{{ tmpl_name }}-{{ environment }}\"\n");

    let written = combiner().combine_all(&tree.descriptor()).unwrap();

    assert_eq!(written.len(), 4);
    assert_eq!(
        tree.leaf_entries(),
        [
            "_combined.tf",
            "_combined.tfvars",
            "_combined_derived.tf",
            "_combined_variables.tf",
            "env"
        ]
    );
    assert_eq!(
        tree.read("_combined.tfvars"),
        "# This file generated by tfcascade.\n"
    );
    assert_eq!(
        tree.read("_combined_variables.tf"),
        "# This file generated by tfcascade.\nvariable \"region\" {}\n"
    );
    assert_eq!(
        tree.read("_combined.tf"),
        "# This file generated by tfcascade.\nresource \"null_resource\" \"foo\" {}\n"
    );
    assert_eq!(
        tree.read("_combined_derived.tf"),
        "# This file generated by tfcascade.\nname = \"bar-dev\"\n"
    );
}

#[test]
fn derived_sees_its_layer() {
    let tree = Tree::new();
    for layer in ["", "foo", "foo/bar"] {
        tree.fragment(layer, "derived.tfvars", "# {{ depth }}: {{ layer }}\n");
    }

    combiner().combine(&tree.descriptor(), Category::Derived).unwrap();

    let root = tree.root().display();
    assert_eq!(
        tree.read("_combined_derived.tf"),
        format!(
            "# This file generated by tfcascade.\n# 0: {root}\n# 1: {root}/foo\n# 2: {root}/foo/bar\n"
        )
    );
}

#[test]
fn idempotent() {
    let tree = Tree::new();
    tree.fragment("", "dev.tfvars", "a = 1\n");
    tree.fragment("foo", "derived.tfvars", "b = \"{{ environment }}\"\n");
    let descriptor = tree.descriptor();

    combiner().combine_all(&descriptor).unwrap();
    let first: Vec<_> = Category::ALL
        .iter()
        .map(|category| std::fs::read(descriptor.category(*category).combined()).unwrap())
        .collect();

    combiner().combine_all(&descriptor).unwrap();
    let second: Vec<_> = Category::ALL
        .iter()
        .map(|category| std::fs::read(descriptor.category(*category).combined()).unwrap())
        .collect();

    assert_eq!(first, second);
}

#[test]
fn fragment_replaced_by_directory() {
    let tree = Tree::new();
    tree.fragment("", "dev.tfvars", "a = 1\n");
    let broken = tree.root().join("foo/env/dev.tfvars");
    std::fs::create_dir_all(&broken).unwrap();

    let err = combiner()
        .combine(&tree.descriptor(), Category::Values)
        .expect_err("a directory is not a fragment");

    assert!(matches!(err, CombineError::Io { .. }));
    assert_eq!(err.path(), Some(broken.as_path()));
    assert!(tree.leaf_entries().is_empty());
}

#[test]
fn failure_keeps_previous_combined_file() {
    let tree = Tree::new();
    let combined = tree.leaf().join("_combined.tfvars");
    std::fs::write(&combined, "previous\n").unwrap();
    std::fs::create_dir_all(tree.root().join("foo/bar/env/dev.tfvars")).unwrap();

    combiner()
        .combine(&tree.descriptor(), Category::Values)
        .expect_err("a directory is not a fragment");

    assert_eq!(std::fs::read_to_string(combined).unwrap(), "previous\n");
    assert_eq!(tree.leaf_entries(), ["_combined.tfvars", "env"]);
}

#[test]
fn combine_all_names_failing_category() {
    let tree = Tree::new();
    std::fs::create_dir_all(tree.root().join("foo/env/variables.tf")).unwrap();

    let err = combiner()
        .combine_all(&tree.descriptor())
        .expect_err("resources are broken");

    assert_eq!(err.category, Category::Resources);
    // categories before the failing one were written, later ones were not attempted
    assert_eq!(
        tree.leaf_entries(),
        ["_combined.tfvars", "_combined_variables.tf"]
    );
}

#[test]
fn combine_each_isolates_failures() {
    let tree = Tree::new();
    std::fs::create_dir_all(tree.root().join("foo/env/variables.tf")).unwrap();
    tree.fragment("", "derived.tfvars", "x = {{ unknown_variable }}\n");

    let report = combiner().combine_each(&tree.descriptor(), Category::ALL);

    assert!(report[&Category::Values].is_ok());
    assert!(report[&Category::Variables].is_ok());
    assert!(matches!(
        report[&Category::Resources],
        Err(CombineError::Io { .. })
    ));
    match &report[&Category::Derived] {
        Err(CombineError::Template { path, .. }) => {
            assert_eq!(path, &tree.root().join("env/derived.tfvars"))
        }
        other => panic!("expected template error, got {other:?}"),
    }
}

#[test]
fn concurrently_matches_sequential() {
    let tree = Tree::new();
    tree.fragment("", "dev.tfvars", "a = 1\n");
    tree.fragment("foo", "dev_variables.tf", "variable \"a\" {}\n");
    tree.fragment("foo/bar", "variables.tf", "locals {}\n");
    tree.fragment("", "derived.tfvars", "e = \"{{ environment }}\"\n");
    let descriptor = tree.descriptor();

    let sequential = combiner().combine_all(&descriptor).unwrap();
    let expected: Vec<_> = sequential
        .iter()
        .map(|path| std::fs::read(path).unwrap())
        .collect();

    let report = combiner().combine_concurrently(&descriptor);
    let keys: Vec<_> = report.keys().copied().collect();
    assert_eq!(keys, Category::ALL);

    let actual: Vec<_> = report
        .into_values()
        .map(|result| std::fs::read(result.unwrap()).unwrap())
        .collect();
    assert_eq!(actual, expected);
}

#[test]
fn timeout_keeps_previous_combined_file() {
    let tree = Tree::new();
    tree.fragment("", "dev.tfvars", "a = 1\n");
    let combined = tree.leaf().join("_combined.tfvars");
    std::fs::write(&combined, "previous\n").unwrap();

    let err = combiner()
        .with_deadline(Instant::now())
        .combine(&tree.descriptor(), Category::Values)
        .expect_err("deadline passed");

    assert!(matches!(err, CombineError::TimedOut));
    assert_eq!(std::fs::read_to_string(combined).unwrap(), "previous\n");
    assert_eq!(tree.leaf_entries(), ["_combined.tfvars"]);
}

#[test]
fn clean_removes_combined_files() {
    let tree = Tree::new();
    let descriptor = tree.descriptor();
    combiner().combine(&descriptor, Category::Values).unwrap();

    tfcascade::clean(&descriptor).unwrap();

    assert!(tree.leaf_entries().is_empty());
}

#[test]
fn settings_file_renames_everything() {
    let tree = Tree::new();
    std::fs::write(
        tree.root().join(".tfcascade.yaml"),
        "environments_dir: environments\n\
         autogenerate_comment: managed by ops\n\
         combined_vals_file: all.auto.tfvars\n",
    )
    .unwrap();
    let fragment = tree.root().join("foo/environments/dev.tfvars");
    std::fs::create_dir_all(fragment.parent().unwrap()).unwrap();
    std::fs::write(&fragment, "a = 1\n").unwrap();

    let descriptor = Descriptor::load_in_tree(tree.leaf(), "dev").unwrap();
    combiner().combine(&descriptor, Category::Values).unwrap();

    assert_eq!(tree.read("all.auto.tfvars"), "# managed by ops\na = 1\n");
}
