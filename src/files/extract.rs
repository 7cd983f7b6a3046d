use crate::core::config::{ExtractConfig, DEFAULT_ROOT};
use crate::core::error::{GqlError, Result};
use crate::core::types::{FileMap, Variables};
use crate::files::merge::{merge_files, resolve};
use crate::files::predicate::{FileClassifier, FileTypes};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub variables: Variables,
    pub files: FileMap,
    /// Root token every key in `files` starts with.
    pub root: String,
}

impl Extraction {
    pub fn into_parts(self) -> (Variables, FileMap) {
        (self.variables, self.files)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Puts the files back, rebuilding the original variables.
    pub fn restore(&self) -> Result<Variables> {
        merge_files(&self.variables, &self.files, &self.root)
    }
}

pub struct Extractor<C = FileTypes> {
    config: ExtractConfig,
    classifier: C,
}

impl Extractor<FileTypes> {
    pub fn new(config: ExtractConfig) -> Self {
        Self::with_classifier(config, FileTypes::default())
    }
}

impl Default for Extractor<FileTypes> {
    fn default() -> Self {
        Self::new(ExtractConfig::default())
    }
}

impl<C: FileClassifier> Extractor<C> {
    pub fn with_classifier(config: ExtractConfig, classifier: C) -> Self {
        Self { config, classifier }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Trees deeper than the configured limit are rejected before the walk
    /// starts. Every file path must name exactly one slot of the result.
    pub fn extract(&self, variables: &Variables) -> Result<Extraction> {
        self.config.validate()?;

        if let Some(limit) = self.config.depth_limit() {
            let depth = variables.depth();
            if depth > limit {
                log::warn!("Refusing to extract files from variables {} levels deep", depth);
                return Err(GqlError::DepthLimitExceeded { depth, limit });
            }
        }

        let (extraction, collisions) = walk(variables, &self.config.root, &self.classifier);
        if let Some(path) = collisions.into_iter().next() {
            return Err(GqlError::PathCollision(path));
        }

        for path in extraction.files.keys() {
            resolve(&extraction.variables, path, &extraction.root)?;
        }

        Ok(extraction)
    }
}

/// Paths start with `variables`. No depth limit or path check is applied;
/// use [`Extractor`] for untrusted input.
pub fn extract_files(
    variables: &Variables,
    additional: Option<&FileTypes>,
) -> (Variables, FileMap) {
    let empty = FileTypes::default();
    let types = additional.unwrap_or(&empty);
    walk(variables, DEFAULT_ROOT, types).0.into_parts()
}

fn walk<C: FileClassifier>(
    variables: &Variables,
    root: &str,
    classifier: &C,
) -> (Extraction, Vec<String>) {
    let mut walker = Walker {
        classifier,
        path: root.to_string(),
        files: FileMap::new(),
        collisions: Vec::new(),
    };
    let nulled = walker.visit(variables);

    log::debug!("Extracted {} file(s) under {}", walker.files.len(), root);

    let extraction = Extraction {
        variables: nulled,
        files: walker.files,
        root: root.to_string(),
    };
    (extraction, walker.collisions)
}

struct Walker<'a, C> {
    classifier: &'a C,
    path: String,
    files: FileMap,
    collisions: Vec<String>,
}

impl<C: FileClassifier> Walker<'_, C> {
    fn visit(&mut self, node: &Variables) -> Variables {
        match node {
            Variables::List(items) => Variables::List(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| self.descend(&index.to_string(), item))
                    .collect(),
            ),
            Variables::Object(map) => Variables::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), self.descend(key, value)))
                    .collect(),
            ),
            Variables::Handle(handle) if self.classifier.is_file_like(handle) => {
                log::trace!("Extracted file at {}", self.path);
                if self.files.insert(self.path.clone(), handle.clone()).is_some() {
                    log::warn!("Two files share the path {}, keeping the last one", self.path);
                    self.collisions.push(self.path.clone());
                }
                Variables::Null
            }
            leaf => leaf.clone(),
        }
    }

    fn descend(&mut self, segment: &str, node: &Variables) -> Variables {
        let len = self.path.len();
        self.path.push('.');
        self.path.push_str(segment);
        let result = self.visit(node);
        self.path.truncate(len);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ExtractConfigBuilder;
    use crate::core::types::{Handle, Upload};
    use proptest::prelude::*;
    use serde_json::json;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn upload(content: &str) -> Handle {
        Handle::upload(Upload::from_bytes(content.as_bytes().to_vec()))
    }

    #[test]
    fn test_no_files_copies_tree() {
        init_logger();
        let vars = Variables::from(json!({
            "input": {"title": "hello", "tags": ["a", "b"], "count": 2, "draft": null}
        }));

        let (nulled, files) = extract_files(&vars, None);
        assert_eq!(nulled, vars);
        assert!(files.is_empty());
    }

    #[test]
    fn test_single_file() {
        init_logger();
        let file = upload("avatar");
        let vars = Variables::object([("file", file.clone())]);

        let (nulled, files) = extract_files(&vars, None);
        assert_eq!(nulled, Variables::from(json!({"file": null})));
        assert_eq!(files.len(), 1);
        assert!(files["variables.file"].ptr_eq(&file));
    }

    #[test]
    fn test_file_list() {
        init_logger();
        let first = upload("one");
        let second = upload("two");
        let vars = Variables::object([(
            "files",
            Variables::from(vec![first.clone(), second.clone()]),
        )]);

        let (nulled, files) = extract_files(&vars, None);
        assert_eq!(nulled, Variables::from(json!({"files": [null, null]})));
        assert_eq!(files.keys().collect::<Vec<_>>(), ["variables.files.0", "variables.files.1"]);
        assert_eq!(files["variables.files.0"], first);
        assert_eq!(files["variables.files.1"], second);
    }

    #[test]
    fn test_nested_paths_with_custom_root() {
        init_logger();
        let file = upload("doc");
        let vars = Variables::object([(
            "input",
            Variables::object([
                ("file", Variables::from(file.clone())),
                ("name", Variables::from("report.pdf")),
            ]),
        )]);

        let config = ExtractConfigBuilder::new().root("root").build();
        let extraction = Extractor::new(config).extract(&vars).unwrap();

        assert_eq!(extraction.root, "root");
        assert_eq!(
            extraction.variables,
            Variables::from(json!({"input": {"file": null, "name": "report.pdf"}}))
        );
        assert_eq!(extraction.files.get("root.input.file"), Some(&file));
    }

    #[test]
    fn test_input_is_not_mutated() {
        let vars = Variables::object([("file", upload("x"))]);
        let before = vars.clone();

        let _ = extract_files(&vars, None);
        assert_eq!(vars, before);
        assert!(vars.get("file").and_then(Variables::as_handle).is_some());
    }

    #[test]
    fn test_repeated_extraction_is_stable() {
        let vars = Variables::object([
            ("b", Variables::from(vec![upload("1"), upload("2")])),
            ("a", Variables::from(upload("3"))),
        ]);

        let first = extract_files(&vars, None);
        let second = extract_files(&vars, None);
        assert_eq!(first.0, second.0);
        assert_eq!(
            first.1.keys().collect::<Vec<_>>(),
            second.1.keys().collect::<Vec<_>>()
        );
        assert_eq!(first.1, second.1);
    }

    #[test]
    fn test_unregistered_handles_pass_through() {
        struct Token;
        struct Blob;

        let token = Handle::new(Token);
        let blob = Handle::new(Blob);
        let vars = Variables::object([("token", token.clone()), ("blob", blob.clone())]);

        let (nulled, files) = extract_files(&vars, None);
        assert!(files.is_empty());
        assert_eq!(nulled.get("token"), Some(&Variables::Handle(token.clone())));

        let types = FileTypes::new().with::<Blob>();
        let (nulled, files) = extract_files(&vars, Some(&types));
        assert_eq!(files.get("variables.blob"), Some(&blob));
        assert!(nulled.get("blob").map(Variables::is_null).unwrap_or(false));
        assert_eq!(nulled.get("token"), Some(&Variables::Handle(token)));
    }

    #[test]
    fn test_root_level_file() {
        let file = upload("root");
        let (nulled, files) = extract_files(&Variables::from(file.clone()), None);
        assert!(nulled.is_null());
        assert_eq!(files.get("variables"), Some(&file));
    }

    #[test]
    fn test_custom_classifier() {
        let config = ExtractConfig::default();
        let extractor = Extractor::with_classifier(config, |handle: &Handle| handle.is::<u64>());

        let id = Handle::new(9u64);
        let vars = Variables::object([("id", Variables::from(id.clone())), ("file", upload("f").into())]);

        let extraction = extractor.extract(&vars).unwrap();
        assert_eq!(extraction.len(), 1);
        assert_eq!(extraction.files.get("variables.id"), Some(&id));
        assert!(extraction.variables.get("file").and_then(Variables::as_handle).is_some());
    }

    #[test]
    fn test_depth_limit() {
        init_logger();
        let mut vars = Variables::from(upload("deep"));
        for _ in 0..9 {
            vars = Variables::from(vec![vars]);
        }
        assert_eq!(vars.depth(), 10);

        let exact = Extractor::new(ExtractConfigBuilder::new().max_depth(10).build());
        let extraction = exact.extract(&vars).unwrap();
        assert!(extraction.files.contains_key("variables.0.0.0.0.0.0.0.0.0"));

        let shallow = Extractor::new(ExtractConfigBuilder::new().max_depth(9).build());
        assert!(matches!(
            shallow.extract(&vars),
            Err(GqlError::DepthLimitExceeded { depth: 10, limit: 9 })
        ));

        let unlimited = Extractor::new(ExtractConfigBuilder::new().unlimited_depth().build());
        assert!(!unlimited.extract(&vars).unwrap().is_empty());
    }

    #[test]
    fn test_restore() {
        let vars = Variables::object([
            ("input", Variables::object([("files", Variables::from(vec![upload("a"), upload("b")]))])),
            ("cover", Variables::from(upload("c"))),
            ("title", Variables::from("album")),
        ]);

        let extraction = Extractor::default().extract(&vars).unwrap();
        assert_eq!(extraction.len(), 3);
        assert_eq!(extraction.restore().unwrap(), vars);
    }

    fn variables_strategy() -> impl Strategy<Value = Variables> {
        let leaf = prop_oneof![
            Just(Variables::Null),
            any::<bool>().prop_map(Variables::from),
            any::<i64>().prop_map(Variables::from),
            "[a-z ]{0,8}".prop_map(Variables::from),
            "[a-z]{0,8}".prop_map(|s| Variables::from(Upload::from_bytes(s))),
        ];
        leaf.prop_recursive(4, 48, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Variables::List),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..6).prop_map(Variables::Object),
            ]
        })
    }

    fn count_uploads(vars: &Variables) -> usize {
        match vars {
            Variables::List(items) => items.iter().map(count_uploads).sum(),
            Variables::Object(map) => map.values().map(count_uploads).sum(),
            Variables::Handle(handle) if handle.is::<Upload>() => 1,
            _ => 0,
        }
    }

    #[test]
    fn test_dotted_key_round_trip() {
        let file = upload("dotted");
        let vars = Variables::object([("a.b", file.clone())]);

        let extraction = Extractor::default().extract(&vars).unwrap();
        assert_eq!(extraction.files.get("variables.a.b"), Some(&file));
        assert_eq!(extraction.restore().unwrap(), vars);
    }

    #[test]
    fn test_shared_path_is_rejected() {
        init_logger();
        let vars = Variables::object([
            ("a.b", Variables::from(upload("flat"))),
            ("a", Variables::object([("b", upload("nested"))])),
        ]);

        assert!(matches!(
            Extractor::default().extract(&vars),
            Err(GqlError::PathCollision(p)) if p == "variables.a.b"
        ));

        let (_, files) = extract_files(&vars, None);
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_file_path_shadowed_by_null_is_rejected() {
        let vars = Variables::object([
            ("a.b", Variables::Null),
            ("a", Variables::object([("b", upload("nested"))])),
        ]);

        assert!(matches!(
            Extractor::default().extract(&vars),
            Err(GqlError::PathCollision(_))
        ));
    }

    #[test]
    fn test_invalid_root_is_rejected() {
        let vars = Variables::object([("file", upload("f"))]);

        for root in ["", "a.b"] {
            let extractor = Extractor::new(ExtractConfigBuilder::new().root(root).build());
            assert!(matches!(
                extractor.extract(&vars),
                Err(GqlError::Configuration(_))
            ));
        }
    }

    fn dotted_variables_strategy() -> impl Strategy<Value = Variables> {
        let leaf = prop_oneof![
            Just(Variables::Null),
            any::<i64>().prop_map(Variables::from),
            "[a-z]{0,8}".prop_map(|s| Variables::from(Upload::from_bytes(s))),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Variables::List),
                prop::collection::btree_map("[a-z.]{1,6}", inner, 0..4).prop_map(Variables::Object),
            ]
        })
    }

    proptest! {
        #[test]
        fn test_extract_then_restore(vars in variables_strategy()) {
            let extraction = Extractor::default().extract(&vars).unwrap();
            prop_assert_eq!(extraction.len(), count_uploads(&vars));
            prop_assert_eq!(count_uploads(&extraction.variables), 0);
            prop_assert_eq!(extraction.restore().unwrap(), vars);
        }

        #[test]
        fn test_extract_then_restore_with_dotted_keys(vars in dotted_variables_strategy()) {
            match Extractor::default().extract(&vars) {
                Ok(extraction) => {
                    prop_assert_eq!(extraction.len(), count_uploads(&vars));
                    prop_assert_eq!(extraction.restore().unwrap(), vars);
                }
                Err(GqlError::PathCollision(_)) => {}
                Err(e) => prop_assert!(false, "unexpected error: {}", e),
            }
        }
    }
}
