use crate::core::error::{GqlError, Result};
use crate::core::types::{FileMap, Variables};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    Key(String),
    Index(usize),
}

/// Returns a copy of `variables` with every file put back at its path.
///
/// A path may only land on a null slot. Keys containing `.` are matched
/// against the tree, so `root.a.b` reaches either `{"a.b": _}` or
/// `{"a": {"b": _}}`, whichever holds a null there.
pub fn merge_files(variables: &Variables, files: &FileMap, root: &str) -> Result<Variables> {
    let mut merged = variables.clone();

    for (path, handle) in files {
        let steps = resolve(&merged, path, root)?;
        let slot = follow(&mut merged, &steps)
            .ok_or_else(|| GqlError::PathNotFound(path.to_string()))?;
        *slot = Variables::Handle(handle.clone());
    }

    Ok(merged)
}

/// Finds the single null slot `path` names in `tree`.
pub(crate) fn resolve(tree: &Variables, path: &str, root: &str) -> Result<Vec<Step>> {
    let segments: Vec<&str> = match path.strip_prefix(root) {
        Some("") => Vec::new(),
        Some(rest) if rest.starts_with('.') => rest[1..].split('.').collect(),
        _ => {
            return Err(GqlError::RootMismatch {
                path: path.to_string(),
                root: root.to_string(),
            })
        }
    };

    let mut found = Vec::new();
    collect_slots(tree, &segments, &mut Vec::new(), &mut found);

    match found.len() {
        0 => Err(GqlError::PathNotFound(path.to_string())),
        1 => Ok(found.remove(0)),
        _ => Err(GqlError::PathCollision(path.to_string())),
    }
}

// Stops after two matches: that is already a collision.
fn collect_slots(
    node: &Variables,
    segments: &[&str],
    steps: &mut Vec<Step>,
    found: &mut Vec<Vec<Step>>,
) {
    if found.len() > 1 {
        return;
    }

    if segments.is_empty() {
        if node.is_null() {
            found.push(steps.clone());
        }
        return;
    }

    match node {
        Variables::Object(map) => {
            for taken in (1..=segments.len()).rev() {
                let key = segments[..taken].join(".");
                if let Some(child) = map.get(&key) {
                    steps.push(Step::Key(key));
                    collect_slots(child, &segments[taken..], steps, found);
                    steps.pop();
                }
            }
        }
        Variables::List(items) => {
            if let Some((index, child)) = segments[0]
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get(index).map(|child| (index, child)))
            {
                steps.push(Step::Index(index));
                collect_slots(child, &segments[1..], steps, found);
                steps.pop();
            }
        }
        _ => {}
    }
}

fn follow<'a>(tree: &'a mut Variables, steps: &[Step]) -> Option<&'a mut Variables> {
    let mut node = tree;
    for step in steps {
        let current = node;
        node = match (current, step) {
            (Variables::Object(map), Step::Key(key)) => map.get_mut(key)?,
            (Variables::List(items), Step::Index(index)) => items.get_mut(*index)?,
            _ => return None,
        };
    }
    Some(node)
}
