use std::any::{Any, TypeId};
use std::collections::HashSet;

use crate::core::types::{Handle, Upload, Variables};

pub trait FileClassifier {
    fn is_file_like(&self, handle: &Handle) -> bool;
}

impl<F> FileClassifier for F
where
    F: Fn(&Handle) -> bool,
{
    fn is_file_like(&self, handle: &Handle) -> bool {
        self(handle)
    }
}

/// Extra handle types treated as file-like on top of [`Upload`].
#[derive(Debug, Clone, Default)]
pub struct FileTypes {
    ids: HashSet<TypeId>,
    names: Vec<&'static str>,
}

impl FileTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Any>(mut self) -> Self {
        self.insert::<T>();
        self
    }

    pub fn insert<T: Any>(&mut self) -> bool {
        let inserted = self.ids.insert(TypeId::of::<T>());
        if inserted {
            self.names.push(std::any::type_name::<T>());
        }
        inserted
    }

    pub fn contains(&self, type_id: TypeId) -> bool {
        self.ids.contains(&type_id)
    }

    pub fn matches(&self, handle: &Handle) -> bool {
        self.contains(handle.value_type_id())
    }

    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FileClassifier for FileTypes {
    fn is_file_like(&self, handle: &Handle) -> bool {
        handle.is::<Upload>() || self.matches(handle)
    }
}

// Only the handle's type is looked at; the object is never read.
pub fn is_file_like(value: &Variables, additional: Option<&FileTypes>) -> bool {
    match value {
        Variables::Handle(handle) => match additional {
            Some(types) => types.is_file_like(handle),
            None => handle.is::<Upload>(),
        },
        _ => false,
    }
}
