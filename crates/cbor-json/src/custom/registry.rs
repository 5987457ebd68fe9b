//! Process-wide class-tag registry.
//!
//! Two lookups are kept in sync: class tag -> class and class -> class tag.
//! The built-in classes are registered the first time the registry is touched;
//! nothing is ever removed.

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{OnceLock, PoisonError, RwLock};

use super::{builtin, CustomClass, ObjectRef};
use crate::error::RegistrationError;

/// Prefix reserved for internal and placeholder tags.
pub const RESERVED_PREFIX: char = '~';

/// Everything decoding needs to know about a registered class.
#[derive(Debug, Clone, Copy)]
pub struct ClassHandle {
    pub name: &'static str,
    pub class_tag: &'static str,
    pub descriptor: Option<&'static str>,
    construct: fn() -> ObjectRef,
}

impl ClassHandle {
    fn of<T: CustomClass>() -> Self {
        Self {
            name: T::class_name(),
            class_tag: T::CLASS_TAG,
            descriptor: T::DESCRIPTOR,
            construct: construct::<T>,
        }
    }

    /// A fresh, default-initialized instance.
    pub fn instantiate(&self) -> ObjectRef {
        (self.construct)()
    }

    /// The `$class` text for the jsonable form.
    pub fn descriptor_text(&self) -> String {
        match self.descriptor {
            Some(d) => d.to_owned(),
            None => format!("Object with class tag \"{}\"", self.class_tag),
        }
    }
}

fn construct<T: CustomClass>() -> ObjectRef {
    Rc::new(RefCell::new(T::default()))
}

/// The two-way class table. The global instance behind [`register`] and
/// [`lookup`] is one of these.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    by_tag: HashMap<&'static str, (TypeId, ClassHandle)>,
    by_class: HashMap<TypeId, &'static str>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: CustomClass>(&mut self) -> Result<(), RegistrationError> {
        let type_id = TypeId::of::<T>();
        if self.by_class.contains_key(&type_id) {
            return Ok(());
        }
        let handle = ClassHandle::of::<T>();
        let class_tag = handle.class_tag;
        if class_tag.is_empty() {
            return Err(RegistrationError::MissingClassTag {
                class: handle.name.to_owned(),
            });
        }
        if class_tag.starts_with(RESERVED_PREFIX) {
            return Err(RegistrationError::ReservedPrefix {
                class: handle.name.to_owned(),
                class_tag: class_tag.to_owned(),
            });
        }
        if let Some((_, existing)) = self.by_tag.get(class_tag) {
            return Err(RegistrationError::Conflict {
                class: handle.name.to_owned(),
                class_tag: class_tag.to_owned(),
                existing: existing.name.to_owned(),
            });
        }

        tracing::debug!(class = handle.name, class_tag, "registered custom class");
        self.by_tag.insert(class_tag, (type_id, handle));
        self.by_class.insert(type_id, class_tag);
        Ok(())
    }

    pub fn lookup(&self, class_tag: &str) -> Option<ClassHandle> {
        self.by_tag.get(class_tag).map(|(_, handle)| *handle)
    }

    pub fn class_tag_of<T: CustomClass>(&self) -> Option<&'static str> {
        self.by_class.get(&TypeId::of::<T>()).copied()
    }

    pub fn describe(&self, class_tag: &str) -> String {
        match self.lookup(class_tag) {
            Some(handle) => handle.descriptor_text(),
            None => format!("<unrecognized class tag \"{class_tag}\">"),
        }
    }

    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}

fn global() -> &'static RwLock<ClassRegistry> {
    static REGISTRY: OnceLock<RwLock<ClassRegistry>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut registry = ClassRegistry::new();
        builtin::register_all(&mut registry);
        RwLock::new(registry)
    })
}

/// Registers `T` process-wide. Registering the same class again is a no-op.
pub fn register<T: CustomClass>() -> Result<(), RegistrationError> {
    global()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register::<T>()
}

/// Finds the class bound to `class_tag`.
pub fn lookup(class_tag: &str) -> Option<ClassHandle> {
    global()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .lookup(class_tag)
}

/// Human-readable description of the class bound to `class_tag`.
pub fn describe(class_tag: &str) -> String {
    global()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .describe(class_tag)
}

pub fn is_registered<T: CustomClass>() -> bool {
    global()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .class_tag_of::<T>()
        .is_some()
}
