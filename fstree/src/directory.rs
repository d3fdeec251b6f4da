use std::cell::RefCell;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::error::{FsTreeError, Result};
use crate::query::{MassQuery, Query, Step};

/// A directory node in an [`crate::Directory`] tree.
///
/// Children are owned (`Rc<RefCell<Directory<F>>>`); the link back to the
/// enclosing directory is a non-owning [`Weak`] reference, so the tree has a
/// single owner and no reference cycles — see spec note on parent
/// back-references.
pub struct Directory<F> {
    name: String,
    parent: Weak<RefCell<Directory<F>>>,
    files: IndexMap<String, F>,
    directories: IndexMap<String, Rc<RefCell<Directory<F>>>>,
}

pub type DirHandle<F> = Rc<RefCell<Directory<F>>>;

impl<F> Directory<F> {
    /// Creates a new, parentless root directory.
    pub fn root(name: impl Into<String>) -> DirHandle<F> {
        Rc::new(RefCell::new(Directory {
            name: name.into(),
            parent: Weak::new(),
            files: IndexMap::new(),
            directories: IndexMap::new(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Files directly in this directory, in insertion order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &F)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Subdirectories directly in this directory, in insertion order.
    pub fn directories(&self) -> impl Iterator<Item = (&str, &DirHandle<F>)> {
        self.directories.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Walks the parent chain to reconstruct this directory's full path.
    pub fn stack_trace(&self) -> Vec<String> {
        match self.parent.upgrade() {
            None => vec![self.name.clone()],
            Some(parent) => {
                let mut trace = parent.borrow().stack_trace();
                trace.push(self.name.clone());
                trace
            }
        }
    }

    /// Inserts a file at the path carried by `query`, auto-creating
    /// directories along the way. Fails with [`FsTreeError::Duplicate`] if a
    /// file of that name already exists in the terminal directory.
    pub fn insert(this: &DirHandle<F>, mut query: Query<F>) -> Result<()> {
        match query.next_step()? {
            Step::Dir(name) => {
                let child = {
                    let existing = this.borrow().directories.get(&name).cloned();
                    match existing {
                        Some(child) => child,
                        None => {
                            let child = Rc::new(RefCell::new(Directory {
                                name: name.clone(),
                                parent: Rc::downgrade(this),
                                files: IndexMap::new(),
                                directories: IndexMap::new(),
                            }));
                            this.borrow_mut().directories.insert(name, child.clone());
                            child
                        }
                    }
                };
                Directory::insert(&child, query)
            }
            Step::File(name) => {
                let file = query
                    .file
                    .take()
                    .expect("insert query must carry a file payload");
                let mut dir = this.borrow_mut();
                if dir.files.contains_key(&name) {
                    return Err(FsTreeError::Duplicate(name));
                }
                dir.files.insert(name, file);
                Ok(())
            }
        }
    }

    /// Read-only counterpart to [`Directory::insert`]. Missing directories
    /// or files yield [`FsTreeError::NotFound`] unless `suppress_errors` is
    /// set, in which case `Ok(None)` is returned instead.
    pub fn lookup(
        this: &DirHandle<F>,
        mut query: Query<F>,
        suppress_errors: bool,
    ) -> Result<Option<F>>
    where
        F: Clone,
    {
        match query.next_step()? {
            Step::Dir(name) => {
                let child = this.borrow().directories.get(&name).cloned();
                match child {
                    Some(child) => Directory::lookup(&child, query, suppress_errors),
                    None if suppress_errors => Ok(None),
                    None => Err(FsTreeError::NotFound(name)),
                }
            }
            Step::File(name) => {
                let dir = this.borrow();
                match dir.files.get(&name) {
                    Some(file) => Ok(Some(file.clone())),
                    None if suppress_errors => Ok(None),
                    None => Err(FsTreeError::NotFound(name)),
                }
            }
        }
    }

    /// Depth-first search: children are visited (and their matches
    /// collected) before this directory's own files are filtered and
    /// appended, matching the recursive-then-local ordering the tree is
    /// built with.
    pub fn search(this: &DirHandle<F>, query: &MassQuery) -> Vec<(Vec<String>, F)>
    where
        F: Clone,
    {
        let dir = this.borrow();
        let mut results = Vec::new();
        for (_, child) in dir.directories.iter() {
            results.extend(Directory::search(child, query));
        }

        let trace = dir.stack_trace();
        for (name, file) in dir.files.iter() {
            if !query.survives_exclude(name) {
                continue;
            }
            if !query.survives_include(name) {
                continue;
            }
            let mut path = trace.clone();
            path.push(name.clone());
            results.push((path, file.clone()));
        }
        results
    }
}
