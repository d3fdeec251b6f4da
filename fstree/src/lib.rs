//! In-memory directory tree for decoded archive members.
//!
//! A [`Directory`] owns its children through `Rc<RefCell<_>>` and tracks its
//! parent through a non-owning `Weak` reference, so the tree has a single
//! owner and no reference cycles. [`Query`] walks a `/`-separated path one
//! component at a time to insert or look up a file; [`MassQuery`] drives a
//! depth-first [`Directory::search`] with exclude/include name filters.

pub mod directory;
pub mod error;
pub mod query;

pub use directory::{DirHandle, Directory};
pub use error::{FsTreeError, Result};
pub use query::{MassQuery, Matcher, Query, Step};

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Entry(&'static str);

    #[test]
    fn scenario_children_before_own_files() {
        let root = Directory::<Entry>::root("");
        Directory::insert(&root, Query::from_path("a/b/c", Some(Entry("c")))).unwrap();
        Directory::insert(&root, Query::from_path("a/b/d", Some(Entry("d")))).unwrap();
        Directory::insert(&root, Query::from_path("a/e", Some(Entry("e")))).unwrap();

        let found = Directory::search(&root, &MassQuery::new());
        let order: Vec<&str> = found.iter().map(|(_, e)| e.0).collect();
        assert_eq!(order, vec!["c", "d", "e"]);
    }

    #[test]
    fn lookup_returns_same_value_that_was_inserted() {
        let root = Directory::<Entry>::root("");
        Directory::insert(&root, Query::from_path("x/y", Some(Entry("payload")))).unwrap();
        let got = Directory::lookup(&root, Query::from_path("x/y", None), false).unwrap();
        assert_eq!(got, Some(Entry("payload")));
    }

    #[test]
    fn duplicate_insert_at_same_path_fails() {
        let root = Directory::<Entry>::root("");
        Directory::insert(&root, Query::from_path("x", Some(Entry("one")))).unwrap();
        let err = Directory::insert(&root, Query::from_path("x", Some(Entry("two"))));
        assert!(err.is_err());
    }

    #[test]
    fn search_paths_are_reconstructed_from_root() {
        let root = Directory::<Entry>::root("");
        Directory::insert(&root, Query::from_path("a/b/c", Some(Entry("c")))).unwrap();
        let found = Directory::search(&root, &MassQuery::new());
        let (path, _) = &found[0];
        assert_eq!(path, &vec!["".to_string(), "a".to_string(), "b".to_string(), "c".to_string()]);
    }
}
