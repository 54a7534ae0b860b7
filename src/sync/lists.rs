use std::collections::HashMap;

use crate::remote::RemoteTaskList;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct ResolvedList<'a> {
    pub id: &'a str,
    pub title: &'a str,
}

/// Title-to-id index over the remote task lists seen in one pass.
/// When titles repeat, the first list with that title wins.
pub(super) struct ListDirectory {
    lists: Vec<RemoteTaskList>,
    by_title: HashMap<String, usize>,
}

impl ListDirectory {
    pub fn new(lists: Vec<RemoteTaskList>) -> Self {
        let mut by_title = HashMap::new();
        for (index, list) in lists.iter().enumerate() {
            by_title.entry(list.title.clone()).or_insert(index);
        }
        Self { lists, by_title }
    }

    fn at(&self, index: usize) -> ResolvedList<'_> {
        let list = &self.lists[index];
        ResolvedList {
            id: &list.id,
            title: &list.title,
        }
    }

    pub fn resolve(&self, list_name: &str) -> Option<ResolvedList<'_>> {
        self.by_title.get(list_name).map(|index| self.at(*index))
    }

    /// Exact title match, else the account's first list.
    pub fn resolve_or_default(&self, list_name: &str) -> Option<ResolvedList<'_>> {
        self.resolve(list_name)
            .or_else(|| (!self.lists.is_empty()).then(|| self.at(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::ListDirectory;
    use crate::remote::RemoteTaskList;

    fn list(id: &str, title: &str) -> RemoteTaskList {
        RemoteTaskList {
            id: id.to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    fn resolves_exact_titles_and_falls_back_to_first_list() {
        let directory = ListDirectory::new(vec![list("L0", "My Tasks"), list("L1", "Errands")]);

        let errands = directory.resolve("Errands").expect("exact title resolves");
        assert_eq!(errands.id, "L1");
        assert!(directory.resolve("errands").is_none());

        let fallback = directory
            .resolve_or_default("Garden")
            .expect("first list is the fallback");
        assert_eq!((fallback.id, fallback.title), ("L0", "My Tasks"));
    }

    #[test]
    fn empty_account_has_no_fallback() {
        let directory = ListDirectory::new(Vec::new());
        assert!(directory.resolve_or_default("Anything").is_none());
    }

    #[test]
    fn duplicate_titles_keep_first_occurrence() {
        let directory = ListDirectory::new(vec![list("L1", "Work"), list("L2", "Work")]);
        assert_eq!(directory.resolve("Work").map(|l| l.id), Some("L1"));
    }
}
