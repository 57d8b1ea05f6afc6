use std::collections::{BTreeSet, HashMap};

use crate::{myprocess::Pid, source::ProcessSource};

/// `root` and every process transitively spawned by it, listed fresh.
///
/// If the source cannot list processes at all the cycle gets an empty tree;
/// the next call starts over.
pub fn descendants(source: &dyn ProcessSource, root: Pid) -> BTreeSet<Pid> {
    match source.parent_links() {
        Ok(links) => descendants_from_links(root, &links),
        Err(err) => {
            log::debug!("process listing unavailable: {err}");
            BTreeSet::new()
        }
    }
}

///children of each parent, from one pass over the listing
fn children_of(links: &[(Pid, Pid)]) -> HashMap<Pid, Vec<Pid>> {
    let mut children: HashMap<Pid, Vec<Pid>> = HashMap::new();
    for &(pid, parent) in links {
        if pid != parent {
            children.entry(parent).or_default().push(pid);
        }
    }
    children
}

pub fn descendants_from_links(root: Pid, links: &[(Pid, Pid)]) -> BTreeSet<Pid> {
    let children = children_of(links);
    let mut tree = BTreeSet::new();
    let mut stack = vec![root];
    //the visited set breaks loops that pid reuse can briefly produce
    while let Some(pid) = stack.pop() {
        if !tree.insert(pid) {
            continue;
        }
        if let Some(kids) = children.get(&pid) {
            stack.extend(kids.iter().copied().filter(|kid| !tree.contains(kid)));
        }
    }
    tree
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::tests::FakeSource;

    fn set(pids: &[Pid]) -> BTreeSet<Pid> {
        pids.iter().copied().collect()
    }

    #[test]
    fn transitive_children_are_included() {
        //1 is init, 10 is the root, 11 its child, 12 a grandchild
        let links = [(1, 0), (10, 1), (11, 10), (12, 11), (20, 1), (21, 20)];
        assert_eq!(descendants_from_links(10, &links), set(&[10, 11, 12]));
    }

    #[test]
    fn siblings_and_deep_chains() {
        let mut links = vec![(100, 1), (101, 100), (102, 100), (103, 102)];
        //long chain hanging off 101
        links.extend((200..400).map(|pid| (pid, if pid == 200 { 101 } else { pid - 1 })));

        let tree = descendants_from_links(100, &links);
        assert_eq!(tree.len(), 4 + 200);
        assert!(tree.contains(&399));
    }

    #[test]
    fn root_is_included_even_when_unlisted() {
        assert_eq!(descendants_from_links(42, &[(1, 0)]), set(&[42]));
    }

    #[test]
    fn parent_loops_terminate() {
        let links = [(5, 6), (6, 5), (7, 7)];
        assert_eq!(descendants_from_links(5, &links), set(&[5, 6]));
        assert_eq!(descendants_from_links(7, &links), set(&[7]));
    }

    #[test]
    fn failed_listing_gives_no_tree() {
        let source = FakeSource::default();
        assert!(descendants(&source, 1).is_empty());

        let source = FakeSource::with_links(&[(2, 1), (3, 2)]);
        assert_eq!(descendants(&source, 1), set(&[1, 2, 3]));
    }
}
