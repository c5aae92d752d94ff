//! Event delegation over an arbitrary tree.

/// Walks from `start` through its ancestors and returns the first node
/// accepted by `matches`. `start` itself is tested first.
pub fn closest<N, P, M>(start: N, mut parent: P, mut matches: M) -> Option<N>
where
    N: Copy,
    P: FnMut(N) -> Option<N>,
    M: FnMut(N) -> bool,
{
    let mut current = Some(start);
    while let Some(node) = current {
        if matches(node) {
            return Some(node);
        }
        current = parent(node);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    // index -> parent index
    const PARENTS: [Option<usize>; 5] = [None, Some(0), Some(1), Some(2), Some(0)];

    fn parent(node: usize) -> Option<usize> {
        PARENTS[node]
    }

    #[test]
    fn start_node_matches_itself() {
        assert_eq!(closest(3, parent, |node| node == 3), Some(3));
    }

    #[test]
    fn walks_up_to_nearest_matching_ancestor() {
        assert_eq!(closest(3, parent, |node| node == 1 || node == 0), Some(1));
    }

    #[test]
    fn no_match_yields_none() {
        assert_eq!(closest(4, parent, |node| node == 2), None);
    }

    #[test]
    fn predicate_sees_each_node_once_in_order() {
        let mut visited = Vec::new();
        let found = closest(3, parent, |node| {
            visited.push(node);
            false
        });
        assert_eq!(found, None);
        assert_eq!(visited, vec![3, 2, 1, 0]);
    }
}
