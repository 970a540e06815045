use crate::graph::PeerGraph;
use petgraph::unionfind::UnionFind;
use std::collections::HashMap;

impl PeerGraph {
    /// Connected components of the undirected view, largest first.
    ///
    /// Addresses inside a component are ascending; components of equal size
    /// are ordered by their first address. Isolated nodes form components of
    /// size one.
    pub fn connected_components(&self) -> Vec<Vec<String>> {
        self.component_groups()
            .into_iter()
            .map(|ids| ids.into_iter().map(|id| self.address_of(id).to_string()).collect())
            .collect()
    }

    /// Component position (as ordered by [`PeerGraph::connected_components`])
    /// of every node id.
    pub(crate) fn component_labels(&self) -> Vec<usize> {
        let mut labels = vec![0; self.node_count()];
        for (position, ids) in self.component_groups().into_iter().enumerate() {
            for id in ids {
                labels[id] = position;
            }
        }
        labels
    }

    fn component_groups(&self) -> Vec<Vec<usize>> {
        let adjacency = self.undirected_adjacency();
        let mut sets = UnionFind::<usize>::new(adjacency.len());
        for (v, neighbours) in adjacency.iter().enumerate() {
            for &w in neighbours.iter().filter(|&&w| w > v) {
                sets.union(v, w);
            }
        }

        let mut groups: HashMap<usize, Vec<usize>> = HashMap::new();
        for id in 0..adjacency.len() {
            groups.entry(sets.find_mut(id)).or_default().push(id);
        }

        // Ids were pushed in ascending order, so each group is already sorted.
        let mut groups: Vec<Vec<usize>> = groups.into_values().collect();
        groups.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));
        groups
    }
}
