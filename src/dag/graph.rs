// src/dag/graph.rs

use std::collections::BTreeMap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::dag::pipeline::Pipeline;
use crate::engine::TaskName;

/// Task graph of one pipeline (or of the watched tasks).
///
/// Edges point from a dependency to its dependent. Task names are unique per
/// pipeline (checked in `config::validate`), so nodes are keyed by name.
#[derive(Debug, Clone, Default)]
pub struct DagGraph {
    graph: DiGraph<TaskName, ()>,
    index: BTreeMap<TaskName, NodeIndex>,
}

impl DagGraph {
    /// Lower a pipeline: every task of step `i` depends on every task of
    /// step `i - 1`, which makes each step a barrier.
    pub fn from_pipeline(pipeline: &Pipeline) -> Self {
        let mut dag = Self::default();
        let mut previous: Vec<NodeIndex> = Vec::new();

        for step in &pipeline.steps {
            let current: Vec<NodeIndex> = step.tasks().iter().map(|t| dag.node(t)).collect();
            for &task in &current {
                for &dep in &previous {
                    dag.graph.update_edge(dep, task, ());
                }
            }
            previous = current;
        }

        dag
    }

    /// Graph without edges: each task runs on its own. Used by watch mode,
    /// where a change re-runs exactly the subscribed task.
    pub fn independent<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut dag = Self::default();
        for name in names {
            dag.node(name);
        }
        dag
    }

    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    /// Return all task names, sorted.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(|s| s.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Immediate dependencies of a task, sorted.
    pub fn dependencies_of(&self, name: &str) -> Vec<TaskName> {
        self.neighbors(name, Direction::Incoming)
    }

    /// Immediate dependents of a task, sorted.
    pub fn dependents_of(&self, name: &str) -> Vec<TaskName> {
        self.neighbors(name, Direction::Outgoing)
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Vec<TaskName> {
        let Some(&idx) = self.index.get(name) else {
            return Vec::new();
        };
        let mut names: Vec<TaskName> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].clone())
            .collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::pipeline::Step;

    #[test]
    fn steps_become_barriers() {
        let pipeline = Pipeline {
            name: "build".into(),
            steps: vec![
                Step::Task("clean".into()),
                Step::Parallel(vec!["html".into(), "styles".into()]),
                Step::Task("report".into()),
            ],
            serve: false,
            watch: false,
            keep_going: false,
        };
        let g = DagGraph::from_pipeline(&pipeline);

        assert!(g.dependencies_of("clean").is_empty());
        assert_eq!(g.dependencies_of("styles"), vec!["clean"]);
        assert_eq!(g.dependencies_of("report"), vec!["html", "styles"]);
        assert_eq!(g.dependents_of("clean"), vec!["html", "styles"]);
        assert!(g.dependents_of("report").is_empty());
        assert!(g.dependencies_of("deploy").is_empty());
    }

    #[test]
    fn independent_graph_has_no_edges() {
        let g = DagGraph::independent(["styles", "html"]);
        assert_eq!(g.tasks().collect::<Vec<_>>(), vec!["html", "styles"]);
        assert!(g.contains("html"));
        assert!(g.dependents_of("styles").is_empty());
    }
}
