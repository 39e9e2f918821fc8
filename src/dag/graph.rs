// src/dag/graph.rs

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;
use tracing::{debug, trace};

use crate::errors::{DagbuildError, Result};
use crate::target::TargetRef;
use crate::task::{Inputs, Requirement, TaskRef};
use crate::types::{TaskKind, TaskName};

/// A task as resolved by the graph builder.
///
/// `requires()`, `output()` and `kind()` are called exactly once per task;
/// everything downstream works from this snapshot.
#[derive(Clone)]
pub struct TaskNode {
    pub name: TaskName,
    pub task: TaskRef,
    pub kind: TaskKind,
    pub output: Option<TargetRef>,
    /// Declared shape, kept for input resolution at run time.
    pub requirement: Requirement,
    /// Direct dependencies, deduplicated, in declaration order.
    pub deps: Vec<TaskName>,
}

impl std::fmt::Debug for TaskNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskNode")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("output", &self.output.as_ref().map(|t| t.location()))
            .field("deps", &self.deps)
            .finish()
    }
}

/// Dependency graph for one build, keyed by task name.
///
/// Edges point from a dependency to its dependent, so the petgraph
/// "outgoing" neighbours of a node are the tasks waiting on it.
#[derive(Debug, Clone)]
pub struct DagGraph {
    graph: DiGraph<TaskName, ()>,
    index: HashMap<TaskName, NodeIndex>,
    nodes: HashMap<TaskName, TaskNode>,
    /// Topological order: DFS post-order from the roots, so ties follow
    /// discovery order.
    order: Vec<TaskName>,
    roots: Vec<TaskName>,
}

impl DagGraph {
    /// Expand the full dependency closure of `roots`.
    ///
    /// Fails with [`DagbuildError::CyclicDependency`] when a task requires
    /// itself through any path, and with [`DagbuildError::MissingOutput`]
    /// when a producing or external task declares no output.
    pub fn build(roots: &[TaskRef]) -> Result<Self> {
        let mut builder = GraphBuilder::default();

        let mut root_names = Vec::new();
        for root in roots {
            builder.visit(root)?;
            let name = root.name().to_string();
            if !root_names.contains(&name) {
                root_names.push(name);
            }
        }

        let GraphBuilder { nodes, order, .. } = builder;

        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        for name in &order {
            index.insert(name.clone(), graph.add_node(name.clone()));
        }
        for name in &order {
            let to = index[name];
            for dep in &nodes[name].deps {
                graph.add_edge(index[dep], to, ());
            }
        }

        debug!(
            tasks = order.len(),
            edges = graph.edge_count(),
            ?root_names,
            "dependency graph built"
        );

        Ok(Self {
            graph,
            index,
            nodes,
            order,
            roots: root_names,
        })
    }

    /// All task names in topological order.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn topological_order(&self) -> &[TaskName] {
        &self.order
    }

    pub fn roots(&self) -> &[TaskName] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn node(&self, name: &str) -> Option<&TaskNode> {
        self.nodes.get(name)
    }

    /// Immediate dependencies of a task.
    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task, in topological order.
    pub fn dependents_of(&self, name: &str) -> Vec<TaskName> {
        let Some(&idx) = self.index.get(name) else {
            return Vec::new();
        };
        let direct: HashSet<&TaskName> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|n| &self.graph[n])
            .collect();
        self.order
            .iter()
            .filter(|t| direct.contains(t))
            .cloned()
            .collect()
    }

    /// Every task that depends on `name` through any path, in topological
    /// order. Does not include `name` itself.
    pub fn transitive_dependents(&self, name: &str) -> Vec<TaskName> {
        let Some(&start) = self.index.get(name) else {
            return Vec::new();
        };
        let mut reached = HashSet::new();
        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(n) = dfs.next(&self.graph) {
            if n != start {
                reached.insert(&self.graph[n]);
            }
        }
        self.order
            .iter()
            .filter(|t| reached.contains(t))
            .cloned()
            .collect()
    }

    /// Resolve the [`Inputs`] handed to `name`'s `run`.
    pub fn inputs_for(&self, name: &str) -> Inputs {
        match self.nodes.get(name) {
            Some(node) => node
                .requirement
                .resolve(|dep| self.nodes.get(dep).and_then(|n| n.output.clone())),
            None => Inputs::None,
        }
    }
}

#[derive(Default)]
struct GraphBuilder {
    nodes: HashMap<TaskName, TaskNode>,
    order: Vec<TaskName>,
    /// Tasks currently being expanded, outermost first.
    path: Vec<TaskName>,
}

impl GraphBuilder {
    fn visit(&mut self, task: &TaskRef) -> Result<()> {
        let name = task.name().to_string();

        if self.nodes.contains_key(&name) {
            return Ok(());
        }

        if let Some(pos) = self.path.iter().position(|n| *n == name) {
            let mut cycle = self.path[pos..].to_vec();
            cycle.push(name);
            return Err(DagbuildError::CyclicDependency(cycle));
        }

        let kind = task.kind();
        let output = if kind.has_output() {
            Some(task.output().ok_or_else(|| DagbuildError::MissingOutput(name.clone()))?)
        } else {
            None
        };
        let requirement = task.requires();

        self.path.push(name.clone());
        for dep in requirement.tasks() {
            self.visit(dep)?;
        }
        self.path.pop();

        let mut deps: Vec<TaskName> = Vec::new();
        for dep in requirement.tasks() {
            let dep_name = dep.name().to_string();
            if !deps.contains(&dep_name) {
                deps.push(dep_name);
            }
        }

        trace!(task = %name, %kind, ?deps, "task expanded");

        self.order.push(name.clone());
        self.nodes.insert(
            name.clone(),
            TaskNode {
                name,
                task: task.clone(),
                kind,
                output,
                requirement,
                deps,
            },
        );

        Ok(())
    }
}
