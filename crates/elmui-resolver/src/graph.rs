//! Constraint graph built up during one resolution run.
//!
//! Nodes are packages (plus a synthetic root standing for the project's own
//! manifest). An edge `a -> b` records that `a` at a given version declared a
//! range on `b`. Per-package constraints only ever tighten.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use semver::Version;

use crate::conflict::ResolveError;
use crate::package::PackageId;
use crate::version::Constraint;

/// Who asked for a constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Requirer {
    /// The project's own `elm-package.json`.
    Root,
    Package { id: PackageId, version: Version },
}

impl Requirer {
    fn version(&self) -> Option<&Version> {
        match self {
            Requirer::Root => None,
            Requirer::Package { version, .. } => Some(version),
        }
    }
}

impl fmt::Display for Requirer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirer::Root => f.write_str("elm-package.json"),
            Requirer::Package { id, version } => write!(f, "{id} {version}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum GraphNode {
    Root,
    Package(PackageId),
}

/// Edge label: the range declared, and the version of the requirer that declared it.
#[derive(Debug, Clone)]
pub struct DepEdge {
    pub requirer_version: Option<Version>,
    pub range: Constraint,
}

/// Outcome of adding a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tightening {
    /// First constraint seen for the package.
    New,
    /// The package's constraint became strictly narrower.
    Tightened,
    Unchanged,
}

#[derive(Debug, Clone)]
struct ConstraintEntry {
    constraint: Constraint,
    requirers: Vec<Requirer>,
}

#[derive(Debug)]
pub struct DependencyGraph {
    graph: DiGraph<GraphNode, DepEdge>,
    index: HashMap<PackageId, NodeIndex>,
    constraints: BTreeMap<PackageId, ConstraintEntry>,
    root: NodeIndex,
}

impl DependencyGraph {
    pub fn new() -> Self {
        let mut graph = DiGraph::new();
        let root = graph.add_node(GraphNode::Root);
        Self {
            graph,
            index: HashMap::new(),
            constraints: BTreeMap::new(),
            root,
        }
    }

    fn node_for(&mut self, package: &PackageId) -> NodeIndex {
        if let Some(&idx) = self.index.get(package) {
            return idx;
        }
        let idx = self.graph.add_node(GraphNode::Package(package.clone()));
        self.index.insert(package.clone(), idx);
        idx
    }

    /// Intersect `range` into `package`'s constraint on behalf of `requirer`.
    ///
    /// Fails with [`ResolveError::ConflictingConstraints`] when the ranges are disjoint.
    pub fn constrain(
        &mut self,
        requirer: &Requirer,
        package: &PackageId,
        range: Constraint,
    ) -> Result<Tightening, ResolveError> {
        let outcome = match self.constraints.get_mut(package) {
            None => {
                self.constraints.insert(
                    package.clone(),
                    ConstraintEntry {
                        constraint: range.clone(),
                        requirers: vec![requirer.clone()],
                    },
                );
                Tightening::New
            }
            Some(entry) => {
                let merged = entry.constraint.intersect(&range).map_err(|_| {
                    ResolveError::ConflictingConstraints {
                        package: package.clone(),
                        existing: entry.constraint.clone(),
                        existing_from: join_requirers(&entry.requirers),
                        incoming: range.clone(),
                        incoming_from: requirer.to_string(),
                    }
                })?;
                if !entry.requirers.contains(requirer) {
                    entry.requirers.push(requirer.clone());
                }
                if merged == entry.constraint {
                    Tightening::Unchanged
                } else {
                    entry.constraint = merged;
                    Tightening::Tightened
                }
            }
        };

        let from = match requirer {
            Requirer::Root => self.root,
            Requirer::Package { id, .. } => self.node_for(id),
        };
        let to = self.node_for(package);
        let requirer_version = requirer.version().cloned();
        let duplicate = self
            .graph
            .edges_connecting(from, to)
            .any(|e| e.weight().requirer_version == requirer_version);
        if !duplicate {
            self.graph.add_edge(
                from,
                to,
                DepEdge {
                    requirer_version,
                    range,
                },
            );
        }

        Ok(outcome)
    }

    /// Current (tightest) constraint on `package`.
    pub fn constraint_of(&self, package: &PackageId) -> Option<&Constraint> {
        self.constraints.get(package).map(|e| &e.constraint)
    }

    /// Everyone who has contributed a constraint on `package`, in arrival order.
    pub fn describe_dependents(&self, package: &PackageId) -> String {
        self.constraints
            .get(package)
            .map(|e| join_requirers(&e.requirers))
            .unwrap_or_default()
    }

    /// Direct dependencies declared by `package` at `version`, sorted by id.
    pub fn dependencies_of(&self, package: &PackageId, version: &Version) -> Vec<(&PackageId, &Constraint)> {
        match self.index.get(package) {
            Some(&idx) => self.children(idx, Some(version)),
            None => Vec::new(),
        }
    }

    fn children(&self, idx: NodeIndex, version: Option<&Version>) -> Vec<(&PackageId, &Constraint)> {
        let mut out: Vec<(&PackageId, &Constraint)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .filter(|e| e.weight().requirer_version.as_ref() == version)
            .filter_map(|e| match &self.graph[e.target()] {
                GraphNode::Package(id) => Some((id, &e.weight().range)),
                GraphNode::Root => None,
            })
            .collect();
        out.sort_by(|a, b| a.0.cmp(b.0));
        out
    }

    /// Packages reachable from the root when each package is fixed at `picks`.
    ///
    /// Edges declared by versions other than the pick are ignored, which drops
    /// packages only an abandoned pick asked for.
    pub fn reachable(&self, picks: &BTreeMap<PackageId, Version>) -> HashSet<PackageId> {
        let mut seen = HashSet::new();
        let mut stack: Vec<(&PackageId, &Constraint)> = self.children(self.root, None);
        while let Some((package, _)) = stack.pop() {
            if !seen.insert(package.clone()) {
                continue;
            }
            if let Some(version) = picks.get(package) {
                stack.extend(self.dependencies_of(package, version));
            }
        }
        seen
    }

    /// Render the resolved tree rooted at the project manifest.
    pub fn print_tree(&self, picks: &BTreeMap<PackageId, Version>) -> String {
        let mut output = String::from("elm-package.json\n");
        let roots = self.children(self.root, None);
        let count = roots.len();
        let mut visited = HashSet::new();
        for (i, (package, _)) in roots.into_iter().enumerate() {
            self.print_subtree(&mut output, package, picks, "", i == count - 1, &mut visited);
        }
        output
    }

    fn print_subtree<'a>(
        &'a self,
        output: &mut String,
        package: &'a PackageId,
        picks: &BTreeMap<PackageId, Version>,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<&'a PackageId>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        let Some(version) = picks.get(package) else {
            output.push_str(&format!("{prefix}{connector}{package} (unresolved)\n"));
            return;
        };

        if !visited.insert(package) {
            output.push_str(&format!("{prefix}{connector}{package} {version} (*)\n"));
            return;
        }
        output.push_str(&format!("{prefix}{connector}{package} {version}\n"));

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let children = self.dependencies_of(package, version);
        let count = children.len();
        for (i, (child, _)) in children.into_iter().enumerate() {
            self.print_subtree(output, child, picks, &child_prefix, i == count - 1, visited);
        }
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

fn join_requirers(requirers: &[Requirer]) -> String {
    requirers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(s: &str) -> Constraint {
        Constraint::parse(s).unwrap()
    }

    fn pkg(s: &str) -> PackageId {
        PackageId::from(s)
    }

    fn requirer(id: &str, version: &str) -> Requirer {
        Requirer::Package {
            id: pkg(id),
            version: Version::parse(version).unwrap(),
        }
    }

    #[test]
    fn constrain_reports_new_tightened_unchanged() {
        let mut graph = DependencyGraph::new();
        let core = pkg("elm-lang/core");

        let first = graph.constrain(&Requirer::Root, &core, c(">=1.0.0")).unwrap();
        assert_eq!(first, Tightening::New);

        let second = graph
            .constrain(&requirer("a/a", "1.0.0"), &core, c(">=1.0.0 <2.0.0"))
            .unwrap();
        assert_eq!(second, Tightening::Tightened);
        assert_eq!(graph.constraint_of(&core), Some(&c(">=1.0.0 <2.0.0")));

        let third = graph
            .constrain(&requirer("b/b", "1.0.0"), &core, c(">=0.5.0"))
            .unwrap();
        assert_eq!(third, Tightening::Unchanged);
        assert_eq!(
            graph.describe_dependents(&core),
            "elm-package.json, a/a 1.0.0, b/b 1.0.0"
        );
    }

    #[test]
    fn disjoint_constraint_names_both_sides() {
        let mut graph = DependencyGraph::new();
        let core = pkg("elm-lang/core");
        graph
            .constrain(&requirer("a/a", "1.0.0"), &core, c("1.0.0 <= v < 2.0.0"))
            .unwrap();
        let err = graph
            .constrain(&requirer("b/b", "3.1.0"), &core, c("2.0.0 <= v < 3.0.0"))
            .unwrap_err();
        match err {
            ResolveError::ConflictingConstraints {
                package,
                existing_from,
                incoming_from,
                ..
            } => {
                assert_eq!(package, core);
                assert_eq!(existing_from, "a/a 1.0.0");
                assert_eq!(incoming_from, "b/b 3.1.0");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn reachable_ignores_abandoned_versions() {
        let mut graph = DependencyGraph::new();
        graph.constrain(&Requirer::Root, &pkg("a/a"), c(">=1.0.0")).unwrap();
        graph
            .constrain(&requirer("a/a", "2.0.0"), &pkg("old/dep"), c(">=1.0.0"))
            .unwrap();
        graph
            .constrain(&requirer("a/a", "1.0.0"), &pkg("new/dep"), c(">=1.0.0"))
            .unwrap();

        let mut picks = BTreeMap::new();
        picks.insert(pkg("a/a"), Version::new(1, 0, 0));
        picks.insert(pkg("old/dep"), Version::new(1, 0, 0));
        picks.insert(pkg("new/dep"), Version::new(1, 0, 0));

        let reachable = graph.reachable(&picks);
        assert!(reachable.contains(&pkg("a/a")));
        assert!(reachable.contains(&pkg("new/dep")));
        assert!(!reachable.contains(&pkg("old/dep")));
    }

    #[test]
    fn tree_printing() {
        let mut graph = DependencyGraph::new();
        graph.constrain(&Requirer::Root, &pkg("gdotdesign/elm-ui"), c(">=1.0.0")).unwrap();
        graph.constrain(&Requirer::Root, &pkg("elm-lang/core"), c(">=4.0.0")).unwrap();
        graph
            .constrain(&requirer("gdotdesign/elm-ui", "1.1.0"), &pkg("elm-lang/core"), c(">=4.0.0"))
            .unwrap();

        let mut picks = BTreeMap::new();
        picks.insert(pkg("gdotdesign/elm-ui"), Version::new(1, 1, 0));
        picks.insert(pkg("elm-lang/core"), Version::new(4, 0, 5));

        let tree = graph.print_tree(&picks);
        assert!(tree.starts_with("elm-package.json\n"));
        assert!(tree.contains("├── elm-lang/core 4.0.5\n"));
        assert!(tree.contains("└── gdotdesign/elm-ui 1.1.0\n"));
        assert!(tree.contains("    └── elm-lang/core 4.0.5 (*)\n"));
    }
}
