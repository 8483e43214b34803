//! Graph primitives for the automaton.
//!
//! States live in an arena indexed by dense [`StateId`]s, so the cyclic
//! structure (self-loops, multi-parent states) never fights the borrow
//! checker: edges hold ids, not references. Each state keeps both edge
//! directions; [`Atn::connect`] and [`Atn::unbind`] are the only ways to
//! change them, which keeps the two lists symmetric by construction.
//!
//! Transitions are immutable once created. Passes rewrite the graph by
//! building replacement edges and unbinding the old ones, never by mutating
//! payloads in place. Edge identity is `Rc` pointer identity; payload
//! equality ([`TransitionData::eq`]) compares grammar nodes by tree position,
//! so two edges built from distinct grammar occurrences stay distinct.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::decl::RuleId;
use crate::interval::Interval;
use crate::syntax::syntax_kind::SyntaxNode;

/// Dense state index, stable across passes for readable dumps.
pub type StateId = u32;

/// What a state represents. Rule and mode states are the graph's entry
/// points; everything else is plumbing created during construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateKind {
    Basic,
    Rule(RuleId),
    Mode(String),
}

/// A graph node with explicit edge lists in both directions.
#[derive(Debug, Clone)]
pub struct State {
    pub kind: StateKind,
    in_edges: Vec<Rc<Transition>>,
    out_edges: Vec<Rc<Transition>>,
}

impl State {
    fn new(kind: StateKind) -> Self {
        Self {
            kind,
            in_edges: Vec::new(),
            out_edges: Vec::new(),
        }
    }

    pub fn in_edges(&self) -> &[Rc<Transition>] {
        &self.in_edges
    }

    pub fn out_edges(&self) -> &[Rc<Transition>] {
        &self.out_edges
    }
}

/// A directed edge. Created through [`Atn::connect`] only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub source: StateId,
    pub target: StateId,
    pub data: TransitionData,
}

impl Transition {
    /// Self-loops, as produced by `*`/`+` repetition after normalization.
    pub fn is_enclosed(&self) -> bool {
        self.source == self.target
    }
}

/// Edge payload.
///
/// `Interval` and `RuleRef` are the "real" edges: they consume input and
/// must carry at least one grammar node justifying their existence. The
/// negation list records enclosing `~` elements for the negation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionData {
    /// Consumes nothing. Must not survive epsilon removal.
    Epsilon { node: SyntaxNode },
    /// Matches one code-point range.
    Interval {
        interval: Interval,
        nodes: Vec<SyntaxNode>,
        negations: Vec<SyntaxNode>,
    },
    /// Non-terminal call, by rule identity.
    RuleRef {
        rule: RuleId,
        nodes: Vec<SyntaxNode>,
        negations: Vec<SyntaxNode>,
    },
    /// Rule completion marker.
    End { rule: RuleId, nodes: Vec<SyntaxNode> },
}

impl TransitionData {
    pub fn is_epsilon(&self) -> bool {
        matches!(self, TransitionData::Epsilon { .. })
    }

    /// Real edges consume input and carry provenance.
    pub fn is_real(&self) -> bool {
        matches!(
            self,
            TransitionData::Interval { .. } | TransitionData::RuleRef { .. }
        )
    }

    pub fn grammar_nodes(&self) -> &[SyntaxNode] {
        match self {
            TransitionData::Epsilon { node } => std::slice::from_ref(node),
            TransitionData::Interval { nodes, .. } => nodes,
            TransitionData::RuleRef { nodes, .. } => nodes,
            TransitionData::End { nodes, .. } => nodes,
        }
    }

    pub fn negation_nodes(&self) -> &[SyntaxNode] {
        match self {
            TransitionData::Interval { negations, .. } => negations,
            TransitionData::RuleRef { negations, .. } => negations,
            _ => &[],
        }
    }
}

/// The automaton: a state arena plus the entry points into it.
///
/// States are never removed from the arena; a pruned state simply ends up
/// with no edges and unreachable, keeping every `StateId` stable.
#[derive(Debug, Clone, Default)]
pub struct Atn {
    states: Vec<State>,
    pub mode_starts: IndexMap<String, StateId>,
    pub lexer_starts: IndexMap<RuleId, StateId>,
    pub parser_starts: IndexMap<RuleId, StateId>,
}

impl Atn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_state(&mut self, kind: StateKind) -> StateId {
        let id = self.states.len() as StateId;
        self.states.push(State::new(kind));
        id
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id as usize]
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Create an edge and register it on both endpoints.
    pub fn connect(
        &mut self,
        source: StateId,
        target: StateId,
        data: TransitionData,
    ) -> Rc<Transition> {
        let edge = Rc::new(Transition {
            source,
            target,
            data,
        });
        self.bind(edge.clone());
        edge
    }

    /// Register an existing edge on both endpoints. Endpoints must match the
    /// edge's recorded source and target.
    pub fn bind(&mut self, edge: Rc<Transition>) {
        self.states[edge.source as usize].out_edges.push(edge.clone());
        self.states[edge.target as usize].in_edges.push(edge);
    }

    /// Remove an edge from both endpoints. Identity is pointer identity, so
    /// structurally equal edges from different grammar spots are unaffected.
    pub fn unbind(&mut self, edge: &Rc<Transition>) {
        let outs = &mut self.states[edge.source as usize].out_edges;
        if let Some(pos) = outs.iter().position(|e| Rc::ptr_eq(e, edge)) {
            outs.remove(pos);
        }
        let ins = &mut self.states[edge.target as usize].in_edges;
        if let Some(pos) = ins.iter().position(|e| Rc::ptr_eq(e, edge)) {
            ins.remove(pos);
        }
    }

    pub fn is_root(&self, id: StateId) -> bool {
        self.mode_starts.values().any(|&s| s == id)
            || self.lexer_starts.values().any(|&s| s == id)
            || self.parser_starts.values().any(|&s| s == id)
    }

    /// Entry points in dump order: modes, then lexer rules, then parser rules.
    pub fn roots(&self) -> Vec<StateId> {
        let mut roots = Vec::new();
        for &id in self
            .mode_starts
            .values()
            .chain(self.lexer_starts.values())
            .chain(self.parser_starts.values())
        {
            if !roots.contains(&id) {
                roots.push(id);
            }
        }
        roots
    }

    /// Breadth-first reachability over out-edges, in discovery order.
    pub fn reachable_from(&self, start: StateId) -> Vec<StateId> {
        let mut seen = vec![false; self.states.len()];
        let mut order = Vec::new();
        let mut queue = VecDeque::new();
        seen[start as usize] = true;
        queue.push_back(start);
        while let Some(id) = queue.pop_front() {
            order.push(id);
            for edge in &self.states[id as usize].out_edges {
                if !seen[edge.target as usize] {
                    seen[edge.target as usize] = true;
                    queue.push_back(edge.target);
                }
            }
        }
        order
    }

    /// States reachable from any root, each listed once.
    pub fn reachable(&self) -> Vec<StateId> {
        let mut seen = vec![false; self.states.len()];
        let mut order = Vec::new();
        for root in self.roots() {
            for id in self.reachable_from(root) {
                if !seen[id as usize] {
                    seen[id as usize] = true;
                    order.push(id);
                }
            }
        }
        order
    }

    /// Deep-copy the subgraph reachable from `start` into fresh states,
    /// returning the copy's entry state. Edge payloads are shared-provenance
    /// clones; the copies are fully disconnected from the originals.
    pub fn clone_subgraph(&mut self, start: StateId) -> StateId {
        let old_states = self.reachable_from(start);
        let mut map: HashMap<StateId, StateId> = HashMap::new();
        for &old in &old_states {
            let kind = self.states[old as usize].kind.clone();
            let new = self.add_state(kind);
            map.insert(old, new);
        }
        for &old in &old_states {
            let edges: Vec<Rc<Transition>> = self.states[old as usize].out_edges.clone();
            for edge in edges {
                self.connect(map[&old], map[&edge.target], edge.data.clone());
            }
        }
        map[&start]
    }

    /// Full structural copy with identical state numbering, for keeping the
    /// pre-normalization graph around next to the normalized one.
    pub fn deep_clone(&self) -> Atn {
        let mut copy = Atn {
            states: self
                .states
                .iter()
                .map(|s| State::new(s.kind.clone()))
                .collect(),
            mode_starts: self.mode_starts.clone(),
            lexer_starts: self.lexer_starts.clone(),
            parser_starts: self.parser_starts.clone(),
        };
        for state in &self.states {
            for edge in &state.out_edges {
                copy.connect(edge.source, edge.target, edge.data.clone());
            }
        }
        copy
    }

    /// Cascade-remove states left without in-edges (self-loops don't count
    /// as support). Roots are never pruned.
    pub fn prune_orphans(&mut self, seeds: Vec<StateId>) {
        let mut queue: VecDeque<StateId> = seeds.into();
        while let Some(id) = queue.pop_front() {
            let supported = self.states[id as usize]
                .in_edges
                .iter()
                .any(|e| e.source != id);
            if self.is_root(id) || supported {
                continue;
            }
            let edges: Vec<Rc<Transition>> = self.states[id as usize].out_edges.clone();
            for edge in edges {
                self.unbind(&edge);
                queue.push_back(edge.target);
            }
        }
    }
}
