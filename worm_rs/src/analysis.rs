//! Graph properties used as the puzzle's answer key.
//!
//! Pure functions over [`Transitions`]. Where exploration order matters it
//! follows the order of the `symbols` slice, not code point order.

use std::collections::VecDeque;

use crate::automaton::{Properties, StateId, Transitions};

/// Two-colour the graph, treating every edge as undirected.
///
/// Flood fills from each uncoloured state and stops at the first conflict.
/// A self-loop makes the graph non-bipartite.
pub fn is_bipartite(transitions: &Transitions) -> bool {
    let n = transitions.len();
    let mut neighbours: Vec<Vec<StateId>> = vec![Vec::new(); n];
    for (from, _, to) in transitions.iter().filter(|&(_, _, to)| to < n) {
        neighbours[from].push(to);
        neighbours[to].push(from);
    }

    let mut colour: Vec<Option<bool>> = vec![None; n];
    for origin in 0..n {
        if colour[origin].is_some() {
            continue;
        }
        colour[origin] = Some(false);
        let mut stack = vec![origin];

        while let Some(state) = stack.pop() {
            let here = colour[state] == Some(true);
            for &next in &neighbours[state] {
                match colour[next] {
                    Some(c) if c == here => return false,
                    Some(_) => {}
                    None => {
                        colour[next] = Some(!here);
                        stack.push(next);
                    }
                }
            }
        }
    }
    true
}

/// Shortest input leading from `start` to `target` (unweighted BFS).
///
/// `None` when the target is unreachable or either state is out of range;
/// an empty string when `start == target`.
pub fn shortest_input(
    transitions: &Transitions,
    symbols: &[char],
    start: StateId,
    target: StateId,
) -> Option<String> {
    let n = transitions.len();
    if start >= n || target >= n {
        return None;
    }
    let mut came_from: Vec<Option<(StateId, char)>> = vec![None; n];
    let mut seen = vec![false; n];
    let mut queue = VecDeque::from([start]);
    seen[start] = true;

    while let Some(state) = queue.pop_front() {
        if state == target {
            let mut input = Vec::new();
            let mut cursor = state;
            while let Some((prev, symbol)) = came_from[cursor] {
                input.push(symbol);
                cursor = prev;
            }
            return Some(input.into_iter().rev().collect());
        }

        for &symbol in symbols {
            let Some(next) = transitions.get(state, symbol) else {
                continue;
            };
            if seen.get(next) == Some(&false) {
                seen[next] = true;
                came_from[next] = Some((state, symbol));
                queue.push_back(next);
            }
        }
    }
    None
}

/// Jump height at `state`: highest successor index minus the state's own.
///
/// `None` for a state without outgoing edges.
pub fn node_value(transitions: &Transitions, state: StateId) -> Option<i64> {
    transitions
        .successors(state)
        .max()
        .map(|highest| highest as i64 - state as i64)
}

/// Number of edges, across the whole graph, ending in `state`.
pub fn node_indegree(transitions: &Transitions, state: StateId) -> usize {
    transitions.iter().filter(|&(_, _, to)| to == state).count()
}

/// Depth-first visiting order from `start`, exploring successors in
/// `symbols` order and never re-entering a visited state. Empty when
/// `start` is out of range.
pub fn dfs_order(transitions: &Transitions, symbols: &[char], start: StateId) -> Vec<StateId> {
    let mut visited = vec![false; transitions.len()];
    let mut order = Vec::new();
    let mut stack = vec![start];

    while let Some(state) = stack.pop() {
        match visited.get_mut(state) {
            Some(seen) if !*seen => *seen = true,
            _ => continue,
        }
        order.push(state);

        // reversed so the first symbol is popped first
        for &symbol in symbols.iter().rev() {
            if let Some(next) = transitions.get(state, symbol)
                && visited.get(next) == Some(&false)
            {
                stack.push(next);
            }
        }
    }
    order
}

/// Compute every property of a graph whose start is state `0` and whose
/// target is the last state.
pub fn calculate_properties(transitions: &Transitions, symbols: &[char]) -> Properties {
    let n = transitions.len();
    let target = n.saturating_sub(1);
    let path = shortest_input(transitions, symbols, 0, target).unwrap_or_default();

    Properties {
        path_length: path.chars().count(),
        bipartite: is_bipartite(transitions),
        values: (0..n).map(|s| node_value(transitions, s)).collect(),
        indegrees: (0..n).map(|s| node_indegree(transitions, s)).collect(),
        dfs_order: dfs_order(transitions, symbols, 0),
    }
}
