use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::{Rc, Weak};

use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::adaptive::AdaptiveSelector;
use crate::graph::{ColorId, Graph, VertexId, Weight};
use crate::parameters::{Objective, Parameters};
use crate::search::greedy::greedy_random;
use crate::search::{LocalSearch, SearchContext};
use crate::simulation::{Simulation, SimulationHelper};
use crate::solution::{BestBounds, Solution};

/// Assignment of a vertex to a color (`None` = open a new color) and the
/// cumulative partial score it leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    /// vertex to color
    pub vertex: VertexId,
    /// color to use
    pub color: Option<ColorId>,
    /// partial score after the assignment
    pub score: Weight,
}

/** expansion-stack ordering: score desc, ties color desc. Since lower
scores are better, popping the back of a sorted vector yields the most
promising remaining action first. */
pub fn compare_actions(a: &Action, b: &Action) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.color.cmp(&a.color))
}

/// counters of the whole tree
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeStats {
    /// nodes created since the beginning of the search
    pub total_nodes: u64,
    /// deepest node ever created
    pub height: usize,
}

/** Node of the tree of partial colorings. Children are owned; the parent
link is a weak back-reference, so dropping a subtree frees it. */
#[derive(Debug)]
pub struct Node {
    parent: Weak<RefCell<Node>>,
    /// move that led from the parent to this node
    action: Action,
    /// remaining expansions, sorted by [`compare_actions`] (pop the back)
    possible_moves: Vec<Action>,
    children: Vec<Rc<RefCell<Node>>>,
    visits: i64,
    /// running mean of the scores backpropagated through the node
    score: f64,
    /// rank-based exploitation term
    pub exploitation: f64,
    /// `sqrt(2 ln parent_visits / visits)`
    pub exploration: f64,
    score_ucb: f64,
    depth: usize,
    /// creation index of the node
    pub id: u64,
}

/// whether the subtree can still grow or yield an unexplored leaf
fn fully_explored(node: &Rc<RefCell<Node>>) -> bool {
    let node = node.borrow();
    node.possible_moves.is_empty() && node.children.is_empty()
}

/// number of live nodes of the subtree
fn count_nodes(node: &Rc<RefCell<Node>>) -> u64 {
    1 + node.borrow().children.iter().map(count_nodes).sum::<u64>()
}

/** updates the branch from the node to the root: recomputes each mean,
drops exhausted children, re-ranks the children by mean score (rank 1 =
worst) and refreshes their UCB scores. */
fn backpropagate(node: &Rc<RefCell<Node>>, score: f64, coeff: f64) {
    {
        let mut current = node.borrow_mut();
        current.score = (current.score * current.visits as f64 + score)
            / (current.visits + 1) as f64;
        current.visits += 1;
        if !current.children.is_empty() {
            current.children.retain(|child| {
                let child_ref = child.borrow();
                !(child_ref.children.is_empty() && child_ref.possible_moves.is_empty())
            });
            current
                .children
                .sort_by(|a, b| b.borrow().score.partial_cmp(&a.borrow().score).unwrap());
            let nb_children = current.children.len();
            let sum_rank = (nb_children * (nb_children + 1)) as f64 / 2.0;
            let visits = current.visits;
            for (rank, child) in current.children.iter().enumerate() {
                let mut child_ref = child.borrow_mut();
                child_ref.exploitation = (rank + 1) as f64 / sum_rank;
                child_ref.exploration =
                    (2.0 * (visits as f64).ln() / child_ref.visits as f64).sqrt();
                child_ref.score_ucb = child_ref.exploitation + coeff * child_ref.exploration;
            }
        }
    }
    let parent = node.borrow().parent.upgrade();
    if let Some(parent) = parent {
        backpropagate(&parent, score, coeff);
    }
}

/** admissibility pruning: drops every move and every child whose partial
score is already `>= score` (weights are positive, extensions only keep or
raise the score). Returns whether the node itself survives. */
fn clean_graph(node: &Rc<RefCell<Node>>, score: Weight) -> bool {
    let mut current = node.borrow_mut();
    current.possible_moves.retain(|action| action.score < score);
    current.children.retain(|child| {
        if child.borrow().action.score >= score {
            return false;
        }
        clean_graph(child, score)
    });
    !(current.children.is_empty() && current.possible_moves.is_empty())
}

/** legal extensions of a partial coloring: the next vertex (in index
order) into each conflict-free used color, plus a fresh color, keeping only
the moves whose cumulative score stays below the best known score. */
pub fn next_possible_moves(solution: &Solution, bounds: &BestBounds) -> Vec<Action> {
    let mut moves = Vec::new();
    let next_vertex = solution.first_free_vertex();
    if next_vertex == solution.graph().nb_vertices {
        return moves;
    }
    for &color in solution.non_empty_colors() {
        if solution.conflicts_colors(color, next_vertex) == 0 {
            let next_score =
                solution.score_wvcp() + solution.delta_wvcp_score(next_vertex, Some(color));
            if bounds.score_wvcp > next_score {
                moves.push(Action {
                    vertex: next_vertex,
                    color: Some(color),
                    score: next_score,
                });
            }
        }
    }
    let fresh_score = solution.score_wvcp() + solution.graph().weights[next_vertex];
    if bounds.score_wvcp > fresh_score {
        moves.push(Action {
            vertex: next_vertex,
            color: None,
            score: fresh_score,
        });
    }
    moves.sort_by(compare_actions);
    moves
}

/// plays the action and advances the assignment cursor
pub fn apply_action(solution: &mut Solution, action: &Action) {
    debug_assert_eq!(solution.first_free_vertex(), action.vertex);
    solution.add_to_color(action.vertex, action.color);
    solution.increment_first_free_vertex();
    debug_assert_eq!(solution.score_wvcp(), action.score);
}

/** Monte-Carlo Tree Search over partial colorings: UCB selection, lazy
expansion of the most promising remaining action, greedy completion with an
optional policy-gated local search, rank-based backpropagation and pruning
by the best known score. */
#[derive(Debug)]
pub struct Mcts {
    root: Rc<RefCell<Node>>,
    base_solution: Solution,
    best_solution: Solution,
    turn: i64,
    t_best: i64,
    local_searches: Vec<LocalSearch>,
    adaptive: Option<AdaptiveSelector>,
    stats: TreeStats,
}

impl Mcts {
    /// csv columns of the search rows
    pub const HEADER_CSV: &'static str =
        "turn,time,depth,nb total node,nb current node,height,nb_colors,penalty,score,solution";

    /** builds the engine: an initial greedy solution seeds the best score
    (or the target when `use_target`), the root holds the single opening
    move, and the adaptive selector is set up when local search is active. */
    pub fn new(
        graph: Rc<Graph>,
        params: &Parameters,
        bounds: &mut BestBounds,
        rng: &mut StdRng,
    ) -> Self {
        let mut best_solution = Solution::new(graph.clone());
        greedy_random(&mut best_solution, rng);
        bounds.score_wvcp = best_solution.score_wvcp();
        if params.use_target && params.target > 0 {
            bounds.score_wvcp = params.target;
        }

        let mut stats = TreeStats::default();
        let mut base_solution = Solution::new(graph);
        let first_moves = next_possible_moves(&base_solution, bounds);
        debug_assert!(first_moves.len() <= 1);
        // an empty opening (target below the first weight) leaves an
        // exhausted root: the search stops immediately
        let (first_action, root_moves) = match first_moves.first() {
            Some(&action) => {
                apply_action(&mut base_solution, &action);
                (action, next_possible_moves(&base_solution, bounds))
            }
            None => (
                Action {
                    vertex: 0,
                    color: None,
                    score: 0,
                },
                Vec::new(),
            ),
        };
        let root = Rc::new(RefCell::new(Node {
            parent: Weak::new(),
            action: first_action,
            possible_moves: root_moves,
            children: Vec::new(),
            visits: 0,
            score: 0.0,
            exploitation: 0.0,
            exploration: 0.0,
            score_ucb: 0.0,
            depth: 0,
            id: 0,
        }));
        stats.total_nodes = 1;

        params.write_output(&format!("{}\n", Self::HEADER_CSV));

        let (local_searches, adaptive) = if params.simulation != Simulation::NoLs {
            let selector = AdaptiveSelector::new(
                params.adaptive,
                params.local_search.len(),
                params.window_size,
                params.coeff_exploi_explo,
            );
            params.write_output_tbt("#operators\n");
            params.write_output_tbt(&format!("#{}\n", params.local_search_names));
            params.write_output_tbt("time,turn,proba,selected,score_pre_ls,score_post_ls\n");
            (params.local_search.clone(), Some(selector))
        } else {
            (Vec::new(), None)
        };

        Self {
            root,
            base_solution,
            best_solution,
            turn: 0,
            t_best: 0,
            local_searches,
            adaptive,
            stats,
        }
    }

    fn stop_condition(&self, params: &Parameters) -> bool {
        self.turn < params.nb_max_iterations
            && !params.time_limit_reached()
            && !(params.objective == Objective::Reached
                && params.target_reached(self.best_solution.score_wvcp()))
            && !fully_explored(&self.root)
    }

    /// runs the four phases until the stop condition fires
    pub fn run(&mut self, params: &Parameters, bounds: &mut BestBounds, rng: &mut StdRng) {
        let nb_vertices = self.base_solution.graph().nb_vertices;
        let mut helper = SimulationHelper::new(nb_vertices, bounds.score_wvcp);

        while self.stop_condition(params) {
            self.turn += 1;

            let mut current_solution = self.base_solution.clone();
            let selected = self.selection(&mut current_solution, rng);
            let current = self.expansion(&selected, &mut current_solution, bounds);

            // simulation
            params.initialization.run(&mut current_solution, rng);
            let score_before_ls = current_solution.score_wvcp();

            if params
                .simulation
                .run_local_search(&current_solution, &mut helper, rng)
            {
                if let Some(adaptive) = self.adaptive.as_mut() {
                    let operator_index = adaptive.get_operator(rng);
                    let operator = self.local_searches[operator_index];
                    let mut context = SearchContext {
                        params,
                        bounds,
                        rng,
                        verbose: false,
                    };
                    operator.run(&mut current_solution, &mut context);

                    adaptive.update_obtained_solution(operator_index, current_solution.score_wvcp());
                    adaptive.update_helper();
                    params.write_output_tbt(&format!(
                        "{},{},{},{},{},{}\n",
                        params.elapsed_seconds(),
                        self.turn,
                        adaptive.proba_str(),
                        operator_index,
                        score_before_ls,
                        current_solution.score_wvcp()
                    ));
                    adaptive.increment_turn();
                }
            }

            let score_wvcp = current_solution.score_wvcp();
            backpropagate(&current, score_wvcp as f64, params.coeff_exploi_explo);

            if self.best_solution.score_wvcp() > score_wvcp {
                self.t_best = params.elapsed_seconds();
                self.best_solution = current_solution;
                if bounds.score_wvcp > score_wvcp {
                    bounds.score_wvcp = score_wvcp;
                }
                params.write_output(&self.line_csv(current.borrow().depth));
                clean_graph(&self.root, self.best_solution.score_wvcp());
            }
        }
        params.write_output(&self.line_csv(0));
    }

    /// descends while the current node has nothing left to expand, following
    /// the best UCB score (ties broken uniformly at random)
    fn selection(&self, current_solution: &mut Solution, rng: &mut StdRng) -> Rc<RefCell<Node>> {
        let mut current = self.root.clone();
        loop {
            if !current.borrow().possible_moves.is_empty() {
                return current;
            }
            let next = {
                let node = current.borrow();
                if node.children.is_empty() {
                    // exhausted leaf: only reachable on a fully explored root
                    return current.clone();
                }
                let mut max_score = OrderedFloat(f64::MIN);
                let mut next_nodes: Vec<Rc<RefCell<Node>>> = Vec::new();
                for child in &node.children {
                    let score_ucb = OrderedFloat(child.borrow().score_ucb);
                    if score_ucb > max_score {
                        max_score = score_ucb;
                        next_nodes.clear();
                        next_nodes.push(child.clone());
                    } else if score_ucb == max_score {
                        next_nodes.push(child.clone());
                    }
                }
                next_nodes.choose(rng).expect("children present").clone()
            };
            let action = next.borrow().action;
            apply_action(current_solution, &action);
            current = next;
        }
    }

    /// pops the most promising remaining action and attaches the child when
    /// it has extensions of its own
    fn expansion(
        &mut self,
        current: &Rc<RefCell<Node>>,
        current_solution: &mut Solution,
        bounds: &BestBounds,
    ) -> Rc<RefCell<Node>> {
        let next_move = current
            .borrow_mut()
            .possible_moves
            .pop()
            .expect("selection stops on expandable nodes");
        apply_action(current_solution, &next_move);
        let next_possible = next_possible_moves(current_solution, bounds);
        if next_possible.is_empty() {
            return current.clone();
        }
        self.stats.total_nodes += 1;
        let depth = current.borrow().depth + 1;
        if depth > self.stats.height {
            self.stats.height = depth;
        }
        let child = Rc::new(RefCell::new(Node {
            parent: Rc::downgrade(current),
            action: next_move,
            possible_moves: next_possible,
            children: Vec::new(),
            visits: 0,
            score: 0.0,
            exploitation: 0.0,
            exploration: 0.0,
            score_ucb: 0.0,
            depth,
            id: self.stats.total_nodes - 1,
        }));
        current.borrow_mut().children.push(child.clone());
        child
    }

    fn line_csv(&self, depth: usize) -> String {
        format!(
            "{},{},{},{},{},{},{}\n",
            self.turn,
            self.t_best,
            depth,
            self.stats.total_nodes,
            count_nodes(&self.root),
            self.stats.height,
            self.best_solution.line_csv()
        )
    }

    /// best solution found so far
    pub fn best_solution(&self) -> &Solution {
        &self.best_solution
    }

    /// turns played
    pub fn turn(&self) -> i64 {
        self.turn
    }

    /// seconds elapsed when the best solution was found
    pub fn t_best(&self) -> i64 {
        self.t_best
    }

    /// tree counters
    pub fn stats(&self) -> TreeStats {
        self.stats
    }

    /// number of live nodes
    pub fn nb_current_nodes(&self) -> u64 {
        count_nodes(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::graph::testing::{complete, path};
    use crate::parameters::Method;

    fn assert_pruned(node: &Rc<RefCell<Node>>, best: Weight) {
        let node_ref = node.borrow();
        assert!(node_ref.possible_moves.iter().all(|m| m.score < best));
        for child in &node_ref.children {
            assert!(child.borrow().action.score < best);
            assert_pruned(child, best);
        }
    }

    #[test]
    fn test_compare_actions_pops_lowest_score() {
        let mut moves = vec![
            Action { vertex: 0, color: Some(1), score: 7 },
            Action { vertex: 0, color: None, score: 5 },
            Action { vertex: 0, color: Some(0), score: 5 },
        ];
        moves.sort_by(compare_actions);
        // back of the vector: lowest score, lowest color among ties
        assert_eq!(moves.pop().unwrap().score, 5);
        assert_eq!(moves.pop().unwrap().score, 5);
        assert_eq!(moves.pop().unwrap().score, 7);
    }

    #[test]
    fn test_mcts_stops_on_target_k4() {
        // K4 weights 4,3,2,1: every proper coloring is 4 singletons, 10
        let graph = complete(4, vec![4, 3, 2, 1]);
        let mut params = Parameters::silent(Method::Mcts, 30, 10);
        params.use_target = true;
        params.nb_max_iterations = 100_000;
        params.initialization = crate::search::greedy::Initializer::TotalRandom;
        let mut bounds = BestBounds::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut mcts = Mcts::new(graph, &params, &mut bounds, &mut rng);
        mcts.run(&params, &mut bounds, &mut rng);
        assert_eq!(mcts.best_solution().score_wvcp(), 10);
        assert_eq!(mcts.best_solution().penalty(), 0);
    }

    #[test]
    fn test_mcts_proves_optimality_on_path() {
        // a-b-c weights 3,2,1: the tree is tiny, optimality is provable
        let graph = path(3, vec![3, 2, 1]);
        let mut params = Parameters::silent(Method::Mcts, 30, -1);
        params.objective = crate::parameters::Objective::Optimality;
        params.nb_max_iterations = 10_000;
        let mut bounds = BestBounds::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut mcts = Mcts::new(graph, &params, &mut bounds, &mut rng);
        mcts.run(&params, &mut bounds, &mut rng);
        assert_eq!(mcts.best_solution().score_wvcp(), 5);
        assert!(fully_explored(&mcts.root));
        assert!(mcts.stats().total_nodes >= 1);
    }

    #[test]
    fn test_pruning_is_sound() {
        let graph = path(3, vec![3, 2, 1]);
        let params = Parameters::silent(Method::Mcts, 30, -1);
        let mut bounds = BestBounds::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut mcts = Mcts::new(graph, &params, &mut bounds, &mut rng);
        mcts.run(&params, &mut bounds, &mut rng);
        let best = mcts.best_solution().score_wvcp();
        clean_graph(&mcts.root, best);
        assert_pruned(&mcts.root, best);
    }

    #[test]
    fn test_next_possible_moves_prunes_by_bound() {
        let graph = path(3, vec![3, 2, 1]);
        let mut solution = Solution::new(graph);
        let mut bounds = BestBounds::new();
        let moves = next_possible_moves(&solution, &bounds);
        assert_eq!(moves.len(), 1);
        apply_action(&mut solution, &moves[0]);
        // with a tight bound the fresh-color move for vertex 1 is cut
        bounds.score_wvcp = 5;
        let second_moves = next_possible_moves(&solution, &bounds);
        assert!(second_moves.is_empty());
    }
}
