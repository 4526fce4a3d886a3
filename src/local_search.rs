use std::rc::Rc;

use rand::rngs::StdRng;

use crate::graph::Graph;
use crate::parameters::Parameters;
use crate::search::SearchContext;
use crate::solution::{BestBounds, Solution};

/** Local-search run controller: builds the initial greedy solution, emits
the CSV header and first row, then drives the first configured operator
(which reports its own improvements). */
#[derive(Debug)]
pub struct LocalSearchRunner {
    best_solution: Solution,
}

impl LocalSearchRunner {
    /// builds the initial solution with the configured greedy
    pub fn new(graph: Rc<Graph>, params: &Parameters, rng: &mut StdRng) -> Self {
        let mut best_solution = Solution::new(graph);
        params.initialization.run(&mut best_solution, rng);
        Self { best_solution }
    }

    /// runs the operator to completion
    pub fn run(&mut self, params: &Parameters, bounds: &mut BestBounds, rng: &mut StdRng) {
        params.write_output(&format!("turn,time,{}\n", Solution::HEADER_CSV));
        params.write_output(&format!(
            "0,{},{}\n",
            params.elapsed_seconds(),
            self.best_solution.line_csv()
        ));
        if let Some(&operator) = params.local_search.first() {
            let mut context = SearchContext {
                params,
                bounds,
                rng,
                verbose: true,
            };
            operator.run(&mut self.best_solution, &mut context);
        }
        self.best_solution.reorganize_colors();
    }

    /// best solution found
    pub fn best_solution(&self) -> &Solution {
        &self.best_solution
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::graph::testing::{complete, isolated};
    use crate::parameters::Method;
    use crate::search::LocalSearch;

    #[test]
    fn test_k5_deterministic_none() {
        // complete graph on 5 vertices, unit weights: 5 colors, score 5
        let graph = complete(5, vec![1; 5]);
        let mut params = Parameters::silent(Method::LocalSearch, 10, -1);
        params.local_search = vec![LocalSearch::None];
        let mut rng = StdRng::seed_from_u64(1);
        let mut bounds = BestBounds::new();
        let mut runner = LocalSearchRunner::new(graph, &params, &mut rng);
        runner.run(&params, &mut bounds, &mut rng);
        assert_eq!(runner.best_solution().score_wvcp(), 5);
        assert_eq!(runner.best_solution().nb_non_empty_colors(), 5);
    }

    #[test]
    fn test_isolated_vertices_single_color() {
        // 5 isolated vertices, weights 5..1: everything fits in one color
        let graph = isolated(5, vec![5, 4, 3, 2, 1]);
        let mut params = Parameters::silent(Method::LocalSearch, 5, -1);
        params.local_search = vec![LocalSearch::TabuWeight];
        params.nb_iter_local_search = 100;
        let mut rng = StdRng::seed_from_u64(1);
        let mut bounds = BestBounds::new();
        let mut runner = LocalSearchRunner::new(graph, &params, &mut rng);
        runner.run(&params, &mut bounds, &mut rng);
        assert_eq!(runner.best_solution().score_wvcp(), 5);
        assert_eq!(runner.best_solution().nb_non_empty_colors(), 1);
        assert!(runner.best_solution().check());
    }
}
