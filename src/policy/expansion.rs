//! Expansion: building a node for a newly reached state
//!
//! A new node gets one selector per acting agent, each pre-populated with an
//! unvisited statistic per legal action. Priors come from a [`PriorSource`];
//! without one every action of an agent shares `1 / |actions|`.

use std::marker::PhantomData;

use crate::{
    bandit::BanditSelector,
    game_state::{AgentId, DecisionProcess},
    tree::Node,
    MCTSError, Result,
};

/// Trait for policies that assign prior probabilities to new actions
pub trait PriorSource<S: DecisionProcess>: Send + Sync {
    /// Returns one prior per entry of `actions`
    fn priors(&self, state: &S, agent: AgentId, actions: &[S::Action]) -> Result<Vec<f64>>;
}

/// Uniform prior: every legal action of an agent gets `1 / |actions|`
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformPrior;

impl UniformPrior {
    pub fn new() -> Self {
        UniformPrior
    }
}

impl<S: DecisionProcess> PriorSource<S> for UniformPrior {
    fn priors(&self, _state: &S, _agent: AgentId, actions: &[S::Action]) -> Result<Vec<f64>> {
        let prior = 1.0 / actions.len().max(1) as f64;
        Ok(vec![prior; actions.len()])
    }
}

/// Prior source backed by a closure, e.g. a learned policy
pub struct FnPrior<F, S> {
    policy: F,
    _phantom: PhantomData<fn(&S)>,
}

impl<F, S> FnPrior<F, S>
where
    F: Fn(&S, AgentId, &[S::Action]) -> Vec<f64> + Send + Sync,
    S: DecisionProcess,
{
    /// Creates a new prior source with the given function
    pub fn new(policy: F) -> Self {
        FnPrior {
            policy,
            _phantom: PhantomData,
        }
    }
}

impl<F, S> PriorSource<S> for FnPrior<F, S>
where
    F: Fn(&S, AgentId, &[S::Action]) -> Vec<f64> + Send + Sync,
    S: DecisionProcess,
{
    fn priors(&self, state: &S, agent: AgentId, actions: &[S::Action]) -> Result<Vec<f64>> {
        Ok((self.policy)(state, agent, actions))
    }
}

/// Builds the node for `state`
///
/// Terminal states get no selectors. A non-terminal state without acting
/// agents, or with an acting agent that has no legal action, violates the
/// adapter contract and fails.
pub fn new_node<S: DecisionProcess>(
    state: S,
    prior_source: Option<&dyn PriorSource<S>>,
) -> Result<Node<S>> {
    if state.is_terminal() {
        return Ok(Node::new(state, Vec::new()));
    }

    let agents = state.acting_agents();
    if agents.is_empty() {
        return Err(MCTSError::Adapter(
            "non-terminal state reports no acting agents".to_string(),
        ));
    }

    let mut selectors = Vec::with_capacity(agents.len());
    for agent in agents {
        let actions = state.legal_actions(agent);
        if actions.is_empty() {
            return Err(MCTSError::NoLegalActions { agent });
        }

        let selector = match prior_source {
            Some(source) => {
                let priors = source.priors(&state, agent, &actions)?;
                BanditSelector::with_priors(agent, actions, priors)?
            }
            None => BanditSelector::uniform(agent, actions),
        };
        selectors.push(selector);
    }

    Ok(Node::new(state, selectors))
}

#[cfg(test)]
mod tests {
    use rand::RngCore;

    use super::*;

    /// Agents `0..agents` act together; agent `empty` has no moves
    #[derive(Clone, Debug)]
    struct Table {
        agents: usize,
        empty: Option<AgentId>,
        done: bool,
    }

    impl DecisionProcess for Table {
        type Action = u8;

        fn acting_agents(&self) -> Vec<AgentId> {
            (0..self.agents).collect()
        }

        fn current_agent(&self) -> AgentId {
            0
        }

        fn legal_actions(&self, agent: AgentId) -> Vec<u8> {
            if self.empty == Some(agent) {
                Vec::new()
            } else {
                (0..=agent as u8).collect()
            }
        }

        fn transition(&self, _joint: &[u8], _rng: &mut dyn RngCore) -> Result<Self> {
            Ok(Table {
                done: true,
                ..self.clone()
            })
        }

        fn is_terminal(&self) -> bool {
            self.done
        }

        fn states_equal(&self, other: &Self) -> bool {
            self.done == other.done
        }

        fn terminal_score(&self, _agent: AgentId) -> f64 {
            0.0
        }
    }

    fn state(agents: usize, empty: Option<AgentId>) -> Table {
        Table {
            agents,
            empty,
            done: false,
        }
    }

    #[test]
    fn test_one_selector_per_acting_agent() {
        let node = new_node(state(3, None), None).unwrap();
        assert_eq!(node.agents(), &[0, 1, 2]);

        for (agent, selector) in node.selectors().iter().enumerate() {
            assert_eq!(selector.len(), agent + 1);
            let prior = 1.0 / (agent + 1) as f64;
            assert!(selector.stats().iter().all(|s| s.prior() == prior && s.trials() == 0));
        }
    }

    #[test]
    fn test_terminal_state_has_no_selectors() {
        let mut terminal = state(2, None);
        terminal.done = true;
        assert!(new_node(terminal, None).unwrap().selectors().is_empty());
    }

    #[test]
    fn test_agent_without_actions_is_an_error() {
        let result = new_node(state(3, Some(1)), None);
        assert!(matches!(result, Err(MCTSError::NoLegalActions { agent: 1 })));

        let result = new_node(state(0, None), None);
        assert!(matches!(result, Err(MCTSError::Adapter(_))));
    }

    #[test]
    fn test_prior_source_is_consulted() {
        let source = FnPrior::new(|_: &Table, agent: AgentId, actions: &[u8]| {
            actions.iter().map(|&a| if usize::from(a) == agent { 1.0 } else { 0.0 }).collect()
        });
        let node = new_node(state(2, None), Some(&source)).unwrap();

        let second = node.selector(1).unwrap();
        assert_eq!(second.stats()[0].prior(), 0.0);
        assert_eq!(second.stats()[1].prior(), 1.0);
    }
}
