//! Run a policy through one episode

use tracing::debug;

use arm_rl_core::{Environment, Policy, Result, Trajectory, Transition};

/// Reset `env` and step it with `policy` until the episode ends or
/// `max_steps` transitions have been recorded
pub async fn run_episode<E, A>(
    env: &mut E,
    policy: &A,
    max_steps: usize,
) -> Result<Trajectory<E::Observation, E::Action>>
where
    E: Environment,
    A: Policy<Observation = E::Observation, Action = E::Action>,
{
    let (mut observation, _) = env.reset().await?;
    let id = env.episode_info().map(|e| e.id).unwrap_or_default();
    let mut trajectory = Trajectory::new(id);

    for _ in 0..max_steps {
        let action = policy.act(&observation).await?;
        let step = env.step(action.clone()).await?;
        let finished = step.done || step.truncated;
        trajectory.push(Transition {
            observation,
            action,
            reward: step.reward,
            next_observation: step.observation.clone(),
            done: finished,
        });
        observation = step.observation;
        if finished {
            break;
        }
    }

    debug!(
        episode = %trajectory.episode_id,
        steps = trajectory.len(),
        reward = trajectory.total_reward,
        "rollout finished"
    );
    Ok(trajectory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArmEnvConfig;
    use crate::env::ArmEnv;
    use arm_rl_core::{ContinuousSpace, RandomPolicy, VectorObservation, ZeroPolicy};

    #[tokio::test]
    async fn test_zero_policy_runs_to_budget() {
        let mut env = ArmEnv::new(ArmEnvConfig::reach().with_seed(12).with_max_steps(20)).unwrap();
        let policy: ZeroPolicy<VectorObservation> = ZeroPolicy::new(4);
        let trajectory = run_episode(&mut env, &policy, 100).await.unwrap();

        assert_eq!(trajectory.len(), 20);
        assert!(trajectory.is_complete());
        assert_eq!(trajectory.total_reward, 0.0);
        assert_eq!(trajectory.episode_id, env.episode_info().unwrap().id);
    }

    #[tokio::test]
    async fn test_random_policy_stops_at_cap() {
        let mut env = ArmEnv::new(ArmEnvConfig::grasp().with_seed(12)).unwrap();
        let policy: RandomPolicy<VectorObservation, _> = RandomPolicy::new(ContinuousSpace::unit(6));
        let trajectory = run_episode(&mut env, &policy, 30).await.unwrap();

        assert!(!trajectory.is_empty());
        assert!(trajectory.len() <= 30);
        for transition in &trajectory.transitions {
            assert_eq!(transition.observation.len(), 13);
            assert_eq!(transition.action.0.len(), 6);
        }
    }
}
