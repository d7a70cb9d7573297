//! Example: random policy on the reach task

use arm_rl_core::{ContinuousSpace, Environment, RandomPolicy, VectorObservation};
use arm_rl_env::{run_episode, ArmEnv, ArmEnvConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging, RUST_LOG=arm_rl_env=debug for per-episode detail
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ArmEnvConfig::reach().with_seed(7).with_max_steps(500);
    let mut env = ArmEnv::new(config)?;

    let policy: RandomPolicy<VectorObservation, _> = RandomPolicy::new(ContinuousSpace::unit(4));

    let num_episodes = 10;
    let mut episode_rewards = Vec::new();

    for episode in 0..num_episodes {
        let trajectory = run_episode(&mut env, &policy, 500).await?;
        let outcome = env
            .controller()
            .outcome()
            .map_or_else(|| "running".to_string(), |o| o.to_string());

        episode_rewards.push(trajectory.total_reward);
        println!(
            "Episode {}: Total Reward = {:.3}, Steps = {}, Outcome = {}",
            episode + 1,
            trajectory.total_reward,
            trajectory.len(),
            outcome
        );
    }

    let avg_reward: f64 = episode_rewards.iter().sum::<f64>() / f64::from(num_episodes);
    println!("\nAverage Reward over {num_episodes} episodes: {avg_reward:.3}");

    env.close().await?;

    Ok(())
}
