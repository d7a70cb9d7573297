//! Gym-style environment wrapping an [`EpisodeController`]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use arm_rl_core::{
    ActionSpace, BoxObservationSpace, ContinuousAction, ContinuousSpace, Environment, Episode,
    ObservationSpace, Result, Reward, State, Step, StepInfo, Terminal, VectorObservation,
};

use crate::config::ArmEnvConfig;
use crate::contact::{ContactSource, ContactTag, TriggerVolumes};
use crate::episode::{EpisodeController, EpisodeOutcome};
use crate::grasp::GraspState;
use crate::pose::PoseInterface;
use crate::scene::{ArmLayout, ArmRig, KinematicChain};

/// Arm state attached to every step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmSnapshot {
    /// Accumulated joint angles, degrees
    pub joint_angles: Vec<f64>,
    /// Tip position in the reference frame
    pub end_effector: [f64; 3],
    /// Target position in the reference frame
    pub target: [f64; 3],
    /// Claw state, grasp task only
    pub claw: Option<GraspState>,
    /// Terminal marker
    pub terminal: Terminal,
}

impl State for ArmSnapshot {
    fn features(&self) -> Vec<f64> {
        let mut features = self.joint_angles.clone();
        features.extend(self.end_effector);
        features.extend(self.target);
        if let Some(claw) = self.claw {
            features.push(claw.progress);
            features.push(if claw.grasped { 1.0 } else { 0.0 });
        }
        features
    }

    fn is_terminal(&self) -> bool {
        self.terminal.is_terminal()
    }
}

/// Robotic arm reach or grasp environment
pub struct ArmEnv<P: PoseInterface = KinematicChain> {
    controller: EpisodeController<P>,
    contacts: Box<dyn ContactSource>,
    observation_space: BoxObservationSpace,
    episode: Option<Episode>,
}

impl ArmEnv {
    /// Environment over the standard rig with trigger-volume collisions
    pub fn new(config: ArmEnvConfig) -> Result<Self> {
        let (chain, layout) = ArmRig::build(&config.geometry, config.variant.has_claw())?;
        let contacts = Box::new(TriggerVolumes::new(config.triggers.clone()));
        Self::with_scene(&config, chain, &layout, contacts)
    }
}

impl<P: PoseInterface> ArmEnv<P> {
    /// Environment over a caller-supplied scene and collision source
    pub fn with_scene(
        config: &ArmEnvConfig,
        pose: P,
        layout: &ArmLayout,
        contacts: Box<dyn ContactSource>,
    ) -> Result<Self> {
        let mut controller = EpisodeController::new(pose, layout, config)?;
        controller.initialize()?;
        let bound = config.geometry.reach() + config.target.max_radius;
        let observation_space = controller.encoder().space(bound)?;
        Ok(Self {
            controller,
            contacts,
            observation_space,
            episode: None,
        })
    }

    /// Collision callback from the scene; applied on the next step
    pub fn on_tag(&mut self, tag: &str) {
        match tag.parse::<ContactTag>() {
            Ok(tag) => self.controller.notify(tag),
            Err(err) => debug!(%err, "ignoring collision"),
        }
    }

    /// End the running episode as a success right away
    pub fn goal_reached(&mut self) -> Option<Reward> {
        let reward = self.controller.succeed()?;
        self.record_terminal(reward);
        Some(reward)
    }

    /// End the running episode as a failure right away
    pub fn fail(&mut self) -> Option<Reward> {
        let reward = self.controller.fail()?;
        self.record_terminal(reward);
        Some(reward)
    }

    fn record_terminal(&mut self, reward: Reward) {
        if let Some(episode) = &mut self.episode {
            episode.total_reward += reward.0;
            episode.finish(false);
        }
    }

    /// Underlying state machine
    #[must_use]
    pub fn controller(&self) -> &EpisodeController<P> {
        &self.controller
    }

    /// Mutable state machine, for harness-side placement
    pub fn controller_mut(&mut self) -> &mut EpisodeController<P> {
        &mut self.controller
    }

    fn snapshot(&self, terminal: Terminal) -> ArmSnapshot {
        let tip = self.controller.arm().end_effector_position(self.controller.pose());
        let target = self.controller.target_position();
        ArmSnapshot {
            joint_angles: self.controller.arm().current_angles(),
            end_effector: [tip.x, tip.y, tip.z],
            target: [target.x, target.y, target.z],
            claw: self.controller.grasp_state(),
            terminal,
        }
    }
}

#[async_trait]
impl<P: PoseInterface + 'static> Environment for ArmEnv<P> {
    type Observation = VectorObservation;
    type Action = ContinuousAction;
    type State = ArmSnapshot;

    fn observation_space(&self) -> Box<dyn ObservationSpace<Observation = Self::Observation>> {
        Box::new(self.observation_space.clone())
    }

    fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>> {
        Box::new(ContinuousSpace::unit(self.controller.control_size()))
    }

    async fn reset(&mut self) -> Result<(Self::Observation, StepInfo)> {
        let observation = self.controller.begin_episode()?;
        self.episode = Some(Episode::begin());

        let state = self.controller.state();
        let info = StepInfo::default()
            .with("episode", state.episode_index)
            .with("distance", state.previous_distance_to_goal)
            .with("indicator", serde_json::to_value(state.indicator)?);
        Ok((observation, info))
    }

    async fn step(&mut self, action: Self::Action) -> Result<Step<Self::Observation, Self::State>> {
        let report = self.controller.step(action.as_slice(), self.contacts.as_ref())?;

        let truncated = report.outcome == Some(EpisodeOutcome::Truncated);
        let done = report.outcome.is_some() && !truncated;
        if let Some(episode) = &mut self.episode {
            episode.steps += 1;
            episode.total_reward += report.reward.0;
            if done || truncated {
                episode.finish(truncated);
            }
        }

        let terminal = Terminal::from_flags(done, truncated);
        let mut info = StepInfo::default()
            .with("episode", self.controller.state().episode_index)
            .with("distance", report.distance)
            .with("grasped", report.grasped)
            .with("breakdown", serde_json::to_value(report.breakdown)?);
        if let Some(outcome) = report.outcome {
            info = info.with("outcome", outcome.to_string());
        }

        Ok(Step {
            observation: report.observation,
            reward: report.reward,
            done,
            truncated,
            info,
            state: Some(self.snapshot(terminal)),
        })
    }

    fn episode_info(&self) -> Option<Episode> {
        self.episode.clone()
    }
}
