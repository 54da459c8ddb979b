//! Concurrency simulator
//!
//! Each round seeds a fresh engine and races three kinds of operation
//! against it, then checks the guarantees that must hold under contention:
//! - concurrent appends: the per-user-type cap is never exceeded, ineligible
//!   writers never land, and every accepted entry is stored
//! - racing transitions: exactly one compare-and-swap wins
//! - racing promotions: exactly one promotion applies

use crate::seed::SeededEngine;
use brd_core::{BrdError, BrdResult, EngineConfig, ErrorCategory, Orchestrator, ValidationKind};
use brd_policy::{policy_table, Decision, StatusPolicy};
use brd_store::{CommentStore, EntityStore};
use brd_types::{
    Caller, CommentGroupKey, Document, DocumentId, FieldType, GroupStatus, LifecycleState, Role, UserType,
};
use futures::future::join_all;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::BTreeMap;

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Rounds, each on a fresh engine
    pub rounds: u64,
    /// Concurrent writers per round
    pub writers: usize,
    /// Appends each writer attempts
    pub appends_per_writer: usize,
    /// Racers per transition and promotion race
    pub racers: usize,
    /// Stop at the first round with a violation
    pub stop_on_first_violation: bool,
    /// Engine configuration under test
    pub engine: EngineConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            rounds: 20,
            writers: 8,
            appends_per_writer: 4,
            racers: 8,
            stop_on_first_violation: false,
            engine: EngineConfig::default(),
        }
    }
}

/// A broken guarantee
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// More entries of one user type than the cap
    CapExceeded {
        /// Round
        round: u64,
        /// User type over the cap
        user_type: UserType,
        /// Stored entries
        stored: usize,
        /// Configured cap
        limit: usize,
    },
    /// Accepted appends and stored entries disagree
    LostEntries {
        /// Round
        round: u64,
        /// Appends reported as accepted
        accepted: usize,
        /// Entries in the group
        stored: usize,
    },
    /// Append outcome disagrees with the decision table
    UnexpectedAppend {
        /// Round
        round: u64,
        /// Writer role
        role: Role,
        /// Document state
        state: LifecycleState,
        /// What happened
        detail: String,
    },
    /// Not exactly one transition won
    TransitionWinners {
        /// Round
        round: u64,
        /// Winners observed
        winners: usize,
    },
    /// A losing transition failed for a reason other than losing the race
    UnexpectedTransitionError {
        /// Round
        round: u64,
        /// Error category
        category: ErrorCategory,
    },
    /// Stored state is not the winner's target
    StateMismatch {
        /// Round
        round: u64,
        /// Winner's target
        expected: LifecycleState,
        /// Stored state
        actual: Option<LifecycleState>,
    },
    /// Not exactly one promotion applied
    PromotionWinners {
        /// Round
        round: u64,
        /// Winners observed
        winners: usize,
    },
    /// The promoted value is not in the canonical field
    PromotionNotApplied {
        /// Round
        round: u64,
    },
}

/// Statistics for simulation
#[derive(Debug, Clone, Default)]
pub struct SimulatorStats {
    /// Rounds completed
    pub rounds: u64,
    /// Append calls made
    pub appends_attempted: u64,
    /// Appends stored
    pub appends_accepted: u64,
    /// Appends rejected by the cap
    pub appends_capped: u64,
    /// Appends denied by policy
    pub appends_denied: u64,
    /// Transition calls made
    pub transitions_attempted: u64,
    /// Transitions that lost a compare-and-swap
    pub transitions_conflicted: u64,
    /// Transitions denied after another racer moved the document
    pub transitions_denied: u64,
    /// Promotion calls made
    pub promotions_attempted: u64,
    /// Promotions that lost the claim
    pub promotions_conflicted: u64,
}

/// Final report from simulator
#[derive(Debug, Clone)]
pub struct SimulatorReport {
    /// Configuration run
    pub config: SimulatorConfig,
    /// Counters
    pub stats: SimulatorStats,
    /// Broken guarantees, in discovery order
    pub violations: Vec<Violation>,
}

impl SimulatorReport {
    /// No violations
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Render as text
    #[must_use]
    pub fn generate_text(&self) -> String {
        let s = &self.stats;
        let mut report = String::new();
        report.push_str("=== BRD Simulator Report ===\n\n");
        report.push_str(&format!("Seed: {}\n", self.config.seed));
        report.push_str(&format!("Rounds: {}\n", s.rounds));
        report.push_str(&format!(
            "Appends: {} attempted, {} accepted, {} capped, {} denied\n",
            s.appends_attempted, s.appends_accepted, s.appends_capped, s.appends_denied
        ));
        report.push_str(&format!(
            "Transitions: {} attempted, {} won, {} lost the swap, {} denied on fresh state\n",
            s.transitions_attempted, s.rounds, s.transitions_conflicted, s.transitions_denied
        ));
        report.push_str(&format!(
            "Promotions: {} attempted, {} conflicted\n",
            s.promotions_attempted, s.promotions_conflicted
        ));
        report.push_str(&format!("Violations: {}\n", self.violations.len()));

        if !self.violations.is_empty() {
            report.push_str("\n=== Violations ===\n");
            for (i, v) in self.violations.iter().enumerate() {
                report.push_str(&format!("{}. {:?}\n", i + 1, v));
            }
        }

        report.push_str(&format!(
            "\n=== Result: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        ));
        report
    }
}

/// Run the simulator
///
/// # Errors
/// Seeding failures only; broken guarantees are reported as violations.
pub async fn run_simulator(config: SimulatorConfig) -> BrdResult<SimulatorReport> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut stats = SimulatorStats::default();
    let mut violations = Vec::new();

    for round in 0..config.rounds {
        let before = violations.len();
        append_round(&config, round, &mut rng, &mut stats, &mut violations).await?;
        transition_round(&config, round, &mut rng, &mut stats, &mut violations).await?;
        promotion_round(&config, round, &mut stats, &mut violations).await?;
        stats.rounds += 1;

        if violations.len() > before {
            tracing::warn!(round, new = violations.len() - before, "round produced violations");
            if config.stop_on_first_violation {
                break;
            }
        }
    }

    Ok(SimulatorReport {
        config,
        stats,
        violations,
    })
}

fn comment_allowed(role: Role, state: LifecycleState) -> bool {
    policy_table()
        .iter()
        .any(|row| row.role == role && row.state == state && row.comment == Decision::Allow)
}

async fn append_round(
    config: &SimulatorConfig,
    round: u64,
    rng: &mut StdRng,
    stats: &mut SimulatorStats,
    violations: &mut Vec<Violation>,
) -> BrdResult<()> {
    let states = [
        LifecycleState::Draft,
        LifecycleState::InProgress,
        LifecycleState::InternalReview,
        LifecycleState::ReadyForSignOff,
    ];
    let state = states[rng.gen_range(0..states.len())];
    let engine = SeededEngine::new(config.engine.clone(), format!("sim-a-{round}"), state).await?;
    let key = SeededEngine::budget_key(&engine.document_id);
    engine
        .store
        .upsert_group(&key, GroupStatus::Pending, &SeededEngine::caller(Role::BusinessAnalyst).identity)
        .await?;

    let writers: Vec<Caller> = (0..config.writers)
        .map(|_| SeededEngine::caller(Role::ALL[rng.gen_range(0..Role::ALL.len())]))
        .collect();

    let mut tasks = Vec::with_capacity(writers.len() * config.appends_per_writer);
    for writer in &writers {
        for i in 0..config.appends_per_writer {
            let orchestrator = engine.orchestrator.clone();
            let writer = writer.clone();
            let key = key.clone();
            tasks.push(tokio::spawn(async move {
                let result = orchestrator
                    .add_comment(&writer, &key, format!("{} #{i}", writer.identity), None)
                    .await;
                (writer.role, result)
            }));
        }
    }
    let results = join_all(tasks).await;

    let mut accepted = 0;
    for joined in results {
        let (role, result) = joined.map_err(BrdError::unexpected)?;
        stats.appends_attempted += 1;
        let allowed = comment_allowed(role, state);
        match (&result, allowed) {
            (Ok(_), true) => {
                accepted += 1;
                stats.appends_accepted += 1;
            }
            (Err(e), true)
                if matches!(e.validation_kind(), Some(ValidationKind::LimitExceeded { .. })) =>
            {
                stats.appends_capped += 1;
            }
            (Err(e), false) if e.category() == ErrorCategory::AccessDenied => stats.appends_denied += 1,
            _ => violations.push(Violation::UnexpectedAppend {
                round,
                role,
                state,
                detail: match &result {
                    Ok(_) => "accepted".to_string(),
                    Err(e) => e.to_string(),
                },
            }),
        }
    }

    let group = engine.store.get_group(&key).await?;
    let entries = group.as_ref().map_or(&[][..], |g| g.entries.as_slice());
    if entries.len() != accepted {
        violations.push(Violation::LostEntries {
            round,
            accepted,
            stored: entries.len(),
        });
    }
    let mut per_type: BTreeMap<UserType, usize> = BTreeMap::new();
    for entry in entries {
        *per_type.entry(entry.user_type).or_default() += 1;
    }
    let limit = config.engine.comment_limit_per_user_type;
    for (user_type, stored) in per_type {
        if stored > limit {
            violations.push(Violation::CapExceeded {
                round,
                user_type,
                stored,
                limit,
            });
        }
    }
    Ok(())
}

async fn transition_round(
    config: &SimulatorConfig,
    round: u64,
    rng: &mut StdRng,
    stats: &mut SimulatorStats,
    violations: &mut Vec<Violation>,
) -> BrdResult<()> {
    let starts = [
        (LifecycleState::Draft, Role::BusinessAnalyst),
        (LifecycleState::InProgress, Role::ProjectManager),
        (LifecycleState::InternalReview, Role::Reviewer),
        (LifecycleState::ReadyForSignOff, Role::ProjectManager),
    ];
    let (state, role) = starts[rng.gen_range(0..starts.len())];
    let engine = SeededEngine::new(config.engine.clone(), format!("sim-t-{round}"), state).await?;
    let caller = SeededEngine::caller(role);

    // Targets outside the role's own window, so a losing racer that reads the
    // winner's state is denied rather than winning a second swap.
    let own = StatusPolicy::new().allowed_states(role);
    let targets: Vec<LifecycleState> = LifecycleState::ALL
        .into_iter()
        .filter(|s| !own.contains(s))
        .collect();
    let tasks: Vec<_> = (0..config.racers.max(1))
        .map(|_| {
            let target = targets[rng.gen_range(0..targets.len())];
            race_transition(engine.orchestrator.clone(), caller.clone(), engine.document_id.clone(), target)
        })
        .collect();

    let mut winners = Vec::new();
    for joined in join_all(tasks).await {
        let (target, result) = joined.map_err(BrdError::unexpected)?;
        stats.transitions_attempted += 1;
        match result {
            Ok(_) => winners.push(target),
            Err(e) => match e.category() {
                ErrorCategory::Conflict => stats.transitions_conflicted += 1,
                ErrorCategory::AccessDenied => stats.transitions_denied += 1,
                category => violations.push(Violation::UnexpectedTransitionError { round, category }),
            },
        }
    }

    if winners.len() != 1 {
        violations.push(Violation::TransitionWinners {
            round,
            winners: winners.len(),
        });
        return Ok(());
    }
    let actual = engine.store.document(&engine.document_id).map(|d| d.state);
    if actual != Some(winners[0]) {
        violations.push(Violation::StateMismatch {
            round,
            expected: winners[0],
            actual,
        });
    }
    Ok(())
}

fn race_transition(
    orchestrator: Orchestrator,
    caller: Caller,
    document_id: DocumentId,
    target: LifecycleState,
) -> tokio::task::JoinHandle<(LifecycleState, BrdResult<Document>)> {
    tokio::spawn(async move {
        let result = orchestrator.transition(&caller, &document_id, target).await;
        (target, result)
    })
}

async fn promotion_round(
    config: &SimulatorConfig,
    round: u64,
    stats: &mut SimulatorStats,
    violations: &mut Vec<Violation>,
) -> BrdResult<()> {
    let engine = SeededEngine::new(config.engine.clone(), format!("sim-p-{round}"), LifecycleState::InProgress)
        .await?;
    let key: CommentGroupKey = SeededEngine::budget_key(&engine.document_id);
    let pm = SeededEngine::caller(Role::ProjectManager);
    let creator = SeededEngine::caller(Role::BusinessAnalyst);
    let value = serde_json::json!(round * 10);

    engine
        .orchestrator
        .open_group(&pm, &key, GroupStatus::Pending)
        .await?;
    engine
        .orchestrator
        .stage_shadow_value(&pm, &key, value.clone(), FieldType::Number)
        .await?;

    let tasks = (0..config.racers.max(1)).map(|_| {
        let orchestrator = engine.orchestrator.clone();
        let creator = creator.clone();
        let key = key.clone();
        tokio::spawn(async move { orchestrator.promote_shadow_value(&creator, &key).await })
    });

    let mut winners = 0;
    for joined in join_all(tasks).await {
        stats.promotions_attempted += 1;
        match joined.map_err(BrdError::unexpected)? {
            Ok(_) => winners += 1,
            Err(e) if e.category() == ErrorCategory::Conflict => stats.promotions_conflicted += 1,
            Err(_) => {}
        }
    }
    if winners != 1 {
        violations.push(Violation::PromotionWinners { round, winners });
    }
    if engine.store.read_field(&key.target()).await? != Some(value) {
        violations.push(Violation::PromotionNotApplied { round });
    }
    Ok(())
}
