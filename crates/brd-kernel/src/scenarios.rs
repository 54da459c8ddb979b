//! Worked review scenarios, run end to end against a seeded engine

use crate::seed::{SeededEngine, OTHER_BA, SPARE_PM};
use brd_assignment::{ReassignItem, ReassignStatus};
use brd_core::{BrdResult, EngineConfig};
use brd_policy::DenyReason;
use brd_store::CommentStore;
use brd_types::{DocumentId, GroupStatus, LifecycleState, Role, UserType};
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;

/// One of the worked scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// Assigned reviewer comments during internal review
    A,
    /// Creator tries to move a submitted document
    B,
    /// Bulk PM reassignment with one invalid identity
    C,
    /// Sixth creator comment on one field
    D,
}

impl Scenario {
    /// Every scenario, in order
    pub const ALL: [Scenario; 4] = [Scenario::A, Scenario::B, Scenario::C, Scenario::D];

    /// One-line description
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Scenario::A => "assigned reviewer comments while the document is in Internal Review",
            Scenario::B => "creator attempts every transition out of Submitted",
            Scenario::C => "bulk PM reassignment where one identity is not a PM",
            Scenario::D => "creator adds a sixth comment to one field",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scenario::A => "A",
            Scenario::B => "B",
            Scenario::C => "C",
            Scenario::D => "D",
        };
        f.write_str(name)
    }
}

/// What a scenario observed
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Scenario run
    pub scenario: Scenario,
    /// Observations, in order
    pub lines: Vec<String>,
    /// Whether every observation matched the expected outcome
    pub passed: bool,
}

impl ScenarioReport {
    fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            lines: Vec::new(),
            passed: true,
        }
    }

    fn check(&mut self, ok: bool, line: String) {
        self.passed &= ok;
        self.lines
            .push(format!("[{}] {line}", if ok { "ok" } else { "UNEXPECTED" }));
    }

    /// Render as text
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut out = format!("=== Scenario {}: {} ===\n", self.scenario, self.scenario.description());
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&format!(
            "=== Result: {} ===\n",
            if self.passed { "PASS" } else { "FAIL" }
        ));
        out
    }
}

/// Run one scenario on a fresh engine
///
/// # Errors
/// Only seeding failures; scenario outcomes are reported, not returned.
pub async fn run_scenario(scenario: Scenario, config: EngineConfig) -> BrdResult<ScenarioReport> {
    let mut report = ScenarioReport::new(scenario);
    match scenario {
        Scenario::A => scenario_a(config, &mut report).await?,
        Scenario::B => scenario_b(config, &mut report).await?,
        Scenario::C => scenario_c(config, &mut report).await?,
        Scenario::D => scenario_d(config, &mut report).await?,
    }
    Ok(report)
}

async fn scenario_a(config: EngineConfig, report: &mut ScenarioReport) -> BrdResult<()> {
    let engine = SeededEngine::new(config, "doc-a", LifecycleState::InternalReview).await?;
    let key = SeededEngine::budget_key(&engine.document_id);
    let creator = SeededEngine::caller(Role::BusinessAnalyst);
    let reviewer = SeededEngine::caller(Role::Reviewer);

    engine
        .orchestrator
        .open_group(&creator, &key, GroupStatus::Resolved)
        .await?;
    let added = engine
        .orchestrator
        .add_comment(&reviewer, &key, "numbers need a source", None)
        .await;
    report.check(
        added.is_ok(),
        format!("add_comment by assigned reviewer: {}", outcome(&added)),
    );

    let group = engine.orchestrator.get_group(&reviewer, &key).await?;
    report.check(
        group.status == GroupStatus::Resolved,
        format!("group status after comment: {}", group.status),
    );
    Ok(())
}

async fn scenario_b(config: EngineConfig, report: &mut ScenarioReport) -> BrdResult<()> {
    let engine = SeededEngine::new(config, "doc-b", LifecycleState::Submitted).await?;
    let creator = SeededEngine::caller(Role::BusinessAnalyst);
    for target in LifecycleState::ALL {
        let result = engine
            .orchestrator
            .transition(&creator, &engine.document_id, target)
            .await;
        let denied = matches!(&result, Err(e) if e.deny_reason() == Some(DenyReason::AlreadySubmitted));
        report.check(
            denied,
            format!("transition Submitted -> {target}: {}", outcome(&result)),
        );
    }
    Ok(())
}

async fn scenario_c(config: EngineConfig, report: &mut ScenarioReport) -> BrdResult<()> {
    let engine = SeededEngine::new(config, "doc1", LifecycleState::InProgress).await?;
    engine
        .add_document(DocumentId::new("doc2"), LifecycleState::InProgress)
        .await?;

    let response = engine
        .orchestrator
        .bulk_reassign(vec![
            ReassignItem::new("doc1", SPARE_PM),
            ReassignItem::new("doc2", OTHER_BA),
        ])
        .await;

    let expected = ["SUCCESS", "FAILED(not a PM)"];
    for (item, want) in response.items.iter().zip(expected) {
        let got = item.result.to_string();
        report.check(
            got == want,
            format!("{} -> {}: {got}", item.document_id, item.identity),
        );
    }
    report.check(
        response.status == ReassignStatus::Failure,
        format!("overall: {:?}", response.status),
    );
    Ok(())
}

async fn scenario_d(config: EngineConfig, report: &mut ScenarioReport) -> BrdResult<()> {
    let limit = config.comment_limit_per_user_type;
    let engine = SeededEngine::new(config, "doc-d", LifecycleState::Draft).await?;
    let key = SeededEngine::budget_key(&engine.document_id);
    let creator = SeededEngine::caller(Role::BusinessAnalyst);

    engine
        .orchestrator
        .open_group(&creator, &key, GroupStatus::Pending)
        .await?;
    for i in 0..limit {
        engine
            .orchestrator
            .add_comment(&creator, &key, format!("note {}", i + 1), None)
            .await?;
    }
    let extra = engine
        .orchestrator
        .add_comment(&creator, &key, "one more", None)
        .await;
    report.check(
        extra.is_err(),
        format!("comment {} by BA: {}", limit + 1, outcome(&extra)),
    );

    let stored = engine
        .store
        .get_group(&key)
        .await?
        .map_or(0, |g| g.count_for(UserType::Ba));
    report.check(stored == limit, format!("stored BA entries: {stored}"));
    Ok(())
}

fn outcome<T>(result: &BrdResult<T>) -> String {
    match result {
        Ok(_) => "OK".to_string(),
        Err(e) => format!("{} ({e})", e.category().as_str()),
    }
}
