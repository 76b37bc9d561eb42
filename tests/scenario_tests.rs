use kitplan::core::delays::DelayLogic;
use kitplan::core::jobs::JobLogic;
use kitplan::core::overlay::materialize;
use kitplan::core::scenario::ScenarioLogic;
use kitplan::core::schedule::ScheduleLogic;
use kitplan::db::{delays, jobs, scenarios};
use kitplan::errors::AppError;
use kitplan::models::job::{Job, JobPatch, RouteStep};
use kitplan::models::scenario::{ChangeOperation, ScenarioChange, synthetic_job_id};
use kitplan::models::timeline::Timeline;

mod common;
use common::{dt, mem_pool_with_shift};

const HOUR: i64 = 3600;

fn change(id: i64, operation: ChangeOperation, job_id: Option<i64>, data: JobPatch) -> ScenarioChange {
    ScenarioChange {
        id,
        scenario_id: 1,
        job_id,
        operation,
        change_data: data,
        original_data: None,
        created_at: dt("2025-09-01 08:00"),
    }
}

fn rename(name: &str) -> JobPatch {
    JobPatch {
        name: Some(name.to_string()),
        ..JobPatch::default()
    }
}

fn new_job(name: &str) -> JobPatch {
    JobPatch {
        name: Some(name.to_string()),
        planned_start: Some(dt("2025-09-02 07:00")),
        route_steps: Some(vec![RouteStep::new(1, "assemble", 2 * HOUR)]),
        ..JobPatch::default()
    }
}

fn production() -> Vec<Job> {
    vec![
        Job::new(1, "alpha", dt("2025-09-01 07:00"))
            .with_steps(vec![RouteStep::new(1, "pick", HOUR), RouteStep::new(2, "pack", HOUR)]),
        Job::new(2, "beta", dt("2025-09-01 09:00"))
            .with_steps(vec![RouteStep::new(1, "pick", HOUR)]),
    ]
}

fn by_name(timelines: &[Timeline], name: &str) -> Timeline {
    timelines
        .iter()
        .find(|t| t.job_name == name)
        .cloned()
        .unwrap_or_else(|| panic!("no timeline for {}", name))
}

// ----------------------------------------------------------------------------
// Pure overlay
// ----------------------------------------------------------------------------

#[test]
fn materialize_is_idempotent_and_leaves_production_alone() {
    let prod = production();
    let snapshot = prod.clone();
    let changes = vec![
        change(1, ChangeOperation::Modify, Some(1), rename("alpha-2")),
        change(2, ChangeOperation::Add, None, new_job("gamma")),
        change(3, ChangeOperation::Delete, Some(2), JobPatch::default()),
    ];

    let first = materialize(&changes, &prod).unwrap();
    let second = materialize(&changes, &prod).unwrap();

    assert_eq!(first, second);
    assert_eq!(prod, snapshot);

    let names: Vec<&str> = first.iter().map(|j| j.name.as_str()).collect();
    assert_eq!(names, ["alpha-2", "gamma"]);
    assert_eq!(first[1].id, synthetic_job_id(2));
    // untouched fields survive a MODIFY
    assert_eq!(first[0].route_steps.len(), 2);
}

#[test]
fn modify_after_delete_is_an_invalid_sequence() {
    let changes = vec![
        change(1, ChangeOperation::Delete, Some(2), JobPatch::default()),
        change(2, ChangeOperation::Modify, Some(2), rename("ghost")),
    ];
    let err = materialize(&changes, &production()).unwrap_err();
    assert!(matches!(err, AppError::InvalidOperationSequence(_)));
}

#[test]
fn change_on_unknown_job_is_an_invalid_reference() {
    let changes = vec![change(1, ChangeOperation::Modify, Some(77), rename("x"))];
    let err = materialize(&changes, &production()).unwrap_err();
    assert!(matches!(err, AppError::InvalidReference(_)));

    let changes = vec![change(1, ChangeOperation::Add, Some(1), new_job("x"))];
    let err = materialize(&changes, &production()).unwrap_err();
    assert!(matches!(err, AppError::InvalidReference(_)));
}

#[test]
fn added_job_can_be_modified_through_its_synthetic_id() {
    let changes = vec![
        change(5, ChangeOperation::Add, None, new_job("gamma")),
        change(6, ChangeOperation::Modify, Some(-5), rename("gamma-2")),
    ];
    let jobs = materialize(&changes, &production()).unwrap();

    assert_eq!(jobs.len(), 3);
    assert_eq!(jobs[2].id, -5);
    assert_eq!(jobs[2].name, "gamma-2");
}

// ----------------------------------------------------------------------------
// Persisted scenarios
// ----------------------------------------------------------------------------

#[test]
fn record_change_snapshots_original_values() {
    let (pool, shift) = mem_pool_with_shift();
    let job = Job::new(0, "alpha", dt("2025-09-01 07:00"))
        .with_steps(vec![RouteStep::new(1, "pick", HOUR)])
        .with_shifts(vec![shift]);
    let job_id = jobs::insert_job(&pool.conn, &job).unwrap();
    let sid = ScenarioLogic::create(&pool, "late start").unwrap();

    let patch = JobPatch {
        planned_start: Some(dt("2025-09-03 07:00")),
        ..JobPatch::default()
    };
    let stored =
        ScenarioLogic::record_change(&pool, sid, ChangeOperation::Modify, Some(job_id), patch)
            .unwrap();

    let original = stored.original_data.expect("snapshot");
    assert_eq!(original.planned_start, Some(dt("2025-09-01 07:00")));
    assert_eq!(original.name, None);

    // production is untouched, the scenario view moves
    let prod = ScheduleLogic::production(&pool, job_id).unwrap();
    let what_if = ScheduleLogic::scenario(&pool, sid, job_id).unwrap();
    assert_eq!(prod.end, dt("2025-09-01 08:00"));
    assert_eq!(what_if.end, dt("2025-09-03 08:00"));
    assert_eq!(jobs::load_job(&pool.conn, job_id).unwrap().planned_start, dt("2025-09-01 07:00"));
}

#[test]
fn record_change_rejects_modify_after_delete() {
    let (pool, _) = mem_pool_with_shift();
    let job_id = jobs::insert_job(&pool.conn, &Job::new(0, "alpha", dt("2025-09-01 07:00"))).unwrap();
    let sid = ScenarioLogic::create(&pool, "s").unwrap();

    ScenarioLogic::record_change(&pool, sid, ChangeOperation::Delete, Some(job_id), JobPatch::default())
        .unwrap();
    let err = ScenarioLogic::record_change(&pool, sid, ChangeOperation::Modify, Some(job_id), rename("x"))
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidOperationSequence(_)));
    assert_eq!(scenarios::load_scenario(&pool.conn, sid).unwrap().changes.len(), 1);
}

#[test]
fn commit_reproduces_the_scenario_schedule() {
    let (mut pool, shift) = mem_pool_with_shift();
    let alpha = Job::new(0, "alpha", dt("2025-09-01 07:00"))
        .with_steps(vec![RouteStep::new(1, "pick", HOUR), RouteStep::new(2, "pack", HOUR)])
        .with_shifts(vec![shift]);
    let alpha_id = jobs::insert_job(&pool.conn, &alpha).unwrap();
    DelayLogic::add(&pool, None, alpha_id, "inspection", HOUR / 2, 1).unwrap();

    let sid = ScenarioLogic::create(&pool, "rush").unwrap();
    let longer = JobPatch {
        route_steps: Some(vec![
            RouteStep::new(1, "pick", 2 * HOUR),
            RouteStep::new(2, "pack", HOUR),
            RouteStep::new(3, "ship", 3 * HOUR),
        ]),
        ..JobPatch::default()
    };
    ScenarioLogic::record_change(&pool, sid, ChangeOperation::Modify, Some(alpha_id), longer).unwrap();
    let add = ScenarioLogic::record_change(&pool, sid, ChangeOperation::Add, None, new_job("gamma"))
        .unwrap();
    let gamma_tmp = add.target_job_id().unwrap();
    assert!(gamma_tmp < 0);

    DelayLogic::add(&pool, Some(sid), alpha_id, "audit", HOUR, 3).unwrap();
    DelayLogic::add(&pool, Some(sid), gamma_tmp, "setup", HOUR, 0).unwrap();

    let before = ScheduleLogic::scenario_all(&pool, sid).unwrap();
    assert_eq!(before.len(), 2);

    let report = ScenarioLogic::commit(&mut pool, sid).unwrap();
    assert_eq!(report.applied_changes, 2);
    assert_eq!(report.promoted_delays, 2);
    assert_eq!(report.dropped_delays, 0);
    let gamma_id = report.added_jobs[&gamma_tmp];
    assert!(gamma_id > 0);

    let after = ScheduleLogic::production_all(&pool).unwrap();
    for name in ["alpha", "gamma"] {
        let b = by_name(&before, name);
        let a = by_name(&after, name);
        assert_eq!(a.items, b.items, "{}", name);
        assert_eq!(a.end, b.end, "{}", name);
    }
    assert_eq!(by_name(&after, "gamma").job_id, gamma_id);

    let scenario = scenarios::load_scenario(&pool.conn, sid).unwrap();
    assert!(scenario.changes.is_empty());
    assert!(scenario.committed_at.is_some());
    assert!(delays::load_scenario_delays(&pool.conn, sid).unwrap().is_empty());

    // the cleared scenario now materializes to production itself
    let replayed = ScheduleLogic::scenario_all(&pool, sid).unwrap();
    for t in &after {
        assert_eq!(by_name(&replayed, &t.job_name).items, t.items);
    }
}

#[test]
fn failed_commit_rolls_everything_back() {
    let (mut pool, shift) = mem_pool_with_shift();
    let alpha = Job::new(0, "alpha", dt("2025-09-01 07:00"))
        .with_steps(vec![RouteStep::new(1, "pick", HOUR), RouteStep::new(2, "pack", HOUR)])
        .with_shifts(vec![shift]);
    let alpha_id = jobs::insert_job(&pool.conn, &alpha).unwrap();

    let sid = ScenarioLogic::create(&pool, "shorter").unwrap();
    ScenarioLogic::record_change(&pool, sid, ChangeOperation::Add, None, new_job("gamma")).unwrap();
    let shorter = JobPatch {
        route_steps: Some(vec![RouteStep::new(1, "pick", HOUR)]),
        ..JobPatch::default()
    };
    ScenarioLogic::record_change(&pool, sid, ChangeOperation::Modify, Some(alpha_id), shorter)
        .unwrap();
    // anchored on step 2, which the scenario has already removed
    DelayLogic::add(&pool, None, alpha_id, "inspection", HOUR, 2).unwrap();

    let err = ScenarioLogic::commit(&mut pool, sid).unwrap_err();
    assert!(matches!(err, AppError::CommitFailure { scenario_id, .. } if scenario_id == sid));

    let prod = jobs::load_all_jobs(&pool.conn).unwrap();
    assert_eq!(prod.len(), 1);
    assert_eq!(prod[0].route_steps.len(), 2);

    let scenario = scenarios::load_scenario(&pool.conn, sid).unwrap();
    assert_eq!(scenario.changes.len(), 2);
    assert!(scenario.committed_at.is_none());
}

fn route(steps: &[(i32, &str)]) -> JobPatch {
    JobPatch {
        route_steps: Some(
            steps
                .iter()
                .map(|(order, name)| RouteStep::new(*order, name, HOUR))
                .collect(),
        ),
        ..JobPatch::default()
    }
}

#[test]
fn record_change_rejects_a_route_that_orphans_a_delay() {
    let (pool, shift) = mem_pool_with_shift();
    let alpha = Job::new(0, "alpha", dt("2025-09-01 07:00"))
        .with_steps(vec![
            RouteStep::new(1, "pick", HOUR),
            RouteStep::new(2, "pack", HOUR),
            RouteStep::new(3, "ship", HOUR),
        ])
        .with_shifts(vec![shift]);
    let alpha_id = jobs::insert_job(&pool.conn, &alpha).unwrap();
    DelayLogic::add(&pool, None, alpha_id, "inspection", HOUR, 2).unwrap();

    let sid = ScenarioLogic::create(&pool, "trim").unwrap();
    let err = ScenarioLogic::record_change(
        &pool,
        sid,
        ChangeOperation::Modify,
        Some(alpha_id),
        route(&[(1, "pick")]),
    )
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidReference(_)));

    // delays of the scenario itself count too
    DelayLogic::add(&pool, Some(sid), alpha_id, "audit", HOUR, 3).unwrap();
    let err = ScenarioLogic::record_change(
        &pool,
        sid,
        ChangeOperation::Modify,
        Some(alpha_id),
        route(&[(1, "pick"), (2, "pack")]),
    )
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidReference(_)));

    assert!(scenarios::load_scenario(&pool.conn, sid).unwrap().changes.is_empty());
    assert_eq!(ScheduleLogic::scenario_all(&pool, sid).unwrap().len(), 1);
}

#[test]
fn commit_only_checks_delays_against_the_final_route() {
    let (mut pool, shift) = mem_pool_with_shift();
    let alpha = Job::new(0, "alpha", dt("2025-09-01 07:00"))
        .with_steps(vec![RouteStep::new(1, "pick", HOUR), RouteStep::new(2, "pack", HOUR)])
        .with_shifts(vec![shift]);
    let alpha_id = jobs::insert_job(&pool.conn, &alpha).unwrap();

    // step 2 disappears, then comes back
    let sid = ScenarioLogic::create(&pool, "reshuffle").unwrap();
    ScenarioLogic::record_change(&pool, sid, ChangeOperation::Modify, Some(alpha_id), route(&[(1, "pick")]))
        .unwrap();
    ScenarioLogic::record_change(
        &pool,
        sid,
        ChangeOperation::Modify,
        Some(alpha_id),
        route(&[(1, "pick"), (2, "pack"), (3, "ship")]),
    )
    .unwrap();
    DelayLogic::add(&pool, None, alpha_id, "inspection", HOUR, 2).unwrap();

    let before = ScheduleLogic::scenario(&pool, sid, alpha_id).unwrap();

    let report = ScenarioLogic::commit(&mut pool, sid).unwrap();
    assert_eq!(report.applied_changes, 2);

    let after = ScheduleLogic::production(&pool, alpha_id).unwrap();
    assert_eq!(after.items, before.items);
    assert_eq!(after.end, before.end);
}

#[test]
fn deleting_a_job_named_by_a_pending_change_is_refused() {
    let (mut pool, _) = mem_pool_with_shift();
    let job = Job::new(0, "alpha", dt("2025-09-01 07:00"))
        .with_steps(vec![RouteStep::new(1, "pick", HOUR)]);
    let job_id = JobLogic::create(&mut pool, &job).unwrap();

    let pending = ScenarioLogic::create(&pool, "pending").unwrap();
    ScenarioLogic::record_change(&pool, pending, ChangeOperation::Modify, Some(job_id), rename("x"))
        .unwrap();
    let err = JobLogic::delete(&mut pool, job_id).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(jobs::job_exists(&pool.conn, job_id).unwrap());

    ScenarioLogic::discard(&mut pool, pending).unwrap();

    // a scenario holding only a delay on the job does not block it
    let held = ScenarioLogic::create(&pool, "held").unwrap();
    DelayLogic::add(&pool, Some(held), job_id, "hold", HOUR, 1).unwrap();
    JobLogic::delete(&mut pool, job_id).unwrap();

    assert!(!jobs::job_exists(&pool.conn, job_id).unwrap());
    assert!(delays::load_scenario_delays(&pool.conn, held).unwrap().is_empty());
}

#[test]
fn deleted_jobs_drop_their_scenario_delays_on_commit() {
    let (mut pool, _) = mem_pool_with_shift();
    let job = Job::new(0, "alpha", dt("2025-09-01 07:00"))
        .with_steps(vec![RouteStep::new(1, "pick", HOUR)]);
    let job_id = jobs::insert_job(&pool.conn, &job).unwrap();

    let sid = ScenarioLogic::create(&pool, "cancel").unwrap();
    DelayLogic::add(&pool, Some(sid), job_id, "hold", HOUR, 1).unwrap();
    ScenarioLogic::record_change(&pool, sid, ChangeOperation::Delete, Some(job_id), JobPatch::default())
        .unwrap();

    let report = ScenarioLogic::commit(&mut pool, sid).unwrap();
    assert_eq!(report.dropped_delays, 1);
    assert_eq!(report.promoted_delays, 0);
    assert!(!jobs::job_exists(&pool.conn, job_id).unwrap());
}

#[test]
fn discard_removes_scenario_and_keeps_production() {
    let (mut pool, _) = mem_pool_with_shift();
    let job = Job::new(0, "alpha", dt("2025-09-01 07:00"))
        .with_steps(vec![RouteStep::new(1, "pick", HOUR)]);
    let job_id = jobs::insert_job(&pool.conn, &job).unwrap();
    let before = ScheduleLogic::production(&pool, job_id).unwrap();

    let sid = ScenarioLogic::create(&pool, "tmp").unwrap();
    ScenarioLogic::record_change(&pool, sid, ChangeOperation::Modify, Some(job_id), rename("renamed"))
        .unwrap();
    DelayLogic::add(&pool, Some(sid), job_id, "hold", HOUR, 1).unwrap();

    ScenarioLogic::discard(&mut pool, sid).unwrap();

    let err = scenarios::load_scenario(&pool.conn, sid).unwrap_err();
    assert!(matches!(err, AppError::InvalidReference(_)));
    assert!(delays::load_scenario_delays(&pool.conn, sid).unwrap().is_empty());
    assert_eq!(ScheduleLogic::production(&pool, job_id).unwrap(), before);
}

#[test]
fn only_one_scenario_is_active() {
    let (pool, _) = mem_pool_with_shift();
    let a = ScenarioLogic::create(&pool, "a").unwrap();
    let b = ScenarioLogic::create(&pool, "b").unwrap();

    ScenarioLogic::activate(&pool, a).unwrap();
    ScenarioLogic::activate(&pool, b).unwrap();
    assert_eq!(scenarios::active_scenario_id(&pool.conn).unwrap(), Some(b));

    let err = ScenarioLogic::activate(&pool, 999).unwrap_err();
    assert!(matches!(err, AppError::InvalidReference(_)));
}
