use chrono::NaiveDateTime;
use kitplan::core::calendar::{ShiftActivity, ShiftCalendar};
use kitplan::core::delays::{DelayLogic, apply_delays};
use kitplan::core::schedule::{ScheduleLogic, compute_schedule, production_timeline, scenario_timeline};
use kitplan::db::jobs::insert_job;
use kitplan::errors::AppError;
use kitplan::models::delay::JobDelay;
use kitplan::models::job::{Job, RouteStep};
use kitplan::models::timeline::ItemKind;

mod common;
use common::{dt, first_shift, mem_pool_with_shift};

const HOUR: i64 = 3600;

fn delay(id: i64, name: &str, after: i32, created: NaiveDateTime) -> JobDelay {
    JobDelay {
        id,
        scenario_id: None,
        job_id: 1,
        name: name.to_string(),
        duration_seconds: HOUR,
        insert_after: after,
        created_at: created,
    }
}

fn three_steps() -> Vec<RouteStep> {
    vec![
        RouteStep::new(1, "pick", 2 * HOUR),
        RouteStep::new(2, "kit", 3 * HOUR),
        RouteStep::new(3, "pack", HOUR),
    ]
}

fn names(items: &[kitplan::models::timeline::ExtendedItem]) -> Vec<&str> {
    items.iter().map(|i| i.name.as_str()).collect()
}

#[test]
fn delays_on_same_step_keep_creation_order() {
    let delays = vec![
        delay(11, "B", 2, dt("2025-09-01 10:00")),
        delay(10, "A", 2, dt("2025-09-01 09:00")),
    ];
    let items = apply_delays(&three_steps(), &delays).unwrap();

    assert_eq!(names(&items), ["pick", "kit", "A", "B", "pack"]);
    assert_eq!(items[2].kind, ItemKind::Delay);
    assert_eq!(items[2].anchor_order, 2);
}

#[test]
fn delays_created_together_fall_back_to_id_order() {
    let same = dt("2025-09-01 09:00");
    let delays = vec![delay(21, "second", 1, same), delay(20, "first", 1, same)];
    let items = apply_delays(&three_steps(), &delays).unwrap();

    assert_eq!(names(&items), ["pick", "first", "second", "kit", "pack"]);
}

#[test]
fn delay_after_zero_goes_before_the_first_step() {
    let delays = vec![delay(1, "setup", 0, dt("2025-09-01 09:00"))];
    let items = apply_delays(&three_steps(), &delays).unwrap();

    assert_eq!(names(&items), ["setup", "pick", "kit", "pack"]);
}

#[test]
fn delay_on_missing_step_is_an_invalid_reference() {
    let delays = vec![delay(1, "lost", 9, dt("2025-09-01 09:00"))];
    let err = apply_delays(&three_steps(), &delays).unwrap_err();
    assert!(matches!(err, AppError::InvalidReference(_)));
}

#[test]
fn items_chain_through_the_calendar() {
    let calendar =
        ShiftCalendar::new(&[first_shift(1)], &[], false, ShiftActivity::ActiveOnly).unwrap();
    let delays = vec![delay(1, "wait", 1, dt("2025-09-01 09:00"))];
    let items = apply_delays(&three_steps(), &delays).unwrap();

    let s = compute_schedule(dt("2025-09-01 07:00"), &items, &calendar);

    assert_eq!(s.items.len(), 4);
    assert_eq!(s.items[0].end, dt("2025-09-01 09:00"));
    assert_eq!(s.items[1].start, dt("2025-09-01 09:00"));
    assert_eq!(s.items[1].end, dt("2025-09-01 10:00"));
    // "kit" straddles the break
    assert_eq!(s.items[2].start, dt("2025-09-01 10:00"));
    assert_eq!(s.items[2].segments.len(), 2);
    assert_eq!(s.items[2].end, dt("2025-09-01 13:30"));
    assert_eq!(s.items[3].start, dt("2025-09-01 13:30"));
    assert_eq!(s.end, dt("2025-09-01 14:30"));

    for pair in s.items.windows(2) {
        assert!(pair[0].end <= pair[1].start);
    }
}

#[test]
fn job_without_steps_ends_at_planned_start() {
    let calendar =
        ShiftCalendar::new(&[first_shift(1)], &[], false, ShiftActivity::ActiveOnly).unwrap();
    let start = dt("2025-09-01 05:00");
    let s = compute_schedule(start, &[], &calendar);

    assert!(s.items.is_empty());
    assert_eq!(s.end, start);
}

#[test]
fn unordered_route_is_rejected_before_computing() {
    let job = Job::new(1, "bad", dt("2025-09-01 07:00")).with_steps(vec![
        RouteStep::new(2, "b", HOUR),
        RouteStep::new(1, "a", HOUR),
    ]);
    let err = production_timeline(&job, &[first_shift(1)], &[]).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[test]
fn production_ignores_scenario_delays() {
    let job = Job::new(1, "j", dt("2025-09-01 07:00")).with_steps(three_steps());
    let mut scoped = delay(5, "what-if", 3, dt("2025-09-01 09:00"));
    scoped.scenario_id = Some(4);
    let delays = vec![scoped];
    let shifts = vec![first_shift(1)];

    let prod = production_timeline(&job, &shifts, &delays).unwrap();
    assert_eq!(prod.items.len(), 3);
    assert_eq!(prod.delay_seconds(), 0);

    let what_if = scenario_timeline(&job, 4, &shifts, &delays).unwrap();
    assert_eq!(what_if.items.len(), 4);
    assert_eq!(what_if.delay_seconds(), HOUR);
    assert!(what_if.end > prod.end);

    let other = scenario_timeline(&job, 5, &shifts, &delays).unwrap();
    assert_eq!(other.end, prod.end);
}

#[test]
fn production_schedule_from_the_database() {
    let (pool, shift_id) = mem_pool_with_shift();
    let job = Job::new(0, "kit-A", dt("2025-09-01 07:00"))
        .with_steps(vec![RouteStep::new(1, "all", 8 * HOUR)])
        .with_shifts(vec![shift_id]);
    let job_id = insert_job(&pool.conn, &job).unwrap();

    let timeline = ScheduleLogic::production(&pool, job_id).unwrap();
    assert_eq!(timeline.job_name, "kit-A");
    assert_eq!(timeline.scenario_id, None);
    assert_eq!(timeline.end, dt("2025-09-02 07:30"));

    DelayLogic::add(&pool, None, job_id, "cleanup", HOUR / 2, 1).unwrap();
    let timeline = ScheduleLogic::production(&pool, job_id).unwrap();
    assert_eq!(timeline.end, dt("2025-09-02 08:00"));
    assert_eq!(ScheduleLogic::production_all(&pool).unwrap().len(), 1);
}

#[test]
fn delay_logic_validates_against_the_route() {
    let (pool, _) = mem_pool_with_shift();
    let job = Job::new(0, "j", dt("2025-09-01 07:00")).with_steps(three_steps());
    let job_id = insert_job(&pool.conn, &job).unwrap();

    let err = DelayLogic::add(&pool, None, job_id, "x", HOUR, 4).unwrap_err();
    assert!(matches!(err, AppError::InvalidReference(_)));

    let err = DelayLogic::add(&pool, None, job_id, "x", -1, 1).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = DelayLogic::add(&pool, None, 999, "x", HOUR, 0).unwrap_err();
    assert!(matches!(err, AppError::InvalidReference(_)));
}

#[test]
fn unknown_job_has_no_schedule() {
    let (pool, _) = mem_pool_with_shift();
    let err = ScheduleLogic::production(&pool, 42).unwrap_err();
    assert!(matches!(err, AppError::InvalidReference(_)));
}
