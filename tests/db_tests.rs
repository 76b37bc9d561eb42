use kitplan::config::Config;
use kitplan::db::initialize::init_db;
use kitplan::db::log::load_log;
use kitplan::db::pool::DbPool;
use kitplan::db::shifts;
use kitplan::models::shift::Shift;
use kitplan::errors::AppError;
use kitplan::utils::time::{format_seconds, parse_duration};
use std::env;
use std::fs;

mod common;
use common::{first_shift, mem_pool, t};

#[test]
fn migrations_run_once() {
    let pool = DbPool::in_memory().unwrap();
    assert_eq!(init_db(&pool.conn).unwrap(), 2);
    assert_eq!(init_db(&pool.conn).unwrap(), 2);

    let applied = load_log(&pool.conn)
        .unwrap()
        .into_iter()
        .filter(|r| r.operation == "migration_applied")
        .count();
    assert_eq!(applied, 2);
}

#[test]
fn shifts_round_trip_through_the_database() {
    let pool = mem_pool();
    let night = Shift::new(0, "Night", t("22:00"), t("06:00"))
        .with_order(2)
        .inactive();

    let first_id = shifts::insert_shift(&pool.conn, &first_shift(0)).unwrap();
    let night_id = shifts::insert_shift(&pool.conn, &night).unwrap();

    let all = shifts::load_shifts(&pool.conn).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, first_id);
    assert_eq!(all[0].break_start, Some(t("11:00")));
    assert_eq!(all[0].capacity_seconds(), 7 * 3600 + 1800);
    assert_eq!(all[1].id, night_id);
    assert!(!all[1].is_active);
    assert!(all[1].is_overnight());

    shifts::set_shift_active(&pool.conn, night_id, true).unwrap();
    assert!(shifts::load_shifts(&pool.conn).unwrap()[1].is_active);

    let err = shifts::set_shift_active(&pool.conn, 99, true).unwrap_err();
    assert!(matches!(err, AppError::InvalidReference(_)));
}

#[test]
fn config_fills_missing_fields_with_defaults() {
    let mut path = env::temp_dir();
    path.push("kitplan_partial.conf");
    fs::write(&path, "database: /tmp/somewhere.sqlite\n").unwrap();

    let cfg = Config::load_from(&path).unwrap();
    assert_eq!(cfg.database, "/tmp/somewhere.sqlite");
    assert_eq!(cfg.poll_interval_secs, 5);
    assert_eq!(cfg.log_filter, "warn");
    assert_eq!(cfg.busy_timeout_ms, 5000);

    cfg.save_to(&path).unwrap();
    assert_eq!(Config::load_from(&path).unwrap(), cfg);

    fs::write(&path, "database: [unclosed\n").unwrap();
    assert!(matches!(Config::load_from(&path), Err(AppError::Config(_))));
    fs::remove_file(&path).ok();
}

#[test]
fn durations_parse_and_format() {
    assert_eq!(parse_duration("1h30m").unwrap(), 5400);
    assert_eq!(parse_duration("45m").unwrap(), 2700);
    assert_eq!(parse_duration("90").unwrap(), 90);
    assert!(parse_duration("1x").is_err());
    assert!(parse_duration("-5").is_err());
    assert!(matches!(
        parse_duration("9999999999999999h"),
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        parse_duration("2562047788015215h59m"),
        Err(AppError::Validation(_))
    ));

    assert_eq!(format_seconds(5400), "01h 30m");
    assert_eq!(format_seconds(61), "00h 01m 01s");
}
