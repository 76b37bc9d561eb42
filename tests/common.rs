#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use chrono::{NaiveDateTime, NaiveTime};
use kitplan::db::initialize::init_db;
use kitplan::db::pool::DbPool;
use kitplan::db::shifts::insert_shift;
use kitplan::models::shift::Shift;
use std::env;
use std::fs;
use std::path::PathBuf;

pub fn kp() -> Command {
    cargo_bin_cmd!("kitplan")
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_kitplan.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Initialize DB and add the "First" shift (07:00-15:00, break 11:00 for 30 min)
pub fn init_db_with_shift(db_path: &str) {
    kp().args(["--db", db_path, "--test", "init"])
        .assert()
        .success();

    kp().args([
        "--db",
        db_path,
        "shift",
        "add",
        "First",
        "--start",
        "07:00",
        "--end",
        "15:00",
        "--break-start",
        "11:00",
        "--break",
        "30",
    ])
    .assert()
    .success();
}

pub fn t(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").expect("time")
}

pub fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").expect("datetime")
}

/// 07:00-15:00 with a 30 min break at 11:00.
pub fn first_shift(id: i64) -> Shift {
    Shift::new(id, "First", t("07:00"), t("15:00")).with_break(t("11:00"), 30)
}

/// Migrated in-memory database.
pub fn mem_pool() -> DbPool {
    let pool = DbPool::in_memory().expect("open in-memory db");
    init_db(&pool.conn).expect("init db");
    pool
}

/// Migrated in-memory database holding the "First" shift; returns its id too.
pub fn mem_pool_with_shift() -> (DbPool, i64) {
    let pool = mem_pool();
    let id = insert_shift(&pool.conn, &first_shift(0)).expect("insert shift");
    (pool, id)
}

/// File-backed migrated database for tests that need several connections.
pub fn file_pool(name: &str) -> (String, DbPool) {
    let path = setup_test_db(name);
    let pool = DbPool::new(&path).expect("open db");
    init_db(&pool.conn).expect("init db");
    (path, pool)
}
