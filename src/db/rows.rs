//! Text <-> chrono conversions shared by the row mappers.

use crate::errors::AppError;
use chrono::{Local, NaiveDateTime, NaiveTime};
use rusqlite::types::Type;

pub const DT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
const DT_PARSE: &str = "%Y-%m-%d %H:%M:%S%.f";
const HM_FORMAT: &str = "%H:%M";

pub fn fmt_dt(dt: &NaiveDateTime) -> String {
    dt.format(DT_FORMAT).to_string()
}

pub fn fmt_hm(t: &NaiveTime) -> String {
    t.format(HM_FORMAT).to_string()
}

pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn now_str() -> String {
    fmt_dt(&now())
}

pub fn parse_dt(idx: usize, s: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DT_PARSE).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            Box::new(AppError::InvalidDate(s.to_string())),
        )
    })
}

pub fn parse_hm(idx: usize, s: &str) -> rusqlite::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, HM_FORMAT).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            Box::new(AppError::InvalidTime(s.to_string())),
        )
    })
}

pub fn json_col<T: serde::de::DeserializeOwned>(idx: usize, s: &str) -> rusqlite::Result<T> {
    serde_json::from_str(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(AppError::Json(e)))
    })
}
