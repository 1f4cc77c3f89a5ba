use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request};
use axum::response::Response;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::workflows::triage::storage::StorageError;
use crate::workflows::triage::{
    classify, FixedClock, Intake, IntakeForm, KeyValueStore, MemoryStore, PatientRecord,
    RecordId, RecordStore, SeedPolicy, Sex, TriageAnswers, TriageDesk,
};

pub(super) type MemoryDesk = TriageDesk<MemoryStore, FixedClock>;

pub(super) fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 7, 20)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .expect("valid timestamp")
}

/// Wall time with seconds and a sub-second part, finer than records persist.
pub(super) fn precise(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 7, 20)
        .and_then(|date| date.and_hms_milli_opt(hour, minute, 27, 512))
        .expect("valid timestamp")
}

pub(super) fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(at(10, 5)))
}

pub(super) fn millis(now: NaiveDateTime) -> u64 {
    u64::try_from(now.and_utc().timestamp_millis()).expect("post-epoch timestamp")
}

pub(super) fn answers(breathing: bool, conscious: bool, walking: bool, bleeding: bool) -> TriageAnswers {
    TriageAnswers {
        breathing,
        conscious,
        walking,
        bleeding,
    }
}

pub(super) fn intake(name: &str, sex: Sex) -> Intake {
    Intake::new(name, 41, sex, "Twisted ankle").expect("valid intake")
}

pub(super) fn form(name: &str, age: &str) -> IntakeForm {
    IntakeForm {
        name: name.to_string(),
        age: age.to_string(),
        sex: Some(Sex::Female),
        symptoms: "Fell from a ladder".to_string(),
    }
}

pub(super) fn record(id: u64, name: &str, sex: Sex, triage: TriageAnswers) -> PatientRecord {
    let created = at(9, 0);
    PatientRecord {
        id: RecordId(id),
        name: name.to_string(),
        age: 30,
        time: created.time(),
        date: created.date(),
        priority: classify(&triage),
        symptoms: format!("{name} symptoms"),
        sex,
        triage_answers: triage,
    }
}

pub(super) fn empty_store() -> RecordStore<MemoryStore> {
    RecordStore::load(MemoryStore::default(), SeedPolicy::Empty)
}

pub(super) fn empty_desk() -> Arc<MemoryDesk> {
    Arc::new(TriageDesk::new(empty_store(), clock()))
}

pub(super) fn seeded_desk() -> Arc<MemoryDesk> {
    let store = RecordStore::load(MemoryStore::default(), SeedPolicy::Examples);
    Arc::new(TriageDesk::new(store, clock()))
}

/// Storage whose every call fails.
pub(super) struct UnavailableStorage;

impl KeyValueStore for UnavailableStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("disk detached".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("disk detached".to_string()))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("disk detached".to_string()))
    }
}

/// Storage that reads as empty but refuses writes.
pub(super) struct ReadOnlyStorage;

impl KeyValueStore for ReadOnlyStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("quota exceeded".to_string()))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("quota exceeded".to_string()))
    }
}

pub(super) fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

pub(super) fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

pub(super) async fn read_body(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

pub(super) async fn read_json(response: Response) -> Value {
    let body = read_body(response).await;
    serde_json::from_str(&body).expect("json body")
}
