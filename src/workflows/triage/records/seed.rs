use chrono::{NaiveDate, NaiveTime};

use super::super::domain::{PatientRecord, RecordId, Sex, TriageAnswers};
use super::super::engine;

struct SeedPatient {
    id: u64,
    name: &'static str,
    age: u32,
    time: (u32, u32),
    symptoms: &'static str,
    sex: Sex,
    answers: TriageAnswers,
}

const SEED_DATE: (i32, u32, u32) = (2025, 7, 19);

const SEED_PATIENTS: [SeedPatient; 3] = [
    SeedPatient {
        id: 1,
        name: "Michael",
        age: 50,
        time: (9, 30),
        symptoms: "Mild arm pain",
        sex: Sex::Male,
        answers: TriageAnswers {
            breathing: true,
            conscious: true,
            walking: true,
            bleeding: false,
        },
    },
    SeedPatient {
        id: 2,
        name: "Anna",
        age: 34,
        time: (9, 15),
        symptoms: "Difficulty breathing",
        sex: Sex::Female,
        answers: TriageAnswers {
            breathing: true,
            conscious: true,
            walking: false,
            bleeding: false,
        },
    },
    SeedPatient {
        id: 3,
        name: "Laura",
        age: 72,
        time: (9, 0),
        symptoms: "Severe chest pain",
        sex: Sex::Female,
        answers: TriageAnswers {
            breathing: false,
            conscious: true,
            walking: false,
            bleeding: false,
        },
    },
];

/// First-run demonstration records, newest first.
pub fn example_records() -> Vec<PatientRecord> {
    let (year, month, day) = SEED_DATE;
    let date = NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default();

    SEED_PATIENTS
        .iter()
        .map(|seed| PatientRecord {
            id: RecordId(seed.id),
            name: seed.name.to_string(),
            age: seed.age,
            time: NaiveTime::from_hms_opt(seed.time.0, seed.time.1, 0).unwrap_or_default(),
            date,
            priority: engine::classify(&seed.answers),
            symptoms: seed.symptoms.to_string(),
            sex: seed.sex,
            triage_answers: seed.answers,
        })
        .collect()
}
