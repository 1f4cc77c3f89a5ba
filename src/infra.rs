use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use triage_desk::config::StorageConfig;
use triage_desk::workflows::triage::{DirectoryStore, RecordStore, SystemClock, TriageDesk};

pub(crate) type Desk = TriageDesk<DirectoryStore, SystemClock>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Opens the directory-backed record store described by `config`.
pub(crate) fn open_desk(config: &StorageConfig) -> Desk {
    let storage = DirectoryStore::new(config.data_dir.clone());
    let store = RecordStore::load(storage, config.seed_policy());
    TriageDesk::new(store, Arc::new(SystemClock))
}

pub(crate) fn parse_yes_no(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" => Ok(true),
        "n" | "no" | "false" => Ok(false),
        _ => Err(format!("expected yes or no, got '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_yes_no_accepts_common_spellings() {
        assert_eq!(parse_yes_no(" Yes "), Ok(true));
        assert_eq!(parse_yes_no("n"), Ok(false));
        assert!(parse_yes_no("maybe").is_err());
    }
}
