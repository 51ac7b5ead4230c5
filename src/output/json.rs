//! JSON serialization of reports for consumers outside the process.

use serde::Serialize;

/// Serialize any report type to compact JSON.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

/// Serialize any report type to indented JSON.
pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attack::EngineSnapshot;
    use crate::statistics::Summary;

    #[test]
    fn snapshot_round_trips() {
        let snapshot = EngineSnapshot {
            log: vec![">> START: Remote Timing Analysis...".to_string()],
            trying: Some(b'c'),
            ..EngineSnapshot::default()
        };
        let json = to_json(&snapshot).unwrap();
        let back: EngineSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn summary_field_names() {
        let json = to_json_pretty(&Summary::of(&[1.0, 3.0])).unwrap();
        assert!(json.contains("\"mean\": 2.0"));
        assert!(json.contains("\"count\": 2"));
    }
}
