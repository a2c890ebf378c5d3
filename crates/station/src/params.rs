//! Last-writer-wins parameter map keyed by [`ParamType`].

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use sl_domain::{ParamType, Parameter, ParameterDecoder};

/// Decoded parameters for one owner (the station or a single device).
///
/// An incoming value replaces the stored one only when it differs *and*
/// carries a strictly newer modification time.  Absent keys are always
/// inserted.  One reserved code is dropped on entry.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    entries: HashMap<ParamType, Parameter>,
    ignored: ParamType,
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::with_ignored(ParamType::STATUS_ECHO)
    }

    /// Store that drops `ignored` instead of the default reserved code.
    pub fn with_ignored(ignored: ParamType) -> Self {
        Self {
            entries: HashMap::new(),
            ignored,
        }
    }

    /// Decode `raw` and merge it.  Returns the stored parameter when the
    /// merge changed something.
    pub fn merge(
        &mut self,
        decoder: &dyn ParameterDecoder,
        param_type: ParamType,
        raw: &str,
        modified: i64,
    ) -> Option<Parameter> {
        if param_type == self.ignored {
            return None;
        }
        let value = decoder.decode(param_type, raw);
        self.merge_value(param_type, value, modified)
    }

    /// Merge an already decoded value.
    pub fn merge_value(
        &mut self,
        param_type: ParamType,
        value: Value,
        modified: i64,
    ) -> Option<Parameter> {
        if param_type == self.ignored {
            return None;
        }

        match self.entries.get(&param_type) {
            Some(existing) if existing.value == value || existing.modified >= modified => None,
            _ => {
                let param = Parameter { value, modified };
                self.entries.insert(param_type, param.clone());
                Some(param)
            }
        }
    }

    pub fn lookup(&self, param_type: ParamType) -> Option<&Parameter> {
        self.entries.get(&param_type)
    }

    /// Ordered copy of every stored entry.
    pub fn snapshot(&self) -> BTreeMap<ParamType, Parameter> {
        self.entries.iter().map(|(k, v)| (*k, v.clone())).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sl_domain::RawValueDecoder;

    #[test]
    fn absent_key_is_inserted() {
        let mut store = ParameterStore::new();
        let changed = store.merge(&RawValueDecoder, ParamType::BATTERY, "80", 10);
        assert_eq!(changed.map(|p| p.value), Some(json!(80)));
        assert_eq!(store.lookup(ParamType::BATTERY).map(|p| p.modified), Some(10));
    }

    #[test]
    fn newer_differing_value_replaces() {
        let mut store = ParameterStore::new();
        store.merge(&RawValueDecoder, ParamType::BATTERY, "80", 10);
        assert!(store.merge(&RawValueDecoder, ParamType::BATTERY, "75", 11).is_some());
        assert_eq!(store.lookup(ParamType::BATTERY).map(|p| p.value.clone()), Some(json!(75)));
    }

    #[test]
    fn older_or_equal_timestamp_is_ignored() {
        let mut store = ParameterStore::new();
        store.merge(&RawValueDecoder, ParamType::BATTERY, "80", 10);
        assert!(store.merge(&RawValueDecoder, ParamType::BATTERY, "70", 10).is_none());
        assert!(store.merge(&RawValueDecoder, ParamType::BATTERY, "70", 9).is_none());
        assert_eq!(store.lookup(ParamType::BATTERY).map(|p| p.value.clone()), Some(json!(80)));
    }

    #[test]
    fn same_value_newer_timestamp_keeps_old_timestamp() {
        let mut store = ParameterStore::new();
        store.merge(&RawValueDecoder, ParamType::BATTERY, "80", 10);
        assert!(store.merge(&RawValueDecoder, ParamType::BATTERY, "80", 50).is_none());
        assert_eq!(store.lookup(ParamType::BATTERY).map(|p| p.modified), Some(10));
    }

    #[test]
    fn merge_is_idempotent() {
        let mut store = ParameterStore::new();
        assert!(store.merge(&RawValueDecoder, ParamType::GUARD_MODE, "1", 5).is_some());
        assert!(store.merge(&RawValueDecoder, ParamType::GUARD_MODE, "1", 5).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn reserved_code_never_stored() {
        let mut store = ParameterStore::new();
        assert!(store.merge(&RawValueDecoder, ParamType::STATUS_ECHO, "1", 5).is_none());
        assert!(store.merge_value(ParamType::STATUS_ECHO, json!(1), 6).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn final_value_follows_latest_differing_write() {
        let writes = [("1", 3), ("2", 1), ("3", 7), ("3", 9), ("4", 5)];
        let mut store = ParameterStore::new();
        for (raw, t) in writes {
            store.merge(&RawValueDecoder, ParamType::SCHEDULE_MODE, raw, t);
        }
        let stored = store.lookup(ParamType::SCHEDULE_MODE).cloned();
        assert_eq!(stored, Some(Parameter { value: json!(3), modified: 7 }));
    }

    #[test]
    fn snapshot_is_ordered() {
        let mut store = ParameterStore::new();
        store.merge_value(ParamType::GUARD_MODE, json!(1), 1);
        store.merge_value(ParamType::BATTERY, json!(50), 1);
        let keys: Vec<_> = store.snapshot().into_keys().collect();
        assert_eq!(keys, vec![ParamType::BATTERY, ParamType::GUARD_MODE]);
    }
}
