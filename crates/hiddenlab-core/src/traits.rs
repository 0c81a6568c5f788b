use crate::errors::StoreError;
use crate::path::InstancePath;
use crate::record::RecordList;

/// Persists one record list per instance.
///
/// Writes replace the whole list; callers read, edit, then write back.
pub trait DecisionStore {
    /// Records of an instance. A missing decision file is an empty list.
    fn read(&self, instance: &InstancePath) -> Result<RecordList, StoreError>;

    fn write(&self, instance: &InstancePath, records: &RecordList) -> Result<(), StoreError>;
}
