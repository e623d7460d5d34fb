use std::sync::{Mutex, MutexGuard};

use tracing::info;

use crate::copies::CopiesPerEmbryoData;
use crate::error::{Result, TimecourseError};
use crate::maps::DataMaps;
use crate::temporal::TemporalInputRangeData;
use crate::timeaxis::TimeAxisDefinition;
use crate::timecourse::TimeCourseData;

/// A dataset kind the store keeps exactly one of.
pub trait Dataset: Clone + Send + 'static {
    const KIND: &'static str;
    fn slot(store: &DataStore) -> &Mutex<Option<Self>>;
}

impl Dataset for TimeCourseData {
    const KIND: &'static str = "time course";
    fn slot(store: &DataStore) -> &Mutex<Option<Self>> {
        &store.time_course
    }
}
impl Dataset for TemporalInputRangeData {
    const KIND: &'static str = "temporal input range";
    fn slot(store: &DataStore) -> &Mutex<Option<Self>> {
        &store.temporal_input
    }
}
impl Dataset for CopiesPerEmbryoData {
    const KIND: &'static str = "copies per embryo";
    fn slot(store: &DataStore) -> &Mutex<Option<Self>> {
        &store.copies_per_embryo
    }
}

// ------------- DataStore -------------
// Owns the long-lived datasets once a parse hands them over. Each kind sits
// behind its own lock, so access is serialized per dataset identity.
#[derive(Debug, Default)]
pub struct DataStore {
    time_axis: TimeAxisDefinition,
    time_course: Mutex<Option<TimeCourseData>>,
    meta_time_course: Mutex<Option<TimeCourseData>>,
    temporal_input: Mutex<Option<TemporalInputRangeData>>,
    copies_per_embryo: Mutex<Option<CopiesPerEmbryoData>>,
    data_maps: Mutex<DataMaps>,
}

impl DataStore {
    pub fn new(time_axis: TimeAxisDefinition) -> Self {
        Self { time_axis, ..Self::default() }
    }
    pub fn time_axis(&self) -> &TimeAxisDefinition {
        &self.time_axis
    }

    pub fn get<D: Dataset>(&self) -> Result<Option<D>> {
        Ok(lock(D::slot(self))?.clone())
    }
    pub fn set<D: Dataset>(&self, data: D) -> Result<()> {
        *lock(D::slot(self))? = Some(data);
        Ok(())
    }
    pub fn clear<D: Dataset>(&self) -> Result<Option<D>> {
        Ok(lock(D::slot(self))?.take())
    }
    /// Runs `f` against the registered dataset in place, if there is one.
    pub fn update<D: Dataset, R>(&self, f: impl FnOnce(&mut D) -> R) -> Result<Option<R>> {
        Ok(lock(D::slot(self))?.as_mut().map(f))
    }

    pub fn meta_time_course(&self) -> Result<Option<TimeCourseData>> {
        Ok(lock(&self.meta_time_course)?.clone())
    }
    pub fn set_meta_time_course(&self, data: TimeCourseData) -> Result<()> {
        *lock(&self.meta_time_course)? = Some(data);
        Ok(())
    }
    fn time_course_slot(&self, meta: bool) -> &Mutex<Option<TimeCourseData>> {
        if meta { &self.meta_time_course } else { &self.time_course }
    }
    pub fn time_course_in(&self, meta: bool) -> Result<Option<TimeCourseData>> {
        Ok(lock(self.time_course_slot(meta))?.clone())
    }
    /// Base serial number of the registered time-course dataset.
    pub fn time_course_serial(&self, meta: bool) -> Result<Option<u64>> {
        Ok(lock(self.time_course_slot(meta))?.as_ref().map(TimeCourseData::serial_number))
    }

    /// Registers a freshly parsed time-course dataset, provided the slot still
    /// holds the serial number observed when the parse began (`None` meaning the
    /// slot was empty). Check and swap happen under one lock.
    pub fn publish_time_course(
        &self,
        meta: bool,
        data: TimeCourseData,
        observed: Option<u64>,
    ) -> Result<()> {
        let mut slot = lock(self.time_course_slot(meta))?;
        let current = slot.as_ref().map(TimeCourseData::serial_number);
        match (observed, current) {
            (Some(expected), Some(found)) if expected != found => {
                return Err(TimecourseError::StaleVersion { dataset: TimeCourseData::KIND, expected, found });
            }
            (None, Some(found)) => {
                return Err(TimecourseError::StaleVersion {
                    dataset: TimeCourseData::KIND,
                    expected: data.serial_number(),
                    found,
                });
            }
            _ => (),
        }
        info!(meta, genes = data.genes().len(), serial = data.serial_number(), "time course dataset registered");
        *slot = Some(data);
        Ok(())
    }

    pub fn data_maps(&self) -> Result<DataMaps> {
        Ok(lock(&self.data_maps)?.clone())
    }
    pub fn merge_data_maps(&self, f: impl FnOnce(&mut DataMaps)) -> Result<()> {
        f(&mut *lock(&self.data_maps)?);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex.lock().map_err(|e| TimecourseError::Lock(e.to_string()))
}
